//! Minimal Solidity ABI codec.
//!
//! Covers exactly the types the Symposium contract uses: `uint256`, `bool`
//! and `string`. Every word read back from the chain is validated before it
//! becomes a typed value.

use sha3::{Digest, Keccak256};

use crate::error::ChainError;

const WORD: usize = 32;

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// First four bytes of the Keccak-256 of a canonical function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Event topic: the full Keccak-256 of a canonical event signature.
pub fn topic(signature: &str) -> [u8; 32] {
    keccak256(signature.as_bytes())
}

/// A value to encode as a call argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Uint(u128),
    Bool(bool),
    String(String),
}

fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

/// Encode arguments in head/tail layout.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Uint(v) => head.extend_from_slice(&uint_word(*v)),
            Token::Bool(b) => head.extend_from_slice(&uint_word(*b as u128)),
            Token::String(s) => {
                head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));
                let bytes = s.as_bytes();
                tail.extend_from_slice(&uint_word(bytes.len() as u128));
                tail.extend_from_slice(bytes);
                tail.resize(tail.len() + padded_len(bytes.len()) - bytes.len(), 0);
            }
        }
    }
    head.extend_from_slice(&tail);
    head
}

/// Selector followed by the encoded arguments.
pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut data = selector(signature).to_vec();
    data.extend_from_slice(&encode(tokens));
    data
}

/// Reads typed values out of ABI-encoded return data.
pub struct Decoder<'a> {
    data: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn word_at(&self, offset: usize) -> Result<&'a [u8], ChainError> {
        offset
            .checked_add(WORD)
            .and_then(|end| self.data.get(offset..end))
            .ok_or_else(|| {
                ChainError::Abi(format!(
                    "word at byte {offset} out of range ({} bytes)",
                    self.data.len()
                ))
            })
    }

    fn u128_at(&self, offset: usize) -> Result<u128, ChainError> {
        let word = self.word_at(offset)?;
        if word[..16].iter().any(|b| *b != 0) {
            return Err(ChainError::Abi(format!(
                "uint at byte {offset} exceeds 128 bits"
            )));
        }
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&word[16..]);
        Ok(u128::from_be_bytes(buf))
    }

    fn usize_at(&self, offset: usize) -> Result<usize, ChainError> {
        let v = self.u128_at(offset)?;
        usize::try_from(v)
            .map_err(|_| ChainError::Abi(format!("length {v} at byte {offset} too large")))
    }

    /// `uint256` in head slot `index`, required to fit 128 bits.
    pub fn uint(&self, index: usize) -> Result<u128, ChainError> {
        self.u128_at(index * WORD)
    }

    /// `bool` in head slot `index`; any word other than 0 or 1 is rejected.
    pub fn boolean(&self, index: usize) -> Result<bool, ChainError> {
        match self.uint(index) {
            Ok(0) => Ok(false),
            Ok(1) => Ok(true),
            Ok(other) => Err(ChainError::Abi(format!(
                "bool slot {index} holds {other}"
            ))),
            Err(_) => Err(ChainError::Abi(format!("bool slot {index} is not 0 or 1"))),
        }
    }

    /// `string` whose offset sits in head slot `index`.
    pub fn string(&self, index: usize) -> Result<String, ChainError> {
        let offset = self.usize_at(index * WORD)?;
        let len = self.usize_at(offset)?;
        let start = offset + WORD;
        let bytes = start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| {
                ChainError::Abi(format!("string in slot {index} runs past the payload"))
            })?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| ChainError::Abi(format!("string in slot {index} is not UTF-8")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_known_vectors() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
        assert_eq!(hex::encode(selector("balanceOf(address)")), "70a08231");
        assert_eq!(
            hex::encode(topic("Transfer(address,address,uint256)")),
            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn static_args_are_one_word_each() {
        let data = encode(&[Token::Uint(7), Token::Bool(true)]);
        assert_eq!(data.len(), 64);
        assert_eq!(data[31], 7);
        assert_eq!(data[63], 1);
    }

    #[test]
    fn strings_go_to_the_tail() {
        let data = encode(&[
            Token::String("hi".into()),
            Token::String(String::new()),
            Token::Uint(86_400),
        ]);
        // 3 head words, "hi" length + one padded word, "" length word.
        assert_eq!(data.len(), 32 * 6);
        let d = Decoder::new(&data);
        assert_eq!(d.uint(0).unwrap(), 96);
        assert_eq!(d.uint(1).unwrap(), 160);
        assert_eq!(d.string(0).unwrap(), "hi");
        assert_eq!(d.string(1).unwrap(), "");
        assert_eq!(d.uint(2).unwrap(), 86_400);
    }

    #[test]
    fn call_data_starts_with_selector() {
        let data = encode_call("finalizeProposal(uint256)", &[Token::Uint(3)]);
        assert_eq!(&data[..4], &selector("finalizeProposal(uint256)"));
        assert_eq!(data.len(), 36);
    }

    #[test]
    fn bool_words_must_be_zero_or_one() {
        let data = encode(&[Token::Uint(2)]);
        assert!(matches!(Decoder::new(&data).boolean(0), Err(ChainError::Abi(_))));
    }

    #[test]
    fn oversized_uint_is_rejected() {
        let mut data = encode(&[Token::Uint(1)]);
        data[0] = 1;
        assert!(Decoder::new(&data).uint(0).is_err());
    }

    #[test]
    fn string_offset_outside_payload_is_rejected() {
        let data = encode(&[Token::Uint(4_096)]);
        assert!(Decoder::new(&data).string(0).is_err());

        let mut data = encode(&[Token::String("hello".into())]);
        // Claim a longer string than the payload holds.
        data[63] = 200;
        assert!(Decoder::new(&data).string(0).is_err());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut data = encode(&[Token::String("ab".into())]);
        data[64] = 0xff;
        assert!(Decoder::new(&data).string(0).is_err());
    }

    #[test]
    fn short_payload_is_rejected() {
        assert!(Decoder::new(&[0u8; 16]).uint(0).is_err());
    }
}
