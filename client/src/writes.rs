//! Lifecycle of one user-initiated write.

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

use symposium_types::TxHash;

use crate::ClientError;

/// `Idle → Pending → Confirming(hash) → Success(hash) | Error(reason)`.
///
/// `Success` and `Error` are terminal until dismissed back to `Idle`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus {
    Idle,
    /// Speculative change applied, transaction being submitted.
    Pending,
    /// Submitted; waiting for the receipt.
    Confirming(TxHash),
    Success(TxHash),
    Error(String),
}

impl TxStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Error(_))
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirming(_))
    }

    pub fn hash(&self) -> Option<&TxHash> {
        match self {
            Self::Confirming(h) | Self::Success(h) => Some(h),
            _ => None,
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Pending => f.write_str("waiting for wallet confirmation"),
            Self::Confirming(h) => write!(f, "confirming {h}"),
            Self::Success(h) => write!(f, "confirmed {h}"),
            Self::Error(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Observable status of one write slot. Clones share the same status.
#[derive(Clone, Debug)]
pub struct WriteTracker {
    tx: Arc<watch::Sender<TxStatus>>,
}

impl WriteTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(TxStatus::Idle);
        Self { tx: Arc::new(tx) }
    }

    pub fn status(&self) -> TxStatus {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TxStatus> {
        self.tx.subscribe()
    }

    /// Start a write. Allowed from `Idle` or a terminal state, which is
    /// how a retry begins.
    pub(crate) fn begin(&self) -> Result<(), ClientError> {
        let mut refused = false;
        self.tx.send_if_modified(|status| {
            if status.is_in_flight() {
                refused = true;
                false
            } else {
                *status = TxStatus::Pending;
                true
            }
        });
        if refused {
            Err(ClientError::WriteInFlight)
        } else {
            Ok(())
        }
    }

    pub(crate) fn confirming(&self, hash: TxHash) {
        self.tx.send_replace(TxStatus::Confirming(hash));
    }

    pub(crate) fn succeed(&self, hash: TxHash) {
        self.tx.send_replace(TxStatus::Success(hash));
    }

    pub(crate) fn fail(&self, reason: impl Into<String>) {
        self.tx.send_replace(TxStatus::Error(reason.into()));
    }

    /// Back to `Idle` from a terminal state. Returns whether it moved.
    pub fn dismiss(&self) -> bool {
        self.tx.send_if_modified(|status| {
            if status.is_terminal() {
                *status = TxStatus::Idle;
                true
            } else {
                false
            }
        })
    }
}

impl Default for WriteTracker {
    fn default() -> Self {
        Self::new()
    }
}
