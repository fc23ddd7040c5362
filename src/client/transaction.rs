use crate::core::errors::EntityError;
use serde_json::Value;
use tracing::debug;

pub const TRANSACTION_ID_FIELD: &str = "transaction_id";

/// Client-side view of the server transaction, if any
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransactionState {
    #[default]
    Idle,
    Active(String),
}

/// Tracks at most one active transaction id per client
///
/// The id is a convenience cache: explicit ids always win, and the cache is
/// dropped as soon as a commit or rollback is issued because the server
/// treats each id as single-use.
#[derive(Debug, Default)]
pub struct TransactionTracker {
    state: TransactionState,
}

impl TransactionTracker {
    pub const fn new() -> Self {
        Self {
            state: TransactionState::Idle,
        }
    }

    pub const fn state(&self) -> &TransactionState {
        &self.state
    }

    pub fn active(&self) -> Option<&str> {
        match &self.state {
            TransactionState::Idle => None,
            TransactionState::Active(tx_id) => Some(tx_id),
        }
    }

    /// `start` is only valid from `Idle`
    pub fn ensure_idle(&self) -> Result<(), EntityError> {
        match &self.state {
            TransactionState::Idle => Ok(()),
            TransactionState::Active(active) => Err(EntityError::TransactionAlreadyActive {
                active: active.clone(),
            }),
        }
    }

    /// `Idle -> Active(tx_id)`
    pub fn activate(&mut self, tx_id: String) -> Result<(), EntityError> {
        self.ensure_idle()?;
        debug!(transaction_id = %tx_id, "Transaction started");
        self.state = TransactionState::Active(tx_id);
        Ok(())
    }

    /// Explicit id if given, otherwise the active one
    pub fn resolve<'a>(&'a self, explicit: Option<&'a str>) -> Option<&'a str> {
        explicit.filter(|id| !id.is_empty()).or_else(|| self.active())
    }

    /// Resolve the id for a terminal action and return to `Idle`
    ///
    /// The tracker is cleared whether or not the request that follows
    /// succeeds. Fails with [`EntityError::NoActiveTransaction`] when there is
    /// nothing to resolve.
    pub fn finish(&mut self, explicit: Option<&str>) -> Result<String, EntityError> {
        let tx_id = self
            .resolve(explicit)
            .map(str::to_string)
            .ok_or(EntityError::NoActiveTransaction)?;

        if let TransactionState::Active(previous) = std::mem::take(&mut self.state) {
            debug!(transaction_id = %previous, "Transaction cleared");
        }
        Ok(tx_id)
    }
}

/// Pull the server-issued id out of a `transaction/start` response
pub fn parse_transaction_id(body: &str) -> Result<String, EntityError> {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|value| value.get(TRANSACTION_ID_FIELD))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| EntityError::TransactionIdMissing {
            body: body.to_string(),
        })
}
