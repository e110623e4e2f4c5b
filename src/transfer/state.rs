//! Transfer states
//!
//! Lifecycle states of a single transfer operation.

use std::fmt;

/// Stage a transfer operation is in.
///
/// `Succeeded`, `Failed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    Created,
    Validating,
    ResolvingLocation,
    Exchanging,
    Persisting,
    Succeeded,
    Failed,
    Cancelled,
}

impl TransferState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferState::Succeeded | TransferState::Failed | TransferState::Cancelled
        )
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferState::Created => "created",
            TransferState::Validating => "validating",
            TransferState::ResolvingLocation => "resolving location",
            TransferState::Exchanging => "exchanging",
            TransferState::Persisting => "persisting",
            TransferState::Succeeded => "succeeded",
            TransferState::Failed => "failed",
            TransferState::Cancelled => "cancelled",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_outcome_states_are_terminal() {
        let terminal: Vec<TransferState> = [
            TransferState::Created,
            TransferState::Validating,
            TransferState::ResolvingLocation,
            TransferState::Exchanging,
            TransferState::Persisting,
            TransferState::Succeeded,
            TransferState::Failed,
            TransferState::Cancelled,
        ]
        .into_iter()
        .filter(|s| s.is_terminal())
        .collect();

        assert_eq!(
            terminal,
            vec![TransferState::Succeeded, TransferState::Failed, TransferState::Cancelled]
        );
    }
}
