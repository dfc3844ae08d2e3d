//! Save state machine
//!
//! `Clean → Dirty → Saving → Clean` on success; a failed save returns to
//! the state it started from.

use crate::error::WorkingCopyError;

/// Editing state of a working copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveState {
    /// No unsaved mutation
    Clean,
    /// Holds unsaved mutations
    Dirty,
    /// Save in progress
    Saving,
}

impl SaveState {
    /// Whether the state counts as having unsaved mutations
    #[inline]
    #[must_use]
    pub fn is_dirty(self) -> bool {
        !matches!(self, Self::Clean)
    }
}

/// Validates a state transition.
///
/// # Errors
/// Returns `IllegalTransition` when `to` is not reachable from `from`
pub fn validate_transition(from: SaveState, to: SaveState) -> Result<(), WorkingCopyError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(WorkingCopyError::IllegalTransition { from, to })
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: SaveState) -> Vec<SaveState> {
    use SaveState::{Clean, Dirty, Saving};
    match from {
        Clean => vec![Dirty, Saving],
        Dirty => vec![Saving],
        Saving => vec![Clean, Dirty],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clean_transitions() {
        assert!(validate_transition(SaveState::Clean, SaveState::Dirty).is_ok());
        assert!(validate_transition(SaveState::Clean, SaveState::Saving).is_ok());
        assert!(validate_transition(SaveState::Clean, SaveState::Clean).is_err());
    }

    #[test]
    fn saving_cannot_restart() {
        let err = validate_transition(SaveState::Saving, SaveState::Saving).unwrap_err();
        assert!(matches!(
            err,
            WorkingCopyError::IllegalTransition {
                from: SaveState::Saving,
                to: SaveState::Saving
            }
        ));
    }

    #[test]
    fn dirty_only_moves_to_saving() {
        assert!(validate_transition(SaveState::Dirty, SaveState::Saving).is_ok());
        assert!(validate_transition(SaveState::Dirty, SaveState::Clean).is_err());
    }

    fn state() -> impl Strategy<Value = SaveState> {
        prop_oneof![
            Just(SaveState::Clean),
            Just(SaveState::Dirty),
            Just(SaveState::Saving),
        ]
    }

    proptest! {
        #[test]
        fn prop_validation_agrees_with_table(from in state(), to in state()) {
            let allowed = allowed_transitions(from);
            prop_assert_eq!(validate_transition(from, to).is_ok(), allowed.contains(&to));
        }
    }
}
