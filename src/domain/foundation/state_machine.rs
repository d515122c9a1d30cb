//! Validated transitions for mode enums.

use super::ValidationError;

/// Implemented by enums whose values form a finite state machine.
///
/// Implementors list the allowed edges; `transition_to` turns an edge check
/// into a `Result` so callers can propagate illegal moves with `?`.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if moving from `self` to `target` is allowed.
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Returns every state reachable in one step.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs the transition, failing on an edge the machine does not allow.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Door {
        Open,
        Closed,
        Locked,
    }

    impl StateMachine for Door {
        fn can_transition_to(&self, target: &Self) -> bool {
            use Door::*;
            matches!((self, target), (Open, Closed) | (Closed, Open) | (Closed, Locked) | (Locked, Closed))
        }

        fn valid_transitions(&self) -> Vec<Self> {
            use Door::*;
            match self {
                Open => vec![Closed],
                Closed => vec![Open, Locked],
                Locked => vec![Closed],
            }
        }
    }

    #[test]
    fn allowed_edge_returns_target() {
        assert_eq!(Door::Closed.transition_to(Door::Locked), Ok(Door::Locked));
    }

    #[test]
    fn forbidden_edge_is_rejected() {
        let err = Door::Open.transition_to(Door::Locked).unwrap_err();
        assert!(err.to_string().contains("Cannot transition from Open to Locked"));
    }

    #[test]
    fn valid_transitions_agree_with_edge_check() {
        for door in [Door::Open, Door::Closed, Door::Locked] {
            for target in door.valid_transitions() {
                assert!(door.can_transition_to(&target));
            }
        }
    }
}
