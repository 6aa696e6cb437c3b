use std::fmt::Debug;

use cosmwasm_std::{StdError, StdResult};

pub struct Transition<T> {
    pub from: T,
    pub to: T,
}

pub struct Fsm<T: 'static> {
    state: T,
    pub transitions: &'static [Transition<T>],
}

impl<T: PartialEq + Debug> Fsm<T> {
    pub const fn new(initial_state: T, transitions: &'static [Transition<T>]) -> Self {
        Self {
            state: initial_state,
            transitions,
        }
    }

    pub fn current_state(&self) -> &T {
        &self.state
    }

    pub fn can_go_to(&self, to: &T) -> bool {
        self.transitions
            .iter()
            .any(|transition| transition.from == self.state && transition.to == *to)
    }

    pub fn go_to(&mut self, to: T) -> StdResult<()> {
        if self.can_go_to(&to) {
            self.state = to;
            Ok(())
        } else {
            Err(StdError::generic_err(format!(
                "FSM transition from {:?} to {:?} is not allowed",
                self.state, to
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Light {
        Red,
        Green,
        Yellow,
    }

    const TRANSITIONS: &[Transition<Light>] = &[
        Transition {
            from: Light::Red,
            to: Light::Green,
        },
        Transition {
            from: Light::Green,
            to: Light::Yellow,
        },
    ];

    #[test]
    fn test_allowed_transitions() {
        let mut fsm = Fsm::new(Light::Red, TRANSITIONS);
        fsm.go_to(Light::Green).unwrap();
        fsm.go_to(Light::Yellow).unwrap();
        assert_eq!(fsm.current_state(), &Light::Yellow);
    }

    #[test]
    fn test_skipping_a_state_is_rejected() {
        let mut fsm = Fsm::new(Light::Red, TRANSITIONS);
        let err = fsm.go_to(Light::Yellow).unwrap_err();
        assert_eq!(
            err,
            StdError::generic_err("FSM transition from Red to Yellow is not allowed")
        );
        assert_eq!(fsm.current_state(), &Light::Red);
    }
}
