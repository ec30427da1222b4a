//! Ergonomic testing utilities for reducers
//!
//! Fluent Given-When-Then API over any [`Reducer`].

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use demoride_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion = Box<dyn FnOnce(&[Effect])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use demoride_testing::ReducerTest;
///
/// ReducerTest::new(BookingLifecycle::new())
///     .with_env(LifecycleEnvironment::new(Arc::new(test_clock())))
///     .given_state(LifecycleState::new(reserved_booking))
///     .when_action(BookingAction::Confirm)
///     .then_state(|state| {
///         assert_eq!(state.booking.status, BookingStatus::Confirmed);
///     })
///     .then_effects(|effects| {
///         assert_eq!(effects.len(), 1);
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let effects = self.reducer.reduce(&mut state, action, &env);

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use demoride_core::effect::Effect;
    use demoride_core::notification::Notification;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects(effects: &[Effect]) {
        assert!(
            effects.is_empty() || matches!(effects, [Effect::None]),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count(effects: &[Effect], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects release a seat
    ///
    /// # Panics
    ///
    /// Panics if no `ReleaseSlot` effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_releases_slot(effects: &[Effect]) {
        assert!(
            Effect::flatten(effects.to_vec())
                .iter()
                .any(|e| matches!(e, Effect::ReleaseSlot { .. })),
            "Expected a ReleaseSlot effect, but none found"
        );
    }

    /// Assert that no seat is released
    ///
    /// # Panics
    ///
    /// Panics if a `ReleaseSlot` effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_keeps_slot(effects: &[Effect]) {
        assert!(
            !Effect::flatten(effects.to_vec())
                .iter()
                .any(|e| matches!(e, Effect::ReleaseSlot { .. })),
            "Expected no ReleaseSlot effect, but found one: {effects:?}"
        );
    }

    /// Assert that exactly these notifications are emitted, in order
    ///
    /// # Panics
    ///
    /// Panics if the notifications differ.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_notifies(effects: &[Effect], expected: &[Notification]) {
        assert_eq!(Effect::notifications(effects), expected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demoride_core::effect::Effect;
    use demoride_core::reducer::Reducer;
    use demoride_core::SessionId;

    #[derive(Clone, Debug)]
    struct SeatState {
        booked: u32,
    }

    #[derive(Clone, Debug)]
    enum SeatAction {
        Take,
        Release,
    }

    struct SeatReducer;

    struct SeatEnv {
        session_id: SessionId,
    }

    impl Reducer for SeatReducer {
        type State = SeatState;
        type Action = SeatAction;
        type Environment = SeatEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Vec<Effect> {
            match action {
                SeatAction::Take => {
                    state.booked += 1;
                    vec![Effect::None]
                },
                SeatAction::Release => {
                    state.booked = state.booked.saturating_sub(1);
                    vec![Effect::ReleaseSlot {
                        session_id: env.session_id,
                    }]
                },
            }
        }
    }

    #[test]
    fn test_reducer_test_builder() {
        ReducerTest::new(SeatReducer)
            .with_env(SeatEnv {
                session_id: SessionId::new(),
            })
            .given_state(SeatState { booked: 0 })
            .when_action(SeatAction::Take)
            .then_state(|state| {
                assert_eq!(state.booked, 1);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_release_assertion() {
        ReducerTest::new(SeatReducer)
            .with_env(SeatEnv {
                session_id: SessionId::new(),
            })
            .given_state(SeatState { booked: 0 })
            .when_action(SeatAction::Release)
            .then_state(|state| {
                assert_eq!(state.booked, 0);
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_releases_slot(effects);
            })
            .run();
    }

    #[test]
    #[should_panic(expected = "Initial state must be set")]
    fn test_missing_state_panics() {
        ReducerTest::new(SeatReducer)
            .with_env(SeatEnv {
                session_id: SessionId::new(),
            })
            .when_action(SeatAction::Take)
            .run();
    }
}
