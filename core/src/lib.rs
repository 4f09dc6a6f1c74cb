//! # Expense Tracker Core
//!
//! The small set of abstractions every feature of the expense tracker is
//! built from.
//!
//! ## Core Concepts
//!
//! - **State**: plain owned data for one feature (the expense list, a screen)
//! - **Action**: every input a feature reacts to, including results of remote calls
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: a description of work for the runtime (usually a remote call)
//! - **Environment**: injected dependencies (service client, clock, shared stores)
//!
//! ## Example
//!
//! ```
//! use expense_tracker_core::{effect::Effect, reducer::Reducer, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct Totals {
//!     spent: f64,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum TotalsAction {
//!     Spent(f64),
//! }
//!
//! struct TotalsReducer;
//!
//! impl Reducer for TotalsReducer {
//!     type State = Totals;
//!     type Action = TotalsAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut Totals,
//!         action: TotalsAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<TotalsAction>; 4]> {
//!         match action {
//!             TotalsAction::Spent(amount) => state.spent += amount,
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! let mut totals = Totals::default();
//! TotalsReducer.reduce(&mut totals, TotalsAction::Spent(12.5), &());
//! assert!((totals.spent - 12.5).abs() < f64::EPSILON);
//! ```

pub use smallvec::{SmallVec, smallvec};

/// Declarative helpers for building effects
pub mod effect_macros;

/// Reducer module - the single place where feature state changes
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait
    ///
    /// A reducer receives the current state by mutable reference, applies one
    /// action to it and returns descriptions of the side effects that should
    /// follow. Reducers never perform I/O themselves.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Apply `action` to `state` and return the follow-up effects
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values. The runtime executes them after the reducer returns
/// and feeds any produced action back into the same store.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Boxed future produced by [`Effect::Future`]
    pub type EffectFuture<Action> = Pin<Box<dyn Future<Output = Option<Action>> + Send>>;

    /// Effect type - describes a side effect to be executed by the runtime
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently
        Parallel(Vec<Effect<Action>>),

        /// Run effects one after another
        Sequential(Vec<Effect<Action>>),

        /// Dispatch an action after a delay
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after the delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// If the future resolves to `Some(action)`, the action is fed back
        /// into the reducer.
        Future(EffectFuture<Action>),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Whether this effect does nothing
        #[must_use]
        pub fn is_none(&self) -> bool {
            match self {
                Effect::None => true,
                Effect::Parallel(effects) | Effect::Sequential(effects) => {
                    effects.iter().all(Effect::is_none)
                },
                Effect::Delay { .. } | Effect::Future(_) => false,
            }
        }
    }
}

/// Environment module - dependency injection traits
pub mod environment {
    use chrono::{DateTime, Local, NaiveDate, Utc};

    /// Clock trait - abstracts "now" so date filters are testable
    ///
    /// ```
    /// use expense_tracker_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// println!("today is {}", clock.today());
    /// ```
    pub trait Clock: Send + Sync {
        /// Current instant
        fn now(&self) -> DateTime<Utc>;

        /// Current calendar date as the user sees it
        ///
        /// Defaults to the UTC date of [`Clock::now`].
        fn today(&self) -> NaiveDate {
            self.now().date_naive()
        }
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }

        fn today(&self) -> NaiveDate {
            Local::now().date_naive()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use std::time::Duration;

    #[derive(Clone, Debug)]
    enum Ping {
        Pong,
    }

    #[test]
    fn nested_none_effects_are_none() {
        let effect: Effect<Ping> =
            Effect::merge(vec![Effect::None, Effect::chain(vec![Effect::None])]);
        assert!(effect.is_none());
    }

    #[test]
    fn delay_is_not_none() {
        let effect = Effect::Delay {
            duration: Duration::from_millis(5),
            action: Box::new(Ping::Pong),
        };
        assert!(!effect.is_none());
        assert!(format!("{effect:?}").starts_with("Effect::Delay"));
    }
}
