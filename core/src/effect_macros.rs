//! Declarative macros for effect construction
//!
//! Screen reducers mostly return a single remote call wrapped in
//! `Effect::Future`; these macros keep that boilerplate out of the match arms.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use expense_tracker_core::async_effect;
///
/// async_effect! {
///     match service.delete_expense(&id).await {
///         Ok(()) => Some(ManageExpenseAction::Deleted),
///         Err(error) => Some(ManageExpenseAction::Failed { message: error.to_string() }),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` that dispatches an action later
///
/// # Example
///
/// ```rust,ignore
/// use expense_tracker_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(3),
///     action: ExpenseListAction::Load
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::Effect;
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    enum SyncAction {
        Fetched { count: usize },
        Retry,
    }

    #[test]
    fn async_effect_builds_future() {
        let effect = async_effect! {
            Some(SyncAction::Fetched { count: 3 })
        };

        let Effect::Future(fut) = effect else {
            panic!("expected Effect::Future");
        };
        let action = tokio_test::block_on(fut);
        assert_eq!(action, Some(SyncAction::Fetched { count: 3 }));
    }

    #[test]
    fn delay_builds_delay() {
        let effect = delay! {
            duration: Duration::from_secs(3),
            action: SyncAction::Retry
        };

        assert!(matches!(
            effect,
            Effect::Delay { duration, .. } if duration == Duration::from_secs(3)
        ));
    }
}
