//! # Expense Tracker Runtime
//!
//! The [`Store`](store::Store) runs a reducer: it owns the state, applies
//! actions one at a time under a write lock, executes the effects the reducer
//! returns and feeds any actions those effects produce back into itself.
//!
//! ## Example
//!
//! ```ignore
//! use expense_tracker_runtime::Store;
//!
//! let store = Store::new(ExpensesState::default(), ExpensesReducer, ());
//!
//! let mut handle = store.send(ExpensesAction::Delete { id }).await?;
//! handle.wait().await;
//!
//! let count = store.state(|s| s.len()).await;
//! ```

use expense_tracker_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timed out waiting for effects to complete
        #[error("Timed out waiting for effects")]
        Timeout,
    }
}

pub use error::StoreError;
pub use store::Store;

/// Handle for tracking effect completion
///
/// Returned by [`Store::send`]. Waiting on it returns once every effect
/// started by the action has finished, including effects started by actions
/// those effects fed back into the store.
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };
        let tracking = EffectTracking {
            counter,
            notifier: Arc::new(tx),
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (handle, _tracking) = Self::new();
        handle
    }

    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.effects.load(Ordering::SeqCst)
    }

    /// Wait for all tracked effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                // Every tracker is gone, nothing can still be running.
                break;
            }
        }
    }

    /// Wait for all tracked effects with an upper bound
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still running when the
    /// timeout expires.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.pending())
            .finish_non_exhaustive()
    }
}

/// Tracking context carried through effect execution and feedback
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: Arc<watch::Sender<()>>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// RAII guard that marks one effect as finished, even if it panics
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard for the store-wide pending effect counter used by shutdown
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Store module - the runtime for reducers
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicUsize, DecrementGuard, Duration, Effect, EffectHandle,
        EffectTracking, Ordering, PendingGuard, Reducer, RwLock, StoreError,
    };
    use expense_tracker_core::SmallVec;
    use tokio::sync::broadcast;

    struct Inner<S, A, E, R> {
        state: RwLock<S>,
        reducer: R,
        environment: E,
        shutdown: AtomicBool,
        pending_effects: Arc<AtomicUsize>,
        actions: broadcast::Sender<A>,
    }

    /// The Store - runtime coordinator for a reducer
    ///
    /// Cloning a store is cheap and every clone shares the same state.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        inner: Arc<Inner<S, A, E, R>>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_broadcast_capacity(initial_state, reducer, environment, 64)
        }

        /// Create a store with a custom action broadcast capacity
        ///
        /// Observers that fall more than `capacity` actions behind start
        /// missing actions (see [`broadcast::error::RecvError::Lagged`]).
        #[must_use]
        pub fn with_broadcast_capacity(
            initial_state: S,
            reducer: R,
            environment: E,
            capacity: usize,
        ) -> Self {
            let (actions, _) = broadcast::channel(capacity.max(1));

            Self {
                inner: Arc::new(Inner {
                    state: RwLock::new(initial_state),
                    reducer,
                    environment,
                    shutdown: AtomicBool::new(false),
                    pending_effects: Arc::new(AtomicUsize::new(0)),
                    actions,
                }),
            }
        }

        /// Send an action to the store
        ///
        /// The reducer runs immediately under the state write lock; effects
        /// are spawned afterwards. The returned handle can be awaited for
        /// effect completion.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError> {
            let (handle, tracking) = EffectHandle::new();
            self.send_tracked(action, tracking).await?;
            Ok(handle)
        }

        /// Send an action and inspect the resulting state atomically
        ///
        /// `inspect` runs while the write lock taken for the reducer is still
        /// held, so no other action can be applied in between. This is how
        /// callers learn the outcome of an action that reports through state.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        pub async fn send_and_inspect<F, T>(
            &self,
            action: A,
            inspect: F,
        ) -> Result<(EffectHandle, T), StoreError>
        where
            F: FnOnce(&S) -> T,
        {
            let (handle, tracking) = EffectHandle::new();
            self.check_running()?;

            let (effects, value) = {
                let mut state = self.inner.state.write().await;
                let effects = self.reduce_locked(&mut state, action);
                let value = inspect(&state);
                (effects, value)
            };

            for effect in effects {
                self.execute(effect, tracking.clone());
            }

            Ok((handle, value))
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let count = store.state(|s| s.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.inner.state.read().await;
            f(&state)
        }

        /// Subscribe to every action the reducer processes
        ///
        /// This covers actions sent directly and actions fed back by effects,
        /// in the order they were applied.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.inner.actions.subscribe()
        }

        /// Number of effects currently running across all actions
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.inner.pending_effects.load(Ordering::SeqCst)
        }

        /// Stop accepting actions and wait for running effects to finish
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] with the number of effects
        /// still running if they do not finish within `timeout`.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            self.inner.shutdown.store(true, Ordering::Release);
            tracing::debug!("Store shutdown initiated");

            let deadline = tokio::time::Instant::now() + timeout;
            loop {
                let pending = self.pending_effects();
                if pending == 0 {
                    return Ok(());
                }
                if tokio::time::Instant::now() >= deadline {
                    tracing::warn!(pending, "Store shutdown timed out");
                    return Err(StoreError::ShutdownTimeout(pending));
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }

        fn check_running(&self) -> Result<(), StoreError> {
            if self.inner.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }
            Ok(())
        }

        fn reduce_locked(&self, state: &mut S, action: A) -> SmallVec<[Effect<A>; 4]> {
            metrics::counter!("store.actions.total").increment(1);
            let _ = self.inner.actions.send(action.clone());

            let start = std::time::Instant::now();
            let effects = self
                .inner
                .reducer
                .reduce(state, action, &self.inner.environment);
            metrics::histogram!("store.reducer.duration_seconds")
                .record(start.elapsed().as_secs_f64());

            tracing::trace!(effects = effects.len(), "Reducer completed");
            effects
        }

        async fn send_tracked(
            &self,
            action: A,
            tracking: EffectTracking,
        ) -> Result<(), StoreError> {
            self.check_running()?;
            tracing::debug!("Processing action");

            let effects = {
                let mut state = self.inner.state.write().await;
                self.reduce_locked(&mut state, action)
            };

            for effect in effects {
                self.execute(effect, tracking.clone());
            }
            Ok(())
        }

        fn spawn_tracked<F>(&self, tracking: &EffectTracking, fut: F)
        where
            F: std::future::Future<Output = ()> + Send + 'static,
        {
            tracking.increment();
            self.inner.pending_effects.fetch_add(1, Ordering::SeqCst);

            let guard = DecrementGuard(tracking.clone());
            let pending = PendingGuard(Arc::clone(&self.inner.pending_effects));

            tokio::spawn(async move {
                fut.await;
                drop(pending);
                drop(guard);
            });
        }

        async fn feed_back(self, action: A, tracking: EffectTracking) {
            if let Err(error) = self.send_tracked(action, tracking).await {
                tracing::warn!(%error, "Dropped action produced by effect");
            }
        }

        /// Execute an effect, spawning async work onto the tokio runtime
        fn execute(&self, effect: Effect<A>, tracking: EffectTracking) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);
                    let store = self.clone();
                    let child = tracking.clone();
                    self.spawn_tracked(&tracking, async move {
                        if let Some(action) = fut.await {
                            tracing::trace!("Effect::Future produced an action");
                            store.feed_back(action, child).await;
                        }
                    });
                },
                Effect::Delay { duration, action } => {
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);
                    let store = self.clone();
                    let child = tracking.clone();
                    self.spawn_tracked(&tracking, async move {
                        tokio::time::sleep(duration).await;
                        store.feed_back(*action, child).await;
                    });
                },
                Effect::Parallel(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);
                    for effect in effects {
                        self.execute(effect, tracking.clone());
                    }
                },
                Effect::Sequential(effects) => {
                    metrics::counter!("store.effects.executed", "type" => "sequential")
                        .increment(1);
                    let store = self.clone();
                    self.spawn_tracked(&tracking, async move {
                        for effect in effects {
                            let (mut step, step_tracking) = EffectHandle::new();
                            store.execute(effect, step_tracking);
                            step.wait().await;
                        }
                    });
                },
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use expense_tracker_core::{SmallVec, async_effect, delay, smallvec};

    #[derive(Clone, Debug, Default)]
    struct SyncState {
        requested: u32,
        fetched: Vec<u32>,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum SyncAction {
        Request(u32),
        Fetched(u32),
        RequestBoth(u32, u32),
        RequestInOrder(u32, u32),
        RequestLater(u32),
    }

    #[derive(Clone)]
    struct SyncReducer;

    impl Reducer for SyncReducer {
        type State = SyncState;
        type Action = SyncAction;
        type Environment = ();

        fn reduce(
            &self,
            state: &mut SyncState,
            action: SyncAction,
            _env: &(),
        ) -> SmallVec<[Effect<SyncAction>; 4]> {
            match action {
                SyncAction::Request(n) => {
                    state.requested += 1;
                    smallvec![async_effect! { Some(SyncAction::Fetched(n)) }]
                },
                SyncAction::Fetched(n) => {
                    state.fetched.push(n);
                    SmallVec::new()
                },
                SyncAction::RequestBoth(a, b) => smallvec![Effect::merge(vec![
                    async_effect! { Some(SyncAction::Fetched(a)) },
                    async_effect! { Some(SyncAction::Fetched(b)) },
                ])],
                SyncAction::RequestInOrder(a, b) => smallvec![Effect::chain(vec![
                    async_effect! {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Some(SyncAction::Fetched(a))
                    },
                    async_effect! { Some(SyncAction::Fetched(b)) },
                ])],
                SyncAction::RequestLater(n) => smallvec![delay! {
                    duration: Duration::from_millis(10),
                    action: SyncAction::Request(n)
                }],
            }
        }
    }

    fn store() -> Store<SyncState, SyncAction, (), SyncReducer> {
        Store::new(SyncState::default(), SyncReducer, ())
    }

    #[tokio::test]
    async fn feedback_action_is_applied_before_wait_returns() {
        let store = store();
        let mut handle = store.send(SyncAction::Request(7)).await.unwrap();
        handle.wait().await;

        let fetched = store.state(|s| s.fetched.clone()).await;
        assert_eq!(fetched, vec![7]);
        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test]
    async fn cascading_effects_are_tracked() {
        let store = store();
        let mut handle = store.send(SyncAction::RequestLater(3)).await.unwrap();
        handle
            .wait_with_timeout(Duration::from_secs(2))
            .await
            .unwrap();

        let (requested, fetched) = store.state(|s| (s.requested, s.fetched.clone())).await;
        assert_eq!(requested, 1);
        assert_eq!(fetched, vec![3]);
    }

    #[tokio::test]
    async fn parallel_effects_all_complete() {
        let store = store();
        let mut handle = store.send(SyncAction::RequestBoth(1, 2)).await.unwrap();
        handle.wait().await;

        let mut fetched = store.state(|s| s.fetched.clone()).await;
        fetched.sort_unstable();
        assert_eq!(fetched, vec![1, 2]);
    }

    #[tokio::test]
    async fn sequential_effects_keep_order() {
        let store = store();
        let mut handle = store.send(SyncAction::RequestInOrder(1, 2)).await.unwrap();
        handle.wait().await;

        assert_eq!(store.state(|s| s.fetched.clone()).await, vec![1, 2]);
    }

    #[tokio::test]
    async fn send_and_inspect_sees_reduced_state() {
        let store = store();
        let (_handle, requested) = store
            .send_and_inspect(SyncAction::Request(1), |s| s.requested)
            .await
            .unwrap();
        assert_eq!(requested, 1);
    }

    #[tokio::test]
    async fn subscribers_observe_direct_and_feedback_actions() {
        let store = store();
        let mut actions = store.subscribe_actions();

        let mut handle = store.send(SyncAction::Request(5)).await.unwrap();
        handle.wait().await;

        assert_eq!(actions.recv().await.unwrap(), SyncAction::Request(5));
        assert_eq!(actions.recv().await.unwrap(), SyncAction::Fetched(5));
    }

    #[tokio::test]
    async fn shutdown_rejects_new_actions() {
        let store = store();
        store.shutdown(Duration::from_secs(1)).await.unwrap();

        let result = store.send(SyncAction::Request(1)).await;
        assert_eq!(result.unwrap_err(), StoreError::ShutdownInProgress);
    }

    #[tokio::test]
    async fn completed_handle_does_not_block() {
        let mut handle = EffectHandle::completed();
        assert_eq!(handle.pending(), 0);
        handle.wait().await;
    }
}
