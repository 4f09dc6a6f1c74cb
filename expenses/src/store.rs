//! The in-memory expense store.
//!
//! [`ExpensesReducer`] is the only code that changes the expense list. It is
//! run by an [`expense_tracker_runtime::Store`], and [`ExpenseStore`] is the
//! handle the rest of the application holds: built once at start-up and
//! cloned into every screen environment.

use crate::types::{Expense, ExpenseChanges, ExpenseId};
use chrono::{Days, NaiveDate};
use expense_tracker_core::{SmallVec, effect::Effect, reducer::Reducer};
use expense_tracker_runtime::{Store, StoreError};
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors reported by expense store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpenseStoreError {
    /// No stored expense has this id
    #[error("Expense {0} not found")]
    NotFound(ExpenseId),

    /// An expense with this id is already stored
    #[error("Expense {0} already exists")]
    DuplicateId(ExpenseId),

    /// The underlying runtime rejected the action
    #[error(transparent)]
    Runtime(#[from] StoreError),
}

/// Ordered expense list, newest first
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpensesState {
    expenses: Vec<Expense>,
    last_error: Option<ExpenseStoreError>,
}

impl ExpensesState {
    /// State holding `expenses` in the given order
    #[must_use]
    pub const fn with_expenses(expenses: Vec<Expense>) -> Self {
        Self {
            expenses,
            last_error: None,
        }
    }

    /// All expenses in display order
    #[must_use]
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    /// Number of stored expenses
    #[must_use]
    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    /// Look up an expense by id
    #[must_use]
    pub fn get(&self, id: &ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|expense| &expense.id == id)
    }

    /// Whether an expense with this id is stored
    #[must_use]
    pub fn contains(&self, id: &ExpenseId) -> bool {
        self.get(id).is_some()
    }

    /// Expenses dated strictly after `today - days`, in display order
    ///
    /// Recomputed on every call.
    #[must_use]
    pub fn recent(&self, today: NaiveDate, days: u32) -> Vec<Expense> {
        let Some(cutoff) = today.checked_sub_days(Days::new(u64::from(days))) else {
            return self.expenses.clone();
        };
        self.expenses
            .iter()
            .filter(|expense| expense.date > cutoff)
            .cloned()
            .collect()
    }

    /// Outcome of the most recent action, `None` when it succeeded
    #[must_use]
    pub const fn last_error(&self) -> Option<&ExpenseStoreError> {
        self.last_error.as_ref()
    }
}

/// Mutations of the expense list
#[derive(Clone, Debug, PartialEq)]
pub enum ExpensesAction {
    /// Replace the whole list, keeping the given order
    Set {
        /// Full result of a remote list fetch
        expenses: Vec<Expense>,
    },
    /// Prepend a persisted expense
    Add {
        /// Expense with a service-assigned id
        expense: Expense,
    },
    /// Merge changes into an expense in place
    Update {
        /// Target expense
        id: ExpenseId,
        /// Fields to overwrite
        changes: ExpenseChanges,
    },
    /// Remove an expense; unknown ids are ignored
    Delete {
        /// Target expense
        id: ExpenseId,
    },
}

/// Reducer for the expense list
#[derive(Clone, Copy, Debug, Default)]
pub struct ExpensesReducer;

impl Reducer for ExpensesReducer {
    type State = ExpensesState;
    type Action = ExpensesAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        state.last_error = None;

        match action {
            ExpensesAction::Set { expenses } => {
                tracing::debug!(count = expenses.len(), "Replacing expenses");
                state.expenses = expenses;
            },
            ExpensesAction::Add { expense } => {
                if state.contains(&expense.id) {
                    tracing::warn!(id = %expense.id, "Refusing to add duplicate expense");
                    state.last_error = Some(ExpenseStoreError::DuplicateId(expense.id));
                } else {
                    state.expenses.insert(0, expense);
                }
            },
            ExpensesAction::Update { id, changes } => {
                match state.expenses.iter_mut().find(|expense| expense.id == id) {
                    Some(expense) => expense.apply(changes),
                    None => {
                        tracing::debug!(%id, "Update for unknown expense");
                        state.last_error = Some(ExpenseStoreError::NotFound(id));
                    },
                }
            },
            ExpensesAction::Delete { id } => {
                state.expenses.retain(|expense| expense.id != id);
            },
        }

        SmallVec::new()
    }
}

/// Actions an observer may fall behind before it starts lagging
const APPLIED_CAPACITY: usize = 64;

/// Runtime store specialised to the expense list
pub type ExpensesRuntime = Store<ExpensesState, ExpensesAction, (), ExpensesReducer>;

/// Shared handle to the expense list
///
/// Clones share the same list. Every mutation goes through
/// [`ExpenseStore::dispatch`].
#[derive(Clone)]
pub struct ExpenseStore {
    runtime: ExpensesRuntime,
    applied: broadcast::Sender<ExpensesAction>,
}

impl ExpenseStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(ExpensesState::default())
    }

    /// Store seeded with `expenses` in the given order
    #[must_use]
    pub fn with_expenses(expenses: Vec<Expense>) -> Self {
        Self::with_state(ExpensesState::with_expenses(expenses))
    }

    fn with_state(state: ExpensesState) -> Self {
        let (applied, _) = broadcast::channel(APPLIED_CAPACITY);
        Self {
            runtime: Store::new(state, ExpensesReducer, ()),
            applied,
        }
    }

    /// Apply one action
    ///
    /// # Errors
    ///
    /// - [`ExpenseStoreError::NotFound`] for an update of an unknown id
    /// - [`ExpenseStoreError::DuplicateId`] for an add of a stored id
    /// - [`ExpenseStoreError::Runtime`] if the runtime is shutting down
    pub async fn dispatch(&self, action: ExpensesAction) -> Result<(), ExpenseStoreError> {
        let observed = action.clone();
        let (_handle, outcome) = self
            .runtime
            .send_and_inspect(action, |state| {
                // Published under the state lock so observers see mutation order.
                if state.last_error.is_none() {
                    let _ = self.applied.send(observed);
                }
                state.last_error.clone()
            })
            .await?;
        outcome.map_or(Ok(()), Err)
    }

    /// Replace the list with a fresh fetch result
    ///
    /// # Errors
    ///
    /// See [`ExpenseStore::dispatch`].
    pub async fn set(&self, expenses: Vec<Expense>) -> Result<(), ExpenseStoreError> {
        self.dispatch(ExpensesAction::Set { expenses }).await
    }

    /// Prepend a persisted expense
    ///
    /// # Errors
    ///
    /// See [`ExpenseStore::dispatch`].
    pub async fn add(&self, expense: Expense) -> Result<(), ExpenseStoreError> {
        self.dispatch(ExpensesAction::Add { expense }).await
    }

    /// Merge changes into a stored expense
    ///
    /// # Errors
    ///
    /// See [`ExpenseStore::dispatch`].
    pub async fn update(
        &self,
        id: ExpenseId,
        changes: impl Into<ExpenseChanges>,
    ) -> Result<(), ExpenseStoreError> {
        self.dispatch(ExpensesAction::Update {
            id,
            changes: changes.into(),
        })
        .await
    }

    /// Remove an expense
    ///
    /// # Errors
    ///
    /// See [`ExpenseStore::dispatch`].
    pub async fn delete(&self, id: ExpenseId) -> Result<(), ExpenseStoreError> {
        self.dispatch(ExpensesAction::Delete { id }).await
    }

    /// Snapshot of all expenses in display order
    pub async fn expenses(&self) -> Vec<Expense> {
        self.runtime.state(|state| state.expenses.clone()).await
    }

    /// Snapshot of one expense
    pub async fn get(&self, id: &ExpenseId) -> Option<Expense> {
        self.runtime.state(|state| state.get(id).cloned()).await
    }

    /// Expenses dated within the last `days` days of `today`
    pub async fn recent(&self, today: NaiveDate, days: u32) -> Vec<Expense> {
        self.runtime.state(|state| state.recent(today, days)).await
    }

    /// Read the state through a closure
    pub async fn read<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&ExpensesState) -> T,
    {
        self.runtime.state(f).await
    }

    /// Observe every action the reducer applied
    ///
    /// Refused actions (a duplicate add, an update of an unknown id) are
    /// not published.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ExpensesAction> {
        self.applied.subscribe()
    }
}

impl Default for ExpenseStore {
    fn default() -> Self {
        Self::new()
    }
}
