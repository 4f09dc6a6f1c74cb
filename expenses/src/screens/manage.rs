//! The add/edit expense screen.
//!
//! The screen owns an [`ExpenseForm`]. A valid submission is sent to the
//! remote service first; only a confirmed result is written to the
//! [`ExpenseStore`](crate::store::ExpenseStore), after which the screen asks
//! to be dismissed. Failures leave the store untouched and put the screen in
//! [`ScreenStatus::Error`] until [`ManageExpenseAction::DismissError`].

use super::{Navigation, ScreenEnvironment, ScreenStatus};
use crate::form::{ExpenseForm, Field};
use crate::service::ServiceError;
use crate::types::{Expense, ExpenseDraft, ExpenseId};
use expense_tracker_core::{SmallVec, async_effect, effect::Effect, reducer::Reducer, smallvec};
use expense_tracker_runtime::Store;
use std::sync::Arc;

/// Shown when the remote create fails
pub const ADD_FAILED_MESSAGE: &str = "could not add expense";
/// Shown when the remote update fails
pub const EDIT_FAILED_MESSAGE: &str = "could not edit expense";
/// Shown when the remote delete fails
pub const DELETE_FAILED_MESSAGE: &str = "could not delete expense";

/// What the screen was opened for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpenseMode {
    /// Create a new expense
    Add,
    /// Change or delete an existing expense
    Edit(ExpenseId),
}

/// State of the add/edit screen
#[derive(Clone, Debug, PartialEq)]
pub struct ManageExpenseState {
    mode: ExpenseMode,
    form: ExpenseForm,
    status: ScreenStatus,
    navigation: Option<Navigation>,
}

impl ManageExpenseState {
    /// Screen with a blank form
    #[must_use]
    pub fn add() -> Self {
        Self::with_form(ExpenseMode::Add, ExpenseForm::new())
    }

    /// Screen editing `expense`, form prefilled from it
    #[must_use]
    pub fn edit(expense: &Expense) -> Self {
        Self::with_form(
            ExpenseMode::Edit(expense.id.clone()),
            ExpenseForm::with_defaults(Some(expense)),
        )
    }

    fn with_form(mode: ExpenseMode, form: ExpenseForm) -> Self {
        Self {
            mode,
            form,
            status: ScreenStatus::Idle,
            navigation: None,
        }
    }

    /// Add or edit
    #[must_use]
    pub const fn mode(&self) -> &ExpenseMode {
        &self.mode
    }

    /// Whether an existing expense is being edited
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        matches!(self.mode, ExpenseMode::Edit(_))
    }

    /// Screen title
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self.mode {
            ExpenseMode::Add => "Add Expense",
            ExpenseMode::Edit(_) => "Edit Expense",
        }
    }

    /// The form being filled in
    #[must_use]
    pub const fn form(&self) -> &ExpenseForm {
        &self.form
    }

    /// Loading and error state
    #[must_use]
    pub const fn status(&self) -> &ScreenStatus {
        &self.status
    }

    /// Navigation requested by the screen, if any
    #[must_use]
    pub const fn navigation(&self) -> Option<Navigation> {
        self.navigation
    }

    /// Whether the screen asked to be dismissed
    #[must_use]
    pub const fn is_dismissed(&self) -> bool {
        matches!(self.navigation, Some(Navigation::Back))
    }
}

impl Default for ManageExpenseState {
    fn default() -> Self {
        Self::add()
    }
}

/// Actions of the add/edit screen
#[derive(Clone, Debug, PartialEq)]
pub enum ManageExpenseAction {
    /// Text typed into a form field
    Input {
        /// Edited field
        field: Field,
        /// Full new text of the field
        value: String,
    },
    /// Confirm button pressed: validate the form, then confirm the draft
    Submit,
    /// Persist an already validated draft
    Confirm {
        /// Validated values
        draft: ExpenseDraft,
    },
    /// Delete the edited expense
    Delete,
    /// Leave without saving
    Cancel,
    /// Acknowledge the error message
    DismissError,

    /// Remote create succeeded and the store holds the new expense
    Added {
        /// Service-assigned id
        id: ExpenseId,
    },
    /// Remote update succeeded and the store was updated
    Updated,
    /// Remote delete succeeded and the store dropped the expense
    Deleted,
    /// A remote call failed
    Failed {
        /// Message to show
        message: String,
    },
}

/// Reducer for the add/edit screen
#[derive(Clone, Copy, Debug, Default)]
pub struct ManageExpenseReducer;

/// Runtime store running the add/edit screen
pub type ManageExpenseStore =
    Store<ManageExpenseState, ManageExpenseAction, ScreenEnvironment, ManageExpenseReducer>;

impl ManageExpenseReducer {
    fn confirm(
        state: &mut ManageExpenseState,
        draft: ExpenseDraft,
        env: &ScreenEnvironment,
    ) -> SmallVec<[Effect<ManageExpenseAction>; 4]> {
        state.status = ScreenStatus::Submitting;
        let service = Arc::clone(&env.service);
        let expenses = env.expenses.clone();

        let effect = match state.mode.clone() {
            ExpenseMode::Add => async_effect! {
                match service.store_expense(draft.clone()).await {
                    Ok(id) => {
                        if let Err(error) = expenses.add(Expense::from_draft(id.clone(), draft)).await {
                            tracing::warn!(%id, %error, "Created expense not added locally");
                        }
                        Some(ManageExpenseAction::Added { id })
                    },
                    Err(error) => failed(ADD_FAILED_MESSAGE, &error),
                }
            },
            ExpenseMode::Edit(id) => async_effect! {
                match service.update_expense(id.clone(), draft.clone()).await {
                    Ok(()) => {
                        // The next list load resyncs a record missing locally.
                        if let Err(error) = expenses.update(id.clone(), draft).await {
                            tracing::warn!(%id, %error, "Updated expense not applied locally");
                        }
                        Some(ManageExpenseAction::Updated)
                    },
                    Err(error) => failed(EDIT_FAILED_MESSAGE, &error),
                }
            },
        };

        smallvec![effect]
    }

    fn delete(
        state: &mut ManageExpenseState,
        env: &ScreenEnvironment,
    ) -> SmallVec<[Effect<ManageExpenseAction>; 4]> {
        let ExpenseMode::Edit(id) = state.mode.clone() else {
            tracing::warn!("Delete requested while adding an expense");
            return SmallVec::new();
        };

        state.status = ScreenStatus::Submitting;
        let service = Arc::clone(&env.service);
        let expenses = env.expenses.clone();

        smallvec![async_effect! {
            match service.delete_expense(id.clone()).await {
                Ok(()) => {
                    if let Err(error) = expenses.delete(id.clone()).await {
                        tracing::warn!(%id, %error, "Deleted expense not removed locally");
                    }
                    Some(ManageExpenseAction::Deleted)
                },
                Err(error) => failed(DELETE_FAILED_MESSAGE, &error),
            }
        }]
    }
}

fn failed(message: &str, error: &ServiceError) -> Option<ManageExpenseAction> {
    tracing::warn!(%error, shown = message, "Remote expense call failed");
    Some(ManageExpenseAction::Failed {
        message: message.to_string(),
    })
}

impl Reducer for ManageExpenseReducer {
    type State = ManageExpenseState;
    type Action = ManageExpenseAction;
    type Environment = ScreenEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ManageExpenseAction::Added { .. }
            | ManageExpenseAction::Updated
            | ManageExpenseAction::Deleted => {
                state.status = ScreenStatus::Idle;
                state.navigation = Some(Navigation::Back);
            },
            ManageExpenseAction::Failed { message } => {
                state.status = ScreenStatus::Error(message);
            },

            ignored if state.status.is_submitting() => {
                tracing::debug!(action = ?ignored, "Ignoring action while submitting");
            },
            ignored
                if state.status.error().is_some()
                    && !matches!(ignored, ManageExpenseAction::DismissError) =>
            {
                tracing::debug!(action = ?ignored, "Ignoring action until the error is dismissed");
            },

            ManageExpenseAction::Input { field, value } => {
                state.form.input_changed(field, value);
            },
            ManageExpenseAction::Submit => match state.form.submit() {
                Ok(draft) => return Self::confirm(state, draft, env),
                Err(error) => {
                    tracing::debug!(invalid = ?error.invalid_fields(), "Submission rejected");
                },
            },
            ManageExpenseAction::Confirm { draft } => return Self::confirm(state, draft, env),
            ManageExpenseAction::Delete => return Self::delete(state, env),
            ManageExpenseAction::Cancel => {
                state.navigation = Some(Navigation::Back);
            },
            ManageExpenseAction::DismissError => {
                if state.status.error().is_some() {
                    state.status = ScreenStatus::Idle;
                }
            },
        }

        SmallVec::new()
    }
}
