//! Application coordinator.
//!
//! [`ExpenseApp`] builds the one [`ExpenseStore`] of the process, bundles it
//! with the service and clock into a [`ScreenEnvironment`], and opens screens
//! over it. It also runs complete screen interactions the way a UI would:
//! send actions, wait for their effects, then read the screen state.

use crate::config::AppConfig;
use crate::form::Field;
use crate::screens::list::{
    ExpenseListAction, ExpenseListReducer, ExpenseListState, ExpenseListStore, ExpensePeriod,
    ExpensesSummary,
};
use crate::screens::manage::{
    ManageExpenseAction, ManageExpenseReducer, ManageExpenseState, ManageExpenseStore,
};
use crate::screens::{ScreenEnvironment, ScreenStatus};
use crate::service::ExpenseService;
use crate::store::ExpenseStore;
use crate::types::{Expense, ExpenseId};
use expense_tracker_core::environment::Clock;
use expense_tracker_runtime::StoreError;
use std::sync::Arc;
use thiserror::Error;

/// Application errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// No loaded expense has this id
    #[error("No expense with id {0}")]
    UnknownExpense(ExpenseId),

    /// A screen store rejected an action
    #[error("Screen runtime error: {0}")]
    Runtime(#[from] StoreError),
}

/// What a list screen shows after loading
#[derive(Clone, Debug, PartialEq)]
pub struct ListView {
    /// Period label and total
    pub summary: ExpensesSummary,
    /// Visible expenses in display order
    pub expenses: Vec<Expense>,
    /// Text for an empty list
    pub fallback: &'static str,
    /// Error message, if the fetch failed
    pub error: Option<String>,
}

/// Result of driving the add/edit screen to completion
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManageOutcome {
    /// The remote call succeeded and the screen was dismissed
    Saved,
    /// The user left without saving
    Cancelled,
    /// The form was rejected; nothing was sent
    Invalid {
        /// Fields that failed validation
        fields: Vec<Field>,
        /// Aggregate message
        message: &'static str,
    },
    /// The remote call failed
    Failed(String),
    /// The screen is still open and nothing was sent
    Pending,
}

/// Main expense tracker application
#[derive(Clone, Debug)]
pub struct ExpenseApp {
    config: AppConfig,
    environment: ScreenEnvironment,
}

impl ExpenseApp {
    /// Wire the application around `service` with an empty store
    #[must_use]
    pub fn new(config: AppConfig, service: Arc<dyn ExpenseService>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            environment: ScreenEnvironment::new(service, ExpenseStore::new(), clock),
        }
    }

    /// Configuration the app was built with
    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Environment handed to every screen
    #[must_use]
    pub const fn environment(&self) -> &ScreenEnvironment {
        &self.environment
    }

    /// The shared expense store
    #[must_use]
    pub const fn expenses(&self) -> &ExpenseStore {
        &self.environment.expenses
    }

    /// Period of the recent expenses screen
    #[must_use]
    pub const fn recent_period(&self) -> ExpensePeriod {
        ExpensePeriod::LastDays(self.config.recent_days)
    }

    /// Open a list screen; it still has to be sent [`ExpenseListAction::Load`]
    #[must_use]
    pub fn list_screen(&self, period: ExpensePeriod) -> ExpenseListStore {
        ExpenseListStore::new(
            ExpenseListState::new(period),
            ExpenseListReducer,
            self.environment.clone(),
        )
    }

    /// Open the add screen
    #[must_use]
    pub fn add_screen(&self) -> ManageExpenseStore {
        self.manage_screen(ManageExpenseState::add())
    }

    /// Open the edit screen for a loaded expense
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UnknownExpense`] if the store does not hold `id`.
    pub async fn edit_screen(&self, id: &ExpenseId) -> Result<ManageExpenseStore, AppError> {
        let expense = self
            .expenses()
            .get(id)
            .await
            .ok_or_else(|| AppError::UnknownExpense(id.clone()))?;
        Ok(self.manage_screen(ManageExpenseState::edit(&expense)))
    }

    fn manage_screen(&self, state: ManageExpenseState) -> ManageExpenseStore {
        ManageExpenseStore::new(state, ManageExpenseReducer, self.environment.clone())
    }

    /// Load a list screen and render it
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Runtime`] if the screen store is shutting down.
    #[tracing::instrument(skip(self), fields(period = %period))]
    pub async fn show(&self, period: ExpensePeriod) -> Result<ListView, AppError> {
        let screen = self.list_screen(period);
        let mut handle = screen.send(ExpenseListAction::Load).await?;
        handle.wait().await;
        Ok(self.render(&screen).await)
    }

    /// Render a list screen from the current store contents
    pub async fn render(&self, screen: &ExpenseListStore) -> ListView {
        let state = screen.state(ExpenseListState::clone).await;
        let expenses = state.visible(self.expenses(), self.environment.today()).await;
        ListView {
            summary: state.summary(&expenses),
            expenses,
            fallback: state.fallback_text(),
            error: state.status().error().map(str::to_string),
        }
    }

    /// Send `actions` to an add/edit screen in order and report the outcome
    ///
    /// Each action's effects are awaited before the next one is sent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Runtime`] if the screen store is shutting down.
    pub async fn run_manage<I>(
        &self,
        screen: &ManageExpenseStore,
        actions: I,
    ) -> Result<ManageOutcome, AppError>
    where
        I: IntoIterator<Item = ManageExpenseAction>,
    {
        let mut cancelled = false;
        for action in actions {
            cancelled |= matches!(action, ManageExpenseAction::Cancel);
            let mut handle = screen.send(action).await?;
            handle.wait().await;
        }

        let state = screen.state(ManageExpenseState::clone).await;
        let outcome = if let ScreenStatus::Error(message) = state.status() {
            ManageOutcome::Failed(message.clone())
        } else if state.form().is_invalid() {
            ManageOutcome::Invalid {
                fields: Field::ALL
                    .into_iter()
                    .filter(|&field| state.form().field(field).is_invalid())
                    .collect(),
                message: state.form().error_message().unwrap_or_default(),
            }
        } else if state.is_dismissed() && cancelled {
            ManageOutcome::Cancelled
        } else if state.is_dismissed() {
            ManageOutcome::Saved
        } else {
            ManageOutcome::Pending
        };

        tracing::debug!(?outcome, "Manage screen finished");
        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::service::InMemoryExpenseService;
    use chrono::NaiveDate;
    use expense_tracker_testing::test_clock;

    fn app(service: &InMemoryExpenseService) -> ExpenseApp {
        ExpenseApp::new(
            AppConfig::default(),
            Arc::new(service.clone()),
            Arc::new(test_clock()),
        )
    }

    #[tokio::test]
    async fn edit_screen_needs_loaded_expense() {
        let expense = Expense::new(
            "e7",
            "bus",
            2.0,
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        );
        let service = InMemoryExpenseService::with_expenses(vec![expense.clone()]);
        let app = app(&service);

        let missing = app.edit_screen(&expense.id).await.err();
        assert_eq!(missing, Some(AppError::UnknownExpense(expense.id.clone())));

        let view = app.show(ExpensePeriod::All).await.unwrap();
        assert_eq!(view.expenses, vec![expense.clone()]);
        assert!(app.edit_screen(&expense.id).await.is_ok());
    }

    #[tokio::test]
    async fn cancel_reports_cancelled() {
        let app = app(&InMemoryExpenseService::new());
        let screen = app.add_screen();
        let outcome = app
            .run_manage(&screen, [ManageExpenseAction::Cancel])
            .await
            .unwrap();
        assert_eq!(outcome, ManageOutcome::Cancelled);
    }

    #[tokio::test]
    async fn ignored_actions_leave_screen_pending() {
        let service = InMemoryExpenseService::new();
        let app = app(&service);
        let screen = app.add_screen();

        let outcome = app
            .run_manage(&screen, [ManageExpenseAction::Delete])
            .await
            .unwrap();
        assert_eq!(outcome, ManageOutcome::Pending);

        let outcome = app.run_manage(&screen, Vec::new()).await.unwrap();
        assert_eq!(outcome, ManageOutcome::Pending);
        assert!(service.calls().await.is_empty());
    }

    #[tokio::test]
    async fn empty_list_shows_fallback() {
        let app = app(&InMemoryExpenseService::new());
        let view = app.show(app.recent_period()).await.unwrap();
        assert!(view.expenses.is_empty());
        assert_eq!(view.fallback, "No recent expenses");
        assert_eq!(view.summary.period, "Last 7 Days");
        assert_eq!(view.error, None);
    }
}
