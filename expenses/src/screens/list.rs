//! Expense list screens (recent and all expenses).
//!
//! Both screens run [`ExpenseListReducer`]; they differ only in the
//! [`ExpensePeriod`] used to filter the shared store when rendering.

use super::{ScreenEnvironment, ScreenStatus};
use crate::store::ExpenseStore;
use crate::types::{Expense, total};
use chrono::NaiveDate;
use expense_tracker_core::{SmallVec, async_effect, effect::Effect, reducer::Reducer, smallvec};
use expense_tracker_runtime::Store;
use std::fmt;
use std::sync::Arc;

/// Shown when the remote list fetch fails
pub const FETCH_FAILED_MESSAGE: &str = "could not fetch expenses!";

/// Default window of the recent expenses screen, in days
pub const RECENT_DAYS: u32 = 7;

/// Which expenses a list screen shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExpensePeriod {
    /// Expenses dated within the last `n` days
    LastDays(u32),
    /// Every expense
    All,
}

impl ExpensePeriod {
    /// The recent expenses screen's period
    #[must_use]
    pub const fn recent() -> Self {
        Self::LastDays(RECENT_DAYS)
    }

    /// Label shown next to the total
    #[must_use]
    pub fn label(self) -> String {
        match self {
            Self::LastDays(days) => format!("Last {days} Days"),
            Self::All => "Total".to_string(),
        }
    }

    /// Text shown when the period holds no expenses
    #[must_use]
    pub const fn fallback_text(self) -> &'static str {
        match self {
            Self::LastDays(_) => "No recent expenses",
            Self::All => "No registered expenses found!",
        }
    }
}

impl fmt::Display for ExpensePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Header line of a list: period label and sum of the visible amounts
#[derive(Clone, Debug, PartialEq)]
pub struct ExpensesSummary {
    /// Period label
    pub period: String,
    /// Sum of the visible amounts
    pub total: f64,
}

impl fmt::Display for ExpensesSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ${:.2}", self.period, self.total)
    }
}

/// State of a list screen
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseListState {
    period: ExpensePeriod,
    status: ScreenStatus,
    in_flight: bool,
}

impl ExpenseListState {
    /// Screen about to fetch; it starts in [`ScreenStatus::Submitting`]
    #[must_use]
    pub const fn new(period: ExpensePeriod) -> Self {
        Self {
            period,
            status: ScreenStatus::Submitting,
            in_flight: false,
        }
    }

    /// Recent expenses screen
    #[must_use]
    pub const fn recent() -> Self {
        Self::new(ExpensePeriod::recent())
    }

    /// All expenses screen
    #[must_use]
    pub const fn all() -> Self {
        Self::new(ExpensePeriod::All)
    }

    /// Period shown by the screen
    #[must_use]
    pub const fn period(&self) -> ExpensePeriod {
        self.period
    }

    /// Loading and error state
    #[must_use]
    pub const fn status(&self) -> &ScreenStatus {
        &self.status
    }

    /// Expenses to render, read from the store on every call
    pub async fn visible(&self, expenses: &ExpenseStore, today: NaiveDate) -> Vec<Expense> {
        match self.period {
            ExpensePeriod::LastDays(days) => expenses.recent(today, days).await,
            ExpensePeriod::All => expenses.expenses().await,
        }
    }

    /// Summary line for `visible`
    #[must_use]
    pub fn summary(&self, visible: &[Expense]) -> ExpensesSummary {
        ExpensesSummary {
            period: self.period.label(),
            total: total(visible),
        }
    }

    /// Text shown instead of an empty list
    #[must_use]
    pub const fn fallback_text(&self) -> &'static str {
        self.period.fallback_text()
    }
}

/// Actions of a list screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpenseListAction {
    /// Fetch the full list and replace the store's contents
    Load,
    /// The store now holds the fetched list
    Loaded {
        /// Number of fetched expenses
        count: usize,
    },
    /// The fetch failed
    LoadFailed {
        /// Message to show
        message: String,
    },
    /// Acknowledge the error message
    DismissError,
}

/// Reducer shared by the list screens
#[derive(Clone, Copy, Debug, Default)]
pub struct ExpenseListReducer;

/// Runtime store running a list screen
pub type ExpenseListStore =
    Store<ExpenseListState, ExpenseListAction, ScreenEnvironment, ExpenseListReducer>;

impl Reducer for ExpenseListReducer {
    type State = ExpenseListState;
    type Action = ExpenseListAction;
    type Environment = ScreenEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ExpenseListAction::Load => {
                if state.in_flight {
                    tracing::debug!("Fetch already in flight");
                    return SmallVec::new();
                }
                state.in_flight = true;
                state.status = ScreenStatus::Submitting;

                let service = Arc::clone(&env.service);
                let expenses = env.expenses.clone();
                return smallvec![async_effect! {
                    let fetched = match service.fetch_expenses().await {
                        Ok(fetched) => fetched,
                        Err(error) => {
                            tracing::warn!(%error, "Fetching expenses failed");
                            return Some(ExpenseListAction::LoadFailed {
                                message: FETCH_FAILED_MESSAGE.to_string(),
                            });
                        },
                    };
                    let count = fetched.len();
                    match expenses.set(fetched).await {
                        Ok(()) => Some(ExpenseListAction::Loaded { count }),
                        Err(error) => {
                            tracing::warn!(%error, "Fetched expenses not stored");
                            Some(ExpenseListAction::LoadFailed {
                                message: FETCH_FAILED_MESSAGE.to_string(),
                            })
                        },
                    }
                }];
            },
            ExpenseListAction::Loaded { count } => {
                tracing::debug!(count, period = %state.period, "Expenses loaded");
                state.in_flight = false;
                state.status = ScreenStatus::Idle;
            },
            ExpenseListAction::LoadFailed { message } => {
                state.in_flight = false;
                state.status = ScreenStatus::Error(message);
            },
            ExpenseListAction::DismissError => {
                if state.status.error().is_some() {
                    state.status = ScreenStatus::Idle;
                }
            },
        }

        SmallVec::new()
    }
}
