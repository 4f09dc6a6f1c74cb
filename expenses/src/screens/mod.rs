//! Screen controllers.
//!
//! Each screen is a [`Reducer`](expense_tracker_core::reducer::Reducer) run in
//! its own runtime store. Remote calls are returned as effects and their
//! outcome comes back as an action; the shared [`ExpenseStore`] is only
//! touched after the remote service confirmed a change.

use crate::service::ExpenseService;
use crate::store::ExpenseStore;
use chrono::NaiveDate;
use expense_tracker_core::environment::Clock;
use std::fmt;
use std::sync::Arc;

pub mod list;
pub mod manage;

/// Loading and error presentation state shared by every screen
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ScreenStatus {
    /// Nothing in flight
    #[default]
    Idle,
    /// A remote call is in flight; show a loading indicator
    Submitting,
    /// The last remote call failed; show the message until dismissed
    Error(String),
}

impl ScreenStatus {
    /// Whether a remote call is in flight
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting)
    }

    /// Message to show, if the screen is in the error state
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            Self::Idle | Self::Submitting => None,
        }
    }
}

impl fmt::Display for ScreenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Submitting => f.write_str("submitting"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// Navigation requested by a screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Navigation {
    /// Dismiss the screen
    Back,
}

/// Dependencies shared by the screen reducers
#[derive(Clone)]
pub struct ScreenEnvironment {
    /// Remote expense service
    pub service: Arc<dyn ExpenseService>,
    /// The application's expense store
    pub expenses: ExpenseStore,
    /// Source of "today" for date filters
    pub clock: Arc<dyn Clock>,
}

impl ScreenEnvironment {
    /// Bundle the screen dependencies
    #[must_use]
    pub fn new(
        service: Arc<dyn ExpenseService>,
        expenses: ExpenseStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            service,
            expenses,
            clock,
        }
    }

    /// Today's date according to the environment clock
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}

impl fmt::Debug for ScreenEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenEnvironment")
            .field("expenses", &"ExpenseStore")
            .field("today", &self.today())
            .finish_non_exhaustive()
    }
}
