//! # Expense Tracker
//!
//! Client side of an expense tracking application: an in-memory expense
//! store mirroring a remote REST service, a validating expense form, and
//! screen controllers that tie the two together.
//!
//! ## Architecture
//!
//! - [`store`]: the expense list, mutated only through [`ExpensesReducer`]
//! - [`form`]: two-phase validation of amount, date and description
//! - [`service`]: the remote service seam ([`ExpenseService`])
//! - [`screens`]: add/edit and list screens as reducers with remote effects
//! - [`app`]: wiring of one store, one service and the screens
//!
//! ## Example
//!
//! ```no_run
//! use expense_tracker::{AppConfig, ExpenseApp, HttpExpenseService};
//! use expense_tracker_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let service = HttpExpenseService::from_config(&config)?;
//!     let app = ExpenseApp::new(config, Arc::new(service), Arc::new(SystemClock));
//!
//!     let view = app.show(app.recent_period()).await?;
//!     println!("{}", view.summary);
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod config;
pub mod form;
pub mod screens;
pub mod service;
pub mod store;
pub mod types;

pub use app::{AppError, ExpenseApp, ListView, ManageOutcome};
pub use config::{AppConfig, ConfigError};
pub use form::{ExpenseForm, Field, FieldStatus, ValidationError};
pub use screens::list::{ExpenseListAction, ExpenseListReducer, ExpensePeriod, ExpensesSummary};
pub use screens::manage::{ExpenseMode, ManageExpenseAction, ManageExpenseReducer};
pub use screens::{Navigation, ScreenEnvironment, ScreenStatus};
pub use service::{ExpenseService, HttpExpenseService, InMemoryExpenseService, ServiceError};
pub use store::{ExpenseStore, ExpenseStoreError, ExpensesAction, ExpensesReducer, ExpensesState};
pub use types::{Expense, ExpenseChanges, ExpenseDraft, ExpenseId};
