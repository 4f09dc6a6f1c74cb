//! Remote expense service.
//!
//! The service owns the durable copy of the expenses. [`ExpenseService`] is
//! the seam screen reducers call through; [`HttpExpenseService`] talks to the
//! REST API and [`InMemoryExpenseService`] stands in for it in tests and in
//! offline mode.

use crate::types::{Expense, ExpenseDraft, ExpenseId};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

mod http;
mod memory;

pub use http::HttpExpenseService;
pub use memory::{InMemoryExpenseService, ServiceCall};

/// Errors returned by an [`ExpenseService`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The request could not be sent or no response arrived
    #[error("Request failed: {0}")]
    Request(String),

    /// The service answered with a non-success status
    #[error("Service returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The response body could not be decoded
    #[error("Response decoding failed: {0}")]
    Decode(String),

    /// The service is not reachable (used by the in-memory service)
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Boxed future returned by [`ExpenseService`] methods
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ServiceError>> + Send + 'a>>;

/// Remote store of expenses
///
/// # Dyn Compatibility
///
/// Methods return boxed futures so the service can live behind
/// `Arc<dyn ExpenseService>` inside effect futures.
pub trait ExpenseService: Send + Sync {
    /// Fetch every expense; the returned order is authoritative
    fn fetch_expenses(&self) -> ServiceFuture<'_, Vec<Expense>>;

    /// Persist a new expense and return its generated id
    fn store_expense(&self, draft: ExpenseDraft) -> ServiceFuture<'_, ExpenseId>;

    /// Overwrite an existing expense
    fn update_expense(&self, id: ExpenseId, draft: ExpenseDraft) -> ServiceFuture<'_, ()>;

    /// Delete an expense
    fn delete_expense(&self, id: ExpenseId) -> ServiceFuture<'_, ()>;
}
