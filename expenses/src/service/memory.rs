//! In-memory expense service

use super::{ExpenseService, ServiceError, ServiceFuture};
use crate::types::{Expense, ExpenseDraft, ExpenseId};
use chrono::{Days, NaiveDate};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;

/// A call received by [`InMemoryExpenseService`]
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceCall {
    /// `fetch_expenses`
    Fetch,
    /// `store_expense`
    Store(ExpenseDraft),
    /// `update_expense`
    Update(ExpenseId, ExpenseDraft),
    /// `delete_expense`
    Delete(ExpenseId),
}

/// Expense service backed by a vector
///
/// New expenses are stored at the front, so fetches return newest first.
/// Ids are `e1`, `e2`, ... in creation order. Clones share the same data.
#[derive(Clone, Debug, Default)]
pub struct InMemoryExpenseService {
    expenses: Arc<Mutex<Vec<Expense>>>,
    calls: Arc<Mutex<Vec<ServiceCall>>>,
    next_id: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
}

impl InMemoryExpenseService {
    /// Empty service
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Service holding `expenses` in the given order
    #[must_use]
    pub fn with_expenses(expenses: Vec<Expense>) -> Self {
        Self {
            expenses: Arc::new(Mutex::new(expenses)),
            ..Self::default()
        }
    }

    /// Service seeded with a few expenses dated around `today`
    ///
    /// Used by the offline mode of the command line client.
    #[must_use]
    pub fn demo(today: NaiveDate) -> Self {
        let seed = [
            ("d1", "Groceries", 54.2, 0),
            ("d2", "Train ticket", 12.5, 2),
            ("d3", "Book", 18.99, 5),
            ("d4", "Concert", 65.0, 12),
            ("d5", "Winter jacket", 129.0, 40),
        ];
        let expenses = seed
            .into_iter()
            .map(|(id, description, amount, ago)| {
                let date = today.checked_sub_days(Days::new(ago)).unwrap_or(today);
                Expense::new(id, description, amount, date)
            })
            .collect();
        Self::with_expenses(expenses)
    }

    /// Make every following call fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Current server-side expenses
    pub async fn expenses(&self) -> Vec<Expense> {
        self.expenses.lock().await.clone()
    }

    /// Calls received so far, in order
    pub async fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: ServiceCall) -> Result<(), ServiceError> {
        self.calls.lock().await.push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("in-memory service set to fail".to_string()));
        }
        Ok(())
    }

    fn not_found(id: &ExpenseId) -> ServiceError {
        ServiceError::Status {
            status: 404,
            body: format!("expense {id} not found"),
        }
    }
}

impl ExpenseService for InMemoryExpenseService {
    fn fetch_expenses(&self) -> ServiceFuture<'_, Vec<Expense>> {
        Box::pin(async move {
            self.record(ServiceCall::Fetch).await?;
            Ok(self.expenses.lock().await.clone())
        })
    }

    fn store_expense(&self, draft: ExpenseDraft) -> ServiceFuture<'_, ExpenseId> {
        Box::pin(async move {
            self.record(ServiceCall::Store(draft.clone())).await?;
            let id = ExpenseId::new(format!("e{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1));
            self.expenses
                .lock()
                .await
                .insert(0, Expense::from_draft(id.clone(), draft));
            Ok(id)
        })
    }

    fn update_expense(&self, id: ExpenseId, draft: ExpenseDraft) -> ServiceFuture<'_, ()> {
        Box::pin(async move {
            self.record(ServiceCall::Update(id.clone(), draft.clone()))
                .await?;
            let mut expenses = self.expenses.lock().await;
            let expense = expenses
                .iter_mut()
                .find(|expense| expense.id == id)
                .ok_or_else(|| Self::not_found(&id))?;
            *expense = Expense::from_draft(id, draft);
            Ok(())
        })
    }

    fn delete_expense(&self, id: ExpenseId) -> ServiceFuture<'_, ()> {
        Box::pin(async move {
            self.record(ServiceCall::Delete(id.clone())).await?;
            let mut expenses = self.expenses.lock().await;
            let before = expenses.len();
            expenses.retain(|expense| expense.id != id);
            if expenses.len() == before {
                return Err(Self::not_found(&id));
            }
            Ok(())
        })
    }
}
