//! Expense domain types.
//!
//! [`Expense`] is a record the remote service has acknowledged (it has an id).
//! [`ExpenseDraft`] is what the form produces and what create/update calls
//! send. [`ExpenseChanges`] is a partial update merged into a stored record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier assigned by the remote expense service
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(String);

impl ExpenseId {
    /// Wrap a service-provided id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id as sent over the wire
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExpenseId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A persisted expense
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Service-assigned id
    pub id: ExpenseId,
    /// Free-form description, never blank
    pub description: String,
    /// Positive amount
    pub amount: f64,
    /// Calendar date of the expense
    #[serde(with = "date_format")]
    pub date: NaiveDate,
}

impl Expense {
    /// Create an expense from its parts
    #[must_use]
    pub fn new(
        id: impl Into<ExpenseId>,
        description: impl Into<String>,
        amount: f64,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            amount,
            date,
        }
    }

    /// Attach a service-assigned id to a draft
    #[must_use]
    pub fn from_draft(id: ExpenseId, draft: ExpenseDraft) -> Self {
        Self {
            id,
            description: draft.description,
            amount: draft.amount,
            date: draft.date,
        }
    }

    /// The editable part of this expense
    #[must_use]
    pub fn draft(&self) -> ExpenseDraft {
        ExpenseDraft {
            description: self.description.clone(),
            amount: self.amount,
            date: self.date,
        }
    }

    /// Merge `changes` into this record; `None` fields are left alone
    pub fn apply(&mut self, changes: ExpenseChanges) {
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(amount) = changes.amount {
            self.amount = amount;
        }
        if let Some(date) = changes.date {
            self.date = date;
        }
    }
}

impl From<String> for ExpenseId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A validated expense that has not been persisted yet
///
/// This is also the request body of create and update calls.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    /// Trimmed description
    pub description: String,
    /// Positive, finite amount
    pub amount: f64,
    /// Calendar date
    #[serde(with = "date_format")]
    pub date: NaiveDate,
}

/// Partial update for a stored expense
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpenseChanges {
    /// New description
    pub description: Option<String>,
    /// New amount
    pub amount: Option<f64>,
    /// New date
    pub date: Option<NaiveDate>,
}

impl From<ExpenseDraft> for ExpenseChanges {
    fn from(draft: ExpenseDraft) -> Self {
        Self {
            description: Some(draft.description),
            amount: Some(draft.amount),
            date: Some(draft.date),
        }
    }
}

/// Sum of the amounts of `expenses`
#[must_use]
pub fn total(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|expense| expense.amount).sum()
}

/// Dates travel as `YYYY-MM-DD`.
///
/// Clients that stored a full timestamp (`2024-03-01T00:00:00.000Z`) are
/// accepted too; only the calendar date is kept.
pub mod date_format {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    /// Wire format of a date
    pub const FORMAT: &str = "%Y-%m-%d";

    /// Parse a wire date
    ///
    /// # Errors
    ///
    /// Returns the `chrono` parse error for the plain date form when neither
    /// form matches.
    pub fn parse(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, FORMAT).or_else(|plain_error| {
            DateTime::parse_from_rfc3339(raw)
                .map(|timestamp| timestamp.date_naive())
                .map_err(|_| plain_error)
        })
    }

    /// Serialize as `YYYY-MM-DD`
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&date.format(FORMAT))
    }

    /// Deserialize from `YYYY-MM-DD` or an RFC 3339 timestamp
    ///
    /// # Errors
    ///
    /// Fails when the string is neither form.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(|e| D::Error::custom(format!("invalid date {raw:?}: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn expense_serializes_with_plain_date() {
        let expense = Expense::new("e1", "lunch", 25.5, day(2024, 3, 1));
        let value = serde_json::to_value(&expense).unwrap();
        assert_eq!(
            value,
            json!({ "id": "e1", "description": "lunch", "amount": 25.5, "date": "2024-03-01" })
        );
    }

    #[test]
    fn expense_accepts_timestamp_dates() {
        let expense: Expense = serde_json::from_value(json!({
            "id": "e1",
            "description": "book",
            "amount": 12,
            "date": "2024-02-19T00:00:00.000Z"
        }))
        .unwrap();
        assert_eq!(expense.date, day(2024, 2, 19));
        assert!((expense.amount - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_date_is_rejected() {
        let result: Result<Expense, _> = serde_json::from_value(json!({
            "id": "e1", "description": "x", "amount": 1.0, "date": "yesterday"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut expense = Expense::new("e1", "lunch", 25.5, day(2024, 3, 1));
        expense.apply(ExpenseChanges {
            amount: Some(30.0),
            ..ExpenseChanges::default()
        });
        assert_eq!(expense.description, "lunch");
        assert!((expense.amount - 30.0).abs() < f64::EPSILON);
        assert_eq!(expense.date, day(2024, 3, 1));
    }

    #[test]
    fn total_sums_amounts() {
        let expenses = vec![
            Expense::new("a", "a", 1.25, day(2024, 1, 1)),
            Expense::new("b", "b", 2.75, day(2024, 1, 2)),
        ];
        assert!((total(&expenses) - 4.0).abs() < f64::EPSILON);
        assert!(total(&[]).abs() < f64::EPSILON);
    }
}
