//! Expense form state and validation.
//!
//! The form holds raw text for amount, date and description. Typing into a
//! field only marks it [`FieldStatus::Unchecked`]; validation happens on
//! [`ExpenseForm::submit`], which either yields an [`ExpenseDraft`] or marks
//! the offending fields invalid while keeping every field's text.

use crate::types::{Expense, ExpenseDraft, date_format};
use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// Message shown under the form when any field is invalid
pub const INVALID_INPUT_MESSAGE: &str = "Invalid input values - please check your entered data";

/// The three inputs of the form
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    /// Decimal amount
    Amount,
    /// `YYYY-MM-DD` date
    Date,
    /// Free text
    Description,
}

impl Field {
    /// Every field, in display order
    pub const ALL: [Self; 3] = [Self::Amount, Self::Date, Self::Description];

    /// Label shown next to the input
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Amount => "Amount",
            Self::Date => "Date",
            Self::Description => "Description",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Validation state of one field
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldStatus {
    /// Edited (or never checked) since the last submission
    #[default]
    Unchecked,
    /// Passed validation on the last submission
    Valid,
    /// Failed validation on the last submission
    Invalid,
}

/// Raw text plus validation state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InputField {
    value: String,
    status: FieldStatus,
}

impl InputField {
    fn checked(value: String) -> Self {
        Self {
            value,
            status: FieldStatus::Valid,
        }
    }

    /// Text as typed
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Validation state
    #[must_use]
    pub const fn status(&self) -> FieldStatus {
        self.status
    }

    /// Whether the field should be highlighted as invalid
    #[must_use]
    pub const fn is_invalid(&self) -> bool {
        matches!(self.status, FieldStatus::Invalid)
    }
}

/// Submission rejected; lists the invalid fields in display order
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid input values - please check your entered data")]
pub struct ValidationError {
    invalid: Vec<Field>,
}

impl ValidationError {
    /// Fields that failed validation
    #[must_use]
    pub fn invalid_fields(&self) -> &[Field] {
        &self.invalid
    }

    /// Whether `field` failed validation
    #[must_use]
    pub fn is_invalid(&self, field: Field) -> bool {
        self.invalid.contains(&field)
    }
}

/// Form for adding or editing an expense
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpenseForm {
    amount: InputField,
    date: InputField,
    description: InputField,
    editing: bool,
}

impl ExpenseForm {
    /// Blank form for a new expense
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Form prefilled from an existing expense, or blank when `None`
    #[must_use]
    pub fn with_defaults(defaults: Option<&Expense>) -> Self {
        defaults.map_or_else(Self::new, |expense| Self {
            amount: InputField::checked(expense.amount.to_string()),
            date: InputField::checked(expense.date.format(date_format::FORMAT).to_string()),
            description: InputField::checked(expense.description.clone()),
            editing: true,
        })
    }

    /// Whether the form edits an existing expense
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.editing
    }

    /// Label of the confirm button
    #[must_use]
    pub const fn submit_label(&self) -> &'static str {
        if self.editing { "Update" } else { "Add" }
    }

    /// Current state of one field
    #[must_use]
    pub const fn field(&self, field: Field) -> &InputField {
        match field {
            Field::Amount => &self.amount,
            Field::Date => &self.date,
            Field::Description => &self.description,
        }
    }

    const fn field_mut(&mut self, field: Field) -> &mut InputField {
        match field {
            Field::Amount => &mut self.amount,
            Field::Date => &mut self.date,
            Field::Description => &mut self.description,
        }
    }

    /// Replace the text of one field
    ///
    /// The field goes back to [`FieldStatus::Unchecked`] until the next
    /// submission checks it.
    pub fn input_changed(&mut self, field: Field, value: impl Into<String>) {
        *self.field_mut(field) = InputField {
            value: value.into(),
            status: FieldStatus::Unchecked,
        };
    }

    /// Whether any field failed the last submission
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        Field::ALL.iter().any(|&field| self.field(field).is_invalid())
    }

    /// Aggregate error message to display, if any field is invalid
    #[must_use]
    pub fn error_message(&self) -> Option<&'static str> {
        self.is_invalid().then_some(INVALID_INPUT_MESSAGE)
    }

    /// Validate every field and produce a draft
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the invalid fields. Each field
    /// keeps its own text; only the statuses change.
    pub fn submit(&mut self) -> Result<ExpenseDraft, ValidationError> {
        let amount = parse_amount(self.amount.value());
        let date = parse_date(self.date.value());
        let description = self.description.value().trim();
        let description = (!description.is_empty()).then(|| description.to_string());

        self.set_status(Field::Amount, amount.is_some());
        self.set_status(Field::Date, date.is_some());
        self.set_status(Field::Description, description.is_some());

        match (amount, date, description) {
            (Some(amount), Some(date), Some(description)) => Ok(ExpenseDraft {
                description,
                amount,
                date,
            }),
            _ => {
                let invalid: Vec<Field> = Field::ALL
                    .into_iter()
                    .filter(|&field| self.field(field).is_invalid())
                    .collect();
                tracing::debug!(?invalid, "Expense form rejected");
                Err(ValidationError { invalid })
            },
        }
    }

    /// Validate and hand the draft to `on_confirm`
    ///
    /// `on_confirm` is called exactly once when the form is valid and not at
    /// all otherwise. Returns whether it was called.
    pub fn submit_with<F>(&mut self, on_confirm: F) -> bool
    where
        F: FnOnce(ExpenseDraft),
    {
        match self.submit() {
            Ok(draft) => {
                on_confirm(draft);
                true
            },
            Err(_) => false,
        }
    }

    const fn set_status(&mut self, field: Field, valid: bool) {
        self.field_mut(field).status = if valid {
            FieldStatus::Valid
        } else {
            FieldStatus::Invalid
        };
    }
}

/// Positive, finite decimal
fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite() && *amount > 0.0)
}

/// Calendar date in `YYYY-MM-DD`
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), date_format::FORMAT).ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn filled(amount: &str, date: &str, description: &str) -> ExpenseForm {
        let mut form = ExpenseForm::new();
        form.input_changed(Field::Amount, amount);
        form.input_changed(Field::Date, date);
        form.input_changed(Field::Description, description);
        form
    }

    #[test]
    fn valid_submission_confirms_once() {
        let mut form = filled("25.5", "2024-03-01", "lunch");
        let mut confirmed = Vec::new();

        let called = form.submit_with(|draft| confirmed.push(draft));

        assert!(called);
        assert_eq!(
            confirmed,
            vec![ExpenseDraft {
                description: "lunch".to_string(),
                amount: 25.5,
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            }]
        );
        assert!(!form.is_invalid());
        assert_eq!(form.field(Field::Amount).status(), FieldStatus::Valid);
    }

    #[test]
    fn invalid_submission_keeps_each_fields_text() {
        let mut form = filled("-5", "not-a-date", "  ");
        let mut called = false;

        assert!(!form.submit_with(|_| called = true));
        assert!(!called);

        for field in Field::ALL {
            assert!(form.field(field).is_invalid(), "{field} should be invalid");
        }
        assert_eq!(form.field(Field::Amount).value(), "-5");
        assert_eq!(form.field(Field::Date).value(), "not-a-date");
        assert_eq!(form.field(Field::Description).value(), "  ");
        assert_eq!(form.error_message(), Some(INVALID_INPUT_MESSAGE));
    }

    #[test]
    fn only_failing_fields_are_reported() {
        let mut form = filled("12", "2024-13-40", "taxi");
        let error = form.submit().unwrap_err();

        assert_eq!(error.invalid_fields(), &[Field::Date]);
        assert_eq!(form.field(Field::Amount).status(), FieldStatus::Valid);
        assert_eq!(error.to_string(), INVALID_INPUT_MESSAGE);
    }

    #[test]
    fn typing_clears_invalid_without_validating() {
        let mut form = filled("abc", "2024-03-01", "x");
        assert!(form.submit().is_err());
        assert!(form.field(Field::Amount).is_invalid());

        form.input_changed(Field::Amount, "still bad");
        assert_eq!(form.field(Field::Amount).status(), FieldStatus::Unchecked);
        assert!(!form.is_invalid());

        assert!(form.submit().unwrap_err().is_invalid(Field::Amount));
    }

    #[test]
    fn amount_edge_cases() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("0"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount(" 7.25 "), Some(7.25));
    }

    #[test]
    fn description_is_trimmed() {
        let mut form = filled("3", "2024-01-05", "  coffee \n");
        assert_eq!(form.submit().unwrap().description, "coffee");
    }

    #[test]
    fn edit_mode_prefills_fields() {
        let expense = Expense::new(
            "e1",
            "book",
            30.0,
            NaiveDate::from_ymd_opt(2024, 2, 19).unwrap(),
        );
        let mut form = ExpenseForm::with_defaults(Some(&expense));

        assert!(form.is_editing());
        assert_eq!(form.submit_label(), "Update");
        assert_eq!(form.field(Field::Amount).value(), "30");
        assert_eq!(form.field(Field::Date).value(), "2024-02-19");
        assert_eq!(form.field(Field::Description).value(), "book");
        assert_eq!(form.submit().unwrap(), expense.draft());
    }

    #[test]
    fn add_mode_starts_blank_and_unchecked() {
        let form = ExpenseForm::with_defaults(None);
        assert!(!form.is_editing());
        assert_eq!(form.submit_label(), "Add");
        assert_eq!(form.field(Field::Date).value(), "");
        assert_eq!(form.field(Field::Date).status(), FieldStatus::Unchecked);
        assert_eq!(form.error_message(), None);
    }
}
