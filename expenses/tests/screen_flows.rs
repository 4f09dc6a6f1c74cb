//! End-to-end screen flows over the in-memory expense service

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use chrono::{Days, NaiveDate};
use expense_tracker::form::INVALID_INPUT_MESSAGE;
use expense_tracker::screens::manage::EDIT_FAILED_MESSAGE;
use expense_tracker::{
    AppConfig, Expense, ExpenseApp, ExpenseId, ExpensePeriod, ExpensesAction, Field,
    InMemoryExpenseService, ManageExpenseAction, ManageOutcome,
};
use expense_tracker::service::ServiceCall;
use expense_tracker_core::environment::Clock;
use expense_tracker_testing::{init_tracing, test_clock};
use std::sync::Arc;

fn today() -> NaiveDate {
    test_clock().today()
}

fn days_ago(n: u64) -> NaiveDate {
    today().checked_sub_days(Days::new(n)).unwrap()
}

fn app_with(service: &InMemoryExpenseService) -> ExpenseApp {
    init_tracing();
    ExpenseApp::new(
        AppConfig::default(),
        Arc::new(service.clone()),
        Arc::new(test_clock()),
    )
}

fn input(field: Field, value: &str) -> ManageExpenseAction {
    ManageExpenseAction::Input {
        field,
        value: value.to_string(),
    }
}

#[tokio::test]
async fn recent_screen_shows_last_seven_days() {
    let service = InMemoryExpenseService::with_expenses(vec![
        Expense::new("t0", "today", 10.0, today()),
        Expense::new("t3", "three days ago", 5.0, days_ago(3)),
        Expense::new("t10", "ten days ago", 100.0, days_ago(10)),
    ]);
    let app = app_with(&service);

    let view = app.show(app.recent_period()).await.unwrap();

    let ids: Vec<_> = view.expenses.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["t0", "t3"]);
    assert_eq!(view.summary.to_string(), "Last 7 Days: $15.00");

    let all = app.show(ExpensePeriod::All).await.unwrap();
    assert_eq!(all.expenses.len(), 3);
    assert_eq!(all.summary.period, "Total");
}

#[tokio::test]
async fn add_then_edit_then_delete() {
    let service = InMemoryExpenseService::new();
    let app = app_with(&service);
    let mut observed = app.expenses().subscribe();

    let add = app.add_screen();
    let outcome = app
        .run_manage(
            &add,
            [
                input(Field::Amount, "25.5"),
                input(Field::Date, "2024-03-01"),
                input(Field::Description, "lunch"),
                ManageExpenseAction::Submit,
            ],
        )
        .await
        .unwrap();
    assert_eq!(outcome, ManageOutcome::Saved);
    assert!(matches!(
        observed.recv().await.unwrap(),
        ExpensesAction::Add { .. }
    ));

    let id = ExpenseId::new("e1");
    let edit = app.edit_screen(&id).await.unwrap();
    let outcome = app
        .run_manage(
            &edit,
            [input(Field::Amount, "30"), ManageExpenseAction::Submit],
        )
        .await
        .unwrap();
    assert_eq!(outcome, ManageOutcome::Saved);
    assert_eq!(app.expenses().get(&id).await.unwrap().amount, 30.0);

    let delete = app.edit_screen(&id).await.unwrap();
    let outcome = app
        .run_manage(&delete, [ManageExpenseAction::Delete])
        .await
        .unwrap();
    assert_eq!(outcome, ManageOutcome::Saved);
    assert!(app.expenses().expenses().await.is_empty());
    assert!(service.expenses().await.is_empty());
}

#[tokio::test]
async fn invalid_form_never_reaches_the_service() {
    let service = InMemoryExpenseService::new();
    let app = app_with(&service);
    let screen = app.add_screen();

    let outcome = app
        .run_manage(
            &screen,
            [
                input(Field::Amount, "-5"),
                input(Field::Date, "not-a-date"),
                input(Field::Description, "  "),
                ManageExpenseAction::Submit,
            ],
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ManageOutcome::Invalid {
            fields: vec![Field::Amount, Field::Date, Field::Description],
            message: INVALID_INPUT_MESSAGE,
        }
    );
    assert!(service.calls().await.is_empty());

    let form = screen.state(|s| s.form().clone()).await;
    assert_eq!(form.field(Field::Amount).value(), "-5");
    assert_eq!(form.field(Field::Date).value(), "not-a-date");
    assert_eq!(form.field(Field::Description).value(), "  ");
}

#[tokio::test]
async fn failed_edit_leaves_store_and_recovers() {
    let original = Expense::new("e1", "book", 30.0, days_ago(1));
    let service = InMemoryExpenseService::with_expenses(vec![original.clone()]);
    let app = app_with(&service);
    app.show(ExpensePeriod::All).await.unwrap();

    service.set_failing(true);
    let screen = app.edit_screen(&original.id).await.unwrap();
    let outcome = app
        .run_manage(
            &screen,
            [input(Field::Description, "novel"), ManageExpenseAction::Submit],
        )
        .await
        .unwrap();

    assert_eq!(outcome, ManageOutcome::Failed(EDIT_FAILED_MESSAGE.to_string()));
    assert_eq!(app.expenses().expenses().await, vec![original.clone()]);

    service.set_failing(false);
    let outcome = app
        .run_manage(
            &screen,
            [ManageExpenseAction::DismissError, ManageExpenseAction::Submit],
        )
        .await
        .unwrap();
    assert_eq!(outcome, ManageOutcome::Saved);
    assert_eq!(
        app.expenses().get(&original.id).await.unwrap().description,
        "novel"
    );
    assert_eq!(
        service.calls().await.last(),
        Some(&ServiceCall::Update(
            original.id.clone(),
            expense_tracker::ExpenseDraft {
                description: "novel".to_string(),
                amount: 30.0,
                date: days_ago(1),
            }
        ))
    );
}

#[tokio::test]
async fn failed_fetch_shows_message() {
    let service = InMemoryExpenseService::new();
    service.set_failing(true);
    let app = app_with(&service);

    let view = app.show(ExpensePeriod::All).await.unwrap();

    assert_eq!(view.error.as_deref(), Some("could not fetch expenses!"));
    assert!(view.expenses.is_empty());
}
