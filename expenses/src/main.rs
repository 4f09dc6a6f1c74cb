//! Expense tracker command line client.
//!
//! Every command drives the same screen controllers a graphical client
//! would: load the list, fill in the form, confirm, then show the result.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use expense_tracker::{
    AppConfig, ExpenseApp, ExpenseId, ExpensePeriod, ExpenseService, Field, HttpExpenseService,
    InMemoryExpenseService, ListView, ManageExpenseAction, ManageOutcome,
};
use expense_tracker_core::environment::{Clock, SystemClock};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "expense-tracker", version, about = "Track expenses stored on a remote expense API")]
struct Cli {
    /// Expense API base URL (overrides EXPENSES_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Use built-in demo data instead of the remote API
    #[arg(long)]
    offline: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Expenses of the last days
    Recent,
    /// Every expense
    All,
    /// Add an expense
    Add {
        /// Amount, e.g. 25.50
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// What the money was spent on
        #[arg(long)]
        description: String,
    },
    /// Change an expense
    Edit {
        /// Expense id
        id: String,
        /// New amount
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<String>,
        /// New date as YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete an expense
    Delete {
        /// Expense id
        id: String,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_list(view: &ListView) {
    println!("{}", view.summary);
    if let Some(error) = &view.error {
        println!("{error}");
        return;
    }
    if view.expenses.is_empty() {
        println!("{}", view.fallback);
        return;
    }
    for expense in &view.expenses {
        println!(
            "{:<24} {}  {:>10.2}  {}",
            expense.id.as_str(),
            expense.date,
            expense.amount,
            expense.description
        );
    }
}

fn input(field: Field, value: String) -> ManageExpenseAction {
    ManageExpenseAction::Input { field, value }
}

/// Turn a screen outcome into the process result
fn finish(outcome: ManageOutcome) -> Result<()> {
    match outcome {
        ManageOutcome::Saved | ManageOutcome::Cancelled => Ok(()),
        ManageOutcome::Invalid { fields, message } => {
            let names: Vec<&str> = fields.iter().map(|field| field.label()).collect();
            bail!("{message} ({})", names.join(", "))
        },
        ManageOutcome::Failed(message) => bail!("{message}"),
        ManageOutcome::Pending => bail!("nothing was saved"),
    }
}

/// Load the store, failing if the remote list is unavailable
async fn load_all(app: &ExpenseApp) -> Result<()> {
    let view = app.show(ExpensePeriod::All).await?;
    if let Some(error) = view.error {
        bail!("{error}");
    }
    Ok(())
}

/// Show every expense from the local store without fetching again
async fn print_store(app: &ExpenseApp) {
    let screen = app.list_screen(ExpensePeriod::All);
    print_list(&app.render(&screen).await);
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = AppConfig::from_env().context("loading configuration")?;
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url)?;
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let service: Arc<dyn ExpenseService> = if cli.offline {
        tracing::info!("Using offline demo data");
        Arc::new(InMemoryExpenseService::demo(clock.today()))
    } else {
        tracing::info!(api_url = %config.api_url, "Using remote expense API");
        Arc::new(HttpExpenseService::from_config(&config)?)
    };
    let app = ExpenseApp::new(config, service, clock);

    match cli.command {
        Command::Recent => print_list(&app.show(app.recent_period()).await?),
        Command::All => print_list(&app.show(ExpensePeriod::All).await?),
        Command::Add {
            amount,
            date,
            description,
        } => {
            let screen = app.add_screen();
            let actions = [
                input(Field::Amount, amount),
                input(Field::Date, date),
                input(Field::Description, description),
                ManageExpenseAction::Submit,
            ];
            finish(app.run_manage(&screen, actions).await?)?;
            print_store(&app).await;
        },
        Command::Edit {
            id,
            amount,
            date,
            description,
        } => {
            load_all(&app).await?;
            let screen = app.edit_screen(&ExpenseId::new(id)).await?;
            let mut actions: Vec<ManageExpenseAction> = [
                (Field::Amount, amount),
                (Field::Date, date),
                (Field::Description, description),
            ]
            .into_iter()
            .filter_map(|(field, value)| value.map(|value| input(field, value)))
            .collect();
            actions.push(ManageExpenseAction::Submit);
            finish(app.run_manage(&screen, actions).await?)?;
            print_store(&app).await;
        },
        Command::Delete { id } => {
            load_all(&app).await?;
            let screen = app.edit_screen(&ExpenseId::new(id)).await?;
            finish(
                app.run_manage(&screen, [ManageExpenseAction::Delete])
                    .await?,
            )?;
            print_store(&app).await;
        },
    }

    Ok(())
}
