use std::error::Error;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{DocumentStatus, Engine, TransactionKind, TransactionListFilter};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;
use uuid::Uuid;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Confirm, cancel and inspect ledger documents")]
struct Cli {
    /// Database connection string, overrides the `database` setting.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations and exit.
    Migrate,
    Transactions(TransactionsArgs),
    Transaction(Document),
    Production(Document),
    Balances(BalancesArgs),
    /// Compare every ledger with the confirmed documents.
    Reconcile,
    /// Rebuild the money ledgers from the confirmed documents.
    Recompute,
}

#[derive(Args, Debug)]
struct Document {
    #[command(subcommand)]
    command: DocumentCommand,
}

#[derive(Subcommand, Debug)]
enum DocumentCommand {
    Show { id: Uuid },
    Confirm { id: Uuid },
    Cancel { id: Uuid },
    Delete { id: Uuid },
}

#[derive(Args, Debug)]
struct TransactionsArgs {
    /// First day included.
    #[arg(long)]
    from: Option<NaiveDate>,
    /// First day excluded.
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long = "kind", value_parser = parse_kind)]
    kinds: Vec<TransactionKind>,
    #[arg(long, value_parser = parse_status)]
    status: Option<DocumentStatus>,
    #[arg(long)]
    counterparty: Option<i64>,
    #[arg(long, default_value_t = 50)]
    limit: u64,
}

#[derive(Args, Debug)]
struct BalancesArgs {
    #[command(subcommand)]
    command: BalancesCommand,
}

#[derive(Subcommand, Debug)]
enum BalancesCommand {
    Cash,
    Stock {
        #[arg(long)]
        warehouse: i64,
    },
    Counterparty {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        currency: i64,
    },
    Dividend {
        #[arg(long)]
        partner: i64,
        #[arg(long)]
        currency: i64,
    },
    Salary {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        currency: i64,
    },
}

fn parse_kind(raw: &str) -> Result<TransactionKind, String> {
    TransactionKind::try_from(raw).map_err(|err| err.to_string())
}

fn parse_status(raw: &str) -> Result<DocumentStatus, String> {
    DocumentStatus::try_from(raw).map_err(|err| err.to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn connect_db(database_url: &str) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

async fn run_transaction(
    engine: &Engine,
    command: DocumentCommand,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match command {
        DocumentCommand::Show { id } => print_json(&engine.transaction(id).await?),
        DocumentCommand::Confirm { id } => print_json(&engine.confirm_transaction(id).await?),
        DocumentCommand::Cancel { id } => print_json(&engine.cancel_transaction(id).await?),
        DocumentCommand::Delete { id } => {
            engine.delete_transaction(id).await?;
            println!("deleted transaction: {id}");
            Ok(())
        }
    }
}

async fn run_production(
    engine: &Engine,
    command: DocumentCommand,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match command {
        DocumentCommand::Show { id } => print_json(&engine.production(id).await?),
        DocumentCommand::Confirm { id } => print_json(&engine.confirm_production(id).await?),
        DocumentCommand::Cancel { id } => print_json(&engine.cancel_production(id).await?),
        DocumentCommand::Delete { id } => {
            engine.delete_production(id).await?;
            println!("deleted production: {id}");
            Ok(())
        }
    }
}

async fn run_balances(
    engine: &Engine,
    command: BalancesCommand,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match command {
        BalancesCommand::Cash => print_json(&engine.cash_balances().await?),
        BalancesCommand::Stock { warehouse } => {
            print_json(&engine.stock_balances(warehouse).await?)
        }
        BalancesCommand::Counterparty { id, currency } => {
            print_json(&engine.counterparty_balance(id, currency).await?)
        }
        BalancesCommand::Dividend { partner, currency } => {
            print_json(&engine.dividend_balance(partner, currency).await?)
        }
        BalancesCommand::Salary { user, currency } => {
            print_json(&engine.salary_balance(user, currency).await?)
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tally={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let database_url = cli
        .database_url
        .unwrap_or_else(|| settings.database.url());
    let db = connect_db(&database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Migrate => {
            tracing::info!("migrations applied");
        }
        Command::Transactions(args) => {
            let filter = TransactionListFilter {
                from: args.from,
                to: args.to,
                kinds: (!args.kinds.is_empty()).then_some(args.kinds),
                status: args.status,
                counterparty_id: args.counterparty,
            };
            print_json(&engine.list_transactions(&filter, args.limit).await?)?;
        }
        Command::Transaction(Document { command }) => run_transaction(&engine, command).await?,
        Command::Production(Document { command }) => run_production(&engine, command).await?,
        Command::Balances(BalancesArgs { command }) => run_balances(&engine, command).await?,
        Command::Reconcile => {
            let discrepancies = engine.reconcile().await?;
            print_json(&discrepancies)?;
            if !discrepancies.is_empty() {
                std::process::exit(1);
            }
        }
        Command::Recompute => {
            engine.recompute_balances().await?;
            println!("money ledgers recomputed");
        }
    }

    Ok(())
}
