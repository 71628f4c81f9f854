use std::sync::Arc;

use clap::{Parser, Subcommand};
use engine::{
    Engine, EngineError, ExpenseMirror, JsonFileMirror, ListKind, MemoryMirror, MoneyCents,
    NewItem, NewList, Quantity, ToggleOutcome,
};
use migration::{Migrator, MigratorTrait};

use crate::{
    error::Result,
    settings::{Database, Mirror, Settings},
};

mod error;
mod settings;

#[derive(Parser, Debug)]
#[command(name = "basket")]
#[command(about = "Shopping lists with budgets that stay in step with purchases")]
struct Cli {
    /// Optional config file path (TOML).
    #[arg(long, env = "BASKET_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every list with its budget.
    Lists,
    /// Create a list.
    NewList {
        name: String,
        /// `grocery` or `order`.
        #[arg(long, default_value = "grocery")]
        kind: String,
        /// Reference month, e.g. 2025-07.
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        budget: Option<MoneyCents>,
    },
    /// Show the items of a list.
    Items { list_id: String },
    /// Add an item to a list.
    AddItem {
        list_id: String,
        name: String,
        #[arg(long, default_value = "1")]
        qty: Quantity,
        #[arg(long, default_value = "0")]
        price: MoneyCents,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Mark an item purchased, or unmark it.
    Toggle { item_id: String },
    /// Enter the price of an item.
    SetPrice { item_id: String, price: MoneyCents },
    /// Recompute a list's remaining budget and rebuild its expense mirror.
    Reconcile { list_id: String },
    /// Report drift between the budget, the items and the expense mirror.
    Check { list_id: String },
    /// Delete lists with their budgets and items.
    Delete {
        #[arg(required = true)]
        list_ids: Vec<String>,
    },
    /// Show spent and remaining amounts of a list.
    Summary { list_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "basket={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = connect_db(&settings.database).await?;
    let engine = Engine::builder()
        .database(db)
        .mirror(build_mirror(&settings.mirror))
        .build()
        .await?;

    run(&engine, cli.command).await
}

async fn connect_db(config: &Database) -> Result<sea_orm::DatabaseConnection> {
    let url = config.url();
    let database = sea_orm::Database::connect(&url).await?;
    Migrator::up(&database, None).await?;
    tracing::debug!(%url, "database ready");
    Ok(database)
}

fn build_mirror(config: &Mirror) -> Arc<dyn ExpenseMirror> {
    match config {
        Mirror::Memory => Arc::new(MemoryMirror::new()),
        Mirror::Json(path) => Arc::new(JsonFileMirror::new(path)),
    }
}

fn budget_line(current: Option<MoneyCents>, original: Option<MoneyCents>) -> String {
    match (current, original) {
        (Some(current), Some(original)) => format!("{current} of {original}"),
        _ => "no budget".to_string(),
    }
}

async fn run(engine: &Engine, command: Command) -> Result<()> {
    match command {
        Command::Lists => {
            for entry in engine.lists().await? {
                println!(
                    "{}  {:<24} {:<8} {:<8} {}",
                    entry.list.id,
                    entry.list.name,
                    entry.list.kind.as_str(),
                    entry.list.ref_month.as_deref().unwrap_or("-"),
                    budget_line(
                        entry.budget.as_ref().map(|b| b.current),
                        entry.budget.as_ref().map(|b| b.original)
                    ),
                );
            }
        }
        Command::NewList {
            name,
            kind,
            month,
            budget,
        } => {
            let created = engine
                .new_list(NewList {
                    name,
                    kind: ListKind::try_from(kind.as_str())?,
                    ref_month: month,
                    budget,
                })
                .await?;
            println!("created list: {}", created.list.id);
        }
        Command::Items { list_id } => {
            for item in engine.items(&list_id).await? {
                println!(
                    "{}  [{}] {:<24} {:>8} x {:>8}",
                    item.id,
                    if item.purchased { "x" } else { " " },
                    item.name,
                    item.quantity,
                    item.price,
                );
            }
        }
        Command::AddItem {
            list_id,
            name,
            qty,
            price,
            category,
            note,
        } => {
            let item = engine
                .new_item(
                    &list_id,
                    NewItem {
                        name,
                        quantity: qty,
                        price,
                        category,
                        observation: note,
                    },
                )
                .await?;
            println!("created item: {}", item.id);
        }
        Command::Toggle { item_id } => match engine.toggle(&item_id).await? {
            ToggleOutcome::Toggled {
                purchased,
                budget,
                mirror_synced,
            } => {
                let state = if purchased { "purchased" } else { "not purchased" };
                match budget {
                    Some(budget) => println!("{state}, remaining budget {budget}"),
                    None => println!("{state}"),
                }
                if !mirror_synced {
                    eprintln!("expense mirror out of date, run `basket reconcile`");
                }
            }
            ToggleOutcome::PriceRequired { item_id } => {
                eprintln!("item {item_id} has no price, run `basket set-price` first");
                std::process::exit(2);
            }
        },
        Command::SetPrice { item_id, price } => {
            let item = engine.set_price(&item_id, price).await?;
            println!("{}: {} x {}", item.name, item.quantity, item.price);
        }
        Command::Reconcile { list_id } => {
            let report = engine.reconcile(&list_id).await?;
            match (report.previous, report.current) {
                (Some(previous), Some(current)) if report.repaired => {
                    println!("budget repaired: {previous} -> {current}")
                }
                (_, Some(current)) => println!("budget already consistent: {current}"),
                _ => println!("list has no budget"),
            }
            if report.mirror_synced {
                println!("expense mirror rebuilt with {} entries", report.mirror_entries);
            } else {
                eprintln!("expense mirror could not be rebuilt, try again later");
            }
        }
        Command::Check { list_id } => match engine.check_consistency(&list_id).await {
            Ok(()) => println!("consistent"),
            Err(err @ EngineError::ConsistencyDrift { .. }) => {
                eprintln!("{err}");
                std::process::exit(1);
            }
            Err(err) => return Err(err.into()),
        },
        Command::Delete { list_ids } => {
            engine.delete_lists(&list_ids).await?;
            println!("deleted {} list(s)", list_ids.len());
        }
        Command::Summary { list_id } => {
            let summary = engine.expense_summary(&list_id).await?;
            println!("spent:     {}", summary.spent);
            println!("remaining: {}", budget_line(summary.remaining, summary.original));
        }
    }
    Ok(())
}
