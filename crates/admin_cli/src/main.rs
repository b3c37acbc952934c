use std::error::Error;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use engine::{CreateMovementCmd, DetailInput, Engine, MovementKind};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "magazzino_admin")]
#[command(about = "Admin utilities for Magazzino (manage supplies, movements, stock)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./magazzino.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Supply(Supply),
    Movement(Movement),
    Stock(Stock),
}

#[derive(Args, Debug)]
struct Supply {
    #[command(subcommand)]
    command: SupplyCommand,
}

#[derive(Subcommand, Debug)]
enum SupplyCommand {
    Create(SupplyCreateArgs),
    List,
    Delete(SupplyDeleteArgs),
}

#[derive(Args, Debug)]
struct SupplyCreateArgs {
    #[arg(long)]
    name: String,
    /// Unit of measure (kg, l, pieces).
    #[arg(long)]
    unit: String,
}

#[derive(Args, Debug)]
struct SupplyDeleteArgs {
    #[arg(long)]
    id: Uuid,
}

#[derive(Args, Debug)]
struct Movement {
    #[command(subcommand)]
    command: MovementCommand,
}

#[derive(Subcommand, Debug)]
enum MovementCommand {
    Create(MovementCreateArgs),
    List(MovementListArgs),
    Remove(MovementRemoveArgs),
}

#[derive(Args, Debug)]
struct MovementCreateArgs {
    /// "purchase" or "consumption".
    #[arg(long)]
    kind: String,
    /// Detail lines as `supply_id:quantity`, repeatable.
    #[arg(long = "line", required = true)]
    lines: Vec<String>,
    #[arg(long)]
    note: Option<String>,
}

#[derive(Args, Debug)]
struct MovementListArgs {
    #[arg(long, default_value_t = 20)]
    limit: u64,
}

#[derive(Args, Debug)]
struct MovementRemoveArgs {
    #[arg(long)]
    id: Uuid,
}

#[derive(Args, Debug)]
struct Stock {
    #[command(subcommand)]
    command: StockCommand,
}

#[derive(Subcommand, Debug)]
enum StockCommand {
    Show,
    /// Rebuild every stock entry from the recorded movement lines.
    Recompute,
}

fn parse_line(raw: &str) -> Result<DetailInput, String> {
    let (supply_id, quantity) = raw
        .split_once(':')
        .ok_or_else(|| format!("invalid line (expected supply_id:quantity): {raw}"))?;
    let supply_id =
        Uuid::parse_str(supply_id).map_err(|_| format!("invalid supply id: {supply_id}"))?;
    let quantity: i64 = quantity
        .parse()
        .map_err(|_| format!("invalid quantity: {quantity}"))?;
    Ok(DetailInput::new(supply_id, quantity))
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Supply(Supply {
            command: SupplyCommand::Create(args),
        }) => {
            let id = engine.new_supply(&args.name, &args.unit).await?;
            println!("created supply: {} ({id})", args.name);
        }
        Command::Supply(Supply {
            command: SupplyCommand::List,
        }) => {
            for supply in engine.list_supplies().await? {
                let amount = engine.stock_amount(supply.id).await?;
                println!("{} {} {} {}", supply.id, supply.name, amount, supply.unit);
            }
        }
        Command::Supply(Supply {
            command: SupplyCommand::Delete(args),
        }) => {
            engine.delete_supply(args.id, Utc::now()).await?;
            println!("deleted supply: {}", args.id);
        }
        Command::Movement(Movement {
            command: MovementCommand::Create(args),
        }) => {
            let kind = match MovementKind::try_from(args.kind.as_str()) {
                Ok(kind) => kind,
                Err(err) => {
                    eprintln!("{err}");
                    std::process::exit(2);
                }
            };
            let mut lines = Vec::with_capacity(args.lines.len());
            for raw in &args.lines {
                match parse_line(raw) {
                    Ok(line) => lines.push(line),
                    Err(err) => {
                        eprintln!("{err}");
                        std::process::exit(2);
                    }
                }
            }

            let mut cmd = CreateMovementCmd::new(kind, Utc::now()).details(lines);
            if let Some(note) = args.note {
                cmd = cmd.note(note);
            }
            let movement = engine.create_movement(cmd).await?;
            println!("created movement: {}", movement.id);
        }
        Command::Movement(Movement {
            command: MovementCommand::List(args),
        }) => {
            for movement in engine.list_movements(Some(args.limit)).await? {
                println!(
                    "{} {} {}",
                    movement.id,
                    movement.kind.as_str(),
                    movement.occurred_at
                );
            }
        }
        Command::Movement(Movement {
            command: MovementCommand::Remove(args),
        }) => {
            engine.remove_movement(args.id).await?;
            println!("removed movement: {}", args.id);
        }
        Command::Stock(Stock {
            command: StockCommand::Show,
        }) => {
            for entry in engine.stock_levels().await? {
                println!("{} {}", entry.supply_id, entry.amount);
            }
        }
        Command::Stock(Stock {
            command: StockCommand::Recompute,
        }) => {
            for entry in engine.recompute_stock().await? {
                println!("{} {}", entry.supply_id, entry.amount);
            }
        }
    }

    Ok(())
}
