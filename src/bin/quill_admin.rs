use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use quill::admin::backfill::backfill_passwords;
use quill::admin::inspect::inspect_database;
use quill::admin::reset::{reset_database, SeedUser};
use quill::admin::smoke::{auth_smoke_test, find_user_id};
use quill::admin::with_db;
use quill::app::tokens::TokenIssuer;
use quill::config::{seed_password, DbConfig, TokenConfig};

/// Maintenance tools for the quill database.
///
/// Connection settings come from the environment (DATABASE_URL and the
/// DB_* pool variables); a `.env` file in the working directory is read
/// first if present.
#[derive(Parser, Debug)]
#[command(name = "quill-admin")]
#[command(about = "Inspect, migrate, reset and repair the quill database", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending schema migrations
    Migrate,

    /// Print row counts and a per-user overview
    Inspect,

    /// Hash every stored password that is not hashed yet
    BackfillPasswords {
        /// Report what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Delete every row and seed two users
    Reset {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Issue an access token and verify it with the configured keys
    AuthCheck {
        /// Handle of an existing user to issue the token for
        #[arg(short, long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    match args.command {
        Command::Migrate => {
            let config = DbConfig::from_env()?;
            with_db(&config, "migrate", |db| async move {
                db.migrate().await?;
                tracing::info!("migrations applied");
                Ok(())
            })
            .await
        }
        Command::Inspect => {
            let config = DbConfig::from_env()?;
            let summary = with_db(&config, "inspect", |db| async move {
                inspect_database(&db).await
            })
            .await?;
            print!("{}", summary);
            Ok(())
        }
        Command::BackfillPasswords { dry_run } => {
            let config = DbConfig::from_env()?;
            let report = with_db(&config, "backfill-passwords", |db| async move {
                backfill_passwords(&db, dry_run).await
            })
            .await?;
            println!(
                "scanned {} users: {} hashed{}, {} already hashed, {} without password, {} changed concurrently",
                report.scanned,
                report.hashed,
                if dry_run { " (dry run)" } else { "" },
                report.already_hashed,
                report.empty,
                report.skipped
            );
            Ok(())
        }
        Command::Reset { yes } => {
            if !yes && !confirm("This deletes every row in every table.")? {
                println!("Reset cancelled.");
                return Ok(());
            }
            let config = DbConfig::from_env()?;
            let seeds = SeedUser::defaults(&seed_password());
            let report = with_db(&config, "reset", |db| async move {
                reset_database(&db, &seeds).await
            })
            .await?;
            println!("deleted {} rows", report.total_deleted());
            for user in &report.seeded {
                println!("seeded {} ({})", user.handle, user.id);
            }
            Ok(())
        }
        Command::AuthCheck { user } => {
            let issuer = TokenIssuer::from_config(&TokenConfig::from_env()?);
            let user_id = match user {
                Some(handle) => {
                    let config = DbConfig::from_env()?;
                    with_db(&config, "auth-check", |db| async move {
                        find_user_id(&db, &handle).await
                    })
                    .await?
                }
                None => Uuid::new_v4(),
            };
            let recovered = auth_smoke_test(&issuer, user_id)?;
            println!("token round trip ok for user {}", recovered);
            Ok(())
        }
    }
}

fn confirm(warning: &str) -> Result<bool> {
    println!("{}", warning);
    println!("Do you want to continue? (y/N): ");

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .context("failed to read user input")?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
