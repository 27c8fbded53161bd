use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

use campaign_server::config::AppConfig;
use campaign_server::exporter::export_excluded;
use campaign_server::importer::import_file;
use campaign_server::store::campaigns::list_campaigns;
use campaign_server::store::run_migrations;
use campaign_server::unsubscribe::{UnsubscribeOutcome, unsubscribe};

#[derive(Parser, Debug)]
#[command(
    name = "campaign-admin",
    about = "Maintain the campaign mailing list from the command line"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace the whole recipient list with the rows of a contact file.
    Import {
        /// File with `Nome` and `Email` columns.
        file: PathBuf,
    },
    /// Write the exclusion list as a contact file.
    Export {
        /// Destination path; prints to stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Move one address from the recipient list to the exclusion list.
    Unsubscribe {
        email: String,
    },
    /// Print the campaign send history.
    History,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env();

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await?;

    run_migrations(&pool).await?;

    match args.command {
        Command::Import { file } => {
            let stats = import_file(&pool, &file, config.tabular).await?;
            println!(
                "Imported {} recipients ({} previous entries removed)",
                stats.inserted, stats.removed
            );
        }
        Command::Export { output } => {
            let scratch = std::env::temp_dir();
            let export = export_excluded(&pool, &scratch, config.tabular).await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &export.contents).await?;
                    println!("Wrote {} excluded recipients to {}", export.rows, path.display());
                }
                None => io::stdout().write_all(&export.contents)?,
            }
        }
        Command::Unsubscribe { email } => match unsubscribe(&pool, &email).await? {
            UnsubscribeOutcome::Moved(excluded) => {
                println!("Moved '{}' <{}> to the exclusion list", excluded.name, excluded.email);
            }
            UnsubscribeOutcome::NotSubscribed => {
                writeln!(io::stderr(), "'{email}' is not on the recipient list")?;
            }
        },
        Command::History => {
            for record in list_campaigns(&pool).await? {
                println!(
                    "{:>5}  {:<40}  opens={}  clicks={}",
                    record.id, record.campaign_name, record.opens_count, record.clicks_count
                );
            }
        }
    }

    pool.close().await;
    Ok(())
}
