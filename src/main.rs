use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use prefiller::config::{Config, DEFAULT_CONFIG_FILE};
use prefiller::db::{DatabasePopulator, collator_for};
use prefiller::service::{self, GenerateRequest};
use prefiller::sql::SplitOptions;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser, Debug)]
#[command(name = "prefiller")]
#[command(version)]
#[command(about = "Generate pre-filled SQLite databases from Room schema exports and SQL scripts")]
struct Args {
    /// Configuration file
    #[arg(short, long, global = true, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate every database declared in the configuration file
    Run {
        /// Only generate the named database (repeatable)
        #[arg(long, value_name = "NAME")]
        only: Vec<String>,
    },
    /// Generate a single database without a configuration file
    Generate {
        /// Directory holding the versioned `<N>.json` schema exports
        #[arg(long, value_name = "DIR")]
        schema_dir: PathBuf,

        /// Database file to write
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// SQL script to run after the schema (repeatable, applied in order)
        #[arg(short, long, value_name = "FILE")]
        script: Vec<PathBuf>,

        /// Locale for the LOCALIZED and UNICODE collations
        #[arg(long, value_name = "TAG")]
        locale: Option<String>,

        /// Reject a final statement without a terminating ';'
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let cfg = Config::load(&args.config)?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let result = match args.command {
        Command::Run { only } => {
            info!(
                config = %args.config.display(),
                databases = cfg.databases.len(),
                loglevel = %cfg.loglevel,
                "starting generation run"
            );
            service::run(&cfg, &only).await.map(|reports| reports.len())
        }
        Command::Generate {
            schema_dir,
            output,
            script,
            locale,
            strict,
        } => {
            let name = output
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "database".to_string());
            let request = GenerateRequest {
                name,
                schema_directory: schema_dir,
                script_files: script,
                database_file: output,
                split_options: if strict {
                    SplitOptions::strict()
                } else {
                    SplitOptions::default()
                },
            };
            match collator_for(locale.as_deref().or(cfg.locale.as_deref())) {
                Ok(collator) => {
                    service::generate(&request, &DatabasePopulator::new(collator))
                        .await
                        .map(|_| 1)
                }
                Err(e) => Err(e),
            }
        }
    };

    match result {
        Ok(count) => {
            info!(count, "done");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "generation failed");
            Err(e.into())
        }
    }
}
