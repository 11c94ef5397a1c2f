//! Migcheck - pre-migration validation for web applications and databases.

use anyhow::Context;
use clap::{Parser, Subcommand};
use migcheck_checks::{Capabilities, Category, CheckerConfig, CheckerSet};
use migcheck_common::Error;
use migcheck_descriptor::adapter;
use migcheck_engine::{Console, ExecutionMode, ReportFormat, Validator, ValidatorConfig};
use migcheck_redaction::{Redactor, RedactorConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "migcheck")]
#[command(
    author,
    version,
    about = "Validate that a migration can run before moving any data"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every check against a migration descriptor
    Validate {
        /// Descriptor file (JSON or YAML)
        #[arg(long, short)]
        descriptor: PathBuf,

        /// Report format (markdown, json, text)
        #[arg(long, default_value = "markdown")]
        format: String,

        /// Write the report here instead of stdout
        #[arg(long, short)]
        out: Option<PathBuf>,

        /// Write remediation scripts into this directory
        #[arg(long)]
        scripts: Option<PathBuf>,

        /// Only run one category (connectivity, compatibility, dependency, permission)
        #[arg(long)]
        category: Option<String>,

        /// Run checkers one after another
        #[arg(long)]
        sequential: bool,

        /// Network and login timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,

        /// Wall-clock limit per checker in seconds
        #[arg(long)]
        budget: Option<u64>,

        /// Replace secrets with stable hashes instead of [REDACTED]
        #[arg(long)]
        hash_secrets: bool,

        /// Print the per-check result tree
        #[arg(long)]
        detailed: bool,
    },

    /// Print the descriptor JSON schema
    Schema,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Validate {
            descriptor,
            format,
            out,
            scripts,
            category,
            sequential,
            timeout,
            budget,
            hash_secrets,
            detailed,
        } => {
            if timeout == 0 || budget == Some(0) {
                return Err(Error::Config("timeouts must be at least one second".to_string()).into());
            }
            let format: ReportFormat = format.parse()?;
            let category: Option<Category> = category.as_deref().map(str::parse).transpose()?;

            info!("Loading descriptor: {:?}", descriptor);
            let migration = adapter::from_path(&descriptor)
                .with_context(|| format!("Failed to load descriptor {}", descriptor.display()))?;

            let checker_config = CheckerConfig {
                network_timeout: Duration::from_secs(timeout),
                ..Default::default()
            };
            let checkers = CheckerSet::standard(checker_config, Capabilities::new());

            let config = ValidatorConfig {
                mode: if sequential {
                    ExecutionMode::Sequential
                } else {
                    ExecutionMode::Concurrent
                },
                checker_budget: budget.map(Duration::from_secs),
            };
            let redactor = Redactor::with_config(RedactorConfig {
                use_hash_placeholders: hash_secrets,
                ..Default::default()
            });

            // Progress goes to stderr so a report on stdout stays parseable.
            let mut validator = Validator::with_config(checkers, config)
                .with_redactor(redactor)
                .with_console(Console::new(Box::new(std::io::stderr())));

            match category {
                Some(category) => {
                    let issues = validator.validate_single_category(&migration, category).await;
                    info!("{} check found {} issues", category, issues.len());
                }
                None => {
                    validator
                        .validate_migration(&migration, true, detailed)
                        .await;
                }
            }

            match &out {
                Some(path) => {
                    validator
                        .save_report(path, format)
                        .with_context(|| format!("Failed to write report {}", path.display()))?;
                    info!("Report written to {:?}", path);
                }
                None => println!("{}", validator.get_validation_report(format)),
            }

            if let Some(dir) = &scripts {
                let written = validator.save_remediation_scripts(dir)?;
                for path in &written {
                    info!("Remediation script: {:?}", path);
                }
            }

            let can_proceed = validator.summary().is_some_and(|s| s.can_proceed);
            if !can_proceed {
                warn!("Migration is blocked by critical issues");
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Schema => {
            let schema = migcheck_descriptor::schema::descriptor_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}
