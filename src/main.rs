use anyhow::Result;
use clap::Parser;
use clearwhistle::{config, init_config, init_telemetry, ClearWhistleConfig};

mod cli;

use cli::commands::ledger::LedgerCommand;
use cli::commands::show::ShowCommand;
use cli::commands::submit::SubmitCommand;
use cli::commands::verify::VerifyCommand;
use cli::commands::show_how_to_submit;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            ClearWhistleConfig::load_env_file()?;
            ClearWhistleConfig::load_from(path)?
        }
        None => config()?.clone(),
    };
    init_telemetry(&config.observability)?;
    match &cli.config {
        Some(path) => tracing::info!(path = %path.display(), "Configuration loaded from file"),
        None => init_config()?,
    }

    let runtime = tokio::runtime::Runtime::new()?;
    match cli.command {
        // Default behavior: no subcommand - explain how to submit
        None => runtime.block_on(async { show_how_to_submit().await }),
        Some(Commands::Submit {
            org_type,
            org_name,
            email,
            code,
            report_type,
            title,
            details,
            evidence,
            json,
        }) => runtime.block_on(async {
            SubmitCommand {
                organization_type: org_type,
                organization_name: org_name,
                email,
                code,
                report_type,
                title,
                details,
                evidence,
                json,
            }
            .execute(&config)
            .await
        }),
        Some(Commands::Verify { content_id, json }) => runtime.block_on(async {
            VerifyCommand { content_id, json }.execute(&config).await
        }),
        Some(Commands::Show { content_id, json }) => runtime.block_on(async {
            ShowCommand { content_id, json }.execute(&config).await
        }),
        Some(Commands::Ledger { json }) => {
            runtime.block_on(async { LedgerCommand { json }.execute(&config).await })
        }
    }
}
