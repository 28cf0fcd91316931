mod cli;
mod commands;
mod render;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::commands::{App, report_error};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli.settings.validate() {
        render::failure(&e);
        return ExitCode::from(2);
    }

    tracing::debug!(api_url = %cli.settings.api_url, "starting {}", fundlink::metadata::PKG_NAME);

    let app = match App::new(cli.settings) {
        Ok(app) => app,
        Err(e) => {
            report_error(&e);
            return ExitCode::FAILURE;
        }
    };

    match app.run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("command failed: {e:?}");
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}
