//! Convert mode CLI logic
//!
//! One-shot conversion of a local PDF: get a valid token (provisioning if
//! needed), upload, poll the conversion, charge usage, and write the CSV to
//! stdout or a file. Shares the session store with server mode, so quota
//! accounting carries across invocations.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{SessionManager, Settings, config::ConfigLoader, error::format_error};

/// Arguments for convert mode
#[derive(Debug)]
pub struct ConvertArgs {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub config: Option<String>,
    pub verbose: bool,
}

/// Run convert mode with the given arguments
pub async fn run_convert_mode(args: ConvertArgs) -> Result<()> {
    // Logs go to stderr so stdout stays clean for the CSV
    let default_level = if args.verbose { "debug" } else { "error" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(input) = args.input else {
        anyhow::bail!("No input file given. Use --input <statement.pdf> or the server subcommand.");
    };

    let filename = input
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
        .unwrap_or_else(|| "statement.pdf".to_string());
    if !filename.to_lowercase().ends_with(".pdf") {
        anyhow::bail!("A valid PDF file is required, got '{}'", filename);
    }

    let config_path = if let Some(config) = &args.config {
        Some(std::path::PathBuf::from(config))
    } else {
        ConfigLoader::get_config_path()
    };
    let settings = ConfigLoader::new()
        .load(config_path.as_deref())
        .unwrap_or_else(|e| {
            eprintln!(
                "Warning: Failed to load configuration: {}. Using defaults.",
                e
            );
            Settings::default()
        });

    let bytes = tokio::fs::read(&input)
        .await
        .with_context(|| format!("Failed to read {:?}", input))?;
    debug!("Read {} bytes from {:?}", bytes.len(), input);

    let session_manager = SessionManager::new(settings);
    let upstream = session_manager.upstream_client();

    let csv = async {
        let token = session_manager.get_valid_token().await?;

        info!("Uploading bank statement...");
        let uuid = upstream.upload(&token, bytes, &filename).await?;
        info!("Upload successful, UUID: {}", uuid);

        let csv = upstream.convert(&token, &uuid).await?;
        session_manager.record_usage().await?;
        Ok::<_, crate::Error>(csv)
    }
    .await
    .map_err(|e| anyhow::anyhow!(format_error(&e)))?;

    match &args.output {
        Some(output) => {
            tokio::fs::write(output, csv)
                .await
                .with_context(|| format!("Failed to write {:?}", output))?;
            info!("CSV written to {:?}", output);
        }
        None => {
            print!("{}", csv);
        }
    }

    Ok(())
}
