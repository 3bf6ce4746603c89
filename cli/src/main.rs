use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use inmo_chat::ConversationSession;
use inmo_core::config::get_default_config_file;
use inmo_core::{
    Actor, AssistantConfig, CatalogProvider, CatalogProviderRef, GenerationBackend, GenerationClient, HttpBackend,
    InstructionStore, ListingDraft, StaticCatalog,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

mod app;
mod cli;
mod credentials;
mod logging;
mod output;

use crate::cli::{Args, Command};
use crate::credentials::PromptCredentials;

const APP_NAME: &str = "inmo-assistant";

fn config_path(args: &Args) -> Result<PathBuf> {
    match &args.config {
        Some(path) => Ok(path.clone()),
        None => Ok(get_default_config_file(APP_NAME)?),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config_path = config_path(&args)?;
    let file_config =
        AssistantConfig::load_from_file(&config_path).context("Failed to load configuration")?;
    let config = AssistantConfig::default()
        .merge(&file_config)
        .with_env_overrides();

    let level = if args.verbose {
        "debug".to_string()
    } else {
        config.log_level.clone().unwrap_or_else(|| "info".to_string())
    };
    logging::init(&level);
    info!("Starting marketplace assistant");

    let catalog: CatalogProviderRef = match &args.catalog {
        Some(path) => Arc::new(
            StaticCatalog::load_from_file(path)
                .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        ),
        None => Arc::new(StaticCatalog::sample()),
    };
    debug!(listings = catalog.listings().len(), "Catalog loaded");

    let backend: Arc<dyn GenerationBackend> = Arc::new(HttpBackend::new(&config)?);
    let credentials = Arc::new(PromptCredentials::new(config.api_key.clone()));
    let client = Arc::new(GenerationClient::new(
        backend,
        credentials,
        catalog,
        &config,
    ));
    let instructions = Arc::new(match &config.assistant_instruction {
        Some(text) => InstructionStore::new(text.clone()),
        None => InstructionStore::default(),
    });

    match args.command {
        Command::Chat => {
            let session = ConversationSession::from_config(client, instructions, &config);
            app::run_chat(&session).await?;
        }
        Command::Describe {
            title,
            city,
            price,
            operation,
            bedrooms,
            bathrooms,
            size,
            extras,
        } => {
            let draft = ListingDraft {
                title,
                city,
                price,
                operation,
                bedrooms,
                bathrooms,
                size_m2: size,
                extras,
            };
            app::run_describe(&client, draft).await?;
        }
        Command::Video { prompt } => {
            app::run_video(&client, &prompt).await?;
        }
        Command::Instruction { set } => {
            if let Some(text) = set {
                // the terminal user is the operator of their own install
                instructions.update(&Actor::Operator, text.clone())?;
                let mut updated = file_config;
                updated.assistant_instruction = Some(text);
                updated
                    .save_to_file(&config_path)
                    .context("Failed to save instruction")?;
                info!(path = %config_path.display(), "Instruction saved");
            }
            println!("{}", "Instrucción actual:".yellow().bold());
            println!("{}", instructions.current());
        }
    }

    Ok(())
}
