use clap::{Parser, Subcommand};
use inmo_core::PropertyOperation;
use std::path::PathBuf;

/// Terminal front-end for the marketplace assistant
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the config file (defaults to ~/.config/inmo-assistant/config.toml)
    #[arg(short, long, env = "INMO_CONFIG")]
    pub config: Option<PathBuf>,

    /// TOML file with `[[listings]]` to use as the catalog instead of the demo listings
    #[arg(long, env = "INMO_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chat with the assistant (`/image <path>`, `/clear`, `/reset`, `/quit`)
    Chat,

    /// Draft a marketing description for a listing
    Describe {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        price: Option<u64>,
        #[arg(long, value_parser = parse_operation)]
        operation: Option<PropertyOperation>,
        #[arg(long)]
        bedrooms: Option<u32>,
        #[arg(long)]
        bathrooms: Option<u32>,
        #[arg(long)]
        size: Option<u32>,
        #[arg(long)]
        extras: Option<String>,
    },

    /// Generate a promotional video (Ctrl-C cancels while waiting)
    Video {
        /// What the video should show
        prompt: String,
    },

    /// Show the assistant instruction, or replace it with `--set`
    Instruction {
        #[arg(long)]
        set: Option<String>,
    },
}

fn parse_operation(value: &str) -> Result<PropertyOperation, String> {
    match value.to_lowercase().replace('-', "_").as_str() {
        "sale" | "venta" => Ok(PropertyOperation::Sale),
        "long_term_rent" => Ok(PropertyOperation::LongTermRent),
        "vacation_rent" => Ok(PropertyOperation::VacationRent),
        "september_to_june_rent" => Ok(PropertyOperation::SeptemberToJuneRent),
        "student_rent" => Ok(PropertyOperation::StudentRent),
        "transfer" | "traspaso" => Ok(PropertyOperation::Transfer),
        "land" | "terreno" => Ok(PropertyOperation::Land),
        other => Err(format!("unknown operation: {}", other)),
    }
}
