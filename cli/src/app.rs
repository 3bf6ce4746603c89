use anyhow::{bail, Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use inmo_chat::{ConversationSession, IgnoreReason, SendOutcome};
use inmo_core::{cancel_pair, GenerationClient, ListingDraft};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::output::{print_chat_help, print_reply};

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

/// Media type guessed from the file extension
fn media_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

/// Interactive chat loop over one conversation session
pub async fn run_chat(session: &ConversationSession) -> Result<()> {
    if let Some(greeting) = session.turns().first() {
        println!("{}: {}", "ColaboraBot".blue().bold(), greeting.text());
    }
    print_chat_help();

    loop {
        let marker = if session.pending_attachment().is_some() {
            "Tú [📎]"
        } else {
            "Tú"
        };
        print!("{}: ", marker.green().bold());
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        if io::stdin()
            .read_line(&mut input)
            .context("Failed to read input")?
            == 0
        {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("/quit") || input.eq_ignore_ascii_case("exit") {
            println!("Hasta pronto.");
            break;
        }
        if input == "/reset" {
            session.reset();
            println!("{}", "Conversación reiniciada.".yellow());
            continue;
        }
        if input == "/clear" {
            session.clear_attachment();
            continue;
        }
        if let Some(path) = input.strip_prefix("/image ") {
            let path = Path::new(path.trim());
            match std::fs::read(path) {
                Ok(bytes) => match session.attach_image(bytes, media_type_for(path)) {
                    Ok(()) => println!("{}", "Imagen adjunta.".cyan()),
                    Err(e) => eprintln!("{}", format!("No se pudo adjuntar: {}", e).red()),
                },
                Err(e) => eprintln!("{}", format!("No se pudo leer {}: {}", path.display(), e).red()),
            }
            continue;
        }

        let message = if session.pending_attachment().is_some() {
            "Analizando imagen..."
        } else {
            "Escribiendo..."
        };
        let spinner = spinner(message);
        debug!(input = input, "Sending chat input");
        let outcome = session.send(input).await;
        spinner.finish_and_clear();

        match outcome {
            SendOutcome::Replied(reply) => print_reply(&reply),
            SendOutcome::Ignored(IgnoreReason::EmptyInput) => continue,
            SendOutcome::Ignored(IgnoreReason::AwaitingReply) => {
                println!("{}", "Espera a la respuesta anterior.".yellow());
            }
        }
        println!();
    }

    Ok(())
}

/// Prints a generated description, or explains why there is none
pub async fn run_describe(client: &GenerationClient, draft: ListingDraft) -> Result<()> {
    let missing = draft.missing_required();
    if !missing.is_empty() {
        bail!(
            "Por favor rellena al menos Título, Ciudad y Precio (faltan: {})",
            missing.join(", ")
        );
    }

    let spinner = spinner("Redactando descripción...");
    let description = client.describe(&draft).await;
    spinner.finish_and_clear();

    if description.is_empty() {
        eprintln!("{}", "No se pudo generar la descripción.".red());
    } else {
        println!("{}", description);
    }
    Ok(())
}

/// Generates a video, selecting a credential first if needed
pub async fn run_video(client: &GenerationClient, prompt: &str) -> Result<()> {
    if client.credentials().active().is_none() {
        client
            .ensure_credential()
            .await
            .context("Se necesita una API Key para generar vídeos")?;
    }

    let (handle, mut signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    let spinner = spinner("Generando vídeo (puede tardar unos minutos)...");
    let result = client.synthesize_video(prompt, &mut signal).await;
    spinner.finish_and_clear();

    match result {
        Ok(reply) => {
            info!("Video generated");
            print_reply(&reply);
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Video generation failed");
            eprintln!(
                "{}",
                "Error generando video. Asegúrate de haber seleccionado una API Key válida.".red()
            );
            Err(e.into())
        }
    }
}
