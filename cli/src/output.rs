use colored::*;
use inmo_core::{segments, AssistantReply, TextSegment};

/// Print an assistant reply with links and citations highlighted
pub fn print_reply(reply: &AssistantReply) {
    println!("{}: {}", "ColaboraBot".blue().bold(), render_text(reply.text()));

    for citation in reply.citations() {
        println!(
            "  {} {} {}",
            "📍".red(),
            citation.label.bold(),
            citation.location_uri.underline().blue()
        );
    }

    if let Some(uri) = reply.media_uri() {
        println!("{} {}", "Video:".purple().bold(), uri.underline());
    }
}

pub fn render_text(text: &str) -> String {
    segments(text)
        .into_iter()
        .map(|segment| match segment {
            TextSegment::Plain(plain) => plain,
            TextSegment::Link(link) => link.underline().blue().to_string(),
            TextSegment::WhatsApp(link) => {
                format!("{} {}", "[WhatsApp]".on_green().white().bold(), link.green())
            }
        })
        .collect()
}

pub fn print_chat_help() {
    println!("{}", "Comandos:".yellow().bold());
    println!("  {}  adjunta una foto al próximo mensaje", "/image <ruta>".green());
    println!("  {}         descarta la foto adjunta", "/clear".green());
    println!("  {}         empieza una conversación nueva", "/reset".green());
    println!("  {}          salir", "/quit".green());
    println!();
}
