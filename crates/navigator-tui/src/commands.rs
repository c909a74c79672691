use std::sync::Arc;
use anyhow::{anyhow, bail, Result};
use colored::*;
use navigator_core::prose::{self, Inline, LineKind, ProseLine};
use navigator_core::{curriculum, segment, Completion, Config, ContentBlock, GeminiError, GeminiTutor, Navigator};
use tokio::sync::mpsc::UnboundedReceiver;

pub fn list_curriculum() {
    println!("\n{}", "📚 Ansible Curriculum".bold().blue());
    println!("{}", "=".repeat(40).dimmed());

    for section in curriculum::sections() {
        println!("\n{}", section.title.bold().green());
        for topic in section.subtopics {
            println!("  • {}", topic);
        }
    }
}

/// One-shot commands drive the same stores as the TUI
fn connect(config: &Config) -> Result<(Navigator, UnboundedReceiver<Completion>)> {
    let tutor = GeminiTutor::from_config(config);
    if !tutor.has_api_key() {
        bail!(GeminiError::MissingApiKey);
    }
    Ok(Navigator::new(Arc::new(tutor)))
}

pub async fn show_topic(config: &Config, query: &str, html: bool) -> Result<()> {
    let topic = curriculum::find_topic(query).ok_or_else(|| {
        anyhow!(
            "No curriculum topic matches {:?}. Run `ansible-navigator list` to see them all.",
            query
        )
    })?;

    let (mut navigator, mut completions) = connect(config)?;
    navigator.select_topic(topic);

    if !html {
        eprintln!("🤖 Fetching lesson for {}...", topic.bold().cyan());
    }
    let completion = completions
        .recv()
        .await
        .ok_or_else(|| anyhow!("Lesson request was dropped"))?;
    navigator.apply(completion);

    let body = navigator.topics().body();
    if html {
        print!("{}", prose::render_html(body));
    } else {
        println!("\n{}", topic.bold().white());
        println!("{}", "━".repeat(topic.chars().count()).red());
        print_body(body);
    }
    Ok(())
}

pub async fn ask(config: &Config, question: &str, thinking: bool) -> Result<()> {
    let (mut navigator, mut completions) = connect(config)?;
    navigator.set_thinking_mode(thinking);

    if !navigator.send_message(question) {
        bail!("Question is empty");
    }

    let model = if thinking { "thinking model" } else { "chat model" };
    eprintln!("🤖 Asking the tutor ({})...\n", model.magenta());

    let completion = completions
        .recv()
        .await
        .ok_or_else(|| anyhow!("Question was dropped"))?;
    navigator.apply(completion);

    if let Some(answer) = navigator.conversation().history().last() {
        print_body(answer.text());
    }
    Ok(())
}

pub fn set_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        bail!("API key is empty");
    }
    let path = Config::save_api_key(key)?;
    println!("{} {}", "API key saved to".green(), path.display());
    Ok(())
}

fn styled_line(line: &ProseLine) -> String {
    let mut out = String::new();
    if line.kind == LineKind::ListItem {
        out.push_str(&"  • ".red().to_string());
    }
    for span in &line.spans {
        let piece = match (span, line.kind) {
            (Inline::Code(code), _) => code.yellow(),
            (Inline::Text(text), LineKind::Heading2) => text.bold().cyan().underline(),
            (Inline::Text(text), LineKind::Heading3) => text.bold().cyan(),
            (Inline::Text(text), _) => text.normal(),
        };
        out.push_str(&piece.to_string());
    }
    out
}

fn print_body(body: &str) {
    for block in segment(body) {
        match block {
            ContentBlock::Prose(text) => {
                for line in prose::prose_lines(&text) {
                    println!("{}", styled_line(&line));
                }
            }
            ContentBlock::Code { language, source } => {
                println!("{}", format!("┌─ {} ─", language).dimmed());
                for code_line in source.strip_suffix('\n').unwrap_or(&source).split('\n') {
                    println!("{} {}", "│".dimmed(), code_line.green());
                }
                println!("{}", "└─".dimmed());
            }
        }
    }
}
