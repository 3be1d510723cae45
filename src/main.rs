use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use colored::*;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use seculex::app::{ChatApp, ClearOutcome};
use seculex::cli::{Args, ReplCommand, REPL_HELP};
use seculex::clipboard::SystemClipboard;
use seculex::config::Config;
use seculex::coordinator::SubmitOutcome;
use seculex::export::render_document;
use seculex::message::Role;
use seculex::state::with_state;
use seculex::transcript::{CopyLabel, Entry, EntryId};

const EXPORT_TITLE: &str = "SecuLex conversation";
const REDRAW_INTERVAL: Duration = Duration::from_millis(150);

fn init_tracing(verbose: bool) {
    let default = if verbose { "seculex=debug" } else { "seculex=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::load(args.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok())?;
    if let Some(url) = &args.url {
        config.base_url = url.clone();
    }
    if args.overlap {
        config.single_flight = false;
    }
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Terminal rendering
// ---------------------------------------------------------------------------

/// Prints entries once, and placeholders again whenever their text changes.
#[derive(Default)]
struct Printer {
    shown: HashMap<EntryId, String>,
}

impl Printer {
    fn reset(&mut self) {
        self.shown.clear();
    }

    fn flush(&mut self, app: &ChatApp) {
        let lines = with_state(app.state(), |s| {
            let mut out = Vec::new();
            // Numbers count messages only, matching `/copy N`.
            let mut number = 0;
            for entry in s.transcript.entries() {
                let key = match entry {
                    Entry::Message(_) => {
                        number += 1;
                        String::new()
                    }
                    Entry::Pending(p) => p.text.clone(),
                };
                if self.shown.get(&entry.id()) == Some(&key) {
                    continue;
                }
                self.shown.insert(entry.id(), key);
                out.push(render_entry(number, entry));
            }
            out
        });
        for line in lines {
            println!("{line}");
        }
    }
}

fn render_entry(number: usize, entry: &Entry) -> String {
    match entry {
        Entry::Pending(p) => format!("    {}", p.text.dimmed().italic()),
        Entry::Message(m) if m.message.role == Role::User => {
            format!("{} {}", "you>".bright_cyan().bold(), m.text())
        }
        Entry::Message(m) => {
            let mut block = format!("{} {}", format!("[{number}]").bright_black(), m.text());
            match &m.message.source {
                Some(label) => block.push_str(&format!("\n    {}", label.bright_blue())),
                None => block = block.bright_red().to_string(),
            }
            block
        }
    }
}

fn export_transcript(app: &ChatApp, path: &Path) -> std::io::Result<()> {
    let document = with_state(app.state(), |s| render_document(&s.transcript, EXPORT_TITLE));
    std::fs::write(path, document)?;
    println!("{} {}", "exported to".green(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

async fn run_stats(app: &ChatApp) {
    let view = app.load_stats().await;
    println!("{view}");
}

async fn run_clear(app: &ChatApp) -> Result<(), Box<dyn std::error::Error>> {
    app.client().clear_history().await?;
    println!("{}", "conversation history cleared".green());
    Ok(())
}

async fn run_once(app: &ChatApp, question: &str, export: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut printer = Printer::default();
    match app.submit(question) {
        SubmitOutcome::Accepted(handle) => {
            printer.flush(app);
            handle.await?;
        }
        SubmitOutcome::Ignored => return Err("question is empty".into()),
        SubmitOutcome::Busy => return Err("a request is already pending".into()),
    }
    printer.flush(app);
    if let Some(path) = export {
        export_transcript(app, path)?;
    }
    Ok(())
}

async fn prompt_line<R>(lines: &mut tokio::io::Lines<R>, prompt: &str) -> std::io::Result<Option<String>>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;
    lines.next_line().await
}

async fn run_repl(app: &ChatApp) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "SecuLex".bright_blue().bold());
    println!("{}", REPL_HELP.dimmed());
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printer = Printer::default();
    let mut ticker = tokio::time::interval(REDRAW_INTERVAL);

    loop {
        tokio::select! {
            _ = ticker.tick() => printer.flush(app),
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match ReplCommand::parse(&line) {
                    ReplCommand::Ask(question) => match app.submit(&question) {
                        SubmitOutcome::Accepted(_) => printer.flush(app),
                        SubmitOutcome::Busy => {
                            println!("{}", "still waiting on the previous answer".yellow());
                        }
                        SubmitOutcome::Ignored => {}
                    },
                    ReplCommand::Clear => {
                        let answer = prompt_line(&mut lines, "Clear the conversation? [y/N] ").await?;
                        let confirmed = answer
                            .map(|a| matches!(a.trim().to_lowercase().as_str(), "y" | "yes"))
                            .unwrap_or(false);
                        match app.clear_history(|| confirmed) {
                            ClearOutcome::Cleared(_) => {
                                printer.reset();
                                println!("{}", "conversation cleared".green());
                            }
                            ClearOutcome::Cancelled => println!("{}", "kept".dimmed()),
                        }
                    }
                    ReplCommand::Copy(index) => match app.copy(index) {
                        Some(CopyLabel::Copied) => println!("{}", CopyLabel::Copied.text().green()),
                        Some(label) => println!("{}", label.text().red()),
                        None => println!("{}", format!("no answer numbered {}", index + 1).yellow()),
                    },
                    ReplCommand::Stats => run_stats(app).await,
                    ReplCommand::Export(path) => {
                        if let Err(err) = export_transcript(app, &path) {
                            println!("{} {err}", "export failed:".red());
                        }
                    }
                    ReplCommand::Help => println!("{}", REPL_HELP.dimmed()),
                    ReplCommand::Quit => break,
                    ReplCommand::Invalid(reason) => println!("{}", reason.yellow()),
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "seculex", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(args.verbose);
    let config = resolve_config(&args)?;
    tracing::debug!(base_url = %config.base_url, "configuration resolved");

    let app = ChatApp::new(&config, Arc::new(SystemClipboard));

    if args.clear {
        return run_clear(&app).await;
    }
    if args.stats {
        run_stats(&app).await;
        return Ok(());
    }
    match &args.question {
        Some(question) => run_once(&app, question, args.export.as_deref()).await,
        None => {
            run_repl(&app).await?;
            if let Some(path) = &args.export {
                export_transcript(&app, path)?;
            }
            Ok(())
        }
    }
}
