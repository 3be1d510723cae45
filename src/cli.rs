use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "seculex")]
#[command(version)]
#[command(about = "Terminal client for the SecuLex question-answering service")]
pub struct Args {
    /// Question to ask. Omit to start an interactive session.
    pub question: Option<String>,

    /// Backend base URL (overrides config file and SECULEX_URL)
    #[arg(long)]
    pub url: Option<String>,

    /// Path to a TOML config file (defaults to ./seculex.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Show the learning statistics and exit
    #[arg(long)]
    pub stats: bool,

    /// Clear the server-side conversation history and exit
    #[arg(long)]
    pub clear: bool,

    /// Write the transcript to this HTML file when done
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Allow a new question while one is still pending
    #[arg(long)]
    pub overlap: bool,

    /// Debug-level logging (RUST_LOG still wins when set)
    #[arg(long, short)]
    pub verbose: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_enum)]
    pub completions: Option<clap_complete::Shell>,
}

/// Interactive session commands. Anything else is a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Ask(String),
    Clear,
    Copy(usize),
    Stats,
    Export(PathBuf),
    Help,
    Quit,
    Invalid(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return ReplCommand::Ask(trimmed.to_string());
        };
        let mut parts = rest.splitn(2, char::is_whitespace);
        let name = parts.next().unwrap_or("");
        let arg = parts.next().map(str::trim).unwrap_or("");
        match name {
            "clear" => ReplCommand::Clear,
            "stats" => ReplCommand::Stats,
            "help" => ReplCommand::Help,
            "quit" | "exit" => ReplCommand::Quit,
            // Entries are numbered from 1 on screen.
            "copy" => match arg.parse::<usize>() {
                Ok(n) if n >= 1 => ReplCommand::Copy(n - 1),
                _ => ReplCommand::Invalid(format!("usage: /copy N (got '{arg}')")),
            },
            "export" if !arg.is_empty() => ReplCommand::Export(PathBuf::from(arg)),
            "export" => ReplCommand::Invalid("usage: /export PATH".to_string()),
            other => ReplCommand::Invalid(format!("unknown command '/{other}'")),
        }
    }
}

pub const REPL_HELP: &str = "\
Type a question and press Enter.
  /copy N       copy answer N to the clipboard
  /clear        clear the conversation (asks first)
  /stats        show learning statistics
  /export PATH  save the conversation as HTML
  /quit         leave";
