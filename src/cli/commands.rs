use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::models::{BlockData, ChatLog};
use crate::parsers::ChatSyncScanner;
use crate::profile::{load_profile_dir, parse_chatsync_file};
use crate::utils::{get_chatsync_dir, safe_open_file, sanitize_for_terminal};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Parser)]
#[command(name = "chatsync-reader")]
#[command(version = "0.1.0")]
#[command(about = "Read conversation history from Skype chatsync files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the conversation stored in a chatsync file
    Show {
        /// Path to a chatsync .dat file
        file: PathBuf,
        /// Print the parsed conversation as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the block structure of a chatsync file
    Scan {
        /// Path to a chatsync .dat file
        file: PathBuf,
    },
    /// Show statistics for every chatsync file in a directory
    Stats {
        /// Chatsync directory (defaults to $SKYPE_CHATSYNC_DIR)
        dir: Option<PathBuf>,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Show { file, json }) => show_conversation(file, *json)?,
        Some(Commands::Scan { file }) => show_structure(file)?,
        Some(Commands::Stats { dir }) => show_stats(dir.as_deref())?,
        None => {
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn show_conversation(path: &Path, json: bool) -> Result<()> {
    let log = parse_chatsync_file(path)?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&log).context("Failed to serialize conversation")?;
        println!("{}", rendered);
        return Ok(());
    }

    print_transcript(&log);
    Ok(())
}

fn print_transcript(log: &ChatLog) {
    if let Some([first, second]) = &log.participants {
        println!(
            "Conversation: {} / {}",
            sanitize_for_terminal(first),
            sanitize_for_terminal(second)
        );
    }
    println!("Created: {}", log.timestamp.format(TIMESTAMP_FORMAT));

    if log.is_empty || log.conversation.is_empty() {
        println!("No messages");
    }
    for message in &log.conversation {
        println!(
            "[{}] {}: {}{}",
            message.timestamp.format(TIMESTAMP_FORMAT),
            sanitize_for_terminal(&message.author),
            sanitize_for_terminal(&message.text),
            if message.is_edit { " (edited)" } else { "" }
        );
    }

    if log.errors > 0 {
        eprintln!("{} messages could not be decoded", log.errors);
    }
}

fn show_structure(path: &Path) -> Result<()> {
    let file = safe_open_file(path)?;
    let scan = ChatSyncScanner::new(std::io::BufReader::new(file), path.display().to_string())
        .scan()
        .with_context(|| format!("Error scanning {}", path.display()))?;

    println!("File: {}", path.display());
    println!("Created: {}", scan.timestamp.format(TIMESTAMP_FORMAT));
    println!("Declared size: {} bytes", scan.header.data_size);
    println!("Blocks: {}", scan.blocks.len());
    for (i, block) in scan.blocks.iter().enumerate() {
        let contents = match &block.data {
            BlockData::Records(records) => format!("{} records", records.len()),
            BlockData::Messages(messages) => format!("{} messages", messages.len()),
            BlockData::Entries(entries) => format!("{} entries", entries.len()),
        };
        println!(
            "  #{} type {} ({} bytes): {}",
            i + 1,
            block.header.block_type,
            block.header.data_size,
            contents
        );
    }

    println!("Warnings: {}", scan.warning_count());
    for warning in scan.diagnostics.warnings() {
        println!("  {}", warning);
    }

    Ok(())
}

fn show_stats(dir: Option<&Path>) -> Result<()> {
    let chatsync_dir = get_chatsync_dir(dir)?;
    let load = load_profile_dir(&chatsync_dir)?;

    let empty = load.logs.iter().filter(|l| l.is_empty).count();
    let messages: usize = load.logs.iter().map(|l| l.conversation.len()).sum();
    let edits: usize = load.logs.iter().map(|l| l.edit_count()).sum();
    let warnings: usize = load.logs.iter().map(|l| l.warning_count()).sum();
    let errors: usize = load.logs.iter().map(|l| l.errors).sum();

    println!("Chatsync Statistics");
    println!("===================");
    println!("Files found: {}", load.files_seen());
    println!("  Parsed: {}", load.logs.len());
    println!("  Failed: {}", load.failures.len());
    println!("Empty conversations: {}", empty);
    println!("Messages: {}", messages);
    println!("  Edited: {}", edits);
    println!("Scan warnings: {}", warnings);
    println!("Undecodable messages: {}", errors);
    println!();
    println!("Chatsync directory: {}", chatsync_dir.display());

    if let Some(oldest) = load.logs.iter().map(|l| l.timestamp).min() {
        println!("Oldest file: {}", oldest.format(TIMESTAMP_FORMAT));
    }
    if let Some(newest) = load.logs.iter().map(|l| l.timestamp).max() {
        println!("Newest file: {}", newest.format(TIMESTAMP_FORMAT));
    }

    Ok(())
}
