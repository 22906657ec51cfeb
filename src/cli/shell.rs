//! Line-oriented interactive shell.
//!
//! The shell keeps one workspace open and reads commands from stdin. A line
//! consisting of the download key alone triggers "download all", but only
//! while focus is on the command prompt: after `ask` or `ext` with no
//! argument, the next line is treated as the question or the extension.

use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::files;
use crate::core::app::{self, ChatSettings};
use crate::core::config::data::Config;
use crate::core::shortcut::{resolve_shortcut, Focus, ShortcutAction, DOWNLOAD_ALL_KEY};
use crate::core::store::StateStore;
use crate::core::workspace::Workspace;
use crate::utils::logging::TranscriptLog;

/// Extensions offered when picking a target from a list.
pub const EXTENSION_CHOICES: &[&str] = &[
    "txt", "md", "json", "js", "ts", "html", "css", "py", "rs", "csv",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellControl {
    Continue,
    Quit,
}

pub struct Shell<S: StateStore> {
    workspace: Workspace<S>,
    settings: ChatSettings,
    transcript: TranscriptLog,
    download_dir: PathBuf,
    archive_name: String,
    focus: Focus,
}

impl<S: StateStore> Shell<S> {
    pub fn new(
        workspace: Workspace<S>,
        settings: ChatSettings,
        transcript: TranscriptLog,
        download_dir: PathBuf,
        archive_name: String,
    ) -> Self {
        Self {
            workspace,
            settings,
            transcript,
            download_dir,
            archive_name,
            focus: Focus::Command,
        }
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn workspace(&self) -> &Workspace<S> {
        &self.workspace
    }

    pub fn prompt(&self) -> &'static str {
        match self.focus {
            Focus::Command => "extshift> ",
            Focus::TextInput => "question> ",
            Focus::Select => "extension> ",
        }
    }

    /// Handles one input line. Failures are reported to `out` and never end
    /// the session.
    pub async fn handle_line(&mut self, line: &str, out: &mut dyn Write) -> io::Result<ShellControl> {
        let line = line.trim();
        match self.focus {
            Focus::TextInput => {
                self.focus = Focus::Command;
                if line.is_empty() {
                    writeln!(out, "Cancelled.")?;
                } else {
                    self.send_question(line.to_string(), out).await?;
                }
                Ok(ShellControl::Continue)
            }
            Focus::Select => {
                self.focus = Focus::Command;
                if line.is_empty() {
                    writeln!(out, "Cancelled.")?;
                } else {
                    let choice = choose_extension(line);
                    report(files::set_extension(&mut self.workspace, choice, out), out)?;
                }
                Ok(ShellControl::Continue)
            }
            Focus::Command => self.handle_command(line, out).await,
        }
    }

    async fn handle_command(&mut self, line: &str, out: &mut dyn Write) -> io::Result<ShellControl> {
        let mut chars = line.chars();
        if let (Some(key), None) = (chars.next(), chars.next()) {
            if let Some(ShortcutAction::DownloadAll) = resolve_shortcut(key, self.focus) {
                debug!("Download shortcut triggered");
                let result = files::download(
                    &self.workspace,
                    &self.download_dir,
                    &self.archive_name,
                    out,
                );
                report(result, out)?;
                return Ok(ShellControl::Continue);
            }
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "quit" | "exit" => return Ok(ShellControl::Quit),
            "help" => print_help(out)?,
            "add" | "add-flat" => {
                let paths: Vec<PathBuf> = rest.split_whitespace().map(PathBuf::from).collect();
                if paths.is_empty() {
                    writeln!(out, "Usage: {command} <path>...")?;
                } else {
                    let flat = command == "add-flat";
                    let result =
                        files::add_files(&mut self.workspace, &paths, None, flat, out).await;
                    report(result.map(|_| ()), out)?;
                }
            }
            "list" => files::list_files(&self.workspace, out)?,
            "clear" => files::clear_files(&mut self.workspace, out)?,
            "ext" if rest.is_empty() => {
                writeln!(out, "Current target: .{}", self.workspace.target_extension())?;
                for (index, ext) in EXTENSION_CHOICES.iter().enumerate() {
                    writeln!(out, "  {}. {ext}", index + 1)?;
                }
                writeln!(out, "Pick a number or type an extension (empty line cancels).")?;
                self.focus = Focus::Select;
            }
            "ext" => {
                let result = files::set_extension(&mut self.workspace, rest, out);
                report(result, out)?;
            }
            "folders" => match files::parse_toggle(rest) {
                Ok(preserve) => files::set_preserve_folders(&mut self.workspace, preserve, out)?,
                Err(err) => writeln!(out, "❌ {err}")?,
            },
            "zip" | "text" if rest.is_empty() => {
                writeln!(out, "Usage: {command} <output-file>")?;
            }
            "zip" => {
                let result = files::export_archive_to(&self.workspace, Path::new(rest), out);
                report(result, out)?;
            }
            "text" => {
                let result = files::export_text_to(&self.workspace, Path::new(rest), out);
                report(result, out)?;
            }
            "download" => {
                let result = files::download(
                    &self.workspace,
                    &self.download_dir,
                    &self.archive_name,
                    out,
                );
                report(result, out)?;
            }
            "ask" if rest.is_empty() => {
                writeln!(out, "Type your question (empty line cancels).")?;
                self.focus = Focus::TextInput;
            }
            "ask" => self.send_question(rest.to_string(), out).await?,
            "history" if rest == "clear" => {
                self.workspace.clear_history();
                writeln!(out, "✅ Chat history cleared")?;
            }
            "history" => files::show_history(&self.workspace, out)?,
            other => {
                writeln!(out, "Unknown command: {other} (type 'help' for a list)")?;
            }
        }
        Ok(ShellControl::Continue)
    }

    async fn send_question(&mut self, question: String, out: &mut dyn Write) -> io::Result<()> {
        let mut write_failed = None;
        let exchange = app::ask(
            &mut self.workspace,
            &self.settings,
            question,
            None,
            &self.transcript,
            CancellationToken::new(),
            |chunk| {
                if write_failed.is_none() {
                    if let Err(err) = write!(out, "{chunk}").and_then(|()| out.flush()) {
                        write_failed = Some(err);
                    }
                }
            },
        )
        .await;
        if let Some(err) = write_failed {
            return Err(err);
        }
        match exchange.error {
            Some(err) => writeln!(out, "\n❌ {err}"),
            None => writeln!(out),
        }
    }
}

fn report(result: Result<(), Box<dyn Error>>, out: &mut dyn Write) -> io::Result<()> {
    if let Err(err) = result {
        writeln!(out, "❌ {err}")?;
    }
    Ok(())
}

/// Maps a select answer to an extension: a 1-based index into
/// [`EXTENSION_CHOICES`] or the extension itself.
fn choose_extension(answer: &str) -> &str {
    answer
        .parse::<usize>()
        .ok()
        .and_then(|index| index.checked_sub(1))
        .and_then(|index| EXTENSION_CHOICES.get(index).copied())
        .unwrap_or(answer)
}

fn print_help(out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "Commands:")?;
    writeln!(out, "  add <path>...       Load files and folders, keeping relative paths")?;
    writeln!(out, "  add-flat <file>...  Load files by name only")?;
    writeln!(out, "  list                Show loaded files")?;
    writeln!(out, "  clear               Drop all loaded files")?;
    writeln!(out, "  ext [extension]     Set the target extension (no argument: pick from a list)")?;
    writeln!(out, "  folders on|off      Keep or flatten folders in archives")?;
    writeln!(out, "  zip <file>          Write the renamed files to a zip archive")?;
    writeln!(out, "  text <file>         Write all files into one text file")?;
    writeln!(out, "  download            Save everything to the download directory")?;
    writeln!(out, "  {DOWNLOAD_ALL_KEY}                   Same as download")?;
    writeln!(out, "  ask [question]      Ask about the loaded files (no argument: type it next)")?;
    writeln!(out, "  history [clear]     Show or clear the chat history")?;
    writeln!(out, "  quit                Leave the shell")
}

pub async fn run_shell(config: &Config, log: Option<PathBuf>) -> Result<(), Box<dyn Error>> {
    let workspace = app::open_workspace(config)?;
    let transcript = TranscriptLog::new(log)?;
    if transcript.is_active() {
        println!("{}", transcript.get_status_string());
    }
    let mut shell = Shell::new(
        workspace,
        ChatSettings::from_config(config),
        transcript,
        std::env::current_dir()?,
        config.archive_name().to_string(),
    );

    println!("extshift shell. Type 'help' for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();
    loop {
        print!("{}", shell.prompt());
        stdout.flush()?;
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        if shell.handle_line(&line, &mut stdout).await? == ShellControl::Quit {
            break;
        }
    }
    Ok(())
}
