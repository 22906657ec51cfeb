//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod ask;
pub mod files;
pub mod shell;

use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::ask::run_ask;
use crate::cli::shell::run_shell;
use crate::core::app;
use crate::core::config::Config;
use crate::utils::logging::init_tracing;

#[derive(Parser)]
#[command(name = "extshift")]
#[command(about = "Bulk-rename file extensions and ask an AI model about the files")]
#[command(
    long_about = "extshift loads files and folders, rewrites the final extension of every \
file name, and saves the results as a zip archive, a single combined text file, or \
individual files. Loaded files and chat history are kept between runs.\n\n\
The 'ask' command streams a question, together with the loaded files, to a \
generation endpoint and prints the answer as it arrives.\n\n\
Environment Variables:\n\
  EXTSHIFT_BASE_URL   Override the endpoint base URL from the config file\n\
  EXTSHIFT_API_KEY    Bearer token for the endpoint (variable name configurable)\n\
  EXTSHIFT_LOG        Log filter for diagnostics on stderr (default: warn)\n\n\
Shell:\n\
  Run 'extshift shell' (or no command) for an interactive session. Type 'help' \n\
  there for the list of commands; pressing d and Enter downloads everything."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Append the chat transcript to the specified file
    #[arg(short = 'l', long, global = true)]
    pub log: Option<PathBuf>,

    /// Keep session state in this directory instead of the configured one
    #[arg(long, global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load files and folders, replacing the current set
    Add {
        /// Files or folders to load
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Target extension to apply (saved for later loads)
        #[arg(short = 'e', long)]
        ext: Option<String>,
        /// Treat arguments as a flat list of files and keep only their names
        #[arg(long)]
        flat: bool,
    },
    /// Show the loaded files and their new names
    List,
    /// Drop all loaded files
    Clear,
    /// Show or set the target extension
    Ext {
        /// New extension, without the leading dot
        ext: Option<String>,
    },
    /// Keep (on) or flatten (off) folders when writing archives
    PreserveFolders {
        #[arg(value_parser = files::parse_toggle)]
        state: Option<bool>,
    },
    /// Write the loaded files somewhere
    Export {
        #[command(subcommand)]
        target: ExportTarget,
    },
    /// Save everything: one file as itself, several as an archive
    Download {
        /// Directory to write into
        #[arg(short = 'o', long, default_value = ".")]
        dir: PathBuf,
    },
    /// Ask a question about the loaded files
    Ask {
        /// Attach an image to the question
        #[arg(short = 'i', long)]
        image: Option<PathBuf>,
        /// The question
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        question: Vec<String>,
    },
    /// Show the chat history
    History {
        /// Forget the chat history instead
        #[arg(long)]
        clear: bool,
    },
    /// Start the interactive shell (default)
    Shell,
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Option<Vec<String>>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

#[derive(Subcommand)]
pub enum ExportTarget {
    /// Zip archive of the renamed files
    Archive {
        /// Output file
        output: PathBuf,
    },
    /// All files concatenated into one text file
    Text {
        /// Output file
        output: PathBuf,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing();

    let mut config = Config::load()?;
    if let Some(dir) = args.state_dir.clone() {
        config.state_dir = Some(dir);
    }

    match args.command.unwrap_or(Commands::Shell) {
        Commands::Add { paths, ext, flat } => {
            let mut workspace = app::open_workspace(&config)?;
            let result =
                files::add_files(&mut workspace, &paths, ext.as_deref(), flat, &mut io::stdout())
                    .await;
            exit_on_error(result.map(|_| ()));
            Ok(())
        }
        Commands::List => {
            let workspace = app::open_workspace(&config)?;
            files::list_files(&workspace, &mut io::stdout())?;
            Ok(())
        }
        Commands::Clear => {
            let mut workspace = app::open_workspace(&config)?;
            files::clear_files(&mut workspace, &mut io::stdout())?;
            Ok(())
        }
        Commands::Ext { ext } => {
            let mut workspace = app::open_workspace(&config)?;
            match ext {
                Some(ext) => {
                    exit_on_error(files::set_extension(&mut workspace, &ext, &mut io::stdout()))
                }
                None => println!("Target extension: .{}", workspace.target_extension()),
            }
            Ok(())
        }
        Commands::PreserveFolders { state } => {
            let mut workspace = app::open_workspace(&config)?;
            match state {
                Some(preserve) => {
                    files::set_preserve_folders(&mut workspace, preserve, &mut io::stdout())?
                }
                None => println!(
                    "Preserve folders: {}",
                    if workspace.preserve_folders() { "on" } else { "off" }
                ),
            }
            Ok(())
        }
        Commands::Export { target } => {
            let workspace = app::open_workspace(&config)?;
            let result = match target {
                ExportTarget::Archive { output } => {
                    files::export_archive_to(&workspace, &output, &mut io::stdout())
                }
                ExportTarget::Text { output } => {
                    files::export_text_to(&workspace, &output, &mut io::stdout())
                }
            };
            exit_on_error(result);
            Ok(())
        }
        Commands::Download { dir } => {
            let workspace = app::open_workspace(&config)?;
            exit_on_error(files::download(
                &workspace,
                &dir,
                config.archive_name(),
                &mut io::stdout(),
            ));
            Ok(())
        }
        Commands::Ask { image, question } => run_ask(question, image, args.log, &config).await,
        Commands::History { clear } => {
            let mut workspace = app::open_workspace(&config)?;
            if clear {
                workspace.clear_history();
                println!("✅ Chat history cleared");
            } else {
                files::show_history(&workspace, &mut io::stdout())?;
            }
            Ok(())
        }
        Commands::Shell => run_shell(&config, args.log).await,
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            let (Some(key), Some(value)) = (key, value.filter(|v| !v.is_empty())) else {
                config.print_all();
                return Ok(());
            };
            let value = value.join(" ");
            if let Err(err) = config.set_value(&key, &value) {
                eprintln!("❌ {err}");
                std::process::exit(1);
            }
            config.save()?;
            println!("✅ Set {key} to: {value}");
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            if let Err(err) = config.unset_value(&key) {
                eprintln!("❌ {err}");
                std::process::exit(1);
            }
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
    }
}

fn exit_on_error(result: Result<(), Box<dyn Error>>) {
    if let Err(err) = result {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests;
