use chrono::Local;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::core::message::{ChatMessage, Role};

pub const LOG_FILTER_ENV: &str = "EXTSHIFT_LOG";

/// Installs the stderr tracing subscriber. `EXTSHIFT_LOG` takes the usual
/// `EnvFilter` syntax and defaults to `warn`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Appends chat messages to a plain-text transcript file.
pub struct TranscriptLog {
    file_path: Option<PathBuf>,
}

impl TranscriptLog {
    pub fn new(log_file: Option<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(path) = &log_file {
            Self::test_file_access(path)?;
        }
        Ok(Self {
            file_path: log_file,
        })
    }

    pub fn is_active(&self) -> bool {
        self.file_path.is_some()
    }

    pub fn log_message(&self, message: &ChatMessage) -> Result<(), Box<dyn std::error::Error>> {
        let Some(file_path) = &self.file_path else {
            return Ok(());
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        let mut writer = BufWriter::new(file);

        let speaker = match message.role() {
            Role::User => "You",
            Role::Model => "Model",
        };
        writeln!(
            writer,
            "[{}] {}:",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            speaker
        )?;
        if let Some(image) = message.image() {
            writeln!(writer, "(image attached: {}, {} bytes)", image.mime_type, image.data.len())?;
        }
        for line in message.text().lines() {
            writeln!(writer, "{line}")?;
        }

        // Blank line between messages
        writeln!(writer)?;

        writer.flush()?;
        Ok(())
    }

    pub fn get_status_string(&self) -> String {
        match &self.file_path {
            None => "disabled".to_string(),
            Some(path) => format!(
                "active ({})",
                Path::new(path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
            ),
        }
    }

    fn test_file_access(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.flush()?;
        Ok(())
    }
}
