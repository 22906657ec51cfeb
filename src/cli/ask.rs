//! One-shot "ask" command

use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::core::app::{self, ChatSettings};
use crate::core::config::data::Config;
use crate::utils::logging::TranscriptLog;

pub async fn run_ask(
    question: Vec<String>,
    image: Option<PathBuf>,
    log: Option<PathBuf>,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let question = question.join(" ");
    if question.trim().is_empty() {
        eprintln!("Usage: extshift ask <question>");
        std::process::exit(1);
    }

    let image = image.as_deref().map(load_image_or_exit);

    let mut workspace = app::open_workspace(config)?;
    let transcript = TranscriptLog::new(log)?;
    let settings = ChatSettings::from_config(config);

    let cancel_token = CancellationToken::new();
    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let mut stdout = io::stdout();
    let exchange = app::ask(
        &mut workspace,
        &settings,
        question,
        image,
        &transcript,
        cancel_token,
        |chunk| {
            let _ = write!(stdout, "{chunk}");
            let _ = stdout.flush();
        },
    )
    .await;

    if let Some(err) = exchange.error {
        eprintln!("\n\n❌ Error: {err}");
        std::process::exit(1);
    }
    println!();
    Ok(())
}

fn load_image_or_exit(path: &Path) -> crate::core::message::InlineImage {
    match app::load_image(path) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("❌ Could not attach image: {err}");
            std::process::exit(1);
        }
    }
}
