//! Glue between the CLI and the core flows.

use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::chat_stream::{ChatStreamService, StreamMessage, StreamParams};
use crate::core::config::Config;
use crate::core::entry::{DropEntry, DropItems};
use crate::core::fs_entry::FsEntry;
use crate::core::ingest::{ingest, IngestError};
use crate::core::message::{ChatMessage, InlineImage};
use crate::core::prompt::assemble_parts;
use crate::core::rename::TargetExtension;
use crate::core::store::{FileStateStore, StateStore};
use crate::core::workspace::Workspace;
use crate::utils::logging::TranscriptLog;

/// Where and how chat requests are sent.
#[derive(Clone)]
pub struct ChatSettings {
    pub client: reqwest::Client,
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl ChatSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint(),
            api_key: config.api_key(),
        }
    }
}

pub fn open_workspace(config: &Config) -> Result<Workspace<FileStateStore>, Box<dyn std::error::Error>> {
    let state_dir = config.resolve_state_dir()?;
    debug!(state_dir = %state_dir.display(), "Opening workspace");
    Ok(Workspace::load(FileStateStore::new(state_dir)))
}

/// Turns command-line paths into drop items. With `flat`, only files are
/// accepted and each keeps just its name.
pub async fn open_drop(paths: &[PathBuf], flat: bool) -> Result<DropItems, IngestError> {
    let mut entries: Vec<Box<dyn DropEntry>> = Vec::with_capacity(paths.len());
    for path in paths {
        let entry = FsEntry::open(path)
            .await
            .map_err(|source| IngestError::Enumerate {
                path: path.display().to_string(),
                source,
            })?;
        entries.push(Box::new(entry));
    }
    Ok(if flat {
        DropItems::Flat(entries)
    } else {
        DropItems::Hierarchical(entries)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub files: usize,
    pub bytes: usize,
    /// False when a newer ingestion finished first and these results were
    /// dropped.
    pub applied: bool,
}

/// Ingests `items`, renaming to `target`, and replaces the working set with
/// the result. The workspace's stored target extension is left alone.
pub async fn ingest_items<S: StateStore>(
    workspace: &mut Workspace<S>,
    items: DropItems,
    target: &TargetExtension,
) -> Result<IngestOutcome, IngestError> {
    let ticket = workspace.begin_ingestion();
    let records = ingest(items, target).await?;
    let files = records.len();
    let bytes: usize = records.iter().map(|r| r.size()).sum();
    let applied = workspace.complete_ingestion(ticket, records);
    Ok(IngestOutcome {
        files,
        bytes,
        applied,
    })
}

pub async fn ingest_paths<S: StateStore>(
    workspace: &mut Workspace<S>,
    paths: &[PathBuf],
    flat: bool,
    target: &TargetExtension,
) -> Result<IngestOutcome, IngestError> {
    let items = open_drop(paths, flat).await?;
    ingest_items(workspace, items, target).await
}

/// Loads an image from disk for attaching to a question.
pub fn load_image(path: &Path) -> Result<InlineImage, Box<dyn std::error::Error>> {
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    let mime_type = InlineImage::mime_type_for(&name)
        .ok_or_else(|| format!("Unsupported image type: {}", path.display()))?;
    let data = std::fs::read(path)?;
    Ok(InlineImage {
        mime_type: mime_type.to_string(),
        data,
    })
}

/// The result of one question/answer exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Model messages appended to the conversation.
    pub added: Vec<ChatMessage>,
    /// Set when the stream ended in an error.
    pub error: Option<String>,
}

/// Sends `question` with the working set as context and folds the streamed
/// reply into the conversation. `on_chunk` sees each decoded piece of text
/// as it arrives.
pub async fn ask<S, F>(
    workspace: &mut Workspace<S>,
    settings: &ChatSettings,
    question: String,
    image: Option<InlineImage>,
    transcript: &TranscriptLog,
    cancel_token: CancellationToken,
    mut on_chunk: F,
) -> Exchange
where
    S: StateStore,
    F: FnMut(&str),
{
    let contents = assemble_parts(workspace.working_set(), &question, image.as_ref());
    let user_message = ChatMessage::user(question, image);
    if let Err(err) = transcript.log_message(&user_message) {
        warn!(error = %err, "Failed to write transcript");
    }
    workspace.push_message(user_message);
    let before = workspace.conversation().messages().len();

    let mut reassembler = workspace.start_stream();
    let (service, mut rx) = ChatStreamService::new();
    service.spawn_stream(StreamParams {
        client: settings.client.clone(),
        endpoint: settings.endpoint.clone(),
        api_key: settings.api_key.clone(),
        contents,
        cancel_token,
        stream_id: reassembler.stream_id(),
    });
    drop(service);

    let mut error = None;
    while let Some((message, stream_id)) = rx.recv().await {
        if stream_id == reassembler.stream_id() {
            match &message {
                StreamMessage::Chunk(text) => on_chunk(text),
                StreamMessage::Error(text) => error = Some(text.clone()),
                StreamMessage::End => {}
            }
        }
        workspace.apply_stream(&mut reassembler, message, stream_id);
        if reassembler.is_finished() {
            break;
        }
    }
    if !reassembler.is_finished() {
        let stream_id = reassembler.stream_id();
        workspace.apply_stream(&mut reassembler, StreamMessage::End, stream_id);
    }

    let added = workspace.conversation().messages()[before..].to_vec();
    for message in &added {
        if let Err(err) = transcript.log_message(message) {
            warn!(error = %err, "Failed to write transcript");
        }
    }
    Exchange { added, error }
}
