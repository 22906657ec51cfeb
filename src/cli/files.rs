//! File-side commands shared by one-shot invocations and the shell.

use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::app::{ingest_paths, IngestOutcome};
use crate::core::config::data::path_display;
use crate::core::export::{download_all, export_archive, export_combined_text};
use crate::core::message::Role;
use crate::core::rename::TargetExtension;
use crate::core::store::StateStore;
use crate::core::workspace::Workspace;

pub async fn add_files<S: StateStore>(
    workspace: &mut Workspace<S>,
    paths: &[PathBuf],
    ext: Option<&str>,
    flat: bool,
    out: &mut dyn Write,
) -> Result<IngestOutcome, Box<dyn Error>> {
    let requested = ext.map(TargetExtension::parse).transpose()?;
    let target = requested
        .clone()
        .unwrap_or_else(|| workspace.target_extension().clone());
    let outcome = ingest_paths(workspace, paths, flat, &target).await?;
    if let Some(target) = requested {
        workspace.set_target_extension(target);
    }
    if outcome.applied {
        writeln!(
            out,
            "✅ Loaded {} file(s), {} bytes, renamed to .{}",
            outcome.files,
            outcome.bytes,
            workspace.target_extension()
        )?;
    } else {
        writeln!(out, "⚠️  A newer load replaced these results")?;
    }
    Ok(outcome)
}

pub fn list_files<S: StateStore>(workspace: &Workspace<S>, out: &mut dyn Write) -> std::io::Result<()> {
    let working_set = workspace.working_set();
    if working_set.is_empty() {
        writeln!(out, "No files loaded.")?;
        return Ok(());
    }
    writeln!(
        out,
        "{} file(s), {} bytes (target .{}, folders {}):",
        working_set.len(),
        working_set.total_bytes(),
        workspace.target_extension(),
        if workspace.preserve_folders() { "kept" } else { "flattened" }
    )?;
    for record in working_set {
        writeln!(
            out,
            "  {} → {} ({} bytes)",
            record.original_path(),
            record.new_path(),
            record.size()
        )?;
    }
    Ok(())
}

pub fn clear_files<S: StateStore>(workspace: &mut Workspace<S>, out: &mut dyn Write) -> std::io::Result<()> {
    let count = workspace.working_set().len();
    workspace.clear_working_set();
    writeln!(out, "✅ Cleared {count} file(s)")
}

pub fn set_extension<S: StateStore>(
    workspace: &mut Workspace<S>,
    raw: &str,
    out: &mut dyn Write,
) -> Result<(), Box<dyn Error>> {
    let target = TargetExtension::parse(raw)?;
    workspace.set_target_extension(target);
    writeln!(
        out,
        "✅ Target extension set to .{} (applies to the next load)",
        workspace.target_extension()
    )?;
    Ok(())
}

pub fn set_preserve_folders<S: StateStore>(
    workspace: &mut Workspace<S>,
    preserve: bool,
    out: &mut dyn Write,
) -> std::io::Result<()> {
    workspace.set_preserve_folders(preserve);
    writeln!(
        out,
        "✅ Folder structure will be {} in archives",
        if preserve { "kept" } else { "flattened" }
    )
}

pub fn export_archive_to<S: StateStore>(
    workspace: &Workspace<S>,
    path: &Path,
    out: &mut dyn Write,
) -> Result<(), Box<dyn Error>> {
    export_archive(workspace.working_set(), workspace.preserve_folders(), path)?;
    writeln!(out, "✅ Wrote archive {}", path_display(path))?;
    Ok(())
}

pub fn export_text_to<S: StateStore>(
    workspace: &Workspace<S>,
    path: &Path,
    out: &mut dyn Write,
) -> Result<(), Box<dyn Error>> {
    export_combined_text(workspace.working_set(), path)?;
    writeln!(out, "✅ Wrote combined text {}", path_display(path))?;
    Ok(())
}

pub fn download<S: StateStore>(
    workspace: &Workspace<S>,
    out_dir: &Path,
    archive_name: &str,
    out: &mut dyn Write,
) -> Result<(), Box<dyn Error>> {
    match download_all(
        workspace.working_set(),
        workspace.preserve_folders(),
        out_dir,
        archive_name,
    )? {
        Some(path) => writeln!(out, "✅ Saved {}", path_display(path))?,
        None => writeln!(out, "No files loaded.")?,
    }
    Ok(())
}

pub fn show_history<S: StateStore>(workspace: &Workspace<S>, out: &mut dyn Write) -> std::io::Result<()> {
    let messages = workspace.conversation().messages();
    if messages.is_empty() {
        writeln!(out, "No chat history.")?;
        return Ok(());
    }
    for message in messages {
        let prefix = match message.role() {
            Role::User => "You",
            Role::Model => "Model",
        };
        writeln!(out, "{prefix}: {}", message.text())?;
        if let Some(image) = message.image() {
            writeln!(out, "  (with {} image, {} bytes)", image.mime_type, image.data.len())?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Accepts the usual spellings of a yes/no switch.
pub fn parse_toggle(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("expected on or off, got '{other}'")),
    }
}
