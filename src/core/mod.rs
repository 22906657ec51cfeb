pub mod app;
pub mod chat_stream;
pub mod config;
pub mod decoder;
pub mod entry;
pub mod export;
pub mod fs_entry;
pub mod ingest;
pub mod message;
pub mod prompt;
pub mod reassembler;
pub mod record;
pub mod rename;
pub mod shortcut;
pub mod store;
pub mod walker;
pub mod workspace;
