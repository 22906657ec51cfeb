//! Session state with write-through persistence.
//!
//! Every mutation serializes the affected piece of state to the
//! [`StateStore`]. Empty collections remove their key instead of storing an
//! empty value. Storage problems are logged and never surfaced; a value that
//! fails to load is treated as absent.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::ingest::{IngestGate, IngestTicket};
use super::message::{ChatMessage, Conversation};
use super::reassembler::StreamReassembler;
use super::chat_stream::StreamMessage;
use super::record::{FileRecord, WorkingSet};
use super::rename::TargetExtension;
use super::store::StateStore;

pub const WORKING_SET_KEY: &str = "working-set";
pub const CHAT_HISTORY_KEY: &str = "chat-history";
pub const TARGET_EXTENSION_KEY: &str = "target-extension";
pub const PRESERVE_FOLDERS_KEY: &str = "preserve-folders";

pub struct Workspace<S: StateStore> {
    store: S,
    working_set: WorkingSet,
    conversation: Conversation,
    target_extension: TargetExtension,
    preserve_folders: bool,
    ingest_gate: IngestGate,
    next_stream_id: u64,
}

fn load_value<T: DeserializeOwned>(store: &dyn StateStore, key: &str) -> Option<T> {
    let raw = match store.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(key, error = %err, "Failed to read persisted state");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "Discarding unreadable persisted state");
            None
        }
    }
}

impl<S: StateStore> Workspace<S> {
    /// Rehydrates everything `store` holds, defaulting whatever is missing or
    /// unreadable.
    pub fn load(store: S) -> Self {
        let working_set = load_value::<WorkingSet>(&store, WORKING_SET_KEY).unwrap_or_default();
        let messages =
            load_value::<Vec<ChatMessage>>(&store, CHAT_HISTORY_KEY).unwrap_or_default();
        let target_extension =
            load_value::<TargetExtension>(&store, TARGET_EXTENSION_KEY).unwrap_or_default();
        let preserve_folders = load_value::<bool>(&store, PRESERVE_FOLDERS_KEY).unwrap_or(true);

        debug!(
            files = working_set.len(),
            messages = messages.len(),
            target = %target_extension,
            preserve_folders,
            "Workspace loaded"
        );

        Self {
            store,
            working_set,
            conversation: Conversation::from_messages(messages),
            target_extension,
            preserve_folders,
            ingest_gate: IngestGate::new(),
            next_stream_id: 0,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn target_extension(&self) -> &TargetExtension {
        &self.target_extension
    }

    pub fn preserve_folders(&self) -> bool {
        self.preserve_folders
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T, empty: bool) {
        let result = if empty {
            self.store.clear(key)
        } else {
            match serde_json::to_string(value) {
                Ok(json) => self.store.save(key, &json),
                Err(err) => {
                    warn!(key, error = %err, "Failed to serialize state");
                    return;
                }
            }
        };
        if let Err(err) = result {
            warn!(key, error = %err, "Failed to persist state");
        }
    }

    fn persist_working_set(&self) {
        self.write(WORKING_SET_KEY, &self.working_set, self.working_set.is_empty());
    }

    fn persist_conversation(&self) {
        let snapshot = self.conversation.snapshot();
        self.write(CHAT_HISTORY_KEY, &snapshot, snapshot.is_empty());
    }

    /// Marks the start of an ingestion; older tickets become stale.
    pub fn begin_ingestion(&self) -> IngestTicket {
        self.ingest_gate.begin()
    }

    /// Replaces the working set if `ticket` still belongs to the newest
    /// ingestion. Returns false when the results were stale and dropped.
    pub fn complete_ingestion(&mut self, ticket: IngestTicket, records: Vec<FileRecord>) -> bool {
        if !self.ingest_gate.is_current(ticket) {
            debug!(count = records.len(), "Dropping results of a superseded ingestion");
            return false;
        }
        self.working_set = WorkingSet::new(records);
        self.persist_working_set();
        true
    }

    pub fn clear_working_set(&mut self) {
        self.working_set = WorkingSet::default();
        self.persist_working_set();
    }

    pub fn set_target_extension(&mut self, target: TargetExtension) {
        self.target_extension = target;
        self.write(TARGET_EXTENSION_KEY, &self.target_extension, false);
    }

    pub fn set_preserve_folders(&mut self, preserve: bool) {
        self.preserve_folders = preserve;
        self.write(PRESERVE_FOLDERS_KEY, &self.preserve_folders, false);
    }

    pub fn push_message(&mut self, message: ChatMessage) {
        self.conversation.push(message);
        self.persist_conversation();
    }

    /// Allocates an id and a reassembler for the next model reply.
    pub fn start_stream(&mut self) -> StreamReassembler {
        self.next_stream_id += 1;
        StreamReassembler::new(self.next_stream_id)
    }

    /// Feeds one stream event into the conversation.
    pub fn apply_stream(
        &mut self,
        reassembler: &mut StreamReassembler,
        message: StreamMessage,
        stream_id: u64,
    ) {
        if reassembler.apply(&mut self.conversation, message, stream_id) {
            self.persist_conversation();
        }
    }

    pub fn clear_history(&mut self) {
        self.conversation.clear();
        self.persist_conversation();
    }
}
