use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// An image attached to a question, sent inline with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineImage {
    pub mime_type: String,
    #[serde(with = "crate::utils::base64_bytes")]
    pub data: Vec<u8>,
}

impl InlineImage {
    /// Guesses the media type from a file name's extension.
    pub fn mime_type_for(file_name: &str) -> Option<&'static str> {
        let ext = crate::core::rename::extension_of(file_name).to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some("image/png"),
            "jpg" | "jpeg" => Some("image/jpeg"),
            "gif" => Some("image/gif"),
            "webp" => Some("image/webp"),
            "heic" => Some("image/heic"),
            "heif" => Some("image/heif"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    role: Role,
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<InlineImage>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>, image: Option<InlineImage>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            image,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
            image: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image(&self) -> Option<&InlineImage> {
        self.image.as_ref()
    }
}

/// The chat history plus, at most, one model message still being streamed.
///
/// The streamed message lives in a [`StreamSession`] until it is sealed, so
/// every message in [`Conversation::messages`] is final.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    live: Option<StreamSession>,
}

/// The text buffer of a model reply that is still arriving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSession {
    stream_id: u64,
    text: String,
}

impl StreamSession {
    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Conversation {
    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            live: None,
        }
    }

    /// Sealed messages, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn live(&self) -> Option<&StreamSession> {
        self.live.as_ref()
    }

    /// Total message count, counting a live reply as one message.
    pub fn len(&self) -> usize {
        self.messages.len() + usize::from(self.live.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The newest message text, including a reply that is still streaming.
    pub fn last_text(&self) -> Option<&str> {
        match &self.live {
            Some(session) => Some(session.text()),
            None => self.messages.last().map(ChatMessage::text),
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.seal();
        self.messages.push(message);
    }

    /// Opens a model reply for `stream_id` with its first chunk of text.
    pub(crate) fn start_reply(&mut self, stream_id: u64, first_chunk: &str) {
        self.seal();
        self.live = Some(StreamSession {
            stream_id,
            text: first_chunk.to_string(),
        });
    }

    /// Appends to the live reply. Returns false when no reply for
    /// `stream_id` is open.
    pub(crate) fn append_reply(&mut self, stream_id: u64, chunk: &str) -> bool {
        match self.live.as_mut() {
            Some(session) if session.stream_id == stream_id => {
                session.text.push_str(chunk);
                true
            }
            _ => false,
        }
    }

    /// Moves the live reply, if any, into the sealed history.
    pub fn seal(&mut self) {
        if let Some(session) = self.live.take() {
            self.messages.push(ChatMessage::model(session.text));
        }
    }

    /// Every message as it should be persisted, with a live reply included
    /// as it currently reads.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        let mut all = self.messages.clone();
        if let Some(session) = &self.live {
            all.push(ChatMessage::model(session.text.clone()));
        }
        all
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.live = None;
    }
}
