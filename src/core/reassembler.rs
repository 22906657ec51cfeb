use tracing::debug;

use super::chat_stream::StreamMessage;
use super::message::{ChatMessage, Conversation};

/// Folds one stream's events into a conversation.
///
/// The first non-empty chunk opens a model reply and every later chunk
/// extends it. `End` seals the reply. An error seals whatever arrived and
/// then adds exactly one model message describing the failure. Events for
/// other streams, or after the stream finished, are ignored.
#[derive(Debug)]
pub struct StreamReassembler {
    stream_id: u64,
    started: bool,
    finished: bool,
}

impl StreamReassembler {
    pub fn new(stream_id: u64) -> Self {
        Self {
            stream_id,
            started: false,
            finished: false,
        }
    }

    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Applies one event. Returns true when the conversation changed.
    pub fn apply(
        &mut self,
        conversation: &mut Conversation,
        message: StreamMessage,
        stream_id: u64,
    ) -> bool {
        if stream_id != self.stream_id || self.finished {
            debug!(stream_id, expected = self.stream_id, "Ignoring stale stream event");
            return false;
        }

        match message {
            StreamMessage::Chunk(text) => {
                if text.is_empty() {
                    return false;
                }
                if self.started {
                    conversation.append_reply(self.stream_id, &text)
                } else {
                    conversation.start_reply(self.stream_id, &text);
                    self.started = true;
                    true
                }
            }
            StreamMessage::Error(text) => {
                conversation.seal();
                conversation.push(ChatMessage::model(text));
                self.finished = true;
                true
            }
            StreamMessage::End => {
                self.finished = true;
                if self.started {
                    conversation.seal();
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;

    fn chunk(text: &str) -> StreamMessage {
        StreamMessage::Chunk(text.to_string())
    }

    #[test]
    fn chunks_build_a_single_message() {
        let mut conversation = Conversation::default();
        conversation.push(ChatMessage::user("greet me", None));
        let mut reassembler = StreamReassembler::new(1);

        for piece in ["Hel", "lo wo", "rld"] {
            assert!(reassembler.apply(&mut conversation, chunk(piece), 1));
            assert_eq!(conversation.len(), 2);
        }
        assert!(reassembler.apply(&mut conversation, StreamMessage::End, 1));

        assert!(reassembler.is_finished());
        assert_eq!(conversation.messages().len(), 2);
        let reply = &conversation.messages()[1];
        assert_eq!(reply.role(), Role::Model);
        assert_eq!(reply.text(), "Hello world");
    }

    #[test]
    fn error_before_any_chunk_adds_one_error_message() {
        let mut conversation = Conversation::default();
        let mut reassembler = StreamReassembler::new(2);

        reassembler.apply(
            &mut conversation,
            StreamMessage::Error("API error (HTTP 500 Internal Server Error): X".into()),
            2,
        );
        assert!(!reassembler.apply(&mut conversation, StreamMessage::End, 2));

        assert_eq!(conversation.messages().len(), 1);
        assert!(conversation.messages()[0].text().contains('X'));
        assert!(conversation.live().is_none());
    }

    #[test]
    fn error_mid_stream_seals_partial_reply() {
        let mut conversation = Conversation::default();
        let mut reassembler = StreamReassembler::new(3);

        reassembler.apply(&mut conversation, chunk("partial"), 3);
        reassembler.apply(&mut conversation, StreamMessage::Error("Stream error: reset".into()), 3);
        reassembler.apply(&mut conversation, chunk("late"), 3);

        let texts: Vec<_> = conversation.messages().iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["partial", "Stream error: reset"]);
        assert!(conversation.live().is_none());
    }

    #[test]
    fn other_stream_ids_are_ignored() {
        let mut conversation = Conversation::default();
        let mut reassembler = StreamReassembler::new(5);

        assert!(!reassembler.apply(&mut conversation, chunk("stale"), 4));
        assert!(conversation.is_empty());
    }

    #[test]
    fn empty_stream_adds_nothing() {
        let mut conversation = Conversation::default();
        let mut reassembler = StreamReassembler::new(6);
        reassembler.apply(&mut conversation, chunk(""), 6);
        reassembler.apply(&mut conversation, StreamMessage::End, 6);
        assert!(conversation.is_empty());
        assert!(reassembler.is_finished());
    }
}
