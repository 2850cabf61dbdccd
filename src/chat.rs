use serde::Serialize;

pub const WELCOME_MESSAGE: &str =
    "Welcome! I'm your farm advisor. How can I help you optimize your farm today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

/// Append-only advisor conversation shown next to the field.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage {
                role: Role::Assistant,
                text: WELCOME_MESSAGE.to_string(),
            }],
        }
    }

    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            role,
            text: text.into(),
        });
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

impl Default for ChatTranscript {
    fn default() -> Self {
        Self::new()
    }
}
