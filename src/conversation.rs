use serde::{Deserialize, Serialize};

pub const ERROR_PREFIX: &str = "⚠️ Error: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only message history for a single window session.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Conversation {
            messages: vec![ChatMessage::assistant(greeting)],
        }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    #[allow(dead_code)]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages.clone()
    }
}

/// Reply split into a reasoning prefix and a final line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatResult {
    pub thoughts: String,
    pub answer: String,
}

impl ChatResult {
    /// Every line except the last becomes `thoughts`; the last line is the `answer`.
    pub fn from_content(content: &str) -> Self {
        let trimmed = content.trim();
        let mut lines: Vec<&str> = trimmed.split('\n').collect();
        let answer = lines.pop().unwrap_or(trimmed).trim().to_string();
        let thoughts = lines.join("\n").trim().to_string();

        ChatResult { thoughts, answer }
    }

    pub fn failure(error: &anyhow::Error) -> Self {
        ChatResult {
            thoughts: String::new(),
            answer: format!("{}{:#}", ERROR_PREFIX, error),
        }
    }

    /// Content stored in history. The separator is kept even without thoughts.
    pub fn history_content(&self) -> String {
        format!("{}\n{}", self.thoughts, self.answer)
    }
}
