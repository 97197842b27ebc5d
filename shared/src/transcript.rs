use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    You,
    Patient,
    Attending,
    Sys,
}

impl Role {
    #[must_use]
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "you" => Some(Self::You),
            "patient" => Some(Self::Patient),
            "attending" => Some(Self::Attending),
            "sys" => Some(Self::Sys),
            _ => None,
        }
    }

    /// Class name the shell tags the message bubble with.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::You => "you",
            Self::Patient => "patient",
            Self::Attending => "attending",
            Self::Sys => "sys",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub role: Role,
}

impl ChatMessage {
    pub fn new(text: impl Into<String>, role: Role) -> Self {
        Self {
            text: text.into(),
            role,
        }
    }
}

/// Display-only log of the current encounter. Never persisted or replayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn push(&mut self, text: impl Into<String>, role: Role) {
        self.messages.push(ChatMessage::new(text, role));
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }
}

/// Scroll position of the transcript container, as reported by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollMetrics {
    pub scroll_height: f64,
    pub scroll_top: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Pixels between the bottom of the visible area and the end of the log.
    #[must_use]
    pub fn remaining(&self) -> f64 {
        self.scroll_height - self.scroll_top - self.client_height
    }

    #[must_use]
    pub fn is_near_bottom(&self, threshold: f64) -> bool {
        let remaining = self.remaining();
        // a shell that reports garbage should not pin the user in place
        !remaining.is_finite() || remaining <= threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AutoScrollPolicy {
    /// Scroll to the newest message on every append.
    Always,
    /// Only follow new messages when the reader is already at the bottom.
    #[default]
    WhenNearBottom,
}

impl AutoScrollPolicy {
    /// Whether appending a message with `role` should force the transcript
    /// to the bottom regardless of where the reader is. The student's own
    /// messages always do.
    #[must_use]
    pub const fn forces_bottom(self, role: Role) -> bool {
        match self {
            Self::Always => true,
            Self::WhenNearBottom => matches!(role, Role::You),
        }
    }
}
