use chrono::Utc;
use serde::{ Deserialize, Serialize };
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// One entry of the console transcript.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub muted: bool,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            created_at: Utc::now().timestamp_millis(),
            pending: false,
            muted: false,
        }
    }

    pub fn placeholder() -> Self {
        Self {
            pending: true,
            ..Self::new(Role::Assistant, "")
        }
    }

    pub fn to_payload(&self) -> PayloadMessage {
        PayloadMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Wire shape of a message sent to the relay and forwarded upstream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadMessage {
    pub role: Role,
    pub content: String,
}

impl PayloadMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelayRequest {
    pub messages: Vec<PayloadMessage>,
}
