use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageState {
    Success,
    Error,
}

impl MessageState {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageState::Success => "success",
            MessageState::Error => "error",
        }
    }
}

/// Control response envelope, independent of the wire format.
///
/// `code` mirrors the HTTP status of the response that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub state: MessageState,
    pub message: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Message {
    pub fn success(message: impl Into<String>, code: u16) -> Self {
        Self {
            state: MessageState::Success,
            message: message.into(),
            code,
            url: None,
        }
    }

    pub fn error(message: impl Into<String>, code: u16) -> Self {
        Self {
            state: MessageState::Error,
            message: message.into(),
            code,
            url: None,
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_serializes_without_missing_url() {
        let msg = Message::error("No such table: t", 404);
        let raw = serde_json::to_string(&msg).expect("serialize message");
        assert_eq!(
            raw,
            r#"{"state":"error","message":"No such table: t","code":404}"#
        );
    }

    #[test]
    fn message_serializes_url_when_present() {
        let msg = Message::success("Successfully created: t", 201)
            .with_url(Some("/db/main/t".to_string()));
        let raw = serde_json::to_string(&msg).expect("serialize message");
        assert_eq!(
            raw,
            r#"{"state":"success","message":"Successfully created: t","code":201,"url":"/db/main/t"}"#
        );
    }
}
