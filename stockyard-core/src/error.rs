/// Failure talking to the Request Store or the Distance Service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// The store answered with a non-success status. `message` is the
    /// `error` field of its JSON body, if it sent one.
    #[error("Store rejected the call with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },

    #[error("Store unreachable: {0}")]
    Transport(String),

    #[error("Malformed store response: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        StoreError::Rejected { status, message: Some(message.into()) }
    }

    /// Message fit for showing to the user: the store's own wording when it
    /// gave one, the fallback otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            StoreError::Rejected { message: Some(message), .. } if !message.is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_message_is_used_verbatim() {
        let err = StoreError::rejected(409, "Offer already decided");
        assert_eq!(err.user_message("Failed to update offer"), "Offer already decided");
    }

    #[test]
    fn falls_back_without_payload() {
        let missing = StoreError::Rejected { status: 500, message: None };
        let empty = StoreError::rejected(400, "");
        let transport = StoreError::Transport("connection refused".into());

        for err in [missing, empty, transport] {
            assert_eq!(err.user_message("Failed to update offer"), "Failed to update offer");
        }
    }
}
