//! Outbound messaging seam.

use async_trait::async_trait;

use super::queue::ParticipantId;
use crate::error::Result;

/// Something that can deliver a plain-text message to a user.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fire-and-forget send. Errors are reported but never fatal.
    async fn send_message(&self, recipient: ParticipantId, text: &str) -> Result<()>;
}

/// In-memory transport that records every send. Recipients listed in
/// `failing` get an error instead.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: std::sync::Mutex<Vec<(ParticipantId, String)>>,
    pub failing: std::collections::HashSet<ParticipantId>,
}

#[cfg(test)]
impl RecordingTransport {
    pub fn failing_for(ids: &[i64]) -> Self {
        Self {
            sent: Default::default(),
            failing: ids.iter().copied().map(ParticipantId).collect(),
        }
    }

    pub fn messages_to(&self, id: i64) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to.0 == id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[cfg(test)]
#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(&self, recipient: ParticipantId, text: &str) -> Result<()> {
        if self.failing.contains(&recipient) {
            return Err(crate::error::Error::Transport(format!(
                "recipient {} unreachable",
                recipient
            )));
        }
        self.sent.lock().unwrap().push((recipient, text.to_string()));
        Ok(())
    }
}
