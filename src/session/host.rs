use serde::{Deserialize, Serialize};

/// Message posted by the embedding host, e.g. `{"type": "EXPORT_PDF"}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostMessage {
    /// Print the current view to a one-page PDF.
    ExportPdf,
    ToggleFullscreen,
    /// Any other kind. Ignored.
    #[serde(other)]
    Unknown,
}

impl HostMessage {
    /// Parse a raw message. Anything malformed is [`HostMessage::Unknown`].
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str(raw) {
            Ok(msg) => msg,
            Err(err) => {
                tracing::debug!(error = %err, "unparseable host message");
                Self::Unknown
            }
        }
    }
}

/// What handling a host message did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEffect {
    PrintToPdf(Vec<u8>),
    FullscreenChanged(bool),
    Ignored,
}
