//! Speech-to-text configuration

use serde::Deserialize;

/// External transcription command
///
/// `{path}` in the command line is replaced by the audio file path; without
/// it the path is appended as the last argument.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriberConfig {
    pub command: Option<String>,
}

impl TranscriberConfig {
    pub fn command_line(&self) -> Option<&str> {
        self.command.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}
