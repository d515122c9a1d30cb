//! Transcriber that runs an external command.
//!
//! The command line is split on whitespace. A `{path}` argument is replaced by
//! the audio path; without one, the path is appended. Stdout is the
//! transcript.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

use crate::ports::{Transcriber, TranscriptionError};

const PATH_PLACEHOLDER: &str = "{path}";

#[derive(Debug, Clone)]
pub struct CommandTranscriber {
    program: String,
    args: Vec<String>,
}

impl CommandTranscriber {
    /// Returns `None` for a blank command line.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    fn args_for(&self, audio: &Path) -> Vec<String> {
        let path = audio.to_string_lossy();
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace(PATH_PLACEHOLDER, &path))
            .collect();
        if !self.args.iter().any(|a| a.contains(PATH_PLACEHOLDER)) {
            args.push(path.into_owned());
        }
        args
    }
}

#[async_trait]
impl Transcriber for CommandTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String, TranscriptionError> {
        if !audio.exists() {
            return Err(TranscriptionError::MissingFile(audio.display().to_string()));
        }

        let args = self.args_for(audio);
        debug!(program = %self.program, ?args, "Running transcriber");
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .map_err(|e| TranscriptionError::Failed(format!("{}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscriptionError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn blank_command_is_none() {
        assert!(CommandTranscriber::parse("   ").is_none());
    }

    #[test]
    fn placeholder_is_substituted() {
        let t = CommandTranscriber::parse("whisper --file={path} --lang ru").unwrap();
        assert_eq!(
            t.args_for(Path::new("/tmp/a.ogg")),
            vec!["--file=/tmp/a.ogg", "--lang", "ru"]
        );
    }

    #[test]
    fn path_is_appended_without_placeholder() {
        let t = CommandTranscriber::parse("cat").unwrap();
        assert_eq!(t.args_for(Path::new("/tmp/a.ogg")), vec!["/tmp/a.ogg"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stdout_is_the_transcript() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  buy milk tomorrow  ").unwrap();

        let text = CommandTranscriber::parse("cat")
            .unwrap()
            .transcribe(file.path())
            .await
            .unwrap();
        assert_eq!(text, "buy milk tomorrow");
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = CommandTranscriber::parse("cat")
            .unwrap()
            .transcribe(Path::new("/definitely/not/here.ogg"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptionError::MissingFile(_)));
    }
}
