//! Speech-to-text adapters.

mod command;

pub use command::CommandTranscriber;
