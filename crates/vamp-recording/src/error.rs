//! Error types for the recording crate.

use vamp_core::ids::ContainerId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no active recording session for container {0:?}")]
    NoActiveSession(ContainerId),

    #[error("failed to create capture sink at {path}: {source}")]
    CreateSink {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("wav writer error: {0}")]
    Wav(#[from] hound::Error),

    #[error("writer thread is no longer running")]
    WriterGone,
}

pub type Result<T> = std::result::Result<T, Error>;
