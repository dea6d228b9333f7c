//! Error types for the MIDI fabric crate.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("midi output port {0:?} not found")]
    PortNotFound(String),

    #[error("midi device {0:?} disappeared")]
    DeviceDisappeared(String),

    #[error("midi driver error: {0}")]
    Driver(String),

    #[error("malformed midi word: {0:#010x}")]
    MalformedWord(u32),
}

pub type Result<T> = std::result::Result<T, Error>;
