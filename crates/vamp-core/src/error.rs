//! Error types for the core engine crate.

use crate::ids::{ContainerId, TrackId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("track {0:?} not found")]
    TrackNotFound(TrackId),

    #[error("container {0:?} not found")]
    ContainerNotFound(ContainerId),

    #[error("container {0:?} overlaps an existing container on the same track without a crossfade")]
    OverlappingContainer(ContainerId),

    #[error("invalid edit rejected: {0}")]
    InvalidEdit(String),

    #[error("invalid time signature {numerator}/{denominator}")]
    InvalidSignature { numerator: u8, denominator: u8 },

    #[error("tempo {0} bpm is out of range")]
    InvalidTempo(f64),

    #[error("command queue is full, command dropped")]
    QueueFull,

    #[error("audio driver error: {0}")]
    AudioDriver(String),

    #[error("plugin host error: {0}")]
    PluginHost(String),

    #[error("snapshot install raced with a concurrent writer")]
    SnapshotContention,
}

pub type Result<T> = std::result::Result<T, Error>;
