//! Error types for the automation crate.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("automation lane breakpoints for {0:?} are not sorted by position")]
    UnsortedBreakpoints(vamp_core::ids::AutomationLaneId),
}

pub type Result<T> = std::result::Result<T, Error>;
