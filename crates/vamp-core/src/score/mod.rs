//! ScoreModel: the immutable, serializable description of a project, plus
//! its validation and RT-safe publication.

mod clone_resolve;
mod curve;
mod entities;
mod snapshot;
mod validate;

pub use clone_resolve::{check_no_clone_cycles, resolve_clones};
pub use curve::CurveType;
pub use entities::*;
pub use snapshot::SnapshotHandle;
pub use validate::validate_project;
