//! Classroom seating maps: student photos arranged into rows, a U-shape, a
//! circle or small groups, moved by hand, saved as snapshots and exported.

pub mod error;
pub mod export;
pub mod history;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod photos;
pub mod session;
pub mod snapshot;

pub use error::{ExportError, PhotoError, SnapshotError};
pub use layout::{Arrangement, ArrangementStyle, LayoutParams};
pub use model::{Canvas, Group, GroupId, Point, Rect, Rgba, Size, Student, StudentId};
pub use session::{OrganizeOutcome, Session};
