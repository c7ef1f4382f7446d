//! Report engine for stored FIX records
//!
//! - `snapshot`: deterministic aggregates over one scan of the store
//! - `render`: the plain-text artifact layout
//! - `generator`: scan, compute, render and atomically replace the artifact

pub mod snapshot;
pub mod render;
pub mod generator;

pub use generator::{ReportError, ReportGenerator};
pub use render::render;
pub use snapshot::{MessageTypeCount, ReportSnapshot, SideBreakdown, SymbolVolume};
