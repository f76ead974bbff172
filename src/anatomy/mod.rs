pub mod cortex;
pub mod markers;
pub mod mesh;

pub use cortex::{CortexError, CortexParams, synthesize};
pub use markers::{AbnormalityMarker, MARKERS, MarkerKind, overlays_for};
pub use mesh::TriangleMesh;
