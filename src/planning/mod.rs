//! Incremental plan generation
//!
//! A planner loop asks a generation oracle for one task at a time, and the
//! reveal encoder turns every finished task into progressively filled frames.

pub mod oracle;
pub mod planner;
pub mod reveal;
pub mod types;

pub use oracle::{GenerationOracle, LlmOracle, OracleError, Proposal};
pub use planner::{PlanEvent, PlannerLoop};
pub use reveal::{RevealEncoder, RevealFrames};
pub use types::{LoopStatus, PlanState, TaskCandidate, TaskRecord};
