//! Step catalog and gating model.
//!
//! The catalog is a static table of steps grouped into phases. Gating decides,
//! from the release state alone, which steps are shown, which may run now and
//! where the operator's cursor starts.

mod catalog;
mod gating;
mod info;

pub use catalog::{Phase, StepId, StepKind};
pub use gating::{Gate, PhaseGroup, StepView, cursor, gate, phase_groups, step_view};
pub use info::step_info;
