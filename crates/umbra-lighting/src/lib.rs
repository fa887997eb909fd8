//! Voxel light propagation: per-channel flood-fill solvers over the chunk
//! store's light buffers and a four-channel orchestrator on top of them.

mod lighting;
pub mod queue;
mod solver;

pub use lighting::Lighting;
pub use queue::{LightEntry, LightQueue};
pub use solver::LightSolver;
