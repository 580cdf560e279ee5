//! Application systems
//!
//! The frame loop plus the seams the host plugs into it.

mod clock;
mod render;
mod simulation;

pub use clock::FrameClock;
pub use render::{HeadlessRenderer, Renderer};
pub use simulation::{CommandSender, FrameReport, LoopState, SimulationCommand, SimulationLoop, StepSettings};
