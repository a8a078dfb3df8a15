//! External executables: discovery and invocation
//!
//! - `ToolLocator` finds executables; `PathLocator` snapshots `PATH` once
//! - `Toolbox` holds the resolved paths and is handed to whoever spawns tools
//! - `ToolCommand` runs a process with captured output and an optional deadline

mod locator;
mod process;

pub use locator::{PathLocator, StaticLocator, ToolLocator, Toolbox};
pub use process::{ToolCommand, ToolOutput};
