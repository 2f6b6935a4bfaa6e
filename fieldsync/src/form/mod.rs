//! Form components: config, orchestrator, and the parent-facing handle.

mod config;
mod handle;
mod state;

pub use config::{FormConfig, SubmitMode};
pub use handle::{FormHandle, FormRegistry};
pub use state::Form;
