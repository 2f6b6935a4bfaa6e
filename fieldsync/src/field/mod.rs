//! Field components: config, state machine, and the published handle.

mod api;
mod config;
mod state;

pub use api::{FieldApi, FieldHandle, FieldRegistry};
pub use config::FieldConfig;
pub use state::{Field, FieldPhase};
