//! Events passed through callbacks.

use uuid::Uuid;

/// What caused a field's value to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeSource {
    /// A raw input event from the user.
    Input,
    /// An imperative `set_value` / `set_field_value` call.
    Programmatic,
    /// Mount-time validation of the initial value.
    Mount,
    /// An explicit reset.
    Reset,
}

impl ChangeSource {
    /// Returns `true` if the change counts as an edit for touch tracking.
    pub fn is_edit(&self) -> bool {
        matches!(self, Self::Input | Self::Programmatic)
    }
}

/// A form submission attempt.
///
/// The form calls [`prevent_default`](Self::prevent_default) once it has
/// handled the submission, so the host never performs its own default
/// submit behavior (navigation, reload).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitEvent {
    id: Uuid,
    default_prevented: bool,
}

impl SubmitEvent {
    /// A new submission event with a fresh id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            default_prevented: false,
        }
    }

    /// Unique id of this submission attempt.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Suppress the host's default submit behavior.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether the default behavior was suppressed.
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

impl Default for SubmitEvent {
    fn default() -> Self {
        Self::new()
    }
}
