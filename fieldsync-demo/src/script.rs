//! Event scripts replayed against the sign-up form.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DemoError;

/// One scripted UI event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Step {
    /// The user typed a new value.
    Change { field: String, value: String },
    /// The field lost focus.
    Blur { field: String },
    /// The host re-rendered the form.
    Render,
    /// The user pressed submit.
    Submit,
    /// The parent finished handling a submission.
    Complete,
    /// Reset a field, optionally to a new default.
    Reset {
        field: String,
        #[serde(default)]
        value: Option<String>,
    },
    /// The field left the page.
    Unmount { field: String },
    /// The field came (back) onto the page.
    Mount { field: String },
}

/// A list of steps, as stored in a script file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    /// Load a script from a JSON file.
    pub fn load(path: &Path) -> Result<Self, DemoError> {
        let text = fs::read_to_string(path).map_err(|source| DemoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse a script from JSON text.
    pub fn parse(text: &str) -> Result<Self, DemoError> {
        let script: Script = serde_json::from_str(text)?;
        log::debug!("Loaded script with {} steps", script.steps.len());
        Ok(script)
    }

    /// The session run when no script is given.
    pub fn builtin() -> Self {
        let change = |field: &str, value: &str| Step::Change {
            field: field.to_string(),
            value: value.to_string(),
        };
        let blur = |field: &str| Step::Blur {
            field: field.to_string(),
        };

        let mut steps = vec![Step::Render, blur("email")];
        for value in ["1", "12", "123", "1234", "12345"] {
            steps.push(change("zip", value));
        }
        steps.extend([
            blur("zip"),
            Step::Render,
            change("password", "correct horse"),
            change("confirm", "battery staple"),
            Step::Submit,
            Step::Complete,
            change("email", "ada@example.com"),
            change("confirm", "correct horse"),
            Step::Render,
            Step::Submit,
            Step::Complete,
            Step::Reset {
                field: "zip".to_string(),
                value: None,
            },
            Step::Unmount {
                field: "zip".to_string(),
            },
            Step::Mount {
                field: "zip".to_string(),
            },
            Step::Render,
        ]);

        Self { steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_steps() {
        let script = Script::parse(
            r#"{"steps": [
                {"event": "change", "field": "zip", "value": "123"},
                {"event": "reset", "field": "zip"},
                {"event": "submit"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(
            script.steps,
            vec![
                Step::Change {
                    field: "zip".into(),
                    value: "123".into()
                },
                Step::Reset {
                    field: "zip".into(),
                    value: None
                },
                Step::Submit,
            ]
        );
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        assert!(matches!(
            Script::parse(r#"{"steps": [{"event": "hover"}]}"#),
            Err(DemoError::Script(_))
        ));
    }

    #[test]
    fn test_builtin_script_is_not_empty() {
        assert!(Script::builtin().steps.len() > 10);
    }
}
