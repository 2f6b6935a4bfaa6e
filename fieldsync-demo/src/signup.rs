//! The sign-up form driven by the demo.

use std::sync::{Arc, Mutex};

use fieldsync::prelude::*;

use crate::error::DemoError;
use crate::script::Step;

const FIELDS: [&str; 4] = ["email", "zip", "password", "confirm"];

/// Summary of a finished session.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Outcome {
    /// Number of submission attempts.
    pub submissions: usize,
    /// Number of submissions that passed validation.
    pub accepted: usize,
    /// The record at the end of the session.
    pub data: FormData,
}

/// A sign-up form with its fields and a parent-side form registry.
pub struct Signup {
    form: Form,
    registry: FormRegistry,
    fields: Vec<Field<String>>,
    outcome: Arc<Mutex<Outcome>>,
}

fn field_rules(name: &str) -> Result<Validator<FieldValue>, regex::Error> {
    let list = match name {
        "email" => vec![
            rules::required("Email is required"),
            rules::email("Please enter a valid email"),
        ],
        "zip" => vec![
            rules::required("Zip is required"),
            rules::digits(5, "Zip must be 5 digits"),
        ],
        "password" => vec![
            rules::required("Password is required"),
            rules::min_length(8, "Password must be at least 8 characters"),
            rules::pattern(r"\d|\s", "Password needs a digit or a space")?,
        ],
        _ => vec![rules::required("Please confirm your password")],
    };
    Ok(from_rules(list, Meta::new().with_label(name)))
}

fn passwords_match() -> Validator<FormData> {
    Validator::new(|data: &FormData| {
        let password = data.get("password").and_then(FieldValue::as_str).unwrap_or("");
        let confirm = data.get("confirm").and_then(FieldValue::as_str).unwrap_or("");
        if confirm.is_empty() || password == confirm {
            Vec::new()
        } else {
            vec![ValidationFailure::new(
                "Passwords do not match".to_string(),
                Meta::new().with_field("confirm"),
            )]
        }
    })
}

fn text_validator(name: &str) -> Result<Validator<String>, regex::Error> {
    let check = field_rules(name)?;
    Ok(Validator::new(move |value: &String| {
        check.validate(&FieldValue::from(value.as_str()))
    }))
}

fn new_field(name: &str) -> Result<Field<String>, regex::Error> {
    let label = name.to_string();
    let config = FieldConfig::new(name)
        .validator(text_validator(name)?)
        .on_value_change(|value: &String, field: &str, source: ChangeSource| {
            log::info!("{field}: value {value:?} ({source:?})");
        })
        .on_validity_change(move |failures: &[ValidationFailure]| match failures.first() {
            Some(first) => log::info!("{label}: invalid, {first}"),
            None => log::info!("{label}: valid"),
        });
    Ok(Field::new(config))
}

impl Signup {
    /// Build the form, mount it, and mount every field.
    pub fn new() -> Result<Self, DemoError> {
        let outcome = Arc::new(Mutex::new(Outcome::default()));
        let submitted = Arc::clone(&outcome);

        let mut validators = Vec::new();
        for name in FIELDS {
            validators.push((name, field_rules(name)?));
        }

        let form = FormConfig::new("signup")
            .fields(FIELDS)
            .combined(combine_validators(validators))
            .validator(passwords_match())
            .submit_mode(SubmitMode::AwaitCompletion)
            .focus_first_invalid()
            .on_form_change(|data: &FormData, first: bool| {
                log::info!("form changed (first: {first}): {} fields", data.len());
            })
            .on_form_validity_change(|failures: &[ValidationFailure]| {
                log::info!("form validity changed: {} failures", failures.len());
            })
            .on_data_submit(move |failures: &[ValidationFailure], data: &FormData, event: &SubmitEvent| {
                let mut outcome = submitted.lock().unwrap_or_else(|e| e.into_inner());
                outcome.submissions += 1;
                if failures.is_empty() {
                    outcome.accepted += 1;
                    log::info!("submission {} accepted", event.id());
                } else {
                    for failure in failures {
                        log::info!("submission {} rejected: {}", event.id(), failure);
                    }
                }
                outcome.data = data.clone();
            })
            .build()?;

        let registry = FormRegistry::new();
        form.mount(&registry)?;

        let mut fields = Vec::new();
        for name in FIELDS {
            let field = new_field(name)?;
            field.mount(&form)?;
            fields.push(field);
        }

        Ok(Self {
            form,
            registry,
            fields,
            outcome,
        })
    }

    fn field(&self, name: &str) -> Result<&Field<String>, DemoError> {
        self.fields
            .iter()
            .find(|field| field.name() == name)
            .ok_or_else(|| DemoError::UnknownField(name.to_string()))
    }

    /// Apply one scripted event.
    pub fn apply(&self, step: &Step) -> Result<(), DemoError> {
        log::debug!("step: {step:?}");
        match step {
            Step::Change { field, value } => self.field(field)?.handle_change(value.clone())?,
            Step::Blur { field } => {
                let field = self.field(field)?;
                field.handle_blur()?;
                let visible = field.visible_errors();
                if let Some(first) = visible.first() {
                    log::info!("{}: showing \"{}\"", field.name(), first.reason);
                }
            }
            Step::Render => {
                self.form.on_render();
            }
            Step::Submit => {
                let mut event = SubmitEvent::new();
                self.form.handle_submit(&mut event)?;
                for field in &self.fields {
                    if field.take_focus_request() {
                        log::info!("focus moved to {}", field.name());
                    }
                }
            }
            Step::Complete => {
                let handle = self
                    .registry
                    .get(self.form.name())
                    .ok_or_else(|| RegistryError::NotRegistered {
                        key: self.form.name().to_string(),
                    })
                    .map_err(FormError::from)?;
                handle.submit_completed().map_err(FormError::from)?;
            }
            Step::Reset { field, value } => self.field(field)?.reset(value.clone())?,
            Step::Unmount { field } => self.field(field)?.unmount()?,
            Step::Mount { field } => self.field(field)?.mount(&self.form)?,
        }
        Ok(())
    }

    /// Run every step, then unmount everything.
    pub fn run<'a>(self, steps: impl IntoIterator<Item = &'a Step>) -> Result<Outcome, DemoError> {
        for step in steps {
            self.apply(step)?;
        }

        for field in &self.fields {
            if field.is_mounted() {
                field.unmount()?;
            }
        }
        self.form.unmount()?;

        let mut outcome = self.outcome.lock().unwrap_or_else(|e| e.into_inner()).clone();
        outcome.data = self.form.field_values();
        Ok(outcome)
    }
}
