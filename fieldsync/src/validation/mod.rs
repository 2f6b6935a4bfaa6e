//! Declarative validation for single values and flat records.
//!
//! A [`Validator`] is a pure function from a value to an ordered list of
//! [`ValidationFailure`]s. Validators are built from rules and combined:
//!
//! - [`from_rules`] turns `(predicate, reason)` rules into a validator
//! - [`compose_validators`] layers validators over the same input
//! - [`combine_validators`] builds a record validator from per-key ones
//!
//! # Example
//!
//! ```
//! use fieldsync::validation::{combine_validators, from_rules, rules, Meta, Validator};
//! use fieldsync::{FieldValue, FormData};
//!
//! let email: Validator<FieldValue> = from_rules(
//!     vec![
//!         rules::required("Email is required"),
//!         rules::email("Please enter a valid email"),
//!     ],
//!     Meta::new(),
//! );
//! let zip: Validator<FieldValue> = from_rules(
//!     vec![rules::digits(5, "Zip must be 5 digits")],
//!     Meta::new(),
//! );
//!
//! let signup = combine_validators::<FormData, _, _, _, _>([("email", email), ("zip", zip)]);
//!
//! let data = FormData::new().with("email", "ada@example.com").with("zip", "123");
//! let failures = signup.validate(&data);
//! assert_eq!(failures.len(), 1);
//! assert_eq!(failures[0].field(), Some("zip"));
//! ```

mod combine;
mod failure;
mod meta;
pub mod rules;
mod validator;

pub use combine::{CombinedValidator, FieldValidators, Record, combine_validators};
pub use failure::{Reason, ValidationFailure};
pub use meta::{FailureMeta, Meta};
pub use rules::{Rule, from_rules};
pub use validator::{Validator, always_valid, compose_validators};
