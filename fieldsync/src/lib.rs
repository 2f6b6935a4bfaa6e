//! Form-field validation and state synchronization.
//!
//! Fields own their value, touch tracking and error-visibility timing.
//! Forms own the record, run record-level validation on submit and fan
//! the failures back out to the mounted fields through small imperative
//! handles. Rendering stays outside: it feeds raw change, blur and
//! mount events in and reads validity state back.

pub mod callbacks;
pub mod error;
pub mod events;
pub mod field;
pub mod form;
pub mod registry;
pub mod validation;
pub mod value;

pub use error::{FieldError, FormError, RegistryError, RuleFault};
pub use events::{ChangeSource, SubmitEvent};
pub use field::{Field, FieldApi, FieldConfig, FieldPhase};
pub use form::{Form, FormConfig, FormHandle, FormRegistry, SubmitMode};
pub use registry::{HandleRegistry, Registration};
pub use value::{FieldValue, FormData, FormValue, InputValue};

pub mod prelude {
    pub use crate::error::{FieldError, FormError, RegistryError, RuleFault};
    pub use crate::events::{ChangeSource, SubmitEvent};
    pub use crate::field::{Field, FieldApi, FieldConfig, FieldHandle, FieldPhase};
    pub use crate::form::{Form, FormConfig, FormHandle, FormRegistry, SubmitMode};
    pub use crate::registry::{HandleRegistry, Registration};
    pub use crate::validation::{
        CombinedValidator, Meta, Rule, ValidationFailure, Validator, always_valid, combine_validators,
        compose_validators, from_rules,
    };
    pub use crate::validation::rules;
    pub use crate::value::{FieldValue, FormData, FormValue, InputValue};
}
