//! Domain types and field validation for contact-form submissions.
//!
//! Nothing in this crate performs I/O; storage and delivery live in the
//! `contact-relay-storage` and `contact-relay-mailer` crates.

pub mod types;
pub mod validation;

pub use types::{ContactDraft, ContactFormInput, NotAnObject, Submission};
pub use validation::{validate, ValidationErrors, Violation};
