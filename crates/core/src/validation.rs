//! Input validation utilities.
//!
//! This module checks patient request bodies field by field before they are mapped into
//! domain types. Every failing field is reported, keyed by its wire name, so a client can fix
//! all problems in one round trip.

use crate::constants::MAX_NAME_LEN;
use crate::{PatientError, PatientResult};
use api_shared::pb;
use patient_types::{EmailAddress, NonEmptyText, TextError};
use std::collections::BTreeMap;
use std::fmt;

/// Which operation a request body is being validated for.
///
/// `registeredDate` is only required when creating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    Create,
    Update,
}

/// Field name to message map describing why a request was rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    /// Builds a map holding one error.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.insert(field, message);
        errors
    }

    /// Records an error for `field`, keeping the first message if one is already present.
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Validates a patient request body.
///
/// Dates are only checked for presence here; parsing them is the mapper's job and fails with
/// `PatientError::InvalidDate`.
///
/// # Errors
///
/// Returns `PatientError::Validation` listing every invalid field.
pub fn validate_patient_req(req: &pb::PatientReq, kind: RequestKind) -> PatientResult<()> {
    let mut errors = FieldErrors::default();

    match NonEmptyText::with_max_len(&req.name, MAX_NAME_LEN) {
        Ok(_) => {}
        Err(TextError::TooLong { max, .. }) => {
            errors.insert("name", format!("Name must be less than {max} characters"));
        }
        Err(_) => errors.insert("name", "Name is mandatory"),
    }

    match EmailAddress::parse(&req.email) {
        Ok(_) => {}
        Err(TextError::Empty) => errors.insert("email", "Email is mandatory"),
        Err(_) => errors.insert("email", "Email should be valid"),
    }

    if req.address.trim().is_empty() {
        errors.insert("address", "Address is mandatory");
    }

    if req.date_of_birth.trim().is_empty() {
        errors.insert("dateOfBirth", "Date of birth is mandatory");
    }

    if kind == RequestKind::Create && req.registered_date.trim().is_empty() {
        errors.insert("registeredDate", "Registered date is mandatory");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PatientError::Validation(errors))
    }
}
