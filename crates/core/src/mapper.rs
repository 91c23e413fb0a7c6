//! Translation between wire shapes (`api_shared::pb`) and domain types.
//!
//! Pure functions only. Besides type construction the one failure mode is an unparsable
//! calendar date, reported as [`PatientError::InvalidDate`].

use crate::constants::{DATE_FORMAT, MAX_NAME_LEN};
use crate::model::{NewPatient, Patient, PatientChanges};
use crate::validation::FieldErrors;
use crate::{PatientError, PatientResult};
use api_shared::pb;
use chrono::NaiveDate;
use patient_types::{EmailAddress, NonEmptyText};

/// Parses a `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns `PatientError::InvalidDate` naming `field` if `value` is not a valid date.
pub fn parse_date(field: &'static str, value: &str) -> PatientResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|source| {
        PatientError::InvalidDate {
            field,
            value: value.to_string(),
            source,
        }
    })
}

/// Formats a date the way it travels on the wire.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Maps a create request onto a [`NewPatient`].
///
/// # Errors
///
/// Returns `PatientError::Validation` if a text field is malformed, or
/// `PatientError::InvalidDate` if either date cannot be parsed.
pub fn to_new_patient(req: &pb::PatientReq) -> PatientResult<NewPatient> {
    Ok(NewPatient {
        name: name(&req.name)?,
        email: email(&req.email)?,
        address: text("address", &req.address)?,
        date_of_birth: parse_date("dateOfBirth", &req.date_of_birth)?,
        registered_date: parse_date("registeredDate", &req.registered_date)?,
    })
}

/// Maps an update request onto [`PatientChanges`]. `registeredDate` is ignored.
///
/// # Errors
///
/// Same as [`to_new_patient`], minus the registration date.
pub fn to_changes(req: &pb::PatientReq) -> PatientResult<PatientChanges> {
    Ok(PatientChanges {
        name: name(&req.name)?,
        email: email(&req.email)?,
        address: text("address", &req.address)?,
        date_of_birth: parse_date("dateOfBirth", &req.date_of_birth)?,
    })
}

/// Maps a stored patient onto its response shape. The registration date is not exposed.
pub fn to_response(patient: &Patient) -> pb::PatientRes {
    pb::PatientRes {
        id: patient.id.to_string(),
        name: patient.name.to_string(),
        email: patient.email.to_string(),
        address: patient.address.to_string(),
        date_of_birth: format_date(patient.date_of_birth),
    }
}

fn name(value: &str) -> PatientResult<NonEmptyText> {
    NonEmptyText::with_max_len(value, MAX_NAME_LEN)
        .map_err(|e| PatientError::Validation(FieldErrors::single("name", e.to_string())))
}

pub(crate) fn email(value: &str) -> PatientResult<EmailAddress> {
    EmailAddress::parse(value)
        .map_err(|e| PatientError::Validation(FieldErrors::single("email", e.to_string())))
}

fn text(field: &'static str, value: &str) -> PatientResult<NonEmptyText> {
    NonEmptyText::new(value)
        .map_err(|e| PatientError::Validation(FieldErrors::single(field, e.to_string())))
}
