//! Patient domain types.
//!
//! These are the internal representations the orchestrator and stores work with. Wire shapes
//! live in `api_shared::pb`; conversion between the two is the job of [`crate::mapper`].

use crate::{PatientError, PatientResult};
use chrono::NaiveDate;
use patient_types::{EmailAddress, NonEmptyText};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque patient identifier, assigned by the store on creation.
///
/// Displayed in the standard hyphenated UUID form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PatientId(Uuid);

impl PatientId {
    /// Generates a fresh random identifier.
    ///
    /// Only stores should call this; everyone else receives identifiers from a store.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID, e.g. one read back from the database.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses an externally supplied identifier.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidInput` if `input` is not a UUID.
    pub fn parse(input: &str) -> PatientResult<Self> {
        Uuid::parse_str(input.trim())
            .map(Self)
            .map_err(|_| PatientError::InvalidInput(format!("invalid patient id: '{input}'")))
    }

    /// Returns the underlying UUID.
    pub const fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Where a patient stands with the billing system.
///
/// A patient is `Pending` from insert until the first provisioning attempt finishes. Only an
/// `Active` patient has had its creation event published.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProvisioningStatus {
    Pending,
    Active,
    Failed,
}

impl ProvisioningStatus {
    /// Stored form of the status.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProvisioningStatus::Pending => "pending",
            ProvisioningStatus::Active => "active",
            ProvisioningStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ProvisioningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProvisioningStatus {
    type Err = PatientError;

    fn from_str(s: &str) -> PatientResult<Self> {
        match s {
            "pending" => Ok(ProvisioningStatus::Pending),
            "active" => Ok(ProvisioningStatus::Active),
            "failed" => Ok(ProvisioningStatus::Failed),
            other => Err(PatientError::InvalidInput(format!(
                "unknown provisioning status: '{other}'"
            ))),
        }
    }
}

/// A persisted patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patient {
    pub id: PatientId,
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub address: NonEmptyText,
    pub date_of_birth: NaiveDate,
    /// Fixed at creation; never changed by updates.
    pub registered_date: NaiveDate,
    /// Changed only by provisioning, never by updates.
    pub provisioning_status: ProvisioningStatus,
}

impl Patient {
    /// Builds the persisted form of `new` under the identifier a store assigned. New patients
    /// start out `Pending`.
    pub fn from_new(id: PatientId, new: NewPatient) -> Self {
        Self {
            id,
            name: new.name,
            email: new.email,
            address: new.address,
            date_of_birth: new.date_of_birth,
            registered_date: new.registered_date,
            provisioning_status: ProvisioningStatus::Pending,
        }
    }

    /// Applies the mutable fields of an update in place.
    pub fn apply(&mut self, changes: PatientChanges) {
        self.name = changes.name;
        self.email = changes.email;
        self.address = changes.address;
        self.date_of_birth = changes.date_of_birth;
    }
}

/// A patient that has not been stored yet and so has no identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPatient {
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub address: NonEmptyText,
    pub date_of_birth: NaiveDate,
    pub registered_date: NaiveDate,
}

/// The fields an update may change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientChanges {
    pub name: NonEmptyText,
    pub email: EmailAddress,
    pub address: NonEmptyText,
    pub date_of_birth: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_id_round_trips_through_display() {
        let id = PatientId::generate();
        let parsed = PatientId::parse(&id.to_string()).expect("display form should parse");
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_patient_id_rejects_garbage() {
        let err = PatientId::parse("not-a-uuid").expect_err("should reject");
        assert!(matches!(err, PatientError::InvalidInput(_)));
    }

    #[test]
    fn test_apply_keeps_id_and_registered_date() {
        let registered = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut patient = Patient::from_new(
            PatientId::generate(),
            NewPatient {
                name: NonEmptyText::new("Ada").unwrap(),
                email: EmailAddress::parse("ada@example.com").unwrap(),
                address: NonEmptyText::new("1 Infinite Loop").unwrap(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                registered_date: registered,
            },
        );
        let id = patient.id;

        patient.apply(PatientChanges {
            name: NonEmptyText::new("Ada King").unwrap(),
            email: EmailAddress::parse("ada.king@example.com").unwrap(),
            address: NonEmptyText::new("2 Infinite Loop").unwrap(),
            date_of_birth: NaiveDate::from_ymd_opt(1991, 2, 3).unwrap(),
        });

        assert_eq!(patient.id, id);
        assert_eq!(patient.registered_date, registered);
        assert_eq!(patient.provisioning_status, ProvisioningStatus::Pending);
        assert_eq!(patient.name.as_str(), "Ada King");
        assert_eq!(patient.email.as_str(), "ada.king@example.com");
    }

    #[test]
    fn test_provisioning_status_round_trips_through_str() {
        for status in [
            ProvisioningStatus::Pending,
            ProvisioningStatus::Active,
            ProvisioningStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ProvisioningStatus>().expect("known"), status);
        }
        assert!("ACTIVE".parse::<ProvisioningStatus>().is_err());
    }
}
