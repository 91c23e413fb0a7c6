//! PostgreSQL patient store.
//!
//! Rows live in the `patients` table created by the embedded migrations. The database assigns
//! identifiers (`gen_random_uuid()`) and owns the `patients_email_key` uniqueness constraint;
//! violations of that constraint surface as [`StoreError::DuplicateEmail`].

use super::{PatientStore, StoreError, StoreResult};
use crate::model::{NewPatient, Patient, PatientId, ProvisioningStatus};
use async_trait::async_trait;
use chrono::NaiveDate;
use patient_types::{EmailAddress, NonEmptyText};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

const MAX_CONNECTIONS: u32 = 10;

const PATIENT_COLUMNS: &str =
    "id, name, email, address, date_of_birth, registered_date, provisioning_status";

#[derive(Clone, Debug)]
pub struct PostgresPatientStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct PatientRow {
    id: Uuid,
    name: String,
    email: String,
    address: String,
    date_of_birth: NaiveDate,
    registered_date: NaiveDate,
    provisioning_status: String,
}

impl TryFrom<PatientRow> for Patient {
    type Error = StoreError;

    fn try_from(row: PatientRow) -> StoreResult<Self> {
        let corrupt = |field: &str, e: patient_types::TextError| {
            StoreError::Corrupt(format!("patient {} has invalid {field}: {e}", row.id))
        };

        Ok(Patient {
            id: PatientId::from_uuid(row.id),
            name: NonEmptyText::new(&row.name).map_err(|e| corrupt("name", e))?,
            email: EmailAddress::parse(&row.email).map_err(|e| corrupt("email", e))?,
            address: NonEmptyText::new(&row.address).map_err(|e| corrupt("address", e))?,
            date_of_birth: row.date_of_birth,
            registered_date: row.registered_date,
            provisioning_status: row.provisioning_status.parse().map_err(|_| {
                StoreError::Corrupt(format!(
                    "patient {} has invalid provisioning status: '{}'",
                    row.id, row.provisioning_status
                ))
            })?,
        })
    }
}

/// Maps a sqlx error, turning unique-constraint violations into `DuplicateEmail`.
fn map_write_error(err: sqlx::Error, email: &EmailAddress) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::DuplicateEmail(email.to_string());
        }
    }
    StoreError::Unavailable(err.to_string())
}

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

impl PostgresPatientStore {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool against `database_url`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if the database cannot be reached.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(unavailable)?;
        Ok(Self::new(pool))
    }

    /// Runs the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unavailable` if a migration fails.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("migration failed: {e}")))
    }
}

#[async_trait]
impl PatientStore for PostgresPatientStore {
    async fn insert(&self, patient: NewPatient) -> StoreResult<Patient> {
        let sql = format!(
            "INSERT INTO patients (name, email, address, date_of_birth, registered_date) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PATIENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PatientRow>(&sql)
            .bind(patient.name.as_str())
            .bind(patient.email.as_str())
            .bind(patient.address.as_str())
            .bind(patient.date_of_birth)
            .bind(patient.registered_date)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, &patient.email))?;

        Patient::try_from(row)
    }

    async fn find_all(&self) -> StoreResult<Vec<Patient>> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at, id");
        sqlx::query_as::<_, PatientRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?
            .into_iter()
            .map(Patient::try_from)
            .collect()
    }

    async fn find_by_id(&self, id: PatientId) -> StoreResult<Option<Patient>> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1");
        sqlx::query_as::<_, PatientRow>(&sql)
            .bind(id.uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .map(Patient::try_from)
            .transpose()
    }

    async fn update(&self, patient: &Patient) -> StoreResult<Patient> {
        let sql = format!(
            "UPDATE patients SET name = $2, email = $3, address = $4, date_of_birth = $5 \
             WHERE id = $1 RETURNING {PATIENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PatientRow>(&sql)
            .bind(patient.id.uuid())
            .bind(patient.name.as_str())
            .bind(patient.email.as_str())
            .bind(patient.address.as_str())
            .bind(patient.date_of_birth)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_write_error(e, &patient.email))?
            .ok_or(StoreError::NotFound(patient.id))?;

        Patient::try_from(row)
    }

    async fn set_provisioning_status(
        &self,
        id: PatientId,
        status: ProvisioningStatus,
    ) -> StoreResult<()> {
        let result = sqlx::query("UPDATE patients SET provisioning_status = $2 WHERE id = $1")
            .bind(id.uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: PatientId) -> StoreResult<()> {
        sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(id.uuid())
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn exists_by_email(&self, email: &EmailAddress) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM patients WHERE email = $1)")
            .bind(email.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)
    }

    async fn exists_by_email_excluding_id(
        &self,
        email: &EmailAddress,
        id: PatientId,
    ) -> StoreResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM patients WHERE email = $1 AND id <> $2)",
        )
        .bind(email.as_str())
        .bind(id.uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)
    }

    async fn count(&self) -> StoreResult<usize> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM patients")
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)?;
        usize::try_from(count).map_err(|e| StoreError::Corrupt(e.to_string()))
    }
}
