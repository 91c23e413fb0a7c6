use clap::{Parser, Subcommand};
use patient_core::{
    CoreConfig, GrpcBillingClient, KafkaEventPublisher, PatientError, PatientId, PatientService,
    PostgresPatientStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How long `retry-billing` waits for its event to reach the broker before exiting.
const EVENT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "patient")]
#[command(about = "Patient service operator CLI")]
struct Cli {
    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Create or upgrade the patients table
    Migrate,
    /// List all patients
    List,
    /// Show a single patient
    Show {
        /// Patient UUID
        id: String,
    },
    /// Delete a patient (succeeds if the patient does not exist)
    Delete {
        /// Patient UUID
        id: String,
    },
    /// Re-attempt billing provisioning for a patient whose creation reported a billing failure
    RetryBilling {
        /// Patient UUID
        id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("patient_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'patient --help' for commands");
        return Ok(());
    };

    let Some(database_url) = cli.database_url else {
        anyhow::bail!("DATABASE_URL (or --database-url) is required");
    };
    let cfg = CoreConfig::from_env()?.with_database_url(Some(database_url.clone()));

    let store = PostgresPatientStore::connect(&database_url)
        .await
        .map_err(PatientError::from)?;

    if command == Commands::Migrate {
        store.migrate().await.map_err(PatientError::from)?;
        println!("Migrations applied.");
        return Ok(());
    }

    let billing = GrpcBillingClient::connect_lazy(&cfg.billing_endpoint(), cfg.billing_api_key())?;
    let events = Arc::new(KafkaEventPublisher::new(
        cfg.kafka_bootstrap_servers(),
        cfg.billing_timeout(),
    )?);
    let service = PatientService::new(
        Arc::new(store),
        Arc::new(billing),
        events.clone(),
        cfg.patient_events_topic(),
        cfg.billing_timeout(),
    );

    match command {
        Commands::Migrate => {}
        Commands::List => {
            let patients = service.list().await?;
            if patients.is_empty() {
                println!("No patients found.");
            } else {
                for patient in patients {
                    println!(
                        "ID: {}, Name: {}, Email: {}, Date of birth: {}",
                        patient.id, patient.name, patient.email, patient.date_of_birth
                    );
                }
            }
        }
        Commands::Show { id } => {
            let patient = service.get(PatientId::parse(&id)?).await?;
            println!("ID: {}", patient.id);
            println!("Name: {}", patient.name);
            println!("Email: {}", patient.email);
            println!("Address: {}", patient.address);
            println!("Date of birth: {}", patient.date_of_birth);
        }
        Commands::Delete { id } => {
            service.delete(PatientId::parse(&id)?).await?;
            println!("Deleted patient {}", id);
        }
        Commands::RetryBilling { id } => {
            let account = service.retry_provisioning(PatientId::parse(&id)?).await?;
            println!(
                "Billing account {} is {} for patient {}",
                account.account_id, account.status, id
            );
            if let Err(e) = events.flush(EVENT_FLUSH_TIMEOUT) {
                eprintln!("Warning: patient event may not have been delivered: {}", e);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_retry_billing() {
        let cli = Cli::try_parse_from([
            "patient",
            "--database-url",
            "postgres://localhost/patients",
            "retry-billing",
            "6f1c1d2e-0000-4000-8000-000000000001",
        ])
        .expect("arguments should parse");

        assert_eq!(
            cli.database_url.as_deref(),
            Some("postgres://localhost/patients")
        );
        assert_eq!(
            cli.command,
            Some(Commands::RetryBilling {
                id: "6f1c1d2e-0000-4000-8000-000000000001".into()
            })
        );
    }
}
