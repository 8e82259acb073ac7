use api_shared::auth::{keys_file_from_env_value, KEYS_FILE_ENV};
use anyhow::{bail, Context};
use api_shared::ApiKeyGateway;
use clap::{Parser, Subcommand};
use medrec_core::config::data_file_from_env_value;
use medrec_core::constants::DATA_FILE_ENV;
use medrec_core::{
    split_comma_list, CoreConfig, EmergencyContact, Evaluation, JsonFileStore, PatientRecord,
    PatientService,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "medrec")]
#[command(about = "Patient medical profile CLI")]
struct Cli {
    /// Patient data file (overrides MEDREC_DATA_FILE)
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patients
    List {
        /// Only print name and age
        #[arg(long)]
        summary: bool,
    },
    /// Show one patient record
    Show {
        /// Patient name
        name: String,
    },
    /// Register a patient, replacing any record with the same name
    Register {
        /// Patient name
        name: String,
        #[arg(long, default_value = "")]
        age: String,
        /// Conditions (comma-separated)
        #[arg(long, default_value = "")]
        conditions: String,
        /// Medications (comma-separated)
        #[arg(long, default_value = "")]
        medications: String,
        /// Allergies (comma-separated)
        #[arg(long, default_value = "")]
        allergies: String,
        #[arg(long, default_value = "")]
        blood_type: String,
        /// Emergency contact name
        #[arg(long, default_value = "")]
        contact_name: String,
        /// Emergency contact phone
        #[arg(long, default_value = "")]
        contact_phone: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a patient
    Delete {
        /// Patient name
        name: String,
    },
    /// Append an evaluation to a patient
    AddEvaluation {
        /// Patient name
        name: String,
        #[arg(long, default_value = "")]
        year: String,
        #[arg(long, default_value = "")]
        blood_pressure: String,
        #[arg(long, default_value = "")]
        cholesterol: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// List every evaluation tagged with its patient
    Evaluations,
    /// Check whether an API key is currently accepted
    CheckKey {
        key: String,
    },
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let data_file = cli
        .data_file
        .unwrap_or_else(|| data_file_from_env_value(std::env::var(DATA_FILE_ENV).ok()));
    let cfg = CoreConfig::new(data_file)?;
    let service = PatientService::new(Arc::new(JsonFileStore::new(cfg.data_file())));

    match cli.command {
        Some(Commands::List { summary }) => {
            if summary {
                let summaries = service.list_summaries()?;
                if summaries.is_empty() {
                    println!("No patients found.");
                }
                for s in summaries {
                    println!("{}: {}", s.name, s.age);
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&service.load_all()?)?);
            }
        }
        Some(Commands::Show { name }) => {
            let record = service.get(&name).context("reading patient")?;
            let keyed = BTreeMap::from([(name, record)]);
            println!("{}", serde_json::to_string_pretty(&keyed)?);
        }
        Some(Commands::Register {
            name,
            age,
            conditions,
            medications,
            allergies,
            blood_type,
            contact_name,
            contact_phone,
            description,
        }) => {
            let record = PatientRecord {
                age,
                conditions: split_comma_list(&conditions),
                medications: split_comma_list(&medications),
                allergies: split_comma_list(&allergies),
                blood_type,
                emergency_contact: EmergencyContact {
                    name: contact_name,
                    phone: contact_phone,
                },
                description,
                evaluations: Vec::new(),
            };
            let (name, _) = service
                .upsert(&name, record)
                .context("registering patient")?;
            println!("Registered patient: {}", name);
        }
        Some(Commands::Delete { name }) => {
            service.delete(&name).context("deleting patient")?;
            println!("Deleted patient: {}", name);
        }
        Some(Commands::AddEvaluation {
            name,
            year,
            blood_pressure,
            cholesterol,
            notes,
        }) => {
            let evaluation = Evaluation {
                year,
                blood_pressure,
                cholesterol,
                notes,
            };
            let record = service
                .append_evaluation(&name, evaluation)
                .context("adding evaluation")?;
            println!(
                "Added evaluation #{} for patient: {}",
                record.evaluations.len(),
                name
            );
        }
        Some(Commands::Evaluations) => {
            println!("{}", serde_json::to_string_pretty(&service.list_evaluations()?)?);
        }
        Some(Commands::CheckKey { key }) => {
            let keys_file = keys_file_from_env_value(std::env::var(KEYS_FILE_ENV).ok());
            let gateway = ApiKeyGateway::with_env_and_file(keys_file);
            if !gateway.is_authorized(&key) {
                bail!("API key rejected");
            }
            println!("API key accepted");
        }
        None => {
            println!("Use 'medrec --help' for commands");
        }
    }

    Ok(())
}
