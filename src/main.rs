use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tensio::config::{self, Settings};
use tensio::triage::ollama::OllamaClient;
use tensio::triage::review::TreatmentReviewer;
use tensio::triage::template::PromptTemplate;
use tensio::{db, ingest};

#[derive(Parser)]
#[command(name = "tensio")]
#[command(version = config::APP_VERSION)]
#[command(about = "Blood-pressure triage and medication review")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import vital and medication CSV exports into the store
    Seed {
        /// Path to vital.csv
        #[arg(long)]
        vitals: PathBuf,
        /// Path to medication.csv
        #[arg(long)]
        medications: PathBuf,
    },
    /// Review one patient's blood pressure and medication history
    Review {
        /// Patient identifier; prompted for interactively when omitted
        patient_id: Option<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    match run(cli.command, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Seed {
            vitals,
            medications,
        } => {
            let mut conn = db::open_database(&settings.database_path)?;
            let vital_rows = ingest::import_vitals(&mut conn, &vitals)?;
            let medication_rows = ingest::import_medications(&mut conn, &medications)?;
            println!(
                "Imported {vital_rows} vital and {medication_rows} medication records into {}",
                settings.database_path.display()
            );
        }
        Commands::Review { patient_id } => {
            let conn = db::open_database(&settings.database_path)?;
            let template = match &settings.prompt_template {
                Some(path) => PromptTemplate::load(path)?,
                None => PromptTemplate::embedded(),
            };
            let client = OllamaClient::new(&settings.ollama_url, settings.timeout_secs);
            let reviewer = TreatmentReviewer::new(Box::new(client), &settings.model, template);

            let patient_id = match patient_id {
                Some(id) => id,
                None => prompt_for_patient_id()?,
            };

            let review = reviewer.review(&conn, &patient_id)?;
            println!("{}", serde_json::to_string_pretty(&review)?);
        }
    }
    Ok(())
}

fn prompt_for_patient_id() -> Result<String, Box<dyn std::error::Error>> {
    print!("Patient id: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let patient_id = line.trim().to_string();
    if patient_id.is_empty() {
        return Err("no patient id given".into());
    }
    Ok(patient_id)
}
