use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sga_core::{
    config::{request_timeout_from_env_value, service_url_from_env_value},
    constants::{CLASSIFY_URL_ENV, IMPUTE_URL_ENV, PATIENT_API_URL_ENV, REQUEST_TIMEOUT_ENV},
    AssessmentSession, CoreConfig, FailureReason, FieldSchema, FormRecord, HttpPredictionClient,
    InputKind, NewMother, NewScan, PatientHistoryClient, SubmissionResult,
};
use sga_types::NonEmptyText;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "sga")]
#[command(about = "Fetal growth (SGA/AGA) assessment CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the clinical fields, their sections and plausible ranges
    Fields,
    /// Validate a set of measurements and classify them
    Predict {
        /// Field value as Name=Value (repeatable)
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
        /// JSON file with field values; --field entries override it
        #[arg(long)]
        record: Option<PathBuf>,
        /// Prefill maternal fields from this mother's history
        #[arg(long)]
        mother: Option<String>,
        /// Record the scan against --mother after a successful classification
        #[arg(long, requires = "mother")]
        save: bool,
    },
    /// Patient history operations
    Mother {
        #[command(subcommand)]
        command: MotherCommands,
    },
}

#[derive(Subcommand)]
enum MotherCommands {
    /// Show a stored mother
    Get {
        /// Mother identifier
        id: String,
    },
    /// Register a new mother
    Create(CreateMotherArgs),
}

#[derive(Args)]
struct CreateMotherArgs {
    /// Full name
    name: String,
    /// Age in years
    #[arg(long)]
    age: f64,
    /// Height in cm
    #[arg(long)]
    height: f64,
    /// Weight in kg
    #[arg(long)]
    weight: f64,
    /// Hospital of care
    #[arg(long, default_value = "")]
    hospital: String,
    #[arg(long)]
    smokes: bool,
    #[arg(long)]
    gestational_diabetes: bool,
    #[arg(long)]
    pregestational_diabetes: bool,
    #[arg(long)]
    pregnancy_hypertension: bool,
    #[arg(long)]
    essential_hypertension: bool,
    /// An earlier pregnancy failed
    #[arg(long)]
    previous_failed_pregnancy: bool,
    #[arg(long)]
    high_risk_preeclampsia: bool,
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected Name=Value, got {s}"))?;
    Ok((name.trim().to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("sga_core=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let schema = FieldSchema::clinical()?;

    match cli.command {
        Commands::Fields => {
            print_fields(&schema);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Predict {
            fields,
            record,
            mother,
            save,
        } => predict(schema, fields, record, mother, save).await,
        Commands::Mother { command } => {
            let client = patient_history_client()?;
            match command {
                MotherCommands::Get { id } => {
                    let mother = client.get_mother(&id).await?;
                    println!("{}", serde_json::to_string_pretty(&mother)?);
                }
                MotherCommands::Create(args) => {
                    let new_mother = NewMother {
                        name: NonEmptyText::new(&args.name)?,
                        age: args.age,
                        height: args.height,
                        weight: args.weight,
                        hospital: args.hospital,
                        does_smoke: args.smokes,
                        gestational_ldm: args.gestational_diabetes,
                        pregestational_ldm: args.pregestational_diabetes,
                        pregnancy_hypertension: args.pregnancy_hypertension,
                        essential_hypertension: args.essential_hypertension,
                        previous_failed_pregnancy: args.previous_failed_pregnancy,
                        high_risk_preeclampsia: args.high_risk_preeclampsia,
                    };
                    new_mother.validate(&schema)?;
                    let mother = client.create_mother(&new_mother).await?;
                    println!("Registered mother with ID: {}", mother.id);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_fields(schema: &FieldSchema) {
    for descriptor in schema.fields() {
        let input = match descriptor.input {
            InputKind::Numeric => "number".to_string(),
            InputKind::Choice(options) => options.join("/"),
            InputKind::TrueFalse => "true/false".to_string(),
        };
        let range = schema
            .range(descriptor.name)
            .map(|r| format!(" [{}, {}]", r.min, r.max))
            .unwrap_or_default();
        let marker = if schema.is_required(descriptor.name) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {:<42} {:<48} {input}{range}",
            descriptor.name, descriptor.label
        );
    }
    println!();
    println!("* required");
}

fn patient_history_client() -> anyhow::Result<PatientHistoryClient> {
    let base_url = service_url_from_env_value(
        PATIENT_API_URL_ENV,
        std::env::var(PATIENT_API_URL_ENV).ok(),
    )?
    .with_context(|| format!("{PATIENT_API_URL_ENV} must be set to use patient history"))?;
    let timeout = request_timeout_from_env_value(std::env::var(REQUEST_TIMEOUT_ENV).ok())?;
    Ok(PatientHistoryClient::new(base_url, timeout)?)
}

async fn predict(
    schema: FieldSchema,
    fields: Vec<(String, String)>,
    record: Option<PathBuf>,
    mother_id: Option<String>,
    save: bool,
) -> anyhow::Result<ExitCode> {
    let cfg = CoreConfig::from_env_values(
        std::env::var(IMPUTE_URL_ENV).ok(),
        std::env::var(CLASSIFY_URL_ENV).ok(),
        std::env::var(PATIENT_API_URL_ENV).ok(),
        std::env::var(REQUEST_TIMEOUT_ENV).ok(),
    )?;
    let history = match &mother_id {
        Some(_) => Some(PatientHistoryClient::from_config(&cfg)?),
        None => None,
    };

    let session = AssessmentSession::new(
        Arc::new(schema),
        Arc::new(HttpPredictionClient::new(&cfg)?),
    );

    if let (Some(history), Some(id)) = (&history, &mother_id) {
        let mother = history.get_mother(id).await?;
        let mut prefill = FormRecord::new();
        mother.prefill(&mut prefill);
        for (name, value) in prefill.iter() {
            session.set_field(name, Some(value.to_string()))?;
        }
    }

    if let Some(path) = record {
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let from_file: FormRecord = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        for (name, value) in from_file.iter() {
            session.set_field(name, Some(value.to_string()))?;
        }
    }

    for (name, value) in fields {
        session.set_field(&name, Some(value))?;
    }

    let result = session.submit().await?;
    match &result {
        SubmissionResult::Success(classification) => {
            println!("{}", classification.headline());
            let guidance = classification.guidance();
            println!();
            println!("{}", guidance.heading);
            for item in guidance.items {
                println!("  {:<26} {}", item.topic, item.advice);
            }

            if save {
                if let (Some(history), Some(id)) = (&history, mother_id) {
                    let scan = NewScan::new(id, session.record(), Some(*classification));
                    let stored = history.create_scan(&scan).await?;
                    println!();
                    println!("Recorded scan {} for mother {}", stored.id, stored.mother_id);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        SubmissionResult::Failure(reason) => {
            if let Some(notice) = session.notice(Instant::now()) {
                eprintln!("{}", notice.title);
                if notice.message != notice.title {
                    eprintln!("{}", notice.message);
                }
            }
            match reason {
                FailureReason::MissingRequiredFields(missing) => {
                    eprintln!("Missing: {}", missing.join(", "));
                }
                FailureReason::OutOfRange(violations) => {
                    for v in violations {
                        eprintln!(
                            "  {}: {} (expected {} to {})",
                            v.label,
                            v.value.as_deref().unwrap_or("<unset>"),
                            v.min,
                            v.max
                        );
                    }
                }
                FailureReason::RemoteCallFailure(_) => {}
            }
            Ok(ExitCode::from(2))
        }
        SubmissionResult::Pending => Ok(ExitCode::FAILURE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_splits_on_first_equals() {
        assert_eq!(
            parse_field("Gender=Female").expect("parse"),
            ("Gender".to_string(), "Female".to_string())
        );
        assert_eq!(
            parse_field("Note=a=b").expect("parse"),
            ("Note".to_string(), "a=b".to_string())
        );
        assert!(parse_field("Gender").is_err());
    }

    #[test]
    fn test_cli_parses_predict_fields() {
        let cli = Cli::try_parse_from([
            "sga",
            "predict",
            "--field",
            "MaternalAge=30",
            "--field",
            "Gender=Male",
        ])
        .expect("parse");
        match cli.command {
            Commands::Predict { fields, save, .. } => {
                assert_eq!(fields.len(), 2);
                assert!(!save);
            }
            _ => panic!("expected predict"),
        }
    }

    #[test]
    fn test_mother_create_takes_history_flags() {
        let cli = Cli::try_parse_from([
            "sga",
            "mother",
            "create",
            "Jane Doe",
            "--age",
            "31",
            "--height",
            "162",
            "--weight",
            "58",
            "--previous-failed-pregnancy",
        ])
        .expect("parse");
        match cli.command {
            Commands::Mother {
                command: MotherCommands::Create(args),
            } => {
                assert!(args.previous_failed_pregnancy);
                assert!(!args.smokes);
            }
            _ => panic!("expected mother create"),
        }
    }

    #[test]
    fn test_save_requires_mother() {
        assert!(Cli::try_parse_from(["sga", "predict", "--save"]).is_err());
    }
}
