mod config;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use config::CliConfig;
use lab_hl7::Dialect;
use lab_model::{Lab, LabDocument, LabTest};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Starter lab printed by `labgen template`: every key filled with a sample value.
fn template_lab() -> Lab {
    let requested = NaiveDate::from_ymd_opt(2023, 6, 9).and_then(|d| d.and_hms_opt(9, 49, 0));
    Lab {
        lab_name: Some("CML".into()),
        accession: Some("AC-46222032".into()),
        hin: Some("9876543225".into()),
        billing_no: Some("045717".into()),
        first_name: Some("Patient".into()),
        last_name: Some("Test".into()),
        dob: NaiveDate::from_ymd_opt(1995, 12, 11),
        sex: Some("F".into()),
        phone: Some("(437)774-5555".into()),
        provider_first_name: Some("Azizi".into()),
        provider_last_name: Some("Namini".into()),
        cc: Some("12345,Smith,John;Dr Adward".into()),
        lab_req_date: requested,
        tests: vec![LabTest {
            code: Some("253".into()),
            name: Some("Glucose".into()),
            description: Some("Urine glucose".into()),
            code_type: Some("NM".into()),
            code_value: Some("5.2".into()),
            code_unit: Some("mmol/L".into()),
            ref_range_text: None,
            ref_range_low: Some("3.6".into()),
            ref_range_high: Some("6.1".into()),
            flag: Some("N".into()),
            stat: Some("F".into()),
            blocked: None,
            notes: Some("Fasting sample".into()),
            date: requested,
        }],
    }
}

#[derive(Parser)]
#[command(name = "labgen")]
#[command(about = "Generate HL7 v2.3 ORU^R01 lab result messages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a lab document and print the message
    Generate {
        /// Path to the YAML lab document
        file: PathBuf,
        /// Receiver dialect (overrides the document's lab_name)
        #[arg(long, value_parser = parse_dialect)]
        dialect: Option<Dialect>,
    },
    /// Print a starter lab document
    Template,
    /// List supported dialects
    Dialects,
}

fn parse_dialect(raw: &str) -> Result<Dialect, String> {
    Dialect::parse(raw).map_err(|e| e.to_string())
}

/// Explicit flag, then a recognised `lab_name`, then the configured default, then CML.
fn select_dialect(explicit: Option<Dialect>, lab: &Lab, config: &CliConfig) -> Dialect {
    if let Some(dialect) = explicit {
        return dialect;
    }

    let named = lab
        .lab_name
        .as_deref()
        .and_then(|name| Dialect::parse(name).ok());
    match (named, config.default_dialect()) {
        (Some(dialect), _) | (None, Some(dialect)) => dialect,
        (None, None) => Dialect::for_lab_name(lab.lab_name.as_deref()),
    }
}

fn generate(file: &Path, explicit: Option<Dialect>, config: &CliConfig) -> Result<String> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let lab = LabDocument::parse(&text)
        .with_context(|| format!("failed to parse lab document {}", file.display()))?;

    let dialect = select_dialect(explicit, &lab, config);
    tracing::info!(
        "encoding {} as {} ({} tests)",
        file.display(),
        dialect,
        lab.tests.len()
    );

    dialect
        .encoder(config.clock())
        .compose(&lab)
        .with_context(|| format!("failed to encode {}", file.display()))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("labgen=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = CliConfig::from_env()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { file, dialect } => {
            let message = generate(&file, dialect, &config)?;
            print!("{message}");
        }
        Commands::Template => {
            let document =
                LabDocument::render(&template_lab()).context("failed to render template")?;
            print!("{document}");
        }
        Commands::Dialects => {
            for dialect in Dialect::ALL {
                println!("{dialect}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lab_named(name: Option<&str>) -> Lab {
        Lab {
            lab_name: name.map(Into::into),
            tests: vec![LabTest::default()],
            ..Lab::default()
        }
    }

    fn config_with_default(dialect: &str) -> CliConfig {
        CliConfig::from_lookup(|key| {
            (key == config::DEFAULT_DIALECT_VAR).then(|| dialect.to_string())
        })
        .expect("config")
    }

    #[test]
    fn template_reparses_to_the_same_lab() {
        let document = LabDocument::render(&template_lab()).expect("render template");
        let lab = LabDocument::parse(&document).expect("template should parse");
        assert_eq!(lab, template_lab());
    }

    #[test]
    fn template_encodes_in_every_dialect() {
        let lab = template_lab();
        for dialect in Dialect::ALL {
            let message = dialect
                .encoder(CliConfig::default().clock())
                .compose(&lab)
                .expect("compose template");
            assert!(message.starts_with("MSH|"));
        }
    }

    #[test]
    fn explicit_dialect_wins() {
        let lab = lab_named(Some("MDS"));
        let config = config_with_default("gdml");
        assert_eq!(
            select_dialect(Some(Dialect::Cml), &lab, &config),
            Dialect::Cml
        );
    }

    #[test]
    fn lab_name_beats_configured_default() {
        let lab = lab_named(Some("mds"));
        let config = config_with_default("gdml");
        assert_eq!(select_dialect(None, &lab, &config), Dialect::Mds);
    }

    #[test]
    fn configured_default_applies_to_unknown_lab_names() {
        let config = config_with_default("gdml");
        assert_eq!(
            select_dialect(None, &lab_named(None), &config),
            Dialect::Gdml
        );
        assert_eq!(
            select_dialect(None, &lab_named(Some("LifeLabs")), &config),
            Dialect::Gdml
        );
    }

    #[test]
    fn falls_back_to_cml_without_configuration() {
        let config = CliConfig::default();
        assert_eq!(
            select_dialect(None, &lab_named(None), &config),
            Dialect::Cml
        );
    }

    #[test]
    fn dialect_flag_parser_reports_unknown_names() {
        assert_eq!(parse_dialect("Gdml"), Ok(Dialect::Gdml));
        assert!(parse_dialect("hl7").is_err());
    }
}
