use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use nutriapp_core::config::{AppConfig, DATA_DIR_ENV};
use nutriapp_core::export::ReportExporter;
use nutriapp_core::models::{
    ConsultationRequest, ExtraFields, Module, ReportRecord, ReportSection,
};
use nutriapp_core::{Database, IntakeService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nutriapp")]
#[command(about = "Nutrition intake records and consultation reports")]
struct Cli {
    /// Data directory (overrides NUTRIAPP_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Lines per page in rendered documents (0 disables pagination)
    #[arg(long, global = true)]
    page_lines: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage patients
    Patient {
        #[command(subcommand)]
        command: PatientCommands,
    },
    /// Save a consultation without generating a report
    Consult(ConsultArgs),
    /// Save a consultation and generate its report
    Analyze {
        #[command(flatten)]
        consult: ConsultArgs,
        /// Also write the text document to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List a patient's consultations, newest first
    History {
        /// Patient ID
        patient_id: String,
    },
    /// Inspect stored reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Remove duplicated patients, consultations and reports
    Dedup,
    /// Export all reports
    Export {
        #[command(subcommand)]
        format: ExportFormat,
    },
    /// List modules, their subtypes and extra fields
    Subtypes {
        /// Only this module
        module: Option<String>,
    },
}

#[derive(Subcommand)]
enum PatientCommands {
    /// Register a patient
    Add {
        /// Patient name
        name: String,
        /// Age in years (0-120)
        age: u32,
        /// Sex (optional)
        #[arg(long)]
        sex: Option<String>,
    },
    /// List all patients
    List,
    /// Search patients by name
    Search {
        query: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Print the sections of a report
    Show { report_id: String },
    /// Render a report as a text document
    Render {
        report_id: String,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ExportFormat {
    Csv,
    Json,
}

#[derive(clap::Args)]
struct ConsultArgs {
    /// Patient ID
    patient_id: String,
    /// Module label or alias (clinical, sports, materno)
    #[arg(long)]
    module: String,
    /// Consultation subtype
    #[arg(long, default_value = "Padrão")]
    subtype: String,
    /// Main complaint
    #[arg(long)]
    complaint: String,
    /// Goals
    #[arg(long)]
    goals: String,
    /// Free-form notes
    #[arg(long, default_value = "")]
    notes: String,
    /// Module extra field, as key=value (repeatable)
    #[arg(long = "extra", value_parser = parse_extra)]
    extras: Vec<(String, String)>,
}

impl ConsultArgs {
    fn to_request(&self) -> anyhow::Result<ConsultationRequest> {
        let module = Module::parse(&self.module);
        if !module.is_known() {
            tracing::warn!(module = %module, "module has no rule group");
        }
        let extra = ExtraFields::from_pairs_strict(&module, self.extras.iter().cloned())?;
        Ok(ConsultationRequest::new(module, self.subtype.clone())
            .with_complaint(self.complaint.clone())
            .with_goals(self.goals.clone())
            .with_notes(self.notes.clone())
            .with_extras(extra))
    }
}

fn parse_extra(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    Ok((key.trim().to_string(), value.to_string()))
}

fn print_report(record: &ReportRecord) {
    println!("Relatório {} (consulta {})", record.report_id, record.consult_id);
    for section in ReportSection::ALL {
        println!();
        println!("{}", section.title());
        println!("{}", record.report.section(section));
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("nutriapp=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'nutriapp --help' for commands");
        return Ok(());
    };

    let config = AppConfig::resolve(
        cli.data_dir,
        std::env::var(DATA_DIR_ENV).ok(),
        cli.page_lines,
    )?;
    let db = Database::open(config.database_path())
        .with_context(|| format!("opening {}", config.database_path().display()))?;
    let service = IntakeService::new(&db);

    match command {
        Commands::Patient { command } => match command {
            PatientCommands::Add { name, age, sex } => {
                let patient = service.register_patient(&name, age, sex)?;
                println!("Paciente cadastrado: {}", patient.display_label());
            }
            PatientCommands::List => {
                let patients = db.list_patients()?;
                if patients.is_empty() {
                    println!("Nenhum paciente cadastrado.");
                }
                for patient in patients {
                    println!("{} | {} anos", patient.display_label(), patient.age);
                }
            }
            PatientCommands::Search { query, limit } => {
                for patient in db.search_patients(&query, limit)? {
                    println!("{}", patient.display_label());
                }
            }
        },
        Commands::Consult(args) => {
            let request = args.to_request()?;
            let consultation = service.save_consultation(&args.patient_id, &request)?;
            println!("Consulta salva: {}", consultation.consult_id);
        }
        Commands::Analyze { consult, out } => {
            let request = consult.to_request()?;
            let analysis = service.analyze_consultation(&consult.patient_id, &request)?;
            print_report(&analysis.report);

            if let Some(path) = out {
                let document = ReportExporter::new(&db)
                    .render_document(&analysis.report.report_id, config.page_lines())?;
                std::fs::write(&path, document)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!();
                println!("Documento salvo em {}", path.display());
            }
        }
        Commands::History { patient_id } => {
            let history = service.patient_history(&patient_id)?;
            if history.is_empty() {
                println!("Nenhuma consulta para o paciente {patient_id}.");
            }
            for consultation in history {
                let report = db.get_report_for_consultation(&consultation.consult_id)?;
                println!(
                    "{} | {} | {} ({}) | relatório: {}",
                    consultation.created_at,
                    consultation.consult_id,
                    consultation.request.module,
                    consultation.request.subtype,
                    report.map(|r| r.report_id).unwrap_or_else(|| "-".into()),
                );
            }
        }
        Commands::Report { command } => match command {
            ReportCommands::Show { report_id } => {
                let record = db
                    .get_report(&report_id)?
                    .ok_or_else(|| anyhow!("report not found: {report_id}"))?;
                print_report(&record);
            }
            ReportCommands::Render { report_id, out } => {
                let document =
                    ReportExporter::new(&db).render_document(&report_id, config.page_lines())?;
                match out {
                    Some(path) => std::fs::write(&path, document)
                        .with_context(|| format!("writing {}", path.display()))?,
                    None => println!("{document}"),
                }
            }
        },
        Commands::Dedup => {
            let summary = db.deduplicate()?;
            println!(
                "Pacientes: {} -> {}",
                summary.patients.before, summary.patients.after
            );
            println!(
                "Consultas: {} -> {}",
                summary.consultations.before, summary.consultations.after
            );
            println!(
                "Relatórios: {} -> {}",
                summary.reports.before, summary.reports.after
            );
        }
        Commands::Export { format } => {
            let batch = ReportExporter::new(&db).export_all()?;
            match format {
                ExportFormat::Csv => print!("{}", batch.to_csv()),
                ExportFormat::Json => println!("{}", batch.to_json()?),
            }
        }
        Commands::Subtypes { module } => {
            let modules = match module {
                Some(label) => {
                    let module = Module::parse(&label);
                    if !module.is_known() {
                        bail!("unknown module: {label}");
                    }
                    vec![module]
                }
                None => Module::KNOWN.to_vec(),
            };
            for module in modules {
                println!("{module}");
                println!("  subtipos: {}", module.suggested_subtypes().join(", "));
                let fields: Vec<_> = module
                    .extra_fields()
                    .iter()
                    .map(|f| format!("{} ({})", f.key(), f.label()))
                    .collect();
                println!("  campos: {}", fields.join(", "));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extra() {
        assert_eq!(
            parse_extra("labs=glicemia 110").unwrap(),
            ("labs".to_string(), "glicemia 110".to_string())
        );
        assert_eq!(
            parse_extra("x=a=b").unwrap(),
            ("x".to_string(), "a=b".to_string())
        );
        assert!(parse_extra("labs").is_err());
    }

    #[test]
    fn test_cli_parses_analyze() {
        let cli = Cli::try_parse_from([
            "nutriapp",
            "--data-dir",
            "/tmp/n",
            "analyze",
            "p-1",
            "--module",
            "clinical",
            "--complaint",
            "cansaço",
            "--goals",
            "emagrecer",
            "--extra",
            "meds=metformina",
        ])
        .unwrap();
        let Some(Commands::Analyze { consult, out }) = cli.command else {
            panic!("expected analyze");
        };
        assert!(out.is_none());
        let request = consult.to_request().unwrap();
        assert_eq!(request.module, Module::Clinical);
        assert_eq!(
            request.extra.get(nutriapp_core::models::ExtraField::Meds),
            Some("metformina")
        );
    }

    #[test]
    fn test_foreign_extra_rejected() {
        let cli = Cli::try_parse_from([
            "nutriapp", "consult", "p-1", "--module", "sports", "--complaint", "a", "--goals",
            "b", "--extra", "labs=x",
        ])
        .unwrap();
        let Some(Commands::Consult(args)) = cli.command else {
            panic!("expected consult");
        };
        assert!(args.to_request().is_err());
    }
}
