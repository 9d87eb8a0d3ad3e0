//! NutriApp Core Library
//!
//! Local-first nutrition intake with rule-based report synthesis.
//!
//! # Architecture
//!
//! ```text
//! Module selection → Patient → Consultation form (complaint, goals, notes, extras)
//!                                                     │
//!                                              Intake validation
//!                                                     │
//!                                     [STORE: consultations]
//!                                                     │
//!                                     ┌───────────────▼───────────────┐
//!                                     │        Report Engine          │
//!                                     │  cross-cutting keyword rules  │
//!                                     │  module rule group            │
//!                                     │  fallback per empty section   │
//!                                     └───────────────┬───────────────┘
//!                                                     │
//!                                          [STORE: reports]
//!                                                     │
//!                             ┌───────────────────────┼───────────────────────┐
//!                             │                       │                       │
//!                             ▼                       ▼                       ▼
//!                      Text document             CSV export              JSON export
//! ```
//!
//! # Core Principle
//!
//! **Reports are decision support.** Every generated document carries a
//! disclaimer; the engine never diagnoses or prescribes.
//!
//! # Modules
//!
//! - [`config`]: Runtime configuration (data directory, page length)
//! - [`db`]: SQLite record store with fingerprint deduplication
//! - [`engine`]: Rule table and report synthesis
//! - [`export`]: Text document, CSV and JSON export
//! - [`intake`]: Validation and the consult-then-analyze workflow
//! - [`models`]: Domain types (Module, Patient, Consultation, Report)

pub mod config;
pub mod db;
pub mod engine;
pub mod export;
pub mod intake;
pub mod models;

// Re-export commonly used types
pub use config::AppConfig;
pub use db::{Database, DedupSummary};
pub use engine::ReportEngine;
pub use intake::{Analysis, IntakeService};
pub use models::{
    Consultation, ConsultationRequest, ExtraField, ExtraFields, Module, Patient, ReportRecord,
    ReportSection, StructuredReport,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum NutriAppError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for NutriAppError {
    fn from(e: db::DbError) -> Self {
        NutriAppError::DatabaseError(e.to_string())
    }
}

impl From<intake::IntakeError> for NutriAppError {
    fn from(e: intake::IntakeError) -> Self {
        match e {
            intake::IntakeError::Database(db) => db.into(),
            intake::IntakeError::PatientNotFound(id) => NutriAppError::NotFound(id),
            other => NutriAppError::InvalidInput(other.to_string()),
        }
    }
}

impl From<export::ExportError> for NutriAppError {
    fn from(e: export::ExportError) -> Self {
        match e {
            export::ExportError::Database(db) => db.into(),
            export::ExportError::Json(json) => json.into(),
            export::ExportError::NotFound(id) => NutriAppError::NotFound(id),
        }
    }
}

impl From<models::UnknownExtraField> for NutriAppError {
    fn from(e: models::UnknownExtraField) -> Self {
        NutriAppError::InvalidInput(e.to_string())
    }
}

impl From<serde_json::Error> for NutriAppError {
    fn from(e: serde_json::Error) -> Self {
        NutriAppError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for NutriAppError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        NutriAppError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<NutriAppCore>, NutriAppError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(NutriAppCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<NutriAppCore>, NutriAppError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(NutriAppCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Synthesize a report without storing anything.
///
/// Unknown extra keys are ignored; blank values count as not provided.
#[uniffi::export]
pub fn synthesize_report(consultation: FfiConsultationInput) -> FfiStructuredReport {
    let request: ConsultationRequest = consultation.into();
    ReportEngine::shared().synthesize(&request).into()
}

/// Display labels of the known specialty modules.
#[uniffi::export]
pub fn known_modules() -> Vec<String> {
    Module::KNOWN.iter().map(|m| m.label().to_string()).collect()
}

/// Suggested subtypes for a module label.
#[uniffi::export]
pub fn suggested_subtypes(module: String) -> Vec<String> {
    Module::parse(&module)
        .suggested_subtypes()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct NutriAppCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl NutriAppCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a new patient.
    pub fn register_patient(
        &self,
        name: String,
        age: u32,
        sex: Option<String>,
    ) -> Result<FfiPatient, NutriAppError> {
        let db = self.db.lock()?;
        let patient = IntakeService::new(&db).register_patient(&name, age, sex)?;
        Ok(patient.into())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, patient_id: String) -> Result<Option<FfiPatient>, NutriAppError> {
        let db = self.db.lock()?;
        let patient = db.get_patient(&patient_id)?;
        Ok(patient.map(|p| p.into()))
    }

    /// List all patients by name.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, NutriAppError> {
        let db = self.db.lock()?;
        let patients = db.list_patients()?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Search patients by name.
    pub fn search_patients(
        &self,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiPatient>, NutriAppError> {
        let db = self.db.lock()?;
        let patients = db.search_patients(&query, limit as usize)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Consultation Operations
    // =========================================================================

    /// Save a consultation without generating a report.
    pub fn save_consultation(
        &self,
        patient_id: String,
        consultation: FfiConsultationInput,
    ) -> Result<FfiConsultation, NutriAppError> {
        let request = consultation.into_request_strict()?;
        let db = self.db.lock()?;
        let saved = IntakeService::new(&db).save_consultation(&patient_id, &request)?;
        Ok(saved.into())
    }

    /// Save a consultation and generate its report.
    pub fn analyze_consultation(
        &self,
        patient_id: String,
        consultation: FfiConsultationInput,
    ) -> Result<FfiReport, NutriAppError> {
        let request = consultation.into_request_strict()?;
        let db = self.db.lock()?;
        let analysis = IntakeService::new(&db).analyze_consultation(&patient_id, &request)?;
        Ok(analysis.report.into())
    }

    /// Consultations of a patient, newest first.
    pub fn patient_history(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiConsultation>, NutriAppError> {
        let db = self.db.lock()?;
        let history = IntakeService::new(&db).patient_history(&patient_id)?;
        Ok(history.into_iter().map(|c| c.into()).collect())
    }

    // =========================================================================
    // Report Operations
    // =========================================================================

    /// Get a report by ID.
    pub fn get_report(&self, report_id: String) -> Result<Option<FfiReport>, NutriAppError> {
        let db = self.db.lock()?;
        let report = db.get_report(&report_id)?;
        Ok(report.map(|r| r.into()))
    }

    /// Reports of a patient, newest first.
    pub fn patient_reports(&self, patient_id: String) -> Result<Vec<FfiReport>, NutriAppError> {
        let db = self.db.lock()?;
        let reports = db.list_reports_for_patient(&patient_id)?;
        Ok(reports.into_iter().map(|r| r.into()).collect())
    }

    /// Render a stored report as a paginated text document.
    pub fn render_report_document(
        &self,
        report_id: String,
        page_lines: u32,
    ) -> Result<String, NutriAppError> {
        let db = self.db.lock()?;
        let exporter = export::ReportExporter::new(&db);
        Ok(exporter.render_document(&report_id, page_lines as usize)?)
    }

    // =========================================================================
    // Maintenance and Export Operations
    // =========================================================================

    /// Remove duplicated patients, consultations and reports.
    pub fn deduplicate(&self) -> Result<FfiDedupSummary, NutriAppError> {
        let db = self.db.lock()?;
        Ok(db.deduplicate()?.into())
    }

    /// Export all reports as JSON.
    pub fn export_reports_json(&self) -> Result<String, NutriAppError> {
        let db = self.db.lock()?;
        let exporter = export::ReportExporter::new(&db);
        let batch = exporter.export_all()?;
        Ok(batch.to_json()?)
    }

    /// Export all reports as CSV.
    pub fn export_reports_csv(&self) -> Result<String, NutriAppError> {
        let db = self.db.lock()?;
        let exporter = export::ReportExporter::new(&db);
        let batch = exporter.export_all()?;
        Ok(batch.to_csv())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub patient_id: String,
    pub name: String,
    pub age: u32,
    pub sex: Option<String>,
    pub created_at: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            patient_id: patient.patient_id,
            name: patient.name,
            age: u32::from(patient.age),
            sex: patient.sex,
            created_at: patient.created_at,
        }
    }
}

/// FFI-safe consultation form content.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConsultationInput {
    pub module: String,
    pub subtype: String,
    pub complaint: String,
    pub goals: String,
    pub notes: String,
    /// Extra fields by key (e.g. "comorbidities", "training_routine")
    pub extra: HashMap<String, String>,
}

impl FfiConsultationInput {
    /// Convert, rejecting extra keys the module does not define.
    fn into_request_strict(self) -> Result<ConsultationRequest, NutriAppError> {
        let module = Module::parse(&self.module);
        let extra = ExtraFields::from_pairs_strict(&module, self.extra)?;
        Ok(ConsultationRequest::new(module, self.subtype)
            .with_complaint(self.complaint)
            .with_goals(self.goals)
            .with_notes(self.notes)
            .with_extras(extra))
    }
}

impl From<FfiConsultationInput> for ConsultationRequest {
    fn from(input: FfiConsultationInput) -> Self {
        let module = Module::parse(&input.module);
        let extra = ExtraFields::from_pairs(&module, input.extra);
        ConsultationRequest::new(module, input.subtype)
            .with_complaint(input.complaint)
            .with_goals(input.goals)
            .with_notes(input.notes)
            .with_extras(extra)
    }
}

/// FFI-safe saved consultation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConsultation {
    pub consult_id: String,
    pub patient_id: String,
    pub module: String,
    pub subtype: String,
    pub complaint: String,
    pub goals: String,
    pub notes: String,
    pub extra: HashMap<String, String>,
    pub created_at: String,
}

impl From<Consultation> for FfiConsultation {
    fn from(consultation: Consultation) -> Self {
        let request = consultation.request;
        Self {
            consult_id: consultation.consult_id,
            patient_id: consultation.patient_id,
            module: request.module.label().to_string(),
            extra: request.extra.to_map().into_iter().collect(),
            subtype: request.subtype,
            complaint: request.complaint,
            goals: request.goals,
            notes: request.notes,
            created_at: consultation.created_at,
        }
    }
}

/// FFI-safe six-section report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStructuredReport {
    pub summary: String,
    pub assessment: String,
    pub attention_points: String,
    pub next_steps: String,
    pub missing_data: String,
    pub follow_up: String,
}

impl From<StructuredReport> for FfiStructuredReport {
    fn from(report: StructuredReport) -> Self {
        Self {
            summary: report.summary,
            assessment: report.assessment,
            attention_points: report.attention_points,
            next_steps: report.next_steps,
            missing_data: report.missing_data,
            follow_up: report.follow_up,
        }
    }
}

/// FFI-safe saved report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReport {
    pub report_id: String,
    pub consult_id: String,
    pub patient_id: String,
    pub module: String,
    pub subtype: String,
    pub report: FfiStructuredReport,
    pub created_at: String,
}

impl From<ReportRecord> for FfiReport {
    fn from(record: ReportRecord) -> Self {
        Self {
            report_id: record.report_id,
            consult_id: record.consult_id,
            patient_id: record.patient_id,
            module: record.module.label().to_string(),
            subtype: record.subtype,
            report: record.report.into(),
            created_at: record.created_at,
        }
    }
}

/// FFI-safe row counts of one table around a deduplication pass.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDedupCount {
    pub before: u32,
    pub after: u32,
}

impl From<db::DedupCount> for FfiDedupCount {
    fn from(count: db::DedupCount) -> Self {
        Self {
            before: count.before as u32,
            after: count.after as u32,
        }
    }
}

/// FFI-safe deduplication summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDedupSummary {
    pub patients: FfiDedupCount,
    pub consultations: FfiDedupCount,
    pub reports: FfiDedupCount,
}

impl From<DedupSummary> for FfiDedupSummary {
    fn from(summary: DedupSummary) -> Self {
        Self {
            patients: summary.patients.into(),
            consultations: summary.consultations.into(),
            reports: summary.reports.into(),
        }
    }
}
