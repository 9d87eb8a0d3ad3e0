//! Intake workflow: register patients, save consultations, generate reports.
//!
//! Flow: Module → Patient → Consultation form → Validate → Save → Synthesize
//! → Save report
//!
//! The engine accepts anything; this layer is where the form's required
//! fields (complaint and goals) are enforced.

use thiserror::Error;

use crate::db::{Database, DbError};
use crate::engine::ReportEngine;
use crate::models::{
    timestamp_now, Consultation, ConsultationRequest, Patient, ReportRecord, UnknownExtraField,
    MAX_PATIENT_AGE,
};

/// Intake errors.
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Required field is blank: {0}")]
    MissingField(&'static str),

    #[error("Age must be between 0 and {MAX_PATIENT_AGE}, got {0}")]
    InvalidAge(u32),

    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error(transparent)]
    UnknownExtraField(#[from] UnknownExtraField),
}

pub type IntakeResult<T> = Result<T, IntakeError>;

/// A saved consultation and the report generated from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub consultation: Consultation,
    pub report: ReportRecord,
}

/// Reject requests whose complaint or goals are blank.
pub fn validate_request(request: &ConsultationRequest) -> IntakeResult<()> {
    if request.complaint.trim().is_empty() {
        return Err(IntakeError::MissingField("complaint"));
    }
    if request.goals.trim().is_empty() {
        return Err(IntakeError::MissingField("goals"));
    }
    Ok(())
}

/// Intake service over a record store and a report engine.
pub struct IntakeService<'a> {
    db: &'a Database,
    engine: &'a ReportEngine,
}

impl<'a> IntakeService<'a> {
    /// Create a service using the shared default engine.
    pub fn new(db: &'a Database) -> Self {
        Self::with_engine(db, ReportEngine::shared())
    }

    pub fn with_engine(db: &'a Database, engine: &'a ReportEngine) -> Self {
        Self { db, engine }
    }

    /// Register a patient. Name must be non-blank; age within 0..=120.
    pub fn register_patient(
        &self,
        name: &str,
        age: u32,
        sex: Option<String>,
    ) -> IntakeResult<Patient> {
        if name.trim().is_empty() {
            tracing::warn!("patient registration rejected: blank name");
            return Err(IntakeError::MissingField("name"));
        }
        let age = u8::try_from(age)
            .ok()
            .filter(|age| *age <= MAX_PATIENT_AGE)
            .ok_or(IntakeError::InvalidAge(age))?;

        let patient = Patient::new(name.to_string(), age, sex);
        self.db.insert_patient(&patient)?;
        Ok(patient)
    }

    /// Validate and save a consultation without generating a report.
    pub fn save_consultation(
        &self,
        patient_id: &str,
        request: &ConsultationRequest,
    ) -> IntakeResult<Consultation> {
        self.check_intake(patient_id, request)?;
        let consultation = Consultation::new(patient_id.to_string(), request, timestamp_now());
        self.db.insert_consultation(&consultation)?;
        Ok(consultation)
    }

    /// Validate and save a consultation, then synthesize and save its report
    /// under the same timestamp.
    pub fn analyze_consultation(
        &self,
        patient_id: &str,
        request: &ConsultationRequest,
    ) -> IntakeResult<Analysis> {
        self.check_intake(patient_id, request)?;

        let now = timestamp_now();
        let consultation = Consultation::new(patient_id.to_string(), request, now.clone());

        let report = self.engine.synthesize(&consultation.request);
        let record = ReportRecord::new(
            consultation.consult_id.clone(),
            patient_id.to_string(),
            request.module.clone(),
            request.subtype.clone(),
            report,
            now,
        );

        self.db.atomically(|db| {
            db.insert_consultation(&consultation)?;
            db.insert_report(&record)
        })?;

        Ok(Analysis {
            consultation,
            report: record,
        })
    }

    /// Consultations of a patient, newest first.
    pub fn patient_history(&self, patient_id: &str) -> IntakeResult<Vec<Consultation>> {
        Ok(self.db.list_consultations_for_patient(patient_id)?)
    }

    fn check_intake(&self, patient_id: &str, request: &ConsultationRequest) -> IntakeResult<()> {
        if let Err(err) = validate_request(request) {
            tracing::warn!(%patient_id, error = %err, "consultation rejected");
            return Err(err);
        }
        if self.db.get_patient(patient_id)?.is_none() {
            return Err(IntakeError::PatientNotFound(patient_id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtraField, Module, ReportSection};

    fn setup() -> (Database, Patient) {
        let db = Database::open_in_memory().unwrap();
        let patient = IntakeService::new(&db)
            .register_patient("Ana", 34, Some("Feminino".into()))
            .unwrap();
        (db, patient)
    }

    #[test]
    fn test_register_patient_validation() {
        let db = Database::open_in_memory().unwrap();
        let service = IntakeService::new(&db);

        assert!(matches!(
            service.register_patient("  ", 30, None),
            Err(IntakeError::MissingField("name"))
        ));
        assert!(matches!(
            service.register_patient("Ana", 121, None),
            Err(IntakeError::InvalidAge(121))
        ));
        assert!(service.register_patient("Ana", 120, None).is_ok());
        assert!(service.register_patient("Bebê", 0, None).is_ok());
    }

    #[test]
    fn test_blank_complaint_or_goals_rejected() {
        let (db, patient) = setup();
        let service = IntakeService::new(&db);

        let request = ConsultationRequest::new(Module::Clinical, "Padrão").with_goals("x");
        assert!(matches!(
            service.analyze_consultation(&patient.patient_id, &request),
            Err(IntakeError::MissingField("complaint"))
        ));

        let request = ConsultationRequest::new(Module::Clinical, "Padrão")
            .with_complaint("x")
            .with_goals("   ");
        assert!(matches!(
            service.save_consultation(&patient.patient_id, &request),
            Err(IntakeError::MissingField("goals"))
        ));
        assert_eq!(db.count_consultations().unwrap(), 0);
    }

    #[test]
    fn test_unknown_patient_rejected() {
        let (db, _) = setup();
        let request = ConsultationRequest::new(Module::Sports, "Padrão")
            .with_complaint("x")
            .with_goals("y");
        let err = IntakeService::new(&db)
            .save_consultation("ghost", &request)
            .unwrap_err();
        assert!(matches!(err, IntakeError::PatientNotFound(_)));
    }

    #[test]
    fn test_analyze_persists_consultation_and_report() {
        let (db, patient) = setup();
        let request = ConsultationRequest::new(Module::Sports, "Hipertrofia")
            .with_complaint("  fadiga pós-treino ")
            .with_goals("ganho de massa")
            .with_extra(ExtraField::TrainingRoutine, "musculação 5x/semana");

        let analysis = IntakeService::new(&db)
            .analyze_consultation(&patient.patient_id, &request)
            .unwrap();

        assert_eq!(analysis.consultation.request.complaint, "fadiga pós-treino");
        assert_eq!(analysis.report.consult_id, analysis.consultation.consult_id);
        assert_eq!(analysis.report.created_at, analysis.consultation.created_at);
        assert!(analysis
            .report
            .report
            .bullets(ReportSection::AttentionPoints)
            .iter()
            .any(|b| b.contains("musculação 5x/semana")));

        let stored = db
            .get_report_for_consultation(&analysis.consultation.consult_id)
            .unwrap()
            .unwrap();
        assert_eq!(stored, analysis.report);
        assert_eq!(
            IntakeService::new(&db)
                .patient_history(&patient.patient_id)
                .unwrap()
                .len(),
            1
        );
    }
}
