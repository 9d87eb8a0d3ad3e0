//! Consultation models: the engine request and the persisted record.

use serde::{Deserialize, Serialize};

use super::fingerprint;
use super::module::{ExtraField, ExtraFields, Module};

/// Input of one analysis call.
///
/// The engine treats every text field as optional; blank and missing are the
/// same thing. Required-field checks happen at intake, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationRequest {
    pub module: Module,
    pub subtype: String,
    pub complaint: String,
    pub goals: String,
    pub notes: String,
    pub extra: ExtraFields,
}

impl ConsultationRequest {
    /// Start a request for `module` with no text and an empty field set.
    pub fn new(module: Module, subtype: impl Into<String>) -> Self {
        let extra = ExtraFields::empty_for(&module);
        Self {
            module,
            subtype: subtype.into(),
            complaint: String::new(),
            goals: String::new(),
            notes: String::new(),
            extra,
        }
    }

    pub fn with_complaint(mut self, complaint: impl Into<String>) -> Self {
        self.complaint = complaint.into();
        self
    }

    pub fn with_goals(mut self, goals: impl Into<String>) -> Self {
        self.goals = goals.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Set an extra field. Fields of another module are ignored.
    pub fn with_extra(mut self, field: ExtraField, value: impl Into<String>) -> Self {
        self.extra.set(field, value);
        self
    }

    pub fn with_extras(mut self, extra: ExtraFields) -> Self {
        self.extra = extra;
        self
    }

    /// Copy with complaint, goals and notes trimmed, as stored.
    pub fn trimmed(&self) -> Self {
        Self {
            complaint: self.complaint.trim().to_string(),
            goals: self.goals.trim().to_string(),
            notes: self.notes.trim().to_string(),
            ..self.clone()
        }
    }
}

/// A saved consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Consultation {
    /// Unique consultation ID
    pub consult_id: String,
    /// Patient ID
    pub patient_id: String,
    /// The intake content (text trimmed)
    pub request: ConsultationRequest,
    /// Creation timestamp
    pub created_at: String,
}

impl Consultation {
    /// Record a consultation for `patient_id` at `created_at`.
    pub fn new(patient_id: String, request: &ConsultationRequest, created_at: String) -> Self {
        Self {
            consult_id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            request: request.trimmed(),
            created_at,
        }
    }

    /// Extras as stored: a JSON object of the provided field values.
    pub fn extra_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.request.extra.to_map())
    }

    /// Dedup key over patient, module, subtype, text and extras.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let r = &self.request;
        fingerprint::of(&(
            &self.patient_id,
            r.module.label(),
            &r.subtype,
            &r.complaint,
            &r.goals,
            &r.notes,
            r.extra.provided(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consultation_trims_text() {
        let request = ConsultationRequest::new(Module::Clinical, "Padrão")
            .with_complaint("  cansaço  ")
            .with_goals("emagrecer\n")
            .with_notes("   ");
        let consult = Consultation::new("p-1".into(), &request, "2024-01-01T00:00:00Z".into());

        assert_eq!(consult.request.complaint, "cansaço");
        assert_eq!(consult.request.goals, "emagrecer");
        assert_eq!(consult.request.notes, "");
        assert_eq!(consult.consult_id.len(), 36);
    }

    #[test]
    fn test_extra_json_only_contains_set_fields() {
        let request = ConsultationRequest::new(Module::Sports, "Hipertrofia")
            .with_extra(ExtraField::BodyComp, "18% gordura");
        let consult = Consultation::new("p-1".into(), &request, "t".into());

        assert_eq!(
            consult.extra_json().unwrap(),
            r#"{"body_comp":"18% gordura"}"#
        );
    }

    #[test]
    fn test_with_extra_ignores_other_module_field() {
        let request = ConsultationRequest::new(Module::Sports, "Padrão")
            .with_extra(ExtraField::Labs, "hemograma");
        assert!(request.extra.to_map().is_empty());
    }

    #[test]
    fn test_fingerprint_treats_blank_extra_as_absent() {
        let base = ConsultationRequest::new(Module::Clinical, "Padrão")
            .with_complaint("cansaço")
            .with_goals("emagrecer");
        let omitted = Consultation::new("p-1".into(), &base, "t1".into());
        let blank = Consultation::new(
            "p-1".into(),
            &base.clone().with_extra(ExtraField::Labs, "  "),
            "t2".into(),
        );
        let padded = Consultation::new(
            "p-1".into(),
            &base.clone().with_extra(ExtraField::Meds, " metformina "),
            "t3".into(),
        );
        let plain = Consultation::new(
            "p-1".into(),
            &base.with_extra(ExtraField::Meds, "metformina"),
            "t4".into(),
        );

        assert_eq!(omitted.fingerprint().unwrap(), blank.fingerprint().unwrap());
        assert_eq!(padded.fingerprint().unwrap(), plain.fingerprint().unwrap());
        assert_ne!(omitted.fingerprint().unwrap(), plain.fingerprint().unwrap());
    }

    #[test]
    fn test_fingerprint_stable_across_ids() {
        let request = ConsultationRequest::new(Module::Clinical, "Padrão").with_complaint("azia");
        let a = Consultation::new("p-1".into(), &request, "t1".into());
        let b = Consultation::new("p-1".into(), &request, "t2".into());
        assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());

        let c = Consultation::new("p-2".into(), &request, "t1".into());
        assert_ne!(a.fingerprint().unwrap(), c.fingerprint().unwrap());
    }
}
