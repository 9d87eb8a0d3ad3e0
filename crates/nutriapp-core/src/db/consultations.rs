//! Consultation database operations.

use std::collections::BTreeMap;

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Consultation, ConsultationRequest, ExtraFields, Module};

const CONSULTATION_COLUMNS: &str =
    "consult_id, patient_id, module, subtype, complaint, goals, notes, extra_json, created_at";

/// Raw row before the extras JSON is decoded.
struct ConsultationRow {
    consult_id: String,
    patient_id: String,
    module: String,
    subtype: String,
    complaint: String,
    goals: String,
    notes: String,
    extra_json: String,
    created_at: String,
}

fn consultation_row(row: &Row<'_>) -> rusqlite::Result<ConsultationRow> {
    Ok(ConsultationRow {
        consult_id: row.get(0)?,
        patient_id: row.get(1)?,
        module: row.get(2)?,
        subtype: row.get(3)?,
        complaint: row.get(4)?,
        goals: row.get(5)?,
        notes: row.get(6)?,
        extra_json: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl TryFrom<ConsultationRow> for Consultation {
    type Error = DbError;

    fn try_from(row: ConsultationRow) -> Result<Self, Self::Error> {
        let module = Module::from(row.module);
        let extra_map: BTreeMap<String, String> = serde_json::from_str(&row.extra_json)?;
        let extra = ExtraFields::from_pairs(&module, extra_map);

        Ok(Consultation {
            consult_id: row.consult_id,
            patient_id: row.patient_id,
            request: ConsultationRequest {
                module,
                subtype: row.subtype,
                complaint: row.complaint,
                goals: row.goals,
                notes: row.notes,
                extra,
            },
            created_at: row.created_at,
        })
    }
}

impl Database {
    /// Insert a new consultation.
    pub fn insert_consultation(&self, consultation: &Consultation) -> DbResult<()> {
        let extra_json = consultation.extra_json()?;
        let fingerprint = consultation.fingerprint()?;
        let request = &consultation.request;

        self.conn.execute(
            r#"
            INSERT INTO consultations (
                consult_id, patient_id, module, subtype, complaint, goals,
                notes, extra_json, fingerprint, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                consultation.consult_id,
                consultation.patient_id,
                request.module.label(),
                request.subtype,
                request.complaint,
                request.goals,
                request.notes,
                extra_json,
                fingerprint,
                consultation.created_at,
            ],
        )?;
        tracing::info!(
            consult_id = %consultation.consult_id,
            patient_id = %consultation.patient_id,
            module = %request.module,
            "consultation saved"
        );
        Ok(())
    }

    /// Get a consultation by ID.
    pub fn get_consultation(&self, consult_id: &str) -> DbResult<Option<Consultation>> {
        self.conn
            .query_row(
                &format!("SELECT {CONSULTATION_COLUMNS} FROM consultations WHERE consult_id = ?"),
                [consult_id],
                consultation_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Consultations of a patient, newest first.
    pub fn list_consultations_for_patient(&self, patient_id: &str) -> DbResult<Vec<Consultation>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {CONSULTATION_COLUMNS}
            FROM consultations
            WHERE patient_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#
        ))?;

        let rows = stmt.query_map([patient_id], consultation_row)?;

        let mut consultations = Vec::new();
        for row in rows {
            consultations.push(row?.try_into()?);
        }
        Ok(consultations)
    }

    /// Count consultations.
    pub fn count_consultations(&self) -> DbResult<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM consultations", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtraField, Patient};

    fn setup_db_with_patient() -> (Database, Patient) {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Ana".into(), 34, None);
        db.insert_patient(&patient).unwrap();
        (db, patient)
    }

    #[test]
    fn test_insert_and_get_with_extras() {
        let (db, patient) = setup_db_with_patient();

        let request = ConsultationRequest::new(Module::MaternalChild, "Materno infantil")
            .with_complaint("recusa alimentar")
            .with_goals("introdução alimentar")
            .with_extra(ExtraField::ChildAge, "8 meses")
            .with_extra(ExtraField::Allergy, "");
        let consult = Consultation::new(
            patient.patient_id.clone(),
            &request,
            "2024-03-01T10:00:00Z".into(),
        );
        db.insert_consultation(&consult).unwrap();

        let retrieved = db.get_consultation(&consult.consult_id).unwrap().unwrap();
        assert_eq!(retrieved, consult);
        assert_eq!(
            retrieved.request.extra.get(ExtraField::ChildAge),
            Some("8 meses")
        );
    }

    #[test]
    fn test_other_module_roundtrip() {
        let (db, patient) = setup_db_with_patient();
        let request = ConsultationRequest::new(Module::parse("Geriatria"), "Padrão");
        let consult = Consultation::new(patient.patient_id.clone(), &request, "t".into());
        db.insert_consultation(&consult).unwrap();

        let retrieved = db.get_consultation(&consult.consult_id).unwrap().unwrap();
        assert_eq!(retrieved.request.module, Module::Other("Geriatria".into()));
    }

    #[test]
    fn test_other_module_with_alias_text_keeps_variant() {
        let (db, patient) = setup_db_with_patient();
        let request = ConsultationRequest::new(Module::Other("sports".into()), "Padrão");
        let consult = Consultation::new(patient.patient_id.clone(), &request, "t".into());
        db.insert_consultation(&consult).unwrap();

        let retrieved = db.get_consultation(&consult.consult_id).unwrap().unwrap();
        assert_eq!(retrieved.request.module, Module::Other("sports".into()));
    }

    #[test]
    fn test_history_newest_first() {
        let (db, patient) = setup_db_with_patient();

        for (i, ts) in ["2024-01-01T00:00:00Z", "2024-03-01T00:00:00Z", "2024-02-01T00:00:00Z"]
            .iter()
            .enumerate()
        {
            let request = ConsultationRequest::new(Module::Clinical, "Padrão")
                .with_complaint(format!("queixa {i}"));
            let consult = Consultation::new(patient.patient_id.clone(), &request, ts.to_string());
            db.insert_consultation(&consult).unwrap();
        }

        let history = db
            .list_consultations_for_patient(&patient.patient_id)
            .unwrap();
        let stamps: Vec<_> = history.iter().map(|c| c.created_at.as_str()).collect();
        assert_eq!(
            stamps,
            vec![
                "2024-03-01T00:00:00Z",
                "2024-02-01T00:00:00Z",
                "2024-01-01T00:00:00Z"
            ]
        );
        assert!(db.list_consultations_for_patient("other").unwrap().is_empty());
    }
}
