//! Duplicate record housekeeping.
//!
//! Every record carries a content fingerprint computed at insert time. Records
//! sharing a fingerprint are copies; the earliest (by `created_at`, then insert
//! order) is kept.

use serde::{Deserialize, Serialize};

use super::{Database, DbResult};

/// Row counts of one table before and after deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupCount {
    pub before: usize,
    pub after: usize,
}

impl DedupCount {
    pub fn removed(&self) -> usize {
        self.before - self.after
    }
}

/// Result of a deduplication pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupSummary {
    pub patients: DedupCount,
    pub consultations: DedupCount,
    pub reports: DedupCount,
}

impl Database {
    /// Remove later copies of duplicated patients, consultations and reports.
    pub fn deduplicate(&self) -> DbResult<DedupSummary> {
        let summary = self.atomically(|db| {
            Ok(DedupSummary {
                patients: db.dedup_table("patients")?,
                consultations: db.dedup_table("consultations")?,
                reports: db.dedup_table("reports")?,
            })
        })?;
        tracing::info!(
            patients_removed = summary.patients.removed(),
            consultations_removed = summary.consultations.removed(),
            reports_removed = summary.reports.removed(),
            "deduplication complete"
        );
        Ok(summary)
    }

    fn dedup_table(&self, table: &str) -> DbResult<DedupCount> {
        let before: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        let removed = self.conn.execute(
            &format!(
                r#"
                DELETE FROM {table} WHERE rowid IN (
                    SELECT rid FROM (
                        SELECT rowid AS rid,
                               ROW_NUMBER() OVER (
                                   PARTITION BY fingerprint
                                   ORDER BY created_at, rowid
                               ) AS rn
                        FROM {table}
                    )
                    WHERE rn > 1
                )
                "#
            ),
            [],
        )?;
        let before = before as usize;
        Ok(DedupCount {
            before,
            after: before - removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Consultation, ConsultationRequest, Module, Patient};

    #[test]
    fn test_empty_store() {
        let db = Database::open_in_memory().unwrap();
        let summary = db.deduplicate().unwrap();
        assert_eq!(summary.patients, DedupCount { before: 0, after: 0 });
        assert_eq!(summary.reports.removed(), 0);
    }

    #[test]
    fn test_keeps_earliest_patient() {
        let db = Database::open_in_memory().unwrap();

        let mut late = Patient::new("Ana".into(), 34, None);
        late.created_at = "2024-02-01T00:00:00Z".into();
        let mut early = Patient::new("Ana".into(), 34, None);
        early.created_at = "2024-01-01T00:00:00Z".into();
        let other = Patient::new("Ana".into(), 35, None);

        db.insert_patient(&late).unwrap();
        db.insert_patient(&early).unwrap();
        db.insert_patient(&other).unwrap();

        let summary = db.deduplicate().unwrap();
        assert_eq!(summary.patients, DedupCount { before: 3, after: 2 });

        assert!(db.get_patient(&early.patient_id).unwrap().is_some());
        assert!(db.get_patient(&late.patient_id).unwrap().is_none());
        assert!(db.get_patient(&other.patient_id).unwrap().is_some());
    }

    #[test]
    fn test_consultations_with_different_extras_are_distinct() {
        let db = Database::open_in_memory().unwrap();
        let base = ConsultationRequest::new(Module::Clinical, "Padrão").with_complaint("azia");

        for request in [
            base.clone(),
            base.clone(),
            base.clone()
                .with_extra(crate::models::ExtraField::Labs, "hemograma"),
        ] {
            let consult = Consultation::new("p-1".into(), &request, "t".into());
            db.insert_consultation(&consult).unwrap();
        }

        let summary = db.deduplicate().unwrap();
        assert_eq!(
            summary.consultations,
            DedupCount { before: 3, after: 2 }
        );

        // second pass is a no-op
        let again = db.deduplicate().unwrap();
        assert_eq!(again.consultations.removed(), 0);
    }
}
