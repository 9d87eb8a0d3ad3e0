//! Report database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Module, ReportRecord, StructuredReport};

const REPORT_COLUMNS: &str = "report_id, consult_id, patient_id, module, subtype, summary, \
     assessment, attention_points, next_steps, missing_data, follow_up, created_at";

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<ReportRecord> {
    let module: String = row.get(3)?;
    Ok(ReportRecord {
        report_id: row.get(0)?,
        consult_id: row.get(1)?,
        patient_id: row.get(2)?,
        module: Module::from(module),
        subtype: row.get(4)?,
        report: StructuredReport {
            summary: row.get(5)?,
            assessment: row.get(6)?,
            attention_points: row.get(7)?,
            next_steps: row.get(8)?,
            missing_data: row.get(9)?,
            follow_up: row.get(10)?,
        },
        created_at: row.get(11)?,
    })
}

impl Database {
    /// Insert a new report.
    pub fn insert_report(&self, record: &ReportRecord) -> DbResult<()> {
        let fingerprint = record.fingerprint()?;
        let report = &record.report;

        self.conn.execute(
            r#"
            INSERT INTO reports (
                report_id, consult_id, patient_id, module, subtype,
                summary, assessment, attention_points, next_steps,
                missing_data, follow_up, fingerprint, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                record.report_id,
                record.consult_id,
                record.patient_id,
                record.module.label(),
                record.subtype,
                report.summary,
                report.assessment,
                report.attention_points,
                report.next_steps,
                report.missing_data,
                report.follow_up,
                fingerprint,
                record.created_at,
            ],
        )?;
        tracing::info!(
            report_id = %record.report_id,
            consult_id = %record.consult_id,
            "report saved"
        );
        Ok(())
    }

    /// Get a report by ID.
    pub fn get_report(&self, report_id: &str) -> DbResult<Option<ReportRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {REPORT_COLUMNS} FROM reports WHERE report_id = ?"),
                [report_id],
                report_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Latest report generated from a consultation.
    pub fn get_report_for_consultation(&self, consult_id: &str) -> DbResult<Option<ReportRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {REPORT_COLUMNS} FROM reports WHERE consult_id = ? \
                     ORDER BY created_at DESC, rowid DESC LIMIT 1"
                ),
                [consult_id],
                report_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// All reports, oldest first.
    pub fn list_reports(&self) -> DbResult<Vec<ReportRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports ORDER BY created_at, rowid"
        ))?;
        let rows = stmt.query_map([], report_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Reports of a patient, newest first.
    pub fn list_reports_for_patient(&self, patient_id: &str) -> DbResult<Vec<ReportRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE patient_id = ? \
             ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt.query_map([patient_id], report_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Count reports.
    pub fn count_reports(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ReportEngine;
    use crate::models::ConsultationRequest;

    fn make_record(consult_id: &str, created_at: &str) -> ReportRecord {
        let request = ConsultationRequest::new(Module::Sports, "Hipertrofia")
            .with_complaint("fadiga no treino")
            .with_goals("ganho de massa");
        let report = ReportEngine::new().synthesize(&request);
        ReportRecord::new(
            consult_id.into(),
            "p-1".into(),
            Module::Sports,
            "Hipertrofia".into(),
            report,
            created_at.into(),
        )
    }

    #[test]
    fn test_insert_and_get() {
        let db = Database::open_in_memory().unwrap();
        let record = make_record("c-1", "2024-01-01T00:00:00Z");
        db.insert_report(&record).unwrap();

        let retrieved = db.get_report(&record.report_id).unwrap().unwrap();
        assert_eq!(retrieved, record);
    }

    #[test]
    fn test_get_for_consultation() {
        let db = Database::open_in_memory().unwrap();
        let record = make_record("c-1", "2024-01-01T00:00:00Z");
        db.insert_report(&record).unwrap();
        db.insert_report(&make_record("c-2", "2024-01-02T00:00:00Z"))
            .unwrap();

        let found = db.get_report_for_consultation("c-1").unwrap().unwrap();
        assert_eq!(found.report_id, record.report_id);
        assert!(db.get_report_for_consultation("c-9").unwrap().is_none());
    }

    #[test]
    fn test_list_reports() {
        let db = Database::open_in_memory().unwrap();
        db.insert_report(&make_record("c-2", "2024-01-02T00:00:00Z"))
            .unwrap();
        db.insert_report(&make_record("c-1", "2024-01-01T00:00:00Z"))
            .unwrap();

        let all = db.list_reports().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].consult_id, "c-1");

        let for_patient = db.list_reports_for_patient("p-1").unwrap();
        assert_eq!(for_patient[0].consult_id, "c-2");
        assert_eq!(db.count_reports().unwrap(), 2);
    }
}
