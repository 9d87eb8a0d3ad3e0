//! Bulk report export (CSV and JSON).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::document::{render_document, DocumentOptions};
use crate::db::{Database, DbError};
use crate::models::ReportRecord;

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Report not found: {0}")]
    NotFound(String),
}

pub type ExportResult<T> = Result<T, ExportError>;

const CSV_HEADER: &str = "report_id,consult_id,patient_id,module,subtype,summary,assessment,\
attention_points,next_steps,missing_data,follow_up,created_at";

/// A batch of exported reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportBatch {
    /// Export timestamp
    pub exported_at: String,
    /// Exported reports, oldest first
    pub reports: Vec<ReportRecord>,
}

impl ReportBatch {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format. Multi-line sections are quoted.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str(CSV_HEADER);
        csv.push('\n');

        for record in &self.reports {
            let report = &record.report;
            let fields = [
                record.report_id.as_str(),
                record.consult_id.as_str(),
                record.patient_id.as_str(),
                record.module.label(),
                record.subtype.as_str(),
                report.summary.as_str(),
                report.assessment.as_str(),
                report.attention_points.as_str(),
                report.next_steps.as_str(),
                report.missing_data.as_str(),
                report.follow_up.as_str(),
                record.created_at.as_str(),
            ];
            let row: Vec<String> = fields.iter().map(|f| escape_csv(f)).collect();
            csv.push_str(&row.join(","));
            csv.push('\n');
        }

        csv
    }
}

/// Report exporter.
pub struct ReportExporter<'a> {
    db: &'a Database,
}

impl<'a> ReportExporter<'a> {
    /// Create a new report exporter.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Export every stored report.
    pub fn export_all(&self) -> ExportResult<ReportBatch> {
        let reports = self.db.list_reports()?;
        tracing::info!(count = reports.len(), "reports exported");
        Ok(ReportBatch {
            exported_at: crate::models::timestamp_now(),
            reports,
        })
    }

    /// Render one stored report as a text document, with the patient's name
    /// in the header when the patient is still on record.
    pub fn render_document(&self, report_id: &str, page_lines: usize) -> ExportResult<String> {
        let record = self
            .db
            .get_report(report_id)?
            .ok_or_else(|| ExportError::NotFound(report_id.to_string()))?;
        let patient_name = self.db.get_patient(&record.patient_id)?.map(|p| p.name);

        Ok(render_document(
            &record,
            &DocumentOptions {
                patient_name,
                page_lines,
            },
        ))
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
