//! Report models.

use serde::{Deserialize, Serialize};

use super::fingerprint;
use super::module::Module;

/// The six sections of a report, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportSection {
    Summary,
    Assessment,
    AttentionPoints,
    NextSteps,
    MissingData,
    FollowUp,
}

impl ReportSection {
    pub const ALL: [ReportSection; 6] = [
        ReportSection::Summary,
        ReportSection::Assessment,
        ReportSection::AttentionPoints,
        ReportSection::NextSteps,
        ReportSection::MissingData,
        ReportSection::FollowUp,
    ];

    /// Heading used by the presentation layer.
    pub const fn title(self) -> &'static str {
        match self {
            ReportSection::Summary => "Síntese",
            ReportSection::Assessment => "Avaliação inicial",
            ReportSection::AttentionPoints => "Pontos de atenção",
            ReportSection::NextSteps => "Próximos passos sugeridos",
            ReportSection::MissingData => "Dados faltantes",
            ReportSection::FollowUp => "Acompanhamento",
        }
    }

    /// Column / field name.
    pub const fn key(self) -> &'static str {
        match self {
            ReportSection::Summary => "summary",
            ReportSection::Assessment => "assessment",
            ReportSection::AttentionPoints => "attention_points",
            ReportSection::NextSteps => "next_steps",
            ReportSection::MissingData => "missing_data",
            ReportSection::FollowUp => "follow_up",
        }
    }
}

/// Engine output: six non-empty text sections.
///
/// Every section except `summary` is a list of `"- "` bullets separated by
/// newlines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredReport {
    pub summary: String,
    pub assessment: String,
    pub attention_points: String,
    pub next_steps: String,
    pub missing_data: String,
    pub follow_up: String,
}

impl StructuredReport {
    /// Text of one section.
    pub fn section(&self, section: ReportSection) -> &str {
        match section {
            ReportSection::Summary => &self.summary,
            ReportSection::Assessment => &self.assessment,
            ReportSection::AttentionPoints => &self.attention_points,
            ReportSection::NextSteps => &self.next_steps,
            ReportSection::MissingData => &self.missing_data,
            ReportSection::FollowUp => &self.follow_up,
        }
    }

    /// Sections with their headings, in display order.
    pub fn sections(&self) -> impl Iterator<Item = (ReportSection, &str)> {
        ReportSection::ALL
            .into_iter()
            .map(move |section| (section, self.section(section)))
    }

    /// Bullet lines of a section with the `"- "` prefix removed.
    pub fn bullets(&self, section: ReportSection) -> Vec<&str> {
        self.section(section)
            .lines()
            .filter_map(|line| line.strip_prefix("- "))
            .collect()
    }
}

/// A saved report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRecord {
    /// Unique report ID
    pub report_id: String,
    /// Consultation the report was generated from
    pub consult_id: String,
    /// Patient ID
    pub patient_id: String,
    /// Module of the consultation
    pub module: Module,
    /// Subtype of the consultation
    pub subtype: String,
    /// Report content
    #[serde(flatten)]
    pub report: StructuredReport,
    /// Creation timestamp (same as the consultation's)
    pub created_at: String,
}

impl ReportRecord {
    pub fn new(
        consult_id: String,
        patient_id: String,
        module: Module,
        subtype: String,
        report: StructuredReport,
        created_at: String,
    ) -> Self {
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            consult_id,
            patient_id,
            module,
            subtype,
            report,
            created_at,
        }
    }

    /// Dedup key over patient, module, subtype and the six sections.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        fingerprint::of(&(
            &self.patient_id,
            self.module.label(),
            &self.subtype,
            &self.report,
        ))
    }
}
