//! Section accumulation and text rendering.

use super::rules::BulletSection;
use crate::models::{ConsultationRequest, StructuredReport};

/// Placeholder printed when no notes were given.
pub const NOTES_PLACEHOLDER: &str = "Não informado";

/// Bullet prefix of every non-summary section line.
pub const BULLET_PREFIX: &str = "- ";

/// Ordered bullet lists, one per section.
#[derive(Debug, Default, Clone)]
pub struct SectionAccumulator {
    sections: [Vec<String>; 5],
}

impl SectionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bullet to the end of `section`.
    pub fn push(&mut self, section: BulletSection, bullet: String) {
        self.sections[section.index()].push(bullet);
    }

    pub fn lines(&self, section: BulletSection) -> &[String] {
        &self.sections[section.index()]
    }

    /// Render a section, substituting its fallback bullet when empty.
    pub fn render(&self, section: BulletSection) -> String {
        let lines = self.lines(section);
        if lines.is_empty() {
            return render_bullets([section.fallback()]);
        }
        render_bullets(lines.iter().map(String::as_str))
    }

    /// Compose the final report.
    pub fn finish(&self, request: &ConsultationRequest) -> StructuredReport {
        StructuredReport {
            summary: render_summary(request),
            assessment: self.render(BulletSection::Assessment),
            attention_points: self.render(BulletSection::AttentionPoints),
            next_steps: self.render(BulletSection::NextSteps),
            missing_data: self.render(BulletSection::MissingData),
            follow_up: self.render(BulletSection::FollowUp),
        }
    }
}

/// `"- a\n- b"`.
pub fn render_bullets<'a>(lines: impl IntoIterator<Item = &'a str>) -> String {
    lines
        .into_iter()
        .map(|line| format!("{BULLET_PREFIX}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Four-line header block.
pub fn render_summary(request: &ConsultationRequest) -> String {
    let notes = request.notes.trim();
    format!(
        "Módulo: {} ({})\nQueixa principal: {}\nObjetivos: {}\nObservações: {}",
        request.module.label(),
        request.subtype,
        request.complaint.trim(),
        request.goals.trim(),
        if notes.is_empty() {
            NOTES_PLACEHOLDER
        } else {
            notes
        }
    )
}
