//! Paginated plain-text report document.
//!
//! Layout: title, header lines, a rule, the six titled sections word-wrapped to
//! [`BODY_WIDTH`], then the disclaimer wrapped to [`DISCLAIMER_WIDTH`]. Pages
//! are separated by a form feed.

use crate::models::ReportRecord;

pub const DOCUMENT_TITLE: &str = "NutriApp - Relatório do Atendimento";
pub const DISCLAIMER: &str =
    "Observação: este relatório é gerado como apoio e não substitui o julgamento profissional.";
pub const BODY_WIDTH: usize = 105;
pub const DISCLAIMER_WIDTH: usize = 110;
pub const PAGE_BREAK: char = '\u{000C}';

/// Word-wrap `text` to lines of at most `max_chars` characters.
///
/// Whitespace runs (newlines included) collapse to single spaces. A word
/// longer than `max_chars` gets a line of its own. Empty input yields one
/// empty line.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut count = 0usize;

    for word in text.split_whitespace() {
        let len = word.chars().count();
        let add = if count > 0 { len + 1 } else { len };
        if count + add <= max_chars {
            if count > 0 {
                line.push(' ');
            }
            line.push_str(word);
            count += add;
        } else {
            if count > 0 {
                lines.push(std::mem::take(&mut line));
            }
            line.push_str(word);
            count = len;
        }
    }

    if count > 0 || lines.is_empty() {
        lines.push(line);
    }
    lines
}

/// Document inputs beyond the report record itself.
#[derive(Debug, Clone, Default)]
pub struct DocumentOptions {
    /// Patient name for the header, when known
    pub patient_name: Option<String>,
    /// Lines per page; `0` disables pagination
    pub page_lines: usize,
}

/// Render a saved report as a paginated text document.
pub fn render_document(record: &ReportRecord, options: &DocumentOptions) -> String {
    let mut lines: Vec<String> = vec![
        DOCUMENT_TITLE.to_string(),
        String::new(),
        format!("Módulo: {} ({})", record.module, record.subtype),
        match options.patient_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                format!("Paciente: {} (ID {})", name, record.patient_id)
            }
            _ => format!("Paciente ID: {}", record.patient_id),
        },
        format!("Consulta ID: {}", record.consult_id),
        format!("Data/Hora: {}", record.created_at),
        "-".repeat(BODY_WIDTH),
        String::new(),
    ];

    for (section, body) in record.report.sections() {
        lines.push(section.title().to_string());
        // each source line wraps on its own so bullets keep their line
        for source_line in body.lines() {
            lines.extend(wrap_text(source_line, BODY_WIDTH));
        }
        lines.push(String::new());
    }

    lines.extend(wrap_text(DISCLAIMER, DISCLAIMER_WIDTH));
    paginate(&lines, options.page_lines)
}

fn paginate(lines: &[String], page_lines: usize) -> String {
    if page_lines == 0 {
        return lines.join("\n");
    }
    lines
        .chunks(page_lines)
        .map(|page| page.join("\n"))
        .collect::<Vec<_>>()
        .join(&format!("\n{PAGE_BREAK}\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ReportEngine;
    use crate::models::{ConsultationRequest, ExtraField, Module};

    fn record() -> ReportRecord {
        let request = ConsultationRequest::new(Module::Clinical, "Gastrointestinal")
            .with_complaint("azia e estufamento")
            .with_goals("melhorar digestão")
            .with_extra(ExtraField::Meds, "omeprazol");
        ReportRecord::new(
            "c-1".into(),
            "p-1".into(),
            Module::Clinical,
            "Gastrointestinal".into(),
            ReportEngine::new().synthesize(&request),
            "2024-05-01T09:30:00Z".into(),
        )
    }

    #[test]
    fn test_wrap_text_basic() {
        assert_eq!(wrap_text("a b c", 3), vec!["a b", "c"]);
        assert_eq!(wrap_text("", 10), vec![""]);
        assert_eq!(wrap_text("  \n ", 10), vec![""]);
    }

    #[test]
    fn test_wrap_text_long_word() {
        assert_eq!(
            wrap_text("curto palavraenorme fim", 6),
            vec!["curto", "palavraenorme", "fim"]
        );
    }

    #[test]
    fn test_wrap_counts_chars_not_bytes() {
        let lines = wrap_text("ação ação", 9);
        assert_eq!(lines, vec!["ação ação"]);
    }

    #[test]
    fn test_wrapped_lines_fit_width() {
        let text = "palavra ".repeat(100);
        for line in wrap_text(&text, BODY_WIDTH) {
            assert!(line.chars().count() <= BODY_WIDTH);
        }
    }

    #[test]
    fn test_document_header_with_patient_name() {
        let doc = render_document(
            &record(),
            &DocumentOptions {
                patient_name: Some("Ana".into()),
                page_lines: 0,
            },
        );
        assert!(doc.starts_with(DOCUMENT_TITLE));
        assert!(doc.contains("Paciente: Ana (ID p-1)"));
        assert!(doc.contains("Consulta ID: c-1"));
        assert!(doc.contains("Pontos de atenção"));
        assert!(doc.contains("Medicamentos/suplementos: omeprazol."));
        assert!(doc.trim_end().ends_with("julgamento profissional."));
        assert!(!doc.contains(PAGE_BREAK));
    }

    #[test]
    fn test_document_header_without_patient_name() {
        let doc = render_document(&record(), &DocumentOptions::default());
        assert!(doc.contains("Paciente ID: p-1"));
    }

    #[test]
    fn test_pagination() {
        let doc = render_document(
            &record(),
            &DocumentOptions {
                patient_name: None,
                page_lines: 10,
            },
        );
        let pages: Vec<_> = doc.split(PAGE_BREAK).collect();
        assert!(pages.len() > 1);
        for page in pages {
            assert!(page.trim_matches('\n').lines().count() <= 10);
        }
    }
}
