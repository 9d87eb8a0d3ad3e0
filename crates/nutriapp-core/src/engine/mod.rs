//! Report synthesis engine.
//!
//! Pipeline: Request → Rule evaluation (in table order) → Section accumulation
//! → Fallback substitution → StructuredReport
//!
//! Synthesis is total and pure: any request, including one with every field
//! blank, yields six non-empty sections, and equal requests yield equal
//! reports.

mod render;
mod rules;

pub use render::*;
pub use rules::*;

use std::sync::OnceLock;

use crate::models::{ConsultationRequest, ExtraFields, Module, StructuredReport};

/// Evaluates an ordered rule table against consultation requests.
#[derive(Debug, Clone)]
pub struct ReportEngine {
    rules: Vec<Rule>,
}

impl Default for ReportEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEngine {
    /// Create an engine with the default rule table.
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    /// Create an engine with a custom rule table.
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Shared engine holding the default rule table.
    pub fn shared() -> &'static ReportEngine {
        static ENGINE: OnceLock<ReportEngine> = OnceLock::new();
        ENGINE.get_or_init(ReportEngine::new)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Append a rule after the existing ones.
    pub fn push_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Ids of the rules that fire for `request`, in evaluation order.
    pub fn fired_rules(&self, request: &ConsultationRequest) -> Vec<&'static str> {
        self.rules
            .iter()
            .filter(|rule| rule.fires(request))
            .map(|rule| rule.id)
            .collect()
    }

    /// Build the report for `request`.
    pub fn synthesize(&self, request: &ConsultationRequest) -> StructuredReport {
        let mut acc = SectionAccumulator::new();
        let mut fired = 0usize;

        for rule in self.rules.iter().filter(|rule| rule.fires(request)) {
            fired += 1;
            for contribution in &rule.contributions {
                if let Some(text) = contribution.bullet.render(request) {
                    acc.push(contribution.section, text);
                }
            }
        }

        tracing::debug!(
            module = %request.module,
            subtype = %request.subtype,
            fired,
            "report synthesized"
        );

        acc.finish(request)
    }
}

/// Synthesize a report with the default rule table.
pub fn synthesize(
    module: &Module,
    subtype: &str,
    complaint: &str,
    goals: &str,
    notes: &str,
    extra: &ExtraFields,
) -> StructuredReport {
    let request = ConsultationRequest {
        module: module.clone(),
        subtype: subtype.to_string(),
        complaint: complaint.to_string(),
        goals: goals.to_string(),
        notes: notes.to_string(),
        extra: extra.clone(),
    };
    ReportEngine::shared().synthesize(&request)
}
