//! Declarative report rules.
//!
//! A rule is a trigger plus the bullets it contributes when the trigger holds.
//! The default table is split into the cross-cutting keyword rules and one
//! group per specialty module; adding a module means appending a group.

use crate::models::{ConsultationRequest, ExtraField, Module, ReportSection};

/// Sections that accumulate bullets (the summary is composed separately).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulletSection {
    Assessment,
    AttentionPoints,
    NextSteps,
    MissingData,
    FollowUp,
}

impl BulletSection {
    pub const ALL: [BulletSection; 5] = [
        BulletSection::Assessment,
        BulletSection::AttentionPoints,
        BulletSection::NextSteps,
        BulletSection::MissingData,
        BulletSection::FollowUp,
    ];

    /// Canned bullet used when no rule contributed to the section.
    pub const fn fallback(self) -> &'static str {
        match self {
            BulletSection::Assessment => {
                "Registro insuficiente para avaliação mais direcionada. Recomenda-se completar dados."
            }
            BulletSection::AttentionPoints => {
                "Não foram identificados pontos críticos com os dados informados. Recomenda-se completar o registro."
            }
            BulletSection::NextSteps => {
                "Completar anamnese e estabelecer plano inicial com monitoramento em 7 a 14 dias."
            }
            BulletSection::MissingData => "Sem pendências críticas identificadas no registro atual.",
            BulletSection::FollowUp => {
                "Agendar retorno para reavaliação e ajuste do plano conforme evolução e adesão."
            }
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            BulletSection::Assessment => 0,
            BulletSection::AttentionPoints => 1,
            BulletSection::NextSteps => 2,
            BulletSection::MissingData => 3,
            BulletSection::FollowUp => 4,
        }
    }
}

impl From<BulletSection> for ReportSection {
    fn from(section: BulletSection) -> Self {
        match section {
            BulletSection::Assessment => ReportSection::Assessment,
            BulletSection::AttentionPoints => ReportSection::AttentionPoints,
            BulletSection::NextSteps => ReportSection::NextSteps,
            BulletSection::MissingData => ReportSection::MissingData,
            BulletSection::FollowUp => ReportSection::FollowUp,
        }
    }
}

/// Free-text request fields a keyword trigger can inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Complaint,
    Goals,
    Notes,
}

impl TextField {
    fn of(self, request: &ConsultationRequest) -> &str {
        match self {
            TextField::Complaint => &request.complaint,
            TextField::Goals => &request.goals,
            TextField::Notes => &request.notes,
        }
    }
}

/// When a rule fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Every time the rule is in scope.
    Always,
    /// The listed fields, joined by a space, contain any keyword
    /// (case-insensitive substring).
    Mentions {
        fields: &'static [TextField],
        keywords: &'static [&'static str],
    },
    /// The extra field holds a non-blank value.
    Provided(ExtraField),
    /// The extra field is absent or blank.
    Missing(ExtraField),
}

impl Trigger {
    pub fn matches(&self, request: &ConsultationRequest) -> bool {
        match self {
            Trigger::Always => true,
            Trigger::Mentions { fields, keywords } => {
                let haystack = fields
                    .iter()
                    .map(|field| field.of(request))
                    .collect::<Vec<_>>()
                    .join(" ");
                contains_any(&haystack, keywords)
            }
            Trigger::Provided(field) => request.extra.is_provided(*field),
            Trigger::Missing(field) => !request.extra.is_provided(*field),
        }
    }
}

/// Case-insensitive containment of any lowercase keyword.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|keyword| lower.contains(keyword))
}

/// Text of a contributed bullet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bullet {
    /// Fixed sentence.
    Text(&'static str),
    /// `"{label}: {value}. {guidance}"` with the field value echoed verbatim.
    /// Renders nothing when the field is not provided.
    Echo {
        field: ExtraField,
        label: &'static str,
        guidance: &'static str,
    },
}

impl Bullet {
    pub fn render(&self, request: &ConsultationRequest) -> Option<String> {
        match self {
            Bullet::Text(text) => Some((*text).to_string()),
            Bullet::Echo {
                field,
                label,
                guidance,
            } => request
                .extra
                .get(*field)
                .map(|value| format!("{label}: {value}. {guidance}")),
        }
    }
}

/// One bullet appended to one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub section: BulletSection,
    pub bullet: Bullet,
}

impl Contribution {
    pub const fn text(section: BulletSection, text: &'static str) -> Self {
        Self {
            section,
            bullet: Bullet::Text(text),
        }
    }

    pub const fn echo(
        section: BulletSection,
        field: ExtraField,
        label: &'static str,
        guidance: &'static str,
    ) -> Self {
        Self {
            section,
            bullet: Bullet::Echo {
                field,
                label,
                guidance,
            },
        }
    }
}

/// Which requests a rule is evaluated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleScope {
    AnyModule,
    Module(Module),
}

impl RuleScope {
    pub fn includes(&self, module: &Module) -> bool {
        match self {
            RuleScope::AnyModule => true,
            RuleScope::Module(scoped) => scoped == module,
        }
    }
}

/// A declarative rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Stable identifier, used in logs and tests
    pub id: &'static str,
    pub scope: RuleScope,
    pub trigger: Trigger,
    /// Appended in order when the rule fires
    pub contributions: Vec<Contribution>,
}

impl Rule {
    pub fn new(id: &'static str, scope: RuleScope, trigger: Trigger) -> Self {
        Self {
            id,
            scope,
            trigger,
            contributions: Vec::new(),
        }
    }

    /// Append a fixed bullet.
    pub fn add(mut self, section: BulletSection, text: &'static str) -> Self {
        self.contributions.push(Contribution::text(section, text));
        self
    }

    /// Append a bullet echoing `field`.
    pub fn echo(
        mut self,
        section: BulletSection,
        field: ExtraField,
        label: &'static str,
        guidance: &'static str,
    ) -> Self {
        self.contributions
            .push(Contribution::echo(section, field, label, guidance));
        self
    }

    /// Whether the rule fires for `request`.
    pub fn fires(&self, request: &ConsultationRequest) -> bool {
        self.scope.includes(&request.module) && self.trigger.matches(request)
    }
}

pub const FATIGUE_TERMS: &[&str] = &["cansaço", "fadiga", "sonol", "insônia"];
pub const WEIGHT_LOSS_TERMS: &[&str] = &["emagrec", "perder peso", "redução de peso"];
pub const GI_TERMS: &[&str] = &[
    "inchaço",
    "estufamento",
    "distensão",
    "gases",
    "flatulência",
    "refluxo",
    "azia",
    "queimação",
];

use BulletSection::{Assessment, AttentionPoints, FollowUp, MissingData, NextSteps};

/// The full default rule table, in evaluation order.
pub fn default_rules() -> Vec<Rule> {
    let mut rules = cross_cutting_rules();
    rules.extend(clinical_rules());
    rules.extend(sports_rules());
    rules.extend(maternal_child_rules());
    rules
}

/// Keyword rules evaluated for every module, before any module group.
pub fn cross_cutting_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "fatigue",
            RuleScope::AnyModule,
            Trigger::Mentions {
                fields: &[TextField::Complaint],
                keywords: FATIGUE_TERMS,
            },
        )
        .add(
            Assessment,
            "A queixa sugere possível relação com sono, hidratação e regularidade alimentar.",
        )
        .add(
            AttentionPoints,
            "Investigar padrão de sono, ingestão hídrica e regularidade das refeições.",
        )
        .add(
            NextSteps,
            "Registrar sono e hidratação por 7 dias e revisar distribuição das refeições.",
        ),
        Rule::new(
            "weight_loss",
            RuleScope::AnyModule,
            Trigger::Mentions {
                fields: &[TextField::Goals],
                keywords: WEIGHT_LOSS_TERMS,
            },
        )
        .add(
            Assessment,
            "O objetivo indica necessidade de estratégia gradual para favorecer adesão.",
        )
        .add(
            AttentionPoints,
            "Risco de metas agressivas reduzirem adesão e favorecerem compensações alimentares.",
        )
        .add(
            NextSteps,
            "Definir metas graduais e indicadores de adesão (frequência alimentar e proteína/dia).",
        ),
        Rule::new(
            "gastrointestinal",
            RuleScope::AnyModule,
            Trigger::Mentions {
                fields: &[TextField::Complaint, TextField::Notes],
                keywords: GI_TERMS,
            },
        )
        .add(
            Assessment,
            "Relato de desconforto gastrointestinal sugere avaliar tolerâncias, volume e fracionamento das refeições.",
        )
        .add(
            AttentionPoints,
            "Avaliar gatilhos alimentares e horário de aparecimento dos sintomas gastrointestinais.",
        )
        .add(
            NextSteps,
            "Registrar diário alimentar com sintomas e horários por 3 a 7 dias.",
        ),
    ]
}

pub fn clinical_rules() -> Vec<Rule> {
    let scope = || RuleScope::Module(Module::Clinical);
    vec![
        Rule::new("clinical.context", scope(), Trigger::Always).add(
            Assessment,
            "No contexto clínico, recomenda-se integrar histórico, sintomas e exames para orientar conduta inicial.",
        ),
        Rule::new(
            "clinical.comorbidities",
            scope(),
            Trigger::Provided(ExtraField::Comorbidities),
        )
        .echo(
            AttentionPoints,
            ExtraField::Comorbidities,
            "Comorbidades",
            "Ajustar conduta conforme condição clínica.",
        ),
        Rule::new(
            "clinical.comorbidities.missing",
            scope(),
            Trigger::Missing(ExtraField::Comorbidities),
        )
        .add(MissingData, "Comorbidades/diagnósticos não informados."),
        Rule::new("clinical.labs", scope(), Trigger::Provided(ExtraField::Labs))
            .echo(
                AttentionPoints,
                ExtraField::Labs,
                "Exames",
                "Verificar alterações e tendência.",
            )
            .add(
                NextSteps,
                "Padronizar registro de exames com datas e acompanhar tendência longitudinal.",
            ),
        Rule::new(
            "clinical.labs.missing",
            scope(),
            Trigger::Missing(ExtraField::Labs),
        )
        .add(
            MissingData,
            "Exames laboratoriais recentes não informados, quando aplicável.",
        ),
        Rule::new("clinical.meds", scope(), Trigger::Provided(ExtraField::Meds)).echo(
            AttentionPoints,
            ExtraField::Meds,
            "Medicamentos/suplementos",
            "Verificar interações e impactos.",
        ),
        Rule::new(
            "clinical.meds.missing",
            scope(),
            Trigger::Missing(ExtraField::Meds),
        )
        .add(MissingData, "Medicamentos e suplementos não informados."),
        Rule::new("clinical.plan", scope(), Trigger::Always)
            .add(
                NextSteps,
                "Definir plano inicial com metas objetivas e acompanhamento.",
            )
            .add(
                FollowUp,
                "Reavaliar em 7 a 14 dias e ajustar conduta conforme resposta e adesão.",
            ),
    ]
}

pub fn sports_rules() -> Vec<Rule> {
    let scope = || RuleScope::Module(Module::Sports);
    vec![
        Rule::new("sports.context", scope(), Trigger::Always).add(
            Assessment,
            "No contexto esportivo, alinhar ingestão, timing e recuperação à rotina de treino e objetivo.",
        ),
        Rule::new(
            "sports.training_routine",
            scope(),
            Trigger::Provided(ExtraField::TrainingRoutine),
        )
        .echo(
            AttentionPoints,
            ExtraField::TrainingRoutine,
            "Treino",
            "Ajustar timing, hidratação e recuperação.",
        )
        .add(
            NextSteps,
            "Mapear janela pré e pós-treino e registrar sono e recuperação.",
        ),
        Rule::new(
            "sports.training_routine.missing",
            scope(),
            Trigger::Missing(ExtraField::TrainingRoutine),
        )
        .add(MissingData, "Rotina de treino não informada."),
        Rule::new(
            "sports.performance_goal",
            scope(),
            Trigger::Provided(ExtraField::PerformanceGoal),
        )
        .echo(
            AttentionPoints,
            ExtraField::PerformanceGoal,
            "Meta",
            "Alinhar estratégia à periodização.",
        ),
        Rule::new(
            "sports.performance_goal.missing",
            scope(),
            Trigger::Missing(ExtraField::PerformanceGoal),
        )
        .add(MissingData, "Meta esportiva específica não informada."),
        Rule::new(
            "sports.body_comp",
            scope(),
            Trigger::Provided(ExtraField::BodyComp),
        )
        .echo(
            AttentionPoints,
            ExtraField::BodyComp,
            "Composição corporal",
            "Usar para metas realistas e monitoramento.",
        ),
        Rule::new(
            "sports.body_comp.missing",
            scope(),
            Trigger::Missing(ExtraField::BodyComp),
        )
        .add(
            MissingData,
            "Composição corporal não informada, quando aplicável.",
        ),
        Rule::new("sports.plan", scope(), Trigger::Always)
            .add(
                NextSteps,
                "Definir indicadores semanais: treinos, sono, fome, recuperação e desempenho.",
            )
            .add(
                FollowUp,
                "Reavaliar em 7 dias e ajustar timing e distribuição conforme resposta.",
            ),
    ]
}

pub fn maternal_child_rules() -> Vec<Rule> {
    let scope = || RuleScope::Module(Module::MaternalChild);
    vec![
        Rule::new("maternal_child.context", scope(), Trigger::Always).add(
            Assessment,
            "No contexto materno-infantil, considerar idade, rotina, crescimento e tolerâncias com foco em segurança.",
        ),
        Rule::new(
            "maternal_child.child_age",
            scope(),
            Trigger::Provided(ExtraField::ChildAge),
        )
        .echo(
            AttentionPoints,
            ExtraField::ChildAge,
            "Idade da criança",
            "Ajustar orientação conforme fase alimentar.",
        ),
        Rule::new(
            "maternal_child.child_age.missing",
            scope(),
            Trigger::Missing(ExtraField::ChildAge),
        )
        .add(MissingData, "Idade da criança não informada."),
        Rule::new(
            "maternal_child.breastfeeding",
            scope(),
            Trigger::Provided(ExtraField::Breastfeeding),
        )
        .echo(
            AttentionPoints,
            ExtraField::Breastfeeding,
            "Aleitamento",
            "Considerar manejo conforme rotina familiar.",
        ),
        Rule::new(
            "maternal_child.breastfeeding.missing",
            scope(),
            Trigger::Missing(ExtraField::Breastfeeding),
        )
        .add(MissingData, "Aleitamento não informado, quando aplicável."),
        Rule::new(
            "maternal_child.growth_curve",
            scope(),
            Trigger::Provided(ExtraField::GrowthCurve),
        )
        .echo(
            AttentionPoints,
            ExtraField::GrowthCurve,
            "Crescimento/curva",
            "Verificar tendência.",
        )
        .add(
            NextSteps,
            "Registrar medidas com datas e acompanhar tendência longitudinal.",
        ),
        Rule::new(
            "maternal_child.growth_curve.missing",
            scope(),
            Trigger::Missing(ExtraField::GrowthCurve),
        )
        .add(MissingData, "Peso/estatura e datas não informados."),
        Rule::new(
            "maternal_child.allergy",
            scope(),
            Trigger::Provided(ExtraField::Allergy),
        )
        .echo(
            AttentionPoints,
            ExtraField::Allergy,
            "Alergias/intolerâncias",
            "Garantir segurança alimentar.",
        ),
        Rule::new(
            "maternal_child.allergy.missing",
            scope(),
            Trigger::Missing(ExtraField::Allergy),
        )
        .add(
            MissingData,
            "Alergias/intolerâncias não informadas, quando aplicável.",
        ),
        Rule::new("maternal_child.plan", scope(), Trigger::Always)
            .add(
                NextSteps,
                "Orientar plano inicial considerando rotina familiar e segurança na variedade alimentar.",
            )
            .add(
                FollowUp,
                "Reavaliar aceitação e evolução em 14 a 30 dias, conforme caso.",
            ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_any_case_insensitive() {
        assert!(contains_any("Cansaço extremo", FATIGUE_TERMS));
        assert!(contains_any("muita SONOLÊNCIA", FATIGUE_TERMS));
        assert!(!contains_any("dor nas costas", FATIGUE_TERMS));
        assert!(!contains_any("", FATIGUE_TERMS));
    }

    #[test]
    fn test_rule_ids_unique() {
        let rules = default_rules();
        let mut ids: Vec<_> = rules.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), rules.len());
    }

    #[test]
    fn test_every_known_module_has_unconditional_bullets() {
        let rules = default_rules();
        for module in Module::KNOWN {
            let always: Vec<_> = rules
                .iter()
                .filter(|r| r.scope == RuleScope::Module(module.clone()))
                .filter(|r| r.trigger == Trigger::Always)
                .flat_map(|r| r.contributions.iter().map(|c| c.section))
                .collect();
            assert!(always.contains(&Assessment), "{module}: no assessment");
            assert!(always.contains(&NextSteps), "{module}: no next step");
            assert!(always.contains(&FollowUp), "{module}: no follow-up");
        }
    }

    #[test]
    fn test_every_module_field_has_provided_and_missing_rule() {
        let rules = default_rules();
        for module in Module::KNOWN {
            for field in module.extra_fields() {
                assert!(rules
                    .iter()
                    .any(|r| r.trigger == Trigger::Provided(*field)));
                assert!(rules
                    .iter()
                    .any(|r| r.trigger == Trigger::Missing(*field)));
            }
        }
    }

    #[test]
    fn test_gi_trigger_reads_notes() {
        let rule = &cross_cutting_rules()[2];
        let request = ConsultationRequest::new(Module::Clinical, "Padrão")
            .with_notes("Relata REFLUXO após o jantar");
        assert!(rule.fires(&request));
    }

    #[test]
    fn test_echo_renders_nothing_without_value() {
        let bullet = Bullet::Echo {
            field: ExtraField::Labs,
            label: "Exames",
            guidance: "x",
        };
        let request = ConsultationRequest::new(Module::Clinical, "Padrão");
        assert_eq!(bullet.render(&request), None);

        let request = request.with_extra(ExtraField::Labs, " TSH alto ");
        assert_eq!(
            bullet.render(&request).as_deref(),
            Some("Exames: TSH alto. x")
        );
    }
}
