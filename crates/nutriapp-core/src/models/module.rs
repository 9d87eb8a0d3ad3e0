//! Specialty modules and their module-specific extra fields.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Specialty context of a consultation.
///
/// Selects which rule group and which extra-field set apply. Labels that are
/// not one of the known specialties are kept verbatim as [`Module::Other`];
/// such consultations are still accepted but no module rules fire for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Module {
    /// Clinical nutrition
    Clinical,
    /// Sports nutrition
    Sports,
    /// Maternal and child nutrition
    MaternalChild,
    /// Any other label (no rule group)
    Other(String),
}

impl Module {
    /// The three specialties with a rule group.
    pub const KNOWN: [Module; 3] = [Module::Clinical, Module::Sports, Module::MaternalChild];

    /// Display label, as printed in report headers and stored in records.
    pub fn label(&self) -> &str {
        match self {
            Module::Clinical => "Nutrição clínica",
            Module::Sports => "Nutrição esportiva",
            Module::MaternalChild => "Materno infantil",
            Module::Other(label) => label,
        }
    }

    /// Parse a label or a short alias (case-insensitive).
    ///
    /// Never fails: unrecognized input becomes [`Module::Other`] with the
    /// original (trimmed) text.
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_lowercase().as_str() {
            "nutrição clínica" | "clinical" | "clinica" | "clínica" => Module::Clinical,
            "nutrição esportiva" | "sports" | "sport" | "esportiva" => Module::Sports,
            "materno infantil" | "maternal-child" | "maternal_child" | "materno" => {
                Module::MaternalChild
            }
            _ => Module::Other(trimmed.to_string()),
        }
    }

    /// Whether this module has a rule group.
    pub fn is_known(&self) -> bool {
        !matches!(self, Module::Other(_))
    }

    /// Recognized extra fields for this module, in report order.
    pub fn extra_fields(&self) -> &'static [ExtraField] {
        match self {
            Module::Clinical => &[ExtraField::Comorbidities, ExtraField::Labs, ExtraField::Meds],
            Module::Sports => &[
                ExtraField::TrainingRoutine,
                ExtraField::PerformanceGoal,
                ExtraField::BodyComp,
            ],
            Module::MaternalChild => &[
                ExtraField::ChildAge,
                ExtraField::Breastfeeding,
                ExtraField::GrowthCurve,
                ExtraField::Allergy,
            ],
            Module::Other(_) => &[],
        }
    }

    /// Suggested consultation subtypes offered by the intake form.
    ///
    /// Advisory only; the subtype is free-form and never alters rule logic.
    pub fn suggested_subtypes(&self) -> &'static [&'static str] {
        match self {
            Module::Clinical => &[
                "Padrão",
                "Emagrecimento",
                "Diabetes/Metabólica",
                "Gastrointestinal",
            ],
            Module::Sports => &[
                "Padrão",
                "Hipertrofia",
                "Performance/Resistência",
                "Recomposição corporal",
            ],
            Module::MaternalChild => &["Materno infantil"],
            Module::Other(_) => &["Padrão"],
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Exact inverse of [`Module::label`], used for stored and serialized values.
/// Aliases are not expanded, so `Other("sports")` stays `Other("sports")`.
impl From<String> for Module {
    fn from(label: String) -> Self {
        Module::KNOWN
            .into_iter()
            .find(|known| known.label() == label)
            .unwrap_or(Module::Other(label))
    }
}

impl From<Module> for String {
    fn from(module: Module) -> Self {
        module.label().to_string()
    }
}

/// A module-specific structured field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtraField {
    Comorbidities,
    Labs,
    Meds,
    TrainingRoutine,
    PerformanceGoal,
    BodyComp,
    ChildAge,
    Breastfeeding,
    GrowthCurve,
    Allergy,
}

impl ExtraField {
    /// Stable key used by intake forms and stored extras.
    pub const fn key(self) -> &'static str {
        match self {
            ExtraField::Comorbidities => "comorbidities",
            ExtraField::Labs => "labs",
            ExtraField::Meds => "meds",
            ExtraField::TrainingRoutine => "training_routine",
            ExtraField::PerformanceGoal => "performance_goal",
            ExtraField::BodyComp => "body_comp",
            ExtraField::ChildAge => "child_age",
            ExtraField::Breastfeeding => "breastfeeding",
            ExtraField::GrowthCurve => "growth_curve",
            ExtraField::Allergy => "allergy",
        }
    }

    /// Form label shown to the practitioner.
    pub const fn label(self) -> &'static str {
        match self {
            ExtraField::Comorbidities => "Comorbidades",
            ExtraField::Labs => "Exames laboratoriais citados",
            ExtraField::Meds => "Medicamentos e suplementos",
            ExtraField::TrainingRoutine => "Rotina de treino",
            ExtraField::PerformanceGoal => "Meta esportiva",
            ExtraField::BodyComp => "Composição corporal",
            ExtraField::ChildAge => "Idade da criança",
            ExtraField::Breastfeeding => "Aleitamento",
            ExtraField::GrowthCurve => "Crescimento/curva",
            ExtraField::Allergy => "Alergias/intolerâncias",
        }
    }

    /// Module this field belongs to.
    pub fn module(self) -> Module {
        match self {
            ExtraField::Comorbidities | ExtraField::Labs | ExtraField::Meds => Module::Clinical,
            ExtraField::TrainingRoutine | ExtraField::PerformanceGoal | ExtraField::BodyComp => {
                Module::Sports
            }
            ExtraField::ChildAge
            | ExtraField::Breastfeeding
            | ExtraField::GrowthCurve
            | ExtraField::Allergy => Module::MaternalChild,
        }
    }

    /// Look up a field of `module` by key.
    pub fn from_key(module: &Module, key: &str) -> Option<Self> {
        module
            .extra_fields()
            .iter()
            .copied()
            .find(|field| field.key() == key.trim())
    }
}

/// Rejected extra-field key (strict construction only).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("extra field '{key}' is not recognized for module '{module}'")]
pub struct UnknownExtraField {
    pub module: Module,
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalExtras {
    pub comorbidities: Option<String>,
    pub labs: Option<String>,
    pub meds: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SportsExtras {
    pub training_routine: Option<String>,
    pub performance_goal: Option<String>,
    pub body_comp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaternalChildExtras {
    pub child_age: Option<String>,
    pub breastfeeding: Option<String>,
    pub growth_curve: Option<String>,
    pub allergy: Option<String>,
}

/// Module-specific extra fields, one variant per specialty.
///
/// A field that is `None` and a field holding only whitespace are both
/// "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "module", rename_all = "snake_case")]
pub enum ExtraFields {
    #[default]
    None,
    Clinical(ClinicalExtras),
    Sports(SportsExtras),
    MaternalChild(MaternalChildExtras),
}

impl ExtraFields {
    /// Empty field set of the variant matching `module`.
    pub fn empty_for(module: &Module) -> Self {
        match module {
            Module::Clinical => ExtraFields::Clinical(ClinicalExtras::default()),
            Module::Sports => ExtraFields::Sports(SportsExtras::default()),
            Module::MaternalChild => ExtraFields::MaternalChild(MaternalChildExtras::default()),
            Module::Other(_) => ExtraFields::None,
        }
    }

    /// Build from untyped key/value pairs, ignoring keys `module` does not
    /// recognize.
    pub fn from_pairs<I, K, V>(module: &Module, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut extras = Self::empty_for(module);
        for (key, value) in pairs {
            if let Some(field) = ExtraField::from_key(module, key.as_ref()) {
                extras.set(field, value);
            }
        }
        extras
    }

    /// Build from untyped key/value pairs, rejecting unrecognized keys.
    pub fn from_pairs_strict<I, K, V>(module: &Module, pairs: I) -> Result<Self, UnknownExtraField>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut extras = Self::empty_for(module);
        for (key, value) in pairs {
            let field = ExtraField::from_key(module, key.as_ref()).ok_or_else(|| {
                UnknownExtraField {
                    module: module.clone(),
                    key: key.as_ref().to_string(),
                }
            })?;
            extras.set(field, value);
        }
        Ok(extras)
    }

    /// Set a field. Returns `false` if the field does not belong to this
    /// variant (the value is dropped).
    pub fn set(&mut self, field: ExtraField, value: impl Into<String>) -> bool {
        let slot = match self.slot_mut(field) {
            Some(slot) => slot,
            None => return false,
        };
        *slot = Some(value.into());
        true
    }

    /// Provided value of `field`, trimmed. `None` when absent, blank, or not
    /// part of this variant.
    pub fn get(&self, field: ExtraField) -> Option<&str> {
        self.raw(field)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Whether `field` holds a non-blank value.
    pub fn is_provided(&self, field: ExtraField) -> bool {
        self.get(field).is_some()
    }

    /// Stored (untrimmed) values keyed by field key, for persistence.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.fields()
            .iter()
            .filter_map(|field| {
                self.raw(*field)
                    .map(|value| (field.key().to_string(), value.to_string()))
            })
            .collect()
    }

    /// Provided values keyed by field key, trimmed; blank fields are left out.
    pub fn provided(&self) -> BTreeMap<&'static str, &str> {
        self.fields()
            .iter()
            .filter_map(|field| self.get(*field).map(|value| (field.key(), value)))
            .collect()
    }

    /// Fields of this variant, in report order.
    pub fn fields(&self) -> &'static [ExtraField] {
        self.module().extra_fields()
    }

    fn module(&self) -> Module {
        match self {
            ExtraFields::None => Module::Other(String::new()),
            ExtraFields::Clinical(_) => Module::Clinical,
            ExtraFields::Sports(_) => Module::Sports,
            ExtraFields::MaternalChild(_) => Module::MaternalChild,
        }
    }

    fn raw(&self, field: ExtraField) -> Option<&str> {
        let value = match (self, field) {
            (ExtraFields::Clinical(e), ExtraField::Comorbidities) => &e.comorbidities,
            (ExtraFields::Clinical(e), ExtraField::Labs) => &e.labs,
            (ExtraFields::Clinical(e), ExtraField::Meds) => &e.meds,
            (ExtraFields::Sports(e), ExtraField::TrainingRoutine) => &e.training_routine,
            (ExtraFields::Sports(e), ExtraField::PerformanceGoal) => &e.performance_goal,
            (ExtraFields::Sports(e), ExtraField::BodyComp) => &e.body_comp,
            (ExtraFields::MaternalChild(e), ExtraField::ChildAge) => &e.child_age,
            (ExtraFields::MaternalChild(e), ExtraField::Breastfeeding) => &e.breastfeeding,
            (ExtraFields::MaternalChild(e), ExtraField::GrowthCurve) => &e.growth_curve,
            (ExtraFields::MaternalChild(e), ExtraField::Allergy) => &e.allergy,
            _ => return None,
        };
        value.as_deref()
    }

    fn slot_mut(&mut self, field: ExtraField) -> Option<&mut Option<String>> {
        let slot = match (self, field) {
            (ExtraFields::Clinical(e), ExtraField::Comorbidities) => &mut e.comorbidities,
            (ExtraFields::Clinical(e), ExtraField::Labs) => &mut e.labs,
            (ExtraFields::Clinical(e), ExtraField::Meds) => &mut e.meds,
            (ExtraFields::Sports(e), ExtraField::TrainingRoutine) => &mut e.training_routine,
            (ExtraFields::Sports(e), ExtraField::PerformanceGoal) => &mut e.performance_goal,
            (ExtraFields::Sports(e), ExtraField::BodyComp) => &mut e.body_comp,
            (ExtraFields::MaternalChild(e), ExtraField::ChildAge) => &mut e.child_age,
            (ExtraFields::MaternalChild(e), ExtraField::Breastfeeding) => &mut e.breastfeeding,
            (ExtraFields::MaternalChild(e), ExtraField::GrowthCurve) => &mut e.growth_curve,
            (ExtraFields::MaternalChild(e), ExtraField::Allergy) => &mut e.allergy,
            _ => return None,
        };
        Some(slot)
    }
}
