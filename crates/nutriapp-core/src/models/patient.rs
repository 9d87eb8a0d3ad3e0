//! Patient models.

use serde::{Deserialize, Serialize};

use super::fingerprint;

/// Oldest accepted age, in years.
pub const MAX_PATIENT_AGE: u8 = 120;

/// A registered patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Local UUID, generated at registration
    pub patient_id: String,
    /// Patient name
    pub name: String,
    /// Age in years (0..=120)
    pub age: u8,
    /// Sex as declared on the intake form
    pub sex: Option<String>,
    /// Creation timestamp
    pub created_at: String,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(name: String, age: u8, sex: Option<String>) -> Self {
        Self {
            patient_id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            age,
            sex: sex
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            created_at: super::timestamp_now(),
        }
    }

    /// Dedup key: two registrations with the same name, age and sex are the
    /// same patient.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        fingerprint::of(&(&self.name, self.age, &self.sex))
    }

    /// Label used in pickers: `"Name | ID <id>"`.
    pub fn display_label(&self) -> String {
        format!("{} | ID {}", self.name, self.patient_id)
    }
}
