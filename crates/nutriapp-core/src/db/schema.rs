//! SQLite schema definition.

/// Complete database schema for nutriapp.
///
/// Records reference each other by id only; references are not enforced so
/// that deduplication can drop a copy without cascading.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    patient_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    age INTEGER NOT NULL CHECK (age BETWEEN 0 AND 120),
    sex TEXT,
    fingerprint TEXT NOT NULL,                   -- SHA-256 of (name, age, sex)
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);
CREATE INDEX IF NOT EXISTS idx_patients_fingerprint ON patients(fingerprint);

-- ============================================================================
-- Consultations (Append-Only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS consultations (
    consult_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    module TEXT NOT NULL,
    subtype TEXT NOT NULL DEFAULT '',
    complaint TEXT NOT NULL DEFAULT '',
    goals TEXT NOT NULL DEFAULT '',
    notes TEXT NOT NULL DEFAULT '',
    extra_json TEXT NOT NULL DEFAULT '{}',       -- JSON object of provided extra fields
    fingerprint TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_consultations_patient ON consultations(patient_id, created_at);
CREATE INDEX IF NOT EXISTS idx_consultations_fingerprint ON consultations(fingerprint);

-- ============================================================================
-- Reports (Append-Only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS reports (
    report_id TEXT PRIMARY KEY,
    consult_id TEXT NOT NULL,
    patient_id TEXT NOT NULL,
    module TEXT NOT NULL,
    subtype TEXT NOT NULL DEFAULT '',
    summary TEXT NOT NULL,
    assessment TEXT NOT NULL,
    attention_points TEXT NOT NULL,
    next_steps TEXT NOT NULL,
    missing_data TEXT NOT NULL,
    follow_up TEXT NOT NULL,
    fingerprint TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_reports_consult ON reports(consult_id);
CREATE INDEX IF NOT EXISTS idx_reports_patient ON reports(patient_id, created_at);
CREATE INDEX IF NOT EXISTS idx_reports_fingerprint ON reports(fingerprint);
"#;
