//! Record store integration tests: intake flow, deduplication, on-disk reopen.

use nutriapp_core::db::Database;
use nutriapp_core::export::{ReportExporter, PAGE_BREAK};
use nutriapp_core::intake::{IntakeError, IntakeService};
use nutriapp_core::models::{ConsultationRequest, ExtraField, Module, Patient, ReportSection};
use nutriapp_core::AppConfig;

fn clinical_request(complaint: &str) -> ConsultationRequest {
    ConsultationRequest::new(Module::Clinical, "Diabetes/Metabólica")
        .with_complaint(complaint)
        .with_goals("emagrecimento saudável")
        .with_extra(ExtraField::Comorbidities, "diabetes tipo 2")
}

#[test]
fn test_full_intake_flow() {
    let db = Database::open_in_memory().unwrap();
    let service = IntakeService::new(&db);

    let patient = service
        .register_patient("Maria Silva", 52, Some("Feminino".into()))
        .unwrap();
    let first = service
        .analyze_consultation(&patient.patient_id, &clinical_request("cansaço frequente"))
        .unwrap();
    let second = service
        .analyze_consultation(&patient.patient_id, &clinical_request("sonolência"))
        .unwrap();

    assert_eq!(db.count_consultations().unwrap(), 2);
    assert_eq!(db.count_reports().unwrap(), 2);

    let stored = db
        .get_consultation(&first.consultation.consult_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored, first.consultation);
    assert_eq!(
        stored.request.extra.get(ExtraField::Comorbidities),
        Some("diabetes tipo 2")
    );

    let reports = db.list_reports_for_patient(&patient.patient_id).unwrap();
    let ids: Vec<_> = reports.iter().map(|r| r.report_id.as_str()).collect();
    assert!(ids.contains(&first.report.report_id.as_str()));
    assert!(ids.contains(&second.report.report_id.as_str()));
}

#[test]
fn test_rejected_consultation_leaves_store_untouched() {
    let db = Database::open_in_memory().unwrap();
    let service = IntakeService::new(&db);
    let patient = service.register_patient("João", 30, None).unwrap();

    let request = ConsultationRequest::new(Module::Sports, "Padrão").with_complaint("cãibras");
    let err = service
        .analyze_consultation(&patient.patient_id, &request)
        .unwrap_err();

    assert!(matches!(err, IntakeError::MissingField("goals")));
    assert_eq!(db.count_consultations().unwrap(), 0);
    assert_eq!(db.count_reports().unwrap(), 0);
}

#[test]
fn test_deduplicate_keeps_earliest_copy() {
    let db = Database::open_in_memory().unwrap();

    let mut original = Patient::new("Ana".into(), 34, None);
    original.created_at = "2024-01-01T00:00:00Z".into();
    let mut copy = Patient::new("Ana".into(), 34, None);
    copy.created_at = "2024-02-01T00:00:00Z".into();
    let other = Patient::new("Ana".into(), 35, None);

    db.insert_patient(&copy).unwrap();
    db.insert_patient(&original).unwrap();
    db.insert_patient(&other).unwrap();

    let summary = db.deduplicate().unwrap();
    assert_eq!(summary.patients.before, 3);
    assert_eq!(summary.patients.after, 2);
    assert_eq!(summary.patients.removed(), 1);

    assert!(db.get_patient(&original.patient_id).unwrap().is_some());
    assert!(db.get_patient(&copy.patient_id).unwrap().is_none());
    assert!(db.get_patient(&other.patient_id).unwrap().is_some());

    // second pass is a no-op
    let again = db.deduplicate().unwrap();
    assert_eq!(again.patients.removed(), 0);
    assert_eq!(again.consultations.removed(), 0);
    assert_eq!(again.reports.removed(), 0);
}

#[test]
fn test_deduplicate_repeated_analysis() {
    let db = Database::open_in_memory().unwrap();
    let service = IntakeService::new(&db);
    let patient = service.register_patient("Ana", 34, None).unwrap();

    for _ in 0..3 {
        service
            .analyze_consultation(&patient.patient_id, &clinical_request("cansaço"))
            .unwrap();
    }

    let summary = db.deduplicate().unwrap();
    assert_eq!(summary.consultations.after, 1);
    assert_eq!(summary.reports.after, 1);
    assert_eq!(db.count_consultations().unwrap(), 1);
}

#[test]
fn test_on_disk_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig::resolve(Some(dir.path().join("nested")), None, None).unwrap();

    let (patient_id, report_id) = {
        let db = Database::open(config.database_path()).unwrap();
        let service = IntakeService::new(&db);
        let patient = service.register_patient("Clara", 8, None).unwrap();
        let request = ConsultationRequest::new(Module::MaternalChild, "Materno infantil")
            .with_complaint("recusa alimentar")
            .with_goals("ampliar variedade")
            .with_extra(ExtraField::Allergy, "APLV");
        let analysis = service
            .analyze_consultation(&patient.patient_id, &request)
            .unwrap();
        (patient.patient_id, analysis.report.report_id)
    };

    let db = Database::open(config.database_path()).unwrap();
    let report = db.get_report(&report_id).unwrap().unwrap();
    assert_eq!(report.patient_id, patient_id);
    assert!(report
        .report
        .section(ReportSection::AttentionPoints)
        .contains("APLV"));

    let document = ReportExporter::new(&db)
        .render_document(&report_id, config.page_lines())
        .unwrap();
    assert!(document.contains("Paciente: Clara"));
    assert!(document.contains(PAGE_BREAK) || document.lines().count() <= config.page_lines());
}
