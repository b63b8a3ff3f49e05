//! Tests for the FFI surface.

use crivet_core::{
    derive_condition_flags, open_builtin, open_builtin_with_config, open_catalog_json,
    profile_report_json, validate_profile_json, validation_report_json, CrivetError,
};

#[test]
fn test_direct_infusion_via_core() {
    let core = open_builtin().unwrap();
    let result = core
        .calculate_direct_infusion(2.0, "mcg/kg/min".into(), 10.0, 1.0)
        .unwrap();
    assert!((result.rate_ml_hr - 1.2).abs() < 1e-9);
    assert_eq!(result.steps.len(), 6);

    let err = core
        .calculate_direct_infusion(2.0, "mcg/lb/min".into(), 10.0, 1.0)
        .unwrap_err();
    assert!(matches!(err, CrivetError::InvalidInput(_)));
}

#[test]
fn test_preparation_via_core() {
    let core = open_builtin().unwrap();

    let ok = core
        .calculate_preparation(2.0, "mg/kg/h".into(), 10.0, 5.0, 20.0, 10.0, None)
        .unwrap();
    let recipe = ok.recipe.unwrap();
    assert!(ok.error.is_none());
    assert!((recipe.drug_volume_ml - 8.0).abs() < 1e-9);
    assert_eq!(recipe.amount_unit, "mg");

    let failed = core
        .calculate_preparation(10.0, "mg/kg/h".into(), 10.0, 1.0, 5.0, 1.0, None)
        .unwrap();
    assert!(failed.recipe.is_none());
    let error = failed.error.unwrap();
    assert_eq!(error.severity, "critical");
    assert_eq!(error.title, "Impossible preparation");
    assert!(!failed.steps.is_empty());
}

#[test]
fn test_vasopressin_concentrate_blocked() {
    let core = open_builtin().unwrap();
    let result = core
        .calculate_preparation(
            0.001,
            "U/kg/min".into(),
            20.0,
            2.0,
            50.0,
            20.0,
            Some("vasopressin".into()),
        )
        .unwrap();
    let error = result.error.unwrap();
    assert!(error.title.starts_with("BLOCKED"));
    assert!(result.steps.is_empty());
}

#[test]
fn test_custom_config_lifts_block() {
    let core = open_builtin_with_config(r#"{ "concentrate_limits": {} }"#.into()).unwrap();
    let result = core
        .calculate_preparation(
            0.001,
            "U/kg/min".into(),
            20.0,
            2.0,
            50.0,
            20.0,
            Some("vasopressin".into()),
        )
        .unwrap();
    assert!(result.error.is_none());
    assert_eq!(result.recipe.unwrap().amount_unit, "U");
}

#[test]
fn test_invalid_config_rejected() {
    let result = open_builtin_with_config(r#"{ "min_draw_volume_ml": -1 }"#.into());
    assert!(matches!(result, Err(CrivetError::ConfigError(_))));
}

#[test]
fn test_indicated_dose_and_check() {
    let core = open_builtin().unwrap();
    let range = core
        .resolve_indicated_dose("ketamine".into(), "dog".into(), "CRI".into(), "mcg/kg/min".into())
        .unwrap()
        .unwrap();
    assert_eq!(range.unit, "mcg/kg/min");
    assert_eq!(range.source, "profile");

    let alert = core
        .check_dose("ketamine".into(), "dog".into(), "CRI".into(), "mcg/kg/min".into(), 20.0)
        .unwrap()
        .unwrap();
    assert_eq!(alert.severity, "critical");

    let missing = core.resolve_indicated_dose(
        "unobtainium".into(),
        "dog".into(),
        "CRI".into(),
        "mcg/kg/min".into(),
    );
    assert!(matches!(missing, Err(CrivetError::NotFound(_))));

    let bad_species =
        core.resolve_indicated_dose("ketamine".into(), "horse".into(), "CRI".into(), "mg/kg/h".into());
    assert!(matches!(bad_species, Err(CrivetError::InvalidInput(_))));
}

#[test]
fn test_check_dose_skips_range_in_other_unit() {
    let core = open_builtin().unwrap();

    // U/kg/min range cannot be expressed in mcg/kg/min
    let vasopressin = core
        .check_dose("vasopressin".into(), "dog".into(), "CRI".into(), "mcg/kg/min".into(), 1.0)
        .unwrap();
    assert!(vasopressin.is_none());

    // bolus range is per-kg, not a rate
    let bolus = core
        .check_dose("ketamine".into(), "cat".into(), "BOLUS".into(), "mcg/kg/min".into(), 10.0)
        .unwrap();
    assert!(bolus.is_none());

    let in_units = core
        .check_dose("vasopressin".into(), "dog".into(), "CRI".into(), "U/kg/min".into(), 0.01)
        .unwrap()
        .unwrap();
    assert_eq!(in_units.severity, "critical");
    assert!(in_units.message.starts_with("OVERDOSE: above 0.002 U/kg/min"));
}

#[test]
fn test_alerts_via_core() {
    let core = open_builtin().unwrap();

    let alerts = core
        .evaluate_alerts("midazolam".into(), vec!["geriatric".into(), "hepatic-impairment".into()])
        .unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0].level, "critical");

    let patient = core
        .evaluate_patient_alerts("midazolam".into(), "senior".into(), vec!["hepatic".into()])
        .unwrap();
    assert_eq!(
        patient.iter().map(|a| a.id.as_str()).collect::<Vec<_>>(),
        alerts.iter().map(|a| a.id.as_str()).collect::<Vec<_>>()
    );

    let unknown = core.evaluate_alerts("midazolam".into(), vec!["grumpy".into()]);
    assert!(matches!(unknown, Err(CrivetError::InvalidInput(_))));
}

#[test]
fn test_derive_condition_flags() {
    let flags = derive_condition_flags("senior".into(), vec!["cardiac".into()]).unwrap();
    assert_eq!(flags.len(), 2);
    assert!(flags.contains(&"geriatric".to_string()));
    assert!(flags.contains(&"cardiac-failure".to_string()));
}

#[test]
fn test_catalog_queries() {
    let core = open_builtin().unwrap();
    assert!(core.get_drug("ketamine".into()).unwrap().has_profile_doses);
    assert!(core.get_drug("nope".into()).is_none());
    assert!(core.list_drugs().len() > 20);

    let hits = core.search_drugs("ketamin".into(), 3);
    assert_eq!(hits[0].drug_id, "ketamine");

    assert!(core.get_profile_json("ketamine".into()).unwrap().is_some());
    assert!(core.get_profile_json("fentanyl".into()).unwrap().is_none());

    let validation = core.validate_drug_profile("ketamine".into()).unwrap();
    assert_eq!(validation.completeness, 100);
}

#[test]
fn test_diluent_status_via_core() {
    let core = open_builtin().unwrap();
    assert_eq!(core.diluent_status("dobutamine".into(), "D5W".into()).unwrap(), "compatible");
    assert_eq!(core.diluent_status("dobutamine".into(), "RL".into()).unwrap(), "avoid");
    assert_eq!(core.diluent_status("lidocaine".into(), "NaCl_09".into()).unwrap(), "unknown");

    assert!(matches!(
        core.diluent_status("dobutamine".into(), "plasma".into()),
        Err(CrivetError::InvalidInput(_))
    ));
    assert!(matches!(
        core.diluent_status("nope".into(), "D5W".into()),
        Err(CrivetError::NotFound(_))
    ));
}

#[test]
fn test_custom_catalog() {
    let json = r#"{
        "drugs": [{
            "id": "lidocaine",
            "name": "Lidocaine",
            "concentrations": [20],
            "indicated_doses": [{
                "mode": "CRI",
                "species": "dog",
                "unit": "mcg/kg/min",
                "range": { "min": 25, "max": 50 },
                "purpose": "Analgesia"
            }]
        }],
        "rules": [{
            "drug_id": "lidocaine",
            "when": ["hepatic-impairment"],
            "alert": { "level": "critical", "title": "Hepatic", "short": "Reduce" }
        }]
    }"#;
    let core = open_catalog_json(json.into(), None).unwrap();
    assert_eq!(core.list_drugs().len(), 1);

    let alerts = core
        .evaluate_patient_alerts("lidocaine".into(), "adult".into(), vec!["hepatic".into()])
        .unwrap();
    assert_eq!(alerts[0].id, "lidocaine-legacy-0");

    assert!(matches!(
        open_catalog_json("not json".into(), None),
        Err(CrivetError::CatalogError(_))
    ));
}

#[test]
fn test_profile_json_validation() {
    let empty = validate_profile_json("{}".into()).unwrap();
    assert_eq!(empty.completeness, 0);
    assert!(!empty.is_valid);

    let report = profile_report_json("{}".into()).unwrap();
    assert!(report.starts_with("Completeness: 0%\nValid: NO\n"));

    let json = validation_report_json("{}".into()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["completeness"], 0);
    assert_eq!(value["is_valid"], false);
    assert!(!value["missing"].as_array().unwrap().is_empty());

    assert!(matches!(
        validate_profile_json("[".into()),
        Err(CrivetError::SerializationError(_))
    ));
}
