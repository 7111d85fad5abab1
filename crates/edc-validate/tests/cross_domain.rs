use polars::prelude::{DataFrame, IntoLazy, col, df, lit};

use edc_model::DomainCode;
use edc_validate::{anchor_link, vs_ae_consistency, vs_cm_consistency};

fn rows_for(findings: &DataFrame, rule_id: &str) -> DataFrame {
    findings
        .clone()
        .lazy()
        .filter(col("rule_id").eq(lit(rule_id)))
        .collect()
        .unwrap()
}

fn str_at(frame: &DataFrame, column: &str, idx: usize) -> Option<String> {
    frame
        .column(column)
        .unwrap()
        .str()
        .unwrap()
        .get(idx)
        .map(str::to_string)
}

fn anchor() -> DataFrame {
    df!(
        "USUBJID" => ["A", "B", "C"],
        "STUDYID" => ["S1", "S1", "S1"],
    )
    .unwrap()
}

#[test]
fn orphan_dependent_subject_is_flagged_once() {
    let ae = df!(
        "USUBJID" => ["A", "D"],
        "AETERM" => ["HEADACHE", "NAUSEA"],
        "AESTDTC" => ["2024-01-01", "2024-01-02"],
    )
    .unwrap();
    let findings = anchor_link(&anchor(), &ae, DomainCode::Ae).unwrap();

    assert_eq!(findings.height(), 1);
    assert_eq!(
        str_at(&findings, "rule_id", 0).as_deref(),
        Some("X_DMLINK_AE_001")
    );
    assert_eq!(
        str_at(&findings, "finding_type", 0).as_deref(),
        Some("CROSS_DOMAIN")
    );
    assert_eq!(str_at(&findings, "severity", 0).as_deref(), Some("HIGH"));
    assert_eq!(str_at(&findings, "evidence", 0).as_deref(), Some("D"));
    assert_eq!(str_at(&findings, "usubjid", 0).as_deref(), Some("D"));
    let row = findings.column("row_index").unwrap().i64().unwrap().get(0);
    assert_eq!(row, Some(1));
}

#[test]
fn anchor_check_degrades_without_identifier() {
    let dm = df!("STUDYID" => ["S1"]).unwrap();
    let vs = df!("USUBJID" => ["A"]).unwrap();
    let findings = anchor_link(&dm, &vs, DomainCode::Vs).unwrap();

    assert_eq!(findings.height(), 1);
    assert_eq!(
        str_at(&findings, "rule_id", 0).as_deref(),
        Some("X_DMLINK_VS_000")
    );
    assert_eq!(str_at(&findings, "severity", 0).as_deref(), Some("CRIT"));
    let row = findings.column("row_index").unwrap().i64().unwrap().get(0);
    assert_eq!(row, Some(-1));
}

#[test]
fn fully_anchored_dependents_produce_nothing() {
    let vs = df!(
        "USUBJID" => ["A", "B", "C"],
        "VSTESTCD" => ["HR", "HR", "HR"],
        "VSORRES" => ["72", "70", "68"],
        "VSDTC" => ["2024-01-01", "2024-01-01", "2024-01-01"],
    )
    .unwrap();
    let findings = anchor_link(&anchor(), &vs, DomainCode::Vs).unwrap();
    assert_eq!(findings.height(), 0);
}

fn vs_range_for_a() -> DataFrame {
    df!(
        "USUBJID" => ["A", "A"],
        "VSDTC" => ["2024-01-01", "2024-03-01"],
    )
    .unwrap()
}

#[test]
fn ae_start_outside_vs_range_is_flagged() {
    let ae = df!(
        "USUBJID" => ["A"],
        "AESTDTC" => ["2024-05-01"],
    )
    .unwrap();
    let findings = vs_ae_consistency(&vs_range_for_a(), &ae).unwrap();

    let out_of_range = rows_for(&findings, "X_VSAE_002");
    assert_eq!(out_of_range.height(), 1);
    assert_eq!(str_at(&out_of_range, "severity", 0).as_deref(), Some("MED"));
    assert_eq!(
        str_at(&out_of_range, "evidence", 0).as_deref(),
        Some("2024-05-01 vs [2024-01-01, 2024-03-01]")
    );
}

#[test]
fn ae_start_inside_vs_range_is_clean() {
    let ae = df!(
        "USUBJID" => ["A"],
        "AESTDTC" => ["2024-02-15"],
    )
    .unwrap();
    let findings = vs_ae_consistency(&vs_range_for_a(), &ae).unwrap();
    assert_eq!(rows_for(&findings, "X_VSAE_002").height(), 0);
}

#[test]
fn subject_without_parseable_vs_dates_is_excluded() {
    let vs = df!(
        "USUBJID" => ["A", "A"],
        "VSDTC" => ["garbled", "also bad"],
    )
    .unwrap();
    let ae = df!(
        "USUBJID" => ["A"],
        "AESTDTC" => ["2024-05-01"],
    )
    .unwrap();
    let findings = vs_ae_consistency(&vs, &ae).unwrap();
    assert_eq!(rows_for(&findings, "X_VSAE_002").height(), 0);
}

#[test]
fn vs_ae_check_degrades_without_date_column() {
    let vs = df!("USUBJID" => ["A"]).unwrap();
    let ae = df!(
        "USUBJID" => ["A"],
        "AESTDTC" => ["2024-01-01"],
    )
    .unwrap();
    let findings = vs_ae_consistency(&vs, &ae).unwrap();

    assert_eq!(findings.height(), 1);
    assert_eq!(str_at(&findings, "rule_id", 0).as_deref(), Some("X_VSAE_000"));
    assert_eq!(str_at(&findings, "severity", 0).as_deref(), Some("CRIT"));
    assert_eq!(
        str_at(&findings, "field", 0).as_deref(),
        Some("USUBJID/--DTC")
    );
}

#[test]
fn orphan_ae_subject_in_consistency_check() {
    let ae = df!(
        "USUBJID" => ["Z"],
        "AESTDTC" => ["2024-02-01"],
    )
    .unwrap();
    let findings = vs_ae_consistency(&vs_range_for_a(), &ae).unwrap();

    let orphans = rows_for(&findings, "X_VSAE_001");
    assert_eq!(orphans.height(), 1);
    assert_eq!(str_at(&orphans, "evidence", 0).as_deref(), Some("Z"));
    // An orphan has no range to compare against.
    assert_eq!(rows_for(&findings, "X_VSAE_002").height(), 0);
}

#[test]
fn vs_date_outside_medication_window_is_flagged() {
    let vs = df!(
        "USUBJID" => ["A", "A"],
        "VSDTC" => ["2024-02-01", "2024-05-01"],
    )
    .unwrap();
    let cm = df!(
        "USUBJID" => ["A"],
        "CMSTDTC" => ["2024-01-01"],
        "CMENDTC" => ["2024-03-01"],
    )
    .unwrap();
    let findings = vs_cm_consistency(&vs, &cm).unwrap();

    let out_of_window = rows_for(&findings, "X_VSCM_002");
    assert_eq!(out_of_window.height(), 1);
    assert_eq!(str_at(&out_of_window, "severity", 0).as_deref(), Some("LOW"));
    assert_eq!(
        str_at(&out_of_window, "evidence", 0).as_deref(),
        Some("2024-05-01 vs [2024-01-01, 2024-03-01]")
    );
}

#[test]
fn missing_medication_end_column_is_advised_not_silenced() {
    let vs = df!(
        "USUBJID" => ["A"],
        "VSDTC" => ["2024-02-01"],
    )
    .unwrap();
    let cm = df!(
        "USUBJID" => ["A"],
        "CMSTDTC" => ["2024-01-01"],
    )
    .unwrap();
    let findings = vs_cm_consistency(&vs, &cm).unwrap();

    let advisory = rows_for(&findings, "X_VSCM_002");
    assert_eq!(advisory.height(), 1);
    assert_eq!(str_at(&advisory, "severity", 0).as_deref(), Some("LOW"));
    let row = advisory.column("row_index").unwrap().i64().unwrap().get(0);
    assert_eq!(row, Some(-1));
}

#[test]
fn unparseable_medication_end_dates_disable_the_window() {
    let vs = df!(
        "USUBJID" => ["A"],
        "VSDTC" => ["2024-05-01"],
    )
    .unwrap();
    let cm = df!(
        "USUBJID" => ["A"],
        "CMSTDTC" => ["2024-01-01"],
        "CMENDTC" => ["ongoing"],
    )
    .unwrap();
    let findings = vs_cm_consistency(&vs, &cm).unwrap();
    assert_eq!(rows_for(&findings, "X_VSCM_002").height(), 0);
}
