use chrono::TimeZone;
use igfind_core::{ConfidenceScore, DiscoveryStatus};

use super::*;

fn found_row() -> DiscoveryResult {
    let target = SearchTarget::new("Joe's Pizza", "123 Main St, Boston, MA")
        .with_ids("b1", "s1")
        .with_phone("617-555-0100");
    let mut result = DiscoveryResult::not_found(&target, "Found via google_custom_search");
    result.instagram_handle = "joespizzaboston".to_string();
    result.status = DiscoveryStatus::Ok;
    result.confidence = Some(ConfidenceScore::new(91.24));
    result.ai_confidence = Some(0.8);
    result.red_flags = vec!["bio has no food keywords".to_string()];
    result
}

#[test]
fn reads_canonical_headers() {
    let input = "BUSINESS_ID,STORE_ID,RESTAURANT NAME,ADDRESS,PHONE\n\
                 b1,s1,Joe's Pizza,\"123 Main St, Boston, MA\",617-555-0100\n\
                 b1,s2,Anna's Taqueria (MGH),\"55 Fruit St, Boston, MA\",\n";
    let targets = read_targets(input.as_bytes()).unwrap();
    assert_eq!(targets.len(), 2);
    assert_eq!(targets[0].restaurant_name, "Joe's Pizza");
    assert_eq!(targets[0].address, "123 Main St, Boston, MA");
    assert_eq!(targets[0].phone.as_deref(), Some("617-555-0100"));
    assert_eq!(targets[1].store_id, "s2");
    assert_eq!(targets[1].phone, None);
}

#[test]
fn accepts_snake_case_headers_without_phone() {
    let input = "business_id,store_id,restaurant_name,address\nb9,s9,Sweetgreen,\"1 Main St, Boston, MA\"\n";
    let targets = read_targets(input.as_bytes()).unwrap();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].business_id, "b9");
    assert_eq!(targets[0].phone, None);
}

#[test]
fn skips_rows_without_a_name() {
    let input = "BUSINESS_ID,STORE_ID,RESTAURANT NAME,ADDRESS\nb1,s1,,somewhere\nb1,s2,Joe's Pizza,Boston\n";
    let targets = read_targets(input.as_bytes()).unwrap();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].store_id, "s2");
}

#[test]
fn missing_required_column_is_reported() {
    let input = "BUSINESS_ID,RESTAURANT NAME,ADDRESS\nb1,Joe's Pizza,Boston\n";
    let err = read_targets(input.as_bytes()).unwrap_err();
    assert!(matches!(err, FinderError::MissingColumn("STORE ID")));
}

#[test]
fn csv_output_has_header_and_formatted_fields() {
    let mut buf = Vec::new();
    write_csv(&mut buf, &[found_row()]).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next().unwrap(), OUTPUT_COLUMNS.join(","));
    let row = lines.next().unwrap();
    assert!(row.starts_with("b1,s1,Joe's Pizza,\"123 Main St, Boston, MA\",617-555-0100,joespizzaboston,ok,"));
    assert!(row.contains(",91.2,High,"));
    assert!(row.contains(",0.80,"));
}

#[test]
fn atomic_write_replaces_content_and_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.json");
    atomic_write(&path, b"[1]").unwrap();
    atomic_write(&path, b"[1,2]").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1,2]");
    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 1);
}

#[test]
fn atomic_write_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results").join("out.csv");
    atomic_write(&path, b"x").unwrap();
    assert!(path.exists());
}

#[test]
fn json_file_round_trips_results() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    write_json_file(&path, &[found_row()]).unwrap();
    let parsed: Vec<DiscoveryResult> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed, vec![found_row()]);
}

#[test]
fn output_paths_are_timestamped() {
    let at = Local.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
    let (json, csv) = output_paths(Path::new("results"), at);
    assert_eq!(json, Path::new("results/igfind_results_20260304_050607.json"));
    assert_eq!(csv, Path::new("results/igfind_results_20260304_050607.csv"));
}
