#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use predicates::prelude::*;
use serde_json::Value;

use common::Fixture;

fn json(fixture: &Fixture, args: &[&str]) -> Value {
    let out = fixture
        .cmd()
        .args(args)
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&out).unwrap()
}

#[test]
fn meta_for_known_path() {
    let fixture = Fixture::new();
    let contract = json(&fixture, &["meta", "/us/en/city/miami"]);

    assert_eq!(contract["title"], "Miami Heavy Haul Services");
    assert_eq!(contract["canonical"], "https://haulcommand.com/us/en/city/miami");
    assert_eq!(contract["robots"]["index"], true);
    assert_eq!(
        contract["alternates"]["languages"]["es-US"],
        "https://haulcommand.com/us/es/city/miami"
    );
    assert_eq!(contract["xDefault"], "https://haulcommand.com/us/en/city/miami");
    assert_eq!(contract["openGraph"]["siteName"], "Haul Command");
    assert_eq!(contract["openGraph"]["locale"], "en_US");
}

#[test]
fn meta_for_unknown_path_is_minimal() {
    let fixture = Fixture::new();
    let contract = json(&fixture, &["meta", "/us/en/city/atlantis"]);

    assert_eq!(contract["title"], "Atlantis City | Haul Command");
    assert_eq!(contract["robots"]["index"], false);
    assert_eq!(contract["robots"]["follow"], true);
    assert!(contract.get("xDefault").is_none());
    assert!(contract.get("description").is_none());
}

#[test]
fn base_url_override_applies() {
    let fixture = Fixture::new();
    let out = fixture
        .cmd()
        .env("LOCMESH_BASE_URL", "https://staging.haulcommand.com/")
        .args(["meta", "/us/en/city/miami", "--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let contract: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(
        contract["canonical"],
        "https://staging.haulcommand.com/us/en/city/miami"
    );
}

#[test]
fn mesh_by_concept_key() {
    let fixture = Fixture::new();
    let mesh = json(&fixture, &["mesh", "--concept", "city:miami"]);

    assert_eq!(mesh["conceptId"], 1);
    let tags: Vec<&str> = mesh["links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["hreflang"].as_str().unwrap())
        .collect();
    assert_eq!(tags, ["en-US", "es-US", "x-default"]);
}

#[test]
fn mesh_by_path_text() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .args(["mesh", "/us/es/city/miami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("x-default  https://haulcommand.com/us/en/city/miami"));
}

#[test]
fn mesh_for_unknown_concept_fails() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .args(["mesh", "--concept", "city:atlantis"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown concept 'city:atlantis'"));
}

#[test]
fn health_after_generate_is_ok() {
    let fixture = Fixture::new();
    fixture.generate();

    let report = json(&fixture, &["health"]);
    assert_eq!(report["overallStatus"], "ok");
    assert_eq!(report["urlCount"], 3);
}

#[test]
fn health_without_tree_fails() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .args(["health", "--format", "json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#""overallStatus": "error""#));
}

#[test]
fn health_reports_missing_partition() {
    let fixture = Fixture::new();
    fixture.generate();
    std::fs::remove_file(fixture.out.join("sitemaps/us-en/corridor.xml")).unwrap();

    fixture
        .cmd()
        .arg("health")
        .assert()
        .failure()
        .stdout(predicate::str::contains("✗ sitemaps/us-en/corridor.xml"));
}
