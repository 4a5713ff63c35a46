#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use assert_cmd::Command;
use tempfile::TempDir;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(30);

#[allow(dead_code)]
pub const GENERATION_DATE: &str = "2025-06-01";

const SNAPSHOT: &str = r#"{
  "locales": [
    { "country_code": "US", "language_code": "es", "hreflang": "es-US", "is_active": true, "default_eligible": false },
    { "country_code": "US", "language_code": "en", "hreflang": "en-US", "is_active": true, "default_eligible": true },
    { "country_code": "MX", "language_code": "es", "hreflang": "es-MX", "is_active": false, "default_eligible": false }
  ],
  "concepts": [
    { "id": 1, "key": "city:miami" },
    { "id": 2, "key": "corridor:i-75" }
  ],
  "variants": [
    {
      "concept_id": 1, "country_code": "US", "language_code": "en", "hreflang": "en-US",
      "path": "/us/en/city/miami", "title": "Miami Heavy Haul Services",
      "meta_description": "Oversize load escorts and permits in Miami.",
      "indexing_mode": "index", "quality_score": 0.92, "template_key": "city",
      "updated_at": "2025-04-20T08:00:00Z", "is_default": true
    },
    {
      "concept_id": 1, "country_code": "US", "language_code": "es", "hreflang": "es-US",
      "path": "/us/es/city/miami", "title": "Servicios de carga pesada en Miami",
      "indexing_mode": "index", "quality_score": 0.81, "template_key": "city", "is_default": false
    },
    {
      "concept_id": 2, "country_code": "US", "language_code": "en", "hreflang": "en-US",
      "path": "/us/en/corridor/i-75", "title": "",
      "indexing_mode": "index", "quality_score": 0.7, "template_key": "corridor", "is_default": true
    },
    {
      "concept_id": 2, "country_code": "US", "language_code": "es", "hreflang": "es-US",
      "path": "/us/es/corridor/i-75", "title": "Corredor I-75",
      "indexing_mode": "preview", "quality_score": 0.4, "template_key": "corridor", "is_default": false
    }
  ]
}"#;

/// A temp directory holding a snapshot, a config file and an output root.
#[allow(dead_code)]
pub struct Fixture {
    pub dir: TempDir,
    pub config: PathBuf,
    pub out: PathBuf,
}

#[allow(dead_code)]
impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create fixture dir");
        fs::write(dir.path().join("snapshot.json"), SNAPSHOT).unwrap();
        let config = dir.path().join("locmesh.toml");
        fs::write(
            &config,
            "[site]\nbase_url = \"https://haulcommand.com\"\nname = \"Haul Command\"\n\n\
             [store]\nsnapshot = \"snapshot.json\"\n\n\
             [sitemap]\noutput_dir = \"public\"\nconcurrency = 2\n",
        )
        .unwrap();
        let out = dir.path().join("public");
        Self { dir, config, out }
    }

    /// A `locmesh` command pointed at this fixture's config.
    pub fn cmd(&self) -> Command {
        let mut cmd = locmesh_cmd(self.dir.path());
        cmd.arg("--config").arg(&self.config);
        cmd
    }

    /// Run `generate` for the fixed date and assert success.
    pub fn generate(&self) -> Vec<u8> {
        self.cmd()
            .args(["generate", "--date", GENERATION_DATE, "--format", "json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone()
    }

    pub fn published(&self, relative: &str) -> String {
        fs::read_to_string(self.out.join(relative)).unwrap()
    }
}

/// Create a `locmesh` command isolated from the caller's environment.
#[allow(dead_code)]
pub fn locmesh_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("locmesh"));
    cmd.timeout(CMD_TIMEOUT);
    for var in [
        "LOCMESH_CONFIG",
        "LOCMESH_BASE_URL",
        "LOCMESH_OUTPUT_DIR",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("HOME", home);
    cmd.env("XDG_CONFIG_HOME", home.join(".config"));
    cmd.env("NO_COLOR", "1");
    cmd
}
