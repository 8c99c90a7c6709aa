use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const CASES: &str = r#"{
  "modified": "2020-10-19T08:00:00+02:00",
  "source": "fixture",
  "data": [
    {"datum": "2020-03-01", "vek": 10, "pohlavi": "M"},
    {"datum": "2020-03-02", "vek": 16, "pohlavi": "Z"},
    {"datum": "2020-03-03", "vek": null, "pohlavi": "M"}
  ]
}"#;

const RECOVERED: &str = r#"{
  "modified": "2020-10-19T08:00:00+02:00",
  "data": [{"datum": "2020-03-20", "vek": 16, "pohlavi": "Z"}]
}"#;

const DEATHS: &str = r#"{
  "modified": "2020-10-19T08:00:00+02:00",
  "data": [{"datum": "2020-04-01", "vek": 91, "pohlavi": "M"}]
}"#;

struct TestEnv {
    tmp: TempDir,
    cache: PathBuf,
}

impl TestEnv {
    fn new(cases: &str) -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let cache = tmp.path().join("cache");
        fs::create_dir_all(&cache).expect("create cache dir");
        fs::write(cache.join("cases.json"), cases).expect("write cases");
        fs::write(cache.join("recovered.json"), RECOVERED).expect("write recovered");
        fs::write(cache.join("deaths.json"), DEATHS).expect("write deaths");
        Self { tmp, cache }
    }

    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("agestats");
        cmd.current_dir(self.tmp.path())
            .env_remove("AGESTATS_CACHE_DIR")
            .env_remove("AGESTATS_BASE_URL")
            .arg("--quiet")
            .arg("--cache-dir")
            .arg(&self.cache);
        cmd
    }

    fn run_stdout(&self, args: &[&str]) -> String {
        let out = self
            .cmd()
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        String::from_utf8(out).expect("utf-8 output")
    }
}

#[test]
fn wikitext_report_from_cache() {
    let env = TestEnv::new(CASES);
    let out = env.run_stdout(&[]);

    assert!(out.starts_with("{| class=\"wikitable"));
    assert!(out.contains("as of 19 October 2020"));
    assert!(out.contains("! 0 - 14\n| 1 || 0 || 1 || 2 || 0 || 0 || 0 || 0 || 0 || 0 || 0 || 0\n"));
    assert!(out.contains("! 15 - 24\n| 0 || 1 || 0 || 1 || 0 || 1 || 0 || 1 ||"));
    assert!(out.contains("! 85+\n| 0 || 0 || 0 || 0 || 0 || 0 || 0 || 0 || 1 || 0 || 0 || 1\n"));
}

#[test]
fn json_report_totals() {
    let env = TestEnv::new(CASES);
    let out = env.run_stdout(&["--format", "json"]);
    let report: Value = serde_json::from_str(&out).expect("valid json output");

    assert_eq!(report["age_groups"].as_array().map(Vec::len), Some(9));
    assert_eq!(report["total"]["cases"]["total"], 3);
    assert_eq!(report["total"]["cases"]["unknown"], 1);
    assert_eq!(report["total"]["recovered"]["female"], 1);
    assert_eq!(report["total"]["deaths"]["male"], 1);
    assert_eq!(report["age_groups"][8]["age_range"], "85+");
}

#[test]
fn report_written_to_output_file() {
    let env = TestEnv::new(CASES);
    let target = env.tmp.path().join("stats.md");

    env.cmd()
        .args(["--format", "markdown", "--output"])
        .arg(&target)
        .assert()
        .success();

    let written = fs::read_to_string(&target).expect("report file");
    assert!(written.contains("| **Total** | **1** | **1** | **1** | **3** |"));
}

#[test]
fn malformed_record_aborts() {
    let env = TestEnv::new(
        r#"{"modified": "2020-10-19T08:00:00+02:00",
            "data": [{"vek": 10, "pohlavi": "M"}, {"vek": 14.9999, "pohlavi": "M"}]}"#,
    );

    let out = env.cmd().assert().failure().get_output().clone();
    let stderr = String::from_utf8_lossy(&out.stderr);

    assert!(stderr.contains("malformed record #1 in cases dataset"));
    assert!(out.stdout.is_empty());
}

#[test]
fn config_file_sets_format() {
    let env = TestEnv::new(CASES);
    fs::write(
        env.tmp.path().join(".agestats.toml"),
        "[report]\nformat = \"json\"\n",
    )
    .expect("write config");

    let out = env.run_stdout(&[]);
    assert!(serde_json::from_str::<Value>(&out).is_ok());
}

#[test]
fn config_file_with_non_http_base_url_is_rejected() {
    let env = TestEnv::new(CASES);
    fs::write(
        env.tmp.path().join(".agestats.toml"),
        "[source]\nbase_url = \"ftp://example.org/api\"\n",
    )
    .expect("write config");

    let out = env.cmd().assert().failure().get_output().clone();
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Base URL must start with"));
}

#[test]
fn init_config_creates_file() {
    let tmp = TempDir::new().expect("create temp dir");

    cargo_bin_cmd!("agestats")
        .current_dir(tmp.path())
        .arg("--init-config")
        .assert()
        .success();

    let content = fs::read_to_string(tmp.path().join(".agestats.toml")).expect("config file");
    assert!(content.contains("[source]"));

    cargo_bin_cmd!("agestats")
        .current_dir(tmp.path())
        .arg("--init-config")
        .assert()
        .failure();
}

#[test]
fn verbose_and_quiet_conflict() {
    let env = TestEnv::new(CASES);
    env.cmd().arg("--verbose").assert().failure();
}
