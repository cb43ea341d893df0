//! End-to-end tests for the cb-core binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// A command isolated from the caller's settings and log environment.
fn cb_core() -> Command {
    let mut cmd = Command::cargo_bin("cb-core").unwrap();
    cmd.env_remove("CB_CONFIG")
        .env_remove("CB_LOG")
        .env_remove("CB_LOG_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

fn settings_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

// ============================================================================
// Help and argument errors
// ============================================================================

#[test]
fn test_help_lists_subcommands() {
    cb_core()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("poisson-rate")
                .and(predicate::str::contains("normal-mean"))
                .and(predicate::str::contains("normal-diff")),
        );
}

#[test]
fn test_unknown_flag_is_args_error() {
    cb_core()
        .args(["poisson-rate", "--events", "3", "--intervals", "2", "--bogus"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("--bogus"));
}

#[test]
fn test_missing_sample_is_args_error() {
    cb_core().args(["poisson-rate", "--events", "3"]).assert().code(10);
}

// ============================================================================
// poisson-rate
// ============================================================================

#[test]
fn test_poisson_flat_prior_text() {
    cb_core()
        .args(["poisson-rate", "--events", "10", "--intervals", "5"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Poisson rate posterior")
                .and(predicate::str::contains("Gamma(shape = 11, rate = 5)"))
                .and(predicate::str::contains("mean:                   2.2"))
                .and(predicate::str::contains("credible interval (95%):"))
                .and(predicate::str::contains("Prob.       Quantile")),
        );
}

#[test]
fn test_poisson_flat_prior_json() {
    let json = stdout_json(cb_core().args([
        "poisson-rate",
        "--events",
        "10",
        "--intervals",
        "5",
        "--format",
        "json",
    ]));
    assert_eq!(json["posterior"]["shape"], 11.0);
    assert_eq!(json["posterior"]["rate"], 5.0);
    assert_eq!(json["mean"], 2.2);
    assert_eq!(json["prior"]["kind"], "flat");
    assert_eq!(json["quantiles"].as_array().unwrap().len(), 9);
    let low = json["credible_interval"]["low"].as_f64().unwrap();
    let high = json["credible_interval"]["high"].as_f64().unwrap();
    assert!((low - 1.098_232).abs() < 1e-5, "low={low}");
    assert!((high - 3.678_071).abs() < 1e-5, "high={high}");
    assert!(json.get("tests").is_none());
}

#[test]
fn test_poisson_counts_and_tests() {
    let json = stdout_json(cb_core().args([
        "poisson-rate",
        "--counts",
        "2,3,1,2,2",
        "--null-rate",
        "1",
        "--format",
        "json",
    ]));
    assert_eq!(json["sample"]["total_events"], 10);
    assert_eq!(json["sample"]["intervals"], 5);
    assert_eq!(json["tests"]["one_sided"]["reject"], true);
    assert_eq!(json["tests"]["two_sided"]["reject"], true);
    assert_eq!(json["tests"]["one_sided"]["evidence"]["kind"], "one_sided");
}

#[test]
fn test_poisson_odds_far_above_posterior_are_numbers() {
    let json = stdout_json(cb_core().args([
        "poisson-rate",
        "--events",
        "10",
        "--intervals",
        "5",
        "--null-rate",
        "100",
        "--alpha",
        "1e-17",
        "--format",
        "json",
    ]));
    let odds = &json["tests"]["one_sided"]["evidence"]["odds"];
    assert!(odds.is_f64(), "odds serialized as {odds}");
    assert!(json["credible_interval"]["high"].is_f64());
    assert_eq!(json["tests"]["two_sided"]["reject"], true);
}

#[test]
fn test_poisson_unbounded_odds_is_args_error() {
    cb_core()
        .args([
            "poisson-rate",
            "--events",
            "10",
            "--intervals",
            "5",
            "--null-rate",
            "1000",
        ])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("null_rate"));
}

#[test]
fn test_poisson_gamma_prior_from_mean_std() {
    let json = stdout_json(cb_core().args([
        "poisson-rate",
        "--events",
        "10",
        "--intervals",
        "5",
        "--prior",
        "gamma",
        "--prior-mean",
        "2",
        "--prior-std",
        "1",
        "--format",
        "json",
    ]));
    assert_eq!(json["prior"]["shape"], 4.0);
    assert_eq!(json["prior"]["rate"], 2.0);
    assert_eq!(json["posterior"]["shape"], 14.0);
    assert_eq!(json["posterior"]["rate"], 7.0);
    assert_eq!(json["equivalent_prior_sample_size"], 2);
}

#[test]
fn test_poisson_seeded_draws_are_reproducible() {
    let args = [
        "poisson-rate",
        "--events",
        "10",
        "--intervals",
        "5",
        "--draws",
        "500",
        "--seed",
        "7",
        "--format",
        "json",
    ];
    let first = stdout_json(cb_core().args(args));
    let second = stdout_json(cb_core().args(args));
    assert_eq!(first["draws"], second["draws"]);
    let mean = first["draws"]["mean"].as_f64().unwrap();
    assert!((mean - 2.2).abs() < 0.15, "draw mean={mean}");
}

#[test]
fn test_poisson_zero_intervals_is_args_error() {
    cb_core()
        .args(["poisson-rate", "--events", "3", "--intervals", "0"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("sample.intervals"));
}

#[test]
fn test_poisson_alpha_out_of_range_json_error() {
    cb_core()
        .args([
            "poisson-rate",
            "--events",
            "3",
            "--intervals",
            "2",
            "--alpha",
            "1",
            "--format",
            "json",
        ])
        .assert()
        .code(10)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("\"ERR_ARGS\"").and(predicate::str::contains("alpha")));
}

// ============================================================================
// normal-mean
// ============================================================================

#[test]
fn test_normal_mean_discrete_prior() {
    let json = stdout_json(cb_core().args([
        "normal-mean",
        "--observations",
        "1.52,0.02,3.35,3.49,1.82",
        "--sigma",
        "1",
        "--discrete-values",
        "2,2.5,3,3.5,4",
        "--discrete-masses",
        "0.1,0.2,0.4,0.2,0.1",
        "--format",
        "json",
    ]));
    assert_eq!(json["model"], "discrete");
    assert_eq!(json["mode"], 2.5);
    let masses: Vec<f64> = json["posterior"]["masses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m.as_f64().unwrap())
        .collect();
    assert!((masses.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert!(masses[0] > masses[4]);
}

#[test]
fn test_normal_mean_discrete_length_mismatch() {
    cb_core()
        .args([
            "normal-mean",
            "--observations",
            "1,2",
            "--sigma",
            "1",
            "--discrete-values",
            "1,2,3",
            "--discrete-masses",
            "0.5,0.5",
        ])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("3 values but 2 masses"));
}

#[test]
fn test_normal_mean_normal_prior_summary() {
    let json = stdout_json(cb_core().args([
        "normal-mean",
        "--count",
        "20",
        "--mean",
        "0",
        "--sigma",
        "1",
        "--prior",
        "normal",
        "--prior-mean",
        "0",
        "--prior-std",
        "1",
        "--format",
        "json",
    ]));
    assert_eq!(json["model"], "known_variance");
    let std = json["posterior"]["std"].as_f64().unwrap();
    assert!((std - (1.0f64 / 21.0).sqrt()).abs() < 1e-12);
}

#[test]
fn test_normal_mean_unknown_variance_uses_student_t() {
    let json = stdout_json(cb_core().args([
        "normal-mean",
        "--observations",
        "-1.2,0.4,1.1,-0.3,0.9",
        "--format",
        "json",
    ]));
    assert_eq!(json["model"], "unknown_variance");
    assert_eq!(json["posterior"]["df"], 4.0);
}

#[test]
fn test_normal_prior_needs_both_parameters() {
    cb_core()
        .args([
            "normal-mean",
            "--observations",
            "1,2,3",
            "--sigma",
            "1",
            "--prior",
            "normal",
            "--prior-mean",
            "0",
        ])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("--prior-std"));
}

// ============================================================================
// normal-diff
// ============================================================================

#[test]
fn test_normal_diff_known_variance() {
    let json = stdout_json(cb_core().args([
        "normal-diff",
        "--observations1",
        "12,11,13,12",
        "--observations2",
        "10,9,11,10,10,9,11,10,10",
        "--sigma1",
        "2",
        "--sigma2",
        "3",
        "--format",
        "json",
    ]));
    assert_eq!(json["model"], "known_variance");
    assert_eq!(json["posterior"]["mean"], 2.0);
    let std = json["posterior"]["std"].as_f64().unwrap();
    assert!((std - 2f64.sqrt()).abs() < 1e-12);
}

#[test]
fn test_normal_diff_satterthwaite() {
    let json = stdout_json(cb_core().args([
        "normal-diff",
        "--observations1",
        "5.1,4.8,5.6,5.0,4.9",
        "--observations2",
        "4.2,4.0,4.6,3.9",
        "--format",
        "json",
    ]));
    assert_eq!(json["model"], "satterthwaite");
    let nu = json["effective_df"].as_f64().unwrap();
    let df = json["posterior"]["df"].as_f64().unwrap();
    assert!((df - nu).abs() <= 0.5);
    let low = json["credible_interval"]["low"].as_f64().unwrap();
    assert!(low > 0.0, "the means clearly differ: low={low}");
}

#[test]
fn test_normal_diff_needs_two_points_without_sigma() {
    cb_core()
        .args(["normal-diff", "--observations1", "1", "--observations2", "2,3"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("observations"));
}

// ============================================================================
// Settings and logging
// ============================================================================

#[test]
fn test_settings_file_sets_format_and_alpha() {
    let file = settings_file("alpha = 0.1\nprobabilities = [0.5]\noutput = \"json\"\n");
    let json = stdout_json(cb_core().args([
        "--config",
        file.path().to_str().unwrap(),
        "poisson-rate",
        "--events",
        "10",
        "--intervals",
        "5",
    ]));
    assert_eq!(json["alpha"], 0.1);
    assert_eq!(json["quantiles"].as_array().unwrap().len(), 1);
}

#[test]
fn test_settings_from_environment() {
    let file = settings_file("output = \"json\"\n");
    let json = stdout_json(
        cb_core()
            .env("CB_CONFIG", file.path())
            .args(["poisson-rate", "--events", "1", "--intervals", "1"]),
    );
    assert_eq!(json["posterior"]["shape"], 2.0);
}

#[test]
fn test_cli_format_overrides_settings() {
    let file = settings_file("output = \"json\"\n");
    cb_core()
        .args(["--config", file.path().to_str().unwrap(), "--format", "text"])
        .args(["poisson-rate", "--events", "1", "--intervals", "1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Poisson rate posterior"));
}

#[test]
fn test_invalid_settings_is_config_error() {
    let file = settings_file("alpha = 1.5\n");
    cb_core()
        .args(["--config", file.path().to_str().unwrap()])
        .args(["poisson-rate", "--events", "1", "--intervals", "1"])
        .assert()
        .code(11)
        .stderr(predicate::str::contains("alpha"));
}

#[test]
fn test_missing_settings_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    cb_core()
        .args(["--config", path.to_str().unwrap()])
        .args(["poisson-rate", "--events", "1", "--intervals", "1"])
        .assert()
        .code(11)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_jsonl_debug_logs_on_stderr() {
    cb_core()
        .args(["--log-level", "debug", "--log-format", "jsonl", "--format", "json"])
        .args(["poisson-rate", "--events", "10", "--intervals", "5"])
        .assert()
        .success()
        .stderr(
            predicate::str::contains("\"level\":\"DEBUG\"")
                .and(predicate::str::contains("poisson rate posterior")),
        )
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_default_log_level_keeps_stderr_quiet() {
    cb_core()
        .args(["poisson-rate", "--events", "10", "--intervals", "5"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}
