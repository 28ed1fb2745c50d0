#![forbid(unsafe_code)]

//! Shared test tooling: structured JSON test records and property-test knobs.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

pub const TEST_LOG_SCHEMA_VERSION: &str = "evwire.test-log.v1";

/// When set, [`emit_test_log`] appends one JSON line per record to this path.
pub const TEST_LOG_PATH_ENV: &str = "EV_TEST_LOG_PATH";

/// Floor for property tests when neither `EV_PROPTEST_CASES` nor `CI` is set.
const LOCAL_CASE_FLOOR: u32 = 256;
const CI_CASE_FLOOR: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    Unit,
    Property,
    Integration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestResult {
    Pass,
    Fail,
}

impl TestResult {
    #[must_use]
    pub fn from_outcome<T, E>(outcome: &Result<T, E>) -> Self {
        if outcome.is_ok() { Self::Pass } else { Self::Fail }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestLogEnv {
    pub os: String,
    pub arch: String,
    pub cargo_target_dir: String,
    pub timestamp_unix_ms: u64,
}

/// One test outcome as a machine-readable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestLogV1 {
    pub schema_version: String,
    pub test_id: String,
    pub fixture_id: String,
    pub seed: Option<u64>,
    pub kind: TestKind,
    pub env: TestLogEnv,
    pub result: TestResult,
    pub duration_ms: u64,
    pub details: Option<String>,
}

impl TestLogV1 {
    #[must_use]
    pub fn new(
        test_id: impl Into<String>,
        fixture_id: impl Into<String>,
        kind: TestKind,
        result: TestResult,
    ) -> Self {
        Self {
            schema_version: TEST_LOG_SCHEMA_VERSION.to_owned(),
            test_id: test_id.into(),
            fixture_id: fixture_id.into(),
            seed: capture_proptest_seed(),
            kind,
            env: capture_env(),
            result,
            duration_ms: 0,
            details: None,
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Records the time elapsed since `start`.
    #[must_use]
    pub fn finished(mut self, start: Instant) -> Self {
        self.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Appends `log` as a single JSON line, creating parent directories.
pub fn append_test_log(path: &Path, log: &TestLogV1) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let line = log.to_json().map_err(std::io::Error::other)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}

/// Writes `log` to `EV_TEST_LOG_PATH` if it is set. Returns whether a line
/// was written.
pub fn emit_test_log(log: &TestLogV1) -> std::io::Result<bool> {
    match std::env::var_os(TEST_LOG_PATH_ENV) {
        Some(path) if !path.is_empty() => {
            append_test_log(Path::new(&path), log)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

#[must_use]
pub fn capture_env() -> TestLogEnv {
    TestLogEnv {
        os: std::env::consts::OS.to_owned(),
        arch: std::env::consts::ARCH.to_owned(),
        cargo_target_dir: std::env::var("CARGO_TARGET_DIR")
            .unwrap_or_else(|_| "<default>".to_owned()),
        timestamp_unix_ms: now_unix_ms_u64(),
    }
}

/// Lowercase hex SHA-256 of the fixture's JSON form.
pub fn fixture_id_from_json<T: Serialize>(fixture: &T) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(fixture)?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

#[must_use]
pub fn property_test_case_count() -> u32 {
    if let Ok(raw) = std::env::var("EV_PROPTEST_CASES")
        && let Ok(parsed) = raw.parse::<u32>()
        && parsed > 0
    {
        return parsed;
    }

    if std::env::var_os("CI").is_some() {
        CI_CASE_FLOOR
    } else {
        LOCAL_CASE_FLOOR
    }
}

#[must_use]
pub fn capture_proptest_seed() -> Option<u64> {
    if let Ok(raw) = std::env::var("EV_PROPTEST_SEED")
        && let Ok(seed) = raw.parse::<u64>()
    {
        return Some(seed);
    }

    std::env::var("PROPTEST_RNG_SEED")
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
}

#[must_use]
pub fn test_id(module_path: &str, test_name: &str) -> String {
    format!("{module_path}::{test_name}")
}

fn now_unix_ms_u64() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{
        TEST_LOG_SCHEMA_VERSION, TestKind, TestLogV1, TestResult, append_test_log,
        fixture_id_from_json, property_test_case_count, test_id,
    };
    use std::time::Instant;

    #[test]
    fn fixture_digest_is_deterministic() {
        let fixture = serde_json::json!({
            "kind": "int",
            "value": 1
        });
        let digest_a = fixture_id_from_json(&fixture).expect("digest should build");
        let digest_b = fixture_id_from_json(&fixture).expect("digest should build");
        assert_eq!(digest_a, digest_b);
        assert_eq!(digest_a.len(), 64);
        assert!(digest_a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fixture_digest_distinguishes_fixtures() {
        let a = fixture_id_from_json(&("int", 1_i64)).expect("digest");
        let b = fixture_id_from_json(&("int", 2_i64)).expect("digest");
        assert_ne!(a, b);
    }

    #[test]
    fn property_case_count_has_default_floor() {
        assert!(property_test_case_count() >= 1);
    }

    #[test]
    fn log_round_trips_through_json() {
        let log = TestLogV1::new(
            test_id(module_path!(), "log_round_trips_through_json"),
            "fixture-id",
            TestKind::Unit,
            TestResult::Pass,
        )
        .with_details("tag=4 payload=00000001");
        assert_eq!(log.schema_version, TEST_LOG_SCHEMA_VERSION);
        let encoded = log.to_json().expect("serialize should work");
        assert!(encoded.contains("\"kind\":\"unit\""));
        let decoded: TestLogV1 = serde_json::from_str(&encoded).expect("deserialize should work");
        assert_eq!(decoded, log);
    }

    #[test]
    fn append_writes_one_json_line_per_record() {
        let path = std::env::temp_dir()
            .join(format!("ev_test_utils_{}", std::process::id()))
            .join("logs.jsonl");
        let _ = std::fs::remove_file(&path);

        let start = Instant::now();
        let pass = TestLogV1::new("suite::a", "fx-a", TestKind::Integration, TestResult::Pass)
            .finished(start);
        let fail = TestLogV1::new("suite::b", "fx-b", TestKind::Property, TestResult::Fail);
        append_test_log(&path, &pass).expect("first append");
        append_test_log(&path, &fail).expect("second append");

        let raw = std::fs::read_to_string(&path).expect("log readable");
        let _ = std::fs::remove_file(&path);
        let records: Vec<TestLogV1> = raw
            .lines()
            .map(|line| serde_json::from_str(line).expect("each line is a record"))
            .collect();
        assert_eq!(records, vec![pass, fail]);
    }

    #[test]
    fn result_follows_outcome() {
        assert_eq!(TestResult::from_outcome(&Ok::<(), ()>(())), TestResult::Pass);
        assert_eq!(TestResult::from_outcome(&Err::<(), _>("boom")), TestResult::Fail);
    }
}
