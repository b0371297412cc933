use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd(data_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo_bin!("skyfare"));
    cmd.env_remove("RAPIDAPI_KEY")
        .env_remove("SKYFARE_BASE_URL")
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(data_dir.path());
    cmd
}

fn flights_args() -> Vec<&'static str> {
    vec![
        "flights",
        "--from",
        "jfk",
        "--from-entity",
        "95565058",
        "--to",
        "CDG",
        "--to-entity",
        "95565041",
    ]
}

const FAVORITE_ARGS: [&str; 9] = [
    "favorite",
    "-f",
    "JFK",
    "--from-entity",
    "95565058",
    "-t",
    "CDG",
    "--to-entity",
    "95565041",
];

#[test]
fn top_level_help() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Search airports and flights from the terminal",
        ))
        .stdout(predicate::str::contains("airports"))
        .stdout(predicate::str::contains("lookup"))
        .stdout(predicate::str::contains("RAPIDAPI_KEY"));
}

#[test]
fn top_level_version() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("skyfare 0.3.0"));
}

#[test]
fn flights_help_lists_options() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(["flights", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-f, --from <SKY_ID>"))
        .stdout(predicate::str::contains("-t, --to <SKY_ID>"))
        .stdout(predicate::str::contains("-d, --date <YYYY-MM-DD>"))
        .stdout(predicate::str::contains("--return-date"))
        .stdout(predicate::str::contains("--cabin <CLASS>"))
        .stdout(predicate::str::contains("--top <N>"))
        .stdout(predicate::str::contains("Round-trip:"));
}

#[test]
fn popular_needs_no_network() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .arg("popular")
        .assert()
        .success()
        .stdout(predicate::str::contains("Paris"))
        .stdout(predicate::str::contains("Tokyo"));
}

#[test]
fn popular_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = cmd(&dir).args(["popular", "--json"]).assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(parsed.as_array().map(Vec::len), Some(6));
    assert_eq!(parsed[0]["airportCode"], "JFK");
}

#[test]
fn empty_preferences() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .arg("recent")
        .assert()
        .success()
        .stdout(predicate::str::contains("No recent searches."));
    cmd(&dir)
        .arg("favorites")
        .assert()
        .success()
        .stdout(predicate::str::contains("No favorites yet."));
}

#[test]
fn favorite_toggles_and_persists() {
    let dir = tempfile::tempdir().unwrap();

    cmd(&dir)
        .args(FAVORITE_ARGS)
        .assert()
        .success()
        .stdout(predicate::str::contains("JFK → CDG added to favorites"));

    let output = cmd(&dir).args(["favorites", "--json"]).assert().success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(parsed[0]["origin"]["skyId"], "JFK");
    assert_eq!(parsed[0]["destination"]["skyId"], "CDG");
    assert!(dir.path().join("favorites.json").exists());

    cmd(&dir)
        .args(FAVORITE_ARGS)
        .assert()
        .success()
        .stdout(predicate::str::contains("removed from favorites"));

    cmd(&dir)
        .arg("favorites")
        .assert()
        .success()
        .stdout(predicate::str::contains("No favorites yet."));
}

#[test]
fn corrupt_preferences_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("recentSearches.json"), "{oops").unwrap();

    cmd(&dir)
        .arg("recent")
        .assert()
        .success()
        .stdout(predicate::str::contains("No recent searches."));
}

#[test]
fn short_airport_query_skips_request() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(["--base-url", "http://127.0.0.1:9/unused", "airports", "NY"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No airports found."));
}

#[test]
fn invalid_date_fails() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(flights_args())
        .args(["-d", "2026-02-30"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("YYYY-MM-DD"));
}

#[test]
fn invalid_cabin_fails() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(flights_args())
        .args(["-d", "2026-03-01", "--cabin", "luxury"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid cabin class"));
}

#[test]
fn return_before_departure_fails() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(flights_args())
        .args(["-d", "2026-03-10", "--return-date", "2026-03-01"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("before departure"));
}

#[test]
fn json_mode_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = cmd(&dir)
        .args(flights_args())
        .args(["-d", "2026-03-01", "--adults", "0", "--json"])
        .assert()
        .code(2);
    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON error");
    assert_eq!(parsed["error"]["kind"], "validation_error");
    assert!(parsed["error"]["message"]
        .as_str()
        .unwrap()
        .contains("at least one adult"));
    assert_eq!(parsed["error"].as_object().map(|o| o.len()), Some(2));
}

#[test]
fn unwritable_data_dir_exits_with_storage_code() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    Command::new(assert_cmd::cargo_bin!("skyfare"))
        .env_remove("SKYFARE_DATA_DIR")
        .arg("--data-dir")
        .arg(&blocker)
        .args(FAVORITE_ARGS)
        .assert()
        .code(7)
        .stderr(predicate::str::contains("\"favorites\""));
}

#[test]
fn passenger_overflow_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(flights_args())
        .args(["-d", "2026-03-01", "--adults", "4294967295", "--children", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("exceeds maximum of 9"));
}

#[test]
fn invalid_nearby_coordinates_fail() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args(["nearby", "--lat", "123", "--lng", "-74.0"])
        .assert()
        .code(2);
}

#[test]
fn failed_flight_search_is_still_recorded() {
    let dir = tempfile::tempdir().unwrap();

    cmd(&dir)
        .args(["--base-url", "http://127.0.0.1:9/api/v1/flights", "--timeout", "5"])
        .args(flights_args())
        .args(["-d", "2026-03-01"])
        .assert()
        .failure();

    cmd(&dir)
        .arg("recent")
        .assert()
        .success()
        .stdout(predicate::str::contains("JFK"))
        .stdout(predicate::str::contains("CDG"))
        .stdout(predicate::str::contains("2026-03-01"));
}
