use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const FRONT_PAGE: &str = r#"<html><body>
  <div class="box">
    <h2 class="conHeadline">Meistgelesen</h2>
    <a href="/other.html">Not part of the ranking</a>
  </div>
  <div class="box">
    <h2 class="conHeadline">Top 10</h2>
    <ul>
      <li><a href="/inland/a.html">Erste Meldung</a></li>
      <li><a href="/ausland/b.html">Zweite Meldung</a></li>
      <li><a href="/wirtschaft/c.html">Dritte Meldung</a></li>
    </ul>
  </div>
</body></html>
"#;

const NEXT_PAGE: &str = r#"<html><body>
  <div class="box">
    <h2 class="conHeadline">Top 10</h2>
    <ul>
      <li><a href="/ausland/b.html">Zweite Meldung</a></li>
      <li><a href="/sport/d.html">Vierte Meldung</a></li>
      <li><a href="/inland/a.html">Erste Meldung (aktualisiert)</a></li>
    </ul>
  </div>
</body></html>
"#;

const REPEATED_LINK_PAGE: &str = r#"<html><body>
  <div class="box">
    <h2 class="conHeadline">Top 10</h2>
    <ul>
      <li><a href="/inland/a.html">Erste Meldung</a></li>
      <li><a href="/ausland/b.html">Zweite Meldung</a></li>
      <li><a href="/inland/a.html">Erste Meldung</a></li>
    </ul>
  </div>
</body></html>
"#;

fn topten_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("topten");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let pages_dir = root.join("pages");
    fs::create_dir_all(&pages_dir).unwrap();
    fs::write(pages_dir.join("day1.html"), FRONT_PAGE).unwrap();
    fs::write(pages_dir.join("day2.html"), NEXT_PAGE).unwrap();
    fs::write(pages_dir.join("repeated.html"), REPEATED_LINK_PAGE).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/topten.sqlite"

[ingest]
expected_len = 3

[server]
bind = "127.0.0.1:0"
"#,
        root.display()
    );

    let config_path = config_dir.join("topten.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_topten(config: &Path, args: &[&str]) -> Output {
    Command::new(topten_binary())
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("failed to run topten binary")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command failed:\nstdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn ingest_page(config: &Path, root: &Path, page: &str, at: &str) -> Output {
    let html = root.join("pages").join(page);
    run_topten(
        config,
        &[
            "ingest",
            "--html",
            html.to_str().unwrap(),
            "--at",
            at,
            "--skip-details",
        ],
    )
}

#[test]
fn test_init_creates_database() {
    let (tmp, config) = setup_test_env();
    let output = run_topten(&config, &["init"]);
    assert_success(&output);
    assert!(stdout_of(&output).contains("Database initialized successfully"));
    assert!(tmp.path().join("data/topten.sqlite").exists());
}

#[test]
fn test_init_is_idempotent() {
    let (_tmp, config) = setup_test_env();
    assert_success(&run_topten(&config, &["init"]));
    assert_success(&run_topten(&config, &["init"]));
}

#[test]
fn test_ingest_from_saved_page() {
    let (tmp, config) = setup_test_env();
    assert_success(&run_topten(&config, &["init"]));

    let output = ingest_page(&config, tmp.path(), "day1.html", "2024-01-01T09:30:00Z");
    assert_success(&output);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("ingest 2024-01-01T00:00:00+00:00"), "{}", stdout);
    assert!(stdout.contains("recorded 3 positions (3 new articles)"), "{}", stdout);
}

#[test]
fn test_ingest_rerun_reports_already_recorded() {
    let (tmp, config) = setup_test_env();
    assert_success(&run_topten(&config, &["init"]));
    assert_success(&ingest_page(&config, tmp.path(), "day1.html", "2024-01-01"));

    let output = ingest_page(&config, tmp.path(), "day1.html", "2024-01-01T18:00:00Z");
    assert_success(&output);
    assert!(stdout_of(&output).contains("already recorded for 2024-01-01T00:00:00+00:00"));
}

#[test]
fn test_ingest_rejects_wrong_list_length() {
    let (tmp, config) = setup_test_env();
    assert_success(&run_topten(&config, &["init"]));

    let config_text = fs::read_to_string(&config)
        .unwrap()
        .replace("expected_len = 3", "expected_len = 10");
    fs::write(&config, config_text).unwrap();

    let output = ingest_page(&config, tmp.path(), "day1.html", "2024-01-01");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("expected 10"), "{}", stderr);
}

#[test]
fn test_ingest_fails_on_repeated_link() {
    let (tmp, config) = setup_test_env();
    assert_success(&run_topten(&config, &["init"]));

    let output = ingest_page(&config, tmp.path(), "repeated.html", "2024-01-01");
    assert!(!output.status.success());
    assert!(!stdout_of(&output).contains("already recorded"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("repeats the link"), "{}", stderr);

    // The day is still free for a valid list.
    assert_success(&ingest_page(&config, tmp.path(), "day1.html", "2024-01-01"));
}

#[test]
fn test_ratings_json_over_two_days() {
    let (tmp, config) = setup_test_env();
    assert_success(&run_topten(&config, &["init"]));
    assert_success(&ingest_page(&config, tmp.path(), "day1.html", "2024-01-01"));
    assert_success(&ingest_page(&config, tmp.path(), "day2.html", "2024-01-02"));

    let output = run_topten(
        &config,
        &["ratings", "--from", "2024-01-01", "--to", "2024-01-02", "--json"],
    );
    assert_success(&output);

    let page: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(page["title"], "top 10 - archiv");
    assert_eq!(page["prev_date"], "2023-12-31");
    assert_eq!(page["next_date"], "2024-01-03");

    let articles = page["articles"].as_array().unwrap();
    let links: Vec<&str> = articles
        .iter()
        .map(|a| a["article"]["link"].as_str().unwrap())
        .collect();
    // a: 1 + 0.25, b: 0.5 + 1, c: 0.25, d: 0.5
    assert_eq!(
        links,
        vec![
            "/ausland/b.html",
            "/inland/a.html",
            "/sport/d.html",
            "/wirtschaft/c.html"
        ]
    );
    assert_eq!(articles[0]["rating"], 1.5);
    assert_eq!(articles[1]["rating"], 1.25);

    // First-seen title is kept.
    assert_eq!(articles[1]["article"]["title"], "Erste Meldung");
}

#[test]
fn test_ratings_table_for_empty_day() {
    let (_tmp, config) = setup_test_env();
    assert_success(&run_topten(&config, &["init"]));

    let output = run_topten(&config, &["ratings", "--date", "2024-06-01"]);
    assert_success(&output);
    assert!(stdout_of(&output).contains("No results."));
}

#[test]
fn test_ratings_rejects_inverted_range() {
    let (_tmp, config) = setup_test_env();
    assert_success(&run_topten(&config, &["init"]));

    let output = run_topten(
        &config,
        &["ratings", "--from", "2024-02-01", "--to", "2024-01-01"],
    );
    assert!(!output.status.success());
}

#[test]
fn test_details_pending_dry_run() {
    let (tmp, config) = setup_test_env();
    assert_success(&run_topten(&config, &["init"]));
    assert_success(&ingest_page(&config, tmp.path(), "day1.html", "2024-01-01"));

    let output = run_topten(&config, &["details", "pending", "--dry-run", "--limit", "2"]);
    assert_success(&output);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("articles without details: 3"), "{}", stdout);
    assert!(stdout.contains("would fetch: 2"), "{}", stdout);
}

#[test]
fn test_stats_after_ingest() {
    let (tmp, config) = setup_test_env();
    assert_success(&run_topten(&config, &["init"]));
    assert_success(&ingest_page(&config, tmp.path(), "day1.html", "2024-01-01"));
    assert_success(&ingest_page(&config, tmp.path(), "day2.html", "2024-01-02"));

    let output = run_topten(&config, &["stats"]);
    assert_success(&output);
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Articles:    4"), "{}", stdout);
    assert!(stdout.contains("Captures:    2"), "{}", stdout);
    assert!(stdout.contains("Positions:   6"), "{}", stdout);
    assert!(stdout.contains("2024-01-02 00:00 UTC"), "{}", stdout);
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let output = run_topten(&tmp.path().join("nope.toml"), &["init"]);
    assert!(!output.status.success());
}
