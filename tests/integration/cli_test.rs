use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_sitesnap(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sitesnap"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute sitesnap command")
}

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A site plus an explicit config file so the host's layered config is never read.
fn fixture() -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("site");
    let plugins = root.join("wp-content").join("plugins");

    write(
        &plugins.join("hello.php"),
        "<?php\n/* Plugin Name: Hello Dolly\nVersion: 1.7.2 */\n",
    );
    write(
        &plugins.join("akismet").join("akismet.php"),
        "<?php\n/* Plugin Name: Akismet\nVersion: 5.3 */\n",
    );
    write(
        &root.join("wp-content").join("themes").join("astra").join("style.css"),
        "/* Theme Name: Astra */\n",
    );
    write(
        &root.join("sitesnap-state.toml"),
        "active_plugins = [\"hello.php\"]\nstylesheet = \"astra\"\n",
    );

    let config_path = dir.path().join("sitesnap.toml");
    write(
        &config_path,
        &format!(
            "[site]\nroot = {:?}\n\n[auth]\ntoken_secret = \"cli-secret\"\n\n[[auth.users]]\nname = \"admin\"\napi_key = \"k\"\ncapabilities = [\"manage_options\"]\n",
            root.display().to_string()
        ),
    );

    (dir, config_path.display().to_string())
}

#[test]
fn test_version() {
    let output = run_sitesnap(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("sitesnap "));
}

#[test]
fn test_help_lists_commands() {
    let output = run_sitesnap(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["list", "export", "serve", "token", "version"] {
        assert!(stdout.contains(command), "missing {}", command);
    }
}

#[test]
fn test_serve_help_mentions_bearer_header() {
    let output = run_sitesnap(&["serve", "--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Authorization: Bearer <api_key>"));
}

#[test]
fn test_list_json() {
    let (_dir, config) = fixture();
    let output = run_sitesnap(&["--config", &config, "list", "--format", "json"]);
    assert!(output.status.success(), "{:?}", output);

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let plugins = json["plugins"].as_array().unwrap();
    assert_eq!(plugins.len(), 2);
    assert_eq!(plugins[0]["name"], "Akismet");
    assert_eq!(plugins[0]["status"], "inactive");
    assert_eq!(plugins[1]["name"], "Hello Dolly");
    assert_eq!(plugins[1]["status"], "active");
    assert_eq!(json["themes"][0]["name"], "Astra");
}

#[test]
fn test_list_search_and_kind() {
    let (_dir, config) = fixture();
    let output = run_sitesnap(&[
        "--config", &config, "list", "--kind", "plugins", "--search", "dolly", "--format", "json",
    ]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["plugins"].as_array().unwrap().len(), 1);
    assert!(json.get("themes").is_none());
}

#[test]
fn test_list_rejects_unknown_sort() {
    let (_dir, config) = fixture();
    let output = run_sitesnap(&["--config", &config, "list", "--sort", "size"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown sort key"));
}

#[test]
fn test_export_to_stdout() {
    let (_dir, config) = fixture();
    let output = run_sitesnap(&["--config", &config, "export", "--stdout"]);
    assert!(output.status.success());
    assert!(output.stdout.starts_with(b"\xEF\xBB\xBF"));
    let text = String::from_utf8_lossy(&output.stdout[3..]).into_owned();
    assert!(text.starts_with("Type,Name,Version,Status,Author,Description\r\n"));
    assert!(text.contains("Plugin,Hello Dolly,1.7.2,active,,\r\n"));
    assert!(text.contains("Theme,Astra,,active,,\r\n"));
}

#[test]
fn test_export_to_directory() {
    let (dir, config) = fixture();
    let out = dir.path().join("out");
    let output = run_sitesnap(&[
        "--config",
        &config,
        "export",
        "--output",
        out.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let files: Vec<String> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("plugins_themes_list_"));
    assert!(files[0].ends_with(".csv"));
}

#[test]
fn test_token_for_known_user() {
    let (_dir, config) = fixture();
    let output = run_sitesnap(&["--config", &config, "token", "--user", "admin"]);
    assert!(output.status.success());
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    assert_eq!(token.split('.').count(), 3);

    let unknown = run_sitesnap(&["--config", &config, "token", "--user", "ghost"]);
    assert!(!unknown.status.success());
}

#[test]
fn test_missing_config_file() {
    let output = run_sitesnap(&["--config", "/no/such/sitesnap.toml", "list"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Config file not found"));
}
