//! Config loading from real files.

use catcheck_core::analysis::VersionPolicy;
use catcheck_core::config::Config;

#[test]
fn missing_file_gives_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = Config::load(&dir.path().join("config.toml"));
    assert_eq!(config, Config::default());
}

#[test]
fn file_values_override_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
backend_url = "https://checker.example.com"
theme = "dark"
refresh_interval_secs = 60
version_policy = "append"
default_assistant = "asst_grammar"
"#,
    )
    .unwrap();

    let config = Config::load(&path);
    assert_eq!(config.backend_url, "https://checker.example.com");
    assert_eq!(config.theme, "dark");
    assert_eq!(config.refresh_interval_secs, 60);
    assert_eq!(config.version_policy, VersionPolicy::Append);
    assert_eq!(config.default_assistant.as_deref(), Some("asst_grammar"));
    assert_eq!(config.per_page, 10);
}

#[test]
fn malformed_file_falls_back_to_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "backend_url = [unterminated").unwrap();
    assert_eq!(Config::load(&path), Config::default());
}
