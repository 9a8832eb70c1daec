// tests/config_env.rs
//
// Configuration layering through the real command-line parser.

use std::fs;
use std::time::Duration;

use clap::Parser;
use quiet_hn::config::{Cli, Settings};

#[test]
fn flags_parse_with_underscore_alias() {
    let cli = Cli::try_parse_from(["quiet-hn", "--port", "4000", "--num_stories", "12"]).unwrap();
    assert_eq!(cli.port, Some(4000));
    assert_eq!(cli.num_stories, Some(12));
}

#[serial_test::serial]
#[test]
fn env_supplies_values_and_flags_win() {
    std::env::set_var("PORT", "5050");
    std::env::set_var("NUM_STORIES", "7");

    let from_env = Cli::try_parse_from(["quiet-hn"]).unwrap();
    let s = Settings::load(&from_env).unwrap();
    assert_eq!(s.port, 5050);
    assert_eq!(s.refresh.target, 7);

    let flagged = Cli::try_parse_from(["quiet-hn", "--num-stories", "9"]).unwrap();
    assert_eq!(Settings::load(&flagged).unwrap().refresh.target, 9);

    std::env::remove_var("PORT");
    std::env::remove_var("NUM_STORIES");
}

#[serial_test::serial]
#[test]
fn config_file_is_read_from_path() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("quiet-hn.toml");
    fs::write(
        &path,
        r#"
        [server]
        port = 8081

        [refresh]
        num_stories = 20
        chunk_size = 10
        refresh_interval_secs = 120

        [source]
        base_url = "http://127.0.0.1:9999/v0"
        request_timeout_ms = 1500
        "#,
    )
    .unwrap();

    let cli = Cli::try_parse_from(["quiet-hn", "--config", path.to_str().unwrap()]).unwrap();
    let s = Settings::load(&cli).unwrap();
    assert_eq!(s.port, 8081);
    assert_eq!(s.refresh.target, 20);
    assert_eq!(s.refresh.chunk_size, 10);
    assert_eq!(s.refresh.refresh_interval, Duration::from_secs(120));
    assert_eq!(s.base_url, "http://127.0.0.1:9999/v0");
    assert_eq!(s.request_timeout, Duration::from_millis(1500));
}

#[test]
fn missing_config_file_is_an_error() {
    let cli = Cli {
        config: Some("definitely/not/here.toml".into()),
        ..Cli::default()
    };
    let err = Settings::load(&cli).unwrap_err();
    assert!(format!("{err:#}").contains("reading config"));
}
