use slideshow_server::Error;
use slideshow_server::config::{MIN_DELAY_MS, SlideshowConfig};
use std::fs;
use tempfile::tempdir;

#[test]
fn parse_json_config() {
    let tmp = tempdir().unwrap();
    let photos = tmp.path().join("photos");
    fs::create_dir_all(&photos).unwrap();
    let cfg_path = tmp.path().join("config.json");
    fs::write(
        &cfg_path,
        format!(
            r#"{{"folder_path": "{}", "delay_seconds": 1}}"#,
            photos.display()
        ),
    )
    .unwrap();

    let cfg = SlideshowConfig::load(&cfg_path).unwrap();
    assert_eq!(cfg.folder_path, photos.canonicalize().unwrap());
    assert_eq!(cfg.delay_ms, 1000);
}

#[test]
fn parse_kebab_case_yaml_config() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.yaml");
    fs::write(
        &cfg_path,
        r#"
folder-path: "/photos"
delay-seconds: 2.5
"#,
    )
    .unwrap();

    let cfg = SlideshowConfig::load(&cfg_path).unwrap();
    assert!(cfg.folder_path.is_absolute());
    assert!(cfg.folder_path.ends_with("photos"));
    assert_eq!(cfg.delay_ms, 2500);
}

#[test]
fn short_delay_is_clamped_to_floor() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.json");
    fs::write(&cfg_path, r#"{"folder_path": "/photos", "delay_seconds": 0.1}"#).unwrap();

    let cfg = SlideshowConfig::load(&cfg_path).unwrap();
    assert_eq!(cfg.delay_ms, MIN_DELAY_MS);
}

#[test]
fn numeric_string_delay_is_accepted() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.json");
    fs::write(&cfg_path, r#"{"folder_path": "/photos", "delay_seconds": "4"}"#).unwrap();

    assert_eq!(SlideshowConfig::load(&cfg_path).unwrap().delay_ms, 4000);
}

#[test]
fn tilde_is_expanded() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.json");
    fs::write(&cfg_path, r#"{"folder_path": "~/Pictures"}"#).unwrap();

    let cfg = SlideshowConfig::load(&cfg_path).unwrap();
    assert!(cfg.folder_path.is_absolute());
    assert!(!cfg.folder_path.to_string_lossy().contains('~'));
    assert!(cfg.folder_path.ends_with("Pictures"));
}

#[test]
fn missing_file_is_not_found() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("absent.json");
    let err = SlideshowConfig::load(&cfg_path).unwrap_err();
    assert!(matches!(err, Error::ConfigNotFound(ref p) if *p == cfg_path));
    assert!(err.to_string().starts_with("config file not found at"));
}

#[test]
fn malformed_configs_are_rejected() {
    let cases = [
        ("{not json", "invalid config file"),
        (r#"{"delay_seconds": 2}"#, "folder_path is required in config"),
        (r#"{"folder_path": "   "}"#, "folder_path is required in config"),
        (
            r#"{"folder_path": "/p", "delay_seconds": "soon"}"#,
            "delay_seconds must be a number",
        ),
        (
            r#"{"folder_path": "/p", "delay_seconds": null}"#,
            "delay_seconds must be a number",
        ),
        (
            r#"{"folder_path": "/p", "delay_seconds": [1]}"#,
            "delay_seconds must be a number",
        ),
        (
            r#"{"folder_path": "/p", "delay_seconds": {"seconds": 1}}"#,
            "delay_seconds must be a number",
        ),
        (
            r#"{"folder_path": "/p", "delay_seconds": false}"#,
            "delay_seconds must be greater than 0",
        ),
        (
            r#"{"folder_path": null, "delay_seconds": 2}"#,
            "folder_path is required in config",
        ),
        (
            r#"{"folder_path": "/p", "delay_seconds": 0}"#,
            "delay_seconds must be greater than 0",
        ),
        (
            r#"{"folder_path": "/p", "delay_seconds": -2}"#,
            "delay_seconds must be greater than 0",
        ),
    ];
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.json");
    for (body, expected) in cases {
        fs::write(&cfg_path, body).unwrap();
        let err = SlideshowConfig::load(&cfg_path).unwrap_err();
        assert!(matches!(err, Error::ConfigMalformed(_)), "{body}: {err:?}");
        assert!(
            err.to_string().starts_with(expected),
            "{body}: got {err}"
        );
    }
}

#[test]
fn boolean_true_delay_is_one_second() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.json");
    fs::write(&cfg_path, r#"{"folder_path": "/photos", "delay_seconds": true}"#).unwrap();

    assert_eq!(SlideshowConfig::load(&cfg_path).unwrap().delay_ms, 1000);
}

#[test]
fn numeric_folder_path_is_used_as_text() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.json");
    fs::write(&cfg_path, r#"{"folder_path": 123}"#).unwrap();

    let cfg = SlideshowConfig::load(&cfg_path).unwrap();
    assert!(cfg.folder_path.is_absolute());
    assert!(cfg.folder_path.ends_with("123"));
}

#[test]
fn yaml_null_delay_is_rejected() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.yml");
    fs::write(&cfg_path, "folder_path: /photos\ndelay_seconds: ~\n").unwrap();

    let err = SlideshowConfig::load(&cfg_path).unwrap_err();
    assert_eq!(err.to_string(), "delay_seconds must be a number");
}
