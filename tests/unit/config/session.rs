use std::io::Write;
use std::path::PathBuf;

use super::*;

#[test]
fn empty_object_yields_defaults() {
    let cfg = SessionConfig::from_reader("{}".as_bytes()).unwrap();
    assert_eq!(cfg, SessionConfig::default());
    assert_eq!(
        cfg.assets.background,
        PathBuf::from("assets/camera-bg.png")
    );
    assert!(!cfg.start_muted);
}

#[test]
fn partial_assets_keep_remaining_defaults() {
    let json = r#"{ "assets": { "camera_off": "icons/off.png", "background": "bg.jpg" }, "start_muted": true }"#;
    let cfg = SessionConfig::from_reader(json.as_bytes()).unwrap();
    assert_eq!(cfg.assets.camera_off, PathBuf::from("icons/off.png"));
    assert_eq!(cfg.assets.mute_icon, None);
    assert!(cfg.start_muted);
}

#[test]
fn rejects_unknown_fields_and_empty_paths() {
    assert!(matches!(
        SessionConfig::from_reader(r#"{ "canvas": 1 }"#.as_bytes()),
        Err(SceneError::Config(_))
    ));
    let json = r#"{ "assets": { "camera_off": "", "background": "bg.png" } }"#;
    assert!(matches!(
        SessionConfig::from_reader(json.as_bytes()),
        Err(SceneError::Config(_))
    ));
}

#[test]
fn loads_from_disk() {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(f, r#"{{ "start_muted": true }}"#).unwrap();
    let cfg = SessionConfig::from_path(f.path()).unwrap();
    assert!(cfg.start_muted);

    let err = SessionConfig::from_path("/definitely/not/here.json").unwrap_err();
    assert!(err.to_string().contains("open session config"));
}
