use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        SceneError::acquisition("cam1", "device busy")
            .to_string()
            .contains("acquisition error for 'cam1':")
    );
    assert!(
        SceneError::config("missing assets")
            .to_string()
            .contains("config error:")
    );
    assert!(SceneError::NoActiveScene.to_string().contains("no active scene"));
}

#[test]
fn expression_error_names_slot_and_axis() {
    let err = SceneError::Expression {
        slot: "background".to_owned(),
        axis: "w",
        source: ExprError::new(3, "unknown symbol 'FOO'"),
    };
    let msg = err.to_string();
    assert!(msg.contains("'background'"));
    assert!(msg.contains("'w'"));
    assert!(msg.contains("FOO"));
}

#[test]
fn not_found_is_detected_through_conversion() {
    let err: SceneError = CompositorError::NotFound("screen1".to_owned()).into();
    assert!(err.is_not_found());
    assert!(!SceneError::NoActiveScene.is_not_found());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = SceneError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
