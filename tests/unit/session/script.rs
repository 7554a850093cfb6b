use super::*;

const SCRIPT: &str = r#"{
    "devices": { "cam1": { "width": 640, "height": 480 } },
    "captures": [null, { "id": "screen1" }],
    "steps": [
        {
            "op": "show_full_screen_cam",
            "camera": { "id": "cam1", "content": { "Device": "cam1" }, "visible": true },
            "mic": { "id": "mic1", "stream": { "id": "mic1", "has_video": false, "has_audio": true } }
        },
        { "op": "toggle_screen_sharing" },
        { "op": "toggle_screen_sharing" },
        { "op": "set_canvas", "width": 1920, "height": 1080 },
        { "op": "screen_share_ended" }
    ]
}"#;

#[test]
fn parses_steps_and_defaults() {
    let script = Script::from_reader(SCRIPT.as_bytes()).unwrap();
    assert_eq!(script.canvas, Size::new(1280.0, 720.0));
    assert_eq!(script.steps.len(), 5);
    assert_eq!(script.steps[1], ScriptStep::ToggleScreenSharing);
    assert_eq!(script.steps[3].op_name(), "set_canvas");
    assert_eq!(script.captures[0], None);
}

#[test]
fn rejects_unknown_ops() {
    let err = Script::from_reader(r#"{ "steps": [{ "op": "dance" }] }"#.as_bytes()).unwrap_err();
    assert!(matches!(err, SceneError::Config(_)));
}

#[tokio::test]
async fn run_records_calls_per_step() {
    let script = Script::from_reader(SCRIPT.as_bytes()).unwrap();
    let run = script.run().await;
    assert!(run.is_clean(), "{run:#?}");
    assert_eq!(run.steps.len(), 5);

    let first = &run.steps[0];
    assert_eq!(first.phase, SessionPhase::FullScreen);
    // The 640x480 device fills the 16:9 canvas.
    assert!(first.calls.iter().any(|c| matches!(
        c,
        CompositorOp::AddDevice { name, geometry, .. }
            if name == "cam1" && geometry.y == -120.0 && geometry.height == 960.0
    )));

    // Dismissed capture request: nothing sent.
    assert!(run.steps[1].calls.is_empty());
    assert_eq!(run.steps[1].phase, SessionPhase::FullScreen);

    assert_eq!(run.steps[2].phase, SessionPhase::ScreenShare);
    assert_eq!(run.steps[3].note.as_deref(), Some("canvas=1920x1080"));

    let ended = &run.steps[4];
    assert_eq!(ended.phase, SessionPhase::FullScreen);
    assert!(ended.calls.contains(&CompositorOp::RemoveDevice {
        name: "screen1".to_owned()
    }));
    assert!(ended.calls.iter().any(|c| matches!(
        c,
        CompositorOp::Update { name, geometry } if name == "background" && geometry.width == 1920.0
    )));
}

#[tokio::test]
async fn operation_errors_are_recorded_and_the_run_continues() {
    let script = Script::from_reader(
        r#"{ "steps": [{ "op": "toggle_mute" }, { "op": "end_session" }, { "op": "end_session" }] }"#
            .as_bytes(),
    )
    .unwrap();
    let run = script.run().await;
    assert!(!run.is_clean());
    assert!(run.steps[0].error.as_deref().unwrap().contains("no active scene"));
    assert!(run.steps[1].error.is_none());
    assert_eq!(run.steps[1].phase, SessionPhase::Destroyed);
    assert!(run.steps[2].error.as_deref().unwrap().contains("session ended"));
}
