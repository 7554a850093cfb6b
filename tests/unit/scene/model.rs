use super::*;
use crate::scene::templates::{BACKGROUND, CAMERA_HIDDEN_ICON};

fn full_frame() -> Scene {
    Scene::build(SceneParams::FullFrame(FullFrameProps {
        camera: CameraInput {
            id: "cam1".to_owned(),
            content: SlotContent::Device("cam1".to_owned()),
            visible: true,
            natural_size: None,
        },
        mic: AudioInput {
            id: "mic1".to_owned(),
            stream: MediaStream::audio("mic1"),
        },
        show_mute_icon: false,
        assets: SceneAssets::default(),
    }))
}

fn screen_share() -> Scene {
    Scene::build(SceneParams::ScreenShare(ScreenShareProps {
        camera: CameraInput {
            id: "cam1".to_owned(),
            content: SlotContent::Device("cam1".to_owned()),
            visible: true,
            natural_size: None,
        },
        screen: ScreenShareInput::from_capture(MediaStream::video("screen1", None)),
        mic: AudioInput {
            id: "mic1".to_owned(),
            stream: MediaStream::audio("mic1"),
        },
        show_mute_icon: false,
        assets: SceneAssets::default(),
    }))
}

#[test]
fn empty_patch_is_a_no_op() {
    for scene in [full_frame(), screen_share()] {
        assert_eq!(scene.update(&ScenePatch::default()), scene);
    }
}

#[test]
fn patch_replaces_only_given_fields() {
    let scene = full_frame();
    let next = scene.update(&ScenePatch {
        mic_id: Some("mic2".to_owned()),
        mic_stream: Some(MediaStream::audio("mic2")),
        ..ScenePatch::default()
    });
    assert_eq!(next.name, SceneName::FullFrame);
    assert_eq!(next.mixer_names().collect::<Vec<_>>(), vec!["mic2"]);
    assert_eq!(next.slots, scene.slots);
}

#[test]
fn patch_new_camera_renames_camera_slot() {
    let next = full_frame().update(&ScenePatch {
        camera_id: Some("cam2".to_owned()),
        camera_content: Some(SlotContent::Device("cam2".to_owned())),
        ..ScenePatch::default()
    });
    assert!(next.slot("cam1").is_none());
    assert!(next.slot("cam2").is_some());
    assert!(next.slot(BACKGROUND).is_some());
}

#[test]
fn patch_keeps_screen_share_topology() {
    let next = screen_share().update(&ScenePatch {
        camera_visible: Some(false),
        ..ScenePatch::default()
    });
    assert_eq!(next.name, SceneName::ScreenShare);
    assert!(next.slot("screen1").is_some());
    assert!(!next.slot("cam1").unwrap().visible);
    assert!(next.slot(CAMERA_HIDDEN_ICON).unwrap().visible);
}

#[test]
fn screen_fields_are_ignored_on_full_frame() {
    let scene = full_frame();
    let next = scene.update(&ScenePatch {
        screen_share_id: Some("screen9".to_owned()),
        ..ScenePatch::default()
    });
    assert_eq!(next, scene);
}

#[test]
fn screen_audio_can_be_added_by_patch() {
    let next = screen_share().update(&ScenePatch {
        screen_audio_id: Some("desktop".to_owned()),
        screen_audio_stream: Some(MediaStream::audio("desktop")),
        ..ScenePatch::default()
    });
    assert_eq!(next.mixer_names().collect::<Vec<_>>(), vec!["mic1", "desktop"]);
}

#[test]
fn from_capture_derives_audio_input() {
    let silent = ScreenShareInput::from_capture(MediaStream::video("s", None));
    assert!(silent.audio.is_none());
    let loud = ScreenShareInput::from_capture(MediaStream::video("s", None).with_audio(true));
    assert_eq!(loud.audio.unwrap().id, "s-audio");
}

#[test]
fn scene_round_trips_through_json() {
    let scene = screen_share();
    let json = serde_json::to_string(&scene).unwrap();
    let back: Scene = serde_json::from_str(&json).unwrap();
    assert_eq!(back, scene);
}

#[test]
fn patch_deserializes_sparse_json() {
    let patch: ScenePatch = serde_json::from_str(r#"{"mic_id": "mic2"}"#).unwrap();
    assert_eq!(patch.mic_id.as_deref(), Some("mic2"));
    assert!(patch.camera_id.is_none());
}
