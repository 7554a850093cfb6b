use super::*;
use crate::{
    compositor::memory::{CompositorOp, MemoryCompositor, MemoryMedia},
    compositor::traits::MediaStream,
    foundation::core::Rect,
    layout::dimensions::DimExpr,
    scene::model::{
        AudioInput, CameraInput, FullFrameProps, SceneAssets, SceneParams, ScenePatch,
        ScreenShareInput, ScreenShareProps,
    },
    scene::templates::{BACKGROUND, CAMERA_HIDDEN_ICON, MIC_MUTED_ICON},
};

const CANVAS: Size = Size::new(1280.0, 720.0);

struct Rig {
    compositor: Arc<MemoryCompositor>,
    media: Arc<MemoryMedia>,
    reconciler: Reconciler,
}

fn rig() -> Rig {
    let compositor = Arc::new(MemoryCompositor::new(CANVAS));
    let media = Arc::new(MemoryMedia::new());
    let reconciler = Reconciler::new(compositor.clone(), compositor.clone(), media.clone());
    Rig {
        compositor,
        media,
        reconciler,
    }
}

fn camera(visible: bool) -> CameraInput {
    CameraInput {
        id: "cam1".to_owned(),
        content: SlotContent::Stream(MediaStream::video(
            "cam1",
            Some(Size::new(640.0, 480.0)),
        )),
        visible,
        natural_size: None,
    }
}

fn mic() -> AudioInput {
    AudioInput {
        id: "mic1".to_owned(),
        stream: MediaStream::audio("mic1"),
    }
}

fn full_frame(camera: CameraInput) -> Scene {
    Scene::build(SceneParams::FullFrame(FullFrameProps {
        camera,
        mic: mic(),
        show_mute_icon: false,
        assets: SceneAssets::default(),
    }))
}

fn screen_share() -> Scene {
    Scene::build(SceneParams::ScreenShare(ScreenShareProps {
        camera: camera(true),
        screen: ScreenShareInput::from_capture(MediaStream::video("screen1", None).with_audio(true)),
        mic: mic(),
        show_mute_icon: false,
        assets: SceneAssets::default(),
    }))
}

fn position(ops: &[CompositorOp], pred: impl Fn(&CompositorOp) -> bool) -> usize {
    ops.iter()
        .position(pred)
        .unwrap_or_else(|| panic!("op not found in {ops:#?}"))
}

#[tokio::test]
async fn first_apply_adds_every_slot_and_mixer_device() {
    let mut rig = rig();
    let scene = full_frame(camera(true));

    let report = rig.reconciler.apply_scene(None, &scene, CANVAS).await;
    assert!(report.is_clean(), "{report:#?}");
    assert_eq!(report.names_with(Target::Layer, Action::Added).len(), 4);
    assert_eq!(report.names_with(Target::Mixer, Action::Added), vec!["mic1"]);

    let cam = rig.compositor.layer("cam1").unwrap();
    assert_eq!(
        cam.geometry,
        Geometry {
            x: 0.0,
            y: -120.0,
            index: 2,
            width: 1280.0,
            height: 960.0,
            clip: Some(Rect::new(0.0, 0.0, 1280.0, 720.0)),
        }
    );
    assert!(cam.visible);
    assert!(!rig.compositor.layer(CAMERA_HIDDEN_ICON).unwrap().visible);
    assert!(!rig.compositor.layer(MIC_MUTED_ICON).unwrap().visible);
    assert!(rig.compositor.layer(BACKGROUND).unwrap().visible);
    assert_eq!(rig.compositor.audio_inputs(), vec!["mic1".to_owned()]);
    assert_eq!(rig.reconciler.layers().len(), 4);
}

#[tokio::test]
async fn reapplying_the_same_scene_only_updates() {
    let mut rig = rig();
    let scene = full_frame(camera(true));
    rig.reconciler.apply_scene(None, &scene, CANVAS).await;
    rig.compositor.take_ops();

    let report = rig.reconciler.apply_scene(Some(&scene), &scene, CANVAS).await;
    assert!(report.is_clean());
    let ops = rig.compositor.take_ops();
    assert!(ops.iter().all(|op| !op.is_add() && !op.is_remove()), "{ops:#?}");
    assert!(
        !ops.iter()
            .any(|op| matches!(op, CompositorOp::SetVisible { .. }))
    );
    assert_eq!(report.names_with(Target::Layer, Action::Updated).len(), 4);
    assert_eq!(
        report.names_with(Target::Mixer, Action::AlreadyPresent),
        vec!["mic1"]
    );
}

#[tokio::test]
async fn full_frame_to_screen_share_moves_camera_to_pip() {
    let mut rig = rig();
    let full = full_frame(camera(true));
    rig.reconciler.apply_scene(None, &full, CANVAS).await;
    rig.compositor.take_ops();

    let share = screen_share();
    let report = rig.reconciler.apply_scene(Some(&full), &share, CANVAS).await;
    assert!(report.is_clean(), "{report:#?}");

    let ops = rig.compositor.take_ops();
    assert!(!ops.iter().any(CompositorOp::is_remove));
    assert!(ops.iter().any(|op| matches!(
        op,
        CompositorOp::AddDevice { name, stream_id, .. } if name == "screen1" && stream_id == "screen1"
    )));
    assert!(ops.iter().any(|op| matches!(
        op,
        CompositorOp::AddAudio { name, .. } if name == "screen1-audio"
    )));

    // 640x480 filled into the 256x144 box anchored at (20, 556).
    let cam = rig.compositor.layer("cam1").unwrap();
    assert_eq!(
        cam.geometry,
        Geometry {
            x: 20.0,
            y: 532.0,
            index: 4,
            width: 256.0,
            height: 192.0,
            clip: Some(Rect::new(20.0, 556.0, 276.0, 700.0)),
        }
    );
    assert_eq!(
        report.outcome(Target::Layer, BACKGROUND).map(|o| o.action),
        Some(Action::Updated)
    );
    assert_eq!(
        report.outcome(Target::Layer, CAMERA_HIDDEN_ICON).map(|o| o.action),
        Some(Action::Updated)
    );
}

#[tokio::test]
async fn leaving_screen_share_removes_before_updating() {
    let mut rig = rig();
    let share = screen_share();
    rig.reconciler.apply_scene(None, &share, CANVAS).await;
    rig.compositor.take_ops();

    let full = full_frame(camera(true));
    let report = rig.reconciler.apply_scene(Some(&share), &full, CANVAS).await;
    assert!(report.is_clean());

    let ops = rig.compositor.take_ops();
    let removed_screen = position(&ops, |op| {
        matches!(op, CompositorOp::RemoveDevice { name } if name == "screen1")
    });
    let removed_audio = position(&ops, |op| {
        matches!(op, CompositorOp::RemoveAudio { name } if name == "screen1-audio")
    });
    let first_update = position(&ops, |op| matches!(op, CompositorOp::Update { .. }));
    assert!(removed_screen < first_update);
    assert!(removed_audio < first_update);

    assert!(rig.compositor.layer("screen1").is_none());
    assert_eq!(rig.compositor.layer("cam1").unwrap().geometry.width, 1280.0);
    assert!(!rig.reconciler.devices().contains("screen1-audio"));
}

#[tokio::test]
async fn not_found_removal_succeeds_and_prunes_bookkeeping() {
    let mut rig = rig();
    let share = screen_share();
    rig.reconciler.apply_scene(None, &share, CANVAS).await;
    rig.compositor.forget_layer("screen1");
    rig.compositor.forget_audio_input("screen1-audio");

    let full = full_frame(camera(true));
    let report = rig.reconciler.apply_scene(Some(&share), &full, CANVAS).await;

    let screen = report.outcome(Target::Layer, "screen1").unwrap();
    assert!(screen.is_ok());
    assert_eq!(screen.action, Action::AlreadyRemoved);
    let audio = report.outcome(Target::Mixer, "screen1-audio").unwrap();
    assert_eq!(audio.action, Action::AlreadyRemoved);
    assert!(!rig.reconciler.layers().contains("screen1"));
    assert!(!rig.reconciler.devices().contains("screen1-audio"));
}

#[tokio::test]
async fn one_failing_layer_does_not_abort_the_others() {
    let mut rig = rig();
    rig.compositor.fail_on(BACKGROUND);
    let scene = full_frame(camera(true));

    let report = rig.reconciler.apply_scene(None, &scene, CANVAS).await;
    let failures: Vec<&str> = report.failures().map(|o| o.name.as_str()).collect();
    assert_eq!(failures, vec![BACKGROUND]);
    assert!(rig.compositor.layer("cam1").is_some());
    assert!(!rig.reconciler.layers().contains(BACKGROUND));

    rig.compositor.clear_failures();
    let report = rig.reconciler.apply_scene(Some(&scene), &scene, CANVAS).await;
    assert_eq!(
        report.outcome(Target::Layer, BACKGROUND).map(|o| o.action),
        Some(Action::Added)
    );
    assert!(report.is_clean());
}

#[tokio::test]
async fn unresolvable_geometry_skips_only_that_slot() {
    let mut rig = rig();
    let mut scene = full_frame(camera(true));
    let bg = scene
        .slots
        .iter_mut()
        .find(|s| s.name == BACKGROUND)
        .unwrap();
    bg.dimensions.w = DimExpr::from("CANVAS_WIDTH +");

    let report = rig.reconciler.apply_scene(None, &scene, CANVAS).await;
    let bg = report.outcome(Target::Layer, BACKGROUND).unwrap();
    assert!(matches!(
        bg.error,
        Some(SceneError::Expression { axis: "w", .. })
    ));
    assert!(rig.compositor.layer(BACKGROUND).is_none());
    assert!(rig.compositor.layer("cam1").is_some());
}

#[tokio::test]
async fn hidden_slots_are_added_then_hidden() {
    let mut rig = rig();
    let scene = full_frame(camera(false));
    rig.reconciler.apply_scene(None, &scene, CANVAS).await;

    let ops = rig.compositor.ops();
    let add = position(&ops, |op| {
        matches!(op, CompositorOp::AddDevice { name, .. } if name == "cam1")
    });
    let hide = position(&ops, |op| {
        matches!(op, CompositorOp::SetVisible { name, visible: false } if name == "cam1")
    });
    assert!(add < hide);
    assert!(rig.compositor.layer(CAMERA_HIDDEN_ICON).unwrap().visible);
}

#[tokio::test]
async fn changed_content_under_the_same_name_is_replaced() {
    let mut rig = rig();
    let scene = full_frame(camera(true));
    rig.reconciler.apply_scene(None, &scene, CANVAS).await;
    rig.compositor.take_ops();

    let next = scene.update(&ScenePatch {
        camera_content: Some(SlotContent::Stream(MediaStream::video(
            "cam1-hd",
            Some(Size::new(1920.0, 1080.0)),
        ))),
        ..ScenePatch::default()
    });
    let report = rig.reconciler.apply_scene(Some(&scene), &next, CANVAS).await;
    assert_eq!(
        report.outcome(Target::Layer, "cam1").map(|o| o.action),
        Some(Action::Replaced)
    );

    let ops = rig.compositor.take_ops();
    let removed = position(&ops, |op| {
        matches!(op, CompositorOp::RemoveDevice { name } if name == "cam1")
    });
    let added = position(&ops, |op| {
        matches!(op, CompositorOp::AddDevice { stream_id, .. } if stream_id == "cam1-hd")
    });
    assert!(removed < added);
    assert_eq!(rig.compositor.layer("cam1").unwrap().source, "cam1-hd");
}

#[tokio::test]
async fn device_content_is_acquired_before_adding() {
    let mut rig = rig();
    rig.media.set_device_size("usb-cam", Size::new(1920.0, 1080.0));
    let scene = full_frame(CameraInput {
        id: "usb-cam".to_owned(),
        content: SlotContent::Device("usb-cam".to_owned()),
        visible: true,
        natural_size: None,
    });

    let report = rig.reconciler.apply_scene(None, &scene, CANVAS).await;
    assert!(report.is_clean());
    assert_eq!(rig.media.acquisitions(), vec!["usb-cam".to_owned()]);
    assert_eq!(
        rig.compositor.layer("usb-cam").unwrap().geometry,
        Geometry::full_canvas(CANVAS, 2)
    );
}

#[tokio::test]
async fn unavailable_device_is_reported_per_slot() {
    let mut rig = rig();
    rig.media.set_unavailable("usb-cam");
    let scene = full_frame(CameraInput {
        id: "usb-cam".to_owned(),
        content: SlotContent::Device("usb-cam".to_owned()),
        visible: true,
        natural_size: None,
    });

    let report = rig.reconciler.apply_scene(None, &scene, CANVAS).await;
    let cam = report.outcome(Target::Layer, "usb-cam").unwrap();
    assert!(matches!(cam.error, Some(SceneError::Acquisition { .. })));
    assert_eq!(report.failures().count(), 1);
}

#[tokio::test]
async fn remove_all_clears_compositor_and_bookkeeping() {
    let mut rig = rig();
    let scene = screen_share();
    rig.reconciler.apply_scene(None, &scene, CANVAS).await;

    let layers = rig.reconciler.remove_all_layers().await;
    let devices = rig.reconciler.remove_all_mixer_devices().await;
    assert!(layers.is_clean() && devices.is_clean());
    assert!(rig.compositor.layer_names().is_empty());
    assert!(rig.compositor.audio_inputs().is_empty());
    assert!(rig.reconciler.layers().is_empty());
    assert!(rig.reconciler.devices().is_empty());
}

#[tokio::test]
async fn in_place_visibility_and_mute_update_bookkeeping() {
    let mut rig = rig();
    let scene = full_frame(camera(true));
    rig.reconciler.apply_scene(None, &scene, CANVAS).await;

    rig.reconciler.set_layer_visible("cam1", false).await.unwrap();
    assert!(!rig.reconciler.layers().get("cam1").unwrap().visible);
    assert!(!rig.compositor.layer("cam1").unwrap().visible);

    rig.reconciler.set_device_muted("mic1", true).await.unwrap();
    assert!(rig.reconciler.devices().get("mic1").unwrap().muted);
    assert_eq!(rig.compositor.is_muted("mic1"), Some(true));

    let err = rig.reconciler.set_layer_visible("ghost", true).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn removing_untracked_layer_is_a_no_op() {
    let mut rig = rig();
    assert_eq!(
        rig.reconciler.remove_layer("ghost").await.unwrap(),
        Action::AlreadyRemoved
    );
    assert!(rig.compositor.ops().is_empty());
    assert_eq!(
        rig.reconciler.remove_mixer_device("ghost").await.unwrap(),
        Action::AlreadyRemoved
    );
}
