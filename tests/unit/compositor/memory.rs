use super::*;

fn geom(x: f64, index: i32) -> Geometry {
    Geometry {
        x,
        y: 0.0,
        index,
        width: 100.0,
        height: 50.0,
        clip: None,
    }
}

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(f)
}

#[test]
fn records_calls_and_tracks_layers() {
    let c = MemoryCompositor::new(Size::new(1280.0, 720.0));
    block_on(async {
        c.add_device_input(&MediaStream::video("cam", None), "cam", &geom(0.0, 2))
            .await
            .unwrap();
        c.update_composition("cam", &geom(10.0, 4)).await.unwrap();
        c.set_visible("cam", false).await.unwrap();
    });

    let layer = c.layer("cam").unwrap();
    assert_eq!(layer.kind, InputKind::Device);
    assert_eq!(layer.geometry, geom(10.0, 4));
    assert!(!layer.visible);

    let ops = c.take_ops();
    assert_eq!(ops.len(), 3);
    assert!(ops[0].is_add());
    assert_eq!(ops[1].name(), "cam");
    assert!(c.ops().is_empty());
}

#[test]
fn missing_or_mismatched_layers_are_not_found() {
    let c = MemoryCompositor::new(Size::new(1280.0, 720.0));
    block_on(async {
        let image = ImageSource {
            path: PathBuf::from("bg.png"),
            natural_size: Size::ZERO,
        };
        c.add_image_source(&image, "bg", &geom(0.0, 0)).await.unwrap();

        assert!(matches!(
            c.remove_device_input("bg").await,
            Err(CompositorError::NotFound(_))
        ));
        assert!(matches!(
            c.update_composition("nope", &geom(0.0, 0)).await,
            Err(CompositorError::NotFound(_))
        ));
        c.remove_image("bg").await.unwrap();
    });
    assert!(c.layer_names().is_empty());
}

#[test]
fn duplicate_adds_are_rejected() {
    let c = MemoryCompositor::new(Size::new(1280.0, 720.0));
    block_on(async {
        let s = MediaStream::video("cam", None);
        c.add_device_input(&s, "cam", &geom(0.0, 2)).await.unwrap();
        assert!(matches!(
            c.add_device_input(&s, "cam", &geom(0.0, 2)).await,
            Err(CompositorError::Rejected { .. })
        ));
    });
}

#[test]
fn injected_failures_still_record_the_call() {
    let c = MemoryCompositor::new(Size::new(1280.0, 720.0));
    c.fail_on("mic");
    block_on(async {
        assert!(
            c.add_audio_input(&MediaStream::audio("mic"), "mic")
                .await
                .is_err()
        );
    });
    assert_eq!(c.ops().len(), 1);
    assert!(c.audio_inputs().is_empty());

    c.clear_failures();
    block_on(async {
        c.add_audio_input(&MediaStream::audio("mic"), "mic")
            .await
            .unwrap();
        c.set_muted("mic", true).await.unwrap();
    });
    assert_eq!(c.is_muted("mic"), Some(true));
}

#[test]
fn media_acquires_devices_and_passes_streams_through() {
    let m = MemoryMedia::new();
    m.set_device_size("cam", Size::new(640.0, 480.0));
    m.set_unavailable("broken");

    block_on(async {
        let s = m.acquire(&SlotContent::Device("cam".into())).await.unwrap();
        assert_eq!(s.natural_size, Some(Size::new(640.0, 480.0)));

        let pre = MediaStream::video("pre", None);
        assert_eq!(
            m.acquire(&SlotContent::Stream(pre.clone())).await.unwrap(),
            pre
        );

        assert!(matches!(
            m.acquire(&SlotContent::Device("broken".into())).await,
            Err(SceneError::Acquisition { .. })
        ));
    });
    assert_eq!(m.acquisitions(), vec!["cam".to_owned()]);
}

#[test]
fn screen_capture_answers_are_consumed_in_order() {
    let m = MemoryMedia::new();
    m.queue_screen_capture(Some(MediaStream::video("screen1", None)));
    m.queue_screen_capture(None);

    block_on(async {
        let first = m.start_screen_capture().await.unwrap();
        assert_eq!(first.map(|s| s.id), Some("screen1".to_owned()));
        assert!(m.start_screen_capture().await.unwrap().is_none());
        assert!(m.start_screen_capture().await.unwrap().is_none());
    });
}

#[test]
fn images_use_registered_sizes_or_fail_when_missing() {
    let m = MemoryMedia::new();
    m.set_image_size("bg.png", Size::new(1920.0, 1080.0));
    m.set_missing_image("gone.png");

    block_on(async {
        let img = m.load_image(Path::new("bg.png")).await.unwrap();
        assert_eq!(img.natural_size, Size::new(1920.0, 1080.0));
        let other = m.load_image(Path::new("other.png")).await.unwrap();
        assert_eq!(other.natural_size, Size::ZERO);
        assert!(m.load_image(Path::new("gone.png")).await.is_err());
    });
}
