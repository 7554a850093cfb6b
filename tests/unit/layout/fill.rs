use super::*;

#[test]
fn covers_wide_target_with_vertical_overflow() {
    let c = calc_scaled_coords(640.0, 480.0, 1280.0, 720.0).unwrap();
    assert_eq!(c.scale, 2.0);
    assert_eq!(c.w, 1280.0);
    assert_eq!(c.h, 960.0);
    assert_eq!(c.x, 0.0);
    assert_eq!(c.y, -120.0);
}

#[test]
fn covers_tall_target_with_horizontal_overflow() {
    let c = calc_scaled_coords(1920.0, 1080.0, 400.0, 400.0).unwrap();
    assert!((c.h - 400.0).abs() < 1e-9);
    assert!(c.w > 400.0);
    assert!(c.x < 0.0);
    assert!(c.y.abs() < 1e-9);
}

#[test]
fn exact_aspect_match_has_no_offset() {
    let c = calc_scaled_coords(1280.0, 720.0, 640.0, 360.0).unwrap();
    assert_eq!(c.scale, 0.5);
    assert_eq!((c.x, c.y, c.w, c.h), (0.0, 0.0, 640.0, 360.0));
}

#[test]
fn rejects_degenerate_natural_size() {
    assert!(calc_scaled_coords(0.0, 480.0, 1280.0, 720.0).is_err());
    assert!(calc_scaled_coords(640.0, -1.0, 1280.0, 720.0).is_err());
    assert!(calc_scaled_coords(f64::NAN, 480.0, 1280.0, 720.0).is_err());
}

#[test]
fn apply_resize_offsets_by_target_origin_and_keeps_index() {
    let target = Geometry {
        x: 20.0,
        y: 556.0,
        index: 4,
        width: 256.0,
        height: 144.0,
        clip: None,
    };
    let g = apply_resize(&ResizePolicy::fill(Size::new(640.0, 480.0)), target).unwrap();
    assert_eq!(g.index, 4);
    assert_eq!(g.width, 256.0);
    assert!((g.height - 192.0).abs() < 1e-9);
    assert_eq!(g.x, 20.0);
    assert!((g.y - (556.0 - 24.0)).abs() < 1e-9);
}

#[test]
fn fill_overflow_is_clipped_to_the_target() {
    let target = Geometry {
        x: 20.0,
        y: 556.0,
        index: 4,
        width: 256.0,
        height: 144.0,
        clip: None,
    };
    let g = apply_resize(&ResizePolicy::fill(Size::new(640.0, 480.0)), target).unwrap();
    assert!(g.rect().height() > target.height);
    assert_eq!(g.clip, Some(target.rect()));
    assert_eq!(g.visible_rect(), target.rect());
}
