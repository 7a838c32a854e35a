use super::*;

#[test]
fn frame_count_floors_duration_times_fps() {
    let t = FrameTiming::new(3.0, 30.0).unwrap();
    assert_eq!(t.total_frames(), 90);

    let t = FrameTiming::from_micros(1_010_000, 24.0).unwrap();
    assert_eq!(t.total_frames(), 24);
}

#[test]
fn progress_spans_first_to_last_frame() {
    let t = FrameTiming::new(3.0, 30.0).unwrap();
    assert_eq!(t.progress_at(0), 0.0);
    assert_eq!(t.progress_at(89), 1.0);
    assert!((t.progress_at(44) - 44.0 / 89.0).abs() < 1e-12);
}

#[test]
fn single_frame_document_renders_at_zero() {
    let t = FrameTiming::new(0.05, 30.0).unwrap();
    assert_eq!(t.total_frames(), 1);
    assert_eq!(t.progress_at(0), 0.0);
}

#[test]
fn timing_rejects_bad_fps() {
    assert!(FrameTiming::new(1.0, 0.0).is_err());
    assert!(FrameTiming::new(1.0, f64::NAN).is_err());
    assert!(FrameTiming::new(-1.0, 30.0).is_err());
}

#[test]
fn layer_transform_identity_and_translation() {
    let t = LayerTransform2D::default();
    assert_eq!(t.to_affine(), Affine::IDENTITY);

    let t = LayerTransform2D {
        position: Vec2::new(10.0, -2.5),
        ..LayerTransform2D::default()
    };
    assert_eq!(t.to_affine(), Affine::translate(Vec2::new(10.0, -2.5)));
}

#[test]
fn layer_transform_maps_anchor_onto_position() {
    let t = LayerTransform2D {
        position: Vec2::new(100.0, 200.0),
        anchor: Vec2::new(50.0, 50.0),
        scale: Vec2::new(1.5, 1.5),
        rotation_deg: 45.0,
    };
    let p = t.to_affine() * Point::new(50.0, 50.0);
    assert!((p.x - 100.0).abs() < 1e-9);
    assert!((p.y - 200.0).abs() < 1e-9);
}

#[test]
fn straight_alpha_conversion_inverts_premultiply() {
    let frame = FrameRGBA {
        width: 1,
        height: 1,
        data: vec![64, 32, 0, 128],
        premultiplied: true,
    };
    assert_eq!(frame.to_straight_rgba8(), vec![128, 64, 0, 128]);
}
