use super::*;

#[test]
fn letterbox_fits_inside_and_centers() {
    let m = ScaleMode::LetterBox.fit_matrix(Size::new(200.0, 100.0), Size::new(100.0, 100.0));
    assert_eq!(m * Point::new(0.0, 0.0), Point::new(0.0, 25.0));
    assert_eq!(m * Point::new(200.0, 100.0), Point::new(100.0, 75.0));
}

#[test]
fn zoom_covers_and_centers() {
    let m = ScaleMode::Zoom.fit_matrix(Size::new(200.0, 100.0), Size::new(100.0, 100.0));
    assert_eq!(m * Point::new(0.0, 0.0), Point::new(-50.0, 0.0));
    assert_eq!(m * Point::new(200.0, 100.0), Point::new(150.0, 100.0));
}

#[test]
fn stretch_and_none() {
    let m = ScaleMode::Stretch.fit_matrix(Size::new(50.0, 20.0), Size::new(100.0, 100.0));
    assert_eq!(m * Point::new(50.0, 20.0), Point::new(100.0, 100.0));
    assert_eq!(
        ScaleMode::None.fit_matrix(Size::new(50.0, 20.0), Size::new(100.0, 100.0)),
        Affine::IDENTITY
    );
}

#[test]
fn degenerate_sizes_fall_back_to_identity() {
    assert_eq!(
        ScaleMode::LetterBox.fit_matrix(Size::new(0.0, 10.0), Size::new(100.0, 100.0)),
        Affine::IDENTITY
    );
}

#[test]
fn default_scale_mode_is_letterbox() {
    assert_eq!(ScaleMode::default(), ScaleMode::LetterBox);
}
