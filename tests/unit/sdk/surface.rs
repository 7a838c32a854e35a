use super::*;

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [
        frame.data[i],
        frame.data[i + 1],
        frame.data[i + 2],
        frame.data[i + 3],
    ]
}

#[test]
fn over_opaque_src_replaces_dst() {
    assert_eq!(over([0, 0, 255, 255], [255, 0, 0, 255], 1.0), [255, 0, 0, 255]);
}

#[test]
fn over_zero_opacity_keeps_dst() {
    assert_eq!(over([1, 2, 3, 4], [255, 0, 0, 255], 0.0), [1, 2, 3, 4]);
}

#[test]
fn draw_image_translated_covers_expected_pixels() {
    let mut surface = MemorySurface::new(8, 8);
    let img = MemoryImage::solid(2, 2, [255, 0, 0, 255]);
    surface.draw_image(&img, Affine::translate((3.0, 4.0)), 255);

    let frame = surface.read_pixels().unwrap();
    assert!(frame.premultiplied);
    assert_eq!(px(&frame, 3, 4), [255, 0, 0, 255]);
    assert_eq!(px(&frame, 4, 5), [255, 0, 0, 255]);
    assert_eq!(px(&frame, 2, 4), [0, 0, 0, 0]);
    assert_eq!(px(&frame, 5, 4), [0, 0, 0, 0]);
}

#[test]
fn draw_image_applies_layer_alpha() {
    let mut surface = MemorySurface::new(2, 2);
    let img = MemoryImage::solid(2, 2, [255, 255, 255, 255]);
    surface.draw_image(&img, Affine::IDENTITY, 128);

    let frame = surface.read_pixels().unwrap();
    assert_eq!(px(&frame, 0, 0), [128, 128, 128, 128]);
}

#[test]
fn degenerate_matrix_draws_nothing() {
    let mut surface = MemorySurface::new(4, 4);
    let img = MemoryImage::solid(2, 2, [255, 0, 0, 255]);
    surface.draw_image(&img, Affine::scale(0.0), 255);
    assert!(surface.read_pixels().unwrap().data.iter().all(|&b| b == 0));
}

#[test]
fn clear_resets_pixels() {
    let mut surface = MemorySurface::new(2, 2);
    surface.draw_image(
        &MemoryImage::solid(2, 2, [0, 255, 0, 255]),
        Affine::IDENTITY,
        255,
    );
    surface.clear();
    assert!(surface.read_pixels().unwrap().data.iter().all(|&b| b == 0));
}
