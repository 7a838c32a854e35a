use super::*;
use base64::Engine as _;

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

fn image_ref<'a>(image_data: Option<&'a str>, value: &'a str) -> ImageRef<'a> {
    ImageRef { image_data, value }
}

#[test]
fn data_uri_decodes_mime_and_payload() {
    let (mime, bytes) = decode_data_uri("data:image/JPEG;base64,AAEC").unwrap();
    assert_eq!(mime, "image/jpeg");
    assert_eq!(bytes, vec![0, 1, 2]);
    assert_eq!(extension_for_mime(&mime), ".jpg");
    assert_eq!(extension_for_mime("image/webp"), ".webp");
    assert_eq!(extension_for_mime("application/octet-stream"), ".png");
}

#[test]
fn data_uri_rejects_bad_shapes() {
    assert!(matches!(
        decode_data_uri("data:image/png,rawbytes"),
        Err(PagError::ImageSource(_))
    ));
    assert!(matches!(
        decode_data_uri("data:image/png;base64"),
        Err(PagError::ImageSource(_))
    ));
    assert!(matches!(
        decode_data_uri("data:image/png;base64,@@@"),
        Err(PagError::ImageDecode(_))
    ));
}

#[test]
fn image_data_wins_over_value_and_temp_is_released() {
    let bytes = png_bytes();
    let uri = data_uri("image/webp", &bytes);
    let ctx = SourceContext::new().with_upload("image_0", vec![9, 9, 9]);

    let resolved = ctx.resolve(image_ref(Some(uri.as_str()), "image_0")).unwrap();
    let path = resolved.path().to_path_buf();
    assert!(path.to_string_lossy().ends_with(".webp"));
    assert_eq!(std::fs::read(&path).unwrap(), bytes);
    drop(resolved);
    assert!(!path.exists());
}

#[test]
fn value_data_uri_beats_upload_lookup() {
    let bytes = png_bytes();
    let uri = data_uri("image/png", &bytes);
    let resolved = SourceContext::new()
        .resolve(image_ref(None, &uri))
        .unwrap();
    assert!(matches!(resolved, ResolvedImage::Temp(_)));
    assert_eq!(std::fs::read(resolved.path()).unwrap(), bytes);
}

#[test]
fn upload_parts_are_found_by_field_name() {
    let bytes = png_bytes();
    let ctx = SourceContext::new().with_upload("image_0", bytes.clone());
    let resolved = ctx.resolve(image_ref(None, "image_0")).unwrap();
    assert!(resolved.path().to_string_lossy().ends_with(".png"));
    assert_eq!(std::fs::read(resolved.path()).unwrap(), bytes);
}

#[test]
fn paths_are_searched_under_roots_in_order() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    std::fs::write(second.path().join("logo.png"), png_bytes()).unwrap();
    std::fs::write(first.path().join("other.png"), png_bytes()).unwrap();

    let ctx = SourceContext::new()
        .with_search_root(first.path())
        .with_search_root(second.path());
    let resolved = ctx.resolve(image_ref(None, "logo.png")).unwrap();
    match resolved {
        ResolvedImage::Path(p) => assert_eq!(p, second.path().join("logo.png")),
        ResolvedImage::Temp(_) => panic!("expected a path"),
    }
    assert_eq!(
        ctx.resolve_path(Path::new("other.png")),
        Some(first.path().join("other.png"))
    );
}

#[test]
fn unresolvable_reference_is_a_source_error() {
    let ctx = SourceContext::new();
    assert!(matches!(
        ctx.resolve(image_ref(None, "nowhere/missing.png")),
        Err(PagError::ImageSource(_))
    ));
    assert!(matches!(
        ctx.resolve(image_ref(None, "")),
        Err(PagError::ImageSource(_))
    ));
    assert_eq!(ctx.resolve_path(Path::new("")), None);
}
