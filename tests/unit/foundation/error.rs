use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        PagError::input_unreadable("x")
            .to_string()
            .contains("input unreadable:")
    );
    assert!(
        PagError::layer_not_editable("x")
            .to_string()
            .contains("layer not editable:")
    );
    assert!(
        PagError::image_decode("x")
            .to_string()
            .contains("image decode error:")
    );
    assert!(
        PagError::serialization_failed("x")
            .to_string()
            .contains("serialization failed:")
    );
    assert!(
        PagError::frame_rasterize("x")
            .to_string()
            .contains("frame rasterize failed:")
    );
}

#[test]
fn fatal_variants_are_request_level_only() {
    assert!(PagError::input_unreadable("x").is_fatal());
    assert!(PagError::serialization_failed("x").is_fatal());
    assert!(PagError::sdk_unavailable("x").is_fatal());

    assert!(!PagError::layer_not_editable("x").is_fatal());
    assert!(!PagError::layer_ambiguous("x").is_fatal());
    assert!(!PagError::image_decode("x").is_fatal());
    assert!(!PagError::substitution("x").is_fatal());
    assert!(!PagError::frame_rasterize("x").is_fatal());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PagError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
