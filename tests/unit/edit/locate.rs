use super::*;
use crate::foundation::core::Size;
use crate::sdk::memory::{ImageLayerSpec, MemoryDocument};

fn doc() -> MemoryDocument {
    MemoryDocument::builder(64, 64)
        .text("title")
        .image_layer(ImageLayerSpec::new("a", 0, Size::new(32.0, 32.0)))
        .image_layer(ImageLayerSpec::new("b", 1, Size::new(32.0, 32.0)))
        .image_layer(ImageLayerSpec::new("b-copy", 1, Size::new(32.0, 32.0)))
        .build()
        .unwrap()
}

#[test]
fn kind_narrows_the_search() {
    let d = doc();
    let loc = Locator::default();
    assert_eq!(loc.locate(&d, 0, LayerKind::Image).unwrap(), LayerId(1));
    assert_eq!(loc.locate(&d, 0, LayerKind::Text).unwrap(), LayerId(0));
}

#[test]
fn missing_index_is_not_editable() {
    let err = Locator::default()
        .locate(&doc(), 9, LayerKind::Image)
        .unwrap_err();
    assert!(matches!(err, PagError::LayerNotEditable(_)));
}

#[test]
fn ambiguity_takes_first_or_rejects() {
    let d = doc();
    assert_eq!(
        Locator::new(AmbiguityPolicy::First)
            .locate(&d, 1, LayerKind::Image)
            .unwrap(),
        LayerId(2)
    );
    let err = Locator::new(AmbiguityPolicy::Reject)
        .locate(&d, 1, LayerKind::Image)
        .unwrap_err();
    assert!(matches!(err, PagError::LayerAmbiguous(_)));
}

#[test]
fn policy_parses_lowercase() {
    let p: AmbiguityPolicy = serde_json::from_str("\"reject\"").unwrap();
    assert_eq!(p, AmbiguityPolicy::Reject);
}
