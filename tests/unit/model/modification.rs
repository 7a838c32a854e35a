use super::*;

#[test]
fn parses_object_form_in_order() {
    let list = ModificationList::from_json_str(
        r#"{"modifications":[
            {"layerIndex":0,"type":"text","value":"Alice"},
            {"layerIndex":1,"type":"text","value":"Engineer"}
        ]}"#,
    )
    .unwrap();
    assert_eq!(
        list.modifications,
        vec![
            Modification::Text {
                layer_index: 0,
                value: "Alice".to_string()
            },
            Modification::Text {
                layer_index: 1,
                value: "Engineer".to_string()
            },
        ]
    );
}

#[test]
fn parses_bare_array_and_aliases() {
    let list = ModificationList::from_json_str(
        r#"[
            {"editableIndex":2,"type":"imageReplacement","newImagePath":"a.png"},
            {"layerIndex":0,"type":"image","value":"image_0","imageData":"data:image/png;base64,AA=="}
        ]"#,
    )
    .unwrap();
    assert_eq!(
        list.modifications[0],
        Modification::ImageReplacement {
            layer_index: 2,
            image_path: PathBuf::from("a.png")
        }
    );
    let r = list.modifications[1].image_ref().unwrap();
    assert_eq!(r.value, "image_0");
    assert_eq!(r.image_data, Some("data:image/png;base64,AA=="));
}

#[test]
fn transform_fields_are_independent_with_defaults() {
    let list = ModificationList::from_json_str(
        r#"{"modifications":[{"layerIndex":0,"type":"imageTransform",
            "transform":{"position":{"x":100},"scale":{"y":2.0},"opacity":0.8}}]}"#,
    )
    .unwrap();
    let Modification::ImageTransform { transform, .. } = list.modifications[0] else {
        panic!("expected imageTransform");
    };
    assert_eq!(transform.position, Some(Offset2 { x: 100.0, y: 0.0 }));
    assert_eq!(transform.scale, Some(Scale2 { x: 1.0, y: 2.0 }));
    assert_eq!(transform.anchor_point, None);
    assert_eq!(transform.rotation, None);
    assert_eq!(transform.alpha(), Some(204));
}

#[test]
fn missing_transform_is_empty() {
    let list =
        ModificationList::from_json_str(r#"[{"layerIndex":3,"type":"imageTransform"}]"#).unwrap();
    let Modification::ImageTransform { transform, .. } = list.modifications[0] else {
        panic!("expected imageTransform");
    };
    assert!(transform.is_empty());
}

#[test]
fn opacity_is_clamped_before_alpha_conversion() {
    let t = TransformSpec {
        opacity: Some(1.7),
        ..TransformSpec::default()
    };
    assert_eq!(t.alpha(), Some(255));
    let t = TransformSpec {
        opacity: Some(-0.2),
        ..TransformSpec::default()
    };
    assert_eq!(t.alpha(), Some(0));
}

#[test]
fn unknown_type_parses_as_unsupported() {
    let list = ModificationList::from_json_str(
        r#"[{"layerIndex":0,"type":"shape"},{"layerIndex":0,"type":"text","value":"x"}]"#,
    )
    .unwrap();
    assert_eq!(list.modifications[0], Modification::Unsupported);
    assert_eq!(list.modifications[0].layer_index(), None);
    assert_eq!(list.len(), 2);
}

#[test]
fn persistence_split_and_counts() {
    let list = ModificationList::new(vec![
        Modification::Text {
            layer_index: 0,
            value: "a".to_string(),
        },
        Modification::ImageTransform {
            layer_index: 0,
            transform: TransformSpec::default(),
        },
        Modification::ImageTransform {
            layer_index: 1,
            transform: TransformSpec::default(),
        },
    ]);
    assert!(list.modifications[0].is_persistent());
    assert!(!list.modifications[1].is_persistent());

    let counts = list.counts_by_kind();
    assert_eq!(counts.get("text"), Some(&1));
    assert_eq!(counts.get("imageTransform"), Some(&2));
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = ModificationList::from_json_str("{").unwrap_err();
    assert!(err.to_string().contains("serialization error:"));

    let err = ModificationList::from_json_str(r#"[{"type":"text"}]"#).unwrap_err();
    assert!(matches!(err, PagError::Serde(_)));
}

#[test]
fn malformed_items_stay_in_place() {
    let list = ModificationList::from_json_str(
        r#"[
            {"layerIndex":0,"type":"text","value":"Alice"},
            {"layerIndex":-1,"type":"text","value":"Bad"},
            {"layerIndex":1,"type":"text"},
            {"layerIndex":2,"type":"text","value":7},
            {"layerIndex":1,"type":"text","value":"Engineer"}
        ]"#,
    )
    .unwrap();
    assert_eq!(list.len(), 5);
    for (i, m) in list.iter().enumerate().skip(1).take(3) {
        let Modification::Malformed { position, .. } = m else {
            panic!("item {i} should be malformed, got {m:?}");
        };
        assert_eq!(*position, i);
        assert_eq!(m.kind_name(), "malformed");
        assert_eq!(m.layer_index(), None);
    }
    assert_eq!(
        list.modifications[4],
        Modification::Text {
            layer_index: 1,
            value: "Engineer".to_string()
        }
    );

    let object =
        ModificationList::from_json_str(r#"{"modifications":[{"type":"image","layerIndex":"x"}]}"#)
            .unwrap();
    assert!(matches!(
        object.modifications[0],
        Modification::Malformed { position: 0, .. }
    ));
}

#[test]
fn broken_json_still_fails_the_list() {
    assert!(matches!(
        ModificationList::from_json_str("[{"),
        Err(PagError::Serde(_))
    ));
    assert!(matches!(
        ModificationList::from_json_str(r#"{"modifications":{"type":"text"}}"#),
        Err(PagError::Serde(_))
    ));
}
