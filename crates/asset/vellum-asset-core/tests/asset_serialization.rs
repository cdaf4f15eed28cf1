use std::sync::Arc;

use vellum_asset_core::{
    names, AssetDatabase, AssetDescription, AssetError, AssetInstance, ElementType,
    ErrorCategory, NodeCommandBuffer, TrackValue,
};

fn load(name: &str) -> AssetDescription {
    let json = vellum_test_fixtures::assets::json(name).expect("load asset fixture");
    AssetDescription::from_json(&json).expect("parse asset fixture")
}

#[test]
fn every_fixture_loads_and_validates() {
    for name in vellum_test_fixtures::assets::keys() {
        let json = vellum_test_fixtures::assets::json(&name).unwrap();
        AssetDescription::from_json(&json).unwrap_or_else(|e| panic!("{name}: {e}"));
    }
}

#[test]
fn lantern_round_trips_through_json() {
    let lantern = load("lantern");
    assert_eq!(lantern.name, "Lantern");
    assert_eq!(lantern.elements().len(), 3);
    assert_eq!(lantern.animation_names().collect::<Vec<_>>(), ["idle", "off", "swing"]);

    let encoded = lantern.to_json().unwrap();
    let decoded = AssetDescription::from_json(&encoded).unwrap();
    assert_eq!(decoded, lantern);

    let flame = decoded
        .elements()
        .iter()
        .find(|e| e.name == "flame")
        .expect("flame element");
    assert_eq!(flame.element_type(), ElementType::Sprite);
    let idle = decoded.animation("idle").unwrap();
    assert_eq!(idle.track(flame.id(), names::SPRITE).unwrap().len(), 3);
}

#[test]
fn sparse_fixture_fills_defaults() {
    let stack = load("crate-stack");
    assert_eq!(stack.footprint, [1, 1]);
    let top = stack.elements().iter().find(|e| e.name == "top").unwrap();
    assert!(top.visible);
    assert!(top.horizontally_flipped);
    assert_eq!(top.property_value(names::ANCHOR_X), Some(TrackValue::Float(0.5)));
    assert!(stack.animation_names().next().is_none());
}

#[test]
fn key_without_value_aborts_the_load() {
    let json = r#"{
        "uuid": "0d5d0d2c-7a52-4b61-9a4f-41b1e0c7f111",
        "name": "broken",
        "root": { "id": "3e0a2c1b-5d4f-4e6a-8b7c-9d0e1f2a3b4c", "name": "root", "type": "transform" },
        "animations": {
            "a": { "tracks": { "3e0a2c1b-5d4f-4e6a-8b7c-9d0e1f2a3b4c:visible": {
                "type": "visible", "keys": [ { "frame": 0 } ] } } }
        }
    }"#;
    let err = AssetDescription::from_json(json).unwrap_err();
    assert_eq!(err, AssetError::NoDefinedValue { frame: 0 });
    assert_eq!(err.category(), ErrorCategory::Schema);
}

#[test]
fn key_errors_keep_their_variant_through_the_load() {
    let ambiguous = r#"{
        "uuid": "0d5d0d2c-7a52-4b61-9a4f-41b1e0c7f111",
        "name": "broken",
        "root": { "id": "3e0a2c1b-5d4f-4e6a-8b7c-9d0e1f2a3b4c", "name": "root", "type": "transform" },
        "animations": {
            "a": { "tracks": { "3e0a2c1b-5d4f-4e6a-8b7c-9d0e1f2a3b4c:offset.x": {
                "type": "offset.x", "keys": [ { "frame": 4, "f": 1.0, "b": true } ] } } }
        }
    }"#;
    let err = AssetDescription::from_json(ambiguous).unwrap_err();
    assert_eq!(err, AssetError::AmbiguousValue { frame: 4 });

    let duplicate = r#"{
        "uuid": "0d5d0d2c-7a52-4b61-9a4f-41b1e0c7f111",
        "name": "broken",
        "root": { "id": "3e0a2c1b-5d4f-4e6a-8b7c-9d0e1f2a3b4c", "name": "root", "type": "transform" },
        "animations": {
            "a": { "tracks": { "3e0a2c1b-5d4f-4e6a-8b7c-9d0e1f2a3b4c:offset.x": {
                "type": "offset.x", "keys": [ { "frame": 2, "f": 1.0 }, { "frame": 2, "f": 3.0 } ] } } }
        }
    }"#;
    let err = AssetDescription::from_json(duplicate).unwrap_err();
    assert!(matches!(err, AssetError::DuplicateKeyFrame { frame: 2, .. }), "{err:?}");
    assert_eq!(err.category(), ErrorCategory::Structural);

    let malformed = r#"{
        "uuid": "0d5d0d2c-7a52-4b61-9a4f-41b1e0c7f111",
        "name": "broken",
        "root": { "id": "3e0a2c1b-5d4f-4e6a-8b7c-9d0e1f2a3b4c", "name": "root", "type": "transform" },
        "animations": { "a": { "tracks": { "visible": { "type": "visible", "keys": [] } } } }
    }"#;
    let err = AssetDescription::from_json(malformed).unwrap_err();
    assert!(matches!(err, AssetError::MalformedTrackKey { .. }), "{err:?}");
}

#[test]
fn unknown_track_type_aborts_the_load() {
    let json = r#"{
        "uuid": "0d5d0d2c-7a52-4b61-9a4f-41b1e0c7f111",
        "name": "broken",
        "root": { "id": "3e0a2c1b-5d4f-4e6a-8b7c-9d0e1f2a3b4c", "name": "root", "type": "transform" },
        "animations": {
            "a": { "tracks": { "3e0a2c1b-5d4f-4e6a-8b7c-9d0e1f2a3b4c:wobble": {
                "type": "wobble", "keys": [ { "frame": 0, "f": 1.0 } ] } } }
        }
    }"#;
    let err = AssetDescription::from_json(json).unwrap_err();
    assert_eq!(
        err,
        AssetError::UnknownTrackType {
            name: "wobble".into()
        }
    );
}

#[test]
fn fixture_instantiates_one_node_per_element() {
    let stack = Arc::new(load("crate-stack"));
    let mut host = NodeCommandBuffer::new();
    let instance = AssetInstance::new(Arc::clone(&stack), &AssetDatabase::new(), &mut host).unwrap();
    assert_eq!(host.created().count(), 3);
    let top = stack.elements().iter().find(|e| e.name == "top").unwrap().id();
    assert!(instance.is_flipped(top));
    assert_eq!(instance.world_position(top), Some([0.0, 1.0, 0.0]));
}
