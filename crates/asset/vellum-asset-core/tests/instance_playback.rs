use std::sync::Arc;

use approx::assert_abs_diff_eq;
use vellum_asset_core::{
    names, AssetDatabase, AssetDescription, AssetInstance, Color, ElementId, NodeCommandBuffer,
    NullHost, TrackValue,
};

struct Lantern {
    instance: AssetInstance,
    host: NodeCommandBuffer,
    glass: ElementId,
    flame: ElementId,
}

fn lantern() -> Lantern {
    let json = vellum_test_fixtures::assets::json("lantern").unwrap();
    let description = Arc::new(AssetDescription::from_json(&json).unwrap());
    let find = |name: &str| {
        description
            .elements()
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.id())
            .unwrap()
    };
    let (glass, flame) = (find("glass"), find("flame"));
    let mut host = NodeCommandBuffer::new();
    let instance = AssetInstance::new(description, &AssetDatabase::new(), &mut host).unwrap();
    Lantern {
        instance,
        host,
        glass,
        flame,
    }
}

fn float(instance: &AssetInstance, id: ElementId, property: &str) -> f32 {
    instance
        .current_value(id, property)
        .and_then(|v| v.as_float())
        .unwrap()
}

#[test]
fn instantiation_creates_nodes_parent_first() {
    let l = lantern();
    let created: Vec<_> = l.host.created().map(|(_, e)| e).collect();
    assert_eq!(created, [l.instance.root_id(), l.glass, l.flame]);
    let flame_node = l.instance.element(l.flame).unwrap().node();
    let attrs = l.host.last_update(flame_node).unwrap();
    assert_eq!(attrs.position, [0.0, 0.75, 0.0]);
    assert_eq!(attrs.sprite.as_ref().map(|s| s.as_str()), Some("props/lantern/flame_0"));
    assert!(!l.instance.is_playing());
}

#[test]
fn switching_clips_resets_previous_overrides() {
    let mut l = lantern();
    l.instance.set_current_animation(Some("off"), &mut l.host).unwrap();
    assert_eq!(
        l.instance.current_value(l.flame, names::VISIBLE),
        Some(TrackValue::Bool(false))
    );
    let dimmed = l.instance.current_value(l.glass, names::COLOR);
    assert_ne!(dimmed, Some(TrackValue::Color(Color::WHITE)));

    l.instance.set_current_animation(Some("idle"), &mut l.host).unwrap();
    assert_eq!(
        l.instance.current_value(l.flame, names::VISIBLE),
        Some(TrackValue::Bool(true))
    );
    assert_eq!(
        l.instance.current_value(l.glass, names::COLOR),
        Some(TrackValue::Color(Color::WHITE))
    );
    assert!(!l.instance.element(l.glass).unwrap().has_overrides());
}

#[test]
fn frame_updates_follow_the_current_clip() {
    let mut l = lantern();
    l.instance.set_current_animation(Some("idle"), &mut l.host).unwrap();
    l.instance.set_current_frame(30, &mut l.host);
    assert_abs_diff_eq!(float(&l.instance, l.flame, names::COLOR_BLEND), 0.5, epsilon = 1e-5);
    assert_eq!(
        l.instance.current_value(l.flame, names::SPRITE),
        Some(TrackValue::from("props/lantern/flame_1"))
    );

    l.instance.set_current_frame(45, &mut l.host);
    assert_eq!(
        l.instance.current_value(l.flame, names::SPRITE),
        Some(TrackValue::from("props/lantern/flame_2"))
    );
    let node = l.instance.element(l.flame).unwrap().node();
    let attrs = l.host.last_update(node).unwrap();
    assert_eq!(attrs.sprite.as_ref().map(|s| s.as_str()), Some("props/lantern/flame_2"));
}

#[test]
fn offset_group_moves_the_whole_subtree() {
    let mut l = lantern();
    l.instance.set_current_animation(Some("swing"), &mut l.host).unwrap();
    l.host.clear();
    l.instance.set_current_frame(15, &mut l.host);

    assert_abs_diff_eq!(float(&l.instance, l.glass, names::OFFSET_X), 0.125, epsilon = 1e-5);
    // Unkeyed axes keep their authored values.
    assert_abs_diff_eq!(float(&l.instance, l.glass, names::OFFSET_Y), 0.5, epsilon = 1e-5);

    let flame_node = l.instance.element(l.flame).unwrap().node();
    let position = l.host.last_update(flame_node).expect("child pushed").position;
    assert_abs_diff_eq!(position[0], 0.125, epsilon = 1e-5);
    assert_abs_diff_eq!(position[1], 0.75, epsilon = 1e-5);
}

#[test]
fn stopping_playback_and_manual_overrides_reset_to_defaults() {
    let mut l = lantern();
    l.instance.set_current_animation(Some("off"), &mut NullHost).unwrap();
    l.instance.set_current_animation(None, &mut NullHost).unwrap();
    assert!(!l.instance.is_playing());
    assert_eq!(
        l.instance.current_value(l.flame, names::VISIBLE),
        Some(TrackValue::Bool(true))
    );

    l.instance
        .override_property(l.flame, names::COLOR_BLEND, TrackValue::Float(0.9), &mut l.host)
        .unwrap();
    assert_abs_diff_eq!(float(&l.instance, l.flame, names::COLOR_BLEND), 0.9);
    l.instance.apply_defaults(&mut l.host);
    assert_abs_diff_eq!(float(&l.instance, l.flame, names::COLOR_BLEND), 0.0);
}

#[test]
fn frames_without_a_clip_change_nothing() {
    let mut l = lantern();
    l.host.clear();
    l.instance.set_current_frame(12, &mut l.host);
    assert_eq!(l.instance.current_frame(), 12);
    assert!(l.host.is_empty());
}
