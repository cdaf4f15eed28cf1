use hashbrown::HashMap;
use vellum_asset_core::{
    names, AnimationKey, AssetDescription, AssetElement, ElementId, SpriteProperties,
};

/// Root transform with a sprite `body` and a sprite `arm` under it, keyed in
/// two clips.
fn rig() -> (AssetDescription, ElementId, ElementId) {
    let mut d = AssetDescription::new("rig", AssetElement::transform("root"));
    let body = d
        .add_element(d.root_id(), AssetElement::sprite("body", SpriteProperties::default()))
        .unwrap();
    let arm = d
        .add_element(body, AssetElement::sprite("arm", SpriteProperties::default()))
        .unwrap();
    for clip in ["walk", "wave"] {
        d.set_key(clip, body, names::OFFSET_X, AnimationKey::new(0, 0.0f32))
            .unwrap();
        d.set_key(clip, body, names::OFFSET_X, AnimationKey::new(20, 1.0f32))
            .unwrap();
        d.set_key(clip, arm, names::SPRITE, AnimationKey::new(0, "arm_up"))
            .unwrap();
    }
    d.set_key("wave", arm, names::VISIBLE, AnimationKey::new(5, false))
        .unwrap();
    (d, body, arm)
}

#[test]
fn removing_an_element_purges_its_tracks_everywhere() {
    let (mut d, body, arm) = rig();
    let removed = d.remove_element(body).unwrap();
    assert_eq!(removed.len(), 2);
    for (_, clip) in d.animations() {
        assert_eq!(clip.track_count(), 0);
        assert!(!clip.touches(body));
        assert!(!clip.touches(arm));
        assert!(clip.referenced_element_ids().is_empty());
    }
}

#[test]
fn renew_then_remap_preserves_key_data() {
    let (mut d, body, arm) = rig();
    let before: Vec<_> = d
        .animation("wave")
        .unwrap()
        .tracks_for_element(arm)
        .cloned()
        .collect();

    let new_arm = d.renew_element_id(arm).unwrap();
    assert_ne!(new_arm, arm);
    assert_eq!(d.elements().children(body), &[new_arm]);
    assert_eq!(d.elements().parent(new_arm), Some(body));

    let mut mapping = HashMap::new();
    mapping.insert(arm, new_arm);
    d.remap_element_ids(&mapping);

    let wave = d.animation("wave").unwrap();
    assert_eq!(wave.track_count(), 3);
    assert!(!wave.touches(arm));
    let after: Vec<_> = wave.tracks_for_element(new_arm).cloned().collect();
    assert_eq!(before, after);
    assert_eq!(d.animation("walk").unwrap().track_count(), 2);
}

#[test]
fn moving_keeps_tracks_and_updates_world_offset() {
    let (mut d, body, arm) = rig();
    d.element_mut(body).unwrap().world_offset = [2.0, 0.0, 0.0];
    d.element_mut(arm).unwrap().world_offset = [0.0, 1.0, 0.0];
    assert_eq!(d.elements().absolute_offset(arm), Some([2.0, 1.0, 0.0]));

    d.move_element(arm, d.root_id(), 0).unwrap();
    assert_eq!(d.elements().absolute_offset(arm), Some([0.0, 1.0, 0.0]));
    assert_eq!(d.elements().children(d.root_id()), &[arm, body]);
    assert!(d.animation("wave").unwrap().touches(arm));
}

#[test]
fn duplicating_a_subtree_copies_every_track() {
    let (mut d, body, _arm) = rig();
    let copy = d.duplicate_element(body).unwrap();
    assert_eq!(d.elements().len(), 5);
    let copy_arm = d.elements().children(copy)[0];
    let wave = d.animation("wave").unwrap();
    assert_eq!(wave.track_count(), 6);
    assert!(wave.touches(copy));
    assert!(wave.track(copy_arm, names::VISIBLE).is_some());
}
