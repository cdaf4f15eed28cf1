use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use vellum_asset_core::{
    names, AnimationKey, AnimationTrack, AssetDatabase, AssetDescription, AssetInstance,
    NullHost, TimingInterpolation,
};

fn dense_track() -> AnimationTrack {
    AnimationTrack::with_keys(
        names::COLOR_BLEND,
        (0..240u32).step_by(4).map(|frame| {
            AnimationKey::new(frame, (frame % 7) as f32 / 7.0)
                .with_timing(TimingInterpolation::EaseInOut)
        }),
    )
    .expect("build dense track")
}

fn bench_sample(c: &mut Criterion) {
    let track = dense_track();
    c.bench_function("sample_dense_track", |b| {
        b.iter(|| {
            for frame in 0..240 {
                black_box(track.sample(black_box(frame)));
            }
        })
    });
}

fn bench_instance_frames(c: &mut Criterion) {
    let mut db = AssetDatabase::new();
    for (locator, json) in vellum_test_fixtures::assets::located().expect("fixtures") {
        let description = AssetDescription::from_json(&json).expect("parse fixture");
        db.insert(locator.as_str(), description);
    }
    let signpost: Arc<AssetDescription> = db
        .get(&"props/signpost".into())
        .cloned()
        .expect("signpost fixture");
    let mut instance = AssetInstance::new(signpost, &db, &mut NullHost).expect("instantiate");
    instance
        .set_current_animation(Some("windy"), &mut NullHost)
        .expect("windy clip");

    c.bench_function("signpost_frame_step", |b| {
        let mut frame = 0u32;
        b.iter(|| {
            frame = (frame + 1) % 60;
            instance.set_current_frame(black_box(frame), &mut NullHost);
        })
    });
}

criterion_group!(benches, bench_sample, bench_instance_frames);
criterion_main!(benches);
