//! Timed playback schedules compiled from tracks.
//!
//! A [`TrackSchedule`] is a small step program over wall-clock seconds:
//! `Snap` applies a value instantly, `Wait` idles, `Hold` idles then snaps to
//! the next key, and `Tween` eases between two values. A [`CombinedSchedule`]
//! resamples every axis of a combined group at frame granularity so the axes
//! are applied together. [`ElementTimeline`] bundles both for one element.

use crate::animation::{AnimationTrack, AssetAnimation};
use crate::config::{seconds_to_frame, FRAME_DURATION};
use crate::element::{AssetElement, CombinedGroup};
use crate::ids::ElementId;
use crate::interp::functions::interpolate_value;
use crate::interp::TimingInterpolation;
use crate::value::TrackValue;

/// Tolerance when comparing accumulated step durations.
pub(crate) const TIME_EPS: f32 = 1e-5;

#[derive(Clone, Debug, PartialEq)]
pub enum ScheduleStep {
    /// Apply `value` instantly.
    Snap { value: TrackValue },
    /// Do nothing for `duration` seconds.
    Wait { duration: f32 },
    /// Keep the current value for `duration` seconds, then apply `then`.
    Hold { duration: f32, then: TrackValue },
    /// Ease from `from` to `to` over a segment `span` seconds long, of which
    /// only the first `duration` seconds are played (truncated last segment).
    Tween {
        from: TrackValue,
        to: TrackValue,
        span: f32,
        duration: f32,
        timing: TimingInterpolation,
    },
}

impl ScheduleStep {
    #[inline]
    pub fn duration(&self) -> f32 {
        match self {
            ScheduleStep::Snap { .. } => 0.0,
            ScheduleStep::Wait { duration }
            | ScheduleStep::Hold { duration, .. }
            | ScheduleStep::Tween { duration, .. } => *duration,
        }
    }
}

fn tween_value(
    from: &TrackValue,
    to: &TrackValue,
    span: f32,
    elapsed: f32,
    timing: TimingInterpolation,
) -> TrackValue {
    if span <= 0.0 || elapsed >= span {
        return to.clone();
    }
    let ratio = (elapsed / span).clamp(0.0, 1.0);
    interpolate_value(from, to, timing.ease(ratio))
}

/// Compiled playback program for one property.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackSchedule {
    pub property: String,
    pub steps: Vec<ScheduleStep>,
}

impl TrackSchedule {
    /// Compile `track` into steps that exactly fill `duration` seconds.
    ///
    /// Tracks with fewer than two keys, or whose first key starts after
    /// `duration`, compile to an empty schedule.
    pub fn compile(track: &AnimationTrack, duration: f32) -> TrackSchedule {
        let mut schedule = TrackSchedule {
            property: track.property().to_string(),
            steps: Vec::new(),
        };
        let keys = track.keys();
        if keys.len() < 2 || keys[0].time() > duration {
            return schedule;
        }

        let steps = &mut schedule.steps;
        steps.push(ScheduleStep::Snap {
            value: keys[0].value().clone(),
        });
        if keys[0].time() > 0.0 {
            steps.push(ScheduleStep::Wait {
                duration: keys[0].time(),
            });
        }

        for pair in keys.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let start = prev.time();
            if start >= duration {
                break;
            }
            let gap = next.time() - start;
            let played = (next.time().min(duration) - start).max(0.0);
            let truncated = played + TIME_EPS < gap;

            if prev.maintain_value || prev.value().kind().is_discrete() {
                if truncated {
                    steps.push(ScheduleStep::Wait { duration: played });
                } else {
                    steps.push(ScheduleStep::Hold {
                        duration: gap,
                        then: next.value().clone(),
                    });
                }
            } else {
                steps.push(ScheduleStep::Tween {
                    from: prev.value().clone(),
                    to: next.value().clone(),
                    span: gap,
                    duration: played,
                    timing: prev.timing,
                });
            }
        }

        let total = schedule.total_duration();
        if total + TIME_EPS < duration {
            schedule.steps.push(ScheduleStep::Wait {
                duration: duration - total,
            });
        }
        schedule
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn total_duration(&self) -> f32 {
        self.steps.iter().map(ScheduleStep::duration).sum()
    }

    /// Value produced by running the program for `elapsed` seconds, or
    /// `None` before anything has been applied.
    pub fn value_at(&self, elapsed: f32) -> Option<TrackValue> {
        let mut t = 0.0f32;
        let mut current: Option<TrackValue> = None;
        for step in &self.steps {
            match step {
                ScheduleStep::Snap { value } => current = Some(value.clone()),
                ScheduleStep::Wait { duration } => {
                    if elapsed + TIME_EPS < t + duration {
                        return current;
                    }
                    t += duration;
                }
                ScheduleStep::Hold { duration, then } => {
                    if elapsed + TIME_EPS < t + duration {
                        return current;
                    }
                    t += duration;
                    current = Some(then.clone());
                }
                ScheduleStep::Tween {
                    from,
                    to,
                    span,
                    duration,
                    timing,
                } => {
                    if elapsed + TIME_EPS < t + duration {
                        return Some(tween_value(from, to, *span, elapsed - t, *timing));
                    }
                    t += duration;
                    current = Some(tween_value(from, to, *span, *duration, *timing));
                }
            }
        }
        current
    }
}

/// Joint sampler for the axes of one combined group.
#[derive(Clone, Debug, PartialEq)]
pub struct CombinedSchedule {
    pub group: &'static CombinedGroup,
    /// One entry per axis, in group order; `None` for unkeyed axes.
    pub axes: Vec<Option<AnimationTrack>>,
    pub duration: f32,
}

impl CombinedSchedule {
    /// Sampler for `group` on `element` in `clip`; `None` if no axis is keyed.
    pub fn compile(
        clip: &AssetAnimation,
        element: ElementId,
        group: &'static CombinedGroup,
        duration: f32,
    ) -> Option<CombinedSchedule> {
        let axes: Vec<Option<AnimationTrack>> = group
            .axes
            .iter()
            .map(|axis| clip.track(element, axis).filter(|t| !t.is_empty()).cloned())
            .collect();
        if axes.iter().all(Option::is_none) {
            return None;
        }
        Some(CombinedSchedule {
            group,
            axes,
            duration,
        })
    }

    /// Frame sampled after `elapsed` seconds (clamped to the schedule's end).
    pub fn frame_at(&self, elapsed: f32) -> u32 {
        seconds_to_frame(elapsed.min(self.duration).max(0.0))
    }

    /// Sample every axis at `frame`: `(property, value)` with `None` for
    /// axes the caller must fill from the current value.
    pub fn sample(&self, frame: u32) -> Vec<(&'static str, Option<TrackValue>)> {
        self.group
            .axes
            .iter()
            .zip(&self.axes)
            .map(|(name, track)| (*name, track.as_ref().and_then(|t| t.sample(frame))))
            .collect()
    }
}

/// Everything needed to play one clip on one element over a fixed window.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementTimeline {
    pub element: ElementId,
    pub tracks: Vec<TrackSchedule>,
    pub groups: Vec<CombinedSchedule>,
    pub duration: f32,
}

impl ElementTimeline {
    /// Compile the clip's tracks for `element`: independent properties become
    /// [`TrackSchedule`]s, combined groups with any keyed axis become
    /// [`CombinedSchedule`]s.
    pub fn compile(clip: &AssetAnimation, element: &AssetElement, duration: f32) -> ElementTimeline {
        let id = element.id();
        let element_type = element.element_type();
        let tracks = element
            .eligible_track_types()
            .iter()
            .filter(|p| element_type.combined_group_of(p).is_none())
            .filter_map(|p| clip.track(id, p))
            .map(|t| TrackSchedule::compile(t, duration))
            .filter(|s| !s.is_empty())
            .collect();
        let groups = element
            .combined_groups()
            .iter()
            .filter_map(|g| CombinedSchedule::compile(clip, id, g, duration))
            .collect();
        ElementTimeline {
            element: id,
            tracks,
            groups,
            duration,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty() && self.groups.is_empty()
    }

    /// Number of frames the window spans.
    pub fn frame_count(&self) -> u32 {
        (self.duration / FRAME_DURATION).ceil() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationKey;
    use crate::config::frame_to_seconds;
    use crate::track_type::names;

    fn track(keys: Vec<AnimationKey>) -> AnimationTrack {
        AnimationTrack::with_keys(names::COLOR_BLEND, keys).unwrap()
    }

    #[test]
    fn fewer_than_two_keys_compile_to_nothing() {
        let t = track(vec![AnimationKey::new(0, 1.0f32)]);
        assert!(TrackSchedule::compile(&t, 1.0).is_empty());
    }

    #[test]
    fn late_first_key_compiles_to_nothing() {
        let t = track(vec![AnimationKey::new(120, 0.0f32), AnimationKey::new(180, 1.0f32)]);
        assert!(TrackSchedule::compile(&t, 1.0).is_empty());
    }

    #[test]
    fn hold_key_emits_wait_then_snap() {
        let t = track(vec![
            AnimationKey::new(0, 0.0f32).with_maintain_value(true),
            AnimationKey::new(30, 1.0f32),
        ]);
        let s = TrackSchedule::compile(&t, 0.5);
        assert_eq!(
            s.steps,
            vec![
                ScheduleStep::Snap {
                    value: TrackValue::Float(0.0)
                },
                ScheduleStep::Hold {
                    duration: frame_to_seconds(30),
                    then: TrackValue::Float(1.0)
                },
            ]
        );
        assert_eq!(s.value_at(0.25), Some(TrackValue::Float(0.0)));
        assert_eq!(s.value_at(0.5), Some(TrackValue::Float(1.0)));
    }

    #[test]
    fn trailing_wait_fills_window() {
        let t = track(vec![AnimationKey::new(0, 0.0f32), AnimationKey::new(30, 1.0f32)]);
        let s = TrackSchedule::compile(&t, 2.0);
        assert!((s.total_duration() - 2.0).abs() < 1e-4);
        assert!(matches!(s.steps.last(), Some(ScheduleStep::Wait { .. })));
        assert_eq!(s.value_at(1.5), Some(TrackValue::Float(1.0)));
    }

    #[test]
    fn truncated_tween_keeps_segment_pace() {
        let t = track(vec![AnimationKey::new(0, 0.0f32), AnimationKey::new(60, 10.0f32)]);
        let s = TrackSchedule::compile(&t, 0.5);
        let Some(ScheduleStep::Tween { span, duration, .. }) = s.steps.get(1) else {
            panic!("expected tween, got {:?}", s.steps);
        };
        assert!((span - 1.0).abs() < 1e-5);
        assert!((duration - 0.5).abs() < 1e-5);
        assert!((s.total_duration() - 0.5).abs() < 1e-5);
        match s.value_at(0.25) {
            Some(TrackValue::Float(v)) => assert!((v - 2.5).abs() < 1e-3, "{v}"),
            other => panic!("{other:?}"),
        }
        match s.value_at(10.0) {
            Some(TrackValue::Float(v)) => assert!((v - 5.0).abs() < 1e-3, "{v}"),
            other => panic!("{other:?}"),
        }
    }
}
