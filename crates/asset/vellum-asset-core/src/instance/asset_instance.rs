//! Runtime instance of an asset description.
//!
//! An instance mirrors the authored tree one [`ElementInstance`] per element,
//! owns one nested [`AssetInstance`] per resolved reference element and
//! drives clip playback. State changes are applied first and pushed to the
//! [`NodeHost`] in one flush at the end of each public operation.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};

use crate::animation::AssetAnimation;
use crate::config::{frame_to_seconds, Config};
use crate::database::AssetResolver;
use crate::description::AssetDescription;
use crate::element::{AssetElement, OFFSET_GROUP};
use crate::error::AssetError;
use crate::ids::{ElementId, NodeId};
use crate::instance::element_instance::ElementInstance;
use crate::node::NodeHost;
use crate::schedule::{ElementTimeline, TIME_EPS};
use crate::track_type::names;
use crate::value::TrackValue;

#[derive(Debug)]
struct ActiveTimeline {
    timeline: ElementTimeline,
    elapsed: f32,
}

#[derive(Debug)]
pub struct AssetInstance {
    description: Arc<AssetDescription>,
    config: Config,
    /// Nesting level; the top-level instance is 0.
    depth: usize,
    /// Absolute position and flip of the owning reference element.
    origin: [f32; 3],
    origin_flipped: bool,
    parent_node: Option<NodeId>,
    root: ElementId,
    elements: HashMap<ElementId, ElementInstance>,
    /// Reference elements, pre-order.
    references: Vec<ElementId>,
    current_animation: Option<String>,
    current_frame: u32,
    timelines: Vec<ActiveTimeline>,
    // Pending host updates.
    dirty: Vec<ElementId>,
    moved: Vec<ElementId>,
}

impl AssetInstance {
    /// Instantiate `description` with the default [`Config`].
    pub fn new(
        description: Arc<AssetDescription>,
        resolver: &dyn AssetResolver,
        host: &mut dyn NodeHost,
    ) -> Result<Self, AssetError> {
        Self::with_config(description, Config::default(), resolver, host)
    }

    pub fn with_config(
        description: Arc<AssetDescription>,
        config: Config,
        resolver: &dyn AssetResolver,
        host: &mut dyn NodeHost,
    ) -> Result<Self, AssetError> {
        let mut instance =
            Self::build(description, config, 0, [0.0; 3], false, None, resolver, host)?;
        instance.flush(host);
        Ok(instance)
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        description: Arc<AssetDescription>,
        config: Config,
        depth: usize,
        origin: [f32; 3],
        origin_flipped: bool,
        parent_node: Option<NodeId>,
        resolver: &dyn AssetResolver,
        host: &mut dyn NodeHost,
    ) -> Result<Self, AssetError> {
        let root = description.root_id();
        let mut instance = AssetInstance {
            elements: HashMap::with_capacity(description.elements().len()),
            description: Arc::clone(&description),
            config,
            depth,
            origin,
            origin_flipped,
            parent_node,
            root,
            references: Vec::new(),
            current_animation: None,
            current_frame: 0,
            timelines: Vec::new(),
            dirty: Vec::new(),
            moved: Vec::new(),
        };

        for element in description.elements().iter() {
            if let Err(err) = instance.instantiate(element, host) {
                instance.remove_nodes(host);
                return Err(err);
            }
        }
        for id in instance.references.clone() {
            if let Some(target) = instance.reference_target(id, resolver) {
                instance.attach_nested(id, target, resolver, host);
            }
        }
        instance.moved.push(root);
        log::debug!(
            "instantiated '{}' at depth {} ({} elements, {} references)",
            description.name,
            depth,
            instance.elements.len(),
            instance.references.len()
        );
        Ok(instance)
    }

    fn instantiate(
        &mut self,
        element: &AssetElement,
        host: &mut dyn NodeHost,
    ) -> Result<(), AssetError> {
        let id = element.id();
        if self.elements.contains_key(&id) {
            return Err(AssetError::DuplicateElement { id });
        }
        let parent_node = match element.parent() {
            Some(parent) => match self.elements.get_mut(&parent) {
                Some(p) => {
                    p.children.push(id);
                    Some(p.node())
                }
                None => return Err(AssetError::UnknownParent { id: parent }),
            },
            None => self.parent_node,
        };
        let node = NodeId::alloc();
        self.elements.insert(id, ElementInstance::new(element, node));
        if element.as_reference().is_some() {
            self.references.push(id);
        }
        let position = self.world_position(id).unwrap_or(self.origin);
        host.create_node(node, id, parent_node, position);
        Ok(())
    }

    fn reference_target(
        &self,
        id: ElementId,
        resolver: &dyn AssetResolver,
    ) -> Option<Arc<AssetDescription>> {
        let locator = self.elements.get(&id)?.as_reference()?.target.clone()?;
        let resolved = resolver.resolve(&locator);
        if resolved.is_none() {
            log::warn!("reference {id} points at unknown asset '{locator}'");
        }
        resolved
    }

    /// Build the nested instance for reference `id` from `target`. Failures are
    /// logged and leave the reference empty.
    fn attach_nested(
        &mut self,
        id: ElementId,
        target: Arc<AssetDescription>,
        resolver: &dyn AssetResolver,
        host: &mut dyn NodeHost,
    ) -> bool {
        let Some(node) = self.elements.get(&id).map(ElementInstance::node) else {
            return false;
        };
        let origin = self.world_position(id).unwrap_or(self.origin);
        let flipped = self.is_flipped(id);
        let depth = self.depth + 1;

        let nested = if depth > self.config.max_reference_depth {
            log::warn!(
                "reference {id} exceeds the nesting limit of {}",
                self.config.max_reference_depth
            );
            None
        } else {
            match Self::build(
                Arc::clone(&target),
                self.config.clone(),
                depth,
                origin,
                flipped,
                Some(node),
                resolver,
                host,
            ) {
                Ok(nested) => Some(Box::new(nested)),
                Err(err) => {
                    log::warn!("failed to instantiate reference {id}: {err}");
                    None
                }
            }
        };

        let built = nested.is_some();
        if let Some(state) = self.elements.get_mut(&id).and_then(|e| e.as_reference_mut()) {
            state.resolved = Some(target);
            state.nested = nested;
        }
        if built {
            self.sync_nested(id);
        }
        built
    }

    fn detach_nested(&mut self, id: ElementId, host: &mut dyn NodeHost) {
        let old = self
            .elements
            .get_mut(&id)
            .and_then(|e| e.as_reference_mut())
            .and_then(|r| {
                r.resolved = None;
                r.nested.take()
            });
        if let Some(old) = old {
            old.teardown(host);
        }
    }

    /// Rebuild nested instances whose resolved target changed since the last
    /// update, then recurse into the nested instances. Returns how many
    /// nested instances were built.
    pub fn update_references(
        &mut self,
        resolver: &dyn AssetResolver,
        host: &mut dyn NodeHost,
    ) -> usize {
        let rebuilt = self.refresh_references(resolver, host);
        self.flush(host);
        rebuilt
    }

    fn refresh_references(
        &mut self,
        resolver: &dyn AssetResolver,
        host: &mut dyn NodeHost,
    ) -> usize {
        let mut rebuilt = 0;
        for id in self.references.clone() {
            let target = self.reference_target(id, resolver);
            let previous = self
                .elements
                .get(&id)
                .and_then(ElementInstance::as_reference)
                .and_then(|r| r.resolved.clone());
            let changed = match (&target, &previous) {
                (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
                (None, None) => false,
                _ => true,
            };
            if changed {
                log::debug!("reference {id} target changed, rebuilding");
                self.detach_nested(id, host);
                if let Some(target) = target {
                    if self.attach_nested(id, target, resolver, host) {
                        rebuilt += 1;
                        self.moved.push(id);
                    }
                }
            } else if let Some(nested) = self.nested_mut(id) {
                rebuilt += nested.refresh_references(resolver, host);
            }
        }
        rebuilt
    }

    /// Remove every display node of this instance and its nested instances.
    pub fn teardown(mut self, host: &mut dyn NodeHost) {
        self.remove_nodes(host);
    }

    fn remove_nodes(&mut self, host: &mut dyn NodeHost) {
        for id in self.references.clone() {
            self.detach_nested(id, host);
        }
        let mut order = self.subtree(self.root);
        order.reverse();
        for id in order {
            if let Some(e) = self.elements.remove(&id) {
                host.remove_node(e.node());
            }
        }
        // Partial builds may leave elements off the root's subtree.
        for (_, e) in self.elements.drain() {
            host.remove_node(e.node());
        }
    }

    #[inline]
    pub fn description(&self) -> &Arc<AssetDescription> {
        &self.description
    }

    #[inline]
    pub fn root_id(&self) -> ElementId {
        self.root
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn element(&self, id: ElementId) -> Option<&ElementInstance> {
        self.elements.get(&id)
    }

    pub fn elements(&self) -> impl Iterator<Item = &ElementInstance> + '_ {
        self.elements.values()
    }

    #[inline]
    pub fn reference_ids(&self) -> &[ElementId] {
        &self.references
    }

    pub fn nested_instance(&self, reference: ElementId) -> Option<&AssetInstance> {
        self.elements.get(&reference)?.nested()
    }

    pub fn nested_instance_mut(&mut self, reference: ElementId) -> Option<&mut AssetInstance> {
        self.nested_mut(reference)
    }

    fn nested_mut(&mut self, reference: ElementId) -> Option<&mut AssetInstance> {
        self.elements
            .get_mut(&reference)?
            .as_reference_mut()?
            .nested
            .as_deref_mut()
    }

    /// True if `id` lives in this instance or any nested one.
    pub fn contains_element(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
            || self
                .references
                .iter()
                .filter_map(|r| self.nested_instance(*r))
                .any(|n| n.contains_element(id))
    }

    /// Effective value of `property` on element `id`.
    pub fn current_value(&self, id: ElementId, property: &str) -> Option<TrackValue> {
        self.elements.get(&id)?.current_value(property)
    }

    /// Absolute position: the nesting origin plus every current offset from
    /// the root down to `id`.
    pub fn world_position(&self, id: ElementId) -> Option<[f32; 3]> {
        let mut element = self.elements.get(&id)?;
        let mut acc = self.origin;
        loop {
            let offset = element.offset.value();
            for (a, o) in acc.iter_mut().zip(offset) {
                *a += o;
            }
            match element.parent().and_then(|p| self.elements.get(&p)) {
                Some(parent) => element = parent,
                None => break,
            }
        }
        Some(acc)
    }

    /// Effective flip of `id`: the nesting origin's flip toggled by each
    /// flipped element on the path from the root.
    pub fn is_flipped(&self, id: ElementId) -> bool {
        let mut flipped = self.origin_flipped;
        let mut cursor = self.elements.get(&id);
        while let Some(element) = cursor {
            flipped ^= element.flipped;
            cursor = element.parent().and_then(|p| self.elements.get(&p));
        }
        flipped
    }

    fn subtree(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(e) = self.elements.get(&next) {
                out.push(next);
                stack.extend(e.children().iter().rev().copied());
            }
        }
        out
    }

    // ---------------------------------------------------------------------
    // Animation state
    // ---------------------------------------------------------------------

    #[inline]
    pub fn current_animation(&self) -> Option<&str> {
        self.current_animation.as_deref()
    }

    #[inline]
    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.current_animation.is_some()
    }

    /// Switch clips (or stop with `None`). Every override is reset before the
    /// new clip is evaluated at the current frame.
    pub fn set_current_animation(
        &mut self,
        name: Option<&str>,
        host: &mut dyn NodeHost,
    ) -> Result<(), AssetError> {
        if let Some(name) = name {
            if !self.description.has_animation(name) {
                return Err(AssetError::UnknownAnimation {
                    name: name.to_string(),
                });
            }
        }
        self.reset_animation(name.map(str::to_string));
        self.flush(host);
        Ok(())
    }

    /// Move playback to `frame`, re-evaluating only the elements the current
    /// clip touches. Nested instances follow the same frame.
    pub fn set_current_frame(&mut self, frame: u32, host: &mut dyn NodeHost) {
        self.step_frame(frame);
        self.flush(host);
    }

    /// Clear every override of this instance and push the authored values.
    pub fn apply_defaults(&mut self, host: &mut dyn NodeHost) {
        self.clear_overrides();
        for id in self.references.clone() {
            self.sync_nested(id);
        }
        self.flush(host);
    }

    /// Set a single runtime override outside of clip playback.
    pub fn override_property(
        &mut self,
        id: ElementId,
        property: &str,
        value: TrackValue,
        host: &mut dyn NodeHost,
    ) -> Result<(), AssetError> {
        let element = self
            .elements
            .get_mut(&id)
            .ok_or(AssetError::UnknownElement { id })?;
        element.set_override(property, value)?;
        if OFFSET_GROUP.axes.contains(&property) {
            self.moved.push(id);
        } else {
            self.dirty.push(id);
        }
        if property == names::ANIMATION_STATE {
            self.sync_nested(id);
        }
        self.flush(host);
        Ok(())
    }

    /// Drop every override here and in nested instances. Nested instances are
    /// re-evaluated at their own clip and frame.
    fn clear_overrides(&mut self) {
        for element in self.elements.values_mut() {
            element.apply_defaults();
        }
        self.moved.push(self.root);
        for id in self.references.clone() {
            if let Some(nested) = self.nested_mut(id) {
                nested.clear_overrides();
                nested.evaluate_touched(nested.current_frame);
            }
        }
    }

    fn reset_animation(&mut self, name: Option<String>) {
        log::debug!(
            "'{}': animation {:?} -> {:?}",
            self.description.name,
            self.current_animation,
            name
        );
        self.current_animation = name;
        self.clear_overrides();
        self.evaluate_touched(self.current_frame);
        for id in self.references.clone() {
            self.sync_nested(id);
        }
    }

    fn step_frame(&mut self, frame: u32) {
        log::trace!("'{}': frame {frame}", self.description.name);
        self.current_frame = frame;
        self.evaluate_touched(frame);
        for id in self.references.clone() {
            self.sync_nested(id);
        }
    }

    /// Align the nested instance of reference `id` with the reference's
    /// animation state and this instance's frame.
    fn sync_nested(&mut self, id: ElementId) {
        let frame = self.current_frame;
        let Some(state) = self.elements.get_mut(&id).and_then(|e| e.as_reference_mut()) else {
            return;
        };
        let desired = state.animation_state.get().clone();
        let Some(nested) = state.nested.as_deref_mut() else {
            return;
        };
        let target = desired.filter(|n| nested.description.has_animation(n));
        if nested.current_animation != target {
            nested.current_frame = frame;
            nested.reset_animation(target);
        } else {
            nested.step_frame(frame);
        }
    }

    fn evaluate_touched(&mut self, frame: u32) {
        let description = Arc::clone(&self.description);
        let Some(clip) = self
            .current_animation
            .as_deref()
            .and_then(|n| description.animation(n))
        else {
            return;
        };
        for id in clip.referenced_element_ids() {
            let Some(element) = description.element(*id) else {
                continue;
            };
            self.evaluate_element(clip, element, frame);
        }
    }

    fn evaluate_element(&mut self, clip: &AssetAnimation, element: &AssetElement, frame: u32) {
        let id = element.id();
        let element_type = element.element_type();
        let Some(instance) = self.elements.get_mut(&id) else {
            return;
        };

        for property in element.eligible_track_types() {
            if element_type.combined_group_of(property).is_some() {
                continue;
            }
            let Some(value) = clip.track(id, property).and_then(|t| t.sample(frame)) else {
                continue;
            };
            if let Err(err) = instance.set_override(property, value) {
                log::warn!("skipping track {id}:{property}: {err}");
            }
        }

        let mut moved = false;
        for group in element.combined_groups() {
            let tracks: Vec<_> = group.axes.iter().map(|a| clip.track(id, a)).collect();
            if !tracks.iter().flatten().any(|t| !t.is_empty()) {
                continue;
            }
            let values: Vec<(&str, TrackValue)> = group
                .axes
                .iter()
                .zip(tracks)
                .filter_map(|(axis, track)| {
                    track
                        .and_then(|t| t.sample(frame))
                        .or_else(|| instance.current_value(axis))
                        .map(|v| (*axis, v))
                })
                .collect();
            match instance.set_overrides(&values) {
                Ok(()) => moved |= group.name == OFFSET_GROUP.name,
                Err(err) => log::warn!("skipping {} group on {id}: {err}", group.name),
            }
        }

        if moved {
            self.moved.push(id);
        } else {
            self.dirty.push(id);
        }
    }

    // ---------------------------------------------------------------------
    // Timelines
    // ---------------------------------------------------------------------

    /// Start `timeline` on the instance that owns its element, searching
    /// nested instances when the element is not in this one.
    pub fn play_timeline(&mut self, timeline: ElementTimeline) -> Result<(), AssetError> {
        let id = timeline.element;
        if self.elements.contains_key(&id) {
            self.timelines.push(ActiveTimeline {
                timeline,
                elapsed: 0.0,
            });
            return Ok(());
        }
        for reference in self.references.clone() {
            if let Some(nested) = self.nested_mut(reference) {
                if nested.contains_element(id) {
                    return nested.play_timeline(timeline);
                }
            }
        }
        Err(AssetError::UnknownElement { id })
    }

    /// Compile and start timelines for every element of this instance touched
    /// by clip `name`. Returns how many timelines were started.
    ///
    /// The window length is `duration`, else the configured default, else
    /// the clip's last key time.
    pub fn play_clip_timeline(
        &mut self,
        name: &str,
        duration: Option<f32>,
    ) -> Result<usize, AssetError> {
        let description = Arc::clone(&self.description);
        let clip = description
            .animation(name)
            .ok_or_else(|| AssetError::UnknownAnimation {
                name: name.to_string(),
            })?;
        let duration = duration
            .or(self.config.default_timeline_duration)
            .unwrap_or_else(|| clip.last_frame().map(frame_to_seconds).unwrap_or(0.0));

        let mut started = 0;
        for id in clip.referenced_element_ids() {
            let Some(element) = description.element(*id) else {
                continue;
            };
            let timeline = ElementTimeline::compile(clip, element, duration);
            if timeline.is_empty() {
                continue;
            }
            self.play_timeline(timeline)?;
            started += 1;
        }
        log::debug!("'{}': started {started} timelines for '{name}'", description.name);
        Ok(started)
    }

    /// Number of running timelines here and in nested instances.
    pub fn active_timelines(&self) -> usize {
        self.timelines.len()
            + self
                .references
                .iter()
                .filter_map(|r| self.nested_instance(*r))
                .map(AssetInstance::active_timelines)
                .sum::<usize>()
    }

    pub fn stop_timelines(&mut self) {
        self.timelines.clear();
        for id in self.references.clone() {
            if let Some(nested) = self.nested_mut(id) {
                nested.stop_timelines();
            }
        }
    }

    /// Advance every running timeline by `dt` seconds and push the results.
    /// Timelines that reach the end of their window apply their final values
    /// and stop.
    pub fn advance(&mut self, dt: f32, host: &mut dyn NodeHost) {
        self.tick_timelines(dt);
        self.flush(host);
    }

    fn tick_timelines(&mut self, dt: f32) {
        let mut timelines = std::mem::take(&mut self.timelines);
        for active in &mut timelines {
            active.elapsed += dt.max(0.0);
            if active.elapsed + TIME_EPS >= active.timeline.duration {
                active.elapsed = active.timeline.duration;
            }
            let id = active.timeline.element;
            let Some(instance) = self.elements.get_mut(&id) else {
                continue;
            };
            for schedule in &active.timeline.tracks {
                if let Some(value) = schedule.value_at(active.elapsed) {
                    if let Err(err) = instance.set_override(&schedule.property, value) {
                        log::warn!("timeline {id}:{}: {err}", schedule.property);
                    }
                }
            }
            let mut moved = false;
            for group in &active.timeline.groups {
                let frame = group.frame_at(active.elapsed);
                let values: Vec<(&str, TrackValue)> = group
                    .sample(frame)
                    .into_iter()
                    .filter_map(|(axis, v)| {
                        v.or_else(|| instance.current_value(axis)).map(|v| (axis, v))
                    })
                    .collect();
                match instance.set_overrides(&values) {
                    Ok(()) => moved |= group.group.name == OFFSET_GROUP.name,
                    Err(err) => log::warn!("timeline {} group on {id}: {err}", group.group.name),
                }
            }
            if moved {
                self.moved.push(id);
            } else {
                self.dirty.push(id);
            }
        }
        timelines.retain(|a| a.elapsed < a.timeline.duration);
        timelines.append(&mut self.timelines);
        self.timelines = timelines;

        for id in self.references.clone() {
            self.sync_nested_state_only(id);
            if let Some(nested) = self.nested_mut(id) {
                nested.tick_timelines(dt);
            }
        }
    }

    // Timelines may key `animationState`; switch the nested clip without
    // touching its frame.
    fn sync_nested_state_only(&mut self, id: ElementId) {
        let Some(state) = self.elements.get_mut(&id).and_then(|e| e.as_reference_mut()) else {
            return;
        };
        let desired = state.animation_state.get().clone();
        if let Some(nested) = state.nested.as_deref_mut() {
            let target = desired.filter(|n| nested.description.has_animation(n));
            if nested.current_animation != target {
                nested.reset_animation(target);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Host updates
    // ---------------------------------------------------------------------

    fn flush(&mut self, host: &mut dyn NodeHost) {
        let moved = std::mem::take(&mut self.moved);
        let dirty = std::mem::take(&mut self.dirty);
        let mut pushed = HashSet::new();
        for id in moved {
            for sub in self.subtree(id) {
                if pushed.insert(sub) {
                    self.push_element(sub, true, host);
                }
            }
        }
        for id in dirty {
            if pushed.insert(id) {
                self.push_element(id, false, host);
            }
        }
        for id in self.references.clone() {
            if let Some(nested) = self.nested_mut(id) {
                nested.flush(host);
            }
        }
    }

    fn push_element(&mut self, id: ElementId, relocate: bool, host: &mut dyn NodeHost) {
        let Some(position) = self.world_position(id) else {
            return;
        };
        let flipped = self.is_flipped(id);
        let Some(element) = self.elements.get_mut(&id) else {
            return;
        };
        host.update_node(element.node(), &element.attributes(position, flipped));
        if !relocate {
            return;
        }
        if let Some(nested) = element.as_reference_mut().and_then(|r| r.nested.as_deref_mut()) {
            nested.origin = position;
            nested.origin_flipped = flipped;
            nested.moved.push(nested.root);
        }
    }
}
