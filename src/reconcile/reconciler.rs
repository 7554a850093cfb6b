use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    sync::Arc,
};

use futures::future::join_all;

use crate::{
    compositor::traits::{AudioMixer, Compositor, CompositorError, MediaSource},
    foundation::core::{Geometry, Size},
    foundation::error::{SceneError, SceneResult},
    reconcile::geometry::resolve_slot_geometry,
    reconcile::registry::{LayerRecord, LayerRegistry, MixerRecord, MixerRegistry},
    reconcile::report::{Action, ApplyReport, Outcome, Target},
    scene::model::{Scene, Slot, SlotContent, SlotKind},
};

/// Drives the compositor and audio mixer from one scene to the next.
///
/// The reconciler owns the bookkeeping of what it believes is registered on both collaborators.
/// A transition runs in three passes:
///
/// 1. every layer and audio input not wanted by the next scene is removed, and all removals
///    settle before anything is added;
/// 2. each slot of the next scene is resolved against the canvas, then added, replaced or
///    updated, all slots concurrently;
/// 3. audio inputs of the next scene that are not yet present are added.
///
/// Per-name failures are logged and reported; they never abort the other names.
pub struct Reconciler {
    compositor: Arc<dyn Compositor>,
    mixer: Arc<dyn AudioMixer>,
    media: Arc<dyn MediaSource>,
    layers: LayerRegistry,
    devices: MixerRegistry,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("layers", &self.layers)
            .field("devices", &self.devices)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug)]
enum Plan {
    Add,
    Replace { old_kind: SlotKind },
    Update { visibility_changed: bool },
}

impl Plan {
    fn action(self) -> Action {
        match self {
            Self::Add => Action::Added,
            Self::Replace { .. } => Action::Replaced,
            Self::Update { .. } => Action::Updated,
        }
    }
}

struct LayerStep<'a> {
    slot: &'a Slot,
    geometry: Geometry,
    plan: Plan,
}

impl LayerStep<'_> {
    async fn run(&self, compositor: &dyn Compositor, media: &dyn MediaSource) -> SceneResult<()> {
        let name = self.slot.name.as_str();
        match self.plan {
            Plan::Update { visibility_changed } => {
                compositor
                    .update_composition(name, &self.geometry)
                    .await?;
                if visibility_changed {
                    compositor.set_visible(name, self.slot.visible).await?;
                }
                Ok(())
            }
            Plan::Replace { old_kind } => {
                remove_layer_input(compositor, name, old_kind).await?;
                add_layer(compositor, media, self.slot, &self.geometry).await
            }
            Plan::Add => add_layer(compositor, media, self.slot, &self.geometry).await,
        }
    }
}

/// Identity of the content behind a slot; a change under the same name forces a replace.
pub(crate) fn content_key(content: &SlotContent) -> String {
    match content {
        SlotContent::Stream(s) => s.id.clone(),
        SlotContent::Device(id) => id.clone(),
        SlotContent::Image(path) => path.display().to_string(),
    }
}

async fn add_layer(
    compositor: &dyn Compositor,
    media: &dyn MediaSource,
    slot: &Slot,
    geometry: &Geometry,
) -> SceneResult<()> {
    let name = slot.name.as_str();
    match (slot.kind, &slot.content) {
        (SlotKind::Image, SlotContent::Image(path)) => {
            let image = media.load_image(path).await?;
            compositor.add_image_source(&image, name, geometry).await?;
        }
        (SlotKind::Image, _) => {
            return Err(SceneError::acquisition(
                name,
                "image slot does not reference an image path",
            ));
        }
        (SlotKind::Device | SlotKind::Video, content) => {
            let stream = media.acquire(content).await?;
            compositor.add_device_input(&stream, name, geometry).await?;
        }
    }
    if !slot.visible {
        compositor.set_visible(name, false).await?;
    }
    Ok(())
}

async fn remove_layer_input(
    compositor: &dyn Compositor,
    name: &str,
    kind: SlotKind,
) -> SceneResult<Action> {
    let result = match kind {
        SlotKind::Image => compositor.remove_image(name).await,
        SlotKind::Device | SlotKind::Video => compositor.remove_device_input(name).await,
    };
    match result {
        Ok(()) => Ok(Action::Removed),
        Err(CompositorError::NotFound(_)) => {
            tracing::debug!(layer = name, "layer already gone");
            Ok(Action::AlreadyRemoved)
        }
        Err(e) => Err(e.into()),
    }
}

async fn remove_audio_input(mixer: &dyn AudioMixer, name: &str) -> SceneResult<Action> {
    match mixer.remove_audio_input(name).await {
        Ok(()) => Ok(Action::Removed),
        Err(CompositorError::NotFound(_)) => {
            tracing::debug!(device = name, "audio input already gone");
            Ok(Action::AlreadyRemoved)
        }
        Err(e) => Err(e.into()),
    }
}

impl Reconciler {
    /// Reconciler with empty bookkeeping.
    pub fn new(
        compositor: Arc<dyn Compositor>,
        mixer: Arc<dyn AudioMixer>,
        media: Arc<dyn MediaSource>,
    ) -> Self {
        Self {
            compositor,
            mixer,
            media,
            layers: LayerRegistry::default(),
            devices: MixerRegistry::default(),
        }
    }

    /// Layers believed registered on the compositor.
    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    /// Audio inputs believed registered on the mixer.
    pub fn devices(&self) -> &MixerRegistry {
        &self.devices
    }

    /// Canvas size as the compositor reports it right now.
    pub fn canvas_size(&self) -> Size {
        self.compositor.canvas_size()
    }

    /// Transition from `prev` (if any) to `next` on a canvas of `canvas` pixels.
    ///
    /// Applying the same scene twice issues no add or remove on the second call.
    #[tracing::instrument(skip_all, fields(scene = %next.name, canvas_w = canvas.width, canvas_h = canvas.height))]
    pub async fn apply_scene(
        &mut self,
        prev: Option<&Scene>,
        next: &Scene,
        canvas: Size,
    ) -> ApplyReport {
        let mut report = ApplyReport::default();

        self.remove_stale(prev, next, &mut report).await;

        let mut steps = Vec::with_capacity(next.slots.len());
        for slot in &next.slots {
            match resolve_slot_geometry(slot, canvas) {
                Ok(geometry) => steps.push(LayerStep {
                    slot,
                    geometry,
                    plan: self.plan(slot),
                }),
                Err(e) => {
                    tracing::warn!(layer = %slot.name, error = %e, "skipping slot with unresolvable geometry");
                    let action = if self.layers.contains(&slot.name) {
                        Action::Updated
                    } else {
                        Action::Added
                    };
                    report.push(Outcome::failed(&slot.name, Target::Layer, action, e));
                }
            }
        }

        let results = {
            let compositor = self.compositor.as_ref();
            let media = self.media.as_ref();
            join_all(steps.iter().map(|step| step.run(compositor, media))).await
        };
        for (step, result) in steps.into_iter().zip(results) {
            self.settle_layer(step, result, &mut report);
        }

        self.add_mixer_devices(next, &mut report).await;

        tracing::info!(
            added = report.names_with(Target::Layer, Action::Added).len(),
            updated = report.names_with(Target::Layer, Action::Updated).len(),
            removed = report.names_with(Target::Layer, Action::Removed).len(),
            failed = report.failures().count(),
            "scene applied"
        );
        report
    }

    fn plan(&self, slot: &Slot) -> Plan {
        match self.layers.get(&slot.name) {
            Some(record)
                if record.kind != slot.kind || record.source != content_key(&slot.content) =>
            {
                Plan::Replace {
                    old_kind: record.kind,
                }
            }
            Some(record) => Plan::Update {
                visibility_changed: record.visible != slot.visible,
            },
            // Present on the compositor but unknown here: take it over and resend visibility.
            None if self.compositor.has_layer(&slot.name) => Plan::Update {
                visibility_changed: true,
            },
            None => Plan::Add,
        }
    }

    fn settle_layer(
        &mut self,
        step: LayerStep<'_>,
        result: SceneResult<()>,
        report: &mut ApplyReport,
    ) {
        let name = &step.slot.name;
        let action = step.plan.action();
        match result {
            Ok(()) => {
                tracing::debug!(layer = %name, ?action, "layer settled");
                self.layers.insert(
                    name.clone(),
                    LayerRecord {
                        kind: step.slot.kind,
                        source: content_key(&step.slot.content),
                        geometry: step.geometry,
                        visible: step.slot.visible,
                    },
                );
                report.push(Outcome::ok(name, Target::Layer, action));
            }
            Err(e) => {
                tracing::warn!(layer = %name, ?action, error = %e, "layer operation failed");
                if e.is_not_found() || matches!(step.plan, Plan::Replace { .. }) {
                    self.layers.remove(name);
                }
                report.push(Outcome::failed(name, Target::Layer, action, e));
            }
        }
    }

    async fn remove_stale(&mut self, prev: Option<&Scene>, next: &Scene, report: &mut ApplyReport) {
        let wanted_layers: HashSet<&str> = next.slot_names().collect();
        let wanted_devices: HashSet<&str> = next.mixer_names().collect();

        let mut stale_layers: BTreeMap<String, SlotKind> = BTreeMap::new();
        let mut stale_devices: BTreeSet<String> = BTreeSet::new();
        if let Some(prev) = prev {
            for slot in prev.slots.iter().filter(|s| !wanted_layers.contains(s.name.as_str())) {
                stale_layers.insert(slot.name.clone(), slot.kind);
            }
            stale_devices.extend(
                prev.mixer_names()
                    .filter(|n| !wanted_devices.contains(n))
                    .map(str::to_owned),
            );
        }
        // Bookkeeping knows the registration kind actually used; it wins over `prev`.
        for (name, record) in self.layers.iter().filter(|(n, _)| !wanted_layers.contains(n)) {
            stale_layers.insert(name.to_owned(), record.kind);
        }
        stale_devices.extend(
            self.devices
                .names()
                .filter(|n| !wanted_devices.contains(n))
                .map(str::to_owned),
        );

        if stale_layers.is_empty() && stale_devices.is_empty() {
            return;
        }
        tracing::debug!(
            layers = stale_layers.len(),
            devices = stale_devices.len(),
            "removing stale inputs"
        );

        let (layer_results, device_results) = {
            let compositor = self.compositor.as_ref();
            let mixer = self.mixer.as_ref();
            futures::join!(
                join_all(
                    stale_layers
                        .iter()
                        .map(|(name, kind)| remove_layer_input(compositor, name, *kind))
                ),
                join_all(
                    stale_devices
                        .iter()
                        .map(|name| remove_audio_input(mixer, name))
                ),
            )
        };

        for ((name, _), result) in stale_layers.iter().zip(layer_results) {
            self.settle_layer_removal(name, result, report);
        }
        for (name, result) in stale_devices.iter().zip(device_results) {
            self.settle_device_removal(name, result, report);
        }
    }

    fn settle_layer_removal(
        &mut self,
        name: &str,
        result: SceneResult<Action>,
        report: &mut ApplyReport,
    ) {
        match result {
            Ok(action) => {
                self.layers.remove(name);
                report.push(Outcome::ok(name, Target::Layer, action));
            }
            Err(e) => {
                tracing::warn!(layer = name, error = %e, "layer removal failed");
                report.push(Outcome::failed(name, Target::Layer, Action::Removed, e));
            }
        }
    }

    fn settle_device_removal(
        &mut self,
        name: &str,
        result: SceneResult<Action>,
        report: &mut ApplyReport,
    ) {
        match result {
            Ok(action) => {
                self.devices.remove(name);
                report.push(Outcome::ok(name, Target::Mixer, action));
            }
            Err(e) => {
                tracing::warn!(device = name, error = %e, "audio input removal failed");
                report.push(Outcome::failed(name, Target::Mixer, Action::Removed, e));
            }
        }
    }

    async fn add_mixer_devices(&mut self, next: &Scene, report: &mut ApplyReport) {
        let results = {
            let mixer = self.mixer.as_ref();
            let devices = &self.devices;
            join_all(next.mixer.iter().map(|device| async move {
                let name = device.device_name.as_str();
                if devices.contains(name) || mixer.has_audio_input(name) {
                    return Ok(Action::AlreadyPresent);
                }
                mixer
                    .add_audio_input(&device.audio_stream, name)
                    .await
                    .map(|()| Action::Added)
                    .map_err(SceneError::from)
            }))
            .await
        };

        for (device, result) in next.mixer.iter().zip(results) {
            let name = &device.device_name;
            match result {
                Ok(action) => {
                    if !self.devices.contains(name) {
                        self.devices.insert(name.clone(), MixerRecord::default());
                    }
                    report.push(Outcome::ok(name, Target::Mixer, action));
                }
                Err(e) => {
                    tracing::warn!(device = %name, error = %e, "audio input add failed");
                    report.push(Outcome::failed(name, Target::Mixer, Action::Added, e));
                }
            }
        }
    }

    /// Remove one tracked layer. Untracked names are reported as already removed.
    pub async fn remove_layer(&mut self, name: &str) -> SceneResult<Action> {
        let Some(kind) = self.layers.get(name).map(|r| r.kind) else {
            tracing::debug!(layer = name, "remove of untracked layer ignored");
            return Ok(Action::AlreadyRemoved);
        };
        let action = remove_layer_input(self.compositor.as_ref(), name, kind).await?;
        self.layers.remove(name);
        Ok(action)
    }

    /// Remove one audio input by name. A mixer "not found" counts as success.
    pub async fn remove_mixer_device(&mut self, name: &str) -> SceneResult<Action> {
        let action = remove_audio_input(self.mixer.as_ref(), name).await?;
        self.devices.remove(name);
        Ok(action)
    }

    /// Remove every tracked layer concurrently.
    pub async fn remove_all_layers(&mut self) -> ApplyReport {
        let tracked: Vec<(String, SlotKind)> = self
            .layers
            .iter()
            .map(|(name, record)| (name.to_owned(), record.kind))
            .collect();
        let results = {
            let compositor = self.compositor.as_ref();
            join_all(
                tracked
                    .iter()
                    .map(|(name, kind)| remove_layer_input(compositor, name, *kind)),
            )
            .await
        };
        let mut report = ApplyReport::default();
        for ((name, _), result) in tracked.iter().zip(results) {
            self.settle_layer_removal(name, result, &mut report);
        }
        report
    }

    /// Remove every tracked audio input concurrently.
    pub async fn remove_all_mixer_devices(&mut self) -> ApplyReport {
        let tracked: Vec<String> = self.devices.names().map(str::to_owned).collect();
        let results = {
            let mixer = self.mixer.as_ref();
            join_all(tracked.iter().map(|name| remove_audio_input(mixer, name))).await
        };
        let mut report = ApplyReport::default();
        for (name, result) in tracked.iter().zip(results) {
            self.settle_device_removal(name, result, &mut report);
        }
        report
    }

    /// Show or hide one layer in place, without touching its geometry.
    pub async fn set_layer_visible(&mut self, name: &str, visible: bool) -> SceneResult<()> {
        match self.compositor.set_visible(name, visible).await {
            Ok(()) => {
                if let Some(record) = self.layers.get_mut(name) {
                    record.visible = visible;
                }
                Ok(())
            }
            Err(e) => {
                if matches!(e, CompositorError::NotFound(_)) {
                    self.layers.remove(name);
                }
                Err(e.into())
            }
        }
    }

    /// Mute or unmute one audio input in place.
    pub async fn set_device_muted(&mut self, name: &str, muted: bool) -> SceneResult<()> {
        match self.mixer.set_muted(name, muted).await {
            Ok(()) => {
                if let Some(record) = self.devices.get_mut(name) {
                    record.muted = muted;
                }
                Ok(())
            }
            Err(e) => {
                if matches!(e, CompositorError::NotFound(_)) {
                    self.devices.remove(name);
                }
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/reconcile/reconciler.rs"]
mod tests;
