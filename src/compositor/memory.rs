//! In-memory collaborators for tests, dry runs and the `scenecast plan` command.
//!
//! [`MemoryCompositor`] keeps a model of the SDK's layer and audio registries and records every
//! call it receives, failed or not, as a [`CompositorOp`]. [`MemoryMedia`] hands out streams
//! from a configurable device table and a queue of scripted screen-capture answers.

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    fmt,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    assets::image::probe_image,
    compositor::traits::{
        AudioMixer, Compositor, CompositorError, ImageSource, MediaSource, MediaStream,
    },
    foundation::core::{Geometry, Size},
    foundation::error::{SceneError, SceneResult},
    scene::model::SlotContent,
};

/// One call received by a [`MemoryCompositor`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum CompositorOp {
    /// `add_device_input`.
    AddDevice {
        /// Layer name.
        name: String,
        /// Id of the registered stream.
        stream_id: String,
        /// Initial placement.
        geometry: Geometry,
    },
    /// `add_image_source`.
    AddImage {
        /// Layer name.
        name: String,
        /// Image path.
        path: PathBuf,
        /// Initial placement.
        geometry: Geometry,
    },
    /// `update_composition`.
    Update {
        /// Layer name.
        name: String,
        /// New placement.
        geometry: Geometry,
    },
    /// `set_visible`.
    SetVisible {
        /// Layer name.
        name: String,
        /// Requested visibility.
        visible: bool,
    },
    /// `remove_device_input`.
    RemoveDevice {
        /// Layer name.
        name: String,
    },
    /// `remove_image`.
    RemoveImage {
        /// Layer name.
        name: String,
    },
    /// `add_audio_input`.
    AddAudio {
        /// Device name.
        name: String,
        /// Id of the registered stream.
        stream_id: String,
    },
    /// `remove_audio_input`.
    RemoveAudio {
        /// Device name.
        name: String,
    },
    /// `set_muted`.
    SetMuted {
        /// Device name.
        name: String,
        /// Requested state.
        muted: bool,
    },
}

impl CompositorOp {
    /// Layer or device name the call addressed.
    pub fn name(&self) -> &str {
        match self {
            Self::AddDevice { name, .. }
            | Self::AddImage { name, .. }
            | Self::Update { name, .. }
            | Self::SetVisible { name, .. }
            | Self::RemoveDevice { name }
            | Self::RemoveImage { name }
            | Self::AddAudio { name, .. }
            | Self::RemoveAudio { name }
            | Self::SetMuted { name, .. } => name,
        }
    }

    /// Whether this call registers something.
    pub fn is_add(&self) -> bool {
        matches!(
            self,
            Self::AddDevice { .. } | Self::AddImage { .. } | Self::AddAudio { .. }
        )
    }

    /// Whether this call unregisters something.
    pub fn is_remove(&self) -> bool {
        matches!(
            self,
            Self::RemoveDevice { .. } | Self::RemoveImage { .. } | Self::RemoveAudio { .. }
        )
    }
}

fn fmt_geometry(f: &mut fmt::Formatter<'_>, g: &Geometry) -> fmt::Result {
    write!(
        f,
        "x={} y={} w={} h={} z={}",
        g.x, g.y, g.width, g.height, g.index
    )
}

impl fmt::Display for CompositorOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddDevice {
                name,
                stream_id,
                geometry,
            } => {
                write!(f, "add-device {name} <- {stream_id} ")?;
                fmt_geometry(f, geometry)
            }
            Self::AddImage {
                name,
                path,
                geometry,
            } => {
                write!(f, "add-image {name} <- {} ", path.display())?;
                fmt_geometry(f, geometry)
            }
            Self::Update { name, geometry } => {
                write!(f, "update {name} ")?;
                fmt_geometry(f, geometry)
            }
            Self::SetVisible { name, visible } => write!(f, "set-visible {name} {visible}"),
            Self::RemoveDevice { name } => write!(f, "remove-device {name}"),
            Self::RemoveImage { name } => write!(f, "remove-image {name}"),
            Self::AddAudio { name, stream_id } => write!(f, "add-audio {name} <- {stream_id}"),
            Self::RemoveAudio { name } => write!(f, "remove-audio {name}"),
            Self::SetMuted { name, muted } => write!(f, "set-muted {name} {muted}"),
        }
    }
}

/// Which SDK registry a [`MemoryLayer`] lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    /// Device input (camera, screen, video stream).
    Device,
    /// Image source.
    Image,
}

/// Layer as the in-memory compositor currently holds it.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryLayer {
    /// Registry the layer was added to.
    pub kind: InputKind,
    /// Stream id or image path.
    pub source: String,
    /// Current placement.
    pub geometry: Geometry,
    /// Whether the layer is rendered.
    pub visible: bool,
}

#[derive(Debug, Default)]
struct CompositorState {
    canvas: Size,
    layers: BTreeMap<String, MemoryLayer>,
    audio: BTreeMap<String, bool>,
    ops: Vec<CompositorOp>,
    failing: BTreeSet<String>,
}

impl CompositorState {
    fn check_failure(&self, name: &str) -> Result<(), CompositorError> {
        if self.failing.contains(name) {
            return Err(CompositorError::rejected(name, "injected failure"));
        }
        Ok(())
    }

    fn add_layer(&mut self, name: &str, layer: MemoryLayer) -> Result<(), CompositorError> {
        self.check_failure(name)?;
        if self.layers.contains_key(name) {
            return Err(CompositorError::rejected(name, "layer already registered"));
        }
        self.layers.insert(name.to_owned(), layer);
        Ok(())
    }

    fn remove_layer(&mut self, name: &str, kind: InputKind) -> Result<(), CompositorError> {
        self.check_failure(name)?;
        match self.layers.get(name) {
            Some(layer) if layer.kind == kind => {
                self.layers.remove(name);
                Ok(())
            }
            _ => Err(CompositorError::NotFound(name.to_owned())),
        }
    }

    fn layer_mut(&mut self, name: &str) -> Result<&mut MemoryLayer, CompositorError> {
        self.check_failure(name)?;
        self.layers
            .get_mut(name)
            .ok_or_else(|| CompositorError::NotFound(name.to_owned()))
    }
}

/// Compositor and audio mixer backed by plain maps.
#[derive(Debug, Default)]
pub struct MemoryCompositor {
    state: Mutex<CompositorState>,
}

impl MemoryCompositor {
    /// Empty compositor with the given canvas.
    pub fn new(canvas: Size) -> Self {
        Self {
            state: Mutex::new(CompositorState {
                canvas,
                ..CompositorState::default()
            }),
        }
    }

    /// Change the canvas size reported to the core.
    pub fn set_canvas_size(&self, canvas: Size) {
        self.state.lock().canvas = canvas;
    }

    /// Every call received so far, in order.
    pub fn ops(&self) -> Vec<CompositorOp> {
        self.state.lock().ops.clone()
    }

    /// Drain the call log.
    pub fn take_ops(&self) -> Vec<CompositorOp> {
        std::mem::take(&mut self.state.lock().ops)
    }

    /// Current state of a layer.
    pub fn layer(&self, name: &str) -> Option<MemoryLayer> {
        self.state.lock().layers.get(name).cloned()
    }

    /// Registered layer names, sorted.
    pub fn layer_names(&self) -> Vec<String> {
        self.state.lock().layers.keys().cloned().collect()
    }

    /// Registered audio input names, sorted.
    pub fn audio_inputs(&self) -> Vec<String> {
        self.state.lock().audio.keys().cloned().collect()
    }

    /// Mute state of an audio input.
    pub fn is_muted(&self, name: &str) -> Option<bool> {
        self.state.lock().audio.get(name).copied()
    }

    /// Make every subsequent call addressing `name` fail with [`CompositorError::Rejected`].
    pub fn fail_on(&self, name: impl Into<String>) {
        self.state.lock().failing.insert(name.into());
    }

    /// Undo all [`MemoryCompositor::fail_on`] injections.
    pub fn clear_failures(&self) {
        self.state.lock().failing.clear();
    }

    /// Drop a layer behind the core's back, as if the SDK lost it.
    pub fn forget_layer(&self, name: &str) -> Option<MemoryLayer> {
        self.state.lock().layers.remove(name)
    }

    /// Drop an audio input behind the core's back.
    pub fn forget_audio_input(&self, name: &str) -> bool {
        self.state.lock().audio.remove(name).is_some()
    }
}

#[async_trait]
impl Compositor for MemoryCompositor {
    fn canvas_size(&self) -> Size {
        self.state.lock().canvas
    }

    fn has_layer(&self, name: &str) -> bool {
        self.state.lock().layers.contains_key(name)
    }

    async fn add_device_input(
        &self,
        stream: &MediaStream,
        name: &str,
        geometry: &Geometry,
    ) -> Result<(), CompositorError> {
        let mut st = self.state.lock();
        st.ops.push(CompositorOp::AddDevice {
            name: name.to_owned(),
            stream_id: stream.id.clone(),
            geometry: *geometry,
        });
        st.add_layer(
            name,
            MemoryLayer {
                kind: InputKind::Device,
                source: stream.id.clone(),
                geometry: *geometry,
                visible: true,
            },
        )
    }

    async fn add_image_source(
        &self,
        image: &ImageSource,
        name: &str,
        geometry: &Geometry,
    ) -> Result<(), CompositorError> {
        let mut st = self.state.lock();
        st.ops.push(CompositorOp::AddImage {
            name: name.to_owned(),
            path: image.path.clone(),
            geometry: *geometry,
        });
        st.add_layer(
            name,
            MemoryLayer {
                kind: InputKind::Image,
                source: image.path.display().to_string(),
                geometry: *geometry,
                visible: true,
            },
        )
    }

    async fn update_composition(
        &self,
        name: &str,
        geometry: &Geometry,
    ) -> Result<(), CompositorError> {
        let mut st = self.state.lock();
        st.ops.push(CompositorOp::Update {
            name: name.to_owned(),
            geometry: *geometry,
        });
        st.layer_mut(name)?.geometry = *geometry;
        Ok(())
    }

    async fn set_visible(&self, name: &str, visible: bool) -> Result<(), CompositorError> {
        let mut st = self.state.lock();
        st.ops.push(CompositorOp::SetVisible {
            name: name.to_owned(),
            visible,
        });
        st.layer_mut(name)?.visible = visible;
        Ok(())
    }

    async fn remove_device_input(&self, name: &str) -> Result<(), CompositorError> {
        let mut st = self.state.lock();
        st.ops.push(CompositorOp::RemoveDevice {
            name: name.to_owned(),
        });
        st.remove_layer(name, InputKind::Device)
    }

    async fn remove_image(&self, name: &str) -> Result<(), CompositorError> {
        let mut st = self.state.lock();
        st.ops.push(CompositorOp::RemoveImage {
            name: name.to_owned(),
        });
        st.remove_layer(name, InputKind::Image)
    }
}

#[async_trait]
impl AudioMixer for MemoryCompositor {
    fn has_audio_input(&self, name: &str) -> bool {
        self.state.lock().audio.contains_key(name)
    }

    async fn add_audio_input(
        &self,
        stream: &MediaStream,
        name: &str,
    ) -> Result<(), CompositorError> {
        let mut st = self.state.lock();
        st.ops.push(CompositorOp::AddAudio {
            name: name.to_owned(),
            stream_id: stream.id.clone(),
        });
        st.check_failure(name)?;
        if st.audio.contains_key(name) {
            return Err(CompositorError::rejected(name, "audio input already registered"));
        }
        st.audio.insert(name.to_owned(), false);
        Ok(())
    }

    async fn remove_audio_input(&self, name: &str) -> Result<(), CompositorError> {
        let mut st = self.state.lock();
        st.ops.push(CompositorOp::RemoveAudio {
            name: name.to_owned(),
        });
        st.check_failure(name)?;
        st.audio
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| CompositorError::NotFound(name.to_owned()))
    }

    async fn set_muted(&self, name: &str, muted: bool) -> Result<(), CompositorError> {
        let mut st = self.state.lock();
        st.ops.push(CompositorOp::SetMuted {
            name: name.to_owned(),
            muted,
        });
        st.check_failure(name)?;
        let slot = st
            .audio
            .get_mut(name)
            .ok_or_else(|| CompositorError::NotFound(name.to_owned()))?;
        *slot = muted;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MediaState {
    device_sizes: BTreeMap<String, Size>,
    unavailable: BTreeSet<String>,
    image_sizes: BTreeMap<PathBuf, Size>,
    missing_images: BTreeSet<PathBuf>,
    probe_disk: bool,
    captures: VecDeque<Option<MediaStream>>,
    stopped: Vec<String>,
    video_enabled: BTreeMap<String, bool>,
    acquired: Vec<String>,
}

/// Media layer stand-in with scripted devices, images and screen-capture answers.
///
/// Devices are acquirable unless marked unavailable; their natural size is `None` unless one
/// was registered. Images resolve to a registered size, to the size probed from disk when
/// enabled, or to [`Size::ZERO`].
#[derive(Debug, Default)]
pub struct MemoryMedia {
    state: Mutex<MediaState>,
}

impl MemoryMedia {
    /// Media layer with no devices, images or queued captures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `size` as the natural resolution of device `id`.
    pub fn set_device_size(&self, id: impl Into<String>, size: Size) {
        self.state.lock().device_sizes.insert(id.into(), size);
    }

    /// Make acquiring device `id` fail.
    pub fn set_unavailable(&self, id: impl Into<String>) {
        self.state.lock().unavailable.insert(id.into());
    }

    /// Report `size` for the image at `path`.
    pub fn set_image_size(&self, path: impl Into<PathBuf>, size: Size) {
        self.state.lock().image_sizes.insert(path.into(), size);
    }

    /// Make loading the image at `path` fail.
    pub fn set_missing_image(&self, path: impl Into<PathBuf>) {
        self.state.lock().missing_images.insert(path.into());
    }

    /// Read unregistered images from disk instead of defaulting their size.
    pub fn probe_images_from_disk(&self, probe: bool) {
        self.state.lock().probe_disk = probe;
    }

    /// Queue the answer to the next screen-capture request (`None` = dismissed).
    pub fn queue_screen_capture(&self, capture: Option<MediaStream>) {
        self.state.lock().captures.push_back(capture);
    }

    /// Ids of capture streams stopped so far.
    pub fn stopped_captures(&self) -> Vec<String> {
        self.state.lock().stopped.clone()
    }

    /// Last video-track state set for `stream_id`.
    pub fn video_enabled(&self, stream_id: &str) -> Option<bool> {
        self.state.lock().video_enabled.get(stream_id).copied()
    }

    /// Device ids acquired so far, in order.
    pub fn acquisitions(&self) -> Vec<String> {
        self.state.lock().acquired.clone()
    }
}

#[async_trait]
impl MediaSource for MemoryMedia {
    async fn acquire(&self, content: &SlotContent) -> SceneResult<MediaStream> {
        match content {
            SlotContent::Stream(stream) => Ok(stream.clone()),
            SlotContent::Device(id) => {
                let mut st = self.state.lock();
                if st.unavailable.contains(id) {
                    return Err(SceneError::acquisition(id, "device unavailable"));
                }
                st.acquired.push(id.clone());
                Ok(MediaStream::video(id, st.device_sizes.get(id).copied()))
            }
            SlotContent::Image(path) => Err(SceneError::acquisition(
                path.display().to_string(),
                "image content cannot be acquired as a stream",
            )),
        }
    }

    async fn load_image(&self, path: &Path) -> SceneResult<ImageSource> {
        let probe = {
            let st = self.state.lock();
            if st.missing_images.contains(path) {
                return Err(SceneError::acquisition(
                    path.display().to_string(),
                    "image not found",
                ));
            }
            if let Some(size) = st.image_sizes.get(path) {
                return Ok(ImageSource {
                    path: path.to_path_buf(),
                    natural_size: *size,
                });
            }
            st.probe_disk
        };
        if probe {
            return probe_image(path);
        }
        Ok(ImageSource {
            path: path.to_path_buf(),
            natural_size: Size::ZERO,
        })
    }

    async fn start_screen_capture(&self) -> SceneResult<Option<MediaStream>> {
        Ok(self.state.lock().captures.pop_front().flatten())
    }

    async fn stop_screen_capture(&self, stream: &MediaStream) {
        self.state.lock().stopped.push(stream.id.clone());
    }

    fn set_video_enabled(&self, stream_id: &str, enabled: bool) {
        self.state
            .lock()
            .video_enabled
            .insert(stream_id.to_owned(), enabled);
    }

    fn device_size(&self, device_id: &str) -> Option<Size> {
        self.state.lock().device_sizes.get(device_id).copied()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compositor/memory.rs"]
mod tests;
