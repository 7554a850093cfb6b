use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{
    foundation::core::{Geometry, Size},
    foundation::error::SceneResult,
    scene::model::SlotContent,
};

/// Live media stream handle owned by the media layer.
///
/// The core only reads its identity and reported properties; the pixels and samples stay with
/// the collaborator.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MediaStream {
    /// Stream identifier (device id, capture id, ...).
    pub id: String,
    /// Resolution reported by the stream's video track, if known.
    #[serde(default)]
    pub natural_size: Option<Size>,
    /// Whether the stream carries a video track.
    #[serde(default = "default_true")]
    pub has_video: bool,
    /// Whether the stream carries an audio track.
    #[serde(default)]
    pub has_audio: bool,
}

fn default_true() -> bool {
    true
}

impl MediaStream {
    /// Video-only stream with an optional known resolution.
    pub fn video(id: impl Into<String>, natural_size: Option<Size>) -> Self {
        Self {
            id: id.into(),
            natural_size,
            has_video: true,
            has_audio: false,
        }
    }

    /// Audio-only stream, e.g. a microphone.
    pub fn audio(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            natural_size: None,
            has_video: false,
            has_audio: true,
        }
    }

    /// Builder-style toggle for the audio track flag.
    pub fn with_audio(mut self, has_audio: bool) -> Self {
        self.has_audio = has_audio;
        self
    }
}

/// A decoded (or at least fully loaded) bitmap ready to be registered with the compositor.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageSource {
    /// Path the image was loaded from.
    pub path: PathBuf,
    /// Natural pixel size.
    pub natural_size: Size,
}

/// Errors reported by the compositor and audio mixer.
#[derive(thiserror::Error, Debug)]
pub enum CompositorError {
    /// The named layer or audio input does not exist.
    #[error("compositor: '{0}' not found")]
    NotFound(String),

    /// The SDK refused the call.
    #[error("compositor rejected '{name}': {message}")]
    Rejected {
        /// Layer or device name.
        name: String,
        /// Reason given by the SDK.
        message: String,
    },

    /// Wrapped lower-level failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CompositorError {
    /// Build a [`CompositorError::Rejected`] value.
    pub fn rejected(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Video compositor of the broadcast SDK.
///
/// Layers are keyed by name. Device inputs (cameras, screen shares, pre-acquired video streams)
/// and image sources live in separate registries on the SDK side, hence the separate removal
/// calls. A [`Geometry`] with a `clip` must not be painted outside that rectangle.
#[async_trait]
pub trait Compositor: Send + Sync {
    /// Current output canvas size. Queried at apply time, never cached by the core.
    fn canvas_size(&self) -> Size;

    /// Whether a layer with this name is currently registered.
    fn has_layer(&self, name: &str) -> bool;

    /// Register a live stream as a layer.
    async fn add_device_input(
        &self,
        stream: &MediaStream,
        name: &str,
        geometry: &Geometry,
    ) -> Result<(), CompositorError>;

    /// Register a loaded image as a layer.
    async fn add_image_source(
        &self,
        image: &ImageSource,
        name: &str,
        geometry: &Geometry,
    ) -> Result<(), CompositorError>;

    /// Move/resize/restack an existing layer.
    async fn update_composition(&self, name: &str, geometry: &Geometry)
    -> Result<(), CompositorError>;

    /// Toggle whether an existing layer is rendered.
    async fn set_visible(&self, name: &str, visible: bool) -> Result<(), CompositorError>;

    /// Remove a device input layer.
    async fn remove_device_input(&self, name: &str) -> Result<(), CompositorError>;

    /// Remove an image layer.
    async fn remove_image(&self, name: &str) -> Result<(), CompositorError>;
}

/// Audio mixer of the broadcast SDK.
#[async_trait]
pub trait AudioMixer: Send + Sync {
    /// Whether an audio input with this name is registered.
    fn has_audio_input(&self, name: &str) -> bool;

    /// Register an audio stream.
    async fn add_audio_input(&self, stream: &MediaStream, name: &str)
    -> Result<(), CompositorError>;

    /// Remove an audio input.
    async fn remove_audio_input(&self, name: &str) -> Result<(), CompositorError>;

    /// Mute or unmute an audio input in place.
    async fn set_muted(&self, name: &str, muted: bool) -> Result<(), CompositorError>;
}

/// Browser/device layer: turns device ids and capture requests into live streams.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Resolve slot content into a live stream. Pre-acquired streams resolve to themselves.
    async fn acquire(&self, content: &SlotContent) -> SceneResult<MediaStream>;

    /// Load an image asset, resolving once it is fully available.
    async fn load_image(&self, path: &Path) -> SceneResult<ImageSource>;

    /// Ask the user for a screen capture. `Ok(None)` means the request was dismissed.
    async fn start_screen_capture(&self) -> SceneResult<Option<MediaStream>>;

    /// Stop every track of a screen capture stream.
    async fn stop_screen_capture(&self, stream: &MediaStream);

    /// Enable or disable the video track of a stream (camera privacy toggle).
    fn set_video_enabled(&self, stream_id: &str, enabled: bool);

    /// Natural resolution of a camera device, if the device reports one.
    fn device_size(&self, device_id: &str) -> Option<Size>;
}
