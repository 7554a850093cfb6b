use std::{fmt, path::PathBuf};

use crate::{
    compositor::traits::MediaStream,
    foundation::core::Size,
    layout::dimensions::Dimensions,
    layout::fill::ResizePolicy,
    scene::templates,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
/// How a slot's content is registered with the compositor.
pub enum SlotKind {
    /// Live camera or screen-capture hardware source.
    Device,
    /// Pre-acquired media stream.
    Video,
    /// Static bitmap loaded from a path.
    Image,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Opaque handle to the source behind a slot; owned by the media layer.
pub enum SlotContent {
    /// A stream that already exists.
    Stream(MediaStream),
    /// A hardware device id that still has to be acquired.
    Device(String),
    /// A static image path.
    Image(PathBuf),
}

impl SlotContent {
    /// Slot kind used when this content is shown as a video layer.
    pub fn video_kind(&self) -> SlotKind {
        match self {
            Self::Device(_) => SlotKind::Device,
            Self::Stream(_) => SlotKind::Video,
            Self::Image(_) => SlotKind::Image,
        }
    }

    /// Natural resolution if the content already knows it.
    pub fn natural_size(&self) -> Option<Size> {
        match self {
            Self::Stream(s) => s.natural_size,
            Self::Device(_) | Self::Image(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One named layer request within a [`Scene`].
pub struct Slot {
    /// Reconciliation key; unique within a scene.
    pub name: String,
    /// Registration kind.
    pub kind: SlotKind,
    /// Canvas-relative geometry spec.
    pub dimensions: Dimensions,
    /// Invisible slots are tracked and placed but not rendered.
    pub visible: bool,
    /// Optional fill/crop policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize: Option<ResizePolicy>,
    /// Source handle.
    pub content: SlotContent,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One audio input of a scene's mixer list.
pub struct MixerDevice {
    /// Reconciliation key; unique within a scene.
    pub device_name: String,
    /// Audio source.
    pub audio_stream: MediaStream,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Scene topology tag.
pub enum SceneName {
    /// Single full-frame camera.
    FullFrame,
    /// Full-frame screen share with a picture-in-picture camera.
    ScreenShare,
}

impl fmt::Display for SceneName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FullFrame => "full-frame",
            Self::ScreenShare => "screen-share",
        })
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Static image assets shared by every scene of a session.
pub struct SceneAssets {
    /// Icon shown while the camera is hidden.
    pub camera_off: PathBuf,
    /// Full-canvas background.
    pub background: PathBuf,
    /// Icon shown while the microphone is muted; no mute slot when unset.
    #[serde(default)]
    pub mute_icon: Option<PathBuf>,
}

impl Default for SceneAssets {
    fn default() -> Self {
        Self {
            camera_off: PathBuf::from("assets/camera-off.png"),
            background: PathBuf::from("assets/camera-bg.png"),
            mute_icon: Some(PathBuf::from("assets/mic-muted.png")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Camera source plus its current visibility.
pub struct CameraInput {
    /// Layer name (the camera device id).
    pub id: String,
    /// Camera content.
    pub content: SlotContent,
    /// Whether the camera is shown.
    pub visible: bool,
    /// Resolution reported by the media layer for a device camera. Enables fill placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_size: Option<Size>,
}

impl CameraInput {
    /// Natural resolution used for fill placement, from the stream or the media layer.
    pub fn source_size(&self) -> Option<Size> {
        self.content.natural_size().or(self.natural_size)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Named audio source for the mixer.
pub struct AudioInput {
    /// Mixer device name.
    pub id: String,
    /// Audio stream.
    pub stream: MediaStream,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Captured screen plus its optional desktop audio.
pub struct ScreenShareInput {
    /// Layer name (the capture id).
    pub id: String,
    /// Capture stream.
    pub stream: MediaStream,
    /// Desktop audio, present only when the capture carries an audio track.
    #[serde(default)]
    pub audio: Option<AudioInput>,
}

impl ScreenShareInput {
    /// Build from a capture stream, deriving the audio input from its audio track.
    pub fn from_capture(stream: MediaStream) -> Self {
        let audio = stream.has_audio.then(|| AudioInput {
            id: format!("{}-audio", stream.id),
            stream: stream.clone(),
        });
        Self {
            id: stream.id.clone(),
            stream,
            audio,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Construction arguments of the full-frame scene.
pub struct FullFrameProps {
    /// Camera.
    pub camera: CameraInput,
    /// Microphone.
    pub mic: AudioInput,
    /// Show the mute indicator.
    pub show_mute_icon: bool,
    /// Icon and background assets.
    pub assets: SceneAssets,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Construction arguments of the screen-share scene.
pub struct ScreenShareProps {
    /// Camera (shown picture-in-picture).
    pub camera: CameraInput,
    /// Screen capture.
    pub screen: ScreenShareInput,
    /// Microphone.
    pub mic: AudioInput,
    /// Show the mute indicator.
    pub show_mute_icon: bool,
    /// Icon and background assets.
    pub assets: SceneAssets,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Retained construction arguments of a [`Scene`].
pub enum SceneParams {
    /// See [`templates::full_frame_scene`].
    FullFrame(FullFrameProps),
    /// See [`templates::screen_share_scene`].
    ScreenShare(ScreenShareProps),
}

impl SceneParams {
    /// Camera input of either topology.
    pub fn camera(&self) -> &CameraInput {
        match self {
            Self::FullFrame(p) => &p.camera,
            Self::ScreenShare(p) => &p.camera,
        }
    }

    /// Mutable camera input of either topology.
    pub fn camera_mut(&mut self) -> &mut CameraInput {
        match self {
            Self::FullFrame(p) => &mut p.camera,
            Self::ScreenShare(p) => &mut p.camera,
        }
    }

    /// Microphone input of either topology.
    pub fn mic(&self) -> &AudioInput {
        match self {
            Self::FullFrame(p) => &p.mic,
            Self::ScreenShare(p) => &p.mic,
        }
    }

    /// Whether the mute indicator is requested.
    pub fn show_mute_icon(&self) -> bool {
        match self {
            Self::FullFrame(p) => p.show_mute_icon,
            Self::ScreenShare(p) => p.show_mute_icon,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Sparse overlay for [`Scene::update`]: `Some` replaces, `None` keeps.
///
/// Fields that the scene's topology does not have (screen fields on a full-frame scene) are
/// ignored.
#[serde(default)]
pub struct ScenePatch {
    /// New camera layer name.
    pub camera_id: Option<String>,
    /// New camera content.
    pub camera_content: Option<SlotContent>,
    /// New camera visibility.
    pub camera_visible: Option<bool>,
    /// New microphone device name.
    pub mic_id: Option<String>,
    /// New microphone stream.
    pub mic_stream: Option<MediaStream>,
    /// New screen-share layer name.
    pub screen_share_id: Option<String>,
    /// New screen-share stream.
    pub screen_share_stream: Option<MediaStream>,
    /// New desktop-audio device name.
    pub screen_audio_id: Option<String>,
    /// New desktop-audio stream.
    pub screen_audio_stream: Option<MediaStream>,
    /// New camera-off icon.
    pub camera_off: Option<PathBuf>,
    /// New background.
    pub background: Option<PathBuf>,
    /// New mute icon.
    pub mute_icon: Option<PathBuf>,
    /// New mute indicator visibility.
    pub show_mute_icon: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Immutable snapshot of every wanted layer and audio input.
pub struct Scene {
    /// Topology tag.
    pub name: SceneName,
    /// Ordered slots.
    pub slots: Vec<Slot>,
    /// Audio inputs.
    pub mixer: Vec<MixerDevice>,
    /// Construction arguments, retained for [`Scene::update`].
    pub params: SceneParams,
}

impl Scene {
    /// Build a scene from its construction arguments.
    pub fn build(params: SceneParams) -> Self {
        match params {
            SceneParams::FullFrame(p) => templates::full_frame_scene(p),
            SceneParams::ScreenShare(p) => templates::screen_share_scene(p),
        }
    }

    /// New scene with `patch` overlaid on this scene's construction arguments.
    pub fn update(&self, patch: &ScenePatch) -> Self {
        apply_patch(self, patch)
    }

    /// Look up a slot by name.
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Slot names in declaration order.
    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.name.as_str())
    }

    /// Mixer device names in declaration order.
    pub fn mixer_names(&self) -> impl Iterator<Item = &str> {
        self.mixer.iter().map(|m| m.device_name.as_str())
    }
}

/// Merge `patch` over the construction arguments of `scene` and rebuild it.
pub fn apply_patch(scene: &Scene, patch: &ScenePatch) -> Scene {
    let params = match &scene.params {
        SceneParams::FullFrame(p) => SceneParams::FullFrame(FullFrameProps {
            camera: patch_camera(&p.camera, patch),
            mic: patch_audio(&p.mic, &patch.mic_id, &patch.mic_stream),
            show_mute_icon: patch.show_mute_icon.unwrap_or(p.show_mute_icon),
            assets: patch_assets(&p.assets, patch),
        }),
        SceneParams::ScreenShare(p) => SceneParams::ScreenShare(ScreenShareProps {
            camera: patch_camera(&p.camera, patch),
            screen: patch_screen(&p.screen, patch),
            mic: patch_audio(&p.mic, &patch.mic_id, &patch.mic_stream),
            show_mute_icon: patch.show_mute_icon.unwrap_or(p.show_mute_icon),
            assets: patch_assets(&p.assets, patch),
        }),
    };
    Scene::build(params)
}

fn patch_camera(cam: &CameraInput, patch: &ScenePatch) -> CameraInput {
    CameraInput {
        id: patch.camera_id.clone().unwrap_or_else(|| cam.id.clone()),
        content: patch
            .camera_content
            .clone()
            .unwrap_or_else(|| cam.content.clone()),
        visible: patch.camera_visible.unwrap_or(cam.visible),
        // A different source has to be measured again.
        natural_size: if patch.camera_content.is_some() {
            None
        } else {
            cam.natural_size
        },
    }
}

fn patch_audio(
    audio: &AudioInput,
    id: &Option<String>,
    stream: &Option<MediaStream>,
) -> AudioInput {
    AudioInput {
        id: id.clone().unwrap_or_else(|| audio.id.clone()),
        stream: stream.clone().unwrap_or_else(|| audio.stream.clone()),
    }
}

fn patch_screen(screen: &ScreenShareInput, patch: &ScenePatch) -> ScreenShareInput {
    let audio = match (&screen.audio, &patch.screen_audio_id, &patch.screen_audio_stream) {
        (Some(a), id, stream) => Some(patch_audio(a, id, stream)),
        (None, Some(id), Some(stream)) => Some(AudioInput {
            id: id.clone(),
            stream: stream.clone(),
        }),
        (None, _, _) => None,
    };
    ScreenShareInput {
        id: patch
            .screen_share_id
            .clone()
            .unwrap_or_else(|| screen.id.clone()),
        stream: patch
            .screen_share_stream
            .clone()
            .unwrap_or_else(|| screen.stream.clone()),
        audio,
    }
}

fn patch_assets(assets: &SceneAssets, patch: &ScenePatch) -> SceneAssets {
    SceneAssets {
        camera_off: patch
            .camera_off
            .clone()
            .unwrap_or_else(|| assets.camera_off.clone()),
        background: patch
            .background
            .clone()
            .unwrap_or_else(|| assets.background.clone()),
        mute_icon: patch.mute_icon.clone().or_else(|| assets.mute_icon.clone()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
