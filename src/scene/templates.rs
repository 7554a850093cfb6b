//! The two canonical scenes.
//!
//! Z-order convention (lower paints first): background `0`, camera-off icon `1`, primary
//! content `2`, picture-in-picture and mute overlays `4`.

use crate::{
    layout::dimensions::Dimensions,
    layout::fill::ResizePolicy,
    scene::model::{
        AudioInput, CameraInput, FullFrameProps, MixerDevice, Scene, SceneAssets, SceneName,
        SceneParams, ScreenShareProps, Slot, SlotContent, SlotKind,
    },
};

/// Layer name of the camera-off icon.
pub const CAMERA_HIDDEN_ICON: &str = "cameraHiddenIcon";
/// Layer name of the background image.
pub const BACKGROUND: &str = "background";
/// Layer name of the microphone-muted icon.
pub const MIC_MUTED_ICON: &str = "micMutedIcon";

const Z_BACKGROUND: i32 = 0;
const Z_CAMERA_OFF: i32 = 1;
const Z_PRIMARY: i32 = 2;
const Z_OVERLAY: i32 = 4;

/// Full-canvas camera over the background, camera-off icon underneath, optional mute icon.
pub fn full_frame_scene(props: FullFrameProps) -> Scene {
    let mut slots = SlotList::default();
    slots.push(camera_slot(&props.camera, Dimensions::full_canvas(Z_PRIMARY)));
    slots.push(camera_off_slot(&props.assets, !props.camera.visible));
    slots.push(background_slot(&props.assets));
    if let Some(slot) = mute_icon_slot(&props.assets, props.show_mute_icon) {
        slots.push(slot);
    }

    let mut mixer = MixerList::default();
    mixer.push(&props.mic);

    Scene {
        name: SceneName::FullFrame,
        slots: slots.0,
        mixer: mixer.0,
        params: SceneParams::FullFrame(props),
    }
}

/// Full-canvas screen share with the camera picture-in-picture in the bottom-left corner.
///
/// The picture-in-picture camera keeps the camera's current visibility.
pub fn screen_share_scene(props: ScreenShareProps) -> Scene {
    let pip = Dimensions {
        x: "20".into(),
        y: "CANVAS_HEIGHT - LAYER_HEIGHT - 20".into(),
        z: f64::from(Z_OVERLAY).into(),
        w: "CANVAS_WIDTH * 0.2".into(),
        h: "CANVAS_HEIGHT * 0.2".into(),
    };

    let mut slots = SlotList::default();
    slots.push(camera_slot(&props.camera, pip));
    slots.push(Slot {
        name: props.screen.id.clone(),
        kind: SlotKind::Device,
        dimensions: Dimensions::full_canvas(Z_PRIMARY),
        visible: true,
        resize: None,
        content: SlotContent::Stream(props.screen.stream.clone()),
    });
    slots.push(camera_off_slot(&props.assets, !props.camera.visible));
    slots.push(background_slot(&props.assets));
    if let Some(slot) = mute_icon_slot(&props.assets, props.show_mute_icon) {
        slots.push(slot);
    }

    let mut mixer = MixerList::default();
    mixer.push(&props.mic);
    if let Some(audio) = &props.screen.audio {
        mixer.push(audio);
    }

    Scene {
        name: SceneName::ScreenShare,
        slots: slots.0,
        mixer: mixer.0,
        params: SceneParams::ScreenShare(props),
    }
}

fn camera_slot(camera: &CameraInput, dimensions: Dimensions) -> Slot {
    Slot {
        name: camera.id.clone(),
        kind: camera.content.video_kind(),
        dimensions,
        visible: camera.visible,
        resize: camera.source_size().map(ResizePolicy::fill),
        content: camera.content.clone(),
    }
}

fn camera_off_slot(assets: &SceneAssets, visible: bool) -> Slot {
    Slot {
        name: CAMERA_HIDDEN_ICON.to_owned(),
        kind: SlotKind::Image,
        dimensions: Dimensions {
            x: "CANVAS_WIDTH * 0.5 - LAYER_WIDTH * 0.5".into(),
            y: "CANVAS_HEIGHT * 0.5 - LAYER_HEIGHT * 0.5".into(),
            z: f64::from(Z_CAMERA_OFF).into(),
            w: "CANVAS_WIDTH * 0.25".into(),
            h: "CANVAS_HEIGHT * 0.25".into(),
        },
        visible,
        resize: None,
        content: SlotContent::Image(assets.camera_off.clone()),
    }
}

fn background_slot(assets: &SceneAssets) -> Slot {
    Slot {
        name: BACKGROUND.to_owned(),
        kind: SlotKind::Image,
        dimensions: Dimensions::full_canvas(Z_BACKGROUND),
        visible: true,
        resize: None,
        content: SlotContent::Image(assets.background.clone()),
    }
}

fn mute_icon_slot(assets: &SceneAssets, show: bool) -> Option<Slot> {
    let path = assets.mute_icon.as_ref()?;
    Some(Slot {
        name: MIC_MUTED_ICON.to_owned(),
        kind: SlotKind::Image,
        dimensions: Dimensions {
            x: "CANVAS_WIDTH - LAYER_WIDTH - 20".into(),
            y: "20".into(),
            z: f64::from(Z_OVERLAY).into(),
            w: "CANVAS_HEIGHT * 0.1".into(),
            h: "LAYER_WIDTH".into(),
        },
        visible: show,
        resize: None,
        content: SlotContent::Image(path.clone()),
    })
}

// Name uniqueness is the reconciliation invariant: on a collision the first slot wins.
#[derive(Default)]
struct SlotList(Vec<Slot>);

impl SlotList {
    fn push(&mut self, slot: Slot) {
        if self.0.iter().any(|s| s.name == slot.name) {
            tracing::warn!(layer = %slot.name, "duplicate slot name in scene, keeping the first");
            return;
        }
        self.0.push(slot);
    }
}

#[derive(Default)]
struct MixerList(Vec<MixerDevice>);

impl MixerList {
    fn push(&mut self, audio: &AudioInput) {
        if self.0.iter().any(|m| m.device_name == audio.id) {
            tracing::warn!(device = %audio.id, "duplicate mixer device in scene, keeping the first");
            return;
        }
        self.0.push(MixerDevice {
            device_name: audio.id.clone(),
            audio_stream: audio.stream.clone(),
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/templates.rs"]
mod tests;
