//! scenecast is the scene/layer composition engine of a live-streaming control surface.
//!
//! It decides which rectangular regions of a shared output canvas are occupied by which
//! content sources (camera, screen share, static images, mute and camera-off icons), computes
//! their placement from canvas-relative expressions, and moves an external compositor and
//! audio mixer from one scene to the next with the minimal set of add/update/remove calls.
//!
//! # Pipeline overview
//!
//! 1. **Build**: `FullFrameProps | ScreenShareProps -> Scene` (named slots plus mixer devices)
//! 2. **Resolve**: each slot's `Dimensions` are evaluated against the current canvas, then
//!    fitted with its `ResizePolicy` (`Slot -> Geometry`)
//! 3. **Reconcile**: `(previous Scene, next Scene) -> compositor / mixer calls` (remove what is
//!    gone, then add or update the rest concurrently)
//! 4. **Record**: the controller keeps the applied scene for refreshes and toggles
//!
//! Collaborators (the broadcast SDK's compositor and mixer, the media/device layer) are reached
//! through the [`Compositor`], [`AudioMixer`] and [`MediaSource`] traits. In-memory
//! implementations ([`MemoryCompositor`], [`MemoryMedia`]) back the tests and the `scenecast`
//! dry-run binary.
//!
//! # Getting started
//!
//! Create a [`SceneController`] per broadcast session and drive it with
//! [`SceneController::show_full_screen_cam`], [`SceneController::toggle_screen_sharing`] and
//! friends.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod compositor;
mod config;
mod expression;
mod foundation;
mod layout;
mod reconcile;
mod scene;
mod session;

pub use assets::image::probe_image;
pub use compositor::memory::{CompositorOp, InputKind, MemoryCompositor, MemoryLayer, MemoryMedia};
pub use compositor::traits::{
    AudioMixer, Compositor, CompositorError, ImageSource, MediaSource, MediaStream,
};
pub use config::session::SessionConfig;
pub use expression::error::ExprError;
pub use expression::eval::{LayoutContext, evaluate};
pub use foundation::core::{Geometry, Rect, Size};
pub use foundation::error::{SceneError, SceneResult};
pub use layout::dimensions::{DimExpr, Dimensions, resolve_dimensions};
pub use layout::fill::{
    LayoutError, ResizeMode, ResizePolicy, ScaledCoords, apply_resize, calc_scaled_coords,
};
pub use reconcile::geometry::resolve_slot_geometry;
pub use reconcile::reconciler::Reconciler;
pub use reconcile::registry::{LayerRecord, LayerRegistry, MixerRecord, MixerRegistry};
pub use reconcile::report::{Action, ApplyReport, Outcome, Target};
pub use scene::model::{
    AudioInput, CameraInput, FullFrameProps, MixerDevice, Scene, SceneAssets, SceneName,
    SceneParams, ScenePatch, ScreenShareInput, ScreenShareProps, Slot, SlotContent, SlotKind,
    apply_patch,
};
pub use scene::templates::{
    BACKGROUND, CAMERA_HIDDEN_ICON, MIC_MUTED_ICON, full_frame_scene, screen_share_scene,
};
pub use session::controller::{SceneController, SessionPhase};
pub use session::script::{Script, ScriptRun, ScriptStep, StepRecord};
