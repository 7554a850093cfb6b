//! Scripted sessions run against the in-memory collaborators.
//!
//! A script is a JSON document listing controller operations; running it yields the compositor
//! and mixer calls each operation produced. This is what `scenecast plan` prints.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    compositor::memory::{CompositorOp, MemoryCompositor, MemoryMedia},
    compositor::traits::MediaStream,
    config::session::SessionConfig,
    foundation::core::Size,
    foundation::error::{SceneError, SceneResult},
    reconcile::report::ApplyReport,
    scene::model::{AudioInput, CameraInput, ScenePatch, ScreenShareInput},
    session::controller::{SceneController, SessionPhase},
};

/// One controller operation of a [`Script`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    /// [`SceneController::show_full_screen_cam`].
    ShowFullScreenCam {
        /// Camera input.
        camera: CameraInput,
        /// Microphone input.
        mic: AudioInput,
        /// Show the mute indicator.
        #[serde(default)]
        show_mute_icon: bool,
    },
    /// [`SceneController::show_screen_share`] with an already captured screen stream.
    ShowScreenShare {
        /// Camera input.
        camera: CameraInput,
        /// Screen capture stream.
        screen: MediaStream,
        /// Microphone input.
        mic: AudioInput,
        /// Show the mute indicator.
        #[serde(default)]
        show_mute_icon: bool,
    },
    /// [`SceneController::refresh_current_scene`].
    Refresh {
        /// Sparse scene patch.
        #[serde(default)]
        patch: ScenePatch,
    },
    /// [`SceneController::toggle_cam_visibility`].
    ToggleCamVisibility,
    /// [`SceneController::toggle_screen_sharing`]; answered from the script's `captures`.
    ToggleScreenSharing,
    /// [`SceneController::stop_screen_sharing`].
    StopScreenSharing,
    /// [`SceneController::screen_share_ended`].
    ScreenShareEnded,
    /// [`SceneController::toggle_mute`].
    ToggleMute,
    /// Resize the canvas; takes effect at the next apply.
    SetCanvas {
        /// New canvas width.
        width: f64,
        /// New canvas height.
        height: f64,
    },
    /// [`SceneController::end_session`].
    EndSession,
}

impl ScriptStep {
    /// Operation name as written in the script.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::ShowFullScreenCam { .. } => "show_full_screen_cam",
            Self::ShowScreenShare { .. } => "show_screen_share",
            Self::Refresh { .. } => "refresh",
            Self::ToggleCamVisibility => "toggle_cam_visibility",
            Self::ToggleScreenSharing => "toggle_screen_sharing",
            Self::StopScreenSharing => "stop_screen_sharing",
            Self::ScreenShareEnded => "screen_share_ended",
            Self::ToggleMute => "toggle_mute",
            Self::SetCanvas { .. } => "set_canvas",
            Self::EndSession => "end_session",
        }
    }
}

fn default_canvas() -> Size {
    Size::new(1280.0, 720.0)
}

/// A scripted broadcast session.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Initial canvas size.
    #[serde(default = "default_canvas")]
    pub canvas: Size,
    /// Session configuration.
    #[serde(default)]
    pub config: SessionConfig,
    /// Natural sizes reported by devices, keyed by device id.
    #[serde(default)]
    pub devices: BTreeMap<String, Size>,
    /// Natural sizes of image assets, keyed by path.
    #[serde(default)]
    pub images: BTreeMap<PathBuf, Size>,
    /// Read unlisted images from disk (relative to the working directory).
    #[serde(default)]
    pub probe_images: bool,
    /// Answers to successive screen-capture requests; `null` is a dismissed request.
    #[serde(default)]
    pub captures: Vec<Option<MediaStream>>,
    /// Operations to run, in order.
    pub steps: Vec<ScriptStep>,
}

/// What one step did.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct StepRecord {
    /// Zero-based step index.
    pub index: usize,
    /// Operation name.
    pub op: &'static str,
    /// Compositor and mixer calls issued, in order.
    pub calls: Vec<CompositorOp>,
    /// Per-name failures reported by the reconciler, as `name: error`.
    pub failures: Vec<String>,
    /// Result of toggles (`visible=false`, `muted=true`).
    pub note: Option<String>,
    /// Error returned by the operation itself.
    pub error: Option<String>,
    /// Session phase after the step.
    pub phase: SessionPhase,
}

/// Records of every step of a script run.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct ScriptRun {
    /// One record per step.
    pub steps: Vec<StepRecord>,
}

impl ScriptRun {
    /// Whether every step completed without operation errors or per-name failures.
    pub fn is_clean(&self) -> bool {
        self.steps
            .iter()
            .all(|s| s.error.is_none() && s.failures.is_empty())
    }
}

impl Script {
    /// Parse a script from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> SceneResult<Self> {
        let script: Self = serde_json::from_reader(r)
            .map_err(|e| SceneError::config(format!("parse session script JSON: {e}")))?;
        script.config.validate()?;
        Ok(script)
    }

    /// Parse a script from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            SceneError::config(format!("open session script '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Run every step against fresh in-memory collaborators.
    ///
    /// Operation errors are recorded on their step and do not stop the run.
    #[tracing::instrument(skip_all, fields(steps = self.steps.len()))]
    pub async fn run(&self) -> ScriptRun {
        let compositor = Arc::new(MemoryCompositor::new(self.canvas));
        let media = Arc::new(MemoryMedia::new());
        for (id, size) in &self.devices {
            media.set_device_size(id.clone(), *size);
        }
        for (path, size) in &self.images {
            media.set_image_size(path.clone(), *size);
        }
        media.probe_images_from_disk(self.probe_images);
        for capture in &self.captures {
            media.queue_screen_capture(capture.clone());
        }

        let controller = SceneController::new(
            compositor.clone(),
            compositor.clone(),
            media,
            self.config.clone(),
        );

        let mut run = ScriptRun::default();
        for (index, step) in self.steps.iter().enumerate() {
            let result = run_step(&controller, &compositor, step).await;
            let (failures, note, error): (Vec<String>, Option<String>, Option<String>) =
                match result {
                    Ok(StepResult::Applied(report)) => (
                        report
                            .failures()
                            .filter_map(|o| o.error.as_ref().map(|e| format!("{}: {e}", o.name)))
                            .collect(),
                        None,
                        None,
                    ),
                    Ok(StepResult::Note(note)) => (Vec::new(), Some(note), None),
                    Err(e) => {
                        tracing::warn!(step = index, op = step.op_name(), error = %e, "step failed");
                        (Vec::new(), None, Some(e.to_string()))
                    }
                };
            run.steps.push(StepRecord {
                index,
                op: step.op_name(),
                calls: compositor.take_ops(),
                failures,
                note,
                error,
                phase: controller.phase().await,
            });
        }
        run
    }
}

enum StepResult {
    Applied(ApplyReport),
    Note(String),
}

async fn run_step(
    controller: &SceneController,
    compositor: &MemoryCompositor,
    step: &ScriptStep,
) -> SceneResult<StepResult> {
    let report = match step {
        ScriptStep::ShowFullScreenCam {
            camera,
            mic,
            show_mute_icon,
        } => {
            controller
                .show_full_screen_cam(camera.clone(), mic.clone(), *show_mute_icon)
                .await?
        }
        ScriptStep::ShowScreenShare {
            camera,
            screen,
            mic,
            show_mute_icon,
        } => {
            controller
                .show_screen_share(
                    camera.clone(),
                    ScreenShareInput::from_capture(screen.clone()),
                    mic.clone(),
                    *show_mute_icon,
                )
                .await?
        }
        ScriptStep::Refresh { patch } => controller.refresh_current_scene(patch.clone()).await?,
        ScriptStep::ToggleCamVisibility => {
            let visible = controller.toggle_cam_visibility().await?;
            return Ok(StepResult::Note(format!("visible={visible}")));
        }
        ScriptStep::ToggleScreenSharing => controller.toggle_screen_sharing().await?,
        ScriptStep::StopScreenSharing => controller.stop_screen_sharing().await?,
        ScriptStep::ScreenShareEnded => controller.screen_share_ended().await?,
        ScriptStep::ToggleMute => {
            let muted = controller.toggle_mute().await?;
            return Ok(StepResult::Note(format!("muted={muted}")));
        }
        ScriptStep::SetCanvas { width, height } => {
            compositor.set_canvas_size(Size::new(*width, *height));
            return Ok(StepResult::Note(format!("canvas={width}x{height}")));
        }
        ScriptStep::EndSession => controller.end_session().await?,
    };
    Ok(StepResult::Applied(report))
}

#[cfg(test)]
#[path = "../../tests/unit/session/script.rs"]
mod tests;
