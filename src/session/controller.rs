use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    compositor::traits::{AudioMixer, Compositor, MediaSource, MediaStream},
    config::session::SessionConfig,
    foundation::error::{SceneError, SceneResult},
    reconcile::reconciler::{Reconciler, content_key},
    reconcile::report::{Action, ApplyReport, Outcome, Target},
    scene::model::{
        AudioInput, CameraInput, FullFrameProps, Scene, SceneParams, ScenePatch, ScreenShareInput,
        ScreenShareProps, SlotContent,
    },
    scene::templates::{CAMERA_HIDDEN_ICON, MIC_MUTED_ICON},
};

/// Where a broadcast session is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SessionPhase {
    /// Nothing applied yet.
    #[default]
    NoScene,
    /// Full-frame camera scene is active.
    FullScreen,
    /// Screen-share scene is active.
    ScreenShare,
    /// Session torn down; every further operation fails with [`SceneError::SessionEnded`].
    Destroyed,
}

#[derive(Debug)]
struct SessionState {
    reconciler: Reconciler,
    active_scene: Option<Scene>,
    phase: SessionPhase,
    cam_visible: bool,
    screen_share_active: bool,
    mic_muted: bool,
    capture: Option<MediaStream>,
}

impl SessionState {
    fn ensure_live(&self) -> SceneResult<()> {
        if self.phase == SessionPhase::Destroyed {
            return Err(SceneError::SessionEnded);
        }
        Ok(())
    }

    fn active(&self) -> SceneResult<&Scene> {
        self.ensure_live()?;
        self.active_scene.as_ref().ok_or(SceneError::NoActiveScene)
    }
}

/// Per-session scene controller.
///
/// All operations lock the session state for their whole duration, so scene transitions of one
/// session never interleave.
pub struct SceneController {
    media: Arc<dyn MediaSource>,
    config: SessionConfig,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for SceneController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneController")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SceneController {
    /// Controller for a fresh session with nothing on the compositor.
    pub fn new(
        compositor: Arc<dyn Compositor>,
        mixer: Arc<dyn AudioMixer>,
        media: Arc<dyn MediaSource>,
        config: SessionConfig,
    ) -> Self {
        let mic_muted = config.start_muted;
        Self {
            state: Mutex::new(SessionState {
                reconciler: Reconciler::new(compositor, mixer, Arc::clone(&media)),
                active_scene: None,
                phase: SessionPhase::NoScene,
                cam_visible: true,
                screen_share_active: false,
                mic_muted,
                capture: None,
            }),
            media,
            config,
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Apply the full-frame camera scene.
    #[tracing::instrument(skip_all, fields(camera = %camera.id, mic = %mic.id))]
    pub async fn show_full_screen_cam(
        &self,
        camera: CameraInput,
        mic: AudioInput,
        show_mute_icon: bool,
    ) -> SceneResult<ApplyReport> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        state.ensure_live()?;

        let mut report = ApplyReport::default();
        if let Some(capture) = state.capture.take() {
            tracing::info!(capture = %capture.id, "stopping screen capture left running");
            self.media.stop_screen_capture(&capture).await;
        }
        report.extend(self.show_full_screen_locked(state, camera, mic, show_mute_icon).await);
        Ok(report)
    }

    /// Apply the screen-share scene with the camera picture-in-picture.
    #[tracing::instrument(skip_all, fields(camera = %camera.id, screen = %screen.id, mic = %mic.id))]
    pub async fn show_screen_share(
        &self,
        camera: CameraInput,
        screen: ScreenShareInput,
        mic: AudioInput,
        show_mute_icon: bool,
    ) -> SceneResult<ApplyReport> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        state.ensure_live()?;
        Ok(self
            .show_screen_share_locked(state, camera, screen, mic, show_mute_icon)
            .await)
    }

    /// Rebuild the active scene with `patch` overlaid and apply it, keeping its topology.
    #[tracing::instrument(skip_all)]
    pub async fn refresh_current_scene(&self, patch: ScenePatch) -> SceneResult<ApplyReport> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let mut params = state.active()?.update(&patch).params;
        let camera = params.camera_mut();
        *camera = self.measure_camera(camera.clone());
        let next = Scene::build(params);

        if let SceneParams::ScreenShare(p) = &next.params {
            self.replace_capture(state, p.screen.stream.clone()).await;
        }
        state.cam_visible = next.params.camera().visible;
        Ok(self.apply_locked(state, next).await)
    }

    /// Flip camera visibility in place: the camera layer and the camera-off icon switch
    /// visibility, the camera's video track is enabled or disabled, and no reconcile runs.
    ///
    /// Returns the new visibility.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_cam_visibility(&self) -> SceneResult<bool> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let scene = state.active()?;
        let camera = scene.params.camera().clone();
        let has_icon = scene.slot(CAMERA_HIDDEN_ICON).is_some();
        let visible = !state.cam_visible;

        state
            .reconciler
            .set_layer_visible(&camera.id, visible)
            .await?;
        if has_icon
            && let Err(e) = state
                .reconciler
                .set_layer_visible(CAMERA_HIDDEN_ICON, !visible)
                .await
        {
            tracing::warn!(error = %e, "camera-off icon visibility not updated");
        }
        self.media
            .set_video_enabled(&content_key(&camera.content), visible);

        state.cam_visible = visible;
        state.active_scene = state.active_scene.as_ref().map(|s| {
            s.update(&ScenePatch {
                camera_visible: Some(visible),
                ..ScenePatch::default()
            })
        });
        tracing::info!(visible, "camera visibility toggled");
        Ok(visible)
    }

    /// Stop sharing when sharing, otherwise ask for a screen capture and start sharing.
    ///
    /// A dismissed capture request leaves the session untouched and returns an empty report.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_screen_sharing(&self) -> SceneResult<ApplyReport> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let params = state.active()?.params.clone();

        if state.screen_share_active {
            return Ok(self.stop_screen_sharing_locked(state).await);
        }

        let Some(stream) = self.media.start_screen_capture().await? else {
            tracing::info!("screen capture request dismissed");
            return Ok(ApplyReport::default());
        };
        let screen = ScreenShareInput::from_capture(stream);
        Ok(self
            .show_screen_share_locked(
                state,
                params.camera().clone(),
                screen,
                params.mic().clone(),
                params.show_mute_icon(),
            )
            .await)
    }

    /// Stop screen sharing and return to the full-frame camera scene. No-op when not sharing.
    #[tracing::instrument(skip(self))]
    pub async fn stop_screen_sharing(&self) -> SceneResult<ApplyReport> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        state.ensure_live()?;
        if !state.screen_share_active {
            tracing::debug!("not sharing, nothing to stop");
            return Ok(ApplyReport::default());
        }
        Ok(self.stop_screen_sharing_locked(state).await)
    }

    /// The capture ended outside the controller (e.g. revoked from the browser UI).
    ///
    /// Runs the same stop path as [`SceneController::stop_screen_sharing`].
    pub async fn screen_share_ended(&self) -> SceneResult<ApplyReport> {
        tracing::info!("screen share ended externally");
        self.stop_screen_sharing().await
    }

    /// Flip the microphone mute state on the mixer and the mute icon's visibility.
    ///
    /// Returns the new mute state.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_mute(&self) -> SceneResult<bool> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let scene = state.active()?;
        let mic = scene.params.mic().id.clone();
        let has_icon = scene.slot(MIC_MUTED_ICON).is_some();
        let muted = !state.mic_muted;

        state.reconciler.set_device_muted(&mic, muted).await?;
        if has_icon
            && let Err(e) = state
                .reconciler
                .set_layer_visible(MIC_MUTED_ICON, muted)
                .await
        {
            tracing::warn!(error = %e, "mute icon visibility not updated");
        }

        state.mic_muted = muted;
        state.active_scene = state.active_scene.as_ref().map(|s| {
            s.update(&ScenePatch {
                show_mute_icon: Some(muted),
                ..ScenePatch::default()
            })
        });
        tracing::info!(muted, "microphone mute toggled");
        Ok(muted)
    }

    /// Tear the session down: stop any capture, remove every layer and audio input.
    #[tracing::instrument(skip(self))]
    pub async fn end_session(&self) -> SceneResult<ApplyReport> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        state.ensure_live()?;

        if let Some(capture) = state.capture.take() {
            self.media.stop_screen_capture(&capture).await;
        }
        let mut report = state.reconciler.remove_all_layers().await;
        report.extend(state.reconciler.remove_all_mixer_devices().await);

        state.active_scene = None;
        state.screen_share_active = false;
        state.phase = SessionPhase::Destroyed;
        tracing::info!(failed = report.failures().count(), "session ended");
        Ok(report)
    }

    /// Whether the camera is currently shown.
    pub async fn cam_visible(&self) -> bool {
        self.state.lock().await.cam_visible
    }

    /// Whether the screen-share scene is active.
    pub async fn screen_share_active(&self) -> bool {
        self.state.lock().await.screen_share_active
    }

    /// Whether the microphone is muted.
    pub async fn mic_muted(&self) -> bool {
        self.state.lock().await.mic_muted
    }

    /// Lifecycle phase.
    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.phase
    }

    /// Copy of the last applied scene.
    pub async fn active_scene(&self) -> Option<Scene> {
        self.state.lock().await.active_scene.clone()
    }

    /// Names of the layers the controller believes are on the compositor, sorted.
    pub async fn layer_names(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.reconciler.layers().names().map(str::to_owned).collect()
    }

    async fn show_full_screen_locked(
        &self,
        state: &mut SessionState,
        camera: CameraInput,
        mic: AudioInput,
        show_mute_icon: bool,
    ) -> ApplyReport {
        state.cam_visible = camera.visible;
        let next = Scene::build(SceneParams::FullFrame(FullFrameProps {
            camera: self.measure_camera(camera),
            mic,
            show_mute_icon,
            assets: self.config.assets.clone(),
        }));
        let report = self.apply_locked(state, next).await;
        state.screen_share_active = false;
        state.phase = SessionPhase::FullScreen;
        report
    }

    async fn show_screen_share_locked(
        &self,
        state: &mut SessionState,
        camera: CameraInput,
        screen: ScreenShareInput,
        mic: AudioInput,
        show_mute_icon: bool,
    ) -> ApplyReport {
        state.cam_visible = camera.visible;
        self.replace_capture(state, screen.stream.clone()).await;
        let next = Scene::build(SceneParams::ScreenShare(ScreenShareProps {
            camera: self.measure_camera(camera),
            screen,
            mic,
            show_mute_icon,
            assets: self.config.assets.clone(),
        }));
        let report = self.apply_locked(state, next).await;
        state.screen_share_active = true;
        state.phase = SessionPhase::ScreenShare;
        report
    }

    async fn stop_screen_sharing_locked(&self, state: &mut SessionState) -> ApplyReport {
        let mut report = ApplyReport::default();
        if let Some(capture) = state.capture.take() {
            self.media.stop_screen_capture(&capture).await;
        }

        let Some(SceneParams::ScreenShare(props)) =
            state.active_scene.as_ref().map(|s| s.params.clone())
        else {
            state.screen_share_active = false;
            return report;
        };

        match state.reconciler.remove_layer(&props.screen.id).await {
            Ok(action) => report.push(Outcome::ok(&props.screen.id, Target::Layer, action)),
            Err(e) => {
                tracing::warn!(layer = %props.screen.id, error = %e, "screen layer removal failed");
                report.push(Outcome::failed(&props.screen.id, Target::Layer, Action::Removed, e));
            }
        }
        if let Some(audio) = &props.screen.audio {
            match state.reconciler.remove_mixer_device(&audio.id).await {
                Ok(action) => report.push(Outcome::ok(&audio.id, Target::Mixer, action)),
                Err(e) => {
                    tracing::warn!(device = %audio.id, error = %e, "screen audio removal failed");
                    report.push(Outcome::failed(&audio.id, Target::Mixer, Action::Removed, e));
                }
            }
        }

        report.extend(
            self.show_full_screen_locked(state, props.camera, props.mic, props.show_mute_icon)
                .await,
        );
        report
    }

    /// Hold `stream` as the session's capture, stopping a different capture held before it.
    async fn replace_capture(&self, state: &mut SessionState, stream: MediaStream) {
        if let Some(old) = state.capture.take_if(|c| c.id != stream.id) {
            tracing::info!(old = %old.id, new = %stream.id, "screen capture replaced, stopping the old one");
            self.media.stop_screen_capture(&old).await;
        }
        state.capture = Some(stream);
    }

    /// Fill in a device camera's natural size from the media layer.
    fn measure_camera(&self, mut camera: CameraInput) -> CameraInput {
        if camera.natural_size.is_none()
            && let SlotContent::Device(id) = &camera.content
        {
            camera.natural_size = self.media.device_size(id);
        }
        camera
    }

    async fn apply_locked(&self, state: &mut SessionState, next: Scene) -> ApplyReport {
        let canvas = state.reconciler.canvas_size();
        let mut report = state
            .reconciler
            .apply_scene(state.active_scene.as_ref(), &next, canvas)
            .await;

        if state.mic_muted {
            let mic = &next.params.mic().id;
            let added = report
                .outcome(Target::Mixer, mic)
                .is_some_and(|o| o.is_ok() && o.action == Action::Added);
            if added && let Err(e) = state.reconciler.set_device_muted(mic, true).await {
                tracing::warn!(device = %mic, error = %e, "could not mute new microphone input");
                report.push(Outcome::failed(mic, Target::Mixer, Action::Added, e));
            }
        }

        state.active_scene = Some(next);
        report
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/controller.rs"]
mod tests;
