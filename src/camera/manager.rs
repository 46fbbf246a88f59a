/**
 * ============================================================================
 * OVERLAY LIFECYCLE MANAGER MODULE
 * ============================================================================
 *
 * PURPOSE: Drive the camera overlay in lockstep with a recording session
 *
 * RECORDING START:
 * 1. Permission gate (consent prompt on denial)
 * 2. Resolve display bounds, overlay size and placement
 * 3. Spawn the overlay surface with device + style payload
 * 4. Wait for "mounted", the mount timeout or a stop, whichever is first
 *
 * RECORDING STOP:
 * - Destroy the live surface if any and cancel a pending start
 *
 * Nothing here fails the recording: every path ends in a StartOutcome.
 *
 * ============================================================================
 */

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::camera::config::OverlayConfig;
use crate::camera::permission::{ConsentPrompt, PermissionProbe, ensure_permission};
use crate::camera::placement::compute_bounds;
use crate::camera::session::OverlaySession;
use crate::camera::surface::{
    DisplayLookup, MountSignal, OverlaySurface, ScreenId, SurfaceFactory, SurfaceSpec, WindowTraits,
};
use crate::camera::types::{CaptureRegion, OverlayPhase, PermissionOutcome, StartOutcome};

/**
 * Everything the coordinator needs from the host application
 * Blanket-implemented for any type providing the individual seams
 */
pub trait OverlayHost: PermissionProbe + ConsentPrompt + DisplayLookup + SurfaceFactory {}

impl<T> OverlayHost for T where T: PermissionProbe + ConsentPrompt + DisplayLookup + SurfaceFactory {}

// Coordinator tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    // Upper bound on how long recording start waits for the overlay (ms)
    #[serde(default = "default_mount_timeout_ms")]
    pub mount_timeout_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            mount_timeout_ms: default_mount_timeout_ms(),
        }
    }
}

fn default_mount_timeout_ms() -> u64 {
    5_000
}

impl CoordinatorConfig {
    pub fn mount_timeout(&self) -> Duration {
        Duration::from_millis(self.mount_timeout_ms)
    }
}

pub struct OverlayCoordinator<H: OverlayHost> {
    host: H,
    config: CoordinatorConfig,
}

impl<H: OverlayHost> OverlayCoordinator<H> {
    pub fn new(host: H, config: CoordinatorConfig) -> Self {
        Self { host, config }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /**
     * Permission check when the overlay service gets enabled in the host
     * Same gate as recording start; the caller acts on OpenSettings
     */
    pub async fn on_enable(&self) -> PermissionOutcome {
        ensure_permission(&self.host).await
    }

    /**
     * Bring up the overlay for a recording that is about to start
     * Returns once the overlay mounted, the mount timeout elapsed, or the
     * session was stopped. RestartRequired asks the caller to open the
     * camera privacy settings and terminate the host.
     */
    pub async fn on_recording_start(
        &self,
        session: &OverlaySession<H::Surface>,
        config: &OverlayConfig,
        capture: CaptureRegion,
        screen_id: ScreenId,
    ) -> StartOutcome {
        let (generation, mut cancelled) = session.begin();
        log::info!(
            "Starting camera overlay (session {}, generation {}, screen {})",
            session.id(),
            generation,
            screen_id
        );

        match ensure_permission(&self.host).await {
            PermissionOutcome::Granted => {}
            PermissionOutcome::Denied => {
                session.set_phase(generation, OverlayPhase::Denied);
                let outcome = StartOutcome::PermissionDenied;
                session.finish(generation, &outcome);
                log::info!("Camera permission denied, recording continues without overlay");
                return outcome;
            }
            PermissionOutcome::OpenSettings => {
                session.set_phase(generation, OverlayPhase::Denied);
                let outcome = StartOutcome::RestartRequired;
                session.finish(generation, &outcome);
                return outcome;
            }
        }

        if !session.set_phase(generation, OverlayPhase::Placing) {
            log::info!("Overlay start cancelled during permission check");
            return StartOutcome::Cancelled;
        }

        let screen = self.host.screen_bounds(screen_id);
        if screen.is_none() {
            log::warn!("Display {} not found, placing overlay against empty bounds", screen_id);
        }

        let size = config.overlay_size();
        let rect = compute_bounds(&capture, screen.as_ref(), &size);
        log::debug!("Overlay rect for capture {:?}: {:?}", capture, rect);

        session.set_phase(generation, OverlayPhase::Spawning);
        let (mount, mut mounted) = MountSignal::channel();
        let spec = SurfaceSpec {
            rect,
            traits: WindowTraits::OVERLAY,
            message: config.message(),
        };

        let surface = match self.host.spawn_surface(spec, mount) {
            Ok(surface) => surface,
            Err(e) => {
                log::error!("Failed to create camera overlay: {}", e);
                let outcome = StartOutcome::SpawnFailed(e);
                session.finish(generation, &outcome);
                return outcome;
            }
        };

        if let Err(mut orphan) = session.install_surface(generation, surface, rect) {
            log::info!("Overlay start cancelled while spawning, destroying surface");
            orphan.destroy();
            return StartOutcome::Cancelled;
        }

        let outcome = tokio::select! {
            Ok(()) = &mut mounted => StartOutcome::Mounted,
            _ = cancelled.changed() => StartOutcome::Cancelled,
            _ = tokio::time::sleep(self.config.mount_timeout()) => StartOutcome::TimedOut,
        };
        // Later mount signals now find a closed channel
        drop(mounted);

        if !session.finish(generation, &outcome) {
            log::info!("Overlay start cancelled while waiting for mount");
            return StartOutcome::Cancelled;
        }

        match outcome {
            StartOutcome::TimedOut => log::warn!(
                "Camera overlay did not report mounted within {:?}, continuing",
                self.config.mount_timeout()
            ),
            _ => log::info!("Camera overlay mounted"),
        }
        outcome
    }

    /**
     * Tear down the overlay when recording stops
     * No-op without a live surface; also cancels an in-flight start
     */
    pub fn on_recording_stop(&self, session: &OverlaySession<H::Surface>) {
        match session.teardown() {
            Some(mut surface) => {
                surface.destroy();
                log::info!("Camera overlay destroyed (session {})", session.id());
            }
            None => {
                log::debug!("No camera overlay to destroy (session {})", session.id());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::config::OverlayLayout;
    use crate::camera::devices;
    use crate::camera::types::{ConsentChoice, OverlayRect, ScreenBounds};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[derive(Clone, Copy, PartialEq)]
    enum MountMode {
        Immediate,
        Never,
        Fail,
    }

    struct FakeSurface {
        destroyed: Arc<AtomicUsize>,
    }

    impl OverlaySurface for FakeSurface {
        fn destroy(&mut self) {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeHost {
        granted: bool,
        consent: ConsentChoice,
        permission_delay: Option<Duration>,
        screens: HashMap<ScreenId, ScreenBounds>,
        mode: MountMode,
        prompts: AtomicUsize,
        spawned: AtomicUsize,
        destroyed: Arc<AtomicUsize>,
        specs: Mutex<Vec<SurfaceSpec>>,
        signals: Mutex<Vec<MountSignal>>,
    }

    impl FakeHost {
        fn new(mode: MountMode) -> Self {
            let mut screens = HashMap::new();
            screens.insert(
                1,
                ScreenBounds { x: 0.0, y: 0.0, width: 1920.0, height: 1080.0 },
            );
            Self {
                granted: true,
                consent: ConsentChoice::Cancel,
                permission_delay: None,
                screens,
                mode,
                prompts: AtomicUsize::new(0),
                spawned: AtomicUsize::new(0),
                destroyed: Arc::new(AtomicUsize::new(0)),
                specs: Mutex::new(Vec::new()),
                signals: Mutex::new(Vec::new()),
            }
        }

        fn denied(consent: ConsentChoice) -> Self {
            Self {
                granted: false,
                consent,
                ..Self::new(MountMode::Immediate)
            }
        }

        fn spawned(&self) -> usize {
            self.spawned.load(Ordering::SeqCst)
        }

        fn destroyed(&self) -> usize {
            self.destroyed.load(Ordering::SeqCst)
        }

        fn last_spec(&self) -> SurfaceSpec {
            self.specs.lock().unwrap().last().cloned().unwrap()
        }

        fn last_signal(&self) -> MountSignal {
            self.signals.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl PermissionProbe for FakeHost {
        async fn check_permission(&self) -> bool {
            if let Some(delay) = self.permission_delay {
                tokio::time::sleep(delay).await;
            }
            self.granted
        }
    }

    impl ConsentPrompt for FakeHost {
        async fn ask_consent(&self) -> ConsentChoice {
            self.prompts.fetch_add(1, Ordering::SeqCst);
            self.consent
        }
    }

    impl DisplayLookup for FakeHost {
        fn screen_bounds(&self, screen_id: ScreenId) -> Option<ScreenBounds> {
            self.screens.get(&screen_id).copied()
        }
    }

    impl SurfaceFactory for FakeHost {
        type Surface = FakeSurface;

        fn spawn_surface(&self, spec: SurfaceSpec, mount: MountSignal) -> Result<FakeSurface, String> {
            if self.mode == MountMode::Fail {
                return Err("webview unavailable".to_string());
            }
            self.spawned.fetch_add(1, Ordering::SeqCst);
            self.specs.lock().unwrap().push(spec);
            if self.mode == MountMode::Immediate {
                mount.notify();
            }
            self.signals.lock().unwrap().push(mount);
            Ok(FakeSurface {
                destroyed: self.destroyed.clone(),
            })
        }
    }

    fn coordinator(host: FakeHost) -> OverlayCoordinator<FakeHost> {
        OverlayCoordinator::new(host, CoordinatorConfig::default())
    }

    fn square_config(side: f64) -> OverlayConfig {
        OverlayConfig {
            device_name: "FaceTime HD Camera".to_string(),
            layout: OverlayLayout::Classic {
                width: side,
                height: side,
                border_radius: "50%".to_string(),
                hover_opacity: 0.6,
            },
        }
    }

    const CAPTURE: CaptureRegion = CaptureRegion { x: 0.0, y: 0.0, width: 800.0, height: 600.0 };

    #[tokio::test]
    async fn test_start_mounts_overlay() {
        let coordinator = coordinator(FakeHost::new(MountMode::Immediate));
        let session = OverlaySession::new();

        let outcome = coordinator
            .on_recording_start(&session, &square_config(200.0), CAPTURE, 1)
            .await;

        assert_eq!(outcome, StartOutcome::Mounted);
        assert!(session.has_surface());
        assert_eq!(session.phase(), OverlayPhase::Mounted);

        let spec = coordinator.host().last_spec();
        assert_eq!(spec.rect, OverlayRect { x: 580.0, y: 860.0, width: 200.0, height: 200.0 });
        assert_eq!(spec.traits, WindowTraits::OVERLAY);
        assert_eq!(spec.message.device_name, "FaceTime HD Camera");
        assert_eq!(spec.message.style_params.border_radius, "50%");

        let status = session.status();
        assert!(status.overlay_active);
        assert!(status.mounted_at.is_some());
        assert_eq!(status.overlay_rect, Some(spec.rect));
    }

    // The page binds the device it was sent, not whatever the config says later
    #[tokio::test]
    async fn test_overlay_binds_device_sent_at_start() {
        let coordinator = coordinator(FakeHost::new(MountMode::Immediate));
        let session = OverlaySession::new();
        let mut config = square_config(128.0);

        let outcome = coordinator.on_recording_start(&session, &config, CAPTURE, 1).await;
        assert_eq!(outcome, StartOutcome::Mounted);
        config.device_name = "Logitech BRIO".to_string();

        let labels = vec![
            "Logitech BRIO (046d:085e)".to_string(),
            "FaceTime HD Camera (Built-in)".to_string(),
        ];
        let sent = coordinator.host().last_spec().message.device_name;
        assert_eq!(sent, "FaceTime HD Camera");
        assert_eq!(
            devices::match_device(&sent, &labels),
            Some("FaceTime HD Camera (Built-in)")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_timeout_is_not_an_error() {
        let coordinator = coordinator(FakeHost::new(MountMode::Never));
        let session = OverlaySession::new();
        let started = Instant::now();

        let outcome = coordinator
            .on_recording_start(&session, &OverlayConfig::default(), CAPTURE, 1)
            .await;

        assert_eq!(outcome, StartOutcome::TimedOut);
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(session.has_surface());
        assert_eq!(session.phase(), OverlayPhase::Mounted);

        // Late acknowledgment is dropped
        let late = coordinator.host().last_signal();
        assert!(!late.notify());
        assert_eq!(session.status().last_outcome, Some(StartOutcome::TimedOut));
        assert!(session.status().mounted_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_mount_timeout() {
        let coordinator = OverlayCoordinator::new(
            FakeHost::new(MountMode::Never),
            CoordinatorConfig { mount_timeout_ms: 250 },
        );
        let session = OverlaySession::new();
        let started = Instant::now();

        let outcome = coordinator
            .on_recording_start(&session, &OverlayConfig::default(), CAPTURE, 1)
            .await;

        assert_eq!(outcome, StartOutcome::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(250));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_denied_permission_spawns_nothing() {
        let coordinator = coordinator(FakeHost::denied(ConsentChoice::Cancel));
        let session = OverlaySession::new();

        let outcome = coordinator
            .on_recording_start(&session, &OverlayConfig::default(), CAPTURE, 1)
            .await;

        assert_eq!(outcome, StartOutcome::PermissionDenied);
        assert_eq!(coordinator.host().spawned(), 0);
        assert_eq!(coordinator.host().prompts.load(Ordering::SeqCst), 1);
        assert!(!session.has_surface());
        assert_eq!(session.phase(), OverlayPhase::Idle);
    }

    #[tokio::test]
    async fn test_open_settings_requires_restart() {
        let coordinator = coordinator(FakeHost::denied(ConsentChoice::OpenSettings));
        let session = OverlaySession::new();

        let outcome = coordinator
            .on_recording_start(&session, &OverlayConfig::default(), CAPTURE, 1)
            .await;

        assert_eq!(outcome, StartOutcome::RestartRequired);
        assert_eq!(coordinator.host().spawned(), 0);
        assert!(!session.has_surface());
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_stop_tears_down() {
        let coordinator = coordinator(FakeHost::new(MountMode::Never));
        let session = OverlaySession::new();
        let config = OverlayConfig::default();
        let started = Instant::now();

        let (outcome, ()) = tokio::join!(
            coordinator.on_recording_start(&session, &config, CAPTURE, 1),
            async {
                tokio::task::yield_now().await;
                coordinator.on_recording_stop(&session);
            }
        );

        assert_eq!(outcome, StartOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(coordinator.host().spawned(), 1);
        assert_eq!(coordinator.host().destroyed(), 1);
        assert!(!session.has_surface());
        assert_eq!(session.phase(), OverlayPhase::Idle);

        // Nothing fires after the timeout would have elapsed
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(coordinator.host().destroyed(), 1);
        assert_eq!(session.phase(), OverlayPhase::Idle);
        assert!(!coordinator.host().last_signal().notify());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_permission_check() {
        let host = FakeHost {
            permission_delay: Some(Duration::from_secs(1)),
            ..FakeHost::new(MountMode::Immediate)
        };
        let coordinator = coordinator(host);
        let session = OverlaySession::new();
        let config = OverlayConfig::default();

        let (outcome, ()) = tokio::join!(
            coordinator.on_recording_start(&session, &config, CAPTURE, 1),
            async {
                tokio::task::yield_now().await;
                coordinator.on_recording_stop(&session);
            }
        );

        assert_eq!(outcome, StartOutcome::Cancelled);
        assert_eq!(coordinator.host().spawned(), 0);
        assert!(!session.has_surface());
    }

    #[tokio::test]
    async fn test_stop_without_overlay_is_noop() {
        let coordinator = coordinator(FakeHost::new(MountMode::Immediate));
        let session = OverlaySession::new();

        coordinator.on_recording_stop(&session);
        coordinator.on_recording_stop(&session);

        assert_eq!(coordinator.host().destroyed(), 0);
        assert_eq!(session.phase(), OverlayPhase::Idle);
        assert_eq!(session.status().last_outcome, None);
    }

    #[tokio::test]
    async fn test_stop_destroys_mounted_overlay_once() {
        let coordinator = coordinator(FakeHost::new(MountMode::Immediate));
        let session = OverlaySession::new();

        coordinator
            .on_recording_start(&session, &OverlayConfig::default(), CAPTURE, 1)
            .await;
        coordinator.on_recording_stop(&session);
        coordinator.on_recording_stop(&session);

        assert_eq!(coordinator.host().destroyed(), 1);
        assert!(!session.has_surface());
        // A finished start keeps its outcome after stop
        assert_eq!(session.status().last_outcome, Some(StartOutcome::Mounted));
    }

    #[tokio::test]
    async fn test_unknown_display_still_places_overlay() {
        let coordinator = coordinator(FakeHost::new(MountMode::Immediate));
        let session = OverlaySession::new();

        let outcome = coordinator
            .on_recording_start(&session, &square_config(200.0), CAPTURE, 42)
            .await;

        assert_eq!(outcome, StartOutcome::Mounted);
        let rect = coordinator.host().last_spec().rect;
        assert_eq!(rect.x, 580.0);
        assert_eq!(rect.y, -220.0);
    }

    #[tokio::test]
    async fn test_spawn_failure_leaves_session_empty() {
        let coordinator = coordinator(FakeHost::new(MountMode::Fail));
        let session = OverlaySession::new();

        let outcome = coordinator
            .on_recording_start(&session, &OverlayConfig::default(), CAPTURE, 1)
            .await;

        assert_eq!(outcome, StartOutcome::SpawnFailed("webview unavailable".to_string()));
        assert!(!session.has_surface());
        assert_eq!(session.phase(), OverlayPhase::Idle);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let coordinator = coordinator(FakeHost::new(MountMode::Immediate));
        let first = OverlaySession::new();
        let second = OverlaySession::new();

        coordinator
            .on_recording_start(&first, &OverlayConfig::default(), CAPTURE, 1)
            .await;
        coordinator
            .on_recording_start(&second, &OverlayConfig::default(), CAPTURE, 1)
            .await;
        coordinator.on_recording_stop(&first);

        assert!(!first.has_surface());
        assert!(second.has_surface());
        assert_ne!(first.id(), second.id());
        assert_eq!(coordinator.host().destroyed(), 1);
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let coordinator = coordinator(FakeHost::new(MountMode::Immediate));
        let session = OverlaySession::new();

        for _ in 0..3 {
            let outcome = coordinator
                .on_recording_start(&session, &OverlayConfig::default(), CAPTURE, 1)
                .await;
            assert_eq!(outcome, StartOutcome::Mounted);
            coordinator.on_recording_stop(&session);
        }

        assert_eq!(coordinator.host().spawned(), 3);
        assert_eq!(coordinator.host().destroyed(), 3);
        assert!(!session.has_surface());
    }

    #[tokio::test]
    async fn test_on_enable_runs_gate() {
        let granted = coordinator(FakeHost::new(MountMode::Immediate));
        assert_eq!(granted.on_enable().await, PermissionOutcome::Granted);

        let denied = coordinator(FakeHost::denied(ConsentChoice::OpenSettings));
        assert_eq!(denied.on_enable().await, PermissionOutcome::OpenSettings);
        assert_eq!(denied.host().spawned(), 0);
    }
}
