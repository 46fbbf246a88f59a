/**
 * ============================================================================
 * OVERLAY SESSION MODULE
 * ============================================================================
 *
 * PURPOSE: Per-recording-session overlay state
 *
 * Each recording session owns one OverlaySession and passes it to the
 * coordinator on start/stop. It holds at most one live surface.
 *
 * GENERATIONS:
 * Every start and every stop bumps a generation counter (under the state
 * lock). A start sequence only writes state while its generation is current,
 * and waits on the counter so a stop wakes it immediately. This is what
 * makes stop a hard cancellation of an in-flight start.
 *
 * ============================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use uuid::Uuid;

use crate::camera::surface::OverlaySurface;
use crate::camera::types::{OverlayPhase, OverlayRect, StartOutcome};

struct SessionState<S> {
    phase: OverlayPhase,
    surface: Option<S>,
    rect: Option<OverlayRect>,
    last_outcome: Option<StartOutcome>,
    started_at: Option<DateTime<Utc>>,
    mounted_at: Option<DateTime<Utc>>,
}

// Snapshot for status queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: Uuid,
    pub phase: OverlayPhase,
    pub overlay_active: bool,
    pub overlay_rect: Option<OverlayRect>,
    pub last_outcome: Option<StartOutcome>,
    pub started_at: Option<DateTime<Utc>>,
    pub mounted_at: Option<DateTime<Utc>>,
}

pub struct OverlaySession<S: OverlaySurface> {
    id: Uuid,
    state: Mutex<SessionState<S>>,
    generation: watch::Sender<u64>,
}

impl<S: OverlaySurface> Default for OverlaySession<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: OverlaySurface> std::fmt::Debug for OverlaySession<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        write!(
            f,
            "OverlaySession({}, {:?}, surface={})",
            self.id,
            state.phase,
            state.surface.is_some()
        )
    }
}

impl<S: OverlaySurface> OverlaySession<S> {
    pub fn new() -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            id: Uuid::new_v4(),
            state: Mutex::new(SessionState {
                phase: OverlayPhase::Idle,
                surface: None,
                rect: None,
                last_outcome: None,
                started_at: None,
                mounted_at: None,
            }),
            generation,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> OverlayPhase {
        self.lock().phase
    }

    pub fn has_surface(&self) -> bool {
        self.lock().surface.is_some()
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.lock();
        SessionStatus {
            session_id: self.id,
            phase: state.phase,
            overlay_active: state.surface.is_some(),
            overlay_rect: state.rect,
            last_outcome: state.last_outcome.clone(),
            started_at: state.started_at,
            mounted_at: state.mounted_at,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /**
     * Open a new start sequence
     * Returns its generation and a receiver that changes on the next stop
     */
    pub(crate) fn begin(&self) -> (u64, watch::Receiver<u64>) {
        let mut state = self.lock();
        self.generation.send_modify(|g| *g += 1);
        let receiver = self.generation.subscribe();

        state.phase = OverlayPhase::PermissionPending;
        state.last_outcome = None;
        state.started_at = Some(Utc::now());
        state.mounted_at = None;

        let generation = *receiver.borrow();
        (generation, receiver)
    }

    // Advance the phase; false when the sequence was cancelled
    pub(crate) fn set_phase(&self, generation: u64, phase: OverlayPhase) -> bool {
        let mut state = self.lock();
        if self.current_generation() != generation {
            return false;
        }
        log::debug!("Overlay session {}: {:?} -> {:?}", self.id, state.phase, phase);
        state.phase = phase;
        true
    }

    /**
     * Record a freshly spawned surface
     * Hands the surface back when the sequence was cancelled meanwhile, so the
     * caller destroys it instead of leaving an untracked window
     */
    pub(crate) fn install_surface(
        &self,
        generation: u64,
        surface: S,
        rect: OverlayRect,
    ) -> Result<(), S> {
        let mut state = self.lock();
        if self.current_generation() != generation {
            return Err(surface);
        }

        if let Some(mut previous) = state.surface.replace(surface) {
            log::warn!("Overlay session {}: replacing a live surface", self.id);
            previous.destroy();
        }
        state.rect = Some(rect);
        state.phase = OverlayPhase::AwaitingMount;
        Ok(())
    }

    /**
     * Close a start sequence with its outcome
     * Returns false (and leaves state alone) when a stop got there first
     */
    pub(crate) fn finish(&self, generation: u64, outcome: &StartOutcome) -> bool {
        let mut state = self.lock();
        if self.current_generation() != generation {
            return false;
        }

        state.phase = match outcome {
            StartOutcome::Mounted | StartOutcome::TimedOut => OverlayPhase::Mounted,
            _ => OverlayPhase::Idle,
        };
        if matches!(outcome, StartOutcome::Mounted) {
            state.mounted_at = Some(Utc::now());
        }
        state.last_outcome = Some(outcome.clone());
        true
    }

    /**
     * Cancel any in-flight start and take the live surface
     * Always bumps the generation, even when there is nothing to tear down
     */
    pub(crate) fn teardown(&self) -> Option<S> {
        let mut state = self.lock();
        self.generation.send_modify(|g| *g += 1);

        if state.phase != OverlayPhase::Idle && state.last_outcome.is_none() {
            state.last_outcome = Some(StartOutcome::Cancelled);
        }
        state.phase = OverlayPhase::Idle;
        state.rect = None;
        state.surface.take()
    }
}
