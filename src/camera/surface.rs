/**
 * ============================================================================
 * OVERLAY SURFACE MODULE
 * ============================================================================
 *
 * PURPOSE: Seams between the coordinator and the host application
 *
 * TRAITS:
 * - DisplayLookup: screen bounds by display id
 * - SurfaceFactory: create the overlay window at a rectangle
 * - OverlaySurface: handle to a live overlay window
 *
 * HANDSHAKE:
 * The factory receives the payload and a MountSignal. It must deliver the
 * payload only after the surface reports its content finished loading, and
 * call `MountSignal::notify` when the surface reports "mounted". The signal
 * fires at most once; notifications after the coordinator stopped waiting
 * are dropped.
 *
 * ============================================================================
 */

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

use crate::camera::types::{OverlayMessage, OverlayRect, ScreenBounds};

// Host display identifier
pub type ScreenId = u32;

pub trait DisplayLookup: Send + Sync {
    // None when the display is gone (e.g. disconnected mid-session)
    fn screen_bounds(&self, screen_id: ScreenId) -> Option<ScreenBounds>;
}

pub trait OverlaySurface: Send + 'static {
    // Must not fail or panic if the window is already gone
    fn destroy(&mut self);
}

pub trait SurfaceFactory: Send + Sync {
    type Surface: OverlaySurface;

    fn spawn_surface(&self, spec: SurfaceSpec, mount: MountSignal) -> Result<Self::Surface, String>;
}

/**
 * Presentation traits of the overlay window
 * The overlay is a floating, chrome-less camera bubble. It keeps receiving
 * cursor events so the hover opacity applies; `click_through` is there for
 * hosts that want the window to ignore the mouse instead.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowTraits {
    pub closable: bool,
    pub minimizable: bool,
    pub maximizable: bool,
    pub always_on_top: bool,
    pub decorations: bool,
    pub transparent: bool,
    pub shadow: bool,
    pub click_through: bool,
    pub skip_taskbar: bool,
}

impl WindowTraits {
    pub const OVERLAY: WindowTraits = WindowTraits {
        closable: false,
        minimizable: false,
        maximizable: false,
        always_on_top: true,
        decorations: false,
        transparent: true,
        shadow: false,
        click_through: false,
        skip_taskbar: true,
    };
}

// Everything a factory needs to create one overlay surface
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSpec {
    pub rect: OverlayRect,
    pub traits: WindowTraits,
    pub message: OverlayMessage,
}

/**
 * Fire-once "mounted" acknowledgment
 * Cloneable so host event listeners (which may be `Fn`) can hold it
 */
#[derive(Debug, Clone)]
pub struct MountSignal {
    sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl MountSignal {
    pub fn channel() -> (MountSignal, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let signal = MountSignal {
            sender: Arc::new(Mutex::new(Some(tx))),
        };
        (signal, rx)
    }

    /**
     * Report the mount
     * Returns true only for the call that reached a waiting coordinator
     */
    pub fn notify(&self) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sender {
            Some(tx) => {
                let delivered = tx.send(()).is_ok();
                if !delivered {
                    log::debug!("Overlay mount signal arrived after the wait ended, ignoring");
                }
                delivered
            }
            None => false,
        }
    }

    // Still unsent and someone is listening
    #[cfg(test)]
    fn is_pending(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }
}
