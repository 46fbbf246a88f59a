/**
 * ============================================================================
 * PLACEMENT MODULE
 * ============================================================================
 *
 * PURPOSE: Compute the overlay window rectangle for a capture region
 *
 * The capture region is expressed with y measured from the top of the
 * capture frame, while the overlay is anchored to the region's bottom-left
 * in screen coordinates. The formula flips y against the display height and
 * applies the anchor offset. The operation order is significant and there is
 * no clamping: out-of-bounds results for unusual inputs are kept as-is.
 *
 * ============================================================================
 */

use crate::camera::types::{CaptureRegion, OverlayRect, OverlaySize, ScreenBounds};

// Gap between the overlay and the capture region edges
pub const PADDING: f64 = 20.0;

/**
 * Overlay rectangle in absolute screen-space
 * `screen` is None when the display could not be found; zeroed bounds are
 * used and the (possibly misplaced) rectangle is still returned
 */
pub fn compute_bounds(
    capture: &CaptureRegion,
    screen: Option<&ScreenBounds>,
    size: &OverlaySize,
) -> OverlayRect {
    let screen = screen.copied().unwrap_or_default();

    OverlayRect {
        x: capture.x + screen.x + capture.width - size.width - PADDING,
        y: screen.height - (capture.y + capture.height) + screen.y + capture.height
            - size.height
            - PADDING,
        width: size.width,
        height: size.height,
    }
}
