//! Pure geometry helpers for drag, resize and viewport clamping.

use rand::Rng;

use crate::model::{PointerPosition, ResizeEdge, Viewport, WindowRect};

/// Minimum allowed managed window width.
pub const MIN_WINDOW_WIDTH: i32 = 200;
/// Minimum allowed managed window height.
pub const MIN_WINDOW_HEIGHT: i32 = 100;

/// Lower bounds for window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeFloor {
    pub width: i32,
    pub height: i32,
}

impl Default for SizeFloor {
    fn default() -> Self {
        Self {
            width: MIN_WINDOW_WIDTH,
            height: MIN_WINDOW_HEIGHT,
        }
    }
}

impl SizeFloor {
    /// Raises `width`/`height` to the floor (non-positive sizes included).
    pub fn apply(self, width: i32, height: i32) -> (i32, i32) {
        (width.max(self.width), height.max(self.height))
    }
}

/// Clamps a top-left origin so a `width` x `height` rect stays inside `viewport`.
///
/// A rect larger than the viewport on an axis is pinned to 0 on that axis.
pub fn clamp_position(x: i32, y: i32, width: i32, height: i32, viewport: Viewport) -> (i32, i32) {
    (
        x.min(viewport.width - width).max(0),
        y.min(viewport.height - height).max(0),
    )
}

/// [`clamp_position`] applied to a rect.
pub fn clamp_rect(rect: WindowRect, viewport: Viewport) -> WindowRect {
    let (x, y) = clamp_position(rect.x, rect.y, rect.w, rect.h, viewport);
    WindowRect { x, y, ..rect }
}

/// New origin for a drag: anchor origin plus pointer travel, clamped.
pub fn drag_delta(
    anchor: PointerPosition,
    current: PointerPosition,
    anchor_rect: WindowRect,
    viewport: Viewport,
) -> (i32, i32) {
    let moved = anchor_rect.offset(current.x - anchor.x, current.y - anchor.y);
    clamp_position(moved.x, moved.y, moved.w, moved.h, viewport)
}

/// New rect for a resize from `edge`.
///
/// Axes with a zero direction component keep their origin and size. On a negative direction
/// the origin moves so the opposite edge stays put.
pub fn resize_delta(
    anchor: PointerPosition,
    current: PointerPosition,
    anchor_rect: WindowRect,
    edge: ResizeEdge,
    floor: SizeFloor,
    viewport: Viewport,
) -> WindowRect {
    let (dir_x, dir_y) = edge.direction();
    let (x, w) = resize_axis(
        anchor_rect.x,
        anchor_rect.w,
        current.x - anchor.x,
        dir_x,
        floor.width,
        viewport.width,
    );
    let (y, h) = resize_axis(
        anchor_rect.y,
        anchor_rect.h,
        current.y - anchor.y,
        dir_y,
        floor.height,
        viewport.height,
    );
    clamp_rect(WindowRect { x, y, w, h }, viewport)
}

fn resize_axis(origin: i32, size: i32, delta: i32, dir: i32, floor: i32, limit: i32) -> (i32, i32) {
    match dir.signum() {
        0 => (origin, size),
        1 => {
            let max_size = (limit - origin).max(floor);
            (origin, (size + delta).max(floor).min(max_size))
        }
        _ => {
            let far_edge = origin + size;
            let max_size = far_edge.max(floor);
            let new_size = (size - delta).max(floor).min(max_size);
            (origin + (size - new_size), new_size)
        }
    }
}

/// Random origin that keeps a `width` x `height` rect inside `viewport` when it fits.
pub fn random_origin<R: Rng + ?Sized>(
    rng: &mut R,
    width: i32,
    height: i32,
    viewport: Viewport,
) -> (i32, i32) {
    let max_x = (viewport.width - width).max(0);
    let max_y = (viewport.height - height).max(0);
    (rng.random_range(0..=max_x), rng.random_range(0..=max_y))
}
