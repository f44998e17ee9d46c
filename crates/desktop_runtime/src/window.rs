//! Window entity: one pane's geometry, stacking key, and interaction state machine.

use crate::{
    geometry::{clamp_rect, drag_delta, resize_delta, SizeFloor},
    model::{PaneKind, PointerPosition, ResizeEdge, Viewport, WindowId, WindowRect, WindowSnapshot},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// In-flight pointer interaction. Only one can be active per window.
pub enum Interaction {
    Idle,
    Dragging {
        pointer_start: PointerPosition,
        rect_start: WindowRect,
    },
    Resizing {
        edge: ResizeEdge,
        pointer_start: PointerPosition,
        rect_start: WindowRect,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Lifecycle signals raised by a [`WindowEntity`] for the coordinator.
pub enum WindowEvent {
    /// The user asked to close the window.
    Close,
    /// The window was clicked and wants to be raised.
    Focus,
    /// A drag session started.
    DragStarted,
    /// A resize session started.
    ResizeStarted,
    /// Geometry changed during an interaction or a viewport refit.
    GeometryChanged(WindowRect),
    /// The active drag or resize session ended.
    InteractionEnded,
    /// Minimized flag flipped.
    MinimizeChanged { minimized: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowEntity {
    id: WindowId,
    title: String,
    rect: WindowRect,
    minimized: bool,
    z_index: i32,
    floor: SizeFloor,
    interaction: Interaction,
}

impl WindowEntity {
    /// Creates a window, raising the size to `floor` and clamping it into `viewport`.
    pub fn new(
        id: WindowId,
        title: impl Into<String>,
        rect: WindowRect,
        floor: SizeFloor,
        viewport: Viewport,
    ) -> Self {
        let (w, h) = floor.apply(rect.w, rect.h);
        Self {
            id,
            title: title.into(),
            rect: clamp_rect(WindowRect { w, h, ..rect }, viewport),
            minimized: false,
            z_index: 0,
            floor,
            interaction: Interaction::Idle,
        }
    }

    /// Rebuilds a window from its persisted form, keeping id, geometry, minimized flag and
    /// stacking key.
    pub fn from_snapshot(snapshot: &WindowSnapshot, floor: SizeFloor, viewport: Viewport) -> Self {
        let mut window = Self::new(
            snapshot.id.clone(),
            snapshot.title.clone(),
            snapshot.rect(),
            floor,
            viewport,
        );
        window.minimized = snapshot.minimized;
        window.z_index = snapshot.z_index;
        window
    }

    pub fn id(&self) -> &WindowId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn rect(&self) -> WindowRect {
        self.rect
    }

    pub fn minimized(&self) -> bool {
        self.minimized
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    pub fn set_z_index(&mut self, z_index: i32) {
        self.z_index = z_index;
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.interaction, Interaction::Idle)
    }

    /// Begins a drag anchored at `pointer`. Ignored unless idle.
    pub fn start_drag(&mut self, pointer: PointerPosition) -> Option<WindowEvent> {
        if !self.is_idle() {
            return None;
        }
        self.interaction = Interaction::Dragging {
            pointer_start: pointer,
            rect_start: self.rect,
        };
        Some(WindowEvent::DragStarted)
    }

    /// Begins a resize from `edge` anchored at `pointer`. Ignored unless idle.
    pub fn start_resize(&mut self, edge: ResizeEdge, pointer: PointerPosition) -> Option<WindowEvent> {
        if !self.is_idle() {
            return None;
        }
        self.interaction = Interaction::Resizing {
            edge,
            pointer_start: pointer,
            rect_start: self.rect,
        };
        Some(WindowEvent::ResizeStarted)
    }

    /// Applies pointer travel to the active interaction.
    pub fn pointer_move(&mut self, pointer: PointerPosition, viewport: Viewport) -> Option<WindowEvent> {
        let next = match self.interaction {
            Interaction::Idle => return None,
            Interaction::Dragging {
                pointer_start,
                rect_start,
            } => {
                let (x, y) = drag_delta(pointer_start, pointer, rect_start, viewport);
                WindowRect { x, y, ..self.rect }
            }
            Interaction::Resizing {
                edge,
                pointer_start,
                rect_start,
            } => resize_delta(pointer_start, pointer, rect_start, edge, self.floor, viewport),
        };
        self.rect = next;
        Some(WindowEvent::GeometryChanged(next))
    }

    pub fn end_drag(&mut self) -> Option<WindowEvent> {
        if !matches!(self.interaction, Interaction::Dragging { .. }) {
            return None;
        }
        self.interaction = Interaction::Idle;
        Some(WindowEvent::InteractionEnded)
    }

    pub fn end_resize(&mut self) -> Option<WindowEvent> {
        if !matches!(self.interaction, Interaction::Resizing { .. }) {
            return None;
        }
        self.interaction = Interaction::Idle;
        Some(WindowEvent::InteractionEnded)
    }

    /// Ends whichever interaction is active.
    pub fn end_interaction(&mut self) -> Option<WindowEvent> {
        self.end_drag().or_else(|| self.end_resize())
    }

    pub fn toggle_minimize(&mut self) -> WindowEvent {
        self.minimized = !self.minimized;
        WindowEvent::MinimizeChanged {
            minimized: self.minimized,
        }
    }

    pub fn request_close(&self) -> WindowEvent {
        WindowEvent::Close
    }

    pub fn focus(&self) -> WindowEvent {
        WindowEvent::Focus
    }

    /// Moves the origin to `(x, y)`, clamped.
    pub fn move_to(&mut self, x: i32, y: i32, viewport: Viewport) -> Option<WindowEvent> {
        self.set_rect(WindowRect { x, y, ..self.rect }, viewport)
    }

    /// Re-clamps the origin after the viewport changed size.
    pub fn fit_viewport(&mut self, viewport: Viewport) -> Option<WindowEvent> {
        self.set_rect(self.rect, viewport)
    }

    fn set_rect(&mut self, rect: WindowRect, viewport: Viewport) -> Option<WindowEvent> {
        let next = clamp_rect(rect, viewport);
        if next == self.rect {
            return None;
        }
        self.rect = next;
        Some(WindowEvent::GeometryChanged(next))
    }

    /// Persistable fields common to every pane kind; kind payload is filled in by the pane.
    pub fn snapshot(&self, kind: PaneKind) -> WindowSnapshot {
        WindowSnapshot {
            id: self.id.clone(),
            kind,
            title: self.title.clone(),
            content: String::new(),
            x: self.rect.x,
            y: self.rect.y,
            width: self.rect.w,
            height: self.rect.h,
            minimized: self.minimized,
            z_index: self.z_index,
            channel: None,
            remaining_secs: None,
        }
    }
}
