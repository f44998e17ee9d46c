//! Window stack helpers shared by the coordinator.

use crate::{
    model::{PaneKind, WindowId, WindowSnapshot},
    pane::Pane,
    window::WindowEntity,
};

/// A window entity together with the pane it hosts.
#[derive(Debug, Clone)]
pub struct ManagedWindow {
    pub(crate) entity: WindowEntity,
    pub(crate) pane: Pane,
}

impl ManagedWindow {
    pub fn id(&self) -> &WindowId {
        self.entity.id()
    }

    pub fn kind(&self) -> PaneKind {
        self.pane.kind()
    }

    pub fn entity(&self) -> &WindowEntity {
        &self.entity
    }

    pub fn pane(&self) -> &Pane {
        &self.pane
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        let mut snapshot = self.entity.snapshot(self.kind());
        self.pane.write_payload(&mut snapshot);
        snapshot
    }
}

/// Moves `window_id` to the top of the stack.
///
/// Returns `true` when the stacking order changed.
pub fn raise_window(windows: &mut Vec<ManagedWindow>, window_id: &WindowId, base: i32) -> bool {
    let Some(index) = windows.iter().position(|w| w.id() == window_id) else {
        return false;
    };
    if index + 1 == windows.len() {
        return false;
    }
    let window = windows.remove(index);
    windows.push(window);
    normalize_window_stack(windows, base);
    true
}

/// Reassigns stacking keys so they strictly increase in collection order.
pub fn normalize_window_stack(windows: &mut [ManagedWindow], base: i32) {
    for (idx, window) in windows.iter_mut().enumerate() {
        let offset = i32::try_from(idx).unwrap_or(i32::MAX);
        window.entity.set_z_index(base.saturating_add(offset));
    }
}
