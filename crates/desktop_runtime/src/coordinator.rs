//! Desktop coordinator: owns every window, assigns stacking order, routes pointer input to the
//! window being manipulated, and serializes or restores the desktop.
//!
//! All operations are synchronous. Side effects (store writes, transport calls, timers) are
//! queued as [`RuntimeEffect`]s and executed in order by the host, which feeds results back
//! through the `transport_*`, `chat_cache_loaded` and `timer_fired` entry points.

use std::{collections::HashSet, rc::Rc, time::Duration};

use platform_host::{ConnectionId, IdentityProvider};
use rand::{rngs::StdRng, SeedableRng};
use thiserror::Error;

use crate::{
    chat::{ChatEffect, ChatError, ChatMessage, ChatSession},
    config::DesktopConfig,
    geometry::random_origin,
    model::{
        DesktopSnapshot, PaneKind, PointerPosition, ResizeEdge, TaskbarEntry, Viewport,
        WindowConfig, WindowId, WindowRect,
    },
    pane::Pane,
    timer::TimerEvent,
    window::{WindowEntity, WindowEvent},
    window_manager::{normalize_window_stack, raise_window, ManagedWindow},
};

/// Horizontal gap between a chat window and its emoji picker.
const EMOJI_PICKER_GAP: i32 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DesktopError {
    #[error("window not found")]
    WindowNotFound,
    #[error("desktop snapshot is corrupt: {0}")]
    CorruptSnapshot(String),
    #[error("window is not a chat window")]
    NotAChatWindow,
    #[error("window is not an emoji picker")]
    NotAnEmojiPicker,
    #[error(transparent)]
    Chat(#[from] ChatError),
}

/// What a scheduled timer does when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerToken {
    ChatReconnect {
        window_id: WindowId,
        after: ConnectionId,
    },
    PopupTick(WindowId),
    PopupFade(WindowId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEffect {
    /// Persist the current desktop snapshot.
    PersistLayout,
    PersistChatCache {
        channel: String,
        messages: Vec<ChatMessage>,
    },
    /// Load a channel's cache and hand it back through [`Coordinator::chat_cache_loaded`].
    LoadChatCache {
        window_id: WindowId,
        channel: String,
    },
    PersistIdentity(String),
    OpenConnection {
        connection: ConnectionId,
        channel: String,
    },
    Transmit {
        connection: ConnectionId,
        frame: String,
    },
    CloseConnection(ConnectionId),
    ScheduleTimer {
        token: TimerToken,
        delay: Duration,
    },
    CancelTimer(TimerToken),
}

pub struct Coordinator {
    config: DesktopConfig,
    viewport: Viewport,
    windows: Vec<ManagedWindow>,
    currently_dragging: Option<WindowId>,
    taskbar: Vec<WindowId>,
    identity: Rc<dyn IdentityProvider>,
    rng: StdRng,
    next_connection: u64,
    effects: Vec<RuntimeEffect>,
    persist_suppressed: bool,
    persist_deferred: bool,
}

impl Coordinator {
    pub fn new(config: DesktopConfig, identity: Rc<dyn IdentityProvider>) -> Self {
        Self::with_rng(config, identity, StdRng::from_os_rng())
    }

    /// Coordinator with deterministic window placement.
    pub fn with_seed(config: DesktopConfig, identity: Rc<dyn IdentityProvider>, seed: u64) -> Self {
        Self::with_rng(config, identity, StdRng::seed_from_u64(seed))
    }

    pub(crate) fn with_rng(
        config: DesktopConfig,
        identity: Rc<dyn IdentityProvider>,
        rng: StdRng,
    ) -> Self {
        Self {
            config,
            viewport: Viewport::default(),
            windows: Vec::new(),
            currently_dragging: None,
            taskbar: Vec::new(),
            identity,
            rng,
            next_connection: 0,
            effects: Vec::new(),
            persist_suppressed: false,
            persist_deferred: false,
        }
    }

    pub fn config(&self) -> &DesktopConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Windows bottom to top.
    pub fn windows(&self) -> &[ManagedWindow] {
        &self.windows
    }

    pub fn window(&self, window_id: &WindowId) -> Option<&ManagedWindow> {
        self.windows.iter().find(|w| w.id() == window_id)
    }

    pub fn chat(&self, window_id: &WindowId) -> Option<&ChatSession> {
        self.window(window_id).and_then(|w| w.pane.as_chat())
    }

    pub fn currently_dragging(&self) -> Option<&WindowId> {
        self.currently_dragging.as_ref()
    }

    pub fn username(&self) -> String {
        self.identity.username()
    }

    /// Takes every queued effect, oldest first.
    pub fn drain_effects(&mut self) -> Vec<RuntimeEffect> {
        std::mem::take(&mut self.effects)
    }

    fn index_of(&self, window_id: &WindowId) -> Option<usize> {
        self.windows.iter().position(|w| w.id() == window_id)
    }

    fn entity_mut(&mut self, window_id: &WindowId) -> Result<&mut WindowEntity, DesktopError> {
        self.windows
            .iter_mut()
            .find(|w| w.id() == window_id)
            .map(|w| &mut w.entity)
            .ok_or(DesktopError::WindowNotFound)
    }

    fn chat_mut(&mut self, window_id: &WindowId) -> Result<&mut ChatSession, DesktopError> {
        let window = self
            .windows
            .iter_mut()
            .find(|w| w.id() == window_id)
            .ok_or(DesktopError::WindowNotFound)?;
        window.pane.as_chat_mut().ok_or(DesktopError::NotAChatWindow)
    }

    fn allocate_connection(&mut self) -> ConnectionId {
        self.next_connection += 1;
        ConnectionId(self.next_connection)
    }

    fn request_persist(&mut self) {
        if self.persist_suppressed {
            self.persist_deferred = true;
        } else {
            self.effects.push(RuntimeEffect::PersistLayout);
        }
    }

    /// Queues a layout write.
    pub fn save_state(&mut self) {
        self.request_persist();
    }

    /// Creates a window through the pane factory and puts it on top.
    ///
    /// A request carrying an id that is already open returns that window unchanged.
    pub fn create_window(&mut self, request: WindowConfig) -> WindowId {
        let id = request.id.clone().unwrap_or_else(WindowId::generate);
        if self.index_of(&id).is_some() {
            tracing::warn!(window_id = %id, "duplicate window id; keeping the existing window");
            return id;
        }

        let kind = request.kind;
        let pane = Pane::build(&request, &self.config);
        let title = pane
            .managed_title()
            .or_else(|| request.title.clone())
            .unwrap_or_else(|| kind.default_title().to_string());
        let floor = self.config.size_floor();
        let mut entity = match &request.saved {
            Some(saved) => WindowEntity::from_snapshot(saved, floor, self.viewport),
            None => {
                let (w, h) = request.size.unwrap_or_else(|| kind.default_size());
                let (w, h) = floor.apply(w, h);
                let (x, y) = request
                    .position
                    .unwrap_or_else(|| random_origin(&mut self.rng, w, h, self.viewport));
                WindowEntity::new(id.clone(), "", WindowRect::new(x, y, w, h), floor, self.viewport)
            }
        };
        entity.set_title(title);

        self.windows.push(ManagedWindow { entity, pane });
        if kind.pinned() {
            self.taskbar.push(id.clone());
        }
        normalize_window_stack(&mut self.windows, self.config.z_index_base);
        tracing::debug!(window_id = %id, kind = kind.tag(), "window created");

        self.start_pane(&id);
        self.request_persist();
        id
    }

    /// Opens a fresh window of `kind` with default settings.
    pub fn open_window(&mut self, kind: PaneKind) -> WindowId {
        self.create_window(WindowConfig::new(kind))
    }

    fn start_pane(&mut self, window_id: &WindowId) {
        let Some(index) = self.index_of(window_id) else {
            return;
        };
        let window = &mut self.windows[index];
        let minimized = window.entity.minimized();
        match &mut window.pane {
            Pane::Chat(_) => {
                let connection = self.allocate_connection();
                let Ok(session) = self.chat_mut(window_id) else {
                    return;
                };
                let effects = session.start(connection);
                self.apply_chat_effects(window_id, effects);
            }
            Pane::Popup(popup) if popup.is_fading() => {
                self.effects.push(RuntimeEffect::ScheduleTimer {
                    token: TimerToken::PopupFade(window_id.clone()),
                    delay: self.config.popup.fade(),
                });
            }
            Pane::Popup(popup) if minimized => popup.pause(),
            Pane::Popup(popup) if popup.is_counting() => {
                self.effects.push(RuntimeEffect::ScheduleTimer {
                    token: TimerToken::PopupTick(window_id.clone()),
                    delay: self.config.popup.tick(),
                });
            }
            Pane::Popup(_) | Pane::Window { .. } | Pane::EmojiPicker(_) => {}
        }
    }

    /// Holds a popup's countdown while it is minimized and picks it back up on restore.
    fn hold_popup(&mut self, window_id: &WindowId, minimized: bool) {
        let Some(popup) = self
            .windows
            .iter_mut()
            .find(|w| w.id() == window_id)
            .and_then(|w| w.pane.as_popup_mut())
        else {
            return;
        };
        let token = TimerToken::PopupTick(window_id.clone());
        if minimized && popup.is_counting() {
            popup.pause();
            self.effects.push(RuntimeEffect::CancelTimer(token));
        } else if !minimized && popup.is_paused() {
            popup.resume();
            self.effects.push(RuntimeEffect::ScheduleTimer {
                token,
                delay: self.config.popup.tick(),
            });
        }
    }

    /// Detaches and tears down a window. Closing a chat also closes its emoji picker.
    ///
    /// Returns `false` when the window is not tracked.
    pub fn remove_window(&mut self, window_id: &WindowId) -> bool {
        let Some(index) = self.index_of(window_id) else {
            return false;
        };
        let mut window = self.windows.remove(index);
        if self.currently_dragging.as_ref() == Some(window_id) {
            self.currently_dragging = None;
        }
        self.taskbar.retain(|id| id != window_id);

        match &mut window.pane {
            Pane::Chat(session) => {
                let effects = session.destroy();
                self.apply_chat_effects(window_id, effects);
            }
            Pane::Popup(_) => {
                self.effects.push(RuntimeEffect::CancelTimer(TimerToken::PopupTick(
                    window_id.clone(),
                )));
                self.effects.push(RuntimeEffect::CancelTimer(TimerToken::PopupFade(
                    window_id.clone(),
                )));
            }
            Pane::Window { .. } | Pane::EmojiPicker(_) => {}
        }

        normalize_window_stack(&mut self.windows, self.config.z_index_base);
        tracing::debug!(window_id = %window_id, "window removed");
        self.request_persist();

        if window.kind() == PaneKind::Chat {
            self.remove_window(&WindowId::emoji_picker_for(window_id));
        }
        true
    }

    /// Raises a window to the top of the stack.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::WindowNotFound`] for an unknown id.
    pub fn bring_to_front(&mut self, window_id: &WindowId) -> Result<(), DesktopError> {
        if self.index_of(window_id).is_none() {
            return Err(DesktopError::WindowNotFound);
        }
        if raise_window(&mut self.windows, window_id, self.config.z_index_base) {
            self.request_persist();
        }
        Ok(())
    }

    fn handle_window_event(&mut self, window_id: &WindowId, event: WindowEvent) {
        match event {
            WindowEvent::Close => {
                self.remove_window(window_id);
            }
            WindowEvent::Focus => {
                if raise_window(&mut self.windows, window_id, self.config.z_index_base) {
                    self.request_persist();
                }
            }
            WindowEvent::DragStarted | WindowEvent::ResizeStarted => {
                self.currently_dragging = Some(window_id.clone());
                if raise_window(&mut self.windows, window_id, self.config.z_index_base) {
                    self.request_persist();
                }
            }
            WindowEvent::MinimizeChanged { minimized } => {
                self.hold_popup(window_id, minimized);
                self.request_persist();
            }
            WindowEvent::GeometryChanged(_) | WindowEvent::InteractionEnded => {
                self.request_persist();
            }
        }
    }

    /// Pointer pressed on a title bar. Ignored while another window is being manipulated.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::WindowNotFound`] for an unknown id.
    pub fn pointer_down_title(
        &mut self,
        window_id: &WindowId,
        pointer: PointerPosition,
    ) -> Result<(), DesktopError> {
        if self.currently_dragging.is_some() {
            return Ok(());
        }
        if let Some(event) = self.entity_mut(window_id)?.start_drag(pointer) {
            self.handle_window_event(window_id, event);
        }
        Ok(())
    }

    /// Pointer pressed on a resize handle.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::WindowNotFound`] for an unknown id.
    pub fn pointer_down_resize(
        &mut self,
        window_id: &WindowId,
        edge: ResizeEdge,
        pointer: PointerPosition,
    ) -> Result<(), DesktopError> {
        if self.currently_dragging.is_some() {
            return Ok(());
        }
        if let Some(event) = self.entity_mut(window_id)?.start_resize(edge, pointer) {
            self.handle_window_event(window_id, event);
        }
        Ok(())
    }

    /// Forwards pointer travel to the window being manipulated, if any.
    pub fn pointer_move(&mut self, pointer: PointerPosition) {
        let Some(window_id) = self.currently_dragging.clone() else {
            return;
        };
        let viewport = self.viewport;
        let event = match self.entity_mut(&window_id) {
            Ok(entity) => entity.pointer_move(pointer, viewport),
            Err(_) => None,
        };
        if let Some(event) = event {
            self.handle_window_event(&window_id, event);
        }
    }

    /// Ends the active interaction and clears the drag target.
    pub fn pointer_up(&mut self) {
        let Some(window_id) = self.currently_dragging.take() else {
            return;
        };
        let event = match self.entity_mut(&window_id) {
            Ok(entity) => entity.end_interaction(),
            Err(_) => None,
        };
        if let Some(event) = event {
            self.handle_window_event(&window_id, event);
        }
    }

    /// Pointer pressed anywhere on a window body.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::WindowNotFound`] for an unknown id.
    pub fn click(&mut self, window_id: &WindowId) -> Result<(), DesktopError> {
        let event = self.entity_mut(window_id)?.focus();
        self.handle_window_event(window_id, event);
        Ok(())
    }

    /// Close button.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::WindowNotFound`] for an unknown id.
    pub fn close(&mut self, window_id: &WindowId) -> Result<(), DesktopError> {
        let event = self.entity_mut(window_id)?.request_close();
        self.handle_window_event(window_id, event);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DesktopError::WindowNotFound`] for an unknown id.
    pub fn toggle_minimize(&mut self, window_id: &WindowId) -> Result<(), DesktopError> {
        let event = self.entity_mut(window_id)?.toggle_minimize();
        self.handle_window_event(window_id, event);
        Ok(())
    }

    /// Re-clamps every window into the new viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let moved = self
            .windows
            .iter_mut()
            .filter_map(|w| w.entity.fit_viewport(viewport))
            .count();
        if moved > 0 {
            self.request_persist();
        }
    }

    /// Pinned windows in pin order.
    pub fn taskbar_entries(&self) -> Vec<TaskbarEntry> {
        self.taskbar
            .iter()
            .filter_map(|id| self.window(id))
            .map(|w| TaskbarEntry {
                window_id: w.id().clone(),
                title: w.entity.title().to_string(),
                minimized: w.entity.minimized(),
            })
            .collect()
    }

    /// Taskbar click: toggles the window's minimized state.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::WindowNotFound`] when the window is not pinned.
    pub fn activate_taskbar_entry(&mut self, window_id: &WindowId) -> Result<(), DesktopError> {
        if !self.taskbar.contains(window_id) {
            return Err(DesktopError::WindowNotFound);
        }
        self.toggle_minimize(window_id)
    }

    /// Every window bottom to top with its kind payload.
    pub fn snapshot(&self) -> DesktopSnapshot {
        DesktopSnapshot {
            windows: self.windows.iter().map(ManagedWindow::snapshot).collect(),
        }
    }

    /// Restores a serialized desktop.
    ///
    /// # Errors
    ///
    /// Returns [`DesktopError::CorruptSnapshot`] when `blob` does not parse. Nothing is created.
    pub fn restore_state(&mut self, blob: &str) -> Result<usize, DesktopError> {
        let snapshot = serde_json::from_str::<DesktopSnapshot>(blob).map_err(|err| {
            tracing::error!("restore desktop snapshot failed: {err}");
            DesktopError::CorruptSnapshot(err.to_string())
        })?;
        Ok(self.restore_snapshot(snapshot))
    }

    /// Recreates windows in saved collection order (bottom to top) with one layout write at
    /// the end. Stored z-index values are not consulted; the stack is renumbered.
    ///
    /// Returns the number of windows actually created.
    pub fn restore_snapshot(&mut self, snapshot: DesktopSnapshot) -> usize {
        let saved = snapshot.windows;
        let chats = saved
            .iter()
            .filter(|w| w.kind == PaneKind::Chat)
            .map(|w| w.id.clone())
            .collect::<HashSet<_>>();

        self.persist_suppressed = true;
        let mut restored = 0;
        for window in saved {
            if window.kind == PaneKind::EmojiPicker
                && !window.id.paired_chat().is_some_and(|chat| chats.contains(&chat))
            {
                tracing::warn!(window_id = %window.id, "skipping emoji picker without its chat");
                continue;
            }
            let before = self.windows.len();
            self.create_window(WindowConfig::from_snapshot(window));
            if self.windows.len() > before {
                restored += 1;
            }
        }
        self.persist_suppressed = false;
        if std::mem::take(&mut self.persist_deferred) {
            self.effects.push(RuntimeEffect::PersistLayout);
        }
        restored
    }

    fn chat_window_for(&self, connection: ConnectionId) -> Option<WindowId> {
        self.windows
            .iter()
            .find(|w| {
                w.pane
                    .as_chat()
                    .is_some_and(|session| session.connection() == Some(connection))
            })
            .map(|w| w.id().clone())
    }

    fn apply_chat_effects(&mut self, window_id: &WindowId, effects: Vec<ChatEffect>) {
        for effect in effects {
            match effect {
                ChatEffect::Open {
                    connection,
                    channel,
                } => {
                    tracing::debug!(%connection, %channel, "chat connecting");
                    self.effects.push(RuntimeEffect::OpenConnection {
                        connection,
                        channel,
                    });
                }
                ChatEffect::Transmit { connection, frame } => {
                    self.effects
                        .push(RuntimeEffect::Transmit { connection, frame });
                }
                ChatEffect::Close { connection } => {
                    self.effects.push(RuntimeEffect::CloseConnection(connection));
                }
                ChatEffect::ScheduleReconnect { after, delay } => {
                    tracing::debug!(%after, ?delay, "chat reconnect scheduled");
                    self.effects.push(RuntimeEffect::ScheduleTimer {
                        token: TimerToken::ChatReconnect {
                            window_id: window_id.clone(),
                            after,
                        },
                        delay,
                    });
                }
                ChatEffect::CancelReconnect { after } => {
                    self.effects
                        .push(RuntimeEffect::CancelTimer(TimerToken::ChatReconnect {
                            window_id: window_id.clone(),
                            after,
                        }));
                }
                ChatEffect::ReconnectNow { after } => {
                    self.effects
                        .push(RuntimeEffect::CancelTimer(TimerToken::ChatReconnect {
                            window_id: window_id.clone(),
                            after,
                        }));
                    self.reconnect(window_id, after);
                }
                ChatEffect::LoadCache { channel } => {
                    self.effects.push(RuntimeEffect::LoadChatCache {
                        window_id: window_id.clone(),
                        channel,
                    });
                }
                ChatEffect::PersistCache { channel, messages } => {
                    self.effects
                        .push(RuntimeEffect::PersistChatCache { channel, messages });
                }
            }
        }
    }

    fn reconnect(&mut self, window_id: &WindowId, after: ConnectionId) {
        let fresh = self.allocate_connection();
        let Ok(session) = self.chat_mut(window_id) else {
            return;
        };
        let effects = session.reconnect_due(after, fresh);
        self.apply_chat_effects(window_id, effects);
    }

    /// The transport finished opening `connection`.
    pub fn transport_opened(&mut self, connection: ConnectionId) {
        let Some(window_id) = self.chat_window_for(connection) else {
            tracing::debug!(%connection, "open for unknown chat connection ignored");
            return;
        };
        if let Ok(session) = self.chat_mut(&window_id) {
            let effects = session.on_open(connection);
            self.apply_chat_effects(&window_id, effects);
        }
    }

    /// A text frame arrived on `connection`. Malformed frames are logged and dropped.
    pub fn frame_received(&mut self, connection: ConnectionId, raw: &str) {
        let Some(window_id) = self.chat_window_for(connection) else {
            return;
        };
        let Ok(session) = self.chat_mut(&window_id) else {
            return;
        };
        match session.on_frame(connection, raw) {
            Ok(effects) => self.apply_chat_effects(&window_id, effects),
            Err(err) => tracing::warn!(%connection, "{err}"),
        }
    }

    /// `connection` closed or failed to open.
    pub fn transport_closed(&mut self, connection: ConnectionId) {
        let Some(window_id) = self.chat_window_for(connection) else {
            tracing::debug!(%connection, "close for unknown chat connection ignored");
            return;
        };
        if let Ok(session) = self.chat_mut(&window_id) {
            let effects = session.on_close(connection);
            self.apply_chat_effects(&window_id, effects);
        }
    }

    /// Cached history for `channel` finished loading.
    pub fn chat_cache_loaded(
        &mut self,
        window_id: &WindowId,
        channel: &str,
        messages: Vec<ChatMessage>,
    ) {
        if let Ok(session) = self.chat_mut(window_id) {
            session.apply_cache(channel, messages);
        }
    }

    /// Sends `text` from the chat window as the current user.
    ///
    /// # Errors
    ///
    /// [`DesktopError::WindowNotFound`], [`DesktopError::NotAChatWindow`], or
    /// [`DesktopError::Chat`] when the frame cannot be encoded.
    pub fn chat_send(&mut self, window_id: &WindowId, text: &str) -> Result<(), DesktopError> {
        let username = self.identity.username();
        let effects = self.chat_mut(window_id)?.send(text, &username)?;
        self.apply_chat_effects(window_id, effects);
        Ok(())
    }

    /// Sends the chat window's input buffer.
    ///
    /// # Errors
    ///
    /// See [`Coordinator::chat_send`].
    pub fn chat_send_input(&mut self, window_id: &WindowId) -> Result<(), DesktopError> {
        let username = self.identity.username();
        let effects = self.chat_mut(window_id)?.send_input(&username)?;
        self.apply_chat_effects(window_id, effects);
        Ok(())
    }

    /// # Errors
    ///
    /// [`DesktopError::WindowNotFound`] or [`DesktopError::NotAChatWindow`].
    pub fn chat_set_input(&mut self, window_id: &WindowId, text: &str) -> Result<(), DesktopError> {
        self.chat_mut(window_id)?.set_input(text);
        Ok(())
    }

    /// Moves a chat window to another channel.
    ///
    /// # Errors
    ///
    /// [`DesktopError::WindowNotFound`] or [`DesktopError::NotAChatWindow`].
    pub fn switch_channel(&mut self, window_id: &WindowId, channel: &str) -> Result<(), DesktopError> {
        let fresh = self.allocate_connection();
        let session = self.chat_mut(window_id)?;
        let effects = session.switch_channel(channel, fresh);
        if effects.is_empty() {
            return Ok(());
        }
        let title = session.title();
        self.apply_chat_effects(window_id, effects);
        self.entity_mut(window_id)?.set_title(title);
        self.request_persist();
        Ok(())
    }

    /// Renames the local user and rewrites authorship in every open chat.
    pub fn change_username(&mut self, username: &str) {
        let username = username.trim();
        let previous = self.identity.username();
        if username.is_empty() || username == previous {
            return;
        }
        self.identity.set_username(username);
        self.effects
            .push(RuntimeEffect::PersistIdentity(username.to_string()));

        let chats = self
            .windows
            .iter()
            .filter(|w| w.kind() == PaneKind::Chat)
            .map(|w| w.id().clone())
            .collect::<Vec<_>>();
        for window_id in chats {
            if let Ok(session) = self.chat_mut(&window_id) {
                let effects = session.rename_user(&previous, username);
                self.apply_chat_effects(&window_id, effects);
            }
        }
    }

    /// Opens the chat's emoji picker beside it, or closes it when already open.
    ///
    /// Returns the picker id when one was opened.
    ///
    /// # Errors
    ///
    /// [`DesktopError::WindowNotFound`] or [`DesktopError::NotAChatWindow`].
    pub fn toggle_emojis(&mut self, chat_id: &WindowId) -> Result<Option<WindowId>, DesktopError> {
        let chat = self.window(chat_id).ok_or(DesktopError::WindowNotFound)?;
        if chat.kind() != PaneKind::Chat {
            return Err(DesktopError::NotAChatWindow);
        }
        let rect = chat.entity.rect();
        let picker_id = WindowId::emoji_picker_for(chat_id);
        if self.remove_window(&picker_id) {
            return Ok(None);
        }
        self.create_window(
            WindowConfig::new(PaneKind::EmojiPicker)
                .with_id(picker_id.clone())
                .with_position(rect.right().saturating_add(EMOJI_PICKER_GAP), rect.y),
        );
        Ok(Some(picker_id))
    }

    /// Filters the picker's categories.
    ///
    /// # Errors
    ///
    /// [`DesktopError::WindowNotFound`] or [`DesktopError::NotAnEmojiPicker`].
    pub fn set_emoji_query(&mut self, picker_id: &WindowId, query: &str) -> Result<(), DesktopError> {
        let window = self
            .windows
            .iter_mut()
            .find(|w| w.id() == picker_id)
            .ok_or(DesktopError::WindowNotFound)?;
        window
            .pane
            .as_emoji_picker_mut()
            .ok_or(DesktopError::NotAnEmojiPicker)?
            .set_query(query);
        Ok(())
    }

    /// Inserts `emoji` into the paired chat's input at its cursor. Unknown emojis are ignored.
    ///
    /// # Errors
    ///
    /// [`DesktopError::WindowNotFound`] when the picker or its chat is gone,
    /// [`DesktopError::NotAnEmojiPicker`] for other windows.
    pub fn select_emoji(&mut self, picker_id: &WindowId, emoji: &str) -> Result<(), DesktopError> {
        let window = self
            .windows
            .iter_mut()
            .find(|w| w.id() == picker_id)
            .ok_or(DesktopError::WindowNotFound)?;
        let picker = window
            .pane
            .as_emoji_picker_mut()
            .ok_or(DesktopError::NotAnEmojiPicker)?;
        let Some(emoji) = picker.select(emoji) else {
            return Ok(());
        };
        let chat_id = picker_id.paired_chat().ok_or(DesktopError::WindowNotFound)?;
        self.chat_mut(&chat_id)?.insert_at_cursor(emoji);
        Ok(())
    }

    /// A scheduled timer fired.
    pub fn timer_fired(&mut self, token: TimerToken) {
        match token {
            TimerToken::ChatReconnect { window_id, after } => self.reconnect(&window_id, after),
            TimerToken::PopupTick(window_id) => self.popup_tick(&window_id),
            TimerToken::PopupFade(window_id) => {
                self.remove_window(&window_id);
            }
        }
    }

    fn popup_tick(&mut self, window_id: &WindowId) {
        let tick = self.config.popup.tick();
        let fade = self.config.popup.fade();
        let Some(index) = self.index_of(window_id) else {
            return;
        };
        let window = &mut self.windows[index];
        let Some(popup) = window.pane.as_popup_mut() else {
            return;
        };
        let events = popup.advance(tick);
        let title = popup.title();
        let counting = popup.is_counting();
        let title_changed = window.entity.title() != title;
        if title_changed {
            window.entity.set_title(title);
        }

        if events.contains(&TimerEvent::Completed) {
            self.effects.push(RuntimeEffect::ScheduleTimer {
                token: TimerToken::PopupFade(window_id.clone()),
                delay: fade,
            });
        } else if counting {
            self.effects.push(RuntimeEffect::ScheduleTimer {
                token: TimerToken::PopupTick(window_id.clone()),
                delay: tick,
            });
        }
        if title_changed {
            self.request_persist();
        }
    }
}

#[cfg(test)]
mod tests {
    use platform_host::MemoryIdentity;
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    use super::*;

    fn coordinator() -> Coordinator {
        Coordinator::with_seed(
            DesktopConfig::default(),
            Rc::new(MemoryIdentity::new("ada")),
            7,
        )
    }

    fn plain(x: i32, y: i32, w: i32, h: i32) -> WindowConfig {
        WindowConfig::new(PaneKind::Window)
            .with_position(x, y)
            .with_size(w, h)
    }

    fn z_order(desk: &Coordinator) -> Vec<(String, i32)> {
        desk.windows()
            .iter()
            .map(|w| (w.id().to_string(), w.entity().z_index()))
            .collect()
    }

    fn persist_count(effects: &[RuntimeEffect]) -> usize {
        effects
            .iter()
            .filter(|e| **e == RuntimeEffect::PersistLayout)
            .count()
    }

    #[test]
    fn creation_and_focus_assign_increasing_z() {
        let mut desk = coordinator();
        let a = desk.create_window(plain(0, 0, 300, 200).with_id(WindowId::new("a")));
        let b = desk.create_window(plain(0, 0, 300, 200).with_id(WindowId::new("b")));
        let c = desk.create_window(plain(0, 0, 300, 200).with_id(WindowId::new("c")));
        assert_eq!(
            z_order(&desk),
            vec![
                ("a".to_string(), 1000),
                ("b".to_string(), 1001),
                ("c".to_string(), 1002)
            ]
        );
        desk.click(&a).expect("click");
        assert_eq!(
            z_order(&desk),
            vec![
                ("b".to_string(), 1000),
                ("c".to_string(), 1001),
                ("a".to_string(), 1002)
            ]
        );
        assert_eq!((b.as_str(), c.as_str()), ("b", "c"));
    }

    #[test]
    #[traced_test]
    fn duplicate_id_returns_existing_window() {
        let mut desk = coordinator();
        let id = desk.create_window(plain(10, 10, 300, 200).with_id(WindowId::new("dup")));
        desk.drain_effects();
        let again = desk.create_window(plain(500, 500, 400, 400).with_id(WindowId::new("dup")));
        assert_eq!(again, id);
        assert_eq!(desk.windows().len(), 1);
        assert_eq!(desk.windows()[0].entity().rect(), WindowRect::new(10, 10, 300, 200));
        assert_eq!(desk.drain_effects(), Vec::new());
        assert!(logs_contain("duplicate window id"));
    }

    #[test]
    fn fresh_windows_land_inside_the_viewport() {
        let mut desk = coordinator();
        for kind in [PaneKind::Window, PaneKind::Chat, PaneKind::Popup] {
            let id = desk.open_window(kind);
            let rect = desk.window(&id).expect("window").entity().rect();
            assert!(rect.x >= 0 && rect.right() <= desk.viewport().width, "{rect:?}");
            assert!(rect.y >= 0, "{rect:?}");
            assert_eq!((rect.w, rect.h), kind.default_size());
        }
    }

    #[test]
    fn drag_routes_through_the_current_target() {
        let mut desk = coordinator();
        let id = desk.create_window(plain(50, 50, 300, 200));
        let other = desk.create_window(plain(400, 300, 300, 200));
        desk.drain_effects();

        desk.pointer_down_title(&id, PointerPosition::new(100, 100))
            .expect("down");
        assert_eq!(desk.currently_dragging(), Some(&id));
        assert_eq!(desk.windows().last().map(ManagedWindow::id), Some(&id));

        desk.pointer_down_title(&other, PointerPosition::new(0, 0))
            .expect("second down");
        desk.pointer_move(PointerPosition::new(120, 80));
        desk.pointer_up();

        assert_eq!(desk.currently_dragging(), None);
        assert_eq!(
            desk.window(&id).expect("window").entity().rect(),
            WindowRect::new(70, 30, 300, 200)
        );
        assert_eq!(
            desk.window(&other).expect("window").entity().rect(),
            WindowRect::new(400, 300, 300, 200)
        );
        assert_eq!(persist_count(&desk.drain_effects()), 3);

        desk.pointer_move(PointerPosition::new(500, 500));
        assert_eq!(desk.drain_effects(), Vec::new());
    }

    #[test]
    fn resize_from_top_left_keeps_opposite_edge() {
        let mut desk = coordinator();
        let id = desk.create_window(plain(50, 50, 300, 200));
        desk.pointer_down_resize(&id, ResizeEdge::NorthWest, PointerPosition::new(50, 50))
            .expect("down");
        desk.pointer_move(PointerPosition::new(30, 40));
        desk.pointer_up();
        assert_eq!(
            desk.window(&id).expect("window").entity().rect(),
            WindowRect::new(30, 40, 320, 210)
        );
    }

    #[test]
    fn minimize_and_taskbar_pins() {
        let mut desk = coordinator();
        let id = desk.create_window(plain(0, 0, 300, 200).with_title("Notes"));
        desk.activate_taskbar_entry(&id).expect("activate");
        assert_eq!(
            desk.taskbar_entries(),
            vec![TaskbarEntry {
                window_id: id.clone(),
                title: "Notes".to_string(),
                minimized: true,
            }]
        );
        desk.toggle_minimize(&id).expect("toggle");
        assert!(!desk.window(&id).expect("window").entity().minimized());

        desk.close(&id).expect("close");
        assert_eq!(desk.taskbar_entries(), Vec::new());
        assert_eq!(
            desk.activate_taskbar_entry(&id),
            Err(DesktopError::WindowNotFound)
        );
    }

    #[test]
    fn remove_is_a_no_op_for_unknown_windows() {
        let mut desk = coordinator();
        desk.create_window(plain(0, 0, 300, 200));
        desk.drain_effects();
        assert!(!desk.remove_window(&WindowId::new("ghost")));
        assert_eq!(desk.drain_effects(), Vec::new());
        assert_eq!(
            desk.bring_to_front(&WindowId::new("ghost")),
            Err(DesktopError::WindowNotFound)
        );
    }

    #[test]
    fn shrinking_viewport_reclamps_windows() {
        let mut desk = coordinator();
        let id = desk.create_window(plain(900, 500, 300, 200));
        desk.drain_effects();
        desk.set_viewport(Viewport::new(800, 600));
        assert_eq!(
            desk.window(&id).expect("window").entity().rect(),
            WindowRect::new(500, 400, 300, 200)
        );
        assert_eq!(desk.drain_effects(), vec![RuntimeEffect::PersistLayout]);
        desk.set_viewport(Viewport::new(800, 600));
        assert_eq!(desk.drain_effects(), Vec::new());
    }

    #[test]
    fn snapshot_round_trips_through_restore() {
        let mut desk = coordinator();
        let a = desk.create_window(plain(10, 20, 300, 200).with_content("hello"));
        let chat = desk.create_window(
            WindowConfig::new(PaneKind::Chat)
                .with_position(100, 0)
                .with_channel("random"),
        );
        desk.open_window(PaneKind::Popup);
        desk.toggle_emojis(&chat).expect("emojis");
        desk.toggle_minimize(&a).expect("minimize");
        desk.click(&a).expect("focus");
        let snapshot = desk.snapshot();
        let blob = serde_json::to_string(&snapshot).expect("serialize");

        let mut restored = coordinator();
        assert_eq!(restored.restore_state(&blob), Ok(4));
        assert_eq!(restored.snapshot(), snapshot);
        assert_eq!(persist_count(&restored.drain_effects()), 1);
    }

    #[test]
    #[traced_test]
    fn corrupt_snapshot_leaves_desktop_empty() {
        let mut desk = coordinator();
        assert!(matches!(
            desk.restore_state("{not json"),
            Err(DesktopError::CorruptSnapshot(_))
        ));
        assert!(desk.windows().is_empty());
        assert_eq!(desk.drain_effects(), Vec::new());
        assert!(logs_contain("restore desktop snapshot failed"));
    }

    #[test]
    fn emoji_picker_opens_beside_chat_and_feeds_its_input() {
        let mut desk = coordinator();
        let chat = desk.create_window(WindowConfig::new(PaneKind::Chat).with_position(100, 20));
        let picker = desk
            .toggle_emojis(&chat)
            .expect("toggle")
            .expect("picker opened");
        let rect = desk.window(&picker).expect("picker").entity().rect();
        assert_eq!((rect.x, rect.y), (460, 20));
        assert!(desk.taskbar_entries().iter().all(|e| e.window_id != picker));

        desk.chat_set_input(&chat, "hi ").expect("input");
        desk.select_emoji(&picker, "👍").expect("select");
        assert_eq!(desk.chat(&chat).map(ChatSession::input), Some("hi 👍"));

        assert_eq!(desk.toggle_emojis(&chat), Ok(None));
        assert!(desk.window(&picker).is_none());
    }

    #[test]
    fn closing_chat_closes_picker_and_session() {
        let mut desk = coordinator();
        let chat = desk.open_window(PaneKind::Chat);
        let picker = desk.toggle_emojis(&chat).expect("toggle").expect("picker");
        let connection = desk.chat(&chat).and_then(ChatSession::connection).expect("conn");
        desk.drain_effects();

        desk.close(&chat).expect("close");
        assert!(desk.window(&picker).is_none());
        let effects = desk.drain_effects();
        assert!(effects.contains(&RuntimeEffect::CloseConnection(connection)));
    }

    #[test]
    fn chat_operations_reject_other_kinds() {
        let mut desk = coordinator();
        let id = desk.create_window(plain(0, 0, 300, 200));
        assert_eq!(desk.chat_send(&id, "hi"), Err(DesktopError::NotAChatWindow));
        assert_eq!(desk.toggle_emojis(&id), Err(DesktopError::NotAChatWindow));
        assert_eq!(
            desk.select_emoji(&id, "👍"),
            Err(DesktopError::NotAnEmojiPicker)
        );
        assert_eq!(
            desk.chat_send(&WindowId::new("ghost"), "hi"),
            Err(DesktopError::WindowNotFound)
        );
    }

    #[test]
    fn username_change_persists_identity_and_rewrites_logs() {
        let mut desk = coordinator();
        let chat = desk.open_window(PaneKind::Chat);
        let connection = desk.chat(&chat).and_then(ChatSession::connection).expect("conn");
        desk.transport_opened(connection);
        desk.frame_received(
            connection,
            r#"{"type":"message","username":"ada","data":"hi","channel":"general"}"#,
        );
        desk.drain_effects();

        desk.change_username("grace");
        assert_eq!(desk.username(), "grace");
        let effects = desk.drain_effects();
        assert_eq!(
            effects[0],
            RuntimeEffect::PersistIdentity("grace".to_string())
        );
        assert!(matches!(
            &effects[1],
            RuntimeEffect::PersistChatCache { messages, .. } if messages[0].username == "grace"
        ));

        desk.change_username("  ");
        assert_eq!(desk.drain_effects(), Vec::new());
    }

    #[test]
    fn channel_switch_updates_title_and_connection() {
        let mut desk = coordinator();
        let chat = desk.open_window(PaneKind::Chat);
        let old = desk.chat(&chat).and_then(ChatSession::connection).expect("conn");
        desk.drain_effects();

        desk.switch_channel(&chat, "random").expect("switch");
        let window = desk.window(&chat).expect("chat");
        assert_eq!(window.entity().title(), "Chat - random");
        let effects = desk.drain_effects();
        assert_eq!(effects[0], RuntimeEffect::CloseConnection(old));
        assert!(effects.contains(&RuntimeEffect::LoadChatCache {
            window_id: chat.clone(),
            channel: "random".to_string()
        }));
        assert!(effects.contains(&RuntimeEffect::PersistLayout));

        desk.transport_closed(old);
        assert_eq!(desk.drain_effects(), Vec::new());
    }

    #[test]
    fn popup_counts_down_fades_and_closes() {
        let mut desk = coordinator();
        let popup = desk.create_window(WindowConfig::new(PaneKind::Popup).with_content("bye"));
        assert_eq!(
            desk.window(&popup).expect("popup").entity().title(),
            "Closing in 15s"
        );
        let effects = desk.drain_effects();
        assert!(effects.contains(&RuntimeEffect::ScheduleTimer {
            token: TimerToken::PopupTick(popup.clone()),
            delay: Duration::from_millis(100),
        }));

        for _ in 0..10 {
            desk.timer_fired(TimerToken::PopupTick(popup.clone()));
        }
        assert_eq!(
            desk.window(&popup).expect("popup").entity().title(),
            "Closing in 14s"
        );
        for _ in 0..140 {
            desk.timer_fired(TimerToken::PopupTick(popup.clone()));
        }
        let effects = desk.drain_effects();
        assert_eq!(
            effects
                .iter()
                .rev()
                .find(|e| matches!(e, RuntimeEffect::ScheduleTimer { .. })),
            Some(&RuntimeEffect::ScheduleTimer {
                token: TimerToken::PopupFade(popup.clone()),
                delay: Duration::from_millis(500),
            })
        );

        desk.timer_fired(TimerToken::PopupFade(popup.clone()));
        assert!(desk.window(&popup).is_none());
    }

    fn saved(id: &str, kind: PaneKind, z_index: i32) -> crate::model::WindowSnapshot {
        crate::model::WindowSnapshot {
            id: WindowId::new(id),
            kind,
            title: String::new(),
            content: String::new(),
            x: 0,
            y: 0,
            width: 300,
            height: 200,
            minimized: false,
            z_index,
            channel: None,
            remaining_secs: None,
        }
    }

    #[test]
    fn restore_replays_saved_order_and_ignores_stored_z() {
        let mut desk = coordinator();
        let restored = desk.restore_snapshot(DesktopSnapshot {
            windows: vec![
                saved("first", PaneKind::Window, 9),
                saved("second", PaneKind::Window, 1),
            ],
        });
        assert_eq!(restored, 2);
        assert_eq!(
            z_order(&desk),
            vec![("first".to_string(), 1000), ("second".to_string(), 1001)]
        );
    }

    #[test]
    fn restore_counts_only_windows_it_created() {
        let mut desk = coordinator();
        let restored = desk.restore_snapshot(DesktopSnapshot {
            windows: vec![
                saved("twin", PaneKind::Window, 0),
                saved("twin", PaneKind::Window, 1),
            ],
        });
        assert_eq!(restored, 1);
        assert_eq!(desk.windows().len(), 1);
    }

    #[test]
    fn popup_saved_after_its_countdown_fades_on_restore() {
        let mut desk = coordinator();
        let popup = crate::model::WindowSnapshot {
            remaining_secs: Some(0),
            ..saved("gone", PaneKind::Popup, 0)
        };
        desk.restore_snapshot(DesktopSnapshot {
            windows: vec![popup],
        });
        let id = WindowId::new("gone");
        let effects = desk.drain_effects();
        assert!(effects.contains(&RuntimeEffect::ScheduleTimer {
            token: TimerToken::PopupFade(id.clone()),
            delay: Duration::from_millis(500),
        }));
        assert!(!effects.iter().any(|e| matches!(
            e,
            RuntimeEffect::ScheduleTimer {
                token: TimerToken::PopupTick(_),
                ..
            }
        )));

        desk.timer_fired(TimerToken::PopupFade(id.clone()));
        assert!(desk.window(&id).is_none());
    }

    #[test]
    fn minimizing_a_popup_pauses_its_countdown() {
        let mut desk = coordinator();
        let popup = desk.create_window(WindowConfig::new(PaneKind::Popup));
        desk.drain_effects();

        desk.toggle_minimize(&popup).expect("minimize");
        assert!(desk
            .drain_effects()
            .contains(&RuntimeEffect::CancelTimer(TimerToken::PopupTick(popup.clone()))));
        for _ in 0..20 {
            desk.timer_fired(TimerToken::PopupTick(popup.clone()));
        }
        assert_eq!(
            desk.window(&popup).expect("popup").entity().title(),
            "Closing in 15s"
        );

        desk.toggle_minimize(&popup).expect("restore");
        assert!(desk.drain_effects().contains(&RuntimeEffect::ScheduleTimer {
            token: TimerToken::PopupTick(popup.clone()),
            delay: Duration::from_millis(100),
        }));
    }

    #[test]
    fn emoji_picker_beside_a_chat_at_the_far_edge_does_not_overflow() {
        let mut desk = coordinator();
        desk.set_viewport(Viewport::new(i32::MAX, 1000));
        let chat = desk.create_window(
            WindowConfig::new(PaneKind::Chat)
                .with_position(i32::MAX - 350, 0)
                .with_size(350, 700),
        );
        assert_eq!(desk.window(&chat).expect("chat").entity().rect().right(), i32::MAX);
        let picker = desk
            .toggle_emojis(&chat)
            .expect("toggle")
            .expect("picker opened");
        let rect = desk.window(&picker).expect("picker").entity().rect();
        assert_eq!(rect.right(), i32::MAX);
    }
}
