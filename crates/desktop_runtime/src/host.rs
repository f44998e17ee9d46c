//! Host-side runtime: owns the coordinator and the platform services it talks to.
//!
//! Every entry point applies one coordinator operation and then drains the effect queue
//! through the effect executor, so callers observe store writes, transport calls and
//! timer changes as soon as the returned future completes.

mod boot;
mod chat_effects;
mod effects;
mod persistence_effects;

pub(crate) use effects::run_runtime_effect;

use std::{rc::Rc, time::Duration};

use platform_host::{
    ChatTransport, ConnectionId, IdentityProvider, KvStore, ManualTimerService, MemoryIdentity,
    NoopChatTransport, NoopKvStore, TimerService,
};

use crate::{
    coordinator::{Coordinator, TimerToken},
    effect_executor, persistence,
};

#[derive(Clone)]
/// Platform services consumed by the desktop runtime.
pub struct DesktopServices {
    pub store: Rc<dyn KvStore>,
    pub transport: Rc<dyn ChatTransport>,
    pub timers: Rc<dyn TimerService<TimerToken>>,
    pub identity: Rc<dyn IdentityProvider>,
}

impl DesktopServices {
    /// Services that persist nothing and never connect. Timers only fire when driven manually.
    pub fn headless() -> Self {
        Self {
            store: Rc::new(NoopKvStore),
            transport: Rc::new(NoopChatTransport),
            timers: Rc::new(ManualTimerService::<TimerToken>::default()),
            identity: Rc::new(MemoryIdentity::anonymous()),
        }
    }
}

/// The running desktop: coordinator plus services.
pub struct DesktopHost {
    pub(crate) services: DesktopServices,
    pub(crate) coordinator: Coordinator,
}

impl DesktopHost {
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn services(&self) -> &DesktopServices {
        &self.services
    }

    /// Runs `op` against the coordinator and executes everything it queued.
    pub async fn apply<R>(&mut self, op: impl FnOnce(&mut Coordinator) -> R) -> R {
        let out = op(&mut self.coordinator);
        effect_executor::drain(self).await;
        out
    }

    pub async fn transport_opened(&mut self, connection: ConnectionId) {
        self.apply(|desk| desk.transport_opened(connection)).await;
    }

    pub async fn frame_received(&mut self, connection: ConnectionId, raw: &str) {
        self.apply(|desk| desk.frame_received(connection, raw)).await;
    }

    pub async fn transport_closed(&mut self, connection: ConnectionId) {
        self.apply(|desk| desk.transport_closed(connection)).await;
    }

    pub async fn timer_fired(&mut self, token: TimerToken) {
        self.apply(|desk| desk.timer_fired(token)).await;
    }

    /// Moves `clock` forward by `by` and fires whatever became due.
    pub async fn advance_time(&mut self, clock: &ManualTimerService<TimerToken>, by: Duration) {
        for token in clock.advance(by) {
            self.timer_fired(token).await;
        }
    }

    /// Forgets the saved desktop layout. Open windows are untouched.
    pub async fn clear_saved_state(&self) {
        if let Err(err) = persistence::clear_saved_state(self.services.store.as_ref()).await {
            tracing::warn!("clear saved state failed: {err}");
        }
    }
}
