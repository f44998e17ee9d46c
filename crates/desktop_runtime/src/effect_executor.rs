//! Explicit runtime effect-queue executor for coordinator-emitted side effects.

use crate::{
    coordinator::RuntimeEffect,
    host::{self, DesktopHost},
};

/// Drains the coordinator's effect queue in order until it stays empty.
///
/// Effects executed here may feed results back into the coordinator (a loaded cache, a refused
/// connection); whatever those enqueue runs in the next batch.
pub(crate) async fn drain(host: &mut DesktopHost) {
    loop {
        let batch = coalesce(host.coordinator.drain_effects());
        if batch.is_empty() {
            return;
        }
        for effect in batch {
            host::run_runtime_effect(host, effect).await;
        }
    }
}

/// Collapses runs of back-to-back layout writes into one.
fn coalesce(mut batch: Vec<RuntimeEffect>) -> Vec<RuntimeEffect> {
    batch.dedup_by(|next, prev| {
        *next == RuntimeEffect::PersistLayout && *prev == RuntimeEffect::PersistLayout
    });
    batch
}
