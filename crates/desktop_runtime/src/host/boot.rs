use rand::{rngs::StdRng, SeedableRng};

use crate::{
    coordinator::Coordinator,
    effect_executor,
    host::{DesktopHost, DesktopServices},
    model::Viewport,
    persistence,
};

impl DesktopHost {
    /// Boots the desktop: configuration, then identity, then the saved layout.
    ///
    /// The saved layout is restored against `viewport`, so hosts pass their real screen size
    /// here rather than adjusting it afterwards.
    pub async fn boot(services: DesktopServices, viewport: Viewport) -> Self {
        Self::boot_with_rng(services, viewport, StdRng::from_os_rng()).await
    }

    /// Boots with deterministic window placement.
    pub async fn boot_with_seed(services: DesktopServices, viewport: Viewport, seed: u64) -> Self {
        Self::boot_with_rng(services, viewport, StdRng::seed_from_u64(seed)).await
    }

    async fn boot_with_rng(services: DesktopServices, viewport: Viewport, rng: StdRng) -> Self {
        let store = services.store.as_ref();
        let config = persistence::load_desktop_config(store).await;

        match persistence::load_identity(store).await {
            Some(username) => services.identity.set_username(&username),
            None => {
                let username = services.identity.username();
                if let Err(err) = persistence::persist_identity(store, &username).await {
                    tracing::warn!("persist identity failed: {err}");
                }
            }
        }

        let snapshot = if config.restore_on_boot {
            persistence::load_desktop_snapshot(store).await
        } else {
            None
        };

        let mut coordinator = Coordinator::with_rng(config, services.identity.clone(), rng);
        coordinator.set_viewport(viewport);
        let mut host = Self {
            services,
            coordinator,
        };
        if let Some(raw) = snapshot {
            if let Ok(restored) = host.coordinator.restore_state(&raw) {
                tracing::debug!(restored, "desktop layout restored");
            }
        }
        effect_executor::drain(&mut host).await;
        host
    }
}
