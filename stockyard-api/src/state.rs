use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stockyard_core::{DistanceService, Navigator, RequestStore};
use stockyard_offer::OfferController;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

/// Views nobody has touched for this long are dropped.
pub const DEFAULT_VIEW_IDLE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

/// Navigator for a hosted page view: the redirect is handed back to the
/// client in the decision response instead of being followed here.
#[derive(Default)]
pub struct RedirectSlot {
    route: Mutex<Option<String>>,
}

impl RedirectSlot {
    pub fn take(&self) -> Option<String> {
        self.route.lock().unwrap_or_else(|e| e.into_inner()).take()
    }
}

impl Navigator for RedirectSlot {
    fn navigate(&self, route: &str) {
        *self.route.lock().unwrap_or_else(|e| e.into_inner()) = Some(route.to_string());
    }
}

/// One open request page.
#[derive(Clone)]
pub struct PageView {
    /// Subject of the token that opened the view.
    pub owner: String,
    pub controller: OfferController,
    pub redirect: Arc<RedirectSlot>,
    /// Refreshed on every request that reaches the view.
    pub last_seen: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RequestStore>,
    pub distances: Arc<dyn DistanceService>,
    pub views: Arc<RwLock<HashMap<Uuid, PageView>>>,
    pub auth: AuthConfig,
    pub transit_route: String,
    pub view_idle_timeout: Duration,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RequestStore>,
        distances: Arc<dyn DistanceService>,
        auth: AuthConfig,
        transit_route: impl Into<String>,
    ) -> Self {
        Self {
            store,
            distances,
            views: Arc::new(RwLock::new(HashMap::new())),
            auth,
            transit_route: transit_route.into(),
            view_idle_timeout: DEFAULT_VIEW_IDLE_TIMEOUT,
        }
    }

    pub fn with_view_idle_timeout(mut self, timeout: Duration) -> Self {
        self.view_idle_timeout = timeout;
        self
    }

    /// Drop every view idle for longer than `view_idle_timeout`, leaving its
    /// controller so in-flight results are discarded. Returns how many went.
    pub async fn evict_idle_views(&self) -> usize {
        let now = Instant::now();
        let evicted: Vec<PageView> = {
            let mut views = self.views.write().await;
            let idle: Vec<Uuid> = views
                .iter()
                .filter(|(_, view)| now.duration_since(view.last_seen) >= self.view_idle_timeout)
                .map(|(id, _)| *id)
                .collect();
            idle.iter().filter_map(|id| views.remove(id)).collect()
        };

        for view in &evicted {
            view.controller.leave().await;
        }
        if !evicted.is_empty() {
            tracing::info!("Evicted {} idle views", evicted.len());
        }
        evicted.len()
    }

    /// Background sweep over idle views, every `period`.
    pub fn spawn_view_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                state.evict_idle_views().await;
            }
        })
    }
}
