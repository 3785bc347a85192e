//! Synchronization controller.
//!
//! Owns the [`ViewState`] and drives the overlay loader and the pin store in
//! response to user actions. Every failure ends up as text in
//! `ViewState::last_error`; none of the operations return an error.
//!
//! Operations are not serialized against each other. When two requests of
//! the same kind overlap, [`StalePolicy`] decides whose response lands.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use redline_common::{
    ClientConfig, GeoCoordinate, MapService, PinVisibility, StalePolicy, UserId,
};
use tokio::sync::watch;

use crate::overlay::{OverlayLoader, OverlayQuery};
use crate::pins::PinStore;
use crate::state::{RequestKind, ViewState};

pub const EMPTY_KEYWORD_MESSAGE: &str = "Please enter a keyword";

pub struct SyncController<S> {
    overlay: OverlayLoader<S>,
    pins: PinStore<S>,
    state: watch::Sender<ViewState>,
    policy: StalePolicy,
    overlay_issued: AtomicU64,
    pins_issued: AtomicU64,
}

impl<S: MapService> SyncController<S> {
    pub fn new(service: S, user_id: UserId) -> Self {
        Self::with_options(
            Arc::new(service),
            user_id,
            PinVisibility::default(),
            StalePolicy::default(),
        )
    }

    /// Controller with the pin visibility and stale policy from `config`.
    pub fn from_config(service: S, user_id: UserId, config: &ClientConfig) -> Self {
        Self::with_options(
            Arc::new(service),
            user_id,
            config.pin_visibility,
            config.stale_policy,
        )
    }

    pub fn with_options(
        service: Arc<S>,
        user_id: UserId,
        visibility: PinVisibility,
        policy: StalePolicy,
    ) -> Self {
        Self {
            overlay: OverlayLoader::new(service.clone()),
            pins: PinStore::with_visibility(service, visibility),
            state: watch::Sender::new(ViewState::new(user_id)),
            policy,
            overlay_issued: AtomicU64::new(0),
            pins_issued: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Change stream for renderers. Every applied update notifies.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    pub fn user_id(&self) -> UserId {
        self.state.borrow().user_id.clone()
    }

    pub fn stale_policy(&self) -> StalePolicy {
        self.policy
    }

    pub fn pin_visibility(&self) -> PinVisibility {
        self.pins.visibility()
    }

    fn counter(&self, kind: RequestKind) -> &AtomicU64 {
        match kind {
            RequestKind::Overlay => &self.overlay_issued,
            RequestKind::Pins => &self.pins_issued,
        }
    }

    fn issue(&self, kind: RequestKind) -> u64 {
        self.counter(kind).fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply the outcome of request `generation`, unless the policy says a
    /// newer request of the same kind owns the state. Returns whether it
    /// was applied.
    fn apply(
        &self,
        kind: RequestKind,
        generation: u64,
        update: impl FnOnce(&mut ViewState),
    ) -> bool {
        let latest = self.counter(kind);
        let policy = self.policy;
        self.state.send_if_modified(|state| {
            if policy == StalePolicy::LatestIssued && generation != latest.load(Ordering::SeqCst) {
                tracing::debug!(?kind, generation, "dropping stale response");
                return false;
            }
            match kind {
                RequestKind::Overlay => state.overlay_generation = generation,
                RequestKind::Pins => state.pins_generation = generation,
            }
            update(state);
            true
        })
    }

    fn set_error(&self, message: String) {
        tracing::warn!(%message, "view error");
        self.state.send_modify(|state| state.last_error = Some(message));
    }

    /// Load the world overlay, then the pins.
    pub async fn initialize(&self) {
        let generation = self.issue(RequestKind::Overlay);
        match self.overlay.fetch_overlay(OverlayQuery::world()).await {
            Ok(overlay) => {
                self.apply(RequestKind::Overlay, generation, |state| {
                    state.overlay = overlay.map(Arc::new);
                });
                self.refresh_pins().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "initial overlay fetch failed");
                self.apply(RequestKind::Overlay, generation, |state| {
                    state.last_error = Some(format!("Error fetching overlay data: {e}"));
                });
            }
        }
    }

    /// Replace the markers with the service's current list.
    pub async fn refresh_pins(&self) {
        let generation = self.issue(RequestKind::Pins);
        let user = self.user_id();
        let result = self.pins.list_pins(&user).await;
        self.apply(RequestKind::Pins, generation, |state| match result {
            Ok(markers) => {
                state.markers = markers;
                state.last_error = None;
            }
            Err(e) => state.last_error = Some(format!("Error fetching pins data: {e}")),
        });
    }

    /// Keyword search over the overlay. An empty keyword never reaches the
    /// service.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn search(&self, keyword: &str) {
        if keyword.trim().is_empty() {
            self.set_error(EMPTY_KEYWORD_MESSAGE.to_string());
            return;
        }
        let generation = self.issue(RequestKind::Overlay);
        let result = self
            .overlay
            .fetch_overlay(OverlayQuery::keyword(keyword))
            .await;
        self.apply(RequestKind::Overlay, generation, |state| match result {
            Ok(overlay) => {
                state.overlay = overlay.map(Arc::new);
                state.last_error = None;
            }
            Err(e) => state.last_error = Some(format!("Error fetching overlay data: {e}")),
        });
    }

    /// Persist a pin at `coordinate`, then reload the list. Markers only
    /// change once the service has the pin.
    pub async fn add_pin_at(&self, coordinate: GeoCoordinate) {
        let (lat, lng) = coordinate.to_wire();
        self.add_pin_raw(&lat, &lng).await;
    }

    /// Like [`add_pin_at`](Self::add_pin_at) with the coordinate strings
    /// forwarded untouched.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn add_pin_raw(&self, lat: &str, lng: &str) {
        let user = self.user_id();
        match self.pins.add_pin(&user, lat, lng).await {
            Ok(()) => self.refresh_pins().await,
            Err(e) => self.set_error(format!("Error adding pins data: {e}")),
        }
    }

    /// Remove all of the current user's pins, then reload the list.
    pub async fn clear_all(&self) {
        let user = self.user_id();
        match self.pins.clear_pins(&user).await {
            Ok(()) => self.refresh_pins().await,
            Err(e) => self.set_error(format!("Error clearing pins data: {e}")),
        }
    }

    /// Reload everything for the same user. Pins live on the service, so
    /// they come back.
    pub async fn restart(&self) {
        self.initialize().await;
    }

    /// Switch to another identity and reload. Markers of the previous user
    /// are dropped straight away, and any listing still in flight for them
    /// will not be applied under [`StalePolicy::LatestIssued`].
    pub async fn set_user(&self, user_id: UserId) {
        let generation = self.issue(RequestKind::Pins);
        self.state.send_modify(|state| {
            tracing::info!(from = %state.user_id, to = %user_id, "switching user");
            state.user_id = user_id;
            state.markers.clear();
            state.pins_generation = generation;
        });
        self.initialize().await;
    }
}
