use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::gate::RandomSource;
use super::scheduler::{DeliveryScheduler, SuppressReason, TickOutcome, TickReport};
use super::signal::SignalStore;
use super::suggestion::{Suggestion, SuggestionId};
use super::surface::{DeliveryOrigin, SurfaceEvent, SurfaceId};

/// Which surface renders a proactive suggestion once a tick decides to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingPolicy {
    /// The surface whose tick fired.
    Originating,
    /// Always this surface, if registered and live; otherwise the originating one.
    Pinned(SurfaceId),
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self::Originating
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    /// Minimum spacing between any two deliveries, across all surfaces.
    pub global_cooldown: Duration,
    pub routing: RoutingPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            global_cooldown: Duration::zero(),
            routing: RoutingPolicy::Originating,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActiveSlot {
    surface: SurfaceId,
    suggestion_id: SuggestionId,
}

/// Owns the single system-wide display slot. Surfaces keep their own cadence,
/// cooldown and show probability, but only one suggestion is ever visible.
pub struct DeliveryCoordinator {
    config: CoordinatorConfig,
    surfaces: Vec<DeliveryScheduler>,
    slot: Option<ActiveSlot>,
    last_delivery_at: Option<DateTime<Utc>>,
}

impl DeliveryCoordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            surfaces: Vec::new(),
            slot: None,
            last_delivery_at: None,
        }
    }

    /// Returns false if a surface with the same id is already registered.
    pub fn register(&mut self, scheduler: DeliveryScheduler) -> bool {
        if self.surface(scheduler.surface()).is_some() {
            warn!(surface = %scheduler.surface(), "Surface already registered");
            return false;
        }
        info!(surface = %scheduler.surface(), "Surface registered");
        self.surfaces.push(scheduler);
        true
    }

    /// Disposes and removes a surface. Unknown ids are a no-op.
    pub fn unregister(&mut self, surface: &str) -> Option<SurfaceEvent> {
        let index = self.surfaces.iter().position(|s| s.surface() == surface)?;
        let mut scheduler = self.surfaces.remove(index);
        let event = scheduler.dispose();
        self.release_if(surface);
        event
    }

    pub fn surface(&self, surface: &str) -> Option<&DeliveryScheduler> {
        self.surfaces.iter().find(|s| s.surface() == surface)
    }

    pub fn surface_ids(&self) -> impl Iterator<Item = &SurfaceId> {
        self.surfaces.iter().map(|s| s.surface())
    }

    pub fn schedulers(&self) -> &[DeliveryScheduler] {
        &self.surfaces
    }

    /// The one suggestion on screen, if any, with the surface showing it.
    pub fn active(&self) -> Option<(&SurfaceId, &Suggestion)> {
        let slot = self.slot.as_ref()?;
        let scheduler = self.surface(&slot.surface)?;
        scheduler.current().map(|s| (scheduler.surface(), s))
    }

    pub fn last_delivery_at(&self) -> Option<DateTime<Utc>> {
        self.last_delivery_at
    }

    pub fn tick(
        &mut self,
        surface: &str,
        now: DateTime<Utc>,
        store: &SignalStore,
        gate: &mut dyn RandomSource,
    ) -> TickReport {
        let events = self.poll_expiry(now);

        let Some(origin) = self.index_of(surface) else {
            return TickReport::suppressed(SuppressReason::Disposed, events);
        };

        if self.slot.is_some() {
            debug!(surface, "Another suggestion is on screen");
            return TickReport::suppressed(SuppressReason::Busy, events);
        }

        if let Some(last) = self.last_delivery_at {
            if now - last < self.config.global_cooldown {
                return TickReport::suppressed(SuppressReason::GlobalCooldown, events);
            }
        }

        let suggestion = match self.surfaces[origin].propose(now, store, gate) {
            Ok(suggestion) => suggestion,
            Err(reason) => return TickReport::suppressed(reason, events),
        };

        let target = self.route(origin);
        let mut events = events;
        let id = suggestion.id.clone();
        events.extend(self.surfaces[target].present(suggestion, now, DeliveryOrigin::Proactive));
        if target != origin {
            self.surfaces[origin].note_delivery(now);
        }
        self.occupy(target, id.clone(), now);

        TickReport {
            outcome: TickOutcome::Delivered(id),
            events,
        }
    }

    /// Shows a user-requested message on `surface`, clearing anything shown elsewhere.
    pub fn trigger_immediate(
        &mut self,
        surface: &str,
        suggestion: Suggestion,
        now: DateTime<Utc>,
    ) -> Vec<SurfaceEvent> {
        let Some(target) = self.index_of(surface) else {
            return Vec::new();
        };

        let mut events = Vec::new();
        for (index, scheduler) in self.surfaces.iter_mut().enumerate() {
            if index != target {
                events.extend(scheduler.supersede());
            }
        }

        let id = suggestion.id.clone();
        events.extend(self.surfaces[target].trigger_immediate(suggestion, now));
        self.occupy(target, id, now);
        events
    }

    pub fn dismiss(&mut self, surface: &str) -> Option<SurfaceEvent> {
        let index = self.index_of(surface)?;
        let event = self.surfaces[index].dismiss();
        if event.is_some() {
            self.release_if(surface);
        }
        event
    }

    pub fn expire(&mut self, surface: &str, suggestion_id: &str, now: DateTime<Utc>) -> Option<SurfaceEvent> {
        let index = self.index_of(surface)?;
        let event = self.surfaces[index].expire(suggestion_id, now);
        if event.is_some() {
            self.release_if(surface);
        }
        event
    }

    /// Clears every surface whose display time is up.
    pub fn poll_expiry(&mut self, now: DateTime<Utc>) -> Vec<SurfaceEvent> {
        let mut events = Vec::new();
        for scheduler in &mut self.surfaces {
            events.extend(scheduler.poll_expiry(now));
        }
        self.sync_slot();
        events
    }

    /// Disposes every surface. Idempotent.
    pub fn dispose_all(&mut self) -> Vec<SurfaceEvent> {
        let events = self.surfaces.iter_mut().filter_map(|s| s.dispose()).collect();
        self.slot = None;
        events
    }

    fn route(&self, origin: usize) -> usize {
        match &self.config.routing {
            RoutingPolicy::Originating => origin,
            RoutingPolicy::Pinned(pinned) => match self.index_of(pinned) {
                Some(index) => index,
                None => {
                    warn!(pinned = %pinned, "Pinned surface unavailable, using originating surface");
                    origin
                }
            },
        }
    }

    /// Index of a registered, live surface.
    fn index_of(&self, surface: &str) -> Option<usize> {
        self.surfaces
            .iter()
            .position(|s| s.surface() == surface && !s.is_disposed())
    }

    fn occupy(&mut self, index: usize, suggestion_id: SuggestionId, now: DateTime<Utc>) {
        self.slot = Some(ActiveSlot {
            surface: self.surfaces[index].surface().clone(),
            suggestion_id,
        });
        self.last_delivery_at = Some(now);
    }

    fn release_if(&mut self, surface: &str) {
        if self.slot.as_ref().is_some_and(|slot| slot.surface == surface) {
            self.slot = None;
        }
    }

    /// Drops the slot once its suggestion is no longer shown.
    fn sync_slot(&mut self) {
        let still_shown = self.slot.as_ref().is_some_and(|slot| {
            self.surface(&slot.surface)
                .and_then(|s| s.current())
                .is_some_and(|current| current.id == slot.suggestion_id)
        });
        if !still_shown {
            self.slot = None;
        }
    }
}
