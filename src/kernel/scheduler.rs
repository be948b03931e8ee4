use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::engine::generate_suggestions;
use super::gate::{passes, RandomSource};
use super::signal::SignalStore;
use super::suggestion::{Suggestion, SuggestionId};
use super::surface::{
    ClearReason, DeliveryOrigin, DisplayGraph, DisplayPhase, DisplayRequest, SurfaceEvent, SurfaceId,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
    /// Minimum spacing between two deliveries from this surface.
    pub minimum_cooldown: Duration,
    /// 0.0 - 1.0: share of cooldown-eligible ticks that actually deliver.
    pub show_probability: f64,
    pub display_duration: Duration,
    /// Display time for user-initiated messages.
    pub immediate_display_duration: Duration,
    /// Start the cooldown clock at construction, so the first delivery waits one full cooldown.
    pub defer_first_delivery: bool,
}

/// Why a tick produced nothing. None of these are failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    Disposed,
    /// Something is already on screen.
    Busy,
    Cooldown,
    /// Cross-surface spacing enforced by the coordinator.
    GlobalCooldown,
    NoCandidates,
    GatedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Delivered(SuggestionId),
    Suppressed(SuppressReason),
}

/// Result of one tick: the outcome plus every observer event it caused
/// (an expiry noticed on the way counts too).
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub outcome: TickOutcome,
    pub events: Vec<SurfaceEvent>,
}

impl TickReport {
    pub fn suppressed(reason: SuppressReason, events: Vec<SurfaceEvent>) -> Self {
        Self {
            outcome: TickOutcome::Suppressed(reason),
            events,
        }
    }

    pub fn delivered(&self) -> Option<&Suggestion> {
        self.events.iter().find_map(|e| match e {
            SurfaceEvent::Displayed { suggestion, .. } => Some(suggestion),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
struct Shown {
    suggestion: Suggestion,
    shown_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Per-surface state. Only the owning scheduler mutates it.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    pub phase: DisplayPhase,
    pub last_suggestion_at: Option<DateTime<Utc>>,
    shown: Option<Shown>,
}

/// Decides when one surface shows the top candidate, subject to cooldown and a
/// probability gate, and expires what it shows.
pub struct DeliveryScheduler {
    surface: SurfaceId,
    config: SchedulerConfig,
    state: SchedulerState,
}

impl DeliveryScheduler {
    pub fn new(surface: impl Into<SurfaceId>, config: SchedulerConfig, created_at: DateTime<Utc>) -> Self {
        let last_suggestion_at = config.defer_first_delivery.then_some(created_at);
        Self {
            surface: surface.into(),
            config,
            state: SchedulerState {
                phase: DisplayPhase::Idle,
                last_suggestion_at,
                shown: None,
            },
        }
    }

    pub fn surface(&self) -> &SurfaceId {
        &self.surface
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn phase(&self) -> DisplayPhase {
        self.state.phase
    }

    pub fn last_suggestion_at(&self) -> Option<DateTime<Utc>> {
        self.state.last_suggestion_at
    }

    pub fn current(&self) -> Option<&Suggestion> {
        self.state.shown.as_ref().map(|s| &s.suggestion)
    }

    pub fn shown_at(&self) -> Option<DateTime<Utc>> {
        self.state.shown.as_ref().map(|s| s.shown_at)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.state.shown.as_ref().map(|s| s.expires_at)
    }

    pub fn is_disposed(&self) -> bool {
        self.state.phase == DisplayPhase::Disposed
    }

    /// Full standalone tick: expire if due, then propose and present.
    pub fn tick(&mut self, now: DateTime<Utc>, store: &SignalStore, gate: &mut dyn RandomSource) -> TickReport {
        let mut events: Vec<SurfaceEvent> = self.poll_expiry(now).into_iter().collect();

        match self.propose(now, store, gate) {
            Ok(suggestion) => {
                let id = suggestion.id.clone();
                events.extend(self.present(suggestion, now, DeliveryOrigin::Proactive));
                TickReport {
                    outcome: TickOutcome::Delivered(id),
                    events,
                }
            }
            Err(reason) => TickReport::suppressed(reason, events),
        }
    }

    /// Steps a-d of a tick without mutating anything: cooldown, generation, gate.
    pub fn propose(
        &self,
        now: DateTime<Utc>,
        store: &SignalStore,
        gate: &mut dyn RandomSource,
    ) -> Result<Suggestion, SuppressReason> {
        match self.state.phase {
            DisplayPhase::Disposed => return Err(SuppressReason::Disposed),
            DisplayPhase::Displaying => return Err(SuppressReason::Busy),
            DisplayPhase::Idle => {}
        }

        if let Some(last) = self.state.last_suggestion_at {
            let elapsed = now - last;
            if elapsed < self.config.minimum_cooldown {
                debug!(surface = %self.surface, elapsed_ms = elapsed.num_milliseconds(), "Cooldown active");
                return Err(SuppressReason::Cooldown);
            }
        }

        let candidates = generate_suggestions(store.emotion_state(), store.learning_context(), now);

        let Some(head) = candidates.into_iter().next() else {
            return Err(SuppressReason::NoCandidates);
        };

        if !passes(gate, self.config.show_probability) {
            debug!(surface = %self.surface, "Gated out");
            return Err(SuppressReason::GatedOut);
        }

        Ok(head)
    }

    /// Step e: show a suggestion, replacing whatever is shown.
    pub fn present(&mut self, suggestion: Suggestion, now: DateTime<Utc>, origin: DeliveryOrigin) -> Vec<SurfaceEvent> {
        let Some(next) = DisplayGraph::transition(self.state.phase, DisplayRequest::Show) else {
            return Vec::new();
        };

        let mut events = Vec::new();
        if let Some(previous) = self.state.shown.take() {
            events.push(self.cleared(previous.suggestion.id, ClearReason::Superseded));
        }

        let duration = match origin {
            DeliveryOrigin::Proactive => self.config.display_duration,
            DeliveryOrigin::Immediate => self.config.immediate_display_duration,
        };
        let expires_at = now + duration;

        info!(
            surface = %self.surface,
            id = %suggestion.id,
            kind = ?suggestion.kind,
            priority = ?suggestion.priority,
            ?origin,
            "Displaying suggestion"
        );
        debug!(surface = %self.surface, message = %suggestion.message);

        self.state.phase = next;
        self.state.last_suggestion_at = Some(now);
        self.state.shown = Some(Shown {
            suggestion: suggestion.clone(),
            shown_at: now,
            expires_at,
        });

        events.push(SurfaceEvent::Displayed {
            surface: self.surface.clone(),
            suggestion,
            origin,
            expires_at,
        });
        events
    }

    /// Records a delivery this surface decided on but another surface rendered.
    pub fn note_delivery(&mut self, now: DateTime<Utc>) {
        if !self.is_disposed() {
            self.state.last_suggestion_at = Some(now);
        }
    }

    /// Bypasses generation, cooldown and gate. Still restarts the cooldown.
    pub fn trigger_immediate(&mut self, suggestion: Suggestion, now: DateTime<Utc>) -> Vec<SurfaceEvent> {
        self.present(suggestion, now, DeliveryOrigin::Immediate)
    }

    pub fn dismiss(&mut self) -> Option<SurfaceEvent> {
        self.clear(DisplayRequest::Dismiss, ClearReason::Dismissed)
    }

    pub fn supersede(&mut self) -> Option<SurfaceEvent> {
        self.clear(DisplayRequest::Supersede, ClearReason::Superseded)
    }

    /// Clears `id` if it is still the shown suggestion and its display time is up.
    /// Late or stale expiries are no-ops.
    pub fn expire(&mut self, id: &str, now: DateTime<Utc>) -> Option<SurfaceEvent> {
        let due = self
            .state
            .shown
            .as_ref()
            .is_some_and(|s| s.suggestion.id == id && now >= s.expires_at);
        if !due {
            return None;
        }
        self.clear(DisplayRequest::Expire, ClearReason::Expired)
    }

    pub fn poll_expiry(&mut self, now: DateTime<Utc>) -> Option<SurfaceEvent> {
        let id = self.current()?.id.clone();
        self.expire(&id, now)
    }

    /// Idempotent. Clears a shown suggestion once; every later call on this
    /// scheduler becomes a no-op.
    pub fn dispose(&mut self) -> Option<SurfaceEvent> {
        let next = DisplayGraph::transition(self.state.phase, DisplayRequest::Dispose)?;
        self.state.phase = next;
        info!(surface = %self.surface, "Surface disposed");
        self.state
            .shown
            .take()
            .map(|shown| self.cleared(shown.suggestion.id, ClearReason::Disposed))
    }

    fn clear(&mut self, request: DisplayRequest, reason: ClearReason) -> Option<SurfaceEvent> {
        let next = DisplayGraph::transition(self.state.phase, request)?;
        let shown = self.state.shown.take()?;
        self.state.phase = next;
        debug!(surface = %self.surface, id = %shown.suggestion.id, ?reason, "Suggestion cleared");
        Some(self.cleared(shown.suggestion.id, reason))
    }

    fn cleared(&self, suggestion_id: SuggestionId, reason: ClearReason) -> SurfaceEvent {
        SurfaceEvent::Cleared {
            surface: self.surface.clone(),
            suggestion_id,
            reason,
        }
    }
}
