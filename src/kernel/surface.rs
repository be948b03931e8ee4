use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::suggestion::{Suggestion, SuggestionId};

pub type SurfaceId = String;

/// The lifecycle of one presentation surface (avatar bubble, chat panel, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayPhase {
    /// Nothing shown.
    Idle,
    /// Exactly one suggestion shown.
    Displaying,
    /// Surface torn down. Absorbing: every request is ignored from here on.
    Disposed,
}

impl Default for DisplayPhase {
    fn default() -> Self {
        Self::Idle
    }
}

/// Requests a surface transition. The graph decides whether it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayRequest {
    Show,
    Dismiss,
    Expire,
    Supersede,
    Dispose,
}

pub struct DisplayGraph;

impl DisplayGraph {
    /// Pure function: (Current Phase, Request) -> New Phase.
    /// Returns None if the request does not apply.
    pub fn transition(current: DisplayPhase, request: DisplayRequest) -> Option<DisplayPhase> {
        use DisplayPhase::*;
        use DisplayRequest::*;

        match (current, request) {
            (Idle, Show) => Some(Displaying),
            // Only immediate triggers replace a shown suggestion; proactive ticks are blocked earlier.
            (Displaying, Show) => Some(Displaying),

            (Displaying, Dismiss) => Some(Idle),
            (Displaying, Expire) => Some(Idle),
            (Displaying, Supersede) => Some(Idle),

            (Idle, Dispose) | (Displaying, Dispose) => Some(Disposed),

            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOrigin {
    /// Chosen by a scheduler tick.
    Proactive,
    /// Explicitly requested by the user.
    Immediate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearReason {
    Dismissed,
    Expired,
    Superseded,
    Disposed,
}

/// Outbound notifications to the observer that renders a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SurfaceEvent {
    Displayed {
        surface: SurfaceId,
        suggestion: Suggestion,
        origin: DeliveryOrigin,
        expires_at: DateTime<Utc>,
    },
    Cleared {
        surface: SurfaceId,
        suggestion_id: SuggestionId,
        reason: ClearReason,
    },
}

impl SurfaceEvent {
    pub fn surface(&self) -> &SurfaceId {
        match self {
            SurfaceEvent::Displayed { surface, .. } | SurfaceEvent::Cleared { surface, .. } => surface,
        }
    }
}
