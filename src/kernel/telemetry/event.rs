use serde::{Deserialize, Serialize};

use crate::kernel::scheduler::SuppressReason;
use crate::kernel::signal::Emotion;
use crate::kernel::suggestion::{Priority, SuggestionKind};
use crate::kernel::surface::{ClearReason, DeliveryOrigin, SurfaceEvent, SurfaceId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    EmotionIngested {
        emotion: Emotion,
    },

    ContextPatched,

    Delivered {
        surface: SurfaceId,
        kind: SuggestionKind,
        priority: Priority,
        origin: DeliveryOrigin,
    },

    Suppressed {
        surface: SurfaceId,
        reason: SuppressReason,
    },

    Cleared {
        surface: SurfaceId,
        reason: ClearReason,
    },
}

impl From<&SurfaceEvent> for TelemetryEvent {
    fn from(event: &SurfaceEvent) -> Self {
        match event {
            SurfaceEvent::Displayed {
                surface,
                suggestion,
                origin,
                ..
            } => TelemetryEvent::Delivered {
                surface: surface.clone(),
                kind: suggestion.kind, // message dropped
                priority: suggestion.priority,
                origin: *origin,
            },
            SurfaceEvent::Cleared { surface, reason, .. } => TelemetryEvent::Cleared {
                surface: surface.clone(),
                reason: *reason,
            },
        }
    }
}
