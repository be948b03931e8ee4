//! # nudge
//!
//! Proactive suggestion engine for a learning assistant. It watches a
//! periodically sampled emotion reading plus the learner's session context,
//! generates prioritized suggestions, and rate-limits their delivery across
//! presentation surfaces so that at most one interruption is visible at a time.
//!
//! - [`SignalStore`]: latest emotion reading and mutable learning context
//! - [`generate_suggestions`]: pure (reading, context) -> ranked candidates
//! - [`DeliveryScheduler`]: per-surface cooldown, probability gate, expiry
//! - [`DeliveryCoordinator`]: the single system-wide display slot
//! - [`Reactor`]: async timer driver that serializes everything onto one task

pub mod catalog;
pub mod config;
pub mod error;
pub mod kernel;
pub mod responder;
pub mod sampler;

pub use catalog::CourseCatalog;
pub use config::AppConfig;
pub use error::{ConfigError, NudgeError, ReactorError};
pub use kernel::coordinator::{DeliveryCoordinator, RoutingPolicy};
pub use kernel::engine::generate_suggestions;
pub use kernel::reactor::{Reactor, ReactorHandle};
pub use kernel::scheduler::{DeliveryScheduler, SchedulerConfig};
pub use kernel::signal::{ContextPatch, Difficulty, Emotion, EmotionReading, LearningContext, SignalStore};
pub use kernel::suggestion::{Priority, Suggestion, SuggestionKind};
pub use kernel::surface::SurfaceEvent;
