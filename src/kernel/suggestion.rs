use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SuggestionId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Question,
    Suggestion,
    Encouragement,
    Break,
    Clarification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

/// What triggered a candidate. Also the id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
    Frustration,
    Boredom,
    Confusion,
    Fatigue,
    Engagement,
    DeepFocus,
    LongSession,
    HardTopic,
    UserRequest,
}

impl Cause {
    pub fn slug(&self) -> &'static str {
        match self {
            Cause::Frustration => "frustration",
            Cause::Boredom => "boredom",
            Cause::Confusion => "confusion",
            Cause::Fatigue => "tired",
            Cause::Engagement => "engaged",
            Cause::DeepFocus => "focus",
            Cause::LongSession => "time",
            Cause::HardTopic => "difficulty",
            Cause::UserRequest => "click",
        }
    }
}

/// An advisory message candidate. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: SuggestionId,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub priority: Priority,
    pub cause: Cause,
}

impl Suggestion {
    pub fn new(
        cause: Cause,
        kind: SuggestionKind,
        priority: Priority,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Self::mint_id(cause, timestamp),
            kind,
            message: message.into(),
            timestamp,
            priority,
            cause,
        }
    }

    /// `<cause>-<millis>-<uuid>`: the random tail keeps ids distinct within one millisecond.
    fn mint_id(cause: Cause, at: DateTime<Utc>) -> SuggestionId {
        format!(
            "{}-{}-{}",
            cause.slug(),
            at.timestamp_millis(),
            Uuid::new_v4().simple()
        )
    }
}
