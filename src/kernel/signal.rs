use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ParseEnumError;

/// Learner affect, as classified by the external sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Engaged,
    Frustrated,
    Bored,
    Confused,
    Focused,
    Tired,
}

impl Emotion {
    pub const ALL: [Emotion; 6] = [
        Emotion::Engaged,
        Emotion::Frustrated,
        Emotion::Bored,
        Emotion::Confused,
        Emotion::Focused,
        Emotion::Tired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Engaged => "engaged",
            Emotion::Frustrated => "frustrated",
            Emotion::Bored => "bored",
            Emotion::Confused => "confused",
            Emotion::Focused => "focused",
            Emotion::Tired => "tired",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("emotion", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("difficulty", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionReading {
    pub emotion: Emotion,
    /// 0.0 - 1.0
    pub confidence: f32,
    pub observed_at: DateTime<Utc>,
}

impl EmotionReading {
    pub fn new(emotion: Emotion, confidence: f32, observed_at: DateTime<Utc>) -> Self {
        Self {
            emotion,
            confidence: confidence.clamp(0.0, 1.0),
            observed_at,
        }
    }

    /// The reading held when no sampler has reported yet. A valid steady state.
    pub fn resting(observed_at: DateTime<Utc>) -> Self {
        Self::new(Emotion::Focused, 0.8, observed_at)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningContext {
    pub current_course: String,
    pub current_lesson: String,
    pub difficulty: Difficulty,
    /// Minutes in the current session. Only ever grows.
    pub time_spent: u32,
    pub last_activity: DateTime<Utc>,
}

impl LearningContext {
    pub fn new(
        course: impl Into<String>,
        lesson: impl Into<String>,
        difficulty: Difficulty,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            current_course: course.into(),
            current_lesson: lesson.into(),
            difficulty,
            time_spent: 0,
            last_activity: started_at,
        }
    }
}

/// Field-wise update for [`LearningContext`]. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextPatch {
    pub current_course: Option<String>,
    pub current_lesson: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub time_spent: Option<u32>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl ContextPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn course(mut self, course: impl Into<String>) -> Self {
        self.current_course = Some(course.into());
        self
    }

    pub fn lesson(mut self, lesson: impl Into<String>) -> Self {
        self.current_lesson = Some(lesson.into());
        self
    }

    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn time_spent(mut self, minutes: u32) -> Self {
        self.time_spent = Some(minutes);
        self
    }

    pub fn last_activity(mut self, at: DateTime<Utc>) -> Self {
        self.last_activity = Some(at);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// The only ways the store mutates.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalDelta {
    EmotionIngested(EmotionReading),
    ContextPatched(ContextPatch),
    /// One more session minute, reported by the session ticker.
    MinuteElapsed { at: DateTime<Utc> },
}

/// Latest emotion reading plus the session context. No history is kept.
#[derive(Debug, Clone)]
pub struct SignalStore {
    emotion: EmotionReading,
    context: LearningContext,
    /// Bumped on every applied delta.
    pub version: u64,
}

impl SignalStore {
    pub fn new(context: LearningContext) -> Self {
        let emotion = EmotionReading::resting(context.last_activity);
        Self {
            emotion,
            context,
            version: 0,
        }
    }

    pub fn emotion_state(&self) -> &EmotionReading {
        &self.emotion
    }

    pub fn learning_context(&self) -> &LearningContext {
        &self.context
    }

    pub fn update_learning_context(&mut self, patch: ContextPatch) {
        self.reduce(SignalDelta::ContextPatched(patch));
    }

    pub fn ingest_emotion_reading(&mut self, reading: EmotionReading) {
        self.reduce(SignalDelta::EmotionIngested(reading));
    }

    pub fn reduce(&mut self, delta: SignalDelta) {
        self.version += 1;

        match delta {
            SignalDelta::EmotionIngested(reading) => {
                self.emotion = reading;
            }
            SignalDelta::ContextPatched(patch) => {
                let ContextPatch {
                    current_course,
                    current_lesson,
                    difficulty,
                    time_spent,
                    last_activity,
                } = patch;

                if let Some(course) = current_course {
                    self.context.current_course = course;
                }
                if let Some(lesson) = current_lesson {
                    self.context.current_lesson = lesson;
                }
                if let Some(difficulty) = difficulty {
                    self.context.difficulty = difficulty;
                }
                if let Some(minutes) = time_spent {
                    if minutes >= self.context.time_spent {
                        self.context.time_spent = minutes;
                    } else {
                        warn!(
                            current = self.context.time_spent,
                            requested = minutes,
                            "Ignoring patch that would rewind time_spent"
                        );
                    }
                }
                if let Some(at) = last_activity {
                    self.context.last_activity = at;
                }
            }
            SignalDelta::MinuteElapsed { at } => {
                self.context.time_spent = self.context.time_spent.saturating_add(1);
                self.context.last_activity = at;
            }
        }
    }
}
