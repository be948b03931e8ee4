use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::config::CatalogConfig;
use crate::kernel::gate::RandomSource;
use crate::kernel::signal::{ContextPatch, Difficulty};
use crate::kernel::suggestion::{Cause, Priority, Suggestion, SuggestionKind};

pub const UNKNOWN_COURSE: &str = "Unknown Course";

/// Course names by id and the canned messages used for user-initiated prompts.
#[derive(Debug, Clone)]
pub struct CourseCatalog {
    courses: BTreeMap<String, String>,
    encouragements: Vec<String>,
    default_lesson: String,
}

impl CourseCatalog {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            courses: config.courses.clone(),
            encouragements: config.encouragements.clone(),
            default_lesson: config.default_lesson.clone(),
        }
    }

    pub fn course_name(&self, course_id: &str) -> Option<&str> {
        self.courses.get(course_id).map(String::as_str)
    }

    /// The context patch applied when the learner opens a course page.
    pub fn navigate(&self, course_id: &str) -> ContextPatch {
        ContextPatch::new()
            .course(self.course_name(course_id).unwrap_or(UNKNOWN_COURSE))
            .lesson(&self.default_lesson)
            .difficulty(Difficulty::Medium)
    }

    pub fn encouragements(&self) -> &[String] {
        &self.encouragements
    }

    pub fn random_encouragement(&self, source: &mut dyn RandomSource) -> Option<&str> {
        if self.encouragements.is_empty() {
            return None;
        }
        let index = source.pick_index(self.encouragements.len());
        self.encouragements.get(index).map(String::as_str)
    }

    /// A low-priority encouragement for `trigger_immediate`.
    pub fn encouragement_suggestion(
        &self,
        source: &mut dyn RandomSource,
        now: DateTime<Utc>,
    ) -> Option<Suggestion> {
        let message = self.random_encouragement(source)?;
        Some(Suggestion::new(
            Cause::UserRequest,
            SuggestionKind::Encouragement,
            Priority::Low,
            message,
            now,
        ))
    }
}

impl Default for CourseCatalog {
    fn default() -> Self {
        Self::new(&CatalogConfig::default())
    }
}
