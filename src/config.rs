//! TOML-based configuration.
//!
//! Every field has a default, so an empty file (or no file) yields the
//! parity defaults: an avatar surface and a chat surface with the cadences,
//! cooldowns and show probabilities the product shipped with.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::kernel::coordinator::{CoordinatorConfig, RoutingPolicy};
use crate::kernel::scheduler::SchedulerConfig;
use crate::kernel::signal::{Difficulty, LearningContext};
use crate::kernel::time::millis;

/// Upper bound for any interval or duration (one week).
const MAX_INTERVAL_MS: u64 = 7 * 24 * 60 * 60 * 1000;

/// Simulated emotion sampler and session minute ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_emotion_interval_ms")]
    pub emotion_interval_ms: u64,
    #[serde(default = "default_minute_interval_ms")]
    pub minute_interval_ms: u64,
    /// Fixed seed for the sampler's randomness (None = entropy).
    #[serde(default)]
    pub seed: Option<u64>,
}

/// One presentation surface and its delivery scheduler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    pub id: String,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_minimum_cooldown_ms")]
    pub minimum_cooldown_ms: u64,
    #[serde(default = "default_show_probability")]
    pub show_probability: f64,
    #[serde(default = "default_display_duration_ms")]
    pub display_duration_ms: u64,
    #[serde(default = "default_immediate_display_duration_ms")]
    pub immediate_display_duration_ms: u64,
    #[serde(default = "default_true")]
    pub defer_first_delivery: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinatorSettings {
    #[serde(default)]
    pub global_cooldown_ms: u64,
    #[serde(default)]
    pub routing: RoutingPolicy,
}

/// Static content: course names by id and canned encouragement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_courses")]
    pub courses: BTreeMap<String, String>,
    #[serde(default = "default_encouragements")]
    pub encouragements: Vec<String>,
    #[serde(default = "default_lesson")]
    pub default_lesson: String,
}

/// Context the session starts with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_course")]
    pub course: String,
    #[serde(default = "default_session_lesson")]
    pub lesson: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default = "default_surfaces")]
    pub surfaces: Vec<SurfaceConfig>,
    #[serde(default)]
    pub coordinator: CoordinatorSettings,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_emotion_interval_ms() -> u64 {
    15_000
}
fn default_minute_interval_ms() -> u64 {
    60_000
}
fn default_tick_interval_ms() -> u64 {
    12_000
}
fn default_minimum_cooldown_ms() -> u64 {
    20_000
}
fn default_show_probability() -> f64 {
    0.7
}
fn default_display_duration_ms() -> u64 {
    10_000
}
fn default_immediate_display_duration_ms() -> u64 {
    6_000
}
fn default_surfaces() -> Vec<SurfaceConfig> {
    vec![SurfaceConfig::avatar(), SurfaceConfig::chat()]
}
fn default_courses() -> BTreeMap<String, String> {
    [
        ("1", "Advanced Mathematics"),
        ("2", "Computer Science Fundamentals"),
        ("3", "Physics: From Classical to Quantum"),
        ("4", "Creative Writing Workshop"),
    ]
    .into_iter()
    .map(|(id, name)| (id.to_string(), name.to_string()))
    .collect()
}
fn default_encouragements() -> Vec<String> {
    [
        "You're doing great! Keep up the excellent work!",
        "I'm here to help if you need any clarification.",
        "Remember to take breaks when you need them.",
        "Your focus today has been impressive!",
        "Feel free to ask me anything about the material.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_lesson() -> String {
    "Current Lesson".into()
}
fn default_course() -> String {
    "Advanced Mathematics".into()
}
fn default_session_lesson() -> String {
    "Introduction to Derivatives".into()
}
fn default_difficulty() -> Difficulty {
    Difficulty::Medium
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            emotion_interval_ms: default_emotion_interval_ms(),
            minute_interval_ms: default_minute_interval_ms(),
            seed: None,
        }
    }
}

impl SurfaceConfig {
    /// Floating avatar: frequent checks, short cooldown, likely to speak.
    pub fn avatar() -> Self {
        Self {
            id: "avatar".into(),
            tick_interval_ms: 12_000,
            minimum_cooldown_ms: 20_000,
            show_probability: 0.7,
            display_duration_ms: 10_000,
            immediate_display_duration_ms: 6_000,
            defer_first_delivery: true,
        }
    }

    /// Chat panel: sparse checks, long cooldown, rarely speaks.
    pub fn chat() -> Self {
        Self {
            id: "chat".into(),
            tick_interval_ms: 30_000,
            minimum_cooldown_ms: 120_000,
            show_probability: 0.3,
            display_duration_ms: 10_000,
            immediate_display_duration_ms: 6_000,
            defer_first_delivery: true,
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick_interval: millis(self.tick_interval_ms),
            minimum_cooldown: millis(self.minimum_cooldown_ms),
            show_probability: self.show_probability,
            display_duration: millis(self.display_duration_ms),
            immediate_display_duration: millis(self.immediate_display_duration_ms),
            defer_first_delivery: self.defer_first_delivery,
        }
    }
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            global_cooldown_ms: 0,
            routing: RoutingPolicy::Originating,
        }
    }
}

impl CoordinatorSettings {
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            global_cooldown: millis(self.global_cooldown_ms),
            routing: self.routing.clone(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            courses: default_courses(),
            encouragements: default_encouragements(),
            default_lesson: default_lesson(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            course: default_course(),
            lesson: default_session_lesson(),
            difficulty: default_difficulty(),
        }
    }
}

impl SessionConfig {
    pub fn initial_context(&self, started_at: DateTime<Utc>) -> LearningContext {
        LearningContext::new(&self.course, &self.lesson, self.difficulty, started_at)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sampler: SamplerConfig::default(),
            surfaces: default_surfaces(),
            coordinator: CoordinatorSettings::default(),
            catalog: CatalogConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn surface(&self, id: &str) -> Option<&SurfaceConfig> {
        self.surfaces.iter().find(|s| s.id == id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampler.enabled {
            check_interval("sampler.emotion_interval_ms", self.sampler.emotion_interval_ms)?;
            check_interval("sampler.minute_interval_ms", self.sampler.minute_interval_ms)?;
        }

        let mut seen = HashSet::new();
        for surface in &self.surfaces {
            if surface.id.trim().is_empty() {
                return Err(ConfigError::invalid("surfaces.id", "surface id must not be empty"));
            }
            if !seen.insert(surface.id.as_str()) {
                return Err(ConfigError::invalid(
                    "surfaces.id",
                    format!("duplicate surface id '{}'", surface.id),
                ));
            }

            let key = |field: &str| format!("surfaces.{}.{}", surface.id, field);
            check_interval(&key("tick_interval_ms"), surface.tick_interval_ms)?;
            check_interval(&key("display_duration_ms"), surface.display_duration_ms)?;
            check_interval(
                &key("immediate_display_duration_ms"),
                surface.immediate_display_duration_ms,
            )?;
            if surface.minimum_cooldown_ms > MAX_INTERVAL_MS {
                return Err(ConfigError::invalid(
                    key("minimum_cooldown_ms"),
                    format!("must be at most {MAX_INTERVAL_MS}"),
                ));
            }
            if !(0.0..=1.0).contains(&surface.show_probability) {
                return Err(ConfigError::invalid(
                    key("show_probability"),
                    format!("{} is outside [0, 1]", surface.show_probability),
                ));
            }
        }

        if self.coordinator.global_cooldown_ms > MAX_INTERVAL_MS {
            return Err(ConfigError::invalid(
                "coordinator.global_cooldown_ms",
                format!("must be at most {MAX_INTERVAL_MS}"),
            ));
        }
        if let RoutingPolicy::Pinned(pinned) = &self.coordinator.routing {
            if self.surface(pinned).is_none() {
                return Err(ConfigError::invalid(
                    "coordinator.routing",
                    format!("pinned surface '{pinned}' is not configured"),
                ));
            }
        }

        if self.catalog.encouragements.is_empty() {
            return Err(ConfigError::invalid(
                "catalog.encouragements",
                "at least one message is required",
            ));
        }

        Ok(())
    }
}

fn check_interval(key: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_INTERVAL_MS {
        return Err(ConfigError::invalid(
            key,
            format!("must be between 1 and {MAX_INTERVAL_MS} ms"),
        ));
    }
    Ok(())
}
