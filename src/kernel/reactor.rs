use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::coordinator::DeliveryCoordinator;
use super::gate::{RandomSource, RngSource};
use super::scheduler::{DeliveryScheduler, TickOutcome};
use super::signal::{ContextPatch, EmotionReading, LearningContext, SignalDelta, SignalStore};
use super::suggestion::{Suggestion, SuggestionId};
use super::surface::{DisplayPhase, SurfaceEvent, SurfaceId};
use super::telemetry::event::TelemetryEvent;
use super::telemetry::metrics::TelemetrySnapshot;
use super::telemetry::recorder::TelemetryRecorder;
use super::time::Clock;
use crate::catalog::CourseCatalog;
use crate::config::{AppConfig, SamplerConfig};
use crate::error::{NudgeError, ReactorError};
use crate::sampler::{EmotionSampler, SessionTicker};

const COMMAND_CAPACITY: usize = 100;
const EVENT_CAPACITY: usize = 100;

/// Everything that can reach the reactor. All of it is applied on one task, in arrival order.
#[derive(Debug)]
pub enum Command {
    IngestEmotion(EmotionReading),
    PatchContext(ContextPatch),
    /// Learner opened a course page.
    Navigate { course_id: String },
    MinuteElapsed { at: DateTime<Utc> },
    Tick(SurfaceId),
    Dismiss(SurfaceId),
    /// `None` picks a canned encouragement from the catalog.
    TriggerImmediate {
        surface: SurfaceId,
        suggestion: Option<Suggestion>,
    },
    Expire {
        surface: SurfaceId,
        suggestion_id: SuggestionId,
    },
    Unregister(SurfaceId),
    Snapshot(oneshot::Sender<ReactorSnapshot>),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceStatus {
    pub surface: SurfaceId,
    pub phase: DisplayPhase,
    pub last_suggestion_at: Option<DateTime<Utc>>,
    pub shown_at: Option<DateTime<Utc>>,
    pub current: Option<Suggestion>,
}

#[derive(Debug, Clone)]
pub struct ReactorSnapshot {
    pub emotion: EmotionReading,
    pub context: LearningContext,
    /// Number of signal updates applied so far.
    pub signal_version: u64,
    pub surfaces: Vec<SurfaceStatus>,
    pub telemetry: TelemetrySnapshot,
}

/// Owns the store, the coordinator and the timers that drive them.
pub struct Reactor {
    receiver: mpsc::Receiver<Command>,
    sender: mpsc::Sender<Command>,
    pub store: SignalStore,
    pub coordinator: DeliveryCoordinator,
    pub catalog: CourseCatalog,
    pub telemetry: TelemetryRecorder,
    gate: Box<dyn RandomSource>,
    clock: Arc<dyn Clock>,
    sampler: Option<SamplerConfig>,
    token: CancellationToken,
    surface_tokens: HashMap<SurfaceId, CancellationToken>,
}

impl Reactor {
    pub fn new(
        store: SignalStore,
        coordinator: DeliveryCoordinator,
        catalog: CourseCatalog,
        gate: Box<dyn RandomSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(COMMAND_CAPACITY);
        Self {
            receiver,
            sender,
            store,
            coordinator,
            catalog,
            telemetry: TelemetryRecorder::new(),
            gate,
            clock,
            sampler: None,
            token: CancellationToken::new(),
            surface_tokens: HashMap::new(),
        }
    }

    /// Wires a reactor from configuration: one scheduler per configured surface.
    /// The configuration is validated first.
    pub fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self, NudgeError> {
        config.validate()?;
        let now = clock.now();
        let store = SignalStore::new(config.session.initial_context(now));

        let mut coordinator = DeliveryCoordinator::new(config.coordinator.coordinator_config());
        for surface in &config.surfaces {
            coordinator.register(DeliveryScheduler::new(
                surface.id.clone(),
                surface.scheduler_config(),
                now,
            ));
        }

        let gate: Box<dyn RandomSource> = match config.sampler.seed {
            // Offset so the gate and the sampler do not replay the same stream.
            Some(seed) => Box::new(RngSource::seeded(seed.wrapping_add(1))),
            None => Box::new(RngSource::from_entropy()),
        };

        let reactor = Self::new(store, coordinator, CourseCatalog::new(&config.catalog), gate, clock);
        if config.sampler.enabled {
            Ok(reactor.with_sampler(config.sampler.clone()))
        } else {
            Ok(reactor)
        }
    }

    pub fn with_sampler(mut self, sampler: SamplerConfig) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn handle(&self) -> ReactorHandle {
        ReactorHandle {
            sender: self.sender.clone(),
            token: self.token.clone(),
        }
    }

    /// Applies one command. Pure with respect to I/O: no awaits, no timers.
    /// Once shut down, every command is ignored.
    pub fn step(&mut self, command: Command) -> Vec<SurfaceEvent> {
        if self.token.is_cancelled() {
            debug!(?command, "Reactor shut down, command ignored");
            return Vec::new();
        }
        let now = self.clock.now();

        let events = match command {
            Command::IngestEmotion(reading) => {
                self.telemetry.record(TelemetryEvent::EmotionIngested {
                    emotion: reading.emotion,
                });
                self.store.ingest_emotion_reading(reading);
                Vec::new()
            }
            Command::PatchContext(patch) => {
                self.patch_context(patch);
                Vec::new()
            }
            Command::Navigate { course_id } => {
                let patch = self.catalog.navigate(&course_id);
                self.patch_context(patch);
                Vec::new()
            }
            Command::MinuteElapsed { at } => {
                self.store.reduce(SignalDelta::MinuteElapsed { at });
                Vec::new()
            }
            Command::Tick(surface) => {
                let report = self
                    .coordinator
                    .tick(&surface, now, &self.store, self.gate.as_mut());
                if let TickOutcome::Suppressed(reason) = report.outcome {
                    self.telemetry.record(TelemetryEvent::Suppressed {
                        surface: surface.clone(),
                        reason,
                    });
                }
                report.events
            }
            Command::Dismiss(surface) => self.coordinator.dismiss(&surface).into_iter().collect(),
            Command::TriggerImmediate { surface, suggestion } => {
                let suggestion = match suggestion {
                    Some(suggestion) => Some(suggestion),
                    None => self.catalog.encouragement_suggestion(self.gate.as_mut(), now),
                };
                match suggestion {
                    Some(suggestion) => self.coordinator.trigger_immediate(&surface, suggestion, now),
                    None => Vec::new(),
                }
            }
            Command::Expire {
                surface,
                suggestion_id,
            } => self
                .coordinator
                .expire(&surface, &suggestion_id, now)
                .into_iter()
                .collect(),
            Command::Unregister(surface) => {
                if let Some(token) = self.surface_tokens.remove(&surface) {
                    token.cancel();
                }
                self.coordinator.unregister(&surface).into_iter().collect()
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
                Vec::new()
            }
            Command::Shutdown => {
                self.shut_down();
                Vec::new()
            }
        };

        for event in &events {
            self.telemetry.record(TelemetryEvent::from(event));
        }
        events
    }

    pub fn snapshot(&self) -> ReactorSnapshot {
        ReactorSnapshot {
            emotion: self.store.emotion_state().clone(),
            context: self.store.learning_context().clone(),
            signal_version: self.store.version,
            surfaces: self
                .coordinator
                .schedulers()
                .iter()
                .map(|s| SurfaceStatus {
                    surface: s.surface().clone(),
                    phase: s.phase(),
                    last_suggestion_at: s.last_suggestion_at(),
                    shown_at: s.shown_at(),
                    current: s.current().cloned(),
                })
                .collect(),
            telemetry: self.telemetry.snapshot(),
        }
    }

    /// Moves the reactor onto its own task. Surface events arrive on the returned receiver.
    pub fn spawn(self) -> (ReactorHandle, mpsc::Receiver<SurfaceEvent>, JoinHandle<()>) {
        let handle = self.handle();
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
        let join = tokio::spawn(self.run(events_tx));
        (handle, events_rx, join)
    }

    /// Async driver loop.
    pub async fn run(mut self, events: mpsc::Sender<SurfaceEvent>) {
        info!(
            surfaces = self.coordinator.schedulers().len(),
            "Reactor started"
        );
        self.start_timers();

        loop {
            let command = tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                command = self.receiver.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };

            let emitted = self.step(command);
            if self.token.is_cancelled() {
                break;
            }

            for event in emitted {
                self.schedule_expiry(&event);
                if events.send(event).await.is_err() {
                    debug!("Observer dropped, event discarded");
                }
            }
        }

        self.shut_down();
        self.receiver.close();
        info!("Reactor stopped");
    }

    /// Cancels every timer and disposes every surface. Emits nothing.
    fn shut_down(&mut self) {
        self.token.cancel();
        self.coordinator.dispose_all();
    }

    fn patch_context(&mut self, patch: ContextPatch) {
        if patch.is_empty() {
            return;
        }
        self.store.update_learning_context(patch);
        self.telemetry.record(TelemetryEvent::ContextPatched);
    }

    fn start_timers(&mut self) {
        let tickers: Vec<(SurfaceId, std::time::Duration)> = self
            .coordinator
            .schedulers()
            .iter()
            .filter(|s| !s.is_disposed())
            .filter_map(|s| {
                s.config()
                    .tick_interval
                    .to_std()
                    .ok()
                    .map(|period| (s.surface().clone(), period))
            })
            .collect();

        for (surface, period) in tickers {
            let token = self.token.child_token();
            self.surface_tokens.insert(surface.clone(), token.clone());
            tokio::spawn(run_ticker(surface, period, self.sender.clone(), token));
        }

        if let Some(sampler) = &self.sampler {
            let source: Box<dyn RandomSource> = match sampler.seed {
                Some(seed) => Box::new(RngSource::seeded(seed)),
                None => Box::new(RngSource::from_entropy()),
            };
            let emotion_period = std::time::Duration::from_millis(sampler.emotion_interval_ms);
            let minute_period = std::time::Duration::from_millis(sampler.minute_interval_ms);

            let emotions = EmotionSampler::new(emotion_period, source, self.clock.clone());
            tokio::spawn(emotions.run(self.sender.clone(), self.token.child_token()));

            let minutes = SessionTicker::new(minute_period, self.clock.clone());
            tokio::spawn(minutes.run(self.sender.clone(), self.token.child_token()));
        }
    }

    /// Fires an `Expire` command when a displayed suggestion's time is up.
    /// Cancelled with its surface; a stale expiry is ignored by the scheduler.
    fn schedule_expiry(&self, event: &SurfaceEvent) {
        let SurfaceEvent::Displayed {
            surface,
            suggestion,
            expires_at,
            ..
        } = event
        else {
            return;
        };

        let delay = (*expires_at - self.clock.now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        let token = self
            .surface_tokens
            .get(surface)
            .map(|t| t.child_token())
            .unwrap_or_else(|| self.token.child_token());
        let sender = self.sender.clone();
        let command = Command::Expire {
            surface: surface.clone(),
            suggestion_id: suggestion.id.clone(),
        };

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = sender.send(command).await;
                }
            }
        });
    }
}

async fn run_ticker(
    surface: SurfaceId,
    period: std::time::Duration,
    sender: mpsc::Sender<Command>,
    token: CancellationToken,
) {
    if period.is_zero() {
        warn!(surface = %surface, "Zero tick interval, ticker not started");
        return;
    }

    let mut cadence = interval_at(Instant::now() + period, period);
    cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = cadence.tick() => {
                if sender.send(Command::Tick(surface.clone())).await.is_err() {
                    break;
                }
            }
        }
    }
    debug!(surface = %surface, "Ticker stopped");
}

/// Cheap, cloneable access to a running reactor.
#[derive(Debug, Clone)]
pub struct ReactorHandle {
    sender: mpsc::Sender<Command>,
    token: CancellationToken,
}

impl ReactorHandle {
    pub async fn send(&self, command: Command) -> Result<(), ReactorError> {
        if self.token.is_cancelled() {
            return Err(ReactorError::Closed);
        }
        self.sender.send(command).await.map_err(|_| ReactorError::Closed)
    }

    pub async fn ingest_emotion(&self, reading: EmotionReading) -> Result<(), ReactorError> {
        self.send(Command::IngestEmotion(reading)).await
    }

    pub async fn update_learning_context(&self, patch: ContextPatch) -> Result<(), ReactorError> {
        self.send(Command::PatchContext(patch)).await
    }

    pub async fn navigate(&self, course_id: impl Into<String>) -> Result<(), ReactorError> {
        self.send(Command::Navigate {
            course_id: course_id.into(),
        })
        .await
    }

    pub async fn dismiss(&self, surface: impl Into<SurfaceId>) -> Result<(), ReactorError> {
        self.send(Command::Dismiss(surface.into())).await
    }

    pub async fn trigger_immediate(&self, surface: impl Into<SurfaceId>) -> Result<(), ReactorError> {
        self.send(Command::TriggerImmediate {
            surface: surface.into(),
            suggestion: None,
        })
        .await
    }

    pub async fn trigger_with(
        &self,
        surface: impl Into<SurfaceId>,
        suggestion: Suggestion,
    ) -> Result<(), ReactorError> {
        self.send(Command::TriggerImmediate {
            surface: surface.into(),
            suggestion: Some(suggestion),
        })
        .await
    }

    pub async fn unregister(&self, surface: impl Into<SurfaceId>) -> Result<(), ReactorError> {
        self.send(Command::Unregister(surface.into())).await
    }

    pub async fn snapshot(&self) -> Result<ReactorSnapshot, ReactorError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply)).await?;
        rx.await.map_err(|_| ReactorError::Closed)
    }

    /// Stops every timer. Idempotent; later calls on any handle return `Closed`.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.sender.is_closed()
    }
}
