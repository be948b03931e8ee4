//! Simulated external collaborators: an emotion sampler standing in for the
//! camera pipeline, and the session ticker that accumulates minutes.
//! Both only talk to the reactor through its command channel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::kernel::gate::RandomSource;
use crate::kernel::reactor::Command;
use crate::kernel::signal::{Emotion, EmotionReading};
use crate::kernel::time::Clock;

pub const CONFIDENCE_FLOOR: f32 = 0.6;
const CONFIDENCE_SPAN: f32 = 0.4;

/// Uniform emotion, confidence in [0.6, 1.0).
pub fn sample_reading(source: &mut dyn RandomSource, at: DateTime<Utc>) -> EmotionReading {
    let index = source.pick_index(Emotion::ALL.len()).min(Emotion::ALL.len() - 1);
    let confidence = CONFIDENCE_FLOOR + source.next_unit() as f32 * CONFIDENCE_SPAN;
    EmotionReading::new(Emotion::ALL[index], confidence, at)
}

pub struct EmotionSampler {
    period: Duration,
    source: Box<dyn RandomSource>,
    clock: Arc<dyn Clock>,
}

impl EmotionSampler {
    pub fn new(period: Duration, source: Box<dyn RandomSource>, clock: Arc<dyn Clock>) -> Self {
        Self { period, source, clock }
    }

    pub async fn run(mut self, tx: mpsc::Sender<Command>, token: CancellationToken) {
        let mut cadence = interval_at(Instant::now() + self.period, self.period);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = cadence.tick() => {
                    let reading = sample_reading(self.source.as_mut(), self.clock.now());
                    debug!(emotion = %reading.emotion, confidence = reading.confidence, "Sampled emotion");
                    if tx.send(Command::IngestEmotion(reading)).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

/// Adds one session minute per period.
pub struct SessionTicker {
    period: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionTicker {
    pub fn new(period: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { period, clock }
    }

    pub async fn run(self, tx: mpsc::Sender<Command>, token: CancellationToken) {
        let mut cadence = interval_at(Instant::now() + self.period, self.period);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = cadence.tick() => {
                    let at = self.clock.now();
                    if tx.send(Command::MinuteElapsed { at }).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}
