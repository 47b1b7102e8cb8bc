//! Message Generator
//!
//! Background producer: on every tick it takes a message from the
//! `MessageSource` and broadcasts it to all connections, then sleeps for the
//! configured tick interval. A failed tick is logged and followed by a fixed
//! cool-down instead of the regular interval; the loop only ends when the
//! shutdown token is cancelled.

use std::{sync::Arc, time::Duration};

use rand::{Rng, SeedableRng, rngs::StdRng};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::domain::{DeliveryReport, MessageSource};

use super::{broadcast::Broadcaster, error::TickError};

/// Delay between two ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickInterval {
    Fixed(Duration),
    /// Uniformly random delay in `[min, max]` (inclusive, millisecond resolution)
    Jittered { min: Duration, max: Duration },
}

impl TickInterval {
    pub const DEFAULT_MIN: Duration = Duration::from_millis(3000);
    pub const DEFAULT_MAX: Duration = Duration::from_millis(8000);
    pub const DEFAULT_FIXED: Duration = Duration::from_millis(5000);

    /// Jittered interval; `min` and `max` are swapped if given in reverse order.
    pub fn jittered(min: Duration, max: Duration) -> Self {
        if min <= max {
            TickInterval::Jittered { min, max }
        } else {
            TickInterval::Jittered { min: max, max: min }
        }
    }

    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        match *self {
            TickInterval::Fixed(delay) => delay,
            TickInterval::Jittered { min, max } => {
                let min_ms = min.as_millis() as u64;
                let max_ms = max.as_millis() as u64;
                Duration::from_millis(rng.gen_range(min_ms..=max_ms))
            }
        }
    }
}

impl Default for TickInterval {
    fn default() -> Self {
        TickInterval::Jittered {
            min: Self::DEFAULT_MIN,
            max: Self::DEFAULT_MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub interval: TickInterval,
    /// Delay applied after a failed tick
    pub cooldown: Duration,
}

impl GeneratorConfig {
    pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(5000);
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            interval: TickInterval::default(),
            cooldown: Self::DEFAULT_COOLDOWN,
        }
    }
}

pub struct MessageGenerator {
    source: Box<dyn MessageSource>,
    broadcaster: Arc<Broadcaster>,
    config: GeneratorConfig,
    rng: StdRng,
}

impl MessageGenerator {
    pub fn new(
        source: Box<dyn MessageSource>,
        broadcaster: Arc<Broadcaster>,
        config: GeneratorConfig,
    ) -> Self {
        Self::with_rng(source, broadcaster, config, StdRng::from_entropy())
    }

    pub fn with_rng(
        source: Box<dyn MessageSource>,
        broadcaster: Arc<Broadcaster>,
        config: GeneratorConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            source,
            broadcaster,
            config,
            rng,
        }
    }

    /// Produce one message and broadcast it to all connections.
    pub async fn tick(&mut self) -> Result<DeliveryReport, TickError> {
        let message = self.source.next_message()?;
        let content = message.content.as_str().to_string();
        let report = self.broadcaster.broadcast_all(message).await?;
        tracing::info!(
            "Message sent to {} client(s): {}",
            report.delivered,
            content
        );
        Ok(report)
    }

    /// Run until `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        tracing::info!("Message generator started ({:?})", self.config.interval);

        while !shutdown.is_cancelled() {
            let delay = match self.tick().await {
                Ok(_) => self.config.interval.next_delay(&mut self.rng),
                Err(e) => {
                    tracing::error!(
                        "Failed to send message, retrying in {:?}: {}",
                        self.config.cooldown,
                        e
                    );
                    self.config.cooldown
                }
            };

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        tracing::info!("Message generator stopped");
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
