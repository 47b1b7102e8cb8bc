//! Random status-message source.
//!
//! Picks content and category uniformly from fixed pools. Timestamps come from
//! the injected clock and are clamped so they never go backwards.

use std::sync::Arc;

use beacon_shared::time::{Clock, SystemClock};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::domain::{
    Message, MessageCategory, MessageContent, MessageSource, MessageSourceError, Timestamp,
};

pub const SAMPLE_MESSAGES: [&str; 10] = [
    "Sistema funcionando normalmente",
    "Processamento de dados em andamento",
    "Nova atualização disponível",
    "Backup realizado com sucesso",
    "Conexão com banco de dados estável",
    "Monitoramento ativo",
    "Cache atualizado",
    "Logs sendo processados",
    "Métricas coletadas",
    "Serviço em operação",
];

pub struct RandomMessageSource {
    rng: StdRng,
    clock: Arc<dyn Clock>,
    last_timestamp: Option<Timestamp>,
}

impl RandomMessageSource {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy(), Arc::new(SystemClock))
    }

    pub fn with_rng(rng: StdRng, clock: Arc<dyn Clock>) -> Self {
        Self {
            rng,
            clock,
            last_timestamp: None,
        }
    }

    pub fn seeded(seed: u64, clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), clock)
    }

    fn next_timestamp(&mut self) -> Timestamp {
        let now = Timestamp::new(self.clock.now());
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);
        timestamp
    }
}

impl Default for RandomMessageSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageSource for RandomMessageSource {
    fn next_message(&mut self) -> Result<Message, MessageSourceError> {
        let content = SAMPLE_MESSAGES
            .choose(&mut self.rng)
            .ok_or_else(|| MessageSourceError::Unavailable("empty content pool".to_string()))?;
        let category = *MessageCategory::ALL
            .choose(&mut self.rng)
            .ok_or_else(|| MessageSourceError::Unavailable("empty category pool".to_string()))?;

        let content = MessageContent::new(content.to_string())?;
        Ok(Message::new(content, category, self.next_timestamp()))
    }
}
