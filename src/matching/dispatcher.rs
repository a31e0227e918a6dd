use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::MatcherConfig;
use crate::error::{LayoutError, MatchError};
use crate::layout::TextLayoutProvider;
use crate::model::{Entity, EntityType, MatchRecord, StrategyKind};

use super::cache::{BoundsCache, CacheCounters};
use super::splitter::split;
use super::strategies::{MatchContext, Strategy};

/// Cooperative stop signal for a running batch.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub records: Vec<MatchRecord>,
    pub cancelled: bool,
}

/// Runs the strategy cascade for entities of one document.
///
/// Owns the session's [`BoundsCache`]; drop the dispatcher to end the session.
pub struct MatchDispatcher<'a> {
    provider: &'a dyn TextLayoutProvider,
    config: &'a MatcherConfig,
    cache: BoundsCache,
}

impl<'a> MatchDispatcher<'a> {
    pub fn new(provider: &'a dyn TextLayoutProvider, config: &'a MatcherConfig) -> Self {
        Self {
            provider,
            config,
            cache: BoundsCache::new(),
        }
    }

    pub fn cache_counters(&self) -> CacheCounters {
        self.cache.counters()
    }

    /// Per-type primary strategy first, then Exact, Aggregation or Partial, then Fuzzy.
    pub fn plan(&self, entity_type: &EntityType, component_count: usize) -> Vec<Strategy> {
        let mut chain = Vec::<Strategy>::with_capacity(4);
        if let Some(primary) = self
            .config
            .primary_strategy(entity_type)
            .and_then(|kind| self.strategy_for(kind))
        {
            chain.push(primary);
        }

        let middle = if component_count >= 2 {
            StrategyKind::Aggregation
        } else {
            StrategyKind::Partial
        };
        for kind in [StrategyKind::Exact, middle, StrategyKind::Fuzzy] {
            if chain.iter().any(|strategy| strategy.kind() == kind) {
                continue;
            }
            if let Some(strategy) = self.strategy_for(kind) {
                chain.push(strategy);
            }
        }

        chain
    }

    fn strategy_for(&self, kind: StrategyKind) -> Option<Strategy> {
        match kind {
            StrategyKind::Exact => Some(Strategy::Exact),
            StrategyKind::Partial => Some(Strategy::Partial),
            StrategyKind::Aggregation => Some(Strategy::Aggregation {
                proximity_threshold: self.config.proximity_threshold,
            }),
            StrategyKind::Fuzzy => Some(Strategy::Fuzzy {
                threshold: self.config.fuzzy_threshold,
            }),
            StrategyKind::None => None,
        }
    }

    pub fn match_entity(&self, entity: &Entity) -> Result<MatchRecord, MatchError> {
        if entity.entity_name.trim().is_empty() {
            debug!(entity_type = %entity.entity_type, "skipping entity with empty name");
            return Ok(MatchRecord::unmatched(entity));
        }

        let components = split(&entity.entity_name);
        let context = MatchContext {
            provider: self.provider,
            cache: &self.cache,
        };

        for strategy in self.plan(&entity.entity_type, components.len()) {
            match strategy.attempt(entity, &components, context) {
                Ok(Some(found)) => {
                    debug!(
                        entity = %entity.entity_name,
                        strategy = %found.strategy,
                        confidence = found.confidence,
                        page = found.bounds.page(),
                        "entity matched"
                    );
                    return Ok(MatchRecord {
                        entity_name: entity.entity_name.clone(),
                        entity_type: entity.entity_type.clone(),
                        match_strategy: found.strategy,
                        confidence: found.confidence,
                        bounds: Some(found.bounds),
                        component_matches: found.component_matches,
                    });
                }
                Ok(None) => {}
                Err(LayoutError::Timeout { timeout_ms }) => {
                    warn!(
                        entity = %entity.entity_name,
                        strategy = %strategy.kind(),
                        timeout_ms,
                        "text layout call timed out; treating strategy as unmatched"
                    );
                }
                Err(source) => {
                    return Err(MatchError::BatchFailure {
                        entity: entity.entity_name.clone(),
                        source,
                    });
                }
            }
        }

        debug!(entity = %entity.entity_name, components = components.len(), "entity unmatched");
        Ok(MatchRecord::unmatched(entity))
    }

    /// Matches entities in input order; stops dispatching once `cancel` fires.
    pub fn match_batch(
        &self,
        entities: &[Entity],
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome, MatchError> {
        info!(
            entities = entities.len(),
            parallel = self.config.parallel,
            "matching batch"
        );

        let records = if self.config.parallel {
            entities
                .par_iter()
                .map(|entity| {
                    if cancel.is_cancelled() {
                        Ok(None)
                    } else {
                        self.match_entity(entity).map(Some)
                    }
                })
                .collect::<Result<Vec<Option<MatchRecord>>, MatchError>>()?
                .into_iter()
                .flatten()
                .collect::<Vec<MatchRecord>>()
        } else {
            let mut records = Vec::<MatchRecord>::with_capacity(entities.len());
            for entity in entities {
                if cancel.is_cancelled() {
                    break;
                }
                records.push(self.match_entity(entity)?);
            }
            records
        };

        let cancelled = records.len() < entities.len();
        if cancelled {
            warn!(
                completed = records.len(),
                total = entities.len(),
                "batch cancelled before all entities were matched"
            );
        }

        let counters = self.cache.counters();
        info!(
            matched_records = records.len(),
            cache_entries = counters.entries,
            cache_hits = counters.hits,
            cache_misses = counters.misses,
            "batch complete"
        );

        Ok(BatchOutcome { records, cancelled })
    }
}
