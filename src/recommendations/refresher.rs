use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{RecommendationEngine, RecommendedPokemon};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// The most recently published recommendations. `seq` 0 means nothing has
/// been published yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationBatch {
    pub seq: u64,
    pub pokemon: Vec<RecommendedPokemon>,
}

/// Refreshes recommendations on a fixed interval. Refreshes may overlap when
/// the catalog is slower than the interval; a completion is only published
/// if no newer refresh has been published before it.
pub struct RecommendationRefresher {
    engine: RecommendationEngine,
    interval: Duration,
    next_seq: AtomicU64,
    latest: watch::Sender<RecommendationBatch>,
}

impl RecommendationRefresher {
    pub fn new(engine: RecommendationEngine, interval: Duration) -> Arc<Self> {
        let (latest, _) = watch::channel(RecommendationBatch::default());
        Arc::new(Self {
            engine,
            interval,
            next_seq: AtomicU64::new(1),
            latest,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<RecommendationBatch> {
        self.latest.subscribe()
    }

    pub fn latest(&self) -> RecommendationBatch {
        self.latest.borrow().clone()
    }

    fn claim_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Publish `pokemon` as refresh `seq` unless something newer is already out.
    pub fn offer(&self, seq: u64, pokemon: Vec<RecommendedPokemon>) -> bool {
        self.latest.send_if_modified(|current| {
            if seq <= current.seq {
                return false;
            }
            *current = RecommendationBatch { seq, pokemon };
            true
        })
    }

    pub async fn refresh_once(&self) -> bool {
        let seq = self.claim_seq();
        let pokemon = self.engine.recommendations().await;

        let published = self.offer(seq, pokemon);
        if !published {
            log_warn!("Discarded stale recommendation refresh #{}", seq);
        }
        published
    }

    /// Run until `cancel` fires. The first refresh starts immediately.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let refresher = self;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(refresher.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let refresher = Arc::clone(&refresher);
                        let cancel = cancel.clone();
                        tokio::spawn(async move {
                            tokio::select! {
                                _ = refresher.refresh_once() => {}
                                _ = cancel.cancelled() => {}
                            }
                        });
                    }
                    _ = cancel.cancelled() => {
                        log_info!("recommendation refresher shutting down");
                        break;
                    }
                }
            }
        })
    }
}
