// Rate-limited request queue for the weather provider.
//
// Submitted operations are launched FIFO, at most `max_concurrent` at a time.
// Requests waiting in a backlog are spaced `min_delay` apart; a request that
// reaches an empty queue launches at once. Successful operations count against a
// daily quota that is persisted through a KeyValueStore, so a restart on the
// same calendar day keeps the count.

use std::{collections::VecDeque, future::Future, sync::Arc, time::Duration};

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::{sync::oneshot, time::Instant};
use tracing::{debug, info, warn};

use crate::{clock::Clock, error::ApiError, store::KeyValueStore};

pub const QUOTA_STORAGE_KEY: &str = "weather_api_usage";

#[derive(Debug, Clone)]
pub struct GateConfig {
    pub max_concurrent: usize,
    pub min_delay: Duration,
    pub daily_quota: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            min_delay: Duration::from_millis(1000),
            daily_quota: 1000,
        }
    }
}

/// Persisted shape of the daily counter: `{"date": "2025-06-01", "count": 12}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaRecord {
    pub date: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateStatus {
    pub used: u32,
    pub limit: u32,
    pub active: usize,
    pub queued: usize,
    pub can_submit: bool,
}

// Type-erased job. It settles its own bookkeeping through Inner::finish before
// handing the result back to the caller.
type Job = Box<dyn FnOnce(Arc<Inner>) -> BoxFuture<'static, ()> + Send>;

struct QueuedRequest {
    job: Job,
    enqueued_at_millis: i64,
}

struct GateState {
    pending: VecDeque<QueuedRequest>,
    active: usize,
    draining: bool,
    last_launch: Option<Instant>,
    quota: QuotaRecord,
}

enum Step {
    Idle,
    Wait(Instant),
    Launch(QueuedRequest),
}

struct Inner {
    config: GateConfig,
    state: Mutex<GateState>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

#[derive(Clone)]
pub struct RequestGate {
    inner: Arc<Inner>,
}

impl RequestGate {
    pub fn new(mut config: GateConfig, store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        config.max_concurrent = config.max_concurrent.max(1);

        let today = clock.today().to_string();
        let quota = load_quota(store.as_ref(), &today);
        debug!(date = %quota.date, used = quota.count, "weather quota loaded");

        Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(GateState {
                    pending: VecDeque::new(),
                    active: 0,
                    draining: false,
                    last_launch: None,
                    quota,
                }),
                store,
                clock,
            }),
        }
    }

    /// Queue `operation` and wait for its result. Rejects with
    /// `ApiError::QuotaExhausted` without ever calling `operation` when the
    /// daily quota is used up. Errors from the operation come back unchanged.
    pub async fn submit<T, F, Fut>(&self, operation: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        {
            let mut state = self.inner.state.lock();
            self.inner.roll_day(&mut state);

            let limit = self.inner.config.daily_quota;
            if state.quota.count >= limit {
                warn!(used = state.quota.count, limit, "weather quota exhausted, rejecting request");
                return Err(ApiError::QuotaExhausted {
                    used: state.quota.count,
                    limit,
                });
            }

            let job: Job = Box::new(move |inner: Arc<Inner>| {
                async move {
                    let result = operation().await;
                    inner.finish(result.is_ok());
                    // the caller may have stopped listening, the result is dropped then
                    let _ = tx.send(result);
                }
                .boxed()
            });

            state.pending.push_back(QueuedRequest {
                job,
                enqueued_at_millis: self.inner.clock.now_millis(),
            });
            debug!(queued = state.pending.len(), "weather request queued");
        }

        Inner::kick(&self.inner);

        rx.await
            .unwrap_or_else(|_| Err(ApiError::Other("request aborted before completion".to_string())))
    }

    pub fn status(&self) -> GateStatus {
        let state = self.inner.state.lock();
        let today = self.inner.clock.today().to_string();
        let used = if state.quota.date == today {
            state.quota.count
        } else {
            0
        };
        let limit = self.inner.config.daily_quota;

        GateStatus {
            used,
            limit,
            active: state.active,
            queued: state.pending.len(),
            can_submit: used < limit,
        }
    }
}

impl Inner {
    fn roll_day(&self, state: &mut GateState) {
        let today = self.clock.today().to_string();
        if state.quota.date != today {
            info!(previous = %state.quota.date, today = %today, "daily weather quota reset");
            state.quota = QuotaRecord {
                date: today,
                count: 0,
            };
            self.persist(&state.quota);
        }
    }

    fn persist(&self, record: &QuotaRecord) {
        match serde_json::to_string(record) {
            Ok(raw) => {
                if let Err(err) = self.store.set(QUOTA_STORAGE_KEY, raw) {
                    warn!(error = %err, "failed to persist weather quota");
                }
            }
            Err(err) => warn!(error = %err, "failed to encode weather quota"),
        }
    }

    // Start a drain loop unless one is running or there is nothing to do
    fn kick(inner: &Arc<Inner>) {
        {
            let mut state = inner.state.lock();
            if state.draining
                || state.pending.is_empty()
                || state.active >= inner.config.max_concurrent
            {
                return;
            }
            state.draining = true;
        }
        tokio::spawn(Inner::drain(inner.clone()));
    }

    async fn drain(inner: Arc<Inner>) {
        loop {
            let step = {
                let mut state = inner.state.lock();
                if state.pending.is_empty() || state.active >= inner.config.max_concurrent {
                    state.draining = false;
                    Step::Idle
                } else {
                    let now = Instant::now();
                    match state.last_launch.map(|last| last + inner.config.min_delay) {
                        Some(ready_at) if ready_at > now => Step::Wait(ready_at),
                        _ => match state.pending.pop_front() {
                            Some(request) => {
                                state.active += 1;
                                // spacing only holds back requests still waiting behind this one
                                state.last_launch = if state.pending.is_empty() {
                                    None
                                } else {
                                    Some(now)
                                };
                                Step::Launch(request)
                            }
                            None => {
                                state.draining = false;
                                Step::Idle
                            }
                        },
                    }
                }
            };

            match step {
                Step::Idle => return,
                Step::Wait(ready_at) => tokio::time::sleep_until(ready_at).await,
                Step::Launch(request) => {
                    tokio::spawn(Inner::run(inner.clone(), request));
                }
            }
        }
    }

    async fn run(inner: Arc<Inner>, request: QueuedRequest) {
        let waited_ms = inner.clock.now_millis() - request.enqueued_at_millis;
        debug!(waited_ms, "launching weather request");

        // a panicking operation never reached finish(), release its slot here
        if tokio::spawn((request.job)(inner.clone())).await.is_err() {
            warn!("weather request panicked");
            inner.finish(false);
        }
    }

    fn finish(self: &Arc<Self>, succeeded: bool) {
        {
            let mut state = self.state.lock();
            state.active = state.active.saturating_sub(1);
            if succeeded {
                self.roll_day(&mut state);
                state.quota.count += 1;
                self.persist(&state.quota);
            }
        }

        Inner::kick(self);
    }
}

fn load_quota(store: &dyn KeyValueStore, today: &str) -> QuotaRecord {
    let stored = store
        .get(QUOTA_STORAGE_KEY)
        .and_then(|raw| match serde_json::from_str::<QuotaRecord>(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(error = %err, "ignoring malformed weather quota record");
                None
            }
        });

    match stored {
        Some(record) if record.date == today => record,
        _ => QuotaRecord {
            date: today.to_string(),
            count: 0,
        },
    }
}
