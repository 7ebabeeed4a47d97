//! Concurrent request coalescing for the blocking synthesis call.
//!
//! The physical generation call carries a large fixed overhead, so
//! compatible requests that arrive together are merged into one call.
//! Coordination follows a leader/follower protocol: the first caller to
//! arrive while no drain loop is active becomes the leader and drives the
//! loop on behalf of everyone; later callers enqueue and wait on their own
//! one-shot result slot.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Mutex;

use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::SynthesisOutput;
use crate::runtime::types::BatchKey;

type RunBatchFn = Box<dyn FnOnce(Vec<String>) -> Result<SynthesisOutput> + Send + 'static>;

struct PendingRequest {
    texts: Vec<String>,
    /// Requests sharing a key carry equivalent closures; the first one in
    /// a bucket runs on behalf of the whole bucket.
    run_batch: Option<RunBatchFn>,
    slot: oneshot::Sender<Result<SynthesisOutput>>,
}

struct BatcherState {
    queue: HashMap<BatchKey, Vec<PendingRequest>>,
    draining: bool,
}

/// Merges concurrent compatible requests into single physical calls while
/// preserving per-caller result isolation.
pub struct InferenceBatcher {
    state: Mutex<BatcherState>,
}

impl Default for InferenceBatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBatcher {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(BatcherState {
                queue: HashMap::new(),
                draining: false,
            }),
        }
    }

    /// Submit a request and await this caller's slice of the batched
    /// result.
    ///
    /// `run_batch` receives the combined text list of its bucket and runs
    /// on the blocking worker pool. The returned future may be abandoned
    /// (e.g. by a timeout) without affecting the batch or other waiters;
    /// once a request is folded into an executing batch the underlying
    /// computation cannot be cancelled.
    pub async fn submit<F>(
        &self,
        key: BatchKey,
        texts: Vec<String>,
        run_batch: F,
    ) -> Result<SynthesisOutput>
    where
        F: FnOnce(Vec<String>) -> Result<SynthesisOutput> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let request = PendingRequest {
            texts,
            run_batch: Some(Box::new(run_batch)),
            slot: tx,
        };

        // Bucket append and leader election share one critical section, so
        // there is never more than one active drain loop.
        let is_leader = {
            let mut state = self.state.lock().expect("batcher lock poisoned");
            state.queue.entry(key).or_default().push(request);
            if state.draining {
                false
            } else {
                state.draining = true;
                true
            }
        };

        if is_leader {
            self.drain().await;
        }

        rx.await
            .map_err(|_| Error::BatchExecutionError("result slot dropped before completion".into()))?
    }

    /// Number of requests waiting for the next drain pass.
    pub fn queued(&self) -> usize {
        let state = self.state.lock().expect("batcher lock poisoned");
        state.queue.values().map(Vec::len).sum()
    }

    /// Whether a drain loop is currently running.
    pub fn is_active(&self) -> bool {
        self.state.lock().expect("batcher lock poisoned").draining
    }

    /// Leader loop: swap the whole queue for an empty one and execute every
    /// captured bucket, until the queue is observed empty under the lock.
    ///
    /// Buckets enqueued by followers after a swap are picked up by a later
    /// iteration, so no request is ever stranded without a leader.
    async fn drain(&self) {
        loop {
            let pending = {
                let mut state = self.state.lock().expect("batcher lock poisoned");
                if state.queue.is_empty() {
                    state.draining = false;
                    return;
                }
                std::mem::take(&mut state.queue)
            };

            for (key, requests) in pending {
                Self::execute_batch(&key, requests).await;
            }
        }
    }

    /// Combine one bucket's texts, run the physical call off the async
    /// context, and distribute each request's slice back to its slot.
    async fn execute_batch(key: &BatchKey, mut requests: Vec<PendingRequest>) {
        let mut combined: Vec<String> = Vec::new();
        let mut spans: Vec<Range<usize>> = Vec::with_capacity(requests.len());
        for request in &mut requests {
            let start = combined.len();
            combined.append(&mut request.texts);
            spans.push(start..combined.len());
        }

        let Some(run_batch) = requests.first_mut().and_then(|r| r.run_batch.take()) else {
            return;
        };

        debug!(
            model = %key.variant,
            requests = requests.len(),
            items = combined.len(),
            "Executing synthesis batch"
        );

        let outcome = tokio::task::spawn_blocking(move || run_batch(combined)).await;

        match outcome {
            Ok(Ok(output)) => Self::distribute(requests, spans, output),
            Ok(Err(err)) => Self::fail_bucket(requests, err.to_string()),
            Err(join_err) => {
                Self::fail_bucket(requests, format!("synthesis worker panicked: {join_err}"))
            }
        }
    }

    /// Slice the combined result back per request, in submission order.
    fn distribute(
        requests: Vec<PendingRequest>,
        spans: Vec<Range<usize>>,
        output: SynthesisOutput,
    ) {
        let expected = spans.last().map_or(0, |span| span.end);
        if output.clips.len() != expected {
            let message = format!(
                "backend returned {} clips for {} inputs",
                output.clips.len(),
                expected
            );
            Self::fail_bucket(requests, message);
            return;
        }

        for (request, span) in requests.into_iter().zip(spans) {
            let slice = SynthesisOutput {
                clips: output.clips[span].to_vec(),
                sample_rate: output.sample_rate,
            };
            // A closed slot means the caller stopped waiting; that is
            // caller-local and never disturbs the rest of the bucket.
            let _ = request.slot.send(Ok(slice));
        }
    }

    /// Merged requests share one physical invocation, so a backend failure
    /// fails the whole bucket. Other buckets are unaffected.
    fn fail_bucket(requests: Vec<PendingRequest>, message: String) {
        for request in requests {
            let _ = request
                .slot
                .send(Err(Error::BatchExecutionError(message.clone())));
        }
    }
}
