//! Bounded-concurrency batch resolution.
//!
//! [`BatchRunner`] keeps at most `concurrency` spawned workers in flight and
//! yields `(item, result)` pairs in completion order. A new item is spawned
//! each time one finishes. Dropping the stream stops scheduling; workers
//! already spawned run to completion and their results are discarded.

use std::collections::{BTreeSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{BoxStream, FuturesUnordered};
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;

use crate::dns::engine::DnsEngine;
use crate::dns::extract::extract_targets;
use crate::dns::resolution::ResolveOptions;
use crate::dns::types::{ExtractedResolution, Query, RecordTypeSelector};
use crate::error_handling::EngineError;

type SpawnFn<I, R> = Box<dyn FnMut(I) -> JoinHandle<(I, R)> + Send>;

/// Lazy stream of worker results with a sliding concurrency window.
pub struct BatchRunner<I, R> {
    pending: VecDeque<I>,
    in_flight: FuturesUnordered<JoinHandle<(I, R)>>,
    spawn: SpawnFn<I, R>,
    concurrency: usize,
}

impl<I, R> BatchRunner<I, R>
where
    I: Clone + Send + 'static,
    R: Send + 'static,
{
    /// Creates a runner. Nothing is spawned until the stream is first polled.
    pub fn new<F, Fut>(items: impl IntoIterator<Item = I>, concurrency: usize, worker: F) -> Self
    where
        F: Fn(I) -> Fut + Send + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let spawn = move |item: I| {
            let work = worker(item.clone());
            tokio::spawn(async move { (item, work.await) })
        };
        Self {
            pending: items.into_iter().collect(),
            in_flight: FuturesUnordered::new(),
            spawn: Box::new(spawn),
            concurrency: concurrency.max(1),
        }
    }

    fn fill(&mut self) {
        while self.in_flight.len() < self.concurrency {
            let Some(item) = self.pending.pop_front() else {
                break;
            };
            let handle = (self.spawn)(item);
            self.in_flight.push(handle);
        }
    }

    /// Items not yet scheduled.
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Workers currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

// No field is structurally pinned
impl<I, R> Unpin for BatchRunner<I, R> {}

impl<I, R> Stream for BatchRunner<I, R>
where
    I: Clone + Send + 'static,
    R: Send + 'static,
{
    type Item = (I, R);

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        this.fill();
        loop {
            match this.in_flight.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(done))) => {
                    this.fill();
                    return Poll::Ready(Some(done));
                }
                Poll::Ready(Some(Err(join_error))) => {
                    log::error!("{}", EngineError::Worker(join_error.to_string()));
                    this.fill();
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl DnsEngine {
    /// Resolves many queries concurrently.
    ///
    /// Yields `(query, values)` for every query that produced at least one value.
    pub fn resolve_batch<Q>(
        &self,
        queries: Q,
        selector: RecordTypeSelector,
    ) -> BoxStream<'static, (String, BTreeSet<String>)>
    where
        Q: IntoIterator<Item = String>,
    {
        let engine = self.clone();
        BatchRunner::new(queries, self.config().batch_concurrency(), move |query: String| {
            let engine = engine.clone();
            async move {
                match engine.resolve(&query, selector).await {
                    Ok(values) => values,
                    Err(e) => {
                        log::warn!("Failed to resolve \"{query}\" in batch: {e}");
                        BTreeSet::new()
                    }
                }
            }
        })
        .filter(|(_, values)| futures::future::ready(!values.is_empty()))
        .boxed()
    }

    /// Resolves `(target, type)` queries concurrently and extracts their targets.
    ///
    /// Yields every query that produced targets or errors.
    pub fn resolve_raw_batch<Q>(&self, queries: Q) -> BoxStream<'static, (Query, ExtractedResolution)>
    where
        Q: IntoIterator<Item = Query>,
    {
        let engine = self.clone();
        BatchRunner::new(queries, self.config().batch_concurrency(), move |query: Query| {
            let engine = engine.clone();
            async move {
                let raw = match engine
                    .resolve_raw(&query.target, query.rdtype.into(), ResolveOptions::default())
                    .await
                {
                    Ok(raw) => raw,
                    Err(e) => {
                        log::warn!("Failed to resolve {query} in batch: {e}");
                        return ExtractedResolution::default();
                    }
                };
                ExtractedResolution {
                    targets: raw.records().flat_map(extract_targets).collect(),
                    errors: raw.errors.into_iter().map(|(_, e)| e).collect(),
                }
            }
        })
        .filter(|(_, extracted)| {
            futures::future::ready(!extracted.targets.is_empty() || !extracted.errors.is_empty())
        })
        .boxed()
    }
}
