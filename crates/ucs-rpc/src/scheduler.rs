//! Debounced request batching.
//!
//! A scheduler owns a map from caller-chosen keys (typically the RPC
//! endpoint URL) to buckets of pending requests. The first `schedule`
//! call for a key arms a debounce timer; later calls in the same window
//! append to the bucket without re-arming it. On timer fire, forced
//! split, or an explicit `flush`, the bucket is detached from the map
//! under the lock, so a late arrival can never join an in-flight batch
//! and no bucket is flushed twice.
//!
//! The store is an explicit field rather than a process-global so tests
//! can run independent schedulers side by side.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{oneshot, Mutex};
use tracing::debug;

#[derive(Debug, Clone, Error)]
pub enum SchedulerError {
	#[error("batch call failed: {0}")]
	Batch(String),

	#[error("batch returned {got} results for {expected} requests")]
	ResultCountMismatch { expected: usize, got: usize },

	#[error("scheduler dropped the request before resolving it")]
	Dropped,
}

/// The underlying batched operation: one invocation per flushed bucket,
/// with the pending arguments in arrival order. Results must come back in
/// the same order unless the scheduler was given a `sort` comparator.
#[async_trait]
pub trait BatchFn<A, R>: Send + Sync {
	async fn call(&self, batch: Vec<A>) -> Result<Vec<R>, String>;
}

type Waiter<R> = oneshot::Sender<Result<(R, Arc<Vec<R>>), SchedulerError>>;
type SplitFn<A> = dyn Fn(&[A], &A) -> bool + Send + Sync;
type SortFn<R> = dyn Fn(&R, &R) -> Ordering + Send + Sync;

struct Bucket<A, R> {
	args: Vec<A>,
	waiters: Vec<Waiter<R>>,
	generation: u64,
}

struct Inner<A, R> {
	store: Mutex<HashMap<String, Bucket<A, R>>>,
	batch_fn: Arc<dyn BatchFn<A, R>>,
	wait: Duration,
	should_split: Option<Box<SplitFn<A>>>,
	sort: Option<Box<SortFn<R>>>,
	generations: AtomicU64,
}

/// Coalesces concurrent `schedule` calls per key into shared batches.
pub struct BatchScheduler<A, R> {
	inner: Arc<Inner<A, R>>,
}

impl<A, R> Clone for BatchScheduler<A, R> {
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<A, R> BatchScheduler<A, R>
where
	A: Send + 'static,
	R: Clone + Send + Sync + 'static,
{
	pub fn new(batch_fn: Arc<dyn BatchFn<A, R>>) -> Self {
		Self {
			inner: Arc::new(Inner {
				store: Mutex::new(HashMap::new()),
				batch_fn,
				wait: Duration::ZERO,
				should_split: None,
				sort: None,
				generations: AtomicU64::new(0),
			}),
		}
	}

	/// Debounce window; the default of zero flushes on the next tick.
	pub fn with_wait(self, wait: Duration) -> Self {
		self.map_inner(|inner| inner.wait = wait)
	}

	/// Bounds batch size: when the predicate returns true for the current
	/// bucket and an incoming entry, the bucket flushes immediately and
	/// the entry opens a fresh one.
	pub fn with_split(self, f: impl Fn(&[A], &A) -> bool + Send + Sync + 'static) -> Self {
		self.map_inner(|inner| inner.should_split = Some(Box::new(f)))
	}

	/// Reorders raw results before fan-out, for transports that do not
	/// answer in request order. Callers still receive the result at their
	/// own arrival index after sorting.
	pub fn with_sort(self, f: impl Fn(&R, &R) -> Ordering + Send + Sync + 'static) -> Self {
		self.map_inner(|inner| inner.sort = Some(Box::new(f)))
	}

	fn map_inner(mut self, apply: impl FnOnce(&mut Inner<A, R>)) -> Self {
		let inner = Arc::get_mut(&mut self.inner)
			.expect("scheduler options are set before the scheduler is shared");
		apply(inner);
		self
	}

	/// Enqueues `args` under `key` and waits for the batch it lands in.
	/// Resolves with this call's own result plus the full result array of
	/// the shared batch.
	pub async fn schedule(&self, key: &str, args: A) -> Result<(R, Arc<Vec<R>>), SchedulerError> {
		let (tx, rx) = oneshot::channel();

		let split_bucket = {
			let mut store = self.inner.store.lock().await;

			let split_bucket = match (&self.inner.should_split, store.get(key)) {
				(Some(should_split), Some(bucket)) if should_split(&bucket.args, &args) => {
					debug!(key, size = bucket.args.len(), "forced batch split");
					store.remove(key)
				}
				_ => None,
			};

			match store.get_mut(key) {
				Some(bucket) => {
					bucket.args.push(args);
					bucket.waiters.push(tx);
				}
				None => {
					let generation =
						self.inner.generations.fetch_add(1, AtomicOrdering::Relaxed);
					store.insert(
						key.to_string(),
						Bucket {
							args: vec![args],
							waiters: vec![tx],
							generation,
						},
					);
					self.arm_timer(key.to_string(), generation);
				}
			}

			split_bucket
		};

		if let Some(bucket) = split_bucket {
			let inner = self.inner.clone();
			tokio::spawn(async move { run_batch(&inner, bucket).await });
		}

		rx.await.map_err(|_| SchedulerError::Dropped)?
	}

	/// Flushes the pending bucket for `key` immediately, if any.
	pub async fn flush(&self, key: &str) {
		let bucket = self.inner.store.lock().await.remove(key);
		if let Some(bucket) = bucket {
			run_batch(&self.inner, bucket).await;
		}
	}

	/// One timer per bucket, armed at creation and never re-armed. The
	/// generation check makes a stale timer a no-op once its bucket has
	/// been flushed by a split or an explicit flush.
	fn arm_timer(&self, key: String, generation: u64) {
		let inner = self.inner.clone();
		let wait = self.inner.wait;
		tokio::spawn(async move {
			tokio::time::sleep(wait).await;

			let bucket = {
				let mut store = inner.store.lock().await;
				match store.get(&key) {
					Some(bucket) if bucket.generation == generation => store.remove(&key),
					_ => None,
				}
			};

			if let Some(bucket) = bucket {
				run_batch(&inner, bucket).await;
			}
		});
	}
}

async fn run_batch<A, R>(inner: &Inner<A, R>, bucket: Bucket<A, R>)
where
	A: Send + 'static,
	R: Clone + Send + Sync + 'static,
{
	let Bucket { args, waiters, .. } = bucket;
	let expected = waiters.len();
	debug!(size = expected, "executing batch");

	let mut results = match inner.batch_fn.call(args).await {
		Ok(results) => results,
		Err(message) => {
			let error = SchedulerError::Batch(message);
			for waiter in waiters {
				let _ = waiter.send(Err(error.clone()));
			}
			return;
		}
	};

	if results.len() != expected {
		let error = SchedulerError::ResultCountMismatch {
			expected,
			got: results.len(),
		};
		for waiter in waiters {
			let _ = waiter.send(Err(error.clone()));
		}
		return;
	}

	if let Some(sort) = &inner.sort {
		results.sort_by(|a, b| sort(a, b));
	}

	let shared = Arc::new(results);
	for (index, waiter) in waiters.into_iter().enumerate() {
		let _ = waiter.send(Ok((shared[index].clone(), shared.clone())));
	}
}
