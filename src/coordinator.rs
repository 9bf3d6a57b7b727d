//! Data-refresh coordination: the retry ladder and the cached last-known-good snapshot.
//!
//! One logical cycle runs `IDLE -> FETCHING -> SUCCESS | FAILURE`. Success replaces the snapshot
//! wholesale and resets the retry counter; failure increments it and either schedules a delayed
//! follow-up refresh or, once the ladder is exhausted, reports upward while still serving the
//! cached snapshot. Consumers therefore keep seeing last-known values through transient outages.

// std
use std::sync::{
	Weak,
	atomic::{AtomicU64, Ordering},
};
// crates.io
use tokio::{task::JoinHandle, time};
// self
use crate::{
	_prelude::*,
	client::MeterClient,
	error::EmptyDataError,
	obs::{self, OpKind, OpOutcome, OpSpan},
	reading::Snapshot,
};

/// Retry and cadence policy for the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshPolicy {
	/// Consecutive failures tolerated before failures are reported upward instead of retried.
	pub max_retries: u32,
	/// Delay before a failed cycle is retried.
	pub retry_delay: Duration,
	/// External polling cadence consumed by the scheduler.
	pub poll_interval: Duration,
}
impl RefreshPolicy {
	/// Consecutive failures tolerated by the production policy.
	pub const DEFAULT_MAX_RETRIES: u32 = 3;
	/// Production polling cadence.
	pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(360 * 60);
	/// Production retry delay.
	pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5 * 60);
}
impl Default for RefreshPolicy {
	fn default() -> Self {
		Self {
			max_retries: Self::DEFAULT_MAX_RETRIES,
			retry_delay: Self::DEFAULT_RETRY_DELAY,
			poll_interval: Self::DEFAULT_POLL_INTERVAL,
		}
	}
}

/// Consecutive-failure bookkeeping, reset on every success.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetryState {
	count: u32,
	last_success: Option<OffsetDateTime>,
}
impl RetryState {
	/// Consecutive failures observed since the last success.
	pub fn count(&self) -> u32 {
		self.count
	}

	/// Instant of the last successful refresh, if one ever happened.
	pub fn last_success(&self) -> Option<OffsetDateTime> {
		self.last_success
	}

	fn record_success(&mut self, instant: OffsetDateTime) {
		self.count = 0;
		self.last_success = Some(instant);
	}

	fn record_failure(&mut self) -> u32 {
		self.count += 1;

		self.count
	}
}

/// Thread-safe counters for refresh cycles.
#[derive(Debug, Default)]
pub struct PollMetrics {
	attempts: AtomicU64,
	successes: AtomicU64,
	failures: AtomicU64,
	stale_serves: AtomicU64,
}
impl PollMetrics {
	/// Returns the total number of refresh cycles started.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of cycles that replaced the snapshot.
	pub fn successes(&self) -> u64 {
		self.successes.load(Ordering::Relaxed)
	}

	/// Returns the number of failed cycles, including those answered with stale data.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Returns the number of failed cycles that fell back to the cached snapshot.
	pub fn stale_serves(&self) -> u64 {
		self.stale_serves.load(Ordering::Relaxed)
	}

	fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	fn record_success(&self) {
		self.successes.fetch_add(1, Ordering::Relaxed);
	}

	fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	fn record_stale_serve(&self) {
		self.stale_serves.fetch_add(1, Ordering::Relaxed);
	}
}

enum CycleOutcome {
	/// The fetch succeeded and the snapshot was replaced.
	Fresh(Arc<Snapshot>),
	/// The fetch failed but the cached snapshot stands in.
	Stale(Arc<Snapshot>),
	/// The fetch failed and no cached snapshot exists.
	Failed(Error),
}

/// Owns the retry ladder and the single cached snapshot.
///
/// The client sits behind an async mutex, so at most one fetch cycle is in flight at a time;
/// concurrent triggers queue behind the in-flight one instead of racing logins against the same
/// account. Only this type's refresh path ever mutates the snapshot or the retry bookkeeping.
#[derive(Debug)]
pub struct RefreshCoordinator {
	client: AsyncMutex<MeterClient>,
	policy: RefreshPolicy,
	snapshot: RwLock<Option<Arc<Snapshot>>>,
	retry: Mutex<RetryState>,
	pending_retry: Mutex<Option<JoinHandle<()>>>,
	metrics: PollMetrics,
	weak: Weak<Self>,
}
impl RefreshCoordinator {
	/// Wraps a client with the default policy.
	pub fn new(client: MeterClient) -> Arc<Self> {
		Self::with_policy(client, RefreshPolicy::default())
	}

	/// Wraps a client with a caller-provided policy.
	pub fn with_policy(client: MeterClient, policy: RefreshPolicy) -> Arc<Self> {
		Arc::new_cyclic(|weak| Self {
			client: AsyncMutex::new(client),
			policy,
			snapshot: RwLock::new(None),
			retry: Mutex::new(RetryState::default()),
			pending_retry: Mutex::new(None),
			metrics: PollMetrics::default(),
			weak: weak.clone(),
		})
	}

	/// Returns the policy the ladder runs under.
	pub fn policy(&self) -> RefreshPolicy {
		self.policy
	}

	/// Returns the cycle counters.
	pub fn metrics(&self) -> &PollMetrics {
		&self.metrics
	}

	/// Non-blocking accessor for the cached snapshot; never triggers a fetch.
	pub fn current_snapshot(&self) -> Option<Arc<Snapshot>> {
		self.snapshot.read().clone()
	}

	/// Diagnostic view of the retry bookkeeping.
	pub fn retry_state(&self) -> RetryState {
		*self.retry.lock()
	}

	/// Triggers one fetch cycle.
	///
	/// Must run inside a tokio runtime; failed cycles schedule their follow-up on it. While a
	/// cached snapshot exists, failures return it instead of erroring, so callers only ever see
	/// an `Err` before the first successful fetch.
	pub async fn refresh(&self) -> Result<Arc<Snapshot>> {
		const KIND: OpKind = OpKind::Refresh;

		let span = OpSpan::new(KIND, "refresh");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		self.metrics.record_attempt();

		match span.instrument(self.run_cycle()).await {
			CycleOutcome::Fresh(snapshot) => {
				obs::record_op_outcome(KIND, OpOutcome::Success);
				self.metrics.record_success();

				Ok(snapshot)
			},
			CycleOutcome::Stale(snapshot) => {
				obs::record_op_outcome(KIND, OpOutcome::Stale);
				self.metrics.record_failure();
				self.metrics.record_stale_serve();

				Ok(snapshot)
			},
			CycleOutcome::Failed(error) => {
				obs::record_op_outcome(KIND, OpOutcome::Failure);
				self.metrics.record_failure();

				Err(error)
			},
		}
	}

	/// Cancels any pending delayed retry so no fetch runs against a torn-down client.
	pub fn shutdown(&self) {
		self.cancel_pending_retry();
	}

	async fn run_cycle(&self) -> CycleOutcome {
		let fetched = {
			let mut client = self.client.lock().await;

			client.fetch_readings().await
		};
		let fetched = fetched.and_then(|snapshot| {
			if snapshot.is_empty() { Err(EmptyDataError.into()) } else { Ok(snapshot) }
		});

		match fetched {
			Ok(snapshot) => CycleOutcome::Fresh(self.complete_success(snapshot)),
			Err(error) => self.complete_failure(error),
		}
	}

	fn complete_success(&self, snapshot: Snapshot) -> Arc<Snapshot> {
		let snapshot = Arc::new(snapshot);

		*self.snapshot.write() = Some(snapshot.clone());
		self.retry.lock().record_success(snapshot.fetched_at);
		self.cancel_pending_retry();

		snapshot
	}

	fn complete_failure(&self, error: Error) -> CycleOutcome {
		let (count, last_success) = {
			let mut retry = self.retry.lock();
			let count = retry.record_failure();

			(count, retry.last_success())
		};

		if count < self.policy.max_retries {
			self.schedule_retry();
			obs::note_retry_scheduled(count, self.policy.max_retries, self.policy.retry_delay);
		} else {
			obs::note_retries_exhausted(count, last_success);
		}

		match self.current_snapshot() {
			Some(snapshot) => CycleOutcome::Stale(snapshot),
			None => CycleOutcome::Failed(error),
		}
	}

	fn schedule_retry(&self) {
		let weak = self.weak.clone();
		let delay = self.policy.retry_delay;
		let handle = tokio::spawn(async move {
			time::sleep(delay).await;

			// The coordinator may have been torn down while we slept.
			if let Some(coordinator) = weak.upgrade() {
				let _ = coordinator.refresh().await;
			}
		});

		if let Some(previous) = self.pending_retry.lock().replace(handle) {
			previous.abort();
		}
	}

	fn cancel_pending_retry(&self) {
		if let Some(handle) = self.pending_retry.lock().take() {
			handle.abort();
		}
	}
}
impl Drop for RefreshCoordinator {
	fn drop(&mut self) {
		self.cancel_pending_retry();
	}
}
