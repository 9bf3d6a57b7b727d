//! Cancellable repeating trigger that drives coordinator refreshes.
//!
//! The coordinator is agnostic to what triggers it; this module supplies the default fixed-cadence
//! trigger. A host that prefers a wall-clock anchor (say, a daily refresh) can drive
//! [`RefreshCoordinator::refresh`] from its own timer instead.

// std
use std::sync::Weak;
// crates.io
use tokio::{
	task::JoinHandle,
	time::{self, MissedTickBehavior},
};
// self
use crate::{_prelude::*, coordinator::RefreshCoordinator};

/// Handle to a scheduled polling loop.
///
/// Cancelling (or dropping) the handle stops every future invocation; an in-flight refresh is
/// aborted at its next await point.
#[derive(Debug)]
pub struct PollHandle {
	task: JoinHandle<()>,
}
impl PollHandle {
	/// Stops the polling loop. Dropping the handle has the same effect.
	pub fn cancel(self) {
		self.task.abort();
	}

	/// Returns `true` once the loop has stopped running.
	pub fn is_finished(&self) -> bool {
		self.task.is_finished()
	}
}
impl Drop for PollHandle {
	fn drop(&mut self) {
		self.task.abort();
	}
}

/// Schedules `refresh()` on a fixed cadence, starting one full period from now.
///
/// Setup performs the initial refresh itself, hence the delayed first firing. The loop holds only
/// a weak coordinator reference, so dropping the coordinator also ends the schedule. Ticks that
/// would land while a refresh is still in flight are delayed rather than stacked, keeping at most
/// one cycle pending behind the in-flight one.
pub fn schedule_refresh(coordinator: &Arc<RefreshCoordinator>, every: Duration) -> PollHandle {
	let weak: Weak<RefreshCoordinator> = Arc::downgrade(coordinator);
	let task = tokio::spawn(async move {
		let mut ticks = time::interval_at(time::Instant::now() + every, every);

		ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			ticks.tick().await;

			let Some(coordinator) = weak.upgrade() else { break };

			let _ = coordinator.refresh().await;
		}
	});

	PollHandle { task }
}
