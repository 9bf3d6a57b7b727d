// self
use crate::{_prelude::*, obs::OpKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by instrumented operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("djv_meter.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> OpSpanGuard {
		#[cfg(feature = "tracing")]
		{
			OpSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			OpSpanGuard {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// RAII guard returned by [`OpSpan::entered`].
pub struct OpSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for OpSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("OpSpanGuard(..)")
	}
}

/// Notes a failed cycle whose retry has been scheduled.
pub(crate) fn note_retry_scheduled(count: u32, max_retries: u32, delay: Duration) {
	#[cfg(feature = "tracing")]
	tracing::warn!(
		count,
		max_retries,
		delay_secs = delay.as_secs(),
		"Refresh failed; retry scheduled."
	);

	#[cfg(not(feature = "tracing"))]
	let _ = (count, max_retries, delay);
}

/// Notes an exhausted retry ladder together with the last success instant for diagnostics.
pub(crate) fn note_retries_exhausted(count: u32, last_success: Option<OffsetDateTime>) {
	#[cfg(feature = "tracing")]
	tracing::error!(
		count,
		?last_success,
		"Retry ladder exhausted; serving cached data when available."
	);

	#[cfg(not(feature = "tracing"))]
	let _ = (count, last_success);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn op_span_noop_without_tracing() {
		let _guard = OpSpan::new(OpKind::Refresh, "test").entered();
		// Compile-time smoke test ensures the guard exists even when tracing is disabled.
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = OpSpan::new(OpKind::Login, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
