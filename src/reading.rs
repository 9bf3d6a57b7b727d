//! Wire types for the readings payload and the cached snapshot.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, metric::MetricKind};

/// One meter entry as reported by the readings endpoint.
///
/// Numeric fields arrive as strings or numbers depending on the backend version, so they stay raw
/// JSON values until a metric resolves them. Fields the crate does not interpret are preserved in
/// [`extra`](Self::extra) so the payload round-trips losslessly.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MeterReading {
	/// Stable meter identifier; the lookup key for every metric.
	pub tsd_id: String,
	/// Physical device identifier, when reported.
	#[serde(default)]
	pub slave_uid: Option<Value>,
	/// Cumulative counter value.
	#[serde(default)]
	pub counter_indications: Option<Value>,
	/// Consumption recorded for the last day. The misspelled wire name is part of the fixed
	/// service contract.
	#[serde(default, rename = "curent_day")]
	pub current_day: Option<Value>,
	/// Monthly consumption sum.
	#[serde(default)]
	pub sum: Option<Value>,
	/// Nested tariff information.
	#[serde(default)]
	pub counter_settings: Option<CounterSettings>,
	/// Remaining fields the crate passes through untouched.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Tariff block nested inside a meter entry.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CounterSettings {
	/// Price table, when the tariff is published.
	#[serde(default)]
	pub price: Option<PriceTable>,
	/// Remaining fields the crate passes through untouched.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Price table nested inside the tariff block; the first entry is the active gas price.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PriceTable {
	/// Tariff steps in service order.
	#[serde(default)]
	pub price: Vec<Value>,
	/// Remaining fields the crate passes through untouched.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Full readings response body.
#[derive(Debug, Deserialize)]
pub(crate) struct ReadingsResponse {
	pub data: Vec<MeterReading>,
}

/// Latest successfully fetched payload, cached wholesale until superseded.
///
/// A snapshot is never patched in place: a refresh either replaces the whole value or leaves the
/// previous one untouched.
#[derive(Clone, Debug)]
pub struct Snapshot {
	/// Meter entries exactly as returned by the service.
	pub meters: Vec<MeterReading>,
	/// Instant the payload was fetched.
	pub fetched_at: OffsetDateTime,
}
impl Snapshot {
	/// Wraps a fetched meter list with its fetch instant.
	pub fn new(meters: Vec<MeterReading>, fetched_at: OffsetDateTime) -> Self {
		Self { meters, fetched_at }
	}

	/// Returns `true` when the payload carries no meters at all.
	pub fn is_empty(&self) -> bool {
		self.meters.is_empty()
	}

	/// Looks up a meter entry by its stable identifier.
	pub fn meter(&self, tsd_id: &str) -> Option<&MeterReading> {
		self.meters.iter().find(|reading| reading.tsd_id == tsd_id)
	}

	/// Resolves a meter/metric pair to its numeric value.
	pub fn metric(&self, tsd_id: &str, kind: MetricKind) -> Option<f64> {
		self.meter(tsd_id).and_then(|reading| kind.resolve(reading))
	}
}
