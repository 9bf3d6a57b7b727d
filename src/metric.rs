//! Metric catalog republishing meter readings as named numeric data points.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	reading::{MeterReading, Snapshot},
};

/// Named metrics derivable from a single meter entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricKind {
	/// Cumulative counter indication.
	MeterIndications,
	/// Consumption recorded for the last day.
	LastDayConsumption,
	/// Monthly consumption sum.
	MonthlySum,
	/// Active gas price from the tariff table.
	GasPrice,
}
impl MetricKind {
	/// Every metric the crate derives, in catalog order.
	pub const ALL: [Self; 4] =
		[Self::MeterIndications, Self::LastDayConsumption, Self::MonthlySum, Self::GasPrice];

	/// Returns the stable key used when republishing data points.
	pub const fn key(self) -> &'static str {
		match self {
			Self::MeterIndications => "meter_indications",
			Self::LastDayConsumption => "last_day_consumption",
			Self::MonthlySum => "monthly_sum",
			Self::GasPrice => "gas_price",
		}
	}

	/// Returns the catalog entry carrying this metric's presentation metadata.
	pub const fn descriptor(self) -> &'static MetricDescriptor {
		match self {
			Self::MeterIndications => &METER_INDICATIONS,
			Self::LastDayConsumption => &LAST_DAY_CONSUMPTION,
			Self::MonthlySum => &MONTHLY_SUM,
			Self::GasPrice => &GAS_PRICE,
		}
	}

	/// Resolves the metric against a single meter entry.
	///
	/// Returns `None` when the source field is absent or not representable as a number.
	pub fn resolve(self, reading: &MeterReading) -> Option<f64> {
		match self {
			Self::MeterIndications => reading.counter_indications.as_ref().and_then(as_f64),
			Self::LastDayConsumption => reading.current_day.as_ref().and_then(as_f64),
			Self::MonthlySum => reading.sum.as_ref().and_then(as_f64),
			Self::GasPrice => reading
				.counter_settings
				.as_ref()
				.and_then(|settings| settings.price.as_ref())
				.and_then(|table| table.price.first())
				.and_then(as_f64),
		}
	}
}
impl Display for MetricKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.key())
	}
}

/// Coarse presentation category attached to each metric.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricCategory {
	/// Gas volume that only ever grows.
	CumulativeVolume,
	/// Gas volume bounded to a reporting period.
	PeriodVolume,
	/// Monetary tariff value.
	Price,
}

/// Unit and category metadata presentation layers attach to a metric.
///
/// The crate only exposes the metadata; how values are displayed is the host's business.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetricDescriptor {
	/// Metric the entry describes.
	pub kind: MetricKind,
	/// Stable key used when republishing data points.
	pub key: &'static str,
	/// Human-readable default name.
	pub name: &'static str,
	/// Unit of measurement.
	pub unit: &'static str,
	/// Presentation category.
	pub category: MetricCategory,
}

const METER_INDICATIONS: MetricDescriptor = MetricDescriptor {
	kind: MetricKind::MeterIndications,
	key: MetricKind::MeterIndications.key(),
	name: "Meter Indications",
	unit: "m³",
	category: MetricCategory::CumulativeVolume,
};
const LAST_DAY_CONSUMPTION: MetricDescriptor = MetricDescriptor {
	kind: MetricKind::LastDayConsumption,
	key: MetricKind::LastDayConsumption.key(),
	name: "Last Day Consumption",
	unit: "m³",
	category: MetricCategory::PeriodVolume,
};
const MONTHLY_SUM: MetricDescriptor = MetricDescriptor {
	kind: MetricKind::MonthlySum,
	key: MetricKind::MonthlySum.key(),
	name: "Monthly Sum",
	unit: "m³",
	category: MetricCategory::PeriodVolume,
};
const GAS_PRICE: MetricDescriptor = MetricDescriptor {
	kind: MetricKind::GasPrice,
	key: MetricKind::GasPrice.key(),
	name: "Gas Price",
	unit: "MDL/m³",
	category: MetricCategory::Price,
};

/// Catalog of every derivable metric with its presentation metadata.
pub const METRICS: [MetricDescriptor; 4] =
	[METER_INDICATIONS, LAST_DAY_CONSUMPTION, MONTHLY_SUM, GAS_PRICE];

/// Flattened (meter, metric, value) triple republished to consumers.
#[derive(Clone, Debug, PartialEq)]
pub struct DataPoint {
	/// Stable meter identifier the value belongs to.
	pub tsd_id: String,
	/// Metric the value resolves.
	pub kind: MetricKind,
	/// Resolved numeric value.
	pub value: f64,
}

/// Flattens a snapshot into named numeric data points.
///
/// Meter/metric pairs whose source field is absent or non-numeric are skipped rather than
/// published as gaps.
pub fn data_points(snapshot: &Snapshot) -> Vec<DataPoint> {
	snapshot
		.meters
		.iter()
		.flat_map(|reading| {
			MetricKind::ALL.into_iter().filter_map(move |kind| {
				kind.resolve(reading).map(|value| DataPoint {
					tsd_id: reading.tsd_id.clone(),
					kind,
					value,
				})
			})
		})
		.collect()
}

fn as_f64(value: &Value) -> Option<f64> {
	match value {
		Value::Number(number) => number.as_f64(),
		Value::String(raw) => raw.trim().parse().ok(),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::reading::ReadingsResponse;

	fn fixture() -> Snapshot {
		let body: ReadingsResponse = serde_json::from_str(
			r#"{
				"data": [
					{
						"tsd_id": "A",
						"counter_indications": "100",
						"curent_day": "2",
						"sum": "10",
						"counter_settings": {"price": {"price": [5]}}
					}
				]
			}"#,
		)
		.expect("Metric fixture should deserialize.");

		Snapshot::new(body.data, OffsetDateTime::UNIX_EPOCH)
	}

	#[test]
	fn catalog_metrics_resolve_for_the_sample_meter() {
		let snapshot = fixture();

		assert_eq!(snapshot.metric("A", MetricKind::MeterIndications), Some(100.0));
		assert_eq!(snapshot.metric("A", MetricKind::LastDayConsumption), Some(2.0));
		assert_eq!(snapshot.metric("A", MetricKind::MonthlySum), Some(10.0));
		assert_eq!(snapshot.metric("A", MetricKind::GasPrice), Some(5.0));
		assert_eq!(snapshot.metric("B", MetricKind::GasPrice), None);
	}

	#[test]
	fn numeric_coercion_accepts_strings_and_numbers() {
		assert_eq!(as_f64(&Value::String(" 42.5 ".into())), Some(42.5));
		assert_eq!(as_f64(&Value::from(7)), Some(7.0));
		assert_eq!(as_f64(&Value::String("n/a".into())), None);
		assert_eq!(as_f64(&Value::Null), None);
	}

	#[test]
	fn data_points_flatten_every_resolvable_pair() {
		let snapshot = fixture();
		let points = data_points(&snapshot);

		assert_eq!(points.len(), 4);
		assert!(points.iter().all(|point| point.tsd_id == "A"));
		assert!(
			points
				.iter()
				.any(|point| point.kind == MetricKind::GasPrice && point.value == 5.0)
		);
	}

	#[test]
	fn descriptors_align_with_their_kinds() {
		for kind in MetricKind::ALL {
			let descriptor = kind.descriptor();

			assert_eq!(descriptor.kind, kind);
			assert_eq!(descriptor.key, kind.key());
		}

		assert_eq!(MetricKind::GasPrice.descriptor().unit, "MDL/m³");
		assert_eq!(
			MetricKind::MeterIndications.descriptor().category,
			MetricCategory::CumulativeVolume,
		);
	}
}
