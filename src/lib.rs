//! Async client and refresh coordinator for the DJV-COM gas-meter telemetry service—login-per-fetch
//! sessions, retry-laddered polling, and stale-tolerant snapshot caching for downstream dashboards.
//!
//! The crate splits into a thin [`client`] that speaks the fixed remote HTTP/JSON contract and a
//! [`coordinator`] that owns the retry ladder and the single cached last-known-good
//! [`reading::Snapshot`]. The [`schedule`] module drives refreshes on a fixed cadence through a
//! cancellable handle, the [`hub`] registry wires everything into a host application's
//! setup/teardown lifecycle, and the [`metric`] catalog republishes readings as named numeric data
//! points.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod coordinator;
pub mod error;
pub mod hub;
pub mod metric;
pub mod obs;
pub mod reading;
pub mod schedule;
pub mod service;

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		sync::Arc,
		time::Duration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::Client as ReqwestClient;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
