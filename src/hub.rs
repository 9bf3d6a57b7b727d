//! Host-application boundary: the entry registry and its setup/teardown lifecycle.
//!
//! Hosts own a [`MeterHub`] and pass entry identifiers explicitly; nothing is looked up from
//! ambient state. Setup validates credentials, performs the first refresh (any error surfaces
//! directly and blocks the entry), and wires scheduled polling; teardown cancels everything.

// std
use std::{borrow::Borrow, collections::hash_map::Entry, ops::Deref, str::FromStr};
// self
use crate::{
	_prelude::*,
	auth::Credentials,
	client::MeterClient,
	coordinator::{RefreshCoordinator, RefreshPolicy},
	reading::Snapshot,
	schedule::{self, PollHandle},
	service::ServiceDescriptor,
};

const ENTRY_ID_MAX_LEN: usize = 128;

/// Error returned when entry identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum EntryIdError {
	/// The identifier was empty or whitespace.
	#[error("Entry identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Entry identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier exceeded the allowed character count.
	#[error("Entry identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Validated identifier for one configured meter account.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryId(String);
impl EntryId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, EntryIdError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}
}
impl Deref for EntryId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for EntryId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for EntryId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<EntryId> for String {
	fn from(value: EntryId) -> Self {
		value.0
	}
}
impl TryFrom<String> for EntryId {
	type Error = EntryIdError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl FromStr for EntryId {
	type Err = EntryIdError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for EntryId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "EntryId({})", self.0)
	}
}
impl Display for EntryId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn validate_view(view: &str) -> Result<(), EntryIdError> {
	if view.is_empty() {
		return Err(EntryIdError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(EntryIdError::ContainsWhitespace);
	}
	if view.chars().count() > ENTRY_ID_MAX_LEN {
		return Err(EntryIdError::TooLong { max: ENTRY_ID_MAX_LEN });
	}

	Ok(())
}

/// Errors raised by the host boundary around entry lifecycle.
#[derive(Debug, ThisError)]
pub enum HubError {
	/// The entry identifier is already registered.
	#[error("Entry `{entry_id}` is already registered.")]
	DuplicateEntry {
		/// Identifier that collided.
		entry_id: EntryId,
	},
	/// Credential validation or the initial fetch failed.
	#[error("Setup for entry `{entry_id}` failed.")]
	Setup {
		/// Identifier of the entry being set up.
		entry_id: EntryId,
		/// Error that blocked the setup.
		#[source]
		source: Error,
	},
}

struct HubEntry {
	coordinator: Arc<RefreshCoordinator>,
	poll: PollHandle,
}

/// Explicit registry of configured meter accounts and their coordinators.
#[derive(Default)]
pub struct MeterHub {
	entries: Mutex<HashMap<EntryId, HubEntry>>,
}
impl MeterHub {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Validates credentials, performs the first refresh, wires scheduled polling, and registers
	/// the entry.
	///
	/// Any error during validation or the initial fetch surfaces directly and leaves the registry
	/// untouched; the retry ladder only takes over after the entry has succeeded once.
	pub async fn setup(
		&self,
		entry_id: EntryId,
		descriptor: ServiceDescriptor,
		credentials: Credentials,
		policy: RefreshPolicy,
	) -> Result<Arc<RefreshCoordinator>, HubError> {
		if self.contains(&entry_id) {
			return Err(HubError::DuplicateEntry { entry_id });
		}

		let mut client = match MeterClient::with_descriptor(descriptor, credentials) {
			Ok(client) => client,
			Err(e) => return Err(HubError::Setup { entry_id, source: e.into() }),
		};

		if let Err(source) = client.test_connection().await {
			return Err(HubError::Setup { entry_id, source });
		}

		let coordinator = RefreshCoordinator::with_policy(client, policy);

		if let Err(source) = coordinator.refresh().await {
			coordinator.shutdown();

			return Err(HubError::Setup { entry_id, source });
		}

		let poll = schedule::schedule_refresh(&coordinator, policy.poll_interval);
		let mut entries = self.entries.lock();

		match entries.entry(entry_id) {
			Entry::Occupied(occupied) => {
				let entry_id = occupied.key().clone();

				coordinator.shutdown();
				poll.cancel();

				Err(HubError::DuplicateEntry { entry_id })
			},
			Entry::Vacant(vacant) => {
				vacant.insert(HubEntry { coordinator: coordinator.clone(), poll });

				Ok(coordinator)
			},
		}
	}

	/// Cancels polling and pending retries, then removes the entry.
	///
	/// Returns `false` when the identifier was not registered.
	pub fn teardown(&self, entry_id: &EntryId) -> bool {
		match self.entries.lock().remove(entry_id) {
			Some(entry) => {
				entry.coordinator.shutdown();
				entry.poll.cancel();

				true
			},
			None => false,
		}
	}

	/// Returns the coordinator registered under the identifier, if any.
	pub fn coordinator(&self, entry_id: &EntryId) -> Option<Arc<RefreshCoordinator>> {
		self.entries.lock().get(entry_id).map(|entry| entry.coordinator.clone())
	}

	/// Returns the entry's cached snapshot, if the entry exists and has data.
	pub fn snapshot(&self, entry_id: &EntryId) -> Option<Arc<Snapshot>> {
		self.coordinator(entry_id).and_then(|coordinator| coordinator.current_snapshot())
	}

	/// Returns `true` when the identifier is registered.
	pub fn contains(&self, entry_id: &EntryId) -> bool {
		self.entries.lock().contains_key(entry_id)
	}

	/// Returns every registered entry identifier.
	pub fn entry_ids(&self) -> Vec<EntryId> {
		self.entries.lock().keys().cloned().collect()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn entry_id_validation_rejects_bad_shapes() {
		assert_eq!(EntryId::new(""), Err(EntryIdError::Empty));
		assert_eq!(EntryId::new("two words"), Err(EntryIdError::ContainsWhitespace));
		assert_eq!(
			EntryId::new("x".repeat(ENTRY_ID_MAX_LEN + 1)),
			Err(EntryIdError::TooLong { max: ENTRY_ID_MAX_LEN }),
		);
	}

	#[test]
	fn entry_id_round_trips_through_serde_and_strings() {
		let id: EntryId = "meter-account-1".parse().expect("Identifier fixture should be valid.");

		assert_eq!(format!("{id}"), "meter-account-1");
		assert_eq!(format!("{id:?}"), "EntryId(meter-account-1)");

		let json = serde_json::to_string(&id).expect("Identifier should serialize.");

		assert_eq!(json, "\"meter-account-1\"");

		let back: EntryId = serde_json::from_str(&json).expect("Identifier should deserialize.");

		assert_eq!(back, id);
		serde_json::from_str::<EntryId>("\"two words\"")
			.expect_err("Whitespace identifiers should fail to deserialize.");
	}
}
