//! Stateless-except-token HTTP client for the DJV-COM telemetry endpoints.
//!
//! The service invalidates bearer tokens server-side without any expiry signal, so
//! [`MeterClient::fetch_readings`] performs a fresh login on every cycle instead of trusting a
//! cached session. Retry logic lives in the coordinator; each call here is a single round trip.

// std
use std::ops::Deref;
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{Credentials, Secret, Session},
	error::{AuthError, ConfigError, ParseError, TransportError},
	obs::{self, OpKind, OpOutcome, OpSpan},
	reading::{ReadingsResponse, Snapshot},
	service::ServiceDescriptor,
};

const LOGIN: &str = "login";
const READINGS: &str = "readings";

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[derive(Clone, Debug)]
pub struct MeterHttpClient(ReqwestClient);
impl MeterHttpClient {
	/// Builds a client carrying the fixed service identification headers.
	pub fn new() -> Result<Self, ConfigError> {
		let client =
			ReqwestClient::builder().default_headers(ServiceDescriptor::default_headers()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	///
	/// The caller is responsible for configuring the identification headers the service expects;
	/// [`ServiceDescriptor::default_headers`] provides them.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
impl AsRef<ReqwestClient> for MeterHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for MeterHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

#[derive(Serialize)]
struct LoginRequest<'a> {
	username: &'a str,
	password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
	#[serde(default)]
	data: Option<LoginData>,
}

#[derive(Debug, Default, Deserialize)]
struct LoginData {
	#[serde(default)]
	token: Option<String>,
}

/// Async client for the metering endpoints; owns the [`Session`].
///
/// The client carries no retry or concurrency machinery and is exclusively owned by its
/// coordinator.
#[derive(Debug)]
pub struct MeterClient {
	http: MeterHttpClient,
	descriptor: ServiceDescriptor,
	credentials: Credentials,
	session: Session,
}
impl MeterClient {
	/// Creates a client for the public service endpoints.
	pub fn new(credentials: Credentials) -> Result<Self, ConfigError> {
		Self::with_descriptor(ServiceDescriptor::default(), credentials)
	}

	/// Creates a client against a custom service location (tests, proxies).
	pub fn with_descriptor(
		descriptor: ServiceDescriptor,
		credentials: Credentials,
	) -> Result<Self, ConfigError> {
		Ok(Self::with_http_client(descriptor, credentials, MeterHttpClient::new()?))
	}

	/// Creates a client reusing a caller-provided transport.
	pub fn with_http_client(
		descriptor: ServiceDescriptor,
		credentials: Credentials,
		http: MeterHttpClient,
	) -> Self {
		Self { http, descriptor, credentials, session: Session::default() }
	}

	/// Returns the session state.
	pub fn session(&self) -> &Session {
		&self.session
	}

	/// Logs in and installs the issued bearer token in the session.
	pub async fn authenticate(&mut self) -> Result<()> {
		let token = self.login().await?;

		self.session.install(token);

		Ok(())
	}

	/// Validates the configured credentials with a throwaway login.
	///
	/// Success or failure is the only observable signal; the issued token is discarded.
	pub async fn test_connection(&mut self) -> Result<()> {
		self.login().await.map(drop)
	}

	/// Performs one full fetch cycle: a fresh login followed by an authenticated read of the
	/// latest meter data.
	pub async fn fetch_readings(&mut self) -> Result<Snapshot> {
		const KIND: OpKind = OpKind::Readings;

		let span = OpSpan::new(KIND, "fetch_readings");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.fetch_readings_inner()).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	async fn fetch_readings_inner(&mut self) -> Result<Snapshot> {
		self.session.clear();

		let token = self.login().await?;

		self.session.install(token.clone());

		let url = self.descriptor.readings_endpoint()?;
		let response = self
			.http
			.get(url)
			.bearer_auth(token.expose())
			.send()
			.await
			.map_err(|e| TransportError::network(READINGS, e))?;
		let status = response.status();

		if !status.is_success() {
			return Err(
				TransportError::Status { endpoint: READINGS, status: status.as_u16() }.into()
			);
		}

		let bytes =
			response.bytes().await.map_err(|e| TransportError::network(READINGS, e))?;
		let body = parse_json::<ReadingsResponse>(READINGS, &bytes)?;

		Ok(Snapshot::new(body.data, OffsetDateTime::now_utc()))
	}

	async fn login(&self) -> Result<Secret> {
		const KIND: OpKind = OpKind::Login;

		let span = OpSpan::new(KIND, "login");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.login_inner()).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	async fn login_inner(&self) -> Result<Secret> {
		let url = self.descriptor.login_endpoint()?;
		let payload = LoginRequest {
			username: self.credentials.username(),
			password: self.credentials.password().expose(),
		};
		let response = self
			.http
			.post(url)
			.json(&payload)
			.send()
			.await
			.map_err(|e| TransportError::network(LOGIN, e))?;
		let status = response.status();

		if !status.is_success() {
			return Err(TransportError::Status { endpoint: LOGIN, status: status.as_u16() }.into());
		}

		let bytes = response.bytes().await.map_err(|e| TransportError::network(LOGIN, e))?;
		let body = parse_json::<LoginResponse>(LOGIN, &bytes)?;
		let token = body
			.data
			.unwrap_or_default()
			.token
			.filter(|token| !token.is_empty())
			.ok_or(AuthError::MissingToken { status: status.as_u16() })?;

		Ok(Secret::new(token))
	}
}

fn parse_json<T>(endpoint: &'static str, bytes: &[u8]) -> Result<T, ParseError>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ParseError::MalformedJson { endpoint, source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn login_body_tolerates_missing_token_shapes() {
		let with_token: LoginResponse = parse_json(LOGIN, br#"{"data":{"token":"tok-1"}}"#)
			.expect("Login body with a token should parse.");
		let without_token: LoginResponse =
			parse_json(LOGIN, br#"{"data":{}}"#).expect("Login body without a token should parse.");
		let without_data: LoginResponse =
			parse_json(LOGIN, br#"{"error":"denied"}"#).expect("Tokenless body should parse.");

		assert_eq!(with_token.data.unwrap_or_default().token.as_deref(), Some("tok-1"));
		assert_eq!(without_token.data.unwrap_or_default().token, None);
		assert_eq!(without_data.data.unwrap_or_default().token, None);
	}

	#[test]
	fn malformed_json_is_a_parse_error() {
		let error = parse_json::<LoginResponse>(LOGIN, b"not json")
			.expect_err("Malformed JSON should fail to parse.");

		assert!(matches!(error, ParseError::MalformedJson { endpoint: "login", .. }));
	}
}
