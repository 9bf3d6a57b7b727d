//! Fixed DJV-COM service location and client identification headers.

// crates.io
use reqwest::header::{
	ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION, HeaderMap, HeaderValue, USER_AGENT,
};
// self
use crate::{_prelude::*, error::ConfigError};

/// Public base URL of the DJV-COM telemetry service.
pub const DEFAULT_BASE: &str = "http://djv-com.net:3000";
/// Fixed client identification string sent with every request.
pub const USER_AGENT_VALUE: &str = "Balance/32 CFNetwork/1568.300.101 Darwin/24.2.0";

const LOGIN_PATH: &str = "v1/pv/login";
const READINGS_PATH: &str = "v1/pv/getmeterdescriptionwithlastdata";

/// Where the remote service lives and how its endpoints are resolved.
///
/// The default descriptor points at the public service; tests and proxies swap in their own base
/// via [`ServiceDescriptor::new`].
#[derive(Clone, Debug)]
pub struct ServiceDescriptor {
	base: Url,
}
impl ServiceDescriptor {
	/// Creates a descriptor for a custom service base.
	///
	/// The base path is normalized to end with a slash so endpoint paths append instead of
	/// replacing the final segment.
	pub fn new(mut base: Url) -> Result<Self, ConfigError> {
		if base.cannot_be_a_base() {
			return Err(ConfigError::CannotBeABase { base });
		}
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());

			base.set_path(&path);
		}

		Ok(Self { base })
	}

	/// Returns the service base URL.
	pub fn base(&self) -> &Url {
		&self.base
	}

	/// Resolves the login endpoint.
	pub fn login_endpoint(&self) -> Result<Url, ConfigError> {
		self.endpoint(LOGIN_PATH)
	}

	/// Resolves the readings endpoint.
	pub fn readings_endpoint(&self) -> Result<Url, ConfigError> {
		self.endpoint(READINGS_PATH)
	}

	fn endpoint(&self, path: &'static str) -> Result<Url, ConfigError> {
		self.base.join(path).map_err(|source| ConfigError::InvalidEndpoint { path, source })
	}

	/// Builds the fixed header set every request carries.
	///
	/// `Content-Type` is omitted here; the request builder sets it per body.
	pub fn default_headers() -> HeaderMap {
		let mut headers = HeaderMap::new();

		headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
		headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
		headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
		headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
		headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

		headers
	}
}
impl Default for ServiceDescriptor {
	fn default() -> Self {
		let base = Url::parse(DEFAULT_BASE).expect("Hardcoded service base URL should parse.");

		Self { base }
	}
}
