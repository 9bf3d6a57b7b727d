//! Crate-level error taxonomy shared by the client and the coordinator.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// The remote-facing kinds (transport, auth, parse, empty data) all feed the coordinator's retry
/// ladder identically; only [`ConfigError`] marks a local problem that no retry can fix.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Network/HTTP-level failure.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Login response carried no usable token.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Parse(#[from] ParseError),
	/// Response body was well-formed but semantically empty.
	#[error(transparent)]
	EmptyData(#[from] EmptyDataError),
}

/// Local configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Service base URL cannot carry endpoint paths.
	#[error("Service base URL `{base}` cannot be a base.")]
	CannotBeABase {
		/// Offending base URL.
		base: Url,
	},
	/// Endpoint path failed to join onto the base URL.
	#[error("Endpoint path `{path}` cannot be joined onto the service base URL.")]
	InvalidEndpoint {
		/// Endpoint path that failed to join.
		path: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, timeouts, non-2xx statuses).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint label the request targeted.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Endpoint answered with a non-success status code.
	#[error("The {endpoint} endpoint answered with HTTP {status}.")]
	Status {
		/// Endpoint label the request targeted.
		endpoint: &'static str,
		/// HTTP status code of the response.
		status: u16,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error for the given endpoint.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

/// Authentication failures reported by the login endpoint.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthError {
	/// Login succeeded at the HTTP layer but the body carried no `data.token` field.
	#[error("Login response is missing the `data.token` field.")]
	MissingToken {
		/// HTTP status code returned alongside the tokenless body.
		status: u16,
	},
}

/// Body-decoding failures for service responses.
#[derive(Debug, ThisError)]
pub enum ParseError {
	/// Endpoint returned malformed JSON.
	#[error("The {endpoint} endpoint returned malformed JSON.")]
	MalformedJson {
		/// Endpoint label the response came from.
		endpoint: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Well-formed readings payload that carries no meters at all.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ThisError)]
#[error("The readings endpoint returned an empty meter list.")]
pub struct EmptyDataError;

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn remote_error_kinds_convert_into_crate_error() {
		let transport: Error =
			TransportError::Status { endpoint: "login", status: 503 }.into();
		let auth: Error = AuthError::MissingToken { status: 200 }.into();
		let empty: Error = EmptyDataError.into();

		assert!(matches!(transport, Error::Transport(_)));
		assert!(matches!(auth, Error::Auth(_)));
		assert!(matches!(empty, Error::EmptyData(_)));
	}

	#[test]
	fn status_error_display_names_the_endpoint() {
		let error = TransportError::Status { endpoint: "readings", status: 502 };

		assert_eq!(error.to_string(), "The readings endpoint answered with HTTP 502.");
	}

	#[test]
	fn config_error_wraps_builder_failures_with_source() {
		let error = ConfigError::http_client_build(std::io::Error::other("tls backend missing"));
		let crate_error: Error = error.into();

		assert!(matches!(crate_error, Error::Config(ConfigError::HttpClientBuild { .. })));

		let source = std::error::Error::source(&crate_error)
			.expect("Config error should expose the builder failure as its source.");

		assert_eq!(source.to_string(), "tls backend missing");
	}
}
