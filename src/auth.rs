//! Credential and session primitives for the metering account.

// self
use crate::_prelude::*;

/// Redacted secret wrapper keeping passwords and bearer tokens out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret(String);
impl Secret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for Secret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Secret").field(&"<redacted>").finish()
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Account credentials supplied once at setup time; immutable afterwards.
#[derive(Clone, Debug, Deserialize)]
pub struct Credentials {
	username: String,
	password: Secret,
}
impl Credentials {
	/// Bundles a username/password pair.
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self { username: username.into(), password: Secret::new(password) }
	}

	/// Returns the account username.
	pub fn username(&self) -> &str {
		&self.username
	}

	/// Returns the account password.
	pub fn password(&self) -> &Secret {
		&self.password
	}
}

/// Bearer session state owned by the client.
///
/// The service invalidates tokens server-side without any expiry signal, so the session never
/// tracks a lifetime; the client clears and re-establishes it on every fetch cycle.
#[derive(Debug, Default)]
pub struct Session {
	token: Option<Secret>,
}
impl Session {
	/// Returns `true` while a bearer token is installed.
	pub fn is_authenticated(&self) -> bool {
		self.token.is_some()
	}

	/// Returns the installed bearer token, if any.
	pub fn token(&self) -> Option<&Secret> {
		self.token.as_ref()
	}

	/// Installs a freshly issued bearer token.
	pub(crate) fn install(&mut self, token: Secret) {
		self.token = Some(token);
	}

	/// Discards the current token so a failed login never leaves a stale one behind.
	pub(crate) fn clear(&mut self) {
		self.token = None;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = Secret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "Secret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn credentials_debug_redacts_password() {
		let credentials = Credentials::new("user-1", "hunter2");
		let rendered = format!("{credentials:?}");

		assert!(rendered.contains("user-1"));
		assert!(!rendered.contains("hunter2"));
	}

	#[test]
	fn session_tracks_token_lifecycle() {
		let mut session = Session::default();

		assert!(!session.is_authenticated());

		session.install(Secret::new("tok-1"));

		assert!(session.is_authenticated());
		assert_eq!(session.token().map(Secret::expose), Some("tok-1"));

		session.clear();

		assert!(!session.is_authenticated());
	}
}
