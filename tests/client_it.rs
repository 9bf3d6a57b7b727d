// crates.io
use httpmock::prelude::*;
// self
use djv_meter::{
	auth::Credentials,
	client::MeterClient,
	error::{AuthError, Error, TransportError},
	service::{self, ServiceDescriptor},
	url::Url,
};

const LOGIN_PATH: &str = "/v1/pv/login";
const READINGS_PATH: &str = "/v1/pv/getmeterdescriptionwithlastdata";
const READINGS_BODY: &str = r#"{"data":[{"tsd_id":"A","slave_uid":"77001234","counter_indications":"100","curent_day":"2","sum":"10","counter_settings":{"price":{"price":[5]}}}]}"#;

fn build_client(server: &MockServer) -> MeterClient {
	let base =
		Url::parse(&server.base_url()).expect("Mock server URL should parse successfully.");
	let descriptor =
		ServiceDescriptor::new(base).expect("Mock server URL should be a valid service base.");

	MeterClient::with_descriptor(descriptor, Credentials::new("user-1", "pass-1"))
		.expect("Client should build against the mock server.")
}

#[tokio::test]
async fn fetch_readings_logs_in_and_reads_with_the_issued_bearer() {
	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path(LOGIN_PATH).header("user-agent", service::USER_AGENT_VALUE);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":{"token":"tok-1"}}"#);
		})
		.await;
	let readings = server
		.mock_async(|when, then| {
			when.method(GET).path(READINGS_PATH).header("authorization", "Bearer tok-1");
			then.status(200).header("content-type", "application/json").body(READINGS_BODY);
		})
		.await;
	let mut client = build_client(&server);
	let snapshot = client.fetch_readings().await.expect("Fetch cycle should succeed.");

	assert_eq!(snapshot.meters.len(), 1);
	assert_eq!(snapshot.meters[0].tsd_id, "A");
	assert!(client.session().is_authenticated());

	login.assert_calls_async(1).await;
	readings.assert_calls_async(1).await;
}

#[tokio::test]
async fn every_fetch_cycle_performs_a_fresh_login() {
	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path(LOGIN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":{"token":"tok-1"}}"#);
		})
		.await;
	let readings = server
		.mock_async(|when, then| {
			when.method(GET).path(READINGS_PATH);
			then.status(200).header("content-type", "application/json").body(READINGS_BODY);
		})
		.await;
	let mut client = build_client(&server);

	client.fetch_readings().await.expect("First fetch cycle should succeed.");
	client.fetch_readings().await.expect("Second fetch cycle should succeed.");

	login.assert_calls_async(2).await;
	readings.assert_calls_async(2).await;
}

#[tokio::test]
async fn tokenless_login_body_maps_to_an_auth_error() {
	let server = MockServer::start_async().await;
	let _login = server
		.mock_async(|when, then| {
			when.method(POST).path(LOGIN_PATH);
			then.status(200).header("content-type", "application/json").body(r#"{"data":{}}"#);
		})
		.await;
	let mut client = build_client(&server);
	let error = client.authenticate().await.expect_err("Tokenless login should fail.");

	assert!(matches!(error, Error::Auth(AuthError::MissingToken { status: 200 })));
	assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn rejected_login_maps_to_a_transport_status_error() {
	let server = MockServer::start_async().await;
	let _login = server
		.mock_async(|when, then| {
			when.method(POST).path(LOGIN_PATH);
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"error":"denied"}"#);
		})
		.await;
	let mut client = build_client(&server);
	let error = client.authenticate().await.expect_err("Rejected login should fail.");

	assert!(matches!(
		error,
		Error::Transport(TransportError::Status { endpoint: "login", status: 401 }),
	));
}

#[tokio::test]
async fn malformed_readings_body_maps_to_a_parse_error() {
	let server = MockServer::start_async().await;
	let _login = server
		.mock_async(|when, then| {
			when.method(POST).path(LOGIN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":{"token":"tok-1"}}"#);
		})
		.await;
	let _readings = server
		.mock_async(|when, then| {
			when.method(GET).path(READINGS_PATH);
			then.status(200).header("content-type", "text/html").body("<html>maintenance</html>");
		})
		.await;
	let mut client = build_client(&server);
	let error = client.fetch_readings().await.expect_err("Malformed body should fail.");

	assert!(matches!(error, Error::Parse(_)));
}

#[tokio::test]
async fn failed_readings_status_maps_to_a_transport_status_error() {
	let server = MockServer::start_async().await;
	let _login = server
		.mock_async(|when, then| {
			when.method(POST).path(LOGIN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":{"token":"tok-1"}}"#);
		})
		.await;
	let _readings = server
		.mock_async(|when, then| {
			when.method(GET).path(READINGS_PATH);
			then.status(500).header("content-type", "application/json").body("{}");
		})
		.await;
	let mut client = build_client(&server);
	let error = client.fetch_readings().await.expect_err("Server failure should fail the cycle.");

	assert!(matches!(
		error,
		Error::Transport(TransportError::Status { endpoint: "readings", status: 500 }),
	));
}

#[tokio::test]
async fn test_connection_discards_the_issued_token() {
	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path(LOGIN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"data":{"token":"tok-1"}}"#);
		})
		.await;
	let mut client = build_client(&server);

	client.test_connection().await.expect("Connection test should succeed.");

	assert!(!client.session().is_authenticated());

	login.assert_calls_async(1).await;
}
