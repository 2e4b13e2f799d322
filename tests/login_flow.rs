//! End-to-end login handshake against a mocked platform API: direct
//! login, the two-factor path, rejected codes, and the offline logout.

use std::net::TcpListener;
use std::sync::Arc;

use bazaro::api::{ApiClient, UserProfile};
use bazaro::flow::{FlowOutcome, FlowState, LoginFlow};
use bazaro::session::{LockoutPolicy, LoginAttempts, ManualClock, MemoryStore, SessionManager};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

struct Harness {
    flow: LoginFlow,
    session: Arc<SessionManager>,
}

fn harness(base_url: &str) -> Harness {
    let api = Arc::new(ApiClient::new(base_url).expect("Failed to build API client"));
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(1_000));

    let session = SessionManager::new(store.clone(), clock.clone(), api.clone());
    let attempts = LoginAttempts::new(store, clock, LockoutPolicy::default());
    let flow = LoginFlow::new(api, session.clone(), attempts);

    Harness { flow, session }
}

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

#[tokio::test]
async fn direct_login_stores_the_token() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({
            "email": "ana@bazaro.dev",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "t1",
            "user": {"name": "Ana", "email": "ana@bazaro.dev", "role": "admin"}
        })))
        .mount(&server)
        .await;

    let harness = harness(&server.uri());
    let outcome = harness
        .flow
        .submit_credentials("ana@bazaro.dev", &secret("hunter2"))
        .await;

    match outcome {
        FlowOutcome::Success { message, user } => {
            assert!(message.contains("Ana"));
            assert_eq!(user.email, "ana@bazaro.dev");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(harness.flow.state(), FlowState::Authenticated);
    assert_eq!(harness.session.token().as_deref(), Some("t1"));
}

#[tokio::test]
async fn two_factor_path_defers_the_token() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "verification_required",
            "message": "Code sent"
        })))
        .mount(&server)
        .await;

    // the code is uppercased on the way out
    Mock::given(method("POST"))
        .and(path("/auth/verify-code"))
        .and(body_json(json!({
            "email": "ana@bazaro.dev",
            "code": "A1B2C3"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "t2",
            "user": {"name": "Ana", "email": "ana@bazaro.dev"}
        })))
        .mount(&server)
        .await;

    let harness = harness(&server.uri());

    let first = harness
        .flow
        .submit_credentials("ana@bazaro.dev", &secret("hunter2"))
        .await;
    assert_eq!(
        first,
        FlowOutcome::VerificationRequired {
            message: "Code sent".to_string()
        }
    );
    assert_eq!(
        harness.flow.pending_email().as_deref(),
        Some("ana@bazaro.dev")
    );
    // no token until the second step completes
    assert_eq!(harness.session.token(), None);

    let second = harness.flow.submit_code("a1b2c3").await;
    assert!(matches!(second, FlowOutcome::Success { .. }));
    assert_eq!(harness.flow.state(), FlowState::Authenticated);
    assert_eq!(harness.session.token().as_deref(), Some("t2"));
}

#[tokio::test]
async fn rejected_code_keeps_the_pending_email() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "verification_required",
            "message": "Code sent"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/verify-code"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Invalid code"
        })))
        .mount(&server)
        .await;

    let harness = harness(&server.uri());
    harness
        .flow
        .submit_credentials("ana@bazaro.dev", &secret("hunter2"))
        .await;

    let outcome = harness.flow.submit_code("ABCDEF").await;

    assert_eq!(
        outcome,
        FlowOutcome::Failure {
            message: "Invalid code".to_string()
        }
    );
    assert_eq!(
        harness.flow.state(),
        FlowState::AwaitingCode {
            email: "ana@bazaro.dev".to_string()
        }
    );
    assert_eq!(harness.session.token(), None);
}

#[tokio::test]
async fn rejected_credentials_surface_the_server_message() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": "error",
            "message": "Account temporarily locked"
        })))
        .mount(&server)
        .await;

    let harness = harness(&server.uri());
    let outcome = harness
        .flow
        .submit_credentials("ana@bazaro.dev", &secret("wrong"))
        .await;

    assert_eq!(
        outcome,
        FlowOutcome::Failure {
            message: "Account temporarily locked".to_string()
        }
    );
    assert_eq!(harness.flow.state(), FlowState::AwaitingCredentials);
}

#[tokio::test]
async fn empty_fields_never_reach_the_network() {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return;
    }
    let server = MockServer::start().await;
    let harness = harness(&server.uri());

    let missing_email = harness.flow.submit_credentials("", &secret("x")).await;
    let missing_password = harness
        .flow
        .submit_credentials("ana@bazaro.dev", &secret(""))
        .await;

    assert!(matches!(missing_email, FlowOutcome::Failure { .. }));
    assert!(matches!(missing_password, FlowOutcome::Failure { .. }));

    let requests = server
        .received_requests()
        .await
        .expect("request recording is enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn logout_clears_locally_when_the_network_is_down() {
    // grab a port and free it again, so the request is refused
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0");
        let Ok(listener) = listener else {
            eprintln!("Skipping test: cannot bind localhost");
            return;
        };
        listener.local_addr().expect("Failed to read address").port()
    };

    let harness = harness(&format!("http://127.0.0.1:{port}"));
    harness.session.set_session(
        "t1",
        &UserProfile {
            name: "Ana".to_string(),
            email: "ana@bazaro.dev".to_string(),
            role: None,
        },
    );
    assert!(harness.session.is_authenticated());

    harness.flow.logout().await;

    assert_eq!(harness.session.token(), None);
    assert!(!harness.session.is_authenticated());
    assert_eq!(harness.flow.state(), FlowState::AwaitingCredentials);
}
