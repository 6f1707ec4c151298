//! Integration tests for AppContext lifecycle
//!
//! Drives a complete browser login against a mocked authorization server and
//! Web API: loopback redirect, code exchange, session load, then a restart
//! that resumes from the persisted store.

use std::net::TcpListener;

use bydefeat_core::CallbackState;
use bydefeat_domain::Config;
use bydefeat_lib::commands;
use bydefeat_lib::context::AppContext;
use serde_json::json;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A loopback port that was free a moment ago.
fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

fn test_config(server: &MockServer, data_dir: &TempDir, port: u16) -> Config {
    let mut config = Config::default();
    config.auth.client_id = "band-player".into();
    config.auth.redirect_uri = format!("http://127.0.0.1:{port}/callback");
    config.auth.authorize_url = format!("{}/authorize", server.uri());
    config.auth.token_url = format!("{}/api/token", server.uri());
    config.auth.handshake_ttl_seconds = 10;
    config.api.base_url = server.uri();
    config.storage.use_keychain = false;
    config.storage.data_dir = Some(data_dir.path().to_path_buf());
    config
}

async fn mount_api(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "fan",
            "display_name": "Fan"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "artists": { "items": [] },
            "tracks": { "items": [{
                "id": "t1",
                "name": "Opener",
                "artists": [{ "id": "a1", "name": "By Defeat" }],
                "album": { "name": "Live", "images": [] },
                "duration_ms": 180_000,
                "uri": "spotify:track:t1",
                "popularity": 40
            }] }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/player"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

/// Act as the browser: follow the authorization URL back to the redirect.
fn follow_redirect(port: u16) -> impl FnOnce(&str) {
    move |authorize_url: &str| {
        let url = Url::parse(authorize_url).unwrap();
        let state = url
            .query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .unwrap();

        tokio::spawn(async move {
            let redirect = format!("http://127.0.0.1:{port}/callback?code=auth-code&state={state}");
            reqwest::get(redirect).await.unwrap();
        });
    }
}

#[tokio::test]
async fn test_login_loads_session_and_survives_restart() {
    let server = MockServer::start().await;
    mount_api(&server).await;
    let data_dir = TempDir::new().unwrap();
    let port = free_port();
    let config = test_config(&server, &data_dir, port);

    let ctx = AppContext::with_config(config.clone()).unwrap();
    let outcome = commands::login(&ctx, follow_redirect(port)).await.unwrap();

    assert_eq!(outcome, CallbackState::Success);
    let state = ctx.session.state();
    assert!(state.is_authenticated());
    assert_eq!(state.profile.map(|p| p.id).as_deref(), Some("fan"));
    assert_eq!(state.playlist.len(), 1);
    assert_eq!(state.playlist[0].name, "Opener");
    assert!(ctx.credentials.load_handshake().is_none());

    let restarted = AppContext::with_config(config).unwrap();
    assert!(commands::restore_session(&restarted).await.unwrap());
    assert_eq!(restarted.session.state().playlist[0].uri, "spotify:track:t1");

    commands::logout(&restarted).await;
    let after_logout = AppContext::with_config(restarted.config.clone()).unwrap();
    assert!(!commands::restore_session(&after_logout).await.unwrap());
}

#[tokio::test]
async fn test_denied_login_reports_error_state() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    let port = free_port();
    let ctx = AppContext::with_config(test_config(&server, &data_dir, port)).unwrap();

    let deny = move |_: &str| {
        tokio::spawn(async move {
            let redirect = format!("http://127.0.0.1:{port}/callback?error=access_denied");
            reqwest::get(redirect).await.unwrap();
        });
    };
    let outcome = commands::login(&ctx, deny).await.unwrap();

    assert!(matches!(outcome, CallbackState::Error(_)));
    assert!(!ctx.session.state().is_authenticated());
}
