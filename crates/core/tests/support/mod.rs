//! Shared test helpers for `bydefeat-core` integration tests.
//!
//! These helpers wire a real `TokenExchanger` (over in-memory stores and a
//! mock token endpoint) to in-memory catalog and playback mocks, so session
//! and callback tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod catalog;
pub mod playback;

use std::sync::Arc;

use bydefeat_common::auth::{CredentialRecord, CredentialStore, TokenExchange, TokenExchanger};
use bydefeat_common::storage::MemoryStore;
use bydefeat_common::testing::MockOAuthClient;
use bydefeat_common::time::{Clock, MockClock};
use bydefeat_core::SessionService;
use bydefeat_domain::Track;

pub use catalog::MockCatalog;
pub use playback::MockPlaybackDevice;

/// Fully wired session under test.
pub struct Harness {
    pub oauth: Arc<MockOAuthClient>,
    pub exchanger: Arc<TokenExchanger<MockOAuthClient>>,
    pub primary: Arc<MemoryStore>,
    pub secondary: Arc<MemoryStore>,
    pub clock: MockClock,
    pub catalog: Arc<MockCatalog>,
    pub device: Arc<MockPlaybackDevice>,
    pub session: Arc<SessionService>,
}

impl Harness {
    pub fn new(catalog: MockCatalog) -> Self {
        let oauth = Arc::new(MockOAuthClient::new());
        let primary = Arc::new(MemoryStore::with_name("primary"));
        let secondary = Arc::new(MemoryStore::with_name("secondary"));
        let clock = MockClock::at_epoch_ms(1_700_000_000_000);
        let store = Arc::new(CredentialStore::new(
            primary.clone(),
            secondary.clone(),
            Arc::new(clock.clone()),
        ));
        let exchanger = Arc::new(TokenExchanger::new(oauth.clone(), store));
        let catalog = Arc::new(catalog);
        let device = Arc::new(MockPlaybackDevice::new("device-1"));
        let session = Arc::new(
            SessionService::new(exchanger.clone(), catalog.clone())
                .with_playback_device(device.clone()),
        );

        Self { oauth, exchanger, primary, secondary, clock, catalog, device, session }
    }

    pub fn auth(&self) -> Arc<dyn TokenExchange> {
        self.exchanger.clone()
    }

    /// Credentials valid for one hour from the harness clock.
    pub fn record(&self) -> CredentialRecord {
        CredentialRecord {
            access_token: "access".into(),
            refresh_token: Some("refresh".into()),
            expires_at_epoch_ms: self.clock.millis_since_epoch() + 3_600_000,
        }
    }

    /// Authenticate and wait for the session data load to finish.
    pub async fn login(&self) {
        let load = self.session.authenticate(&self.record()).expect("authenticate");
        load.await.expect("session load task");
    }
}

pub fn track(id: &str) -> Track {
    Track {
        id: id.into(),
        name: format!("Track {id}"),
        artist: "By Defeat".into(),
        album: Some("Live".into()),
        duration_ms: 200_000,
        preview_url: None,
        image_url: None,
        uri: format!("spotify:track:{id}"),
        popularity: Some(50),
    }
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}
