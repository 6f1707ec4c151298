//! Application context - dependency injection container

use std::sync::Arc;

use bydefeat_common::auth::{CredentialStore, OAuthClient, OAuthConfig, TokenExchange, TokenExchanger};
use bydefeat_common::{KeyValueStore, MemoryStore, SystemClock};
use bydefeat_core::{BandSettings, CallbackHandler, CatalogProvider, PlaybackDevice, SessionService};
use bydefeat_domain::{Config, Result};
use bydefeat_infra::storage::store_file_path;
use bydefeat_infra::{
    config, ApiClient, ApiClientConfig, ExchangerTokenProvider, JsonFileStore, KeychainStore,
    RemotePlaybackDevice, SpotifyCatalog,
};
use tracing::info;

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub credentials: Arc<CredentialStore>,
    pub auth: Arc<dyn TokenExchange>,
    pub api: Arc<ApiClient>,
    pub playback: Arc<RemotePlaybackDevice>,
    pub session: Arc<SessionService>,
}

impl AppContext {
    /// Load configuration from the environment and files, then wire every
    /// service.
    ///
    /// # Errors
    /// Returns `ByDefeatError::Config` for invalid configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(config::load()?)
    }

    /// Wire services for `config` using the configured stores.
    ///
    /// With the keychain enabled it holds credentials and the JSON file is
    /// the handshake fallback. Without it the file is primary and handshakes
    /// fall back to memory.
    ///
    /// # Errors
    /// Returns `ByDefeatError::Config` when the HTTP client cannot be built.
    pub fn with_config(config: Config) -> Result<Self> {
        let file: Arc<dyn KeyValueStore> =
            Arc::new(JsonFileStore::new(store_file_path(&config.storage)));

        let (primary, secondary): (Arc<dyn KeyValueStore>, Arc<dyn KeyValueStore>) =
            if config.storage.use_keychain {
                (Arc::new(KeychainStore::new(config.storage.keychain_service.clone())), file)
            } else {
                (file, Arc::new(MemoryStore::new()))
            };

        Self::with_stores(config, primary, secondary)
    }

    /// Wire services over explicit primary and secondary stores.
    ///
    /// # Errors
    /// Returns `ByDefeatError::Config` when the HTTP client cannot be built.
    pub fn with_stores(
        config: Config,
        primary: Arc<dyn KeyValueStore>,
        secondary: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        info!(
            primary = primary.name(),
            secondary = secondary.name(),
            artist = %config.band.artist_name,
            "Initializing application context"
        );

        let credentials = Arc::new(CredentialStore::new(primary, secondary, Arc::new(SystemClock)));

        let oauth = OAuthClient::new(OAuthConfig::new(
            config.auth.client_id.clone(),
            config.auth.redirect_uri.clone(),
            config.auth.scopes.clone(),
            config.auth.authorize_url.clone(),
            config.auth.token_url.clone(),
        ));
        let auth: Arc<dyn TokenExchange> = Arc::new(
            TokenExchanger::new(Arc::new(oauth), credentials.clone())
                .with_handshake_ttl(config.auth.handshake_ttl()),
        );

        let api = Arc::new(ApiClient::new(
            ApiClientConfig::from(&config.api),
            Arc::new(ExchangerTokenProvider::new(auth.clone())),
        )?);

        let catalog: Arc<dyn CatalogProvider> =
            Arc::new(SpotifyCatalog::new(api.clone()).with_market(config.api.market.clone()));
        let playback = Arc::new(RemotePlaybackDevice::new(api.clone()));
        let device: Arc<dyn PlaybackDevice> = playback.clone();

        let session = Arc::new(
            SessionService::new(auth.clone(), catalog)
                .with_playback_device(device)
                .with_band(BandSettings::from(&config.band)),
        );

        Ok(Self { config, credentials, auth, api, playback, session })
    }

    /// Fresh handler for one authorization redirect.
    pub fn callback_handler(&self) -> Arc<CallbackHandler> {
        Arc::new(
            CallbackHandler::new(self.auth.clone(), self.session.clone())
                .with_timeout(self.config.auth.callback_timeout()),
        )
    }
}
