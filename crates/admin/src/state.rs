//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError, UserApi};
use crate::config::TalentConfig;
use crate::menu::Menu;
use crate::models::CurrentUser;
use crate::oidc::OidcClient;
use crate::services::AuthEventBus;

/// Application state shared across all handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: TalentConfig,
    oidc: OidcClient,
    api: ApiClient,
    menu: Menu,
    auth_bus: AuthEventBus,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: TalentConfig,
        oidc: OidcClient,
        api: ApiClient,
        menu: Menu,
        auth_bus: AuthEventBus,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                oidc,
                api,
                menu,
                auth_bus,
            }),
        }
    }

    /// Build the clients, load the menu and create the auth bus.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] if an HTTP client cannot be built.
    pub fn from_config(config: TalentConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api)?;
        let http = reqwest::Client::builder()
            .timeout(config.api.timeout)
            .user_agent(concat!("talent-admin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Client)?;
        let oidc = OidcClient::new(config.oidc.clone(), http);
        let menu = Menu::load(&config.menu_path);
        Ok(Self::new(config, oidc, api, menu, AuthEventBus::default()))
    }

    #[must_use]
    pub fn config(&self) -> &TalentConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn oidc(&self) -> &OidcClient {
        &self.inner.oidc
    }

    #[must_use]
    pub fn menu(&self) -> &Menu {
        &self.inner.menu
    }

    #[must_use]
    pub fn auth_bus(&self) -> &AuthEventBus {
        &self.inner.auth_bus
    }

    /// API client carrying the user's access token.
    #[must_use]
    pub fn api_for(&self, user: &CurrentUser) -> UserApi {
        self.inner.api.as_user(user.access_token())
    }
}
