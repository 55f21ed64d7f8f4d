// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Environment - Configuration and fixtures for one test scenario
//
// Holds the scenario's configuration, hands out browser sessions through a
// lazily built BrowserFactory, and resolves `user`/`password`. When the
// `user_factory` option is enabled, accounts are provisioned on first
// reference instead of being read from configuration.

use crate::api::BrowserKind;
use crate::error::{Error, Result};
use crate::factory::{BrowserFactory, Config};
use crate::session::Session;
use crate::session::remote::DEFAULT_WEBDRIVER_URL;
use crate::users::{AccountCreator, AccountField, UserFactory};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Environment variables read by [`Environment::from_env`]
const ENV_KEYS: &[&str] = &[
    "BROWSER",
    "BROWSER_HEIGHT",
    "BROWSER_LANGUAGE",
    "BROWSER_TIMEOUT",
    "BROWSER_USER_AGENT",
    "BROWSER_WIDTH",
    "HEADLESS",
    "MEDIAWIKI_API_URL",
    "MEDIAWIKI_PASSWORD",
    "MEDIAWIKI_URL",
    "MEDIAWIKI_USER",
    "USER_FACTORY",
    "WEBDRIVER_URL",
];

const USER_KEY: &str = "mediawiki_user";
const PASSWORD_KEY: &str = "mediawiki_password";

/// Configuration and fixtures for one test scenario.
///
/// Environments derived with [`with_alternative`](Self::with_alternative)
/// share the provisioned accounts of their origin, and its browser factories
/// for as long as they use the same browser kind.
#[derive(Clone)]
pub struct Environment {
    config: Config,
    alternatives: HashMap<String, String>,
    users: Option<Arc<UserFactory>>,
    browser_factories: Arc<Mutex<HashMap<BrowserKind, Arc<BrowserFactory>>>>,
}

impl Environment {
    /// Creates an environment from explicit configuration
    pub fn new(config: Config) -> Self {
        Self {
            config,
            alternatives: HashMap::new(),
            users: None,
            browser_factories: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates an environment from the process environment.
    ///
    /// Known variables (`BROWSER`, `MEDIAWIKI_URL`, ...) become lower-cased
    /// configuration keys.
    pub fn from_env() -> Self {
        let config = ENV_KEYS
            .iter()
            .filter_map(|key| {
                std::env::var(key)
                    .ok()
                    .map(|value| (key.to_ascii_lowercase(), value))
            })
            .collect();

        Self::new(config)
    }

    /// Provisions accounts through `creator` when `user_factory` is enabled
    pub fn with_account_creator(mut self, creator: Arc<dyn AccountCreator>) -> Self {
        self.users = Some(Arc::new(UserFactory::new(creator)));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the configured value for `key`, if any
    pub fn get(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }

    /// Returns the configured value for `key`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if `key` is not configured.
    pub fn lookup(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| Error::InvalidConfig(format!("'{}' is not configured", key)))
    }

    /// Looks up `<key>_<id>`, or `key` itself when `id` is `None`
    pub fn lookup_for(&self, key: &str, id: Option<&str>) -> Result<&str> {
        match id {
            Some(id) => self.lookup(&format!("{}_{}", key, id)),
            None => self.lookup(key),
        }
    }

    /// Whether accounts are provisioned on first reference
    pub fn user_factory_enabled(&self) -> bool {
        self.get("user_factory").is_some_and(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes"
            )
        })
    }

    /// Returns a copy of this environment using alternative `id` for `key`.
    ///
    /// `key` takes the value of `<key>_<id>` when that is configured and is
    /// unset otherwise.
    pub fn with_alternative(&self, key: &str, id: &str) -> Self {
        let mut env = self.clone();
        env.alternatives.insert(key.to_string(), id.to_string());

        match self.config.get(&format!("{}_{}", key, id)) {
            Some(value) => {
                env.config.insert(key.to_string(), value.clone());
            }
            None => {
                env.config.remove(key);
            }
        }

        env
    }

    /// Returns a copy of this environment acting as user `id`
    pub fn as_user(&self, id: &str) -> Self {
        self.with_alternative(USER_KEY, id)
            .with_alternative(PASSWORD_KEY, id)
    }

    /// Alternative id currently in effect for `key`
    pub fn current_alternative(&self, key: &str) -> Option<&str> {
        self.alternatives.get(key).map(String::as_str)
    }

    /// Username for `id` (or the default user)
    pub async fn user(&self, id: Option<&str>) -> Result<String> {
        self.credential(USER_KEY, AccountField::Username, id).await
    }

    /// Password for `id` (or the default user)
    pub async fn password(&self, id: Option<&str>) -> Result<String> {
        self.credential(PASSWORD_KEY, AccountField::Password, id).await
    }

    async fn credential(
        &self,
        config_key: &str,
        field: AccountField,
        id: Option<&str>,
    ) -> Result<String> {
        if !self.user_factory_enabled() {
            return self.lookup_for(config_key, id).map(str::to_string);
        }

        let users = self.users.as_ref().ok_or_else(|| {
            Error::InvalidConfig(
                "user_factory is enabled but no account creator was given".to_string(),
            )
        })?;
        let alternative = self.current_alternative(config_key);

        // Inside an alternative, an explicitly configured value wins
        if let Some(alt_id) = alternative.filter(|alt_id| Some(*alt_id) == id) {
            if let Some(value) = self.get(config_key) {
                return Ok(value.to_string());
            }
            let account = users.create(Some(alt_id)).await?;
            return Ok(account.field(field).to_string());
        }

        let account = users.create(id.or(alternative)).await?;
        Ok(account.field(field).to_string())
    }

    /// Base URL of the wiki under test (`mediawiki_url`)
    pub fn wiki_url(&self) -> Result<Url> {
        Ok(Url::parse(self.lookup("mediawiki_url")?)?)
    }

    /// URL of a page relative to the wiki's base URL
    pub fn page_url(&self, page: &str) -> Result<Url> {
        let base = self.wiki_url()?;
        Ok(base.join(page)?)
    }

    /// Action API endpoint: `mediawiki_api_url`, or `/w/api.php` on the wiki host
    pub fn api_url(&self) -> Result<Url> {
        match self.get("mediawiki_api_url") {
            Some(url) => Ok(Url::parse(url)?),
            None => Ok(self.wiki_url()?.join("/w/api.php")?),
        }
    }

    /// Browser kind from `browser`, defaulting to Firefox
    pub fn browser_kind(&self) -> BrowserKind {
        self.get("browser")
            .map(BrowserKind::parse)
            .unwrap_or(BrowserKind::Firefox)
    }

    /// Configuration relevant to building a browser
    pub fn browser_config(&self) -> Config {
        self.config
            .iter()
            .filter(|(key, _)| key.starts_with("browser_") || key.as_str() == "headless")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Uses `factory` for its browser kind in this environment and every
    /// environment derived from it
    pub fn set_browser_factory(&self, factory: Arc<BrowserFactory>) {
        self.browser_factories
            .lock()
            .insert(factory.browser().clone(), factory);
    }

    /// Factory for the configured browser kind, created on first use against
    /// `webdriver_url`
    pub fn browser_factory(&self) -> Result<Arc<BrowserFactory>> {
        let kind = self.browser_kind();
        let mut factories = self.browser_factories.lock();
        if let Some(factory) = factories.get(&kind) {
            return Ok(Arc::clone(factory));
        }

        let endpoint = self.get("webdriver_url").unwrap_or(DEFAULT_WEBDRIVER_URL);
        let factory = Arc::new(BrowserFactory::remote(kind.clone(), endpoint)?);
        tracing::debug!("Created {} browser factory for {}", kind, endpoint);

        factories.insert(kind, Arc::clone(&factory));
        Ok(factory)
    }

    /// Browser session for the current configuration
    pub async fn browser(&self) -> Result<Arc<dyn Session>> {
        let factory = self.browser_factory()?;
        factory.instance_for(&self.browser_config()).await
    }

    /// Closes every session the browser factories built.
    ///
    /// Every factory is torn down even if one fails; the first failure is
    /// returned.
    pub async fn teardown(&self) -> Result<()> {
        let factories: Vec<_> = self
            .browser_factories
            .lock()
            .values()
            .cloned()
            .collect();
        let mut first_error = None;

        for factory in factories {
            if let Err(e) = factory.teardown().await {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("config", &self.config)
            .field("alternatives", &self.alternatives)
            .field("user_factory", &self.users.is_some())
            .finish_non_exhaustive()
    }
}
