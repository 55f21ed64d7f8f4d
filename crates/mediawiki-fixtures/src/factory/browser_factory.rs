// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// BrowserFactory - Resolves configuration into browser sessions
//
// Resolution:
// 1. Merge instance overrides into the caller's configuration (overrides win)
// 2. Seed BrowserOptions with the browser kind's capabilities and a default
//    HTTP client configuration
// 3. Run every binding whose options are all present, in order: factory type
//    bindings (ancestors first), then instance bindings
//
// Sessions are cached by the merged configuration, so equal configurations
// share one live session for the lifetime of the factory.

use crate::api::{
    BrowserKind, BrowserOptions, CapabilitiesLookup, DefaultCapabilities, DefaultHttpClient,
    HttpClientFactory,
};
use crate::error::Result;
use crate::factory::binding::{BindingCallback, BindingKey, BindingRegistry, Config};
use crate::factory::factory_type::{FactoryType, factory_type_for};
use crate::session::{RemoteSessionConstructor, Session, SessionConstructor};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;

/// Builds and caches browser sessions for one test scenario.
///
/// # Example
///
/// ```ignore
/// use mediawiki_fixtures::factory::{BrowserFactory, Config};
///
/// # async fn example() -> mediawiki_fixtures::Result<()> {
/// let factory = BrowserFactory::remote("firefox".into(), "http://localhost:4444")?;
///
/// // Always run headless, whatever the scenario asks for
/// factory.override_config([("headless", "true")]);
///
/// let config = Config::from([("browser_language".to_string(), "de".to_string())]);
/// let browser = factory.instance_for(&config).await?;
/// browser.navigate("http://localhost:8080/wiki/Main_Page").await?;
///
/// // Same configuration, same session
/// let again = factory.instance_for(&config.clone()).await?;
/// assert!(std::sync::Arc::ptr_eq(&browser, &again));
///
/// factory.teardown().await?;
/// # Ok(())
/// # }
/// ```
pub struct BrowserFactory {
    factory_type: Arc<FactoryType>,
    browser: BrowserKind,
    capabilities: Arc<dyn CapabilitiesLookup>,
    http_clients: Arc<dyn HttpClientFactory>,
    constructor: Arc<dyn SessionConstructor>,
    /// Instance-level bindings, applied after the factory type's
    bindings: RwLock<BindingRegistry>,
    overrides: RwLock<Config>,
    /// Held across construction so each configuration is built at most once
    sessions: TokioMutex<HashMap<Config, Arc<dyn Session>>>,
}

impl BrowserFactory {
    /// Creates a factory of `factory_type` for `browser`, building sessions
    /// with `constructor`
    pub fn new(
        factory_type: Arc<FactoryType>,
        browser: BrowserKind,
        constructor: Arc<dyn SessionConstructor>,
    ) -> Self {
        Self {
            factory_type,
            browser,
            capabilities: Arc::new(DefaultCapabilities),
            http_clients: Arc::new(DefaultHttpClient),
            constructor,
            bindings: RwLock::new(BindingRegistry::new()),
            overrides: RwLock::new(Config::new()),
            sessions: TokioMutex::new(HashMap::new()),
        }
    }

    /// Creates a factory using the built-in factory type for `browser`
    pub fn for_browser(browser: BrowserKind, constructor: Arc<dyn SessionConstructor>) -> Self {
        Self::new(factory_type_for(&browser), browser, constructor)
    }

    /// Creates a factory building sessions on the WebDriver remote end at
    /// `endpoint`
    pub fn remote(browser: BrowserKind, endpoint: &str) -> Result<Self> {
        let constructor = RemoteSessionConstructor::new(endpoint)?;
        Ok(Self::for_browser(browser, Arc::new(constructor)))
    }

    /// Replaces the capabilities lookup
    pub fn with_capabilities(mut self, lookup: Arc<dyn CapabilitiesLookup>) -> Self {
        self.capabilities = lookup;
        self
    }

    /// Replaces the default HTTP client factory
    pub fn with_http_client_factory(mut self, factory: Arc<dyn HttpClientFactory>) -> Self {
        self.http_clients = factory;
        self
    }

    pub fn browser(&self) -> &BrowserKind {
        &self.browser
    }

    pub fn factory_type(&self) -> &Arc<FactoryType> {
        &self.factory_type
    }

    /// Declares a binding on this factory only.
    ///
    /// Unlike [`FactoryType::configure`], a missing callback is allowed and
    /// stored as a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidBinding` if `names` is empty or repeats a name.
    pub fn configure<I, S>(&self, names: I, callback: Option<BindingCallback>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = BindingKey::new(names)?;
        let callback = callback.unwrap_or_else(BindingCallback::noop);

        tracing::debug!("Declaring instance binding {} for {}", key, self.browser);
        self.bindings.write().register(key.names().to_vec(), callback)
    }

    /// Declares an instance binding from a closure
    pub fn bind<I, S, F>(&self, names: I, callback: F) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&[&str], &mut BrowserOptions) -> Result<()> + Send + Sync + 'static,
    {
        self.configure(names, Some(BindingCallback::new(callback)))
    }

    /// Permanently overrides configuration values for this factory.
    ///
    /// Later overrides for the same option replace earlier ones.
    pub fn override_config<I, K, V>(&self, overrides: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut current = self.overrides.write();
        for (key, value) in overrides {
            current.insert(key.into(), value.into());
        }
    }

    /// Current overrides
    pub fn overrides(&self) -> Config {
        self.overrides.read().clone()
    }

    /// Effective bindings: the factory type's, then this instance's
    pub fn bindings(&self) -> BindingRegistry {
        self.factory_type.bindings().merged(&self.bindings.read())
    }

    /// Returns `config` with the overrides applied
    pub fn merged_config(&self, config: &Config) -> Config {
        let mut merged = config.clone();
        merged.extend(
            self.overrides
                .read()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        merged
    }

    /// Resolves `config` into the options a session would be built with.
    ///
    /// # Errors
    ///
    /// Any error returned by a binding callback, unchanged. Bindings after
    /// the failing one don't run.
    pub fn resolve(&self, config: &Config) -> Result<BrowserOptions> {
        self.resolve_merged(&self.merged_config(config))
    }

    fn resolve_merged(&self, merged: &Config) -> Result<BrowserOptions> {
        let mut options = BrowserOptions::new(
            self.capabilities.capabilities(&self.browser),
            self.http_clients.http_client(),
        );

        let bindings = self.bindings();
        let mut applied = 0;
        for binding in bindings.iter() {
            if binding.apply(merged, &mut options)? {
                applied += 1;
            }
        }

        tracing::debug!(
            "Resolved {} options: {} of {} bindings applied",
            self.browser,
            applied,
            bindings.len()
        );

        Ok(options)
    }

    /// Returns the session for `config`, constructing it on first request.
    ///
    /// The cache key is the configuration after overrides are applied. A
    /// cached session is returned as-is.
    ///
    /// # Errors
    ///
    /// Binding and construction errors propagate unchanged; a failed
    /// construction leaves nothing in the cache.
    pub async fn instance_for(&self, config: &Config) -> Result<Arc<dyn Session>> {
        let key = self.merged_config(config);
        let mut sessions = self.sessions.lock().await;

        if let Some(session) = sessions.get(&key) {
            tracing::debug!("Reusing cached {} session {}", self.browser, session.id());
            return Ok(Arc::clone(session));
        }

        let options = self.resolve_merged(&key)?;
        let session = self.constructor.construct(options).await?;
        tracing::debug!("Constructed {} session {}", self.browser, session.id());

        sessions.insert(key, Arc::clone(&session));
        Ok(session)
    }

    /// Alias for [`instance_for`](Self::instance_for)
    pub async fn browser_for(&self, config: &Config) -> Result<Arc<dyn Session>> {
        self.instance_for(config).await
    }

    /// Number of cached sessions
    pub async fn cached_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Closes every cached session and empties the cache.
    ///
    /// All sessions are closed even if some fail; the first failure is
    /// returned.
    pub async fn teardown(&self) -> Result<()> {
        let sessions: Vec<_> = self.sessions.lock().await.drain().collect();
        let mut first_error = None;

        for (_, session) in sessions {
            if let Err(e) = session.close().await {
                tracing::warn!("Failed to close {} session {}: {}", self.browser, session.id(), e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for BrowserFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserFactory")
            .field("factory_type", &self.factory_type.name())
            .field("browser", &self.browser)
            .field("overrides", &*self.overrides.read())
            .finish_non_exhaustive()
    }
}
