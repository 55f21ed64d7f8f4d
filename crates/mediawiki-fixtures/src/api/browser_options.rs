// Browser options - the accumulator produced by resolving a configuration
//
// A BrowserFactory seeds BrowserOptions with the capabilities for its browser
// kind and a default HTTP client configuration. Bindings then mutate it, and
// the final value is handed to the session constructor.

use crate::api::capabilities::Capabilities;
use crate::error::Result;
use serde_json::{Map, Value, json};
use std::time::Duration;

/// Transport configuration used when talking to the WebDriver remote end.
///
/// All options are optional and fall back to reqwest's defaults if not specified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpClientConfig {
    /// Overall request timeout
    pub timeout: Option<Duration>,

    /// Timeout for establishing the TCP connection
    pub connect_timeout: Option<Duration>,

    /// Proxy URL for all requests (e.g. "http://proxy:8080")
    pub proxy: Option<String>,
}

impl HttpClientConfig {
    /// Creates a new HttpClientConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the overall request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Route requests through a proxy
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Builds a reqwest client from this configuration
    pub fn build(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(proxy) = &self.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
        }

        Ok(builder.build()?)
    }
}

/// Produces the HTTP client configuration every resolution starts from.
pub trait HttpClientFactory: Send + Sync {
    fn http_client(&self) -> HttpClientConfig;
}

/// Default factory: a fresh, unconfigured client per resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHttpClient;

impl HttpClientFactory for DefaultHttpClient {
    fn http_client(&self) -> HttpClientConfig {
        HttpClientConfig::default()
    }
}

/// Options for constructing a browser session.
///
/// Bindings receive this by mutable reference. The typed fields cover what
/// the built-in factory types write; `extra` holds anything else a binding
/// wants to hand to its session constructor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowserOptions {
    /// Capabilities for the browser kind
    pub capabilities: Capabilities,

    /// Transport configuration for the session
    pub http_client: HttpClientConfig,

    /// Additional command line arguments for the browser
    pub args: Vec<String>,

    /// Chrome preferences (`goog:chromeOptions.prefs`)
    pub prefs: Map<String, Value>,

    /// Firefox profile preferences (`moz:firefoxOptions.prefs`)
    pub profile: Map<String, Value>,

    /// Arbitrary binding-contributed entries
    pub extra: Map<String, Value>,
}

impl BrowserOptions {
    /// Creates the seeded accumulator
    pub fn new(capabilities: Capabilities, http_client: HttpClientConfig) -> Self {
        Self {
            capabilities,
            http_client,
            ..Default::default()
        }
    }

    /// Returns a binding-contributed entry
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Sets a binding-contributed entry, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.extra.insert(key.into(), value.into())
    }

    /// Window size contributed by the `browser_width`/`browser_height` binding
    pub fn window_size(&self) -> Option<(u64, u64)> {
        let size = self.extra.get("window_size")?.as_array()?;
        match size.as_slice() {
            [w, h] => Some((w.as_u64()?, h.as_u64()?)),
            _ => None,
        }
    }

    /// Vendor capability that carries args and prefs for this browser, if any
    fn vendor_options_key(&self) -> Option<&'static str> {
        match self.capabilities.browser_name()? {
            "chrome" | "chromium" => Some("goog:chromeOptions"),
            "firefox" => Some("moz:firefoxOptions"),
            "MicrosoftEdge" => Some("ms:edgeOptions"),
            _ => None,
        }
    }

    /// Builds the W3C new-session payload
    ///
    /// Args and preferences are folded into the browser's vendor options block,
    /// keeping anything a capabilities lookup already put there:
    /// - chrome/edge: `{args, prefs}`
    /// - firefox: `{args, prefs: profile}`
    pub(crate) fn normalize(&self) -> Value {
        let mut caps = self.capabilities.clone();

        if let Some(key) = self.vendor_options_key() {
            let prefs = if key == "moz:firefoxOptions" {
                &self.profile
            } else {
                &self.prefs
            };

            if !self.args.is_empty() || !prefs.is_empty() {
                let mut vendor = match caps.remove(key) {
                    Some(Value::Object(map)) => map,
                    _ => Map::new(),
                };

                if !self.args.is_empty() {
                    let mut args: Vec<Value> = vendor
                        .remove("args")
                        .and_then(|v| v.as_array().cloned())
                        .unwrap_or_default();
                    args.extend(self.args.iter().cloned().map(Value::String));
                    vendor.insert("args".to_string(), Value::Array(args));
                }

                if !prefs.is_empty() {
                    let mut merged = match vendor.remove("prefs") {
                        Some(Value::Object(map)) => map,
                        _ => Map::new(),
                    };
                    merged.extend(prefs.clone());
                    vendor.insert("prefs".to_string(), Value::Object(merged));
                }

                caps.set(key, Value::Object(vendor));
            }
        }

        json!({ "capabilities": { "alwaysMatch": caps.into_value() } })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::capabilities::{BrowserKind, CapabilitiesLookup, DefaultCapabilities};

    fn options_for(kind: BrowserKind) -> BrowserOptions {
        BrowserOptions::new(
            DefaultCapabilities.capabilities(&kind),
            DefaultHttpClient.http_client(),
        )
    }

    #[test]
    fn test_http_client_config_builder() {
        let config = HttpClientConfig::new()
            .timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(5))
            .proxy("http://proxy:8080");

        assert_eq!(config.timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.proxy.as_deref(), Some("http://proxy:8080"));
        assert!(config.build().is_ok());
    }

    #[test]
    fn test_normalize_plain_capabilities() {
        let opts = options_for(BrowserKind::Other("lynx".to_string()));
        let payload = opts.normalize();

        assert_eq!(
            payload,
            json!({ "capabilities": { "alwaysMatch": { "browserName": "lynx" } } })
        );
    }

    #[test]
    fn test_normalize_chrome_args_and_prefs() {
        let mut opts = options_for(BrowserKind::Chrome);
        opts.args.push("--headless".to_string());
        opts.prefs
            .insert("intl.accept_languages".to_string(), json!("de"));

        let payload = opts.normalize();
        let chrome = &payload["capabilities"]["alwaysMatch"]["goog:chromeOptions"];

        assert_eq!(chrome["args"], json!(["--headless"]));
        assert_eq!(chrome["prefs"]["intl.accept_languages"], "de");
    }

    #[test]
    fn test_normalize_firefox_uses_profile() {
        let mut opts = options_for(BrowserKind::Firefox);
        opts.profile
            .insert("general.useragent.override".to_string(), json!("bot"));
        opts.prefs.insert("ignored".to_string(), json!(true));

        let payload = opts.normalize();
        let firefox = &payload["capabilities"]["alwaysMatch"]["moz:firefoxOptions"];

        assert_eq!(firefox["prefs"]["general.useragent.override"], "bot");
        assert!(firefox["prefs"].get("ignored").is_none());
        assert!(firefox.get("args").is_none());
    }

    #[test]
    fn test_normalize_keeps_existing_vendor_args() {
        let mut opts = options_for(BrowserKind::Chrome);
        opts.capabilities
            .set("goog:chromeOptions", json!({ "args": ["--no-sandbox"] }));
        opts.args.push("--user-agent=bot".to_string());

        let payload = opts.normalize();
        assert_eq!(
            payload["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"],
            json!(["--no-sandbox", "--user-agent=bot"])
        );
    }

    #[test]
    fn test_window_size() {
        let mut opts = BrowserOptions::default();
        assert_eq!(opts.window_size(), None);

        opts.insert("window_size", json!([1280, 1024]));
        assert_eq!(opts.window_size(), Some((1280, 1024)));
    }
}
