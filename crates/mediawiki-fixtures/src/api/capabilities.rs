// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Capabilities - W3C WebDriver capabilities per browser kind
//
// Reference:
// - W3C WebDriver: https://www.w3.org/TR/webdriver2/#capabilities
// - Chrome: goog:chromeOptions, Firefox: moz:firefoxOptions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Browser family a factory builds sessions for.
///
/// Unknown names are kept verbatim in [`BrowserKind::Other`] so that any
/// remote end's `browserName` can be targeted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BrowserKind {
    Chrome,
    Firefox,
    PhantomJs,
    Safari,
    Edge,
    InternetExplorer,
    Other(String),
}

impl BrowserKind {
    /// Parses a configured browser name ("chrome", "firefox", ...).
    ///
    /// Matching is case-insensitive and accepts the common aliases
    /// (`internet explorer`, `ie`, `msedge`).
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => BrowserKind::Chrome,
            "firefox" => BrowserKind::Firefox,
            "phantomjs" => BrowserKind::PhantomJs,
            "safari" => BrowserKind::Safari,
            "edge" | "msedge" | "microsoftedge" => BrowserKind::Edge,
            "internet_explorer" | "internet explorer" | "ie" => BrowserKind::InternetExplorer,
            _ => BrowserKind::Other(name.trim().to_string()),
        }
    }

    /// Returns the W3C `browserName` for this kind.
    pub fn name(&self) -> &str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Firefox => "firefox",
            BrowserKind::PhantomJs => "phantomjs",
            BrowserKind::Safari => "safari",
            BrowserKind::Edge => "MicrosoftEdge",
            BrowserKind::InternetExplorer => "internet explorer",
            BrowserKind::Other(name) => name,
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for BrowserKind {
    fn from(name: &str) -> Self {
        BrowserKind::parse(name)
    }
}

/// Capabilities object sent to the WebDriver remote end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(Map<String, Value>);

impl Capabilities {
    /// Creates an empty capabilities object
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the capability value for `name`, if set
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Sets a capability, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Removes a capability, returning its previous value
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Returns the `browserName` capability
    pub fn browser_name(&self) -> Option<&str> {
        self.0.get("browserName").and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Looks up the base capabilities for a browser kind.
///
/// Injected into [`BrowserFactory`](crate::factory::BrowserFactory) so tests
/// and embedding harnesses can substitute their own descriptors.
pub trait CapabilitiesLookup: Send + Sync {
    fn capabilities(&self, kind: &BrowserKind) -> Capabilities;
}

/// Default lookup producing plain W3C capabilities.
///
/// Chrome, Firefox and Edge get an empty vendor options block that bindings
/// and the session payload fill in.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCapabilities;

impl CapabilitiesLookup for DefaultCapabilities {
    fn capabilities(&self, kind: &BrowserKind) -> Capabilities {
        let mut caps = Capabilities::new();
        caps.set("browserName", kind.name());

        match kind {
            BrowserKind::Chrome => {
                caps.set("goog:chromeOptions", Value::Object(Map::new()));
            }
            BrowserKind::Firefox => {
                caps.set("moz:firefoxOptions", Value::Object(Map::new()));
            }
            BrowserKind::Edge => {
                caps.set("ms:edgeOptions", Value::Object(Map::new()));
            }
            BrowserKind::InternetExplorer => {
                caps.set("platformName", "windows");
            }
            BrowserKind::Safari => {
                caps.set("platformName", "mac");
            }
            _ => {}
        }

        caps
    }
}
