// Public API types module
//
// This module contains the option and capability types shared by the browser
// factory and session layers. They follow the builder pattern used throughout
// the crate.

pub mod browser_options;
pub mod capabilities;

pub use browser_options::{BrowserOptions, DefaultHttpClient, HttpClientConfig, HttpClientFactory};
pub use capabilities::{BrowserKind, Capabilities, CapabilitiesLookup, DefaultCapabilities};
