// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Sessions - Live browser handles returned to test code
//
// Architecture:
// - Session is the minimal surface acceptance tests need from a browser
// - SessionConstructor turns resolved BrowserOptions into a Session
// - RemoteSession implements both over the W3C WebDriver HTTP protocol

pub mod remote;

use crate::api::BrowserOptions;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub use remote::{RemoteSession, RemoteSessionConstructor};

/// A live browser session.
#[async_trait]
pub trait Session: Send + Sync {
    /// Session identifier assigned by the driver
    fn id(&self) -> &str;

    /// Navigates the current top-level browsing context to `url`
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Returns the URL of the current page
    async fn current_url(&self) -> Result<String>;

    /// Finds the first element matching a CSS selector
    async fn find_element(&self, selector: &str) -> Result<ElementRef>;

    /// Ends the session. Closing twice is not an error.
    async fn close(&self) -> Result<()>;
}

/// Builds sessions from resolved options.
///
/// Injected into [`BrowserFactory`](crate::factory::BrowserFactory); a
/// failure here propagates to the caller unchanged and nothing is cached.
#[async_trait]
pub trait SessionConstructor: Send + Sync {
    async fn construct(&self, options: BrowserOptions) -> Result<Arc<dyn Session>>;
}

/// Reference to an element found in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    session_id: String,
    element_id: String,
}

impl ElementRef {
    pub fn new(session_id: impl Into<String>, element_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            element_id: element_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// WebDriver element reference
    pub fn id(&self) -> &str {
        &self.element_id
    }
}
