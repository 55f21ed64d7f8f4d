// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// RemoteSession - Browser session on a W3C WebDriver remote end
//
// Reference:
// - W3C WebDriver: https://www.w3.org/TR/webdriver2/#endpoints
//
// Every response is wrapped as {"value": ...}. Failures carry
// {"value": {"error": <code>, "message": <text>}} with a 4xx/5xx status.

use crate::api::BrowserOptions;
use crate::error::{Error, Result};
use crate::session::{ElementRef, Session, SessionConstructor};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

/// W3C web element identifier key
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Default remote end (Selenium server / standalone driver)
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

/// Body of a successful new-session response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewSessionValue {
    session_id: String,
    #[serde(default)]
    capabilities: Value,
}

/// Creates sessions by POSTing to `<endpoint>/session`.
#[derive(Debug, Clone)]
pub struct RemoteSessionConstructor {
    endpoint: Url,
}

impl RemoteSessionConstructor {
    /// Creates a constructor for the WebDriver remote end at `endpoint`
    /// (e.g. "http://localhost:4444" or "http://grid:4444/wd/hub").
    pub fn new(endpoint: &str) -> Result<Self> {
        Ok(Self {
            endpoint: normalize_endpoint(endpoint)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SessionConstructor for RemoteSessionConstructor {
    async fn construct(&self, options: BrowserOptions) -> Result<Arc<dyn Session>> {
        let client = options.http_client.build()?;
        let payload = options.normalize();
        let url = self.endpoint.join("session")?;

        tracing::debug!("Creating WebDriver session at {}", url);
        tracing::debug!("New session payload: {}", payload);

        let response = client.post(url).json(&payload).send().await?;
        let value = match into_value(response).await {
            Ok(value) => value,
            Err(Error::WebDriver { error, message }) => {
                return Err(Error::SessionNotCreated(format!("{}: {}", error, message)));
            }
            Err(e) => return Err(e),
        };

        let created: NewSessionValue = serde_json::from_value(value)?;
        tracing::debug!("Created WebDriver session {}", created.session_id);

        let session = RemoteSession {
            client,
            endpoint: self.endpoint.clone(),
            id: created.session_id,
            capabilities: created.capabilities,
            closed: AtomicBool::new(false),
        };

        if let Some((width, height)) = options.window_size() {
            let rect = json!({ "width": width, "height": height });
            if let Err(e) = session.command(Method::POST, "window/rect", Some(rect)).await {
                // The caller never sees this session
                if let Err(close_err) = session.close().await {
                    tracing::warn!(
                        "Failed to delete session {} after setup error: {}",
                        session.id,
                        close_err
                    );
                }
                return Err(e.context("Failed to set window size"));
            }
        }

        Ok(Arc::new(session))
    }
}

/// A session on a WebDriver remote end.
#[derive(Debug)]
pub struct RemoteSession {
    client: reqwest::Client,
    endpoint: Url,
    id: String,
    capabilities: Value,
    closed: AtomicBool,
}

impl RemoteSession {
    /// Capabilities the remote end granted
    pub fn capabilities(&self) -> &Value {
        &self.capabilities
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        if self.is_closed() {
            return Err(Error::SessionClosed(path.to_string()));
        }

        let url = self.endpoint.join(&format!("session/{}/{}", self.id, path))?;
        tracing::debug!("WebDriver {} {}", method, url);

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        into_value(request.send().await?).await
    }
}

#[async_trait]
impl Session for RemoteSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.command(Method::POST, "url", Some(json!({ "url": url }))).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let value = self.command(Method::GET, "url", None).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::WebDriver {
                error: "invalid response".to_string(),
                message: format!("expected a URL string, got {}", value),
            })
    }

    async fn find_element(&self, selector: &str) -> Result<ElementRef> {
        let value = self
            .command(
                Method::POST,
                "element",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await?;

        let element_id = value[ELEMENT_KEY].as_str().ok_or_else(|| Error::WebDriver {
            error: "invalid response".to_string(),
            message: format!("element reference missing for selector '{}'", selector),
        })?;

        Ok(ElementRef::new(self.id.clone(), element_id))
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let url = self.endpoint.join(&format!("session/{}", self.id))?;
        tracing::debug!("Deleting WebDriver session {}", self.id);

        into_value(self.client.delete(url).send().await?).await?;
        Ok(())
    }
}

/// Unwraps `{"value": ...}`, mapping WebDriver error bodies to `Error::WebDriver`
///
/// A failed response without a JSON body (e.g. a proxy's 404 page) is reported
/// with its HTTP status.
async fn into_value(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let bytes = response.bytes().await?;

    let body: Value = match serde_json::from_slice(&bytes) {
        Ok(body) => body,
        Err(_) if !status.is_success() => {
            let text = String::from_utf8_lossy(&bytes);
            return Err(Error::WebDriver {
                error: "unknown error".to_string(),
                message: format!("HTTP {}: {}", status, text.trim()),
            });
        }
        Err(e) => return Err(e.into()),
    };
    let value = body.get("value").cloned().unwrap_or(Value::Null);

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return Err(Error::WebDriver {
            error: error.to_string(),
            message: value["message"].as_str().unwrap_or_default().to_string(),
        });
    }

    if !status.is_success() {
        return Err(Error::WebDriver {
            error: "unknown error".to_string(),
            message: format!("HTTP {}", status),
        });
    }

    Ok(value)
}

/// Parses the endpoint and makes sure relative joins stay below its path
fn normalize_endpoint(endpoint: &str) -> Result<Url> {
    let mut url = Url::parse(endpoint)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoint_keeps_hub_path() {
        let url = normalize_endpoint("http://grid:4444/wd/hub").unwrap();
        assert_eq!(
            url.join("session").unwrap().as_str(),
            "http://grid:4444/wd/hub/session"
        );
    }

    #[test]
    fn test_normalize_endpoint_bare_host() {
        let url = normalize_endpoint("http://localhost:4444").unwrap();
        assert_eq!(
            url.join("session").unwrap().as_str(),
            "http://localhost:4444/session"
        );
    }

    #[test]
    fn test_constructor_rejects_bad_url() {
        assert!(matches!(
            RemoteSessionConstructor::new("not a url"),
            Err(Error::Url(_))
        ));
    }

    #[test]
    fn test_default_endpoint() {
        let constructor = RemoteSessionConstructor::new(DEFAULT_WEBDRIVER_URL).unwrap();
        assert_eq!(constructor.endpoint().as_str(), "http://localhost:4444/");
    }
}
