//! mediawiki-fixtures: Browser and user-account fixtures for MediaWiki acceptance tests
//!
//! This crate provides two fixtures for browser-based acceptance tests:
//!
//! - A [`BrowserFactory`] that turns a scenario's configuration into a
//!   WebDriver session through declarative *bindings*, and caches sessions by
//!   configuration so equal configurations share one browser.
//! - A [`UserFactory`] that provisions wiki accounts on their first reference,
//!   exposed through [`Environment::user`] and [`Environment::password`].
//!
//! # Examples
//!
//! ## Bindings and Resolution
//!
//! ```ignore
//! use mediawiki_fixtures::{BrowserFactory, BrowserKind, Config, FactoryType};
//! use std::sync::Arc;
//!
//! # fn example(constructor: Arc<dyn mediawiki_fixtures::SessionConstructor>) -> mediawiki_fixtures::Result<()> {
//! let factory = BrowserFactory::for_browser(BrowserKind::Chrome, constructor);
//!
//! // Runs only when both options are configured
//! factory.bind(["browser_proxy_host", "browser_proxy_port"], |values, options| {
//!     options.args.push(format!("--proxy-server={}:{}", values[0], values[1]));
//!     Ok(())
//! })?;
//!
//! let config = Config::from([
//!     ("browser_language".to_string(), "de".to_string()),
//!     ("browser_proxy_host".to_string(), "proxy".to_string()),
//!     ("browser_proxy_port".to_string(), "3128".to_string()),
//! ]);
//!
//! let options = factory.resolve(&config)?;
//! assert_eq!(options.prefs["intl.accept_languages"], "de");
//! assert_eq!(options.args, vec!["--proxy-server=proxy:3128"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Scenario Environment
//!
//! ```ignore
//! use mediawiki_fixtures::Environment;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // BROWSER=chrome MEDIAWIKI_URL=http://localhost:8080/wiki/ ...
//!     let env = Environment::from_env();
//!
//!     let browser = env.browser().await?;
//!     browser.navigate(env.page_url("Special:UserLogin")?.as_str()).await?;
//!     let _ = browser.find_element("#wpName1").await?;
//!
//!     env.teardown().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod environment;
mod error;
pub mod factory;
pub mod session;
pub mod users;

// Re-export error types
pub use error::{Error, Result};

// Re-export option and capability types
pub use api::{BrowserKind, BrowserOptions, Capabilities, HttpClientConfig};

// Re-export the browser factory API
pub use factory::{BindingCallback, BindingRegistry, BrowserFactory, Config, FactoryType};

// Re-export sessions
pub use session::{
    ElementRef, RemoteSession, RemoteSessionConstructor, Session, SessionConstructor,
};

// Re-export user provisioning and the scenario environment
pub use environment::Environment;
pub use users::{Account, AccountCreator, UserFactory};
