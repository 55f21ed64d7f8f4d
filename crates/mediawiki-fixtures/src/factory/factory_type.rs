// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Factory types - Shared binding registries per kind of browser factory
//
// Every factory type owns one static registry of default bindings and may
// name a parent type. The effective bindings of a type are composed at query
// time: the parent's effective bindings first, then the type's own. Nothing
// is copied into the parent or child when a binding is declared.
//
// Built-in hierarchy:
//
//   base ─┬─ chrome
//         ├─ firefox
//         └─ phantomjs

use crate::api::BrowserKind;
use crate::error::{Error, Result};
use crate::factory::binding::{BindingCallback, BindingKey, BindingRegistry};
use parking_lot::RwLock;
use serde_json::{Value, json};
use std::fmt;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

static BASE: LazyLock<Arc<FactoryType>> = LazyLock::new(|| {
    let base = FactoryType::new("base", None);
    {
        let mut registry = base.bindings.write();
        registry.register_builtin(
            &["browser_timeout"],
            BindingCallback::new(|values, options| {
                let seconds = parse_number("browser_timeout", values[0])?;
                options.http_client.timeout = Some(Duration::from_secs(seconds));
                Ok(())
            }),
        );
        registry.register_builtin(
            &["browser_width", "browser_height"],
            BindingCallback::new(|values, options| {
                let width = parse_number("browser_width", values[0])?;
                let height = parse_number("browser_height", values[1])?;
                options.insert("window_size", json!([width, height]));
                Ok(())
            }),
        );
    }
    Arc::new(base)
});

static CHROME: LazyLock<Arc<FactoryType>> = LazyLock::new(|| {
    let chrome = FactoryType::new("chrome", Some(FactoryType::base()));
    {
        let mut registry = chrome.bindings.write();
        registry.register_builtin(
            &["browser_language"],
            BindingCallback::new(|values, options| {
                options.prefs.insert(
                    "intl.accept_languages".to_string(),
                    Value::String(values[0].to_string()),
                );
                Ok(())
            }),
        );
        registry.register_builtin(
            &["browser_user_agent"],
            BindingCallback::new(|values, options| {
                options.args.push(format!("--user-agent={}", values[0]));
                Ok(())
            }),
        );
        registry.register_builtin(
            &["headless"],
            BindingCallback::new(|values, options| {
                if is_truthy(values[0]) {
                    options.args.push("--headless".to_string());
                }
                Ok(())
            }),
        );
    }
    Arc::new(chrome)
});

static FIREFOX: LazyLock<Arc<FactoryType>> = LazyLock::new(|| {
    let firefox = FactoryType::new("firefox", Some(FactoryType::base()));
    {
        let mut registry = firefox.bindings.write();
        registry.register_builtin(
            &["browser_language"],
            BindingCallback::new(|values, options| {
                options.profile.insert(
                    "intl.accept_languages".to_string(),
                    Value::String(values[0].to_string()),
                );
                Ok(())
            }),
        );
        registry.register_builtin(
            &["browser_user_agent"],
            BindingCallback::new(|values, options| {
                options.profile.insert(
                    "general.useragent.override".to_string(),
                    Value::String(values[0].to_string()),
                );
                Ok(())
            }),
        );
        // Keep slow scripts from tripping the "unresponsive script" dialog
        // before the client gives up.
        registry.register_builtin(
            &["browser_timeout"],
            BindingCallback::new(|values, options| {
                let seconds = parse_number("browser_timeout", values[0])?;
                options
                    .profile
                    .insert("dom.max_script_run_time".to_string(), json!(seconds));
                Ok(())
            }),
        );
        registry.register_builtin(
            &["headless"],
            BindingCallback::new(|values, options| {
                if is_truthy(values[0]) {
                    options.args.push("-headless".to_string());
                }
                Ok(())
            }),
        );
    }
    Arc::new(firefox)
});

static PHANTOMJS: LazyLock<Arc<FactoryType>> = LazyLock::new(|| {
    let phantomjs = FactoryType::new("phantomjs", Some(FactoryType::base()));
    {
        let mut registry = phantomjs.bindings.write();
        registry.register_builtin(
            &["browser_language"],
            BindingCallback::new(|values, options| {
                options
                    .capabilities
                    .set("phantomjs.page.customHeaders.Accept-Language", values[0]);
                Ok(())
            }),
        );
        registry.register_builtin(
            &["browser_user_agent"],
            BindingCallback::new(|values, options| {
                options
                    .capabilities
                    .set("phantomjs.page.settings.userAgent", values[0]);
                Ok(())
            }),
        );
    }
    Arc::new(phantomjs)
});

fn parse_number(option: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| {
        Error::InvalidConfig(format!(
            "{} must be a whole number, got '{}'",
            option, value
        ))
    })
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

/// A kind of browser factory with its own shared binding registry.
///
/// Use [`FactoryType::subtype`] to derive a type whose declarations don't
/// leak into the built-in types.
///
/// # Example
///
/// ```ignore
/// use mediawiki_fixtures::factory::{BindingCallback, FactoryType};
///
/// let custom = FactoryType::subtype(&FactoryType::firefox(), "firefox-rtl");
/// custom.bind(["browser_language"], |values, options| {
///     options.insert("dir", if values[0] == "he" { "rtl" } else { "ltr" });
///     Ok(())
/// })?;
///
/// // Parent bindings come first
/// assert!(custom.bindings().includes(&FactoryType::firefox().bindings()));
/// ```
pub struct FactoryType {
    name: String,
    parent: Option<Arc<FactoryType>>,
    bindings: RwLock<BindingRegistry>,
}

impl FactoryType {
    fn new(name: impl Into<String>, parent: Option<Arc<FactoryType>>) -> Self {
        Self {
            name: name.into(),
            parent,
            bindings: RwLock::new(BindingRegistry::new()),
        }
    }

    /// Root factory type shared by every browser
    pub fn base() -> Arc<FactoryType> {
        Arc::clone(&BASE)
    }

    pub fn chrome() -> Arc<FactoryType> {
        Arc::clone(&CHROME)
    }

    pub fn firefox() -> Arc<FactoryType> {
        Arc::clone(&FIREFOX)
    }

    pub fn phantomjs() -> Arc<FactoryType> {
        Arc::clone(&PHANTOMJS)
    }

    /// Creates a new type inheriting `parent`'s bindings, with an empty
    /// registry of its own
    pub fn subtype(parent: &Arc<FactoryType>, name: impl Into<String>) -> Arc<FactoryType> {
        Arc::new(Self::new(name, Some(Arc::clone(parent))))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<FactoryType>> {
        self.parent.as_ref()
    }

    /// Declares a default binding for this type.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidBinding` if `names` is empty or repeats a name
    /// - `Error::MissingCallback` if `callback` is `None`; type-level
    ///   declarations never default to a no-op
    pub fn configure<I, S>(&self, names: I, callback: Option<BindingCallback>) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = BindingKey::new(names)?;
        let callback = callback.ok_or_else(|| Error::MissingCallback(key.to_string()))?;

        tracing::debug!("Declaring {} binding {}", self.name, key);
        self.bindings.write().register(key.names().to_vec(), callback)
    }

    /// Declares a default binding from a closure
    pub fn bind<I, S, F>(&self, names: I, callback: F) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&[&str], &mut crate::api::BrowserOptions) -> Result<()> + Send + Sync + 'static,
    {
        self.configure(names, Some(BindingCallback::new(callback)))
    }

    /// Bindings declared directly on this type
    pub fn default_bindings(&self) -> BindingRegistry {
        self.bindings.read().clone()
    }

    /// Effective bindings: every ancestor's, then this type's own
    pub fn bindings(&self) -> BindingRegistry {
        let own = self.bindings.read();
        match &self.parent {
            Some(parent) => parent.bindings().merged(&own),
            None => own.clone(),
        }
    }
}

impl fmt::Debug for FactoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryType")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.clone()))
            .field("bindings", &self.bindings.read().len())
            .finish()
    }
}

/// Picks the built-in factory type for a browser kind, falling back to `base`
pub fn factory_type_for(kind: &BrowserKind) -> Arc<FactoryType> {
    match kind {
        BrowserKind::Chrome => FactoryType::chrome(),
        BrowserKind::Firefox => FactoryType::firefox(),
        BrowserKind::PhantomJs => FactoryType::phantomjs(),
        _ => FactoryType::base(),
    }
}
