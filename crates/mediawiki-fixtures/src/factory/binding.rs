// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Bindings - Declarative configuration-to-options rules
//
// A binding names one or more configuration options and a callback. When a
// configuration contains every named option, the callback receives their
// values (in declared order) plus the BrowserOptions accumulator. When any
// option is missing the binding is skipped without touching the accumulator.
//
// Bindings sharing a key are kept in registration order and all of them run.

use crate::api::BrowserOptions;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Configuration dictionary: option name to value.
///
/// A `BTreeMap` so that two configurations with the same content compare and
/// hash equal regardless of how they were built.
pub type Config = BTreeMap<String, String>;

type CallbackFn = dyn Fn(&[&str], &mut BrowserOptions) -> Result<()> + Send + Sync;

/// Callback invoked with the configured values and the options accumulator.
#[derive(Clone)]
pub struct BindingCallback(Arc<CallbackFn>);

impl BindingCallback {
    /// Wraps a closure as a binding callback
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&[&str], &mut BrowserOptions) -> Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }

    /// A callback that does nothing
    pub fn noop() -> Self {
        Self::new(|_, _| Ok(()))
    }

    /// Returns true if both handles point at the same callback
    pub fn ptr_eq(&self, other: &BindingCallback) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn call(&self, values: &[&str], options: &mut BrowserOptions) -> Result<()> {
        (self.0)(values, options)
    }
}

impl fmt::Debug for BindingCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BindingCallback(<closure>)")
    }
}

/// Ordered, non-empty list of distinct option names identifying a binding group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingKey(Vec<String>);

impl BindingKey {
    /// Creates a key, rejecting empty and repeated option names
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();

        if names.is_empty() {
            return Err(Error::InvalidBinding(
                "a binding needs at least one option name".to_string(),
            ));
        }

        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(Error::InvalidBinding(format!(
                    "option '{}' is named more than once",
                    name
                )));
            }
        }

        Ok(Self(names))
    }

    /// Option names in declared order
    pub fn names(&self) -> &[String] {
        &self.0
    }

    fn matches(&self, names: &[&str]) -> bool {
        self.0.len() == names.len() && self.0.iter().zip(names).all(|(a, b)| a == b)
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// A declared rule: required option names plus a callback.
#[derive(Debug, Clone)]
pub struct Binding {
    key: BindingKey,
    callback: BindingCallback,
}

impl Binding {
    pub fn new(key: BindingKey, callback: BindingCallback) -> Self {
        Self { key, callback }
    }

    pub fn key(&self) -> &BindingKey {
        &self.key
    }

    pub fn option_names(&self) -> &[String] {
        self.key.names()
    }

    pub fn callback(&self) -> &BindingCallback {
        &self.callback
    }

    /// Returns true if every required option is present in `config`
    pub fn is_satisfied_by(&self, config: &Config) -> bool {
        self.key.names().iter().all(|name| config.contains_key(name))
    }

    /// Invokes the callback if `config` holds every required option.
    ///
    /// Returns whether the callback ran. An unsatisfied binding leaves
    /// `options` untouched.
    pub(crate) fn apply(&self, config: &Config, options: &mut BrowserOptions) -> Result<bool> {
        let values: Option<Vec<&str>> = self
            .key
            .names()
            .iter()
            .map(|name| config.get(name).map(String::as_str))
            .collect();

        let Some(values) = values else {
            tracing::debug!("Skipping binding {}: configuration incomplete", self.key);
            return Ok(false);
        };

        tracing::debug!("Invoking binding {}", self.key);
        self.callback.call(&values, options)?;
        Ok(true)
    }
}

/// Ordered mapping from binding key to the bindings registered under it.
///
/// Keys iterate in first-declaration order; bindings within a key iterate in
/// registration order.
#[derive(Debug, Clone, Default)]
pub struct BindingRegistry {
    groups: Vec<(BindingKey, Vec<Binding>)>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a binding under the key formed from `names`
    pub fn register<I, S>(&mut self, names: I, callback: BindingCallback) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = BindingKey::new(names)?;
        self.push(Binding::new(key, callback));
        Ok(())
    }

    /// Registers a binding whose option names are known to be valid
    pub(crate) fn register_builtin(&mut self, names: &[&'static str], callback: BindingCallback) {
        let key = BindingKey(names.iter().map(|name| name.to_string()).collect());
        self.push(Binding::new(key, callback));
    }

    fn push(&mut self, binding: Binding) {
        match self.groups.iter_mut().find(|(key, _)| *key == binding.key) {
            Some((_, bindings)) => bindings.push(binding),
            None => self.groups.push((binding.key.clone(), vec![binding])),
        }
    }

    /// Bindings registered under exactly `names`, in registration order
    pub fn get(&self, names: &[&str]) -> Option<&[Binding]> {
        self.groups
            .iter()
            .find(|(key, _)| key.matches(names))
            .map(|(_, bindings)| bindings.as_slice())
    }

    pub fn contains_key(&self, names: &[&str]) -> bool {
        self.get(names).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &BindingKey> {
        self.groups.iter().map(|(key, _)| key)
    }

    /// All bindings in resolution order
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.groups.iter().flat_map(|(_, bindings)| bindings.iter())
    }

    /// Total number of bindings across all keys
    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, bindings)| bindings.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns a new registry with `other`'s bindings appended after ours.
    ///
    /// Bindings under a key we already hold join the end of that group; new
    /// keys are appended. Neither input is modified.
    pub fn merged(&self, other: &BindingRegistry) -> BindingRegistry {
        let mut merged = self.clone();
        for binding in other.iter() {
            merged.push(binding.clone());
        }
        merged
    }

    /// Returns true if every binding of `other` is also registered here under
    /// the same key
    pub fn includes(&self, other: &BindingRegistry) -> bool {
        other.groups.iter().all(|(key, theirs)| {
            self.groups
                .iter()
                .find(|(k, _)| k == key)
                .is_some_and(|(_, ours)| {
                    theirs
                        .iter()
                        .all(|t| ours.iter().any(|o| o.callback.ptr_eq(&t.callback)))
                })
        })
    }
}
