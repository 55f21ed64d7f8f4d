// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// Browser factory - Configuration bindings and session caching
//
// Architecture:
// - binding: Binding, BindingKey and the ordered BindingRegistry
// - factory_type: static per-type registries composed parent-first
// - browser_factory: resolution, overrides and the session cache

pub mod binding;
pub mod browser_factory;
pub mod factory_type;

pub use binding::{Binding, BindingCallback, BindingKey, BindingRegistry, Config};
pub use browser_factory::BrowserFactory;
pub use factory_type::{FactoryType, factory_type_for};
