// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// UserFactory - Creates wiki accounts on first reference
//
// Each distinct account id is provisioned at most once per factory. The
// account itself is created by an injected AccountCreator (typically a wiki
// API client); this module only decides when to create and what to call it.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;

/// Credentials of a provisioned account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password: String,
}

/// Selects one credential of an [`Account`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountField {
    Username,
    Password,
}

impl Account {
    pub fn field(&self, field: AccountField) -> &str {
        match field {
            AccountField::Username => &self.username,
            AccountField::Password => &self.password,
        }
    }
}

/// Creates accounts on the wiki under test.
#[async_trait]
pub trait AccountCreator: Send + Sync {
    /// Creates `username` with `password`, returning the username as the
    /// wiki normalized it
    async fn create_account(&self, username: &str, password: &str) -> Result<String>;
}

/// Returns the value cached under `key`, provisioning and caching it first
/// if absent.
///
/// A failed `provision` caches nothing, so the next call tries again.
pub async fn provision_once<'a, K, V, F, Fut>(
    cache: &'a mut HashMap<K, V>,
    key: K,
    provision: F,
) -> Result<&'a V>
where
    K: Eq + Hash,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V>>,
{
    if cache.contains_key(&key) {
        return Ok(&cache[&key]);
    }

    let value = provision().await?;
    Ok(cache.entry(key).or_insert(value))
}

/// Lazily provisions one account per distinct id.
///
/// `None` is an id of its own: the scenario's default user.
pub struct UserFactory {
    creator: Arc<dyn AccountCreator>,
    users: TokioMutex<HashMap<Option<String>, Account>>,
}

impl UserFactory {
    pub fn new(creator: Arc<dyn AccountCreator>) -> Self {
        Self {
            creator,
            users: TokioMutex::new(HashMap::new()),
        }
    }

    /// Returns the account for `id`, creating it on first reference
    pub async fn create(&self, id: Option<&str>) -> Result<Account> {
        let mut users = self.users.lock().await;
        let creator = &self.creator;

        let account = provision_once(&mut *users, id.map(str::to_string), || async move {
            let username = unique("User", id);
            let password = unique("Pass", id);

            tracing::debug!("Provisioning account {}", username);
            let username = creator.create_account(&username, &password).await?;

            Ok::<_, Error>(Account { username, password })
        })
        .await?;

        Ok(account.clone())
    }

    /// Number of accounts provisioned so far
    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.lock().await.is_empty()
    }
}

/// `<label>-<id>-<random>`, or `<label>-<random>` without an id
fn unique(label: &str, id: Option<&str>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    match id {
        Some(id) => format!("{}-{}-{}", label, id, &suffix[..8]),
        None => format!("{}-{}", label, &suffix[..16]),
    }
}
