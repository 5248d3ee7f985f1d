use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

/// Persistent key-value string store backing the provider's preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get_string(&self, key: &str) -> Result<Option<String>>;
    async fn put_string(&self, key: &str, value: &str) -> Result<()>;

    /// Booleans are stored as `"true"` / `"false"`; anything else reads as `default`.
    async fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        Ok(self
            .get_string(key)
            .await?
            .and_then(|v| v.trim().parse::<bool>().ok())
            .unwrap_or(default))
    }

    async fn put_bool(&self, key: &str, value: bool) -> Result<()> {
        self.put_string(key, if value { "true" } else { "false" }).await
    }
}

/// In-process store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    async fn put_string(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| anyhow!("memory store lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
