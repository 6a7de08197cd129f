use crate::error::{PregelError, PregelResult};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Configuration {
    config: HashMap<String, String>,
}

impl Configuration {
    pub fn new() -> Self {
        Self {
            config: HashMap::new(),
        }
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.config.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.config.get(key)
    }

    pub fn get_i64(&self, key: &str, default_value: i64) -> PregelResult<i64> {
        match self.config.get(key) {
            None => Ok(default_value),
            Some(raw) => raw.trim().parse::<i64>().map_err(|e| {
                PregelError::InvalidArgument(format!("{key}={raw} is not an integer: {e}"))
            }),
        }
    }
}
