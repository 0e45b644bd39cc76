use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use super::mock::SimulatedSdk;
use super::{SdkClient, SdkFactory};

/// Named SDK client factories; the adapter receives one and calls it at connect time
pub struct SourceRegistry {
    factories: HashMap<String, SdkFactory>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the built-in `simulated` client
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register_simulated("simulated", Value::Null);
        registry
    }

    pub fn register_client<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Result<Box<dyn SdkClient>> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Arc::new(factory));
    }

    /// Register a simulated client configured from JSON
    pub fn register_simulated(&mut self, name: &str, config: Value) {
        self.register_client(name, move || {
            Ok(Box::new(SimulatedSdk::from_config(&config)?) as Box<dyn SdkClient>)
        });
    }

    pub fn factory(&self, name: &str) -> Result<SdkFactory> {
        self.factories
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown capture source: {}", name))
    }

    pub fn create_client(&self, name: &str) -> Result<Box<dyn SdkClient>> {
        (self.factory(name)?)()
    }

    pub fn list_clients(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
