//! Registry of named units that templates can call or inline

use std::collections::HashMap;
use std::sync::Arc;

use super::Template;
use crate::render::RenderError;

/// Macros and blocks, keyed by name
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    units: HashMap<String, Arc<Template>>,
}

impl UnitRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit under its own name
    pub fn register(&mut self, unit: Template) -> Result<(), RenderError> {
        if self.units.contains_key(unit.name()) {
            return Err(RenderError::DuplicateUnit {
                name: unit.name().to_string(),
            });
        }
        self.units.insert(unit.name().to_string(), Arc::new(unit));
        Ok(())
    }

    /// Builder-style registration
    pub fn with(mut self, unit: Template) -> Result<Self, RenderError> {
        self.register(unit)?;
        Ok(self)
    }

    /// Get a unit by name
    pub fn get(&self, name: &str) -> Result<Arc<Template>, RenderError> {
        self.units
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::unknown_unit(name))
    }

    /// Check if a unit exists
    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// Get all registered unit names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
