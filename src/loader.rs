//! The class initialization capability the walkers drive.
//!
//! Walkers only ever see the [`ClassLoader`] trait. [`ClassRegistry`] is the
//! in-process implementation used by servers that register handler
//! initializers up front; [`CatalogLoader`] accepts everything and just
//! remembers what it was asked to load.

use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("class not found: {0}")]
    NotFound(String),

    #[error("initializer for {fqn} failed: {reason}")]
    InitFailed { fqn: String, reason: String },
}

pub trait ClassLoader {
    /// Initializing an already-initialized class is a no-op.
    fn ensure_initialized(&mut self, fqn: &str) -> Result<(), LoadError>;
}

pub type Initializer = Box<dyn FnMut() -> anyhow::Result<()>>;

struct Registration {
    init: Initializer,
    initialized: bool,
}

#[derive(Default)]
pub struct ClassRegistry {
    entries: BTreeMap<String, Registration>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-registering a name replaces its initializer and resets its state.
    pub fn register<F>(&mut self, fqn: impl Into<String>, init: F)
    where
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        self.entries.insert(
            fqn.into(),
            Registration {
                init: Box::new(init),
                initialized: false,
            },
        );
    }

    pub fn contains(&self, fqn: &str) -> bool {
        self.entries.contains_key(fqn)
    }

    pub fn is_initialized(&self, fqn: &str) -> bool {
        self.entries.get(fqn).is_some_and(|r| r.initialized)
    }

    pub fn initialized(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, r)| r.initialized)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ClassLoader for ClassRegistry {
    fn ensure_initialized(&mut self, fqn: &str) -> Result<(), LoadError> {
        let reg = self
            .entries
            .get_mut(fqn)
            .ok_or_else(|| LoadError::NotFound(fqn.to_string()))?;
        if reg.initialized {
            return Ok(());
        }

        (reg.init)().map_err(|e| LoadError::InitFailed {
            fqn: fqn.to_string(),
            reason: format!("{e:#}"),
        })?;
        reg.initialized = true;
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct CatalogLoader {
    seen: HashSet<String>,
    order: Vec<String>,
}

impl CatalogLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classes(&self) -> &[String] {
        &self.order
    }

    pub fn into_classes(self) -> Vec<String> {
        self.order
    }
}

impl ClassLoader for CatalogLoader {
    fn ensure_initialized(&mut self, fqn: &str) -> Result<(), LoadError> {
        if self.seen.insert(fqn.to_string()) {
            self.order.push(fqn.to_string());
        }
        Ok(())
    }
}
