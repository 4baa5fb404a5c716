use anyhow::Result;
use std::sync::Arc;

use crate::Config;

/// A long-lived part of the application that the lifecycle root starts at
/// startup and stops at teardown (pollers, background loaders).
pub trait Component: Send + Sync {
    /// Unique identifier for this component
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Start the component with the given context
    fn initialize(&mut self, ctx: &AppContext) -> Result<()>;

    /// Stop the component gracefully
    fn shutdown(&mut self) -> Result<()>;
}

/// Context handed to components during initialization
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
}

impl AppContext {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}
