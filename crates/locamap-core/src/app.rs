use anyhow::Result;
use std::sync::Arc;

use crate::{AppContext, Component, Config};

/// Application lifecycle root: owns the configuration and every registered
/// component, starts them in registration order and stops them at teardown.
pub struct App {
    config: Arc<Config>,
    components: Vec<Box<dyn Component>>,
    context: AppContext,
    running: bool,
}

impl App {
    /// Create a new application instance from the on-disk configuration
    pub fn new() -> Result<Self> {
        Ok(Self::with_config(Config::load()?))
    }

    /// Create a new application instance from an already loaded configuration
    pub fn with_config(config: Config) -> Self {
        let config = Arc::new(config);
        let context = AppContext::new(config.clone());

        Self {
            config,
            components: Vec::new(),
            context,
            running: false,
        }
    }

    /// Register a component with the application
    pub fn register(&mut self, component: Box<dyn Component>) {
        tracing::info!("Registering component: {}", component.name());
        self.components.push(component);
    }

    /// Initialize all registered components
    pub fn initialize(&mut self) -> Result<()> {
        tracing::info!(
            "Initializing application with {} components",
            self.components.len()
        );

        for component in &mut self.components {
            tracing::debug!("Initializing component: {}", component.name());
            component.initialize(&self.context)?;
        }

        self.running = true;
        tracing::info!("Application initialized successfully");
        Ok(())
    }

    /// Shutdown the application and all components, last registered first.
    ///
    /// Calling this twice is a no-op the second time.
    pub fn shutdown(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        tracing::info!("Shutting down application");

        for component in self.components.iter_mut().rev() {
            tracing::debug!("Shutting down component: {}", component.name());
            if let Err(e) = component.shutdown() {
                tracing::error!("Error shutting down component {}: {}", component.name(), e);
            }
        }

        self.running = false;
        Ok(())
    }

    /// Whether `initialize` has run and `shutdown` has not
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared handle to the application config
    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Get list of all registered components
    pub fn components(&self) -> &[Box<dyn Component>] {
        &self.components
    }
}
