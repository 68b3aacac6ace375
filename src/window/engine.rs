//! Window engine keyed by asset class

use super::{RollingWindow, WindowError, WindowStats};
use crate::config::WindowConfig;
use crate::source::PriceObservation;
use std::collections::HashMap;

/// Owns one rolling window per asset class for the lifetime of a run
pub struct WindowEngine {
    config: WindowConfig,
    windows: HashMap<String, RollingWindow>,
}

impl WindowEngine {
    /// Create an engine, rejecting window parameters that can never be ready
    pub fn new(config: WindowConfig) -> Result<Self, WindowError> {
        config.validate()?;
        Ok(Self {
            config,
            windows: HashMap::new(),
        })
    }

    /// Append an observation to its asset class window and return the
    /// statistics including it
    pub fn ingest(&mut self, observation: &PriceObservation) -> Result<WindowStats, WindowError> {
        let config = &self.config;
        let window = self
            .windows
            .entry(observation.asset_type.clone())
            .or_insert_with(|| {
                tracing::debug!(asset_type = %observation.asset_type, "Opening rolling window");
                RollingWindow::new(config)
            });

        window.push(observation.timestamp, observation.price)?;
        Ok(window.snapshot())
    }

    /// Statistics for an asset class, if it has been seen
    pub fn snapshot(&self, asset_type: &str) -> Option<WindowStats> {
        self.windows.get(asset_type).map(RollingWindow::snapshot)
    }

    /// Window for an asset class, if it has been seen
    pub fn window(&self, asset_type: &str) -> Option<&RollingWindow> {
        self.windows.get(asset_type)
    }

    /// Number of distinct asset classes seen
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
