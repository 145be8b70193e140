//! Run configuration for the episode runner

use ale_pipe_core::{Action, Capabilities, ProtocolError, Result};
use ale_pipe_driver::{SessionConfig, SimulatorConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything one `ale-pipe` invocation needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub simulator: SimulatorConfig,
    pub session: SessionConfig,
    pub capabilities: Capabilities,
    /// Episodes to play (default: 1)
    pub episodes: u32,
    /// Steps per episode before giving up; 0 means no limit
    pub max_steps: u64,
    /// Actions held in turn, cycling
    pub actions: Vec<Action>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            session: SessionConfig::default(),
            capabilities: Capabilities::all(4),
            episodes: 1,
            max_steps: 10_000,
            actions: vec![Action::NOOP],
        }
    }
}

impl RunConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ProtocolError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: RunConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.actions.is_empty() {
            return Err(ProtocolError::Config("actions must not be empty".into()));
        }
        if self.capabilities.frame_repeat == 0 {
            return Err(ProtocolError::Config("frame_repeat must be at least 1".into()));
        }
        Ok(())
    }
}
