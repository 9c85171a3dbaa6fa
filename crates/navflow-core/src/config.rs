//! Navigator tuning knobs.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Frames that backward navigation never pops. Popping past it ends the
    /// flow through
    /// [`HistoryCallback::on_history_cleared`](crate::HistoryCallback::on_history_cleared).
    pub min_history_size: usize,
    /// Deepest composite nesting accepted in a requested history.
    pub max_composite_depth: usize,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            min_history_size: 1,
            max_composite_depth: 16,
        }
    }
}

impl NavigatorConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.min_history_size == 0 {
            return Err(ConfigurationError::InvalidConfig(
                "min_history_size must be at least 1".into(),
            ));
        }
        if self.max_composite_depth == 0 {
            return Err(ConfigurationError::InvalidConfig(
                "max_composite_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
