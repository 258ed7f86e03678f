//! Board Configuration
//!
//! Settings for the backend connection and drag behaviour. Every field has a
//! default so a partial JSON file (or none at all) is valid.

use serde::{Deserialize, Serialize};

use crate::error::{BoardError, BoardResult};

/// Vertical tolerance below each card's top edge before the drop slot moves past it
pub const DEFAULT_DROP_BIAS_PX: f64 = 50.0;

/// Pointer travel needed before a press turns into a drag
pub const DEFAULT_DRAG_THRESHOLD_PX: i32 = 5;

const ENV_API_URL: &str = "TASKBOARD_API_URL";
const ENV_API_TOKEN: &str = "TASKBOARD_API_TOKEN";
const ENV_USER_ID: &str = "TASKBOARD_USER_ID";
const ENV_DROP_BIAS: &str = "TASKBOARD_DROP_BIAS_PX";
const ENV_ROLLBACK: &str = "TASKBOARD_ROLLBACK_ON_FAILURE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    /// Restrict `/getTasks` to one user's cards
    pub user_filter: Option<String>,
    pub drop_bias_px: f64,
    pub drag_threshold_px: i32,
    /// Undo the optimistic move when the backend rejects it
    pub rollback_on_failure: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api".to_string(),
            api_token: None,
            user_filter: None,
            drop_bias_px: DEFAULT_DROP_BIAS_PX,
            drag_threshold_px: DEFAULT_DRAG_THRESHOLD_PX,
            rollback_on_failure: false,
        }
    }
}

impl BoardConfig {
    pub fn from_json_str(json: &str) -> BoardResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| BoardError::InvalidInput(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `TASKBOARD_*` environment variables
    pub fn with_env_overrides(self) -> BoardResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> BoardResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(token) = lookup(ENV_API_TOKEN) {
            self.api_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Some(user) = lookup(ENV_USER_ID) {
            self.user_filter = Some(user).filter(|u| !u.is_empty());
        }
        if let Some(bias) = lookup(ENV_DROP_BIAS) {
            self.drop_bias_px = bias
                .trim()
                .parse()
                .map_err(|_| BoardError::InvalidInput(format!("{}={}", ENV_DROP_BIAS, bias)))?;
        }
        if let Some(flag) = lookup(ENV_ROLLBACK) {
            self.rollback_on_failure = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> BoardResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(BoardError::InvalidInput("api_base_url is empty".to_string()));
        }
        if !self.drop_bias_px.is_finite() || self.drop_bias_px < 0.0 {
            return Err(BoardError::InvalidInput(format!(
                "drop_bias_px must be a non-negative number, got {}",
                self.drop_bias_px
            )));
        }
        if self.drag_threshold_px < 0 {
            return Err(BoardError::InvalidInput("drag_threshold_px is negative".to_string()));
        }
        Ok(())
    }
}
