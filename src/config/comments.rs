//! Comment listing configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::ports::DEFAULT_ROOT_PAGE_SIZE;

/// Largest root page a caller may configure as the default
const MAX_PAGE_SIZE: u32 = 500;

#[derive(Debug, Clone, Deserialize)]
pub struct CommentsConfig {
    /// Root comments returned when a request gives no limit
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

impl CommentsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.default_page_size == 0 || self.default_page_size > MAX_PAGE_SIZE {
            return Err(ValidationError::InvalidPageSize);
        }
        Ok(())
    }
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u32 {
    DEFAULT_ROOT_PAGE_SIZE
}
