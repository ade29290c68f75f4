use super::traits::ConfigSection;
use crate::error::CgramapError;
use serde::{Deserialize, Serialize};

/// Geometry and timing of the target array, the `[array]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArraySection {
    pub width: u32,
    pub height: u32,
    /// Pipeline registers per row boundary; 0 disables the register genome.
    #[serde(default)]
    pub preg_count: u32,
    #[serde(default = "default_delay")]
    pub alu_delay: f64,
    #[serde(default = "default_delay")]
    pub se_delay: f64,
}

fn default_delay() -> f64 {
    1.0
}

impl Default for ArraySection {
    fn default() -> Self {
        Self {
            width: 8,
            height: 8,
            preg_count: 0,
            alu_delay: default_delay(),
            se_delay: default_delay(),
        }
    }
}

impl ConfigSection for ArraySection {
    fn section_name() -> &'static str {
        "array"
    }

    fn validate(&self) -> Result<(), CgramapError> {
        if self.width == 0 || self.height == 0 {
            return Err(CgramapError::Configuration(format!(
                "array size must be nonzero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.alu_delay < 0.0 || self.se_delay < 0.0 {
            return Err(CgramapError::Configuration(
                "delays must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
