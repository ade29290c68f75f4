use super::{array::ArraySection, optimizer::OptimizerParams, traits::ConfigSection};
use crate::error::CgramapError;
use crate::mapping::PlacementMethod;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// One `[[objectives]]` entry: a registered objective name plus its
/// optional argument table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveSpec {
    pub name: String,
    #[serde(default)]
    pub args: Option<toml::value::Table>,
}

fn default_router() -> String {
    "astar".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_router")]
    pub router: String,
    #[serde(default)]
    pub placement: PlacementMethod,
    pub parameters: OptimizerParams,
    pub array: ArraySection,
    pub objectives: Vec<ObjectiveSpec>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            router: default_router(),
            placement: PlacementMethod::default(),
            parameters: OptimizerParams::default(),
            array: ArraySection::default(),
            objectives: vec![ObjectiveSpec {
                name: "mapping_width".to_string(),
                args: None,
            }],
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), CgramapError> {
        self.parameters.validate()?;
        self.array.validate()?;
        if self.router.is_empty() {
            return Err(CgramapError::Configuration(
                "router must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<RunConfig>>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(RunConfig::default())),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CgramapError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CgramapError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: RunConfig = toml::from_str(&contents)
            .map_err(|e| CgramapError::Configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        *self.config.write().unwrap() = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CgramapError> {
        let config = self.config.read().unwrap();
        let toml_str = toml::to_string_pretty(&*config)
            .map_err(|e| CgramapError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| CgramapError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> RunConfig {
        self.config.read().unwrap().clone()
    }

    pub fn update<F>(&self, f: F) -> Result<(), CgramapError>
    where
        F: FnOnce(&mut RunConfig),
    {
        let mut config = self.config.write().unwrap();
        f(&mut config);
        config.validate()?;
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
