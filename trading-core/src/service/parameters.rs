use super::ServiceError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use trading_common::backtest::StrategyParameters;

/// Where strategy parameters live between runs
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Always returns a validated snapshot; missing fields take their defaults.
    async fn load_parameters(&self) -> Result<StrategyParameters, ServiceError>;
    async fn save_parameters(&self, params: &StrategyParameters) -> Result<(), ServiceError>;
}

/// Parameter file keyed by strategy name, pretty-printed JSON
#[derive(Debug, Clone)]
pub struct JsonParameterStore {
    path: PathBuf,
}

impl JsonParameterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ParameterStore for JsonParameterStore {
    async fn load_parameters(&self) -> Result<StrategyParameters, ServiceError> {
        let params = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str::<StrategyParameters>(&contents)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Parameter file {:?} not found, using defaults", self.path);
                StrategyParameters::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(params.validated()?)
    }

    async fn save_parameters(&self, params: &StrategyParameters) -> Result<(), ServiceError> {
        params.validate()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_string_pretty(params)?;
        tokio::fs::write(&self.path, body).await?;
        info!("Saved strategy parameters to {:?}", self.path);
        Ok(())
    }
}
