use crate::config::AppConfig;
use crate::core::HardwareAdapter;
use crate::core::transfer_engine::TransferEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub adapter: Arc<dyn HardwareAdapter>,
    pub engine: Arc<dyn TransferEngine>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        adapter: Arc<dyn HardwareAdapter>,
        engine: Arc<dyn TransferEngine>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            adapter,
            engine,
        }
    }
}
