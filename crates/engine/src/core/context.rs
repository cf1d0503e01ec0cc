use crate::core::EngineConfig;
use crate::model::CanonicalConfig;

/// Identifier used for `devicesInvolved` when neither a hostname nor a file name is known.
pub const UNNAMED_DEVICE: &str = "<unnamed-device>";

/// Read-only view handed to every rule of a run.
pub struct AnalysisContext<'a> {
    config: &'a CanonicalConfig,
    settings: &'a EngineConfig,
    device_id: String,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(config: &'a CanonicalConfig, settings: &'a EngineConfig) -> Self {
        let device_id = config
            .device_info
            .hostname
            .clone()
            .unwrap_or_else(|| UNNAMED_DEVICE.to_string());

        Self {
            config,
            settings,
            device_id,
        }
    }

    /// Uses `fallback` as the device identifier when the configuration carries no hostname.
    pub fn with_fallback_device_id(mut self, fallback: &str) -> Self {
        if self.config.device_info.hostname.is_none() && !fallback.is_empty() {
            self.device_id = fallback.to_string();
        }
        self
    }

    pub fn config(&self) -> &'a CanonicalConfig {
        self.config
    }

    pub fn settings(&self) -> &'a EngineConfig {
        self.settings
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}
