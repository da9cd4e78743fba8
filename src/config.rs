use std::env;
use std::time::Duration;

use crate::error::ConverterError;

pub const DEFAULT_API_HOST: &str = "image-converter-api3.p.rapidapi.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_QUALITY: u8 = 80;
pub const DEFAULT_FIT: &str = "cover";

const API_KEY_VAR: &str = "RAPIDAPI_KEY";
const API_HOST_VAR: &str = "RAPIDAPI_HOST";
const TIMEOUT_VAR: &str = "IMAGE_CONVERTER_TIMEOUT_SECS";

/// Values sent for optional fields the caller leaves unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDefaults {
    /// `quality` for convert.
    pub quality: u8,
    /// `fit` for resize.
    pub fit: String,
}

impl Default for OperationDefaults {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            fit: DEFAULT_FIT.to_string(),
        }
    }
}

/// Everything a client needs to talk to the API.
///
/// Built once and handed to [`ImageConverterClient`](crate::ImageConverterClient),
/// which never mutates it.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    /// Sent as `X-RapidAPI-Host` and used to build the default base URL.
    pub host: String,
    /// Upper bound on a whole request, upload and response included.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub defaults: OperationDefaults,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("host", &self.host)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            host: DEFAULT_API_HOST.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            defaults: OperationDefaults::default(),
        }
    }

    /// Reads the configuration from the environment, loading a `.env` file
    /// first if one exists.
    ///
    /// `RAPIDAPI_KEY` is required; `RAPIDAPI_HOST` and
    /// `IMAGE_CONVERTER_TIMEOUT_SECS` are optional.
    pub fn from_env() -> Result<Self, ConverterError> {
        dotenvy::dotenv().ok();

        let api_key = env::var(API_KEY_VAR).map_err(|_| ConverterError::MissingApiKey)?;
        let mut config = Self::new(api_key);

        if let Ok(host) = env::var(API_HOST_VAR) {
            config = config.with_host(host);
        }
        if let Ok(raw) = env::var(TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ConverterError::InvalidConfig(format!("{TIMEOUT_VAR} must be whole seconds, got {raw:?}"))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_default_quality(mut self, quality: u8) -> Self {
        self.defaults.quality = quality;
        self
    }

    pub fn with_default_fit(mut self, fit: impl Into<String>) -> Self {
        self.defaults.fit = fit.into();
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConverterError> {
        if self.api_key.trim().is_empty() {
            return Err(ConverterError::MissingApiKey);
        }
        if self.host.trim().is_empty() {
            return Err(ConverterError::InvalidConfig("host must not be empty".to_string()));
        }
        if self.timeout.is_zero() || self.connect_timeout.is_zero() {
            return Err(ConverterError::InvalidConfig(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.defaults.fit.trim().is_empty() {
            return Err(ConverterError::InvalidConfig(
                "default fit must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn base_url(&self) -> String {
        format!("https://{}/", self.host)
    }
}
