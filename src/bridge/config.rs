//! Bridge configuration.
//!
//! `BridgeConfig` holds the tunables of a [`Surface`](crate::bridge::Surface):
//! gesture thresholds, the default device pixel ratio, where the native layer
//! finds its resources and which content service it binds to.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use surface_bridge::bridge::BridgeConfig;
//! let cfg = BridgeConfig::default();
//! assert_eq!(cfg.touch_slop, 8);
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use surface_bridge::bridge::BridgeConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = BridgeConfig::builder()
//!     .touch_slop(16)
//!     .long_press_timeout_ms(400)
//!     .service_name("WebContent")
//!     .build()?;
//! # Ok(()) }
//! ```
//!
//! ## Load from JSON
//! ```rust
//! use surface_bridge::bridge::BridgeConfig;
//! let cfg = BridgeConfig::from_json(r#"{ "touch_slop": 24 }"#).unwrap();
//! assert_eq!(cfg.touch_slop, 24);
//! assert_eq!(cfg.long_press_timeout_ms, 500);
//! ```

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SERVICE_NAME: &str = "WebContent";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Distance in pixels a pointer may travel before a touch becomes a scroll
    pub touch_slop: u32,
    /// How long a pointer must be held still to count as a long-press
    pub long_press_timeout_ms: u64,
    /// Minimum release velocity (px/s) for a scroll to end in a fling
    pub min_fling_velocity: f32,
    /// Ratio used until the host reports the real display density
    pub default_device_pixel_ratio: f32,
    /// Directory with the native layer's resources (fonts, themes, etc)
    pub resource_dir: Option<PathBuf>,
    /// Page loaded right after the native instance is created, if any
    pub home_url: Option<String>,
    /// Name of the content service the bridge binds to
    pub service_name: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            touch_slop: 8,
            long_press_timeout_ms: 500,
            min_fling_velocity: 50.0,
            default_device_pixel_ratio: 1.0,
            resource_dir: None,
            home_url: None,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Parse a configuration from JSON. Missing fields fall back to their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: BridgeConfig = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        validate(&cfg)?;
        Ok(cfg)
    }

    pub fn long_press_timeout(&self) -> Duration {
        Duration::from_millis(self.long_press_timeout_ms)
    }
}

/// Builder for [`BridgeConfig`].
#[derive(Debug, Clone, Default)]
pub struct BridgeConfigBuilder {
    inner: BridgeConfig,
}

impl BridgeConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut BridgeConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn touch_slop(self, px: u32) -> Self { self.map(|c| c.touch_slop = px) }
    pub fn long_press_timeout_ms(self, ms: u64) -> Self { self.map(|c| c.long_press_timeout_ms = ms) }
    pub fn min_fling_velocity(self, px_per_sec: f32) -> Self { self.map(|c| c.min_fling_velocity = px_per_sec) }
    pub fn default_device_pixel_ratio(self, ratio: f32) -> Self { self.map(|c| c.default_device_pixel_ratio = ratio) }
    pub fn resource_dir<P: Into<PathBuf>>(self, dir: P) -> Self { self.map(|c| c.resource_dir = Some(dir.into())) }
    pub fn home_url<S: Into<String>>(self, url: S) -> Self { self.map(|c| c.home_url = Some(url.into())) }
    pub fn service_name<S: Into<String>>(self, name: S) -> Self { self.map(|c| c.service_name = name.into()) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut BridgeConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<BridgeConfig, ConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("device pixel ratio {0} must be a positive, finite number")]
    InvalidPixelRatio(f32),
    #[error("fling velocity {0} must be a non-negative, finite number")]
    InvalidFlingVelocity(f32),
    #[error("service name must not be empty")]
    EmptyServiceName,
    #[error("cannot parse configuration: {0}")]
    Parse(String),
}

fn validate(c: &BridgeConfig) -> Result<(), ConfigError> {
    if !(c.default_device_pixel_ratio.is_finite() && c.default_device_pixel_ratio > 0.0) {
        return Err(ConfigError::InvalidPixelRatio(c.default_device_pixel_ratio));
    }
    if !(c.min_fling_velocity.is_finite() && c.min_fling_velocity >= 0.0) {
        return Err(ConfigError::InvalidFlingVelocity(c.min_fling_velocity));
    }
    if c.service_name.trim().is_empty() {
        return Err(ConfigError::EmptyServiceName);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_bad_ratio() {
        let err = BridgeConfig::builder().default_device_pixel_ratio(0.0).build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidPixelRatio(0.0));

        let err = BridgeConfig::builder()
            .default_device_pixel_ratio(f32::NAN)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPixelRatio(_)));
    }

    #[test]
    fn builder_rejects_empty_service_name() {
        let err = BridgeConfig::builder().service_name("  ").build().unwrap_err();
        assert_eq!(err, ConfigError::EmptyServiceName);
    }

    #[test]
    fn json_overrides_only_given_fields() {
        let cfg = BridgeConfig::from_json(
            r#"{ "min_fling_velocity": 120.0, "resource_dir": "/data/res", "home_url": "https://example.com" }"#,
        )
        .unwrap();

        assert_eq!(cfg.min_fling_velocity, 120.0);
        assert_eq!(cfg.resource_dir, Some(PathBuf::from("/data/res")));
        assert_eq!(cfg.home_url.as_deref(), Some("https://example.com"));
        assert_eq!(cfg.touch_slop, 8);
        assert_eq!(cfg.service_name, "WebContent");
    }

    #[test]
    fn json_errors_are_reported() {
        assert!(matches!(BridgeConfig::from_json("{ not json"), Err(ConfigError::Parse(_))));
        assert_eq!(
            BridgeConfig::from_json(r#"{ "service_name": "" }"#),
            Err(ConfigError::EmptyServiceName)
        );
    }
}
