//! # World Configuration
//!
//! Everything the simulation needs at INIT, plus session limits.
//!
//! Loaded once at startup, either built in code or parsed from TOML:
//!
//! ```toml
//! gravity = { x = 0.0, y = -9.8, z = 0.0 }
//! debug_draw_mode = 1
//! max_bodies = 2048
//! fixed_time_step = 0.016666668
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tandem_shared::constants::{
    DEFAULT_DEBUG_VERTEX_CAPACITY, DEFAULT_FIXED_TIME_STEP, DEFAULT_MAX_SUB_STEPS,
};
use tandem_shared::{DebugDrawMode, Vec3, DEFAULT_MAX_BODIES};

use crate::error::{ConfigError, ConfigResult};

/// Configuration of a simulation session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World gravity. Default: (0, -9.8, 0).
    pub gravity: Vec3,
    /// Debug geometry to emit once enabled. Default: none.
    pub debug_draw_mode: DebugDrawMode,
    /// Where the simulation engine loads its module from. Default: empty.
    pub module_locator: String,
    /// Transfer buffer slot capacity. Default: 10 000.
    pub max_bodies: usize,
    /// Fixed simulation step in seconds. Default: 1/60.
    pub fixed_time_step: f32,
    /// Maximum fixed steps per round trip. Default: 4.
    pub max_sub_steps: u32,
    /// Debug vertex capacity, allocated on first enable. Default: 1 000 000.
    pub debug_vertex_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.8, 0.0),
            debug_draw_mode: DebugDrawMode::NO_DEBUG,
            module_locator: String::new(),
            max_bodies: DEFAULT_MAX_BODIES,
            fixed_time_step: DEFAULT_FIXED_TIME_STEP,
            max_sub_steps: DEFAULT_MAX_SUB_STEPS,
            debug_vertex_capacity: DEFAULT_DEBUG_VERTEX_CAPACITY,
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from TOML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML and
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`WorldConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks every limit.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_bodies == 0 {
            return Err(ConfigError::Invalid("max_bodies must be greater than zero".into()));
        }
        if i32::try_from(self.max_bodies).is_err() {
            return Err(ConfigError::Invalid(format!(
                "max_bodies {} exceeds the collision entry range",
                self.max_bodies
            )));
        }
        if !(self.fixed_time_step.is_finite() && self.fixed_time_step > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fixed_time_step must be positive, got {}",
                self.fixed_time_step
            )));
        }
        if self.max_sub_steps == 0 {
            return Err(ConfigError::Invalid("max_sub_steps must be at least 1".into()));
        }
        if self.debug_vertex_capacity < 2 {
            return Err(ConfigError::Invalid(
                "debug_vertex_capacity must hold at least one line".into(),
            ));
        }
        Ok(())
    }

    /// Fixed step as a duration.
    #[must_use]
    pub fn fixed_step(&self) -> Duration {
        Duration::from_secs_f32(self.fixed_time_step)
    }

    /// Sets the gravity vector.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Sets the debug draw mode.
    #[must_use]
    pub fn with_debug_draw_mode(mut self, mode: DebugDrawMode) -> Self {
        self.debug_draw_mode = mode;
        self
    }

    /// Sets the engine module locator.
    #[must_use]
    pub fn with_module_locator(mut self, locator: impl Into<String>) -> Self {
        self.module_locator = locator.into();
        self
    }

    /// Sets the slot capacity.
    #[must_use]
    pub fn with_max_bodies(mut self, max_bodies: usize) -> Self {
        self.max_bodies = max_bodies;
        self
    }

    /// Sets the fixed step in seconds.
    #[must_use]
    pub fn with_fixed_time_step(mut self, seconds: f32) -> Self {
        self.fixed_time_step = seconds;
        self
    }

    /// Sets the sub-step limit.
    #[must_use]
    pub fn with_max_sub_steps(mut self, steps: u32) -> Self {
        self.max_sub_steps = steps;
        self
    }

    /// Sets the debug vertex capacity.
    #[must_use]
    pub fn with_debug_vertex_capacity(mut self, vertices: usize) -> Self {
        self.debug_vertex_capacity = vertices;
        self
    }
}
