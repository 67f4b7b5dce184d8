/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Runtime configuration for grid evaluation.
//!
//! Values resolve in layers, highest priority first:
//!
//! 1. environment variables (`HYPERGRID_*`),
//! 2. a YAML file loaded with [`global::init_from_yaml`],
//! 3. the defaults of [`GridConfig`].
//!
//! The process-wide configuration lives in [`global`]. It is read
//! when a grid node is built, so changing it does not affect nodes
//! that already exist.

use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

/// Environment variable overriding [`GridConfig::filter_max_attempts`].
pub const FILTER_MAX_ATTEMPTS_ENV: &str = "HYPERGRID_FILTER_MAX_ATTEMPTS";

/// Default rejection-sampling budget of filter nodes.
pub const DEFAULT_FILTER_MAX_ATTEMPTS: usize = 1000;

/// Grid evaluation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// How many rows a filter node draws from its child before
    /// sampling gives up.
    pub filter_max_attempts: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            filter_max_attempts: DEFAULT_FILTER_MAX_ATTEMPTS,
        }
    }
}

impl GridConfig {
    /// The defaults, overridden by the environment.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides on top of `self`. Values that fail
    /// to parse are logged and ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = env::var(FILTER_MAX_ATTEMPTS_ENV) {
            match val.parse::<usize>() {
                Ok(attempts) if attempts > 0 => self.filter_max_attempts = attempts,
                Ok(_) => tracing::error!(
                    "ignoring ${}=\"{}\": filter budget must be at least 1",
                    FILTER_MAX_ATTEMPTS_ENV,
                    val
                ),
                Err(e) => tracing::error!(
                    "failed to override filter_max_attempts from value \"{}\" in ${}: {}",
                    val,
                    FILTER_MAX_ATTEMPTS_ENV,
                    e
                ),
            }
        }
        self
    }

    fn validate(self) -> Result<Self, anyhow::Error> {
        anyhow::ensure!(
            self.filter_max_attempts > 0,
            "filter_max_attempts must be at least 1"
        );
        Ok(self)
    }
}

/// Load a configuration from a YAML file. Missing keys take their
/// default values.
pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<GridConfig, anyhow::Error> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    let config: GridConfig = serde_yaml::from_str(&contents)?;
    config.validate()
}

/// Save a configuration to a YAML file.
pub fn to_yaml<P: AsRef<Path>>(config: &GridConfig, path: P) -> Result<(), anyhow::Error> {
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// The process-wide configuration.
pub mod global {
    use std::path::Path;
    use std::sync::LazyLock;
    use std::sync::Mutex;
    use std::sync::MutexGuard;
    use std::sync::PoisonError;
    use std::sync::RwLock;

    use super::GridConfig;

    static CONFIG: LazyLock<RwLock<GridConfig>> =
        LazyLock::new(|| RwLock::new(GridConfig::from_env()));

    /// The current configuration. Initialized from the environment
    /// on first use.
    pub fn get() -> GridConfig {
        *CONFIG.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the current configuration.
    pub fn set(config: GridConfig) {
        tracing::debug!(?config, "setting global grid config");
        *CONFIG.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Re-read the environment over the defaults.
    pub fn init_from_env() {
        set(GridConfig::from_env());
    }

    /// Load `path` and install it, with environment overrides taking
    /// precedence over the file.
    pub fn init_from_yaml<P: AsRef<Path>>(path: P) -> Result<(), anyhow::Error> {
        let config = super::from_yaml(path)?.with_env_overrides();
        set(config);
        Ok(())
    }

    /// Serialize access to the global configuration.
    ///
    /// Tests that change the configuration hold this lock and install
    /// values with [`ConfigLock::override_config`]:
    ///
    /// ```
    /// use hypergrid::config::GridConfig;
    /// use hypergrid::config::global;
    ///
    /// let lock = global::lock();
    /// {
    ///     let _guard = lock.override_config(GridConfig {
    ///         filter_max_attempts: 5,
    ///     });
    ///     assert_eq!(global::get().filter_max_attempts, 5);
    /// }
    /// ```
    pub fn lock() -> ConfigLock {
        static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
        ConfigLock {
            _guard: MUTEX.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Exclusive access to the global configuration.
    pub struct ConfigLock {
        _guard: MutexGuard<'static, ()>,
    }

    impl ConfigLock {
        /// Install `config` until the returned guard is dropped.
        pub fn override_config(&self, config: GridConfig) -> ConfigGuard<'_> {
            let previous = get();
            set(config);
            ConfigGuard {
                previous,
                _lock: self,
            }
        }
    }

    /// Restores the configuration that was active before
    /// [`ConfigLock::override_config`] when dropped.
    pub struct ConfigGuard<'a> {
        previous: GridConfig,
        _lock: &'a ConfigLock,
    }

    impl Drop for ConfigGuard<'_> {
        fn drop(&mut self) {
            set(self.previous);
        }
    }
}
