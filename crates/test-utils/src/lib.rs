//! Shared test utilities for opengov crates.
//!
//! Tests that touch process-global state (env vars, `HOME`) take
//! [`env_guard`] first so they never race each other.

use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex, MutexGuard};

/// Serialize tests that mutate process-global state (env vars, cwd, etc).
pub fn env_guard() -> MutexGuard<'static, ()> {
    static TEST_SERIAL: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));
    TEST_SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// RAII guard for environment variables - restores original value on drop.
pub struct EnvVarGuard {
    key: &'static str,
    previous: Option<String>,
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        if let Some(v) = &self.previous {
            std::env::set_var(self.key, v);
        } else {
            std::env::remove_var(self.key);
        }
    }
}

/// Set an environment variable and return a guard that restores the original on drop.
///
/// # Example
/// ```
/// let _guard = opengov_test_utils::set_env_var("ROW_FETCH_CAP", Some("10"));
/// assert_eq!(std::env::var("ROW_FETCH_CAP").unwrap(), "10");
/// ```
pub fn set_env_var(key: &'static str, value: Option<&str>) -> EnvVarGuard {
    let previous = std::env::var(key).ok();
    if let Some(val) = value {
        std::env::set_var(key, val);
    } else {
        std::env::remove_var(key);
    }
    EnvVarGuard { key, previous }
}

/// Temporary `HOME` with an `.opengov/` directory for config-file tests.
///
/// Does NOT set HOME itself - use [`HomeFixture::home_guard`] for that.
pub struct HomeFixture {
    pub tempdir: tempfile::TempDir,
    /// Path to `$HOME/.opengov`.
    pub config_dir: PathBuf,
}

impl HomeFixture {
    pub fn new() -> std::io::Result<Self> {
        let tempdir = tempfile::tempdir()?;
        let config_dir = tempdir.path().join(".opengov");
        std::fs::create_dir_all(&config_dir)?;
        Ok(Self {
            tempdir,
            config_dir,
        })
    }

    pub fn home_path(&self) -> &Path {
        self.tempdir.path()
    }

    /// Point `HOME` at this fixture until the guard drops.
    pub fn home_guard(&self) -> EnvVarGuard {
        set_env_var("HOME", self.home_path().to_str())
    }

    /// Write `~/.opengov/config.toml` and return its path.
    pub fn write_config(&self, toml: &str) -> std::io::Result<PathBuf> {
        let path = self.config_dir.join("config.toml");
        std::fs::write(&path, toml)?;
        Ok(path)
    }
}
