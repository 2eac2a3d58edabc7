//! Configuration Vault – reads/writes `~/.tether/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use tether_runtime::settings::SessionConfig;

/// Persisted sandbox configuration stored in `~/.tether/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Fixed simulation rate used by `/tick` and `/run`.
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,

    /// Carry and tether tuning handed to every session.
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_tick_rate_hz() -> u32 {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate_hz(),
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    /// Seconds per simulation tick.
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate_hz.max(1) as f32
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.tick_rate_hz == 0 {
            return Err("tick_rate_hz must be positive".to_string());
        }
        self.session.validate().map_err(|e| e.to_string())
    }
}

/// Return the path to `~/.tether/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".tether").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path, apply environment overrides and
/// validate the result.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(Some(cfg))
}

/// Apply `TETHER_*` environment variable overrides to `cfg`.  Values that do
/// not parse are ignored.
///
/// | Variable | Config field |
/// |---|---|
/// | `TETHER_TICK_RATE` | `tick_rate_hz` |
/// | `TETHER_PICKUP_RANGE` | `session.carry.pickup_range` |
/// | `TETHER_THROW_FORCE` | `session.tether.throw_force` |
/// | `TETHER_RECALL_SPEED` | `session.tether.recall_speed` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("TETHER_TICK_RATE")
        && let Ok(rate) = v.parse::<u32>()
    {
        cfg.tick_rate_hz = rate;
    }
    if let Some(range) = env_f32("TETHER_PICKUP_RANGE") {
        cfg.session.carry.pickup_range = range;
    }
    if let Some(force) = env_f32("TETHER_THROW_FORCE") {
        cfg.session.tether.throw_force = force;
    }
    if let Some(speed) = env_f32("TETHER_RECALL_SPEED") {
        cfg.session.tether.recall_speed = speed;
    }
}

fn env_f32(name: &str) -> Option<f32> {
    std::env::var(name)
        .ok()?
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Save the config to disk, creating `~/.tether/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Owner-only directory (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_sandbox_tuning() {
        let cfg = Config::default();
        assert_eq!(cfg.tick_rate_hz, 60);
        assert!((cfg.dt() - 1.0 / 60.0).abs() < 1e-6);
        assert!(cfg.session.verify_invariants);
        assert_eq!(cfg.session.carry.pickup_range, 10.0);
        assert_eq!(cfg.session.tether.recall_speed, 30.0);
        assert!(cfg.validate().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).expect("file metadata").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600, "config file must have 0o600 permissions");

        let dir_meta = std::fs::metadata(path.parent().unwrap()).expect("dir metadata");
        assert_eq!(dir_meta.permissions().mode() & 0o777, 0o700);
    }

    #[test]
    fn roundtrip_custom_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let mut cfg = Config::default();
        cfg.session.carry.hold_distance = 1.75;
        cfg.session.tether.draw_back_delay = 0.5;
        cfg.session.verify_invariants = false;
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.session.carry.hold_distance, 1.75);
        assert_eq!(loaded.session.tether.draw_back_delay, 0.5);
        assert!(!loaded.session.verify_invariants);
        assert_eq!(loaded.session.tether.hold_offset, cfg.session.tether.hold_offset);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session.tether]\ndraw_back_distance = 2.0\n").expect("write");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.session.tether.draw_back_distance, 2.0);
        assert_eq!(loaded.session.tether.draw_back_delay, 0.25);
        assert_eq!(loaded.session.carry.hold_distance, 1.0);
    }

    #[test]
    fn invalid_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session.carry]\nhold_probe_radius = -1.0\n").expect("write");
        assert!(load_from(&path).is_err());
    }

    #[test]
    fn config_path_points_to_tether_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".tether"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn apply_env_overrides_changes_tick_rate() {
        // SAFETY: no other test touches this variable.
        unsafe { std::env::set_var("TETHER_TICK_RATE", "120") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.tick_rate_hz, 120);
        unsafe { std::env::remove_var("TETHER_TICK_RATE") };
    }

    #[test]
    fn apply_env_overrides_changes_pickup_range() {
        // SAFETY: no other test touches this variable.
        unsafe { std::env::set_var("TETHER_PICKUP_RANGE", "4.5") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.session.carry.pickup_range, 4.5);
        unsafe { std::env::remove_var("TETHER_PICKUP_RANGE") };
    }

    #[test]
    fn apply_env_overrides_changes_recall_speed() {
        // SAFETY: no other test touches this variable.
        unsafe { std::env::set_var("TETHER_RECALL_SPEED", "12") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.session.tether.recall_speed, 12.0);
        unsafe { std::env::remove_var("TETHER_RECALL_SPEED") };
    }

    #[test]
    fn apply_env_overrides_ignores_garbage() {
        // SAFETY: no other test touches this variable.
        unsafe { std::env::set_var("TETHER_THROW_FORCE", "very hard") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.session.tether.throw_force, 30.0);
        unsafe { std::env::remove_var("TETHER_THROW_FORCE") };
    }
}
