//! Combat tuning configuration resource.
//!
//! Damage numbers and collision rules loaded from an INI file. Provides safe
//! defaults for startup and methods to load/save configuration; damage
//! values are tuning knobs, not contracts.
//!
//! # Configuration File Format
//!
//! ```ini
//! [damage]
//! laser = 15.0
//! ram = 25.0
//! asteroid = 40.0
//!
//! [rules]
//! player_immunity = false
//! friendly_fire = false
//! ```

use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

/// Default safe values for startup
const DEFAULT_LASER_DAMAGE: f32 = 15.0;
const DEFAULT_RAM_DAMAGE: f32 = 25.0;
const DEFAULT_ASTEROID_DAMAGE: f32 = 40.0;
const DEFAULT_PLAYER_IMMUNITY: bool = false;
const DEFAULT_FRIENDLY_FIRE: bool = false;
const DEFAULT_CONFIG_PATH: &str = "./combat.ini";

/// Combat configuration resource.
///
/// Stores damage amounts per source type and the collision rule flags. The
/// immunity flag exists because play-testing builds run with it enabled;
/// production sessions leave it off.
#[derive(Debug, Clone)]
pub struct CombatConfig {
    /// Damage dealt by one laser hit.
    pub laser_damage: f32,
    /// Damage dealt by ship-to-ship ramming.
    pub ram_damage: f32,
    /// Damage dealt by an asteroid impact.
    pub asteroid_damage: f32,
    /// When true, the player ship ignores all incoming damage.
    pub player_immunity: bool,
    /// When true, damage between entities sharing an owner is allowed.
    pub friendly_fire: bool,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            laser_damage: DEFAULT_LASER_DAMAGE,
            ram_damage: DEFAULT_RAM_DAMAGE,
            asteroid_damage: DEFAULT_ASTEROID_DAMAGE,
            player_immunity: DEFAULT_PLAYER_IMMUNITY,
            friendly_fire: DEFAULT_FRIENDLY_FIRE,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [damage] section
        if let Some(laser) = config.getfloat("damage", "laser").ok().flatten() {
            self.laser_damage = laser as f32;
        }
        if let Some(ram) = config.getfloat("damage", "ram").ok().flatten() {
            self.ram_damage = ram as f32;
        }
        if let Some(asteroid) = config.getfloat("damage", "asteroid").ok().flatten() {
            self.asteroid_damage = asteroid as f32;
        }

        // [rules] section
        if let Some(immunity) = config.getbool("rules", "player_immunity").ok().flatten() {
            self.player_immunity = immunity;
        }
        if let Some(ff) = config.getbool("rules", "friendly_fire").ok().flatten() {
            self.friendly_fire = ff;
        }

        info!(
            "Loaded combat config: laser={}, ram={}, asteroid={}, player_immunity={}, friendly_fire={}",
            self.laser_damage,
            self.ram_damage,
            self.asteroid_damage,
            self.player_immunity,
            self.friendly_fire
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    #[allow(dead_code)]
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [damage] section
        config.set("damage", "laser", Some(self.laser_damage.to_string()));
        config.set("damage", "ram", Some(self.ram_damage.to_string()));
        config.set("damage", "asteroid", Some(self.asteroid_damage.to_string()));

        // [rules] section
        config.set(
            "rules",
            "player_immunity",
            Some(self.player_immunity.to_string()),
        );
        config.set(
            "rules",
            "friendly_fire",
            Some(self.friendly_fire.to_string()),
        );

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved combat config to {:?}", self.config_path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_safe() {
        let config = CombatConfig::new();
        assert_eq!(config.laser_damage, 15.0);
        assert_eq!(config.ram_damage, 25.0);
        assert_eq!(config.asteroid_damage, 40.0);
        assert!(!config.player_immunity);
        assert!(!config.friendly_fire);
    }

    #[test]
    fn test_with_path_keeps_defaults() {
        let config = CombatConfig::with_path("/tmp/custom.ini");
        assert_eq!(config.config_path, PathBuf::from("/tmp/custom.ini"));
        assert_eq!(config.laser_damage, 15.0);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let mut config = CombatConfig::with_path("/nonexistent/dir/combat.ini");
        assert!(config.load_from_file().is_err());
        // Defaults must survive a failed load.
        assert_eq!(config.laser_damage, 15.0);
    }
}
