//! Player settings
//!
//! Owned by the host's settings collaborator and handed to the session per
//! call. Stored as JSON next to the impact snapshot.

use serde::{Deserialize, Serialize};

use crate::category::{Category, WeaponStats};
use crate::error::{CoreError, CoreResult};

/// Player-facing toggles and the selected weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Master switch: shooting, music and highlighting only happen while on.
    pub violence_enabled: bool,
    /// Outline the element under the cursor.
    pub tactical_highlight: bool,
    /// Host-side debug overlays (health popups).
    pub debug: bool,

    // === Weapon ===
    pub weapon: Category,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            violence_enabled: false,
            tactical_highlight: true,
            debug: false,
            weapon: Category::Pistol,
            master_volume: 0.8,
        }
    }
}

impl Settings {
    /// Stats of the selected weapon.
    pub fn weapon_stats(&self) -> WeaponStats {
        self.weapon.stats()
    }

    /// Should hovering paint a highlight?
    pub fn highlight_active(&self) -> bool {
        self.violence_enabled && self.tactical_highlight
    }

    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string(self).map_err(|e| CoreError::InvalidConfig(e.to_string()))
    }

    /// Parse settings; missing fields take their defaults.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_fresh_install() {
        let s = Settings::default();
        assert!(!s.violence_enabled);
        assert!(s.tactical_highlight);
        assert!(!s.debug);
        assert_eq!(s.weapon, Category::Pistol);
        assert_eq!(s.weapon_stats().size_hint, 6.0);
        assert!(!s.highlight_active());
    }

    #[test]
    fn json_round_trip() {
        let s = Settings {
            violence_enabled: true,
            weapon: Category::Rpg,
            master_volume: 0.5,
            ..Settings::default()
        };
        let json = s.to_json().expect("serialisable");
        assert!(json.contains("\"rpg\""));
        assert_eq!(Settings::from_json(&json), Ok(s));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let s = Settings::from_json(r#"{"weapon": "laser"}"#).expect("valid");
        assert_eq!(s.weapon, Category::Laser);
        assert!(s.tactical_highlight);
    }

    #[test]
    fn unknown_weapon_is_rejected() {
        assert!(matches!(
            Settings::from_json(r#"{"weapon": "bazooka"}"#),
            Err(CoreError::InvalidConfig(_))
        ));
    }
}
