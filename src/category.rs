//! Weapon categories and their gameplay-facing stats.
//!
//! A category drives three things: which synthesis recipe plays on a shot,
//! which random visual fields an impact freezes, and which paint recipe the
//! scene uses for it.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// The weapon kinds an impact can be recorded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pistol,
    Shotgun,
    Flamethrower,
    Rifle,
    Rpg,
    Laser,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Pistol,
        Category::Shotgun,
        Category::Flamethrower,
        Category::Rifle,
        Category::Rpg,
        Category::Laser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pistol => "pistol",
            Category::Shotgun => "shotgun",
            Category::Flamethrower => "flamethrower",
            Category::Rifle => "rifle",
            Category::Rpg => "rpg",
            Category::Laser => "laser",
        }
    }

    /// Parse a settings / host key. Unknown keys are a recoverable error.
    pub fn from_key(key: &str) -> CoreResult<Self> {
        match key {
            "pistol" => Ok(Category::Pistol),
            "shotgun" => Ok(Category::Shotgun),
            "flamethrower" => Ok(Category::Flamethrower),
            "rifle" => Ok(Category::Rifle),
            "rpg" => Ok(Category::Rpg),
            "laser" => Ok(Category::Laser),
            other => Err(CoreError::UnknownCategory(other.to_string())),
        }
    }

    /// Projectile weapons that leave cracked holes.
    pub fn is_piercing(&self) -> bool {
        matches!(self, Category::Pistol | Category::Shotgun | Category::Rifle)
    }

    /// Weapons that leave a scorch mark with soot.
    pub fn is_incendiary(&self) -> bool {
        matches!(self, Category::Flamethrower | Category::Rpg)
    }

    /// Weapons that leave debris lines and a crater.
    pub fn is_explosive(&self) -> bool {
        matches!(self, Category::Rpg)
    }

    pub fn stats(&self) -> WeaponStats {
        match self {
            Category::Pistol => WeaponStats::single(10, 6.0),
            Category::Shotgun => WeaponStats::single(40, 8.0),
            Category::Rpg => WeaponStats::single(100, 15.0),
            Category::Flamethrower => WeaponStats::automatic(2, 30.0, 50),
            Category::Rifle => WeaponStats::automatic(15, 5.0, 100),
            Category::Laser => WeaponStats::single(25, 6.0),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_key(s)
    }
}

/// Per-weapon stats consumed by the host's targeting layer.
///
/// The core only reads `size_hint`; damage and fire rate belong to the
/// damage / interaction layers and are exposed so they share one table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    pub damage: u32,
    /// Impact size passed to `ImpactStore::record`.
    pub size_hint: f32,
    /// Holding the trigger repeats the shot.
    pub automatic: bool,
    /// Repeat interval in milliseconds (automatic weapons only).
    pub fire_rate_ms: Option<u32>,
}

impl WeaponStats {
    const fn single(damage: u32, size_hint: f32) -> Self {
        Self {
            damage,
            size_hint,
            automatic: false,
            fire_rate_ms: None,
        }
    }

    const fn automatic(damage: u32, size_hint: f32, fire_rate_ms: u32) -> Self {
        Self {
            damage,
            size_hint,
            automatic: true,
            fire_rate_ms: Some(fire_rate_ms),
        }
    }
}
