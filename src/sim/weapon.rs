//! Weapon catalog
//!
//! Weapons are immutable values. A worm carries its own copies; projectiles
//! carry the weapon they were fired with.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_YIELD;

/// How launch force depends on yield
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ForceLaw {
    /// Force equals the propulsion power regardless of yield
    Constant,
    /// Force grows linearly from the propulsion power at yield 0 up to
    /// `max_power` at full yield
    Linear { max_power: f64 },
}

/// An immutable weapon definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Weapon {
    pub name: &'static str,
    /// Projectile mass (kg)
    pub mass: f64,
    /// Action points charged per shot
    pub cost: u32,
    /// Hit points taken from the worm that is hit
    pub damage: u32,
    /// Launch force at yield 0 (N)
    pub propulsion_power: f64,
    pub force_law: ForceLaw,
}

impl Weapon {
    pub const fn rifle() -> Self {
        Self {
            name: "Rifle",
            mass: 0.01,
            cost: 10,
            damage: 20,
            propulsion_power: 1.5,
            force_law: ForceLaw::Constant,
        }
    }

    pub const fn bazooka() -> Self {
        Self {
            name: "Bazooka",
            mass: 0.300,
            cost: 50,
            damage: 80,
            propulsion_power: 2.5,
            force_law: ForceLaw::Linear { max_power: 9.5 },
        }
    }

    /// Launch force for a yield in `0..=100`
    pub fn force(&self, yield_: u32) -> f64 {
        match self.force_law {
            ForceLaw::Constant => self.propulsion_power,
            ForceLaw::Linear { max_power } => {
                let fraction = yield_.min(MAX_YIELD) as f64 / MAX_YIELD as f64;
                self.propulsion_power + (max_power - self.propulsion_power) * fraction
            }
        }
    }
}

/// Inventory every new worm starts with, in selection order
pub fn default_arsenal() -> Vec<Weapon> {
    vec![Weapon::rifle(), Weapon::bazooka()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rifle_force_ignores_yield() {
        let rifle = Weapon::rifle();
        assert_eq!(rifle.force(0), 1.5);
        assert_eq!(rifle.force(100), 1.5);
    }

    #[test]
    fn test_bazooka_force_is_linear_in_yield() {
        let bazooka = Weapon::bazooka();
        assert_eq!(bazooka.force(0), 2.5);
        assert_eq!(bazooka.force(100), 9.5);
        assert!((bazooka.force(50) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_default_arsenal_order() {
        let names: Vec<_> = default_arsenal().iter().map(|w| w.name).collect();
        assert_eq!(names, ["Rifle", "Bazooka"]);
    }
}
