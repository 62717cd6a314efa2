//! Vehicle classification and per-class speed limits.

use std::fmt;

/// The fleet classes the simulation distinguishes.
///
/// Speed limits are urban free-flow values in m/s:
///
/// | Class     | m/s   | km/h |
/// |-----------|-------|------|
/// | Standard  | 13.89 | 50   |
/// | Ambulance | 22.22 | 80   |
/// | Bus       | 11.11 | 40   |
/// | Fire      | 19.44 | 70   |
/// | Police    | 22.22 | 80   |
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Standard,
    Ambulance,
    Bus,
    Fire,
    Police,
}

impl VehicleType {
    /// Free-flow speed limit in m/s.
    #[inline]
    pub fn max_speed(self) -> f32 {
        match self {
            VehicleType::Standard => 13.89,
            VehicleType::Ambulance => 22.22,
            VehicleType::Bus => 11.11,
            VehicleType::Fire => 19.44,
            VehicleType::Police => 22.22,
        }
    }

    /// `true` for the classes the crisis manager supervises and prioritizes
    /// (everything that can request a green wave).
    #[inline]
    pub fn is_priority(self) -> bool {
        !matches!(self, VehicleType::Standard)
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VehicleType::Standard => "standard",
            VehicleType::Ambulance => "ambulance",
            VehicleType::Bus => "bus",
            VehicleType::Fire => "fire",
            VehicleType::Police => "police",
        })
    }
}
