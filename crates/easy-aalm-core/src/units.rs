//! Unit variants accepted on the exposure form and their fixed conversions.
//!
//! The AALM input file wants food lead as µg/day and water lead as µg/L.
//! Other units are mapped onto those with fixed linear factors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AalmError;

/// Assumed daily food consumption (g/day) used to turn a PPM (µg/g) food
/// concentration into a daily intake.
pub const FOOD_GRAMS_PER_DAY: f64 = 500.0;

/// Factor turning a water intake in µg/kg/day into a tap concentration in µg/L.
pub const WATER_UG_PER_L_PER_UG_PER_KG_DAY: f64 = 20.0;

/// Units for dietary lead.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FoodUnit {
    /// Constant intake in µg/day.
    #[default]
    UgPerDay,

    /// Body-weight normalised intake. Passed through unscaled.
    UgPerKgPerDay,

    /// Concentration in food, µg/g.
    Ppm,
}

impl FoodUnit {
    pub const ALL: [FoodUnit; 3] = [FoodUnit::UgPerDay, FoodUnit::UgPerKgPerDay, FoodUnit::Ppm];

    /// Label shown next to the value on the form.
    pub fn label(&self) -> &'static str {
        match self {
            FoodUnit::UgPerDay => "μg/day",
            FoodUnit::UgPerKgPerDay => "μg/kg/day",
            FoodUnit::Ppm => "PPM",
        }
    }

    /// Accepted input range, inclusive.
    pub fn range(&self) -> (f64, f64) {
        match self {
            FoodUnit::UgPerDay => (0.0, 100.0),
            FoodUnit::UgPerKgPerDay => (0.0, 10.0),
            FoodUnit::Ppm => (0.0, 10.0),
        }
    }

    /// Value pre-filled on the form for this unit.
    pub fn default_value(&self) -> f64 {
        match self {
            FoodUnit::UgPerDay => 5.0,
            FoodUnit::UgPerKgPerDay => 0.5,
            FoodUnit::Ppm => 0.1,
        }
    }

    /// Convert a value in this unit to µg/day.
    pub fn to_ug_per_day(&self, value: f64) -> f64 {
        match self {
            FoodUnit::UgPerDay | FoodUnit::UgPerKgPerDay => value,
            FoodUnit::Ppm => value * FOOD_GRAMS_PER_DAY,
        }
    }

    fn token(&self) -> &'static str {
        match self {
            FoodUnit::UgPerDay => "ug-day",
            FoodUnit::UgPerKgPerDay => "ug-kg-day",
            FoodUnit::Ppm => "ppm",
        }
    }
}

impl fmt::Display for FoodUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for FoodUnit {
    type Err = AalmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_token(s).as_str() {
            "ug-day" | "ug/day" => Ok(FoodUnit::UgPerDay),
            "ug-kg-day" | "ug/kg/day" => Ok(FoodUnit::UgPerKgPerDay),
            "ppm" => Ok(FoodUnit::Ppm),
            _ => Err(AalmError::InvalidParameter(format!(
                "unknown food unit '{s}' (expected ug-day, ug-kg-day or ppm)"
            ))),
        }
    }
}

/// Units for drinking-water lead.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WaterUnit {
    /// Tap concentration in µg/L (PPB).
    #[default]
    UgPerL,

    /// Intake in µg/kg/day.
    UgPerKgPerDay,
}

impl WaterUnit {
    pub const ALL: [WaterUnit; 2] = [WaterUnit::UgPerL, WaterUnit::UgPerKgPerDay];

    pub fn label(&self) -> &'static str {
        match self {
            WaterUnit::UgPerL => "μg/L (PPB)",
            WaterUnit::UgPerKgPerDay => "μg/kg/day",
        }
    }

    pub fn range(&self) -> (f64, f64) {
        match self {
            WaterUnit::UgPerL => (0.0, 50.0),
            WaterUnit::UgPerKgPerDay => (0.0, 5.0),
        }
    }

    pub fn default_value(&self) -> f64 {
        match self {
            WaterUnit::UgPerL => 1.0,
            WaterUnit::UgPerKgPerDay => 0.1,
        }
    }

    /// Convert a value in this unit to µg/L.
    pub fn to_ug_per_l(&self, value: f64) -> f64 {
        match self {
            WaterUnit::UgPerL => value,
            WaterUnit::UgPerKgPerDay => value * WATER_UG_PER_L_PER_UG_PER_KG_DAY,
        }
    }

    fn token(&self) -> &'static str {
        match self {
            WaterUnit::UgPerL => "ug-l",
            WaterUnit::UgPerKgPerDay => "ug-kg-day",
        }
    }
}

impl fmt::Display for WaterUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for WaterUnit {
    type Err = AalmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_token(s).as_str() {
            "ug-l" | "ug/l" | "ppb" => Ok(WaterUnit::UgPerL),
            "ug-kg-day" | "ug/kg/day" => Ok(WaterUnit::UgPerKgPerDay),
            _ => Err(AalmError::InvalidParameter(format!(
                "unknown water unit '{s}' (expected ug-l or ug-kg-day)"
            ))),
        }
    }
}

fn normalise_token(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .replace(|c: char| c == 'μ' || c == 'µ', "u")
        .replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_food_ppm_converts_at_500_grams_per_day() {
        assert!(approx(FoodUnit::Ppm.to_ug_per_day(0.1), 50.0));
        assert!(approx(FoodUnit::Ppm.to_ug_per_day(0.0), 0.0));
    }

    #[test]
    fn test_food_ug_per_day_and_per_kg_pass_through() {
        assert!(approx(FoodUnit::UgPerDay.to_ug_per_day(5.0), 5.0));
        assert!(approx(FoodUnit::UgPerKgPerDay.to_ug_per_day(0.5), 0.5));
    }

    #[test]
    fn test_water_per_kg_converts_at_factor_20() {
        assert!(approx(WaterUnit::UgPerKgPerDay.to_ug_per_l(0.1), 2.0));
        assert!(approx(WaterUnit::UgPerL.to_ug_per_l(1.0), 1.0));
    }

    #[test]
    fn test_unit_tokens_parse() {
        assert_eq!("ppm".parse::<FoodUnit>().unwrap(), FoodUnit::Ppm);
        assert_eq!("μg/kg/day".parse::<FoodUnit>().unwrap(), FoodUnit::UgPerKgPerDay);
        assert_eq!("UG_DAY".parse::<FoodUnit>().unwrap(), FoodUnit::UgPerDay);
        assert_eq!("ppb".parse::<WaterUnit>().unwrap(), WaterUnit::UgPerL);
        assert_eq!("ug-kg-day".parse::<WaterUnit>().unwrap(), WaterUnit::UgPerKgPerDay);
    }

    #[test]
    fn test_unknown_unit_rejected() {
        let err = "grams".parse::<FoodUnit>().unwrap_err();
        assert!(err.to_string().contains("unknown food unit"));
        assert!("ppm".parse::<WaterUnit>().is_err());
    }

    #[test]
    fn test_display_roundtrips_through_from_str() {
        for unit in FoodUnit::ALL {
            assert_eq!(unit.to_string().parse::<FoodUnit>().unwrap(), unit);
        }
        for unit in WaterUnit::ALL {
            assert_eq!(unit.to_string().parse::<WaterUnit>().unwrap(), unit);
        }
    }

    #[test]
    fn test_defaults_fall_inside_ranges() {
        for unit in FoodUnit::ALL {
            let (lo, hi) = unit.range();
            assert!((lo..=hi).contains(&unit.default_value()));
        }
        for unit in WaterUnit::ALL {
            let (lo, hi) = unit.range();
            assert!((lo..=hi).contains(&unit.default_value()));
        }
    }
}
