//! Exposure parameters collected from the operator.
//!
//! [`ExposureParams`] is the raw form snapshot; [`ExposureParams::normalize`]
//! validates it and produces the [`NormalizedExposure`] values that are
//! written into the AALM input file.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AalmError, Result};
use crate::units::{FoodUnit, WaterUnit};

/// Oldest age the form accepts, in years.
pub const MAX_AGE_YEARS: u32 = 90;

/// Upper bound for soil and dust readings (PPM).
pub const MAX_SOIL_DUST_PPM: u32 = 5000;

/// Soil reading suggested when soil exposure is switched on.
pub const DEFAULT_SOIL_PPM: u32 = 200;

/// Dust reading suggested when dust exposure is switched on.
pub const DEFAULT_DUST_PPM: u32 = 150;

/// Days per simulated year.
pub const DAYS_PER_YEAR: u32 = 365;

/// Biological sex, as understood by the AALM growth tables.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    #[default]
    Male,
    Female,
}

impl Sex {
    /// Code written into the `Growth,sex` row.
    pub fn code(&self) -> u8 {
        match self {
            Sex::Male => 0,
            Sex::Female => 1,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => f.write_str("male"),
            Sex::Female => f.write_str("female"),
        }
    }
}

impl FromStr for Sex {
    type Err = AalmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            other => Err(AalmError::InvalidParameter(format!(
                "unknown sex '{other}' (expected male or female)"
            ))),
        }
    }
}

/// Simulated age span in whole years.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgeRange {
    pub start_years: u32,
    pub end_years: u32,
}

impl AgeRange {
    pub fn new(start_years: u32, end_years: u32) -> Self {
        Self {
            start_years,
            end_years,
        }
    }

    pub fn start_day(&self) -> u32 {
        self.start_years * DAYS_PER_YEAR
    }

    pub fn end_day(&self) -> u32 {
        self.end_years * DAYS_PER_YEAR
    }
}

impl Default for AgeRange {
    fn default() -> Self {
        Self::new(0, MAX_AGE_YEARS)
    }
}

impl fmt::Display for AgeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} years", self.start_years, self.end_years)
    }
}

/// One operator submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExposureParams {
    pub age: AgeRange,
    pub sex: Sex,

    /// Dietary lead, in `food_unit`.
    pub food_value: f64,
    pub food_unit: FoodUnit,

    /// Drinking-water lead, in `water_unit`.
    pub water_value: f64,
    pub water_unit: WaterUnit,

    /// Soil reading in PPM; `None` when soil exposure is not included.
    pub soil_ppm: Option<u32>,

    /// Dust reading in PPM; `None` when dust exposure is not included.
    pub dust_ppm: Option<u32>,
}

impl Default for ExposureParams {
    fn default() -> Self {
        Self {
            age: AgeRange::default(),
            sex: Sex::default(),
            food_value: FoodUnit::default().default_value(),
            food_unit: FoodUnit::default(),
            water_value: WaterUnit::default().default_value(),
            water_unit: WaterUnit::default(),
            soil_ppm: None,
            dust_ppm: None,
        }
    }
}

impl ExposureParams {
    /// Check every field against the ranges the form offers.
    pub fn validate(&self) -> Result<()> {
        if self.age.end_years > MAX_AGE_YEARS {
            return Err(AalmError::InvalidParameter(format!(
                "age range end {} exceeds {} years",
                self.age.end_years, MAX_AGE_YEARS
            )));
        }
        if self.age.start_years > self.age.end_years {
            return Err(AalmError::InvalidParameter(format!(
                "age range start {} is after end {}",
                self.age.start_years, self.age.end_years
            )));
        }

        check_range("food", self.food_value, self.food_unit.range(), self.food_unit.label())?;
        check_range(
            "water",
            self.water_value,
            self.water_unit.range(),
            self.water_unit.label(),
        )?;

        for (name, value) in [("soil", self.soil_ppm), ("dust", self.dust_ppm)] {
            if let Some(ppm) = value {
                if ppm > MAX_SOIL_DUST_PPM {
                    return Err(AalmError::InvalidParameter(format!(
                        "{name} lead {ppm} PPM exceeds {MAX_SOIL_DUST_PPM} PPM"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Validate and convert to the values written into the input file.
    pub fn normalize(&self) -> Result<NormalizedExposure> {
        self.validate()?;

        Ok(NormalizedExposure {
            start_day: self.age.start_day(),
            end_day: self.age.end_day(),
            sex_code: self.sex.code(),
            food_ug_per_day: self.food_unit.to_ug_per_day(self.food_value),
            water_ug_per_l: self.water_unit.to_ug_per_l(self.water_value),
            soil_ppm: self.soil_ppm.unwrap_or(0),
            dust_ppm: self.dust_ppm.unwrap_or(0),
        })
    }
}

fn check_range(name: &str, value: f64, (lo, hi): (f64, f64), unit: &str) -> Result<()> {
    if !value.is_finite() || value < lo || value > hi {
        return Err(AalmError::InvalidParameter(format!(
            "{name} lead {value} {unit} is outside {lo}..={hi}"
        )));
    }
    Ok(())
}

/// Parameter values in the units the AALM input file expects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NormalizedExposure {
    pub start_day: u32,
    pub end_day: u32,
    pub sex_code: u8,
    pub food_ug_per_day: f64,
    pub water_ug_per_l: f64,
    pub soil_ppm: u32,
    pub dust_ppm: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        let params = ExposureParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.age, AgeRange::new(0, 90));
        assert_eq!(params.food_value, 5.0);
        assert_eq!(params.water_value, 1.0);
    }

    #[test]
    fn test_normalize_converts_days_and_units() {
        let params = ExposureParams {
            age: AgeRange::new(1, 7),
            sex: Sex::Female,
            food_value: 0.1,
            food_unit: FoodUnit::Ppm,
            water_value: 0.1,
            water_unit: WaterUnit::UgPerKgPerDay,
            soil_ppm: Some(DEFAULT_SOIL_PPM),
            dust_ppm: None,
        };

        let n = params.normalize().unwrap();
        assert_eq!(n.start_day, 365);
        assert_eq!(n.end_day, 7 * 365);
        assert_eq!(n.sex_code, 1);
        assert!((n.food_ug_per_day - 50.0).abs() < 1e-9);
        assert!((n.water_ug_per_l - 2.0).abs() < 1e-9);
        assert_eq!(n.soil_ppm, 200);
        assert_eq!(n.dust_ppm, 0);
    }

    #[test]
    fn test_age_range_reversed_rejected() {
        let params = ExposureParams {
            age: AgeRange::new(10, 5),
            ..Default::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("after end"));
    }

    #[test]
    fn test_age_beyond_max_rejected() {
        let params = ExposureParams {
            age: AgeRange::new(0, 91),
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(AalmError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_food_range_depends_on_unit() {
        let ok = ExposureParams {
            food_value: 80.0,
            food_unit: FoodUnit::UgPerDay,
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let too_high = ExposureParams {
            food_value: 80.0,
            food_unit: FoodUnit::Ppm,
            ..Default::default()
        };
        assert!(too_high.validate().is_err());
    }

    #[test]
    fn test_non_finite_and_negative_rejected() {
        let nan = ExposureParams {
            water_value: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());

        let negative = ExposureParams {
            food_value: -1.0,
            ..Default::default()
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_soil_and_dust_bounds() {
        let params = ExposureParams {
            soil_ppm: Some(5000),
            dust_ppm: Some(5001),
            ..Default::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.to_string().contains("dust"));
    }

    #[test]
    fn test_sex_parse_and_code() {
        assert_eq!("Female".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!("m".parse::<Sex>().unwrap(), Sex::Male);
        assert!("other".parse::<Sex>().is_err());
        assert_eq!(Sex::Male.code(), 0);
        assert_eq!(Sex::Female.code(), 1);
    }

    #[test]
    fn test_age_range_display() {
        assert_eq!(AgeRange::new(0, 7).to_string(), "0-7 years");
    }
}
