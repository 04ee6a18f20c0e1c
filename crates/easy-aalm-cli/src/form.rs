//! The operator form: exposure parameters as command-line flags.

use clap::Args;
use easy_aalm_core::params::MAX_AGE_YEARS;
use easy_aalm_core::{AgeRange, ExposureParams, FoodUnit, Sex, WaterUnit};

#[derive(Args, Debug, Clone, PartialEq)]
pub struct FormArgs {
    /// Simulation start age (years)
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=MAX_AGE_YEARS as i64))]
    pub age_start: u32,

    /// Simulation end age (years)
    #[arg(long, default_value_t = MAX_AGE_YEARS, value_parser = clap::value_parser!(u32).range(0..=MAX_AGE_YEARS as i64))]
    pub age_end: u32,

    /// Sex: male or female
    #[arg(long, default_value = "male")]
    pub sex: Sex,

    /// Dietary lead, in --food-unit [default: 5.0 ug-day, 0.5 ug-kg-day, 0.1 ppm]
    #[arg(long, value_name = "AMOUNT")]
    pub food: Option<f64>,

    /// Food unit: ug-day, ug-kg-day or ppm
    #[arg(long, default_value = "ug-day")]
    pub food_unit: FoodUnit,

    /// Drinking-water lead, in --water-unit [default: 1.0 ug-l, 0.1 ug-kg-day]
    #[arg(long, value_name = "AMOUNT")]
    pub water: Option<f64>,

    /// Water unit: ug-l (PPB) or ug-kg-day
    #[arg(long, default_value = "ug-l")]
    pub water_unit: WaterUnit,

    /// Include soil exposure, optionally with an XRF reading in PPM [bare flag: 200]
    #[arg(long, value_name = "PPM", num_args = 0..=1, default_missing_value = "200")]
    pub soil: Option<u32>,

    /// Include dust exposure, optionally with an XRF reading in PPM [bare flag: 150]
    #[arg(long, value_name = "PPM", num_args = 0..=1, default_missing_value = "150")]
    pub dust: Option<u32>,
}

impl Default for FormArgs {
    fn default() -> Self {
        Self {
            age_start: 0,
            age_end: MAX_AGE_YEARS,
            sex: Sex::default(),
            food: None,
            food_unit: FoodUnit::default(),
            water: None,
            water_unit: WaterUnit::default(),
            soil: None,
            dust: None,
        }
    }
}

impl FormArgs {
    /// Fill unit-dependent defaults. Range checks happen in the pipeline.
    pub fn to_params(&self) -> ExposureParams {
        ExposureParams {
            age: AgeRange::new(self.age_start, self.age_end),
            sex: self.sex,
            food_value: self.food.unwrap_or_else(|| self.food_unit.default_value()),
            food_unit: self.food_unit,
            water_value: self.water.unwrap_or_else(|| self.water_unit.default_value()),
            water_unit: self.water_unit,
            soil_ppm: self.soil,
            dust_ppm: self.dust,
        }
    }
}
