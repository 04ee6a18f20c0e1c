//! Operator how-to shown by `easy-aalm guide`.

use easy_aalm_core::params::{DEFAULT_DUST_PPM, DEFAULT_SOIL_PPM, MAX_AGE_YEARS, MAX_SOIL_DUST_PPM};
use easy_aalm_core::{FoodUnit, WaterUnit};

const HOW_TO: &str = "\
Easy AALM - Lead Exposure Calculator

Estimate Blood Lead Levels (BLL) from environmental measurements:
  - XRF measurements of soil/dust
  - Lab results for food and water samples

Steps:
  1. Set the age range (--age-start/--age-end). Typically 0-7 years for children.
  2. Choose sex (--sex male|female). It affects body weight parameters.
  3. Enter lead exposure:
       Food:  intake per day from diet (--food, --food-unit)
       Water: concentration in tap water (--water, --water-unit)
       Soil/Dust (optional): PPM from XRF readings (--soil, --dust)
  4. Run `easy-aalm run` to start the simulation.
  5. Read the headline metrics; open the SVG chart for the BLL curve.
  6. Use the daily and weekly CSV exports for further analysis.
";

const SCENARIOS: &str = "\
Example scenarios:
  Low exposure: 2 μg/day food, 1 μg/L water               -> BLL ~1-2 μg/dL
      easy-aalm run --age-end 7 --food 2 --water 1
  Moderate:     5 μg/day food, 5 μg/L water               -> BLL ~2-3 μg/dL
      easy-aalm run --age-end 7 --food 5 --water 5
  High:         10 μg/day food, 15 μg/L water, 500 PPM soil -> BLL >5 μg/dL
      easy-aalm run --age-end 7 --food 10 --water 15 --soil 500
";

fn unit_table() -> String {
    let mut out = String::from("Units:\n");
    for unit in FoodUnit::ALL {
        let (lo, hi) = unit.range();
        out.push_str(&format!(
            "  food  {:<10} {:<10} {lo}-{hi}, default {}\n",
            unit.to_string(),
            unit.label(),
            unit.default_value()
        ));
    }
    for unit in WaterUnit::ALL {
        let (lo, hi) = unit.range();
        out.push_str(&format!(
            "  water {:<10} {:<10} {lo}-{hi}, default {}\n",
            unit.to_string(),
            unit.label(),
            unit.default_value()
        ));
    }
    out.push_str(&format!(
        "  soil/dust PPM 0-{MAX_SOIL_DUST_PPM}, bare flag defaults {DEFAULT_SOIL_PPM}/{DEFAULT_DUST_PPM}\n"
    ));
    out.push_str(&format!("  age 0-{MAX_AGE_YEARS} years\n"));
    out
}

pub fn guide_text() -> String {
    format!(
        "{HOW_TO}\n{}\n{SCENARIOS}\nBased on EPA All-Ages Lead Model (AALM) v3.1\n",
        unit_table()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guide_lists_units_and_scenarios() {
        let text = guide_text();
        assert!(text.contains("food  ppm"));
        assert!(text.contains("water ug-l"));
        assert!(text.contains("Low exposure"));
        assert!(text.contains("--soil 500"));
        assert!(text.contains("bare flag defaults 200/150"));
    }
}
