use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::crops::CropDefinition;

pub const TEMPERATURE_MIN_F: u32 = 55;
pub const TEMPERATURE_MAX_F: u32 = 95;
pub const RAIN_MOISTURE: u32 = 80;
pub const WINDY_MOISTURE_FLOOR: u32 = 20;
pub const SUNNY_MOISTURE_FLOOR: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    #[default]
    Sunny,
    Rainy,
    Windy,
}

impl Weather {
    pub const ALL: [Weather; 3] = [Weather::Sunny, Weather::Rainy, Weather::Windy];

    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Weather::Sunny => "sunny",
            Weather::Rainy => "rainy",
            Weather::Windy => "windy",
        }
    }

    /// Moisture after a day of this weather, given yesterday's moisture.
    pub fn next_moisture(self, previous: u32) -> u32 {
        match self {
            Weather::Rainy => RAIN_MOISTURE,
            Weather::Windy => previous.saturating_sub(20).max(WINDY_MOISTURE_FLOOR),
            Weather::Sunny => previous.saturating_sub(10).max(SUNNY_MOISTURE_FLOOR),
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn roll_temperature<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.gen_range(TEMPERATURE_MIN_F..=TEMPERATURE_MAX_F)
}

/// The conditions a crop is scored against on a given day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditions {
    pub weather: Weather,
    pub temperature: u32,
    pub moisture: u32,
    pub temp_bonus: f64,
    pub moisture_bonus: f64,
}

pub fn yield_multiplier(crop: &CropDefinition, conditions: &Conditions) -> f64 {
    let temperature_factor = if crop.temp_range.contains(conditions.temperature) {
        1.2
    } else if conditions.temperature < crop.temp_range.min {
        0.5
    } else {
        0.7
    };

    let moisture_factor = match conditions.weather {
        Weather::Rainy if conditions.moisture > crop.water_needs => 0.8,
        Weather::Sunny if conditions.moisture < crop.water_needs => 0.7,
        _ => 1.1,
    };

    let mut multiplier = 1.0;
    multiplier *= temperature_factor * conditions.temp_bonus;
    multiplier *= moisture_factor * conditions.moisture_bonus;
    multiplier
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::crops::{CropCatalog, CropKind};

    fn corn() -> CropDefinition {
        CropCatalog::default()
            .get(&CropKind::from("CORN"))
            .cloned()
            .expect("corn is in the default catalog")
    }

    fn conditions(weather: Weather, temperature: u32, moisture: u32) -> Conditions {
        Conditions {
            weather,
            temperature,
            moisture,
            temp_bonus: 1.0,
            moisture_bonus: 1.0,
        }
    }

    #[test]
    fn moisture_transitions() {
        assert_eq!(Weather::Rainy.next_moisture(60), 80);
        assert_eq!(Weather::Rainy.next_moisture(20), 80);
        assert_eq!(Weather::Windy.next_moisture(60), 40);
        assert_eq!(Weather::Windy.next_moisture(30), 20);
        assert_eq!(Weather::Windy.next_moisture(5), 20);
        assert_eq!(Weather::Sunny.next_moisture(60), 50);
        assert_eq!(Weather::Sunny.next_moisture(35), 30);
    }

    #[test]
    fn ideal_conditions_reward_the_crop() {
        let value = yield_multiplier(&corn(), &conditions(Weather::Windy, 75, 60));
        assert!((value - 1.2 * 1.1).abs() < 1e-9);
    }

    #[test]
    fn cold_and_dry_sun_compound() {
        let value = yield_multiplier(&corn(), &conditions(Weather::Sunny, 55, 40));
        assert!((value - 0.5 * 0.7).abs() < 1e-9);
    }

    #[test]
    fn hot_and_waterlogged() {
        let value = yield_multiplier(&corn(), &conditions(Weather::Rainy, 90, 80));
        assert!((value - 0.7 * 0.8).abs() < 1e-9);
    }

    #[test]
    fn bonuses_scale_each_factor() {
        let mut c = conditions(Weather::Windy, 75, 60);
        c.temp_bonus = 1.5;
        c.moisture_bonus = 2.0;
        let value = yield_multiplier(&corn(), &c);
        assert!((value - 1.2 * 1.5 * 1.1 * 2.0).abs() < 1e-9);
    }

    #[test]
    fn rolls_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let t = roll_temperature(&mut rng);
            assert!((TEMPERATURE_MIN_F..=TEMPERATURE_MAX_F).contains(&t));
            seen.insert(Weather::roll(&mut rng));
        }
        assert_eq!(seen.len(), 3);
    }
}
