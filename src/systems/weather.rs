use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    farm::FarmState,
    rng::SystemRng,
    weather::{roll_temperature, Weather},
};

/// Rolls tomorrow's weather and temperature, then settles moisture.
pub struct WeatherSystem;

impl WeatherSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WeatherSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for WeatherSystem {
    fn name(&self) -> &str {
        "weather"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        farm: &mut FarmState,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let weather = Weather::roll(rng);
        let temperature = roll_temperature(rng);
        farm.moisture = weather.next_moisture(farm.moisture);
        farm.weather = weather;
        farm.temperature = temperature;
        Ok(())
    }
}
