use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    crops::{CropCatalog, CropKind},
    farm::{DayLedger, FarmState},
    rng::{RngManager, SystemRng},
    systems::{CalendarSystem, GrowthSystem, LoanInterestSystem, WeatherSystem},
    weather::Weather,
};

#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    /// Fixed seed for reproducible weather. Drawn from entropy when absent.
    pub seed: Option<u64>,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    /// Loan interest, weather, growth, then the calendar: the order a day
    /// advances in.
    pub fn standard(settings: EngineSettings) -> Self {
        Self::new(settings)
            .with_system(LoanInterestSystem::new())
            .with_system(WeatherSystem::new())
            .with_system(GrowthSystem::new())
            .with_system(CalendarSystem::new())
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn build(self) -> Engine {
        let rng = match self.settings.seed {
            Some(seed) => RngManager::new(seed),
            None => RngManager::from_entropy(),
        };
        Engine {
            rng,
            systems: self.systems,
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
}

impl Engine {
    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|system| system.name()).collect()
    }

    pub fn advance_day(
        &mut self,
        farm: &mut FarmState,
        catalog: &CropCatalog,
    ) -> Result<DaySummary> {
        farm.ledger = DayLedger::default();
        let ctx = SystemContext {
            day: farm.day,
            catalog,
        };
        for system in &mut self.systems {
            let start = Instant::now();
            let mut rng_stream = self.rng.stream(system.name());
            system.run(&ctx, farm, &mut rng_stream)?;
            debug!(
                system = system.name(),
                elapsed_us = start.elapsed().as_micros() as u64,
                "system ran"
            );
        }

        let summary = DaySummary {
            day: farm.day,
            weather: farm.weather,
            temperature: farm.temperature,
            moisture: farm.moisture,
            interest_charged: farm.ledger.interest_charged,
            newly_ready: farm.ledger.newly_ready.clone(),
            ready_total: farm.grid.ready_count(),
        };
        info!(
            day = summary.day,
            weather = %summary.weather,
            temperature = summary.temperature,
            moisture = summary.moisture,
            ready = summary.ready_total,
            "day advanced"
        );
        Ok(summary)
    }

    pub fn run(
        &mut self,
        farm: &mut FarmState,
        catalog: &CropCatalog,
        days: u64,
    ) -> Result<Vec<DaySummary>> {
        (0..days)
            .map(|_| self.advance_day(farm, catalog))
            .collect()
    }
}

pub struct SystemContext<'a> {
    /// Day counter at the start of the advance.
    pub day: u64,
    pub catalog: &'a CropCatalog,
}

pub trait System: Send {
    fn name(&self) -> &str;
    fn run(
        &mut self,
        ctx: &SystemContext,
        farm: &mut FarmState,
        rng: &mut SystemRng<'_>,
    ) -> Result<()>;
}

/// Outcome of one day-advance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub day: u64,
    pub weather: Weather,
    pub temperature: u32,
    pub moisture: u32,
    pub interest_charged: u64,
    /// Crops that became ready during this advance, in row-major order.
    pub newly_ready: Vec<CropKind>,
    pub ready_total: usize,
}
