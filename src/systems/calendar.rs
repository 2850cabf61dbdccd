use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    farm::FarmState,
    rng::SystemRng,
};

pub struct CalendarSystem;

impl CalendarSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CalendarSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CalendarSystem {
    fn name(&self) -> &str {
        "calendar"
    }

    fn run(
        &mut self,
        _ctx: &SystemContext,
        farm: &mut FarmState,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        farm.day = farm.day.saturating_add(1);
        Ok(())
    }
}
