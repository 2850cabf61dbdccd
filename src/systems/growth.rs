use anyhow::Result;
use tracing::{debug, warn};

use crate::{
    engine::{System, SystemContext},
    farm::FarmState,
    rng::SystemRng,
};

/// Ages every growing crop by one day and rescores its yield against the
/// weather that was just rolled.
pub struct GrowthSystem;

impl GrowthSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GrowthSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for GrowthSystem {
    fn name(&self) -> &str {
        "growth"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        farm: &mut FarmState,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let conditions = farm.conditions();
        for cell in farm.grid.occupied_mut() {
            if cell.ready {
                continue;
            }
            let Some(crop) = ctx.catalog.get(&cell.kind) else {
                warn!(kind = %cell.kind, "crop missing from catalog; skipping growth");
                continue;
            };
            if cell.grow(crop, &conditions) {
                debug!(day = ctx.day, kind = %cell.kind, yield_value = cell.yield_value, "crop ready");
                farm.ledger.newly_ready.push(cell.kind.clone());
            }
        }
        Ok(())
    }
}
