use anyhow::Result;
use tracing::debug;

use crate::{
    engine::{System, SystemContext},
    farm::FarmState,
    rng::SystemRng,
};

/// Simple interest charged on the outstanding balance each day.
pub const DAILY_INTEREST_RATE: f64 = 0.01;

pub struct LoanInterestSystem;

impl LoanInterestSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoanInterestSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for LoanInterestSystem {
    fn name(&self) -> &str {
        "loan_interest"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        farm: &mut FarmState,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        if farm.loans == 0 {
            return Ok(());
        }
        let interest = (farm.loans as f64 * DAILY_INTEREST_RATE).round() as u64;
        farm.loans = farm.loans.saturating_add(interest);
        farm.ledger.interest_charged = interest;
        debug!(day = ctx.day, interest, balance = farm.loans, "loan interest accrued");
        Ok(())
    }
}
