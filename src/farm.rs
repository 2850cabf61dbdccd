use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::StartingState;
use crate::crops::{CropCatalog, CropDefinition, CropKind};
use crate::weather::{Conditions, Weather};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FarmError {
    #[error("select a crop first")]
    InvalidSelection,
    #[error("not enough money: need ${cost}, have ${available}")]
    InsufficientFunds { cost: u64, available: u64 },
    #[error("cell ({row}, {col}) is outside the field")]
    InvalidCell { row: usize, col: usize },
    #[error("a loan of ${amount} is more than the bank can lend")]
    LoanTooLarge { amount: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropCell {
    pub kind: CropKind,
    pub growth_stage: u32,
    pub ready: bool,
    pub yield_value: f64,
}

impl CropCell {
    pub fn seedling(kind: CropKind) -> Self {
        Self {
            kind,
            growth_stage: 0,
            ready: false,
            yield_value: 1.0,
        }
    }

    /// Advances one day. Returns true when this call made the crop ready.
    pub(crate) fn grow(&mut self, crop: &CropDefinition, conditions: &Conditions) -> bool {
        if self.ready {
            return false;
        }
        self.growth_stage = (self.growth_stage + 1).min(crop.growth_time);
        self.yield_value = crate::weather::yield_multiplier(crop, conditions);
        if self.growth_stage >= crop.growth_time {
            self.ready = true;
        }
        self.ready
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<Option<CropCell>>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn index(&self, row: usize, col: usize) -> Result<usize, FarmError> {
        if row < self.rows && col < self.cols {
            Ok(row * self.cols + col)
        } else {
            Err(FarmError::InvalidCell { row, col })
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Result<Option<&CropCell>, FarmError> {
        let idx = self.index(row, col)?;
        Ok(self.cells[idx].as_ref())
    }

    pub(crate) fn slot_mut(
        &mut self,
        row: usize,
        col: usize,
    ) -> Result<&mut Option<CropCell>, FarmError> {
        let idx = self.index(row, col)?;
        Ok(&mut self.cells[idx])
    }

    /// Occupied cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, &CropCell)> {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(idx, cell)| cell.as_ref().map(|c| (idx / cols, idx % cols, c)))
    }

    pub(crate) fn occupied_mut(&mut self) -> impl Iterator<Item = &mut CropCell> {
        self.cells.iter_mut().filter_map(Option::as_mut)
    }

    pub fn ready_count(&self) -> usize {
        self.occupied().filter(|(_, _, cell)| cell.ready).count()
    }
}

/// What the systems recorded during the most recent day-advance.
#[derive(Debug, Default, Clone)]
pub struct DayLedger {
    pub interest_charged: u64,
    pub newly_ready: Vec<CropKind>,
}

#[derive(Debug, Clone)]
pub struct FarmState {
    pub(crate) day: u64,
    pub(crate) money: u64,
    pub(crate) loans: u64,
    pub(crate) weather: Weather,
    pub(crate) temperature: u32,
    pub(crate) moisture: u32,
    pub(crate) temp_bonus: f64,
    pub(crate) moisture_bonus: f64,
    pub(crate) grid: Grid,
    pub(crate) ledger: DayLedger,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlantReceipt {
    pub kind: CropKind,
    pub cost: u64,
    /// The crop that was sitting in the cell before, if any.
    pub replaced: Option<CropCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarvestReceipt {
    pub kind: CropKind,
    pub payout: u64,
}

impl FarmState {
    pub fn new(start: &StartingState, rows: usize, cols: usize) -> Self {
        Self {
            day: start.day,
            money: start.money,
            loans: start.loans,
            weather: start.weather,
            temperature: start.temperature,
            moisture: start.moisture,
            temp_bonus: start.temp_bonus,
            moisture_bonus: start.moisture_bonus,
            grid: Grid::new(rows, cols),
            ledger: DayLedger::default(),
        }
    }

    pub fn day(&self) -> u64 {
        self.day
    }

    pub fn money(&self) -> u64 {
        self.money
    }

    pub fn loans(&self) -> u64 {
        self.loans
    }

    pub fn weather(&self) -> Weather {
        self.weather
    }

    pub fn temperature(&self) -> u32 {
        self.temperature
    }

    pub fn moisture(&self) -> u32 {
        self.moisture
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn conditions(&self) -> Conditions {
        Conditions {
            weather: self.weather,
            temperature: self.temperature,
            moisture: self.moisture,
            temp_bonus: self.temp_bonus,
            moisture_bonus: self.moisture_bonus,
        }
    }

    /// Plants over whatever occupies the cell. The previous crop, if any, is
    /// handed back in the receipt and its cost is not refunded.
    pub fn plant(
        &mut self,
        catalog: &CropCatalog,
        row: usize,
        col: usize,
        kind: Option<&CropKind>,
    ) -> Result<PlantReceipt, FarmError> {
        let crop = kind
            .and_then(|kind| catalog.get(kind))
            .ok_or(FarmError::InvalidSelection)?;
        self.grid.index(row, col)?;
        if self.money < crop.cost {
            return Err(FarmError::InsufficientFunds {
                cost: crop.cost,
                available: self.money,
            });
        }

        let slot = self.grid.slot_mut(row, col)?;
        let replaced = slot.replace(CropCell::seedling(crop.kind.clone()));
        self.money -= crop.cost;
        Ok(PlantReceipt {
            kind: crop.kind.clone(),
            cost: crop.cost,
            replaced,
        })
    }

    /// Returns `Ok(None)` when the cell is empty or still growing.
    pub fn harvest(
        &mut self,
        catalog: &CropCatalog,
        row: usize,
        col: usize,
    ) -> Result<Option<HarvestReceipt>, FarmError> {
        let slot = self.grid.slot_mut(row, col)?;
        let Some(cell) = slot.as_ref().filter(|cell| cell.ready) else {
            return Ok(None);
        };
        let Some(crop) = catalog.get(&cell.kind) else {
            return Ok(None);
        };
        let payout = harvest_value(crop, cell.yield_value);
        let kind = cell.kind.clone();
        *slot = None;
        self.money = self.money.saturating_add(payout);
        Ok(Some(HarvestReceipt { kind, payout }))
    }

    /// Adds `amount` to both the wallet and the balance, or to neither.
    pub fn take_loan(&mut self, amount: u64) -> Result<u64, FarmError> {
        let (Some(loans), Some(money)) = (
            self.loans.checked_add(amount),
            self.money.checked_add(amount),
        ) else {
            return Err(FarmError::LoanTooLarge { amount });
        };
        self.loans = loans;
        self.money = money;
        Ok(amount)
    }

    /// Pays down as much of `amount` as both the balance and the wallet allow.
    pub fn repay_loan(&mut self, amount: u64) -> u64 {
        let repaid = amount.min(self.loans).min(self.money);
        self.loans -= repaid;
        self.money -= repaid;
        repaid
    }

    pub fn analyze(&self, catalog: &CropCatalog) -> FarmAnalysis {
        let mut planted_count = 0;
        let mut ready_count = 0;
        let mut kinds = BTreeSet::new();
        let mut potential_income = 0.0;
        for (_, _, cell) in self.grid.occupied() {
            planted_count += 1;
            kinds.insert(&cell.kind);
            if cell.ready {
                ready_count += 1;
                if let Some(crop) = catalog.get(&cell.kind) {
                    potential_income += crop.value as f64 * cell.yield_value;
                }
            }
        }
        FarmAnalysis {
            planted_count,
            ready_count,
            diversity: kinds.len(),
            available_plots: self.grid.len() - planted_count,
            potential_income,
        }
    }

    pub fn snapshot(&self, catalog: &CropCatalog) -> FarmSnapshot {
        let grid = (0..self.grid.rows())
            .map(|row| {
                (0..self.grid.cols())
                    .map(|col| {
                        let cell = self.grid.cells[row * self.grid.cols() + col].as_ref()?;
                        let growth_time = catalog
                            .get(&cell.kind)
                            .map(|crop| crop.growth_time)
                            .unwrap_or(cell.growth_stage);
                        Some(CellSnapshot {
                            kind: cell.kind.clone(),
                            growth_stage: cell.growth_stage,
                            growth_time,
                            ready: cell.ready,
                            yield_value: cell.yield_value,
                        })
                    })
                    .collect()
            })
            .collect();
        FarmSnapshot {
            day: self.day,
            money: self.money,
            loans: self.loans,
            weather: self.weather,
            temperature: self.temperature,
            moisture: self.moisture,
            temp_bonus: self.temp_bonus,
            moisture_bonus: self.moisture_bonus,
            grid,
            analysis: self.analyze(catalog),
        }
    }
}

pub fn harvest_value(crop: &CropDefinition, yield_value: f64) -> u64 {
    (crop.value as f64 * yield_value).round().max(0.0) as u64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmAnalysis {
    pub planted_count: usize,
    pub ready_count: usize,
    pub diversity: usize,
    pub available_plots: usize,
    pub potential_income: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub kind: CropKind,
    pub growth_stage: u32,
    pub growth_time: u32,
    pub ready: bool,
    pub yield_value: f64,
}

/// Read-only copy of the farm handed to the UI and the advisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmSnapshot {
    pub day: u64,
    pub money: u64,
    pub loans: u64,
    pub weather: Weather,
    pub temperature: u32,
    pub moisture: u32,
    pub temp_bonus: f64,
    pub moisture_bonus: f64,
    pub grid: Vec<Vec<Option<CellSnapshot>>>,
    pub analysis: FarmAnalysis,
}
