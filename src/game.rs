//! The game controller: one owner for everything the UI can see.
//!
//! Every method is a complete transition. A method that returns an error has
//! left the farm untouched, though it may still have queued a notification
//! telling the player why.

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    chat::{ChatTranscript, Role},
    config::FarmConfig,
    crops::{CropCatalog, CropKind},
    engine::{DaySummary, Engine, EngineBuilder, EngineSettings},
    farm::{FarmAnalysis, FarmError, FarmSnapshot, FarmState, HarvestReceipt, PlantReceipt},
    notifications::{Notification, NotificationKind, NotificationQueue},
};

/// Temperatures above this trigger the heat warning.
pub const HEAT_ALERT_F: u32 = 90;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error(transparent)]
    Farm(#[from] FarmError),
    #[error("ask the advisor a question first")]
    EmptyQuestion,
    #[error("the advisor is still answering the previous question")]
    AdviceInFlight,
}

/// What a click on a grid cell ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum CellAction {
    Planted(PlantReceipt),
    Harvested(HarvestReceipt),
}

/// Everything the UI renders, in one serializable value.
#[derive(Debug, Clone, Serialize)]
pub struct StateEnvelope {
    pub name: String,
    pub snapshot: FarmSnapshot,
    pub catalog: CropCatalog,
    pub selected: Option<CropKind>,
    pub notifications: Vec<Notification>,
    pub transcript: ChatTranscript,
    pub advice_pending: bool,
}

pub struct Game {
    name: String,
    catalog: CropCatalog,
    engine: Engine,
    farm: FarmState,
    notifications: NotificationQueue,
    transcript: ChatTranscript,
    selected: Option<CropKind>,
    advice_pending: bool,
}

impl Game {
    pub fn new(config: &FarmConfig) -> Self {
        let engine = EngineBuilder::standard(EngineSettings { seed: config.seed }).build();
        info!(
            seed = engine.seed(),
            systems = ?engine.system_names(),
            "farm engine ready"
        );
        Self {
            name: config.display_name().to_string(),
            catalog: config.catalog(),
            engine,
            farm: FarmState::new(&config.start, config.grid.rows, config.grid.cols),
            notifications: NotificationQueue::new(config.notification_ttl()),
            transcript: ChatTranscript::new(),
            selected: None,
            advice_pending: false,
        }
    }

    pub fn catalog(&self) -> &CropCatalog {
        &self.catalog
    }

    pub fn farm(&self) -> &FarmState {
        &self.farm
    }

    pub fn selected(&self) -> Option<&CropKind> {
        self.selected.as_ref()
    }

    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    pub fn advice_pending(&self) -> bool {
        self.advice_pending
    }

    pub fn select_crop(&mut self, kind: CropKind) -> Result<(), GameError> {
        if self.catalog.get(&kind).is_none() {
            return Err(FarmError::InvalidSelection.into());
        }
        self.selected = Some(kind);
        Ok(())
    }

    /// Harvests a ready crop, otherwise plants the selected kind.
    pub fn click_cell(&mut self, row: usize, col: usize) -> Result<CellAction, GameError> {
        let ready = self
            .farm
            .grid()
            .get(row, col)?
            .is_some_and(|cell| cell.ready);
        if ready {
            if let Some(receipt) = self.harvest(row, col)? {
                return Ok(CellAction::Harvested(receipt));
            }
        }
        let kind = self.selected.clone();
        self.plant(row, col, kind.as_ref()).map(CellAction::Planted)
    }

    pub fn plant(
        &mut self,
        row: usize,
        col: usize,
        kind: Option<&CropKind>,
    ) -> Result<PlantReceipt, GameError> {
        match self.farm.plant(&self.catalog, row, col, kind) {
            Ok(receipt) => {
                if let Some(previous) = &receipt.replaced {
                    warn!(row, col, discarded = %previous.kind, "planted over an existing crop");
                }
                info!(row, col, kind = %receipt.kind, cost = receipt.cost, "planted");
                self.notify(format!("🌱 Planted {}!", receipt.kind), NotificationKind::Success);
                Ok(receipt)
            }
            Err(FarmError::InvalidSelection) => {
                self.notify("🌱 Select a crop first!", NotificationKind::Warning);
                Err(FarmError::InvalidSelection.into())
            }
            Err(FarmError::InsufficientFunds { cost, available }) => {
                self.notify(
                    format!("❌ Not enough money! Need ${cost}"),
                    NotificationKind::Error,
                );
                Err(FarmError::InsufficientFunds { cost, available }.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn harvest(&mut self, row: usize, col: usize) -> Result<Option<HarvestReceipt>, GameError> {
        let receipt = self.farm.harvest(&self.catalog, row, col)?;
        if let Some(receipt) = &receipt {
            info!(row, col, kind = %receipt.kind, payout = receipt.payout, "harvested");
            self.notify(
                format!("💰 Harvested {} for ${}!", receipt.kind, receipt.payout),
                NotificationKind::Success,
            );
        }
        Ok(receipt)
    }

    pub fn next_day(&mut self) -> Result<DaySummary> {
        let summary = self.engine.advance_day(&mut self.farm, &self.catalog)?;

        if summary.interest_charged > 0 {
            self.notify(
                format!("💸 Loan interest: ${}", summary.interest_charged),
                NotificationKind::Warning,
            );
        }
        if summary.temperature > HEAT_ALERT_F {
            self.notify(
                "🌡️ High temperature alert! Consider drought-resistant crops.",
                NotificationKind::Warning,
            );
            let growing = self
                .farm
                .grid()
                .occupied()
                .any(|(_, _, cell)| !cell.ready);
            if growing {
                self.notify(
                    "💧 Water needs have increased for all crops.",
                    NotificationKind::Info,
                );
            }
        }
        for kind in &summary.newly_ready {
            self.notify(
                format!("🌟 {kind} is ready to harvest!"),
                NotificationKind::Success,
            );
        }
        if summary.ready_total > 0 {
            self.notify(
                format!(
                    "✨ You have {} crops ready to harvest!",
                    summary.ready_total
                ),
                NotificationKind::Success,
            );
        }
        Ok(summary)
    }

    pub fn take_loan(&mut self, amount: u64) -> Result<u64, GameError> {
        if amount == 0 {
            return Ok(0);
        }
        let borrowed = self.farm.take_loan(amount)?;
        info!(amount = borrowed, balance = self.farm.loans(), "loan taken");
        self.notify(format!("🏦 Borrowed ${borrowed}"), NotificationKind::Info);
        Ok(borrowed)
    }

    pub fn repay_loan(&mut self, amount: u64) -> u64 {
        let repaid = self.farm.repay_loan(amount);
        if repaid > 0 {
            info!(amount = repaid, balance = self.farm.loans(), "loan repaid");
            self.notify(format!("🏦 Repaid ${repaid}"), NotificationKind::Info);
        }
        repaid
    }

    /// Records the question and hands back the state the advisor should see.
    /// Only one question may be outstanding at a time.
    pub fn begin_advice(&mut self, question: &str) -> Result<FarmSnapshot, GameError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(GameError::EmptyQuestion);
        }
        if self.advice_pending {
            return Err(GameError::AdviceInFlight);
        }
        self.transcript.push(Role::User, question);
        self.advice_pending = true;
        Ok(self.snapshot())
    }

    pub fn finish_advice(&mut self, advice: impl Into<String>) {
        self.transcript.push(Role::Assistant, advice);
        self.advice_pending = false;
    }

    pub fn snapshot(&self) -> FarmSnapshot {
        self.farm.snapshot(&self.catalog)
    }

    pub fn analyze(&self) -> FarmAnalysis {
        self.farm.analyze(&self.catalog)
    }

    pub fn notify(&mut self, message: impl Into<String>, kind: NotificationKind) {
        self.notifications.push(message, kind);
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.active()
    }

    pub fn sweep_notifications(&mut self) -> usize {
        self.notifications.sweep()
    }

    pub fn envelope(&self) -> StateEnvelope {
        StateEnvelope {
            name: self.name.clone(),
            snapshot: self.snapshot(),
            catalog: self.catalog.clone(),
            selected: self.selected.clone(),
            notifications: self.notifications(),
            transcript: self.transcript.clone(),
            advice_pending: self.advice_pending,
        }
    }
}
