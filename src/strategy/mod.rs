//! Cycle actions
//!
//! A [`Strategy`] decides what a cycle does (buy, sell or compound) and runs it with
//! bounded retries.

mod compound;
mod volume;

pub use compound::{CompoundStrategy, CompoundSummary};
pub use volume::{VolumeStrategy, VolumeTrade};

use crate::chain::{Farm, Router};
use crate::config::{Config, StrategyConfig};
use crate::retry::{retry_immediately, Attempt};
use crate::swap::TradeSide;
use crate::Result;
use serde::Serialize;

/// What a cycle does once connected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Trade(TradeSide),
    Compound,
}

/// Successful action output, as it appears in the report
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ActionReport {
    Trade(VolumeTrade),
    Compound(CompoundSummary),
}

pub enum Strategy {
    Volume(VolumeStrategy),
    Compound(CompoundStrategy),
}

impl Strategy {
    pub fn from_config(config: &Config) -> Self {
        match &config.strategy {
            StrategyConfig::Volume(volume) => Strategy::Volume(VolumeStrategy::new(
                volume.clone(),
                config.deadline_secs,
                &config.explorer_tx_url,
            )),
            StrategyConfig::Compound(compound) => Strategy::Compound(CompoundStrategy::new(
                compound.clone(),
                config.deadline_secs,
                &config.explorer_tx_url,
            )),
        }
    }

    /// Action for the cycle with the given persisted count
    pub fn action_for(&self, count: u64) -> Action {
        match self {
            Strategy::Volume(volume) => Action::Trade(volume.side_for(count)),
            Strategy::Compound(_) => Action::Compound,
        }
    }

    /// One attempt at `action`
    async fn run_once<S>(&self, session: &S, action: Action) -> Result<ActionReport>
    where
        S: Router + Farm + ?Sized,
    {
        match (self, action) {
            (Strategy::Volume(volume), Action::Trade(side)) => {
                volume.trade_once(session, side).await.map(ActionReport::Trade)
            }
            (Strategy::Compound(compound), Action::Compound) => {
                compound.compound_once(session).await.map(ActionReport::Compound)
            }
            (_, action) => Err(crate::Error::Config(format!(
                "Action {:?} is not supported by the configured strategy",
                action
            ))),
        }
    }

    /// Run `action` up to `max_attempts` times
    pub async fn execute<S>(
        &self,
        session: &S,
        action: Action,
        max_attempts: u32,
    ) -> Attempt<ActionReport>
    where
        S: Router + Farm + ?Sized,
    {
        retry_immediately(max_attempts, |_| self.run_once(session, action)).await
    }
}
