//! Trade cycle controller
//!
//! A cycle is: connect, run the strategy action with bounded retries, disconnect,
//! schedule the successor, persist the record, send the report. Every failure inside
//! the cycle ends up in the report; nothing escapes, and the successor is always
//! scheduled.

use crate::chain::Connector;
use crate::config::{Config, ScheduleConfig};
use crate::random;
use crate::report::{ReportBuffer, ReportSink};
use crate::retry::Attempt;
use crate::scheduler::{next_run, plan_startup, Scheduler, Startup};
use crate::state::{StateStore, TradeRecord};
use crate::strategy::Strategy;
use crate::Result;
use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use tracing::Instrument;
use uuid::Uuid;

/// How a cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Succeeded { attempts: u32 },
    /// `attempts` is 0 when the connection itself failed
    Failed { attempts: u32, error: String },
}

pub struct Bot<C: Connector, S: ReportSink> {
    connector: C,
    sink: S,
    strategy: Strategy,
    store: StateStore,
    record: TradeRecord,
    report: ReportBuffer,
    scheduler: Scheduler,
    schedule: ScheduleConfig,
    max_attempts: u32,
    report_utc_offset_hours: i32,
    wallet: Address,
}

impl<C: Connector, S: ReportSink> Bot<C, S> {
    /// Build the controller and load (or create) the persisted record
    pub async fn new(config: &Config, connector: C, sink: S, wallet: Address) -> Result<Self> {
        let store = StateStore::new(&config.state_file);
        let record = store.load_or_create().await?;
        tracing::info!(
            path = %store.path().display(),
            count = record.count,
            next_trade = ?record.next_trade,
            "Trade record loaded"
        );

        Ok(Self {
            connector,
            sink,
            strategy: Strategy::from_config(config),
            store,
            record,
            report: ReportBuffer::new(),
            scheduler: Scheduler::new(),
            schedule: config.schedule.clone(),
            max_attempts: config.max_attempts,
            report_utc_offset_hours: config.report_utc_offset_hours,
            wallet,
        })
    }

    pub fn record(&self) -> &TradeRecord {
        &self.record
    }

    /// When the next cycle will fire, if one is armed
    pub fn pending_run(&self) -> Option<DateTime<Utc>> {
        self.scheduler.pending()
    }

    /// Re-arm a persisted future run, or trade right away
    pub async fn resume(&mut self) {
        match plan_startup(&self.record, Utc::now()) {
            Startup::Restore(when) => {
                tracing::info!(next_trade = %when, "Restored trade");
                self.scheduler.schedule_at(when);
            }
            Startup::RunNow => {
                self.run_cycle().await;
            }
        }
    }

    /// Resume, then run every scheduled cycle as it falls due
    pub async fn run(&mut self) {
        self.resume().await;
        while self.scheduler.wait().await.is_some() {
            self.run_cycle().await;
        }
        tracing::warn!("No run scheduled, stopping");
    }

    /// Run one full cycle
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let span = tracing::info_span!(
            "trade_cycle",
            cycle_id = %Uuid::new_v4(),
            count = self.record.count
        );
        self.cycle(Utc::now()).instrument(span).await
    }

    async fn cycle(&mut self, started: DateTime<Utc>) -> CycleOutcome {
        self.report.line("--- AMMTrade Report ---");
        self.report.line(format!("By: {}", self.wallet));

        let action = self.strategy.action_for(self.record.count);
        self.record.count += 1;
        tracing::info!(?action, "Starting trade cycle");

        let outcome = match self.connector.connect().await {
            Ok(session) => {
                let attempt = self
                    .strategy
                    .execute(&session, action, self.max_attempts)
                    .await;
                self.connector.disconnect(session);

                let attempts = attempt.attempts();
                match attempt {
                    Attempt::Success { value, .. } => {
                        tracing::info!(attempts, "AMMTrade successful");
                        self.report.push(&value);
                        self.record.previous_trade = Some(started);
                        CycleOutcome::Succeeded { attempts }
                    }
                    Attempt::Exhausted { last_error, .. } => CycleOutcome::Failed {
                        attempts,
                        error: last_error.to_string(),
                    },
                }
            }
            Err(e) => CycleOutcome::Failed {
                attempts: 0,
                error: format!("Connection failed: {}", e),
            },
        };

        if let CycleOutcome::Failed { attempts, error } = &outcome {
            tracing::error!(attempts, %error, "AMMTrade failed");
            self.report.line("AMMTrade failed!");
            self.report.line(error.clone());
        }

        self.schedule_next(started).await;

        self.report.push(&self.record);
        self.report
            .flush(&self.sink, self.report_utc_offset_hours)
            .await;

        outcome
    }

    /// Arm and persist the successor, `interval + jitter` after `basis`
    async fn schedule_next(&mut self, basis: DateTime<Utc>) {
        let jitter = random::jitter(
            &mut rand::thread_rng(),
            self.schedule.jitter_min_ms,
            self.schedule.jitter_max_ms,
        );
        let next = next_run(basis, self.schedule.interval_hours, jitter);

        self.record.next_trade = Some(next);
        self.scheduler.schedule_at(next);

        if let Err(e) = self.store.save(&self.record).await {
            tracing::error!(
                path = %self.store.path().display(),
                error = %e,
                "Failed to persist trade record"
            );
            self.report.line(format!("Failed to persist trade record: {}", e));
        }
    }
}
