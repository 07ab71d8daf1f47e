//! Historical replay.
//!
//! Feeds logged executions through an [`IndicatorEngine`] exactly as live
//! executions would be, so replayed and live data produce the same ticks and
//! indicator values.

use crate::log_house::LogHouse;
use chrono::NaiveDate;
use tickflow_core::config::ReplayConfig;
use tickflow_core::{Error, Result};
use tickflow_indicators::IndicatorEngine;
use tracing::{debug, info};

/// Totals of one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Days with logged executions.
    pub days: usize,
    pub executions: usize,
    /// Ticks committed over all spans.
    pub ticks: usize,
    /// Indicator evaluations that failed.
    pub failures: usize,
}

/// Replays a log house day by day.
pub struct Replayer<H: LogHouse> {
    house: H,
    config: ReplayConfig,
}

impl<H: LogHouse> Replayer<H> {
    pub fn new(house: H, config: ReplayConfig) -> Self {
        Self { house, config }
    }

    pub fn house(&self) -> &H {
        &self.house
    }

    /// Replay every logged day in `[from, to]` into `engine`.
    ///
    /// Days without a log are skipped. With `recompute` disabled executions
    /// are only bucketed; [`IndicatorEngine::recompute_all`] catches the
    /// indicators up afterwards.
    pub fn run(&self, engine: &mut IndicatorEngine, from: NaiveDate, to: NaiveDate) -> Result<ReplaySummary> {
        if from > to {
            return Err(Error::config(format!("replay range {from}..={to} is empty")));
        }

        let mut summary = ReplaySummary::default();
        for date in from.iter_days().take_while(|date| *date <= to) {
            if !self.house.has(date) {
                info!(%date, "no executions logged, day skipped");
                continue;
            }

            let executions = self.house.read(date)?;
            for execution in &executions {
                if self.config.recompute {
                    let step = engine.update(execution)?;
                    summary.ticks += step.committed.len();
                    summary.failures += step.failures.len();
                } else {
                    summary.ticks += engine.ingest(execution)?.len();
                }
            }

            summary.days += 1;
            summary.executions += executions.len();
            debug!(%date, executions = executions.len(), "day replayed");
        }

        info!(
            %from,
            %to,
            days = summary.days,
            executions = summary.executions,
            ticks = summary.ticks,
            failures = summary.failures,
            "replay completed"
        );
        Ok(summary)
    }
}
