//! Indicator engine.
//!
//! Owns the ticker manager and keeps every registered indicator evaluated at
//! each newly committed tick. This is the only writer of the tickers.

use crate::indicator::{Indicator, Value};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tickflow_core::{Config, Error, Execution, Result, Tick, Ticker, TimeSpan};
use tickflow_ingestion::{Committed, TickerManager};
use tracing::{debug, warn};

/// An indicator that can be evaluated ahead of its readers.
pub trait Warm: Send + Sync {
    fn name(&self) -> &str;

    fn span(&self) -> TimeSpan;

    /// Evaluate (and cache, if memoized) the value at `index`.
    fn warm(&self, index: usize) -> Result<()>;
}

impl<V: Value> Warm for Indicator<V> {
    fn name(&self) -> &str {
        Indicator::name(self)
    }

    fn span(&self) -> TimeSpan {
        self.ticker().span()
    }

    fn warm(&self, index: usize) -> Result<()> {
        self.value_at(index).map(|_| ())
    }
}

/// An indicator pushing its value to a sink at every tick of a timing ticker.
struct Observed<V, F> {
    indicator: Indicator<V>,
    timing: Arc<Ticker>,
    sink: Mutex<F>,
}

impl<V, F> Warm for Observed<V, F>
where
    V: Value,
    F: FnMut(&Tick, V) + Send,
{
    fn name(&self) -> &str {
        self.indicator.name()
    }

    fn span(&self) -> TimeSpan {
        self.timing.span()
    }

    fn warm(&self, index: usize) -> Result<()> {
        let tick = self.timing.get(index)?;
        let value = self.indicator.value_at_tick(&tick)?;
        let mut sink = self.sink.lock().map_err(|_| Error::Poisoned("observer"))?;
        (*sink)(&tick, value);
        Ok(())
    }
}

/// An indicator that failed at a committed index.
#[derive(Debug)]
pub struct Failure {
    pub span: TimeSpan,
    pub index: usize,
    pub name: String,
    pub error: Error,
}

/// Outcome of one engine step.
#[derive(Debug, Default)]
pub struct Recomputed {
    /// Ticks committed by the step, in commit order.
    pub committed: Vec<Committed>,
    /// Indicators that could not be evaluated at those ticks.
    pub failures: Vec<Failure>,
}

impl Recomputed {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ticker manager plus the indicators registered on its tickers.
pub struct IndicatorEngine {
    manager: TickerManager,
    registry: BTreeMap<TimeSpan, Vec<Box<dyn Warm>>>,
}

impl IndicatorEngine {
    pub fn new(manager: TickerManager) -> Self {
        Self {
            manager,
            registry: BTreeMap::new(),
        }
    }

    /// Create an engine managing the configured spans.
    pub fn from_config(config: &Config) -> Self {
        Self::new(TickerManager::from_config(&config.ticker))
    }

    /// The shared ticker of `span`.
    pub fn ticker(&self, span: TimeSpan) -> Result<Arc<Ticker>> {
        self.manager.ticker(span)
    }

    pub fn manager(&self) -> &TickerManager {
        &self.manager
    }

    /// Keep `indicator` evaluated on every tick committed to `span`.
    ///
    /// Fails with [`Error::Topology`] unless the indicator is bound to this
    /// engine's ticker of `span`.
    pub fn register<V: Value>(&mut self, span: TimeSpan, indicator: Indicator<V>) -> Result<()> {
        self.ensure_owned(span, &indicator)?;
        debug!(%span, name = indicator.name(), "indicator registered");
        self.registry.entry(span).or_default().push(Box::new(indicator));
        Ok(())
    }

    /// Push the indicator's value to `sink` each time its own ticker
    /// commits a tick.
    pub fn observe<V, F>(&mut self, indicator: Indicator<V>, sink: F) -> Result<()>
    where
        V: Value,
        F: FnMut(&Tick, V) + Send + 'static,
    {
        let span = indicator.ticker().span();
        self.observe_when(span, indicator, sink)
    }

    /// Push the indicator's value to `sink` each time the `timing` ticker
    /// commits a tick, resolved through [`Indicator::value_at_tick`].
    ///
    /// `timing` may not be finer than the indicator's span, since its ticks
    /// would precede the commit of the slot holding them.
    pub fn observe_when<V, F>(&mut self, timing: TimeSpan, indicator: Indicator<V>, sink: F) -> Result<()>
    where
        V: Value,
        F: FnMut(&Tick, V) + Send + 'static,
    {
        let span = indicator.ticker().span();
        self.ensure_owned(span, &indicator)?;
        if timing < span {
            return Err(Error::topology(format!(
                "{} ({span}) cannot be observed on finer {timing} ticks",
                indicator.name()
            )));
        }
        let ticker = self.manager.ticker(timing)?;
        debug!(%span, %timing, name = indicator.name(), "indicator observed");
        self.registry.entry(timing).or_default().push(Box::new(Observed {
            indicator,
            timing: ticker,
            sink: Mutex::new(sink),
        }));
        Ok(())
    }

    fn ensure_owned<V: Value>(&self, span: TimeSpan, indicator: &Indicator<V>) -> Result<()> {
        let ticker = self.manager.ticker(span)?;
        if Arc::ptr_eq(indicator.ticker(), &ticker) {
            Ok(())
        } else {
            Err(Error::topology(format!(
                "{} is not bound to the {span} ticker of this engine",
                indicator.name()
            )))
        }
    }

    /// Number of indicators registered on `span`.
    pub fn registered(&self, span: TimeSpan) -> usize {
        self.registry.get(&span).map_or(0, Vec::len)
    }

    /// Bucket an execution without evaluating any indicator.
    pub fn ingest(&mut self, execution: &Execution) -> Result<Vec<Committed>> {
        self.manager.update(execution)
    }

    /// Bucket an execution and evaluate the registered indicators at every
    /// tick it committed.
    pub fn update(&mut self, execution: &Execution) -> Result<Recomputed> {
        let committed = self.manager.update(execution)?;
        Ok(self.recompute(committed))
    }

    /// Close every slot that ended at or before `now` and evaluate the
    /// registered indicators at the closed ticks.
    pub fn flush_before(&mut self, now: DateTime<Utc>) -> Result<Recomputed> {
        let committed = self.manager.flush_before(now)?;
        Ok(self.recompute(committed))
    }

    /// Evaluate the registered indicators at every committed tick of every
    /// span, e.g. after ingesting without evaluation.
    pub fn recompute_all(&self) -> Recomputed {
        let committed = self
            .manager
            .spans()
            .filter_map(|span| self.manager.ticker(span).ok().map(|ticker| (span, ticker.size())))
            .flat_map(|(span, size)| (0..size).map(move |index| Committed { span, index }))
            .collect();
        self.recompute(committed)
    }

    fn recompute(&self, committed: Vec<Committed>) -> Recomputed {
        let mut failures = Vec::new();
        for tick in &committed {
            let Some(indicators) = self.registry.get(&tick.span) else {
                continue;
            };
            for indicator in indicators {
                if let Err(error) = indicator.warm(tick.index) {
                    warn!(
                        span = %tick.span,
                        index = tick.index,
                        name = indicator.name(),
                        %error,
                        "indicator evaluation failed"
                    );
                    failures.push(Failure {
                        span: tick.span,
                        index: tick.index,
                        name: indicator.name().to_string(),
                        error,
                    });
                }
            }
            debug!(span = %tick.span, index = tick.index, count = indicators.len(), "indicators evaluated");
        }
        Recomputed { committed, failures }
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
