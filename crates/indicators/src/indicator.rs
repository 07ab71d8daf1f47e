//! Lazily evaluated, composable indicators.
//!
//! An [`Indicator`] is a handle to a node of an acyclic graph. Every node
//! implements [`Calculate`]; combinators build new nodes that hold shared
//! handles to their parents, so a ticker and its indicators can be shared by
//! many consumers.

use std::fmt;
use std::sync::{Arc, RwLock};
use tickflow_core::{Error, Result, Tick, Ticker};

/// Bound shared by every indicator value.
pub trait Value: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Value for T {}

/// Evaluation of one node at one index.
///
/// Implementations may assume `index` is committed on the bound ticker.
pub trait Calculate<V>: Send + Sync {
    fn calculate(&self, index: usize) -> Result<V>;
}

impl<V, F> Calculate<V> for F
where
    F: Fn(usize) -> Result<V> + Send + Sync,
{
    fn calculate(&self, index: usize) -> Result<V> {
        self(index)
    }
}

/// Shared handle to an indicator node bound to one ticker.
pub struct Indicator<V> {
    name: Arc<str>,
    ticker: Arc<Ticker>,
    node: Arc<dyn Calculate<V>>,
}

impl<V> Clone for Indicator<V> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            ticker: Arc::clone(&self.ticker),
            node: Arc::clone(&self.node),
        }
    }
}

impl<V> fmt::Debug for Indicator<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Indicator")
            .field("name", &self.name)
            .field("span", &self.ticker.span())
            .finish_non_exhaustive()
    }
}

impl<V: Value> Indicator<V> {
    /// Wrap a node evaluated over `ticker`.
    pub fn new<C>(ticker: Arc<Ticker>, node: C) -> Self
    where
        C: Calculate<V> + 'static,
    {
        Self {
            name: Arc::from("indicator"),
            ticker,
            node: Arc::new(node),
        }
    }

    /// Root indicator computed from each tick alone.
    pub fn build<F>(ticker: Arc<Ticker>, calculator: F) -> Self
    where
        F: Fn(&Tick) -> V + Send + Sync + 'static,
    {
        let source = Arc::clone(&ticker);
        Self::new(ticker, move |index: usize| {
            source.get(index).map(|tick| calculator(&tick))
        })
    }

    /// Root indicator computed from each tick alone, which may fail.
    pub fn try_build<F>(ticker: Arc<Ticker>, calculator: F) -> Self
    where
        F: Fn(&Tick) -> Result<V> + Send + Sync + 'static,
    {
        let source = Arc::clone(&ticker);
        Self::new(ticker, move |index: usize| calculator(&source.get(index)?))
    }

    /// Rename this handle. The node is shared with the original.
    pub fn named(mut self, name: impl AsRef<str>) -> Self {
        self.name = Arc::from(name.as_ref());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound ticker.
    pub fn ticker(&self) -> &Arc<Ticker> {
        &self.ticker
    }

    /// Value at `index`.
    ///
    /// Fails with [`Error::OutOfRange`] for indices the ticker has not
    /// committed yet; this never extrapolates.
    pub fn value_at(&self, index: usize) -> Result<V> {
        self.ticker.check_index(index)?;
        self.node.calculate(index)
    }

    /// Value at the tick of the bound ticker whose slot contains `tick`'s
    /// start. `tick` may come from a ticker of another span.
    pub fn value_at_tick(&self, tick: &Tick) -> Result<V> {
        let index = self.ticker.index_of(tick.start)?;
        self.value_at(index)
    }

    pub fn first(&self) -> Result<V> {
        self.value_at(0)
    }

    pub fn last(&self) -> Result<V> {
        match self.ticker.latest_index()? {
            Some(index) => self.value_at(index),
            None => Err(Error::out_of_range(0, 0)),
        }
    }

    /// Values in `[from, to]`.
    ///
    /// Fails with [`Error::OutOfRange`] when `to` is not committed yet. An
    /// inverted range is empty.
    pub fn values(&self, from: usize, to: usize) -> Result<Vec<V>> {
        self.ticker.check_index(to)?;
        (from..=to).map(|index| self.calculate(index)).collect()
    }

    /// Unchecked evaluation used by combinators; parents share the bound
    /// ticker, so the caller's range check covers them.
    #[inline]
    pub(crate) fn calculate(&self, index: usize) -> Result<V> {
        self.node.calculate(index)
    }

    fn ensure_same_ticker<W>(&self, other: &Indicator<W>) -> Result<()> {
        if Arc::ptr_eq(&self.ticker, &other.ticker) {
            Ok(())
        } else {
            Err(Error::topology(format!(
                "{} ({}) and {} ({}) are bound to different tickers",
                self.name,
                self.ticker.span(),
                other.name,
                other.ticker.span()
            )))
        }
    }

    fn derive<Out: Value, C>(&self, name: String, node: C) -> Indicator<Out>
    where
        C: Calculate<Out> + 'static,
    {
        Indicator::new(Arc::clone(&self.ticker), node).named(name)
    }

    /// Pointwise transform.
    pub fn map<Out, F>(&self, mapper: F) -> Indicator<Out>
    where
        Out: Value,
        F: Fn(V) -> Out + Send + Sync + 'static,
    {
        let parent = self.clone();
        self.derive(format!("map({})", self.name), move |index: usize| {
            parent.calculate(index).map(&mapper)
        })
    }

    /// Pointwise transform which may fail.
    pub fn try_map<Out, F>(&self, mapper: F) -> Indicator<Out>
    where
        Out: Value,
        F: Fn(V) -> Result<Out> + Send + Sync + 'static,
    {
        let parent = self.clone();
        self.derive(format!("map({})", self.name), move |index: usize| {
            mapper(parent.calculate(index)?)
        })
    }

    /// Pointwise combination with one parallel indicator.
    pub fn map_with<W, Out, F>(&self, other: &Indicator<W>, mapper: F) -> Result<Indicator<Out>>
    where
        W: Value,
        Out: Value,
        F: Fn(V, W) -> Out + Send + Sync + 'static,
    {
        self.try_map_with(other, move |a, b| Ok(mapper(a, b)))
    }

    /// Pointwise combination with one parallel indicator, which may fail.
    pub fn try_map_with<W, Out, F>(&self, other: &Indicator<W>, mapper: F) -> Result<Indicator<Out>>
    where
        W: Value,
        Out: Value,
        F: Fn(V, W) -> Result<Out> + Send + Sync + 'static,
    {
        self.ensure_same_ticker(other)?;
        let (first, second) = (self.clone(), other.clone());
        Ok(self.derive(
            format!("map({}, {})", self.name, other.name),
            move |index: usize| mapper(first.calculate(index)?, second.calculate(index)?),
        ))
    }

    /// Pointwise combination with two parallel indicators.
    pub fn map_with2<W, X, Out, F>(
        &self,
        second: &Indicator<W>,
        third: &Indicator<X>,
        mapper: F,
    ) -> Result<Indicator<Out>>
    where
        W: Value,
        X: Value,
        Out: Value,
        F: Fn(V, W, X) -> Out + Send + Sync + 'static,
    {
        self.try_map_with2(second, third, move |a, b, c| Ok(mapper(a, b, c)))
    }

    /// Pointwise combination with two parallel indicators, which may fail.
    pub fn try_map_with2<W, X, Out, F>(
        &self,
        second: &Indicator<W>,
        third: &Indicator<X>,
        mapper: F,
    ) -> Result<Indicator<Out>>
    where
        W: Value,
        X: Value,
        Out: Value,
        F: Fn(V, W, X) -> Result<Out> + Send + Sync + 'static,
    {
        self.ensure_same_ticker(second)?;
        self.ensure_same_ticker(third)?;
        let (a, b, c) = (self.clone(), second.clone(), third.clone());
        Ok(self.derive(
            format!("map({}, {}, {})", self.name, second.name, third.name),
            move |index: usize| mapper(a.calculate(index)?, b.calculate(index)?, c.calculate(index)?),
        ))
    }

    /// Pair this indicator's value with `other`'s at the same index.
    pub fn combine<W: Value>(&self, other: &Indicator<W>) -> Result<Indicator<(V, W)>> {
        self.map_with(other, |a, b| (a, b))
    }

    /// Triple this indicator's value with two others at the same index.
    pub fn combine2<W: Value, X: Value>(
        &self,
        second: &Indicator<W>,
        third: &Indicator<X>,
    ) -> Result<Indicator<(V, W, X)>> {
        self.map_with2(second, third, |a, b, c| (a, b, c))
    }

    /// Cache every computed value by index.
    ///
    /// Failures are not cached; a cached value never changes.
    pub fn memoize(&self) -> Indicator<V> {
        Indicator {
            name: Arc::clone(&self.name),
            ticker: Arc::clone(&self.ticker),
            node: Arc::new(Memo {
                parent: Arc::clone(&self.node),
                cache: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Sequential node folding this indicator's values in index order.
    ///
    /// `step` receives the private state and the input at each index and
    /// returns the output for that index. Outputs are cached; a request for
    /// index `i` advances the state from the last computed index up to `i`,
    /// so in-order reads cost O(1) each. `step` must leave the state
    /// untouched when it fails.
    pub fn scan<S, Out, F>(&self, seed: S, step: F) -> Indicator<Out>
    where
        S: Send + Sync + 'static,
        Out: Value,
        F: Fn(&mut S, V) -> Result<Out> + Send + Sync + 'static,
    {
        self.derive(
            format!("scan({})", self.name),
            Scan {
                parent: Arc::clone(&self.node),
                state: RwLock::new(ScanState {
                    state: seed,
                    values: Vec::new(),
                }),
                step,
            },
        )
    }
}

/// Append-only cache keyed by index.
struct Memo<V> {
    parent: Arc<dyn Calculate<V>>,
    cache: RwLock<Vec<Option<V>>>,
}

impl<V: Value> Calculate<V> for Memo<V> {
    fn calculate(&self, index: usize) -> Result<V> {
        {
            let cache = self.cache.read().map_err(|_| Error::Poisoned("memo"))?;
            if let Some(Some(value)) = cache.get(index) {
                return Ok(value.clone());
            }
        }

        let value = self.parent.calculate(index)?;

        let mut cache = self.cache.write().map_err(|_| Error::Poisoned("memo"))?;
        if cache.len() <= index {
            cache.resize_with(index + 1, || None);
        }
        // first writer wins, so every reader sees the same value
        Ok(cache[index].get_or_insert(value).clone())
    }
}

struct ScanState<S, O> {
    state: S,
    values: Vec<O>,
}

struct Scan<I, S, O, F> {
    parent: Arc<dyn Calculate<I>>,
    state: RwLock<ScanState<S, O>>,
    step: F,
}

impl<I, S, O, F> Calculate<O> for Scan<I, S, O, F>
where
    I: Value,
    S: Send + Sync,
    O: Value,
    F: Fn(&mut S, I) -> Result<O> + Send + Sync,
{
    fn calculate(&self, index: usize) -> Result<O> {
        {
            let scan = self.state.read().map_err(|_| Error::Poisoned("scan"))?;
            if let Some(value) = scan.values.get(index) {
                return Ok(value.clone());
            }
        }

        let mut guard = self.state.write().map_err(|_| Error::Poisoned("scan"))?;
        let scan = &mut *guard;
        while scan.values.len() <= index {
            let input = self.parent.calculate(scan.values.len())?;
            let output = (self.step)(&mut scan.state, input)?;
            scan.values.push(output);
        }
        Ok(scan.values[index].clone())
    }
}
