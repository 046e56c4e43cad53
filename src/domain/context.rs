//! Name-keyed indicator registries, one per timeframe.
//!
//! [`IndicatorContext`] owns the indicators of a single timeframe and
//! advances them in registration order. [`TimeframeContexts`] groups
//! contexts by bar period and creates them on first use.

use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::domain::error::BarstreamError;
use crate::domain::indicator::IndicatorHandle;
use crate::domain::indicator_helpers::parse_indicator;
use crate::domain::num::{Num, NumFactory};
use crate::domain::ohlcv::Bar;

/// Callback fired after each indicator advances: bar end time, registered
/// name and the indicator itself.
pub type Listener<N> = Box<dyn FnMut(DateTime<Utc>, &str, &IndicatorHandle<N>)>;

/// Ordered registry of the indicators evaluated on one bar stream.
pub struct IndicatorContext<N: Num> {
    entries: Vec<(String, IndicatorHandle<N>)>,
    index: HashMap<String, usize>,
    listeners: Vec<Listener<N>>,
    next_placeholder: usize,
    /// Latches once every indicator has reported stable.
    stable: Cell<bool>,
}

impl<N: Num> Default for IndicatorContext<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: Num> IndicatorContext<N> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            listeners: Vec::new(),
            next_placeholder: 0,
            stable: Cell::new(false),
        }
    }

    /// Builds a context from `(name, spec)` pairs such as `("fast", "SMA(5)")`.
    pub fn from_specs<F, I, S>(specs: I, factory: &F) -> Result<Self, BarstreamError>
    where
        F: NumFactory<Num = N>,
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut ctx = Self::new();
        for (name, spec) in specs {
            let handle = parse_indicator(spec.as_ref(), factory)?;
            ctx.add_named(name.as_ref(), handle);
        }
        Ok(ctx)
    }

    /// Registers `handle` under a generated `indicator#<n>` name and returns
    /// that name.
    pub fn add(&mut self, handle: IndicatorHandle<N>) -> String {
        let name = loop {
            let candidate = format!("indicator#{}", self.next_placeholder);
            self.next_placeholder += 1;
            if !self.index.contains_key(&candidate) {
                break candidate;
            }
        };
        self.add_named(&name, handle);
        name
    }

    /// Registers `handle` under `name`. An existing entry with the same name
    /// is replaced and keeps its position in the evaluation order.
    pub fn add_named(&mut self, name: &str, handle: IndicatorHandle<N>) {
        match self.index.get(name) {
            Some(&pos) => {
                debug!(name, "replacing indicator");
                self.entries[pos].1 = handle;
            }
            None => {
                debug!(name, position = self.entries.len(), "registering indicator");
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), handle));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&IndicatorHandle<N>> {
        self.index.get(name).map(|&pos| &self.entries[pos].1)
    }

    /// Registered names in evaluation order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndicatorHandle<N>)> + '_ {
        self.entries.iter().map(|(name, h)| (name.as_str(), h))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add_listener<L>(&mut self, listener: L)
    where
        L: FnMut(DateTime<Utc>, &str, &IndicatorHandle<N>) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Delivers `bar` to every indicator in registration order, notifying
    /// listeners after each one.
    pub fn advance(&mut self, bar: &Bar<N>) {
        for (name, handle) in &self.entries {
            handle.advance(bar);
            for listener in &mut self.listeners {
                listener(bar.end, name.as_str(), handle);
            }
        }
    }

    /// `true` once every registered indicator is stable. The answer is
    /// memoized: after the first `true` the indicators are not consulted
    /// again, even if more are registered later. An empty context is never
    /// stable.
    pub fn is_stable(&self) -> bool {
        if self.stable.get() {
            return true;
        }
        if self.entries.is_empty() {
            return false;
        }
        let all = self.entries.iter().all(|(_, h)| h.is_stable());
        if all {
            debug!(indicators = self.entries.len(), "context stable");
            self.stable.set(true);
        }
        all
    }
}

/// Contexts keyed by bar period.
pub struct TimeframeContexts<N: Num> {
    contexts: BTreeMap<TimeDelta, IndicatorContext<N>>,
}

impl<N: Num> Default for TimeframeContexts<N> {
    fn default() -> Self {
        Self {
            contexts: BTreeMap::new(),
        }
    }
}

impl<N: Num> TimeframeContexts<N> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The context for `timeframe`, created empty if not seen before.
    pub fn get_or_create(&mut self, timeframe: TimeDelta) -> &mut IndicatorContext<N> {
        self.contexts.entry(timeframe).or_insert_with(|| {
            debug!(timeframe = %timeframe, "creating indicator context");
            IndicatorContext::new()
        })
    }

    pub fn get(&self, timeframe: TimeDelta) -> Option<&IndicatorContext<N>> {
        self.contexts.get(&timeframe)
    }

    /// Routes `bar` to the context matching its period, if one exists.
    pub fn advance(&mut self, bar: &Bar<N>) {
        if let Some(ctx) = self.contexts.get_mut(&bar.period()) {
            ctx.advance(bar);
        }
    }

    pub fn timeframes(&self) -> impl Iterator<Item = TimeDelta> + '_ {
        self.contexts.keys().copied()
    }
}
