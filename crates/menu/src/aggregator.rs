//! Aggregation of action groups across contribution sources.
//!
//! Groups come from two tiers. Current-tier groups are validated against the
//! group key format; legacy-tier groups are taken as-is. The merged list is
//! cached until any source signals a change.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use crate::notify::{ChangeNotifier, Subscription};
use crate::source::ContributionSource;
use crate::types::ActionGroup;
use crate::validator::ActionGroupValidator;

/// Precedence tier of a contribution source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Validated; precedes every legacy group.
    Current,
    /// Exempt from key validation, appended after the current tier.
    Legacy,
}

/// Cached, merged view over all contribution sources.
pub struct MenuAggregator {
    validator: ActionGroupValidator,
    current: Vec<Arc<dyn ContributionSource>>,
    legacy: Vec<Arc<dyn ContributionSource>>,
    cache: Mutex<Option<Arc<[ActionGroup]>>>,
    /// Bumped on every invalidation; a rebuild started under an older
    /// generation is returned but not cached.
    generation: AtomicU64,
    changed: ChangeNotifier,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl MenuAggregator {
    /// Creates an aggregator with no sources.
    pub fn empty() -> Arc<Self> {
        Self::builder().build()
    }

    pub fn builder() -> MenuAggregatorBuilder {
        MenuAggregatorBuilder::default()
    }

    /// Returns the merged groups. The cached list is reused unless
    /// `force_refresh` is set or a source changed since the last build.
    pub fn groups(&self, force_refresh: bool) -> Arc<[ActionGroup]> {
        if !force_refresh
            && let Some(cached) = self.cached()
        {
            return cached;
        }

        let generation = self.generation.load(Ordering::Acquire);
        let built: Arc<[ActionGroup]> = self.rebuild().into();

        if let Ok(mut cache) = self.cache.lock() {
            if self.generation.load(Ordering::Acquire) == generation {
                *cache = Some(Arc::clone(&built));
            } else {
                debug!("contributions changed during rebuild, result not cached");
            }
        }
        built
    }

    /// Whether any group carries at least one action.
    pub fn has_actions(&self) -> bool {
        self.groups(false).iter().any(|g| !g.actions.is_empty())
    }

    /// Drops the cached list; the next read rebuilds. Subscribers are
    /// notified.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Ok(mut cache) = self.cache.lock() {
            *cache = None;
        }
        debug!("remote menu cache invalidated");
        self.changed.notify();
    }

    /// Registers a listener called after each invalidation.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.changed.subscribe(listener)
    }

    pub fn validator(&self) -> &ActionGroupValidator {
        &self.validator
    }

    fn cached(&self) -> Option<Arc<[ActionGroup]>> {
        self.cache.lock().ok().and_then(|c| c.clone())
    }

    fn rebuild(&self) -> Vec<ActionGroup> {
        let mut merged = Vec::new();
        for source in &self.current {
            merged.extend(
                source
                    .groups()
                    .into_iter()
                    .filter(|group| self.validator.validate(&group.key)),
            );
        }
        for source in &self.legacy {
            merged.extend(source.groups());
        }
        debug!(groups = merged.len(), "remote menu rebuilt");
        merged
    }

    fn attach(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let subscriptions: Vec<Subscription> = self
            .current
            .iter()
            .chain(self.legacy.iter())
            .map(|source| {
                let weak = weak.clone();
                source.subscribe(Box::new(move || {
                    if let Some(aggregator) = weak.upgrade() {
                        aggregator.invalidate();
                    }
                }))
            })
            .collect();
        if let Ok(mut guard) = self.subscriptions.lock() {
            *guard = subscriptions;
        }
    }
}

/// Collects sources per tier, then subscribes the aggregator to each.
#[derive(Default)]
pub struct MenuAggregatorBuilder {
    current: Vec<Arc<dyn ContributionSource>>,
    legacy: Vec<Arc<dyn ContributionSource>>,
}

impl MenuAggregatorBuilder {
    pub fn source(mut self, tier: Tier, source: Arc<dyn ContributionSource>) -> Self {
        match tier {
            Tier::Current => self.current.push(source),
            Tier::Legacy => self.legacy.push(source),
        }
        self
    }

    pub fn current(self, source: Arc<dyn ContributionSource>) -> Self {
        self.source(Tier::Current, source)
    }

    pub fn legacy(self, source: Arc<dyn ContributionSource>) -> Self {
        self.source(Tier::Legacy, source)
    }

    pub fn build(self) -> Arc<MenuAggregator> {
        let aggregator = Arc::new(MenuAggregator {
            validator: ActionGroupValidator::new(),
            current: self.current,
            legacy: self.legacy,
            cache: Mutex::new(None),
            generation: AtomicU64::new(0),
            changed: ChangeNotifier::new(),
            subscriptions: Mutex::new(Vec::new()),
        });
        aggregator.attach();
        aggregator
    }
}
