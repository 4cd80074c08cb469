//! Deployment configuration for the mapping backends.

use std::num::NonZeroUsize;

use log::warn;

use crate::errors::{Result, XferError};

/// Environment variable selecting private anonymous mappings for the direct strategy.
pub const MEMALLOC_ENV: &str = "IOR_MMAP_MEMALLOC";

/// How the mapping is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    /// One OS-level mapping over the whole aggregate region.
    #[default]
    Direct,
    /// User-level mapping of fixed-size segments with a residency bound.
    Segmented,
}

impl StrategyKind {
    /// Backend name reported to the harness.
    #[must_use]
    pub fn backend_name(self) -> &'static str {
        match self {
            Self::Direct => "MMAP",
            Self::Segmented => "uMMAP",
        }
    }
}

/// What to do when an access-pattern or eviction hint fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvisoryPolicy {
    /// Abort the session.
    Strict,
    /// Log a warning and continue.
    #[default]
    Warn,
}

impl AdvisoryPolicy {
    /// Apply the policy to an advisory failure.
    ///
    /// # Errors
    ///
    /// Returns `err` unchanged under [`AdvisoryPolicy::Strict`].
    pub fn handle(self, err: XferError) -> Result<()> {
        match self {
            Self::Strict => Err(err),
            Self::Warn => {
                warn!("ignoring advisory failure: {err}");
                Ok(())
            }
        }
    }
}

/// Mapping backend configuration.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
/// use mmap_xfer::{AdvisoryPolicy, MappingConfig, StrategyKind};
///
/// let cfg = MappingConfig::segmented()
///     .segment_capacity(NonZeroUsize::new(8))
///     .advisory(AdvisoryPolicy::Strict);
/// assert_eq!(cfg.strategy(), StrategyKind::Segmented);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingConfig {
    strategy: StrategyKind,
    private_anonymous: bool,
    advisory: AdvisoryPolicy,
    segment_capacity: Option<NonZeroUsize>,
    load_on_fault: bool,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Direct,
            private_anonymous: false,
            advisory: AdvisoryPolicy::Warn,
            segment_capacity: None,
            load_on_fault: true,
        }
    }
}

impl MappingConfig {
    /// Direct strategy, shared mapping.
    #[must_use]
    pub fn direct() -> Self {
        Self::default()
    }

    /// Segmented strategy with unbounded residency.
    #[must_use]
    pub fn segmented() -> Self {
        Self {
            strategy: StrategyKind::Segmented,
            ..Self::default()
        }
    }

    /// Configuration for `strategy` with the private-anonymous toggle read from the process environment.
    #[must_use]
    pub fn from_env(strategy: StrategyKind) -> Self {
        Self::from_lookup(strategy, |key| std::env::var(key).ok())
    }

    /// Same as [`MappingConfig::from_env`], reading variables through `lookup`.
    #[must_use]
    pub fn from_lookup<F>(strategy: StrategyKind, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let private_anonymous = lookup(MEMALLOC_ENV).is_some_and(|v| v == "true");
        Self {
            strategy,
            private_anonymous,
            ..Self::default()
        }
    }

    /// Use private anonymous pages instead of sharing the file (direct strategy only).
    #[must_use]
    pub fn private_anonymous(mut self, enabled: bool) -> Self {
        self.private_anonymous = enabled;
        self
    }

    /// Set the advisory failure policy.
    #[must_use]
    pub fn advisory(mut self, policy: AdvisoryPolicy) -> Self {
        self.advisory = policy;
        self
    }

    /// Bound the number of resident segments; `None` is unbounded.
    #[must_use]
    pub fn segment_capacity(mut self, capacity: Option<NonZeroUsize>) -> Self {
        self.segment_capacity = capacity;
        self
    }

    /// Read segment contents from the file when a segment becomes resident.
    #[must_use]
    pub fn load_on_fault(mut self, load: bool) -> Self {
        self.load_on_fault = load;
        self
    }

    /// Selected strategy.
    #[must_use]
    pub fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Whether the direct strategy maps private anonymous pages.
    #[must_use]
    pub fn is_private_anonymous(&self) -> bool {
        self.private_anonymous
    }

    /// Advisory failure policy.
    #[must_use]
    pub fn advisory_policy(&self) -> AdvisoryPolicy {
        self.advisory
    }

    /// Residency bound for the segmented strategy.
    #[must_use]
    pub fn capacity(&self) -> Option<NonZeroUsize> {
        self.segment_capacity
    }

    /// Whether segments are loaded from the file on fault.
    #[must_use]
    pub fn loads_on_fault(&self) -> bool {
        self.load_on_fault
    }
}
