//! Evaluation configuration and the recursion budget.

use tracing::warn;

use crate::error::{Error, Result};

/// Configuration for [`Ex::eval_with`](crate::Ex::eval_with) and
/// [`Ex::evalf_with`](crate::Ex::evalf_with).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalConfig {
    /// Maximum nesting depth the evaluator may descend to.
    pub max_depth: usize,
    /// Minimum number of children of one node before they are evaluated on
    /// the rayon pool.
    pub parallel_threshold: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_depth: 1024,
            parallel_threshold: 32,
        }
    }
}

impl EvalConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum recursion depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the parallel evaluation threshold.
    #[must_use]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}

/// Remaining recursion budget, threaded explicitly through evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Budget {
    depth: usize,
    max_depth: usize,
    parallel_threshold: usize,
}

impl Budget {
    /// Creates a fresh budget from a configuration.
    #[must_use]
    pub fn new(config: &EvalConfig) -> Self {
        Self {
            depth: 0,
            max_depth: config.max_depth,
            parallel_threshold: config.parallel_threshold.max(1),
        }
    }

    /// Consumes one level of the budget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecursionLimit`] once the configured depth is reached.
    pub fn descend(self) -> Result<Self> {
        if self.depth >= self.max_depth {
            warn!(target: "ansatz::eval", limit = self.max_depth, "recursion budget exhausted");
            return Err(Error::RecursionLimit {
                limit: self.max_depth,
            });
        }
        Ok(Self {
            depth: self.depth + 1,
            ..self
        })
    }

    /// Current nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Levels left before the limit is hit.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.max_depth.saturating_sub(self.depth)
    }

    /// Child count from which evaluation fans out in parallel.
    #[must_use]
    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::new(&EvalConfig::default())
    }
}
