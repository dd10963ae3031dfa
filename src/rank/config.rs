/*
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::pagerank::preds::{L1Norm, MaxIter};
use super::pagerank::PageRank;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("The damping factor must be in (0 . . 1), got {0}")]
    Alpha(f64),
    #[error("The threshold must be positive, got {0}")]
    Threshold(f64),
    #[error("The maximum number of iterations must be positive")]
    MaxIter,
    #[error("The number of threads must be positive")]
    NumThreads,
}

/// The parameters of a PageRank run.
///
/// The default values are those of the `pagerank` command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRankConfig {
    /// The damping factor.
    pub alpha: f64,
    /// The ℓ₁ threshold under which the computation is considered converged.
    pub threshold: f64,
    /// The maximum number of iterations.
    pub max_iter: usize,
    /// The number of threads of the task pool.
    pub num_threads: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            alpha: 0.9,
            threshold: L1Norm::DEFAULT_THRESHOLD,
            max_iter: MaxIter::DEFAULT_MAX_ITER,
            num_threads: 3,
        }
    }
}

impl PageRankConfig {
    /// Checks that all parameters are in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::Alpha(self.alpha));
        }
        if !(self.threshold > 0.0) {
            return Err(ConfigError::Threshold(self.threshold));
        }
        if self.max_iter == 0 {
            return Err(ConfigError::MaxIter);
        }
        if self.num_threads == 0 {
            return Err(ConfigError::NumThreads);
        }
        Ok(())
    }

    /// Validates the configuration and applies damping factor, threshold, and
    /// maximum number of iterations to `pr`.
    pub fn configure(&self, pr: &mut PageRank<'_>) -> Result<(), ConfigError> {
        self.validate()?;
        let threshold =
            L1Norm::try_from(self.threshold).map_err(|_| ConfigError::Threshold(self.threshold))?;
        let max_iter = MaxIter::try_from(self.max_iter).map_err(|_| ConfigError::MaxIter)?;
        pr.alpha(self.alpha).threshold(threshold).max_iter(max_iter);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert_eq!(PageRankConfig::default().validate(), Ok(()));
        let config = PageRankConfig {
            alpha: 1.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Alpha(1.0)));
        let config = PageRankConfig {
            threshold: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Threshold(_))));
        let config = PageRankConfig {
            max_iter: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MaxIter));
        let config = PageRankConfig {
            num_threads: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NumThreads));
    }
}
