//! Backend selection module.
//!
//! This module defines the available execution strategies for the matrix
//! primitives. A network picks its backend once, from its configuration, when
//! it is constructed; the choice never changes afterwards.
//!
//! # Supported Backends
//!
//! - `Sequential`: direct single-threaded loops (default).
//! - `Parallel`: divide-and-conquer over a fixed-size worker pool, falling
//!   back to the sequential loops for small operands.
//!
//! Both backends produce bit-identical results for the same input.

use crate::config::NetworkConfiguration;

/// Enumeration of supported execution backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Backend {
    /// Single-threaded execution (default).
    #[default]
    Sequential,
    /// Fork/join execution on a pool of `workers` threads.
    Parallel {
        /// Worker thread count.
        workers: usize,
    },
}

impl Backend {
    /// The backend a configuration asks for.
    ///
    /// # Example
    /// ```
    /// use basic_neural::backend::Backend;
    /// use basic_neural::config::NetworkBuilder;
    ///
    /// let config = NetworkBuilder::new(2, 1).parallel_training(3).configuration().unwrap();
    /// assert_eq!(Backend::for_config(&config), Backend::Parallel { workers: 3 });
    /// ```
    pub fn for_config(config: &NetworkConfiguration) -> Self {
        if config.parallel() {
            Self::Parallel {
                workers: config.worker_count(),
            }
        } else {
            Self::Sequential
        }
    }

    /// `true` for [`Backend::Parallel`].
    pub fn is_parallel(self) -> bool {
        matches!(self, Self::Parallel { .. })
    }
}
