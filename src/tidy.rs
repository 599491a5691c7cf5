// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Lease Tidier
//!
//! Background task that removes lapsed lease records. Renewal refuses a
//! lapsed lease on its own; this only keeps storage from accumulating leases
//! that nobody renews.
//!
//! ## Shutdown
//!
//! Stops when its `CancellationToken` is cancelled.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::backend::Backend;

/// Default interval between sweeps.
const DEFAULT_TIDY_INTERVAL: Duration = Duration::from_secs(300);

pub struct LeaseTidier {
    backend: Arc<Backend>,
    interval: Duration,
}

impl LeaseTidier {
    pub fn new(backend: Arc<Backend>) -> Self {
        Self {
            backend,
            interval: DEFAULT_TIDY_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run sweeps until `shutdown` is cancelled.
    ///
    /// ```rust,ignore
    /// tokio::spawn(tidier.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "Lease tidier starting");

        loop {
            if shutdown.is_cancelled() {
                info!("Lease tidier shutting down");
                return;
            }

            self.sweep();

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Lease tidier shutting down");
                    return;
                }
            }
        }
    }

    fn sweep(&self) {
        match self.backend.tidy_leases() {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Removed lapsed leases"),
            Err(e) => warn!(error = %e, "Lease sweep failed"),
        }
    }
}
