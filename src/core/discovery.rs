//! Discovery orchestration.
//!
//! One run for one connection:
//!
//! 1. open the credentials and check the provider CLI resolves
//! 2. clear the connection's cached resources
//! 3. run every probe in order, tolerating soft per-probe failures
//! 4. commit all new records at once if at least one probe succeeded
//!
//! Step 1 fails without touching the cache. If every probe fails nothing
//! is committed and the cache stays empty.
//!
//! Runs for the same connection are serialized within the process. Separate
//! processes sharing a repository can still interleave; the last commit wins.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::core::domain::{CachedResource, ConnectionId, CredentialConnection, DiscoveredResource};
use crate::core::provider::{ProbeContext, Providers};
use crate::core::vault::CredentialStore;
use crate::error::{DiscoveryError, ProbeFailure, Result, StoreError};

/// A probe that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub probe: String,
    pub count: usize,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOutcome {
    pub connection: ConnectionId,
    /// Records committed.
    pub total: usize,
    pub successes: Vec<ProbeReport>,
    pub failures: Vec<ProbeFailure>,
}

#[derive(Default)]
struct Tally {
    records: Vec<DiscoveredResource>,
    successes: Vec<ProbeReport>,
    failures: Vec<ProbeFailure>,
}

/// Runs discovery against the provider adapters.
pub struct Orchestrator {
    store: Arc<CredentialStore>,
    providers: Arc<dyn Providers>,
    running: Mutex<HashMap<ConnectionId, Arc<Mutex<()>>>>,
}

impl Orchestrator {
    pub fn new(store: Arc<CredentialStore>, providers: Arc<dyn Providers>) -> Self {
        Self {
            store,
            providers,
            running: Mutex::new(HashMap::new()),
        }
    }

    pub fn providers(&self) -> &Arc<dyn Providers> {
        &self.providers
    }

    /// Refresh the cached resources of `connection`.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError::Inactive` for a soft-deleted connection,
    /// `StoreError::CorruptCredentials` if its secret cannot be opened, and
    /// `ExecError::CommandNotFound` if the provider CLI is missing; none of
    /// these touch the cache. Returns `DiscoveryError::Failed` when every
    /// probe failed.
    pub fn run(&self, connection: &CredentialConnection) -> Result<DiscoveryOutcome> {
        if !connection.is_active {
            return Err(DiscoveryError::Inactive(connection.name.clone()).into());
        }

        let slot = self.slot(connection.id)?;
        let _running = slot.lock().map_err(|_| StoreError::Poisoned)?;

        let credentials = self.store.load(connection)?;
        self.providers.preflight(connection.provider)?;

        let repo = self.store.repository();
        let cleared = repo.clear_resources(connection.id)?;
        debug!(connection = %connection.id, cleared, "cache cleared");

        let ctx = ProbeContext {
            credentials: &credentials,
            region: connection.region.as_deref(),
        };
        let tally = self
            .providers
            .probes(connection.provider)
            .iter()
            .try_fold(Tally::default(), |mut tally, probe| {
                match probe.discover(&ctx) {
                    Ok(found) => {
                        debug!(probe = probe.name(), count = found.len(), "probe finished");
                        tally.successes.push(ProbeReport {
                            probe: probe.name().to_string(),
                            count: found.len(),
                        });
                        tally.records.extend(found);
                    }
                    Err(error) if error.is_soft() => {
                        warn!(probe = probe.name(), error = %error, "probe failed");
                        tally.failures.push(ProbeFailure {
                            probe: probe.name().to_string(),
                            error,
                        });
                    }
                    Err(error) => return Err(error),
                }
                Ok(tally)
            })?;

        if tally.successes.is_empty() {
            warn!(
                connection = %connection.id,
                failures = tally.failures.len(),
                "all probes failed"
            );
            return Err(DiscoveryError::Failed(tally.failures).into());
        }

        let now = Utc::now();
        let resources: Vec<_> = tally
            .records
            .into_iter()
            .map(|found| CachedResource::from_discovered(connection.id, found, now))
            .collect();
        let total = resources.len();
        repo.insert_resources(resources)?;

        info!(
            connection = %connection.id,
            provider = %connection.provider,
            total,
            failed_probes = tally.failures.len(),
            "discovery committed"
        );
        Ok(DiscoveryOutcome {
            connection: connection.id,
            total,
            successes: tally.successes,
            failures: tally.failures,
        })
    }

    fn slot(&self, id: ConnectionId) -> Result<Arc<Mutex<()>>> {
        let mut running = self.running.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(Arc::clone(running.entry(id).or_default()))
    }
}
