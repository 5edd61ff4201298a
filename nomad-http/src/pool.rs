//! Per-host connection slots.
//!
//! Each target host gets a counting semaphore with `pool_size` permits. A
//! request holds one permit for its whole exchange; waiting for a permit is
//! bounded by the open timeout. Waiters are served in arrival order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{trace, warn};

use crate::error::{Error, Result};

/// Hosts tracked before idle entries are dropped.
pub const MAX_TRACKED_HOSTS: usize = 64;

/// Bounded connection slots keyed by `host:port`.
///
/// Redirects can name arbitrary hosts, so once more than
/// [`MAX_TRACKED_HOSTS`] are known, hosts with no slot checked out are
/// forgotten.
#[derive(Debug)]
pub struct HostPool {
    size: usize,
    hosts: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl HostPool {
    /// Create a pool allowing `size` concurrent exchanges per host. A size
    /// of zero is treated as one.
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Slots per host.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Free slots for `host`.
    pub fn available(&self, host: &str) -> usize {
        self.hosts
            .lock()
            .get(host)
            .map(|slots| slots.available_permits())
            .unwrap_or(self.size)
    }

    /// Number of hosts currently tracked.
    pub fn tracked_hosts(&self) -> usize {
        self.hosts.lock().len()
    }

    fn slots(&self, host: &str) -> Arc<Semaphore> {
        let mut hosts = self.hosts.lock();
        if hosts.len() >= MAX_TRACKED_HOSTS && !hosts.contains_key(host) {
            let size = self.size;
            hosts.retain(|_, slots| {
                Arc::strong_count(slots) > 1 || slots.available_permits() < size
            });
        }
        hosts
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.size)))
            .clone()
    }

    /// Wait for a slot on `host`. With `wait` set, gives up with a
    /// connection error once it elapses. `address` is reported in that error.
    pub async fn checkout(
        &self,
        host: &str,
        address: &str,
        wait: Option<Duration>,
    ) -> Result<OwnedSemaphorePermit> {
        let slots = self.slots(host);
        let acquired = match wait {
            Some(wait) => match tokio::time::timeout(wait, slots.clone().acquire_owned()).await {
                Ok(acquired) => acquired,
                Err(_) => {
                    warn!(host, wait = ?wait, "Timed out waiting for a connection slot");
                    return Err(Error::connection(
                        address,
                        format!("timed out after {wait:?} waiting for a free connection"),
                    ));
                }
            },
            None => slots.clone().acquire_owned().await,
        };
        let permit = acquired.map_err(|e| Error::connection(address, e))?;
        trace!(host, available = slots.available_permits(), "Checked out connection slot");
        Ok(permit)
    }
}
