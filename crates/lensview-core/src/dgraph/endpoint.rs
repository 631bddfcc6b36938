//! Alpha endpoint selection.
//!
//! A deployment usually runs several Dgraph alphas. [`EndpointPool`] keeps
//! the configured list, remembers which ones recently failed, and delegates
//! the choice among the healthy ones to an [`EndpointSelector`].

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Strategy for choosing one of `count` candidates.
pub trait EndpointSelector: Send + Sync {
    /// Returns an index in `0..count`, or `None` when `count` is zero.
    fn select(&self, count: usize) -> Option<usize>;
}

/// Uniform random choice.
#[derive(Debug, Default)]
pub struct RandomEndpoint;

impl EndpointSelector for RandomEndpoint {
    fn select(&self, count: usize) -> Option<usize> {
        if count == 0 {
            return None;
        }
        Some(rand::thread_rng().gen_range(0..count))
    }
}

/// Cycles through candidates in order.
#[derive(Debug, Default)]
pub struct RoundRobinEndpoint {
    next: AtomicUsize,
}

impl EndpointSelector for RoundRobinEndpoint {
    fn select(&self, count: usize) -> Option<usize> {
        if count == 0 {
            return None;
        }
        Some(self.next.fetch_add(1, Ordering::Relaxed) % count)
    }
}

/// Always the first candidate.
#[derive(Debug, Default)]
pub struct FirstEndpoint;

impl EndpointSelector for FirstEndpoint {
    fn select(&self, count: usize) -> Option<usize> {
        (count > 0).then_some(0)
    }
}

/// Configurable selection policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointSelection {
    #[default]
    Random,
    RoundRobin,
    First,
}

impl EndpointSelection {
    /// Build the selector for this policy.
    pub fn selector(self) -> Box<dyn EndpointSelector> {
        match self {
            EndpointSelection::Random => Box::new(RandomEndpoint),
            EndpointSelection::RoundRobin => Box::new(RoundRobinEndpoint::default()),
            EndpointSelection::First => Box::new(FirstEndpoint),
        }
    }

    /// Parse a policy name (`random`, `round_robin`/`round-robin`, `first`).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "random" => Some(EndpointSelection::Random),
            "round_robin" | "round-robin" | "roundrobin" => Some(EndpointSelection::RoundRobin),
            "first" => Some(EndpointSelection::First),
            _ => None,
        }
    }
}

/// Configured endpoints plus health bookkeeping.
pub struct EndpointPool {
    endpoints: Vec<String>,
    unhealthy: Mutex<HashSet<String>>,
    selector: Box<dyn EndpointSelector>,
}

impl EndpointPool {
    pub fn new(endpoints: Vec<String>, selector: Box<dyn EndpointSelector>) -> Self {
        Self {
            endpoints,
            unhealthy: Mutex::new(HashSet::new()),
            selector,
        }
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Pick an endpoint among the healthy ones.
    ///
    /// When every endpoint is marked unhealthy the marks are cleared and the
    /// choice is made among all of them.
    pub fn select(&self) -> Option<String> {
        let mut unhealthy = self.unhealthy.lock().unwrap_or_else(|e| e.into_inner());

        let mut candidates: Vec<&String> = self
            .endpoints
            .iter()
            .filter(|e| !unhealthy.contains(*e))
            .collect();

        if candidates.is_empty() {
            unhealthy.clear();
            candidates = self.endpoints.iter().collect();
        }

        self.selector
            .select(candidates.len())
            .and_then(|i| candidates.get(i))
            .map(|e| (*e).clone())
    }

    /// Exclude an endpoint from selection until it recovers.
    pub fn mark_unhealthy(&self, endpoint: &str) {
        self.unhealthy
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(endpoint.to_string());
    }

    pub fn mark_healthy(&self, endpoint: &str) {
        self.unhealthy
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(endpoint);
    }

    pub fn is_healthy(&self, endpoint: &str) -> bool {
        !self
            .unhealthy
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(endpoint)
    }
}
