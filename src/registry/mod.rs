//! Short code registry
//!
//! Owns every `UrlRecord` keyed by short code, plus a reverse index from
//! long URL to code. Both maps live behind one lock so that dedup, collision
//! checks and inserts form a single atomic step.

pub mod generator;

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::analytics::ClickEvent;
use crate::models::UrlRecord;

pub use generator::{generate, Candidate, CodeGenerator, RandomHexGenerator};

/// Default number of random draws before creation gives up
pub const DEFAULT_MAX_GENERATION_ATTEMPTS: usize = 10;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("URL is required")]
    EmptyUrl,
    #[error("validity of {0} minutes is out of range")]
    InvalidValidity(i64),
    #[error("short code '{0}' already exists")]
    CodeTaken(String),
    #[error("no free short code found after {0} attempts")]
    CodeSpaceExhausted(usize),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Outcome of `Registry::create`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    /// The URL was already registered and its existing code was returned
    pub is_existing: bool,
}

/// Just enough of a record to serve a redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

impl LinkTarget {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Default)]
struct RegistryState {
    records: HashMap<String, UrlRecord>,
    codes_by_url: HashMap<String, String>,
}

pub struct Registry {
    state: RwLock<RegistryState>,
    generator: Box<dyn CodeGenerator>,
    max_generation_attempts: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_generator(Box::new(RandomHexGenerator), DEFAULT_MAX_GENERATION_ATTEMPTS)
    }

    pub fn with_generator(generator: Box<dyn CodeGenerator>, max_generation_attempts: usize) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            generator,
            max_generation_attempts: max_generation_attempts.max(1),
        }
    }

    /// Register `url`, or return the code it already has.
    ///
    /// A taken custom code is a caller error; a taken random code is redrawn
    /// up to `max_generation_attempts` times.
    pub async fn create(
        &self,
        url: &str,
        validity_minutes: i64,
        custom_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> RegistryResult<Created> {
        if url.is_empty() {
            return Err(RegistryError::EmptyUrl);
        }

        let expires_at = Duration::try_minutes(validity_minutes)
            .and_then(|validity| now.checked_add_signed(validity))
            .ok_or(RegistryError::InvalidValidity(validity_minutes))?;

        let mut state = self.state.write().await;

        if let Some(code) = state.codes_by_url.get(url) {
            if let Some(existing) = state.records.get(code) {
                return Ok(Created {
                    code: code.clone(),
                    expires_at: existing.expires_at,
                    is_existing: true,
                });
            }
        }

        let mut attempts = 0;
        let code = loop {
            attempts += 1;
            let candidate = generate(self.generator.as_ref(), custom_code);
            if !state.records.contains_key(candidate.as_str()) {
                break candidate.into_code();
            }

            match candidate {
                Candidate::Custom(code) => return Err(RegistryError::CodeTaken(code)),
                Candidate::Random(code) => {
                    debug!(short_code = %code, attempts, "random short code collided");
                    if attempts >= self.max_generation_attempts {
                        return Err(RegistryError::CodeSpaceExhausted(attempts));
                    }
                }
            }
        };

        state
            .records
            .insert(code.clone(), UrlRecord::new(url.to_string(), now, expires_at));
        state.codes_by_url.insert(url.to_string(), code.clone());

        Ok(Created {
            code,
            expires_at,
            is_existing: false,
        })
    }

    /// Snapshot of the record behind `code`
    pub async fn lookup(&self, code: &str) -> Option<UrlRecord> {
        self.state.read().await.records.get(code).cloned()
    }

    /// Redirect target and expiry for `code`, without copying click history
    pub async fn target(&self, code: &str) -> Option<LinkTarget> {
        self.state
            .read()
            .await
            .records
            .get(code)
            .map(|record| LinkTarget {
                url: record.url.clone(),
                expires_at: record.expires_at,
            })
    }

    /// Append a click to `code`'s history. Returns false if the record is gone.
    pub async fn append_click(&self, code: &str, event: ClickEvent) -> bool {
        match self.state.write().await.records.get_mut(code) {
            Some(record) => {
                record.clicks.push(event);
                true
            }
            None => false,
        }
    }

    /// Drop every record that expired more than `grace` before `now`.
    /// Returns the number of records removed.
    pub async fn sweep_expired(&self, now: DateTime<Utc>, grace: Duration) -> usize {
        let mut state = self.state.write().await;
        let RegistryState {
            records,
            codes_by_url,
        } = &mut *state;

        let before = records.len();
        records.retain(|_, record| {
            let keep = record
                .expires_at
                .checked_add_signed(grace)
                .map_or(true, |deadline| now <= deadline);
            if !keep {
                codes_by_url.remove(&record.url);
            }
            keep
        });

        before - records.len()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
