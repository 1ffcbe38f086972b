//! Skill Index Builder
//!
//! Batch job that rebuilds the skill reverse index from scratch: deletes
//! every existing `skill:*:employees` set, scans all employee records,
//! assigns each valid employee 2-4 random skills from the fixed vocabulary,
//! writes one membership set per skill, then verifies by reading the sets
//! back. Runs as the `rosterd index` subcommand, independent of serving.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use crate::store::keys::{
    EMPLOYEE_KEY_PATTERN, SKILL_KEY_PATTERN, employee_id_from_key, skill_from_key, skill_key,
};
use crate::store::{Store, StoreError};

/// The fixed, closed skill vocabulary. Skills exist only as key-name
/// suffixes; they are not stored as entities.
pub const SKILL_VOCABULARY: [&str; 6] = ["aws", "docker", "gcp", "sql", "ai", "golang"];

/// Minimum skills assigned per employee.
pub const MIN_SKILLS_PER_EMPLOYEE: usize = 2;

/// Maximum skills assigned per employee.
pub const MAX_SKILLS_PER_EMPLOYEE: usize = 4;

/// Why an employee key was left out of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No record behind the key (absent, or unparseable as JSON).
    Missing,
    /// The record parsed but is not a JSON object.
    NotAnObject,
    /// The record has no usable `id` field.
    MissingId,
}

/// Per-reason skip counters for one build run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    pub missing: usize,
    pub not_an_object: usize,
    pub missing_id: usize,
}

impl SkipCounts {
    fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Missing => self.missing += 1,
            SkipReason::NotAnObject => self.not_an_object += 1,
            SkipReason::MissingId => self.missing_id += 1,
        }
    }

    /// Total skipped employees across all reasons.
    pub fn total(&self) -> usize {
        self.missing + self.not_an_object + self.missing_id
    }
}

/// Outcome of one build run.
#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    /// Employee keys found in the store.
    pub discovered: usize,
    /// Employees that received a skill assignment.
    pub indexed: usize,
    /// Employees skipped, by reason.
    pub skipped: SkipCounts,
    /// Members written per skill. Skills with no assignees are absent.
    pub written: BTreeMap<String, usize>,
    /// Membership counts read back by the verification pass, if it ran
    /// and succeeded. `None` never invalidates the build.
    pub verified: Option<BTreeMap<String, usize>>,
}

/// Rebuilds the skill reverse index against a [`Store`].
///
/// Not safe to run concurrently with itself; a second run racing the
/// delete/repopulate steps can interleave inconsistently. Single-writer is
/// a deployment constraint.
pub struct SkillIndexer {
    store: Store,
    seed: Option<u64>,
    verify: bool,
}

impl SkillIndexer {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            seed: None,
            verify: true,
        }
    }

    /// Seed the skill-assignment RNG for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable or disable the read-back verification pass.
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Run one full rebuild.
    ///
    /// # Errors
    /// Returns [`StoreError`] only for store failures during the delete,
    /// scan and write steps. Per-record problems are counted and logged,
    /// and a verification failure downgrades to a warning.
    pub async fn run(&self) -> Result<IndexReport, StoreError> {
        let stale = self.store.scan_keys(SKILL_KEY_PATTERN).await?;
        if stale.is_empty() {
            tracing::info!("No existing skill sets to delete");
        } else {
            let deleted = self.store.delete_keys(&stale).await?;
            tracing::info!(deleted, "Deleted existing skill sets");
        }

        let mut keys = self.store.scan_keys(EMPLOYEE_KEY_PATTERN).await?;
        keys.sort();
        tracing::info!(employees = keys.len(), "Scanning employee records");

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut report = IndexReport {
            discovered: keys.len(),
            ..IndexReport::default()
        };
        let mut assignments: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();

        for key in &keys {
            let id = match self.resolve_employee_id(key).await? {
                Ok(id) => id,
                Err(reason) => {
                    let key_id = employee_id_from_key(key).unwrap_or(key);
                    tracing::warn!(employee = key_id, ?reason, "Skipping employee");
                    report.skipped.record(reason);
                    continue;
                }
            };

            let count = rng.random_range(MIN_SKILLS_PER_EMPLOYEE..=MAX_SKILLS_PER_EMPLOYEE);
            for skill in SKILL_VOCABULARY.choose_multiple(&mut rng, count).copied() {
                assignments.entry(skill).or_default().push(id.clone());
            }
            tracing::debug!(employee = %id, skills = count, "Assigned skills");
            report.indexed += 1;
        }

        for (skill, ids) in &assignments {
            self.store.set_add(&skill_key(skill), ids).await?;
            report.written.insert((*skill).to_string(), ids.len());
            tracing::info!(skill, members = ids.len(), "Wrote skill set");
        }

        if self.verify {
            match self.verify_sets().await {
                Ok(counts) => report.verified = Some(counts),
                Err(e) => {
                    tracing::warn!(error = %e, "Verification pass failed; build result stands");
                }
            }
        }

        tracing::info!(
            discovered = report.discovered,
            indexed = report.indexed,
            skipped = report.skipped.total(),
            skills = report.written.len(),
            "Skill index build complete"
        );
        Ok(report)
    }

    /// Resolve the record behind an employee key to the id it should be
    /// indexed under: the JSON-embedded `id`, not the id in the key.
    async fn resolve_employee_id(&self, key: &str) -> Result<Result<String, SkipReason>, StoreError> {
        let record = match self.store.get(key).await? {
            Some(record) => record,
            None => return Ok(Err(SkipReason::Missing)),
        };
        if !record.is_object() {
            return Ok(Err(SkipReason::NotAnObject));
        }
        Ok(embedded_id(&record).ok_or(SkipReason::MissingId))
    }

    /// Read-only verification: report membership counts per skill set.
    async fn verify_sets(&self) -> Result<BTreeMap<String, usize>, StoreError> {
        let mut keys = self.store.scan_keys(SKILL_KEY_PATTERN).await?;
        keys.sort();

        let mut counts = BTreeMap::new();
        for key in &keys {
            let members = self.store.set_members(key).await?;
            let skill = skill_from_key(key).unwrap_or(key);
            tracing::info!(skill, members = members.len(), "Verified skill set");
            counts.insert(skill.to_string(), members.len());
        }
        Ok(counts)
    }
}

/// Extract the `id` field as the string the index stores. Numeric ids are
/// stringified; empty strings do not qualify.
fn embedded_id(record: &Value) -> Option<String> {
    match record.get("id") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
