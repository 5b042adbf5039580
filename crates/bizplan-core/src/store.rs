use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::PlanError;
use crate::models::FinanceBundle;
use crate::PlanResult;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One saved version of a plan's five input models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanVersion {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Identity of whoever saved this version
    pub actor: String,
    pub created_at: DateTime<Utc>,
    pub payload: FinanceBundle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPlan {
    pub owner: String,
    pub name: String,
    /// Oldest first, strictly increasing version numbers
    pub versions: Vec<PlanVersion>,
}

impl StoredPlan {
    fn latest(&self) -> Option<&PlanVersion> {
        self.versions.last()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub name: String,
    pub latest_version: u32,
    pub updated_at: DateTime<Utc>,
    pub version_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub version: u32,
    pub note: Option<String>,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupEntry {
    pub plan_name: String,
    #[serde(flatten)]
    pub version: PlanVersion,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Versioned plan snapshots keyed by (owner, plan name).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanStore {
    #[serde(default)]
    plans: Vec<StoredPlan>,
}

impl PlanStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, owner: &str, name: &str) -> Option<&StoredPlan> {
        self.plans.iter().find(|p| p.owner == owner && p.name == name)
    }

    /// Saves a new version stamped with the current UTC time.
    pub fn save_version(
        &mut self,
        owner: &str,
        name: &str,
        payload: FinanceBundle,
        note: Option<String>,
        actor: &str,
    ) -> PlanResult<u32> {
        self.save_version_at(owner, name, payload, note, actor, Utc::now())
    }

    /// Saves a new version as `latest + 1` (1 for a new plan).
    pub fn save_version_at(
        &mut self,
        owner: &str,
        name: &str,
        payload: FinanceBundle,
        note: Option<String>,
        actor: &str,
        created_at: DateTime<Utc>,
    ) -> PlanResult<u32> {
        for (field, value) in [("owner", owner), ("name", name), ("actor", actor)] {
            if value.trim().is_empty() {
                return Err(PlanError::InvalidInput {
                    field: field.into(),
                    reason: "Must not be empty".into(),
                });
            }
        }

        let index = match self.plans.iter().position(|p| p.owner == owner && p.name == name) {
            Some(i) => i,
            None => {
                self.plans.push(StoredPlan {
                    owner: owner.to_string(),
                    name: name.to_string(),
                    versions: Vec::new(),
                });
                self.plans.len() - 1
            }
        };
        let plan = &mut self.plans[index];
        let version = plan.latest().map_or(1, |v| v.version + 1);
        plan.versions.push(PlanVersion {
            version,
            note,
            actor: actor.to_string(),
            created_at,
            payload,
        });
        tracing::info!(owner, plan = name, version, "plan version saved");
        Ok(version)
    }

    /// A specific version, or the latest when `version` is `None`.
    pub fn load(&self, owner: &str, name: &str, version: Option<u32>) -> PlanResult<&PlanVersion> {
        let plan = self
            .find(owner, name)
            .ok_or_else(|| PlanError::NotFound(format!("plan '{name}' for owner '{owner}'")))?;
        let found = match version {
            Some(v) => plan.versions.iter().find(|pv| pv.version == v),
            None => plan.latest(),
        };
        found.ok_or_else(|| {
            PlanError::NotFound(format!(
                "version {} of plan '{name}'",
                version.map_or_else(|| "latest".to_string(), |v| v.to_string())
            ))
        })
    }

    /// Every plan of `owner`, sorted by name.
    pub fn list_plans(&self, owner: &str) -> Vec<PlanSummary> {
        let mut out: Vec<PlanSummary> = self
            .plans
            .iter()
            .filter(|p| p.owner == owner)
            .filter_map(|p| {
                p.latest().map(|latest| PlanSummary {
                    name: p.name.clone(),
                    latest_version: latest.version,
                    updated_at: latest.created_at,
                    version_count: p.versions.len(),
                })
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Version history, newest first.
    pub fn list_versions(&self, owner: &str, name: &str) -> PlanResult<Vec<VersionSummary>> {
        let plan = self
            .find(owner, name)
            .ok_or_else(|| PlanError::NotFound(format!("plan '{name}' for owner '{owner}'")))?;
        Ok(plan
            .versions
            .iter()
            .rev()
            .map(|v| VersionSummary {
                version: v.version,
                note: v.note.clone(),
                actor: v.actor.clone(),
                created_at: v.created_at,
            })
            .collect())
    }

    /// Every version of every plan belonging to `owner`.
    pub fn backup(&self, owner: &str) -> Vec<BackupEntry> {
        let mut plans: Vec<&StoredPlan> = self.plans.iter().filter(|p| p.owner == owner).collect();
        plans.sort_by(|a, b| a.name.cmp(&b.name));
        plans
            .into_iter()
            .flat_map(|p| {
                p.versions.iter().map(move |v| BackupEntry {
                    plan_name: p.name.clone(),
                    version: v.clone(),
                })
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Parses a store and checks its key and version invariants.
    pub fn from_json(json: &str) -> PlanResult<Self> {
        let store: PlanStore = serde_json::from_str(json)?;
        store.check_invariants()?;
        Ok(store)
    }

    pub fn to_json(&self) -> PlanResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads a store file; a missing file is an empty store.
    pub fn open(path: &Path) -> PlanResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no plan store yet, starting empty");
            return Ok(Self::new());
        }
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: &Path) -> PlanResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    fn check_invariants(&self) -> PlanResult<()> {
        let mut keys = BTreeSet::new();
        for plan in &self.plans {
            if !keys.insert((plan.owner.as_str(), plan.name.as_str())) {
                return Err(PlanError::Conflict(format!(
                    "duplicate plan '{}' for owner '{}'",
                    plan.name, plan.owner
                )));
            }
            if plan
                .versions
                .windows(2)
                .any(|w| w[1].version <= w[0].version)
            {
                return Err(PlanError::Conflict(format!(
                    "versions of plan '{}' are not strictly increasing",
                    plan.name
                )));
            }
        }
        Ok(())
    }
}
