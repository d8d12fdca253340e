//! Scenario store: named, persisted selection snapshots.
//!
//! Every operation requires a signed-in owner and checks it, and any name it
//! is given, before touching the backend. Only the owner may update or delete
//! a scenario; shared scenarios can be read by any signed-in user.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tally_core::UsageSelection;
use tracing::{debug, info};

use crate::backend::DocumentBackend;
use crate::error::{StoreError, StoreResult};

/// Backend collection holding scenarios.
pub const SCENARIOS: &str = "scenarios";

/// A named snapshot of a usage selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub state: UsageSelection,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(default)]
    pub shared: bool,
}

/// Scenario as stored; the id is the document key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredScenario {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    state: UsageSelection,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    created_by: String,
    #[serde(default)]
    shared: bool,
}

impl StoredScenario {
    fn into_scenario(self, id: String) -> Scenario {
        Scenario {
            id,
            name: self.name,
            description: self.description,
            state: self.state,
            created_at: self.created_at,
            updated_at: self.updated_at,
            created_by: self.created_by,
            shared: self.shared,
        }
    }
}

impl From<&Scenario> for StoredScenario {
    fn from(scenario: &Scenario) -> Self {
        Self {
            name: scenario.name.clone(),
            description: scenario.description.clone(),
            state: scenario.state.clone(),
            created_at: scenario.created_at,
            updated_at: scenario.updated_at,
            created_by: scenario.created_by.clone(),
            shared: scenario.shared,
        }
    }
}

/// Partial update of a scenario.
///
/// Id, creation time and owner are not part of a patch and never change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<UsageSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared: Option<bool>,
}

impl ScenarioPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_state(mut self, state: UsageSelection) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_shared(mut self, shared: bool) -> Self {
        self.shared = Some(shared);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.state.is_none() && self.shared.is_none()
    }

    fn apply(self, scenario: &mut Scenario) {
        if let Some(name) = self.name {
            scenario.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            scenario.description = Some(description);
        }
        if let Some(state) = self.state {
            scenario.state = state;
        }
        if let Some(shared) = self.shared {
            scenario.shared = shared;
        }
    }
}

/// Persistence capability for scenarios.
#[async_trait]
pub trait ScenarioRepository: Send + Sync {
    /// Scenarios created by `owner`, most recently updated first.
    async fn list(&self, owner: &str) -> StoreResult<Vec<Scenario>>;

    async fn get(&self, owner: &str, id: &str) -> StoreResult<Scenario>;

    async fn save(
        &self,
        owner: &str,
        name: &str,
        state: &UsageSelection,
        description: Option<&str>,
    ) -> StoreResult<Scenario>;

    async fn update(&self, owner: &str, id: &str, patch: ScenarioPatch) -> StoreResult<Scenario>;

    async fn delete(&self, owner: &str, id: &str) -> StoreResult<()>;
}

/// Return the trimmed owner, or an authorization error if there is none.
pub(crate) fn require_owner(owner: &str) -> StoreResult<&str> {
    let owner = owner.trim();
    if owner.is_empty() {
        return Err(StoreError::Authorization);
    }
    Ok(owner)
}

fn require_name(name: &str) -> StoreResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::validation("scenario name must not be empty"));
    }
    Ok(name)
}

fn check_state(state: &UsageSelection) -> StoreResult<()> {
    state
        .validate()
        .map_err(|err| StoreError::validation(err.to_string()))
}

/// [`ScenarioRepository`] over any [`DocumentBackend`].
#[derive(Debug, Clone)]
pub struct ScenarioStore<B> {
    backend: B,
}

impl<B: DocumentBackend> ScenarioStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn load(&self, id: &str) -> StoreResult<Scenario> {
        let data = self
            .backend
            .get(SCENARIOS, id)
            .await?
            .ok_or_else(|| StoreError::not_found(SCENARIOS, id))?;
        let stored: StoredScenario = serde_json::from_value(data)?;
        Ok(stored.into_scenario(id.to_string()))
    }

    /// Load a scenario the owner is allowed to modify.
    async fn load_owned(&self, owner: &str, id: &str) -> StoreResult<Scenario> {
        let scenario = self.load(id).await?;
        if scenario.created_by != owner {
            return Err(StoreError::permission_denied(SCENARIOS, id));
        }
        Ok(scenario)
    }
}

#[async_trait]
impl<B: DocumentBackend> ScenarioRepository for ScenarioStore<B> {
    async fn list(&self, owner: &str) -> StoreResult<Vec<Scenario>> {
        let owner = require_owner(owner)?;

        let documents = self
            .backend
            .query_eq(SCENARIOS, "createdBy", &Value::String(owner.to_string()))
            .await?;

        let mut scenarios = documents
            .into_iter()
            .map(|doc| -> StoreResult<Scenario> {
                let stored: StoredScenario = serde_json::from_value(doc.data)?;
                Ok(stored.into_scenario(doc.id))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        scenarios.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        debug!(owner, count = scenarios.len(), "Listed scenarios");
        Ok(scenarios)
    }

    async fn get(&self, owner: &str, id: &str) -> StoreResult<Scenario> {
        let owner = require_owner(owner)?;
        let scenario = self.load(id).await?;
        if scenario.created_by != owner && !scenario.shared {
            return Err(StoreError::permission_denied(SCENARIOS, id));
        }
        Ok(scenario)
    }

    async fn save(
        &self,
        owner: &str,
        name: &str,
        state: &UsageSelection,
        description: Option<&str>,
    ) -> StoreResult<Scenario> {
        let owner = require_owner(owner)?;
        let name = require_name(name)?;
        check_state(state)?;

        let now = Utc::now();
        let stored = StoredScenario {
            name: name.to_string(),
            description: description.map(str::to_string),
            state: state.clone(),
            created_at: now,
            updated_at: now,
            created_by: owner.to_string(),
            shared: false,
        };

        let id = self
            .backend
            .insert(SCENARIOS, serde_json::to_value(&stored)?)
            .await?;

        info!(owner, id = %id, "Saved scenario '{}'", name);
        Ok(stored.into_scenario(id))
    }

    async fn update(&self, owner: &str, id: &str, patch: ScenarioPatch) -> StoreResult<Scenario> {
        let owner = require_owner(owner)?;
        if let Some(name) = &patch.name {
            require_name(name)?;
        }
        if let Some(state) = &patch.state {
            check_state(state)?;
        }

        let mut scenario = self.load_owned(owner, id).await?;
        patch.apply(&mut scenario);
        scenario.updated_at = Utc::now().max(scenario.created_at);

        self.backend
            .put(SCENARIOS, id, serde_json::to_value(StoredScenario::from(&scenario))?)
            .await?;

        info!(owner, id, "Updated scenario '{}'", scenario.name);
        Ok(scenario)
    }

    async fn delete(&self, owner: &str, id: &str) -> StoreResult<()> {
        let owner = require_owner(owner)?;
        self.load_owned(owner, id).await?;

        if !self.backend.delete(SCENARIOS, id).await? {
            return Err(StoreError::not_found(SCENARIOS, id));
        }

        info!(owner, id, "Deleted scenario");
        Ok(())
    }
}
