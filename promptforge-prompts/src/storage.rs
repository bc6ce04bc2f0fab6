//! Storage backend trait and in-memory implementation
//!
//! This module defines the storage abstraction used by the prompt service
//! to persist prompts, version snapshots, variable sets, and share grants.
//! Restore is a single storage operation so a backend can make it atomic;
//! the in-memory store does so under one write lock.

use promptforge_common::{PromptForgeError, PromptId, Result, ShareId, UserId, VersionId};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::diff::sort_newest_first;
use crate::model::{Prompt, PromptShare, PromptVersion, SharePermission, Variable};

/// Trait for storage backends that persist prompt libraries
#[async_trait::async_trait]
pub trait PromptStore: Send + Sync {
    /// Retrieve a prompt by id
    async fn fetch_prompt(&self, id: PromptId) -> Result<Option<Prompt>>;

    /// Store a new prompt
    async fn create_prompt(&self, prompt: &Prompt) -> Result<()>;

    /// Overwrite an existing prompt
    async fn update_prompt(&self, prompt: &Prompt) -> Result<()>;

    /// Remove a prompt along with its versions, variables, and shares
    async fn delete_prompt(&self, id: PromptId) -> Result<bool>;

    /// List all prompts owned by a user, most recently updated first
    async fn list_prompts_for_owner(&self, owner: UserId) -> Result<Vec<Prompt>>;

    /// Store a new version snapshot
    ///
    /// Version strings are unique within a prompt; callers check this
    /// before writing and the backend refuses violations.
    async fn create_version(&self, version: &PromptVersion) -> Result<()>;

    /// List a prompt's version snapshots, newest first
    async fn fetch_versions(&self, prompt_id: PromptId) -> Result<Vec<PromptVersion>>;

    /// Remove the given version snapshots, returning how many existed
    async fn delete_versions(&self, prompt_id: PromptId, ids: &[VersionId]) -> Result<usize>;

    /// Apply a version restore in one operation
    ///
    /// Writes the updated prompt, replaces its variable set, and records
    /// the new version snapshot together, so a failure partway cannot
    /// leave the prompt pointing at a version that was never recorded.
    async fn restore_snapshot(
        &self,
        prompt: &Prompt,
        variables: &[Variable],
        version: &PromptVersion,
    ) -> Result<()>;

    /// Retrieve a prompt's variable set in display order
    async fn fetch_variables(&self, prompt_id: PromptId) -> Result<Vec<Variable>>;

    /// Replace a prompt's variable set
    async fn replace_variables(&self, prompt_id: PromptId, variables: &[Variable]) -> Result<()>;

    /// Store a new share grant
    async fn create_share(&self, share: &PromptShare) -> Result<()>;

    /// Change a grant's permission, returning the updated grant
    async fn update_share(&self, id: ShareId, permission: SharePermission) -> Result<PromptShare>;

    /// Remove a share grant
    async fn delete_share(&self, id: ShareId) -> Result<bool>;

    /// Retrieve a share grant by id
    async fn fetch_share(&self, id: ShareId) -> Result<Option<PromptShare>>;

    /// List all grants on a prompt
    async fn fetch_shares_for_prompt(&self, prompt_id: PromptId) -> Result<Vec<PromptShare>>;

    /// List all grants naming a user as recipient
    async fn fetch_shares_for_user(&self, user: UserId) -> Result<Vec<PromptShare>>;
}

#[derive(Debug, Default)]
struct MemoryState {
    prompts: HashMap<PromptId, Prompt>,
    versions: HashMap<PromptId, Vec<PromptVersion>>,
    variables: HashMap<PromptId, Vec<Variable>>,
    shares: HashMap<ShareId, PromptShare>,
}

/// In-memory storage backend
///
/// The default backend for tests and single-process use. All state lives
/// behind one lock, which is what makes [`PromptStore::restore_snapshot`]
/// atomic here. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|e| PromptForgeError::storage(format!("Lock error: {e}")))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|e| PromptForgeError::storage(format!("Lock error: {e}")))
    }
}

fn push_version(state: &mut MemoryState, version: &PromptVersion) -> Result<()> {
    let versions = state.versions.entry(version.prompt_id).or_default();
    if versions.iter().any(|v| v.version == version.version) {
        return Err(PromptForgeError::storage(format!(
            "Version {} already exists for prompt {}",
            version.version, version.prompt_id
        )));
    }
    versions.push(version.clone());
    Ok(())
}

fn ordered_variables(variables: &[Variable]) -> Vec<Variable> {
    let mut ordered = variables.to_vec();
    ordered.sort_by(|a, b| {
        a.order_index
            .cmp(&b.order_index)
            .then_with(|| a.name.cmp(&b.name))
    });
    ordered
}

#[async_trait::async_trait]
impl PromptStore for MemoryStore {
    async fn fetch_prompt(&self, id: PromptId) -> Result<Option<Prompt>> {
        Ok(self.read()?.prompts.get(&id).cloned())
    }

    async fn create_prompt(&self, prompt: &Prompt) -> Result<()> {
        let mut state = self.write()?;
        if state.prompts.contains_key(&prompt.id) {
            return Err(PromptForgeError::storage(format!(
                "Prompt {} already exists",
                prompt.id
            )));
        }
        state.prompts.insert(prompt.id, prompt.clone());
        Ok(())
    }

    async fn update_prompt(&self, prompt: &Prompt) -> Result<()> {
        let mut state = self.write()?;
        if !state.prompts.contains_key(&prompt.id) {
            return Err(PromptForgeError::prompt_not_found(prompt.id.to_string()));
        }
        state.prompts.insert(prompt.id, prompt.clone());
        Ok(())
    }

    async fn delete_prompt(&self, id: PromptId) -> Result<bool> {
        let mut state = self.write()?;
        let existed = state.prompts.remove(&id).is_some();
        state.versions.remove(&id);
        state.variables.remove(&id);
        state.shares.retain(|_, share| share.prompt_id != id);
        Ok(existed)
    }

    async fn list_prompts_for_owner(&self, owner: UserId) -> Result<Vec<Prompt>> {
        let state = self.read()?;
        let mut prompts: Vec<Prompt> = state
            .prompts
            .values()
            .filter(|prompt| prompt.owner == owner)
            .cloned()
            .collect();
        prompts.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(prompts)
    }

    async fn create_version(&self, version: &PromptVersion) -> Result<()> {
        let mut state = self.write()?;
        push_version(&mut state, version)
    }

    async fn fetch_versions(&self, prompt_id: PromptId) -> Result<Vec<PromptVersion>> {
        let state = self.read()?;
        let mut versions = state.versions.get(&prompt_id).cloned().unwrap_or_default();
        sort_newest_first(&mut versions);
        Ok(versions)
    }

    async fn delete_versions(&self, prompt_id: PromptId, ids: &[VersionId]) -> Result<usize> {
        let mut state = self.write()?;
        let Some(versions) = state.versions.get_mut(&prompt_id) else {
            return Ok(0);
        };
        let before = versions.len();
        versions.retain(|v| !ids.contains(&v.id));
        Ok(before - versions.len())
    }

    async fn restore_snapshot(
        &self,
        prompt: &Prompt,
        variables: &[Variable],
        version: &PromptVersion,
    ) -> Result<()> {
        let mut state = self.write()?;
        if !state.prompts.contains_key(&prompt.id) {
            return Err(PromptForgeError::prompt_not_found(prompt.id.to_string()));
        }
        // Everything under one write lock; no partially restored prompt
        push_version(&mut state, version)?;
        state.prompts.insert(prompt.id, prompt.clone());
        state.variables.insert(prompt.id, variables.to_vec());
        Ok(())
    }

    async fn fetch_variables(&self, prompt_id: PromptId) -> Result<Vec<Variable>> {
        let state = self.read()?;
        let variables = state.variables.get(&prompt_id).cloned().unwrap_or_default();
        Ok(ordered_variables(&variables))
    }

    async fn replace_variables(&self, prompt_id: PromptId, variables: &[Variable]) -> Result<()> {
        let mut state = self.write()?;
        state.variables.insert(prompt_id, variables.to_vec());
        Ok(())
    }

    async fn create_share(&self, share: &PromptShare) -> Result<()> {
        let mut state = self.write()?;
        state.shares.insert(share.id, share.clone());
        Ok(())
    }

    async fn update_share(&self, id: ShareId, permission: SharePermission) -> Result<PromptShare> {
        let mut state = self.write()?;
        let share = state
            .shares
            .get_mut(&id)
            .ok_or(PromptForgeError::ShareNotFound)?;
        share.permission = permission;
        Ok(share.clone())
    }

    async fn delete_share(&self, id: ShareId) -> Result<bool> {
        Ok(self.write()?.shares.remove(&id).is_some())
    }

    async fn fetch_share(&self, id: ShareId) -> Result<Option<PromptShare>> {
        Ok(self.read()?.shares.get(&id).cloned())
    }

    async fn fetch_shares_for_prompt(&self, prompt_id: PromptId) -> Result<Vec<PromptShare>> {
        let state = self.read()?;
        let mut shares: Vec<PromptShare> = state
            .shares
            .values()
            .filter(|share| share.prompt_id == prompt_id)
            .cloned()
            .collect();
        shares.sort_by_key(|share| share.created_at);
        Ok(shares)
    }

    async fn fetch_shares_for_user(&self, user: UserId) -> Result<Vec<PromptShare>> {
        let state = self.read()?;
        let mut shares: Vec<PromptShare> = state
            .shares
            .values()
            .filter(|share| share.shared_with == user)
            .cloned()
            .collect();
        shares.sort_by_key(|share| share.created_at);
        Ok(shares)
    }
}
