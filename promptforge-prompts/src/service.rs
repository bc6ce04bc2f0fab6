//! Prompt service workflows
//!
//! The orchestration layer every caller goes through. Each method runs the
//! full rule chain for its operation: authorization, validation, conflict
//! gating, version arithmetic, and finally storage. The service owns no
//! state beyond its store and clock handles, so it is cheap to clone per
//! request context.

use chrono::{DateTime, Duration, Utc};
use promptforge_common::{
    Clock, PromptForgeError, PromptId, Result, ShareId, SystemClock, UserId, VersionId,
};
use promptforge_templating::render;
use std::collections::HashMap;
use std::sync::Arc;

use crate::authorization::{
    assert_not_self_share, assert_prompt_owner, assert_session, assert_share_exists,
    assert_share_modify_authorization, ShareAction,
};
use crate::conflict::ConflictDetector;
use crate::diff::{diff_contents, previous_version, unified_diff, VersionDiff};
use crate::export::{self, ExportBundle, ExportFormat};
use crate::model::{
    CreatePrompt, CreateShare, Prompt, PromptShare, PromptVersion, UpdatePrompt, UpdateShare,
    Variable,
};
use crate::storage::PromptStore;
use crate::validation::{validate_new_prompt, validate_update};
use crate::version::{BumpKind, SemanticVersion, VersionError};

/// Label used for the absent side when diffing the oldest version
const EMPTY_DIFF_LABEL: &str = "(empty)";

/// High-level prompt operations over a storage backend
pub struct PromptService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for PromptService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: PromptStore> PromptService<S> {
    /// Create a service over the given store using the system clock
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Create a service with an explicit clock, used by tests to control time
    pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    // A fresh `updated_at` that is strictly newer than the previous one,
    // even when the clock has not advanced between saves.
    fn next_updated_at(&self, previous: DateTime<Utc>) -> DateTime<Utc> {
        let now = self.clock.now();
        let floor = previous + Duration::milliseconds(1);
        if now > floor {
            now
        } else {
            floor
        }
    }

    async fn load_prompt(&self, id: PromptId) -> Result<Prompt> {
        self.store
            .fetch_prompt(id)
            .await?
            .ok_or_else(|| PromptForgeError::prompt_not_found(id.to_string()))
    }

    async fn assert_read_access(&self, actor: UserId, prompt: &Prompt) -> Result<()> {
        if prompt.owner == actor {
            return Ok(());
        }
        let shares = self.store.fetch_shares_for_prompt(prompt.id).await?;
        if shares.iter().any(|share| share.shared_with == actor) {
            return Ok(());
        }
        Err(PromptForgeError::authorization(
            "You do not have access to this prompt",
        ))
    }

    async fn assert_write_access(&self, actor: UserId, prompt: &Prompt) -> Result<()> {
        if prompt.owner == actor {
            return Ok(());
        }
        let shares = self.store.fetch_shares_for_prompt(prompt.id).await?;
        if shares
            .iter()
            .any(|share| share.shared_with == actor && share.permission.allows_write())
        {
            return Ok(());
        }
        Err(PromptForgeError::authorization(
            "You do not have write access to this prompt",
        ))
    }

    fn assert_version_manager(&self, actor: UserId, prompt: &Prompt) -> Result<()> {
        if prompt.owner != actor {
            return Err(PromptForgeError::authorization(
                "Only the prompt owner can manage versions",
            ));
        }
        Ok(())
    }

    /// Create a new prompt at version 1.0.0
    ///
    /// No version snapshot is recorded; versions are created explicitly.
    pub async fn create_prompt(&self, owner: UserId, payload: CreatePrompt) -> Result<Prompt> {
        validate_new_prompt(&payload)?;
        let now = self.clock.now();
        let prompt = Prompt {
            id: PromptId::new(),
            owner,
            title: payload.title,
            description: normalize_description(payload.description),
            content: payload.content,
            tags: payload.tags,
            visibility: payload.visibility,
            version: SemanticVersion::INITIAL,
            is_favorite: false,
            created_at: now,
            updated_at: now,
        };
        self.store.create_prompt(&prompt).await?;
        self.store
            .replace_variables(prompt.id, &payload.variables)
            .await?;
        tracing::info!("Created prompt {} for user {}", prompt.id, owner);
        Ok(prompt)
    }

    /// Load a prompt with its variable set
    ///
    /// Readable by the owner and by any user holding a share grant. The
    /// shared visibility marker alone grants nothing.
    pub async fn fetch_prompt_for(
        &self,
        actor: UserId,
        id: PromptId,
    ) -> Result<(Prompt, Vec<Variable>)> {
        let prompt = self.load_prompt(id).await?;
        self.assert_read_access(actor, &prompt).await?;
        let variables = self.store.fetch_variables(id).await?;
        Ok((prompt, variables))
    }

    /// List a user's own prompts, most recently updated first
    pub async fn list_prompts(&self, owner: UserId) -> Result<Vec<Prompt>> {
        self.store.list_prompts_for_owner(owner).await
    }

    /// List prompts shared with a user, paired with the grant
    pub async fn list_shared_with(&self, user: UserId) -> Result<Vec<(Prompt, PromptShare)>> {
        let shares = self.store.fetch_shares_for_user(user).await?;
        let mut entries = Vec::with_capacity(shares.len());
        for share in shares {
            if let Some(prompt) = self.store.fetch_prompt(share.prompt_id).await? {
                entries.push((prompt, share));
            }
        }
        Ok(entries)
    }

    /// Save edits to a prompt
    ///
    /// Requires write access. The caller's conflict detector observes the
    /// live prompt before the save is applied, so a concurrent save since
    /// the session loaded blocks this one unless `force` is set. After a
    /// successful save the detector is reloaded against the new state.
    ///
    /// Favorite-only updates skip the conflict gate's edit flag and leave
    /// `updated_at` untouched. Content-affecting saves advance `updated_at`
    /// strictly past its previous value.
    pub async fn save_prompt(
        &self,
        actor: UserId,
        id: PromptId,
        update: UpdatePrompt,
        detector: &mut ConflictDetector,
        force: bool,
    ) -> Result<Prompt> {
        let mut prompt = self.load_prompt(id).await?;
        self.assert_write_access(actor, &prompt).await?;

        let content_affecting = update.is_content_affecting();
        detector.observe(prompt.updated_at, content_affecting);
        detector.check_save(force)?;

        validate_update(&update)?;

        if let Some(title) = update.title {
            prompt.title = title;
        }
        if let Some(description) = update.description {
            prompt.description = normalize_description(Some(description));
        }
        if let Some(content) = update.content {
            prompt.content = content;
        }
        if let Some(tags) = update.tags {
            prompt.tags = tags;
        }
        if let Some(visibility) = update.visibility {
            prompt.visibility = visibility;
        }
        if let Some(is_favorite) = update.is_favorite {
            prompt.is_favorite = is_favorite;
        }
        if content_affecting {
            prompt.updated_at = self.next_updated_at(prompt.updated_at);
        }

        self.store.update_prompt(&prompt).await?;
        if let Some(variables) = update.variables {
            self.store.replace_variables(id, &variables).await?;
        }
        detector.reload(prompt.updated_at);
        tracing::info!("Saved prompt {} for user {}", id, actor);
        Ok(prompt)
    }

    /// Delete a prompt along with its versions, variables, and shares
    pub async fn delete_prompt(&self, actor: UserId, id: PromptId) -> Result<()> {
        let prompt = self.load_prompt(id).await?;
        assert_prompt_owner(actor, prompt.owner)
            .map_err(|_| PromptForgeError::authorization("Only the prompt owner can delete it"))?;
        self.store.delete_prompt(id).await?;
        tracing::info!("Deleted prompt {} for user {}", id, actor);
        Ok(())
    }

    /// Render a prompt's content with the supplied variable values
    pub async fn render_preview(
        &self,
        actor: UserId,
        id: PromptId,
        values: &HashMap<String, String>,
    ) -> Result<String> {
        let (prompt, variables) = self.fetch_prompt_for(actor, id).await?;
        let template_variables: Vec<_> = variables
            .iter()
            .map(Variable::to_template_variable)
            .collect();
        Ok(render(&prompt.content, &template_variables, values))
    }

    /// Record a new version snapshot and move the prompt to it
    ///
    /// The version string is the requested bump of the current version.
    /// The snapshot embeds the live variable set by value, so later edits
    /// to the prompt's variables never change what this version restores.
    pub async fn create_version(
        &self,
        actor: UserId,
        id: PromptId,
        bump: BumpKind,
        message: Option<String>,
    ) -> Result<(Prompt, PromptVersion)> {
        let mut prompt = self.load_prompt(id).await?;
        self.assert_version_manager(actor, &prompt)?;

        let next = prompt.version.bump(bump);
        let existing = self.store.fetch_versions(id).await?;
        if existing.iter().any(|v| v.version == next) {
            return Err(VersionError::Duplicate { version: next }.into());
        }

        let now = self.clock.now();
        let variables = self.store.fetch_variables(id).await?;
        let snapshot = PromptVersion {
            id: VersionId::new(),
            prompt_id: id,
            version: next,
            content: prompt.content.clone(),
            message,
            variables,
            created_at: now,
        };
        self.store.create_version(&snapshot).await?;

        prompt.version = next;
        prompt.updated_at = self.next_updated_at(prompt.updated_at);
        self.store.update_prompt(&prompt).await?;
        tracing::info!("Created version {} of prompt {}", next, id);
        Ok((prompt, snapshot))
    }

    /// List a prompt's version history, newest first
    pub async fn list_versions(&self, actor: UserId, id: PromptId) -> Result<Vec<PromptVersion>> {
        let prompt = self.load_prompt(id).await?;
        self.assert_read_access(actor, &prompt).await?;
        self.store.fetch_versions(id).await
    }

    /// Restore a prompt to an earlier version
    ///
    /// Restoring never rewrites history: the prompt's content and variable
    /// set are reset to the snapshot's, the version takes a patch bump, and
    /// a new snapshot records the restore with a "Restored from" message.
    /// All three writes land as one storage operation. The conflict gate
    /// applies exactly as for saves.
    pub async fn restore_version(
        &self,
        actor: UserId,
        id: PromptId,
        version_id: VersionId,
        detector: &mut ConflictDetector,
        force: bool,
    ) -> Result<(Prompt, PromptVersion)> {
        let mut prompt = self.load_prompt(id).await?;
        self.assert_version_manager(actor, &prompt)?;

        detector.observe(prompt.updated_at, true);
        detector.check_save(force)?;

        let versions = self.store.fetch_versions(id).await?;
        let source = versions
            .iter()
            .find(|v| v.id == version_id)
            .ok_or_else(|| PromptForgeError::version_not_found(version_id.to_string()))?
            .clone();

        let next = prompt.version.bump(BumpKind::Patch);
        let now = self.clock.now();
        prompt.content = source.content.clone();
        prompt.version = next;
        prompt.updated_at = self.next_updated_at(prompt.updated_at);

        let record = PromptVersion {
            id: VersionId::new(),
            prompt_id: id,
            version: next,
            content: source.content.clone(),
            message: Some(format!("Restored from {}", source.version)),
            variables: source.variables.clone(),
            created_at: now,
        };
        self.store
            .restore_snapshot(&prompt, &source.variables, &record)
            .await?;
        detector.reload(prompt.updated_at);
        tracing::info!(
            "Restored prompt {} from version {} as {}",
            id,
            source.version,
            next
        );
        Ok((prompt, record))
    }

    /// Delete version snapshots
    ///
    /// The snapshot the prompt currently points at is never deletable.
    /// Unknown ids are ignored; the count of removed snapshots is returned.
    pub async fn delete_versions(
        &self,
        actor: UserId,
        id: PromptId,
        ids: &[VersionId],
    ) -> Result<usize> {
        let prompt = self.load_prompt(id).await?;
        self.assert_version_manager(actor, &prompt)?;

        let versions = self.store.fetch_versions(id).await?;
        if versions
            .iter()
            .any(|v| ids.contains(&v.id) && v.version == prompt.version)
        {
            return Err(VersionError::CannotDeleteCurrent {
                version: prompt.version,
            }
            .into());
        }
        let removed = self.store.delete_versions(id, ids).await?;
        tracing::info!("Deleted {} versions of prompt {}", removed, id);
        Ok(removed)
    }

    /// Compare a version against its predecessor in history
    ///
    /// The oldest version is compared against empty content, so every line
    /// it has shows as added.
    pub async fn diff_versions(
        &self,
        actor: UserId,
        id: PromptId,
        version_id: VersionId,
    ) -> Result<VersionDiff> {
        let (selected, previous) = self.diff_pair(actor, id, version_id).await?;
        let (old_content, old_label) = match &previous {
            Some(previous) => (previous.content.as_str(), previous.version.to_string()),
            None => ("", EMPTY_DIFF_LABEL.to_string()),
        };
        Ok(diff_contents(
            old_content,
            &selected.content,
            old_label,
            selected.version.to_string(),
        ))
    }

    /// Compare a version against its predecessor as a unified diff string
    pub async fn unified_diff_versions(
        &self,
        actor: UserId,
        id: PromptId,
        version_id: VersionId,
    ) -> Result<String> {
        let (selected, previous) = self.diff_pair(actor, id, version_id).await?;
        let (old_content, old_label) = match &previous {
            Some(previous) => (previous.content.as_str(), previous.version.to_string()),
            None => ("", EMPTY_DIFF_LABEL.to_string()),
        };
        Ok(unified_diff(
            old_content,
            &selected.content,
            &old_label,
            &selected.version.to_string(),
        ))
    }

    async fn diff_pair(
        &self,
        actor: UserId,
        id: PromptId,
        version_id: VersionId,
    ) -> Result<(PromptVersion, Option<PromptVersion>)> {
        let prompt = self.load_prompt(id).await?;
        self.assert_read_access(actor, &prompt).await?;
        let versions = self.store.fetch_versions(id).await?;
        let selected = versions
            .iter()
            .find(|v| v.id == version_id)
            .ok_or_else(|| PromptForgeError::version_not_found(version_id.to_string()))?
            .clone();
        let previous = previous_version(&versions, &selected).cloned();
        Ok((selected, previous))
    }

    /// Share a prompt with another user
    ///
    /// Runs the authorization chain in order: a valid session, no
    /// self-sharing, and prompt ownership. Sharing again with the same user
    /// updates the existing grant's permission instead of stacking grants.
    pub async fn share_prompt(
        &self,
        actor: Option<UserId>,
        payload: CreateShare,
    ) -> Result<PromptShare> {
        let actor = assert_session(actor)?;
        assert_not_self_share(actor, payload.shared_with)?;
        let prompt = self.load_prompt(payload.prompt_id).await?;
        assert_prompt_owner(actor, prompt.owner)?;

        let existing = self.store.fetch_shares_for_prompt(prompt.id).await?;
        if let Some(current) = existing
            .iter()
            .find(|share| share.shared_with == payload.shared_with)
        {
            let updated = self
                .store
                .update_share(current.id, payload.permission)
                .await?;
            tracing::info!(
                "Updated existing share of prompt {} with user {}",
                prompt.id,
                payload.shared_with
            );
            return Ok(updated);
        }

        let share = PromptShare {
            id: ShareId::new(),
            prompt_id: payload.prompt_id,
            shared_with: payload.shared_with,
            permission: payload.permission,
            shared_by: actor,
            created_at: self.clock.now(),
        };
        self.store.create_share(&share).await?;
        tracing::info!(
            "Shared prompt {} with user {} ({})",
            prompt.id,
            share.shared_with,
            share.permission
        );
        Ok(share)
    }

    /// Change a share grant's permission
    ///
    /// Allowed for the grant's creator and the prompt owner.
    pub async fn update_share(
        &self,
        actor: Option<UserId>,
        id: ShareId,
        payload: UpdateShare,
    ) -> Result<PromptShare> {
        let actor = assert_session(actor)?;
        let share = self.store.fetch_share(id).await?;
        let share = assert_share_exists(share.as_ref())?;
        let prompt = self.load_prompt(share.prompt_id).await?;
        let is_owner = prompt.owner == actor;
        assert_share_modify_authorization(share, actor, is_owner, ShareAction::Update)?;
        let updated = self.store.update_share(id, payload.permission).await?;
        tracing::info!("Updated share {} to {}", id, updated.permission);
        Ok(updated)
    }

    /// Revoke a share grant
    ///
    /// Allowed for the grant's creator and the prompt owner.
    pub async fn delete_share(&self, actor: Option<UserId>, id: ShareId) -> Result<()> {
        let actor = assert_session(actor)?;
        let share = self.store.fetch_share(id).await?;
        let share = assert_share_exists(share.as_ref())?;
        let prompt = self.load_prompt(share.prompt_id).await?;
        let is_owner = prompt.owner == actor;
        assert_share_modify_authorization(share, actor, is_owner, ShareAction::Delete)?;
        self.store.delete_share(id).await?;
        tracing::info!("Deleted share {}", id);
        Ok(())
    }

    /// List the grants on a prompt; owner only
    pub async fn list_shares(&self, actor: UserId, id: PromptId) -> Result<Vec<PromptShare>> {
        let prompt = self.load_prompt(id).await?;
        assert_prompt_owner(actor, prompt.owner).map_err(|_| {
            PromptForgeError::authorization("Only the prompt owner can list its shares")
        })?;
        self.store.fetch_shares_for_prompt(id).await
    }

    /// Export a prompt in the requested format
    pub async fn export_prompt(
        &self,
        actor: UserId,
        id: PromptId,
        format: ExportFormat,
        include_versions: bool,
    ) -> Result<String> {
        let (prompt, variables) = self.fetch_prompt_for(actor, id).await?;
        let versions = if include_versions {
            Some(self.store.fetch_versions(id).await?)
        } else {
            None
        };
        let bundle = ExportBundle {
            prompt,
            variables,
            versions,
        };
        export::render(&bundle, format)
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description.filter(|d| !d.trim().is_empty())
}
