//! Integration tests for complete prompt workflows
//!
//! This test suite drives the service layer over the in-memory store
//! through the full feature set: creating and rendering prompts, explicit
//! versioning with restore, concurrent-edit conflict handling between two
//! editing sessions, the sharing authorization chain, and exports.

use chrono::{Duration, TimeZone, Utc};
use promptforge_common::{FixedClock, PromptForgeError, UserId};
use promptforge_prompts::{
    BumpKind, ConflictDetector, CreatePrompt, CreateShare, ExportFormat, MemoryStore, Prompt,
    PromptService, SharePermission, UpdatePrompt, UpdateShare, Variable, VariableKind,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Test fixture bundling a service with its controllable clock
struct Forge {
    service: PromptService<MemoryStore>,
    clock: Arc<FixedClock>,
}

impl Forge {
    fn new() -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ));
        let service = PromptService::with_clock(Arc::new(MemoryStore::new()), clock.clone());
        Self { service, clock }
    }

    async fn create(&self, owner: UserId, payload: CreatePrompt) -> Prompt {
        self.service
            .create_prompt(owner, payload)
            .await
            .expect("Failed to create prompt")
    }

    /// A fresh editing session for the prompt's current stored state
    async fn session(
        &self,
        actor: UserId,
        prompt_id: promptforge_common::PromptId,
    ) -> ConflictDetector {
        let (prompt, _) = self
            .service
            .fetch_prompt_for(actor, prompt_id)
            .await
            .expect("Failed to load prompt for session");
        ConflictDetector::capture(prompt.updated_at)
    }
}

fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn greeting_payload() -> CreatePrompt {
    let mut payload = CreatePrompt::new("Greeting", "Hi {{name}}, you are {{age}}");
    payload.variables = vec![
        Variable::new("name").with_default("friend").with_order_index(1),
        Variable::new("age")
            .with_kind(VariableKind::Number)
            .with_required(true)
            .with_order_index(2),
    ];
    payload
}

#[tokio::test]
async fn test_create_render_version_restore_lifecycle() {
    let forge = Forge::new();
    let owner = UserId::new();
    let prompt = forge.create(owner, greeting_payload()).await;
    assert_eq!(prompt.version.to_string(), "1.0.0");

    // Supplied values win; defaults fill the gaps
    let rendered = forge
        .service
        .render_preview(owner, prompt.id, &values(&[("name", "Alice"), ("age", "30")]))
        .await
        .unwrap();
    assert_eq!(rendered, "Hi Alice, you are 30");

    let rendered = forge
        .service
        .render_preview(owner, prompt.id, &values(&[("age", "30")]))
        .await
        .unwrap();
    assert_eq!(rendered, "Hi friend, you are 30");

    // Cut 1.1.0, then edit and cut 2.0.0
    forge.clock.advance(Duration::minutes(1));
    let (prompt, _) = forge
        .service
        .create_version(owner, prompt.id, BumpKind::Minor, Some("First cut".to_string()))
        .await
        .unwrap();
    assert_eq!(prompt.version.to_string(), "1.1.0");

    forge.clock.advance(Duration::minutes(1));
    let mut session = forge.session(owner, prompt.id).await;
    forge
        .service
        .save_prompt(
            owner,
            prompt.id,
            UpdatePrompt {
                content: Some("Hello {{name}}!".to_string()),
                ..Default::default()
            },
            &mut session,
            false,
        )
        .await
        .unwrap();

    forge.clock.advance(Duration::minutes(1));
    let (prompt, _) = forge
        .service
        .create_version(owner, prompt.id, BumpKind::Major, None)
        .await
        .unwrap();
    assert_eq!(prompt.version.to_string(), "2.0.0");

    // Restore the 1.1.0 snapshot; history gains 2.0.1 instead of rewriting
    let versions = forge.service.list_versions(owner, prompt.id).await.unwrap();
    let source = versions
        .iter()
        .find(|v| v.version.to_string() == "1.1.0")
        .expect("1.1.0 should be in history");

    forge.clock.advance(Duration::minutes(1));
    let mut session = forge.session(owner, prompt.id).await;
    let (restored, record) = forge
        .service
        .restore_version(owner, prompt.id, source.id, &mut session, false)
        .await
        .unwrap();

    assert_eq!(restored.version.to_string(), "2.0.1");
    assert_eq!(restored.content, "Hi {{name}}, you are {{age}}");
    assert_eq!(record.message.as_deref(), Some("Restored from 1.1.0"));

    // Current version is the newest snapshot; nothing was removed
    let versions = forge.service.list_versions(owner, prompt.id).await.unwrap();
    let history: Vec<String> = versions.iter().map(|v| v.version.to_string()).collect();
    assert_eq!(history, vec!["2.0.1", "2.0.0", "1.1.0"]);
}

#[tokio::test]
async fn test_concurrent_sessions_conflict_and_force() {
    let forge = Forge::new();
    let owner = UserId::new();
    let editor = UserId::new();
    let prompt = forge.create(owner, greeting_payload()).await;
    forge
        .service
        .share_prompt(
            Some(owner),
            CreateShare {
                prompt_id: prompt.id,
                shared_with: editor,
                permission: SharePermission::Write,
            },
        )
        .await
        .unwrap();

    // Both sessions load the same state
    let mut owner_session = forge.session(owner, prompt.id).await;
    let mut editor_session = forge.session(editor, prompt.id).await;

    // The editor saves first
    forge.clock.advance(Duration::seconds(30));
    forge
        .service
        .save_prompt(
            editor,
            prompt.id,
            UpdatePrompt {
                content: Some("Editor's text".to_string()),
                ..Default::default()
            },
            &mut editor_session,
            false,
        )
        .await
        .unwrap();

    // The owner's save is now a conflict
    let error = forge
        .service
        .save_prompt(
            owner,
            prompt.id,
            UpdatePrompt {
                content: Some("Owner's text".to_string()),
                ..Default::default()
            },
            &mut owner_session,
            false,
        )
        .await
        .unwrap_err();
    assert!(error.is_conflict());

    // The editor's save landed despite the owner's refusal
    let (live, _) = forge.service.fetch_prompt_for(owner, prompt.id).await.unwrap();
    assert_eq!(live.content, "Editor's text");

    // Forcing overwrites; afterwards the owner's session is current again
    let forced = forge
        .service
        .save_prompt(
            owner,
            prompt.id,
            UpdatePrompt {
                content: Some("Owner's text".to_string()),
                ..Default::default()
            },
            &mut owner_session,
            true,
        )
        .await
        .unwrap();
    assert_eq!(forced.content, "Owner's text");

    forge
        .service
        .save_prompt(
            owner,
            prompt.id,
            UpdatePrompt {
                title: Some("Greeting 2".to_string()),
                ..Default::default()
            },
            &mut owner_session,
            false,
        )
        .await
        .unwrap();

    // The editor's stale session conflicts until it reloads
    let error = forge
        .service
        .save_prompt(
            editor,
            prompt.id,
            UpdatePrompt {
                content: Some("Editor again".to_string()),
                ..Default::default()
            },
            &mut editor_session,
            false,
        )
        .await
        .unwrap_err();
    assert!(error.is_conflict());

    let mut editor_session = forge.session(editor, prompt.id).await;
    forge
        .service
        .save_prompt(
            editor,
            prompt.id,
            UpdatePrompt {
                content: Some("Editor again".to_string()),
                ..Default::default()
            },
            &mut editor_session,
            false,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_conflict_requires_local_edits() {
    let forge = Forge::new();
    let owner = UserId::new();
    let prompt = forge.create(owner, greeting_payload()).await;

    // A session with no content edits toggles the favorite flag while a
    // remote save happens; nothing blocks it
    let mut idle_session = forge.session(owner, prompt.id).await;

    forge.clock.advance(Duration::seconds(10));
    let mut other_session = forge.session(owner, prompt.id).await;
    forge
        .service
        .save_prompt(
            owner,
            prompt.id,
            UpdatePrompt {
                content: Some("Moved on".to_string()),
                ..Default::default()
            },
            &mut other_session,
            false,
        )
        .await
        .unwrap();

    let saved = forge
        .service
        .save_prompt(
            owner,
            prompt.id,
            UpdatePrompt {
                is_favorite: Some(true),
                ..Default::default()
            },
            &mut idle_session,
            false,
        )
        .await
        .unwrap();
    assert!(saved.is_favorite);
    // The favorite toggle never advances the edit timestamp
    let (live, _) = forge.service.fetch_prompt_for(owner, prompt.id).await.unwrap();
    assert_eq!(live.updated_at, saved.updated_at);
    assert_eq!(live.content, "Moved on");
}

#[tokio::test]
async fn test_share_permissions_govern_access() {
    let forge = Forge::new();
    let owner = UserId::new();
    let reader = UserId::new();
    let stranger = UserId::new();
    let prompt = forge.create(owner, greeting_payload()).await;

    let share = forge
        .service
        .share_prompt(
            Some(owner),
            CreateShare {
                prompt_id: prompt.id,
                shared_with: reader,
                permission: SharePermission::Read,
            },
        )
        .await
        .unwrap();

    // A read grant allows fetching and rendering
    forge.service.fetch_prompt_for(reader, prompt.id).await.unwrap();
    let rendered = forge
        .service
        .render_preview(reader, prompt.id, &values(&[("age", "41")]))
        .await
        .unwrap();
    assert_eq!(rendered, "Hi friend, you are 41");

    // But not saving
    let mut reader_session = forge.session(reader, prompt.id).await;
    let error = forge
        .service
        .save_prompt(
            reader,
            prompt.id,
            UpdatePrompt {
                content: Some("hijack".to_string()),
                ..Default::default()
            },
            &mut reader_session,
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(error, PromptForgeError::Authorization { .. }));

    // No grant, no access
    let error = forge
        .service
        .fetch_prompt_for(stranger, prompt.id)
        .await
        .unwrap_err();
    assert!(matches!(error, PromptForgeError::Authorization { .. }));

    // Upgrading the grant unlocks saving
    forge
        .service
        .update_share(
            Some(owner),
            share.id,
            UpdateShare {
                permission: SharePermission::Write,
            },
        )
        .await
        .unwrap();
    let mut reader_session = forge.session(reader, prompt.id).await;
    forge
        .service
        .save_prompt(
            reader,
            prompt.id,
            UpdatePrompt {
                content: Some("collaboration".to_string()),
                ..Default::default()
            },
            &mut reader_session,
            false,
        )
        .await
        .unwrap();

    // Revoking removes access entirely
    forge.service.delete_share(Some(owner), share.id).await.unwrap();
    let error = forge
        .service
        .fetch_prompt_for(reader, prompt.id)
        .await
        .unwrap_err();
    assert!(matches!(error, PromptForgeError::Authorization { .. }));
}

#[tokio::test]
async fn test_share_authorization_chain() {
    let forge = Forge::new();
    let owner = UserId::new();
    let grantee = UserId::new();
    let prompt = forge.create(owner, greeting_payload()).await;

    // No session
    let error = forge
        .service
        .share_prompt(
            None,
            CreateShare {
                prompt_id: prompt.id,
                shared_with: grantee,
                permission: SharePermission::Read,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(error, PromptForgeError::SessionExpired));

    // Sharing with yourself
    let error = forge
        .service
        .share_prompt(
            Some(owner),
            CreateShare {
                prompt_id: prompt.id,
                shared_with: owner,
                permission: SharePermission::Read,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(error, PromptForgeError::Authorization { .. }));

    // Sharing someone else's prompt
    let error = forge
        .service
        .share_prompt(
            Some(grantee),
            CreateShare {
                prompt_id: prompt.id,
                shared_with: UserId::new(),
                permission: SharePermission::Read,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(error, PromptForgeError::Authorization { .. }));

    // Modifying a grant that does not exist
    let error = forge
        .service
        .update_share(
            Some(owner),
            promptforge_common::ShareId::new(),
            UpdateShare {
                permission: SharePermission::Write,
            },
        )
        .await
        .unwrap_err();
    assert!(error.is_not_found());

    // The grantee can neither update nor revoke their own grant
    let share = forge
        .service
        .share_prompt(
            Some(owner),
            CreateShare {
                prompt_id: prompt.id,
                shared_with: grantee,
                permission: SharePermission::Read,
            },
        )
        .await
        .unwrap();
    let error = forge
        .service
        .update_share(
            Some(grantee),
            share.id,
            UpdateShare {
                permission: SharePermission::Write,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(error, PromptForgeError::Authorization { .. }));
    let error = forge
        .service
        .delete_share(Some(grantee), share.id)
        .await
        .unwrap_err();
    assert!(matches!(error, PromptForgeError::Authorization { .. }));

    // The creator revokes their own grant
    forge.service.delete_share(Some(owner), share.id).await.unwrap();
}

#[tokio::test]
async fn test_listing_own_and_shared_prompts() {
    let forge = Forge::new();
    let owner = UserId::new();
    let colleague = UserId::new();

    let mine = forge.create(owner, CreatePrompt::new("Mine", "content")).await;
    let theirs = forge
        .create(colleague, CreatePrompt::new("Theirs", "content"))
        .await;
    forge
        .service
        .share_prompt(
            Some(colleague),
            CreateShare {
                prompt_id: theirs.id,
                shared_with: owner,
                permission: SharePermission::Read,
            },
        )
        .await
        .unwrap();

    let own = forge.service.list_prompts(owner).await.unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].id, mine.id);

    let shared = forge.service.list_shared_with(owner).await.unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].0.id, theirs.id);
    assert_eq!(shared[0].1.permission, SharePermission::Read);
}

#[tokio::test]
async fn test_version_deletion_protects_current() {
    let forge = Forge::new();
    let owner = UserId::new();
    let prompt = forge.create(owner, greeting_payload()).await;

    forge.clock.advance(Duration::minutes(1));
    forge
        .service
        .create_version(owner, prompt.id, BumpKind::Patch, None)
        .await
        .unwrap();
    forge.clock.advance(Duration::minutes(1));
    let (prompt, current) = forge
        .service
        .create_version(owner, prompt.id, BumpKind::Minor, None)
        .await
        .unwrap();

    let versions = forge.service.list_versions(owner, prompt.id).await.unwrap();
    let old = versions
        .iter()
        .find(|v| v.version.to_string() == "1.0.1")
        .unwrap();

    // Deleting the current version is refused and removes nothing
    let error = forge
        .service
        .delete_versions(owner, prompt.id, &[current.id, old.id])
        .await
        .unwrap_err();
    assert!(matches!(error, PromptForgeError::Validation { .. }));
    assert_eq!(
        forge.service.list_versions(owner, prompt.id).await.unwrap().len(),
        2
    );

    // Deleting only the old snapshot works
    let removed = forge
        .service
        .delete_versions(owner, prompt.id, &[old.id])
        .await
        .unwrap();
    assert_eq!(removed, 1);
    let remaining = forge.service.list_versions(owner, prompt.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].version, prompt.version);
}

#[tokio::test]
async fn test_restore_brings_back_variable_snapshot() {
    let forge = Forge::new();
    let owner = UserId::new();
    let prompt = forge.create(owner, greeting_payload()).await;

    forge.clock.advance(Duration::minutes(1));
    let (_, snapshot) = forge
        .service
        .create_version(owner, prompt.id, BumpKind::Minor, None)
        .await
        .unwrap();
    assert_eq!(
        snapshot.variables[0].default_value.as_deref(),
        Some("friend")
    );

    // Change the live variable set, then cut another version
    forge.clock.advance(Duration::minutes(1));
    let mut session = forge.session(owner, prompt.id).await;
    forge
        .service
        .save_prompt(
            owner,
            prompt.id,
            UpdatePrompt {
                variables: Some(vec![
                    Variable::new("name").with_default("pal").with_order_index(1),
                    Variable::new("age")
                        .with_kind(VariableKind::Number)
                        .with_required(true)
                        .with_order_index(2),
                ]),
                ..Default::default()
            },
            &mut session,
            false,
        )
        .await
        .unwrap();
    let rendered = forge
        .service
        .render_preview(owner, prompt.id, &values(&[("age", "5")]))
        .await
        .unwrap();
    assert_eq!(rendered, "Hi pal, you are 5");

    forge.clock.advance(Duration::minutes(1));
    forge
        .service
        .create_version(owner, prompt.id, BumpKind::Minor, None)
        .await
        .unwrap();

    // Restoring the older snapshot brings its variable set back
    forge.clock.advance(Duration::minutes(1));
    let mut session = forge.session(owner, prompt.id).await;
    forge
        .service
        .restore_version(owner, prompt.id, snapshot.id, &mut session, false)
        .await
        .unwrap();
    let (_, variables) = forge.service.fetch_prompt_for(owner, prompt.id).await.unwrap();
    assert_eq!(variables[0].default_value.as_deref(), Some("friend"));
    let rendered = forge
        .service
        .render_preview(owner, prompt.id, &values(&[("age", "5")]))
        .await
        .unwrap();
    assert_eq!(rendered, "Hi friend, you are 5");
}

#[tokio::test]
async fn test_version_diff_against_predecessor() {
    let forge = Forge::new();
    let owner = UserId::new();
    let prompt = forge
        .create(owner, CreatePrompt::new("Greeting", "line one\nline two"))
        .await;

    forge.clock.advance(Duration::minutes(1));
    let (_, first) = forge
        .service
        .create_version(owner, prompt.id, BumpKind::Patch, None)
        .await
        .unwrap();

    forge.clock.advance(Duration::minutes(1));
    let mut session = forge.session(owner, prompt.id).await;
    forge
        .service
        .save_prompt(
            owner,
            prompt.id,
            UpdatePrompt {
                content: Some("line one\nline 2".to_string()),
                ..Default::default()
            },
            &mut session,
            false,
        )
        .await
        .unwrap();
    forge.clock.advance(Duration::minutes(1));
    let (_, second) = forge
        .service
        .create_version(owner, prompt.id, BumpKind::Patch, None)
        .await
        .unwrap();

    // The newer version diffs against its predecessor
    let diff = forge
        .service
        .diff_versions(owner, prompt.id, second.id)
        .await
        .unwrap();
    assert_eq!(diff.old_label, "1.0.1");
    assert_eq!(diff.new_label, "1.0.2");
    assert_eq!(diff.added, 1);
    assert_eq!(diff.removed, 1);

    // The oldest version diffs against empty content
    let diff = forge
        .service
        .diff_versions(owner, prompt.id, first.id)
        .await
        .unwrap();
    assert_eq!(diff.old_label, "(empty)");
    assert_eq!(diff.added, 2);
    assert_eq!(diff.removed, 0);

    let unified = forge
        .service
        .unified_diff_versions(owner, prompt.id, second.id)
        .await
        .unwrap();
    assert!(unified.starts_with("--- 1.0.1\n+++ 1.0.2\n"));
    assert!(unified.contains("-line two\n"));
    assert!(unified.contains("+line 2\n"));
}

#[tokio::test]
async fn test_export_all_formats() -> anyhow::Result<()> {
    let forge = Forge::new();
    let owner = UserId::new();
    let prompt = forge.create(owner, greeting_payload()).await;
    forge.clock.advance(Duration::minutes(1));
    forge
        .service
        .create_version(owner, prompt.id, BumpKind::Patch, Some("Snapshot".to_string()))
        .await?;

    let json = forge
        .service
        .export_prompt(owner, prompt.id, ExportFormat::Json, true)
        .await?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(value["prompt"]["title"], "Greeting");
    assert_eq!(value["versions"][0]["version"], "1.0.1");

    let json = forge
        .service
        .export_prompt(owner, prompt.id, ExportFormat::Json, false)
        .await?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    assert!(value.get("versions").is_none());

    let markdown = forge
        .service
        .export_prompt(owner, prompt.id, ExportFormat::Markdown, true)
        .await?;
    assert!(markdown.starts_with("# Greeting\n"));
    assert!(markdown.contains("## Version History"));

    let toon = forge
        .service
        .export_prompt(owner, prompt.id, ExportFormat::Toon, false)
        .await?;
    assert!(toon.contains("prompt:\n"));
    assert!(toon.contains("variables[2]{name,kind,required,default,help}:"));
    assert!(!toon.contains("versions["));

    // Only readers can export
    let error = forge
        .service
        .export_prompt(UserId::new(), prompt.id, ExportFormat::Json, false)
        .await
        .unwrap_err();
    assert!(matches!(error, PromptForgeError::Authorization { .. }));
    Ok(())
}
