//! Batch and per-document sync driver
//!
//! [`SyncOrchestrator::sync_accounts`] enumerates each enabled account's
//! documents, schedules every document through the account's rate limiter
//! and waits for all of them to settle. A document moves through the
//! [`DocumentState`] machine; any error is caught at the document boundary
//! and recorded in its [`DocumentOutcome`], so one failure never affects
//! another document.
//!
//! ## Per-document flow
//!
//! 1. Default front matter fields are written, then the front matter is read
//! 2. Documents without an entity type are skipped
//! 3. Tag names are resolved to ids
//! 4. The body is segmented into entity body and posts
//! 5. The entity is created or updated, then each post in order
//! 6. Post ids are stamped into the live document
//! 7. The response is merged back into the front matter

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::{json, Map, Value};
use serde_yaml::Value as YamlValue;
use tracing::{debug, info, info_span, warn, Instrument};

use kankasync_core::domain::{
    Account, AccountId, DocumentPath, EntityMetadata, FrontMatter, RemoteId, ENTITY_TYPE_KEY,
};
use kankasync_core::ports::{
    DocumentStatus, IDocumentStore, IMarkdownRenderer, IProgressReporter, IRemoteClient,
    NoopProgress, RemoteResponse, Resource,
};

use crate::merger::{self, MergeError};
use crate::rate_limit::RateLimiterRegistry;
use crate::segmenter::{restamp, segment};
use crate::tag_cache::TagCache;
use crate::SyncError;

// ============================================================================
// Outcomes
// ============================================================================

/// Progress of one document through a sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Pending,
    TypeResolved,
    TagsResolved,
    Segmented,
    EntityUploaded,
    PostsUploaded,
    MetadataMerged,
    Done,
}

impl fmt::Display for DocumentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentState::Pending => "pending",
            DocumentState::TypeResolved => "type-resolved",
            DocumentState::TagsResolved => "tags-resolved",
            DocumentState::Segmented => "segmented",
            DocumentState::EntityUploaded => "entity-uploaded",
            DocumentState::PostsUploaded => "posts-uploaded",
            DocumentState::MetadataMerged => "metadata-merged",
            DocumentState::Done => "done",
        };
        f.write_str(name)
    }
}

/// How one document's sync ended
#[derive(Debug)]
pub enum DocumentResult {
    Synced { entity_id: RemoteId, posts: usize },
    /// The document has no entity type
    Skipped,
    Failed {
        /// Last state reached before the failure
        state: DocumentState,
        error: SyncError,
    },
}

impl DocumentResult {
    pub fn status(&self) -> DocumentStatus {
        match self {
            DocumentResult::Synced { .. } => DocumentStatus::Synced,
            DocumentResult::Skipped => DocumentStatus::Skipped,
            DocumentResult::Failed { .. } => DocumentStatus::Failed,
        }
    }
}

#[derive(Debug)]
pub struct DocumentOutcome {
    pub account: AccountId,
    pub path: DocumentPath,
    pub result: DocumentResult,
}

/// Result of a batch across accounts
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per scheduled document
    pub outcomes: Vec<DocumentOutcome>,
    /// Enabled accounts with no eligible documents
    pub empty_accounts: Vec<AccountId>,
    /// Accounts whose documents could not be enumerated
    pub account_errors: Vec<(AccountId, String)>,
}

impl BatchReport {
    fn count(&self, status: DocumentStatus) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.result.status() == status)
            .count()
    }

    pub fn synced(&self) -> usize {
        self.count(DocumentStatus::Synced)
    }

    pub fn skipped(&self) -> usize {
        self.count(DocumentStatus::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(DocumentStatus::Failed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, DocumentResult::Failed { .. }))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn store_error(err: anyhow::Error) -> SyncError {
    SyncError::Store(format!("{err:#}"))
}

fn advance(state: &mut DocumentState, next: DocumentState) {
    debug!(from = %state, to = %next, "Document state transition");
    *state = next;
}

/// Front matter fields filled in when absent
fn default_fields(account: &Account, path: &DocumentPath) -> Vec<(&'static str, YamlValue)> {
    vec![
        ("name", YamlValue::String(path.stem().to_string())),
        ("campaign_id", YamlValue::Number(account.id().get().into())),
        ("campaign_name", YamlValue::String(account.name().to_string())),
    ]
}

fn apply_defaults(front_matter: &mut FrontMatter, defaults: Vec<(&'static str, YamlValue)>) {
    for (key, value) in defaults {
        if front_matter.get(key).map_or(true, YamlValue::is_null) {
            front_matter.insert(YamlValue::String(key.to_string()), value);
        }
    }
}

/// The record merged into front matter: response fields overlaid with the
/// working metadata
fn merge_source(fields: Map<String, Value>, metadata: &EntityMetadata) -> Map<String, Value> {
    let mut source = fields;
    source.insert(ENTITY_TYPE_KEY.into(), json!(metadata.entity_type.as_str()));
    source.insert("id".into(), json!(metadata.id));
    source.insert("entity_id".into(), json!(metadata.entity_id));
    source.insert("name".into(), json!(metadata.name));
    source
}

// ============================================================================
// SyncOrchestrator
// ============================================================================

/// Drives document syncs against the injected ports
pub struct SyncOrchestrator {
    remote: Arc<dyn IRemoteClient>,
    store: Arc<dyn IDocumentStore>,
    renderer: Arc<dyn IMarkdownRenderer>,
    tags: Arc<TagCache>,
    limiter: Arc<RateLimiterRegistry>,
    progress: Arc<dyn IProgressReporter>,
}

impl SyncOrchestrator {
    pub fn new(
        remote: Arc<dyn IRemoteClient>,
        store: Arc<dyn IDocumentStore>,
        renderer: Arc<dyn IMarkdownRenderer>,
        tags: Arc<TagCache>,
        limiter: Arc<RateLimiterRegistry>,
    ) -> Self {
        Self {
            remote,
            store,
            renderer,
            tags,
            limiter,
            progress: Arc::new(NoopProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn IProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn tags(&self) -> &TagCache {
        &self.tags
    }

    /// Syncs every eligible document of the enabled accounts
    ///
    /// When `only` is given, documents outside that set are left alone.
    /// Waits for all documents to settle before returning.
    pub async fn sync_accounts(
        &self,
        accounts: &[Account],
        only: Option<&[DocumentPath]>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let mut queue: Vec<(&Account, DocumentPath)> = Vec::new();

        for account in accounts.iter().filter(|a| a.is_enabled()) {
            let listed = match self
                .store
                .list_documents(account.path(), account.glob())
                .await
            {
                Ok(paths) => paths,
                Err(err) => {
                    warn!(account = %account.id(), error = %format!("{err:#}"), "Failed to list documents");
                    report.account_errors.push((account.id(), format!("{err:#}")));
                    continue;
                }
            };

            let selected: Vec<DocumentPath> = listed
                .into_iter()
                .filter(|p| only.map_or(true, |only| only.contains(p)))
                .collect();
            if selected.is_empty() {
                warn!(account = %account.id(), name = account.name(), "No documents to sync");
                report.empty_accounts.push(account.id());
                continue;
            }

            debug!(account = %account.id(), documents = selected.len(), "Queued account documents");
            queue.extend(selected.into_iter().map(|path| (account, path)));
        }

        let total = queue.len();
        self.progress.reset(total);
        let done = AtomicUsize::new(0);

        let tasks = queue.iter().map(|(account, path)| {
            let done = &done;
            async move {
                let result = self
                    .limiter
                    .schedule(account, self.sync_document(account, path))
                    .await;
                let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                self.progress.advance(path, result.status(), finished, total);
                DocumentOutcome {
                    account: account.id(),
                    path: path.clone(),
                    result,
                }
            }
        });
        report.outcomes = join_all(tasks).await;

        info!(
            documents = total,
            synced = report.synced(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Sync batch complete"
        );
        report
    }

    /// Syncs one document, outside of any rate limiter
    pub async fn sync_document(&self, account: &Account, path: &DocumentPath) -> DocumentResult {
        let span = info_span!("document", account = %account.id(), path = %path);
        async move {
            let mut state = DocumentState::Pending;
            match self.run(account, path, &mut state).await {
                Ok(Some((entity_id, posts))) => {
                    info!(%entity_id, posts, "Document synced");
                    DocumentResult::Synced { entity_id, posts }
                }
                Ok(None) => {
                    info!("Document has no entity type, skipping");
                    DocumentResult::Skipped
                }
                Err(error) => {
                    warn!(%state, error = %error, "Document sync failed");
                    DocumentResult::Failed { state, error }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        account: &Account,
        path: &DocumentPath,
        state: &mut DocumentState,
    ) -> Result<Option<(RemoteId, usize)>, SyncError> {
        let defaults = default_fields(account, path);
        self.store
            .mutate_front_matter(
                path,
                Box::new(move |fm: &mut FrontMatter| -> anyhow::Result<()> {
                    apply_defaults(fm, defaults);
                    Ok(())
                }),
            )
            .await
            .map_err(store_error)?;

        let front_matter = self.store.read_front_matter(path).await.map_err(store_error)?;
        let mut metadata = EntityMetadata::from_front_matter(&front_matter)?;
        if metadata.entity_type.is_undefined() {
            return Ok(None);
        }
        advance(state, DocumentState::TypeResolved);

        self.tags.refresh(account.id()).await;
        metadata.tag_ids = self.tags.resolve(account.id(), &metadata.tags).await?;
        advance(state, DocumentState::TagsResolved);

        let body = self.store.read_body(path).await.map_err(store_error)?;
        let segmentation = segment(&body)?;
        advance(state, DocumentState::Segmented);

        let resource = Resource::Entity(metadata.entity_type);
        let payload = metadata.to_payload(&self.renderer.render(&segmentation.body));
        let response = self.upload(account, &resource, metadata.id, &payload).await?;
        let fields = response.body.clone().unwrap_or_default();
        metadata.absorb(&fields);
        let entity_id = metadata.entity_id.ok_or_else(|| SyncError::Upload {
            resource: resource.to_string(),
            status: Some(response.status),
            message: "response carried no entity_id".to_string(),
        })?;
        advance(state, DocumentState::EntityUploaded);

        // Posts come out of segmentation in ascending order.
        let post_resource = Resource::Post { entity_id };
        let mut posts = segmentation.posts.clone();
        for post in &mut posts {
            let payload = post.to_payload(entity_id, &self.renderer.render(&post.content));
            let response = self.upload(account, &post_resource, post.id, &payload).await?;
            post.id = response.id().or(post.id);
            if post.id.is_none() {
                return Err(SyncError::Upload {
                    resource: post_resource.to_string(),
                    status: Some(response.status),
                    message: format!("post '{}' got no id", post.name),
                });
            }
            debug!(post = %post.name, order = post.order, "Uploaded post");
        }
        advance(state, DocumentState::PostsUploaded);

        if !posts.is_empty() {
            let live = self.store.read_body(path).await.map_err(store_error)?;
            let restamped = restamp(&live, &segmentation.headings, &posts)?;
            if restamped != live {
                self.store
                    .write_body(path, &restamped)
                    .await
                    .map_err(store_error)?;
            }
        }

        let names = self.tags.reverse(account.id(), &metadata.tag_ids);
        let source = merge_source(fields.into_fields(), &metadata);
        self.store
            .mutate_front_matter(
                path,
                Box::new(move |fm: &mut FrontMatter| -> anyhow::Result<()> {
                    merger::merge(fm, &source, Some(names))?;
                    Ok(())
                }),
            )
            .await
            .map_err(|err| match err.downcast::<MergeError>() {
                Ok(merge) => SyncError::Merge(merge),
                Err(other) => store_error(other),
            })?;
        advance(state, DocumentState::MetadataMerged);

        advance(state, DocumentState::Done);
        Ok(Some((entity_id, posts.len())))
    }

    /// Updates when `id` is known, creates otherwise
    async fn upload(
        &self,
        account: &Account,
        resource: &Resource,
        id: Option<RemoteId>,
        payload: &Value,
    ) -> Result<RemoteResponse, SyncError> {
        let result = match id {
            Some(id) => self.remote.update(account.id(), resource, id, payload).await,
            None => self.remote.create(account.id(), resource, payload).await,
        };
        let response = result.map_err(|err| SyncError::Upload {
            resource: resource.to_string(),
            status: None,
            message: format!("{err:#}"),
        })?;

        if !response.is_success() {
            return Err(SyncError::Upload {
                resource: resource.to_string(),
                status: Some(response.status),
                message: format!("server answered {}", response.status),
            });
        }
        Ok(response)
    }
}
