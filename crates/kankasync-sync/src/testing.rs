//! In-memory port fakes shared by the unit tests of this crate

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::anyhow;
use serde_json::{json, Value};

use kankasync_core::domain::{
    AccountId, Document, DocumentPath, EntityResponse, FrontMatter, RemoteId,
};
use kankasync_core::ports::{
    CampaignInfo, DocumentStatus, FrontMatterMutator, IDocumentStore, IProgressReporter,
    IRemoteClient, ListPage, RemoteResponse, Resource,
};

// ============================================================================
// FakeRemote
// ============================================================================

/// A recorded remote call
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    List {
        account: AccountId,
        resource: Resource,
        cursor: Option<String>,
    },
    Create {
        account: AccountId,
        resource: Resource,
        body: Value,
    },
    Update {
        account: AccountId,
        resource: Resource,
        id: RemoteId,
        body: Value,
    },
}

/// Remote fake that records every call and hands out sequential ids
///
/// Entities get `entity_id = id + 10000`. Entity responses also carry
/// `created_at` and `urls` so the metadata merge has extras to project.
pub(crate) struct FakeRemote {
    calls: Mutex<Vec<Call>>,
    tag_pages: Mutex<HashMap<AccountId, Vec<Vec<(String, u64)>>>>,
    failing_tag_page: Mutex<Option<usize>>,
    rejections: Mutex<HashMap<Resource, u16>>,
    before_create: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    next_id: AtomicU64,
}

impl FakeRemote {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            tag_pages: Mutex::new(HashMap::new()),
            failing_tag_page: Mutex::new(None),
            rejections: Mutex::new(HashMap::new()),
            before_create: Mutex::new(None),
            next_id: AtomicU64::new(1000),
        }
    }

    pub(crate) fn set_tag_pages(&self, account: AccountId, pages: Vec<Vec<(&str, u64)>>) {
        let pages = pages
            .into_iter()
            .map(|page| page.into_iter().map(|(n, id)| (n.to_string(), id)).collect())
            .collect();
        self.tag_pages.lock().unwrap().insert(account, pages);
    }

    /// Makes listing the given tag page fail
    pub(crate) fn fail_tag_page(&self, page: Option<usize>) {
        *self.failing_tag_page.lock().unwrap() = page;
    }

    /// Makes create/update on `resource` answer with `status`
    pub(crate) fn reject(&self, resource: Resource, status: u16) {
        self.rejections.lock().unwrap().insert(resource, status);
    }

    /// Runs `hook` once, when the next create call arrives
    pub(crate) fn before_next_create(&self, hook: impl FnOnce() + Send + 'static) {
        *self.before_create.lock().unwrap() = Some(Box::new(hook));
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_matching(&self, pred: impl Fn(&Call) -> bool) -> Vec<Call> {
        self.calls().into_iter().filter(|c| pred(c)).collect()
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.calls_matching(|c| matches!(c, Call::List { .. })).len()
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.calls_matching(|c| matches!(c, Call::Create { .. })).len()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn respond(&self, resource: &Resource, id: RemoteId, body: &Value) -> RemoteResponse {
        if let Some(status) = self.rejections.lock().unwrap().get(resource) {
            return RemoteResponse {
                status: *status,
                body: None,
            };
        }

        let mut data = json!({
            "id": id.get(),
            "name": body.get("name").cloned().unwrap_or(Value::Null),
        });
        if let Resource::Entity(_) = resource {
            data["entity_id"] = json!(id.get() + 10000);
            data["created_at"] = json!("2024-01-01T00:00:00.000000Z");
            data["urls"] = json!({"view": format!("https://kanka.test/entities/{}", id.get() + 10000)});
        }

        RemoteResponse {
            status: 200,
            body: serde_json::from_value::<EntityResponse>(data).ok(),
        }
    }
}

#[async_trait::async_trait]
impl IRemoteClient for FakeRemote {
    async fn list(
        &self,
        account: AccountId,
        resource: &Resource,
        cursor: Option<&str>,
    ) -> anyhow::Result<ListPage> {
        self.record(Call::List {
            account,
            resource: *resource,
            cursor: cursor.map(str::to_string),
        });

        if *resource != Resource::Tag {
            return Ok(ListPage::default());
        }

        let index = match cursor {
            None => 0,
            Some(c) => c
                .strip_prefix("page-")
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| anyhow!("bad cursor {c}"))?,
        };
        if *self.failing_tag_page.lock().unwrap() == Some(index) {
            return Err(anyhow!("tag page {index} unavailable"));
        }

        let pages = self.tag_pages.lock().unwrap();
        let Some(pages) = pages.get(&account) else {
            return Ok(ListPage::default());
        };
        let items = pages
            .get(index)
            .map(|page| {
                page.iter()
                    .map(|(name, id)| EntityResponse {
                        id: RemoteId::new(*id).ok(),
                        name: Some(name.clone()),
                        ..Default::default()
                    })
                    .collect()
            })
            .unwrap_or_default();
        let next_page = (index + 1 < pages.len()).then(|| format!("page-{}", index + 1));

        Ok(ListPage { items, next_page })
    }

    async fn create(
        &self,
        account: AccountId,
        resource: &Resource,
        body: &Value,
    ) -> anyhow::Result<RemoteResponse> {
        let hook = self.before_create.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }
        self.record(Call::Create {
            account,
            resource: *resource,
            body: body.clone(),
        });
        let id = RemoteId::new(self.next_id.fetch_add(1, Ordering::SeqCst))?;
        Ok(self.respond(resource, id, body))
    }

    async fn update(
        &self,
        account: AccountId,
        resource: &Resource,
        id: RemoteId,
        body: &Value,
    ) -> anyhow::Result<RemoteResponse> {
        self.record(Call::Update {
            account,
            resource: *resource,
            id,
            body: body.clone(),
        });
        Ok(self.respond(resource, id, body))
    }

    async fn list_campaigns(&self) -> anyhow::Result<Vec<CampaignInfo>> {
        Ok(Vec::new())
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

/// Document store over an in-memory map of raw file texts
#[derive(Default)]
pub(crate) struct MemoryStore {
    files: Mutex<BTreeMap<DocumentPath, String>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn put(&self, path: &str, text: &str) -> DocumentPath {
        let path = DocumentPath::new(path).unwrap();
        self.files.lock().unwrap().insert(path.clone(), text.to_string());
        path
    }

    pub(crate) fn text(&self, path: &DocumentPath) -> String {
        self.files.lock().unwrap()[path].clone()
    }

    pub(crate) fn document(&self, path: &DocumentPath) -> Document {
        Document::parse(&self.text(path)).unwrap()
    }

    fn load(&self, path: &DocumentPath) -> anyhow::Result<Document> {
        let text = self
            .files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no such document: {path}"))?;
        Ok(Document::parse(&text)?)
    }

    fn save(&self, path: &DocumentPath, document: &Document) -> anyhow::Result<()> {
        let text = document.render()?;
        self.files.lock().unwrap().insert(path.clone(), text);
        Ok(())
    }
}

#[async_trait::async_trait]
impl IDocumentStore for MemoryStore {
    async fn list_documents(
        &self,
        prefix: &str,
        _glob: Option<&str>,
    ) -> anyhow::Result<Vec<DocumentPath>> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .keys()
            .filter(|p| p.is_under(prefix))
            .cloned()
            .collect())
    }

    async fn read_body(&self, path: &DocumentPath) -> anyhow::Result<String> {
        Ok(self.load(path)?.body)
    }

    async fn read_front_matter(&self, path: &DocumentPath) -> anyhow::Result<FrontMatter> {
        Ok(self.load(path)?.front_matter)
    }

    async fn write_body(&self, path: &DocumentPath, body: &str) -> anyhow::Result<()> {
        let mut document = self.load(path)?;
        document.body = body.to_string();
        self.save(path, &document)
    }

    async fn mutate_front_matter(
        &self,
        path: &DocumentPath,
        mutator: FrontMatterMutator,
    ) -> anyhow::Result<()> {
        let mut document = self.load(path)?;
        let outcome = mutator(&mut document.front_matter);
        self.save(path, &document)?;
        outcome
    }
}

// ============================================================================
// RecordingProgress
// ============================================================================

/// Progress reporter that keeps every update
#[derive(Default)]
pub(crate) struct RecordingProgress {
    pub(crate) resets: Mutex<Vec<usize>>,
    pub(crate) updates: Mutex<Vec<(DocumentPath, DocumentStatus, usize, usize)>>,
}

impl IProgressReporter for RecordingProgress {
    fn reset(&self, total: usize) {
        self.resets.lock().unwrap().push(total);
    }

    fn advance(&self, path: &DocumentPath, status: DocumentStatus, done: usize, total: usize) {
        self.updates
            .lock()
            .unwrap()
            .push((path.clone(), status, done, total));
    }
}
