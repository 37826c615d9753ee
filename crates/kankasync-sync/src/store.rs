//! Filesystem document store
//!
//! Implements [`IDocumentStore`] over a vault directory of Markdown files.
//!
//! ## Features
//!
//! - **Enumeration**: walks the vault with `walkdir`, skipping hidden
//!   directories, and filters by folder prefix and optional glob
//! - **Atomic writes**: writes to a temporary sibling file and renames it
//!   over the document
//! - **Scoped front matter mutation**: the mapping is persisted even when
//!   the mutator fails, and untouched documents are not rewritten

use std::path::{Path, PathBuf};

use anyhow::Context;
use glob::{MatchOptions, Pattern};
use tracing::debug;
use walkdir::WalkDir;

use kankasync_core::domain::{Document, DocumentPath, FrontMatter};
use kankasync_core::ports::{FrontMatterMutator, IDocumentStore};

/// Document store backed by a vault directory
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, path: &DocumentPath) -> PathBuf {
        self.root.join(path.as_str())
    }

    async fn read_document(&self, path: &DocumentPath) -> anyhow::Result<Document> {
        let file = self.absolute(path);
        let text = tokio::fs::read_to_string(&file)
            .await
            .with_context(|| format!("reading {}", file.display()))?;
        Document::parse(&text).with_context(|| format!("parsing {path}"))
    }

    async fn write_document(&self, path: &DocumentPath, document: &Document) -> anyhow::Result<()> {
        let text = document.render()?;
        write_atomic(&self.absolute(path), text.as_bytes()).await
    }
}

/// Writes `data` to a temporary sibling file and renames it over `target`
async fn write_atomic(target: &Path, data: &[u8]) -> anyhow::Result<()> {
    let tmp_path = {
        let mut p = target.as_os_str().to_owned();
        p.push(".kankasync.tmp");
        PathBuf::from(p)
    };

    debug!(?tmp_path, "Writing temporary file");
    tokio::fs::write(&tmp_path, data)
        .await
        .with_context(|| format!("writing {}", tmp_path.display()))?;
    tokio::fs::rename(&tmp_path, target)
        .await
        .with_context(|| format!("replacing {}", target.display()))?;
    Ok(())
}

fn glob_options() -> MatchOptions {
    MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Lists vault-relative Markdown paths under `prefix` matching `pattern`
///
/// The pattern is matched against the path relative to `prefix`.
fn scan(root: &Path, prefix: &str, pattern: Option<&Pattern>) -> anyhow::Result<Vec<DocumentPath>> {
    let prefix = prefix.trim_matches('/');
    let mut found = Vec::new();

    for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_hidden(e)) {
        let entry = entry.with_context(|| format!("scanning {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let path = DocumentPath::new(relative)?;
        if !path.is_under(prefix) {
            continue;
        }

        if let Some(pattern) = pattern {
            let within = if prefix.is_empty() {
                path.as_str()
            } else {
                &path.as_str()[prefix.len() + 1..]
            };
            if !pattern.matches_with(within, glob_options()) {
                continue;
            }
        }
        found.push(path);
    }

    found.sort();
    Ok(found)
}

#[async_trait::async_trait]
impl IDocumentStore for FsDocumentStore {
    async fn list_documents(
        &self,
        prefix: &str,
        glob: Option<&str>,
    ) -> anyhow::Result<Vec<DocumentPath>> {
        let pattern = glob
            .map(Pattern::new)
            .transpose()
            .with_context(|| format!("invalid glob {glob:?}"))?;
        let root = self.root.clone();
        let prefix = prefix.to_string();

        tokio::task::spawn_blocking(move || scan(&root, &prefix, pattern.as_ref())).await?
    }

    async fn read_body(&self, path: &DocumentPath) -> anyhow::Result<String> {
        Ok(self.read_document(path).await?.body)
    }

    async fn read_front_matter(&self, path: &DocumentPath) -> anyhow::Result<FrontMatter> {
        Ok(self.read_document(path).await?.front_matter)
    }

    async fn write_body(&self, path: &DocumentPath, body: &str) -> anyhow::Result<()> {
        let mut document = self.read_document(path).await?;
        if document.body == body {
            return Ok(());
        }
        document.body = body.to_string();
        self.write_document(path, &document).await
    }

    async fn mutate_front_matter(
        &self,
        path: &DocumentPath,
        mutator: FrontMatterMutator,
    ) -> anyhow::Result<()> {
        let mut document = self.read_document(path).await?;
        let before = document.front_matter.clone();
        let outcome = mutator(&mut document.front_matter);

        if document.front_matter != before {
            self.write_document(path, &document).await?;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use serde_yaml::Value;
    use tempfile::TempDir;

    use super::*;

    fn write(dir: &TempDir, rel: &str, text: &str) {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    fn read(dir: &TempDir, rel: &str) -> String {
        std::fs::read_to_string(dir.path().join(rel)).unwrap()
    }

    fn doc(path: &str) -> DocumentPath {
        DocumentPath::new(path).unwrap()
    }

    fn vault() -> (TempDir, FsDocumentStore) {
        let dir = TempDir::new().unwrap();
        write(&dir, "Isles/NPCs/Bob.md", "---\nEntityType: character\n---\n# Intro\nhi\n");
        write(&dir, "Isles/NPCs/Ann.md", "plain body");
        write(&dir, "Isles/Places/Port.md", "");
        write(&dir, "Isles/notes.txt", "not markdown");
        write(&dir, "Isles/.trash/Old.md", "deleted");
        write(&dir, "Other/Elsewhere.md", "");
        write(&dir, "Isles Extra/Nope.md", "");
        let store = FsDocumentStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn test_list_by_prefix() {
        let (_dir, store) = vault();
        let docs = store.list_documents("Isles", None).await.unwrap();
        assert_eq!(
            docs,
            vec![doc("Isles/NPCs/Ann.md"), doc("Isles/NPCs/Bob.md"), doc("Isles/Places/Port.md")]
        );
    }

    #[tokio::test]
    async fn test_list_whole_vault() {
        let (_dir, store) = vault();
        let docs = store.list_documents("", None).await.unwrap();
        assert_eq!(docs.len(), 5);
    }

    #[tokio::test]
    async fn test_list_with_glob_relative_to_prefix() {
        let (_dir, store) = vault();
        let docs = store.list_documents("Isles/", Some("NPCs/*.md")).await.unwrap();
        assert_eq!(docs, vec![doc("Isles/NPCs/Ann.md"), doc("Isles/NPCs/Bob.md")]);

        let deep = store.list_documents("Isles", Some("**/P*.md")).await.unwrap();
        assert_eq!(deep, vec![doc("Isles/Places/Port.md")]);
    }

    #[tokio::test]
    async fn test_invalid_glob_is_error() {
        let (_dir, store) = vault();
        assert!(store.list_documents("Isles", Some("[")).await.is_err());
    }

    #[tokio::test]
    async fn test_read_body_and_front_matter() {
        let (_dir, store) = vault();
        let bob = doc("Isles/NPCs/Bob.md");
        assert_eq!(store.read_body(&bob).await.unwrap(), "# Intro\nhi\n");
        let fm = store.read_front_matter(&bob).await.unwrap();
        assert_eq!(fm.get("EntityType"), Some(&Value::from("character")));

        let ann = doc("Isles/NPCs/Ann.md");
        assert!(store.read_front_matter(&ann).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_missing_is_error() {
        let (_dir, store) = vault();
        assert!(store.read_body(&doc("Isles/Missing.md")).await.is_err());
    }

    #[tokio::test]
    async fn test_write_body_keeps_front_matter() {
        let (dir, store) = vault();
        let bob = doc("Isles/NPCs/Bob.md");
        store.write_body(&bob, "# Intro ^5\nhi\n").await.unwrap();
        assert_eq!(
            read(&dir, "Isles/NPCs/Bob.md"),
            "---\nEntityType: character\n---\n# Intro ^5\nhi\n"
        );
        assert!(!dir.path().join("Isles/NPCs/Bob.md.kankasync.tmp").exists());
    }

    #[tokio::test]
    async fn test_mutate_adds_front_matter() {
        let (dir, store) = vault();
        let ann = doc("Isles/NPCs/Ann.md");
        store
            .mutate_front_matter(
                &ann,
                Box::new(|fm: &mut FrontMatter| -> anyhow::Result<()> {
                    fm.insert("name".into(), "Ann".into());
                    Ok(())
                }),
            )
            .await
            .unwrap();
        assert_eq!(read(&dir, "Isles/NPCs/Ann.md"), "---\nname: Ann\n---\nplain body");
    }

    #[tokio::test]
    async fn test_mutate_persists_when_mutator_fails() {
        let (dir, store) = vault();
        let bob = doc("Isles/NPCs/Bob.md");
        let err = store
            .mutate_front_matter(
                &bob,
                Box::new(|fm: &mut FrontMatter| -> anyhow::Result<()> {
                    fm.insert("id".into(), 3.into());
                    anyhow::bail!("halfway")
                }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "halfway");
        assert!(read(&dir, "Isles/NPCs/Bob.md").contains("id: 3"));
    }

    #[tokio::test]
    async fn test_unchanged_document_not_rewritten() {
        let (dir, store) = vault();
        let path = dir.path().join("Isles/NPCs/Bob.md");
        let before = std::fs::metadata(&path).unwrap().modified().unwrap();

        let bob = doc("Isles/NPCs/Bob.md");
        store
            .mutate_front_matter(&bob, Box::new(|_: &mut FrontMatter| Ok(())))
            .await
            .unwrap();
        store.write_body(&bob, "# Intro\nhi\n").await.unwrap();

        let after = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }
}
