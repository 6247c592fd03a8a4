//! One-way sync of a local directory into a bucket

use crate::error::Result;
use crate::local::{scan_local_files, LocalFile};
use crate::store::{ObjectStore, UploadOptions};
use std::collections::HashSet;
use std::path::PathBuf;

/// Progress of the upload phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    /// 1-based index of the current entry
    pub current: usize,
    /// Number of enumerated entries, directories included
    pub total: usize,
}

/// Outcome of a full run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploySummary {
    pub uploaded: usize,
    pub skipped_dirs: usize,
    pub deleted: Vec<String>,
}

/// Uploads a directory tree and removes stale remote objects.
///
/// The local tree is enumerated once in [`Deployer::new`]; both phases
/// work from that snapshot.
pub struct Deployer<S> {
    store: S,
    files: Vec<LocalFile>,
    keys: HashSet<String>,
}

impl<S: ObjectStore> Deployer<S> {
    /// Enumerate `root` and wrap the store. A missing root gives an empty tree.
    pub fn new(root: impl Into<PathBuf>, store: S) -> Result<Self> {
        let root = root.into();
        let files = scan_local_files(&root)?;
        let keys = files
            .iter()
            .filter(|f| !f.is_dir)
            .map(|f| f.key.clone())
            .collect();

        tracing::info!(root = %root.display(), entries = files.len(), "scanned upload root");

        Ok(Self {
            store,
            files,
            keys,
        })
    }

    pub fn files(&self) -> &[LocalFile] {
        &self.files
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Upload every file in enumeration order.
    ///
    /// `on_progress` is called once per entry, directories included. The
    /// first failing upload aborts the phase.
    pub async fn upload<F>(&self, mut on_progress: F) -> Result<usize>
    where
        F: FnMut(UploadProgress),
    {
        let total = self.files.len();
        let mut uploaded = 0;

        for (index, file) in self.files.iter().enumerate() {
            on_progress(UploadProgress {
                current: index + 1,
                total,
            });

            if file.is_dir {
                continue;
            }

            let options = UploadOptions::for_path(&file.path);
            tracing::debug!(
                key = %file.key,
                content_type = options.content_type.as_deref().unwrap_or("-"),
                "uploading"
            );

            self.store.put_file(&file.key, &file.path, &options).await?;
            uploaded += 1;
        }

        tracing::info!(uploaded, "upload complete");
        Ok(uploaded)
    }

    /// Delete every remote object whose key is not a local file key.
    ///
    /// `on_delete` is called after each successful deletion. The first
    /// failing deletion aborts the phase; earlier deletions stay.
    pub async fn cleanup<F>(&self, mut on_delete: F) -> Result<Vec<String>>
    where
        F: FnMut(&str),
    {
        let remote = self.store.list_keys().await?;
        tracing::info!(remote = remote.len(), local = self.keys.len(), "comparing bucket listing");

        let mut deleted = Vec::new();
        for key in remote {
            if self.keys.contains(&key) {
                continue;
            }

            tracing::info!(key = %key, "deleting stale object");
            self.store.delete_object(&key).await?;
            on_delete(&key);
            deleted.push(key);
        }

        Ok(deleted)
    }

    /// Upload then cleanup, without progress callbacks.
    pub async fn run(&self) -> Result<DeploySummary> {
        let uploaded = self.upload(|_| {}).await?;
        let deleted = self.cleanup(|_| {}).await?;

        Ok(DeploySummary {
            uploaded,
            skipped_dirs: self.files.iter().filter(|f| f.is_dir).count(),
            deleted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;

    /// Bucket kept in memory, records every call
    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<BTreeMap<String, (Vec<u8>, UploadOptions)>>,
        puts: Mutex<Vec<String>>,
        fail_put: Option<String>,
        fail_delete: Option<String>,
    }

    impl MemoryStore {
        fn with_keys(keys: &[&str]) -> Self {
            let store = Self::default();
            {
                let mut objects = store.objects.lock().unwrap();
                for key in keys {
                    objects.insert(
                        key.to_string(),
                        (b"remote".to_vec(), UploadOptions::for_path(Path::new(key))),
                    );
                }
            }
            store
        }

        fn keys(&self) -> Vec<String> {
            self.objects.lock().unwrap().keys().cloned().collect()
        }

        fn options(&self, key: &str) -> UploadOptions {
            self.objects.lock().unwrap()[key].1.clone()
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn put_file(&self, key: &str, path: &Path, options: &UploadOptions) -> Result<()> {
            if self.fail_put.as_deref() == Some(key) {
                return Err(Error::S3Operation(format!("AccessDenied: {}", key)));
            }
            let body = fs::read(path)?;
            self.puts.lock().unwrap().push(key.to_string());
            self.objects
                .lock()
                .unwrap()
                .insert(key.to_string(), (body, options.clone()));
            Ok(())
        }

        async fn list_keys(&self) -> Result<Vec<String>> {
            Ok(self.keys())
        }

        async fn delete_object(&self, key: &str) -> Result<()> {
            if self.fail_delete.as_deref() == Some(key) {
                return Err(Error::S3Operation(format!("AccessDenied: {}", key)));
            }
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }
    }

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("css")).unwrap();
        fs::write(root.join("index.html"), "<html/>").unwrap();
        fs::write(root.join(".htaccess"), "deny").unwrap();
        fs::write(root.join("css/site.css"), "body{}").unwrap();
        fs::write(root.join("CNAME"), "example.com").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_run_mirrors_local_tree() {
        let dir = site();
        let deployer = Deployer::new(dir.path(), MemoryStore::with_keys(&["stale.js"])).unwrap();

        let summary = deployer.run().await.unwrap();

        assert_eq!(summary.uploaded, 4);
        assert_eq!(summary.skipped_dirs, 1);
        assert_eq!(summary.deleted, vec!["stale.js".to_string()]);
        assert_eq!(
            deployer.store().keys(),
            vec![".htaccess", "CNAME", "css/site.css", "index.html"]
        );
    }

    #[tokio::test]
    async fn test_upload_sets_acl_and_content_type() {
        let dir = site();
        let deployer = Deployer::new(dir.path(), MemoryStore::default()).unwrap();
        deployer.upload(|_| {}).await.unwrap();

        let html = deployer.store().options("index.html");
        assert_eq!(html.acl, aws_sdk_s3::types::ObjectCannedAcl::AuthenticatedRead);
        assert_eq!(html.content_type.as_deref(), Some("text/html"));

        let cname = deployer.store().options("CNAME");
        assert_eq!(cname.content_type, None);

        let body = deployer.store().objects.lock().unwrap()["css/site.css"].0.clone();
        assert_eq!(body, b"body{}".to_vec());
    }

    #[tokio::test]
    async fn test_upload_reports_progress_for_every_entry() {
        let dir = site();
        let deployer = Deployer::new(dir.path(), MemoryStore::default()).unwrap();

        let mut seen = Vec::new();
        deployer.upload(|p| seen.push(p)).await.unwrap();

        assert_eq!(seen.len(), 5);
        assert_eq!(seen.first(), Some(&UploadProgress { current: 1, total: 5 }));
        assert_eq!(seen.last(), Some(&UploadProgress { current: 5, total: 5 }));
    }

    #[tokio::test]
    async fn test_cleanup_deletes_only_unmatched() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let store = MemoryStore::with_keys(&["a.txt", "old/b.txt"]);
        let deployer = Deployer::new(dir.path(), store).unwrap();

        let mut reported = Vec::new();
        let deleted = deployer.cleanup(|k| reported.push(k.to_string())).await.unwrap();

        assert_eq!(deleted, vec!["old/b.txt".to_string()]);
        assert_eq!(reported, deleted);
        assert_eq!(deployer.store().keys(), vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_cleanup_matches_with_dotted_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("site")).unwrap();
        fs::write(dir.path().join("site/a.txt"), "a").unwrap();

        let store = MemoryStore::with_keys(&["a.txt"]);
        let deployer = Deployer::new(dir.path().join("site").join("."), store).unwrap();

        let deleted = deployer.cleanup(|_| {}).await.unwrap();
        assert!(deleted.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_removes_directory_markers() {
        let dir = site();
        let store = MemoryStore::with_keys(&["css/", "css/site.css"]);
        let deployer = Deployer::new(dir.path(), store).unwrap();

        let deleted = deployer.cleanup(|_| {}).await.unwrap();
        assert_eq!(deleted, vec!["css/".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_root_clears_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::with_keys(&["a.txt", "b/c.txt", ".env"]);
        let deployer = Deployer::new(dir.path(), store).unwrap();

        let summary = deployer.run().await.unwrap();
        assert_eq!(summary.uploaded, 0);
        assert_eq!(summary.deleted.len(), 3);
        assert!(deployer.store().keys().is_empty());
    }

    #[tokio::test]
    async fn test_missing_root_clears_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::with_keys(&["a.txt"]);
        let deployer = Deployer::new(dir.path().join("missing"), store).unwrap();

        assert!(deployer.files().is_empty());
        let summary = deployer.run().await.unwrap();
        assert_eq!(summary.deleted, vec!["a.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_second_run_changes_nothing() {
        let dir = site();
        let deployer = Deployer::new(dir.path(), MemoryStore::with_keys(&["old.txt"])).unwrap();

        deployer.run().await.unwrap();
        let after_first = deployer.store().keys();

        let second = deployer.run().await.unwrap();
        assert!(second.deleted.is_empty());
        assert_eq!(deployer.store().keys(), after_first);
    }

    #[tokio::test]
    async fn test_upload_failure_aborts_remaining() {
        let dir = site();
        let store = MemoryStore {
            fail_put: Some("CNAME".to_string()),
            ..MemoryStore::default()
        };
        let deployer = Deployer::new(dir.path(), store).unwrap();

        let err = deployer.run().await.unwrap_err();
        assert!(matches!(err, Error::S3Operation(_)));
        // ".htaccess" sorts before "CNAME", nothing after it is attempted
        assert_eq!(*deployer.store().puts.lock().unwrap(), vec![".htaccess".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_prior_deletions() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MemoryStore::with_keys(&["a", "b", "c"]);
        store.fail_delete = Some("b".to_string());
        let deployer = Deployer::new(dir.path(), store).unwrap();

        assert!(deployer.cleanup(|_| {}).await.is_err());
        assert_eq!(deployer.store().keys(), vec!["b", "c"]);
    }
}
