//! Upload of a content tree to a bucket

use crate::content::ContentRoot;
use crate::error::{Error, Result};
use crate::metadata::MetadataResolver;
use crate::progress::Reporter;
use crate::storage::{ObjectStore, ObjectUpload};
use tracing::{debug, info};

/// Upload every file under `root`, one call per file, in walk order
///
/// Every key is checked before the first upload. Stops at the first failure;
/// nothing after the failing file is attempted. Returns the number of
/// uploaded files.
pub async fn sync_content(
    store: &dyn ObjectStore,
    bucket: &str,
    root: &ContentRoot,
    resolver: &MetadataResolver,
    reporter: &dyn Reporter,
) -> Result<usize> {
    let files = root.plan()?;
    let mut uploaded = 0;

    for file in files {
        let item = resolver.resolve(&file.path, &file.key);

        let body = tokio::fs::read(&item.local_path).await.map_err(|e| {
            debug!(key = %item.storage_key, error = %e, "local read failed");
            Error::Upload {
                key: item.storage_key.clone(),
                code: "LocalReadError".to_string(),
                uploaded,
            }
        })?;

        let upload = ObjectUpload {
            key: item.storage_key.clone(),
            body,
            content_type: item.content_type.clone(),
            cache_control: Some(item.cache_control.to_string()),
        };

        store
            .put_object(bucket, upload)
            .await
            .map_err(|e| Error::Upload {
                key: item.storage_key.clone(),
                code: e.code,
                uploaded,
            })?;

        uploaded += 1;
        debug!(
            key = %item.storage_key,
            content_type = item.content_type.as_deref().unwrap_or("-"),
            cache_control = item.cache_control,
            "uploaded"
        );
        reporter.uploaded(&item);
    }

    info!(bucket, uploaded, "content synchronized");
    Ok(uploaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::metadata::{CACHE_CONTROL_ASSET, CACHE_CONTROL_REVALIDATE};
    use crate::progress::SilentReporter;
    use crate::storage::BucketStatus;
    use crate::testing::{call_log, calls, site_tree, Call, FakeStore};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl Reporter for Collect {
        fn uploaded(&self, item: &crate::metadata::ContentItem) {
            self.0.lock().unwrap().push(item.storage_key.clone());
        }
    }

    fn resolver() -> MetadataResolver {
        MetadataResolver::for_entry_document("index.html")
    }

    #[tokio::test]
    async fn test_uploads_every_file_with_metadata() {
        let dir = site_tree(&["index.html", "style.css", "docs/guide.html"]);
        let root = ContentRoot::new(dir.path(), "index.html");
        let store = FakeStore::new(call_log(), BucketStatus::Exists);
        let reporter = Collect::default();

        let count = sync_content(&store, "site", &root, &resolver(), &reporter)
            .await
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            *reporter.0.lock().unwrap(),
            vec!["docs/guide.html", "index.html", "style.css"]
        );

        let index = store.object("index.html").unwrap();
        assert_eq!(index.cache_control.as_deref(), Some(CACHE_CONTROL_REVALIDATE));
        assert_eq!(index.content_type.as_deref(), Some("text/html"));
        assert_eq!(index.body, b"<!-- index.html -->".to_vec());

        let css = store.object("style.css").unwrap();
        assert_eq!(css.cache_control.as_deref(), Some(CACHE_CONTROL_ASSET));
        assert_eq!(css.content_type.as_deref(), Some("text/css"));
    }

    #[tokio::test]
    async fn test_unknown_extension_uploads_without_content_type() {
        let dir = site_tree(&["index.html", "CNAME"]);
        let root = ContentRoot::new(dir.path(), "index.html");
        let store = FakeStore::new(call_log(), BucketStatus::Exists);

        sync_content(&store, "site", &root, &resolver(), &SilentReporter)
            .await
            .unwrap();

        let cname = store.object("CNAME").unwrap();
        assert_eq!(cname.content_type, None);
        assert_eq!(cname.cache_control.as_deref(), Some(CACHE_CONTROL_ASSET));
    }

    #[tokio::test]
    async fn test_fails_fast_at_every_position() {
        let files = ["a.css", "b.js", "c.png", "index.html"];
        let dir = site_tree(&files);
        let root = ContentRoot::new(dir.path(), "index.html");

        for n in 1..=files.len() {
            let log = call_log();
            let store = FakeStore::new(log.clone(), BucketStatus::Exists)
                .failing_upload_at(n, ServiceError::other("SlowDown", "reduce your request rate"));

            let err = sync_content(&store, "site", &root, &resolver(), &SilentReporter)
                .await
                .unwrap_err();

            match err {
                Error::Upload { key, code, uploaded } => {
                    assert_eq!(key, files[n - 1]);
                    assert_eq!(code, "SlowDown");
                    assert_eq!(uploaded, n - 1);
                }
                other => panic!("unexpected error: {other:?}"),
            }

            // Exactly n attempts, n - 1 of them stored
            let puts = calls(&log)
                .into_iter()
                .filter(|c| matches!(c, Call::PutObject { .. }))
                .count();
            assert_eq!(puts, n);
            assert_eq!(store.object_keys().len(), n - 1);
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_non_utf8_name_uploads_nothing() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = site_tree(&["a.css", "index.html"]);
        std::fs::write(dir.path().join(OsStr::from_bytes(b"b\xff.css")), "b").unwrap();
        std::fs::write(dir.path().join(OsStr::from_bytes(b"b\xfe.css")), "c").unwrap();
        let root = ContentRoot::new(dir.path(), "index.html");
        let log = call_log();
        let store = FakeStore::new(log.clone(), BucketStatus::Exists);

        let err = sync_content(&store, "site", &root, &resolver(), &SilentReporter)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(calls(&log).is_empty());
        assert!(store.object_keys().is_empty());
    }

    #[tokio::test]
    async fn test_empty_subdirectories_are_ignored() {
        let dir = site_tree(&["index.html"]);
        std::fs::create_dir_all(dir.path().join("empty/deeper")).unwrap();
        let root = ContentRoot::new(dir.path(), "index.html");
        let store = FakeStore::new(call_log(), BucketStatus::Exists);

        let count = sync_content(&store, "site", &root, &resolver(), &SilentReporter)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
