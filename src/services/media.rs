use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::async_trait;
use axum::body::Bytes;
use uuid::Uuid;

pub const POST_MEDIA: &str = "post-media";
pub const GROUP_IMAGES: &str = "group-images";
pub const AVATARS: &str = "avatars";

/// A file received from a form, handed to object storage untouched.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Upload {
    /// Stored name: fresh id plus the original extension, if any.
    pub fn storage_name(&self) -> String {
        let id = Uuid::now_v7();
        match Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
        {
            Some(ext) if !ext.is_empty() => format!("{id}.{}", ext.to_lowercase()),
            _ => id.to_string(),
        }
    }
}

/// Object storage collaborator. Returns the public URL of what was stored.
#[async_trait]
pub trait MediaStore: Send + Sync + 'static {
    async fn put(&self, bucket: &str, upload: &Upload) -> anyhow::Result<String>;
}

/// Writes uploads under `root/<bucket>/` and serves them from `base_url`.
#[derive(Clone)]
pub struct LocalMediaStore {
    root: PathBuf,
    base_url: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    #[tracing::instrument(skip(self, upload), fields(file = %upload.file_name, size = upload.bytes.len()))]
    async fn put(&self, bucket: &str, upload: &Upload) -> anyhow::Result<String> {
        let dir = self.root.join(bucket);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;

        let name = upload.storage_name();
        let path = dir.join(&name);
        tokio::fs::write(&path, &upload.bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        tracing::debug!(path = %path.display(), "stored upload");
        Ok(format!("{}/{bucket}/{name}", self.base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> Upload {
        Upload {
            file_name: name.into(),
            content_type: "image/png".into(),
            bytes: Bytes::from_static(b"\x89PNG"),
        }
    }

    #[test]
    fn storage_name_keeps_extension() {
        assert!(upload("boss.PNG").storage_name().ends_with(".png"));
        assert!(!upload("noext").storage_name().contains('.'));
    }

    #[tokio::test]
    async fn put_writes_file_and_returns_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalMediaStore::new(dir.path(), "/media/");

        let url = store.put(AVATARS, &upload("me.jpg")).await.unwrap();

        assert!(url.starts_with("/media/avatars/"));
        let name = url.rsplit('/').next().unwrap();
        let written = std::fs::read(dir.path().join(AVATARS).join(name)).unwrap();
        assert_eq!(written, b"\x89PNG");
    }
}
