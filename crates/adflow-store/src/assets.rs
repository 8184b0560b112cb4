use std::path::{Path, PathBuf};

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use adflow_core::ids::SessionId;

use crate::error::StoreError;

/// An uploaded creative, immutable once stored. `path` is the
/// session-relative reference handed back to clients and later spliced into
/// ad-specification prompts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Asset {
    pub kind: String,
    pub path: String,
    pub original_name: String,
}

/// Session-scoped storage of uploaded creatives.
///
/// Files land under `<root>/<session_id>/<kind>_<timestamp><ext>` and are
/// the only durable artifact; the per-session index is in-memory and lists
/// assets in upload order. Two same-kind uploads within one second share a
/// filename — the naming scheme does not structurally prevent that.
pub struct AssetStore {
    root: PathBuf,
    index: DashMap<SessionId, Vec<Asset>>,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root, index: DashMap::new() })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store uploaded bytes for a session and return the asset reference.
    pub fn put(
        &self,
        session_id: &SessionId,
        kind: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<Asset, StoreError> {
        let session_dir = self.root.join(session_id.as_str());
        std::fs::create_dir_all(&session_dir)?;

        let extension = Path::new(filename)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        let stored_name = format!("{kind}_{timestamp}{extension}");

        std::fs::write(session_dir.join(&stored_name), bytes)?;

        let asset = Asset {
            kind: kind.to_string(),
            path: format!("{}/{}", session_id.as_str(), stored_name),
            original_name: filename.to_string(),
        };
        self.index.entry(session_id.clone()).or_default().push(asset.clone());

        tracing::debug!(session_id = %session_id, path = %asset.path, "asset stored");
        Ok(asset)
    }

    /// Assets uploaded for a session, in upload order.
    pub fn list(&self, session_id: &SessionId) -> Vec<Asset> {
        self.index
            .get(session_id)
            .map(|assets| assets.clone())
            .unwrap_or_default()
    }

    /// Read an asset's bytes back by its reference.
    pub fn get_bytes(&self, asset_ref: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.root.join(asset_ref);
        std::fs::read(&path).map_err(|_| StoreError::AssetNotFound(asset_ref.to_string()))
    }

    /// Drop a session's index entry and stored files.
    pub fn destroy_session(&self, session_id: &SessionId) {
        self.index.remove(session_id);
        let session_dir = self.root.join(session_id.as_str());
        if session_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&session_dir) {
                tracing::warn!(session_id = %session_id, error = %e, "failed to remove session uploads");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, AssetStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path().join("uploads")).unwrap();
        (dir, store)
    }

    #[test]
    fn put_then_get_bytes_roundtrip() {
        let (_dir, store) = store();
        let session = SessionId::new();

        let asset = store
            .put(&session, "image", "hero.png", b"png-bytes-here")
            .unwrap();
        assert_eq!(asset.kind, "image");
        assert_eq!(asset.original_name, "hero.png");
        assert!(asset.path.starts_with(session.as_str()));
        assert!(asset.path.ends_with(".png"));

        let bytes = store.get_bytes(&asset.path).unwrap();
        assert_eq!(bytes, b"png-bytes-here");
    }

    #[test]
    fn list_returns_uploads_in_call_order() {
        let (_dir, store) = store();
        let session = SessionId::new();

        store.put(&session, "image", "a.png", b"a").unwrap();
        store.put(&session, "video", "b.mp4", b"b").unwrap();

        let assets = store.list(&session);
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].original_name, "a.png");
        assert_eq!(assets[1].original_name, "b.mp4");
    }

    #[test]
    fn list_is_session_scoped() {
        let (_dir, store) = store();
        let a = SessionId::new();
        let b = SessionId::new();

        store.put(&a, "image", "a.png", b"a").unwrap();

        assert_eq!(store.list(&a).len(), 1);
        assert!(store.list(&b).is_empty());
    }

    #[test]
    fn missing_asset_fails_with_not_found() {
        let (_dir, store) = store();
        let result = store.get_bytes("no-such-session/no-such-file.png");
        assert!(matches!(result, Err(StoreError::AssetNotFound(_))));
    }

    #[test]
    fn stored_name_derives_from_kind_and_extension() {
        let (_dir, store) = store();
        let session = SessionId::new();

        let asset = store.put(&session, "document", "brief.pdf", b"pdf").unwrap();
        let stored = asset.path.rsplit('/').next().unwrap();
        assert!(stored.starts_with("document_"));
        assert!(stored.ends_with(".pdf"));
    }

    #[test]
    fn filename_without_extension_is_accepted() {
        let (_dir, store) = store();
        let session = SessionId::new();

        let asset = store.put(&session, "image", "raw", b"data").unwrap();
        let stored = asset.path.rsplit('/').next().unwrap();
        assert!(stored.starts_with("image_"));
        assert!(!stored.contains('.'));
        assert_eq!(store.get_bytes(&asset.path).unwrap(), b"data");
    }

    #[test]
    fn destroy_session_drops_index_and_files() {
        let (_dir, store) = store();
        let session = SessionId::new();

        let asset = store.put(&session, "image", "a.png", b"a").unwrap();
        store.destroy_session(&session);

        assert!(store.list(&session).is_empty());
        assert!(store.get_bytes(&asset.path).is_err());
    }
}
