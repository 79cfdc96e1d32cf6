use std::path::{Component, Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::core::error::{HarvestError, HarvestResult};
use crate::core::maven::Artifact;

/// Flat output directory: one `artifactId-version.ext` file per artifact.
///
/// The directory must already exist. Existing files are truncated, so two
/// groups sharing a name and version overwrite each other.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the artifact and return the path written.
    ///
    /// The file name must be a single plain path component so the write
    /// stays inside the store directory.
    pub async fn store(&self, artifact: &Artifact) -> HarvestResult<PathBuf> {
        let file_name = artifact.file_name();
        if !is_single_component(&file_name) {
            return Err(HarvestError::InvalidCoordinate(artifact.coordinate.to_string()));
        }
        let dest = self.dir.join(file_name);
        write_file(&dest, &artifact.bytes).await?;
        Ok(dest)
    }
}

fn is_single_component(file_name: &str) -> bool {
    let mut components = Path::new(file_name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

async fn write_file(dest: &Path, bytes: &[u8]) -> HarvestResult<()> {
    let store_err = |source| HarvestError::StoreIo {
        path: dest.to_path_buf(),
        source,
    };

    // Scope the handle so it is closed before returning.
    {
        let mut file = tokio::fs::File::create(dest).await.map_err(store_err)?;
        file.write_all(bytes).await.map_err(store_err)?;
        file.flush().await.map_err(store_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::maven::Coordinate;

    fn artifact(bytes: &[u8]) -> Artifact {
        Artifact {
            coordinate: Coordinate::new("org.greenrobot", "eventbus", "3.0.0"),
            extension: "jar",
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn stored_bytes_read_back_identically() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

        let path = store.store(&artifact(&payload)).await.unwrap();
        assert_eq!(path, dir.path().join("eventbus-3.0.0.jar"));
        assert_eq!(std::fs::read(&path).unwrap(), payload);
    }

    #[tokio::test]
    async fn existing_file_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        std::fs::write(dir.path().join("eventbus-3.0.0.jar"), vec![7u8; 100]).unwrap();

        let path = store.store(&artifact(b"short")).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"short");
    }

    #[tokio::test]
    async fn file_name_cannot_leave_the_directory() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("out");
        std::fs::create_dir(&out).unwrap();
        let store = ArtifactStore::new(&out);

        let escaping = Artifact {
            coordinate: Coordinate::new("g", "evil", "1/../../escaped"),
            extension: "jar",
            bytes: b"payload".to_vec(),
        };
        let err = store.store(&escaping).await.unwrap_err();
        assert!(matches!(err, HarvestError::InvalidCoordinate(_)));
        assert!(!root.path().join("escaped.jar").exists());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn missing_directory_is_a_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("does-not-exist"));

        let err = store.store(&artifact(b"x")).await.unwrap_err();
        assert!(matches!(err, HarvestError::StoreIo { .. }));
    }
}
