use super::Loader;
use std::path::{Path, PathBuf};

/// An implementation of [`Loader`] that reads the configuration document from a file.
pub struct FileLoader {
    path: PathBuf,
}

impl FileLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl Loader for FileLoader {
    async fn load(
        &self,
    ) -> core::result::Result<String, Box<dyn std::error::Error + Send + Sync + 'static>> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }
}
