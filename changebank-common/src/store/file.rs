use super::Store;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Error, Debug)]
pub enum Error {
    #[error("file store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file store format error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

/// A [`Store`] persisted as a single JSON object in a file.
///
/// Every operation reads the whole file and writes it back, so it is only suited to
/// small amounts of data such as the authorization state.
pub struct FileStore<V> {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
    _value: PhantomData<fn() -> V>,
}

impl<V> FileStore<V> {
    /// Create a new [`FileStore`] reading and writing the file at the given path.
    ///
    /// The file is created on the first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Arc::new(Mutex::new(())),
            _value: PhantomData,
        }
    }
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<V> Clone for FileStore<V> {
    fn clone(&self) -> Self {
        Self { path: self.path.clone(), lock: self.lock.clone(), _value: PhantomData }
    }
}

impl<V> FileStore<V>
where
    V: DeserializeOwned + Serialize,
{
    async fn read(&self) -> Result<BTreeMap<String, V>, Error> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
    async fn write(&self, map: &BTreeMap<String, V>) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&self.path, serde_json::to_string_pretty(map)?).await?;
        tracing::trace!(path = ?self.path, entries = map.len(), "file store written");
        Ok(())
    }
}

impl<V> Store<String, V> for FileStore<V>
where
    V: Debug + Clone + DeserializeOwned + Serialize + Send + Sync + 'static,
{
    type Error = Error;

    async fn get(&self, key: &String) -> Result<Option<V>, Self::Error> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.remove(key))
    }
    async fn set(&self, key: String, value: V) -> Result<(), Self::Error> {
        let _guard = self.lock.lock().await;
        let mut map = self.read().await?;
        map.insert(key, value);
        self.write(&map).await
    }
    async fn del(&self, key: &String) -> Result<(), Self::Error> {
        let _guard = self.lock.lock().await;
        let mut map = self.read().await?;
        if map.remove(key).is_some() {
            self.write(&map).await?;
        }
        Ok(())
    }
    async fn clear(&self) -> Result<(), Self::Error> {
        let _guard = self.lock.lock().await;
        self.write(&BTreeMap::new()).await
    }
}
