//! Filesystem-backed blob store.
//!
//! Layout: `{root}/{container}/{blake3(key)}`. Each object file starts with
//! its key and a newline, followed by the content. File names have a fixed
//! length whatever the key, and a key can be both an object and the prefix
//! of other keys (`dir` and `dir/obj` live side by side). Writes land in a
//! temporary file that is renamed over the target, so readers never observe
//! a partial object.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use crate::names::{validate_container_name, validate_key};
use crate::presign::LinkSigner;
use crate::traits::{page_of, BlobStore, ListPage};

/// Longest key this backend accepts, in bytes.
pub const MAX_KEY_LEN: usize = 1024;

/// Name prefix of in-flight writes.
const TEMP_PREFIX: &str = ".dobj-tmp";

/// Key separator inside an object file. Keys never contain control
/// characters.
const HEADER_END: u8 = b'\n';

/// Blob store rooted at a local directory.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
    signer: LinkSigner,
}

impl FsBlobStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>, signer: LinkSigner) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, signer })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_dir(&self, container: &str) -> StoreResult<PathBuf> {
        validate_container_name(container)?;
        Ok(self.root.join(container))
    }

    fn existing_container_dir(&self, container: &str) -> StoreResult<PathBuf> {
        let dir = self.container_dir(container)?;
        if !dir.is_dir() {
            return Err(StoreError::ContainerNotFound(container.to_string()));
        }
        Ok(dir)
    }

    fn object_path(&self, container: &str, key: &str) -> StoreResult<PathBuf> {
        validate_key(key)?;
        if key.len() > MAX_KEY_LEN {
            return Err(StoreError::InvalidName {
                name: key.to_string(),
                reason: format!("key longer than {MAX_KEY_LEN} bytes"),
            });
        }
        Ok(self.container_dir(container)?.join(file_name(key)))
    }

    /// Every key stored in `dir`, sorted. Files that are not object files
    /// (temporary writes, foreign files) are skipped.
    fn keys_in(dir: &Path) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !is_object_name(name) {
                continue;
            }
            if let Some(key) = read_key(&entry.path())? {
                if file_name(&key) == name {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Remove leftover temporary files so an otherwise empty directory can
    /// be removed.
    fn remove_temp_files(dir: &Path) -> StoreResult<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let is_temp = entry.file_name().to_str().is_some_and(|n| n.starts_with(TEMP_PREFIX));
            if is_temp && entry.file_type()?.is_file() {
                match fs::remove_file(entry.path()) {
                    Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

fn file_name(key: &str) -> String {
    blake3::hash(key.as_bytes()).to_hex().to_string()
}

fn is_object_name(name: &str) -> bool {
    name.len() == 64 && name.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Read the key header of an object file. `None` if the file vanished or
/// carries no complete header.
fn read_key(path: &Path) -> StoreResult<Option<String>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut header = Vec::new();
    BufReader::new(file)
        .take(MAX_KEY_LEN as u64 + 1)
        .read_until(HEADER_END, &mut header)?;
    if header.pop() != Some(HEADER_END) {
        return Ok(None);
    }
    Ok(String::from_utf8(header).ok())
}

impl BlobStore for FsBlobStore {
    fn container_exists(&self, container: &str) -> StoreResult<bool> {
        match self.container_dir(container) {
            Ok(dir) => Ok(dir.is_dir()),
            Err(StoreError::InvalidName { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn list_page(
        &self,
        container: &str,
        prefix: &str,
        start_after: Option<&str>,
        max_keys: usize,
    ) -> StoreResult<ListPage> {
        let dir = self.existing_container_dir(container)?;
        let keys = Self::keys_in(&dir)?;
        Ok(page_of(keys.iter().map(String::as_str), prefix, start_after, max_keys))
    }

    fn object_exists(&self, container: &str, key: &str) -> StoreResult<bool> {
        match self.object_path(container, key) {
            Ok(path) => Ok(path.is_file()),
            Err(StoreError::InvalidName { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn get_object(&self, container: &str, key: &str) -> StoreResult<Vec<u8>> {
        let path = self.object_path(container, key)?;
        let mut raw = fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::object_not_found(container, key),
            _ => StoreError::Io(e),
        })?;

        let header_len = key.len() + 1;
        let header_ok = raw.len() >= header_len
            && raw.starts_with(key.as_bytes())
            && raw[key.len()] == HEADER_END;
        if !header_ok {
            return Err(StoreError::Backend(format!(
                "corrupt object file {}",
                path.display()
            )));
        }
        Ok(raw.split_off(header_len))
    }

    fn put_object(&self, container: &str, key: &str, data: &[u8]) -> StoreResult<()> {
        let path = self.object_path(container, key)?;
        let dir = self.existing_container_dir(container)?;

        let mut tmp = tempfile::Builder::new().prefix(TEMP_PREFIX).tempfile_in(&dir)?;
        tmp.write_all(key.as_bytes())?;
        tmp.write_all(&[HEADER_END])?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn delete_object(&self, container: &str, key: &str) -> StoreResult<()> {
        let path = match self.object_path(container, key) {
            Ok(path) => path,
            Err(StoreError::InvalidName { .. }) => return Ok(()),
            Err(e) => return Err(e),
        };
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn create_container(&self, container: &str) -> StoreResult<()> {
        let dir = self.container_dir(container)?;
        match fs::create_dir(&dir) {
            Ok(()) => {
                tracing::debug!(container, path = %dir.display(), "created container");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(StoreError::ContainerAlreadyExists(container.to_string()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn delete_container(&self, container: &str) -> StoreResult<()> {
        let dir = self.existing_container_dir(container)?;
        if !Self::keys_in(&dir)?.is_empty() {
            return Err(StoreError::ContainerNotEmpty(container.to_string()));
        }
        Self::remove_temp_files(&dir)?;

        // Non-recursive: anything written since the check keeps the
        // directory in place.
        if let Err(e) = fs::remove_dir(&dir) {
            if dir.is_dir() && !Self::keys_in(&dir)?.is_empty() {
                return Err(StoreError::ContainerNotEmpty(container.to_string()));
            }
            return Err(StoreError::Io(e));
        }
        tracing::debug!(container, path = %dir.display(), "removed container");
        Ok(())
    }

    fn presign(&self, container: &str, key: &str, ttl_secs: u64) -> StoreResult<String> {
        if !self.object_exists(container, key)? {
            return Err(StoreError::object_not_found(container, key));
        }
        Ok(self.signer.sign(container, key, ttl_secs))
    }
}
