//! Session tokens and the stores that keep them

use std::error::Error;
use std::fmt::{Debug, Formatter};
use std::fs::{DirBuilder, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::config::TOKEN_KEY;
use crate::traits::SessionStore;

/// The credentials of a logged-in user, as sent in the `Authorization` header.
///
/// This is computed once (at login or signup) and reused verbatim for every request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken {
    token: String,
}

impl SessionToken {
    /// Build a token from an email and a password, i.e. `base64(email:password)`
    pub fn from_credentials(email: &str, password: &str) -> Self {
        let token = STANDARD.encode(format!("{}:{}", email, password));
        Self { token }
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// The full value of the `Authorization` header
    pub fn authorization_value(&self) -> String {
        format!("Basic {}", self.token)
    }
}

impl From<String> for SessionToken {
    fn from(token: String) -> Self {
        Self { token }
    }
}

/// Tokens contain a password, they are never printed
impl Debug for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionToken(<{} bytes>)", self.token.len())
    }
}


fn lock_slot(slot: &Mutex<Option<SessionToken>>) -> MutexGuard<'_, Option<SessionToken>> {
    // A poisoned slot still holds a consistent Option
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A session store that only lives as long as the process
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<SessionToken>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that is already logged in
    pub fn with_token(token: SessionToken) -> Self {
        Self { slot: Mutex::new(Some(token)) }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<SessionToken> {
        lock_slot(&self.slot).clone()
    }

    fn set(&self, token: SessionToken) {
        *lock_slot(&self.slot) = Some(token);
    }

    fn clear(&self) {
        *lock_slot(&self.slot) = None;
    }
}


/// A session store that survives restarts, backed by a JSON file
///
/// The file is only read the first time the token is needed.
/// Failing to write it is logged but not fatal: the in-memory value stays the reference for this process.
#[derive(Debug)]
pub struct FileSessionStore {
    backing_file: PathBuf,
    slot: OnceCell<Mutex<Option<SessionToken>>>,
}

impl FileSessionStore {
    pub fn new(path: &Path) -> Self {
        Self {
            backing_file: PathBuf::from(path),
            slot: OnceCell::new(),
        }
    }

    pub fn backing_file(&self) -> &Path {
        &self.backing_file
    }

    fn slot(&self) -> &Mutex<Option<SessionToken>> {
        self.slot.get_or_init(|| {
            let token = match Self::read_file(&self.backing_file) {
                Ok(token) => token,
                Err(err) => {
                    log::warn!("Unable to read session file {:?}: {}. Starting logged out", self.backing_file, err);
                    None
                },
            };
            Mutex::new(token)
        })
    }

    fn read_file(path: &Path) -> Result<Option<SessionToken>, Box<dyn Error>> {
        let file = match std::fs::File::open(path) {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(format!("Unable to open file {:?}: {}", path, err).into()),
            Ok(file) => file,
        };
        // A single named entry. A missing file means "logged out"
        let content: serde_json::Map<String, serde_json::Value> = serde_json::from_reader(file)?;
        match content.get(TOKEN_KEY) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::String(token)) => Ok(Some(SessionToken::from(token.clone()))),
            Some(other) => Err(format!("Unexpected {} entry in {:?}: {}", TOKEN_KEY, path, other).into()),
        }
    }

    /// Store the current token to the backing file (or remove the file when there is no token)
    fn save_to_file(&self, token: Option<&SessionToken>) {
        let path = &self.backing_file;

        let token = match token {
            None => {
                if let Err(err) = std::fs::remove_file(path) {
                    if err.kind() != std::io::ErrorKind::NotFound {
                        log::warn!("Unable to remove session file {:?}: {}", path, err);
                    }
                }
                return;
            },
            Some(token) => token.clone(),
        };

        if let Some(parent) = path.parent() {
            if let Err(err) = private_dir_builder().create(parent) {
                log::warn!("Unable to create folder {:?}: {}", parent, err);
                return;
            }
        }
        let file = match create_private_file(path) {
            Err(err) => {
                log::warn!("Unable to save file {:?}: {}", path, err);
                return;
            },
            Ok(f) => f,
        };

        let mut content = serde_json::Map::new();
        content.insert(TOKEN_KEY.to_string(), serde_json::Value::String(token.as_str().to_string()));
        if let Err(err) = serde_json::to_writer(file, &content) {
            log::warn!("Unable to serialize: {}", err);
        }
    }
}

/// The session file holds the password in a reversible form: only its owner may read it
fn create_private_file(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let file = options.open(path)?;
    #[cfg(unix)]
    {
        // `mode` only applies to new files
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(file)
}

fn private_dir_builder() -> DirBuilder {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Option<SessionToken> {
        lock_slot(self.slot()).clone()
    }

    fn set(&self, token: SessionToken) {
        let mut slot = lock_slot(self.slot());
        self.save_to_file(Some(&token));
        *slot = Some(token);
    }

    fn clear(&self) {
        let mut slot = lock_slot(self.slot());
        self.save_to_file(None);
        *slot = None;
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    /// A scratch folder, unique to each call
    fn scratch_folder() -> PathBuf {
        let folder = std::env::temp_dir().join(format!("exam-scheduler-session-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&folder).unwrap();
        folder
    }

    #[test]
    fn test_token_from_credentials() {
        let token = SessionToken::from_credentials("alice@example.com", "hunter22");
        assert_eq!(token.as_str(), "YWxpY2VAZXhhbXBsZS5jb206aHVudGVyMjI=");
        assert_eq!(token.authorization_value(), "Basic YWxpY2VAZXhhbXBsZS5jb206aHVudGVyMjI=");
    }

    #[test]
    fn test_token_is_not_printed() {
        let token = SessionToken::from_credentials("alice@example.com", "hunter22");
        assert!(format!("{:?}", token).contains("<36 bytes>"));
        assert!(format!("{:?}", token).contains("YWxp") == false);
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(store.is_authenticated() == false);

        store.set(SessionToken::from("abc".to_string()));
        assert!(store.is_authenticated());
        assert_eq!(store.get().unwrap().as_str(), "abc");

        store.clear();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_file_store_survives_reload() {
        let folder = scratch_folder();
        let path = folder.join("session.json");

        let store = FileSessionStore::new(&path);
        assert!(store.is_authenticated() == false);
        store.set(SessionToken::from("abc".to_string()));

        let content: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content[crate::config::TOKEN_KEY], "abc");
        assert_eq!(content.as_object().unwrap().len(), 1);

        let reloaded = FileSessionStore::new(&path);
        assert_eq!(reloaded.get(), Some(SessionToken::from("abc".to_string())));

        reloaded.clear();
        assert!(path.exists() == false);
        assert!(FileSessionStore::new(&path).is_authenticated() == false);

        std::fs::remove_dir_all(&folder).unwrap();
    }

    #[test]
    fn test_file_store_with_garbage_starts_logged_out() {
        let folder = scratch_folder();
        let path = folder.join("session.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = FileSessionStore::new(&path);
        assert_eq!(store.get(), None);

        std::fs::write(&path, r#"{"authToken": 12}"#).unwrap();
        assert_eq!(FileSessionStore::new(&path).get(), None);

        std::fs::remove_dir_all(&folder).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let folder = scratch_folder();
        let path = folder.join("nested").join("session.json");
        // A file left readable by an older version gets tightened too
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileSessionStore::new(&path);
        store.set(SessionToken::from_credentials("alice@example.com", "hunter22"));

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0, "session file mode is {:o}", mode & 0o777);

        let fresh = folder.join("fresh").join("session.json");
        FileSessionStore::new(&fresh).set(SessionToken::from("abc".to_string()));
        let file_mode = std::fs::metadata(&fresh).unwrap().permissions().mode();
        let dir_mode = std::fs::metadata(fresh.parent().unwrap()).unwrap().permissions().mode();
        assert_eq!(file_mode & 0o077, 0, "session file mode is {:o}", file_mode & 0o777);
        assert_eq!(dir_mode & 0o077, 0, "session folder mode is {:o}", dir_mode & 0o777);

        std::fs::remove_dir_all(&folder).unwrap();
    }
}
