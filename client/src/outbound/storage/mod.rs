//! File-backed session storage.
//!
//! The session lives in one JSON document, `session.json`, inside the
//! configured state directory. Writes go through a temp file and a rename so
//! the token and the identity are always persisted together.

mod atomic_io;

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::debug;

use crate::domain::Session;
use crate::domain::ports::{SessionStorage, SessionStorageError};

use self::atomic_io::{remove_if_present, write_atomic};

/// Name of the session document inside the state directory.
pub const SESSION_FILE_NAME: &str = "session.json";

/// Session storage rooted at a state directory.
#[derive(Debug)]
pub struct FileSessionStorage {
    dir: Dir,
    root: Utf8PathBuf,
}

impl FileSessionStorage {
    /// Open (creating if needed) the state directory at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStorageError::Io`] when the directory cannot be
    /// created or opened.
    pub fn open(root: &Utf8Path) -> Result<Self, SessionStorageError> {
        Dir::create_ambient_dir_all(root, ambient_authority())
            .and_then(|()| Dir::open_ambient_dir(root, ambient_authority()))
            .map(|dir| Self {
                dir,
                root: root.to_path_buf(),
            })
            .map_err(|err| io_error(root, &err))
    }

    /// Path of the session document.
    #[must_use]
    pub fn file_path(&self) -> Utf8PathBuf {
        self.root.join(SESSION_FILE_NAME)
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<Session>, SessionStorageError> {
        let text = match self.dir.read_to_string(SESSION_FILE_NAME) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_error(&self.file_path(), &err)),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|err| SessionStorageError::corrupt(format!("{}: {err}", self.file_path())))
    }

    fn save(&self, session: &Session) -> Result<(), SessionStorageError> {
        let text = serde_json::to_string(session)
            .map_err(|err| SessionStorageError::io(format!("encode session: {err}")))?;
        write_atomic(&self.dir, SESSION_FILE_NAME, &text)
            .map_err(|err| io_error(&self.file_path(), &err))?;
        debug!(path = %self.file_path(), "session persisted");
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStorageError> {
        remove_if_present(&self.dir, SESSION_FILE_NAME)
            .map_err(|err| io_error(&self.file_path(), &err))?;
        debug!(path = %self.file_path(), "session removed");
        Ok(())
    }
}

fn io_error(path: &Utf8Path, err: &io::Error) -> SessionStorageError {
    SessionStorageError::io(format!("{path}: {err}"))
}

#[cfg(test)]
mod tests {
    //! Storage behaviour against a real temporary directory.
    use super::*;
    use crate::domain::{AuthToken, Identity, Role};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    struct StateDir {
        _guard: TempDir,
        root: Utf8PathBuf,
    }

    #[fixture]
    fn state_dir() -> StateDir {
        let guard = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(guard.path().join("state")).expect("utf-8 path");
        StateDir {
            _guard: guard,
            root,
        }
    }

    fn session() -> Session {
        Session::new(
            AuthToken::new("t1").expect("token"),
            Identity::try_new("u1", "Ada", "ada@example.com", Role::Admin).expect("identity"),
        )
    }

    fn write_raw(root: &Utf8Path, contents: &str) {
        let dir = Dir::open_ambient_dir(root, ambient_authority()).expect("open dir");
        dir.write(SESSION_FILE_NAME, contents).expect("write raw");
    }

    #[rstest]
    fn empty_directory_loads_nothing(state_dir: StateDir) {
        let storage = FileSessionStorage::open(&state_dir.root).expect("open");
        assert_eq!(storage.load().expect("load"), None);
    }

    #[rstest]
    fn saved_session_survives_reopen(state_dir: StateDir) {
        FileSessionStorage::open(&state_dir.root)
            .expect("open")
            .save(&session())
            .expect("save");

        let reopened = FileSessionStorage::open(&state_dir.root).expect("reopen");

        assert_eq!(reopened.load().expect("load"), Some(session()));
    }

    #[rstest]
    fn save_leaves_no_temp_files(state_dir: StateDir) {
        let storage = FileSessionStorage::open(&state_dir.root).expect("open");
        storage.save(&session()).expect("first save");
        storage.save(&session()).expect("second save");

        let dir = Dir::open_ambient_dir(&state_dir.root, ambient_authority()).expect("open dir");
        let names: Vec<String> = dir
            .entries()
            .expect("entries")
            .map(|entry| {
                entry
                    .expect("entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        assert_eq!(names, vec![SESSION_FILE_NAME.to_owned()]);
    }

    #[rstest]
    #[case::token_only(r#"{"token":"t1"}"#)]
    #[case::user_only(r#"{"user":{"_id":"u1","name":"Ada","email":"a@b.c","role":"user"}}"#)]
    #[case::garbage("not json")]
    fn partial_or_garbled_records_are_corrupt(state_dir: StateDir, #[case] contents: &str) {
        let storage = FileSessionStorage::open(&state_dir.root).expect("open");
        write_raw(&state_dir.root, contents);

        let err = storage.load().expect_err("corrupt");

        assert!(matches!(err, SessionStorageError::Corrupt { .. }));
    }

    #[rstest]
    fn clear_is_idempotent(state_dir: StateDir) {
        let storage = FileSessionStorage::open(&state_dir.root).expect("open");
        storage.save(&session()).expect("save");

        storage.clear().expect("first clear");
        storage.clear().expect("second clear");

        assert_eq!(storage.load().expect("load"), None);
    }
}
