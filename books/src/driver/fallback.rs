// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Local persistence of books that could not be registered.

use crate::model::Book;
use bookstore_core::clocks::{Clock, unix_millis};
use bookstore_core::driver::{DriverError, DriverResult};
use bookstore_core::env::get_optional_var;
use log::{error, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Message returned to callers whose book was written to a fallback file.
pub(crate) const NOT_COMMITTED_MESSAGE: &str = "Numbers not accessible";

/// Configuration options for the fallback persister.
#[derive(Clone, Debug, PartialEq)]
pub struct FallbackOptions {
    /// Directory in which to write the fallback files.
    pub dir: PathBuf,
}

impl Default for FallbackOptions {
    fn default() -> Self {
        Self { dir: PathBuf::from(".") }
    }
}

impl FallbackOptions {
    /// Creates a set of options from environment variables whose name is prefixed with the given
    /// `prefix`.
    ///
    /// This will use variables such as `<prefix>_FALLBACK_DIR`, which defaults to the current
    /// directory.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        match get_optional_var::<String>(prefix, "FALLBACK_DIR")? {
            Some(dir) => Ok(Self { dir: PathBuf::from(dir) }),
            None => Ok(Self::default()),
        }
    }
}

/// Writes books to individual JSON files named after the time they were written.
pub(crate) struct FallbackPersister {
    /// Directory in which to write the files.
    dir: PathBuf,

    /// Clock used to name the files.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Last millisecond stamp handed out, to keep file names unique within the process.
    last_millis: Mutex<i128>,
}

impl FallbackPersister {
    /// Creates a new persister configured by `opts`.
    pub(crate) fn new(opts: FallbackOptions, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { dir: opts.dir, clock, last_millis: Mutex::new(i128::MIN) }
    }

    /// Reserves a millisecond stamp that is at least `min` and that has not been used before.
    fn next_millis(&self, min: i128) -> i128 {
        let mut last = self.last_millis.lock().expect("Fallback stamp poisoned");
        let millis = if min > *last { min } else { *last + 1 };
        *last = millis;
        millis
    }

    /// Computes the path of the fallback file for the given stamp.
    fn path_for(dir: &Path, millis: i128) -> PathBuf {
        dir.join(format!("book-{}.json", millis))
    }

    /// Writes `book` to a new file and returns its path.
    ///
    /// Files are never overwritten: if the file for a stamp already exists, for example because it
    /// was left behind by a previous instance of the service, the next stamp is tried.
    pub(crate) async fn write(&self, book: &Book) -> io::Result<PathBuf> {
        let content = serde_json::to_vec_pretty(book)?;

        let mut millis = self.next_millis(unix_millis(self.clock.now_utc()));
        loop {
            let path = Self::path_for(&self.dir, millis);
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    file.write_all(&content).await?;
                    file.flush().await?;
                    return Ok(path);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    millis = self.next_millis(millis + 1);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Saves `book` locally after a failure to register it, and reports that the book was not
    /// committed.
    ///
    /// This always returns an error: a timeout if the book was saved, or an illegal state error if
    /// it could not be saved.
    pub(crate) async fn persist_degraded<T>(&self, book: &Book) -> DriverResult<T> {
        match self.write(book).await {
            Ok(path) => {
                warn!("Book {} saved to {} for later registration", book.title(), path.display());
                Err(DriverError::Timeout(NOT_COMMITTED_MESSAGE.to_owned()))
            }
            Err(e) => {
                error!("Cannot save book {} to {}: {}", book.title(), self.dir.display(), e);
                Err(DriverError::IllegalState(format!("Cannot save book locally: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookstore_core::clocks::testutils::SettableClock;
    use std::fs;
    use std::time::Duration;
    use time::macros::datetime;

    /// Millisecond timestamp of the initial time of the test clock.
    const START_MILLIS: i128 = 1_714_550_400_000;

    fn setup(dir: &Path) -> (Arc<SettableClock>, FallbackPersister) {
        let clock = Arc::from(SettableClock::new(datetime!(2024-05-01 08:00:00 UTC)));
        let persister =
            FallbackPersister::new(FallbackOptions { dir: dir.to_owned() }, clock.clone());
        (clock, persister)
    }

    fn read_book(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_write_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let (_clock, persister) = setup(dir.path());

        let book = Book::new("Animal's farm").unwrap().with_author("George Orwell");
        let path = persister.write(&book).await.unwrap();

        assert_eq!(dir.path().join(format!("book-{}.json", START_MILLIS)), path);
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"title\": \"Animal's farm\""), "Not pretty: {}", raw);
        let json = read_book(&path);
        assert_eq!("Animal's farm", json["title"]);
        assert_eq!("George Orwell", json["author"]);
        assert!(json["isbn10"].is_null());
        assert!(json["isbn13"].is_null());
    }

    #[tokio::test]
    async fn test_write_same_millisecond_does_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let (_clock, persister) = setup(dir.path());

        let path1 = persister.write(&Book::new("First").unwrap()).await.unwrap();
        let path2 = persister.write(&Book::new("Second").unwrap()).await.unwrap();

        assert_eq!(dir.path().join(format!("book-{}.json", START_MILLIS)), path1);
        assert_eq!(dir.path().join(format!("book-{}.json", START_MILLIS + 1)), path2);
        assert_eq!("First", read_book(&path1)["title"]);
        assert_eq!("Second", read_book(&path2)["title"]);
    }

    #[tokio::test]
    async fn test_write_skips_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let (_clock, persister) = setup(dir.path());

        let existing = dir.path().join(format!("book-{}.json", START_MILLIS));
        fs::write(&existing, "old content").unwrap();

        let path = persister.write(&Book::new("New").unwrap()).await.unwrap();
        assert_eq!(dir.path().join(format!("book-{}.json", START_MILLIS + 1)), path);
        assert_eq!("old content", fs::read_to_string(&existing).unwrap());
    }

    #[tokio::test]
    async fn test_write_follows_clock() {
        let dir = tempfile::tempdir().unwrap();
        let (clock, persister) = setup(dir.path());

        persister.write(&Book::new("First").unwrap()).await.unwrap();
        clock.advance(Duration::from_secs(1));
        let path = persister.write(&Book::new("Second").unwrap()).await.unwrap();
        assert_eq!(dir.path().join(format!("book-{}.json", START_MILLIS + 1000)), path);
    }

    #[tokio::test]
    async fn test_persist_degraded_returns_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let (_clock, persister) = setup(dir.path());

        assert_eq!(
            DriverError::Timeout("Numbers not accessible".to_owned()),
            persister.persist_degraded::<()>(&Book::new("T").unwrap()).await.unwrap_err()
        );
        assert_eq!(1, fs::read_dir(dir.path()).unwrap().count());
    }

    #[tokio::test]
    async fn test_persist_degraded_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let (_clock, persister) = setup(&dir.path().join("missing"));

        match persister.persist_degraded::<()>(&Book::new("T").unwrap()).await.unwrap_err() {
            DriverError::IllegalState(msg) => assert!(msg.starts_with("Cannot save book locally")),
            e => panic!("Unexpected error: {:?}", e),
        }
    }

    #[test]
    fn test_options_from_env() {
        temp_env::with_var("BOOKS_FALLBACK_DIR", Some("/var/spool/books"), || {
            let opts = FallbackOptions::from_env("BOOKS").unwrap();
            assert_eq!(PathBuf::from("/var/spool/books"), opts.dir);
        });
        temp_env::with_var_unset("BOOKS_FALLBACK_DIR", || {
            assert_eq!(FallbackOptions::default(), FallbackOptions::from_env("BOOKS").unwrap());
        });
    }
}
