use std::{fs, io, path::{Path, PathBuf}};

use tracing::debug;

use crate::{
    Cacheable, CacheConfig, Error, Result,
    cache::{Payload, format::{self, ENTRY_EXTENSION}},
    common,
};

/// Key → payload store on the filesystem, one file per key.
///
/// Entries are authoritative once written: nothing is invalidated by content or age.
/// Writers are not coordinated; concurrent stores of one key end with the last rename.
#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
    compress: bool,
}

impl Cache {
    /// A cache rooted at `dir` with default settings. Nothing is created until first store.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_config(CacheConfig { dir: dir.into(), ..CacheConfig::default() })
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self { dir: config.dir, compress: config.compress }
    }

    /// Base directory of the cache.
    #[inline] pub fn dir(&self) -> &Path { &self.dir }

    /// File that holds (or would hold) the entry for `key`.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{ENTRY_EXTENSION}", common::safe_stem(key)))
    }

    /// Create the base directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        common::ensure_dir_exists(&self.dir)
    }

    /// Persist `payload` under `key`, replacing any previous entry.
    ///
    /// The entry is written to a temporary file and renamed into place, so a failed
    /// store never leaves a partial entry behind.
    pub fn store(&self, key: &str, payload: &Payload) -> Result<()> {
        self.ensure_dir()?;
        let path = self.entry_path(key);

        let bytes = format::encode_entry(key, payload, self.compress)
            .map_err(|e| Error::io(&path, e))?;
        common::write_atomic(&path, &bytes)?;

        debug!(target: "popmap::cache", key, kind = %payload.kind(), path = %path.display(), bytes = bytes.len(), "stored entry");
        Ok(())
    }

    /// Fetch the payload stored under `key`.
    ///
    /// A missing entry is `Ok(None)`. An entry that exists but cannot be decoded is
    /// [`Error::Corrupt`], never a miss.
    pub fn load(&self, key: &str) -> Result<Option<Payload>> {
        let path = self.entry_path(key);
        let Some(bytes) = common::read_if_exists(&path)? else {
            debug!(target: "popmap::cache", key, path = %path.display(), "miss");
            return Ok(None);
        };

        let corrupt = |reason: String| Error::Corrupt { key: key.to_string(), path: path.clone(), reason };
        let entry = format::decode_entry(&bytes).map_err(corrupt)?;
        if entry.key != key {
            return Err(corrupt(format!("entry was written for key {:?}", entry.key)));
        }

        debug!(target: "popmap::cache", key, kind = %entry.payload.kind(), "hit");
        Ok(Some(entry.payload))
    }

    /// Check whether an entry file exists for `key`, without decoding it.
    pub fn contains(&self, key: &str) -> bool {
        self.entry_path(key).is_file()
    }

    /// Delete the entry for `key`. Returns whether there was one.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::io(path, e)),
        }
    }

    /// Persist the cacheable view of `value` under `key`.
    pub fn store_value<T: Cacheable>(&self, key: &str, value: &T) -> Result<()> {
        self.store(key, &value.to_payload()?)
    }

    /// Fetch the view stored under `key`, checking that it has the kind `T` persists.
    pub fn load_view<T: Cacheable>(&self, key: &str) -> Result<Option<T::View>> {
        let Some(payload) = self.load(key)? else { return Ok(None) };

        let found = payload.kind();
        match T::view_from_payload(payload) {
            Some(view) => view.map(Some).map_err(|e| Error::Corrupt {
                key: key.to_string(),
                path: self.entry_path(key),
                reason: e.to_string(),
            }),
            None => Err(Error::SchemaMismatch { key: key.to_string(), expected: T::KIND, found }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::{Assignment, Cache, CacheConfig, Error, GroupAssignment, Payload, PayloadKind};

    fn groups() -> GroupAssignment {
        [("1", "A"), ("2", "A"), ("3", "B")].into_iter().collect()
    }

    #[test]
    fn missing_key_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        assert!(cache.load("missing_key").unwrap().is_none());

        let nested = Cache::new(dir.path().join("not/created/yet"));
        assert!(nested.load("missing_key").unwrap().is_none());
        assert!(!nested.dir().exists());
    }

    #[test]
    fn store_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        for compress in [true, false] {
            let cache = Cache::with_config(CacheConfig { dir: dir.path().join(compress.to_string()), compress });
            let payload = Payload::Groups(groups());

            cache.store("oregon/senate plan", &payload).unwrap();
            assert!(cache.contains("oregon/senate plan"));
            assert_eq!(cache.load("oregon/senate plan").unwrap(), Some(payload));
        }
    }

    #[test]
    fn store_overwrites_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());

        cache.store("k", &Payload::Groups(groups())).unwrap();
        let assignment = Assignment::new(vec![Some(0)], 1).unwrap();
        cache.store("k", &Payload::Assignment(assignment.clone())).unwrap();

        assert_eq!(cache.load("k").unwrap(), Some(Payload::Assignment(assignment)));
        let files = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 1);
    }

    #[test]
    fn corrupt_entry_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        fs::write(cache.entry_path("blocks"), b"garbage").unwrap();

        let err = cache.load("blocks").unwrap_err();
        assert!(matches!(&err, Error::Corrupt { key, .. } if key == "blocks"), "{err}");
        assert!(err.to_string().contains("blocks"));
    }

    #[test]
    fn entry_for_other_key_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        cache.store("a", &Payload::Groups(groups())).unwrap();
        fs::copy(cache.entry_path("a"), cache.entry_path("b")).unwrap();

        assert!(matches!(cache.load("b"), Err(Error::Corrupt { .. })));
    }

    #[test]
    fn wrong_kind_is_a_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        cache.store("k", &Payload::Groups(groups())).unwrap();

        let err = cache.load_view::<Assignment>("k").unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch {
            expected: PayloadKind::Assignment,
            found: PayloadKind::Groups,
            ..
        }));
    }

    #[test]
    fn out_of_range_assignment_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::with_config(CacheConfig { dir: dir.path().to_path_buf(), compress: false });
        cache.store_value("blocks_to_precincts", &Assignment::new(vec![Some(0)], 1).unwrap()).unwrap();

        let path = cache.entry_path("blocks_to_precincts");
        let body = fs::read(&path).unwrap();
        let tampered = String::from_utf8_lossy(&body).replace(r#""targets":[0]"#, r#""targets":[7]"#);
        assert_ne!(tampered.as_bytes(), &body[..]);
        fs::write(&path, tampered).unwrap();

        let err = cache.load_view::<Assignment>("blocks_to_precincts").unwrap_err();
        assert!(matches!(&err, Error::Corrupt { key, .. } if key == "blocks_to_precincts"), "{err}");
    }

    #[test]
    fn remove_deletes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(dir.path());
        cache.store("k", &Payload::Groups(groups())).unwrap();

        assert!(cache.remove("k").unwrap());
        assert!(!cache.remove("k").unwrap());
        assert!(cache.load("k").unwrap().is_none());
    }

    #[test]
    fn unwritable_location_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"").unwrap();

        let cache = Cache::new(&blocker);
        assert!(matches!(cache.store("k", &Payload::Groups(groups())), Err(Error::Io { .. })));
    }
}
