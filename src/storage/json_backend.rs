use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    domain::{TenantBook, TenantId, CURRENT_SCHEMA_VERSION},
    errors::{LedgerError, Result},
    utils::paths::{ensure_dir, write_atomic, PathResolver},
};

use super::{PreferenceRecord, StorageBackend};

const BOOK_EXTENSION: &str = "json";

/// One pretty-printed JSON document per tenant under `<root>/tenants/`.
#[derive(Clone)]
pub struct JsonStorage {
    root: PathBuf,
    tenants_dir: PathBuf,
    preferences_file: PathBuf,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>) -> Result<Self> {
        let app_root = PathResolver::resolve_base(root);
        ensure_dir(&app_root)?;
        let tenants_dir = PathResolver::tenants_dir_in(&app_root);
        ensure_dir(&tenants_dir)?;
        Ok(Self {
            preferences_file: PathResolver::preferences_file_in(&app_root),
            root: app_root,
            tenants_dir,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn book_path(&self, tenant: TenantId) -> PathBuf {
        self.tenants_dir
            .join(format!("{}.{}", tenant, BOOK_EXTENSION))
    }
}

impl StorageBackend for JsonStorage {
    fn load(&self, tenant: TenantId) -> Result<Option<TenantBook>> {
        let path = self.book_path(tenant);
        if !path.exists() {
            return Ok(None);
        }
        let book = load_book_from_path(&path)?;
        if book.tenant != tenant {
            return Err(LedgerError::StoreUnavailable(format!(
                "{} holds tenant {} instead of {}",
                path.display(),
                book.tenant,
                tenant
            )));
        }
        for warning in book.orphan_warnings() {
            tracing::warn!(%tenant, "{}", warning);
        }
        Ok(Some(book))
    }

    fn save(&self, book: &TenantBook) -> Result<()> {
        let json = serde_json::to_string_pretty(book)?;
        write_atomic(&self.book_path(book.tenant), &json)
    }

    fn tenants(&self) -> Result<Vec<TenantId>> {
        if !self.tenants_dir.exists() {
            return Ok(Vec::new());
        }
        let mut tenants = Vec::new();
        for entry in fs::read_dir(&self.tenants_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BOOK_EXTENSION) {
                continue;
            }
            let parsed = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<i64>().ok());
            match parsed {
                Some(id) => tenants.push(TenantId(id)),
                None => tracing::debug!(path = %path.display(), "skipping foreign file"),
            }
        }
        tenants.sort();
        Ok(tenants)
    }

    fn load_preferences(&self) -> Result<Vec<PreferenceRecord>> {
        if !self.preferences_file.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.preferences_file)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn save_preferences(&self, records: &[PreferenceRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        write_atomic(&self.preferences_file, &json)
    }
}

pub fn load_book_from_path(path: &Path) -> Result<TenantBook> {
    let data = fs::read_to_string(path)?;
    let book: TenantBook = serde_json::from_str(&data)?;
    if book.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(LedgerError::StoreUnavailable(format!(
            "{} uses schema v{}, newer than supported v{}",
            path.display(),
            book.schema_version,
            CURRENT_SCHEMA_VERSION
        )));
    }
    Ok(book)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OwnerId;
    use chrono::Utc;
    use tempfile::TempDir;

    fn storage_with_temp_dir() -> (JsonStorage, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let storage = JsonStorage::new(Some(temp.path().to_path_buf())).expect("json storage");
        (storage, temp)
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (storage, _guard) = storage_with_temp_dir();
        let mut book = TenantBook::new(TenantId(-1001), Utc::now());
        book.add_contact(OwnerId(3), "Amine Khoudor", Some("+213123456789".into()), Utc::now());
        storage.save(&book).expect("save book");

        let loaded = storage.load(TenantId(-1001)).expect("load").expect("present");
        assert_eq!(loaded.contacts.len(), 1);
        assert_eq!(loaded.contacts[0].phone.as_deref(), Some("+213123456789"));
        assert_eq!(storage.tenants().unwrap(), vec![TenantId(-1001)]);
    }

    #[test]
    fn unknown_tenant_loads_as_none() {
        let (storage, _guard) = storage_with_temp_dir();
        assert!(storage.load(TenantId(77)).unwrap().is_none());
    }

    #[test]
    fn foreign_files_are_ignored() {
        let (storage, guard) = storage_with_temp_dir();
        fs::write(guard.path().join("tenants").join("notes.json"), "{}").unwrap();
        fs::write(guard.path().join("tenants").join("12.json.tmp"), "{}").unwrap();
        assert!(storage.tenants().unwrap().is_empty());
    }

    #[test]
    fn rejects_future_schema_versions() {
        let (storage, _guard) = storage_with_temp_dir();
        let mut book = TenantBook::new(TenantId(4), Utc::now());
        book.schema_version = CURRENT_SCHEMA_VERSION + 3;
        fs::write(
            storage.book_path(TenantId(4)),
            serde_json::to_string(&book).unwrap(),
        )
        .unwrap();

        let err = storage.load(TenantId(4)).expect_err("future schema");
        match err {
            LedgerError::StoreUnavailable(message) => {
                assert!(message.contains("newer"), "unexpected error: {message}");
            }
            other => panic!("expected store error, got {other:?}"),
        }
    }

    #[test]
    fn preferences_roundtrip() {
        let (storage, _guard) = storage_with_temp_dir();
        assert!(storage.load_preferences().unwrap().is_empty());
        let records = vec![PreferenceRecord {
            owner: OwnerId(8),
            language: "fr".into(),
        }];
        storage.save_preferences(&records).unwrap();
        assert_eq!(storage.load_preferences().unwrap(), records);
    }
}
