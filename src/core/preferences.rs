use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::{
    config::Config,
    domain::OwnerId,
    errors::{LedgerError, Result},
    storage::{PreferenceRecord, StorageBackend},
};

/// Per-user language choice, read by the dialog engine and the scheduler.
pub struct UserPreferences {
    backend: Arc<dyn StorageBackend>,
    default_language: String,
    languages: Vec<String>,
    cache: RwLock<HashMap<OwnerId, String>>,
}

impl UserPreferences {
    pub fn load(backend: Arc<dyn StorageBackend>, config: &Config) -> Result<Self> {
        let cache = backend
            .load_preferences()?
            .into_iter()
            .map(|record| (record.owner, record.language))
            .collect();
        Ok(Self {
            backend,
            default_language: config.default_language.clone(),
            languages: config.languages.clone(),
            cache: RwLock::new(cache),
        })
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// The owner's language, or the configured default.
    pub fn language(&self, owner: OwnerId) -> String {
        self.cache
            .read()
            .ok()
            .and_then(|cache| cache.get(&owner).cloned())
            .unwrap_or_else(|| self.default_language.clone())
    }

    pub fn set_language(&self, owner: OwnerId, language: &str) -> Result<()> {
        if !self.languages.iter().any(|offered| offered == language) {
            return Err(LedgerError::InvalidInput(format!(
                "language `{}` is not offered",
                language
            )));
        }
        let mut cache = self
            .cache
            .write()
            .map_err(|_| LedgerError::StoreUnavailable("preferences lock poisoned".into()))?;
        let previous = cache.insert(owner, language.to_string());
        let mut records: Vec<PreferenceRecord> = cache
            .iter()
            .map(|(owner, language)| PreferenceRecord {
                owner: *owner,
                language: language.clone(),
            })
            .collect();
        records.sort_by_key(|record| record.owner);
        if let Err(err) = self.backend.save_preferences(&records) {
            match previous {
                Some(language) => cache.insert(owner, language),
                None => cache.remove(&owner),
            };
            return Err(err);
        }
        tracing::info!(%owner, language, "language updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn defaults_until_set_and_survives_reload() {
        let backend = Arc::new(MemoryStorage::new());
        let prefs = UserPreferences::load(backend.clone(), &Config::default()).unwrap();
        assert_eq!(prefs.language(OwnerId(1)), "en");

        prefs.set_language(OwnerId(1), "fr").unwrap();
        assert_eq!(prefs.language(OwnerId(1)), "fr");

        let reloaded = UserPreferences::load(backend, &Config::default()).unwrap();
        assert_eq!(reloaded.language(OwnerId(1)), "fr");
        assert_eq!(reloaded.language(OwnerId(2)), "en");
    }

    #[test]
    fn unknown_language_is_rejected() {
        let prefs =
            UserPreferences::load(Arc::new(MemoryStorage::new()), &Config::default()).unwrap();
        let err = prefs.set_language(OwnerId(1), "xx").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
    }

    #[test]
    fn failed_save_keeps_previous_choice() {
        let backend = Arc::new(MemoryStorage::new());
        let prefs = UserPreferences::load(backend.clone(), &Config::default()).unwrap();
        prefs.set_language(OwnerId(1), "ar").unwrap();
        backend.set_unavailable(true);
        assert!(prefs.set_language(OwnerId(1), "fr").is_err());
        assert_eq!(prefs.language(OwnerId(1)), "ar");
    }
}
