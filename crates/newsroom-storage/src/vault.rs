//! Session record persistence.

use crate::{LocalStorage, StorageKeys, StorageResult};
use chrono::{DateTime, TimeZone, Utc};
use tracing::{debug, warn};

/// Session record as mirrored in durable storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    /// Identity token
    pub jwt: String,
    /// Absolute expiry in epoch milliseconds
    pub expires_in: i64,
    /// User email
    pub user: String,
    /// User avatar URL
    pub avatar: String,
}

impl StoredSession {
    /// Expiry as a timestamp. Out-of-range values collapse to the epoch.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.expires_in)
            .single()
            .unwrap_or_default()
    }

    /// True when the token is empty or `now` is at or past the expiry.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.jwt.is_empty() || now >= self.expires_at()
    }
}

/// Reads and writes the session record through a [`LocalStorage`] backend.
pub struct SessionVault {
    storage: Box<dyn LocalStorage>,
}

impl SessionVault {
    /// Create a vault over the given storage backend
    pub fn new(storage: Box<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// Persist the session record.
    pub fn save(
        &self,
        jwt: &str,
        expires_at: DateTime<Utc>,
        user: &str,
        avatar: &str,
    ) -> StorageResult<()> {
        self.storage.set(StorageKeys::JWT, jwt)?;
        self.storage
            .set(StorageKeys::EXPIRES_IN, &expires_at.timestamp_millis().to_string())?;
        self.storage.set(StorageKeys::USER, user)?;
        self.storage.set(StorageKeys::AVATAR, avatar)?;
        debug!(user, "Session record saved");
        Ok(())
    }

    /// Load the session record.
    ///
    /// Returns `None` when no token is stored. A record with a malformed
    /// expiry is returned with `expires_in = 0`, which reads as expired.
    pub fn load(&self) -> StorageResult<Option<StoredSession>> {
        let Some(jwt) = self.storage.get(StorageKeys::JWT)? else {
            return Ok(None);
        };

        let expires_in = match self.storage.get(StorageKeys::EXPIRES_IN)? {
            Some(raw) => raw.trim().parse::<i64>().unwrap_or_else(|_| {
                warn!(value = %raw, "Stored session expiry is not a number");
                0
            }),
            None => 0,
        };

        Ok(Some(StoredSession {
            jwt,
            expires_in,
            user: self.storage.get(StorageKeys::USER)?.unwrap_or_default(),
            avatar: self.storage.get(StorageKeys::AVATAR)?.unwrap_or_default(),
        }))
    }

    /// Remove every key of the session record.
    pub fn clear(&self) -> StorageResult<()> {
        for key in StorageKeys::SESSION_KEYS {
            self.storage.delete(key)?;
        }
        debug!("Session record cleared");
        Ok(())
    }

    /// True when a token is stored, expired or not.
    pub fn has_session(&self) -> StorageResult<bool> {
        self.storage.has(StorageKeys::JWT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;
    use chrono::Duration;
    use std::sync::Arc;

    fn vault() -> (SessionVault, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (SessionVault::new(Box::new(storage.clone())), storage)
    }

    #[test]
    fn test_save_and_load() {
        let (vault, _) = vault();
        let expires_at = Utc::now() + Duration::hours(1);

        vault
            .save("token", expires_at, "a@b.com", "https://avatar")
            .unwrap();

        let stored = vault.load().unwrap().unwrap();
        assert_eq!(stored.jwt, "token");
        assert_eq!(stored.user, "a@b.com");
        assert_eq!(stored.avatar, "https://avatar");
        assert_eq!(stored.expires_in, expires_at.timestamp_millis());
        assert!(!stored.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_load_without_token_is_none() {
        let (vault, storage) = vault();
        storage.set(StorageKeys::USER, "a@b.com").unwrap();
        assert!(vault.load().unwrap().is_none());
        assert!(!vault.has_session().unwrap());
    }

    #[test]
    fn test_clear_removes_every_key() {
        let (vault, storage) = vault();
        vault
            .save("token", Utc::now() + Duration::minutes(5), "a@b.com", "x")
            .unwrap();
        assert_eq!(storage.len(), 4);

        vault.clear().unwrap();
        assert!(storage.is_empty());
        assert!(vault.load().unwrap().is_none());
    }

    #[test]
    fn test_expired_and_malformed_records() {
        let (vault, storage) = vault();
        vault
            .save("token", Utc::now() - Duration::seconds(1), "a@b.com", "x")
            .unwrap();
        assert!(vault.load().unwrap().unwrap().is_expired_at(Utc::now()));

        storage.set(StorageKeys::EXPIRES_IN, "soon").unwrap();
        let stored = vault.load().unwrap().unwrap();
        assert_eq!(stored.expires_in, 0);
        assert!(stored.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_empty_token_reads_as_expired() {
        let stored = StoredSession {
            jwt: String::new(),
            expires_in: (Utc::now() + Duration::hours(1)).timestamp_millis(),
            user: "a@b.com".to_string(),
            avatar: String::new(),
        };
        assert!(stored.is_expired_at(Utc::now()));
    }
}
