use anyhow::{Context, Result};
use keyring::Entry;
use tracing::debug;

const APP_NAME: &str = "egtui";
const SMTP_PASSWORD_KEY: &str = "smtp_password";

/// Where the SMTP password is kept, outside the config file.
pub trait SecretStore: Send + Sync {
    fn load_password(&self) -> Result<Option<String>>;
    fn store_password(&self, password: &str) -> Result<()>;
    fn clear_password(&self) -> Result<()>;
}

pub struct RingStorage;

impl RingStorage {
    fn entry() -> Result<Entry> {
        Entry::new(APP_NAME, SMTP_PASSWORD_KEY).context("Failed to open keyring entry")
    }
}

impl SecretStore for RingStorage {
    fn load_password(&self) -> Result<Option<String>> {
        match Self::entry()?.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(anyhow::anyhow!("Keyring error: {}", e)),
        }
    }

    fn store_password(&self, password: &str) -> Result<()> {
        let entry = Self::entry()?;
        if password.is_empty() {
            return match entry.delete_password() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(anyhow::anyhow!("Keyring error: {}", e)),
            };
        }
        entry
            .set_password(password)
            .map_err(|e| anyhow::anyhow!("Keyring error: {}", e))?;
        debug!("Stored SMTP password in keyring");
        Ok(())
    }

    fn clear_password(&self) -> Result<()> {
        self.store_password("")
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryStore {
        pub password: Mutex<Option<String>>,
    }

    impl SecretStore for MemoryStore {
        fn load_password(&self) -> Result<Option<String>> {
            Ok(self.password.lock().unwrap().clone())
        }

        fn store_password(&self, password: &str) -> Result<()> {
            *self.password.lock().unwrap() = if password.is_empty() {
                None
            } else {
                Some(password.to_string())
            };
            Ok(())
        }

        fn clear_password(&self) -> Result<()> {
            self.store_password("")
        }
    }
}
