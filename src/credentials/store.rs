//! Secret store lookups for `--service_name`
//!
//! The system keyring is only compiled in with the `keyring` feature. Without
//! it, a lookup fails with [`CredentialError::SecretStoreUnavailable`]; the
//! failure surfaces when candidates are materialized, not at startup.

use super::CredentialError;

/// Password lookup by `(service, username)`
pub trait SecretStore {
    /// `Ok(None)` when the store has no entry for this pair.
    fn get_password(&self, service: &str, username: &str) -> Result<Option<String>, CredentialError>;
}

/// The operating system's keyring (Keychain, Credential Manager, Secret Service)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemKeyring;

#[cfg(feature = "keyring")]
impl SecretStore for SystemKeyring {
    fn get_password(&self, service: &str, username: &str) -> Result<Option<String>, CredentialError> {
        let entry = keyring::Entry::new(service, username).map_err(|e| lookup_error(service, e))?;
        read_entry(&entry, service)
    }
}

#[cfg(feature = "keyring")]
fn lookup_error(service: &str, e: keyring::Error) -> CredentialError {
    CredentialError::SecretStore {
        service: service.to_string(),
        message: e.to_string(),
    }
}

/// A missing entry is not an error; the caller reports the blank password.
#[cfg(feature = "keyring")]
fn read_entry(entry: &keyring::Entry, service: &str) -> Result<Option<String>, CredentialError> {
    match entry.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(lookup_error(service, e)),
    }
}

#[cfg(not(feature = "keyring"))]
impl SecretStore for SystemKeyring {
    fn get_password(&self, _service: &str, _username: &str) -> Result<Option<String>, CredentialError> {
        Err(CredentialError::SecretStoreUnavailable)
    }
}

/// Store used by [`super::CredentialResolver::from_flags`]
pub fn default_secret_store() -> Box<dyn SecretStore> {
    Box::new(SystemKeyring)
}

#[cfg(all(test, not(feature = "keyring")))]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_without_keyring_feature() {
        assert_eq!(
            SystemKeyring.get_password("system", "USER"),
            Err(CredentialError::SecretStoreUnavailable)
        );
    }
}

#[cfg(all(test, feature = "keyring"))]
mod keyring_tests {
    use super::*;
    use crate::credentials::{CredentialSource, Environment};
    use keyring::mock::MockCredential;

    fn use_mock_keyring() {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
    }

    #[test]
    fn test_stored_password_is_returned() {
        use_mock_keyring();
        let entry = keyring::Entry::new("bitbucket", "USER").unwrap();
        entry.set_password("PASS").unwrap();

        assert_eq!(read_entry(&entry, "bitbucket"), Ok(Some("PASS".to_string())));
    }

    #[test]
    fn test_missing_entry_is_none() {
        use_mock_keyring();
        assert_eq!(SystemKeyring.get_password("bitbucket", "USER"), Ok(None));
    }

    #[test]
    fn test_missing_entry_means_no_password() {
        use_mock_keyring();
        let source = CredentialSource::Keyring {
            user: "USER".into(),
            service_name: "bitbucket".into(),
        };
        let env: Environment = [("HOME", "/tmp")].into_iter().collect();

        assert_eq!(
            source.materialize(&env, &SystemKeyring),
            Err(CredentialError::MissingPassword)
        );
    }

    #[test]
    fn test_backend_error_names_the_service() {
        use_mock_keyring();
        let entry = keyring::Entry::new("bitbucket", "USER").unwrap();
        let mock: &MockCredential = entry.get_credential().downcast_ref().unwrap();
        mock.set_error(keyring::Error::Invalid("attribute".to_string(), "locked".to_string()));

        let err = read_entry(&entry, "bitbucket").unwrap_err();
        assert!(matches!(
            &err,
            CredentialError::SecretStore { service, .. } if service == "bitbucket"
        ));
        assert!(err.to_string().contains("bitbucket"));
    }
}
