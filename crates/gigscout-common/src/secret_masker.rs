// Thread-safe store of secret values (the Telegram bot token) that are
// replaced with `***` in every log line.

use parking_lot::RwLock;
use std::sync::Arc;

/// Replacement text used when a secret is found.
const MASK: &str = "***";

/// Secrets shorter than this are not registered; masking them would mangle
/// ordinary words in log output.
const MIN_SECRET_LENGTH: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct SecretMasker {
    inner: Arc<RwLock<Vec<String>>>,
}

impl SecretMasker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new secret value. Blank and very short values are ignored.
    pub fn add_value(&self, secret: &str) {
        let trimmed = secret.trim();
        if trimmed.chars().count() < MIN_SECRET_LENGTH {
            return;
        }

        let mut secrets = self.inner.write();
        if !secrets.iter().any(|s| s == trimmed) {
            secrets.push(trimmed.to_string());
            // Longer secrets first so a secret containing another is masked whole
            secrets.sort_by(|a, b| b.len().cmp(&a.len()));
        }
    }

    /// Replace all registered secret values in `input` with `***`.
    pub fn mask_secrets(&self, input: &str) -> String {
        let secrets = self.inner.read();
        let mut result = input.to_string();
        for secret in secrets.iter() {
            if result.contains(secret.as_str()) {
                result = result.replace(secret.as_str(), MASK);
            }
        }
        result
    }

    pub fn secret_count(&self) -> usize {
        self.inner.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_bot_token_in_url() {
        let masker = SecretMasker::new();
        masker.add_value("123456:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw");
        assert_eq!(
            masker.mask_secrets(
                "error sending request for url (https://api.telegram.org/bot123456:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw/sendMessage)"
            ),
            "error sending request for url (https://api.telegram.org/bot***/sendMessage)"
        );
    }

    #[test]
    fn longer_secret_masked_first() {
        let masker = SecretMasker::new();
        masker.add_value("pass");
        masker.add_value("password");
        assert_eq!(masker.mask_secrets("my password is here"), "my *** is here");
    }

    #[test]
    fn short_and_blank_values_ignored() {
        let masker = SecretMasker::new();
        masker.add_value("");
        masker.add_value("   ");
        masker.add_value("ab");
        assert_eq!(masker.secret_count(), 0);
        assert_eq!(masker.mask_secrets("ab cd"), "ab cd");
    }

    #[test]
    fn duplicates_registered_once() {
        let masker = SecretMasker::new();
        masker.add_value("session-cookie");
        masker.add_value(" session-cookie ");
        assert_eq!(masker.secret_count(), 1);
    }
}
