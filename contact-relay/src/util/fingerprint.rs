//! Log-safe fingerprints for submitter data.

use sha2::{Digest, Sha256};

/// Short SHA-256 fingerprint of an email address.
///
/// Lets operators correlate log lines from the same submitter without
/// writing the address itself to the logs. Input is normalized first.
pub fn email_fingerprint(email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.trim().to_lowercase().as_bytes());
    let hash = hex::encode(hasher.finalize());
    hash[..16].to_string()
}
