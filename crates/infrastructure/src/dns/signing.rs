use httpdns_application::ports::{RequestSigner, Signature};
use sha2::{Digest, Sha256};
use std::fmt::Write;
use std::time::Duration;

/// Signs as `hex(sha256("{subject}-{secret}-{timestamp}"))`, where the
/// timestamp is the expiry (`now + max_offset`) in unix seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Signer;

impl Sha256Signer {
    pub fn new() -> Self {
        Self
    }
}

impl RequestSigner for Sha256Signer {
    fn sign(&self, subject: &str, secret: &str, max_offset: Duration, now: u64) -> Signature {
        let timestamp = now.saturating_add(max_offset.as_secs());
        let digest = Sha256::digest(format!("{subject}-{secret}-{timestamp}").as_bytes());

        let mut signature = String::with_capacity(digest.len() * 2);
        for byte in digest {
            let _ = write!(signature, "{byte:02x}");
        }
        Signature {
            signature,
            timestamp,
        }
    }
}
