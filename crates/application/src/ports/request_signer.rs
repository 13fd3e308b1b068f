use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub signature: String,
    /// Unix seconds after which the server rejects the signature.
    pub timestamp: u64,
}

/// Request signing port.
pub trait RequestSigner: Send + Sync {
    /// Sign `subject` with `secret`, valid until `now + max_offset`.
    fn sign(&self, subject: &str, secret: &str, max_offset: Duration, now: u64) -> Signature;
}
