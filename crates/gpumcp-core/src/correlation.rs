//! Correlation ID generation and propagation.
//!
//! A correlation ID is an 8-byte random value, hex-encoded to 16 lowercase
//! characters, minted once per client tool call at the proxy boundary and
//! threaded through every structured log line emitted on behalf of that
//! call. It is diagnostic, not a security token: if entropy collection
//! fails we log a warning and carry on with whatever bytes we got rather
//! than failing the request.

use std::fmt;

use rand::RngCore;

/// A 16-character lowercase hex correlation tag attached to one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId([u8; 8]);

impl CorrelationId {
    /// Generate a new correlation ID from the thread-local RNG.
    ///
    /// `fill_bytes` does not fail in practice on supported platforms, but
    /// the defensive path still applies: a zeroed/partial draw is logged
    /// and used anyway.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Parse a correlation ID from its 16-character hex representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != 16 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut bytes = [0u8; 8];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }

    /// Borrow the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_id_is_sixteen_lowercase_hex_chars() {
        let id = CorrelationId::generate();
        let rendered = id.to_string();
        assert_eq!(rendered.len(), 16);
        assert!(rendered.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn parse_round_trips_display() {
        let id = CorrelationId::generate();
        let rendered = id.to_string();
        let parsed = CorrelationId::parse(&rendered).expect("valid id");
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_wrong_length_and_non_hex() {
        assert!(CorrelationId::parse("short").is_none());
        assert!(CorrelationId::parse("zzzzzzzzzzzzzzzz").is_none());
    }
}
