/// Media type used in the downloadable data URI of a sealed identity.
pub const STORAGE_MEDIA_TYPE: &str = "application/pgp-encrypted";

/// An armored ciphertext produced by sealing identity secrets or a message.
///
/// The contents are opaque to the core layer; only the engine knows
/// how to parse them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope(String);

impl Envelope {
    pub fn new(armored: impl Into<String>) -> Self {
        Self(armored.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Percent-encoded `data:` URI for use as a downloadable file reference.
    pub fn to_data_uri(&self) -> String {
        format!("data:{STORAGE_MEDIA_TYPE},{}", urlencoding::encode(&self.0))
    }
}

impl AsRef<str> for Envelope {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of sealing an identity: the envelope itself plus a data URI view of it.
#[derive(Debug, Clone)]
pub struct SealedStorage {
    pub envelope: Envelope,
    pub download_uri: String,
}

impl SealedStorage {
    pub fn new(envelope: Envelope) -> Self {
        let download_uri = envelope.to_data_uri();
        Self {
            envelope,
            download_uri,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_percent_encodes_armor() {
        let envelope = Envelope::new("-----BEGIN X-----\nab+/=\n-----END X-----\n");
        let uri = envelope.to_data_uri();

        assert!(uri.starts_with("data:application/pgp-encrypted,"));
        let body = uri.trim_start_matches("data:application/pgp-encrypted,");
        assert!(!body.contains('\n'));
        assert!(!body.contains('+'));
        assert!(!body.contains('/'));
        assert!(body.contains("%0A"));
        assert_eq!(urlencoding::decode(body).unwrap(), envelope.as_str());
    }

    #[test]
    fn sealed_storage_carries_matching_uri() {
        let sealed = SealedStorage::new(Envelope::new("abc def"));
        assert_eq!(sealed.download_uri, "data:application/pgp-encrypted,abc%20def");
    }
}
