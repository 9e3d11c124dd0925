use artifex_types::ContentDigest;

/// Domain-separated BLAKE3 content hasher.
///
/// The domain tag is prepended to every hash computation so that digests from
/// this store never collide with hashes of the same bytes computed elsewhere
/// (or by a future, incompatible digest scheme).
#[derive(Clone, Copy, Debug)]
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for uploaded image content.
    pub const IMAGE: Self = Self {
        domain: "artifex-image-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Fingerprint a byte buffer.
    pub fn digest(&self, data: &[u8]) -> ContentDigest {
        let mut hasher = self.start();
        hasher.update(data);
        ContentDigest::from_hash(*hasher.finalize().as_bytes())
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }

    fn start(&self) -> blake3::Hasher {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher
    }
}
