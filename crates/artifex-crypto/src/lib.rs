//! Content fingerprinting for the artifex image store.
//!
//! Uploads are deduplicated by a domain-separated BLAKE3 digest of their raw
//! bytes. Hashing is a pure function; the only failure mode is an unreadable
//! input, which surfaces as the caller's I/O error.
//!
//! All crypto operations wrap established libraries, no custom cryptography.

pub mod hasher;

pub use hasher::ContentHasher;
