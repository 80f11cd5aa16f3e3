use sha1::Digest;
use sha1::Sha1;

/// Number of hex characters kept from a content digest when naming output files.
pub const CONTENT_DIGEST_LENGTH: usize = 12;

/// Hex encoded SHA-1 digest of `bytes`.
///
/// Both scoped identifiers and output filenames are derived from this digest, so it must stay
/// stable across runs, machines and versions.
pub fn sha1_hex(bytes: &[u8]) -> String {
  hex::encode(Sha1::digest(bytes))
}

/// Short content digest used to build content-addressed filenames.
pub fn content_digest(contents: &str) -> String {
  let mut digest = sha1_hex(contents.as_bytes());
  digest.truncate(CONTENT_DIGEST_LENGTH);
  digest
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sha1_of_empty_input() {
    assert_eq!(sha1_hex(b""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
  }

  #[test]
  fn content_digest_is_truncated() {
    assert_eq!(content_digest(".a{color:red}"), "b4fd9e9e6a6a");
  }

  #[test]
  fn content_digest_changes_with_content() {
    assert_ne!(
      content_digest(".a{color:red}"),
      content_digest(".a{color:blue}")
    );
  }
}
