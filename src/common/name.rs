use sha2::{Digest, Sha256};

/// Longest sanitized stem kept before a hash suffix takes over.
const MAX_STEM_LEN: usize = 120;

/// Hex-encoded SHA-256 of a byte slice.
pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_` and strip leading dots.
pub(crate) fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}

/// Filesystem-safe stem for `name`.
///
/// Names that survive sanitizing unchanged map to themselves. Anything that had to be
/// rewritten or truncated gets an 8-hex-digit suffix of its SHA-256, so two distinct
/// names never share a stem.
pub(crate) fn safe_stem(name: &str) -> String {
    let mut stem = sanitize(name);
    if stem == name && !stem.is_empty() && stem.len() <= MAX_STEM_LEN {
        return stem;
    }

    let digest = sha256_hex(name.as_bytes());
    stem.truncate(MAX_STEM_LEN);
    if stem.is_empty() {
        digest[..8].to_string()
    } else {
        format!("{stem}-{}", &digest[..8])
    }
}
