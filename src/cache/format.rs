//! On-disk layout of a cache entry.
//!
//! ```text
//! magic "PMCK" | version u8 | compressed u8 | JSON body (gzip when compressed)
//! ```
//! The body is `{"key": ..., "payload": {"kind": ..., "data": ...}}`.

use std::io::{self, Read, Write};

use flate2::{Compression as Flate2Compression, read::GzDecoder, write::GzEncoder};
use serde::{Deserialize, Serialize};

use crate::cache::Payload;

/// Magic bytes for cache entries: "PMCK" (PopMap ChecKpoint)
const MAGIC: &[u8] = b"PMCK";
/// Format version (currently 1)
const VERSION: u8 = 1;
const HEADER_LEN: usize = MAGIC.len() + 2;

/// File extension of every cache entry.
pub(super) const ENTRY_EXTENSION: &str = "ckpt";

#[derive(Serialize)]
struct EntryRef<'a> {
    key: &'a str,
    payload: &'a Payload,
}

#[derive(Debug, Deserialize)]
pub(super) struct Entry {
    pub(super) key: String,
    pub(super) payload: Payload,
}

/// Encode a payload stored under `key`.
pub(super) fn encode_entry(key: &str, payload: &Payload, compress: bool) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN);
    out.write_all(MAGIC)?;
    out.write_all(&[VERSION, u8::from(compress)])?;

    let entry = EntryRef { key, payload };
    if compress {
        let mut encoder = GzEncoder::new(out, Flate2Compression::default());
        serde_json::to_writer(&mut encoder, &entry).map_err(io::Error::other)?;
        encoder.finish()
    } else {
        serde_json::to_writer(&mut out, &entry).map_err(io::Error::other)?;
        Ok(out)
    }
}

/// Decode an entry; the error string describes why the bytes are unusable.
pub(super) fn decode_entry(bytes: &[u8]) -> Result<Entry, String> {
    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err("not a cache entry (bad magic bytes)".to_string());
    }

    let version = bytes[MAGIC.len()];
    if version != VERSION {
        return Err(format!("unsupported entry version {version}, expected {VERSION}"));
    }

    let body = &bytes[HEADER_LEN..];
    let result = match bytes[MAGIC.len() + 1] {
        0 => serde_json::from_slice::<Entry>(body),
        1 => {
            let mut json = Vec::new();
            GzDecoder::new(body).read_to_end(&mut json)
                .map_err(|e| format!("failed to decompress body: {e}"))?;
            serde_json::from_slice::<Entry>(&json)
        }
        flag => return Err(format!("invalid compression flag {flag}")),
    };

    result.map_err(|e| format!("failed to decode body: {e}"))
}
