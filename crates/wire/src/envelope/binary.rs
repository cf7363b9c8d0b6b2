//! Compact binary envelope: one JSON metadata blob plus raw payload blobs
//! behind a fixed-width offset header.
//!
//! Layout: `(M, offset[0], ..., offset[M])` as 8-byte signed native-order
//! words, where `M` counts the metadata blob plus all payload blobs. The
//! header spans `8 * (M + 2)` bytes; `offset[0]` equals the header length,
//! `offset[M]` equals the total buffer length, and blob `i` occupies
//! `[offset[i], offset[i+1])`. Blob 0 is the UTF-8 JSON document
//! `{data, blob_refs, objects}`; blobs `1..M` follow in `blob_refs` order.

use crate::error::{Error, Result};
use crate::session::Session;
use byteorder::{NativeEndian, ReadBytesExt};
use std::collections::BTreeMap;
use std::io::Cursor;
use tracing::debug;
use trellis_core::Value;

const WORD: usize = 8;

/// Serialize a session's state plus the root encoded form into one buffer.
pub fn serialize(session: &Session<'_>, data: &Value) -> Result<Vec<u8>> {
    let entries = session.blob_entries();
    let mut document = BTreeMap::new();
    document.insert("data".to_string(), data.clone());
    document.insert(
        "blob_refs".to_string(),
        Value::Array(
            entries
                .iter()
                .map(|(id, _)| Value::from(id.clone()))
                .collect(),
        ),
    );
    document.insert(
        "objects".to_string(),
        Value::Object(session.object_specs().clone()),
    );
    let metadata = serde_json::to_vec(&Value::Object(document))?;

    let mut blobs: Vec<&[u8]> = Vec::with_capacity(entries.len() + 1);
    blobs.push(&metadata);
    blobs.extend(entries.iter().map(|(_, bytes)| bytes.as_slice()));
    let buffer = pack_blobs(&blobs);
    debug!(
        blobs = entries.len(),
        bytes = buffer.len(),
        "serialized binary envelope"
    );
    Ok(buffer)
}

/// Restore session state from a buffer and return the root encoded form.
///
/// The session's blob store and object-spec table are replaced wholesale.
pub fn deserialize(session: &mut Session<'_>, buffer: &[u8]) -> Result<Value> {
    let blobs = unpack_blobs(buffer)?;
    let (metadata, payload) = blobs
        .split_first()
        .ok_or_else(|| Error::format("envelope contains no metadata blob"))?;
    let document: Value = serde_json::from_slice(metadata)?;
    let obj = document
        .as_object()
        .ok_or_else(|| Error::format("metadata document must be an object"))?;
    let data = obj
        .get("data")
        .ok_or_else(|| Error::format("metadata document is missing \"data\""))?
        .clone();
    let refs = obj
        .get("blob_refs")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::format("metadata document is missing \"blob_refs\""))?;
    if refs.len() != payload.len() {
        return Err(Error::format(format!(
            "blob_refs lists {} ids but the envelope carries {} payload blobs",
            refs.len(),
            payload.len()
        )));
    }
    let restored = refs
        .iter()
        .zip(payload.iter())
        .map(|(id, blob)| {
            let id = id
                .as_str()
                .ok_or_else(|| Error::format("blob_refs entries must be strings"))?;
            Ok((id.to_string(), blob.to_vec()))
        })
        .collect::<Result<Vec<_>>>()?;
    let objects = obj
        .get("objects")
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| Error::format("metadata document is missing \"objects\""))?;
    session.restore(restored, objects);
    debug!(
        blobs = payload.len(),
        bytes = buffer.len(),
        "deserialized binary envelope"
    );
    Ok(data)
}

fn pack_blobs(blobs: &[&[u8]]) -> Vec<u8> {
    let header_len = WORD * (blobs.len() + 2);
    let total = header_len + blobs.iter().map(|blob| blob.len()).sum::<usize>();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&(blobs.len() as i64).to_ne_bytes());
    let mut offset = header_len;
    out.extend_from_slice(&(offset as i64).to_ne_bytes());
    for blob in blobs {
        offset += blob.len();
        out.extend_from_slice(&(offset as i64).to_ne_bytes());
    }
    for blob in blobs {
        out.extend_from_slice(blob);
    }
    debug_assert_eq!(out.len(), total);
    out
}

fn unpack_blobs(buffer: &[u8]) -> Result<Vec<&[u8]>> {
    let mut header = Cursor::new(buffer);
    let count = header
        .read_i64::<NativeEndian>()
        .map_err(|_| Error::format("envelope shorter than its blob count word"))?;
    let count = usize::try_from(count)
        .map_err(|_| Error::format("negative blob count in envelope header"))?;
    let header_len = WORD
        .checked_mul(count + 2)
        .ok_or_else(|| Error::format("blob count overflows the header size"))?;
    if buffer.len() < header_len {
        return Err(Error::format(format!(
            "envelope of {} bytes cannot hold a header for {} blobs",
            buffer.len(),
            count
        )));
    }
    let mut offsets = Vec::with_capacity(count + 1);
    for _ in 0..=count {
        offsets.push(
            header
                .read_i64::<NativeEndian>()
                .map_err(|_| Error::format("envelope header is truncated"))?,
        );
    }
    if offsets[0] != header_len as i64 {
        return Err(Error::format(format!(
            "first offset {} does not point past the {header_len}-byte header",
            offsets[0]
        )));
    }
    for pair in offsets.windows(2) {
        if pair[1] < pair[0] {
            return Err(Error::format(format!(
                "envelope offsets must be non-decreasing, found {} after {}",
                pair[1], pair[0]
            )));
        }
    }
    if offsets[count] != buffer.len() as i64 {
        return Err(Error::format(format!(
            "final offset {} does not match envelope length {}",
            offsets[count],
            buffer.len()
        )));
    }
    Ok(offsets
        .windows(2)
        .map(|pair| &buffer[pair[0] as usize..pair[1] as usize])
        .collect())
}
