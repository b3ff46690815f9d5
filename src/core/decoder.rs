use crate::core::chunker::{CHUNK_HEADER_LEN, CHUNK_MAGIC, GELF_MAX_CHUNK_NUMBER};
use crate::utils::error::{GelfError, Result};
use flate2::read::{GzDecoder, ZlibDecoder};
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;
use std::time::{Duration, Instant};

/// Graylog discards partial messages after five seconds.
pub const CHUNK_TIMEOUT: Duration = Duration::from_secs(5);

/// Decodes a GELF payload (plain, zlib or gzip) into its JSON object.
pub fn decode_payload(bytes: &[u8]) -> Result<Value> {
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    let bytes = &bytes[..end];

    let json = if is_gzip(bytes) {
        let mut out = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut out)?;
        out
    } else if is_zlib(bytes) {
        let mut out = Vec::new();
        ZlibDecoder::new(bytes).read_to_end(&mut out)?;
        out
    } else {
        bytes.to_vec()
    };

    let value: Value = serde_json::from_slice(&json)?;
    if !value.is_object() {
        return Err(GelfError::invalid_message("payload is not a JSON object"));
    }
    Ok(value)
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

fn is_zlib(bytes: &[u8]) -> bool {
    // CMF=0x78 (deflate, 32K window) 且 CMF*256+FLG 可被 31 整除
    bytes.len() >= 2 && bytes[0] == 0x78 && ((u16::from(bytes[0]) << 8) | u16::from(bytes[1])) % 31 == 0
}

pub fn is_chunk(datagram: &[u8]) -> bool {
    datagram.len() >= CHUNK_HEADER_LEN && datagram[..2] == CHUNK_MAGIC
}

#[derive(Debug)]
struct PendingMessage {
    total: u8,
    parts: Vec<Option<Vec<u8>>>,
    received: usize,
    started: Instant,
}

/// Reassembles chunked GELF datagrams.
#[derive(Debug)]
pub struct ChunkAssembler {
    pending: HashMap<[u8; 8], PendingMessage>,
    timeout: Duration,
}

impl Default for ChunkAssembler {
    fn default() -> Self {
        Self::new(CHUNK_TIMEOUT)
    }
}

impl ChunkAssembler {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            timeout,
        }
    }

    /// Feeds one datagram. Returns the complete payload once every chunk of
    /// its message has arrived; non-chunked datagrams are returned as is.
    pub fn push(&mut self, datagram: &[u8]) -> Result<Option<Vec<u8>>> {
        if !is_chunk(datagram) {
            return Ok(Some(datagram.to_vec()));
        }

        let mut message_id = [0u8; 8];
        message_id.copy_from_slice(&datagram[2..10]);
        let sequence = datagram[10];
        let total = datagram[11];

        if total == 0 || usize::from(total) > GELF_MAX_CHUNK_NUMBER {
            return Err(GelfError::invalid_chunk(format!("invalid chunk total {}", total)));
        }
        if sequence >= total {
            return Err(GelfError::invalid_chunk(format!(
                "sequence {} out of range for {} chunks",
                sequence, total
            )));
        }

        let entry = self
            .pending
            .entry(message_id)
            .or_insert_with(|| PendingMessage {
                total,
                parts: vec![None; usize::from(total)],
                received: 0,
                started: Instant::now(),
            });

        if entry.total != total {
            return Err(GelfError::invalid_chunk(format!(
                "chunk total {} disagrees with earlier total {}",
                total, entry.total
            )));
        }

        let slot = &mut entry.parts[usize::from(sequence)];
        if slot.is_none() {
            *slot = Some(datagram[CHUNK_HEADER_LEN..].to_vec());
            entry.received += 1;
        }

        if entry.received < usize::from(entry.total) {
            return Ok(None);
        }

        let complete = self
            .pending
            .remove(&message_id)
            .map(|message| message.parts.into_iter().flatten().flatten().collect());
        Ok(complete)
    }

    /// Drops partial messages older than the timeout, returning how many.
    pub fn evict_expired(&mut self) -> usize {
        let timeout = self.timeout;
        let before = self.pending.len();
        self.pending
            .retain(|_, message| message.started.elapsed() < timeout);
        before - self.pending.len()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chunker::encode_chunk;
    use crate::core::codec::compress;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use serde_json::json;
    use std::io::Write;

    const BODY: &[u8] = br#"{"version":"1.0","short_message":"hello"}"#;

    #[test]
    fn test_decode_plain_zlib_and_gzip() {
        assert_eq!(decode_payload(BODY).unwrap()["short_message"], json!("hello"));

        let zlib = compress(BODY).unwrap();
        assert_eq!(decode_payload(&zlib).unwrap()["short_message"], json!("hello"));

        let mut gz = GzEncoder::new(Vec::new(), Compression::default());
        gz.write_all(BODY).unwrap();
        let gz = gz.finish().unwrap();
        assert_eq!(decode_payload(&gz).unwrap()["short_message"], json!("hello"));
    }

    #[test]
    fn test_decode_strips_null_terminator() {
        let mut framed = BODY.to_vec();
        framed.push(0);
        assert!(decode_payload(&framed).is_ok());
    }

    #[test]
    fn test_decode_rejects_non_objects() {
        assert!(decode_payload(b"[1,2]").is_err());
        assert!(decode_payload(b"not json").is_err());
    }

    #[test]
    fn test_assemble_out_of_order() {
        let id = [7u8; 8];
        let mut assembler = ChunkAssembler::default();

        assert!(assembler.push(&encode_chunk(id, 2, 3, b"ghi")).unwrap().is_none());
        assert!(assembler.push(&encode_chunk(id, 0, 3, b"abc")).unwrap().is_none());
        // 重複的 chunk 不影響計數
        assert!(assembler.push(&encode_chunk(id, 0, 3, b"abc")).unwrap().is_none());
        let complete = assembler.push(&encode_chunk(id, 1, 3, b"def")).unwrap();

        assert_eq!(complete.unwrap(), b"abcdefghi");
        assert_eq!(assembler.pending(), 0);
    }

    #[test]
    fn test_unchunked_datagram_passes_through() {
        let mut assembler = ChunkAssembler::default();
        assert_eq!(assembler.push(BODY).unwrap().unwrap(), BODY);
    }

    #[test]
    fn test_invalid_chunk_headers() {
        let mut assembler = ChunkAssembler::default();
        let id = [1u8; 8];
        assert!(assembler.push(&encode_chunk(id, 0, 0, b"x")).is_err());
        assert!(assembler.push(&encode_chunk(id, 0, 129, b"x")).is_err());
        assert!(assembler.push(&encode_chunk(id, 3, 3, b"x")).is_err());

        assembler.push(&encode_chunk(id, 0, 2, b"x")).unwrap();
        assert!(assembler.push(&encode_chunk(id, 1, 4, b"y")).is_err());
    }

    #[test]
    fn test_evict_expired() {
        let mut assembler = ChunkAssembler::new(Duration::from_millis(0));
        assembler.push(&encode_chunk([2u8; 8], 0, 2, b"x")).unwrap();
        assert_eq!(assembler.pending(), 1);
        assert_eq!(assembler.evict_expired(), 1);
        assert_eq!(assembler.pending(), 0);
    }
}
