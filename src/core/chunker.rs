//! GELF UDP chunking.
//!
//! A chunk is a 12-byte header followed by a slice of the payload:
//! magic `0x1e 0x0f`, an 8-byte message id shared by every chunk of one
//! message, the 0-based sequence number and the total chunk count.

use crate::core::codec::{compress, pack};
use crate::core::decoder::decode_payload;
use crate::core::{EncodedMessage, GelfMessage, Level, OverflowPolicy, WAN_CHUNK};
use crate::utils::error::{GelfError, Result};
use serde_json::Value;

pub const GELF_MAX_CHUNK_NUMBER: usize = 128;
pub const CHUNK_MAGIC: [u8; 2] = [0x1e, 0x0f];
pub const CHUNK_HEADER_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    policy: OverflowPolicy,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(WAN_CHUNK, OverflowPolicy::default())
    }
}

impl Chunker {
    pub fn new(chunk_size: usize, policy: OverflowPolicy) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            policy,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn chunk_count(&self, len: usize) -> usize {
        len.div_ceil(self.chunk_size)
    }

    /// Number of chunks `len` bytes need, or [`GelfError::ChunkOverflowError`]
    /// when that is more than a GELF message may have.
    pub fn fit(&self, len: usize) -> Result<usize> {
        let chunks = self.chunk_count(len);
        if chunks > GELF_MAX_CHUNK_NUMBER {
            return Err(GelfError::ChunkOverflowError {
                chunks,
                max: GELF_MAX_CHUNK_NUMBER,
            });
        }
        Ok(chunks)
    }

    /// Splits `message` into chunks.
    ///
    /// Returns no chunks when the message overflows and the policy drops it.
    /// Errors only when a truncation attempt cannot read the original message.
    pub fn chunk_message(&self, message: &EncodedMessage) -> Result<Vec<Vec<u8>>> {
        let overflow = match self.fit(message.len()) {
            Ok(_) => return Ok(self.gen_chunks(&message.bytes)),
            Err(overflow) => overflow,
        };

        match self.policy {
            OverflowPolicy::Drop => Ok(Vec::new()),
            OverflowPolicy::Warn => {
                tracing::warn!("Dropping GELF message ({} bytes): {}", message.len(), overflow);
                Ok(Vec::new())
            }
            OverflowPolicy::Truncate => {
                tracing::warn!("Truncating GELF message ({} bytes): {}", message.len(), overflow);
                match self.truncate_overflow(message) {
                    Ok(truncated) => Ok(self.gen_chunks(&truncated.bytes)),
                    Err(GelfError::TruncationFailureError) => {
                        tracing::warn!(
                            "Truncation failed to prevent chunk overflow, dropping GELF message ({} bytes)",
                            message.len()
                        );
                        Ok(Vec::new())
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }

    /// Rebuilds an overflowing message as a simplified error-level message
    /// whose `short_message` is cut down until it fits in 128 chunks.
    pub fn truncate_overflow(&self, message: &EncodedMessage) -> Result<EncodedMessage> {
        let original = decode_payload(&message.bytes)?;
        let field = |name: &str| -> Result<Value> {
            original
                .get(name)
                .cloned()
                .ok_or_else(|| GelfError::invalid_message(format!("missing '{}' field", name)))
        };

        let mut simplified = GelfMessage::new();
        simplified.insert("version", field("version")?);
        simplified.insert("host", field("host")?);
        simplified.insert("short_message", "");
        simplified.insert("timestamp", field("timestamp")?);
        simplified.insert("level", Level::Error.syslog());
        simplified.insert("facility", field("facility")?);
        simplified.insert("_chunk_overflow", true);

        let short_message: Vec<char> = field("short_message")?
            .as_str()
            .unwrap_or_default()
            .chars()
            .collect();

        let base_chunks = self.chunk_count(self.encode(&simplified, message.compressed)?.len());
        let free_chunks = GELF_MAX_CHUNK_NUMBER
            .checked_sub(base_chunks)
            .ok_or(GelfError::TruncationFailureError)?;

        let mut keep = short_message.len().min(self.chunk_size * free_chunks);
        for _ in 0..=free_chunks {
            let truncated: String = short_message[..keep].iter().collect();
            simplified.insert("short_message", truncated);
            let encoded = self.encode(&simplified, message.compressed)?;
            if self.fit(encoded.len()).is_ok() {
                return Ok(encoded);
            }
            keep = keep.saturating_sub(self.chunk_size);
        }
        Err(GelfError::TruncationFailureError)
    }

    fn encode(&self, message: &GelfMessage, compressed: bool) -> Result<EncodedMessage> {
        let packed = pack(message)?;
        if compressed {
            Ok(EncodedMessage::new(compress(&packed)?, true))
        } else {
            Ok(EncodedMessage::new(packed, false))
        }
    }

    fn gen_chunks(&self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let total = self.chunk_count(bytes.len());
        let message_id = rand::random::<u64>().to_le_bytes();
        bytes
            .chunks(self.chunk_size)
            .enumerate()
            .map(|(sequence, chunk)| encode_chunk(message_id, sequence as u8, total as u8, chunk))
            .collect()
    }
}

pub fn encode_chunk(message_id: [u8; 8], sequence: u8, total: u8, chunk: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(CHUNK_HEADER_LEN + chunk.len());
    out.extend_from_slice(&CHUNK_MAGIC);
    out.extend_from_slice(&message_id);
    out.push(sequence);
    out.push(total);
    out.extend_from_slice(chunk);
    out
}
