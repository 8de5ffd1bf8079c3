//! Binary framing for protocol messages.
//!
//! One frame per message: a 1-byte tag followed by a payload whose length is
//! statically known per message kind once `(dimension, max_word_len)` are
//! agreed at startup. Words occupy a fixed slot — a u16 length prefix plus
//! the bytes, zero-padded to the maximum — so frames never vary with word
//! content. Floats are f32 little-endian. `Load` carries a u32 row count
//! followed by that many fixed-size rows.

use crate::embedding::{BoundedWord, EmbeddingRow};
use crate::error::{ShardError, ShardResult};
use crate::protocol::message::{Command, Reply};

const TAG_LOAD: u8 = 0x01;
const TAG_FIND_WORD: u8 = 0x02;
const TAG_RANK: u8 = 0x03;
const TAG_EXIT: u8 = 0x04;

const TAG_WORD_INDEX: u8 = 0x11;
const TAG_VECTOR: u8 = 0x12;
const TAG_BEST: u8 = 0x13;
const TAG_EXHAUSTED: u8 = 0x14;

/// Encoder/decoder for a fixed `(dimension, max_word_len)` agreement.
///
/// Both sides construct an identical codec at startup; a frame that does
/// not match the agreed sizes is a protocol violation, never a guess.
#[derive(Debug, Clone, Copy)]
pub struct FrameCodec {
    dimension: usize,
    max_word_len: usize,
}

impl FrameCodec {
    /// Creates a codec for the given dimension and word-slot size.
    #[must_use]
    pub fn new(dimension: usize, max_word_len: usize) -> Self {
        Self {
            dimension,
            max_word_len,
        }
    }

    /// The maximum word length this codec's frames can carry.
    #[must_use]
    pub fn max_word_len(&self) -> usize {
        self.max_word_len
    }

    /// Size of the fixed word slot: length prefix plus padded bytes.
    fn word_slot(&self) -> usize {
        2 + self.max_word_len
    }

    /// Size of an encoded vector.
    fn vector_len(&self) -> usize {
        self.dimension * 4
    }

    /// Size of one encoded `Load` row.
    fn row_len(&self) -> usize {
        self.word_slot() + self.vector_len()
    }

    /// Encodes a coordinator command into a single frame.
    pub fn encode_command(&self, command: &Command) -> ShardResult<Vec<u8>> {
        match command {
            Command::Load { rows } => {
                let mut frame = Vec::with_capacity(1 + 4 + rows.len() * self.row_len());
                frame.push(TAG_LOAD);
                frame.extend_from_slice(&(rows.len() as u32).to_le_bytes());
                for row in rows {
                    self.put_word(&mut frame, row.word.as_str())?;
                    self.put_vector(&mut frame, &row.vector)?;
                }
                Ok(frame)
            }
            Command::FindWord { word } => {
                let mut frame = Vec::with_capacity(1 + self.word_slot());
                frame.push(TAG_FIND_WORD);
                self.put_word(&mut frame, word)?;
                Ok(frame)
            }
            Command::Rank { target } => {
                let mut frame = Vec::with_capacity(1 + self.vector_len());
                frame.push(TAG_RANK);
                self.put_vector(&mut frame, target)?;
                Ok(frame)
            }
            Command::Exit => Ok(vec![TAG_EXIT]),
        }
    }

    /// Decodes a frame into a coordinator command.
    pub fn decode_command(&self, frame: &[u8]) -> ShardResult<Command> {
        let (tag, payload) = split_tag(frame)?;
        match tag {
            TAG_LOAD => {
                let count = read_u32(payload.get(..4))? as usize;
                let rows_bytes = &payload[4..];
                if rows_bytes.len() != count * self.row_len() {
                    return Err(frame_length_error("LOAD", count * self.row_len() + 4, payload.len()));
                }
                let mut rows = Vec::with_capacity(count);
                for chunk in rows_bytes.chunks_exact(self.row_len()) {
                    let word = self.read_word(&chunk[..self.word_slot()])?;
                    let vector = self.read_vector(&chunk[self.word_slot()..])?;
                    rows.push(EmbeddingRow { word, vector });
                }
                Ok(Command::Load { rows })
            }
            TAG_FIND_WORD => {
                if payload.len() != self.word_slot() {
                    return Err(frame_length_error("FIND_WORD", self.word_slot(), payload.len()));
                }
                let word = self.read_word(payload)?;
                Ok(Command::FindWord {
                    word: word.into_string(),
                })
            }
            TAG_RANK => {
                if payload.len() != self.vector_len() {
                    return Err(frame_length_error("RANK", self.vector_len(), payload.len()));
                }
                Ok(Command::Rank {
                    target: self.read_vector(payload)?,
                })
            }
            TAG_EXIT => {
                if !payload.is_empty() {
                    return Err(frame_length_error("EXIT", 0, payload.len()));
                }
                Ok(Command::Exit)
            }
            other => Err(ShardError::Protocol {
                reason: format!("unknown command tag 0x{other:02x}"),
            }),
        }
    }

    /// Encodes a worker reply into a single frame.
    pub fn encode_reply(&self, reply: &Reply) -> ShardResult<Vec<u8>> {
        match reply {
            Reply::WordIndex { owned } => Ok(vec![TAG_WORD_INDEX, u8::from(*owned)]),
            Reply::Vector { vector } => {
                let mut frame = Vec::with_capacity(1 + self.vector_len());
                frame.push(TAG_VECTOR);
                self.put_vector(&mut frame, vector)?;
                Ok(frame)
            }
            Reply::Best { word, score } => {
                let mut frame = Vec::with_capacity(1 + self.word_slot() + 4);
                frame.push(TAG_BEST);
                self.put_word(&mut frame, word)?;
                frame.extend_from_slice(&score.to_le_bytes());
                Ok(frame)
            }
            Reply::Exhausted => Ok(vec![TAG_EXHAUSTED]),
        }
    }

    /// Decodes a frame into a worker reply.
    pub fn decode_reply(&self, frame: &[u8]) -> ShardResult<Reply> {
        let (tag, payload) = split_tag(frame)?;
        match tag {
            TAG_WORD_INDEX => match payload {
                [0] => Ok(Reply::WordIndex { owned: false }),
                [1] => Ok(Reply::WordIndex { owned: true }),
                _ => Err(ShardError::Protocol {
                    reason: "WORD_INDEX payload must be a single 0/1 byte".to_string(),
                }),
            },
            TAG_VECTOR => {
                if payload.len() != self.vector_len() {
                    return Err(frame_length_error("VECTOR", self.vector_len(), payload.len()));
                }
                Ok(Reply::Vector {
                    vector: self.read_vector(payload)?,
                })
            }
            TAG_BEST => {
                if payload.len() != self.word_slot() + 4 {
                    return Err(frame_length_error("BEST", self.word_slot() + 4, payload.len()));
                }
                let word = self.read_word(&payload[..self.word_slot()])?;
                let score = f32::from_le_bytes(
                    payload[self.word_slot()..]
                        .try_into()
                        .expect("slice length checked above"),
                );
                Ok(Reply::Best {
                    word: word.into_string(),
                    score,
                })
            }
            TAG_EXHAUSTED => {
                if !payload.is_empty() {
                    return Err(frame_length_error("EXHAUSTED", 0, payload.len()));
                }
                Ok(Reply::Exhausted)
            }
            other => Err(ShardError::Protocol {
                reason: format!("unknown reply tag 0x{other:02x}"),
            }),
        }
    }

    /// Writes a word into its fixed slot: u16 length, bytes, zero padding.
    fn put_word(&self, frame: &mut Vec<u8>, word: &str) -> ShardResult<()> {
        // Re-validates the length contract at the wire boundary.
        let word = BoundedWord::new(word, self.max_word_len)?;
        let bytes = word.as_str().as_bytes();
        frame.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
        frame.extend_from_slice(bytes);
        frame.resize(frame.len() + (self.max_word_len - bytes.len()), 0);
        Ok(())
    }

    /// Reads a word from its fixed slot.
    fn read_word(&self, slot: &[u8]) -> ShardResult<BoundedWord> {
        let len = u16::from_le_bytes(slot[..2].try_into().expect("slot has a 2-byte prefix")) as usize;
        if len > self.max_word_len {
            return Err(ShardError::Protocol {
                reason: format!("word length {len} exceeds maximum {}", self.max_word_len),
            });
        }
        let text = std::str::from_utf8(&slot[2..2 + len]).map_err(|_| ShardError::Protocol {
            reason: "word is not valid UTF-8".to_string(),
        })?;
        BoundedWord::new(text, self.max_word_len)
    }

    fn put_vector(&self, frame: &mut Vec<u8>, vector: &[f32]) -> ShardResult<()> {
        if vector.len() != self.dimension {
            return Err(ShardError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        for value in vector {
            frame.extend_from_slice(&value.to_le_bytes());
        }
        Ok(())
    }

    fn read_vector(&self, bytes: &[u8]) -> ShardResult<Vec<f32>> {
        Ok(bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes(chunk.try_into().expect("chunks_exact yields 4 bytes")))
            .collect())
    }
}

fn split_tag(frame: &[u8]) -> ShardResult<(u8, &[u8])> {
    match frame.split_first() {
        Some((tag, payload)) => Ok((*tag, payload)),
        None => Err(ShardError::Protocol {
            reason: "empty frame".to_string(),
        }),
    }
}

fn read_u32(bytes: Option<&[u8]>) -> ShardResult<u32> {
    let bytes = bytes.ok_or_else(|| ShardError::Protocol {
        reason: "frame too short for row count".to_string(),
    })?;
    Ok(u32::from_le_bytes(
        bytes.try_into().expect("caller slices exactly 4 bytes"),
    ))
}

fn frame_length_error(kind: &str, expected: usize, actual: usize) -> ShardError {
    ShardError::Protocol {
        reason: format!("{kind} payload must be {expected} bytes, got {actual}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::BoundedWord;

    fn codec() -> FrameCodec {
        FrameCodec::new(3, 20)
    }

    fn row(word: &str, vector: Vec<f32>) -> EmbeddingRow {
        EmbeddingRow {
            word: BoundedWord::new(word, 20).unwrap(),
            vector,
        }
    }

    #[test]
    fn test_load_round_trip() {
        let command = Command::Load {
            rows: vec![row("cat", vec![1.0, 0.0, 0.5]), row("dog", vec![0.0, 1.0, -0.5])],
        };
        let frame = codec().encode_command(&command).unwrap();
        assert_eq!(codec().decode_command(&frame).unwrap(), command);
    }

    #[test]
    fn test_find_word_frame_is_fixed_size() {
        let short = codec()
            .encode_command(&Command::FindWord { word: "a".into() })
            .unwrap();
        let long = codec()
            .encode_command(&Command::FindWord {
                word: "abcdefghij".into(),
            })
            .unwrap();
        assert_eq!(short.len(), long.len(), "word slot must not vary");
        assert_eq!(short.len(), 1 + 2 + 20);
    }

    #[test]
    fn test_rank_and_vector_round_trip() {
        let rank = Command::Rank {
            target: vec![0.1, -0.2, 0.3],
        };
        let frame = codec().encode_command(&rank).unwrap();
        assert_eq!(codec().decode_command(&frame).unwrap(), rank);

        let vector = Reply::Vector {
            vector: vec![0.5, 0.25, -1.0],
        };
        let frame = codec().encode_reply(&vector).unwrap();
        assert_eq!(codec().decode_reply(&frame).unwrap(), vector);
    }

    #[test]
    fn test_best_and_exhausted_round_trip() {
        let best = Reply::Best {
            word: "wolf".into(),
            score: 0.9,
        };
        let frame = codec().encode_reply(&best).unwrap();
        assert_eq!(codec().decode_reply(&frame).unwrap(), best);

        let frame = codec().encode_reply(&Reply::Exhausted).unwrap();
        assert_eq!(codec().decode_reply(&frame).unwrap(), Reply::Exhausted);
    }

    #[test]
    fn test_word_index_round_trip() {
        for owned in [true, false] {
            let frame = codec().encode_reply(&Reply::WordIndex { owned }).unwrap();
            assert_eq!(
                codec().decode_reply(&frame).unwrap(),
                Reply::WordIndex { owned }
            );
        }
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let err = codec().decode_command(&[0x7f]).unwrap_err();
        assert!(matches!(err, ShardError::Protocol { .. }));

        let err = codec().decode_reply(&[0x7f]).unwrap_err();
        assert!(matches!(err, ShardError::Protocol { .. }));
    }

    #[test]
    fn test_short_frame_rejected() {
        let err = codec().decode_command(&[]).unwrap_err();
        assert!(matches!(err, ShardError::Protocol { .. }));

        // RANK with a truncated vector
        let err = codec().decode_command(&[TAG_RANK, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, ShardError::Protocol { .. }));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut frame = codec().encode_command(&Command::Exit).unwrap();
        frame.push(0);
        let err = codec().decode_command(&frame).unwrap_err();
        assert!(matches!(err, ShardError::Protocol { .. }));
    }

    #[test]
    fn test_overlong_word_rejected_at_encode() {
        let err = codec()
            .encode_command(&Command::FindWord {
                word: "x".repeat(21),
            })
            .unwrap_err();
        assert!(matches!(err, ShardError::Protocol { .. }));
    }

    #[test]
    fn test_wrong_dimension_rejected_at_encode() {
        let err = codec()
            .encode_command(&Command::Rank {
                target: vec![1.0, 2.0],
            })
            .unwrap_err();
        assert!(matches!(err, ShardError::DimensionMismatch { .. }));
    }
}
