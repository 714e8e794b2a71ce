//! Length-prefixed JSON framing for the RPC transport.
//!
//! Each frame on the wire is a 4-byte big-endian length prefix followed by
//! that many bytes of JSON. Grounded on the teacher's `ZmtpDecoder`
//! (`monocoque-zmtp/src/codec.rs`): a stateful decoder that reassembles a
//! frame across partial reads, fast-pathing the case where the whole frame
//! already arrived in one read.

use crate::wire::Frame;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Frames larger than this are rejected as a protocol violation rather than
/// letting a misbehaving peer grow an unbounded buffer.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

const LENGTH_PREFIX_SIZE: usize = 4;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("frame too large: {0} bytes (max {MAX_FRAME_SIZE})")]
    FrameTooLarge(usize),

    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Encodes one frame into its length-prefixed wire form.
pub fn encode(frame: &Frame) -> Result<Bytes, CodecError> {
    let body = serde_json::to_vec(frame)?;
    if body.len() > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge(body.len()));
    }

    let mut out = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + body.len());
    out.put_u32(body.len() as u32);
    out.extend_from_slice(&body);
    Ok(out.freeze())
}

/// Stateful decoder: feed bytes in as they arrive, pull frames out as they
/// complete.
#[derive(Default)]
pub struct FrameDecoder {
    staging: BytesMut,
}

impl FrameDecoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends newly-read bytes to the decoder's internal buffer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.staging.extend_from_slice(bytes);
    }

    /// Pulls the next complete frame out of the buffer, if any.
    ///
    /// Returns `Ok(None)` when more bytes are needed, `Err` on a malformed
    /// frame or a length prefix exceeding `MAX_FRAME_SIZE`.
    pub fn decode_next(&mut self) -> Result<Option<Frame>, CodecError> {
        if self.staging.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }

        let len = u32::from_be_bytes(self.staging[..LENGTH_PREFIX_SIZE].try_into().unwrap())
            as usize;
        if len > MAX_FRAME_SIZE {
            return Err(CodecError::FrameTooLarge(len));
        }

        if self.staging.len() < LENGTH_PREFIX_SIZE + len {
            return Ok(None);
        }

        self.staging.advance(LENGTH_PREFIX_SIZE);
        let body = self.staging.split_to(len);
        let frame: Frame = serde_json::from_slice(&body)?;
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{Outcome, ReportDescriptor};

    fn sample_frame() -> Frame {
        Frame::Report {
            call_id: 1,
            descriptor: ReportDescriptor {
                name: "worker".into(),
                r#type: "hook".into(),
                version: "1.0.0".into(),
                initial_topics: vec!["alpha::*".into()],
            },
        }
    }

    #[test]
    fn round_trip_single_frame() {
        let frame = sample_frame();
        let encoded = encode(&frame).unwrap();

        let mut decoder = FrameDecoder::new();
        decoder.feed(&encoded);
        let decoded = decoder.decode_next().unwrap().unwrap();
        assert!(matches!(decoded, Frame::Report { call_id: 1, .. }));
        assert!(decoder.decode_next().unwrap().is_none());
    }

    #[test]
    fn decode_waits_for_more_bytes_on_partial_frame() {
        let encoded = encode(&sample_frame()).unwrap();
        let mut decoder = FrameDecoder::new();
        decoder.feed(&encoded[..encoded.len() - 2]);
        assert!(decoder.decode_next().unwrap().is_none());
        decoder.feed(&encoded[encoded.len() - 2..]);
        assert!(decoder.decode_next().unwrap().is_some());
    }

    #[test]
    fn decodes_two_back_to_back_frames() {
        let frame_a = Frame::HasEventReply {
            call_id: 1,
            matches: true,
        };
        let frame_b = Frame::MessageReply {
            call_id: 2,
            outcome: Outcome::Ok { result: None },
        };

        let mut decoder = FrameDecoder::new();
        decoder.feed(&encode(&frame_a).unwrap());
        decoder.feed(&encode(&frame_b).unwrap());

        assert!(matches!(
            decoder.decode_next().unwrap().unwrap(),
            Frame::HasEventReply { call_id: 1, .. }
        ));
        assert!(matches!(
            decoder.decode_next().unwrap().unwrap(),
            Frame::MessageReply { call_id: 2, .. }
        ));
    }
}
