//! Stream framing for the Meshtastic wired serial API.
//!
//! Protobuf messages on the serial link are wrapped as:
//!
//!   `0x94 0xC3 <len_hi> <len_lo> <protobuf bytes>`
//!
//! Between frames the firmware may print plain-text debug output, so the
//! deframer skips anything that is not a frame header. [`StreamFramer`] can be
//! fed arbitrary chunks and yields whole frames as they complete.
use bytes::{Buf, BytesMut};
use thiserror::Error;

pub const START1: u8 = 0x94;
pub const START2: u8 = 0xC3;
const HEADER_LEN: usize = 4;

/// Largest payload the firmware emits (`MAX_TO_FROM_RADIO_SIZE`).
pub const MAX_FRAME_PAYLOAD: usize = 512;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame payload of {0} bytes exceeds {max}", max = MAX_FRAME_PAYLOAD)]
    TooLarge(usize),
}

/// Wrap an encoded protobuf message in a serial frame header.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    if payload.len() > MAX_FRAME_PAYLOAD {
        return Err(FrameError::TooLarge(payload.len()));
    }
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.push(START1);
    out.push(START2);
    out.push(((payload.len() >> 8) & 0xFF) as u8);
    out.push((payload.len() & 0xFF) as u8);
    out.extend_from_slice(payload);
    Ok(out)
}

#[derive(Debug, Default)]
pub struct StreamFramer {
    buf: BytesMut,
    skipped: usize,
}

impl StreamFramer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(1024),
            skipped: 0,
        }
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Total bytes discarded while hunting for a frame header.
    pub fn skipped_bytes(&self) -> usize {
        self.skipped
    }

    /// Next complete frame payload, or `None` until more bytes arrive.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        loop {
            self.realign();
            if self.buf.len() < HEADER_LEN {
                return None;
            }
            let declared = ((self.buf[2] as usize) << 8) | (self.buf[3] as usize);
            if declared == 0 || declared > MAX_FRAME_PAYLOAD {
                // false header inside text output; step past it
                self.discard(1);
                continue;
            }
            if self.buf.len() < HEADER_LEN + declared {
                return None;
            }
            self.buf.advance(HEADER_LEN);
            return Some(self.buf.split_to(declared).to_vec());
        }
    }

    /// Drain every frame currently available.
    pub fn frames(&mut self) -> Vec<Vec<u8>> {
        std::iter::from_fn(|| self.next_frame()).collect()
    }

    fn realign(&mut self) {
        loop {
            let Some(pos) = self.buf.iter().position(|&b| b == START1) else {
                let n = self.buf.len();
                self.discard(n);
                return;
            };
            self.discard(pos);
            // keep a lone trailing START1 until its partner arrives
            if self.buf.len() < 2 || self.buf[1] == START2 {
                return;
            }
            self.discard(1);
        }
    }

    fn discard(&mut self, n: usize) {
        if n > 0 {
            self.buf.advance(n);
            self.skipped += n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_roundtrip_in_one_chunk() {
        let framed = encode_frame(b"hello").unwrap();
        assert_eq!(&framed[..4], &[0x94, 0xC3, 0x00, 0x05]);
        let mut f = StreamFramer::new();
        f.push(&framed);
        assert_eq!(f.next_frame(), Some(b"hello".to_vec()));
        assert_eq!(f.next_frame(), None);
    }

    #[test]
    fn frame_split_across_chunks() {
        let framed = encode_frame(&[1, 2, 3, 4, 5, 6]).unwrap();
        let mut f = StreamFramer::new();
        f.push(&framed[..3]);
        assert_eq!(f.next_frame(), None);
        f.push(&framed[3..7]);
        assert_eq!(f.next_frame(), None);
        f.push(&framed[7..]);
        assert_eq!(f.next_frame(), Some(vec![1, 2, 3, 4, 5, 6]));
    }

    #[test]
    fn skips_debug_text_between_frames() {
        let mut stream = b"INFO | ??:??:?? 12 [Router] boot\r\n".to_vec();
        stream.extend(encode_frame(b"a").unwrap());
        stream.extend_from_slice(b"\x94garbage");
        stream.extend(encode_frame(b"bc").unwrap());
        let mut f = StreamFramer::new();
        f.push(&stream);
        assert_eq!(f.frames(), vec![b"a".to_vec(), b"bc".to_vec()]);
        assert!(f.skipped_bytes() > 0);
    }

    #[test]
    fn oversize_header_is_skipped() {
        let mut f = StreamFramer::new();
        f.push(&[0x94, 0xC3, 0xFF, 0xFF]);
        f.push(&encode_frame(b"ok").unwrap());
        assert_eq!(f.next_frame(), Some(b"ok".to_vec()));
    }

    #[test]
    fn long_run_of_false_starts_is_skipped() {
        let mut stream: Vec<u8> = [0x94, 0x41].repeat(8192);
        stream.extend(encode_frame(b"ok").unwrap());
        let mut f = StreamFramer::new();
        f.push(&stream);
        assert_eq!(f.frames(), vec![b"ok".to_vec()]);
        assert_eq!(f.skipped_bytes(), 16384);
    }

    #[test]
    fn trailing_start_byte_waits_for_partner() {
        let framed = encode_frame(b"xy").unwrap();
        let mut f = StreamFramer::new();
        f.push(b"noise");
        f.push(&framed[..1]);
        assert_eq!(f.next_frame(), None);
        assert_eq!(f.skipped_bytes(), 5);
        f.push(&framed[1..]);
        assert_eq!(f.next_frame(), Some(b"xy".to_vec()));
    }

    #[test]
    fn encode_rejects_large_payload() {
        let big = vec![0u8; MAX_FRAME_PAYLOAD + 1];
        assert_eq!(
            encode_frame(&big),
            Err(FrameError::TooLarge(MAX_FRAME_PAYLOAD + 1))
        );
    }
}
