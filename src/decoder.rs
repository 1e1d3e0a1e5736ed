use crate::frame::{DELIMITER, ESCAPE, ESCAPE_MASK};

/// Why an in-flight frame was dropped.
///
/// The decoder has already reset itself by the time one of these comes
/// back, so treating an `Err` exactly like "no packet yet" reproduces the
/// plain reset-and-continue behavior; the kind is there for diagnostics.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// An escape byte was followed directly by a delimiter.
    IllegalEscape,
    /// The frame outgrew the working buffer before its closing delimiter.
    BufferOverflow { capacity: usize },
    /// The received checksum byte does not match the payload sum.
    ChecksumMismatch { calculated: u8, found: u8 },
}

/// Incremental frame decoder.
///
/// Owns no memory: all decoded bytes land in a buffer borrowed from the
/// caller, sized for the largest expected payload plus one byte for the
/// trailing checksum. One long-lived instance serves a channel; feed it
/// the receive stream one byte at a time with [`decode`](Decoder::decode)
/// and it locks onto frame boundaries by itself, however the stream is
/// chopped up in transit.
#[derive(Debug)]
pub struct Decoder<'a> {
    buf: &'a mut [u8],
    tail: usize,
    checksum: u8,
    prev_byte: u8,
    receiving: bool,
    escaping: bool,
}

impl<'a> Decoder<'a> {
    /// `buffer` must hold `max_payload_len + 1` bytes; frames that need
    /// more are dropped as [`DecodeError::BufferOverflow`].
    pub fn new(buffer: &'a mut [u8]) -> Decoder<'a> {
        Decoder {
            buf: buffer,
            tail: 0,
            checksum: 0,
            prev_byte: 0,
            receiving: false,
            escaping: false,
        }
    }

    /// Largest payload this decoder can deliver.
    pub fn max_payload(&self) -> usize {
        self.buf.len().saturating_sub(1)
    }

    /// Feed one received byte.
    ///
    /// Returns `Ok(Some(len))` when this byte completed a valid frame; the
    /// packet is then readable as [`packet(len)`](Decoder::packet).
    /// `Ok(None)` means no packet yet. `Err` means an in-flight frame was
    /// dropped; the decoder has reset and scans on for the next frame.
    pub fn decode(&mut self, byte: u8) -> Result<Option<usize>, DecodeError> {
        let result = self.step(byte);
        if result.is_err() {
            self.reset();
        }
        self.prev_byte = byte;
        result
    }

    /// Run a whole received chunk through the decoder, stopping after the
    /// first completed packet.
    ///
    /// Returns how many bytes were consumed and the completed packet
    /// length, if any; call again with the rest of the chunk to pick up
    /// further packets. Dropped frames are logged and skipped, so a noisy
    /// chunk never surfaces an error here.
    pub fn decode_slice(&mut self, bytes: &[u8]) -> (usize, Option<usize>) {
        for (i, &byte) in bytes.iter().enumerate() {
            match self.decode(byte) {
                Ok(Some(len)) => return (i + 1, Some(len)),
                Ok(None) => {}
                Err(e) => log::debug!("dropping corrupt frame: {:?}", e),
            }
        }
        (bytes.len(), None)
    }

    /// The first `len` bytes of the working buffer.
    ///
    /// Call with the length just returned by [`decode`](Decoder::decode);
    /// the bytes stay put until the next frame starts filling the buffer.
    pub fn packet(&self, len: usize) -> &[u8] {
        &self.buf[..len]
    }

    fn step(&mut self, byte: u8) -> Result<Option<usize>, DecodeError> {
        if !self.receiving {
            // a frame starts on the first non-delimiter byte after a
            // delimiter; anything else between frames is noise
            if self.prev_byte == DELIMITER && byte != DELIMITER {
                self.receiving = true;
                return self.consume(byte);
            }
            return Ok(None);
        }

        if byte == DELIMITER {
            return self.terminate();
        }
        self.consume(byte)
    }

    fn consume(&mut self, byte: u8) -> Result<Option<usize>, DecodeError> {
        if self.escaping {
            self.escaping = false;
            self.push(byte ^ ESCAPE_MASK)?;
        } else if byte == ESCAPE {
            self.escaping = true;
        } else {
            self.push(byte)?;
        }
        Ok(None)
    }

    // closing delimiter seen: the frame is over, one way or another
    fn terminate(&mut self) -> Result<Option<usize>, DecodeError> {
        if self.escaping {
            return Err(DecodeError::IllegalEscape);
        }
        // tail >= 1 here: a frame whose only byte was an escape is caught
        // above, any other start byte landed in the buffer
        let found = self.buf[self.tail - 1];
        let calculated = self.checksum.wrapping_sub(found);
        if calculated != found {
            return Err(DecodeError::ChecksumMismatch { calculated, found });
        }
        let len = self.tail - 1;
        self.reset();
        Ok(Some(len))
    }

    fn push(&mut self, value: u8) -> Result<(), DecodeError> {
        if self.tail == self.buf.len() {
            return Err(DecodeError::BufferOverflow {
                capacity: self.buf.len(),
            });
        }
        self.buf[self.tail] = value;
        self.tail += 1;
        self.checksum = self.checksum.wrapping_add(value);
        Ok(())
    }

    fn reset(&mut self) {
        self.tail = 0;
        self.checksum = 0;
        self.receiving = false;
        self.escaping = false;
    }
}
