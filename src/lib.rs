//! Byte-stuffed framing for serial byte streams.
//!
//! Delimits variable-length packets on a continuous byte channel, such as
//! the UART link between a ground station and an antenna tracker. The
//! scheme is the asynchronous-framing subset of HDLC: `0x7E` delimiters
//! and `0x7D` escapes around an additive 8-bit checksum. It is not an HDLC
//! implementation; there are no address or control fields and no CRC or
//! bit-stuffing.
//!
//! Wire format:
//!
//! ```text
//! 0x7E  stuffed(payload)  stuffed(checksum)  0x7E
//!
//! stuffed(b): 0x7E and 0x7D become 0x7D, b ^ 0x20; anything else is b
//! checksum:   sum of raw payload bytes, mod 256
//! ```
//!
//! [`encode`] is a one-shot transform into a caller buffer. [`Decoder`]
//! eats the receive stream one byte at a time inside a borrowed fixed
//! buffer and resynchronizes on delimiters by itself; nothing allocates.
//! [`SerialLink`], [`FrameTx`] and [`FrameRx`] wire both ends onto the
//! embedded IO traits.

#![no_std]

mod decoder;
mod frame;
mod serial;

/// Things that can write themselves into a byte buffer as one frame.
pub trait Encode {
    type Error;

    fn encode(&self, buffer: &mut [u8]) -> Result<usize, Self::Error>;
}

pub use decoder::{DecodeError, Decoder};
pub use frame::{
    checksum, encode, encode_to_vec, encode_with, max_encoded_len, EncodeError, DELIMITER, ESCAPE,
    ESCAPE_MASK,
};
pub use serial::{FrameRx, FrameTx, FrameTxRx, LinkError, SerialLink};
