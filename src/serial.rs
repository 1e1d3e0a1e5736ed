use core::convert::Infallible;

use embedded_hal_nb::serial;
use embedded_io::{Read, ReadExactError, Write};

use crate::decoder::Decoder;
use crate::frame::encode_with;

/// Error type for link operations.
///
/// `W` and `R` are the transport's write and read error types; the side a
/// call never touches is [`Infallible`].
#[derive(Debug)]
pub enum LinkError<W, R> {
    Write(W),
    Read(ReadExactError<R>),
}

/// Blocking frame link over a pair of byte streams.
///
/// The serial driver stays outside: anything implementing the embedded-io
/// traits plugs in, one link per channel. Sent payloads are framed on the
/// way out; received bytes run through the decoder until a packet
/// completes.
#[derive(Debug)]
pub struct SerialLink<'a, Tx: Write, Rx: Read> {
    tx: Tx,
    rx: Rx,
    decoder: Decoder<'a>,
}

impl<'a, Tx: Write, Rx: Read> SerialLink<'a, Tx, Rx> {
    /// `buffer` is the decoder working area: largest expected payload plus
    /// one byte for the checksum.
    pub fn new(tx: Tx, rx: Rx, buffer: &'a mut [u8]) -> SerialLink<'a, Tx, Rx> {
        SerialLink {
            tx,
            rx,
            decoder: Decoder::new(buffer),
        }
    }

    /// Frame `payload` and write it out. Returns the frame length on the
    /// wire.
    pub fn send(&mut self, payload: &[u8]) -> Result<usize, LinkError<Tx::Error, Infallible>> {
        let written =
            encode_with(payload, |byte| self.tx.write_all(&[byte])).map_err(LinkError::Write)?;
        self.tx.flush().map_err(LinkError::Write)?;
        Ok(written)
    }

    /// Block until a valid packet arrives and return its length.
    ///
    /// Corrupt frames are logged and skipped on the way; an exhausted
    /// stream surfaces as [`ReadExactError::UnexpectedEof`].
    pub fn recv(&mut self) -> Result<usize, LinkError<Infallible, Rx::Error>> {
        let mut byte = [0u8; 1];
        loop {
            self.rx.read_exact(&mut byte).map_err(LinkError::Read)?;
            match self.decoder.decode(byte[0]) {
                Ok(Some(len)) => return Ok(len),
                Ok(None) => {}
                Err(e) => log::debug!("link dropped a frame: {:?}", e),
            }
        }
    }

    /// Read a received packet out of the decoder buffer.
    pub fn packet(&self, len: usize) -> &[u8] {
        self.decoder.packet(len)
    }
}

/// Polled transmitter for word-at-a-time serial peripherals.
#[derive(Debug)]
pub struct FrameTx<Tx: serial::Write> {
    pub tx: Tx,
}

impl<Tx: serial::Write> FrameTx<Tx> {
    pub fn new(tx: Tx) -> FrameTx<Tx> {
        FrameTx { tx }
    }

    /// Frame `payload` and push it out, spinning while the peripheral is
    /// busy. Returns the frame length on the wire.
    pub fn send(&mut self, payload: &[u8]) -> Result<usize, Tx::Error> {
        let written = encode_with(payload, |byte| nb::block!(self.tx.write(byte)))?;
        nb::block!(self.tx.flush())?;
        Ok(written)
    }
}

/// Polled receiver: drains the peripheral into the decoder.
#[derive(Debug)]
pub struct FrameRx<'a, Rx: serial::Read> {
    pub rx: Rx,
    decoder: Decoder<'a>,
}

impl<'a, Rx: serial::Read> FrameRx<'a, Rx> {
    pub fn new(rx: Rx, buffer: &'a mut [u8]) -> FrameRx<'a, Rx> {
        FrameRx {
            rx,
            decoder: Decoder::new(buffer),
        }
    }

    /// Pump received bytes through the decoder.
    ///
    /// `WouldBlock` means the peripheral ran dry with no complete packet;
    /// call again from the poll loop or receive interrupt when more bytes
    /// are in. Partial frames carry over between calls.
    pub fn poll(&mut self) -> nb::Result<usize, Rx::Error> {
        loop {
            let byte = self.rx.read()?;
            match self.decoder.decode(byte) {
                Ok(Some(len)) => return Ok(len),
                Ok(None) => {}
                Err(e) => log::debug!("link dropped a frame: {:?}", e),
            }
        }
    }

    /// Read a received packet out of the decoder buffer.
    pub fn packet(&self, len: usize) -> &[u8] {
        self.decoder.packet(len)
    }
}

/// Both directions of a polled link in one place.
#[derive(Debug)]
pub struct FrameTxRx<'a, Tx: serial::Write, Rx: serial::Read> {
    pub tx: FrameTx<Tx>,
    pub rx: FrameRx<'a, Rx>,
}

impl<'a, Tx: serial::Write, Rx: serial::Read> FrameTxRx<'a, Tx, Rx> {
    pub fn new(tx: Tx, rx: Rx, buffer: &'a mut [u8]) -> FrameTxRx<'a, Tx, Rx> {
        FrameTxRx {
            tx: FrameTx::new(tx),
            rx: FrameRx::new(rx, buffer),
        }
    }

    pub fn send(&mut self, payload: &[u8]) -> Result<usize, Tx::Error> {
        self.tx.send(payload)
    }

    pub fn poll(&mut self) -> nb::Result<usize, Rx::Error> {
        self.rx.poll()
    }

    pub fn packet(&self, len: usize) -> &[u8] {
        self.rx.packet(len)
    }

    pub fn split(self) -> (FrameTx<Tx>, FrameRx<'a, Rx>) {
        (self.tx, self.rx)
    }
}
