/// Bit-level I/O over byte streams.
///
/// The writer always packs bits MSB-first. The reader can unpack either
/// MSB-first or LSB-first; the LSB-first mode exists only so that the
/// decoder can probe streams whose bit order is not recorded anywhere in
/// the container (see [`crate::codec::detect_bit_order`]).
use std::io::{self, ErrorKind, Read, Write};

/// Order in which bits are taken out of each byte on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BitOrder {
    /// Bit 7 first (the order the writer produces).
    #[default]
    MsbFirst,
    /// Bit 0 first.
    LsbFirst,
}

impl BitOrder {
    /// Candidate orders in the sequence the decoder tries them.
    pub const PROBE_SEQUENCE: [BitOrder; 2] = [BitOrder::MsbFirst, BitOrder::LsbFirst];
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Bitstream writer that packs bits MSB-first into a byte sink.
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    inner: W,
    buf: u8,
    /// Number of bits currently held in `buf` (0..8).
    pending: u8,
    bytes_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        BitWriter {
            inner,
            buf: 0,
            pending: 0,
            bytes_written: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        self.buf = (self.buf << 1) | bit as u8;
        self.pending += 1;
        if self.pending == 8 {
            self.inner.write_all(&[self.buf])?;
            self.bytes_written += 1;
            self.buf = 0;
            self.pending = 0;
        }
        Ok(())
    }

    /// Write the low `nb_bits` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u32, nb_bits: u32) -> io::Result<()> {
        debug_assert!(nb_bits <= 32);
        for shift in (0..nb_bits).rev() {
            self.write_bit((value >> shift) & 1 == 1)?;
        }
        Ok(())
    }

    /// Write a sequence of branch decisions (`true` = 1).
    pub fn write_path(&mut self, path: &[bool]) -> io::Result<()> {
        for &bit in path {
            self.write_bit(bit)?;
        }
        Ok(())
    }

    /// Bytes handed to the sink so far (excluding a partial byte).
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Pad the final partial byte with zero bits and flush.
    ///
    /// Returns the sink and the total number of bytes written to it.
    pub fn finish(mut self) -> io::Result<(W, u64)> {
        while self.pending != 0 {
            self.write_bit(false)?;
        }
        self.inner.flush()?;
        Ok((self.inner, self.bytes_written))
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Bitstream reader that pulls one byte at a time and yields its bits in
/// the configured [`BitOrder`].
#[derive(Debug)]
pub struct BitReader<R: Read> {
    inner: R,
    order: BitOrder,
    buf: u8,
    /// Bits left in `buf` (0..=8).
    available: u8,
}

impl<R: Read> BitReader<R> {
    pub fn new(inner: R, order: BitOrder) -> Self {
        BitReader {
            inner,
            order,
            buf: 0,
            available: 0,
        }
    }

    pub fn order(&self) -> BitOrder {
        self.order
    }

    /// Read one bit. Returns `Ok(None)` once the source is exhausted.
    pub fn read_bit(&mut self) -> io::Result<Option<bool>> {
        if self.available == 0 {
            match self.next_byte()? {
                Some(byte) => {
                    self.buf = byte;
                    self.available = 8;
                }
                None => return Ok(None),
            }
        }
        let bit = match self.order {
            BitOrder::MsbFirst => {
                let bit = self.buf & 0x80 != 0;
                self.buf <<= 1;
                bit
            }
            BitOrder::LsbFirst => {
                let bit = self.buf & 0x01 != 0;
                self.buf >>= 1;
                bit
            }
        };
        self.available -= 1;
        Ok(Some(bit))
    }

    /// Read `nb_bits` bits, the first one read becoming the most
    /// significant bit of the result.
    pub fn read_bits(&mut self, nb_bits: u32) -> io::Result<Option<u32>> {
        debug_assert!(nb_bits <= 32);
        let mut value = 0u32;
        for _ in 0..nb_bits {
            match self.read_bit()? {
                Some(bit) => value = (value << 1) | bit as u32,
                None => return Ok(None),
            }
        }
        Ok(Some(value))
    }

    /// Give back the underlying source. Buffered bits are discarded.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}
