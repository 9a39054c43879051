/// Container framing for compressed streams.
///
/// ```text
/// offset  size  field
/// 0       4     original length, u32 little-endian
/// 4       ...   adaptive Huffman bit stream, last byte zero padded
/// ```
///
/// There is no magic number, version, checksum or bit-order flag. The
/// decoder recovers the bit order by probing (see
/// [`crate::codec::detect_bit_order`]); a versioned header carrying the
/// order would make that unnecessary, but would break compatibility with
/// existing files.
use std::io::{ErrorKind, Read, Write};

use crate::{FgkError, StreamResult};

/// Size of the length header in bytes.
pub const HEADER_LEN: usize = 4;

/// Write the original length as the container header.
pub fn write_header<W: Write>(sink: &mut W, original_len: u32) -> StreamResult<()> {
    sink.write_all(&original_len.to_le_bytes())?;
    Ok(())
}

/// Read the container header and return the original length.
pub fn read_header<R: Read>(source: &mut R) -> StreamResult<u32> {
    let mut buf = [0u8; HEADER_LEN];
    let mut found = 0;
    while found < HEADER_LEN {
        match source.read(&mut buf[found..]) {
            Ok(0) => return Err(FgkError::TruncatedHeader { found }.into()),
            Ok(n) => found += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(u32::from_le_bytes(buf))
}
