/// Compression and decompression driver.
///
/// [`Encoder`] and [`Decoder`] are the per-symbol context objects: each owns
/// its own tree and bit channel, so independent runs never share state.
/// [`compress`] and [`decompress`] drive them over whole streams and handle
/// the container header.
///
/// **Bit-order probing.** The container does not record the bit order of
/// the payload. Before decoding, [`detect_bit_order`] walks a fresh tree
/// under each candidate order (MSB-first, then LSB-first) and accepts the
/// first one whose walk ends on the NYT, the only possible target of a
/// stream's first code. Writers only ever produce MSB-first; the probe
/// exists for compatibility with files whose order is unknown.
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};

use crate::bitio::{BitOrder, BitReader, BitWriter};
use crate::container::{self, HEADER_LEN};
use crate::observer::{NoopObserver, TreeObserver};
use crate::tree::{AdaptiveTree, NodeId};
use crate::{FgkError, StreamResult};

/// Default number of branch decisions inspected while probing the bit order.
pub const DEFAULT_PROBE_DEPTH: usize = 20;

/// Options controlling decompression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecompressOptions {
    /// Bit order of the payload; `None` probes for it.
    pub bit_order: Option<BitOrder>,
    /// Maximum tree depth walked per probe.
    pub probe_depth: usize,
}

impl Default for DecompressOptions {
    fn default() -> Self {
        DecompressOptions {
            bit_order: None,
            probe_depth: DEFAULT_PROBE_DEPTH,
        }
    }
}

impl DecompressOptions {
    /// Skip probing and read the payload in `order`.
    pub fn with_bit_order(mut self, order: BitOrder) -> Self {
        self.bit_order = Some(order);
        self
    }

    pub fn with_probe_depth(mut self, depth: usize) -> Self {
        self.probe_depth = depth;
        self
    }
}

// ---------------------------------------------------------------------------
// Symbol-level encoder / decoder
// ---------------------------------------------------------------------------

/// Adaptive Huffman encoder writing MSB-first into `W`.
pub struct Encoder<W: Write, O: TreeObserver = NoopObserver> {
    tree: AdaptiveTree,
    writer: BitWriter<W>,
    observer: O,
    path: Vec<bool>,
}

impl<W: Write> Encoder<W> {
    pub fn new(sink: W) -> Self {
        Self::with_observer(sink, NoopObserver)
    }
}

impl<W: Write, O: TreeObserver> Encoder<W, O> {
    pub fn with_observer(sink: W, mut observer: O) -> Self {
        let mut tree = AdaptiveTree::new();
        tree.reset_observed(&mut observer);
        Encoder {
            tree,
            writer: BitWriter::new(sink),
            observer,
            path: Vec::with_capacity(64),
        }
    }

    /// Emit the code for `symbol` and update the tree.
    ///
    /// A symbol seen for the first time is escaped: the NYT code followed by
    /// its 8 raw bits.
    pub fn encode(&mut self, symbol: u8) -> StreamResult<()> {
        self.path.clear();
        let leaf = match self.tree.leaf(symbol) {
            Some(leaf) => {
                self.tree.path_to(leaf, &mut self.path)?;
                self.writer.write_path(&self.path)?;
                leaf
            }
            None => {
                let nyt = self.tree.nyt().ok_or(FgkError::AlphabetExhausted)?;
                self.tree.path_to(nyt, &mut self.path)?;
                self.writer.write_path(&self.path)?;
                self.writer.write_bits(symbol as u32, 8)?;
                self.tree.split_nyt_observed(symbol, &mut self.observer)?
            }
        };
        self.tree.update_observed(leaf, &mut self.observer)?;
        Ok(())
    }

    pub fn tree(&self) -> &AdaptiveTree {
        &self.tree
    }

    /// Payload bytes written so far, excluding a pending partial byte.
    pub fn bytes_written(&self) -> u64 {
        self.writer.bytes_written()
    }

    /// Pad and flush the final byte. Returns the sink and the total number
    /// of payload bytes written.
    pub fn finish(mut self) -> StreamResult<(W, u64)> {
        self.observer.on_finish(&self.tree);
        Ok(self.writer.finish()?)
    }
}

/// Adaptive Huffman decoder reading from `R`.
pub struct Decoder<R: Read, O: TreeObserver = NoopObserver> {
    tree: AdaptiveTree,
    reader: BitReader<R>,
    observer: O,
}

impl<R: Read> Decoder<R> {
    pub fn new(source: R, order: BitOrder) -> Self {
        Self::with_observer(source, order, NoopObserver)
    }
}

impl<R: Read, O: TreeObserver> Decoder<R, O> {
    pub fn with_observer(source: R, order: BitOrder, mut observer: O) -> Self {
        let mut tree = AdaptiveTree::new();
        tree.reset_observed(&mut observer);
        Decoder {
            tree,
            reader: BitReader::new(source, order),
            observer,
        }
    }

    /// Decode one symbol and update the tree.
    ///
    /// Returns `Ok(None)` if the bit stream ends before a full code.
    pub fn decode(&mut self) -> StreamResult<Option<u8>> {
        let mut node = self.tree.root();
        while !self.tree[node].is_leaf() {
            let Some(bit) = self.reader.read_bit()? else {
                return Ok(None);
            };
            node = bit_child(&self.tree, node, bit)?;
        }

        let (symbol, leaf) = if Some(node) == self.tree.nyt() {
            let Some(raw) = self.reader.read_bits(8)? else {
                return Ok(None);
            };
            let symbol = raw as u8;
            (symbol, self.tree.split_nyt_observed(symbol, &mut self.observer)?)
        } else {
            match self.tree[node].symbol() {
                Some(symbol) => (symbol, node),
                None => return Err(FgkError::InvalidCode.into()),
            }
        };
        self.tree.update_observed(leaf, &mut self.observer)?;
        Ok(Some(symbol))
    }

    pub fn tree(&self) -> &AdaptiveTree {
        &self.tree
    }

    /// Notify the observer that decoding is over and return the source.
    pub fn finish(mut self) -> R {
        self.observer.on_finish(&self.tree);
        self.reader.into_inner()
    }
}

fn bit_child(tree: &AdaptiveTree, node: NodeId, bit: bool) -> StreamResult<NodeId> {
    tree[node]
        .child(bit)
        .ok_or_else(|| FgkError::InvalidNode(node.index()).into())
}

// ---------------------------------------------------------------------------
// Bit-order detection
// ---------------------------------------------------------------------------

/// Walk `tree` from the root following bits from `reader`, for at most
/// `max_depth` steps, and report whether the walk ends on the NYT.
pub(crate) fn reaches_nyt<R: Read>(
    tree: &AdaptiveTree,
    reader: &mut BitReader<R>,
    max_depth: usize,
) -> StreamResult<bool> {
    let mut node = tree.root();
    let mut depth = 0;
    while !tree[node].is_leaf() && depth < max_depth {
        let Some(bit) = reader.read_bit()? else {
            return Ok(false);
        };
        node = bit_child(tree, node, bit)?;
        depth += 1;
    }
    Ok(tree.nyt() == Some(node))
}

/// Determine the bit order of the payload starting at byte offset `start`.
///
/// The first code of any stream targets the NYT, and on a fresh tree the NYT
/// is the root, so the MSB-first probe always succeeds and
/// [`FgkError::UnknownBitOrder`] is never returned in practice.
///
/// Leaves the source positioned at an unspecified offset.
pub fn detect_bit_order<R: Read + Seek>(
    source: &mut R,
    start: u64,
    probe_depth: usize,
) -> StreamResult<BitOrder> {
    let tree = AdaptiveTree::new();
    for order in BitOrder::PROBE_SEQUENCE {
        source.seek(SeekFrom::Start(start))?;
        let mut reader = BitReader::new(&mut *source, order);
        if reaches_nyt(&tree, &mut reader, probe_depth)? {
            return Ok(order);
        }
    }
    Err(FgkError::UnknownBitOrder.into())
}

// ---------------------------------------------------------------------------
// Whole-stream compression
// ---------------------------------------------------------------------------

/// Compress everything from the current position of `source` to its end.
///
/// Returns the total number of bytes written to `sink`, header included.
/// Nothing is written to `sink` unless the whole source was encoded.
pub fn compress<R: Read + Seek, W: Write>(source: R, sink: W) -> StreamResult<u64> {
    compress_observed(source, sink, NoopObserver)
}

/// [`compress`] with a tree observer attached.
pub fn compress_observed<R, W, O>(mut source: R, sink: W, observer: O) -> StreamResult<u64>
where
    R: Read + Seek,
    W: Write,
    O: TreeObserver,
{
    let start = source.stream_position()?;
    let end = source.seek(SeekFrom::End(0))?;
    source.seek(SeekFrom::Start(start))?;
    let remaining = end.saturating_sub(start);
    let declared = u32::try_from(remaining).map_err(|_| FgkError::InputTooLarge(remaining))?;
    tracing::debug!(input_len = declared, "compressing");

    // The payload is held back until the byte count matches the header.
    let mut encoder = Encoder::with_observer(Vec::new(), observer);
    let mut actual = 0u64;
    for byte in BufReader::new(source).bytes() {
        encoder.encode(byte?)?;
        actual += 1;
    }
    if actual != declared as u64 {
        return Err(FgkError::LengthMismatch { declared, actual }.into());
    }

    let distinct = encoder.tree().symbol_count();
    let (payload, payload_len) = encoder.finish()?;

    let mut sink = BufWriter::new(sink);
    container::write_header(&mut sink, declared)?;
    sink.write_all(&payload)?;
    sink.flush()?;
    let written = HEADER_LEN as u64 + payload_len;
    tracing::debug!(input_len = declared, distinct, written, "compressed");
    Ok(written)
}

/// Decompress a container read from `source` into `sink`.
///
/// Returns the number of decoded bytes. On error, `sink` may already hold
/// part of the output.
pub fn decompress<R: Read + Seek, W: Write>(source: R, sink: W) -> StreamResult<u64> {
    decompress_with_options(source, sink, &DecompressOptions::default(), NoopObserver)
}

/// [`decompress`] with explicit options and a tree observer.
pub fn decompress_with_options<R, W, O>(
    mut source: R,
    sink: W,
    options: &DecompressOptions,
    observer: O,
) -> StreamResult<u64>
where
    R: Read + Seek,
    W: Write,
    O: TreeObserver,
{
    let expected = container::read_header(&mut source)?;
    let payload_start = source.stream_position()?;

    let order = match options.bit_order {
        Some(order) => order,
        None => detect_bit_order(&mut source, payload_start, options.probe_depth)?,
    };
    tracing::debug!(expected, ?order, "decompressing");

    source.seek(SeekFrom::Start(payload_start))?;
    let mut decoder = Decoder::with_observer(BufReader::new(source), order, observer);
    let mut sink = BufWriter::new(sink);
    for decoded in 0..expected {
        match decoder.decode()? {
            Some(symbol) => sink.write_all(&[symbol])?,
            None => {
                sink.flush()?;
                return Err(FgkError::UnexpectedEof { decoded, expected }.into());
            }
        }
    }
    sink.flush()?;
    decoder.finish();
    tracing::debug!(expected, "decompressed");
    Ok(expected as u64)
}

// ---------------------------------------------------------------------------
// In-memory helpers
// ---------------------------------------------------------------------------

/// Compress a byte slice into a new container.
pub fn compress_bytes(input: &[u8]) -> StreamResult<Vec<u8>> {
    let mut out = Vec::with_capacity(HEADER_LEN + input.len() / 2);
    compress(Cursor::new(input), &mut out)?;
    Ok(out)
}

/// Decompress a container held in memory.
pub fn decompress_bytes(input: &[u8]) -> StreamResult<Vec<u8>> {
    let mut out = Vec::new();
    decompress(Cursor::new(input), &mut out)?;
    Ok(out)
}
