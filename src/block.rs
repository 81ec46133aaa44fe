//! Block encoder / decoder.
//!
//! A block is at most `MAX_BLOCK_SIZE` decoded bytes, framed by its own
//! 7-byte header (`encoded_size - 1`, CRC-32C, mode) and independently
//! decodable. The encoder picks among three encodings — Huffman+RLE,
//! plain copy, constant fill — falling back toward the cheaper ones on
//! overflow; the decoder runs a fast LUT-driven inner loop while a 10-byte
//! safety margin remains, then a checked tail loop for the remainder.

use crate::bitio::{BitReader, BitWriter};
use crate::crc;
use crate::error::{Error, Result};
use crate::huffman::{self, DecodeTree, SymbolInfo, NUM_SYMBOLS};
use crate::rle;

pub const MAX_BLOCK_SIZE: usize = 65536;
pub const BLOCK_HEADER_SIZE: usize = 7;
/// Fast-loop safety margin: 6 bytes for the worst-case symbol + RLE suffix,
/// plus 4 bytes of bit-cache look-ahead.
const SAFETY_MARGIN: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EncodingMode {
    Copy = 0,
    HuffRle = 1,
    Fill = 2,
}

impl EncodingMode {
    fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(EncodingMode::Copy),
            1 => Ok(EncodingMode::HuffRle),
            2 => Ok(EncodingMode::Fill),
            _ => Err(Error::InvalidMode),
        }
    }
}

pub struct BlockHeader {
    pub encoded_size: usize,
    pub crc32c: u32,
    pub mode: EncodingMode,
}

pub fn read_header(bytes: &[u8; BLOCK_HEADER_SIZE]) -> Result<BlockHeader> {
    let size_minus_1 = u16::from_le_bytes([bytes[0], bytes[1]]);
    let crc32c = u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
    let mode = EncodingMode::from_byte(bytes[6])?;
    Ok(BlockHeader { encoded_size: size_minus_1 as usize + 1, crc32c, mode })
}

fn write_header(bytes: &mut [u8], encoded_size: usize, crc32c: u32, mode: EncodingMode) {
    debug_assert!((1..=MAX_BLOCK_SIZE).contains(&encoded_size));
    let size_minus_1 = (encoded_size - 1) as u16;
    bytes[0..2].copy_from_slice(&size_minus_1.to_le_bytes());
    bytes[2..6].copy_from_slice(&crc32c.to_le_bytes());
    bytes[6] = mode as u8;
}

/// Encodes one block of `input` (`1..=MAX_BLOCK_SIZE` bytes) into `out`,
/// writing the 7-byte header followed by the chosen payload. Returns the
/// total number of bytes written (`BLOCK_HEADER_SIZE + encoded_size`).
pub fn encode_block(input: &[u8], out: &mut [u8]) -> Result<usize> {
    debug_assert!(!input.is_empty() && input.len() <= MAX_BLOCK_SIZE);
    if out.len() < BLOCK_HEADER_SIZE {
        return Err(Error::OutputTooSmall);
    }
    let (header, payload_area) = out.split_at_mut(BLOCK_HEADER_SIZE);
    let (mode, payload_len) = encode_payload(input, payload_area)?;
    let crc32c = crc::crc32c(&payload_area[..payload_len]);
    write_header(header, payload_len, crc32c, mode);
    log::debug!(
        "block encoded: mode={:?} decoded_len={} encoded_len={}",
        mode,
        input.len(),
        payload_len
    );
    Ok(BLOCK_HEADER_SIZE + payload_len)
}

fn encode_payload(input: &[u8], payload_area: &mut [u8]) -> Result<(EncodingMode, usize)> {
    if input.iter().all(|&b| b == input[0]) {
        if payload_area.is_empty() {
            return Err(Error::OutputTooSmall);
        }
        payload_area[0] = input[0];
        return Ok((EncodingMode::Fill, 1));
    }
    if let Some(len) = try_huff_rle(input, payload_area) {
        return Ok((EncodingMode::HuffRle, len));
    }
    log::debug!("block falling back to copy: huffman+rle did not fit");
    if payload_area.len() < input.len() {
        return Err(Error::OutputTooSmall);
    }
    payload_area[..input.len()].copy_from_slice(input);
    Ok((EncodingMode::Copy, input.len()))
}

/// Attempts the Huffman+RLE encoding. Returns `None` (not an `Error`) on
/// any writer overflow or on the payload growing to `>= MAX_BLOCK_SIZE` —
/// This is a non-fatal trigger for the copy fallback, not a failure of the
/// overall `encode` call.
fn try_huff_rle(input: &[u8], payload_area: &mut [u8]) -> Option<usize> {
    let counts = histogram(input);
    let cap = payload_area.len().min(MAX_BLOCK_SIZE);
    let mut writer = BitWriter::new(&mut payload_area[..cap]);
    let infos = huffman::build_and_emit_tree(&counts, &mut writer).ok()?;
    if writer.has_failed() {
        return None;
    }
    emit_symbols(input, &infos, &mut writer);
    writer.force_flush();
    if writer.has_failed() {
        return None;
    }
    let len = writer.bytes_written();
    if len >= MAX_BLOCK_SIZE {
        return None;
    }
    Some(len)
}

/// Classifies `input` into symbol counts exactly as `emit_symbols` will
/// later classify the same bytes, so the Huffman code is trained on the
/// token stream that is actually emitted.
fn histogram(input: &[u8]) -> [u32; NUM_SYMBOLS] {
    let mut counts = [0u32; NUM_SYMBOLS];
    let mut i = 0;
    while i < input.len() {
        if input[i] == 0 {
            let run = zero_run_len(input, i);
            let (symbol, _) = rle::classify_run(run as u32);
            counts[symbol as usize] += 1;
            i += run;
        } else {
            counts[input[i] as usize] += 1;
            i += 1;
        }
    }
    counts
}

fn zero_run_len(input: &[u8], start: usize) -> usize {
    let cap = (rle::MAX_RUN_LEN as usize).min(input.len() - start);
    let mut len = 0;
    while len < cap && input[start + len] == 0 {
        len += 1;
    }
    len
}

fn emit_symbols(input: &[u8], infos: &[SymbolInfo; NUM_SYMBOLS], writer: &mut BitWriter) {
    let mut i = 0;
    while i < input.len() {
        if writer.has_failed() {
            return;
        }
        if input[i] == 0 {
            let run = zero_run_len(input, i);
            let (symbol, extra) = rle::classify_run(run as u32);
            let info = &infos[symbol as usize];
            writer.write_bits(info.code, info.bits as u32);
            rle::write_suffix(writer, extra);
            i += run;
        } else {
            let info = &infos[input[i] as usize];
            writer.write_bits(info.code, info.bits as u32);
            i += 1;
        }
    }
}

/// Decodes one block's payload into `out`, which must be exactly the
/// block's decoded length.
pub fn decode_block(payload: &[u8], mode: EncodingMode, out: &mut [u8]) -> Result<()> {
    match mode {
        EncodingMode::Copy => {
            if payload.len() != out.len() {
                return Err(Error::EncodedSizePastEnd);
            }
            out.copy_from_slice(payload);
            Ok(())
        }
        EncodingMode::Fill => {
            if payload.len() != 1 {
                return Err(Error::EncodedSizePastEnd);
            }
            out.fill(payload[0]);
            Ok(())
        }
        EncodingMode::HuffRle => huff_rle_decode(payload, out),
    }
}

fn huff_rle_decode(payload: &[u8], out: &mut [u8]) -> Result<()> {
    let mut reader = BitReader::new(payload);
    let tree = huffman::recover_tree(&mut reader)?;
    let mut out_pos = 0usize;
    while out_pos < out.len() && reader.bits_remaining() / 8 >= SAFETY_MARGIN {
        decode_one_fast(&mut reader, &tree, out, &mut out_pos)?;
    }
    while out_pos < out.len() {
        decode_one_checked(&mut reader, &tree, out, &mut out_pos)?;
    }
    Ok(())
}

fn decode_one_fast(
    reader: &mut BitReader,
    tree: &DecodeTree,
    out: &mut [u8],
    out_pos: &mut usize,
) -> Result<()> {
    let entry = tree.decode_lut[reader.peek8() as usize];
    let symbol = match entry.node {
        None => {
            reader.advance(entry.bits as u32);
            entry.symbol
        }
        Some(node_idx) => {
            reader.advance(8);
            walk_to_leaf(reader, &tree.nodes, node_idx)
        }
    };
    write_decoded_symbol(reader, symbol, out, out_pos, false)
}

fn walk_to_leaf(reader: &mut BitReader, nodes: &[huffman::Node], mut idx: u16) -> u16 {
    loop {
        let node = &nodes[idx as usize];
        if let Some(symbol) = node.symbol {
            return symbol;
        }
        idx = if reader.read_bit() == 0 { node.child_a } else { node.child_b };
    }
}

fn decode_one_checked(
    reader: &mut BitReader,
    tree: &DecodeTree,
    out: &mut [u8],
    out_pos: &mut usize,
) -> Result<()> {
    // The degenerate single-symbol tree never advances past the root via
    // its (nonexistent) children, so it needs its own one-bit-per-symbol
    // rule here; the fast loop's LUT already encodes this uniformly, but a
    // checked root-is-leaf walk must not skip the read.
    if tree.is_single_symbol() {
        reader.advance_checked(1);
        if reader.has_failed() {
            return Err(Error::TruncatedInput);
        }
        let symbol = tree.nodes[tree.root as usize].symbol.expect("checked above");
        return write_decoded_symbol(reader, symbol, out, out_pos, true);
    }
    let mut idx = tree.root;
    loop {
        let node = &tree.nodes[idx as usize];
        if let Some(symbol) = node.symbol {
            return write_decoded_symbol(reader, symbol, out, out_pos, true);
        }
        let bit = reader.read_bit_checked();
        if reader.has_failed() {
            return Err(Error::TruncatedInput);
        }
        idx = if bit == 0 { node.child_a } else { node.child_b };
    }
}

fn write_decoded_symbol(
    reader: &mut BitReader,
    symbol: u16,
    out: &mut [u8],
    out_pos: &mut usize,
    checked: bool,
) -> Result<()> {
    if symbol < 256 {
        if *out_pos >= out.len() {
            return Err(Error::OutputOverflow);
        }
        out[*out_pos] = symbol as u8;
        *out_pos += 1;
        return Ok(());
    }
    if !rle::is_rle_token(symbol) {
        return Err(Error::SymbolOutOfRange);
    }
    let run = if checked {
        let run = rle::decode_run_checked(reader, symbol);
        if reader.has_failed() {
            return Err(Error::TruncatedInput);
        }
        run
    } else {
        rle::decode_run_unchecked(reader, symbol)
    } as usize;
    let end = *out_pos + run;
    if end > out.len() {
        return Err(Error::OutputOverflow);
    }
    out[*out_pos..end].fill(0);
    *out_pos = end;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(input: &[u8]) {
        let mut out = vec![0u8; BLOCK_HEADER_SIZE + MAX_BLOCK_SIZE];
        let written = encode_block(input, &mut out).unwrap();
        let header_bytes: [u8; BLOCK_HEADER_SIZE] = out[0..BLOCK_HEADER_SIZE].try_into().unwrap();
        let header = read_header(&header_bytes).unwrap();
        assert_eq!(BLOCK_HEADER_SIZE + header.encoded_size, written);
        let payload = &out[BLOCK_HEADER_SIZE..written];
        assert_eq!(crc::crc32c(payload), header.crc32c);
        let mut decoded = vec![0u8; input.len()];
        decode_block(payload, header.mode, &mut decoded).unwrap();
        assert_eq!(decoded, input);
    }

    #[test]
    fn constant_block_selects_fill() {
        let input = vec![0x37u8; 4096];
        let mut out = vec![0u8; BLOCK_HEADER_SIZE + MAX_BLOCK_SIZE];
        let written = encode_block(&input, &mut out).unwrap();
        let header_bytes: [u8; BLOCK_HEADER_SIZE] = out[0..BLOCK_HEADER_SIZE].try_into().unwrap();
        let header = read_header(&header_bytes).unwrap();
        assert_eq!(header.mode, EncodingMode::Fill);
        assert_eq!(written, BLOCK_HEADER_SIZE + 1);
        roundtrip(&input);
    }

    #[test]
    fn zero_block_selects_fill_with_zero_value() {
        roundtrip(&vec![0u8; 5000]);
    }

    #[test]
    fn single_byte_block() {
        roundtrip(&[7u8]);
        roundtrip(&[0u8]);
    }

    #[test]
    fn mixed_content_selects_huff_rle() {
        let input: Vec<u8> = (0..500u32).map(|i| (i & 255) as u8).collect();
        let mut out = vec![0u8; BLOCK_HEADER_SIZE + MAX_BLOCK_SIZE];
        let written = encode_block(&input, &mut out).unwrap();
        let header_bytes: [u8; BLOCK_HEADER_SIZE] = out[0..BLOCK_HEADER_SIZE].try_into().unwrap();
        let header = read_header(&header_bytes).unwrap();
        assert_eq!(header.mode, EncodingMode::HuffRle);
        let _ = written;
        roundtrip(&input);
    }

    #[test]
    fn half_zero_half_ramp() {
        let mut input = vec![0u8; 4096];
        input.extend((0..4096u32).map(|i| (i & 255) as u8));
        roundtrip(&input);
    }

    #[test]
    fn long_zero_run_uses_largest_rle_token() {
        // A uniformly-zero buffer would take the FILL branch and never
        // touch the Huffman+RLE path at all; a trailing non-zero byte
        // forces the block through `try_huff_rle` so the tree actually
        // gets a `kSymUpTo16662Zeros` leaf.
        let mut input = vec![0u8; rle::MAX_RUN_LEN as usize];
        input.push(7);
        let mut out = vec![0u8; BLOCK_HEADER_SIZE + MAX_BLOCK_SIZE];
        encode_block(&input, &mut out).unwrap();
        let header_bytes: [u8; BLOCK_HEADER_SIZE] = out[0..BLOCK_HEADER_SIZE].try_into().unwrap();
        let header = read_header(&header_bytes).unwrap();
        assert_eq!(header.mode, EncodingMode::HuffRle);
        roundtrip(&input);
    }

    #[test]
    fn zero_run_longer_than_max_splits_into_two_rle_tokens() {
        // A run past MAX_RUN_LEN must be emitted as two consecutive
        // `kSymUpTo16662Zeros` tokens; again a trailing non-zero byte
        // keeps the block out of FILL so the RLE path is actually used.
        let mut input = vec![0u8; rle::MAX_RUN_LEN as usize + 400];
        input.push(7);
        let mut out = vec![0u8; BLOCK_HEADER_SIZE + MAX_BLOCK_SIZE];
        encode_block(&input, &mut out).unwrap();
        let header_bytes: [u8; BLOCK_HEADER_SIZE] = out[0..BLOCK_HEADER_SIZE].try_into().unwrap();
        let header = read_header(&header_bytes).unwrap();
        assert_eq!(header.mode, EncodingMode::HuffRle);
        roundtrip(&input);
    }

    #[test]
    fn tamper_breaks_crc_check() {
        let input: Vec<u8> = (0..4096u32).map(|i| ((i * 37) & 255) as u8).collect();
        let mut out = vec![0u8; BLOCK_HEADER_SIZE + MAX_BLOCK_SIZE];
        let written = encode_block(&input, &mut out).unwrap();
        let header_bytes: [u8; BLOCK_HEADER_SIZE] = out[0..BLOCK_HEADER_SIZE].try_into().unwrap();
        let header = read_header(&header_bytes).unwrap();
        out[BLOCK_HEADER_SIZE] ^= 0x01;
        let payload = &out[BLOCK_HEADER_SIZE..written];
        assert_ne!(crc::crc32c(payload), header.crc32c);
    }
}
