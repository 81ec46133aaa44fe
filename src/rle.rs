//! Zero-run length RLE symbol extension.
//!
//! Runs of the byte value zero are folded into the 261-symbol Huffman
//! alphabet: a lone zero uses the literal symbol `0`, and longer runs use
//! one of five tokens (`256..=260`), each carrying a fixed number of extra
//! bits that encode the run length within that token's range. The longest
//! single token covers a run of 16662 zeros; longer runs are split into
//! consecutive tokens by the caller (the block encoder's zero-run scan).

use crate::bitio::{BitReader, BitWriter};

pub const SYM_TWO_ZEROS: u16 = 256;
pub const SYM_UP_TO_6: u16 = 257;
pub const SYM_UP_TO_22: u16 = 258;
pub const SYM_UP_TO_278: u16 = 259;
pub const SYM_UP_TO_16662: u16 = 260;

pub const MAX_RUN_LEN: u32 = 16662;

/// One row of the RLE token table: `symbol` consumes `extra_bits` suffix
/// bits whose unsigned value, plus `base_len`, gives the run length.
struct RleRow {
    symbol: u16,
    extra_bits: u32,
    base_len: u32,
}

const ROWS: [RleRow; 4] = [
    RleRow { symbol: SYM_UP_TO_6, extra_bits: 2, base_len: 3 },
    RleRow { symbol: SYM_UP_TO_22, extra_bits: 4, base_len: 7 },
    RleRow { symbol: SYM_UP_TO_278, extra_bits: 8, base_len: 23 },
    RleRow { symbol: SYM_UP_TO_16662, extra_bits: 14, base_len: 279 },
];

/// Classifies a zero-run of length `len` (`1 <= len <= MAX_RUN_LEN`) into
/// its symbol and, if any, the extra-bits value to follow it.
///
/// Used identically by the histogram pass and the payload emitter so the
/// Huffman code is always trained on the exact token stream later written.
pub fn classify_run(len: u32) -> (u16, Option<(u32, u32)>) {
    debug_assert!((1..=MAX_RUN_LEN).contains(&len));
    if len == 1 {
        return (0, None);
    }
    if len == 2 {
        return (SYM_TWO_ZEROS, None);
    }
    for row in &ROWS {
        let max_len = row.base_len + (1u32 << row.extra_bits) - 1;
        if len <= max_len {
            return (row.symbol, Some((row.extra_bits, len - row.base_len)));
        }
    }
    unreachable!("run length {len} exceeds MAX_RUN_LEN");
}

/// Writes the extra-bits suffix (if any) for an already-emitted RLE symbol.
pub fn write_suffix(writer: &mut BitWriter, extra: Option<(u32, u32)>) {
    if let Some((bits, value)) = extra {
        writer.write_bits(value, bits);
    }
}

/// Number of extra suffix bits that follow RLE token `symbol` (256..=260).
fn extra_bits_for(symbol: u16) -> u32 {
    match symbol {
        SYM_TWO_ZEROS => 0,
        SYM_UP_TO_6 => 2,
        SYM_UP_TO_22 => 4,
        SYM_UP_TO_278 => 8,
        SYM_UP_TO_16662 => 14,
        _ => unreachable!("not an RLE token: {symbol}"),
    }
}

/// Reads an RLE token's suffix bits (using the checked reader, since the
/// tail decode loop is the only caller close to the end of a block) and
/// returns the zero-run length.
pub fn decode_run_checked(reader: &mut BitReader, symbol: u16) -> u32 {
    match symbol {
        SYM_TWO_ZEROS => 2,
        SYM_UP_TO_6 => reader.read_bits_checked(2) + 3,
        SYM_UP_TO_22 => reader.read_bits_checked(4) + 7,
        SYM_UP_TO_278 => reader.read_bits_checked(8) + 23,
        SYM_UP_TO_16662 => reader.read_bits_checked(14) + 279,
        _ => unreachable!("not an RLE token: {symbol}"),
    }
}

/// Unchecked counterpart used by the fast decode loop, which has already
/// established a safety margin sufficient for the worst-case suffix.
pub fn decode_run_unchecked(reader: &mut BitReader, symbol: u16) -> u32 {
    let bits = extra_bits_for(symbol);
    let base = match symbol {
        SYM_TWO_ZEROS => return 2,
        SYM_UP_TO_6 => 3,
        SYM_UP_TO_22 => 7,
        SYM_UP_TO_278 => 23,
        SYM_UP_TO_16662 => 279,
        _ => unreachable!("not an RLE token: {symbol}"),
    };
    reader.read_bits(bits) + base
}

pub fn is_rle_token(symbol: u16) -> bool {
    (SYM_TWO_ZEROS..=SYM_UP_TO_16662).contains(&symbol)
}
