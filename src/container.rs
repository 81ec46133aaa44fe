//! Container format: a 4-byte master header followed by a sequence of
//! independently framed blocks. This module owns the
//! three public entry points (`encode`, `verify`, `decode`) plus the
//! worst-case size estimate callers use to size an output buffer.

use crate::block::{self, BlockHeader, EncodingMode, BLOCK_HEADER_SIZE, MAX_BLOCK_SIZE};
use crate::crc;
use crate::error::{Error, Result};

const MASTER_HEADER_SIZE: usize = 4;

/// Upper bound on the encoded size of `n_uncompressed` decoded bytes,
/// assuming every block lands in its worst case: a full header plus a
/// complete `MAX_BLOCK_SIZE` payload.
pub fn max_compressed_size(n_uncompressed: u64) -> u64 {
    if n_uncompressed == 0 {
        return MASTER_HEADER_SIZE as u64;
    }
    let num_blocks = (n_uncompressed + MAX_BLOCK_SIZE as u64 - 1) / MAX_BLOCK_SIZE as u64;
    MASTER_HEADER_SIZE as u64 + num_blocks * (BLOCK_HEADER_SIZE as u64 + MAX_BLOCK_SIZE as u64)
}

/// Encodes the whole of `input` into `output`, returning the number of
/// bytes written. `output` must be at least `max_compressed_size(input.len())`.
pub fn encode(input: &[u8], output: &mut [u8]) -> Result<usize> {
    if input.len() as u64 > u32::MAX as u64 {
        return Err(Error::InputTooLarge);
    }
    if output.len() < MASTER_HEADER_SIZE {
        return Err(Error::OutputTooSmall);
    }
    output[0..MASTER_HEADER_SIZE].copy_from_slice(&(input.len() as u32).to_le_bytes());

    let mut in_pos = 0usize;
    let mut out_pos = MASTER_HEADER_SIZE;
    while in_pos < input.len() {
        let chunk_len = (input.len() - in_pos).min(MAX_BLOCK_SIZE);
        let chunk = &input[in_pos..in_pos + chunk_len];
        let written = block::encode_block(chunk, &mut output[out_pos..])?;
        out_pos += written;
        in_pos += chunk_len;
    }
    log::debug!("encoded {} byte(s) into {} byte(s)", input.len(), out_pos);
    Ok(out_pos)
}

/// Validates `input` as a complete, well-formed HZR stream without
/// producing any decoded output, returning the declared decoded size on
/// success.
pub fn verify(input: &[u8]) -> Result<u64> {
    let decoded_size = read_master_header(input)?;
    let mut remaining = decoded_size;
    let mut in_pos = MASTER_HEADER_SIZE;
    while remaining > 0 {
        log::trace!("verify: block at offset {}, {} byte(s) remaining", in_pos, remaining);
        let (header, payload) = read_block(input, in_pos)?;
        check_payload_crc(&header, payload)?;
        let chunk_len = remaining.min(MAX_BLOCK_SIZE as u64);
        check_payload_shape(&header, payload, chunk_len)?;
        in_pos += BLOCK_HEADER_SIZE + header.encoded_size;
        remaining -= chunk_len;
    }
    if in_pos != input.len() {
        return Err(Error::EncodedSizePastEnd);
    }
    Ok(decoded_size)
}

/// Decodes `input` into `output`, which must be exactly as large as the
/// master header's declared decoded size.
/// Every block's CRC is checked before it is expanded.
pub fn decode(input: &[u8], output: &mut [u8]) -> Result<()> {
    let decoded_size = read_master_header(input)?;
    if (output.len() as u64) < decoded_size {
        return Err(Error::OutputTooSmall);
    }
    let mut remaining = decoded_size;
    let mut in_pos = MASTER_HEADER_SIZE;
    let mut out_pos = 0usize;
    while remaining > 0 {
        log::trace!("decode: block at offset {}, {} byte(s) remaining", in_pos, remaining);
        let (header, payload) = read_block(input, in_pos)?;
        check_payload_crc(&header, payload)?;
        let chunk_len = remaining.min(MAX_BLOCK_SIZE as u64) as usize;
        block::decode_block(payload, header.mode, &mut output[out_pos..out_pos + chunk_len])?;
        in_pos += BLOCK_HEADER_SIZE + header.encoded_size;
        out_pos += chunk_len;
        remaining -= chunk_len as u64;
    }
    if in_pos != input.len() {
        return Err(Error::EncodedSizePastEnd);
    }
    Ok(())
}

fn read_master_header(input: &[u8]) -> Result<u64> {
    if input.len() < MASTER_HEADER_SIZE {
        return Err(Error::InputTooShort);
    }
    let bytes: [u8; MASTER_HEADER_SIZE] = input[0..MASTER_HEADER_SIZE].try_into().unwrap();
    Ok(u32::from_le_bytes(bytes) as u64)
}

/// Reads the 7-byte block header at `pos` and returns it along with its
/// payload slice, bounds-checking the declared `encoded_size` against
/// what actually remains in `input`.
fn read_block<'a>(input: &'a [u8], pos: usize) -> Result<(BlockHeader, &'a [u8])> {
    if input.len() < pos + BLOCK_HEADER_SIZE {
        return Err(Error::TruncatedInput);
    }
    let header_bytes: [u8; BLOCK_HEADER_SIZE] =
        input[pos..pos + BLOCK_HEADER_SIZE].try_into().unwrap();
    let header = match block::read_header(&header_bytes) {
        Ok(header) => header,
        Err(e) => {
            log::warn!("block at offset {} has an invalid header: {}", pos, e);
            return Err(e);
        }
    };
    let payload_start = pos + BLOCK_HEADER_SIZE;
    let payload_end = payload_start + header.encoded_size;
    if payload_end > input.len() {
        log::warn!(
            "block at offset {} declares encoded_size {} reaching past input end ({} byte(s) available)",
            pos,
            header.encoded_size,
            input.len() - payload_start.min(input.len())
        );
        return Err(Error::EncodedSizePastEnd);
    }
    Ok((header, &input[payload_start..payload_end]))
}

fn check_payload_crc(header: &BlockHeader, payload: &[u8]) -> Result<()> {
    let actual = crc::crc32c(payload);
    if actual != header.crc32c {
        log::warn!(
            "block CRC mismatch: header declares {:#010x}, payload computes {:#010x}",
            header.crc32c,
            actual
        );
        return Err(Error::ChecksumMismatch);
    }
    Ok(())
}

/// Structural sanity check independent of CRC: COPY and FILL payloads have
/// a length implied directly by the mode, so a corrupt header claiming
/// the wrong mode for the wrong payload length is caught even on the rare
/// chance its CRC still happens to match.
fn check_payload_shape(header: &BlockHeader, payload: &[u8], chunk_len: u64) -> Result<()> {
    match header.mode {
        EncodingMode::Copy => {
            if payload.len() as u64 != chunk_len {
                log::warn!(
                    "COPY block payload length {} does not match expected chunk length {}",
                    payload.len(),
                    chunk_len
                );
                return Err(Error::EncodedSizePastEnd);
            }
        }
        EncodingMode::Fill => {
            if payload.len() != 1 {
                log::warn!("FILL block payload length {} is not 1", payload.len());
                return Err(Error::EncodedSizePastEnd);
            }
        }
        EncodingMode::HuffRle => {}
    }
    Ok(())
}
