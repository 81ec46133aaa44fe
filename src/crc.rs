//! CRC-32C integrity check.
//!
//! The CRC primitive is treated as an external collaborator: the core only
//! depends on its contract, `crc32c(buf) -> u32`. We delegate to the
//! `crc32c` crate, which dispatches to SSE4.2 / ARMv8 CRC32 hardware
//! instructions when available and falls back to a software table
//! otherwise.

pub fn crc32c(buf: &[u8]) -> u32 {
    crc32c::crc32c(buf)
}
