//! # HZR
//!
//! A lossless, block-structured compression codec pairing canonical Huffman
//! coding with a zero-run RLE extension. Targets entropy-reduced payloads —
//! predictor residuals, quantized transform coefficients — where many bytes
//! are zero and the rest cluster near small magnitudes, trading a modest
//! compression ratio for very high, symmetric throughput.
//!
//! The three entry points operate on caller-provided buffers with no
//! internal allocation escaping a single call:
//!
//! ```rs
//! use hzr::*;
//! let data = b"the quick brown fox jumps over the lazy dog";
//! let mut compressed = vec![0u8; max_compressed_size(data.len() as u64) as usize];
//! let n = encode(data, &mut compressed).expect("encode failed");
//! let compressed = &compressed[..n];
//! let decoded_size = verify(compressed).expect("corrupt stream");
//! let mut restored = vec![0u8; decoded_size as usize];
//! decode(compressed, &mut restored).expect("decode failed");
//! assert_eq!(restored, data);
//! ```

mod bitio;
mod block;
mod container;
mod crc;
pub mod error;
mod huffman;
mod rle;

pub use container::{decode, encode, max_compressed_size, verify};
pub use error::Error;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_example_round_trips() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let mut compressed = vec![0u8; max_compressed_size(data.len() as u64) as usize];
        let n = encode(data, &mut compressed).unwrap();
        let compressed = &compressed[..n];
        let decoded_size = verify(compressed).unwrap();
        let mut restored = vec![0u8; decoded_size as usize];
        decode(compressed, &mut restored).unwrap();
        assert_eq!(restored, data);
    }
}
