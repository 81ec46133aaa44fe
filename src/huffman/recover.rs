//! Tree recovery: the inverse of `builder`. Consumes the
//! preorder tree description from the bit stream and produces a
//! `DecodeTree` with its node pool and 256-entry LUT populated.

use super::{DecodeTree, LutEntry, Node, MAX_TREE_NODES};
use crate::bitio::BitReader;
use crate::error::{Error, Result};

pub fn recover_tree(reader: &mut BitReader) -> Result<DecodeTree> {
    let mut nodes: Vec<Node> = Vec::new();
    let root = recover_node(reader, &mut nodes)?;
    let mut decode_lut = [LutEntry::default(); 256];
    populate_lut(&nodes, root, 0, 0, &mut decode_lut);
    Ok(DecodeTree { nodes, root, decode_lut })
}

fn recover_node(reader: &mut BitReader, nodes: &mut Vec<Node>) -> Result<u16> {
    if nodes.len() >= MAX_TREE_NODES {
        return Err(Error::TreeTooLarge);
    }
    let flag = reader.read_bit_checked();
    if reader.has_failed() {
        return Err(Error::TruncatedInput);
    }
    if flag == 1 {
        let symbol = reader.read_bits_checked(9);
        if reader.has_failed() {
            return Err(Error::TruncatedInput);
        }
        if symbol > 260 {
            return Err(Error::SymbolOutOfRange);
        }
        let idx = nodes.len() as u16;
        nodes.push(Node::leaf(symbol as u16));
        Ok(idx)
    } else {
        // Reserve this node's slot before recursing so sibling subtrees
        // see an accurate node count against MAX_TREE_NODES.
        let idx = nodes.len() as u16;
        nodes.push(Node::internal(super::NO_CHILD, super::NO_CHILD));
        let child_a = recover_node(reader, nodes)?;
        let child_b = recover_node(reader, nodes)?;
        nodes[idx as usize] = Node::internal(child_a, child_b);
        Ok(idx)
    }
}

/// Mirrors the encoder's code-assignment walk (`builder::assign_codes`)
/// to fill the direct lookup table. `bits` beyond 8 no longer affects any
/// LUT entry, so `code` is never shifted past bit 8 to avoid overflow on
/// pathological trees deep enough that a literal `1 << bits` would not
/// fit in a `u32` (bounded by `MAX_TREE_NODES`, so at most ~260 levels).
fn populate_lut(nodes: &[Node], idx: u16, code: u32, bits: u32, lut: &mut [LutEntry; 256]) {
    let node = &nodes[idx as usize];
    if let Some(symbol) = node.symbol {
        let effective_bits = bits.max(1) as u8;
        if bits <= 8 {
            let count = 256usize >> bits;
            for i in 0..count {
                let index = (i << bits) | code as usize;
                lut[index] = LutEntry { node: None, bits: effective_bits, symbol };
            }
        }
    } else {
        if bits == 8 {
            lut[code as usize] = LutEntry { node: Some(idx), bits: 8, symbol: 0 };
        }
        let (code_a, code_b) = if bits < 8 { (code, code | (1u32 << bits)) } else { (0, 0) };
        populate_lut(nodes, node.child_a, code_a, bits + 1, lut);
        populate_lut(nodes, node.child_b, code_b, bits + 1, lut);
    }
}
