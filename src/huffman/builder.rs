//! Tree builder: histogram → optimal prefix code, plus the preorder
//! emission of the canonical tree description.

use super::{SymbolInfo, NUM_SYMBOLS};
use crate::bitio::BitWriter;
use crate::error::{Error, Result};

/// One slot of the encode-side node pool. Leaves start out as the 261
/// alphabet entries; internal nodes are appended as the merge loop runs.
/// `count == 0` marks a slot that has been consumed by a merge (or was
/// never used), which doubles as the "still eligible" test for the merge
/// loop below — no separate active flag is needed.
struct EncodeNode {
    count: u64,
    symbol: Option<u16>,
    child_a: u32,
    child_b: u32,
}

/// Builds the optimal prefix code for `counts` (indexed by symbol),
/// writes its canonical tree description to `writer`, and returns the
/// per-symbol `(code, bits)` table for the subsequent payload pass.
///
/// Caller contract: `counts` must have at least two distinct symbols with
/// a positive count. The block encoder never calls this otherwise (a
/// single distinct symbol makes the whole block a FILL block instead),
/// but the degenerate single-symbol tree is still implemented here and
/// exercised directly by unit tests, as part of this module's own contract
/// rather than the block encoder's.
pub fn build_and_emit_tree(
    counts: &[u32; NUM_SYMBOLS],
    writer: &mut BitWriter,
) -> Result<[SymbolInfo; NUM_SYMBOLS]> {
    let mut nodes: Vec<EncodeNode> = (0..NUM_SYMBOLS)
        .map(|s| EncodeNode { count: counts[s] as u64, symbol: Some(s as u16), child_a: 0, child_b: 0 })
        .collect();
    let mut active = counts.iter().filter(|&&c| c > 0).count();

    while active > 1 {
        let (i1, i2) = two_smallest(&nodes);
        let combined = EncodeNode {
            count: nodes[i1].count + nodes[i2].count,
            symbol: None,
            child_a: i1 as u32,
            child_b: i2 as u32,
        };
        nodes[i1].count = 0;
        nodes[i2].count = 0;
        nodes.push(combined);
        active -= 1;
    }

    let root = (nodes.len() - 1) as u32;
    let mut infos = [SymbolInfo::default(); NUM_SYMBOLS];
    for s in 0..NUM_SYMBOLS {
        infos[s].count = counts[s];
    }
    assign_codes(&nodes, root, 0, 0, &mut infos);
    emit_node(&nodes, root, writer)?;
    Ok(infos)
}

/// Finds the two lowest-count eligible (`count > 0`) nodes, earliest index
/// wins ties, for deterministic output given a fixed input histogram.
fn two_smallest(nodes: &[EncodeNode]) -> (usize, usize) {
    let mut i1 = usize::MAX;
    let mut i2 = usize::MAX;
    for (i, n) in nodes.iter().enumerate() {
        if n.count == 0 {
            continue;
        }
        if i1 == usize::MAX || n.count < nodes[i1].count {
            i2 = i1;
            i1 = i;
        } else if i2 == usize::MAX || n.count < nodes[i2].count {
            i2 = i;
        }
    }
    (i1, i2)
}

fn assign_codes(
    nodes: &[EncodeNode],
    idx: u32,
    code: u32,
    bits: u8,
    infos: &mut [SymbolInfo; NUM_SYMBOLS],
) {
    let node = &nodes[idx as usize];
    if let Some(symbol) = node.symbol {
        // A root that is itself a leaf (the degenerate single-symbol
        // tree) has bits == 0 by this formula; the encoder must still
        // write one bit per occurrence, matching the decoder's LUT
        // (populated with the same max(bits, 1) rule, see recover.rs).
        infos[symbol as usize].code = code;
        infos[symbol as usize].bits = bits.max(1);
    } else {
        assign_codes(nodes, node.child_a, code, bits + 1, infos);
        assign_codes(nodes, node.child_b, code | (1 << bits), bits + 1, infos);
    }
}

fn emit_node(nodes: &[EncodeNode], idx: u32, writer: &mut BitWriter) -> Result<()> {
    let node = &nodes[idx as usize];
    if let Some(symbol) = node.symbol {
        writer.write_bits(1, 1);
        writer.write_bits(symbol as u32, 9);
    } else {
        writer.write_bits(0, 1);
        emit_node(nodes, node.child_a, writer)?;
        emit_node(nodes, node.child_b, writer)?;
    }
    if writer.has_failed() {
        return Err(Error::OutputOverflow);
    }
    Ok(())
}
