//! Morton encoding (Z-order curve) for spatial indexing and implicit tree arithmetic
//!
//! A node at depth `d` is identified by the Morton code of its integer cell
//! coordinates at that depth. Appending three bits selects one of the eight
//! children, dropping three bits yields the parent, so no parent or child
//! pointers need to be stored.

use glam::{IVec3, UVec3};

/// Bits available per axis in a 64-bit code
pub const MORTON_BITS_PER_AXIS: u32 = 21;

/// Spread bits of a 21-bit integer into every third bit of a 64-bit integer
fn spread_bits(x: u32) -> u64 {
    let mut x = x as u64 & 0x1fffff; // 21 bits max
    x = (x | (x << 32)) & 0x1f00000000ffff;
    x = (x | (x << 16)) & 0x1f0000ff0000ff;
    x = (x | (x << 8)) & 0x100f00f00f00f00f;
    x = (x | (x << 4)) & 0x10c30c30c30c30c3;
    x = (x | (x << 2)) & 0x1249249249249249;
    x
}

/// Compact every third bit of a 64-bit integer into a 21-bit integer
fn compact_bits(x: u64) -> u32 {
    let mut x = x & 0x1249249249249249;
    x = (x | (x >> 2)) & 0x10c30c30c30c30c3;
    x = (x | (x >> 4)) & 0x100f00f00f00f00f;
    x = (x | (x >> 8)) & 0x1f0000ff0000ff;
    x = (x | (x >> 16)) & 0x1f00000000ffff;
    x = (x | (x >> 32)) & 0x1fffff;
    x as u32
}

/// Encode 3D coordinates into Morton code (Z-order curve)
/// Each coordinate can be up to 21 bits (0..2097151)
pub fn encode_morton_3d(x: u32, y: u32, z: u32) -> u64 {
    spread_bits(x) | (spread_bits(y) << 1) | (spread_bits(z) << 2)
}

/// Decode Morton code back to 3D coordinates
pub fn decode_morton_3d(code: u64) -> (u32, u32, u32) {
    (
        compact_bits(code),
        compact_bits(code >> 1),
        compact_bits(code >> 2),
    )
}

pub fn encode_coords(coords: UVec3) -> u64 {
    encode_morton_3d(coords.x, coords.y, coords.z)
}

pub fn decode_coords(code: u64) -> UVec3 {
    let (x, y, z) = decode_morton_3d(code);
    UVec3::new(x, y, z)
}

/// Encode signed coordinates if they lie inside a grid of `resolution` cells per axis.
/// Returns None for anything outside `0..resolution`.
pub fn encode_in_grid(coords: IVec3, resolution: u32) -> Option<u64> {
    let res = resolution as i64;
    let inside = |c: i32| (c as i64) >= 0 && (c as i64) < res;
    if inside(coords.x) && inside(coords.y) && inside(coords.z) {
        Some(encode_morton_3d(coords.x as u32, coords.y as u32, coords.z as u32))
    } else {
        None
    }
}

/// Code of the parent node one depth up
#[inline]
pub fn parent_code(code: u64) -> u64 {
    code >> 3
}

/// Code of the ancestor `levels` depths up
#[inline]
pub fn ancestor_code(code: u64, levels: u32) -> u64 {
    if levels >= MORTON_BITS_PER_AXIS + 1 {
        0
    } else {
        code >> (3 * levels)
    }
}

/// Code of child `slot` (0..8) one depth down
#[inline]
pub fn child_code(code: u64, slot: u8) -> u64 {
    (code << 3) | (slot as u64 & 7)
}

/// Position of a node within its parent (bit 0 = x, bit 1 = y, bit 2 = z)
#[inline]
pub fn child_slot(code: u64) -> u8 {
    (code & 7) as u8
}

/// Number of depths to climb from two same-depth codes to their common ancestor.
pub fn common_ancestor_levels(a: u64, b: u64) -> u32 {
    let diff = a ^ b;
    if diff == 0 {
        0
    } else {
        (66 - diff.leading_zeros()) / 3
    }
}
