//! Reduction of greyscale levels for grids that can only switch LEDs on and off.
//!
//! Levels run from 0 to 15; anything above 7 counts as lit.

const THRESHOLD: u8 = 7;

pub fn reduce_level_to_bit(level: u8) -> bool {
    level > THRESHOLD
}

/// Pack eight levels into one byte, `levels[i]` landing in bit `i`
pub fn reduce_levels_to_bitmask(levels: &[u8; 8]) -> u8 {
    levels
        .iter()
        .enumerate()
        .fold(0, |mask, (i, &level)| mask | ((reduce_level_to_bit(level) as u8) << i))
}

/// Reduce a whole greyscale quad to a packed bit quad
pub fn reduce_level_quad(levels: &crate::rotation::LevelQuad) -> crate::rotation::BitQuad {
    let mut bits = [0; 8];
    for (row, chunk) in bits.iter_mut().zip(levels.chunks_exact(8)) {
        let mut row_levels = [0; 8];
        row_levels.copy_from_slice(chunk);
        *row = reduce_levels_to_bitmask(&row_levels);
    }
    bits
}
