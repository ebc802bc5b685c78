//! Single-chunk BLAKE3-style compression.
//!
//! Differs from the published BLAKE3 on purpose: the message schedule is
//! the identity permutation in every round, all blocks are chained with
//! chunk counter 0 regardless of input length (no tree mode), and the
//! output is a second ROOT compression over an all-zero block. Digests
//! therefore never match the `blake3` crate, even at 7 rounds.

use super::IV32;

pub const DIGEST_LEN: usize = 32;
const BLOCK_LEN: usize = 64;

const CHUNK_START: u32 = 1 << 0;
const CHUNK_END: u32 = 1 << 1;
const ROOT: u32 = 1 << 3;

#[inline(always)]
fn g(v: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize, x: u32, y: u32) {
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(x);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(12);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(y);
    v[d] = (v[d] ^ v[a]).rotate_right(8);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(7);
}

fn mix(v: &mut [u32; 16], m: &[u32; 16], rounds: u32) {
    for _ in 0..rounds {
        g(v, 0, 4, 8, 12, m[0], m[1]);
        g(v, 1, 5, 9, 13, m[2], m[3]);
        g(v, 2, 6, 10, 14, m[4], m[5]);
        g(v, 3, 7, 11, 15, m[6], m[7]);
        g(v, 0, 5, 10, 15, m[8], m[9]);
        g(v, 1, 6, 11, 12, m[10], m[11]);
        g(v, 2, 7, 8, 13, m[12], m[13]);
        g(v, 3, 4, 9, 14, m[14], m[15]);
    }
}

fn initial_state(cv: &[u32; 8]) -> [u32; 16] {
    let mut v = [0u32; 16];
    v[..8].copy_from_slice(cv);
    v[8..].copy_from_slice(&IV32);
    v
}

fn compress(cv: &mut [u32; 8], block: &[u8], flags: u32, rounds: u32) {
    let mut m = [0u32; 16];
    for (word, bytes) in m.iter_mut().zip(block.chunks(4)) {
        let mut le = [0u8; 4];
        le[..bytes.len()].copy_from_slice(bytes);
        *word = u32::from_le_bytes(le);
    }

    let mut v = initial_state(cv);
    // Chunk counter is always zero, so v[12] and v[13] keep the IV words.
    v[14] ^= block.len() as u32;
    v[15] ^= flags;
    mix(&mut v, &m, rounds);

    for i in 0..8 {
        cv[i] ^= v[i] ^ v[i + 8];
    }
}

fn root_output(cv: &[u32; 8], rounds: u32) -> Vec<u8> {
    let mut v = initial_state(cv);
    v[15] ^= ROOT;
    mix(&mut v, &[0u32; 16], rounds);

    cv.iter()
        .zip(v.iter())
        .flat_map(|(c, w)| (c ^ w).to_le_bytes())
        .collect()
}

pub(crate) fn hash(input: &[u8], rounds: u32) -> Vec<u8> {
    let mut cv = IV32;

    if input.is_empty() {
        compress(&mut cv, &[], CHUNK_START | CHUNK_END, rounds);
    } else {
        let blocks = input.len().div_ceil(BLOCK_LEN);
        for (i, block) in input.chunks(BLOCK_LEN).enumerate() {
            let mut flags = 0;
            if i == 0 {
                flags |= CHUNK_START;
            }
            if i + 1 == blocks {
                flags |= CHUNK_END;
            }
            compress(&mut cv, block, flags, rounds);
        }
    }

    root_output(&cv, rounds)
}
