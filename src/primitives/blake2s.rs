//! BLAKE2s-256, unkeyed, 1..=12 rounds (10 is the standard count).

use super::{IV32, SIGMA};

pub const DIGEST_LEN: usize = 32;
const BLOCK_LEN: usize = 64;

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

fn compress(h: &mut [u32; 8], block: &[u8; BLOCK_LEN], counter: u64, last: bool, rounds: u32) {
    let mut m = [0u32; 16];
    for (word, bytes) in m.iter_mut().zip(block.chunks_exact(4)) {
        *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }

    let mut v = [0u32; 16];
    v[..8].copy_from_slice(h);
    v[8..].copy_from_slice(&IV32);
    v[12] ^= counter as u32;
    v[13] ^= (counter >> 32) as u32;
    if last {
        v[14] = !v[14];
    }

    for r in 0..rounds as usize {
        let s = &SIGMA[r % 10];
        g(&mut v, 0, 4, 8, 12, m[s[0]], m[s[1]]);
        g(&mut v, 1, 5, 9, 13, m[s[2]], m[s[3]]);
        g(&mut v, 2, 6, 10, 14, m[s[4]], m[s[5]]);
        g(&mut v, 3, 7, 11, 15, m[s[6]], m[s[7]]);
        g(&mut v, 0, 5, 10, 15, m[s[8]], m[s[9]]);
        g(&mut v, 1, 6, 11, 12, m[s[10]], m[s[11]]);
        g(&mut v, 2, 7, 8, 13, m[s[12]], m[s[13]]);
        g(&mut v, 3, 4, 9, 14, m[s[14]], m[s[15]]);
    }

    for i in 0..8 {
        h[i] ^= v[i] ^ v[i + 8];
    }
}

pub(crate) fn hash(input: &[u8], rounds: u32) -> Vec<u8> {
    let mut h = IV32;
    // Parameter block: digest length, key length 0, fanout 1, depth 1.
    h[0] ^= 0x0101_0000 ^ DIGEST_LEN as u32;

    let mut offset = 0;
    // Every block but the last one; a full final block is still the final block.
    while input.len() - offset > BLOCK_LEN {
        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(&input[offset..offset + BLOCK_LEN]);
        offset += BLOCK_LEN;
        compress(&mut h, &block, offset as u64, false, rounds);
    }

    let mut block = [0u8; BLOCK_LEN];
    let tail = &input[offset..];
    block[..tail.len()].copy_from_slice(tail);
    compress(&mut h, &block, input.len() as u64, true, rounds);

    h.iter().flat_map(|w| w.to_le_bytes()).collect()
}
