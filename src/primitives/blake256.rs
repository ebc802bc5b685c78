//! BLAKE-256 (the SHA-3 finalist), salt zero, 1..=14 rounds.

use super::{IV32, SIGMA};

pub const DIGEST_LEN: usize = 32;
const BLOCK_LEN: usize = 64;

/// First digits of π, the BLAKE-256 round constants.
const CONSTANTS: [u32; 16] = [
    0x243F_6A88, 0x85A3_08D3, 0x1319_8A2E, 0x0370_7344,
    0xA409_3822, 0x299F_31D0, 0x082E_FA98, 0xEC4E_6C89,
    0x4528_21E6, 0x38D0_1377, 0xBE54_66CF, 0x34E9_0C6C,
    0xC0AC_29B7, 0xC97C_50DD, 0x3F84_D5B5, 0xB547_0917,
];

#[allow(clippy::too_many_arguments)]
#[inline(always)]
fn g(v: &mut [u32; 16], m: &[u32; 16], s: &[usize; 16], i: usize, a: usize, b: usize, c: usize, d: usize) {
    let (x, y) = (s[2 * i], s[2 * i + 1]);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(m[x] ^ CONSTANTS[y]);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(12);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(m[y] ^ CONSTANTS[x]);
    v[d] = (v[d] ^ v[a]).rotate_right(8);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(7);
}

fn compress(h: &mut [u32; 8], block: &[u8], counter: u64, rounds: u32) {
    let mut m = [0u32; 16];
    for (word, bytes) in m.iter_mut().zip(block.chunks_exact(4)) {
        *word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }

    let t0 = counter as u32;
    let t1 = (counter >> 32) as u32;
    let mut v = [0u32; 16];
    v[..8].copy_from_slice(h);
    v[8..12].copy_from_slice(&CONSTANTS[..4]);
    v[12] = t0 ^ CONSTANTS[4];
    v[13] = t0 ^ CONSTANTS[5];
    v[14] = t1 ^ CONSTANTS[6];
    v[15] = t1 ^ CONSTANTS[7];

    for r in 0..rounds as usize {
        let s = &SIGMA[r % 10];
        g(&mut v, &m, s, 0, 0, 4, 8, 12);
        g(&mut v, &m, s, 1, 1, 5, 9, 13);
        g(&mut v, &m, s, 2, 2, 6, 10, 14);
        g(&mut v, &m, s, 3, 3, 7, 11, 15);
        g(&mut v, &m, s, 4, 0, 5, 10, 15);
        g(&mut v, &m, s, 5, 1, 6, 11, 12);
        g(&mut v, &m, s, 6, 2, 7, 8, 13);
        g(&mut v, &m, s, 7, 3, 4, 9, 14);
    }

    for i in 0..8 {
        h[i] ^= v[i] ^ v[i + 8];
    }
}

pub(crate) fn hash(input: &[u8], rounds: u32) -> Vec<u8> {
    let bit_len = (input.len() as u64).wrapping_mul(8);

    let mut padded = Vec::with_capacity(input.len() + 2 * BLOCK_LEN);
    padded.extend_from_slice(input);
    padded.push(0x80);
    while padded.len() % BLOCK_LEN != 56 {
        padded.push(0);
    }
    if let Some(last) = padded.last_mut() {
        *last |= 0x01;
    }
    padded.extend_from_slice(&bit_len.to_be_bytes());

    let mut h = IV32;
    for (k, block) in padded.chunks_exact(BLOCK_LEN).enumerate() {
        let start = k * BLOCK_LEN;
        // The counter covers message bits up to this block; zero for pure padding.
        let counter = if start < input.len() {
            ((start + BLOCK_LEN).min(input.len()) as u64) * 8
        } else {
            0
        };
        compress(&mut h, block, counter, rounds);
    }

    h.iter().flat_map(|w| w.to_be_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_blake256_empty() {
        assert_eq!(
            hex(&hash(b"", 14)),
            "716f6e863f744b9ac22c97ec7b76ea5f5908bc5b2f67c61510bfc4751384ea7a"
        );
    }

    #[test]
    fn test_blake256_single_zero_byte() {
        assert_eq!(
            hex(&hash(&[0u8], 14)),
            "0ce8d4ef4dd7cd8d62dfded9d4edb0a774ae6a41929a74da23109e8f11139c87"
        );
    }

    #[test]
    fn test_padding_boundary_lengths() {
        // 55 bytes share the 0x81 pad byte; 56 bytes spill into a second block.
        for len in [55usize, 56, 64, 119, 120] {
            let digest = hash(&vec![0x5Au8; len], 14);
            assert_eq!(digest.len(), DIGEST_LEN);
        }
        assert_ne!(hash(&[0x5A; 55], 14), hash(&[0x5A; 56], 14));
    }

    #[test]
    fn test_round_count_changes_digest() {
        assert_ne!(hash(b"abc", 1), hash(b"abc", 14));
    }
}
