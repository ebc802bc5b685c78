//! BLAKE2b, unkeyed, 1..=12 rounds, 1..=64 byte digests.

use super::SIGMA;

/// Digest width when used through [`super::Algorithm`].
pub const DIGEST_LEN: usize = 32;
/// Largest digest BLAKE2b can produce.
pub const MAX_DIGEST_LEN: usize = 64;
const BLOCK_LEN: usize = 128;

const IV: [u64; 8] = [
    0x6a09_e667_f3bc_c908,
    0xbb67_ae85_84ca_a73b,
    0x3c6e_f372_fe94_f82b,
    0xa54f_f53a_5f1d_36f1,
    0x510e_527f_ade6_82d1,
    0x9b05_688c_2b3e_6c1f,
    0x1f83_d9ab_fb41_bd6b,
    0x5be0_cd19_137e_2179,
];

#[inline(always)]
fn g(v: &mut [u64; 16], a: usize, b: usize, c: usize, d: usize, x: u64, y: u64) {
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(x);
    v[d] = (v[d] ^ v[a]).rotate_right(32);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(24);
    v[a] = v[a].wrapping_add(v[b]).wrapping_add(y);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = v[c].wrapping_add(v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(63);
}

fn compress(h: &mut [u64; 8], block: &[u8; BLOCK_LEN], counter: u128, last: bool, rounds: u32) {
    let mut m = [0u64; 16];
    for (word, bytes) in m.iter_mut().zip(block.chunks_exact(8)) {
        let mut le = [0u8; 8];
        le.copy_from_slice(bytes);
        *word = u64::from_le_bytes(le);
    }

    let mut v = [0u64; 16];
    v[..8].copy_from_slice(h);
    v[8..].copy_from_slice(&IV);
    v[12] ^= counter as u64;
    v[13] ^= (counter >> 64) as u64;
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

/// BLAKE2b with an explicit digest length; `out_len` must be in 1..=64.
pub(crate) fn hash_with_len(input: &[u8], rounds: u32, out_len: usize) -> Vec<u8> {
    let mut h = IV;
    h[0] ^= 0x0101_0000 ^ out_len as u64;

    let mut offset = 0;
    while input.len() - offset > BLOCK_LEN {
        let mut block = [0u8; BLOCK_LEN];
        block.copy_from_slice(&input[offset..offset + BLOCK_LEN]);
        offset += BLOCK_LEN;
        compress(&mut h, &block, offset as u128, false, rounds);
    }

    let mut block = [0u8; BLOCK_LEN];
    let tail = &input[offset..];
    block[..tail.len()].copy_from_slice(tail);
    compress(&mut h, &block, input.len() as u128, true, rounds);

    let mut out: Vec<u8> = h.iter().flat_map(|w| w.to_le_bytes()).collect();
    out.truncate(out_len);
    out
}

pub(crate) fn hash(input: &[u8], rounds: u32) -> Vec<u8> {
    hash_with_len(input, rounds, DIGEST_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_blake2b_512_abc() {
        assert_eq!(
            hex(&hash_with_len(b"abc", 12, MAX_DIGEST_LEN)),
            "ba80a53f981c4d0d6a2797b69f12f6e94c212f14685ac4b74b12bb6fdbffa2d1\
             7d87c5392aab792dc252d5de4533cc9518d38aa8dbf1925ab92386edd4009923"
        );
    }

    #[test]
    fn test_digest_length_is_a_parameter() {
        // The output length is mixed into h[0], so a 32-byte digest is not a
        // prefix of the 64-byte one.
        let short = hash(b"abc", 12);
        let long = hash_with_len(b"abc", 12, MAX_DIGEST_LEN);
        assert_eq!(short.len(), DIGEST_LEN);
        assert_ne!(&long[..DIGEST_LEN], &short[..]);
    }

    #[test]
    fn test_rounds_above_ten_reuse_sigma_rows() {
        assert_ne!(hash(b"abc", 10), hash(b"abc", 12));
    }
}
