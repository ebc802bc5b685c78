//! Keccak sponge (SHA3-256 parameters) with a truncatable round schedule.
//!
//! Rate 1088 bits, capacity 512 bits, SHA-3 domain padding. With 24
//! rounds the output is exactly SHA3-256.

/// Absorption block size in bytes.
pub const RATE: usize = 136;

/// Output width in bytes.
pub const DIGEST_LEN: usize = 32;

const ROUND_CONSTANTS: [u64; 24] = [
    0x0000_0000_0000_0001,
    0x0000_0000_0000_8082,
    0x8000_0000_0000_808A,
    0x8000_0000_8000_8000,
    0x0000_0000_0000_808B,
    0x0000_0000_8000_0001,
    0x8000_0000_8000_8081,
    0x8000_0000_0000_8009,
    0x0000_0000_0000_008A,
    0x0000_0000_0000_0088,
    0x0000_0000_8000_8009,
    0x0000_0000_8000_000A,
    0x0000_0000_8000_808B,
    0x8000_0000_0000_008B,
    0x8000_0000_0000_8089,
    0x8000_0000_0000_8003,
    0x8000_0000_0000_8002,
    0x8000_0000_0000_0080,
    0x0000_0000_0000_800A,
    0x8000_0000_8000_000A,
    0x8000_0000_8000_8081,
    0x8000_0000_0000_8080,
    0x0000_0000_8000_0001,
    0x8000_0000_8000_8008,
];

/// Rotation offsets indexed by `x + 5 * y`.
const RHO: [u32; 25] = [
    0, 1, 62, 28, 27, //
    36, 44, 6, 55, 20, //
    3, 10, 43, 25, 39, //
    41, 45, 15, 21, 8, //
    18, 2, 61, 56, 14,
];

/// Keccak-f[1600] using the first `rounds` round constants.
fn permute(state: &mut [u64; 25], rounds: u32) {
    for &rc in ROUND_CONSTANTS.iter().take(rounds as usize) {
        // theta
        let mut c = [0u64; 5];
        for (x, column) in c.iter_mut().enumerate() {
            *column = state[x] ^ state[x + 5] ^ state[x + 10] ^ state[x + 15] ^ state[x + 20];
        }
        for x in 0..5 {
            let d = c[(x + 4) % 5] ^ c[(x + 1) % 5].rotate_left(1);
            for y in 0..5 {
                state[x + 5 * y] ^= d;
            }
        }

        // rho and pi
        let mut b = [0u64; 25];
        for x in 0..5 {
            for y in 0..5 {
                b[y + 5 * ((2 * x + 3 * y) % 5)] = state[x + 5 * y].rotate_left(RHO[x + 5 * y]);
            }
        }

        // chi
        for y in 0..5 {
            for x in 0..5 {
                state[x + 5 * y] =
                    b[x + 5 * y] ^ (!b[(x + 1) % 5 + 5 * y] & b[(x + 2) % 5 + 5 * y]);
            }
        }

        // iota
        state[0] ^= rc;
    }
}

fn absorb_block(state: &mut [u64; 25], block: &[u8]) {
    for (lane, word) in state.iter_mut().zip(block.chunks_exact(8)) {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(word);
        *lane ^= u64::from_le_bytes(bytes);
    }
}

/// Sponge with `out_len` bytes of output; squeezing re-permutes per rate block.
fn sponge(input: &[u8], rounds: u32, out_len: usize) -> Vec<u8> {
    let mut padded = Vec::with_capacity(input.len() + RATE);
    padded.extend_from_slice(input);
    padded.push(0x06);
    while padded.len() % RATE != 0 {
        padded.push(0);
    }
    if let Some(last) = padded.last_mut() {
        *last |= 0x80;
    }

    let mut state = [0u64; 25];
    for block in padded.chunks_exact(RATE) {
        absorb_block(&mut state, block);
        permute(&mut state, rounds);
    }

    let mut out = Vec::with_capacity(out_len);
    loop {
        for lane in state.iter().take(RATE / 8) {
            for byte in lane.to_le_bytes() {
                if out.len() == out_len {
                    return out;
                }
                out.push(byte);
            }
        }
        if out.len() == out_len {
            return out;
        }
        permute(&mut state, rounds);
    }
}

/// 32-byte Keccak digest at the given round count (bounds checked by the caller).
pub(crate) fn hash(input: &[u8], rounds: u32) -> Vec<u8> {
    sponge(input, rounds, DIGEST_LEN)
}
