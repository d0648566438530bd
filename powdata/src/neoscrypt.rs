//! The Neoscrypt proof-of-work hash.
//!
//! Neoscrypt is a memory-hard function in the scrypt family. The default
//! profile used for proof of work runs:
//!
//! 1. FastKDF (a buffered KDF over keyed BLAKE2s) to expand the input into a
//!    256-byte working block.
//! 2. Two SMix passes over copies of that block, one with ChaCha20 and one
//!    with Salsa20 as the block mixer, 128 iterations each with r = 2.
//! 3. FastKDF again, keyed by the XOR of both passes, down to 32 bytes.
//!
//! Only this profile is implemented.

use blake2::Blake2sMac256;
use blake2::digest::generic_array::GenericArray;
use blake2::digest::{KeyInit, Mac};

/// SMix iteration count.
const N: usize = 128;
/// Block-mix width: each working block is `2 * R` 64-byte sub-blocks.
const R: usize = 2;
/// Mixer rounds (ChaCha20 / Salsa20).
const ROUNDS: usize = 20;

const SUB_BLOCK_WORDS: usize = 16;
const BLOCK_WORDS: usize = 2 * R * SUB_BLOCK_WORDS;
const BLOCK_BYTES: usize = BLOCK_WORDS * 4;

const KDF_BUF: usize = 256;
const KDF_ITERATIONS: usize = 32;
const PRF_INPUT: usize = 64;
const PRF_KEY: usize = 32;
const PRF_OUTPUT: usize = 32;

type Block = [u32; BLOCK_WORDS];

#[derive(Debug, Clone, Copy)]
enum Mixer {
    Salsa,
    ChaCha,
}

/// Hash `input` with Neoscrypt.
///
/// Proof-of-work inputs are 80-byte headers. Inputs longer than 256 bytes
/// are truncated by FastKDF.
pub fn neoscrypt(input: &[u8]) -> [u8; 32] {
    let mut expanded = [0u8; BLOCK_BYTES];
    fastkdf(input, input, &mut expanded);

    let mut x = to_words(&expanded);
    let mut z = x;
    let mut scratch = vec![[0u32; BLOCK_WORDS]; N];

    smix(&mut z, &mut scratch, Mixer::ChaCha);
    smix(&mut x, &mut scratch, Mixer::Salsa);
    for (a, b) in x.iter_mut().zip(z.iter()) {
        *a ^= b;
    }

    let mut output = [0u8; 32];
    fastkdf(input, &to_bytes(&x), &mut output);
    output
}

/// ROMix over one working block, using `scratch` as the N-entry table.
fn smix(x: &mut Block, scratch: &mut [Block], mixer: Mixer) {
    for entry in scratch.iter_mut() {
        *entry = *x;
        block_mix(x, mixer);
    }
    for _ in 0..N {
        // Integerify: first word of the last sub-block.
        let j = x[SUB_BLOCK_WORDS * (2 * R - 1)] as usize & (N - 1);
        for (a, b) in x.iter_mut().zip(scratch[j].iter()) {
            *a ^= b;
        }
        block_mix(x, mixer);
    }
}

/// Neoscrypt's block mix for r = 2.
///
/// Unlike scrypt, each sub-block is chained from the previous mixed one and
/// the middle two sub-blocks are swapped at the end:
/// `A ^= D; M(A); B ^= A; M(B); C ^= B; M(C); D ^= C; M(D); swap(B, C)`.
fn block_mix(x: &mut Block, mixer: Mixer) {
    const A: usize = 0;
    const B: usize = SUB_BLOCK_WORDS;
    const C: usize = 2 * SUB_BLOCK_WORDS;
    const D: usize = 3 * SUB_BLOCK_WORDS;

    for (dst, src) in [(A, D), (B, A), (C, B), (D, C)] {
        for i in 0..SUB_BLOCK_WORDS {
            x[dst + i] ^= x[src + i];
        }
        let sub = &mut x[dst..dst + SUB_BLOCK_WORDS];
        match mixer {
            Mixer::Salsa => salsa20(sub),
            Mixer::ChaCha => chacha20(sub),
        }
    }
    for i in 0..SUB_BLOCK_WORDS {
        x.swap(B + i, C + i);
    }
}

fn salsa20(block: &mut [u32]) {
    let mut s = [0u32; SUB_BLOCK_WORDS];
    s.copy_from_slice(block);

    fn quarter(s: &mut [u32; SUB_BLOCK_WORDS], a: usize, b: usize, c: usize, d: usize) {
        s[b] ^= s[a].wrapping_add(s[d]).rotate_left(7);
        s[c] ^= s[b].wrapping_add(s[a]).rotate_left(9);
        s[d] ^= s[c].wrapping_add(s[b]).rotate_left(13);
        s[a] ^= s[d].wrapping_add(s[c]).rotate_left(18);
    }

    for _ in 0..ROUNDS / 2 {
        quarter(&mut s, 0, 4, 8, 12);
        quarter(&mut s, 5, 9, 13, 1);
        quarter(&mut s, 10, 14, 2, 6);
        quarter(&mut s, 15, 3, 7, 11);
        quarter(&mut s, 0, 1, 2, 3);
        quarter(&mut s, 5, 6, 7, 4);
        quarter(&mut s, 10, 11, 8, 9);
        quarter(&mut s, 15, 12, 13, 14);
    }

    for (word, mixed) in block.iter_mut().zip(s) {
        *word = word.wrapping_add(mixed);
    }
}

fn chacha20(block: &mut [u32]) {
    let mut s = [0u32; SUB_BLOCK_WORDS];
    s.copy_from_slice(block);

    fn quarter(s: &mut [u32; SUB_BLOCK_WORDS], a: usize, b: usize, c: usize, d: usize) {
        s[a] = s[a].wrapping_add(s[b]);
        s[d] = (s[d] ^ s[a]).rotate_left(16);
        s[c] = s[c].wrapping_add(s[d]);
        s[b] = (s[b] ^ s[c]).rotate_left(12);
        s[a] = s[a].wrapping_add(s[b]);
        s[d] = (s[d] ^ s[a]).rotate_left(8);
        s[c] = s[c].wrapping_add(s[d]);
        s[b] = (s[b] ^ s[c]).rotate_left(7);
    }

    for _ in 0..ROUNDS / 2 {
        quarter(&mut s, 0, 4, 8, 12);
        quarter(&mut s, 1, 5, 9, 13);
        quarter(&mut s, 2, 6, 10, 14);
        quarter(&mut s, 3, 7, 11, 15);
        quarter(&mut s, 0, 5, 10, 15);
        quarter(&mut s, 1, 6, 11, 12);
        quarter(&mut s, 2, 7, 8, 13);
        quarter(&mut s, 3, 4, 9, 14);
    }

    for (word, mixed) in block.iter_mut().zip(s) {
        *word = word.wrapping_add(mixed);
    }
}

/// FastKDF: a buffered key derivation function over keyed BLAKE2s.
///
/// The password buffer (A) is read-only. The salt buffer (B) is XORed with
/// each PRF output at a position chosen by the byte sum of that output. Both
/// buffers carry a copy of their head past the 256-byte ring so PRF windows
/// never wrap.
fn fastkdf(password: &[u8], salt: &[u8], output: &mut [u8]) {
    let mut a = [0u8; KDF_BUF + PRF_INPUT];
    fill_repeating(&mut a[..KDF_BUF], password);
    a.copy_within(..PRF_INPUT, KDF_BUF);

    let mut b = [0u8; KDF_BUF + PRF_KEY];
    fill_repeating(&mut b[..KDF_BUF], salt);
    b.copy_within(..PRF_KEY, KDF_BUF);

    let mut ptr = 0;
    for _ in 0..KDF_ITERATIONS {
        let prf = blake2s_keyed(&a[ptr..ptr + PRF_INPUT], &b[ptr..ptr + PRF_KEY]);

        ptr = prf.iter().map(|&byte| byte as usize).sum::<usize>() & (KDF_BUF - 1);
        xor_into(&mut b[ptr..ptr + PRF_OUTPUT], &prf);

        // Keep the ring's head and its copy past the end in sync
        if ptr < PRF_KEY {
            b.copy_within(ptr..PRF_KEY, KDF_BUF + ptr);
        }
        if KDF_BUF - ptr < PRF_OUTPUT {
            let spill = PRF_OUTPUT - (KDF_BUF - ptr);
            b.copy_within(KDF_BUF..KDF_BUF + spill, 0);
        }
    }

    let len = output.len().min(KDF_BUF);
    let head = KDF_BUF - ptr;
    if head >= len {
        xor_into(&mut b[ptr..ptr + len], &a[..len]);
        output[..len].copy_from_slice(&b[ptr..ptr + len]);
    } else {
        let tail = len - head;
        xor_into(&mut b[ptr..KDF_BUF], &a[..head]);
        xor_into(&mut b[..tail], &a[head..len]);
        output[..head].copy_from_slice(&b[ptr..KDF_BUF]);
        output[head..len].copy_from_slice(&b[..tail]);
    }
}

fn blake2s_keyed(input: &[u8], key: &[u8]) -> [u8; PRF_OUTPUT] {
    let mut mac = <Blake2sMac256 as KeyInit>::new(GenericArray::from_slice(key));
    mac.update(input);
    mac.finalize().into_bytes().into()
}

/// Fill `buf` with `data` repeated (and truncated) to length.
fn fill_repeating(buf: &mut [u8], data: &[u8]) {
    for (dst, src) in buf.iter_mut().zip(data.iter().cycle()) {
        *dst = *src;
    }
}

fn xor_into(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

fn to_words(bytes: &[u8; BLOCK_BYTES]) -> Block {
    let mut words = [0u32; BLOCK_WORDS];
    for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

fn to_bytes(words: &Block) -> [u8; BLOCK_BYTES] {
    let mut bytes = [0u8; BLOCK_BYTES];
    for (chunk, word) in bytes.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bytes 0x00..=0x4f, the standard Neoscrypt self-test input.
    fn reference_input() -> [u8; 80] {
        let mut input = [0u8; 80];
        for (i, byte) in input.iter_mut().enumerate() {
            *byte = i as u8;
        }
        input
    }

    const REFERENCE_DIGEST: &str =
        "7258961afb33fd12d00cacb8d63f4f4f52bb6917043865dd24a08f578853122d";

    #[test]
    fn known_answer() {
        assert_eq!(hex::encode(neoscrypt(&reference_input())), REFERENCE_DIGEST);
    }

    #[test]
    fn deterministic() {
        let input = [0x5a_u8; 80];
        assert_eq!(neoscrypt(&input), neoscrypt(&input));
    }

    #[test]
    fn sensitive_to_every_nonce_byte() {
        let base = [0u8; 80];
        let reference = neoscrypt(&base);
        for i in 76..80 {
            let mut input = base;
            input[i] = 1;
            assert_ne!(neoscrypt(&input), reference, "byte {i} ignored");
        }
    }

    #[test]
    fn salsa_core_of_zero_is_zero() {
        // Both cores only add and xor, so the all-zero state is a fixed point
        let mut block = [0u32; SUB_BLOCK_WORDS];
        salsa20(&mut block);
        assert_eq!(block, [0u32; SUB_BLOCK_WORDS]);
        chacha20(&mut block);
        assert_eq!(block, [0u32; SUB_BLOCK_WORDS]);
    }

    #[test]
    fn cores_differ() {
        let mut salsa = [0u32; SUB_BLOCK_WORDS];
        salsa[0] = 1;
        let mut chacha = salsa;
        salsa20(&mut salsa);
        chacha20(&mut chacha);
        assert_ne!(salsa, chacha);
    }

    #[test]
    fn word_conversion_is_little_endian() {
        let mut bytes = [0u8; BLOCK_BYTES];
        bytes[0] = 0x01;
        bytes[1] = 0x02;
        let words = to_words(&bytes);
        assert_eq!(words[0], 0x0201);
        assert_eq!(to_bytes(&words), bytes);
    }

    #[test]
    fn fill_repeating_wraps_input() {
        let mut buf = [0u8; 7];
        fill_repeating(&mut buf, &[1, 2, 3]);
        assert_eq!(buf, [1, 2, 3, 1, 2, 3, 1]);
    }

    #[test]
    fn fastkdf_output_length() {
        let input = [7u8; 80];
        let mut short = [0u8; 32];
        let mut long = [0u8; BLOCK_BYTES];
        fastkdf(&input, &input, &mut short);
        fastkdf(&input, &input, &mut long);
        assert_ne!(short, [0u8; 32]);
        assert_ne!(long, [0u8; BLOCK_BYTES]);
    }
}
