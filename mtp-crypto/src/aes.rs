//! AES-256 in Infinite Garble Extension mode.
//!
//! The 32-byte IV is two halves: the first stands for the previous
//! ciphertext block, the second for the previous plaintext block.

use ::aes::Aes256;
use ::aes::cipher::generic_array::GenericArray;
use ::aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};

fn xor_block(dst: &mut [u8; 16], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

/// Encrypt `buffer` in place. Its length must be a multiple of 16.
pub fn ige_encrypt(buffer: &mut [u8], key: &[u8; 32], iv: &[u8; 32]) {
    assert_eq!(buffer.len() % 16, 0, "ige input must be whole blocks");
    let cipher = Aes256::new(GenericArray::from_slice(key));

    let mut prev_cipher = [0u8; 16];
    let mut prev_plain = [0u8; 16];
    prev_cipher.copy_from_slice(&iv[..16]);
    prev_plain.copy_from_slice(&iv[16..]);

    for chunk in buffer.chunks_exact_mut(16) {
        let mut plain = [0u8; 16];
        plain.copy_from_slice(chunk);

        let mut block = plain;
        xor_block(&mut block, &prev_cipher);
        let ga = GenericArray::from_mut_slice(&mut block);
        cipher.encrypt_block(ga);
        xor_block(&mut block, &prev_plain);

        chunk.copy_from_slice(&block);
        prev_cipher = block;
        prev_plain = plain;
    }
}

/// Decrypt `buffer` in place. Its length must be a multiple of 16.
pub fn ige_decrypt(buffer: &mut [u8], key: &[u8; 32], iv: &[u8; 32]) {
    assert_eq!(buffer.len() % 16, 0, "ige input must be whole blocks");
    let cipher = Aes256::new(GenericArray::from_slice(key));

    let mut prev_cipher = [0u8; 16];
    let mut prev_plain = [0u8; 16];
    prev_cipher.copy_from_slice(&iv[..16]);
    prev_plain.copy_from_slice(&iv[16..]);

    for chunk in buffer.chunks_exact_mut(16) {
        let mut encrypted = [0u8; 16];
        encrypted.copy_from_slice(chunk);

        let mut block = encrypted;
        xor_block(&mut block, &prev_plain);
        let ga = GenericArray::from_mut_slice(&mut block);
        cipher.decrypt_block(ga);
        xor_block(&mut block, &prev_cipher);

        chunk.copy_from_slice(&block);
        prev_cipher = encrypted;
        prev_plain = block;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [7; 32];

    fn iv() -> [u8; 32] {
        let mut iv = [0u8; 32];
        for (i, b) in iv.iter_mut().enumerate() {
            *b = i as u8;
        }
        iv
    }

    #[test]
    fn roundtrip() {
        let original: Vec<u8> = (0..64u8).collect();
        let mut data = original.clone();
        ige_encrypt(&mut data, &KEY, &iv());
        assert_ne!(data, original);
        ige_decrypt(&mut data, &KEY, &iv());
        assert_eq!(data, original);
    }

    #[test]
    fn first_block_matches_definition() {
        let iv = iv();
        let mut data = [0x42u8; 16];
        ige_encrypt(&mut data, &KEY, &iv);

        let cipher = Aes256::new(GenericArray::from_slice(&KEY));
        let mut expected = [0x42u8; 16];
        xor_block(&mut expected, &iv[..16]);
        cipher.encrypt_block(GenericArray::from_mut_slice(&mut expected));
        xor_block(&mut expected, &iv[16..]);
        assert_eq!(data, expected);
    }

    #[test]
    fn change_propagates_forward() {
        let mut a = [0u8; 48];
        let mut b = [0u8; 48];
        b[0] = 1;
        ige_encrypt(&mut a, &KEY, &iv());
        ige_encrypt(&mut b, &KEY, &iv());
        for block in 0..3 {
            assert_ne!(a[block * 16..][..16], b[block * 16..][..16]);
        }
    }

    #[test]
    #[should_panic]
    fn partial_block_panics() {
        ige_encrypt(&mut [0u8; 15], &KEY, &iv());
    }
}
