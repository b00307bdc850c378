//! Random data from the operating system.

/// Fill `buf` with random bytes.
pub fn fill(buf: &mut [u8]) {
    getrandom::getrandom(buf).expect("getrandom failed");
}

pub fn u8() -> u8 {
    let mut b = [0u8; 1];
    fill(&mut b);
    b[0]
}

pub fn u64() -> u64 {
    let mut b = [0u8; 8];
    fill(&mut b);
    u64::from_le_bytes(b)
}

/// `count` random 32-bit words.
pub fn words(count: usize) -> Vec<i32> {
    let mut raw = vec![0u8; count * 4];
    fill(&mut raw);
    raw.chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
