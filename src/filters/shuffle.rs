/// Shuffle bytes according to the HDF5 shuffle filter:
///
/// https://support.hdfgroup.org/ftp/HDF5//documentation/doc1.6/TechNotes/shuffling-algorithm-report.pdf
///
/// The shuffling algorithm re-arranges `bytes` with the following steps:
///
/// 1. put the first byte of each number in the first chunk
/// 2. put the second byte of each number in the second chunk
/// 3. repeat for size of number (e.g. 4 for i32).
///
/// Quoting the above:
///
/// For 5 32-bit integers: 1, 23, 43, 56, 35
///
/// they are laid out as following on a big-endian machine:
///
/// original: 0x00 0x00 0x00 0x01 0x00 0x00 0x00 0x17 0x00 0x00 0x00 0x2B 0x00 0x00 0x00 0x38 0x00 0x00 0x00 0x23
/// shuffled: 0x00 0x00 0x00 0x00 0x00 0x00 0x00 0x00 0x00 0x00 0x00 0x00 0x00 0x00 0x00 0x01 0x17 0x2B 0x38 0x23
///
/// `wsz` is the word size.
pub fn shuffle_bytes(src: &[u8], wsz: usize) -> Vec<u8> {
    assert_eq!(src.len() % wsz, 0);
    let sz = src.len() / wsz;

    let mut dest = vec![0; src.len()];

    for (j, word) in src.chunks_exact(wsz).enumerate() {
        for (i, b) in word.iter().enumerate() {
            dest[i * sz + j] = *b;
        }
    }

    dest
}

/// Inverse of `shuffle_bytes`.
pub fn unshuffle_bytes(src: &[u8], wsz: usize) -> Vec<u8> {
    assert_eq!(src.len() % wsz, 0);
    let sz = src.len() / wsz;

    let mut dest = vec![0; src.len()];

    for (j, word) in dest.chunks_exact_mut(wsz).enumerate() {
        for (i, b) in word.iter_mut().enumerate() {
            *b = src[i * sz + j];
        }
    }

    dest
}
