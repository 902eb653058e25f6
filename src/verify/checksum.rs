//! Folded 16-bit checksum.
//!
//! The payload is read as little-endian 32-bit words. The upper and lower
//! halves of every word are summed, the sum is folded until it fits in 16
//! bits, and the result is one's complemented. A trailing partial word is
//! zero-padded.

/// Checksum of a byte buffer.
pub fn checksum16(bytes: &[u8]) -> u16 {
    let mut sum: u64 = 0;
    for chunk in bytes.chunks(4) {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum += add_halves(u32::from_le_bytes(word));
    }
    fold(sum)
}

/// Checksum of a word buffer.
pub fn checksum_words(words: &[u32]) -> u16 {
    fold(words.iter().map(|&w| add_halves(w)).sum())
}

#[inline]
fn add_halves(word: u32) -> u64 {
    u64::from(word >> 16) + u64::from(word & 0xFFFF)
}

fn fold(mut sum: u64) -> u16 {
    while sum > 0xFFFF {
        sum = (sum >> 16) + (sum & 0xFFFF);
    }
    !(sum as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_is_all_ones() {
        assert_eq!(checksum16(&[]), 0xFFFF);
    }

    #[test]
    fn carry_is_folded() {
        // 0xFFFF + 0xFFFF = 0x1FFFE, folds to 0xFFFF, complements to 0.
        assert_eq!(checksum_words(&[0xFFFF_FFFF]), 0x0000);
        assert_eq!(checksum_words(&[0x0001_0002]), 0xFFFC);
    }

    #[test]
    fn byte_and_word_views_agree() {
        let words = [0x1234_5678u32, 0x9ABC_DEF0, 0x0F0F_F0F0];
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        assert_eq!(checksum16(&bytes), checksum_words(&words));
    }
}
