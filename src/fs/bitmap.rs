//! Single-bit operations over byte-addressed bitmap buffers.
//!
//! The formatter uses these to stamp the initial reserved ranges; there is
//! deliberately no free-bit search, the engine never allocates at runtime.

/// Set or clear bit `index`, addressing byte `index / 8`, bit `index % 8`.
///
/// `index` must lie inside the bitmap.
pub fn set_bit(bitmap: &mut [u8], index: usize, value: bool) {
    if value {
        bitmap[index / 8] |= 1 << (index % 8);
    } else {
        bitmap[index / 8] &= !(1 << (index % 8));
    }
}

pub fn test_bit(bitmap: &[u8], index: usize) -> bool {
    bitmap[index / 8] & (1 << (index % 8)) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let mut bitmap = [0u8; 4];

        set_bit(&mut bitmap, 0, true);
        assert!(test_bit(&bitmap, 0));
        set_bit(&mut bitmap, 7, true);
        set_bit(&mut bitmap, 15, true);
        assert_eq!(bitmap[0], 0b1000_0001);
        assert_eq!(bitmap[1], 0b1000_0000);

        set_bit(&mut bitmap, 0, false);
        assert!(!test_bit(&bitmap, 0));
        assert!(test_bit(&bitmap, 7));
    }

    #[test]
    fn test_adjacent_bits_untouched() {
        let mut bitmap = [0u8; 4];
        for i in 0..20 {
            set_bit(&mut bitmap, i, true);
        }

        set_bit(&mut bitmap, 9, true);
        set_bit(&mut bitmap, 9, false);

        for i in 0..20 {
            assert_eq!(test_bit(&bitmap, i), i != 9, "bit {i}");
        }
        for i in 20..32 {
            assert!(!test_bit(&bitmap, i));
        }
    }

    #[test]
    fn test_idempotent() {
        let mut bitmap = [0u8; 2];
        set_bit(&mut bitmap, 3, true);
        set_bit(&mut bitmap, 3, true);
        assert_eq!(bitmap[0], 0b0000_1000);
        set_bit(&mut bitmap, 3, false);
        set_bit(&mut bitmap, 3, false);
        assert_eq!(bitmap[0], 0);
    }
}
