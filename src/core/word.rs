use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Largest number of bits a packed word may occupy.
///
/// One bit short of `u64` so that no packed word can collide with
/// [`Word::SENTINEL`].
pub const MAX_WORD_BITS: u32 = 63;

/// A symbolic word with its symbols packed into a single integer.
///
/// Symbols are stored most-significant first, `bits_per_symbol(alphabet_size)`
/// bits each, so the natural integer order equals the lexicographic order of
/// the symbol strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Word(pub u64);

impl Word {
    /// Word emitted for zero-variance windows.
    pub const SENTINEL: Word = Word(u64::MAX);

    /// Pack a symbol string.
    pub fn from_symbols(symbols: &[u8], bits: u32) -> Self {
        debug_assert!(symbols.len() as u32 * bits <= MAX_WORD_BITS);
        let mut packed = 0u64;
        for &s in symbols {
            debug_assert!((s as u64) < (1u64 << bits));
            packed = (packed << bits) | s as u64;
        }
        Word(packed)
    }

    /// Unpack into `len` symbols.
    pub fn symbols(self, len: usize, bits: u32) -> Vec<u8> {
        let mask = (1u64 << bits) - 1;
        (0..len)
            .map(|i| {
                let shift = (len - 1 - i) as u32 * bits;
                ((self.0 >> shift) & mask) as u8
            })
            .collect()
    }

    pub fn is_sentinel(self) -> bool {
        self == Self::SENTINEL
    }
}

/// Bits needed to store one symbol of an alphabet of the given size.
pub fn bits_per_symbol(alphabet_size: usize) -> u32 {
    debug_assert!(alphabet_size >= 2);
    usize::BITS - (alphabet_size - 1).leading_zeros()
}

/// Word -> occurrence count for one (series, configuration) pair.
pub type WordHistogram = HashMap<Word, u32>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_per_symbol() {
        assert_eq!(bits_per_symbol(2), 1);
        assert_eq!(bits_per_symbol(3), 2);
        assert_eq!(bits_per_symbol(4), 2);
        assert_eq!(bits_per_symbol(5), 3);
        assert_eq!(bits_per_symbol(16), 4);
    }

    #[test]
    fn test_pack_unpack() {
        let symbols = [3u8, 0, 2, 1];
        let w = Word::from_symbols(&symbols, 2);
        // 11 00 10 01
        assert_eq!(w.0, 0b1100_1001);
        assert_eq!(w.symbols(4, 2), symbols.to_vec());
    }

    #[test]
    fn test_order_is_lexicographic() {
        let a = Word::from_symbols(&[0, 1, 1], 1);
        let b = Word::from_symbols(&[1, 0, 0], 1);
        assert!(a < b, "{a:?} should sort before {b:?}");
    }

    #[test]
    fn test_sentinel_unreachable() {
        let all_max = vec![15u8; (MAX_WORD_BITS / 4) as usize];
        let w = Word::from_symbols(&all_max, 4);
        assert!(!w.is_sentinel());
        assert!(Word::SENTINEL.is_sentinel());
    }
}
