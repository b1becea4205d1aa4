//! Binary key encodings.
//!
//! Signed integers are stored big-endian with the sign bit flipped so that
//! LMDB's lexicographic key order matches numeric order, negatives included.

use xchain_types::ChainId;

/// Order-preserving 8-byte encoding of an `i64`.
pub fn i64_key(value: i64) -> [u8; 8] {
    ((value as u64) ^ (1 << 63)).to_be_bytes()
}

pub fn height_key(height: i64) -> [u8; 8] {
    i64_key(height)
}

pub fn chain_key(chain_id: ChainId) -> [u8; 8] {
    i64_key(chain_id.as_i64())
}

/// `height ++ pubkey`, ordering history entries by finalization height.
pub fn tss_history_key(finalized_height: i64, pubkey: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + pubkey.len());
    key.extend_from_slice(&i64_key(finalized_height));
    key.extend_from_slice(pubkey.as_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn i64_key_preserves_order() {
        let values = [i64::MIN, -100, -1, 0, 1, 100, i64::MAX];
        for pair in values.windows(2) {
            assert!(i64_key(pair[0]) < i64_key(pair[1]), "{:?}", pair);
        }
    }

    #[test]
    fn history_key_orders_by_height_first() {
        assert!(tss_history_key(1, "zz") < tss_history_key(2, "aa"));
        assert!(tss_history_key(2, "aa") < tss_history_key(2, "ab"));
    }
}
