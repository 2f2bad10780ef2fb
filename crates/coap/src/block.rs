//! RFC 7959 block-option value packing: `(num << 4) | (m << 3) | szx`.

/// Maximum block size exponent; `szx=7` is reserved and never produced.
pub const MAX_SZX: u8 = 6;

/// A decoded Block1/Block2 option value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Block {
    pub num: u32,
    pub more: bool,
    pub szx: u8,
}

impl Block {
    /// The block size in bytes implied by `szx`: `1 << (szx + 4)`.
    #[must_use]
    pub const fn size(self) -> usize {
        1usize << (self.szx + 4)
    }
}

/// Packs a block descriptor into its CoAP uint option value.
#[must_use]
pub fn encode_block(num: u32, more: bool, szx: u8) -> u32 {
    debug_assert!(szx <= MAX_SZX, "szx {szx} exceeds the maximum of {MAX_SZX}");
    (num << 4) | (u32::from(more) << 3) | u32::from(szx)
}

/// Unpacks a block option's raw uint value.
#[must_use]
pub fn decode_block(value: u32) -> Block {
    Block {
        num: value >> 4,
        more: (value & 0b1000) != 0,
        szx: (value & 0b0111) as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn size_matches_szx_table() {
        let sizes = [16, 32, 64, 128, 256, 512, 1024];
        for (szx, &expected) in sizes.iter().enumerate() {
            let block = decode_block(encode_block(0, false, szx as u8));
            assert_eq!(block.size(), expected);
        }
    }

    proptest! {
        #[test]
        fn block_round_trips(num in 0u32..(1 << 20), more in any::<bool>(), szx in 0u8..=MAX_SZX) {
            let decoded = decode_block(encode_block(num, more, szx));
            prop_assert_eq!(decoded, Block { num, more, szx });
            prop_assert_eq!(decoded.size(), 1usize << (szx + 4));
        }
    }
}
