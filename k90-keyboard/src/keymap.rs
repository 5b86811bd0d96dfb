//! Usage mapping and the G-key table

use k90_transport::protocol::{usage, GKEY_COUNT};

use crate::error::KeyboardError;

/// Linux input event codes used by the default G-key table
pub mod key_code {
    pub const KEY_F13: u16 = 183;
    pub const KEY_F24: u16 = 194;
    /// First of the miscellaneous buttons
    pub const BTN_MISC: u16 = 0x100;
}

/// Classification of a hardware usage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageClass {
    /// G-key, numbered 1..=18
    GKey(u8),
    /// Reserved device-control usage; never forwarded as input
    Special(u16),
    /// Not ours; left to the generic HID mapping
    Default,
}

/// Classify a HID usage
///
/// Accepts either a bare usage id or a full `page << 16 | id` usage.
pub fn map_usage(hid_usage: u32) -> UsageClass {
    let id = (hid_usage & usage::ID_MASK) as u16;
    match id {
        usage::GKEY_FIRST..=usage::GKEY_LAST => UsageClass::GKey((id - usage::GKEY_FIRST + 1) as u8),
        usage::GKEY_EXT_FIRST..=usage::GKEY_EXT_LAST => {
            UsageClass::GKey((id - usage::GKEY_EXT_FIRST + 17) as u8)
        }
        usage::SPECIAL_MIN..=usage::SPECIAL_MAX => UsageClass::Special(id),
        _ => UsageClass::Default,
    }
}

/// Logical key code for each G-key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GKeyMap {
    codes: [u16; GKEY_COUNT],
}

impl Default for GKeyMap {
    /// F13..F24 for G1..G12, then BTN_MISC+0..5 for G13..G18
    fn default() -> Self {
        let mut codes = [0u16; GKEY_COUNT];
        for (i, code) in codes.iter_mut().enumerate() {
            *code = if i < 12 {
                key_code::KEY_F13 + i as u16
            } else {
                key_code::BTN_MISC + (i - 12) as u16
            };
        }
        Self { codes }
    }
}

impl GKeyMap {
    pub fn new(codes: [u16; GKEY_COUNT]) -> Self {
        Self { codes }
    }

    /// Build from a whole table; partial tables are rejected
    pub fn from_slice(codes: &[u16]) -> Result<Self, KeyboardError> {
        let codes: [u16; GKEY_COUNT] = codes.try_into().map_err(|_| {
            KeyboardError::InvalidArgument(format!(
                "G-key table needs exactly {} entries, got {}",
                GKEY_COUNT,
                codes.len()
            ))
        })?;
        Ok(Self { codes })
    }

    /// Code for G-key `gkey` (1-based)
    pub fn code(&self, gkey: u8) -> Option<u16> {
        let idx = (gkey as usize).checked_sub(1)?;
        self.codes.get(idx).copied()
    }

    pub fn codes(&self) -> &[u16; GKEY_COUNT] {
        &self.codes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_gkey_range_is_bijective() {
        let gkey_usages: Vec<u16> = (0xd0..=0xdf).chain(0xe8..=0xe9).collect();
        let mut seen = HashSet::new();
        for u in &gkey_usages {
            match map_usage(*u as u32) {
                UsageClass::GKey(n) => {
                    assert!((1..=18).contains(&n), "usage {:#x} -> G{}", u, n);
                    assert!(seen.insert(n), "G{} mapped twice", n);
                }
                other => panic!("usage {:#x} mapped to {:?}", u, other),
            }
        }
        assert_eq!(seen.len(), 18);
    }

    #[test]
    fn test_gkey_numbering() {
        assert_eq!(map_usage(0xd0), UsageClass::GKey(1));
        assert_eq!(map_usage(0xdf), UsageClass::GKey(16));
        assert_eq!(map_usage(0xe8), UsageClass::GKey(17));
        assert_eq!(map_usage(0xe9), UsageClass::GKey(18));
    }

    #[test]
    fn test_special_range() {
        for u in 0xf0..=0xffu32 {
            assert_eq!(map_usage(u), UsageClass::Special(u as u16));
        }
    }

    #[test]
    fn test_other_usages_default() {
        for u in [0x00u32, 0x04, 0xcf, 0xe0, 0xe7, 0xea, 0xef, 0x100, 0xd0d0] {
            assert_eq!(map_usage(u), UsageClass::Default, "usage {:#x}", u);
        }
    }

    #[test]
    fn test_page_is_ignored() {
        assert_eq!(map_usage(0x0007_00d5), UsageClass::GKey(6));
        assert_eq!(map_usage(0x0007_00f6), UsageClass::Special(0xf6));
        assert_eq!(map_usage(0x0007_0004), UsageClass::Default);
    }

    #[test]
    fn test_default_table() {
        let map = GKeyMap::default();
        let codes = map.codes();

        let fkeys: HashSet<u16> = codes[..12].iter().copied().collect();
        assert_eq!(fkeys.len(), 12);
        assert_eq!(codes[0], key_code::KEY_F13);
        assert_eq!(codes[11], key_code::KEY_F24);

        let buttons: HashSet<u16> = codes[12..].iter().copied().collect();
        assert_eq!(buttons.len(), 6);
        assert!(buttons.iter().all(|c| (0x100..=0x105).contains(c)));
        assert!(fkeys.is_disjoint(&buttons));
    }

    #[test]
    fn test_code_lookup() {
        let map = GKeyMap::default();
        assert_eq!(map.code(1), Some(183));
        assert_eq!(map.code(18), Some(0x105));
        assert_eq!(map.code(0), None);
        assert_eq!(map.code(19), None);
    }

    #[test]
    fn test_whole_table_override() {
        let table: Vec<u16> = (30..48).collect();
        let map = GKeyMap::from_slice(&table).unwrap();
        assert_eq!(map.code(1), Some(30));
        assert_eq!(map.code(18), Some(47));

        assert!(matches!(
            GKeyMap::from_slice(&table[..17]),
            Err(KeyboardError::InvalidArgument(_))
        ));
        assert!(GKeyMap::from_slice(&[0u16; 19]).is_err());
    }
}
