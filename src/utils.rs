use crate::errors::{ModError, ModResult};

/// Magic tag of a 31-sample, 4-channel module ("M.K.")
pub const MOD_MAGIC: [u8; 4] = *b"M.K.";

/// Width of the song title field
pub const TITLE_LEN: usize = 20;
/// Width of each sample name field
pub const SAMPLE_NAME_LEN: usize = 22;
/// Number of sample slots, used or not
pub const SAMPLE_COUNT: usize = 31;
/// Entries in the sequence (order) table
pub const SEQUENCE_LEN: usize = 128;
/// Highest pattern index a sequence entry may hold
pub const MAX_PATTERN_INDEX: u8 = 63;
/// Highest playable song length
pub const MAX_SONG_LENGTH: u8 = 128;
/// Value conventionally stored in the byte after the song length
pub const RESTART_BYTE: u8 = 127;
/// Highest sample volume
pub const MAX_VOLUME: u8 = 64;

pub const ROWS_PER_PATTERN: usize = 64;
pub const CHANNELS: usize = 4;
pub const NOTE_SIZE: usize = 4;
pub const PATTERN_SIZE: usize = ROWS_PER_PATTERN * CHANNELS * NOTE_SIZE;

/// Bytes in one on-disk sample header: name, length, fine tune, volume, repeat start, repeat length
pub const SAMPLE_HEADER_SIZE: usize = SAMPLE_NAME_LEN + 2 + 1 + 1 + 2 + 2;

/// Offset of the magic tag within a module
pub const MAGIC_OFFSET: usize = TITLE_LEN + SAMPLE_COUNT * SAMPLE_HEADER_SIZE + 2 + SEQUENCE_LEN;

/// Size of everything before the first pattern
pub const HEADER_SIZE: usize = MAGIC_OFFSET + MOD_MAGIC.len();

/// Longest sample a 16-bit word count can describe
pub const MAX_SAMPLE_BYTES: usize = u16::MAX as usize * 2;

/// Detect if data is an M.K. module by checking the tag at offset 1080
pub fn is_mod(data: &[u8]) -> bool {
    data.len() >= HEADER_SIZE && data[MAGIC_OFFSET..HEADER_SIZE] == MOD_MAGIC
}

/// Map raw text bytes to a string, one char per byte (ISO-8859-1)
///
/// Every byte value has a char, so this never fails and `latin1_to_bytes`
/// gives the exact bytes back.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Map a string back to one byte per char, rejecting chars above U+00FF
pub fn latin1_to_bytes(field: &str, text: &str) -> ModResult<Vec<u8>> {
    text.chars()
        .map(|c| {
            u8::try_from(u32::from(c)).map_err(|_| ModError::InvalidText {
                field: field.to_string(),
                character: c,
            })
        })
        .collect()
}

/// Serde adapter for fixed arrays longer than serde's built-in 32.
///
/// Written as a plain sequence; deserializing anything but exactly `N`
/// elements is an error.
pub mod fixed_array {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T, const N: usize>(array: &[T; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        serializer.collect_seq(array.iter())
    }

    pub fn deserialize<'de, D, T, const N: usize>(deserializer: D) -> Result<[T; N], D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        let items = Vec::<T>::deserialize(deserializer)?;
        let len = items.len();
        items
            .try_into()
            .map_err(|_| D::Error::invalid_length(len, &format!("an array of {} elements", N).as_str()))
    }
}

#[cfg(test)]
mod test_utils {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_layout_constants() {
        assert_eq!(SAMPLE_HEADER_SIZE, 30);
        assert_eq!(MAGIC_OFFSET, 1080);
        assert_eq!(HEADER_SIZE, 1084);
        assert_eq!(PATTERN_SIZE, 1024);
        assert_eq!(MAX_SAMPLE_BYTES, 131_070);
    }

    #[test]
    fn test_magic_detection() {
        let mut data = vec![0u8; HEADER_SIZE];
        assert!(!is_mod(&data));

        data[MAGIC_OFFSET..].copy_from_slice(b"M.K.");
        assert!(is_mod(&data));

        data[MAGIC_OFFSET] = b'X';
        assert!(!is_mod(&data));

        // Too short to hold the tag
        assert!(!is_mod(&data[..HEADER_SIZE - 1]));
        assert!(!is_mod(&[]));
    }

    #[test]
    fn test_latin1_conversion() {
        assert_eq!(latin1_to_string(b"TECH-CRASH"), "TECH-CRASH");
        assert_eq!(latin1_to_string(&[0x41, 0xE9, 0xFF]), "A\u{e9}\u{ff}");
        assert_eq!(latin1_to_bytes("name", "A\u{e9}\u{ff}").unwrap(), vec![0x41, 0xE9, 0xFF]);
    }

    #[test]
    fn test_latin1_rejects_wide_chars() {
        let result = latin1_to_bytes("sample 4 name", "bass\u{2603}");
        match result.unwrap_err() {
            ModError::InvalidText { field, character } => {
                assert_eq!(field, "sample 4 name");
                assert_eq!(character, '\u{2603}');
            },
            other => panic!("Expected InvalidText error, got {:?}", other),
        }
    }

    #[test]
    fn test_fixed_array_rejects_wrong_length() {
        #[derive(serde::Serialize, serde::Deserialize, Debug)]
        struct Table {
            #[serde(with = "fixed_array")]
            entries: [u8; 40],
        }

        let table = Table { entries: [7; 40] };
        let json = serde_json::to_string(&table).unwrap();
        let parsed: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.entries, [7; 40]);

        let result = serde_json::from_str::<Table>("{\"entries\":[1,2,3]}");
        assert!(result.is_err());
    }

    proptest! {
        #[test]
        fn test_latin1_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
            let text = latin1_to_string(&bytes);
            prop_assert_eq!(latin1_to_bytes("field", &text).unwrap(), bytes);
        }
    }
}
