//! UTFGrid character codec.
//!
//! Converts between a feature-table index and the character code that
//! represents it on the wire. The encoding starts at code 32 (space) and
//! skips the two codes that would need escaping inside a JSON string:
//!
//! - `34` (`"`)
//! - `92` (`\`)
//!
//! # Example
//!
//! ```
//! use utfgrid::codec::{decode, encode};
//!
//! assert_eq!(encode(0), 32);
//! assert_eq!(encode(2), 35); // skips '"'
//! assert_eq!(decode(35), 2);
//! ```

/// First character code used by the encoding (index 0).
pub const CODE_OFFSET: u32 = 32;

/// Double quote, never emitted by the encoder.
pub const RESERVED_QUOTE: u32 = 34;

/// Backslash, never emitted by the encoder.
pub const RESERVED_BACKSLASH: u32 = 92;

/// Largest character code a grid cell can carry (one UTF-16 code unit).
pub const MAX_CODE: u32 = 0xFFFF;

/// Largest feature index whose code still fits in one UTF-16 code unit.
pub const MAX_INDEX: u32 = MAX_CODE - CODE_OFFSET - 2;

/// Decodes a grid character code into a feature-table index.
///
/// Codes at or above 93 are shifted down once, then codes at or above 35
/// are shifted down once more, then the offset is removed. Input below
/// [`CODE_OFFSET`] is a caller error and saturates to index 0.
#[inline]
pub fn decode(char_code: u32) -> u32 {
    let mut code = char_code;
    if code >= 93 {
        code -= 1;
    }
    if code >= 35 {
        code -= 1;
    }
    code.saturating_sub(CODE_OFFSET)
}

/// Encodes a feature-table index into its grid character code.
///
/// Only used to build synthetic payloads; decoding is the hot path.
#[inline]
pub fn encode(index: u32) -> u32 {
    let mut code = index.saturating_add(CODE_OFFSET);
    if code >= RESERVED_QUOTE {
        code = code.saturating_add(1);
    }
    if code >= RESERVED_BACKSLASH {
        code = code.saturating_add(1);
    }
    code
}

/// Returns true for the two codes the encoding never produces.
#[inline]
pub fn is_reserved(char_code: u32) -> bool {
    char_code == RESERVED_QUOTE || char_code == RESERVED_BACKSLASH
}

/// Encodes an index as a `char`.
///
/// Returns `None` when the code does not fit in a single UTF-16 code unit
/// or lands in the surrogate range, since such a code cannot appear as one
/// grid cell.
pub fn encode_char(index: u32) -> Option<char> {
    let code = encode(index);
    if code > MAX_CODE {
        return None;
    }
    char::from_u32(code)
}

/// Encodes a row of indices into a grid row string.
pub fn encode_row(indices: &[u32]) -> Option<String> {
    indices.iter().map(|&i| encode_char(i)).collect()
}
