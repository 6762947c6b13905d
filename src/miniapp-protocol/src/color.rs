//! Packed 24-bit RGB colors.
//!
//! Embedded content sends and receives colors as hex strings, while the host
//! keeps them as packed `0xRRGGBB` values. Alpha is never exchanged over the
//! bridge.
//!
//! # Supported Formats
//!
//! - `#RGB` (shorthand, expanded to `#RRGGBB`)
//! - `#RRGGBB`
//!
//! The `#` prefix is optional on input. Output is always six lowercase digits.
//!
//! # Examples
//!
//! ```
//! use miniapp_protocol::color::Rgb;
//!
//! let accent = Rgb::from_hex("#2481CC").unwrap();
//! assert_eq!(accent.to_hex(), "2481cc");
//! assert_eq!(accent.to_string(), "#2481cc");
//! assert_eq!(Rgb::from_hex("fff").unwrap(), Rgb::WHITE);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ColorParseError;

/// An opaque RGB color packed as `0xRRGGBB`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rgb(u32);

impl fmt::Debug for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rgb(#{})", self.to_hex())
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl Rgb {
    /// Opaque black (#000000).
    pub const BLACK: Self = Self(0x000000);

    /// Opaque white (#ffffff).
    pub const WHITE: Self = Self(0xFFFFFF);

    /// Creates a color from a packed value. Bits above the low 24 are discarded.
    pub const fn new(rgb: u32) -> Self {
        Self(rgb & 0x00FF_FFFF)
    }

    /// Returns the packed `0xRRGGBB` value.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns true for pure black.
    pub const fn is_black(self) -> bool {
        self.0 == 0
    }

    /// Returns the packed value as a signed 32-bit bit pattern, the form the
    /// messaging service expects for theme parameters.
    pub const fn to_i32_bits(self) -> i32 {
        self.0 as i32
    }

    /// Parses a color from a hex string.
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);

        if hex.is_empty() {
            return Err(ColorParseError::EmptyInput);
        }

        // from_str_radix tolerates a leading sign, so check digits up front
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError::InvalidHexChar);
        }

        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            len => return Err(ColorParseError::InvalidLength(len)),
        };

        u32::from_str_radix(&expanded, 16)
            .map(Self::new)
            .map_err(|_| ColorParseError::InvalidHexChar)
    }

    /// Formats the color as six lowercase hex digits without a prefix.
    pub fn to_hex(self) -> String {
        format!("{:06x}", self.0)
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<u32> for Rgb {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex_long_and_short() {
        assert_eq!(Rgb::from_hex("#FF8000").unwrap(), Rgb::new(0xFF8000));
        assert_eq!(Rgb::from_hex("ff8000").unwrap(), Rgb::new(0xFF8000));
        assert_eq!(Rgb::from_hex("#f80").unwrap(), Rgb::new(0xFF8800));
        assert_eq!(Rgb::from_hex("  #000000 ").unwrap(), Rgb::BLACK);
    }

    #[test]
    fn test_from_hex_rejects_garbage() {
        assert_eq!(Rgb::from_hex(""), Err(ColorParseError::EmptyInput));
        assert_eq!(Rgb::from_hex("#"), Err(ColorParseError::EmptyInput));
        assert_eq!(Rgb::from_hex("#12345"), Err(ColorParseError::InvalidLength(5)));
        assert_eq!(Rgb::from_hex("#ff00ff80"), Err(ColorParseError::InvalidLength(8)));
        assert_eq!(Rgb::from_hex("+12345"), Err(ColorParseError::InvalidHexChar));
        assert_eq!(Rgb::from_hex("red"), Err(ColorParseError::InvalidHexChar));
    }

    #[test]
    fn test_to_hex_is_lowercase_without_alpha() {
        assert_eq!(Rgb::new(0xABCDEF).to_hex(), "abcdef");
        assert_eq!(Rgb::new(0x0000FF).to_hex(), "0000ff");
        assert_eq!(Rgb::new(0xFF_123456).to_hex(), "123456");
    }

    #[test]
    fn test_value_and_black() {
        assert_eq!(Rgb::new(0x123456).value(), 0x123456);
        assert!(Rgb::BLACK.is_black());
        assert!(!Rgb::WHITE.is_black());
    }

    #[test]
    fn test_i32_bits() {
        assert_eq!(Rgb::WHITE.to_i32_bits(), 0x00FF_FFFF);
        assert_eq!(Rgb::BLACK.to_i32_bits(), 0);
    }
}
