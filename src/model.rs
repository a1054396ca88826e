//! Core data model.
//!
//! A work item is a URL paired with its fingerprint. Each unique fingerprint
//! produces one color triple; each input URL produces one report.

use serde::{Deserialize, Serialize};

use crate::fingerprint::fingerprint;

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// Fixed-size digest of a URL string. The dedup cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub [u8; 16]);

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Work Item
// ---------------------------------------------------------------------------

/// A URL waiting to be resolved to a color triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub url: String,
    pub fingerprint: Fingerprint,
}

impl WorkItem {
    /// Fingerprint a raw URL.
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let fingerprint = fingerprint(&url);
        Self { url, fingerprint }
    }
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// An 8-bit-per-channel RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// `#RRGGBB`, uppercase.
    pub fn to_hex(self) -> HexColor {
        let [r, g, b] = self.0;
        HexColor(format!("#{r:02X}{g:02X}{b:02X}"))
    }
}

/// A color code as written to the output: `#RRGGBB`, or one of the
/// placeholder codes [`HexColor::ERROR`] and [`HexColor::NONE`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexColor(String);

impl HexColor {
    /// Emitted in every slot when an image could not be fetched or decoded.
    pub const ERROR: &'static str = "#ERROR";
    /// Pads slots when an image has fewer distinct colors than requested.
    pub const NONE: &'static str = "#NONE";

    pub fn error() -> Self {
        Self(Self::ERROR.to_string())
    }

    pub fn none() -> Self {
        Self(Self::NONE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Color> for HexColor {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl std::fmt::Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three most frequent colors of one image, most frequent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorTriple {
    pub primary: HexColor,
    pub secondary: HexColor,
    pub tertiary: HexColor,
}

impl ColorTriple {
    /// The sentinel produced for any fetch or decode failure.
    pub fn error() -> Self {
        Self {
            primary: HexColor::error(),
            secondary: HexColor::error(),
            tertiary: HexColor::error(),
        }
    }

    /// Build from colors in rank order. Missing slots become [`HexColor::NONE`];
    /// anything past the third is ignored.
    pub fn from_ranked(ranked: impl IntoIterator<Item = HexColor>) -> Self {
        let mut ranked = ranked.into_iter();
        let mut next = || ranked.next().unwrap_or_else(HexColor::none);
        Self {
            primary: next(),
            secondary: next(),
            tertiary: next(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.primary.as_str() == HexColor::ERROR
    }

    pub fn as_array(&self) -> [&HexColor; 3] {
        [&self.primary, &self.secondary, &self.tertiary]
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// One output record. Exactly one per input URL, duplicates included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorReport {
    pub url: String,
    pub colors: ColorTriple,
}

impl ColorReport {
    pub fn new(url: impl Into<String>, colors: ColorTriple) -> Self {
        Self {
            url: url.into(),
            colors,
        }
    }

    /// `url,primary,secondary,tertiary` without the line terminator.
    pub fn to_csv_line(&self) -> String {
        let [a, b, c] = self.colors.as_array();
        format!("{},{a},{b},{c}", self.url)
    }
}
