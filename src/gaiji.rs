//! Gaiji (non-Unicode glyph) resolution.
//!
//! The archive renders characters outside its source encoding as inline
//! images. Each image carries, somewhere, a JIS X 0213 men-ku-ten code
//! (plane-row-cell, written `1-85-25`); a [`GaijiResolver`] turns that code
//! into the Unicode text that replaces the image.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::error::{Error, Result};
use crate::token::Token;

/// Directory the archive serves glyph images from, relative to a work page.
pub const GAIJI_IMAGE_DIR: &str = "../../../gaiji/";

/// Why a glyph code could not be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GaijiError {
    #[error("{0}: not a valid men-ku-ten code")]
    InvalidCode(String),

    #[error("no Unicode mapping for {0}")]
    Unmapped(String),
}

/// Maps archive glyph codes to Unicode text.
pub trait GaijiResolver {
    fn resolve(&self, code: &str) -> std::result::Result<String, GaijiError>;
}

impl<R: GaijiResolver + ?Sized> GaijiResolver for &R {
    fn resolve(&self, code: &str) -> std::result::Result<String, GaijiError> {
        (**self).resolve(code)
    }
}

/// Resolver with no mappings; every image stays an image.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGaiji;

impl GaijiResolver for NoGaiji {
    fn resolve(&self, code: &str) -> std::result::Result<String, GaijiError> {
        let mkt: MenKuTen = code.parse()?;
        Err(GaijiError::Unmapped(mkt.to_string()))
    }
}

/// A JIS X 0213 men-ku-ten coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenKuTen {
    pub men: u8,
    pub ku: u8,
    pub ten: u8,
}

impl MenKuTen {
    /// The table key for this coordinate: `3-XXXX` for plane 1, `4-XXXX` for
    /// plane 2, with row and cell offset by 0x20.
    pub fn jis_key(&self) -> String {
        format!(
            "{}-{:02X}{:02X}",
            self.men + 2,
            self.ku + 0x20,
            self.ten + 0x20
        )
    }

    /// Inverse of [`MenKuTen::jis_key`].
    pub fn from_jis_key(key: &str) -> Option<Self> {
        let (plane, hex) = key.trim().split_once('-')?;
        let men = match plane {
            "3" => 1,
            "4" => 2,
            _ => return None,
        };
        let hex = hex.trim_start_matches("0x").trim_start_matches("0X");
        if hex.len() != 4 {
            return None;
        }
        let row = u8::from_str_radix(&hex[..2], 16).ok()?;
        let cell = u8::from_str_radix(&hex[2..], 16).ok()?;
        let mkt = Self {
            men,
            ku: row.checked_sub(0x20)?,
            ten: cell.checked_sub(0x20)?,
        };
        mkt.is_valid().then_some(mkt)
    }

    fn is_valid(&self) -> bool {
        matches!(self.men, 1 | 2) && (1..=94).contains(&self.ku) && (1..=94).contains(&self.ten)
    }
}

impl FromStr for MenKuTen {
    type Err = GaijiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || GaijiError::InvalidCode(s.to_string());
        let mut fields = s.trim().split('-');
        let (Some(men), Some(ku), Some(ten), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(invalid());
        };
        let parse = |field: &str| field.parse::<u8>().map_err(|_| invalid());
        let mkt = Self {
            men: parse(men)?,
            ku: parse(ku)?,
            ten: parse(ten)?,
        };
        if mkt.is_valid() { Ok(mkt) } else { Err(invalid()) }
    }
}

impl fmt::Display for MenKuTen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}-{:02}", self.men, self.ku, self.ten)
    }
}

/// In-memory men-ku-ten → Unicode table.
///
/// Loaded from lines of the form `3-2121,<text>` where `<text>` is either the
/// literal replacement or one or more code points written `U+XXXX+YYYY`.
#[derive(Debug, Clone, Default)]
pub struct GaijiTable {
    map: HashMap<MenKuTen, String>,
}

impl GaijiTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: MenKuTen, text: impl Into<String>) {
        self.map.insert(code, text.into());
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Parse a table from its text form.
    pub fn parse(source: &str) -> Result<Self> {
        let mut table = Self::new();

        for (index, line) in source.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let fail = |message: &str| Error::GaijiTable {
                line: index + 1,
                message: message.to_string(),
            };

            let (key, value) = line
                .split_once([',', '\t'])
                .ok_or_else(|| fail("expected `jis,text`"))?;
            let code = MenKuTen::from_jis_key(key).ok_or_else(|| fail("bad JIS key"))?;
            let text = parse_table_value(value).ok_or_else(|| fail("bad code point"))?;
            table.insert(code, text);
        }

        log::debug!("Loaded {} gaiji mappings", table.len());
        Ok(table)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }
}

impl GaijiResolver for GaijiTable {
    fn resolve(&self, code: &str) -> std::result::Result<String, GaijiError> {
        let mkt: MenKuTen = code.parse()?;
        self.map
            .get(&mkt)
            .cloned()
            .ok_or_else(|| GaijiError::Unmapped(mkt.to_string()))
    }
}

fn parse_table_value(value: &str) -> Option<String> {
    let value = value.trim();
    if !value.starts_with("U+") {
        return (!value.is_empty()).then(|| value.to_string());
    }
    value
        .split('+')
        .skip(1)
        .map(|hex| u32::from_str_radix(hex.trim(), 16).ok().and_then(char::from_u32))
        .collect()
}

/// Find the glyph code an image stands for, if it is a gaiji image.
///
/// Checked in order: an explicit `data-jcode` attribute, a men-ku-ten code in
/// an `alt` text starting with `※`, then the file stem of `src` for images
/// served from the glyph directory or marked with class `gaiji`.
pub fn glyph_code(token: &Token) -> Option<String> {
    if !token.is_element("img") {
        return None;
    }

    if let Some(code) = token.attr("data-jcode").filter(|c| !c.is_empty()) {
        return Some(code.to_string());
    }

    if let Some(code) = token.attr("alt").and_then(jcode_from_alt) {
        return Some(code);
    }

    let src = token.attr("src").unwrap_or("");
    if src.starts_with(GAIJI_IMAGE_DIR) || token.class() == "gaiji" {
        let stem = Path::new(src).file_stem()?.to_str()?;
        return Some(stem.to_string());
    }

    None
}

/// Pull a men-ku-ten code out of a gaiji image's alt text, e.g.
/// `※(「てへん＋劣」、第3水準1-84-77)` gives `1-84-77`.
///
/// Fields are limited to one digit for the plane and two each for row and
/// cell.
pub fn jcode_from_alt(alt: &str) -> Option<String> {
    if !alt.starts_with('※') {
        return None;
    }

    alt.char_indices()
        .filter(|&(i, c)| {
            matches!(c, '1' | '2')
                && alt[i + 1..].starts_with('-')
                && !alt[..i].ends_with(|p: char| p.is_ascii_digit())
        })
        .find_map(|(i, _)| men_ku_ten_at(&alt[i..]))
}

fn men_ku_ten_at(s: &str) -> Option<String> {
    let candidate: String = s
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '-')
        .collect();

    let fields: Vec<&str> = candidate.split('-').collect();
    match fields.as_slice() {
        [men, ku, ten]
            if men.len() == 1
                && (1..=2).contains(&ku.len())
                && (1..=2).contains(&ten.len()) =>
        {
            Some(candidate)
        }
        _ => None,
    }
}
