//! Vertical-text indent blocks: jisage, chitsuki and burasage divs.

use crate::token::Token;

/// An indent block recognized from its `div` class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentBlock {
    /// `jisage_N`: indent N characters from the top of the column.
    Jisage(u16),
    /// `chitsuki_N`: flush to the bottom, N characters up.
    Chitsuki(u16),
    /// `burasage`: hanging indent, already carrying a style.
    Burasage,
}

impl IndentBlock {
    pub fn from_token(token: &Token) -> Option<Self> {
        if !token.is_start("div") {
            return None;
        }
        let class = token.class();
        if class.contains("jisage") {
            amount(class, "jisage_").map(IndentBlock::Jisage)
        } else if class.contains("chitsuki") {
            amount(class, "chitsuki_").map(IndentBlock::Chitsuki)
        } else if class == "burasage" {
            Some(IndentBlock::Burasage)
        } else {
            None
        }
    }

    /// Rewrite the block's opening tag in place.
    ///
    /// The class is kept and a style giving the same layout in vertical
    /// text is set.
    pub fn apply(self, token: &mut Token) {
        match self {
            IndentBlock::Jisage(n) => {
                token.attrs.set("style", format!("margin-top: {n}em"));
            }
            IndentBlock::Chitsuki(n) => {
                token
                    .attrs
                    .set("style", format!("text-align: end; margin-bottom: {n}em"));
            }
            IndentBlock::Burasage => {
                let style = token.attr("style").unwrap_or("").replace("margin-left", "margin-top");
                token.attrs.set("style", style);
            }
        }
    }
}

fn amount(class: &str, prefix: &str) -> Option<u16> {
    let n = class.strip_prefix(prefix)?.parse().ok();
    if n.is_none() {
        log::debug!("Ignoring indent class without a numeric amount: {class}");
    }
    n
}
