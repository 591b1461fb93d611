//! Display shortening for long hex and base58 strings.

/// How aggressively a value is shortened for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortenStyle {
    /// `0a1b2c...7d8e9f`: six characters on each side.
    Standard,
    /// `0a1b...`: four leading characters.
    Extreme,
}

impl ShortenStyle {
    /// Shortened display form. Short values are returned unchanged.
    pub fn apply(self, full: &str) -> String {
        let len = full.chars().count();
        match self {
            ShortenStyle::Standard if len > 15 => {
                let head: String = full.chars().take(6).collect();
                let tail: String = full.chars().skip(len - 6).collect();
                format!("{head}...{tail}")
            }
            ShortenStyle::Extreme if len > 7 => {
                let head: String = full.chars().take(4).collect();
                format!("{head}...")
            }
            _ => full.to_string(),
        }
    }
}
