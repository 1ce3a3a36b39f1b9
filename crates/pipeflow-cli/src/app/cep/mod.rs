//! Brazilian postal codes (CEP) and their lookup against the ViaCEP service.

mod address;
mod client;
mod scan;

pub use address::*;
pub use client::*;
pub use scan::*;

use core::{fmt, str::FromStr};

/// An eight-digit Brazilian postal code.
///
/// Stored as an integer and always displayed zero-padded, e.g. `07300000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cep(u32);

impl Cep {
    pub const MAX: u32 = 99_999_999;

    /// Returns `None` if `code` has more than eight digits.
    pub const fn new(code: u32) -> Option<Self> {
        if code > Self::MAX {
            None
        } else {
            Some(Self(code))
        }
    }

    pub(crate) const fn new_unchecked(code: u32) -> Self {
        Self(code)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Every code in `[start, end)`, in ascending order.
    pub fn range(start: Self, end: Self) -> impl Iterator<Item = Self> + Send + 'static {
        (start.0..end.0).map(Self)
    }
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}", self.0)
    }
}

impl FromStr for Cep {
    type Err = String;

    /// Accepts `07300000` and `07300-000`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = match s.split_once('-') {
            Some((head, tail)) if head.len() == 5 && tail.len() == 3 => format!("{head}{tail}"),
            Some(_) => return Err(format!("`{s}` is not a postal code (expected 12345-678)")),
            None => s.to_string(),
        };

        if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("`{s}` is not a postal code (expected eight digits)"));
        }

        digits
            .parse::<u32>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| format!("`{s}` is not a postal code"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_zero_padded() {
        assert_eq!(Cep::new_unchecked(7_000_005).to_string(), "07000005");
        assert_eq!(Cep::new_unchecked(0).to_string(), "00000000");
        assert_eq!(Cep::new_unchecked(Cep::MAX).to_string(), "99999999");
    }

    #[test]
    fn parses_plain_and_hyphenated() {
        assert_eq!("07300000".parse::<Cep>(), Ok(Cep::new_unchecked(7_300_000)));
        assert_eq!("07300-123".parse::<Cep>(), Ok(Cep::new_unchecked(7_300_123)));
    }

    #[test]
    fn rejects_malformed_input() {
        for input in ["", "7300000", "073000000", "0730000x", "073-00000", "+7300000"] {
            assert!(input.parse::<Cep>().is_err(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn new_bounds_to_eight_digits() {
        assert_eq!(Cep::new(Cep::MAX).map(Cep::get), Some(Cep::MAX));
        assert_eq!(Cep::new(Cep::MAX + 1), None);
    }

    #[test]
    fn range_is_half_open() {
        let start = Cep::new_unchecked(7_000_008);
        let end = Cep::new_unchecked(7_000_011);
        let codes: Vec<String> = Cep::range(start, end).map(|cep| cep.to_string()).collect();
        assert_eq!(codes, ["07000008", "07000009", "07000010"]);
    }
}
