use serde::Serialize;

/// Local country code. Numbers dialed with it are domestic.
pub const DOMESTIC_COUNTRY_CODE: &str = "39";

/// Canonical form of a dialed number.
///
/// Domestic numbers lose every country-code variant (`+39`, `0039`, bare
/// `39`) and keep their national form (`0558494133`, `3331234567`).
/// International numbers always start with the `00` marker, so `+33...`
/// and `0033...` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedNumber {
    pub cleaned: String,
    pub is_international: bool,
}

impl NormalizedNumber {
    pub fn digit_count(&self) -> usize {
        self.cleaned.len()
    }

    /// Anything shorter than three digits cannot match a real prefix.
    pub fn is_classifiable(&self) -> bool {
        self.digit_count() >= 3
    }
}

/// Turns raw CDR number fields into [`NormalizedNumber`]s
pub struct NumberNormalizer;

impl NumberNormalizer {
    pub fn normalize(raw: &str) -> NormalizedNumber {
        let stripped = Self::strip_formatting(raw);

        if let Some(rest) = stripped.strip_prefix('+') {
            return match rest.strip_prefix(DOMESTIC_COUNTRY_CODE) {
                Some(national) => Self::domestic(national),
                None => Self::international(format!("00{}", rest)),
            };
        }

        if let Some(rest) = stripped.strip_prefix("00") {
            return match rest.strip_prefix(DOMESTIC_COUNTRY_CODE) {
                Some(national) => Self::domestic(national),
                None => Self::international(stripped),
            };
        }

        if Self::has_bare_country_code(&stripped) {
            return Self::domestic(&stripped[DOMESTIC_COUNTRY_CODE.len()..]);
        }

        Self::domestic(&stripped)
    }

    /// Keep digits, plus a `+` only when it is the first significant character.
    fn strip_formatting(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        for c in raw.chars() {
            if c.is_ascii_digit() {
                out.push(c);
            } else if c == '+' && out.is_empty() {
                out.push(c);
            }
        }
        out
    }

    /// A bare `39` is only a country code when what follows is a national
    /// number: a geographic number (leading `0`), or anything longer than
    /// the ten digits of a national mobile number. `3921234567` is a WindTre
    /// mobile, `390558494133` is Firenze.
    fn has_bare_country_code(digits: &str) -> bool {
        let Some(rest) = digits.strip_prefix(DOMESTIC_COUNTRY_CODE) else {
            return false;
        };
        digits.len() >= 8 && (rest.starts_with('0') || digits.len() >= 11)
    }

    fn domestic(national: &str) -> NormalizedNumber {
        NormalizedNumber {
            cleaned: national.to_string(),
            is_international: false,
        }
    }

    fn international(cleaned: String) -> NormalizedNumber {
        NormalizedNumber {
            cleaned,
            is_international: true,
        }
    }
}
