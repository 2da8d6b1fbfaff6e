//! Normalizers for the numeric and identifier noise in the source exports.
//!
//! Both feeds come out of spreadsheet tooling configured for different
//! locales, so `to_number` has to accept `1.234,56`, `1,234.56`, `1234,56`
//! and plain `1234` alike. Keys (client ids, plates, catalog keys) carry
//! stray whitespace and case differences, so every join and identity
//! comparison goes through `to_key` first.

/// Converts a raw cell into an `f64`. Total function, never fails.
///
/// Rules, in order:
/// - missing / empty / whitespace-only → 0.0
/// - comma and dot both present: dots are thousands separators (removed),
///   the comma is the decimal separator
/// - only comma present: a comma followed by exactly three trailing digits
///   is read as a thousands separator (`12,345` → 12345), otherwise the
///   comma is the decimal separator. Known limitation kept from the field:
///   a genuine three-decimal value like `1,500` parses as one thousand five
///   hundred.
/// - otherwise parsed as-is
///
/// Anything that still fails to parse, or parses to a non-finite value,
/// yields 0.0.
pub fn to_number(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else { return 0.0 };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let has_comma = trimmed.contains(',');
    let has_dot = trimmed.contains('.');

    let cleaned = if has_comma && has_dot {
        trimmed.replace('.', "").replacen(',', ".", 1)
    } else if has_comma {
        if is_thousands_grouped(trimmed) {
            trimmed.replace(',', "")
        } else {
            trimmed.replacen(',', ".", 1)
        }
    } else {
        trimmed.replace(',', "")
    };

    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// True when the string ends in a comma followed by exactly three digits,
/// the heuristic for a thousands-grouped integer like `12,345`.
fn is_thousands_grouped(s: &str) -> bool {
    match s.rfind(',') {
        Some(pos) => {
            let tail = &s[pos + 1..];
            tail.len() == 3 && tail.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Canonicalizes an identifier for joining and identity comparison:
/// trims, collapses internal whitespace runs to a single space, uppercases.
pub fn to_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Folds a header cell for loose name matching: lowercases and strips the
/// Latin diacritics that show up in Spanish-language exports ("Latitud",
/// "Ubicación"). Used only to recognize optional columns by name, never for
/// join keys.
pub fn fold_header(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_number_missing_and_blank() {
        assert_eq!(to_number(None), 0.0);
        assert_eq!(to_number(Some("")), 0.0);
        assert_eq!(to_number(Some("   ")), 0.0);
    }

    #[test]
    fn test_to_number_locale_formats() {
        assert_eq!(to_number(Some("1.234,56")), 1234.56);
        assert_eq!(to_number(Some("1234,56")), 1234.56);
        assert_eq!(to_number(Some("1234")), 1234.0);
        assert_eq!(to_number(Some("12,345")), 12345.0);
        assert_eq!(to_number(Some("1,234,567")), 1234567.0);
        assert_eq!(to_number(Some("12,34")), 12.34);
        assert_eq!(to_number(Some("-3,5")), -3.5);
    }

    #[test]
    fn test_to_number_mixed_separators_read_dot_as_grouping() {
        // With both separators present the dot is always grouping, even
        // for US-formatted input
        assert_eq!(to_number(Some("1,234.56")), 1.23456);
        assert_eq!(to_number(Some("2.500,75")), 2500.75);
    }

    #[test]
    fn test_to_number_garbage_is_zero() {
        assert_eq!(to_number(Some("n/a")), 0.0);
        assert_eq!(to_number(Some("12kg")), 0.0);
        assert_eq!(to_number(Some("inf")), 0.0);
        assert_eq!(to_number(Some("NaN")), 0.0);
    }

    #[test]
    fn test_to_number_idempotent_through_display() {
        for raw in ["1.234,56", "1,234.56", "1234,56", "1234", ""] {
            let n = to_number(Some(raw));
            let display = n.to_string();
            assert_eq!(n, to_number(Some(display.as_str())), "raw input {raw:?}");
        }
    }

    #[test]
    fn test_to_key_collapses_and_uppercases() {
        assert_eq!(to_key("  cli  -  a  "), "CLI - A");
        assert_eq!(to_key("plt\t01"), "PLT 01");
        assert_eq!(to_key(""), "");
    }

    #[test]
    fn test_to_key_is_stable_for_equal_identities() {
        assert_eq!(to_key("Cli-A"), to_key("  CLI-a "));
    }

    #[test]
    fn test_fold_header_strips_accents() {
        assert_eq!(fold_header("Latitud"), "latitud");
        assert_eq!(fold_header(" LONGITUD "), "longitud");
        assert_eq!(fold_header("Ubicación"), "ubicacion");
    }
}
