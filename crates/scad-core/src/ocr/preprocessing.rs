//! Text cleanup applied to every fragment before matching.

/// OCR confusions repaired in numeric context.
const CONFUSABLES: [(char, char); 3] = [('O', '0'), ('S', '5'), ('B', '8')];

/// Normalize fragment text for anchor detection and pattern matching.
///
/// Newlines become spaces, letters are upper-cased, and `O`, `S` and `B`
/// touching digits are read as `0`, `5` and `8`. Letters inside plain words
/// are left alone.
pub fn clean_fragment_text(text: &str) -> String {
    let upper = text.replace(['\r', '\n'], " ").to_uppercase();
    let mut chars: Vec<char> = upper.chars().collect();

    for (letter, digit) in CONFUSABLES {
        repair(&mut chars, letter, digit);
    }

    chars.into_iter().collect()
}

fn repair(chars: &mut [char], letter: char, digit: char) {
    for i in 0..chars.len() {
        if chars[i] != letter {
            continue;
        }

        let prev = i.checked_sub(1).map(|p| chars[p]);
        let next = chars.get(i + 1).copied();

        let prev_digit = prev.is_some_and(|c| c.is_ascii_digit());
        let next_digit = next.is_some_and(|c| c.is_ascii_digit());
        let prev_break = !prev.is_some_and(is_word_char);
        let next_break = !next.is_some_and(is_word_char);

        if (prev_digit && (next_digit || next_break)) || (prev_break && next_digit) {
            chars[i] = digit;
        }
    }
}

/// Regex `\w` over ASCII.
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_repairs_letters_in_numeric_context() {
        assert_eq!(clean_fragment_text("15 O5 2026"), "15 05 2026");
        assert_eq!(clean_fragment_text("31 B8 26"), "31 88 26");
        assert_eq!(clean_fragment_text("S5.03.24"), "55.03.24");
        assert_eq!(clean_fragment_text("12/O5/2O25"), "12/05/2025");
    }

    #[test]
    fn test_leaves_words_alone() {
        assert_eq!(clean_fragment_text("Scadenza"), "SCADENZA");
        assert_eq!(clean_fragment_text("BEST BEFORE"), "BEST BEFORE");
        assert_eq!(clean_fragment_text("LOTTO B12"), "LOTTO 812");
    }

    #[test]
    fn test_joins_lines() {
        assert_eq!(clean_fragment_text("scad\n12/05/2025"), "SCAD 12/05/2025");
    }
}
