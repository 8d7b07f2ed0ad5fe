use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Number;

use crate::error::CheckError;
use crate::models::CheckResult;

// ── Constants ────────────────────────────────────────────────────────────────

const DATA_URL_PREFIX: &str = "data:";
const ALLOWED_CHARS: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '+', '-', '*', '/', 'x', 'X', '×', '÷',
    '(', ')', '=', ' ',
];

// ── Lazy static regexes ──────────────────────────────────────────────────────

static EQUALS_ANSWER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"=([0-9]+)\s*$").unwrap());

static BARE_ANSWER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]+)\s*$").unwrap());

// ── Public result type ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Model text after trimming and character filtering.
    pub cleaned: String,
    /// Trailing digit run, any length, leading zeros removed.
    pub number: Option<Number>,
}

// ── Input normalizer ─────────────────────────────────────────────────────────

/// Strip a `data:<mime>;base64,` prefix, leaving the bare payload.
pub fn strip_data_url_prefix(image: &str) -> &str {
    if image.starts_with(DATA_URL_PREFIX) {
        if let Some((_, payload)) = image.split_once(',') {
            return payload;
        }
    }
    image
}

// ── Answer extractor ─────────────────────────────────────────────────────────

/// Trim whitespace and backticks, drop spaces, keep only the allowed set.
pub fn clean_answer_text(raw: &str) -> String {
    raw.trim()
        .trim_matches('`')
        .replace(' ', "")
        .chars()
        .filter(|c| ALLOWED_CHARS.contains(c))
        .collect()
}

/// Pull the trailing answer out of model text. `=12` wins over a bare `12`.
pub fn extract_answer(raw: &str) -> Extraction {
    let cleaned = clean_answer_text(raw);
    let number = EQUALS_ANSWER_RE
        .captures(&cleaned)
        .or_else(|| BARE_ANSWER_RE.captures(&cleaned))
        .and_then(|caps| digits_to_number(&caps[1]));
    Extraction { cleaned, number }
}

fn digits_to_number(digits: &str) -> Option<Number> {
    let digits = digits.trim_start_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };
    serde_json::from_str(digits).ok()
}

pub fn check_answer(raw: &str, expected: i64) -> CheckResult {
    let Extraction { cleaned, number } = extract_answer(raw);
    match number {
        Some(number) => {
            // Both sides print as canonical decimal, so this is numeric equality.
            let correct = number.to_string() == expected.to_string();
            CheckResult::success(cleaned, number, correct)
        }
        None => CheckResult::failure_with_raw(cleaned, &CheckError::NoNumberFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_data_url_prefix() {
        assert_eq!(strip_data_url_prefix("data:image/png;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_url_prefix("data:image/jpeg;base64,a,b"), "a,b");
    }

    #[test]
    fn test_strip_leaves_plain_base64_alone() {
        assert_eq!(strip_data_url_prefix("iVBORw0KGgo="), "iVBORw0KGgo=");
        assert_eq!(strip_data_url_prefix(""), "");
        // No comma: not a usable data URL.
        assert_eq!(strip_data_url_prefix("data:AAAA"), "data:AAAA");
        // Prefix must be at the start.
        assert_eq!(strip_data_url_prefix("xdata:a,b"), "xdata:a,b");
    }

    #[test]
    fn test_clean_drops_disallowed_chars() {
        let cleaned = clean_answer_text("The answer: x = 4 + 8 (twelve) ÷ 1");
        assert_eq!(cleaned, "x=4+8()÷1");
        assert!(!cleaned.contains('T'));
        assert!(!cleaned.contains(':'));
        assert!(!cleaned.contains(' '));
    }

    #[test]
    fn test_clean_trims_backticks_and_whitespace() {
        assert_eq!(clean_answer_text("  `=12`\n"), "=12");
        assert_eq!(clean_answer_text("```12```"), "12");
    }

    #[test]
    fn test_clean_is_idempotent() {
        for raw in ["`=12`", " 3 x 4 = 12 ", "answer is twelve", "×÷()", "  7\n"] {
            let once = clean_answer_text(raw);
            assert_eq!(clean_answer_text(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn test_extract_equals_form() {
        let extraction = extract_answer("`=12`");
        assert_eq!(extraction.cleaned, "=12");
        assert_eq!(extraction.number, Some(12.into()));
    }

    #[test]
    fn test_extract_bare_number() {
        assert_eq!(extract_answer("12").number, Some(12.into()));
        assert_eq!(extract_answer("x=007").number, Some(7.into()));
        assert_eq!(extract_answer("3*4 = 12").number, Some(12.into()));
    }

    #[test]
    fn test_extract_takes_trailing_digits_only() {
        let extraction = extract_answer("12+3");
        assert_eq!(extraction.cleaned, "12+3");
        assert_eq!(extraction.number, Some(3.into()));
    }

    #[test]
    fn test_extract_no_number() {
        let extraction = extract_answer("answer is twelve");
        assert_eq!(extraction.cleaned, "");
        assert_eq!(extraction.number, None);
        assert_eq!(extract_answer("12=").number, None);
    }

    #[test]
    fn test_extract_keeps_long_digit_runs() {
        let extraction = extract_answer("=123456789012345678901234");
        assert_eq!(
            extraction.number.map(|n| n.to_string()).as_deref(),
            Some("123456789012345678901234")
        );

        let result = check_answer("=12345678901234567890", 12);
        assert!(result.ok);
        assert_eq!(result.correct, Some(false));
        assert_eq!(result.error, None);
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"ok":true,"raw":"=12345678901234567890","number":12345678901234567890,"correct":false}"#
        );
    }

    #[test]
    fn test_check_answer_with_leading_zeros_and_zero() {
        assert_eq!(check_answer("x=007", 7).correct, Some(true));
        assert_eq!(check_answer("000", 0).correct, Some(true));
        assert_eq!(check_answer("12", -12).correct, Some(false));
    }

    #[test]
    fn test_check_answer_correctness() {
        assert_eq!(
            check_answer("12", 12),
            CheckResult::success("12".into(), 12.into(), true)
        );
        assert_eq!(
            check_answer("=12", 13),
            CheckResult::success("=12".into(), 12.into(), false)
        );
    }

    #[test]
    fn test_check_answer_no_number_keeps_raw() {
        let result = check_answer("no idea", 4);
        assert!(!result.ok);
        assert_eq!(result.raw.as_deref(), Some(""));
        assert_eq!(result.error.as_deref(), Some("no_number_found"));
        assert_eq!(result.number, None);
        assert_eq!(result.correct, None);
    }
}
