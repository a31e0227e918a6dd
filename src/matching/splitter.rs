use std::sync::LazyLock;

use regex::Regex;

use crate::text::condense_whitespace;

/// Numeric literal with optional currency, sign, thousands separators, decimals,
/// and a `%` or short unit suffix.
const VALUE_PATTERN: &str =
    r"[$€£]?[-+]?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?(?:\s?%|(?:bn|ms|kg|km|k|m|b|g|s|h|x))?";

static VALUE_IN_TEXT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:^|[^\p{{L}}\p{{N}}_.])({VALUE_PATTERN})(?:$|[^\p{{L}}\p{{N}}_])"
    ))
    .expect("valid value-in-text regex")
});

static VALUE_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^{VALUE_PATTERN}$")).expect("valid value token regex")
});

/// Splits an entity into at most two components: its first value token and the
/// remaining label, in the order they appear.
///
/// Without a value token the whole (whitespace-collapsed) entity is the only component.
pub fn split(entity: &str) -> Vec<String> {
    let condensed = condense_whitespace(entity);

    let Some(value) = VALUE_IN_TEXT_REGEX
        .captures(&condensed)
        .and_then(|captures| captures.get(1))
    else {
        return vec![condensed];
    };

    // Brackets that wrapped the value dangle on the side facing it.
    let prefix = clean_label_piece(&condensed[..value.start()]).trim_end_matches(is_label_tail);
    let suffix = clean_label_piece(&condensed[value.end()..]).trim_start_matches(is_label_head);
    let label = [prefix, suffix]
        .into_iter()
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<&str>>()
        .join(" ");
    let value_text = value.as_str().to_string();

    if label.is_empty() {
        vec![value_text]
    } else if prefix.is_empty() {
        vec![value_text, label]
    } else {
        vec![label, value_text]
    }
}

pub fn is_value_token(component: &str) -> bool {
    VALUE_TOKEN_REGEX.is_match(component.trim())
}

fn is_separator(character: char) -> bool {
    character.is_whitespace() || matches!(character, ':' | '-' | ',' | '=' | '–' | '—')
}

fn is_label_tail(character: char) -> bool {
    is_separator(character) || matches!(character, '(' | '[')
}

fn is_label_head(character: char) -> bool {
    is_separator(character) || matches!(character, ')' | ']')
}

fn clean_label_piece(piece: &str) -> &str {
    piece.trim_matches(is_separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_separates_leading_percentage_from_label() {
        assert_eq!(
            split("49.99% On-Time Delivery Rate"),
            vec!["49.99%", "On-Time Delivery Rate"]
        );
    }

    #[test]
    fn split_keeps_input_order_when_label_comes_first() {
        assert_eq!(split("Revenue: $4.2bn"), vec!["Revenue", "$4.2bn"]);
        assert_eq!(split("OEE 85.3 %"), vec!["OEE", "85.3 %"]);
    }

    #[test]
    fn split_joins_label_around_embedded_value() {
        assert_eq!(
            split("Headcount 1,250 employees"),
            vec!["Headcount employees", "1,250"]
        );
    }

    #[test]
    fn split_drops_brackets_left_around_the_value() {
        assert_eq!(split("Net Margin (12.5%)"), vec!["Net Margin", "12.5%"]);
        assert_eq!(split("(12.5%) Net Margin"), vec!["12.5%", "Net Margin"]);
        assert_eq!(split("Net Margin [12.5%] YoY"), vec!["Net Margin YoY", "12.5%"]);
        assert_eq!(split("Net Margin: (12.5%)"), vec!["Net Margin", "12.5%"]);
    }

    #[test]
    fn split_keeps_brackets_that_belong_to_the_label() {
        assert_eq!(split("Revenue (EUR) 4.2bn"), vec!["Revenue (EUR)", "4.2bn"]);
        assert_eq!(split("12% (adjusted)"), vec!["12%", "(adjusted)"]);
    }

    #[test]
    fn split_returns_whole_entity_without_value() {
        assert_eq!(
            split("  Unrelated   Missing Phrase "),
            vec!["Unrelated Missing Phrase"]
        );
        assert_eq!(split(""), vec![""]);
    }

    #[test]
    fn split_ignores_digits_glued_to_words() {
        assert_eq!(split("FY2024 Outlook"), vec!["FY2024 Outlook"]);
        assert_eq!(split("3rd Quarter"), vec!["3rd Quarter"]);
        assert_eq!(split("Q3 2024"), vec!["Q3", "2024"]);
    }

    #[test]
    fn split_returns_bare_value() {
        assert_eq!(split("12ms"), vec!["12ms"]);
    }

    #[test]
    fn is_value_token_classifies_components() {
        assert!(is_value_token("49.99%"));
        assert!(is_value_token("$4.2bn"));
        assert!(is_value_token("-3"));
        assert!(!is_value_token("On-Time Delivery Rate"));
        assert!(!is_value_token("Q3"));
    }
}
