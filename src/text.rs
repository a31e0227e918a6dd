pub fn condense_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Case-folded, whitespace-collapsed form used for searching and cache keys.
pub fn normalize_search_text(input: &str) -> String {
    condense_whitespace(input).to_lowercase()
}

/// Lowercase word tokens; `%` and inner `.`/`,` are kept so "49.99%" stays one token.
pub fn tokenize(input: &str) -> Vec<String> {
    input
        .split(|character: char| {
            !(character.is_alphanumeric() || matches!(character, '%' | '.' | ',' | '$'))
        })
        .map(|token| token.trim_matches(|character: char| matches!(character, '.' | ',')))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}
