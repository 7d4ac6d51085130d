//! Masking helpers for personal data that ends up in log lines.

/// Keeps the first and last character.
pub fn mask_username(username: &str) -> String {
    let chars: Vec<char> = username.chars().collect();
    if chars.len() <= 2 {
        return username.to_string();
    }

    format!("{}{}{}", chars[0], "*".repeat(chars.len() - 2), chars[chars.len() - 1])
}

/// Keeps the first character.
pub fn mask_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first, "*".repeat(chars.count())),
        None => String::new(),
    }
}

/// Keeps the last four characters.
pub fn mask_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= 4 {
        return id.to_string();
    }

    let last_four: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", last_four)
}

pub fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 16 {
        return "***".to_string();
    }

    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 8..].iter().collect();
    format!("{}...{}", head, tail)
}
