/// Masks a credential for logs and `Debug` output: `abcd...wxyz`.
///
/// Values of eight characters or fewer are fully hidden.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_edges() {
        assert_eq!(mask_secret("abcd1234efgh5678"), "abcd...5678");
    }

    #[test]
    fn hides_short_values_entirely() {
        assert_eq!(mask_secret("short"), "****");
        assert_eq!(mask_secret(""), "****");
    }

    #[test]
    fn handles_multibyte_characters() {
        assert_eq!(mask_secret("ключ-очень-длинный"), "ключ...нный");
    }
}
