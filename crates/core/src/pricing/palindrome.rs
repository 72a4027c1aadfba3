use crate::domain::product::ProductId;

/// Case-insensitive palindrome test over whole characters.
///
/// Character `i` is compared against character `len - 1 - i` for every `i` up to
/// `(len - 1) / 2`. Empty and single-character inputs are palindromes.
pub fn is_palindrome(text: &str) -> bool {
    let chars: Vec<char> = text.chars().flat_map(char::to_lowercase).collect();
    if chars.len() < 2 {
        return true;
    }

    let last = chars.len() - 1;
    (0..=last / 2).all(|index| chars[index] == chars[last - index])
}

/// Palindrome test applied to the canonical base-10 rendering of an id.
pub fn is_palindrome_id(id: ProductId) -> bool {
    is_palindrome(&id.0.to_string())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{is_palindrome, is_palindrome_id};
    use crate::domain::product::ProductId;

    #[test]
    fn digit_strings_match_manual_inspection() {
        assert!(is_palindrome_id(ProductId(181)));
        assert!(!is_palindrome_id(ProductId(123)));
        assert!(is_palindrome_id(ProductId(0)));
        assert!(is_palindrome_id(ProductId(11)));
        assert!(!is_palindrome_id(ProductId(19)));
        assert!(is_palindrome_id(ProductId(7)));
        assert!(is_palindrome_id(ProductId(1221)));
    }

    #[test]
    fn empty_and_single_character_text_is_palindromic() {
        assert!(is_palindrome(""));
        assert!(is_palindrome("x"));
    }

    #[test]
    fn text_comparison_ignores_case() {
        assert!(is_palindrome("Level"));
        assert!(is_palindrome("AbBa"));
        assert!(!is_palindrome("Abc"));
    }

    #[test]
    fn multi_byte_text_compares_whole_characters() {
        assert!(is_palindrome("añña"));
        assert!(is_palindrome("Ésé"));
        assert!(is_palindrome("日本日"));
        assert!(!is_palindrome("日本"));
    }

    proptest! {
        #[test]
        fn id_palindrome_agrees_with_reversed_digits(n in any::<u64>()) {
            let digits = n.to_string();
            let reversed: String = digits.chars().rev().collect();
            prop_assert_eq!(is_palindrome_id(ProductId(n)), digits == reversed);
        }

        #[test]
        fn mirrored_text_is_always_palindromic(half in "[a-zA-Z0-9]{0,16}", middle in "[a-z]?") {
            let mirrored: String = half.chars().rev().collect();
            let text = format!("{half}{middle}{mirrored}");
            prop_assert!(is_palindrome(&text));
        }
    }
}
