/// Soundex phonetic hash: leading character plus three digit classes,
/// zero-padded. Adjacent duplicate classes collapse; vowels and `h w y`
/// carry no class and break adjacency.
///
/// `robert` and `rupert` both hash to `r163`; `rubin` hashes to `r150`.
pub fn soundex(token: &str) -> Option<String> {
    let mut chars = token.chars();
    let first = chars.next()?;

    let mut code = String::with_capacity(4);
    code.push(first);

    let mut last_class = digit_class(first);
    for ch in chars {
        if code.len() == 4 {
            break;
        }
        match digit_class(ch) {
            Some(class) => {
                if last_class != Some(class) {
                    code.push(class);
                }
                last_class = Some(class);
            }
            None => {
                last_class = None;
            }
        }
    }

    while code.len() < 4 {
        code.push('0');
    }
    Some(code)
}

fn digit_class(ch: char) -> Option<char> {
    match ch {
        'b' | 'f' | 'p' | 'v' => Some('1'),
        'c' | 'g' | 'j' | 'k' | 'q' | 's' | 'x' | 'z' => Some('2'),
        'd' | 't' => Some('3'),
        'l' => Some('4'),
        'm' | 'n' => Some('5'),
        'r' => Some('6'),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_codes() {
        assert_eq!(soundex("robert").unwrap(), "r163");
        assert_eq!(soundex("rupert").unwrap(), "r163");
        assert_eq!(soundex("rubin").unwrap(), "r150");
    }

    #[test]
    fn adjacent_duplicates_collapse() {
        // pf share class 1 and are adjacent, so they emit a single digit.
        assert_eq!(soundex("pfister").unwrap(), "p236");
        assert_eq!(soundex("jackson").unwrap(), "j250");
    }

    #[test]
    fn vowels_break_adjacency() {
        // Both `t`s of tymczak are separated by a vowel, so both count.
        assert_eq!(soundex("tymczak").unwrap(), "t522");
    }

    #[test]
    fn short_tokens_pad_with_zeros() {
        assert_eq!(soundex("a").unwrap(), "a000");
        assert_eq!(soundex("jam").unwrap(), "j500");
    }

    #[test]
    fn empty_token_has_no_code() {
        assert_eq!(soundex(""), None);
    }
}
