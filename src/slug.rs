fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

fn is_slug_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || is_hangul_syllable(c) || c.is_whitespace() || c == '-'
}

/// Turns a free-text title into a URL path segment.
///
/// "Hello World!" becomes "hello-world". Running it on its own output gives the same string back.
/// Uniqueness is not checked here.
pub fn derive_slug(title: &str) -> String {
    let kept: String = title.to_lowercase()
        .chars()
        .filter(|&c| is_slug_char(c))
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut prev_char = None;

    for c in kept.chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c != '-' || prev_char != Some('-') {
            slug.push(c);
        }
        prev_char = Some(c);
    }

    slug.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_slug() {
        assert_eq!(derive_slug("Hello World!"), "hello-world");
        assert_eq!(derive_slug("  multiple   spaces  "), "multiple-spaces");
        assert_eq!(derive_slug("already-a-slug"), "already-a-slug");
        assert_eq!(derive_slug("Rust -- the  Good Parts"), "rust-the-good-parts");
        assert_eq!(derive_slug("Next.js 15 & React 19"), "nextjs-15-react-19");
    }

    #[test]
    fn test_derive_slug_keeps_hangul() {
        assert_eq!(derive_slug("개발 블로그 시작하기"), "개발-블로그-시작하기");
        assert_eq!(derive_slug("Rust로 만든 블로그!"), "rust로-만든-블로그");
    }

    #[test]
    fn test_derive_slug_strips_everything_else() {
        assert_eq!(derive_slug("!!!"), "");
        assert_eq!(derive_slug("Café au lait"), "caf-au-lait");
        assert_eq!(derive_slug("tab\tand\nnewline"), "tab-and-newline");
    }

    #[test]
    fn test_derive_slug_idempotent() {
        let titles = ["Hello World!", "  multiple   spaces  ", "-leading and trailing-", "개발 & 디자인", "a--b---c"];
        for title in titles {
            let once = derive_slug(title);
            assert_eq!(derive_slug(&once), once, "title={}", title);
        }
    }
}
