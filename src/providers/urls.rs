/// Bare `http://` / `https://` URL detection.
use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::{Position, Range, Url};

use super::utf16_col;
use crate::document::TextDocument;
use crate::errors::ProviderError;
use crate::provider::{LinkProvider, RawLink};

/// Reports every web URL in the document, with its address known upfront.
pub(crate) struct UrlLinkProvider;

#[tower_lsp::async_trait]
impl LinkProvider for UrlLinkProvider {
    fn id(&self) -> &str {
        "urls"
    }

    async fn provide_links(
        &self,
        document: &TextDocument,
        token: &CancellationToken,
    ) -> Result<Vec<RawLink>, ProviderError> {
        if token.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        Ok(find_urls(&document.text()))
    }
}

const SCHEMES: [&str; 2] = ["https://", "http://"];

pub(crate) fn find_urls(text: &str) -> Vec<RawLink> {
    let mut links = Vec::new();
    for (line_idx, line) in text.lines().enumerate() {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let at_boundary = i == 0 || !chars[i - 1].is_alphanumeric();
            if !at_boundary || !SCHEMES.iter().any(|s| starts_with_at(&chars, i, s)) {
                i += 1;
                continue;
            }

            let mut end = i;
            while end < chars.len() && !is_terminator(chars[end]) {
                end += 1;
            }
            let end = trim_trailing(&chars[i..end]) + i;
            let candidate: String = chars[i..end].iter().collect();

            let valid = Url::parse(&candidate)
                .map(|url| url.host_str().is_some_and(|h| !h.is_empty()))
                .unwrap_or(false);
            if valid {
                let line = line_idx as u32;
                let range = Range::new(
                    Position::new(line, utf16_col(&chars, i) as u32),
                    Position::new(line, utf16_col(&chars, end) as u32),
                );
                links.push(RawLink::new(range, Some(candidate)));
            }
            i = end.max(i + 1);
        }
    }
    links
}

fn starts_with_at(chars: &[char], idx: usize, prefix: &str) -> bool {
    let mut pos = idx;
    for p in prefix.chars() {
        match chars.get(pos) {
            Some(c) if c.eq_ignore_ascii_case(&p) => pos += 1,
            _ => return false,
        }
    }
    true
}

fn is_terminator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '<' | '>' | '"' | '\'' | '`')
}

/// Length of `candidate` once trailing punctuation and unbalanced `)` are removed.
fn trim_trailing(candidate: &[char]) -> usize {
    let mut end = candidate.len();
    while end > 0 {
        match candidate[end - 1] {
            '.' | ',' | ';' | ':' | '!' | '?' => end -= 1,
            ')' => {
                let open = candidate[..end].iter().filter(|&&c| c == '(').count();
                let close = candidate[..end].iter().filter(|&&c| c == ')').count();
                if close > open {
                    end -= 1;
                } else {
                    break;
                }
            }
            _ => break,
        }
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(text: &str) -> Vec<(u32, u32, u32, String)> {
        find_urls(text)
            .into_iter()
            .map(|l| {
                (
                    l.range.start.line,
                    l.range.start.character,
                    l.range.end.character,
                    l.url.unwrap_or_default(),
                )
            })
            .collect()
    }

    #[test]
    fn simple_url() {
        assert_eq!(
            found("check https://example.com for info"),
            vec![(0, 6, 25, "https://example.com".to_string())]
        );
    }

    #[test]
    fn multiple_urls_across_lines() {
        let links = found("visit https://a.com\nand http://b.org today");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].3, "https://a.com");
        assert_eq!((links[1].0, links[1].1), (1, 4));
    }

    #[test]
    fn trailing_punctuation_is_excluded() {
        assert_eq!(found("Go to https://example.com/page.")[0].3, "https://example.com/page");
        assert_eq!(found("Is it https://example.com?")[0].3, "https://example.com");
    }

    #[test]
    fn wrapping_delimiters_are_excluded() {
        assert_eq!(found("(https://example.com/path)")[0].3, "https://example.com/path");
        assert_eq!(found("<https://example.com/path>")[0].3, "https://example.com/path");
        assert_eq!(found("[doc](https://example.com/doc)")[0].3, "https://example.com/doc");
    }

    #[test]
    fn balanced_parentheses_are_kept() {
        assert_eq!(
            found("see https://en.wikipedia.org/wiki/Rust_(language) now")[0].3,
            "https://en.wikipedia.org/wiki/Rust_(language)"
        );
    }

    #[test]
    fn query_and_fragment_are_kept() {
        assert_eq!(
            found("https://example.com/search?q=test#results")[0].3,
            "https://example.com/search?q=test#results"
        );
    }

    #[test]
    fn other_schemes_and_embedded_prefixes_are_ignored() {
        assert!(found("ftp://files.example.com mailto:user@example.com").is_empty());
        assert!(found("xhttps://example.com").is_empty());
        assert!(found("https:// nothing").is_empty());
    }

    #[test]
    fn columns_are_utf16() {
        assert_eq!(found("𝄞 https://a.com")[0].1, 3);
    }
}
