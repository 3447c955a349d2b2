//! Built-in link providers.

mod body_links;
mod urls;

pub(crate) use body_links::BodyLinkProvider;
pub(crate) use urls::UrlLinkProvider;

/// UTF-16 column offset of `chars[..char_idx]`.
fn utf16_col(chars: &[char], char_idx: usize) -> usize {
    chars[..char_idx].iter().map(|c| c.len_utf16()).sum()
}
