/// Wikilinks and relative markdown links, resolved lazily to files on disk.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::{Position, Range, Url};
use tracing::debug;

use super::utf16_col;
use crate::document::TextDocument;
use crate::errors::ProviderError;
use crate::provider::{LinkProvider, RawLink, ResolveLink};

/// The syntactic format of a body link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum LinkFormat {
    Wikilink,
    Markdown,
}

/// A link found in the document body.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BodyLink {
    /// The link target (filename or path, without anchor).
    pub target: String,
    /// Fragment/anchor portion after `#`, if any.
    pub anchor: Option<String>,
    pub format: LinkFormat,
    /// 0-based line number.
    pub line: usize,
    /// 0-based UTF-16 column offset of the link start.
    pub start_col: usize,
    /// 0-based UTF-16 column offset one past the link end.
    pub end_col: usize,
}

/// What a body link carries until it is resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PendingTarget {
    source: Url,
    target: String,
    anchor: Option<String>,
    format: LinkFormat,
}

/// Reports wikilinks and markdown links whose targets are files in the workspace.
pub(crate) struct BodyLinkProvider {
    root: Option<PathBuf>,
}

impl BodyLinkProvider {
    pub(crate) fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Map a link target to a candidate path.
    ///
    /// - `./x`, `../x` resolve against the source document's directory
    /// - `/x` and bare paths resolve against the workspace root, falling back
    ///   to the source directory when no root is known
    /// - `.md` is appended when the target has no extension
    fn candidate_path(&self, source_dir: &Path, target: &str) -> PathBuf {
        let mut path = if target.starts_with("./") || target.starts_with("../") {
            source_dir.join(target)
        } else {
            let base = self.root.as_deref().unwrap_or(source_dir);
            base.join(target.trim_start_matches('/'))
        };
        if path.extension().is_none() {
            path.set_extension("md");
        }
        path
    }
}

#[tower_lsp::async_trait]
impl LinkProvider for BodyLinkProvider {
    fn id(&self) -> &str {
        "body-links"
    }

    async fn provide_links(
        &self,
        document: &TextDocument,
        token: &CancellationToken,
    ) -> Result<Vec<RawLink>, ProviderError> {
        if token.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        let links = find_body_links(&document.text())
            .into_iter()
            .map(|link| {
                let line = link.line as u32;
                let range = Range::new(
                    Position::new(line, link.start_col as u32),
                    Position::new(line, link.end_col as u32),
                );
                let pending = PendingTarget {
                    source: document.uri.clone(),
                    target: link.target,
                    anchor: link.anchor,
                    format: link.format,
                };
                RawLink::new(range, None).with_data(serde_json::json!(pending))
            })
            .collect();
        Ok(links)
    }

    fn resolver(&self) -> Option<&dyn ResolveLink> {
        Some(self)
    }
}

#[tower_lsp::async_trait]
impl ResolveLink for BodyLinkProvider {
    async fn resolve_link(
        &self,
        link: &RawLink,
        token: &CancellationToken,
    ) -> Result<Option<RawLink>, ProviderError> {
        let Some(data) = link.data.clone() else {
            return Ok(None);
        };
        let pending: PendingTarget = serde_json::from_value(data)
            .map_err(|e| ProviderError::Failed(format!("malformed link data: {e}")))?;
        let Ok(source_path) = pending.source.to_file_path() else {
            debug!(source = %pending.source, "body_links: source is not a file");
            return Ok(None);
        };
        let source_dir = source_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut path = self.candidate_path(&source_dir, &pending.target);
        if !exists(&path).await? {
            if token.is_cancelled() {
                return Err(ProviderError::Cancelled);
            }
            match self.find_by_name(&pending, token).await? {
                Some(found) => path = found,
                None => {
                    debug!(target = %pending.target, "body_links: no file for link target");
                    return Ok(None);
                }
            }
        }
        if token.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let Ok(mut url) = Url::from_file_path(&path) else {
            return Ok(None);
        };
        url.set_fragment(pending.anchor.as_deref());
        debug!(target = %pending.target, url = %url, "body_links: resolved");
        Ok(Some(RawLink::new(link.range, Some(url.to_string()))))
    }
}

impl BodyLinkProvider {
    /// Bare wikilink names may live in any folder: search the workspace by file stem.
    async fn find_by_name(
        &self,
        pending: &PendingTarget,
        token: &CancellationToken,
    ) -> Result<Option<PathBuf>, ProviderError> {
        let (Some(root), LinkFormat::Wikilink) = (self.root.clone(), pending.format) else {
            return Ok(None);
        };
        if pending.target.contains('/') {
            return Ok(None);
        }
        let stem = pending.target.clone();
        let scan_token = token.clone();
        let found = tokio::task::spawn_blocking(move || find_file_by_stem(&root, &stem, &scan_token))
            .await
            .map_err(|e| ProviderError::Failed(format!("workspace scan failed: {e}")))?;
        if token.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }
        Ok(found)
    }
}

async fn exists(path: &Path) -> Result<bool, ProviderError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| ProviderError::Failed(format!("{}: {e}", path.display())))
}

/// Depth-first search for `<stem>.md`; stops early once `token` is cancelled.
fn find_file_by_stem(dir: &Path, stem: &str, token: &CancellationToken) -> Option<PathBuf> {
    if token.is_cancelled() {
        return None;
    }
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if !hidden {
                subdirs.push(path);
            }
        } else if path.extension().and_then(|e| e.to_str()) == Some("md")
            && path.file_stem().and_then(|s| s.to_str()) == Some(stem)
        {
            return Some(path);
        }
    }
    subdirs.sort();
    subdirs.iter().find_map(|d| find_file_by_stem(d, stem, token))
}

/// Scan the full document text and return all body links.
///
/// Skips links inside fenced code blocks and inline code spans, image
/// embeds (`![[...]]`, `![...](...)`) and external URLs.
pub(crate) fn find_body_links(text: &str) -> Vec<BodyLink> {
    let mut links = Vec::new();
    let mut in_fenced_block = false;

    for (line_idx, line) in text.lines().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fenced_block = !in_fenced_block;
            continue;
        }
        if in_fenced_block {
            continue;
        }
        parse_line_links(line, line_idx, &mut links);
    }

    links
}

fn parse_line_links(line: &str, line_idx: usize, out: &mut Vec<BodyLink>) {
    let chars: Vec<char> = line.chars().collect();
    let len = chars.len();
    let mut i = 0;

    while i < len {
        if chars[i] == '`' {
            i += 1;
            while i < len && chars[i] != '`' {
                i += 1;
            }
            i += 1;
            continue;
        }

        // [[target]], [[target|alias]], [[target#anchor]]
        if i + 1 < len && chars[i] == '[' && chars[i + 1] == '[' {
            let is_embed = i > 0 && chars[i - 1] == '!';
            let start = i;
            i += 2;
            let content_start = i;
            while i < len && !(chars[i] == ']' && i + 1 < len && chars[i + 1] == ']') {
                i += 1;
            }
            if i >= len {
                break; // unclosed
            }
            let content: String = chars[content_start..i].iter().collect();
            i += 2;
            if is_embed {
                continue;
            }

            let target_part = content.split('|').next().unwrap_or_default();
            let (target, anchor) = split_anchor(target_part);
            if !target.is_empty() {
                out.push(BodyLink {
                    target,
                    anchor,
                    format: LinkFormat::Wikilink,
                    line: line_idx,
                    start_col: utf16_col(&chars, start),
                    end_col: utf16_col(&chars, i),
                });
            }
            continue;
        }

        // [text](path)
        if chars[i] == '[' {
            let is_image = i > 0 && chars[i - 1] == '!';
            let start = i;
            i += 1;
            let mut depth = 1;
            while i < len && depth > 0 {
                match chars[i] {
                    '[' => depth += 1,
                    ']' => depth -= 1,
                    _ => {}
                }
                i += 1;
            }
            if depth > 0 || i >= len || chars[i] != '(' {
                continue;
            }
            i += 1;
            let path_start = i;
            let mut depth = 1;
            while i < len && depth > 0 {
                match chars[i] {
                    '(' => depth += 1,
                    ')' => depth -= 1,
                    _ => {}
                }
                i += 1;
            }
            if depth > 0 {
                continue;
            }
            let path: String = chars[path_start..i - 1].iter().collect();
            let path = path.trim();
            if is_image || path.is_empty() || is_external(path) {
                continue;
            }

            let (target, anchor) = split_anchor(path);
            if !target.is_empty() {
                out.push(BodyLink {
                    target,
                    anchor,
                    format: LinkFormat::Markdown,
                    line: line_idx,
                    start_col: utf16_col(&chars, start),
                    end_col: utf16_col(&chars, i),
                });
            }
            continue;
        }

        i += 1;
    }
}

fn is_external(path: &str) -> bool {
    path.split_once(':')
        .is_some_and(|(scheme, _)| scheme.len() > 1 && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+'))
}

/// Split a target string at `#` into (target, anchor).
fn split_anchor(s: &str) -> (String, Option<String>) {
    match s.split_once('#') {
        Some((target, anchor)) => {
            let anchor = anchor.trim();
            (
                target.trim().to_string(),
                (!anchor.is_empty()).then(|| anchor.to_string()),
            )
        }
        None => (s.trim().to_string(), None),
    }
}
