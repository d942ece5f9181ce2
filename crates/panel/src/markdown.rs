//! Lightweight markdown block model for assistant output.
//!
//! Handles the subset of markdown that generation models actually produce:
//! - fenced code blocks with an optional language tag
//! - `# Heading` through `#### Heading`
//! - `- bullet`, `* bullet` and `1.`-style list items
//! - `**bold**`, `` `inline code` `` and `[text](url)` inline spans
//! - blank-line paragraph breaks
//!
//! The output is renderer-agnostic: the embedding UI decides how each
//! block and span is painted.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(String),
    Code(String),
    Link { label: String, url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, spans: Vec<Inline> },
    Paragraph(Vec<Inline>),
    /// One entry per list item, in source order.
    List(Vec<Vec<Inline>>),
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    /// A blank source line; renderers usually translate it to spacing.
    Blank,
}

/// Parse assistant output into blocks.
///
/// A response wrapped whole in a ```` ```markdown ```` fence is unwrapped
/// first; models sometimes emit that around otherwise plain answers.
pub fn parse_markdown(raw: &str) -> Vec<Block> {
    let text = strip_markdown_wrapper(raw.trim());

    let mut blocks = Vec::new();
    let mut list_items: Vec<Vec<Inline>> = Vec::new();
    let mut code: Option<(Option<String>, Vec<String>)> = None;

    for line in text.lines() {
        let trimmed = line.trim();

        if let Some((language, lines)) = code.as_mut() {
            if trimmed.starts_with("```") {
                blocks.push(Block::CodeBlock {
                    language: language.take(),
                    code: lines.join("\n"),
                });
                code = None;
            } else {
                lines.push(line.to_string());
            }
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("```") {
            flush_list(&mut blocks, &mut list_items);
            let language = if rest.is_empty() {
                None
            } else {
                Some(rest.to_string())
            };
            code = Some((language, Vec::new()));
            continue;
        }

        if let Some(item) = strip_list_marker(trimmed) {
            list_items.push(parse_inline(item));
            continue;
        }
        flush_list(&mut blocks, &mut list_items);

        if trimmed.is_empty() {
            blocks.push(Block::Blank);
            continue;
        }

        if let Some((level, rest)) = strip_heading(trimmed) {
            blocks.push(Block::Heading {
                level,
                spans: parse_inline(rest),
            });
            continue;
        }

        blocks.push(Block::Paragraph(parse_inline(trimmed)));
    }

    // Unterminated fence: keep the collected lines as a code block.
    if let Some((language, lines)) = code {
        blocks.push(Block::CodeBlock {
            language,
            code: lines.join("\n"),
        });
    }
    flush_list(&mut blocks, &mut list_items);

    blocks
}

fn strip_markdown_wrapper(text: &str) -> &str {
    if let Some(inner) = text
        .strip_prefix("```markdown")
        .and_then(|t| t.strip_suffix("```"))
    {
        inner.trim()
    } else {
        text
    }
}

fn flush_list(blocks: &mut Vec<Block>, items: &mut Vec<Vec<Inline>>) {
    if !items.is_empty() {
        blocks.push(Block::List(std::mem::take(items)));
    }
}

/// `- item`, `* item` or `1. item` → the item text.
fn strip_list_marker(trimmed: &str) -> Option<&str> {
    if let Some(rest) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) {
        return Some(rest);
    }
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = trimmed[digits..].strip_prefix(". ") {
            return Some(rest);
        }
    }
    None
}

fn strip_heading(trimmed: &str) -> Option<(u8, &str)> {
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if (1..=4).contains(&hashes) {
        if let Some(rest) = trimmed[hashes..].strip_prefix(' ') {
            return Some((hashes as u8, rest));
        }
    }
    None
}

enum Marker {
    Bold,
    Code,
    Link,
}

/// Find the earliest inline marker in the text.
fn find_next_marker(text: &str) -> Option<(usize, Marker)> {
    let mut best: Option<(usize, Marker)> = None;

    if let Some(pos) = text.find("**") {
        best = Some((pos, Marker::Bold));
    }
    if let Some(pos) = text.find('`') {
        if best.as_ref().map(|(p, _)| pos < *p).unwrap_or(true) {
            best = Some((pos, Marker::Code));
        }
    }
    if let Some(pos) = text.find('[') {
        // Only a link if followed by "](" somewhere.
        if text[pos..].contains("](") && best.as_ref().map(|(p, _)| pos < *p).unwrap_or(true) {
            best = Some((pos, Marker::Link));
        }
    }

    best
}

fn push_text(spans: &mut Vec<Inline>, text: &str) {
    if !text.is_empty() {
        spans.push(Inline::Text(text.to_string()));
    }
}

/// Split a line into plain, bold, code and link spans. Unterminated
/// markers are emitted as literal text.
pub fn parse_inline(text: &str) -> Vec<Inline> {
    let mut spans = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        match find_next_marker(remaining) {
            None => {
                push_text(&mut spans, remaining);
                break;
            }
            Some((pos, Marker::Bold)) => {
                push_text(&mut spans, &remaining[..pos]);
                remaining = &remaining[pos + 2..];
                if let Some(end) = remaining.find("**") {
                    spans.push(Inline::Bold(remaining[..end].to_string()));
                    remaining = &remaining[end + 2..];
                } else {
                    push_text(&mut spans, &format!("**{}", remaining));
                    break;
                }
            }
            Some((pos, Marker::Code)) => {
                push_text(&mut spans, &remaining[..pos]);
                remaining = &remaining[pos + 1..];
                if let Some(end) = remaining.find('`') {
                    spans.push(Inline::Code(remaining[..end].to_string()));
                    remaining = &remaining[end + 1..];
                } else {
                    push_text(&mut spans, &format!("`{}", remaining));
                    break;
                }
            }
            Some((pos, Marker::Link)) => {
                push_text(&mut spans, &remaining[..pos]);
                remaining = &remaining[pos + 1..];
                let Some(close_bracket) = remaining.find("](") else {
                    push_text(&mut spans, &format!("[{}", remaining));
                    break;
                };
                let label = &remaining[..close_bracket];
                let after_label = &remaining[close_bracket + 2..];
                if let Some(close_paren) = after_label.find(')') {
                    spans.push(Inline::Link {
                        label: label.to_string(),
                        url: after_label[..close_paren].to_string(),
                    });
                    remaining = &after_label[close_paren + 1..];
                } else {
                    push_text(&mut spans, &format!("[{}]({}", label, after_label));
                    break;
                }
            }
        }
    }

    spans
}
