//! Line-oriented Markdown reduction.
//!
//! Strips formatting markers to leave readable plain text. This is not a
//! Markdown AST; each line is reduced independently.

/// Reduce Markdown to plain text: heading markers, emphasis markers,
/// inline code, link syntax (link text kept), list markers, and
/// blockquote markers are removed.
pub fn strip_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&strip_line(line));
    }

    out
}

fn strip_line(line: &str) -> String {
    let line = strip_block_prefix(line);
    let line = strip_links(&line);
    strip_inline_markers(&line)
}

/// Remove leading blockquote, heading, and list markers.
fn strip_block_prefix(line: &str) -> String {
    let mut rest = line.trim_start();

    while let Some(stripped) = rest.strip_prefix('>') {
        rest = stripped.trim_start();
    }

    let hashes = rest.len() - rest.trim_start_matches('#').len();
    if hashes > 0 && rest[hashes..].starts_with(' ') {
        rest = rest[hashes + 1..].trim_start();
    }

    for marker in ["- ", "* ", "+ "] {
        if let Some(stripped) = rest.strip_prefix(marker) {
            return stripped.to_string();
        }
    }

    // Ordered list marker: digits followed by ". "
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 && rest[digits..].starts_with(". ") {
        return rest[digits + 2..].to_string();
    }

    rest.to_string()
}

/// Replace `[text](url)` and `![alt](url)` with the text/alt only.
fn strip_links(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let open = match c {
            '[' => Some(i),
            '!' if matches!(chars.peek(), Some((_, '['))) => {
                chars.next();
                Some(i + 1)
            }
            _ => None,
        };

        let Some(open) = open else {
            out.push(c);
            continue;
        };

        // Need "](...)" after the bracketed text to treat this as a link.
        let rest = &line[open + 1..];
        match rest.find(']') {
            Some(close) if rest[close + 1..].starts_with('(') => match rest[close + 1..].find(')') {
                Some(paren) => {
                    out.push_str(&rest[..close]);
                    let skip_to = open + 1 + close + 1 + paren + 1;
                    while let Some(&(j, _)) = chars.peek() {
                        if j >= skip_to {
                            break;
                        }
                        chars.next();
                    }
                }
                None => out.push(c),
            },
            _ => out.push(c),
        }
    }

    out
}

/// Remove emphasis, strikethrough, and inline-code markers.
fn strip_inline_markers(line: &str) -> String {
    line.replace("**", "")
        .replace("__", "")
        .replace("~~", "")
        .replace(['*', '_', '`'], "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_stripped() {
        assert_eq!(strip_markdown("# Title"), "Title");
        assert_eq!(strip_markdown("### Deep Title"), "Deep Title");
        // '#' without a following space is not a heading
        assert_eq!(strip_markdown("#hashtag"), "#hashtag");
    }

    #[test]
    fn emphasis_stripped() {
        assert_eq!(strip_markdown("**bold** and *italic*"), "bold and italic");
        assert_eq!(strip_markdown("__bold__ and _italic_"), "bold and italic");
        assert_eq!(strip_markdown("~~gone~~ and `code`"), "gone and code");
    }

    #[test]
    fn links_keep_text_only() {
        assert_eq!(strip_markdown("see [the docs](https://example.com)!"), "see the docs!");
        assert_eq!(strip_markdown("![alt text](img.png)"), "alt text");
        // Unbalanced bracket left alone
        assert_eq!(strip_markdown("array[0]"), "array[0]");
    }

    #[test]
    fn list_markers_stripped() {
        assert_eq!(strip_markdown("- item one\n* item two\n+ item three"), "item one\nitem two\nitem three");
        assert_eq!(strip_markdown("1. first\n12. twelfth"), "first\ntwelfth");
    }

    #[test]
    fn blockquotes_stripped() {
        assert_eq!(strip_markdown("> quoted"), "quoted");
        assert_eq!(strip_markdown("> > nested"), "nested");
    }

    #[test]
    fn mixed_document() {
        let md = "# Chapter\n\n> A **bold** [link](u)\n\n- one\n- two";
        assert_eq!(strip_markdown(md), "Chapter\n\nA bold link\n\none\ntwo");
    }
}
