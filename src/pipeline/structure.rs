//! Structuring: turn raw page text into Markdown blocks.
//!
//! pdfium's text layer is a flat string with one line per visual line. Three
//! rules recover the bits of structure that survive that flattening:
//!
//! 1. Join words hyphenated across a line break (`exam-\nple` → `example`)
//! 2. Rewrite bullet glyphs (`•`, `▪`, `◦`, …) as Markdown list items
//! 3. Promote short, standalone, upper-case lines to `##` headings
//!
//! Pages are then joined with the configured [`PageSeparator`].

use crate::config::PageSeparator;
use once_cell::sync::Lazy;
use regex::Regex;

/// Longest line (in chars) still considered a heading candidate.
const MAX_HEADING_CHARS: usize = 80;

/// Structure one page of raw text.
pub fn structure_page(raw: &str) -> String {
    let s = raw.replace("\r\n", "\n").replace('\r', "\n");
    let s = join_hyphenated(&s);
    let s = normalise_bullets(&s);
    promote_headings(&s)
}

/// Structure every page and join them with `separator`.
///
/// Pages with no text are skipped so the output does not accumulate runs of
/// separators for scanned pages.
pub fn assemble_pages(pages: &[String], separator: &PageSeparator) -> String {
    let mut out = String::new();
    let mut first = true;
    for (idx, raw) in pages.iter().enumerate() {
        let page = structure_page(raw);
        if page.trim().is_empty() {
            continue;
        }
        if !first {
            out.push_str(&separator.render(idx + 1));
        }
        out.push_str(page.trim_matches('\n'));
        first = false;
    }
    out
}

// ── Rule 1: Hyphenated line breaks ──────────────────────────────────────────

// pdfium reports line-end hyphenation as `-`, U+00AD (soft hyphen) or U+0002.
static RE_HYPHEN_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\p{L})[-\x{00AD}\x{02}][ \t]*\n[ \t]*(\p{Ll})").unwrap()
});

fn join_hyphenated(input: &str) -> String {
    RE_HYPHEN_BREAK.replace_all(input, "$1$2").to_string()
}

// ── Rule 2: Bullet glyphs ───────────────────────────────────────────────────

static RE_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([ \t]*)[•●▪■◦‣○□·][ \t]*").unwrap());

fn normalise_bullets(input: &str) -> String {
    RE_BULLET.replace_all(input, "$1- ").to_string()
}

// ── Rule 3: Headings ────────────────────────────────────────────────────────

fn promote_headings(input: &str) -> String {
    let lines: Vec<&str> = input.lines().collect();
    let mut out = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        let prev_blank = i == 0 || lines[i - 1].trim().is_empty();
        let next_blank = lines.get(i + 1).is_none_or(|l| l.trim().is_empty());
        if prev_blank && next_blank && is_heading_candidate(line) {
            out.push(format!("## {}", line.trim()));
        } else {
            out.push(line.to_string());
        }
    }

    out.join("\n")
}

fn is_heading_candidate(line: &str) -> bool {
    let t = line.trim();
    if t.is_empty() || t.chars().count() > MAX_HEADING_CHARS {
        return false;
    }
    if t.starts_with('#') || t.starts_with("- ") || t.starts_with('|') {
        return false;
    }
    if t.ends_with(['.', ',', ';', ':']) {
        return false;
    }
    let letters: Vec<char> = t.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 3 && letters.iter().all(|c| c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_hyphenated_words() {
        assert_eq!(
            join_hyphenated("an exam-\nple of text"),
            "an example of text"
        );
        // Capitalised continuation is a real compound, leave it
        assert_eq!(join_hyphenated("Franco-\nGerman"), "Franco-\nGerman");
    }

    #[test]
    fn joins_soft_and_control_hyphen_breaks() {
        assert_eq!(join_hyphenated("exam\u{00AD}\nple"), "example");
        assert_eq!(join_hyphenated("exam\u{0002}\nple"), "example");
        assert_eq!(structure_page("an exam\u{0002}\r\nple"), "an example");
    }

    #[test]
    fn rewrites_bullets() {
        let input = "• first\n  ▪ nested\nplain • inline";
        assert_eq!(
            normalise_bullets(input),
            "- first\n  - nested\nplain • inline"
        );
    }

    #[test]
    fn promotes_standalone_uppercase_lines() {
        let input = "INTRODUCTION\n\nBody text here.";
        assert!(promote_headings(input).starts_with("## INTRODUCTION\n"));
    }

    #[test]
    fn leaves_uppercase_inside_paragraph() {
        let input = "Some text\nNASA REPORT\nmore text";
        assert_eq!(promote_headings(input), input);
    }

    #[test]
    fn heading_candidate_rules() {
        assert!(is_heading_candidate("1. SCOPE OF WORK"));
        assert!(!is_heading_candidate("NOTE:"));
        assert!(!is_heading_candidate("OK"));
        assert!(!is_heading_candidate("Mixed Case Title"));
        assert!(!is_heading_candidate(&"A".repeat(MAX_HEADING_CHARS + 1)));
    }

    #[test]
    fn assemble_skips_empty_pages_and_uses_separator() {
        let pages = vec![
            "First page".to_string(),
            "   \n".to_string(),
            "Third page".to_string(),
        ];
        let md = assemble_pages(&pages, &PageSeparator::Comment);
        assert_eq!(md, "First page\n\n<!-- page 3 -->\n\nThird page");
    }

    #[test]
    fn structure_normalises_crlf() {
        assert_eq!(structure_page("a\r\nb\rc"), "a\nb\nc");
    }
}
