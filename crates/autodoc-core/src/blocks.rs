//! dbt `docs` blocks: scanning, rendering, and the repair pass.
//!
//! A well-formed block looks like
//!
//! ```text
//! {% docs parcel_id %}
//! The identifier for the parcel.
//! {% enddocs %}
//! ```
//!
//! Whitespace-control variants (`{%- docs x -%}`) are recognised. Any other
//! Jinja tag is treated as plain text. Scanning never fails: a block with no
//! closing tag runs until the next opening tag or the end of the text, and a
//! stray closing tag stays in the surrounding text.

use std::collections::HashSet;

use serde::Serialize;

/// Closing tag emitted by [`DocBlock::render`] and by the repair pass.
pub const END_TAG: &str = "{% enddocs %}";

/// Separator placed between blocks in the documentation store.
pub const BLOCK_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind<'a> {
    Open(&'a str),
    Close,
}

#[derive(Debug, Clone, Copy)]
struct Tag<'a> {
    kind: TagKind<'a>,
    start: usize,
    end: usize,
}

fn tags(text: &str) -> Vec<Tag<'_>> {
    let mut out = Vec::new();
    let mut pos = 0;

    while let Some(rel) = text[pos..].find("{%") {
        let start = pos + rel;
        let inner_start = start + 2;
        let Some(inner_len) = text[inner_start..].find("%}") else {
            break;
        };
        let end = inner_start + inner_len + 2;
        let inner = text[inner_start..inner_start + inner_len]
            .trim()
            .trim_matches('-')
            .trim();

        let mut words = inner.split_whitespace();
        let kind = match (words.next(), words.next(), words.next()) {
            (Some("docs"), Some(name), None) => Some(TagKind::Open(name)),
            (Some("enddocs"), None, None) => Some(TagKind::Close),
            _ => None,
        };
        if let Some(kind) = kind {
            out.push(Tag { kind, start, end });
        }
        pos = end;
    }

    out
}

/// A block as it appears in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan<'a> {
    pub name: &'a str,
    /// Full source span, from the opening tag to the closing tag (or to
    /// wherever an unterminated block stops).
    pub raw: &'a str,
    pub body: &'a str,
    pub closed: bool,
}

/// Source text split into blocks and the text between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Block(BlockSpan<'a>),
}

/// Split `text` into blocks and interstitial text, in source order.
///
/// Concatenating every segment's text reproduces the input exactly.
#[must_use]
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut cursor = 0;
    // (name, opening tag start, body start)
    let mut open: Option<(&str, usize, usize)> = None;

    for tag in tags(text) {
        match (tag.kind, open) {
            (TagKind::Open(name), None) => {
                push_text(&mut out, &text[cursor..tag.start]);
                open = Some((name, tag.start, tag.end));
            }
            (TagKind::Open(name), Some((prev, start, body_start))) => {
                out.push(Segment::Block(BlockSpan {
                    name: prev,
                    raw: &text[start..tag.start],
                    body: &text[body_start..tag.start],
                    closed: false,
                }));
                open = Some((name, tag.start, tag.end));
            }
            (TagKind::Close, Some((name, start, body_start))) => {
                out.push(Segment::Block(BlockSpan {
                    name,
                    raw: &text[start..tag.end],
                    body: &text[body_start..tag.start],
                    closed: true,
                }));
                cursor = tag.end;
                open = None;
            }
            (TagKind::Close, None) => {}
        }
    }

    match open {
        Some((name, start, body_start)) => out.push(Segment::Block(BlockSpan {
            name,
            raw: &text[start..],
            body: &text[body_start..],
            closed: false,
        })),
        None => push_text(&mut out, &text[cursor..]),
    }

    out
}

fn push_text<'a>(out: &mut Vec<Segment<'a>>, text: &'a str) {
    if !text.is_empty() {
        out.push(Segment::Text(text));
    }
}

/// An owned documentation block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocBlock {
    pub name: String,
    pub body: String,
    pub closed: bool,
}

impl DocBlock {
    /// A well-formed block.
    #[must_use]
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            closed: true,
        }
    }

    /// Render as a closed block with the body trimmed.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "{{% docs {} %}}\n{}\n{END_TAG}",
            self.name,
            self.body.trim()
        )
    }
}

impl From<BlockSpan<'_>> for DocBlock {
    fn from(span: BlockSpan<'_>) -> Self {
        Self {
            name: span.name.to_string(),
            body: span.body.to_string(),
            closed: span.closed,
        }
    }
}

/// Every block in `text`, including unterminated ones.
#[must_use]
pub fn parse(text: &str) -> Vec<DocBlock> {
    segments(text)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Block(span) => Some(DocBlock::from(span)),
            Segment::Text(_) => None,
        })
        .collect()
}

/// Distinct block names in first-occurrence order.
#[must_use]
pub fn block_names(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    parse(text)
        .into_iter()
        .filter(|block| seen.insert(block.name.clone()))
        .map(|block| block.name)
        .collect()
}

/// Render blocks separated by a blank line.
#[must_use]
pub fn render_all(blocks: &[DocBlock]) -> String {
    blocks
        .iter()
        .map(DocBlock::render)
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Invariant violations found in a documentation store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub blocks: usize,
    pub unterminated: Vec<String>,
    pub duplicates: Vec<String>,
}

impl Diagnostics {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unterminated.is_empty() && self.duplicates.is_empty()
    }
}

/// Report unterminated blocks and later duplicates without changing anything.
#[must_use]
pub fn diagnose(text: &str) -> Diagnostics {
    let mut seen = HashSet::new();
    let mut report = Diagnostics::default();
    for block in parse(text) {
        report.blocks += 1;
        if !block.closed {
            report.unterminated.push(block.name.clone());
        }
        if !seen.insert(block.name.clone()) {
            report.duplicates.push(block.name);
        }
    }
    report
}

/// Result of [`repair`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repair {
    #[serde(skip)]
    pub text: String,
    /// Blocks that received a closing tag.
    pub closed: Vec<String>,
    /// Later duplicates that were removed.
    pub dropped: Vec<String>,
}

impl Repair {
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.closed.is_empty() || !self.dropped.is_empty()
    }
}

/// Close unterminated blocks and drop later duplicates of a block name.
///
/// - An unterminated block is closed right before the next opening tag, or
///   at the end of the text. Whitespace that preceded that point is kept
///   after the inserted closing tag.
/// - The first block with a given name wins, closed or not. Later blocks with
///   the same name are removed together with the blank lines that followed
///   them.
/// - All other text is copied verbatim, so repairing clean text is a no-op.
#[must_use]
pub fn repair(text: &str) -> Repair {
    let mut seen = HashSet::new();
    let mut out = String::with_capacity(text.len());
    let mut closed = Vec::new();
    let mut dropped = Vec::new();
    let mut after_dropped = false;

    for segment in segments(text) {
        match segment {
            Segment::Text(t) if after_dropped => {
                let rest = t.trim_start();
                out.push_str(rest);
                after_dropped = rest.is_empty();
            }
            Segment::Text(t) => out.push_str(t),
            Segment::Block(span) => {
                if !seen.insert(span.name) {
                    dropped.push(span.name.to_string());
                    after_dropped = true;
                    continue;
                }
                after_dropped = false;

                if span.closed {
                    out.push_str(span.raw);
                } else {
                    let kept = span.raw.trim_end();
                    out.push_str(kept);
                    out.push('\n');
                    out.push_str(END_TAG);
                    out.push_str(&span.raw[kept.len()..]);
                    closed.push(span.name.to_string());
                }
            }
        }
    }

    if after_dropped {
        let len = out.trim_end().len();
        out.truncate(len);
        if text.ends_with('\n') {
            out.push('\n');
        }
    }

    Repair {
        text: out,
        closed,
        dropped,
    }
}

/// [`repair`], returning only the cleaned text.
#[must_use]
pub fn deduplicate_and_close(text: &str) -> String {
    repair(text).text
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const CLEAN: &str = "\
{% docs parcel_id %}
The identifier for the parcel.
{% enddocs %}

{% docs owner_name %}
Name of the owner of record.
{% enddocs %}
";

    #[test]
    fn segments_reassemble_input() {
        let text = "intro\n{% docs a %}x{% enddocs %} mid {% docs b %}y";
        let rebuilt: String = segments(text)
            .iter()
            .map(|segment| match segment {
                Segment::Text(t) => *t,
                Segment::Block(span) => span.raw,
            })
            .collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn parses_well_formed_blocks() {
        let blocks = parse(CLEAN);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "parcel_id");
        assert_eq!(blocks[0].body.trim(), "The identifier for the parcel.");
        assert!(blocks.iter().all(|b| b.closed));
    }

    #[test]
    fn recognises_whitespace_control_tags() {
        let blocks = parse("{%- docs tax_year -%}\nYear.\n{%- enddocs -%}");
        assert_eq!(blocks, vec![DocBlock::new("tax_year", "\nYear.\n")]);
    }

    #[test]
    fn ignores_other_jinja_tags() {
        let text = "{% if x %}{% docs a %}body {{ ref('m') }}{% enddocs %}{% endif %}";
        let names = block_names(text);
        assert_eq!(names, vec!["a".to_string()]);
    }

    #[test]
    fn unterminated_block_runs_to_next_opening_tag() {
        let text = "{% docs a %}\nbody a\n\n{% docs b %}\nbody b\n{% enddocs %}";
        let blocks = parse(text);
        assert_eq!(blocks.len(), 2);
        assert!(!blocks[0].closed);
        assert_eq!(blocks[0].body, "\nbody a\n\n");
        assert!(blocks[1].closed);
    }

    #[test]
    fn block_names_are_distinct_in_order() {
        let text = format!("{CLEAN}\n{{% docs parcel_id %}}\nagain\n{{% enddocs %}}");
        assert_eq!(block_names(&text), vec!["parcel_id", "owner_name"]);
    }

    #[test]
    fn render_produces_closed_block() {
        let block = DocBlock::new("parcel_id", "  The identifier.\n");
        assert_eq!(
            block.render(),
            "{% docs parcel_id %}\nThe identifier.\n{% enddocs %}"
        );
    }

    #[test]
    fn diagnose_reports_problems() {
        let text = "{% docs a %}x{% enddocs %}\n{% docs b %}y\n{% docs a %}z{% enddocs %}";
        let report = diagnose(text);
        assert_eq!(report.blocks, 3);
        assert_eq!(report.unterminated, vec!["b"]);
        assert_eq!(report.duplicates, vec!["a"]);
        assert!(!report.is_clean());
        assert!(diagnose(CLEAN).is_clean());
    }

    #[test]
    fn repair_closes_before_next_opening_tag() {
        let text = "{% docs a %}\nbody a\n\n{% docs b %}\nbody b\n{% enddocs %}\n";
        let repaired = repair(text);
        assert_eq!(
            repaired.text,
            "{% docs a %}\nbody a\n{% enddocs %}\n\n{% docs b %}\nbody b\n{% enddocs %}\n"
        );
        assert_eq!(repaired.closed, vec!["a"]);
        assert!(repaired.dropped.is_empty());
    }

    #[test]
    fn repair_closes_at_end_of_text() {
        let repaired = repair("{% docs a %}\nbody a\n");
        assert_eq!(repaired.text, "{% docs a %}\nbody a\n{% enddocs %}\n");
    }

    #[test]
    fn repair_keeps_first_duplicate() {
        let text = "{% docs a %}\nfirst\n{% enddocs %}\n\n{% docs a %}\nsecond\n{% enddocs %}\n\n{% docs b %}\nb\n{% enddocs %}\n";
        let repaired = repair(text);
        assert_eq!(
            repaired.text,
            "{% docs a %}\nfirst\n{% enddocs %}\n\n{% docs b %}\nb\n{% enddocs %}\n"
        );
        assert_eq!(repaired.dropped, vec!["a"]);
    }

    #[test]
    fn repair_drops_trailing_duplicate_cleanly() {
        let text = "{% docs a %}\nfirst\n{% enddocs %}\n\n{% docs a %}\nsecond\n{% enddocs %}\n";
        let repaired = repair(text);
        assert_eq!(repaired.text, "{% docs a %}\nfirst\n{% enddocs %}\n");
    }

    #[test]
    fn repair_preserves_text_outside_blocks() {
        let text = "# Shared docs\n\n{% docs a %}\nx\n{% enddocs %}\n\nfooter notes\n";
        let repaired = repair(text);
        assert!(!repaired.changed());
        assert_eq!(repaired.text, text);
    }

    #[rstest]
    #[case(CLEAN)]
    #[case("{% docs a %}\nbody a\n\n{% docs b %}\nbody b")]
    #[case("{% docs a %}x{% enddocs %}\n\n{% docs a %}y\n\n{% docs c %}z{% enddocs %}")]
    #[case("")]
    #[case("no blocks at all {% enddocs %}")]
    fn repair_is_idempotent(#[case] text: &str) {
        let once = deduplicate_and_close(text);
        let twice = deduplicate_and_close(&once);
        assert_eq!(twice, once);
        assert!(diagnose(&once).is_clean());
    }

    #[test]
    fn render_all_separates_with_blank_line() {
        let blocks = vec![DocBlock::new("a", "x"), DocBlock::new("b", "y")];
        assert_eq!(
            render_all(&blocks),
            "{% docs a %}\nx\n{% enddocs %}\n\n{% docs b %}\ny\n{% enddocs %}"
        );
    }
}
