//! Markdown-subset rendering service
//!
//! Lessons are authored in a small, non-standard markdown dialect:
//!
//! | Marker | Output |
//! |---|---|
//! | `#`, `##`, `###` | `<h1>` to `<h3>` |
//! | `**x**` / `*x*` | `<strong>` / `<em>` |
//! | `- x` | `<li>` inside a merged `<ul>` |
//! | pipe rows | `<table>` |
//! | `[x]` / `[ ]` | disabled checkbox |
//! | `[text](url)` | link |
//! | `___text___` | fill-in-the-blank span |
//!
//! Rendering is an ordered list of whole-text regex substitutions. The
//! passes interact (a table match is greedy and may swallow neighbouring
//! lines, list merging depends on two list tags sitting on adjacent lines)
//! and the output for malformed input is wrong but never a panic. Input is
//! not HTML-escaped.
//!
//! # Example
//!
//! ```
//! use learning_lab::services::markdown::MarkdownRenderer;
//!
//! let renderer = MarkdownRenderer::preview();
//! let html = renderer.render("# Hello\n- one\n- two");
//! assert!(html.contains("<h1>Hello</h1>"));
//! assert!(html.contains("<ul><li>one</li><li>two</li></ul>"));
//! ```

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("renderer pattern is a valid regex")
}

static H3: Lazy<Regex> = Lazy::new(|| compile(r"(?m)^### (.*)$"));
static H2: Lazy<Regex> = Lazy::new(|| compile(r"(?m)^## (.*)$"));
static H1: Lazy<Regex> = Lazy::new(|| compile(r"(?m)^# (.*)$"));
static BOLD: Lazy<Regex> = Lazy::new(|| compile(r"\*\*(.*?)\*\*"));
static ITALIC: Lazy<Regex> = Lazy::new(|| compile(r"\*(.*?)\*"));
static LIST_ITEM: Lazy<Regex> = Lazy::new(|| compile(r"(?m)^- (.*)$"));
static LIST_SEAM: Lazy<Regex> = Lazy::new(|| compile(r"</ul>\r?\n<ul>"));
static TABLE: Lazy<Regex> = Lazy::new(|| compile(r"(?s)\|.*\|"));
static CHECKED: Lazy<Regex> = Lazy::new(|| compile(r"\[[xX]\]"));
static UNCHECKED: Lazy<Regex> = Lazy::new(|| compile(r"\[ \]"));
static LINK: Lazy<Regex> = Lazy::new(|| compile(r"\[([^\]]+)\]\(([^)\s]+)\)"));
static FILL_BLANK: Lazy<Regex> = Lazy::new(|| compile(r"___(.+?)___"));
static TABLE_RULE_CELL: Lazy<Regex> = Lazy::new(|| compile(r"^:?-+:?$"));

/// Which set of passes a call site uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ruleset {
    /// Lesson and question paper preview: every pass.
    #[default]
    Preview,
    /// Chat replies: block structure and emphasis only.
    Chat,
}

/// A single substitution pass, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Headings,
    Bold,
    Italic,
    Lists,
    Tables,
    Checkboxes,
    Links,
    FillBlanks,
    Paragraphs,
}

const PREVIEW_PASSES: &[Pass] = &[
    Pass::Headings,
    Pass::Bold,
    Pass::Italic,
    Pass::Lists,
    Pass::Tables,
    Pass::Checkboxes,
    Pass::Links,
    Pass::FillBlanks,
    Pass::Paragraphs,
];

const CHAT_PASSES: &[Pass] = &[
    Pass::Headings,
    Pass::Bold,
    Pass::Italic,
    Pass::Lists,
    Pass::Tables,
    Pass::Paragraphs,
];

impl Ruleset {
    pub fn passes(&self) -> &'static [Pass] {
        match self {
            Ruleset::Preview => PREVIEW_PASSES,
            Ruleset::Chat => CHAT_PASSES,
        }
    }
}

/// Rendering knobs, usually derived from the current settings snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub ruleset: Ruleset,
    pub open_links_in_new_tab: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            ruleset: Ruleset::Preview,
            open_links_in_new_tab: true,
        }
    }
}

/// Markdown-subset to HTML renderer.
///
/// Cheap to copy; all patterns are compiled once per process.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Renderer with the preview ruleset and default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn preview() -> Self {
        Self::new()
    }

    pub fn chat() -> Self {
        Self::with_options(RenderOptions {
            ruleset: Ruleset::Chat,
            ..Default::default()
        })
    }

    /// Renders the markdown subset to an HTML fragment.
    ///
    /// Total: any input produces some output.
    pub fn render(&self, markdown: &str) -> String {
        self.options
            .ruleset
            .passes()
            .iter()
            .fold(markdown.to_string(), |text, pass| self.apply(*pass, &text))
    }

    fn apply(&self, pass: Pass, text: &str) -> String {
        match pass {
            Pass::Headings => {
                let text = H3.replace_all(text, "<h3>${1}</h3>");
                let text = H2.replace_all(&text, "<h2>${1}</h2>");
                H1.replace_all(&text, "<h1>${1}</h1>").into_owned()
            }
            Pass::Bold => BOLD.replace_all(text, "<strong>${1}</strong>").into_owned(),
            Pass::Italic => ITALIC.replace_all(text, "<em>${1}</em>").into_owned(),
            Pass::Lists => {
                let text = LIST_ITEM.replace_all(text, "<ul><li>${1}</li></ul>");
                LIST_SEAM.replace_all(&text, "").into_owned()
            }
            Pass::Tables => TABLE
                .replace_all(text, |caps: &Captures| render_table(&caps[0]))
                .into_owned(),
            Pass::Checkboxes => {
                let text = CHECKED.replace_all(text, r#"<input type="checkbox" checked disabled>"#);
                UNCHECKED
                    .replace_all(&text, r#"<input type="checkbox" disabled>"#)
                    .into_owned()
            }
            Pass::Links => {
                let replacement = if self.options.open_links_in_new_tab {
                    r#"<a href="${2}" target="_blank" rel="noopener noreferrer">${1}</a>"#
                } else {
                    r#"<a href="${2}">${1}</a>"#
                };
                LINK.replace_all(text, replacement).into_owned()
            }
            Pass::FillBlanks => FILL_BLANK
                .replace_all(text, r#"<span class="fill-blank">${1}</span>"#)
                .into_owned(),
            Pass::Paragraphs => wrap_paragraphs(text),
        }
    }
}

/// Renders with the preview ruleset and default options.
pub fn render(markdown: &str) -> String {
    MarkdownRenderer::preview().render(markdown)
}

/// Re-emit a greedy pipe match as a table. The first row is the header;
/// `---` rule rows are dropped. Lines without pipes become one-cell rows.
fn render_table(block: &str) -> String {
    let rows: Vec<Vec<&str>> = block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(split_cells)
        .filter(|cells| !is_rule_row(cells))
        .collect();

    let mut html = String::from("<table>");
    let mut rows = rows.into_iter();

    if let Some(header) = rows.next() {
        html.push_str("<thead><tr>");
        for cell in header {
            html.push_str("<th>");
            html.push_str(cell);
            html.push_str("</th>");
        }
        html.push_str("</tr></thead>");
    }

    let body: Vec<Vec<&str>> = rows.collect();
    if !body.is_empty() {
        html.push_str("<tbody>");
        for row in body {
            html.push_str("<tr>");
            for cell in row {
                html.push_str("<td>");
                html.push_str(cell);
                html.push_str("</td>");
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody>");
    }

    html.push_str("</table>");
    html
}

fn split_cells(line: &str) -> Vec<&str> {
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(str::trim).collect()
}

fn is_rule_row(cells: &[&str]) -> bool {
    !cells.is_empty() && cells.iter().all(|cell| TABLE_RULE_CELL.is_match(cell))
}

/// Any non-blank line that does not already start with a tag becomes a
/// paragraph.
fn wrap_paragraphs(text: &str) -> String {
    text.lines()
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('<') {
                line.to_string()
            } else {
                format!("<p>{}</p>", trimmed)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_headings() {
        let html = render("# Hi\n## Sub\n### Small");
        assert!(html.contains("<h1>Hi</h1>"));
        assert!(html.contains("<h2>Sub</h2>"));
        assert!(html.contains("<h3>Small</h3>"));
    }

    #[test]
    fn test_heading_needs_space() {
        let html = render("#hashtag");
        assert_eq!(html, "<p>#hashtag</p>");
    }

    #[test]
    fn test_render_bold_and_italic() {
        let html = render("**bold** and *soft*");
        assert_eq!(html, "<strong>bold</strong> and <em>soft</em>");
    }

    #[test]
    fn test_bold_alone() {
        assert!(render("**bold**").contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_adjacent_list_items_share_one_list() {
        let html = render("- a\n- b");
        assert_eq!(html, "<ul><li>a</li><li>b</li></ul>");
        assert_eq!(html.matches("<ul>").count(), 1);
        assert_eq!(html.matches("<li>").count(), 2);
    }

    #[test]
    fn test_separated_list_items_stay_separate() {
        let html = render("- a\n\n- b");
        assert_eq!(html.matches("<ul>").count(), 2);
    }

    #[test]
    fn test_checked_checkbox() {
        let html = render("[x] done");
        assert!(html.contains(r#"<input type="checkbox" checked disabled>"#));
        assert!(html.contains("done"));
    }

    #[test]
    fn test_unchecked_checkbox_in_list() {
        let html = render("- [ ] todo");
        assert_eq!(html, r#"<ul><li><input type="checkbox" disabled> todo</li></ul>"#);
    }

    #[test]
    fn test_links_respect_new_tab_option() {
        let html = render("[Docs](https://example.com)");
        assert!(html.contains(
            r#"<a href="https://example.com" target="_blank" rel="noopener noreferrer">Docs</a>"#
        ));

        let same_tab = MarkdownRenderer::with_options(RenderOptions {
            ruleset: Ruleset::Preview,
            open_links_in_new_tab: false,
        });
        assert_eq!(
            same_tab.render("[Docs](https://example.com)"),
            r#"<a href="https://example.com">Docs</a>"#
        );
    }

    #[test]
    fn test_fill_blank() {
        let html = render("The capital is ___Paris___.");
        assert_eq!(
            html,
            r#"<p>The capital is <span class="fill-blank">Paris</span>.</p>"#
        );
    }

    #[test]
    fn test_table() {
        let html = render("| A | B |\n|---|---|\n| 1 | 2 |");
        assert_eq!(
            html,
            "<table><thead><tr><th>A</th><th>B</th></tr></thead><tbody><tr><td>1</td><td>2</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_table_match_is_greedy_across_lines() {
        // Everything between the first and last pipe is one table.
        let html = render("| A |\nplain words\n| B |");
        assert_eq!(html.matches("<table>").count(), 1);
        assert!(html.contains("<td>plain words</td>"));
        assert!(!html.contains("<p>"));
    }

    #[test]
    fn test_paragraphs() {
        let html = render("first line\n\nsecond line");
        assert_eq!(html, "<p>first line</p>\n\n<p>second line</p>");
    }

    #[test]
    fn test_chat_ruleset_skips_links_checkboxes_and_blanks() {
        let chat = MarkdownRenderer::chat();
        let html = chat.render("[x] see [Docs](https://example.com) and ___blank___");
        assert!(!html.contains("<input"));
        assert!(!html.contains("<a "));
        assert!(!html.contains("fill-blank"));
        assert!(html.starts_with("<p>"));
    }

    #[test]
    fn test_chat_and_preview_agree_on_shared_passes() {
        let text = "# Title\n**bold** text\n- a\n- b";
        assert_eq!(MarkdownRenderer::chat().render(text), render(text));
    }

    #[test]
    fn test_pass_order_checkbox_before_link() {
        // `[x](url)` is claimed by the checkbox pass first.
        let html = render("[x](https://example.com)");
        assert!(html.contains("checkbox"));
        assert!(!html.contains("<a "));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render(""), "");
    }

    #[test]
    fn test_unbalanced_markers_do_not_panic() {
        let html = render("**open *half | pipe [link](");
        assert!(!html.is_empty());
    }
}
