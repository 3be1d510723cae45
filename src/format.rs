//! Content formatting for transcript entries.
//!
//! Two paths produce the HTML body of an entry:
//!
//! - [`format_plain`] escapes the text, then turns fenced code into `<pre><code>`
//!   blocks, single-backtick spans into `<code>`, and bare URLs into isolated
//!   anchors. Code is never linkified.
//! - [`format_rich`] trusts backend HTML, re-applies the code passes and forces
//!   every anchor to open in a new context without opener or referrer.
//!
//! [`extract_text`] goes the other way for the copy action.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:([\w+-]+)\n)?(.*?)```").expect("fence pattern"));

static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").expect("inline pattern"));

static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s<>"]+"#).expect("url pattern"));

static ANCHOR_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<a\b([^>]*)>").expect("anchor pattern"));

static ANCHOR_TARGET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\starget\s*=").expect("anchor target pattern"));

static ANCHOR_REL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\srel\s*=").expect("anchor rel pattern"));

static RICH_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(p|ul|ol|li|h[1-6]|div)(\s[^>]*)?>").expect("rich tag pattern"));

static BLOCK_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|li|h[1-6]|pre|ul|ol)>").expect("block break pattern")
});

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));

static BLANK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("blank run pattern"));

/// Entity suffixes and punctuation that end a sentence rather than a URL.
const URL_TRAILERS: &[&str] = &["&quot;", "&#039;", "&gt;", "&lt;", "&amp;", ".", ",", ";", ":", "!", "?", ")"];

/// Escape the five HTML-special characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverse [`escape_html`] plus the handful of entities backends commonly emit.
pub fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

/// Whether content carries one of the block tags that mark backend HTML.
pub fn looks_like_rich(content: &str) -> bool {
    RICH_TAG.is_match(content)
}

/// Format untrusted plain text.
pub fn format_plain(text: &str) -> String {
    let escaped = escape_html(text);
    // Interior is already escaped along with the rest of the text.
    replace_segments(&escaped, &FENCE, |caps| code_block(caps, false), format_inline)
}

/// Format trusted backend HTML.
pub fn format_rich(html: &str) -> String {
    let body = replace_segments(
        html,
        &FENCE,
        |caps| code_block(caps, true),
        |gap| replace_segments(gap, &INLINE_CODE, |c| format!("<code>{}</code>", &c[1]), str::to_string),
    );
    isolate_anchors(&body)
}

/// Add `target="_blank"` and `rel="noopener noreferrer"` to anchors missing them.
pub fn isolate_anchors(html: &str) -> String {
    ANCHOR_OPEN
        .replace_all(html, |caps: &Captures| {
            let attrs = &caps[1];
            let mut tag = format!("<a{attrs}");
            if !ANCHOR_TARGET.is_match(attrs) {
                tag.push_str(" target=\"_blank\"");
            }
            if !ANCHOR_REL.is_match(attrs) {
                tag.push_str(" rel=\"noopener noreferrer\"");
            }
            tag.push('>');
            tag
        })
        .into_owned()
}

/// Text content of a rendered body, for the clipboard and the terminal.
///
/// Block boundaries become newlines, tags are dropped and entities decoded.
pub fn extract_text(html: &str) -> String {
    let broken = BLOCK_BREAK.replace_all(html, "\n");
    let stripped = TAG.replace_all(&broken, "");
    let text = unescape_html(&stripped);
    BLANK_RUN.replace_all(text.trim(), "\n\n").into_owned()
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

/// Apply `on_match` to every match of `re` and `on_gap` to the text between.
fn replace_segments(
    text: &str,
    re: &Regex,
    mut on_match: impl FnMut(&Captures) -> String,
    mut on_gap: impl FnMut(&str) -> String,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&on_gap(&text[last..whole.start()]));
        out.push_str(&on_match(&caps));
        last = whole.end();
    }
    out.push_str(&on_gap(&text[last..]));
    out
}

fn code_block(caps: &Captures, escape_interior: bool) -> String {
    let code = caps.get(2).map_or("", |m| m.as_str());
    let code = code.strip_prefix('\n').unwrap_or(code);
    let code = if escape_interior { escape_html(code) } else { code.to_string() };
    match caps.get(1) {
        Some(lang) => format!("<pre><code class=\"language-{}\">{}</code></pre>", lang.as_str(), code),
        None => format!("<pre><code>{code}</code></pre>"),
    }
}

fn format_inline(text: &str) -> String {
    replace_segments(text, &INLINE_CODE, |c| format!("<code>{}</code>", &c[1]), linkify)
}

fn linkify(text: &str) -> String {
    URL.replace_all(text, |caps: &Captures| {
        let (url, trailing) = split_url_trailer(&caps[0]);
        format!("<a href=\"{url}\" target=\"_blank\" rel=\"noopener noreferrer\">{url}</a>{trailing}")
    })
    .into_owned()
}

fn split_url_trailer(matched: &str) -> (&str, &str) {
    let mut end = matched.len();
    'outer: loop {
        for trailer in URL_TRAILERS {
            if matched[..end].ends_with(trailer) && end > trailer.len() {
                end -= trailer.len();
                continue 'outer;
            }
        }
        break;
    }
    matched.split_at(end)
}
