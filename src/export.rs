//! Standalone HTML page for a transcript.

use crate::format::escape_html;
use crate::transcript::Transcript;

const PAGE_STYLE: &str = r##"
*{margin:0;padding:0;box-sizing:border-box}
body{background:#f5f7fb;color:#1f2933;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;line-height:1.6}
header{padding:16px 24px;background:#1f3a60;color:#fff}
header h1{font-size:1.1rem}
#transcript{max-width:860px;margin:24px auto;padding:0 16px;display:flex;flex-direction:column;gap:14px}
.message{padding:12px 16px;border-radius:10px;max-width:85%;word-wrap:break-word;white-space:pre-wrap}
.user-message{align-self:flex-end;background:#2f6fed;color:#fff}
.assistant-message{align-self:flex-start;background:#fff;border:1px solid #dde3ec}
.structured-response{white-space:normal}
.message-header{display:flex;justify-content:space-between;align-items:center;font-size:.75rem;color:#52606d;margin-bottom:6px}
.copy-button{border:1px solid #cbd2d9;background:#f5f7fa;border-radius:4px;padding:1px 8px;font-size:.7rem;cursor:pointer}
.message-source{margin-top:8px;font-size:.72rem;color:#7b8794}
pre{background:#0d1117;color:#c9d1d9;padding:10px;border-radius:6px;overflow-x:auto;white-space:pre}
code{font-family:'Fira Code',monospace;font-size:.85em}
.loading-text{font-style:italic;color:#7b8794}
"##;

/// Render the transcript as a complete HTML document.
pub fn render_document(transcript: &Transcript, title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{PAGE_STYLE}</style>\n</head>\n<body>\n\
         <header><h1>{title}</h1></header>\n<main id=\"transcript\">\n{body}\n</main>\n</body>\n</html>\n",
        title = escape_html(title),
        body = transcript.html(),
    )
}
