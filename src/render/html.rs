//! Static HTML site output.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::core::{ContentStore, StoredDocument};
use crate::parser::{
    classify_target, is_indented, list_item, LinkTarget, Lexer, ListKind, Section, Snippet, Token,
};

static INLINE_LINK_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"(!?)\[([^\]]*)\]\(\s*<?([^)\s>]*)>?(?:\s+"([^"]*)")?\s*\)"#).ok()
});

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:52rem;margin:2rem auto;padding:0 1rem;line-height:1.5}\
pre{background:#f6f8fa;padding:.75rem;overflow-x:auto}\
pre.snippet-bad,pre.snippet-before{border-left:4px solid #d73a49}\
pre.snippet-good,pre.snippet-after{border-left:4px solid #28a745}";

struct Context {
    depth: usize,
    buffer: String,
}

impl Context {
    fn new() -> Self {
        Self {
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.add("  ");
        }
        self.add(text);
        self.add("\n");
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Output path of a document, relative to the site root
pub fn html_path(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    let stem_len = if lower.ends_with(".markdown") {
        name.len() - ".markdown".len()
    } else if lower.ends_with(".md") {
        name.len() - ".md".len()
    } else {
        name.len()
    };
    format!("{}.html", &name[..stem_len])
}

/// Point links at other documents to their rendered pages
pub fn rewrite_target(target: &str) -> String {
    match classify_target(target) {
        LinkTarget::Document { path, anchor } => match anchor {
            Some(anchor) => format!("{}#{}", html_path(path), anchor),
            None => html_path(path),
        },
        _ => target.to_string(),
    }
}

/// Render prose with inline code spans, links and images
///
/// Links are found first so a label may hold code spans. Code spans outside
/// a link are masked while matching and stay literal.
pub fn render_inline(text: &str) -> String {
    let Some(re) = INLINE_LINK_RE.as_ref() else {
        return render_code_spans(text);
    };

    let masked = mask_code_spans(text);
    let mut out = String::new();
    let mut last = 0;
    for caps in re.captures_iter(&masked) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&render_code_spans(&text[last..whole.start()]));
        out.push_str(&render_link(text, &caps));
        last = whole.end();
    }
    out.push_str(&render_code_spans(&text[last..]));
    out
}

/// Blank out code span contents, keeping byte offsets
fn mask_code_spans(text: &str) -> String {
    let mut masked = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('`') {
        let after = &rest[start + 1..];
        let Some(len) = after.find('`') else {
            break;
        };
        masked.push_str(&rest[..=start]);
        masked.extend(std::iter::repeat_n(' ', len));
        masked.push('`');
        rest = &after[len + 1..];
    }

    masked.push_str(rest);
    masked
}

fn render_code_spans(text: &str) -> String {
    let mut out = String::new();
    let mut rest = text;

    while let Some(start) = rest.find('`') {
        let after = &rest[start + 1..];
        let Some(len) = after.find('`') else {
            break;
        };
        out.push_str(&escape_html(&rest[..start]));
        out.push_str("<code>");
        out.push_str(&escape_html(&after[..len]));
        out.push_str("</code>");
        rest = &after[len + 1..];
    }

    out.push_str(&escape_html(rest));
    out
}

/// Render one matched link, reading its parts from the unmasked text
fn render_link(text: &str, caps: &Captures<'_>) -> String {
    let part = |idx: usize| caps.get(idx).map_or("", |m| &text[m.range()]);
    let is_image = !part(1).is_empty();
    let label = part(2);
    let target = part(3);
    let title = caps
        .get(4)
        .map(|m| format!(" title=\"{}\"", escape_html(&text[m.range()])))
        .unwrap_or_default();

    if is_image {
        format!(
            "<img src=\"{}\" alt=\"{}\"{}>",
            escape_html(target),
            escape_html(&label.replace('`', "")),
            title
        )
    } else {
        format!(
            "<a href=\"{}\"{}>{}</a>",
            escape_html(&rewrite_target(target)),
            title,
            render_code_spans(label)
        )
    }
}

fn is_html_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with("<!--") && trimmed.ends_with("-->")
}

/// Where the previous text line went, in case an underline turns it into a heading
///
/// List items and their continuations are never taken back.
enum LastText {
    Paragraph,
    Comment(String),
}

/// Block-level state while walking a document
struct BodyWriter<'d> {
    ctx: Context,
    paragraph: Vec<String>,
    list: Option<(ListKind, Vec<String>)>,
    last_text: Option<LastText>,
    sections: Box<dyn Iterator<Item = &'d Section> + 'd>,
    snippets: Vec<&'d Snippet>,
}

impl<'d> BodyWriter<'d> {
    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let text = self.paragraph.join("\n");
        self.paragraph.clear();
        self.ctx.add_line(&format!("<p>{}</p>", render_inline(&text)));
    }

    fn flush_list(&mut self) {
        let Some((kind, items)) = self.list.take() else {
            return;
        };
        let tag = match kind {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        };
        self.ctx.add_line(&format!("<{}>", tag));
        self.ctx.indent();
        for item in items {
            self.ctx.add_line(&format!("<li>{}</li>", render_inline(&item)));
        }
        self.ctx.dedent();
        self.ctx.add_line(&format!("</{}>", tag));
    }

    fn flush(&mut self) {
        self.flush_paragraph();
        self.flush_list();
    }

    fn heading(&mut self, level: u8, text: &str) {
        self.flush();
        let anchor = self.sections.next().map(|s| s.anchor.clone()).unwrap_or_default();
        self.ctx.add_line(&format!(
            "<h{level} id=\"{}\">{}</h{level}>",
            escape_html(&anchor),
            render_inline(text),
        ));
    }

    /// Take back the previous text line so it can become a setext heading
    fn take_last_text(&mut self) -> Option<String> {
        match self.last_text.take()? {
            LastText::Paragraph => self.paragraph.pop(),
            LastText::Comment(line) => Some(line),
        }
    }

    fn text(&mut self, line: &str) {
        if let Some((kind, item)) = list_item(line) {
            self.last_text = None;
            self.flush_paragraph();
            match &mut self.list {
                Some((current, items)) if *current == kind => items.push(item.to_string()),
                _ => {
                    self.flush_list();
                    self.list = Some((kind, vec![item.to_string()]));
                }
            }
            return;
        }

        if let Some((_, items)) = &mut self.list {
            if is_indented(line) {
                // Continuation of the previous list item
                self.last_text = None;
                if let Some(last) = items.last_mut() {
                    last.push(' ');
                    last.push_str(line.trim());
                }
                return;
            }
        }

        self.flush_list();
        if is_html_comment(line) {
            self.last_text = Some(LastText::Comment(line.trim().to_string()));
        } else {
            self.last_text = Some(LastText::Paragraph);
            self.paragraph.push(line.trim().to_string());
        }
    }

    fn snippet(&mut self, line: usize) {
        self.flush();
        let Some(snippet) = self.snippets.iter().find(|s| s.line == line) else {
            return;
        };
        let label = match snippet.label.as_str() {
            "" => "unlabelled".to_string(),
            other => other.to_ascii_lowercase(),
        };
        self.ctx.add_line(&format!(
            "<pre class=\"snippet snippet-{}\" data-language=\"{}\"><code>{}</code></pre>",
            escape_html(&label),
            escape_html(&snippet.language),
            escape_html(&snippet.text)
        ));
    }
}

fn render_body(doc: &StoredDocument, ctx: Context) -> Context {
    let document = doc.document();
    let mut writer = BodyWriter {
        ctx,
        paragraph: Vec::new(),
        list: None,
        last_text: None,
        sections: Box::new(document.headed_sections()),
        snippets: document.snippets().collect(),
    };

    for (line_num, token) in Lexer::new(&doc.text) {
        if !matches!(token, Token::Text(_) | Token::SetextUnderline { .. }) {
            writer.last_text = None;
        }
        match token {
            Token::Blank => writer.flush(),
            Token::Heading { level, text } => writer.heading(level, &text),
            Token::SetextUnderline { level, raw } => {
                match writer.take_last_text() {
                    Some(heading) => writer.heading(level, &heading),
                    None if raw.trim_start().starts_with('-') => {
                        writer.flush();
                        writer.ctx.add_line("<hr>");
                    }
                    None => writer.text(raw),
                }
            }
            Token::FenceOpen(_) => writer.snippet(line_num),
            Token::FenceContent(_) | Token::FenceClose => {}
            Token::Text(line) => writer.text(line),
        }
    }

    writer.flush();
    writer.ctx
}

/// Render one document as a standalone page
pub fn render_document(doc: &StoredDocument) -> String {
    let title = doc
        .document()
        .non_empty_title()
        .unwrap_or(doc.name.as_str())
        .to_string();
    let to_root = "../".repeat(doc.name.matches('/').count());

    let mut ctx = Context::new();
    page_head(&mut ctx, &title);
    ctx.add_line("<body>");
    ctx.indent();
    ctx.add_line(&format!("<nav><a href=\"{}index.html\">Index</a></nav>", to_root));
    ctx.add_line("<main>");
    ctx.indent();
    let mut ctx = render_body(doc, ctx);
    ctx.dedent();
    ctx.add_line("</main>");
    ctx.dedent();
    ctx.add_line("</body>");
    ctx.add_line("</html>");
    ctx.get_output()
}

/// Render the site index listing every document
pub fn render_index(store: &ContentStore) -> String {
    let mut ctx = Context::new();
    page_head(&mut ctx, "Index");
    ctx.add_line("<body>");
    ctx.indent();
    ctx.add_line("<h1>Index</h1>");
    ctx.add_line("<ul>");
    ctx.indent();
    for doc in store.documents() {
        let title = doc.document().non_empty_title().unwrap_or(doc.name.as_str());
        ctx.add_line(&format!(
            "<li><a href=\"{}\">{}</a></li>",
            escape_html(&html_path(&doc.name)),
            escape_html(title)
        ));
    }
    ctx.dedent();
    ctx.add_line("</ul>");
    ctx.dedent();
    ctx.add_line("</body>");
    ctx.add_line("</html>");
    ctx.get_output()
}

fn page_head(ctx: &mut Context, title: &str) {
    ctx.add_line("<!DOCTYPE html>");
    ctx.add_line("<html>");
    ctx.add_line("<head>");
    ctx.indent();
    ctx.add_line("<meta charset=\"UTF-8\">");
    ctx.add_line("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">");
    ctx.add_line(&format!("<title>{}</title>", escape_html(title)));
    ctx.add_line(&format!("<style>{}</style>", STYLE));
    ctx.dedent();
    ctx.add_line("</head>");
}
