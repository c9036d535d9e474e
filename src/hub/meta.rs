//! go-import meta tag rendering

use crate::dns::ImportDirective;

/// Render one `<meta name="go-import">` tag per directive, in order
pub fn render_meta(imports: &[ImportDirective]) -> String {
    let mut body = String::from("\n");
    for import in imports {
        body.push_str("<meta name=\"go-import\" content=\"");
        escape_attr(&mut body, &import.prefix);
        body.push(' ');
        escape_attr(&mut body, &import.vcs);
        body.push(' ');
        escape_attr(&mut body, &import.url);
        body.push_str("\">");
    }
    body.push('\n');
    body
}

/// Escape for a double-quoted HTML attribute value
fn escape_attr(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
}
