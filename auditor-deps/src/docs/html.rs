//! DOM-event-based HTML→markdown conversion over `quick-xml` in
//! lenient mode. Regex parsing of HTML is prohibited; the converter
//! walks the tag stream.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Converted page: markdown body plus outgoing links.
#[derive(Debug, Default)]
pub struct ConvertedPage {
    pub markdown: String,
    pub title: String,
    pub links: Vec<String>,
}

/// Convert an HTML document to markdown.
pub fn to_markdown(html: &str) -> ConvertedPage {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.trim_text(true);

    let mut page = ConvertedPage::default();
    let mut out = String::new();
    let mut tag_stack: Vec<String> = Vec::new();
    let mut pending_href: Option<String> = None;
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(tag)) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).to_ascii_lowercase();
                if matches!(name.as_str(), "script" | "style" | "nav" | "footer" | "head") {
                    skip_depth += 1;
                }
                if skip_depth == 0 {
                    match name.as_str() {
                        "h1" => out.push_str("\n# "),
                        "h2" => out.push_str("\n## "),
                        "h3" => out.push_str("\n### "),
                        "h4" => out.push_str("\n#### "),
                        "h5" | "h6" => out.push_str("\n##### "),
                        "p" | "div" | "section" | "article" | "tr" => out.push('\n'),
                        "li" => out.push_str("\n- "),
                        "pre" => out.push_str("\n```\n"),
                        "code" if !in_tag(&tag_stack, "pre") => out.push('`'),
                        "strong" | "b" => out.push_str("**"),
                        "em" | "i" => out.push('_'),
                        "a" => {
                            let href = tag.attributes().flatten().find_map(|a| {
                                if a.key.as_ref() == b"href" {
                                    String::from_utf8(a.value.to_vec()).ok()
                                } else {
                                    None
                                }
                            });
                            if let Some(href) = href {
                                page.links.push(href.clone());
                                pending_href = Some(href);
                                out.push('[');
                            }
                        }
                        _ => {}
                    }
                }
                tag_stack.push(name);
            }
            Ok(Event::End(tag)) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).to_ascii_lowercase();
                if skip_depth == 0 {
                    match name.as_str() {
                        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p" | "li" | "tr" => {
                            out.push('\n')
                        }
                        "pre" => out.push_str("\n```\n"),
                        "code" if !in_tag(&tag_stack, "pre") => out.push('`'),
                        "strong" | "b" => out.push_str("**"),
                        "em" | "i" => out.push('_'),
                        "a" => {
                            if let Some(href) = pending_href.take() {
                                out.push_str(&format!("]({href})"));
                            }
                        }
                        _ => {}
                    }
                }
                if matches!(name.as_str(), "script" | "style" | "nav" | "footer" | "head") {
                    skip_depth = skip_depth.saturating_sub(1);
                }
                // Lenient: unbalanced ends just unwind what exists.
                if let Some(pos) = tag_stack.iter().rposition(|t| *t == name) {
                    tag_stack.truncate(pos);
                }
            }
            Ok(Event::Empty(tag)) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).to_ascii_lowercase();
                if skip_depth == 0 && matches!(name.as_str(), "br" | "hr") {
                    out.push('\n');
                }
            }
            Ok(Event::Text(text)) => {
                if skip_depth == 0 {
                    let decoded = text.unescape().unwrap_or_default();
                    let trimmed = decoded.trim();
                    if !trimmed.is_empty() {
                        if page.title.is_empty() && in_tag(&tag_stack, "title") {
                            page.title = trimmed.to_string();
                        } else if page.title.is_empty() && in_tag(&tag_stack, "h1") {
                            page.title = trimmed.to_string();
                        }
                        if !out.ends_with([' ', '\n', '#', '-', '`', '[', '*', '_'])
                            && !out.is_empty()
                        {
                            out.push(' ');
                        }
                        out.push_str(trimmed);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            // Lenient mode: skip malformed spans rather than abort.
            Err(_) => break,
        }
    }

    // Collapse runs of blank lines.
    let mut markdown = String::with_capacity(out.len());
    let mut blank = 0;
    for line in out.lines() {
        if line.trim().is_empty() {
            blank += 1;
            if blank > 1 {
                continue;
            }
        } else {
            blank = 0;
        }
        markdown.push_str(line.trim_end());
        markdown.push('\n');
    }
    page.markdown = markdown.trim().to_string();
    page
}

fn in_tag(stack: &[String], name: &str) -> bool {
    stack.iter().any(|t| t == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_paragraphs_and_links() {
        let page = to_markdown(
            "<html><head><title>Guide</title></head><body>\
             <h1>Intro</h1><p>Read the <a href=\"/api\">API</a> docs.</p>\
             <ul><li>one</li><li>two</li></ul></body></html>",
        );
        assert_eq!(page.title, "Guide");
        assert!(page.markdown.contains("# Intro"));
        assert!(page.markdown.contains("[API](/api)"));
        assert!(page.markdown.contains("- one"));
        assert_eq!(page.links, vec!["/api".to_string()]);
    }

    #[test]
    fn scripts_and_styles_are_dropped() {
        let page = to_markdown(
            "<body><script>var x = 1;</script><p>visible</p><style>.a{}</style></body>",
        );
        assert!(page.markdown.contains("visible"));
        assert!(!page.markdown.contains("var x"));
        assert!(!page.markdown.contains(".a{}"));
    }
}
