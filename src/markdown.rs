//! Markdown ingestion: an uploaded `.md` file becomes a title, a slug, a tag
//! list and rendered HTML.
//!
//! Uploads look like
//!
//! ```text
//! ---
//! tags:
//! - rust
//! - web
//! ---
//! Post body in markdown.
//! ```

use crate::error::BlogError;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag as MdTag, TagEnd, html};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

const MARKDOWN_EXT: &str = ".md";
const FRONT_MATTER_DELIM: &str = "---";
const TAGS_LABEL: &str = "tags:";

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-z0-9 ]+").expect("static slug regex"));

/// Everything the authoring form needs from one uploaded document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarkdownUpload {
    pub title: String,
    pub slug: String,
    /// Space-separated, as the tags form field expects.
    pub tags: String,
    /// Front matter removed, still markdown.
    pub raw: String,
    pub html: String,
}

/// Process an upload named `filename` with body `content`.
pub fn ingest(filename: &str, content: &str) -> Result<MarkdownUpload, BlogError> {
    let title = format_title(filename)?;
    let slug = title_to_slug(&title);
    let tags = parse_tags(content)?;
    let raw = clean_post_content(content)?;
    let html = render_html(&raw);
    Ok(MarkdownUpload {
        title,
        slug,
        tags,
        raw,
        html,
    })
}

/// `"My Post.md"` -> `"My Post"`.
pub fn format_title(filename: &str) -> Result<String, BlogError> {
    let name = filename.trim();
    let stem = name
        .len()
        .checked_sub(MARKDOWN_EXT.len())
        .filter(|&at| name.is_char_boundary(at) && name[at..].eq_ignore_ascii_case(MARKDOWN_EXT))
        .map(|at| name[..at].trim())
        .ok_or_else(|| {
            BlogError::MalformedInput(format!("`{name}` is not a {MARKDOWN_EXT} file"))
        })?;
    if stem.is_empty() {
        return Err(BlogError::MalformedInput(format!(
            "`{name}` has no title before the extension"
        )));
    }
    Ok(stem.to_string())
}

/// Lowercase, keep `[a-z0-9 ]`, join words with `-`.
pub fn title_to_slug(title: &str) -> String {
    let lower = title.to_lowercase();
    let cleaned = NON_SLUG_CHARS.replace_all(&lower, "");
    cleaned.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Tags listed in the front matter, space-joined.
pub fn parse_tags(content: &str) -> Result<String, BlogError> {
    let (front, _) = split_front_matter(content)?;

    let mut tags = Vec::new();
    for line in front.lines().map(str::trim) {
        if let Some(item) = line.strip_prefix('-') {
            let item = item.trim();
            if !item.is_empty() {
                tags.push(item);
            }
        } else if let Some(inline) = strip_prefix_ignore_case(line, TAGS_LABEL) {
            // `tags: rust web` on one line
            tags.extend(inline.split_whitespace());
        }
    }
    Ok(tags.join(" "))
}

/// The document body with the front matter block removed.
pub fn clean_post_content(content: &str) -> Result<String, BlogError> {
    let (_, body) = split_front_matter(content)?;
    Ok(body.trim().to_string())
}

/// Split a document into (front matter, body). The first non-blank line
/// must be `---` and a second `---` line must close the block.
pub fn split_front_matter(content: &str) -> Result<(&str, &str), BlogError> {
    let mut offset = 0;
    let mut front_start = None;

    for line in content.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        let trimmed = line.trim();

        match front_start {
            None if trimmed.is_empty() => {}
            None if trimmed == FRONT_MATTER_DELIM => front_start = Some(offset),
            None => {
                return Err(BlogError::MalformedInput(
                    "document does not start with `---` front matter".to_string(),
                ));
            }
            Some(start) if trimmed == FRONT_MATTER_DELIM => {
                return Ok((&content[start..line_start], &content[offset..]));
            }
            Some(_) => {}
        }
    }

    Err(BlogError::MalformedInput(match front_start {
        None => "document has no front matter".to_string(),
        Some(_) => "front matter is not closed with `---`".to_string(),
    }))
}

/// Render markdown with GFM tables, strikethrough and task lists, smart
/// punctuation, hard line breaks and generated heading ids.
pub fn render_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

    let events: Vec<Event> = Parser::new_ext(markdown, options)
        .map(|event| match event {
            Event::SoftBreak => Event::HardBreak,
            other => other,
        })
        .collect();
    let events = with_heading_ids(events);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Give every heading without an explicit `{#id}` an id slugged from its text.
/// Repeated slugs get `-1`, `-2`, ... appended.
fn with_heading_ids(mut events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut used: HashSet<String> = events
        .iter()
        .filter_map(|e| match e {
            Event::Start(MdTag::Heading { id: Some(id), .. }) => Some(id.to_string()),
            _ => None,
        })
        .collect();

    let mut i = 0;
    while i < events.len() {
        let needs_id = matches!(&events[i], Event::Start(MdTag::Heading { id: None, .. }));
        if needs_id {
            let text: String = events[i + 1..]
                .iter()
                .take_while(|e| !matches!(e, Event::End(TagEnd::Heading(_))))
                .filter_map(|e| match e {
                    Event::Text(t) | Event::Code(t) => Some(&**t),
                    _ => None,
                })
                .collect();
            let slug = unique_slug(title_to_slug(&text), &mut used);
            if !slug.is_empty()
                && let Event::Start(MdTag::Heading { id, .. }) = &mut events[i]
            {
                *id = Some(CowStr::from(slug));
            }
        }
        i += 1;
    }
    events
}

fn unique_slug(base: String, used: &mut HashSet<String>) -> String {
    if base.is_empty() {
        return base;
    }
    let mut slug = base.clone();
    let mut n = 0;
    while used.contains(&slug) {
        n += 1;
        slug = format!("{base}-{n}");
    }
    used.insert(slug.clone());
    slug
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// Split the space-separated tags field into names.
pub fn split_tags(field: &str) -> Vec<String> {
    field.split_whitespace().map(str::to_string).collect()
}
