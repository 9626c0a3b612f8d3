//! Tolerant scanning over captured page markup.
//!
//! Submission pages are client-rendered and their markup shifts between
//! releases, so extraction never trusts exact structure. These helpers are
//! deliberately naive: they scan the raw text for opening tags, match
//! attributes case-insensitively, and read the element text up to the next
//! matching close tag without tracking nesting. That is enough for the
//! shallow labels and code blocks extraction cares about, and it works the
//! same on captured snapshots and on fixture documents in tests.

/// A single element test, evaluated against each opening tag in document
/// order. Extraction chains several probes per field and takes the first
/// element that matches.
#[derive(Debug, Clone, Copy)]
pub enum Probe {
    /// `pre`
    Tag(&'static str),
    /// `.text-title-large` (class attribute contains the word)
    HasClass(&'static str),
    /// `[data-cy="question-title"]`
    AttrEquals(&'static str, &'static str),
    /// `[class*="diff"]`
    AttrContains(&'static str, &'static str),
    /// `code[class*="language"]`
    TagAttrContains(&'static str, &'static str, &'static str),
}

/// A captured document, held alongside an ASCII-lowercased copy so tag and
/// attribute matching is case-insensitive without repeated allocation.
pub struct Document {
    html: String,
    lower: String,
}

struct TagMatch<'a> {
    name: &'a str,
    attrs: &'a str,
    /// Byte offset just past the `>` of the opening tag.
    open_end: usize,
}

impl Document {
    pub fn parse(html: &str) -> Document {
        Document {
            html: html.to_string(),
            lower: lowercase_ascii(html),
        }
    }

    /// Whether any element matches the probe.
    pub fn exists(&self, probe: &Probe) -> bool {
        self.find_match(probe).is_some()
    }

    /// Inner text of the first matching element, tags stripped, entities
    /// decoded, whitespace collapsed. `None` when nothing matches or the
    /// matched element has no text.
    pub fn select_text(&self, probe: &Probe) -> Option<String> {
        let text = normalize_ws(&self.select_raw_text(probe)?);
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Like `select_text` but preserves whitespace verbatim, for code
    /// blocks where indentation and newlines are the payload.
    pub fn select_raw_text(&self, probe: &Probe) -> Option<String> {
        let inner = self.inner_html(probe)?;
        let text = decode_entities(&strip_tags(inner));
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// First text found by an ordered fallback chain of probes.
    pub fn first_text(&self, probes: &[Probe]) -> Option<String> {
        probes.iter().find_map(|p| self.select_text(p))
    }

    fn inner_html(&self, probe: &Probe) -> Option<&str> {
        let m = self.find_match(probe)?;
        let close = format!("</{}", m.name);
        let rel = self.lower[m.open_end..].find(&close)?;
        Some(&self.html[m.open_end..m.open_end + rel])
    }

    fn find_match(&self, probe: &Probe) -> Option<TagMatch<'_>> {
        let mut pos = 0;
        while let Some(m) = self.next_tag(pos) {
            pos = m.open_end;
            if tag_matches(&m, probe) {
                return Some(m);
            }
        }
        None
    }

    /// Next opening tag at or after `from`. Closing tags, comments, and
    /// processing instructions are skipped.
    fn next_tag(&self, from: usize) -> Option<TagMatch<'_>> {
        let bytes = self.lower.as_bytes();
        let mut pos = from;
        loop {
            let rel = self.lower[pos..].find('<')?;
            let start = pos + rel;
            pos = start + 1;
            let first = *bytes.get(start + 1)?;
            if !first.is_ascii_alphabetic() {
                continue;
            }
            let mut name_end = start + 1;
            while name_end < bytes.len() && bytes[name_end].is_ascii_alphanumeric() {
                name_end += 1;
            }
            let gt = match self.lower[name_end..].find('>') {
                Some(r) => name_end + r,
                None => return None,
            };
            return Some(TagMatch {
                name: &self.lower[start + 1..name_end],
                attrs: &self.lower[name_end..gt],
                open_end: gt + 1,
            });
        }
    }
}

fn tag_matches(m: &TagMatch<'_>, probe: &Probe) -> bool {
    match probe {
        Probe::Tag(tag) => m.name == *tag,
        Probe::HasClass(class) => attr_value(m.attrs, "class")
            .is_some_and(|v| v.split_whitespace().any(|w| w == *class)),
        Probe::AttrEquals(attr, value) => attr_value(m.attrs, attr) == Some(*value),
        Probe::AttrContains(attr, needle) => {
            attr_value(m.attrs, attr).is_some_and(|v| v.contains(needle))
        }
        Probe::TagAttrContains(tag, attr, needle) => {
            m.name == *tag && attr_value(m.attrs, attr).is_some_and(|v| v.contains(needle))
        }
    }
}

/// Value of an attribute inside an opening tag's attribute text. Handles
/// quoted and unquoted values; a bare attribute yields the empty string.
fn attr_value<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    let bytes = attrs.as_bytes();
    let mut search = 0;
    while let Some(rel) = attrs[search..].find(name) {
        let start = search + rel;
        search = start + 1;
        if start > 0 && !bytes[start - 1].is_ascii_whitespace() {
            continue;
        }
        let after = start + name.len();
        let mut j = after;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= bytes.len() || bytes[j] != b'=' {
            // bare attribute, but only at a word boundary
            if after == bytes.len() || bytes[after].is_ascii_whitespace() {
                return Some("");
            }
            continue;
        }
        j += 1;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j < bytes.len() && (bytes[j] == b'"' || bytes[j] == b'\'') {
            let quote = bytes[j] as char;
            let vstart = j + 1;
            let vend = attrs[vstart..].find(quote)? + vstart;
            return Some(&attrs[vstart..vend]);
        }
        let vstart = j;
        let vend = attrs[vstart..]
            .find(|c: char| c.is_ascii_whitespace())
            .map(|r| vstart + r)
            .unwrap_or(attrs.len());
        return Some(&attrs[vstart..vend]);
    }
    None
}

/// Remove all `<...>` tags, keeping the text between them as-is.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Decode the handful of entities that show up in practice. `&amp;` last so
/// double-escaped text stays escaped once.
pub fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Collapse whitespace runs into single spaces and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// ASCII-only lowercasing; byte offsets stay aligned with the source.
fn lowercase_ascii(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}
