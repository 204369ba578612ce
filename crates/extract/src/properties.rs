use crate::consts::MEMORY_REGEX;
use crate::error::{ErrorKind, Result};
use crate::xml;
use exn::OptionExt;
use std::collections::BTreeMap;
use tracing::instrument;

const WHITESPACE: [char; 3] = [' ', '\t', '\u{c}'];

/// Key/value pairs read from a Java properties file.
///
/// Both encodings found in gateway bundles are supported: the line-oriented
/// format used by `ignition.conf` ([`parse`](Self::parse)) and the XML format
/// used by `redundancy.xml` ([`parse_xml`](Self::parse_xml)). Later entries
/// replace earlier ones with the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}
impl Properties {
    /// Parse the line-oriented `.properties` format.
    ///
    /// Input is decoded as ISO-8859-1, the same as `java.util.Properties`;
    /// anything outside of that range must be written as a `\uXXXX` escape.
    ///
    /// # Examples
    ///
    /// ```
    /// use ember_extract::Properties;
    /// let props = Properties::parse(b"# wrapper\nwrapper.java.maxmemory = 2048\n").unwrap();
    /// assert_eq!(props.get("wrapper.java.maxmemory"), Some("2048"));
    /// ```
    #[instrument(level = "debug", skip(bytes), fields(size = bytes.as_ref().len()))]
    pub fn parse(bytes: impl AsRef<[u8]>) -> Result<Self> {
        let text: String = bytes.as_ref().iter().map(|&b| char::from(b)).collect();
        let mut entries = BTreeMap::new();
        for line in logical_lines(&text) {
            let (key, value) = split_entry(&line)?;
            entries.insert(key, value);
        }
        Ok(Self { entries })
    }

    /// Parse the XML properties format (`<properties><entry key="…">`).
    #[instrument(level = "debug", skip(bytes), fields(size = bytes.as_ref().len()))]
    pub fn parse_xml(bytes: impl AsRef<[u8]>) -> Result<Self> {
        let text = xml::decode(bytes.as_ref())?;
        let document = xml::parse(text)?;
        let root = document.root_element();
        if root.tag_name().name() != "properties" {
            exn::bail!(ErrorKind::UnexpectedRoot {
                expected: "properties",
                found: root.tag_name().name().to_string(),
            });
        }
        let mut entries = BTreeMap::new();
        for entry in root.children().filter(|n| n.has_tag_name("entry")) {
            let key = entry.attribute("key").ok_or_raise(|| ErrorKind::ParseError {
                field: "entry",
                value: "missing key attribute".to_string(),
            })?;
            let value: String = entry.descendants().filter(|n| n.is_text()).filter_map(|n| n.text()).collect();
            entries.insert(key.to_string(), value);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Read a JVM memory setting in megabytes.
    ///
    /// Plain numbers are megabytes (the Java Service Wrapper convention);
    /// `k`, `m` and `g` suffixes are converted. Returns `Ok(None)` when the
    /// key is not set.
    pub fn megabytes(&self, key: &'static str) -> Result<Option<u32>> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        let invalid = || ErrorKind::ParseError { field: key, value: raw.to_string() };
        let captures = MEMORY_REGEX.captures(raw).ok_or_raise(invalid)?;
        let amount: u64 = captures[1].parse().map_err(|_| invalid())?;
        let megabytes = match captures.get(2).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
            Some("k") => amount / 1024,
            Some("g") => amount.saturating_mul(1024),
            _ => amount,
        };
        Ok(Some(u32::try_from(megabytes).map_err(|_| invalid())?))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Join natural lines into logical lines, dropping blanks and comments.
///
/// A line ending in an odd number of backslashes continues onto the next
/// line, whose leading whitespace is discarded.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut continuing = false;
    for natural in text.replace("\r\n", "\n").split(['\n', '\r']) {
        let trimmed = natural.trim_start_matches(WHITESPACE);
        if !continuing && (trimmed.is_empty() || trimmed.starts_with(['#', '!'])) {
            continue;
        }
        let trailing = trimmed.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            current.push_str(&trimmed[..trimmed.len() - 1]);
            continuing = true;
        } else {
            current.push_str(trimmed);
            lines.push(std::mem::take(&mut current));
            continuing = false;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Split a logical line on the first unescaped `=`, `:` or whitespace.
fn split_entry(line: &str) -> Result<(String, String)> {
    let chars: Vec<char> = line.chars().collect();
    let mut end = 0;
    let mut escaped = false;
    while end < chars.len() {
        let c = chars[end];
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || WHITESPACE.contains(&c) {
            break;
        }
        end += 1;
    }
    let mut start = end;
    while start < chars.len() && WHITESPACE.contains(&chars[start]) {
        start += 1;
    }
    if start < chars.len() && (chars[start] == '=' || chars[start] == ':') {
        start += 1;
        while start < chars.len() && WHITESPACE.contains(&chars[start]) {
            start += 1;
        }
    }
    Ok((unescape(&chars[..end])?, unescape(&chars[start..])?))
}

fn unescape(chars: &[char]) -> Result<String> {
    let mut out = String::with_capacity(chars.len());
    let mut iter = chars.iter().copied();
    while let Some(c) = iter.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match iter.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = iter.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_raise(|| ErrorKind::ParseError {
                        field: "unicode escape",
                        value: format!("\\u{hex}"),
                    })?;
                out.push(code);
            },
            Some(other) => out.push(other),
            // A lone trailing backslash is dropped, as Java does.
            None => {},
        }
    }
    Ok(out)
}
