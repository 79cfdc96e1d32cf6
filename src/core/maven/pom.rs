use std::fmt;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::coordinate::Coordinate;

/// Binary format declared by a POM's `<packaging>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackagingKind {
    /// `<packaging>jar</packaging>`
    Jar,
    /// `<packaging>aar</packaging>` (Android library)
    Aar,
    /// Missing, unrecognised, or unreadable packaging.
    #[default]
    Default,
}

impl PackagingKind {
    /// Classify a raw `<packaging>` value. Matching is exact after trimming.
    pub fn classify(raw: &str) -> Self {
        match raw.trim() {
            "jar" => Self::Jar,
            "aar" => Self::Aar,
            _ => Self::Default,
        }
    }

    /// File extension used both for the download URL and the stored file.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Aar => "aar",
            Self::Jar | Self::Default => "jar",
        }
    }
}

impl fmt::Display for PackagingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// One complete `<dependency>` block of a POM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredDependency {
    pub coordinate: Coordinate,
    pub scope: Option<String>,
    pub optional: bool,
}

/// Whether `bytes` hold a well-formed XML document.
///
/// This is the permissive check used to pick a repository: warnings don't
/// matter, only that the document reads to the end. Empty input, mismatched
/// or unclosed tags, more than one root, and stray text outside the root are
/// rejected.
pub fn is_well_formed(bytes: &[u8]) -> bool {
    walk_document(bytes, |_, _| {})
}

/// Packaging kind of the first `<packaging>` element in the document.
pub fn extract_packaging(bytes: &[u8]) -> PackagingKind {
    let mut open: Option<usize> = None;
    let mut buffer = String::new();
    let mut found: Option<String> = None;

    let ok = walk_document(bytes, |node, depth| {
        if found.is_some() {
            return;
        }
        match node {
            Node::Open(name) if open.is_none() && name == b"packaging" => open = Some(depth),
            Node::Text(text) if open.map(|d| d + 1) == Some(depth) => buffer.push_str(text),
            Node::Close if open == Some(depth) => {
                found = Some(std::mem::take(&mut buffer));
                open = None;
            }
            _ => {}
        }
    });

    match found {
        Some(raw) if ok => PackagingKind::classify(&raw),
        _ => PackagingKind::Default,
    }
}

/// Coordinates of every complete `<dependency>` block, in document order.
pub fn extract_dependencies(bytes: &[u8]) -> Vec<Coordinate> {
    extract_declared_dependencies(bytes)
        .into_iter()
        .map(|d| d.coordinate)
        .collect()
}

/// Every `<dependency>` element anywhere in the document, in the order the
/// elements open.
///
/// Only immediate children are read. `groupId`, `artifactId` and `version`
/// must all be non-empty after trimming or the block is skipped; a repeated
/// child overwrites the earlier one.
pub fn extract_declared_dependencies(bytes: &[u8]) -> Vec<DeclaredDependency> {
    let mut frames: Vec<DependencyFrame> = Vec::new();
    let mut slots: Vec<Option<DeclaredDependency>> = Vec::new();

    let ok = walk_document(bytes, |node, depth| match node {
        Node::Open(name) => {
            if let Some(frame) = frames.last_mut() {
                if depth == frame.depth + 1 {
                    frame.open_child(name);
                }
            }
            if name == b"dependency" {
                frames.push(DependencyFrame::new(depth, slots.len()));
                slots.push(None);
            }
        }
        Node::Text(text) => {
            if let Some(frame) = frames.last_mut() {
                if depth == frame.depth + 2 {
                    frame.push_text(text);
                }
            }
        }
        Node::Close => {
            let closes_frame = frames.last().map(|f| f.depth == depth).unwrap_or(false);
            if closes_frame {
                if let Some(frame) = frames.pop() {
                    let slot = frame.slot;
                    slots[slot] = frame.finish();
                }
            } else if let Some(frame) = frames.last_mut() {
                if depth == frame.depth + 1 {
                    frame.current = None;
                }
            }
        }
    });

    if !ok {
        return Vec::new();
    }
    slots.into_iter().flatten().collect()
}

#[derive(Clone, Copy)]
enum Field {
    GroupId,
    ArtifactId,
    Version,
    Scope,
    Optional,
}

struct DependencyFrame {
    depth: usize,
    slot: usize,
    current: Option<Field>,
    group_id: String,
    artifact_id: String,
    version: String,
    scope: String,
    optional: String,
}

impl DependencyFrame {
    fn new(depth: usize, slot: usize) -> Self {
        Self {
            depth,
            slot,
            current: None,
            group_id: String::new(),
            artifact_id: String::new(),
            version: String::new(),
            scope: String::new(),
            optional: String::new(),
        }
    }

    fn open_child(&mut self, name: &[u8]) {
        self.current = match name {
            b"groupId" => Some(Field::GroupId),
            b"artifactId" => Some(Field::ArtifactId),
            b"version" => Some(Field::Version),
            b"scope" => Some(Field::Scope),
            b"optional" => Some(Field::Optional),
            _ => None,
        };
        // last occurrence wins
        if let Some(field) = self.current {
            self.field_mut(field).clear();
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(field) = self.current {
            self.field_mut(field).push_str(text);
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::GroupId => &mut self.group_id,
            Field::ArtifactId => &mut self.artifact_id,
            Field::Version => &mut self.version,
            Field::Scope => &mut self.scope,
            Field::Optional => &mut self.optional,
        }
    }

    fn finish(self) -> Option<DeclaredDependency> {
        let group_id = self.group_id.trim();
        let artifact_id = self.artifact_id.trim();
        let version = self.version.trim();
        if group_id.is_empty() || artifact_id.is_empty() || version.is_empty() {
            return None;
        }
        let coordinate = Coordinate::new(group_id, artifact_id, version);
        if !coordinate.is_path_safe() {
            warn!("Ignoring dependency {} with path separators", coordinate);
            return None;
        }

        let scope = Some(self.scope.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Some(DeclaredDependency {
            coordinate,
            scope,
            optional: self.optional.trim() == "true",
        })
    }
}

/// Simplified view of the token stream handed to `walk_document` visitors.
enum Node<'a> {
    /// Element start, by local name (namespace prefix dropped).
    Open(&'a [u8]),
    Close,
    /// Unescaped text or CDATA content.
    Text(&'a str),
}

/// Tokenize `bytes`, calling `visit` for each element boundary and text run.
///
/// `depth` is the element's own nesting level for `Open`/`Close` (root = 0)
/// and the number of enclosing elements for `Text`. Returns whether the
/// whole document was well formed; visitors may have seen a prefix of the
/// events when it returns `false`.
fn walk_document(bytes: &[u8], mut visit: impl FnMut(Node<'_>, usize)) -> bool {
    if bytes.is_empty() {
        return false;
    }

    let mut reader = Reader::from_reader(bytes);
    let mut depth = 0usize;
    let mut roots = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if !attributes_well_formed(&e) {
                    return false;
                }
                if depth == 0 {
                    roots += 1;
                }
                visit(Node::Open(e.local_name().as_ref()), depth);
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                if !attributes_well_formed(&e) {
                    return false;
                }
                if depth == 0 {
                    roots += 1;
                }
                let name = e.local_name();
                visit(Node::Open(name.as_ref()), depth);
                visit(Node::Close, depth);
            }
            Ok(Event::End(e)) => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
                visit(Node::Close, depth);
            }
            Ok(Event::Text(e)) => {
                let text = match e.unescape() {
                    Ok(t) => t,
                    Err(_) => return false,
                };
                if depth == 0 {
                    if !is_blank(&text) {
                        return false;
                    }
                    continue;
                }
                visit(Node::Text(&text), depth);
            }
            Ok(Event::CData(e)) => {
                if depth == 0 {
                    return false;
                }
                let text = String::from_utf8_lossy(&e);
                visit(Node::Text(&text), depth);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return false,
        }
    }

    depth == 0 && roots == 1
}

/// quick-xml only validates attributes while iterating them. Unquoted values,
/// bare names and duplicates are fatal.
fn attributes_well_formed(e: &BytesStart<'_>) -> bool {
    let mut attributes = e.attributes();
    attributes.with_checks(true);
    attributes.all(|a| a.is_ok())
}

fn is_blank(text: &str) -> bool {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .is_empty()
}
