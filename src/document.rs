//! Host document collaborator
//!
//! The matching core never owns buffers. It reads them through
//! [`DocumentSnapshot`], which exposes the identity, version counter, byte
//! size, content hash and text of one document at one point in time.
//! [`TextDocument`] and [`DocumentStore`] are the in-memory host used by the
//! CLI and the tests.

use indexmap::IndexMap;
use indexmap::map::Entry;

/// Prefix used for the identity of synthesized focus-view documents.
pub const FOCUS_SCHEME: &str = "focus:";

/// Fingerprint of a document's full text.
pub type ContentHash = blake3::Hash;

/// Hash a document body the same way every snapshot does.
pub fn content_hash(text: &str) -> ContentHash {
    blake3::hash(text.as_bytes())
}

/// Whether a document is an original buffer or a synthesized focus view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentKind {
    #[default]
    Source,
    Focus,
}

/// Read access to one document as the host currently sees it.
pub trait DocumentSnapshot {
    /// Stable identity (a URI in editor hosts).
    fn id(&self) -> &str;

    /// Version counter, bumped by the host on every edit.
    fn version(&self) -> u64;

    /// Full document text.
    fn text(&self) -> &str;

    fn content_hash(&self) -> ContentHash;

    fn kind(&self) -> DocumentKind {
        DocumentKind::Source
    }

    fn byte_size(&self) -> usize {
        self.text().len()
    }

    /// Lines as an editor numbers them: a trailing newline opens one more
    /// (empty) line, and a `\r` before the newline is not part of the line.
    fn lines(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(
            self.text()
                .split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line)),
        )
    }

    fn line_count(&self) -> usize {
        self.text().split('\n').count()
    }
}

/// In-memory document with a cached content hash
#[derive(Debug, Clone)]
pub struct TextDocument {
    id: String,
    kind: DocumentKind,
    version: u64,
    text: String,
    hash: ContentHash,
}

impl TextDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: id.into(),
            kind: DocumentKind::Source,
            version: 1,
            hash: content_hash(&text),
            text,
        }
    }

    /// Build the focus-view document that mirrors `source_id`.
    pub fn focus_view(source_id: &str, text: impl Into<String>) -> Self {
        let mut doc = Self::new(focus_id(source_id), text);
        doc.kind = DocumentKind::Focus;
        doc
    }

    /// Replace the whole text and bump the version.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.touch();
    }

    /// Append text at the end of the buffer and bump the version.
    pub fn append(&mut self, text: &str) {
        self.text.push_str(text);
        self.touch();
    }

    fn touch(&mut self) {
        self.version += 1;
        self.hash = content_hash(&self.text);
    }
}

impl DocumentSnapshot for TextDocument {
    fn id(&self) -> &str {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn content_hash(&self) -> ContentHash {
        self.hash
    }

    fn kind(&self) -> DocumentKind {
        self.kind
    }
}

/// Identity of the focus view synthesized from `source_id`.
pub fn focus_id(source_id: &str) -> String {
    format!("{FOCUS_SCHEME}{source_id}")
}

/// Open documents keyed by identity, in the order they were opened.
#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: IndexMap<String, TextDocument>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document, or replace the text of an already open one.
    pub fn open(&mut self, id: &str, text: impl Into<String>) -> &TextDocument {
        match self.docs.entry(id.to_string()) {
            Entry::Occupied(entry) => {
                let doc = entry.into_mut();
                doc.set_text(text);
                doc
            }
            Entry::Vacant(entry) => entry.insert(TextDocument::new(id, text)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&TextDocument> {
        self.docs.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut TextDocument> {
        self.docs.get_mut(id)
    }

    /// Close a document. The caller is responsible for telling the
    /// workspace so cached results for it are dropped.
    pub fn close(&mut self, id: &str) -> Option<TextDocument> {
        self.docs.shift_remove(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextDocument> {
        self.docs.values()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
