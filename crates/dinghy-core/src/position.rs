//! Source positions and immutable source files
//!
//! Lines and columns are 0-based; columns are byte offsets within a line.
//! A [`Position`] may be bound to a [`SourceFile`], which is what allows the
//! printer to copy the original text of an untouched node verbatim.

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

static NEXT_FILE_ID: AtomicU64 = AtomicU64::new(1);

/// Original text of a parsed file plus a stable identity key
#[derive(Debug)]
pub struct SourceFile {
    id: u64,
    path: Option<PathBuf>,
    text: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Create an anonymous source file
    pub fn new(text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::build(None, text.into()))
    }

    /// Create a source file remembering the path it was read from
    pub fn with_path(path: impl Into<PathBuf>, text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::build(Some(path.into()), text.into()))
    }

    fn build(path: Option<PathBuf>, text: String) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(idx, _)| idx + 1));
        Self {
            id: NEXT_FILE_ID.fetch_add(1, AtomicOrdering::Relaxed),
            path,
            text,
            line_starts,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Text of a 0-based line without its line terminator
    pub fn line_text(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(self.text.len(), |next| next - 1);
        self.text.get(start..end).map(|text| text.trim_end_matches('\r'))
    }

    /// Byte offset of a line/column point, if its line exists.
    ///
    /// Columns past the end of the line land on its terminator.
    pub fn offset(&self, point: Point) -> Option<usize> {
        let start = *self.line_starts.get(point.line)?;
        let width = self.line_text(point.line).map_or(0, str::len);
        Some(start + point.column.min(width))
    }

    /// Line terminator of a 0-based line as written in the text
    pub fn terminator(&self, line: usize) -> &'static str {
        let Some(next) = self.line_starts.get(line + 1) else {
            return "";
        };
        if self.text[..next - 1].ends_with('\r') {
            "\r\n"
        } else {
            "\n"
        }
    }

    /// Line terminator used by the first line break, `\n` when there is none
    pub fn newline(&self) -> &'static str {
        match self.terminator(0) {
            "" => "\n",
            terminator => terminator,
        }
    }

    /// Line/column point of a byte offset
    pub fn point_at(&self, offset: usize) -> Point {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        };
        Point::new(line, offset - self.line_starts[line])
    }

    /// Original text covered by a position.
    ///
    /// A position without an end covers the rest of its start line.
    pub fn content_at(&self, position: &Position) -> Option<&str> {
        let start = self.offset(position.start)?;
        let end = match position.end {
            Some(end) => self.offset(end)?,
            None => {
                let line_end = self
                    .line_starts
                    .get(position.start.line + 1)
                    .map(|next| next - 1)
                    .unwrap_or(self.text.len());
                line_end.max(start)
            }
        };
        self.text.get(start..end)
    }
}

/// A 0-based line/column point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Default)]
pub struct Point {
    pub line: usize,
    pub column: usize,
}

impl Point {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// Identity used by the printer to keep one spacing cursor per file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKey {
    File(u64),
    /// Positioned fragments that belong to no file (parsed repair snippets)
    New,
}

/// Source range of a node
#[derive(Clone)]
pub struct Position {
    pub start: Point,
    pub end: Option<Point>,
    file: Option<Arc<SourceFile>>,
}

impl Position {
    /// Create a position; an inverted range is normalised
    pub fn new(start: Point, end: Option<Point>) -> Self {
        let (start, end) = match end {
            Some(end) if end < start => (end, Some(start)),
            other => (start, other),
        };
        Self {
            start,
            end,
            file: None,
        }
    }

    pub fn range(start: Point, end: Point) -> Self {
        Self::new(start, Some(end))
    }

    pub fn at(line: usize, column: usize) -> Self {
        Self::new(Point::new(line, column), None)
    }

    pub fn with_file(mut self, file: Arc<SourceFile>) -> Self {
        self.file = Some(file);
        self
    }

    pub fn without_file(mut self) -> Self {
        self.file = None;
        self
    }

    pub fn file(&self) -> Option<&Arc<SourceFile>> {
        self.file.as_ref()
    }

    pub fn file_key(&self) -> FileKey {
        match &self.file {
            Some(file) => FileKey::File(file.id()),
            None => FileKey::New,
        }
    }

    pub fn same_file(&self, other: &Position) -> bool {
        self.file_key() == other.file_key()
    }

    /// End point, or the start point when the end is unknown
    pub fn end_or_start(&self) -> Point {
        self.end.unwrap_or(self.start)
    }

    pub fn line_start(&self) -> usize {
        self.start.line
    }

    pub fn column_start(&self) -> usize {
        self.start.column
    }

    pub fn line_end(&self) -> usize {
        self.end_or_start().line
    }

    /// Verbatim text from the bound file
    pub fn content(&self) -> Option<&str> {
        self.file.as_ref()?.content_at(self)
    }

    /// Smallest position covering both ranges (file of `self` is kept)
    pub fn union(&self, other: &Position) -> Position {
        let start = self.start.min(other.start);
        let end = self.end_or_start().max(other.end_or_start());
        Position {
            start,
            end: Some(end),
            file: self.file.clone(),
        }
    }

    /// Whether `other` lies entirely within this range
    pub fn contains(&self, other: &Position) -> bool {
        self.start <= other.start && other.end_or_start() <= self.end_or_start()
    }

    /// Total order on start points
    pub fn cmp_start(&self, other: &Position) -> Ordering {
        self.start.cmp(&other.start)
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end && self.same_file(other)
    }
}

impl Eq for Position {}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.start, end)?,
            None => write!(f, "{}", self.start)?,
        }
        if let Some(file) = &self.file {
            write!(f, "@{}", file.id())?;
        }
        Ok(())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}

impl Serialize for Position {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let end = self.end_or_start();
        let mut state = serializer.serialize_struct("Position", 4)?;
        state.serialize_field("lineStart", &self.start.line)?;
        state.serialize_field("columnStart", &self.start.column)?;
        state.serialize_field("lineEnd", &end.line)?;
        state.serialize_field("columnEnd", &end.column)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_at_multiline() {
        let file = SourceFile::new("FROM ubuntu\nRUN apt-get update \\\n  && true\n");
        let pos = Position::range(Point::new(1, 4), Point::new(2, 10)).with_file(file.clone());
        assert_eq!(pos.content(), Some("apt-get update \\\n  && true"));
    }

    #[test]
    fn test_content_without_end_takes_rest_of_line() {
        let file = SourceFile::new("# comment\nFROM x");
        let pos = Position::at(0, 2).with_file(file);
        assert_eq!(pos.content(), Some("comment"));
    }

    #[test]
    fn test_inverted_range_is_normalised() {
        let pos = Position::range(Point::new(3, 0), Point::new(1, 5));
        assert_eq!(pos.start, Point::new(1, 5));
        assert_eq!(pos.end, Some(Point::new(3, 0)));
    }

    #[test]
    fn test_union_and_contains() {
        let a = Position::range(Point::new(0, 4), Point::new(0, 8));
        let b = Position::range(Point::new(0, 10), Point::new(1, 2));
        let u = a.union(&b);
        assert_eq!(u.start, Point::new(0, 4));
        assert_eq!(u.end, Some(Point::new(1, 2)));
        assert!(u.contains(&a));
        assert!(u.contains(&b));
        assert!(!a.contains(&b));
    }

    #[test]
    fn test_point_at_round_trips_offsets() {
        let file = SourceFile::new("ab\ncd\n");
        assert_eq!(file.point_at(4), Point::new(1, 1));
        assert_eq!(file.offset(Point::new(1, 1)), Some(4));
        assert_eq!(file.offset(Point::new(7, 0)), None);
    }

    #[test]
    fn test_offset_clamps_column_to_line() {
        let file = SourceFile::new("ab\r\ncd");
        assert_eq!(file.offset(Point::new(0, 9)), Some(2));
        assert_eq!(file.offset(Point::new(1, 9)), Some(6));
    }

    #[test]
    fn test_line_terminators() {
        let file = SourceFile::new("a\r\nb\nc");
        assert_eq!(file.terminator(0), "\r\n");
        assert_eq!(file.terminator(1), "\n");
        assert_eq!(file.terminator(2), "");
        assert_eq!(file.newline(), "\r\n");
        assert_eq!(SourceFile::new("x").newline(), "\n");
    }

    #[test]
    fn test_file_keys_are_distinct() {
        let a = SourceFile::new("x");
        let b = SourceFile::new("x");
        let pa = Position::at(0, 0).with_file(a);
        let pb = Position::at(0, 0).with_file(b);
        assert_ne!(pa.file_key(), pb.file_key());
        assert_ne!(pa, pb);
        assert_eq!(Position::at(0, 0).file_key(), FileKey::New);
    }
}
