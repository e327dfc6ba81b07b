//! Field path representation and the flat-key name codec.
//!
//! A field name like `a.b[0].c` addresses a leaf inside a form's value tree.
//! Paths are parsed once into segments and navigated by the structural
//! backend. The conditions and validations tables are keyed by a *flat*
//! encoding of the same name so that embedded dots and index brackets are
//! not misread as nesting separators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single segment in a field path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seg {
    /// Object key access: `a.b`
    Key(String),
    /// Array index access: `[0]`
    Index(usize),
}

impl Seg {
    pub fn key(k: impl Into<String>) -> Self {
        Seg::Key(k.into())
    }

    pub fn index(i: usize) -> Self {
        Seg::Index(i)
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            Seg::Key(k) => Some(k),
            Seg::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Seg::Key(_) => None,
            Seg::Index(i) => Some(*i),
        }
    }
}

/// A parsed field path: a non-empty sequence of segments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path(Vec<Seg>);

/// Error kind for path parse failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathParseErrorKind {
    Empty,
    EmptySegment,
    BadIndex,
    UnclosedBracket,
}

/// Produced by [`Path::parse`] when a field name is not valid path syntax.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathParseError {
    pub kind: PathParseErrorKind,
    pub input: String,
}

impl fmt::Display for PathParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            PathParseErrorKind::Empty => "empty path",
            PathParseErrorKind::EmptySegment => "empty path segment",
            PathParseErrorKind::BadIndex => "index brackets must contain digits",
            PathParseErrorKind::UnclosedBracket => "unclosed index bracket",
        };
        write!(f, "{}: '{}'", what, self.input)
    }
}

impl std::error::Error for PathParseError {}

impl Path {
    /// Create a path holding a single key segment, taking the name literally.
    pub fn single_key(name: impl Into<String>) -> Self {
        Path(vec![Seg::Key(name.into())])
    }

    pub fn from_segments(segments: Vec<Seg>) -> Self {
        Path(segments)
    }

    /// Parse dotted/bracketed field-name syntax: `a.b[0].c`.
    ///
    /// Keys may contain `:`, `#`, and `\` literally; brackets are index
    /// syntax only and must contain digits.
    pub fn parse(input: &str) -> Result<Path, PathParseError> {
        let err = |kind| PathParseError {
            kind,
            input: input.to_string(),
        };
        if input.is_empty() {
            return Err(err(PathParseErrorKind::Empty));
        }

        let mut segs = Vec::new();
        let mut key = String::new();
        // A dot is only valid after a key character or a closing bracket.
        let mut dot_ok = false;
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if !dot_ok {
                        return Err(err(PathParseErrorKind::EmptySegment));
                    }
                    if !key.is_empty() {
                        segs.push(Seg::Key(std::mem::take(&mut key)));
                    }
                    dot_ok = false;
                }
                '[' => {
                    if !key.is_empty() {
                        segs.push(Seg::Key(std::mem::take(&mut key)));
                    } else if segs.is_empty() {
                        return Err(err(PathParseErrorKind::EmptySegment));
                    }
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) if d.is_ascii_digit() => digits.push(d),
                            Some(_) => return Err(err(PathParseErrorKind::BadIndex)),
                            None => return Err(err(PathParseErrorKind::UnclosedBracket)),
                        }
                    }
                    let idx: usize = digits
                        .parse()
                        .map_err(|_| err(PathParseErrorKind::BadIndex))?;
                    segs.push(Seg::Index(idx));
                    dot_ok = true;
                }
                c => {
                    key.push(c);
                    dot_ok = true;
                }
            }
        }

        if !key.is_empty() {
            segs.push(Seg::Key(key));
        } else if !dot_ok {
            // trailing dot
            return Err(err(PathParseErrorKind::EmptySegment));
        }
        Ok(Path(segs))
    }

    /// Parse a field name, falling back to a single literal key segment when
    /// the name is not valid path syntax. The reducer is total over action
    /// inputs, so malformed names degrade instead of failing mid-transition.
    pub fn parse_lenient(input: &str) -> Path {
        Path::parse(input).unwrap_or_else(|_| Path::single_key(input))
    }

    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, seg: Seg) {
        self.0.push(seg);
    }

    /// Append a key segment and return the extended path.
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(Seg::Key(k.into()));
        self
    }

    /// Append an index segment and return the extended path.
    pub fn index(mut self, i: usize) -> Self {
        self.0.push(Seg::Index(i));
        self
    }

    /// The path without its last segment, or `None` at a single segment.
    pub fn parent(&self) -> Option<Path> {
        if self.0.len() <= 1 {
            None
        } else {
            Some(Path(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seg> {
        self.0.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            match seg {
                Seg::Key(k) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", k)?;
                }
                Seg::Index(n) => write!(f, "[{}]", n)?,
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Seg;
    type IntoIter = std::slice::Iter<'a, Seg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ─── Flat-key name codec ────────────────────────────────────────────────────

/// Encode a field name into a flat key for the conditions/validations tables.
///
/// `.` becomes `:`, `[` becomes `#`, and `]` becomes `;`, so the result
/// contains no nesting syntax. Literal `\`, `:`, `#`, and `;` in key
/// segments are escaped first, which makes the encoding injective: no two
/// distinct field names produce the same flat key, and [`decode_name`] is
/// an exact inverse. `]` is escaped rather than dropped because it is an
/// ordinary key character outside index brackets.
pub fn encode_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ':' => out.push_str("\\:"),
            '#' => out.push_str("\\#"),
            ';' => out.push_str("\\;"),
            '.' => out.push(':'),
            '[' => out.push('#'),
            ']' => out.push(';'),
            c => out.push(c),
        }
    }
    out
}

/// Exact inverse of [`encode_name`].
pub fn decode_name(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    let mut chars = encoded.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            },
            ':' => out.push('.'),
            '#' => out.push('['),
            ';' => out.push(']'),
            c => out.push(c),
        }
    }
    out
}
