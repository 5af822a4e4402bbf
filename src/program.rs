//! The directive language.
//!
//! ```text
//! # comments run to the end of the line
//! step into moov
//! read mvhd
//! skip trak        # trailing comments are fine too
//! ```
//!
//! Lines are trimmed and lower-cased before tokenizing, so keywords and tags
//! are case-insensitive. Every tag is exactly four ASCII characters.

use crate::boxes::FourCC;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    /// Decode the matched atom and emit it.
    Read,
    /// Continue the scan among the matched atom's children.
    StepInto,
    /// Discard the matched atom's payload.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Directive {
    pub op: Op,
    pub tag: FourCC,
}

impl Directive {
    pub fn new(op: Op, tag: FourCC) -> Self {
        Directive { op, tag }
    }

    pub fn read(tag: FourCC) -> Self {
        Self::new(Op::Read, tag)
    }

    pub fn step_into(tag: FourCC) -> Self {
        Self::new(Op::StepInto, tag)
    }

    pub fn skip(tag: FourCC) -> Self {
        Self::new(Op::Skip, tag)
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kw = match self.op {
            Op::Read => "read",
            Op::StepInto => "step into",
            Op::Skip => "skip",
        };
        write!(f, "{} {}", kw, self.tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    UnknownKeyword,
    MissingInto,
    WrongTokenCount,
    BadTagLength,
    NonAsciiTag,
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyntaxErrorKind::UnknownKeyword => "expected 'read', 'skip' or 'step into'",
            SyntaxErrorKind::MissingInto => "'step' must be followed by 'into'",
            SyntaxErrorKind::WrongTokenCount => "expected exactly one atom name",
            SyntaxErrorKind::BadTagLength => "atom names are exactly 4 characters",
            SyntaxErrorKind::NonAsciiTag => "atom names are ASCII",
        })
    }
}

/// Compile-phase failure, raised before any I/O happens.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("syntax error on line {line_number}: {kind}: {line:?}")]
pub struct SyntaxError {
    /// 1-based, counting blank and comment lines.
    pub line_number: usize,
    pub line: String,
    pub kind: SyntaxErrorKind,
}

/// Packs a 4-character tag as `c0 << 24 | c1 << 16 | c2 << 8 | c3`.
pub fn pack_tag(name: &str) -> Result<u32, SyntaxErrorKind> {
    if name.chars().count() != 4 {
        return Err(SyntaxErrorKind::BadTagLength);
    }
    if !name.is_ascii() {
        return Err(SyntaxErrorKind::NonAsciiTag);
    }
    let b = name.as_bytes();
    Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// Compiles program text. Directive order follows line order.
pub fn compile(text: &str) -> Result<Vec<Directive>, SyntaxError> {
    compile_lines(text.lines())
}

/// Same as [`compile`] for a program that is already split into lines.
pub fn compile_lines<I, S>(lines: I) -> Result<Vec<Directive>, SyntaxError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut directives = Vec::new();
    for (i, raw) in lines.into_iter().enumerate() {
        let line = raw.as_ref().trim().to_lowercase();
        if let Some(d) = compile_line(&line).map_err(|kind| SyntaxError {
            line_number: i + 1,
            line: raw.as_ref().trim().to_string(),
            kind,
        })? {
            directives.push(d);
        }
    }
    Ok(directives)
}

/// `None` for blank and comment lines.
fn compile_line(line: &str) -> Result<Option<Directive>, SyntaxErrorKind> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    // everything from the first '#' token on is a comment
    let end = tokens
        .iter()
        .position(|t| t.starts_with('#'))
        .unwrap_or(tokens.len());

    let (op, tag) = match &tokens[..end] {
        [] => return Ok(None),
        ["read", tag] => (Op::Read, *tag),
        ["skip", tag] => (Op::Skip, *tag),
        ["step", "into", tag] => (Op::StepInto, *tag),
        ["read" | "skip", ..] | ["step", "into", ..] => {
            return Err(SyntaxErrorKind::WrongTokenCount);
        }
        ["step", ..] => return Err(SyntaxErrorKind::MissingInto),
        _ => return Err(SyntaxErrorKind::UnknownKeyword),
    };
    Ok(Some(Directive::new(op, FourCC::from_u32(pack_tag(tag)?))))
}

/// A compiled directive list that prints back as program text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    directives: Vec<Directive>,
}

impl Program {
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn into_directives(self) -> Vec<Directive> {
        self.directives
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

impl From<Vec<Directive>> for Program {
    fn from(directives: Vec<Directive>) -> Self {
        Program { directives }
    }
}

impl FromStr for Program {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        compile(s).map(Program::from)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.directives {
            writeln!(f, "{d}")?;
        }
        Ok(())
    }
}
