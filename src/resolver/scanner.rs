//! Comment-aware scanner locating `#include` directives in shader text.

use std::ops::Range;

/// Literal that introduces an include directive.
pub const INCLUDE_MARKER: &str = "#include";

/// An occurrence of [`INCLUDE_MARKER`] in the scanned buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Byte range of the directive text, from the marker through the closing quote.
    pub span: Range<usize>,
    /// Byte range of the path between the quotes, if one was found on the marker's line.
    pub path: Option<Range<usize>>,
    /// The directive sits inside a `//` or `/* */` comment.
    pub suppressed: bool,
}

impl Directive {
    /// 1-based line of the marker within `source`.
    pub fn line(&self, source: &str) -> usize {
        source.as_bytes()[..self.span.start]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comment {
    Line,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    InLineComment,
    InBlockComment,
    /// At a marker; `within` is the comment the marker sits in, if any.
    InDirective { within: Option<Comment> },
}

/// Single forward pass over a buffer tracking comment state.
pub struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
    state: State,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            src: source.as_bytes(),
            pos: 0,
            state: State::Normal,
        }
    }

    fn starts_with(&self, pat: &[u8]) -> bool {
        self.src[self.pos..].starts_with(pat)
    }

    /// Returns the next directive after the current position, or `None` at end of input.
    ///
    /// Directives in active code must carry a quoted path on the same line; when one does not,
    /// the returned directive has `path: None` and `suppressed: false`, which the caller treats
    /// as malformed.
    pub fn next_directive(&mut self) -> Option<Directive> {
        let marker = INCLUDE_MARKER.as_bytes();

        while self.pos < self.src.len() {
            match self.state {
                State::Normal => {
                    if self.starts_with(b"//") {
                        self.state = State::InLineComment;
                        self.pos += 2;
                    } else if self.starts_with(b"/*") {
                        self.state = State::InBlockComment;
                        self.pos += 2;
                    } else if self.starts_with(marker) {
                        self.state = State::InDirective { within: None };
                    } else {
                        self.pos += 1;
                    }
                }
                State::InLineComment => {
                    if self.src[self.pos] == b'\n' {
                        self.state = State::Normal;
                        self.pos += 1;
                    } else if self.starts_with(marker) {
                        self.state = State::InDirective {
                            within: Some(Comment::Line),
                        };
                    } else {
                        self.pos += 1;
                    }
                }
                State::InBlockComment => {
                    if self.starts_with(b"*/") {
                        self.state = State::Normal;
                        self.pos += 2;
                    } else if self.starts_with(marker) {
                        self.state = State::InDirective {
                            within: Some(Comment::Block),
                        };
                    } else {
                        self.pos += 1;
                    }
                }
                State::InDirective { within } => {
                    let directive = self.read_directive(within);
                    self.pos = directive.span.end;
                    self.state = match within {
                        None => State::Normal,
                        Some(Comment::Line) => State::InLineComment,
                        Some(Comment::Block) => State::InBlockComment,
                    };
                    return Some(directive);
                }
            }
        }

        None
    }

    fn read_directive(&self, within: Option<Comment>) -> Directive {
        let start = self.pos;
        let after_marker = start + INCLUDE_MARKER.len();
        let rest = &self.src[after_marker..];

        // The path must sit on the marker's line and, inside a block comment, before its close.
        let mut line_len = rest.iter().position(|&b| b == b'\n').unwrap_or(rest.len());
        if within == Some(Comment::Block) {
            if let Some(close) = rest[..line_len].windows(2).position(|w| w == b"*/") {
                line_len = close;
            }
        }
        let line = &rest[..line_len];

        let path = line.iter().position(|&b| b == b'"').and_then(|open| {
            let path_start = after_marker + open + 1;
            line[open + 1..]
                .iter()
                .position(|&b| b == b'"')
                .map(|close| path_start..path_start + close)
        });

        let end = path.as_ref().map_or(after_marker, |p| p.end + 1);

        Directive {
            span: start..end,
            path,
            suppressed: within.is_some(),
        }
    }
}
