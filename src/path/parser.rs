//! Node path parser
//!
//! Parses the `/0/2/1` display form back into a [`NodePath`].
//!
//! Grammar:
//! ```text
//! path = "/" | ("/" number)+
//! ```

use std::str::FromStr;

use thiserror::Error;

use super::types::NodePath;

/// Node path parsing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathParseError {
    #[error("Empty node path")]
    Empty,

    #[error("Node path must start with '/'")]
    MissingLeadingSlash,

    #[error("Expected number at position {0}")]
    ExpectedNumber(usize),

    #[error("Step out of range at position {0}")]
    StepOutOfRange(usize),

    #[error("Unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
}

/// Parser state
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn parse(mut self) -> Result<NodePath, PathParseError> {
        if self.input.is_empty() {
            return Err(PathParseError::Empty);
        }
        if self.peek() != Some('/') {
            return Err(PathParseError::MissingLeadingSlash);
        }
        if self.input == "/" {
            return Ok(NodePath::root());
        }

        let mut path = NodePath::root();
        while let Some(c) = self.peek() {
            if c != '/' {
                return Err(PathParseError::UnexpectedChar(c, self.pos));
            }
            self.pos += 1;
            path.push(self.parse_number()?);
        }
        Ok(path)
    }

    fn parse_number(&mut self) -> Result<usize, PathParseError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(PathParseError::ExpectedNumber(start));
        }
        self.input[start..self.pos]
            .parse()
            .map_err(|_| PathParseError::StepOutOfRange(start))
    }
}

/// Parse a node path string
pub fn parse(input: &str) -> Result<NodePath, PathParseError> {
    Parser::new(input.trim()).parse()
}

impl FromStr for NodePath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_root() {
        assert_eq!(parse("/").unwrap(), NodePath::root());
    }

    #[test]
    fn test_parse_steps() {
        let path: NodePath = "/0/12/3".parse().unwrap();
        assert_eq!(path.steps(), &[0, 12, 3]);
    }

    #[test]
    fn test_display_round_trip() {
        let path = NodePath::new(vec![1, 0, 7]);
        assert_eq!(parse(&path.to_string()).unwrap(), path);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(""), Err(PathParseError::Empty));
        assert_eq!(parse("0/1"), Err(PathParseError::MissingLeadingSlash));
        assert_eq!(parse("/0//1"), Err(PathParseError::ExpectedNumber(3)));
        assert_eq!(parse("/0/x"), Err(PathParseError::ExpectedNumber(3)));
        assert_eq!(parse("/0:4"), Err(PathParseError::UnexpectedChar(':', 2)));
        assert_eq!(
            parse("/99999999999999999999999999"),
            Err(PathParseError::StepOutOfRange(1))
        );
    }
}
