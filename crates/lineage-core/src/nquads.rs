//! Quad line format
//!
//! One statement per line: `<subject> <predicate> <object> [<graph>] .`
//! Subjects and graphs are IRIs or blank nodes (`_:label`); objects may also
//! be literals (`"value"`, `"value"@en`, `"value"^^<datatype>`).
//!
//! Writing is the [`Display`](std::fmt::Display) impl of
//! [`Statement`]; this module does the reading.

use crate::error::ParseError;
use crate::node::{Literal, Node};
use crate::statement::Statement;

/// Parse a single quad line
pub fn parse_line(line: &str) -> Result<Statement, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Err(ParseError::Empty);
    }

    let mut cursor = Cursor::new(line);

    let subject = cursor.term()?;
    if matches!(subject, Node::Literal(_)) {
        return Err(ParseError::invalid_term(1, "subject cannot be a literal"));
    }

    cursor.skip_whitespace();
    let predicate = match cursor.term()? {
        Node::Iri(iri) => iri,
        _ => return Err(ParseError::PredicateNotIri),
    };

    cursor.skip_whitespace();
    let object = cursor.term()?;

    cursor.skip_whitespace();
    let graph = match cursor.peek() {
        Some('.') | None => None,
        Some(_) => {
            let column = cursor.column();
            let graph = cursor.term()?;
            if matches!(graph, Node::Literal(_)) {
                return Err(ParseError::invalid_term(column, "graph cannot be a literal"));
            }
            cursor.skip_whitespace();
            Some(graph)
        }
    };

    if cursor.peek() != Some('.') {
        return Err(ParseError::MissingTerminator);
    }
    cursor.advance();
    cursor.skip_whitespace();
    if !cursor.at_end() && cursor.peek() != Some('#') {
        return Err(ParseError::invalid_term(
            cursor.column(),
            "trailing text after terminator",
        ));
    }

    Ok(Statement {
        subject,
        predicate,
        object,
        graph,
    })
}

/// Parse every well-formed line of `text`, skipping the rest
pub fn statements(text: &str) -> impl Iterator<Item = Statement> + '_ {
    text.lines().filter_map(|line| parse_line(line).ok())
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn column(&self) -> usize {
        self.pos + 1
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn term(&mut self) -> Result<Node, ParseError> {
        let column = self.column();
        match self.peek() {
            Some('<') => Ok(Node::iri(self.iri()?)),
            Some('_') => self.blank(),
            Some('"') => self.literal(),
            Some(c) => Err(ParseError::invalid_term(
                column,
                format!("unexpected character {:?}", c),
            )),
            None => Err(ParseError::UnexpectedEnd(column)),
        }
    }

    fn iri(&mut self) -> Result<String, ParseError> {
        let column = self.column();
        self.advance();
        let rest = self.rest();
        let end = rest
            .find('>')
            .ok_or(ParseError::UnexpectedEnd(self.text.len() + 1))?;
        let iri = &rest[..end];
        if iri.is_empty() || iri.contains(|c: char| c.is_whitespace() || c == '<') {
            return Err(ParseError::invalid_term(column, "malformed IRI"));
        }
        self.pos += end + 1;
        Ok(iri.to_string())
    }

    fn blank(&mut self) -> Result<Node, ParseError> {
        let column = self.column();
        if !self.rest().starts_with("_:") {
            return Err(ParseError::invalid_term(column, "expected '_:'"));
        }
        self.pos += 2;
        let rest = self.rest();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let label = &rest[..end];
        if label.is_empty() {
            return Err(ParseError::invalid_term(column, "empty blank node label"));
        }
        self.pos += end;
        Ok(Node::blank(label))
    }

    fn literal(&mut self) -> Result<Node, ParseError> {
        let column = self.column();
        self.advance();

        let mut value = String::new();
        loop {
            match self.advance() {
                Some('"') => break,
                Some('\\') => {
                    let escaped = match self.advance() {
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some(other) => {
                            return Err(ParseError::invalid_term(
                                column,
                                format!("unknown escape \\{}", other),
                            ));
                        }
                        None => return Err(ParseError::UnexpectedEnd(self.column())),
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
                None => return Err(ParseError::UnexpectedEnd(self.column())),
            }
        }

        let mut literal = Literal::new(value);
        if self.peek() == Some('@') {
            self.advance();
            let rest = self.rest();
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
                .unwrap_or(rest.len());
            if end == 0 {
                return Err(ParseError::invalid_term(column, "empty language tag"));
            }
            literal = literal.with_language(&rest[..end]);
            self.pos += end;
        } else if self.rest().starts_with("^^") {
            self.pos += 2;
            if self.peek() != Some('<') {
                return Err(ParseError::invalid_term(column, "datatype must be an IRI"));
            }
            literal = literal.with_datatype(self.iri()?);
        }

        Ok(Node::Literal(literal))
    }
}
