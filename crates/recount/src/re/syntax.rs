//! Concrete syntax for regular expressions: single-character tokens, `%` for
//! the empty word, postfix `*`, `|` alternation, and `()` grouping, with
//! implicit concatenation. Whitespace is insignificant.

use super::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("`*` with no operand at offset {0}")]
    DanglingStar(usize),
    #[error("expected an atom at offset {0}")]
    MissingAtom(usize),
    #[error("unmatched `)` at offset {0}")]
    TrailingParen(usize),
    #[error("unclosed `(` opened at offset {0}")]
    UnclosedParen(usize),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
}

impl Regex<char> {
    #[inline]
    pub fn parse(pattern: &str) -> Result<Self, ParseError> { parse(pattern) }
}

pub fn parse(pattern: &str) -> Result<Regex<char>, ParseError> {
    let toks: Vec<_> = pattern
        .char_indices()
        .filter(|(_, c)| !c.is_whitespace())
        .collect();
    let mut parser = Parser { toks: &toks, pos: 0 };
    let re = parser.alternation()?;

    // the grammar consumes everything except a stray `)` or `*`
    match parser.peek() {
        None => Ok(re),
        Some((at, ')')) => Err(ParseError::TrailingParen(at)),
        Some((at, _)) => Err(ParseError::DanglingStar(at)),
    }
}

struct Parser<'a> {
    toks: &'a [(usize, char)],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<(usize, char)> { self.toks.get(self.pos).copied() }

    fn bump(&mut self) { self.pos += 1; }

    fn alternation(&mut self) -> Result<Regex<char>, ParseError> {
        let mut branches = vec![self.concat()?];
        while matches!(self.peek(), Some((_, '|'))) {
            self.bump();
            branches.push(self.concat()?);
        }

        Ok(if branches.len() == 1 {
            branches.pop().unwrap_or_else(|| unreachable!())
        } else {
            Regex::Alt(branches)
        })
    }

    fn concat(&mut self) -> Result<Regex<char>, ParseError> {
        let mut atoms = vec![self.atom()?];
        while matches!(self.peek(), Some((_, c)) if !matches!(c, '|' | ')' | '*')) {
            atoms.push(self.atom()?);
        }

        Ok(if atoms.len() == 1 {
            atoms.pop().unwrap_or_else(|| unreachable!())
        } else {
            Regex::Cat(atoms)
        })
    }

    fn atom(&mut self) -> Result<Regex<char>, ParseError> {
        let Some((at, c)) = self.peek() else {
            return Err(ParseError::UnexpectedEnd);
        };

        let base = match c {
            '(' => {
                self.bump();
                let inner = self.alternation()?;
                match self.peek() {
                    Some((_, ')')) => {
                        self.bump();
                        inner
                    },
                    _ => return Err(ParseError::UnclosedParen(at)),
                }
            },
            '%' => {
                self.bump();
                Regex::Eps
            },
            '*' => return Err(ParseError::DanglingStar(at)),
            '|' | ')' => return Err(ParseError::MissingAtom(at)),
            c => {
                self.bump();
                Regex::Lit(c)
            },
        };

        Ok(if matches!(self.peek(), Some((_, '*'))) {
            self.bump();
            Regex::Star(base.into())
        } else {
            base
        })
    }
}
