///
/// TokenKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum TokenKind {
    Ident,
    QuotedIdent,
    Number,
    Str,
    Punct(char),
}

///
/// Token
///
/// One lexeme with its byte span in the source statement, so the parser can
/// slice caller text verbatim instead of re-rendering it.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) struct Token<'a> {
    pub(super) kind: TokenKind,
    pub(super) text: &'a str,
    pub(super) start: usize,
}

impl Token<'_> {
    /// Bare or double-quoted identifier.
    pub(super) const fn is_ident(&self) -> bool {
        matches!(self.kind, TokenKind::Ident | TokenKind::QuotedIdent)
    }

    // Quoted identifiers are never keywords: `"from"` is a column.
    pub(super) fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Ident && self.text.eq_ignore_ascii_case(keyword)
    }

    pub(super) fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }
}

///
/// Lexer
///
/// Minimal CQL tokenizer: identifiers (bare or double-quoted), numbers,
/// single-quoted strings and single-character punctuation. Whitespace is
/// skipped.
///

pub(super) struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub(super) const fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek_char(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek_char() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    // Consume a literal delimited by `quote`; a doubled quote is an escaped
    // quote. An unterminated literal runs to the end of input.
    fn bump_quoted(&mut self, quote: char) {
        self.pos += 1;
        while let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
            if c == quote {
                if self.peek_char() == Some(quote) {
                    self.pos += 1;
                } else {
                    return;
                }
            }
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.bump_while(char::is_whitespace);

        let start = self.pos;
        let c = self.peek_char()?;

        let kind = if c.is_ascii_alphabetic() || c == '_' {
            self.bump_while(|c| c.is_ascii_alphanumeric() || c == '_');
            TokenKind::Ident
        } else if c.is_ascii_digit() {
            self.bump_while(|c| c.is_ascii_digit() || c == '.');
            TokenKind::Number
        } else if c == '\'' {
            self.bump_quoted('\'');
            TokenKind::Str
        } else if c == '"' {
            self.bump_quoted('"');
            TokenKind::QuotedIdent
        } else {
            self.pos += c.len_utf8();
            TokenKind::Punct(c)
        };

        Some(Token {
            kind,
            text: &self.src[start..self.pos],
            start,
        })
    }
}
