//! Lexer for the filter, sort and facet grammars
//!
//! Words cover field names and every keyword (AND, OR, NOT, operator names,
//! ASC/DESC, true/false/null, sortFilter); keyword matching is
//! case-insensitive and happens in the parser, so a lexer is shared by all
//! three grammars.

use crate::error::GatewayError;
use crate::Result;
use serde_json::Number;

/// Token types for the query grammars
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier or keyword
    Word(String),
    /// A quoted string, escapes resolved
    QuotedString(String),
    /// Integer or decimal literal
    Number(Number),
    /// Symbolic relational operator (`=`, `<>`, `!=`, `>`, `>=`, `<`, `<=`)
    Symbol(&'static str),
    /// Colon: EQUAL in filters, separator after `sortFilter`
    Colon,
    Comma,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    /// End of input
    Eof,
}

impl Token {
    /// Check if this word token matches `keyword`, ignoring case
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(keyword))
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Word(w) => format!("'{w}'"),
            Token::QuotedString(s) => format!("string \"{s}\""),
            Token::Number(n) => format!("number {n}"),
            Token::Symbol(s) => format!("'{s}'"),
            Token::Colon => "':'".to_string(),
            Token::Comma => "','".to_string(),
            Token::LeftParen => "'('".to_string(),
            Token::RightParen => "')'".to_string(),
            Token::LeftBracket => "'['".to_string(),
            Token::RightBracket => "']'".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

/// Lexer for tokenizing query strings
pub struct Lexer {
    source: String,
    input: Vec<char>,
    position: usize,
    token_start: usize,
}

impl Lexer {
    /// Create a new lexer for the given input string
    pub fn new(input: &str) -> Self {
        Self {
            source: input.to_string(),
            input: input.chars().collect(),
            position: 0,
            token_start: 0,
        }
    }

    /// Original input
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Character offset where the last returned token starts
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Build a syntax error pointing at `position`
    pub fn error_at(&self, position: usize, message: impl Into<String>) -> GatewayError {
        GatewayError::syntax(&self.source, position, message)
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        self.token_start = self.position;

        let Some(ch) = self.current_char() else {
            return Ok(Token::Eof);
        };

        match ch {
            ':' => self.single(Token::Colon),
            ',' => self.single(Token::Comma),
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            '[' => self.single(Token::LeftBracket),
            ']' => self.single(Token::RightBracket),
            '=' => self.single(Token::Symbol("=")),
            '>' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Ok(Token::Symbol(">="))
                } else {
                    Ok(Token::Symbol(">"))
                }
            }
            '<' => {
                self.advance();
                match self.current_char() {
                    Some('=') => {
                        self.advance();
                        Ok(Token::Symbol("<="))
                    }
                    Some('>') => {
                        self.advance();
                        Ok(Token::Symbol("<>"))
                    }
                    _ => Ok(Token::Symbol("<")),
                }
            }
            '!' => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    Ok(Token::Symbol("!="))
                } else {
                    Err(self.error_at(self.token_start, "expected '=' after '!'"))
                }
            }
            '"' | '\'' => {
                self.advance();
                self.read_quoted_string(ch)
            }
            '-' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number(),
            _ if ch.is_ascii_digit() => self.read_number(),
            _ if Self::is_word_start(ch) => Ok(self.read_word()),
            _ => Err(self.error_at(self.position, format!("unexpected character '{ch}'"))),
        }
    }

    /// Peek at the next token without consuming it
    pub fn peek_token(&mut self) -> Result<Token> {
        let saved_position = self.position;
        let saved_start = self.token_start;
        let token = self.next_token();
        self.position = saved_position;
        self.token_start = saved_start;
        token
    }

    /// Check if the lexer has reached the end of input
    pub fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn single(&mut self, token: Token) -> Result<Token> {
        self.advance();
        Ok(token)
    }

    fn read_word(&mut self) -> Token {
        let mut word = String::new();
        while let Some(ch) = self.current_char() {
            if !Self::is_word_char(ch) {
                break;
            }
            word.push(ch);
            self.advance();
        }
        Token::Word(word)
    }

    /// Read a quoted string. `\\` and escaped quotes resolve to the
    /// character; any other escape keeps its backslash so LIKE patterns can
    /// carry `\%` and `\_`.
    fn read_quoted_string(&mut self, quote: char) -> Result<Token> {
        let mut s = String::new();

        while let Some(ch) = self.current_char() {
            self.advance();
            if ch == quote {
                return Ok(Token::QuotedString(s));
            }
            if ch != '\\' {
                s.push(ch);
                continue;
            }
            match self.current_char() {
                Some(escaped @ ('"' | '\'' | '\\')) => {
                    s.push(escaped);
                    self.advance();
                }
                Some(escaped) => {
                    s.push('\\');
                    s.push(escaped);
                    self.advance();
                }
                None => break,
            }
        }

        Err(self.error_at(self.token_start, "unterminated quoted string"))
    }

    fn read_number(&mut self) -> Result<Token> {
        let mut text = String::new();
        let mut is_float = false;

        if self.current_char() == Some('-') {
            text.push('-');
            self.advance();
        }
        self.read_digits(&mut text);

        if self.current_char() == Some('.') && self.peek().is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            text.push('.');
            self.advance();
            self.read_digits(&mut text);
        }

        if matches!(self.current_char(), Some('e' | 'E')) {
            let mut lookahead = self.position + 1;
            if matches!(self.input.get(lookahead), Some('+' | '-')) {
                lookahead += 1;
            }
            if self.input.get(lookahead).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                while self.position < lookahead {
                    if let Some(ch) = self.current_char() {
                        text.push(ch);
                    }
                    self.advance();
                }
                self.read_digits(&mut text);
            }
        }

        if self.current_char().is_some_and(Self::is_word_char) {
            return Err(self.error_at(self.token_start, format!("invalid number '{text}'")));
        }

        if !is_float {
            if let Ok(n) = text.parse::<i64>() {
                return Ok(Token::Number(Number::from(n)));
            }
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Token::Number)
            .ok_or_else(|| self.error_at(self.token_start, format!("invalid number '{text}'")))
    }

    fn read_digits(&mut self, text: &mut String) {
        while let Some(ch) = self.current_char() {
            if !ch.is_ascii_digit() {
                break;
            }
            text.push(ch);
            self.advance();
        }
    }

    fn is_word_start(ch: char) -> bool {
        ch.is_alphabetic() || matches!(ch, '_' | '@' | '#')
    }

    fn is_word_char(ch: char) -> bool {
        ch.is_alphanumeric() || matches!(ch, '_' | '.' | '@' | '#' | '-')
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token == Token::Eof {
                break;
            }
            out.push(token);
        }
        out
    }

    fn word(w: &str) -> Token {
        Token::Word(w.to_string())
    }

    #[test]
    fn test_simple_filter() {
        assert_eq!(
            tokens("address.city EQ 'Rio'"),
            vec![
                word("address.city"),
                word("EQ"),
                Token::QuotedString("Rio".to_string())
            ]
        );
    }

    #[test]
    fn test_hyphenated_word() {
        assert_eq!(
            tokens("listing-type EQ -1"),
            vec![
                word("listing-type"),
                word("EQ"),
                Token::Number(Number::from(-1))
            ]
        );
    }

    #[test]
    fn test_symbols() {
        assert_eq!(
            tokens("a>=1 b<>2 c!=3 d<4 e<=5 f>6 g=7 h:8"),
            vec![
                word("a"),
                Token::Symbol(">="),
                Token::Number(Number::from(1)),
                word("b"),
                Token::Symbol("<>"),
                Token::Number(Number::from(2)),
                word("c"),
                Token::Symbol("!="),
                Token::Number(Number::from(3)),
                word("d"),
                Token::Symbol("<"),
                Token::Number(Number::from(4)),
                word("e"),
                Token::Symbol("<="),
                Token::Number(Number::from(5)),
                word("f"),
                Token::Symbol(">"),
                Token::Number(Number::from(6)),
                word("g"),
                Token::Symbol("="),
                Token::Number(Number::from(7)),
                word("h"),
                Token::Colon,
                Token::Number(Number::from(8)),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(tokens("-3"), vec![Token::Number(Number::from(-3))]);
        assert_eq!(
            tokens("42.5"),
            vec![Token::Number(Number::from_f64(42.5).unwrap())]
        );
        assert_eq!(
            tokens("1e3"),
            vec![Token::Number(Number::from_f64(1000.0).unwrap())]
        );
        assert!(Lexer::new("10abc").next_token().is_err());
    }

    #[test]
    fn test_geo_list() {
        assert_eq!(
            tokens("[[42.0,-74],[1,2]]"),
            vec![
                Token::LeftBracket,
                Token::LeftBracket,
                Token::Number(Number::from_f64(42.0).unwrap()),
                Token::Comma,
                Token::Number(Number::from(-74)),
                Token::RightBracket,
                Token::Comma,
                Token::LeftBracket,
                Token::Number(Number::from(1)),
                Token::Comma,
                Token::Number(Number::from(2)),
                Token::RightBracket,
                Token::RightBracket,
            ]
        );
    }

    #[test]
    fn test_quoted_escapes() {
        assert_eq!(
            tokens(r#""say \"hi\"""#),
            vec![Token::QuotedString("say \"hi\"".to_string())]
        );
        assert_eq!(
            tokens(r"'it\'s'"),
            vec![Token::QuotedString("it's".to_string())]
        );
        assert_eq!(
            tokens(r"'100\% off'"),
            vec![Token::QuotedString(r"100\% off".to_string())]
        );
        assert_eq!(
            tokens(r#""a\\b""#),
            vec![Token::QuotedString(r"a\b".to_string())]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("name EQ 'abc");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        assert!(matches!(
            lexer.next_token(),
            Err(GatewayError::Syntax { position: 8, .. })
        ));
    }

    #[test]
    fn test_keyword_matching() {
        assert!(word("and").is_keyword("AND"));
        assert!(word("sortfilter").is_keyword("sortFilter"));
        assert!(!Token::QuotedString("AND".to_string()).is_keyword("AND"));
    }

    #[test]
    fn test_unexpected_character() {
        assert!(Lexer::new("a ~ b").next_token().is_ok());
        let mut lexer = Lexer::new("a ~ b");
        lexer.next_token().unwrap();
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::new("a OR b");
        assert_eq!(lexer.next_token().unwrap(), word("a"));
        assert_eq!(lexer.peek_token().unwrap(), word("OR"));
        assert_eq!(lexer.next_token().unwrap(), word("OR"));
    }
}
