//! Recursive descent parser for filter expressions
//!
//! # Grammar
//!
//! ```text
//! expr      := item (logical item)*
//! item      := NOT? ( '(' expr ')' | filter )
//! filter    := field operator value
//! logical   := AND | OR
//! operator  := '=' | ':' | '<>' | '!=' | '>' | '>=' | '<' | '<=' | WORD
//! value     := NUMBER | QUOTED | true | false | null | '[' value (',' value)* ']'
//! ```
//!
//! There is no precedence between AND and OR: items are read left to right
//! and grouping only comes from parentheses.
//!
//! # Example
//!
//! ```rust
//! use searchgate::query::query_string::QueryParser;
//!
//! let mut parser = QueryParser::new("price RANGE [10, 20] AND NOT (city EQ 'Rio')").unwrap();
//! let expr = parser.parse().unwrap();
//! assert_eq!(
//!     expr.to_string(),
//!     "(price RANGE [10, 20] AND NOT (city EQUAL \"Rio\"))"
//! );
//! ```

use super::lexer::{Lexer, Token};
use crate::error::GatewayError;
use crate::query::field::Field;
use crate::query::filter::Filter;
use crate::query::fragment::{FragmentItem, FragmentList, QueryFragment, MAX_FRAGMENTS};
use crate::query::types::{LogicalOperator, RelationalOperator};
use crate::query::value::Value;
use crate::schema::IndexSnapshot;
use crate::Result;

/// Deepest list literal accepted (polygons and viewports need two levels)
const MAX_LIST_DEPTH: usize = 2;

const RESERVED_WORDS: [&str; 3] = ["AND", "OR", "NOT"];

/// Parse a filter expression without field validation
pub fn parse_query(input: &str) -> Result<FragmentList> {
    QueryParser::new(input)?.parse()
}

/// Parser for filter expressions, and the token-level base of the sort and
/// facet parsers
pub struct QueryParser<'a> {
    lexer: Lexer,
    current_token: Token,
    token_position: usize,
    /// Mapping used to resolve fields; `None` disables validation
    schema: Option<&'a IndexSnapshot>,
    max_fragments: usize,
    fragment_count: usize,
}

impl<'a> QueryParser<'a> {
    /// Create a new parser for the given input
    pub fn new(input: &str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token()?;
        let token_position = lexer.token_start();

        Ok(Self {
            lexer,
            current_token,
            token_position,
            schema: None,
            max_fragments: MAX_FRAGMENTS,
            fragment_count: 0,
        })
    }

    /// Validate every field against an index mapping snapshot
    pub fn with_schema(mut self, schema: &'a IndexSnapshot) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Optional schema, for callers that may or may not validate
    pub fn with_optional_schema(mut self, schema: Option<&'a IndexSnapshot>) -> Self {
        self.schema = schema;
        self
    }

    /// Override the fragment limit
    pub fn with_max_fragments(mut self, max: usize) -> Self {
        self.max_fragments = max;
        self
    }

    /// Parse the whole input as one expression
    pub fn parse(&mut self) -> Result<FragmentList> {
        if self.at_eof() {
            return Err(self.error("empty expression"));
        }

        let expr = self.parse_expr()?;

        if !self.at_eof() {
            return Err(self.error(format!(
                "expected AND, OR or end of input, found {}",
                self.current_token.describe()
            )));
        }

        Ok(expr)
    }

    /// Parse `item (logical item)*`, stopping at the first token that is not
    /// a logical operator
    pub(crate) fn parse_expr(&mut self) -> Result<FragmentList> {
        if self.logical_operator().is_some() {
            return Err(GatewayError::syntax(
                self.lexer.source(),
                self.token_position,
                "The first item cannot have a logical operator prefix",
            ));
        }

        let mut items = vec![self.parse_item(None)?];

        while let Some(operator) = self.logical_operator() {
            self.advance()?;
            items.push(self.parse_item(Some(operator))?);
        }

        let list = FragmentList::with_limit(items, self.max_fragments)?;
        // Groups are counted once they survive collapsing, so redundant
        // parentheses cost nothing.
        let groups = list
            .items()
            .iter()
            .filter(|item| matches!(item.fragment, QueryFragment::List(_)))
            .count();
        self.count_fragments(groups)?;
        Ok(list)
    }

    fn count_fragments(&mut self, count: usize) -> Result<()> {
        self.fragment_count += count;
        if self.fragment_count > self.max_fragments {
            return Err(GatewayError::FragmentLimit {
                count: self.fragment_count,
                max: self.max_fragments,
            });
        }
        Ok(())
    }

    fn parse_item(&mut self, logical_operator: Option<LogicalOperator>) -> Result<FragmentItem> {
        let not = if self.current_token.is_keyword("NOT") {
            self.advance()?;
            if self.current_token.is_keyword("NOT") {
                return Err(self.error("duplicated NOT"));
            }
            true
        } else {
            false
        };

        let fragment = if self.current_token == Token::LeftParen {
            self.advance()?;
            if self.current_token == Token::RightParen {
                return Err(self.error("empty group"));
            }
            let list = self.parse_expr()?;
            self.expect(Token::RightParen)?;
            QueryFragment::List(list)
        } else {
            let filter = self.parse_filter()?;
            self.count_fragments(1)?;
            QueryFragment::Filter(filter)
        };

        Ok(FragmentItem {
            logical_operator,
            not,
            fragment,
        })
    }

    fn parse_filter(&mut self) -> Result<Filter> {
        let field = self.parse_field()?;
        let operator = self.parse_operator()?;
        let value = self.parse_value()?;
        Filter::new(field, operator, value)
    }

    /// Parse a dotted field name and resolve it against the schema
    pub(crate) fn parse_field(&mut self) -> Result<Field> {
        let name = match &self.current_token {
            Token::Word(word)
                if !RESERVED_WORDS
                    .iter()
                    .any(|reserved| word.eq_ignore_ascii_case(reserved)) =>
            {
                word.clone()
            }
            other => {
                return Err(self.error(format!("expected field name, found {}", other.describe())))
            }
        };
        if name.split('.').any(str::is_empty) {
            return Err(self.error(format!("invalid field name '{name}'")));
        }
        self.advance()?;

        match self.schema {
            Some(schema) => schema.resolve(&name, false),
            None => Ok(Field::new(&name)),
        }
    }

    pub(crate) fn parse_operator(&mut self) -> Result<RelationalOperator> {
        let operator = match &self.current_token {
            Token::Symbol(symbol) => RelationalOperator::from_symbol(symbol),
            Token::Colon => Some(RelationalOperator::Equal),
            Token::Word(word) => RelationalOperator::from_word(word),
            _ => None,
        };
        match operator {
            Some(operator) => {
                self.advance()?;
                Ok(operator)
            }
            None => Err(self.error(format!(
                "expected operator, found {}",
                self.current_token.describe()
            ))),
        }
    }

    pub(crate) fn parse_value(&mut self) -> Result<Value> {
        self.parse_value_at_depth(0)
    }

    fn parse_value_at_depth(&mut self, depth: usize) -> Result<Value> {
        let value = match &self.current_token {
            Token::QuotedString(s) => Value::String(s.clone()),
            Token::Number(n) => Value::Number(n.clone()),
            token if token.is_keyword("true") => Value::Bool(true),
            token if token.is_keyword("false") => Value::Bool(false),
            token if token.is_keyword("null") => Value::Null,
            Token::LeftBracket => return self.parse_list(depth),
            other => {
                return Err(self.error(format!("expected value, found {}", other.describe())))
            }
        };
        self.advance()?;
        Ok(value)
    }

    fn parse_list(&mut self, depth: usize) -> Result<Value> {
        if depth >= MAX_LIST_DEPTH {
            return Err(self.error("lists nest at most two levels deep"));
        }
        self.advance()?;
        if self.current_token == Token::RightBracket {
            return Err(self.error("empty list"));
        }

        let mut items = vec![self.parse_value_at_depth(depth + 1)?];
        while self.current_token == Token::Comma {
            self.advance()?;
            items.push(self.parse_value_at_depth(depth + 1)?);
        }
        self.expect(Token::RightBracket)?;
        Ok(Value::List(items))
    }

    fn logical_operator(&self) -> Option<LogicalOperator> {
        match &self.current_token {
            Token::Word(word) => LogicalOperator::from_word(word),
            _ => None,
        }
    }

    pub(crate) fn current(&self) -> &Token {
        &self.current_token
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.current_token == Token::Eof
    }

    pub(crate) fn advance(&mut self) -> Result<()> {
        self.current_token = self.lexer.next_token()?;
        self.token_position = self.lexer.token_start();
        Ok(())
    }

    pub(crate) fn expect(&mut self, expected: Token) -> Result<()> {
        if std::mem::discriminant(&self.current_token) == std::mem::discriminant(&expected) {
            self.advance()
        } else {
            Err(self.error(format!(
                "expected {}, found {}",
                expected.describe(),
                self.current_token.describe()
            )))
        }
    }

    /// Syntax error at the current token
    pub(crate) fn error(&self, message: impl Into<String>) -> GatewayError {
        self.lexer.error_at(self.token_position, message)
    }
}
