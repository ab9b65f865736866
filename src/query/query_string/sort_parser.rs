//! Sort expression parser
//!
//! ```text
//! sort  := item (',' item)*
//! item  := field ORDER? (sortFilter ':' expr)?
//!        | field NEAR '[' lat ',' lon ']' ORDER?
//!        | '_score' ORDER?
//! ORDER := ASC | DESC
//! ```
//!
//! Sort filters use the filter grammar and stop at the next top-level comma.

use super::parser::QueryParser;
use super::lexer::Token;
use crate::error::GatewayError;
use crate::query::field::Field;
use crate::query::sort::{Sort, SortItem};
use crate::query::types::{RelationalOperator, SortOrder};
use crate::schema::IndexSnapshot;
use crate::Result;

/// Parse a sort expression without field validation
pub fn parse_sort(input: &str) -> Result<Sort> {
    SortParser::new(input)?.parse()
}

/// Parser for sort expressions
pub struct SortParser<'a> {
    parser: QueryParser<'a>,
}

impl<'a> SortParser<'a> {
    pub fn new(input: &str) -> Result<Self> {
        Ok(Self {
            parser: QueryParser::new(input)?,
        })
    }

    /// Validate fields, including those of sort filters
    pub fn with_schema(mut self, schema: &'a IndexSnapshot) -> Self {
        self.parser = self.parser.with_schema(schema);
        self
    }

    pub fn with_optional_schema(mut self, schema: Option<&'a IndexSnapshot>) -> Self {
        self.parser = self.parser.with_optional_schema(schema);
        self
    }

    /// Parse the whole input. Later items on an already sorted field are
    /// dropped.
    pub fn parse(&mut self) -> Result<Sort> {
        if self.parser.at_eof() {
            return Err(self.parser.error("empty sort"));
        }

        let mut items = Vec::new();
        loop {
            items.push(self.parse_item()?);
            match self.parser.current() {
                Token::Comma => self.parser.advance()?,
                Token::Eof => break,
                other => {
                    return Err(self.parser.error(format!(
                        "expected ',' or end of input, found {}",
                        other.describe()
                    )))
                }
            }
        }

        Ok(Sort::new(items))
    }

    fn parse_item(&mut self) -> Result<SortItem> {
        let field = self.parser.parse_field()?;

        if field.is_score() {
            self.parse_order()?;
            return Ok(SortItem::score(field));
        }

        if self.parser.current().is_keyword("NEAR") {
            self.parser.advance()?;
            return self.parse_distance(field);
        }

        check_sortable(&field)?;
        let order = self.parse_order()?.unwrap_or_default();
        let mut item = SortItem::field(field, order);

        if self.parser.current().is_keyword("sortFilter") {
            self.parser.advance()?;
            self.parser.expect(Token::Colon)?;
            let filter = self.parser.parse_expr()?;
            if item.field.is_typed() && item.field.nested_path().is_none() {
                return Err(GatewayError::InvalidRequest(format!(
                    "sortFilter needs a field below a nested path, [{}] has none",
                    item.field
                )));
            }
            item = item.with_filter(filter);
        }

        Ok(item)
    }

    fn parse_distance(&mut self, field: Field) -> Result<SortItem> {
        let operator = RelationalOperator::Near;
        let point = self
            .parser
            .parse_value()?
            .to_point()
            .map_err(|msg| GatewayError::invalid_value(operator, msg))?;

        if let Some(field_type) = field.field_type() {
            if !field_type.is_geo() {
                return Err(GatewayError::invalid_value(
                    operator,
                    format!("[{field}] is a {field_type} field, NEAR needs a geo_point field"),
                ));
            }
        }

        let order = self.parse_order()?.unwrap_or_default();
        Ok(SortItem::distance(field, point, order))
    }

    /// Optional ASC/DESC. Any other word in that position is rejected.
    fn parse_order(&mut self) -> Result<Option<SortOrder>> {
        let token = self.parser.current();
        if matches!(token, Token::Comma | Token::Eof) || token.is_keyword("sortFilter") {
            return Ok(None);
        }
        if let Token::Word(word) = token {
            if let Some(order) = SortOrder::from_word(word) {
                self.parser.advance()?;
                return Ok(Some(order));
            }
        }
        Err(self.parser.error(format!(
            "unrecognized sort direction {}",
            token.describe()
        )))
    }
}

fn check_sortable(field: &Field) -> Result<()> {
    match field.field_type() {
        Some(field_type) if field_type.is_geo() || !field_type.supports_sorting() => {
            Err(GatewayError::InvalidRequest(format!(
                "{field_type} field [{field}] cannot be sorted by value"
            )))
        }
        _ => Ok(()),
    }
}
