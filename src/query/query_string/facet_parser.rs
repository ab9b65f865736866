//! Facet list parser
//!
//! ```text
//! facets := NOT? field (',' NOT? field)*
//! ```
//!
//! A NOT prefix is accepted and recorded on the field, but has no effect on
//! the aggregation that gets compiled.

use super::lexer::Token;
use super::parser::QueryParser;
use crate::error::GatewayError;
use crate::query::facet::Facets;
use crate::schema::IndexSnapshot;
use crate::Result;

/// Parse a facet list without field validation
pub fn parse_facets(input: &str) -> Result<Facets> {
    FacetParser::new(input)?.parse()
}

/// Parser for comma-separated facet fields
pub struct FacetParser<'a> {
    parser: QueryParser<'a>,
}

impl<'a> FacetParser<'a> {
    pub fn new(input: &str) -> Result<Self> {
        Ok(Self {
            parser: QueryParser::new(input)?,
        })
    }

    pub fn with_schema(mut self, schema: &'a IndexSnapshot) -> Self {
        self.parser = self.parser.with_schema(schema);
        self
    }

    pub fn parse(&mut self) -> Result<Facets> {
        if self.parser.at_eof() {
            return Err(self.parser.error("empty facet list"));
        }

        let mut fields = Vec::new();
        loop {
            let not = self.parser.current().is_keyword("NOT");
            if not {
                self.parser.advance()?;
            }

            let field = self.parser.parse_field()?;
            if let Some(field_type) = field.field_type() {
                if !field_type.supports_aggregation() {
                    return Err(GatewayError::InvalidRequest(format!(
                        "{field_type} field [{field}] cannot be used as a facet"
                    )));
                }
            }
            fields.push(field.with_not(not));

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

        Ok(Facets::new(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldMapping, FieldType, IndexMapping};

    #[test]
    fn test_single_and_multiple() {
        assert_eq!(parse_facets("field").unwrap().to_string(), "field");
        assert_eq!(
            parse_facets("field1, field2,field3").unwrap().to_string(),
            "field1, field2, field3"
        );
    }

    #[test]
    fn test_not_prefix_accepted() {
        let facets = parse_facets("field1, NOT field2").unwrap();
        assert_eq!(facets.fields().len(), 2);
        assert!(!facets.fields()[0].is_not());
        assert!(facets.fields()[1].is_not());
    }

    #[test]
    fn test_duplicates_removed() {
        let facets = parse_facets("a, b, a").unwrap();
        assert_eq!(facets.to_string(), "a, b");
    }

    #[test]
    fn test_invalid() {
        for input in ["", "a,", ",a", "a b", "a EQ 1", "NOT"] {
            assert!(parse_facets(input).is_err(), "input {input:?}");
        }
    }

    #[test]
    fn test_schema_validation() {
        let schema = IndexSnapshot::new(
            "listings",
            IndexMapping::new()
                .field("kind", FieldMapping::keyword())
                .field("title", FieldMapping::text())
                .field(
                    "units",
                    FieldMapping::new(FieldType::Nested).property("rooms", FieldMapping::long()),
                ),
        );
        let parse = |input: &str| FacetParser::new(input).unwrap().with_schema(&schema).parse();

        assert!(parse("kind, units.rooms").is_ok());
        assert!(matches!(parse("missing"), Err(GatewayError::InvalidField { .. })));
        assert!(parse("title").is_err());
        assert!(parse("units").is_err());
    }
}
