use crate::{
    NumberLiteral, ParseError,
    lexer::{Cursor, LOCATION_RULES, TokenKind},
};

/// Parses a location filter expression.
pub fn parse_location(input: &str) -> Result<LocationExpr, ParseError> {
    let mut cursor = Cursor::new(input, LOCATION_RULES)?;
    let expr = parse(&mut cursor)?;
    cursor.expect_end()?;
    Ok(expr)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Miles,
    Kilometers,
}

impl DistanceUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            DistanceUnit::Miles => "miles",
            DistanceUnit::Kilometers => "km",
        }
    }

    fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "mile" | "miles" => Some(DistanceUnit::Miles),
            "km" | "kilometer" | "kilometers" => Some(DistanceUnit::Kilometers),
            _ => None,
        }
    }
}

/// Raw location expression. Coordinates keep the text the user typed, and
/// their ranges are not validated.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationExpr {
    /// Empty input.
    Anywhere,
    /// `null`, `not null`, `-null`.
    Null { negated: bool },
    Point {
        lat: NumberLiteral,
        lon: NumberLiteral,
    },
    /// `40 miles from 36.97, -122.03`
    Circle {
        distance: NumberLiteral,
        unit: DistanceUnit,
        lat: NumberLiteral,
        lon: NumberLiteral,
    },
    /// `inside box from 72.33, -173.14 to 14.39, -61.70`
    Box {
        lat0: NumberLiteral,
        lon0: NumberLiteral,
        lat1: NumberLiteral,
        lon1: NumberLiteral,
    },
}

fn parse(cursor: &mut Cursor<'_>) -> Result<LocationExpr, ParseError> {
    if cursor.is_empty() {
        return Ok(LocationExpr::Anywhere);
    }
    if cursor.eat_word("null").is_some() {
        return Ok(LocationExpr::Null { negated: false });
    }
    if cursor.eat_word("not").is_some() || cursor.eat(TokenKind::Minus).is_some() {
        cursor.expect_word("null")?;
        return Ok(LocationExpr::Null { negated: true });
    }
    if cursor.eat_word("inside").is_some() {
        cursor.expect_word("box")?;
        cursor.expect_word("from")?;
        let (lat0, lon0) = parse_coordinates(cursor)?;
        cursor.expect_word("to")?;
        let (lat1, lon1) = parse_coordinates(cursor)?;
        return Ok(LocationExpr::Box {
            lat0,
            lon0,
            lat1,
            lon1,
        });
    }

    let first = parse_literal(cursor, "a latitude or distance")?;
    if cursor.eat(TokenKind::Comma).is_some() {
        let lon = parse_literal(cursor, "a longitude")?;
        return Ok(LocationExpr::Point { lat: first, lon });
    }
    let unit = cursor
        .peek()
        .filter(|token| token.kind == TokenKind::Word)
        .and_then(|token| DistanceUnit::from_word(token.text))
        .ok_or_else(|| cursor.error("expected ',' or a distance unit"))?;
    cursor.next();
    cursor.expect_word("from")?;
    let (lat, lon) = parse_coordinates(cursor)?;
    Ok(LocationExpr::Circle {
        distance: first,
        unit,
        lat,
        lon,
    })
}

fn parse_coordinates(
    cursor: &mut Cursor<'_>,
) -> Result<(NumberLiteral, NumberLiteral), ParseError> {
    let lat = parse_literal(cursor, "a latitude")?;
    cursor.expect(TokenKind::Comma, "','")?;
    let lon = parse_literal(cursor, "a longitude")?;
    Ok((lat, lon))
}

fn parse_literal(cursor: &mut Cursor<'_>, what: &str) -> Result<NumberLiteral, ParseError> {
    let token = cursor.expect(TokenKind::Number, what)?;
    NumberLiteral::parse(token.text).ok_or_else(|| ParseError {
        message: format!("malformed number {:?}", token.text),
        position: token.span.start,
    })
}
