//! Well-known text (WKT) and EWKT parsing.
//!
//! Supports the OGC simple-features types with optional `Z`, `M` or `ZM`
//! tags and `EMPTY`, plus the PostGIS `SRID=<code>;` prefix.

use hrdem_common::CrsCode;
use thiserror::Error;

use super::{Geometry, Position};

/// Errors that can occur when parsing WKT.
#[derive(Debug, Error, PartialEq)]
pub enum WktError {
    #[error("Unexpected end of WKT input, expected {0}")]
    UnexpectedEnd(&'static str),

    #[error("Unexpected '{found}' at offset {offset}, expected {expected}")]
    Unexpected {
        found: String,
        offset: usize,
        expected: &'static str,
    },

    #[error("Unknown WKT geometry type: {0}")]
    UnknownType(String),

    #[error("Invalid coordinate value: {0}")]
    InvalidCoordinate(String),

    #[error("Expected {expected} ordinates per position, got {found}")]
    Dimension { expected: String, found: usize },

    #[error("Invalid SRID: {0}")]
    InvalidSrid(String),
}

/// A parsed WKT geometry and the SRID from an EWKT prefix, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedWkt {
    pub geometry: Geometry,
    pub srid: Option<CrsCode>,
}

/// Parse WKT or EWKT text.
pub fn parse_wkt(text: &str) -> Result<ParsedWkt, WktError> {
    let trimmed = text.trim();
    let (srid, body) = split_srid(trimmed)?;

    let mut parser = Parser::new(body);
    let geometry = parser.geometry()?;
    if let Some(token) = parser.peek() {
        return Err(parser.unexpected(token, "end of input"));
    }

    Ok(ParsedWkt { geometry, srid })
}

fn split_srid(text: &str) -> Result<(Option<CrsCode>, &str), WktError> {
    let has_prefix = text
        .get(..5)
        .map(|prefix| prefix.eq_ignore_ascii_case("SRID="))
        .unwrap_or(false);
    if !has_prefix {
        return Ok((None, text));
    }

    let (srid, body) = text[5..]
        .split_once(';')
        .ok_or_else(|| WktError::InvalidSrid(text.to_string()))?;
    let code: u16 = srid
        .trim()
        .parse()
        .map_err(|_| WktError::InvalidSrid(srid.to_string()))?;

    Ok((Some(CrsCode::from_epsg(code)), body))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Word(&'a str),
    Open,
    Close,
    Comma,
}

impl Token<'_> {
    fn text(&self) -> String {
        match self {
            Token::Word(word) => word.to_string(),
            Token::Open => "(".to_string(),
            Token::Close => ")".to_string(),
            Token::Comma => ",".to_string(),
        }
    }
}

/// Ordinates per position declared by a Z/M/ZM tag.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Dimension {
    /// No tag: 2 to 4 ordinates accepted
    Untagged,
    Xyz,
    Xym,
    Xyzm,
}

impl Dimension {
    fn accepts(self, count: usize) -> bool {
        match self {
            Dimension::Untagged => (2..=4).contains(&count),
            Dimension::Xyz | Dimension::Xym => count == 3,
            Dimension::Xyzm => count == 4,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Dimension::Untagged => "2 to 4",
            Dimension::Xyz | Dimension::Xym => "3",
            Dimension::Xyzm => "4",
        }
    }
}

struct Parser<'a> {
    tokens: Vec<(usize, Token<'a>)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        let mut tokens = Vec::new();
        let mut word_start = None;

        for (idx, ch) in text.char_indices() {
            let delimiter = match ch {
                '(' => Some(Token::Open),
                ')' => Some(Token::Close),
                ',' => Some(Token::Comma),
                c if c.is_whitespace() => None,
                _ => {
                    word_start.get_or_insert(idx);
                    continue;
                }
            };

            if let Some(start) = word_start.take() {
                tokens.push((start, Token::Word(&text[start..idx])));
            }
            if let Some(token) = delimiter {
                tokens.push((idx, token));
            }
        }
        if let Some(start) = word_start {
            tokens.push((start, Token::Word(&text[start..])));
        }

        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).map(|(_, token)| *token)
    }

    fn next(&mut self, expected: &'static str) -> Result<Token<'a>, WktError> {
        let token = self.peek().ok_or(WktError::UnexpectedEnd(expected))?;
        self.pos += 1;
        Ok(token)
    }

    fn unexpected(&self, token: Token<'_>, expected: &'static str) -> WktError {
        let offset = self
            .tokens
            .get(self.pos)
            .map(|(offset, _)| *offset)
            .unwrap_or_default();
        WktError::Unexpected {
            found: token.text(),
            offset,
            expected,
        }
    }

    fn expect(&mut self, wanted: Token<'static>, expected: &'static str) -> Result<(), WktError> {
        match self.peek() {
            Some(token) if token == wanted => {
                self.pos += 1;
                Ok(())
            }
            Some(token) => Err(self.unexpected(token, expected)),
            None => Err(WktError::UnexpectedEnd(expected)),
        }
    }

    /// Consume `word` (case-insensitive) if it is next.
    fn accept_word(&mut self, word: &str) -> bool {
        match self.peek() {
            Some(Token::Word(w)) if w.eq_ignore_ascii_case(word) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    /// Consume a separating comma, or report whether the list closed.
    fn list_continues(&mut self) -> Result<bool, WktError> {
        match self.next("',' or ')'")? {
            Token::Comma => Ok(true),
            Token::Close => Ok(false),
            token => {
                self.pos -= 1;
                Err(self.unexpected(token, "',' or ')'"))
            }
        }
    }

    fn geometry(&mut self) -> Result<Geometry, WktError> {
        let type_name = match self.next("geometry type")? {
            Token::Word(word) => word.to_ascii_uppercase(),
            token => {
                self.pos -= 1;
                return Err(self.unexpected(token, "geometry type"));
            }
        };

        let dim = if self.accept_word("ZM") {
            Dimension::Xyzm
        } else if self.accept_word("Z") {
            Dimension::Xyz
        } else if self.accept_word("M") {
            Dimension::Xym
        } else {
            Dimension::Untagged
        };

        let empty = self.accept_word("EMPTY");

        match type_name.as_str() {
            // An empty point has no position; keep it as an empty multipoint
            "POINT" if empty => Ok(Geometry::MultiPoint(Vec::new())),
            "POINT" => {
                self.expect(Token::Open, "'('")?;
                let p = self.position(dim)?;
                self.expect(Token::Close, "')'")?;
                Ok(Geometry::Point(p))
            }
            "MULTIPOINT" if empty => Ok(Geometry::MultiPoint(Vec::new())),
            "MULTIPOINT" => self.multi_point(dim).map(Geometry::MultiPoint),
            "LINESTRING" if empty => Ok(Geometry::LineString(Vec::new())),
            "LINESTRING" => self.position_list(dim).map(Geometry::LineString),
            "MULTILINESTRING" if empty => Ok(Geometry::MultiLineString(Vec::new())),
            "MULTILINESTRING" => self.nested(|p| p.position_list(dim)).map(Geometry::MultiLineString),
            "POLYGON" if empty => Ok(Geometry::Polygon(Vec::new())),
            "POLYGON" => self.nested(|p| p.position_list(dim)).map(Geometry::Polygon),
            "MULTIPOLYGON" if empty => Ok(Geometry::MultiPolygon(Vec::new())),
            "MULTIPOLYGON" => self
                .nested(|p| p.nested(|p| p.position_list(dim)))
                .map(Geometry::MultiPolygon),
            "GEOMETRYCOLLECTION" if empty => Ok(Geometry::Collection(Vec::new())),
            "GEOMETRYCOLLECTION" => self.nested(Parser::geometry).map(Geometry::Collection),
            _ => Err(WktError::UnknownType(type_name)),
        }
    }

    /// `( item, item, ... )`
    fn nested<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T, WktError>,
    ) -> Result<Vec<T>, WktError> {
        self.expect(Token::Open, "'('")?;
        let mut items = Vec::new();
        loop {
            items.push(item(self)?);
            if !self.list_continues()? {
                return Ok(items);
            }
        }
    }

    /// `( x y, x y, ... )`
    fn position_list(&mut self, dim: Dimension) -> Result<Vec<Position>, WktError> {
        self.expect(Token::Open, "'('")?;
        let mut positions = Vec::new();
        loop {
            positions.push(self.position(dim)?);
            if !self.list_continues()? {
                return Ok(positions);
            }
        }
    }

    /// Both `MULTIPOINT (1 2, 3 4)` and `MULTIPOINT ((1 2), (3 4))`.
    fn multi_point(&mut self, dim: Dimension) -> Result<Vec<Position>, WktError> {
        self.expect(Token::Open, "'('")?;
        let mut positions = Vec::new();
        loop {
            if self.peek() == Some(Token::Open) {
                self.pos += 1;
                positions.push(self.position(dim)?);
                self.expect(Token::Close, "')'")?;
            } else {
                positions.push(self.position(dim)?);
            }
            if !self.list_continues()? {
                return Ok(positions);
            }
        }
    }

    fn position(&mut self, dim: Dimension) -> Result<Position, WktError> {
        let mut ordinates = Vec::with_capacity(4);
        while let Some(Token::Word(word)) = self.peek() {
            let value: f64 = word
                .parse()
                .map_err(|_| WktError::InvalidCoordinate(word.to_string()))?;
            ordinates.push(value);
            self.pos += 1;
        }

        if ordinates.is_empty() {
            return match self.peek() {
                Some(token) => Err(self.unexpected(token, "coordinate")),
                None => Err(WktError::UnexpectedEnd("coordinate")),
            };
        }
        if !dim.accepts(ordinates.len()) {
            return Err(WktError::Dimension {
                expected: dim.describe().to_string(),
                found: ordinates.len(),
            });
        }

        Ok((ordinates[0], ordinates[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(text: &str) -> Geometry {
        parse_wkt(text).unwrap().geometry
    }

    #[test]
    fn test_parse_point() {
        assert_eq!(geometry("POINT(-75.7 45.4)"), Geometry::Point((-75.7, 45.4)));
        assert_eq!(geometry("point ( -75.7   45.4 )"), Geometry::Point((-75.7, 45.4)));
    }

    #[test]
    fn test_parse_point_z_drops_extra_ordinate() {
        assert_eq!(geometry("POINT Z (1 2 3)"), Geometry::Point((1.0, 2.0)));
        assert_eq!(geometry("POINT ZM (1 2 3 4)"), Geometry::Point((1.0, 2.0)));
        assert_eq!(geometry("POINT (1 2 3)"), Geometry::Point((1.0, 2.0)));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = parse_wkt("POINT Z (1 2)").unwrap_err();
        assert_eq!(
            err,
            WktError::Dimension {
                expected: "3".to_string(),
                found: 2
            }
        );
    }

    #[test]
    fn test_parse_multipoint_both_forms() {
        let expected = Geometry::MultiPoint(vec![(1.0, 2.0), (3.0, 4.0)]);
        assert_eq!(geometry("MULTIPOINT(1 2, 3 4)"), expected);
        assert_eq!(geometry("MULTIPOINT((1 2), (3 4))"), expected);
    }

    #[test]
    fn test_parse_polygon_with_hole() {
        let g = geometry("POLYGON((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 3 2, 3 3, 2 2))");
        let Geometry::Polygon(rings) = g else {
            panic!("expected polygon");
        };
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0].len(), 5);
        assert_eq!(rings[1][1], (3.0, 2.0));
    }

    #[test]
    fn test_parse_multipolygon() {
        let g = geometry("MULTIPOLYGON(((0 0, 1 0, 1 1, 0 0)), ((5 5, 6 5, 6 6, 5 5)))");
        let Geometry::MultiPolygon(polygons) = g else {
            panic!("expected multipolygon");
        };
        assert_eq!(polygons.len(), 2);
        assert_eq!(polygons[1][0][0], (5.0, 5.0));
    }

    #[test]
    fn test_parse_geometry_collection() {
        let g = geometry("GEOMETRYCOLLECTION(POINT(1 2), LINESTRING(0 0, 1 1), POLYGON EMPTY)");
        let Geometry::Collection(members) = g else {
            panic!("expected collection");
        };
        assert_eq!(members.len(), 3);
        assert_eq!(members[1], Geometry::LineString(vec![(0.0, 0.0), (1.0, 1.0)]));
        assert!(members[2].is_empty());
    }

    #[test]
    fn test_parse_empty() {
        assert!(geometry("POINT EMPTY").is_empty());
        assert!(geometry("MULTIPOLYGON EMPTY").is_empty());
        assert!(geometry("GEOMETRYCOLLECTION EMPTY").is_empty());
    }

    #[test]
    fn test_parse_ewkt_srid() {
        let parsed = parse_wkt("SRID=3979;POINT(1500000 -170000)").unwrap();
        assert_eq!(parsed.srid, Some(CrsCode::CANADA_ATLAS_LAMBERT));
        assert_eq!(parsed.geometry, Geometry::Point((1_500_000.0, -170_000.0)));

        assert!(parse_wkt("POINT(1 2)").unwrap().srid.is_none());
    }

    #[test]
    fn test_invalid_srid() {
        assert!(matches!(parse_wkt("SRID=abc;POINT(1 2)"), Err(WktError::InvalidSrid(_))));
        assert!(matches!(parse_wkt("SRID=4326 POINT(1 2)"), Err(WktError::InvalidSrid(_))));
    }

    #[test]
    fn test_unknown_type() {
        assert_eq!(
            parse_wkt("CIRCULARSTRING(0 0, 1 1, 2 0)").unwrap_err(),
            WktError::UnknownType("CIRCULARSTRING".to_string())
        );
    }

    #[test]
    fn test_invalid_coordinate() {
        assert_eq!(
            parse_wkt("POINT(abc 1)").unwrap_err(),
            WktError::InvalidCoordinate("abc".to_string())
        );
    }

    #[test]
    fn test_unbalanced_parentheses() {
        assert!(matches!(
            parse_wkt("POLYGON((0 0, 1 0, 1 1, 0 0)"),
            Err(WktError::UnexpectedEnd(_))
        ));
        assert!(matches!(
            parse_wkt("POINT(1 2))"),
            Err(WktError::Unexpected { .. })
        ));
    }

    #[test]
    fn test_missing_comma() {
        assert!(matches!(
            parse_wkt("LINESTRING(0 0 1 1 2 2)"),
            Err(WktError::Dimension { found: 6, .. })
        ));
    }
}
