use crate::sdf::is_valid_identifier;
use crate::usd::{Specifier, Value};

use super::ast::{
    AttributeSpec, Layer, ListOp, Metadatum, PrimSpec, PropertySpec, RelationshipSpec, Variability,
};
use super::error::ParseError;
use super::lexer::{Lexer, Spanned, Token};

/// First bytes of every text layer.
pub const USDA_MAGIC: &str = "#usda";

// ── Parser ────────────────────────────────────────────────────────────────

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current_pos(&self) -> (usize, usize) {
        self.tokens
            .get(self.pos)
            .map(|t| (t.line, t.col))
            .or_else(|| self.tokens.last().map(|t| (t.line, t.col)))
            .unwrap_or((1, 1))
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).map(|t| &t.token).unwrap_or(&Token::Eof)
    }

    fn peek_ahead(&self, offset: usize) -> &Token {
        self.tokens.get(self.pos + offset).map(|t| &t.token).unwrap_or(&Token::Eof)
    }

    fn peek_ident(&self) -> Option<&str> {
        match self.peek() {
            Token::Ident(s) => Some(s),
            _ => None,
        }
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens.get(self.pos)
            .map(|t| t.token.clone())
            .unwrap_or(Token::Eof);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn err(&self, msg: impl Into<String>) -> ParseError {
        let (line, col) = self.current_pos();
        ParseError::new(msg, line, col)
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.peek().clone() {
            Token::Ident(s) => {
                self.advance();
                Ok(s)
            }
            tok => Err(self.err(format!("expected identifier, got {:?}", tok))),
        }
    }

    fn expect_str(&mut self) -> Result<String, ParseError> {
        match self.peek().clone() {
            Token::Str(s) => {
                self.advance();
                Ok(s)
            }
            tok => Err(self.err(format!("expected string, got {:?}", tok))),
        }
    }

    fn expect_token(&mut self, expected: &Token) -> Result<(), ParseError> {
        if self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected {:?}, got {:?}", expected, self.peek())))
        }
    }

    fn skip_semicolons(&mut self) {
        while self.peek() == &Token::Semicolon {
            self.advance();
        }
    }

    // ── Layer ─────────────────────────────────────────────────────────────

    pub fn parse_layer(&mut self) -> Result<Layer, ParseError> {
        let mut layer = Layer::default();

        if self.peek() == &Token::LParen {
            layer.metadata = self.parse_metadata_block()?;
        }

        loop {
            match self.peek() {
                Token::Eof => break,
                Token::Ident(word) if Specifier::from_keyword(word).is_some() => {
                    layer.prims.push(self.parse_prim()?);
                }
                tok => {
                    return Err(self.err(format!(
                        "expected 'def', 'over' or 'class' at layer scope, got {:?}",
                        tok
                    )));
                }
            }
        }

        Ok(layer)
    }

    // ── Metadata ──────────────────────────────────────────────────────────

    /// `( "doc" key = value prepend key = value ... )`
    fn parse_metadata_block(&mut self) -> Result<Vec<Metadatum>, ParseError> {
        self.expect_token(&Token::LParen)?;
        let mut entries = Vec::new();

        loop {
            self.skip_semicolons();
            match self.peek().clone() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Eof => return Err(self.err("unclosed '(' metadata block")),
                Token::Str(doc) => {
                    self.advance();
                    entries.push(Metadatum {
                        key: "doc".to_string(),
                        list_op: None,
                        value: Value::String(doc),
                    });
                }
                Token::Ident(word) => {
                    let list_op = match ListOp::from_keyword(&word) {
                        Some(op) if matches!(self.peek_ahead(1), Token::Ident(_)) => {
                            self.advance();
                            Some(op)
                        }
                        _ => None,
                    };
                    let key = self.expect_ident()?;
                    self.expect_token(&Token::Equals)?;
                    let value = self.parse_value()?;
                    entries.push(Metadatum { key, list_op, value });
                }
                tok => {
                    return Err(self.err(format!("unexpected {:?} in metadata block", tok)));
                }
            }
        }

        Ok(entries)
    }

    // ── Prim ──────────────────────────────────────────────────────────────

    fn parse_prim(&mut self) -> Result<PrimSpec, ParseError> {
        let keyword = self.expect_ident()?;
        let specifier = Specifier::from_keyword(&keyword)
            .ok_or_else(|| self.err(format!("unknown specifier '{}'", keyword)))?;

        let type_name = match self.peek() {
            Token::Ident(_) => self.expect_ident()?,
            _ => String::new(),
        };

        let name = self.expect_str()?;
        if !is_valid_identifier(&name) {
            return Err(self.err(format!("invalid prim name {:?}", name)));
        }

        let metadata = if self.peek() == &Token::LParen {
            self.parse_metadata_block()?
        } else {
            Vec::new()
        };

        let mut spec = PrimSpec {
            specifier,
            type_name,
            name,
            metadata,
            properties: Vec::new(),
            children: Vec::new(),
            variant_sets: Vec::new(),
        };
        self.parse_prim_body(&mut spec)?;
        Ok(spec)
    }

    /// `{ (prim | property | variantSet | reorder)* }`
    fn parse_prim_body(&mut self, spec: &mut PrimSpec) -> Result<(), ParseError> {
        self.expect_token(&Token::LBrace)?;

        loop {
            self.skip_semicolons();
            let word = match self.peek() {
                Token::RBrace => {
                    self.advance();
                    break;
                }
                Token::Eof => return Err(self.err(format!("unclosed body of prim '{}'", spec.name))),
                Token::Ident(word) => word.clone(),
                tok => {
                    return Err(self.err(format!(
                        "unexpected {:?} in body of prim '{}'",
                        tok, spec.name
                    )));
                }
            };

            if Specifier::from_keyword(&word).is_some() {
                spec.children.push(self.parse_prim()?);
            } else if word == "variantSet" {
                let name = self.parse_variant_set()?;
                spec.variant_sets.push(name);
            } else if word == "reorder"
                && matches!(self.peek_ahead(1), Token::Ident(s) if s == "nameChildren" || s == "properties")
            {
                self.advance();
                self.advance();
                self.expect_token(&Token::Equals)?;
                self.parse_value()?;
            } else {
                match self.parse_property()? {
                    PropertySpec::Attribute(attr) => merge_attribute(&mut spec.properties, attr),
                    rel => spec.properties.push(rel),
                }
            }
        }

        Ok(())
    }

    /// `variantSet "name" = { "variant" (meta)? { body } ... }`
    ///
    /// Variant bodies are parsed for syntax and discarded.
    fn parse_variant_set(&mut self) -> Result<String, ParseError> {
        self.advance(); // consume `variantSet`
        let name = self.expect_str()?;
        self.expect_token(&Token::Equals)?;
        self.expect_token(&Token::LBrace)?;

        loop {
            match self.peek() {
                Token::RBrace => {
                    self.advance();
                    break;
                }
                Token::Str(_) => {
                    let variant = self.expect_str()?;
                    if self.peek() == &Token::LParen {
                        self.parse_metadata_block()?;
                    }
                    let mut scratch = PrimSpec {
                        specifier: Specifier::Over,
                        type_name: String::new(),
                        name: variant,
                        metadata: Vec::new(),
                        properties: Vec::new(),
                        children: Vec::new(),
                        variant_sets: Vec::new(),
                    };
                    self.parse_prim_body(&mut scratch)?;
                }
                tok => {
                    return Err(self.err(format!("expected variant name, got {:?}", tok)));
                }
            }
        }

        Ok(name)
    }

    // ── Property ──────────────────────────────────────────────────────────

    fn parse_property(&mut self) -> Result<PropertySpec, ParseError> {
        let list_op = match self.peek_ident().and_then(ListOp::from_keyword) {
            Some(op) if matches!(self.peek_ahead(1), Token::Ident(_)) => {
                self.advance();
                Some(op)
            }
            _ => None,
        };

        let mut custom = false;
        let mut variability = Variability::Varying;
        loop {
            match self.peek_ident() {
                Some("custom") => custom = true,
                Some("uniform") => variability = Variability::Uniform,
                Some("varying") | Some("config") => {}
                _ => break,
            }
            self.advance();
        }

        if self.peek_ident() == Some("rel") {
            self.advance();
            return self.parse_relationship(custom, list_op).map(PropertySpec::Relationship);
        }

        let type_name = self.expect_ident()?;
        let is_array = if self.peek() == &Token::LBracket {
            self.advance();
            self.expect_token(&Token::RBracket)?;
            true
        } else {
            false
        };
        let name = self.expect_ident()?;

        let mut attr = AttributeSpec::new(name, type_name);
        attr.is_array = is_array;
        attr.custom = custom;
        attr.variability = variability;

        if self.peek() == &Token::Dot {
            self.advance();
            let field = self.expect_ident()?;
            self.expect_token(&Token::Equals)?;
            match field.as_str() {
                "timeSamples" => {
                    attr.time_samples = self
                        .parse_time_samples()?
                        .into_iter()
                        .map(|(t, v)| (t, coerce_to_type(v, &attr.type_name)))
                        .collect();
                }
                "connect" => attr.connections = self.parse_path_list()?,
                other => return Err(self.err(format!("unknown attribute field '.{}'", other))),
            }
        } else if self.peek() == &Token::Equals {
            self.advance();
            let value = self.parse_value()?;
            attr.default = Some(coerce_to_type(value, &attr.type_name));
        }

        if self.peek() == &Token::LParen {
            attr.metadata = self.parse_metadata_block()?;
        }

        Ok(PropertySpec::Attribute(attr))
    }

    fn parse_relationship(
        &mut self,
        custom: bool,
        list_op: Option<ListOp>,
    ) -> Result<RelationshipSpec, ParseError> {
        let name = self.expect_ident()?;
        let targets = if self.peek() == &Token::Equals {
            self.advance();
            self.parse_path_list()?
        } else {
            Vec::new()
        };
        let metadata = if self.peek() == &Token::LParen {
            self.parse_metadata_block()?
        } else {
            Vec::new()
        };
        Ok(RelationshipSpec { name, custom, list_op, targets, metadata })
    }

    /// `</a>`, `[</a>, </b>]` or `None`
    fn parse_path_list(&mut self) -> Result<Vec<String>, ParseError> {
        match self.parse_value()? {
            Value::Path(p) => Ok(vec![p]),
            Value::None => Ok(Vec::new()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Path(p) => Ok(p),
                    other => Err(self.err(format!("expected path reference, got {:?}", other))),
                })
                .collect(),
            other => Err(self.err(format!("expected path reference, got {:?}", other))),
        }
    }

    /// `{ time: value, ... }`
    fn parse_time_samples(&mut self) -> Result<Vec<(f64, Value)>, ParseError> {
        self.expect_token(&Token::LBrace)?;
        let mut samples = Vec::new();

        loop {
            match self.peek().clone() {
                Token::RBrace => {
                    self.advance();
                    break;
                }
                Token::Number { value: time, .. } => {
                    self.advance();
                    self.expect_token(&Token::Colon)?;
                    let value = self.parse_value()?;
                    samples.push((time, value));
                    if self.peek() == &Token::Comma {
                        self.advance();
                    }
                }
                tok => return Err(self.err(format!("expected time sample, got {:?}", tok))),
            }
        }

        samples.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(samples)
    }

    // ── Value ─────────────────────────────────────────────────────────────

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        match self.peek().clone() {
            Token::Number { value, integer } => {
                self.advance();
                if integer && value.abs() < i64::MAX as f64 {
                    Ok(Value::Int(value as i64))
                } else {
                    Ok(Value::Double(value))
                }
            }
            Token::Str(s) => {
                self.advance();
                Ok(Value::String(s))
            }
            Token::Asset(a) => {
                self.advance();
                // reference/payload form `@asset@</Prim>`
                if let Token::PathRef(p) = self.peek().clone() {
                    self.advance();
                    return Ok(Value::Tuple(vec![Value::Asset(a), Value::Path(p)]));
                }
                Ok(Value::Asset(a))
            }
            Token::PathRef(p) => {
                self.advance();
                Ok(Value::Path(p))
            }
            Token::Ident(word) => {
                self.advance();
                Ok(match word.as_str() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    "None" => Value::None,
                    _ => Value::Token(word),
                })
            }
            Token::LParen => self.parse_sequence(Token::LParen, Token::RParen).map(Value::Tuple),
            Token::LBracket => self.parse_sequence(Token::LBracket, Token::RBracket).map(Value::Array),
            Token::LBrace => self.parse_dictionary(),
            tok => Err(self.err(format!("expected a value, got {:?}", tok))),
        }
    }

    fn parse_sequence(&mut self, open: Token, close: Token) -> Result<Vec<Value>, ParseError> {
        self.expect_token(&open)?;
        let mut items = Vec::new();
        loop {
            if self.peek() == &close {
                self.advance();
                break;
            }
            if self.peek() == &Token::Eof {
                return Err(self.err(format!("unclosed {:?}", open)));
            }
            items.push(self.parse_value()?);
            match self.peek() {
                Token::Comma => {
                    self.advance();
                }
                tok if tok == &close => {}
                tok => return Err(self.err(format!("expected ',' or {:?}, got {:?}", close, tok))),
            }
        }
        Ok(items)
    }

    /// `{ type key = value ... }`
    fn parse_dictionary(&mut self) -> Result<Value, ParseError> {
        self.expect_token(&Token::LBrace)?;
        let mut entries = Vec::new();

        loop {
            self.skip_semicolons();
            match self.peek() {
                Token::RBrace => {
                    self.advance();
                    break;
                }
                Token::Eof => return Err(self.err("unclosed '{' dictionary")),
                _ => {}
            }

            let type_name = self.expect_ident()?;
            if self.peek() == &Token::LBracket {
                self.advance();
                self.expect_token(&Token::RBracket)?;
            }
            let key = match self.peek().clone() {
                Token::Ident(s) | Token::Str(s) => {
                    self.advance();
                    s
                }
                tok => return Err(self.err(format!("expected dictionary key, got {:?}", tok))),
            };
            self.expect_token(&Token::Equals)?;
            let value = self.parse_value()?;
            entries.push((key, coerce_to_type(value, &type_name)));
        }

        Ok(Value::Dictionary(entries))
    }
}

/// Fold a `.timeSamples`/`.connect` line into the attribute declared on
/// another line of the same prim body.
fn merge_attribute(properties: &mut Vec<PropertySpec>, attr: AttributeSpec) {
    let existing = properties.iter_mut().find_map(|p| match p {
        PropertySpec::Attribute(a) if a.name == attr.name => Some(a),
        _ => None,
    });
    match existing {
        Some(a) => {
            if attr.default.is_some() {
                a.default = attr.default;
            }
            if !attr.time_samples.is_empty() {
                a.time_samples = attr.time_samples;
            }
            if !attr.connections.is_empty() {
                a.connections = attr.connections;
            }
            a.metadata.extend(attr.metadata);
            a.custom |= attr.custom;
        }
        None => properties.push(PropertySpec::Attribute(attr)),
    }
}

/// Apply the declared value type to a literal (`token` text, float widening,
/// bool from 0/1).
fn coerce_to_type(value: Value, type_name: &str) -> Value {
    let floating = ["float", "double", "half", "point", "normal", "vector", "color",
        "texCoord", "quat", "matrix", "frame", "timecode"]
        .iter()
        .any(|prefix| type_name.starts_with(prefix));

    match value {
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|v| coerce_to_type(v, type_name)).collect())
        }
        Value::Tuple(items) => {
            Value::Tuple(items.into_iter().map(|v| coerce_to_type(v, type_name)).collect())
        }
        Value::String(s) if type_name == "token" => Value::Token(s),
        Value::Int(i) if floating => Value::Double(i as f64),
        Value::Int(i) if type_name == "bool" => Value::Bool(i != 0),
        other => other,
    }
}

// ── Public parse entry point ──────────────────────────────────────────────

/// Parse a `.usda` source string into a [`Layer`].
pub fn parse_layer(src: &str) -> Result<Layer, ParseError> {
    if !src.trim_start_matches('\u{feff}').starts_with(USDA_MAGIC) {
        return Err(ParseError::new("missing '#usda' header", 1, 1));
    }
    let tokens = Lexer::new(src).tokenize()?;
    Parser::new(tokens).parse_layer()
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
