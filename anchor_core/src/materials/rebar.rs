//! Reinforcement bar areas and bar-layout expressions
//!
//! Detailers write reinforcement as short formulas:
//!
//! - `f12/0.20+f16/0.20` - Ø12 and Ø16 bars every 20 cm (cm²/m)
//! - `2*f16+3*f10` - a fixed number of bars (cm²)
//!
//! [`RebarExpression`] parses these with a small recursive-descent parser
//! into a typed tree and evaluates it. Nothing else is accepted.
//!
//! ## Grammar
//!
//! ```text
//! expr   := term ('+' term)*
//! term   := factor (('*' | '×' | '/') factor)*
//! factor := number | bar | '(' expr ')'
//! bar    := ('f' | 'F' | 'Ø' | 'ø' | 'φ' | 'Φ') number     area of one bar in cm²
//! number := digits ['.' digits]
//! ```
//!
//! ## Example
//!
//! ```rust
//! use anchor_core::materials::rebar::{RebarExpression, AreaUnit};
//!
//! let expr = RebarExpression::parse("2*f16+3*f10")?;
//! assert!((expr.area_cm2()? - 6.3775).abs() < 1e-3);
//! assert_eq!(expr.unit(), AreaUnit::Cm2);
//! # Ok::<(), anchor_core::errors::CalcError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::units::{Millimeters, SqCm};

/// Longest accepted expression, in tokens
const MAX_TOKENS: usize = 256;

/// Deepest accepted parenthesis nesting
const MAX_NESTING: usize = 16;

/// Cross-sectional area of one round bar.
///
/// # Formula
/// A = π·d²/4 (mm²) = π·d²/400 (cm²)
pub fn bar_area(diameter: Millimeters) -> SqCm {
    SqCm(std::f64::consts::PI * diameter.0 * diameter.0 / 400.0)
}

/// Unit of an evaluated expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaUnit {
    /// Total area of a counted set of bars
    #[serde(rename = "cm²")]
    Cm2,
    /// Area per metre run (bars at a spacing)
    #[serde(rename = "cm²/m")]
    Cm2PerMeter,
}

impl std::fmt::Display for AreaUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AreaUnit::Cm2 => write!(f, "cm²"),
            AreaUnit::Cm2PerMeter => write!(f, "cm²/m"),
        }
    }
}

/// Expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RebarNode {
    /// Plain number (count, spacing, factor)
    Number { value: f64 },
    /// One bar of the given diameter, evaluates to its area in cm²
    Bar { diameter_mm: f64 },
    /// Sum
    Add { lhs: Box<RebarNode>, rhs: Box<RebarNode> },
    /// Product
    Mul { lhs: Box<RebarNode>, rhs: Box<RebarNode> },
    /// Quotient; `position` is the offset of the `/`
    Div {
        lhs: Box<RebarNode>,
        rhs: Box<RebarNode>,
        #[serde(default)]
        position: usize,
    },
}

impl RebarNode {
    fn evaluate(&self, source: &str) -> CalcResult<f64> {
        match self {
            RebarNode::Number { value } => Ok(*value),
            RebarNode::Bar { diameter_mm } => Ok(bar_area(Millimeters(*diameter_mm)).0),
            RebarNode::Add { lhs, rhs } => Ok(lhs.evaluate(source)? + rhs.evaluate(source)?),
            RebarNode::Mul { lhs, rhs } => Ok(lhs.evaluate(source)? * rhs.evaluate(source)?),
            RebarNode::Div { lhs, rhs, position } => {
                let divisor = rhs.evaluate(source)?;
                if divisor == 0.0 {
                    return Err(CalcError::invalid_expression(source, *position, "Division by zero"));
                }
                Ok(lhs.evaluate(source)? / divisor)
            }
        }
    }
}

/// A parsed reinforcement expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebarExpression {
    /// Text as typed
    pub source: String,
    /// Parsed tree
    pub tree: RebarNode,
}

impl RebarExpression {
    /// Parse an expression.
    ///
    /// Positions in errors are 0-based character offsets into `source`.
    pub fn parse(source: &str) -> CalcResult<Self> {
        let tokens = tokenize(source)?;
        if tokens.is_empty() {
            return Err(CalcError::invalid_expression(source, 0, "Expression is empty"));
        }
        if let Some(&(_, at)) = tokens.get(MAX_TOKENS) {
            return Err(CalcError::invalid_expression(source, at, "Expression is too long"));
        }

        let mut parser = Parser {
            source,
            tokens: &tokens,
            pos: 0,
            depth: 0,
        };
        let tree = parser.expr()?;
        if let Some(&(_, at)) = parser.tokens.get(parser.pos) {
            return Err(CalcError::invalid_expression(source, at, "Unexpected trailing input"));
        }

        Ok(RebarExpression {
            source: source.to_string(),
            tree,
        })
    }

    /// Evaluate the total area in cm² (or cm²/m, see [`Self::unit`])
    pub fn area_cm2(&self) -> CalcResult<f64> {
        self.tree.evaluate(&self.source)
    }

    /// Area per metre when the expression divides by a spacing
    pub fn unit(&self) -> AreaUnit {
        if self.source.contains('/') {
            AreaUnit::Cm2PerMeter
        } else {
            AreaUnit::Cm2
        }
    }
}

impl std::str::FromStr for RebarExpression {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RebarExpression::parse(s)
    }
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Bar(f64),
    Plus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn is_bar_marker(c: char) -> bool {
    matches!(c, 'f' | 'F' | 'Ø' | 'ø' | 'φ' | 'Φ')
}

fn tokenize(source: &str) -> CalcResult<Vec<(Token, usize)>> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' => {
                tokens.push((Token::Plus, i));
                i += 1;
            }
            '*' | '×' => {
                tokens.push((Token::Star, i));
                i += 1;
            }
            '/' => {
                tokens.push((Token::Slash, i));
                i += 1;
            }
            '(' => {
                tokens.push((Token::LParen, i));
                i += 1;
            }
            ')' => {
                tokens.push((Token::RParen, i));
                i += 1;
            }
            c if is_bar_marker(c) => {
                let start = i;
                i += 1;
                let (value, next) = read_number(&chars, i).ok_or_else(|| {
                    CalcError::invalid_expression(source, i, "Bar marker must be followed by a diameter")
                })?;
                if value <= 0.0 {
                    return Err(CalcError::invalid_expression(source, i, "Bar diameter must be positive"));
                }
                tokens.push((Token::Bar(value), start));
                i = next;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                let (value, next) = read_number(&chars, i)
                    .ok_or_else(|| CalcError::invalid_expression(source, i, "Invalid number"))?;
                tokens.push((Token::Number(value), start));
                i = next;
            }
            other => {
                return Err(CalcError::invalid_expression(
                    source,
                    i,
                    format!("Unexpected character '{}'", other),
                ));
            }
        }
    }

    Ok(tokens)
}

/// Read a decimal number starting at `start`; returns the value and the next index.
fn read_number(chars: &[char], start: usize) -> Option<(f64, usize)> {
    let mut end = start;
    let mut seen_dot = false;
    while end < chars.len() {
        match chars[end] {
            c if c.is_ascii_digit() => end += 1,
            '.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    if end == start {
        return None;
    }
    let text: String = chars[start..end].iter().collect();
    text.parse::<f64>().ok().map(|v| (v, end))
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'a> {
    source: &'a str,
    tokens: &'a [(Token, usize)],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|&(t, _)| t)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|&(_, at)| at)
            .unwrap_or_else(|| self.source.chars().count())
    }

    fn expr(&mut self) -> CalcResult<RebarNode> {
        let mut node = self.term()?;
        while self.peek() == Some(Token::Plus) {
            self.pos += 1;
            let rhs = self.term()?;
            node = RebarNode::Add {
                lhs: Box::new(node),
                rhs: Box::new(rhs),
            };
        }
        Ok(node)
    }

    fn term(&mut self) -> CalcResult<RebarNode> {
        let mut node = self.factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    let rhs = self.factor()?;
                    node = RebarNode::Mul {
                        lhs: Box::new(node),
                        rhs: Box::new(rhs),
                    };
                }
                Some(Token::Slash) => {
                    let position = self.position();
                    self.pos += 1;
                    let rhs = self.factor()?;
                    node = RebarNode::Div {
                        lhs: Box::new(node),
                        rhs: Box::new(rhs),
                        position,
                    };
                }
                _ => return Ok(node),
            }
        }
    }

    fn factor(&mut self) -> CalcResult<RebarNode> {
        let at = self.position();
        match self.peek() {
            Some(Token::Number(value)) => {
                self.pos += 1;
                Ok(RebarNode::Number { value })
            }
            Some(Token::Bar(diameter_mm)) => {
                self.pos += 1;
                Ok(RebarNode::Bar { diameter_mm })
            }
            Some(Token::LParen) => {
                if self.depth == MAX_NESTING {
                    return Err(CalcError::invalid_expression(self.source, at, "Parentheses nested too deeply"));
                }
                self.pos += 1;
                self.depth += 1;
                let inner = self.expr()?;
                self.depth -= 1;
                if self.peek() != Some(Token::RParen) {
                    return Err(CalcError::invalid_expression(self.source, self.position(), "Expected ')'"));
                }
                self.pos += 1;
                Ok(inner)
            }
            Some(_) => Err(CalcError::invalid_expression(self.source, at, "Expected a number or a bar")),
            None => Err(CalcError::invalid_expression(self.source, at, "Unexpected end of expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(expr: &str) -> f64 {
        RebarExpression::parse(expr).unwrap().area_cm2().unwrap()
    }

    #[test]
    fn test_bar_area() {
        // Ø16 = 2.0106 cm²
        assert!((bar_area(Millimeters(16.0)).0 - 2.0106).abs() < 1e-4);
    }

    #[test]
    fn test_bars_at_spacing() {
        // Ø12 + Ø16 every 20 cm: (1.1310 + 2.0106) / 0.2 = 15.708 cm²/m
        let expr = RebarExpression::parse("f12/0.20+f16/0.20").unwrap();
        assert!((expr.area_cm2().unwrap() - 15.708).abs() < 1e-3);
        assert_eq!(expr.unit(), AreaUnit::Cm2PerMeter);
    }

    #[test]
    fn test_counted_bars() {
        // 2Ø16 + 3Ø10 = 4.0212 + 2.3562
        assert!((area("2*f16+3*f10") - 6.3774).abs() < 1e-3);
        assert!((area("2 × Ø16") - 4.0212).abs() < 1e-3);
    }

    #[test]
    fn test_precedence_and_grouping() {
        assert!((area("2+3*4") - 14.0).abs() < 1e-12);
        assert!((area("(2+3)*4") - 20.0).abs() < 1e-12);
        assert!((area("12/4/3") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_implicit_multiplication_rejected() {
        let err = RebarExpression::parse("2f12").unwrap_err();
        assert!(matches!(err, CalcError::InvalidExpression { position: 1, .. }));
    }

    #[test]
    fn test_rejects_foreign_syntax() {
        assert!(RebarExpression::parse("__import__('os')").is_err());
        assert!(RebarExpression::parse("2-1").is_err());
        assert!(RebarExpression::parse("f").is_err());
        assert!(RebarExpression::parse("(f12").is_err());
        assert!(RebarExpression::parse("   ").is_err());
        assert!(RebarExpression::parse("f12+").is_err());
    }

    #[test]
    fn test_division_by_zero() {
        let expr = RebarExpression::parse("f12/0").unwrap();
        assert!(matches!(expr.area_cm2(), Err(CalcError::InvalidExpression { position: 3, .. })));

        let expr = RebarExpression::parse("2*f16 + f10 / (0*1)").unwrap();
        assert!(matches!(expr.area_cm2(), Err(CalcError::InvalidExpression { position: 12, .. })));
    }

    #[test]
    fn test_nesting_and_length_limits() {
        let nested = format!("{}f12{}", "(".repeat(100_000), ")".repeat(100_000));
        assert!(matches!(
            RebarExpression::parse(&nested),
            Err(CalcError::InvalidExpression { position: 256, .. })
        ));

        let deep = format!("{}f12{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert!(matches!(
            RebarExpression::parse(&deep),
            Err(CalcError::InvalidExpression { position: 16, .. })
        ));

        let fine = format!("{}f12{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert!(RebarExpression::parse(&fine).is_ok());

        let long = vec!["f12"; 200].join("+");
        assert!(RebarExpression::parse(&long).is_err());
    }

    #[test]
    fn test_tree_serialization() {
        let expr: RebarExpression = "2*f16".parse().unwrap();
        let json = serde_json::to_string(&expr.tree).unwrap();
        assert!(json.contains("\"op\":\"mul\""));
        assert!(json.contains("\"diameter_mm\":16.0"));
    }
}
