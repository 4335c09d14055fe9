//! Arithmetic expression detector with a small recursive-descent evaluator

use crate::detector::{compile, Detector};
use magicinput_core::{ClassificationResult, FormatType, Result};
use regex::Regex;

const MAX_LEN: usize = 200;
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Op(char),
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Num(literal.parse().ok()?));
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                tokens.push(Token::Op(c));
                chars.next();
            }
            '×' => {
                tokens.push(Token::Op('*'));
                chars.next();
            }
            '÷' => {
                tokens.push(Token::Op('/'));
                chars.next();
            }
            '(' => {
                tokens.push(Token::LParen);
                chars.next();
            }
            ')' => {
                tokens.push(Token::RParen);
                chars.next();
            }
            _ => return None,
        }
    }
    Some(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    binary_ops: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            binary_ops: 0,
        }
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next_op(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(&op) => {
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    /// Parse the whole token stream; trailing tokens are an error
    fn parse(mut self) -> Option<(f64, usize)> {
        let value = self.expr()?;
        if self.pos != self.tokens.len() {
            return None;
        }
        Some((value, self.binary_ops))
    }

    fn expr(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        while let Some(op) = self.next_op(&['+', '-']) {
            let rhs = self.term()?;
            self.binary_ops += 1;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Some(value)
    }

    fn term(&mut self) -> Option<f64> {
        let mut value = self.unary()?;
        while let Some(op) = self.next_op(&['*', '/', '%']) {
            let rhs = self.unary()?;
            self.binary_ops += 1;
            value = match op {
                '*' => value * rhs,
                '/' if rhs == 0.0 => return None,
                '/' => value / rhs,
                _ if rhs == 0.0 => return None,
                _ => value % rhs,
            };
        }
        Some(value)
    }

    fn unary(&mut self) -> Option<f64> {
        match self.next_op(&['-', '+']) {
            Some('-') => self.nested(|p| p.unary()).map(|v| -v),
            Some(_) => self.nested(|p| p.unary()),
            None => self.power(),
        }
    }

    fn power(&mut self) -> Option<f64> {
        let base = self.atom()?;
        if self.next_op(&['^']).is_some() {
            let exponent = self.nested(|p| p.unary())?;
            self.binary_ops += 1;
            return Some(base.powf(exponent));
        }
        Some(base)
    }

    fn atom(&mut self) -> Option<f64> {
        match self.peek()? {
            Token::Num(n) => {
                self.pos += 1;
                Some(n)
            }
            Token::LParen => {
                self.pos += 1;
                let value = self.nested(|p| p.expr())?;
                if self.peek()? != Token::RParen {
                    return None;
                }
                self.pos += 1;
                Some(value)
            }
            _ => None,
        }
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self) -> Option<f64>) -> Option<f64> {
        if self.depth >= MAX_DEPTH {
            return None;
        }
        self.depth += 1;
        let value = f(self);
        self.depth -= 1;
        value
    }
}

/// Evaluate an arithmetic expression, returning the value and the number of
/// binary operations it contains
pub fn evaluate(expression: &str) -> Option<(f64, usize)> {
    let value = Parser::new(tokenize(expression)?).parse()?;
    value.0.is_finite().then_some(value)
}

/// Render a result without float noise: integers plainly, others to at most
/// ten decimal places
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let fixed = format!("{:.10}", value);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Arithmetic expression detector
pub struct MathDetector {
    dash_groups: Regex,
    date_shape: Regex,
}

impl MathDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dash_groups: compile("math dash groups", r"^\d+(?:-\d+)+$")?,
            date_shape: compile(
                "math date shape",
                r"^(?:\d{4}[-/]\d{1,2}[-/]\d{1,2}|\d{1,2}/\d{1,2}/\d{2,4})$",
            )?,
        })
    }
}

impl Detector for MathDetector {
    fn name(&self) -> &str {
        "math"
    }

    fn format(&self) -> FormatType {
        FormatType::Math
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let trimmed = content.trim().trim_end_matches('=').trim_end();
        if trimmed.is_empty() || trimmed.len() > MAX_LEN {
            return None;
        }
        // Phone numbers, serials and dates look like subtraction or division.
        if self.dash_groups.is_match(trimmed) || self.date_shape.is_match(trimmed) {
            return None;
        }

        let (value, binary_ops) = evaluate(trimmed)?;
        if binary_ops == 0 {
            return None;
        }

        Some(
            ClassificationResult::new(FormatType::Math, 65, "Math Expression")
                .with_field("Expression", trimmed)
                .with_field("Result", format_number(value)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_precedence() {
        assert_eq!(evaluate("2 + 3 * 4").map(|v| v.0), Some(14.0));
        assert_eq!(evaluate("(2 + 3) * 4").map(|v| v.0), Some(20.0));
        assert_eq!(evaluate("2 ^ 3 ^ 2").map(|v| v.0), Some(512.0));
        assert_eq!(evaluate("-2 ^ 2").map(|v| v.0), Some(-4.0));
        assert_eq!(evaluate("17 % 5").map(|v| v.0), Some(2.0));
    }

    #[test]
    fn test_evaluate_rejects_malformed() {
        assert!(evaluate("2 +").is_none());
        assert!(evaluate("(1 + 2").is_none());
        assert!(evaluate("1 / 0").is_none());
        assert!(evaluate("1.2.3 + 4").is_none());
        assert!(evaluate("2 x 3").is_none());
    }

    #[test]
    fn test_deep_nesting_is_bounded() {
        let deep = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        assert!(evaluate(&deep).is_none());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(14.0), "14");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(1.0 / 3.0), "0.3333333333");
    }

    #[test]
    fn test_math_detection() {
        let detector = MathDetector::new().unwrap();

        let result = detector.test("(12.5 + 7.5) × 3 =").unwrap();
        assert_eq!(result.format_type, FormatType::Math);
        assert_eq!(result.field("Result"), Some("60"));

        let result = detector.test("100 - 58").unwrap();
        assert_eq!(result.field("Result"), Some("42"));
    }

    #[test]
    fn test_math_excludes_lookalikes() {
        let detector = MathDetector::new().unwrap();
        assert!(detector.test("555-123-4567").is_none());
        assert!(detector.test("2024-01-15").is_none());
        assert!(detector.test("12/25/2024").is_none());
        assert!(detector.test("42").is_none());
        assert!(detector.test("-7").is_none());
    }
}
