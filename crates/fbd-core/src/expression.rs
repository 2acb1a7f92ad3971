//! 代数表达式求值器
//!
//! 支持的输入：
//! - 数字字面量: `10`、`-2.5`、`1e3`
//! - 符号: `R`、`P`
//! - 复合符号: `√2`、`Sqrt[2]`
//! - 运算: `-R/√2`、`(R + 10) * 2`
//! - 函数与常量: `sqrt(3)`、`Sqrt[R]`、`√3`、`pi`
//!
//! 求值分三步：先按长度降序替换复合符号，若剩余文本本身是数字则直接返回，
//! 否则交给递归下降求值器。

use crate::symbols::SymbolTable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 求值错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Empty expression")]
    Empty,

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Result is not a finite number: {0}")]
    NonFinite(String),
}

/// 求值失败时的处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvalPolicy {
    /// 记录警告并以 0 代替
    #[default]
    Lenient,
    /// 直接返回错误（校验/测试模式）
    Strict,
}

/// 在符号表上对表达式求值
pub fn evaluate(expression: &str, symbols: &SymbolTable) -> Result<f64, EvalError> {
    let input = expression.trim();
    if input.is_empty() {
        return Err(EvalError::Empty);
    }

    // 整个表达式就是一个符号
    if let Some(value) = symbols.get(input) {
        return Ok(value);
    }

    let substituted = substitute_composite_tokens(input, symbols);

    if let Ok(value) = substituted.trim().parse::<f64>() {
        if value.is_finite() {
            return Ok(value);
        }
    }

    let value = ExprParser::new(&substituted, symbols).parse()?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NonFinite(expression.to_string()))
    }
}

/// 按策略求值：宽松模式下失败返回 0 并记录警告
pub fn evaluate_with_policy(
    expression: &str,
    symbols: &SymbolTable,
    policy: EvalPolicy,
) -> Result<f64, EvalError> {
    match evaluate(expression, symbols) {
        Ok(value) => Ok(value),
        Err(err) => match policy {
            EvalPolicy::Strict => Err(err),
            EvalPolicy::Lenient => {
                tracing::warn!(expression, error = %err, "Expression evaluation failed, using 0");
                Ok(0.0)
            }
        },
    }
}

/// 将复合符号替换为带括号的数值文本，长符号优先
fn substitute_composite_tokens(input: &str, symbols: &SymbolTable) -> String {
    let mut text = input.to_string();
    for (token, value) in symbols.composite_tokens_longest_first() {
        if text.contains(token) {
            text = replace_token(&text, token, &format!("({:?})", value));
        }
    }
    text
}

/// 替换完整出现的符号：`√2` 不匹配 `√25` 中的前缀，`Sqrt[2]` 不匹配 `MySqrt[2]`
fn replace_token(text: &str, token: &str, replacement: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_' || c == '.';
    let guard_before = token.chars().next().is_some_and(is_word);
    let guard_after = token.chars().last().is_some_and(is_word);

    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find(token) {
        let (before, tail) = rest.split_at(idx);
        let after = &tail[token.len()..];

        let prev = before.chars().last().or_else(|| result.chars().last());
        let blocked = (guard_before && prev.is_some_and(is_word))
            || (guard_after && after.chars().next().is_some_and(is_word));

        result.push_str(before);
        if blocked {
            result.push_str(token);
        } else {
            result.push_str(replacement);
        }
        rest = after;
    }
    result.push_str(rest);
    result
}

/// 递归下降求值器
///
/// 文法：
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/') unary)*
/// unary   := ('-' | '+') unary | primary
/// primary := number | '(' expr ')' | '√' primary | ident call?
/// call    := '[' expr ']' | '(' expr ')'
/// ```
struct ExprParser<'a> {
    chars: Vec<char>,
    pos: usize,
    symbols: &'a SymbolTable,
}

impl<'a> ExprParser<'a> {
    fn new(input: &str, symbols: &'a SymbolTable) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            symbols,
        }
    }

    fn parse(mut self) -> Result<f64, EvalError> {
        let value = self.expr()?;
        self.skip_whitespace();
        match self.peek() {
            None => Ok(value),
            Some(ch) => Err(EvalError::UnexpectedChar { ch, pos: self.pos }),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// 跳过空白后若下一个字符为 `ch` 则消费它
    fn eat(&mut self, ch: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, ch: char) -> Result<(), EvalError> {
        if self.eat(ch) {
            Ok(())
        } else {
            match self.peek() {
                Some(found) => Err(EvalError::UnexpectedChar {
                    ch: found,
                    pos: self.pos,
                }),
                None => Err(EvalError::UnexpectedEnd),
            }
        }
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.unary()?;
        loop {
            if self.eat('*') {
                value *= self.unary()?;
            } else if self.eat('/') {
                value /= self.unary()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn unary(&mut self) -> Result<f64, EvalError> {
        if self.eat('-') {
            return Ok(-self.unary()?);
        }
        if self.eat('+') {
            return self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<f64, EvalError> {
        self.skip_whitespace();
        let Some(ch) = self.peek() else {
            return Err(EvalError::UnexpectedEnd);
        };

        if ch == '(' {
            self.pos += 1;
            let value = self.expr()?;
            self.expect(')')?;
            return Ok(value);
        }

        if ch == '√' {
            self.pos += 1;
            return Ok(self.primary()?.sqrt());
        }

        if ch.is_ascii_digit() || ch == '.' {
            return self.number();
        }

        if ch.is_alphabetic() || ch == '_' {
            let name = self.identifier();
            return self.resolve(&name);
        }

        Err(EvalError::UnexpectedChar { ch, pos: self.pos })
    }

    fn number(&mut self) -> Result<f64, EvalError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }

        // 科学计数法：仅当 e 后跟数字（可带符号）时才视为指数
        if matches!(self.peek(), Some('e' | 'E')) {
            let mut look = self.pos + 1;
            if matches!(self.chars.get(look), Some('+' | '-')) {
                look += 1;
            }
            if matches!(self.chars.get(look), Some(c) if c.is_ascii_digit()) {
                self.pos = look;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map_err(|_| EvalError::InvalidNumber(text))
    }

    fn identifier(&mut self) -> String {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// 解析标识符：函数调用、内置常量或符号表中的符号
    fn resolve(&mut self, name: &str) -> Result<f64, EvalError> {
        let close = if self.eat('[') {
            Some(']')
        } else if self.eat('(') {
            Some(')')
        } else {
            None
        };

        if let Some(close) = close {
            let argument = self.expr()?;
            self.expect(close)?;
            return match name.to_ascii_lowercase().as_str() {
                "sqrt" => Ok(argument.sqrt()),
                _ => Err(EvalError::UnknownFunction(name.to_string())),
            };
        }

        // 符号表优先，允许覆盖内置常量
        if let Some(value) = self.symbols.get(name) {
            return Ok(value);
        }

        match name {
            "pi" | "PI" | "π" => Ok(std::f64::consts::PI),
            _ => Err(EvalError::UnknownSymbol(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> SymbolTable {
        SymbolTable::with_defaults()
    }

    #[test]
    fn test_plain_symbols_and_numbers() {
        let symbols = defaults();
        assert_eq!(evaluate("R", &symbols), Ok(100.0));
        assert_eq!(evaluate("-R", &symbols), Ok(-100.0));
        assert_eq!(evaluate("0", &symbols), Ok(0.0));
        assert_eq!(evaluate(" 2.5 ", &symbols), Ok(2.5));
        assert_eq!(evaluate("P", &symbols), Ok(10.0));
    }

    #[test]
    fn test_division_by_composite_token() {
        let symbols = defaults();
        let expected = 100.0 / std::f64::consts::SQRT_2;
        let value = evaluate("R/√2", &symbols).unwrap();
        assert!((value - expected).abs() < 1e-9);

        let value = evaluate("-R/√2", &symbols).unwrap();
        assert!((value + expected).abs() < 1e-9);

        let value = evaluate("R/Sqrt[2]", &symbols).unwrap();
        assert!((value - expected).abs() < 1e-9);
    }

    #[test]
    fn test_composite_token_boundaries() {
        let symbols = defaults();
        assert!((evaluate("√25", &symbols).unwrap() - 5.0).abs() < 1e-12);
        assert!((evaluate("√2 * √2", &symbols).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_general_arithmetic() {
        let symbols = defaults();
        assert_eq!(evaluate("(R + P) * 2", &symbols), Ok(220.0));
        assert_eq!(evaluate("R - P - 5", &symbols), Ok(85.0));
        assert_eq!(evaluate("R / 4 / 5", &symbols), Ok(5.0));
        assert_eq!(evaluate("--P", &symbols), Ok(10.0));
        assert_eq!(evaluate("1e2 + 1", &symbols), Ok(101.0));
    }

    #[test]
    fn test_functions_and_constants() {
        let symbols = defaults();
        assert!((evaluate("sqrt(9)", &symbols).unwrap() - 3.0).abs() < 1e-12);
        assert!((evaluate("Sqrt[R]", &symbols).unwrap() - 10.0).abs() < 1e-12);
        assert!((evaluate("√3", &symbols).unwrap() - 3.0_f64.sqrt()).abs() < 1e-12);
        assert!((evaluate("2 * pi", &symbols).unwrap() - std::f64::consts::TAU).abs() < 1e-12);
    }

    #[test]
    fn test_overridden_symbols() {
        let symbols = defaults().merged([("R", 50.0)]);
        assert_eq!(evaluate("-R", &symbols), Ok(-50.0));
    }

    #[test]
    fn test_deterministic() {
        let symbols = defaults();
        for expr in ["-R/√2", "R/Sqrt[2]", "(R + P) / 3", "P"] {
            let first = evaluate(expr, &symbols).unwrap();
            for _ in 0..10 {
                assert_eq!(evaluate(expr, &symbols).unwrap().to_bits(), first.to_bits());
            }
        }
    }

    #[test]
    fn test_errors() {
        let symbols = defaults();
        assert_eq!(evaluate("", &symbols), Err(EvalError::Empty));
        assert_eq!(
            evaluate("Q", &symbols),
            Err(EvalError::UnknownSymbol("Q".to_string()))
        );
        assert_eq!(
            evaluate("cos(1)", &symbols),
            Err(EvalError::UnknownFunction("cos".to_string()))
        );
        assert_eq!(evaluate("R +", &symbols), Err(EvalError::UnexpectedEnd));
        assert!(matches!(
            evaluate("R $ 2", &symbols),
            Err(EvalError::UnexpectedChar { ch: '$', .. })
        ));
        assert!(matches!(evaluate("R / 0", &symbols), Err(EvalError::NonFinite(_))));
    }

    #[test]
    fn test_policy() {
        let symbols = defaults();
        assert_eq!(
            evaluate_with_policy("unknown", &symbols, EvalPolicy::Lenient),
            Ok(0.0)
        );
        assert!(evaluate_with_policy("unknown", &symbols, EvalPolicy::Strict).is_err());
        assert_eq!(
            evaluate_with_policy("R", &symbols, EvalPolicy::Strict),
            Ok(100.0)
        );
    }
}
