//! Built-in demonstration tools
//!
//! Small self-contained handlers registered at startup so the server is
//! usable out of the box. None of them perform real outbound calls.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{FixedOffset, Utc};
use serde_json::{json, Value};

use super::registry::{ToolHandler, ToolRegistryBuilder};
use crate::agent::domain::ToolDefinition;

fn string_arg<'a>(args: &'a Value, key: &str) -> anyhow::Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("missing required argument '{}'", key))
}

fn one_string_schema(key: &str, description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            key: { "type": "string", "description": description }
        },
        "required": [key]
    })
}

/// Register every built-in tool on the given builder
pub fn install_builtins(builder: ToolRegistryBuilder) -> ToolRegistryBuilder {
    builder
        .register(
            ToolDefinition::new(
                "get_weather",
                "Get the current weather for a city",
                one_string_schema("city", "City name, e.g. 'Tokyo'"),
            ),
            Arc::new(GetWeather),
        )
        .register(
            ToolDefinition::new(
                "calculate",
                "Evaluate an arithmetic expression",
                one_string_schema("expression", "Expression such as '15 + 27' or '(3 + 4) * 2'"),
            ),
            Arc::new(Calculate),
        )
        .register(
            ToolDefinition::new(
                "get_time",
                "Get the current time in a timezone",
                one_string_schema("timezone", "Timezone abbreviation, e.g. 'UTC', 'EST', 'JST'"),
            ),
            Arc::new(GetTime),
        )
        .register(
            ToolDefinition::new(
                "search_web",
                "Search the web for information",
                one_string_schema("query", "Search query"),
            ),
            Arc::new(SearchWeb),
        )
        .register(
            ToolDefinition::new(
                "get_stock_price",
                "Get the current stock price for a symbol",
                one_string_schema("symbol", "Ticker symbol, e.g. 'AAPL'"),
            ),
            Arc::new(GetStockPrice),
        )
}

struct GetWeather;

#[async_trait]
impl ToolHandler for GetWeather {
    async fn call(&self, args: Value) -> anyhow::Result<Value> {
        let city = string_arg(&args, "city")?;
        let report = match city {
            "New York" => "sunny and 72°F",
            "London" => "cloudy and 59°F",
            "Tokyo" => "rainy and 65°F",
            "Sydney" => "windy and 70°F",
            _ => "unknown - data not available",
        };
        Ok(Value::String(format!("The weather in {} is {}", city, report)))
    }
}

struct Calculate;

#[async_trait]
impl ToolHandler for Calculate {
    async fn call(&self, args: Value) -> anyhow::Result<Value> {
        let expression = string_arg(&args, "expression")?;
        let result = eval_expression(expression)?;
        // Render integers without a trailing ".0"
        let text = if result.fract() == 0.0 && result.abs() < 1e15 {
            format!("{}", result as i64)
        } else {
            format!("{}", result)
        };
        Ok(Value::String(text))
    }
}

struct GetTime;

#[async_trait]
impl ToolHandler for GetTime {
    async fn call(&self, args: Value) -> anyhow::Result<Value> {
        let timezone = string_arg(&args, "timezone").unwrap_or("UTC");
        let offset_hours = match timezone {
            "UTC" | "GMT" => 0,
            "EST" => -5,
            "PST" => -8,
            "JST" => 9,
            "AEST" => 10,
            other => return Ok(Value::String(format!("Unknown timezone: {}", other))),
        };
        let offset = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or_else(|| anyhow::anyhow!("invalid offset for {}", timezone))?;
        let now = Utc::now().with_timezone(&offset);
        Ok(Value::String(format!(
            "Current time in {}: {}",
            timezone,
            now.format("%H:%M")
        )))
    }
}

struct SearchWeb;

#[async_trait]
impl ToolHandler for SearchWeb {
    async fn call(&self, args: Value) -> anyhow::Result<Value> {
        let query = string_arg(&args, "query")?;
        let lowered = query.to_lowercase();
        let snippets = [
            ("python", "Python is a high-level programming language..."),
            ("weather", "Weather information can be found on weather.com..."),
            ("news", "Latest news updates available on news websites..."),
        ];
        for (keyword, snippet) in snippets {
            if lowered.contains(keyword) {
                return Ok(Value::String(format!(
                    "Search results for '{}': {}",
                    query, snippet
                )));
            }
        }
        Ok(Value::String(format!(
            "Search results for '{}': No specific results found",
            query
        )))
    }
}

struct GetStockPrice;

#[async_trait]
impl ToolHandler for GetStockPrice {
    async fn call(&self, args: Value) -> anyhow::Result<Value> {
        let symbol = string_arg(&args, "symbol")?.to_uppercase();
        let quote = match symbol.as_str() {
            "AAPL" => "$150.25 (+2.1%)",
            "GOOGL" => "$2,245.80 (-0.5%)",
            "MSFT" => "$305.15 (+1.2%)",
            "TSLA" => "$195.40 (+3.8%)",
            _ => "Symbol not found",
        };
        Ok(Value::String(format!("{}: {}", symbol, quote)))
    }
}

/// Evaluate `+ - * / %` arithmetic with parentheses and unary minus
fn eval_expression(input: &str) -> anyhow::Result<f64> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        anyhow::bail!("unexpected trailing input in expression");
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Open,
    Close,
}

fn tokenize(input: &str) -> anyhow::Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '(' => {
                chars.next();
                tokens.push(Token::Open);
            }
            ')' => {
                chars.next();
                tokens.push(Token::Close);
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
                let number: f64 = literal
                    .parse()
                    .map_err(|_| anyhow::anyhow!("invalid number '{}'", literal))?;
                tokens.push(Token::Number(number));
            }
            other => anyhow::bail!("invalid character '{}' in expression", other),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> anyhow::Result<f64> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.next();
                    value += self.term()?;
                }
                Token::Minus => {
                    self.next();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> anyhow::Result<f64> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.next();
                    value *= self.factor()?;
                }
                Token::Slash => {
                    self.next();
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        anyhow::bail!("division by zero");
                    }
                    value /= divisor;
                }
                Token::Percent => {
                    self.next();
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        anyhow::bail!("division by zero");
                    }
                    value %= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> anyhow::Result<f64> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Minus) => Ok(-self.factor()?),
            Some(Token::Open) => {
                let value = self.expr()?;
                match self.next() {
                    Some(Token::Close) => Ok(value),
                    _ => anyhow::bail!("missing closing parenthesis"),
                }
            }
            other => anyhow::bail!("unexpected token {:?} in expression", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_precedence_and_parens() {
        assert_eq!(eval_expression("15 + 27").expect("ok"), 42.0);
        assert_eq!(eval_expression("2 + 3 * 4").expect("ok"), 14.0);
        assert_eq!(eval_expression("(2 + 3) * 4").expect("ok"), 20.0);
        assert_eq!(eval_expression("-3 + 10").expect("ok"), 7.0);
        assert_eq!(eval_expression("10 % 4").expect("ok"), 2.0);
    }

    #[test]
    fn rejects_bad_expressions() {
        assert!(eval_expression("1 / 0").is_err());
        assert!(eval_expression("2 +").is_err());
        assert!(eval_expression("(1 + 2").is_err());
        assert!(eval_expression("two + two").is_err());
    }

    #[tokio::test]
    async fn calculate_renders_integers_plainly() {
        let out = Calculate
            .call(json!({"expression": "6 * 7"}))
            .await
            .expect("ok");
        assert_eq!(out, Value::String("42".to_string()));
    }

    #[tokio::test]
    async fn weather_handles_unknown_city() {
        let out = GetWeather
            .call(json!({"city": "Reykjavik"}))
            .await
            .expect("ok");
        let text = out.as_str().expect("string");
        assert!(text.contains("unknown"));
    }

    #[tokio::test]
    async fn missing_argument_is_an_error() {
        assert!(SearchWeb.call(json!({})).await.is_err());
    }

    #[test]
    fn builtins_register_five_tools() {
        let registry = install_builtins(crate::agent::tools::ToolRegistry::builder()).build();
        assert_eq!(registry.len(), 5);
        assert!(registry.contains("get_weather"));
        assert!(registry.contains("calculate"));
        assert!(registry.contains("get_time"));
        assert!(registry.contains("search_web"));
        assert!(registry.contains("get_stock_price"));
    }
}
