//! InfluxQL 的语法分析器
//!
//! ## 解析流程图
//!
//! ```text
//! parse()
//!   ├─ 跳过多余的 ';'
//!   ├─ parse_statement()
//!   │   ├─ "SELECT" → parse_select()
//!   │   │              ├─ parse_fields()         字段列表
//!   │   │              ├─ [INTO] parse_measurement()
//!   │   │              ├─ FROM parse_sources()   measurement / 正则 / 子查询
//!   │   │              ├─ [WHERE] parse_expr()
//!   │   │              ├─ [GROUP BY] parse_dimensions()
//!   │   │              ├─ [fill(...)] parse_fill()
//!   │   │              ├─ [ORDER BY] parse_sort_fields()
//!   │   │              └─ [LIMIT|OFFSET|SLIMIT|SOFFSET n]
//!   │   │
//!   │   └─ "SHOW" | "DROP" | ... → parse_other()  只识别语句类型
//!   │
//!   └─ 期望 ';' 或输入结束
//! ```
//!
//! ## 表达式优先级（从低到高）
//!
//! 1. **OR**
//! 2. **AND**
//! 3. **比较** `=`, `!=`, `<>`, `<`, `<=`, `>`, `>=`, `=~`, `!~`
//! 4. **加减** `+`, `-`
//! 5. **乘除** `*`, `/`, `%`
//! 6. **负号** 只作用于数字和时间间隔字面量
//! 7. **基础表达式** 括号、函数调用、变量引用、字面量
//!
//! ## 解析示例
//!
//! ```text
//! SELECT mean("value") FROM "db"."rp"."cpu" WHERE "host" = 'a' GROUP BY time(5m)
//! SELECT "usage"::float FROM cpu WHERE time > now() - 1h
//! SELECT max(v) FROM (SELECT v FROM cpu) LIMIT 10
//! SHOW DATABASES
//! ```

use crate::ast::{
    BinaryOp, DataType, Dimension, Duration, Expr, Field, Fill, Measurement, OtherStatement, Query,
    SelectStatement, SortField, Source, Statement, StatementKind, Target, VarRef,
};
use crate::lexer::Lexer;
use crate::token::{Span, Token, TokenKind};

pub struct Parser<'a> {
    input: &'a str,
    tokens: &'a [Token<'a>],
    position: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Option<Span>,
}

impl ParseError {
    fn new(message: String, span: Option<Span>) -> Self {
        Self { message, span }
    }

    fn at_position(message: String, span: Span) -> Self {
        Self { message, span: Some(span) }
    }

    fn unexpected(token: &Token<'_>, expected: &str) -> Self {
        Self::at_position(format!("Expected {}, found {:?}", expected, token.kind), token.span)
    }

    fn end_of_input(expected: &str) -> Self {
        Self::new(format!("Expected {}, but reached end of input", expected), None)
    }
}

/// 对整段 InfluxQL 文本进行分词和解析
pub fn parse_query(input: &str) -> Result<Query, ParseError> {
    let tokens: Vec<_> = Lexer::new(input).collect();
    Parser::new(input, &tokens).parse()
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str, tokens: &'a [Token<'a>]) -> Self {
        Self { input, tokens, position: 0 }
    }

    /// 返回当前 token，不推进位置
    fn peek(&self) -> Option<&'a Token<'a>> {
        self.tokens.get(self.position)
    }

    /// 返回下一个 token，不推进位置
    fn peek_next(&self) -> Option<&'a Token<'a>> {
        self.tokens.get(self.position + 1)
    }

    /// 返回当前 token 并推进位置
    fn advance(&mut self) -> Option<&'a Token<'a>> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    /// 期望特定类型的 token 并推进，否则返回错误
    fn expect(&mut self, expected: TokenKind<'_>) -> Result<&'a Token<'a>, ParseError> {
        match self.peek() {
            Some(token) if std::mem::discriminant(&token.kind) == std::mem::discriminant(&expected) => {
                self.position += 1;
                Ok(token)
            }
            Some(token) => Err(ParseError::unexpected(token, &format!("{:?}", expected))),
            None => Err(ParseError::end_of_input(&format!("{:?}", expected))),
        }
    }

    /// 检查当前 token 是否匹配给定类型
    fn match_token(&self, kind: &TokenKind<'_>) -> bool {
        self.peek()
            .is_some_and(|token| std::mem::discriminant(&token.kind) == std::mem::discriminant(kind))
    }

    /// 当前 token 匹配时消费它
    fn consume(&mut self, kind: &TokenKind<'_>) -> bool {
        if self.match_token(kind) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match self.advance() {
            Some(Token { kind: TokenKind::Identifier(name), .. }) => Ok(name.to_string()),
            Some(token) => Err(ParseError::unexpected(token, "identifier")),
            None => Err(ParseError::end_of_input("identifier")),
        }
    }

    fn expect_unsigned(&mut self) -> Result<u64, ParseError> {
        match self.advance() {
            Some(Token { kind: TokenKind::Integer(n), span }) => u64::try_from(*n)
                .map_err(|_| ParseError::at_position(format!("Expected non-negative integer, found {}", n), *span)),
            Some(token) => Err(ParseError::unexpected(token, "integer")),
            None => Err(ParseError::end_of_input("integer")),
        }
    }

    pub fn parse(&mut self) -> Result<Query, ParseError> {
        let mut statements = Vec::new();

        loop {
            while self.consume(&TokenKind::Semicolon) {}
            if self.peek().is_none() {
                break;
            }

            statements.push(self.parse_statement()?);

            match self.peek() {
                None => break,
                Some(Token { kind: TokenKind::Semicolon, .. }) => {}
                Some(token) => return Err(ParseError::unexpected(token, "';' or end of input")),
            }
        }

        Ok(Query { statements })
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let Some(token) = self.peek() else {
            return Err(ParseError::end_of_input("statement"));
        };

        let kind = match &token.kind {
            TokenKind::Select => return Ok(Statement::Select(self.parse_select()?)),
            TokenKind::Show => StatementKind::Show,
            TokenKind::Drop => StatementKind::Drop,
            TokenKind::Create => StatementKind::Create,
            TokenKind::Delete => StatementKind::Delete,
            TokenKind::Alter => StatementKind::Alter,
            TokenKind::Grant => StatementKind::Grant,
            TokenKind::Revoke => StatementKind::Revoke,
            TokenKind::Kill => StatementKind::Kill,
            TokenKind::Explain => StatementKind::Explain,
            _ => return Err(ParseError::unexpected(token, "statement")),
        };
        self.parse_other(kind)
    }

    /// 非 SELECT 语句只消费到 ';' 为止，保留原文
    fn parse_other(&mut self, kind: StatementKind) -> Result<Statement, ParseError> {
        let Some(first) = self.advance() else {
            return Err(ParseError::end_of_input("statement"));
        };
        let mut end = first.span.end;

        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::Semicolon => break,
                TokenKind::Illegal => return Err(ParseError::unexpected(token, "statement body")),
                _ => {
                    end = token.span.end;
                    self.position += 1;
                }
            }
        }

        Ok(Statement::Other(OtherStatement {
            kind,
            text: self.input[first.span.start..end].to_string(),
        }))
    }

    fn parse_select(&mut self) -> Result<SelectStatement, ParseError> {
        self.expect(TokenKind::Select)?;

        let mut stmt = SelectStatement {
            fields: self.parse_fields()?,
            ..Default::default()
        };

        if self.consume(&TokenKind::Into) {
            stmt.target = Some(Target { measurement: self.parse_measurement(false)? });
        }

        self.expect(TokenKind::From)?;
        stmt.sources = self.parse_sources()?;

        if self.consume(&TokenKind::Where) {
            stmt.condition = Some(self.parse_expr()?);
        }

        if self.consume(&TokenKind::Group) {
            self.expect(TokenKind::By)?;
            stmt.dimensions = self.parse_dimensions()?;
        }

        if self.consume(&TokenKind::Fill) {
            stmt.fill = self.parse_fill()?;
        }

        if self.consume(&TokenKind::Order) {
            self.expect(TokenKind::By)?;
            stmt.sort_fields = self.parse_sort_fields()?;
        }

        if self.consume(&TokenKind::Limit) {
            stmt.limit = self.expect_unsigned()?;
        }
        if self.consume(&TokenKind::Offset) {
            stmt.offset = self.expect_unsigned()?;
        }
        if self.consume(&TokenKind::SLimit) {
            stmt.slimit = self.expect_unsigned()?;
        }
        if self.consume(&TokenKind::SOffset) {
            stmt.soffset = self.expect_unsigned()?;
        }

        Ok(stmt)
    }

    fn parse_fields(&mut self) -> Result<Vec<Field>, ParseError> {
        let mut fields = Vec::new();
        loop {
            let expr = if self.consume(&TokenKind::Star) {
                Expr::Wildcard
            } else {
                self.parse_expr()?
            };
            let alias = if self.consume(&TokenKind::As) {
                Some(self.expect_identifier()?)
            } else {
                None
            };
            fields.push(Field { expr, alias });

            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(fields)
    }

    fn parse_sources(&mut self) -> Result<Vec<Source>, ParseError> {
        let mut sources = Vec::new();
        loop {
            if self.consume(&TokenKind::LParen) {
                let subquery = self.parse_select()?;
                self.expect(TokenKind::RParen)?;
                sources.push(Source::SubQuery(Box::new(subquery)));
            } else {
                sources.push(Source::Measurement(self.parse_measurement(true)?));
            }

            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(sources)
    }

    /// 解析 `db.rp.m`、`db..m`、`rp.m`、`m` 以及可选的正则形式 `db.rp./re/`
    fn parse_measurement(&mut self, allow_regex: bool) -> Result<Measurement, ParseError> {
        let start = self.peek().map(|t| t.span);
        let mut segments: Vec<String> = Vec::new();
        let mut regex = None;

        loop {
            match self.peek() {
                Some(Token { kind: TokenKind::Identifier(name), .. }) => {
                    segments.push(name.to_string());
                    self.position += 1;
                }
                Some(Token { kind: TokenKind::Regex(re), .. }) if allow_regex => {
                    regex = Some(re.to_string());
                    self.position += 1;
                    break;
                }
                // 空段, 例如 `db..m`
                Some(Token { kind: TokenKind::Dot, .. }) if !segments.is_empty() => {
                    segments.push(String::new());
                }
                Some(token) => return Err(ParseError::unexpected(token, "measurement")),
                None => return Err(ParseError::end_of_input("measurement")),
            }

            if !self.consume(&TokenKind::Dot) {
                break;
            }
        }

        let too_many = || {
            ParseError::new(
                "Too many segments in measurement name".to_string(),
                start,
            )
        };

        let mut measurement = Measurement::default();
        if let Some(re) = regex {
            match segments.as_slice() {
                [] => {}
                [rp] => measurement.retention_policy = rp.clone(),
                [db, rp] => {
                    measurement.database = db.clone();
                    measurement.retention_policy = rp.clone();
                }
                _ => return Err(too_many()),
            }
            measurement.regex = Some(re);
        } else {
            match segments.as_slice() {
                [name] => measurement.name = name.clone(),
                [rp, name] => {
                    measurement.retention_policy = rp.clone();
                    measurement.name = name.clone();
                }
                [db, rp, name] => {
                    measurement.database = db.clone();
                    measurement.retention_policy = rp.clone();
                    measurement.name = name.clone();
                }
                _ => return Err(too_many()),
            }
        }
        Ok(measurement)
    }

    fn parse_dimensions(&mut self) -> Result<Vec<Dimension>, ParseError> {
        let mut dimensions = Vec::new();
        loop {
            let expr = if self.consume(&TokenKind::Star) {
                Expr::Wildcard
            } else {
                self.parse_expr()?
            };
            dimensions.push(Dimension { expr });

            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(dimensions)
    }

    fn parse_fill(&mut self) -> Result<Fill, ParseError> {
        self.expect(TokenKind::LParen)?;
        let negative = self.consume(&TokenKind::Minus);
        let sign = if negative { -1.0 } else { 1.0 };

        let fill = match self.advance() {
            Some(Token { kind: TokenKind::Integer(n), .. }) => Fill::Number(sign * *n as f64),
            Some(Token { kind: TokenKind::Number(n), .. }) => Fill::Number(sign * n),
            Some(token) => match &token.kind {
                TokenKind::Identifier(name) if !negative => match name.to_ascii_lowercase().as_str() {
                    "null" => Fill::Null,
                    "none" => Fill::None,
                    "previous" => Fill::Previous,
                    "linear" => Fill::Linear,
                    _ => return Err(ParseError::unexpected(token, "fill option")),
                },
                _ => return Err(ParseError::unexpected(token, "fill option")),
            },
            None => return Err(ParseError::end_of_input("fill option")),
        };

        self.expect(TokenKind::RParen)?;
        Ok(fill)
    }

    fn parse_sort_fields(&mut self) -> Result<Vec<SortField>, ParseError> {
        let mut sort_fields = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let ascending = if self.consume(&TokenKind::Desc) {
                false
            } else {
                self.consume(&TokenKind::Asc);
                true
            };
            sort_fields.push(SortField { name, ascending });

            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(sort_fields)
    }

    /// 解析表达式的入口点
    ///
    /// 采用递归下降方式，按照优先级从低到高依次处理：
    /// OR → AND → 比较 → 加减 → 乘除 → 负号 → PRIMARY
    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_or_expression()
    }

    /// 语法: `and_expr (OR and_expr)*`
    fn parse_or_expression(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and_expression()?;

        while self.consume(&TokenKind::Or) {
            let right = self.parse_and_expression()?;
            left = Expr::binary(BinaryOp::Or, left, right);
        }

        Ok(left)
    }

    /// 语法: `comparison (AND comparison)*`
    fn parse_and_expression(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_comparison()?;

        while self.consume(&TokenKind::And) {
            let right = self.parse_comparison()?;
            left = Expr::binary(BinaryOp::And, left, right);
        }

        Ok(left)
    }

    /// 语法: `additive (cmp_op additive)*`
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_additive()?;

        while let Some(op) = self.peek().and_then(|t| comparison_operator(&t.kind)) {
            self.position += 1;
            let right = self.parse_additive()?;
            left = Expr::binary(op, left, right);
        }

        Ok(left)
    }

    /// 语法: `multiplicative ((+|-) multiplicative)*`
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.position += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::binary(op, left, right);
        }

        Ok(left)
    }

    /// 语法: `unary ((*|/|%) unary)*`
    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                Some(TokenKind::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.position += 1;
            let right = self.parse_unary()?;
            left = Expr::binary(op, left, right);
        }

        Ok(left)
    }

    /// 负号只能出现在数字和时间间隔字面量之前
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if !self.match_token(&TokenKind::Minus) {
            return self.parse_primary_expression();
        }

        let expr = match self.peek_next().map(|t| &t.kind) {
            Some(TokenKind::Integer(n)) => Expr::Integer(-n),
            Some(TokenKind::Number(n)) => Expr::Number(-n),
            Some(TokenKind::Duration(d)) => {
                Expr::Duration(Duration::from_nanos(-d.as_nanos()))
            }
            // 词法分析时正数溢出 i64, 带上负号后可能合法, 例如 i64::MIN
            Some(TokenKind::Illegal) => {
                let token = &self.tokens[self.position + 1];
                let text = &self.input[token.span.start..token.span.end];
                match format!("-{}", text).parse::<i64>() {
                    Ok(n) if text.bytes().all(|b| b.is_ascii_digit()) => Expr::Integer(n),
                    _ => return Err(ParseError::unexpected(token, "number or duration after '-'")),
                }
            }
            Some(_) => {
                let token = &self.tokens[self.position + 1];
                return Err(ParseError::unexpected(token, "number or duration after '-'"));
            }
            None => return Err(ParseError::end_of_input("number or duration after '-'")),
        };
        self.position += 2;
        Ok(expr)
    }

    /// 解析基础表达式 (最高优先级)
    ///
    /// 支持的表达式类型:
    /// - `(expr)` - 分组表达式
    /// - `name(args...)` - 函数调用
    /// - `name` / `"name"::type` - 变量引用
    /// - 字符串、数字、时间间隔、布尔值、正则字面量
    fn parse_primary_expression(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.advance() else {
            return Err(ParseError::new("Unexpected end of input".to_string(), None));
        };

        let expr = match &token.kind {
            TokenKind::LParen => {
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Expr::paren(expr)
            }
            TokenKind::Identifier(name) if self.match_token(&TokenKind::LParen) => {
                self.position += 1; // 消费 (
                let args = self.parse_call_args()?;
                Expr::call(name.to_lowercase(), args)
            }
            TokenKind::Identifier(name) => {
                let data_type = if self.consume(&TokenKind::DoubleColon) {
                    self.parse_data_type()?
                } else {
                    DataType::Unknown
                };
                Expr::VarRef(VarRef { name: name.to_string(), data_type })
            }
            TokenKind::String(s) => Expr::String(s.to_string()),
            TokenKind::Integer(n) => Expr::Integer(*n),
            TokenKind::Number(n) => Expr::Number(*n),
            TokenKind::Duration(d) => Expr::Duration(*d),
            TokenKind::True => Expr::Boolean(true),
            TokenKind::False => Expr::Boolean(false),
            TokenKind::Regex(re) => Expr::Regex(re.to_string()),
            _ => return Err(ParseError::unexpected(token, "expression")),
        };
        Ok(expr)
    }

    /// 左括号已经被消费
    fn parse_call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.consume(&TokenKind::RParen) {
            return Ok(args);
        }

        loop {
            let arg = if self.consume(&TokenKind::Star) {
                Expr::Wildcard
            } else {
                self.parse_expr()?
            };
            args.push(arg);

            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_data_type(&mut self) -> Result<DataType, ParseError> {
        match self.advance() {
            Some(token) => match &token.kind {
                TokenKind::Identifier(name) => {
                    DataType::from_name(name).ok_or_else(|| ParseError::unexpected(token, "data type"))
                }
                _ => Err(ParseError::unexpected(token, "data type")),
            },
            None => Err(ParseError::end_of_input("data type")),
        }
    }
}

fn comparison_operator(kind: &TokenKind<'_>) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Eq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::NotEq,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::Lte => BinaryOp::Lte,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::Gte => BinaryOp::Gte,
        TokenKind::EqRegex => BinaryOp::EqRegex,
        TokenKind::NotEqRegex => BinaryOp::NotEqRegex,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_select(input: &str) -> SelectStatement {
        let query = parse_query(input).unwrap();
        assert_eq!(query.statements.len(), 1);
        match query.statements.into_iter().next() {
            Some(Statement::Select(stmt)) => stmt,
            other => panic!("Expected SELECT statement, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_select() {
        let stmt = parse_select(r#"SELECT mean("value") FROM "db"."rp"."cpu""#);

        assert_eq!(stmt.fields.len(), 1);
        assert_eq!(stmt.fields[0].expr, Expr::call("mean", vec![Expr::var("value")]));
        assert_eq!(
            stmt.sources,
            vec![Source::Measurement(Measurement {
                database: "db".to_string(),
                retention_policy: "rp".to_string(),
                name: "cpu".to_string(),
                regex: None,
            })]
        );
        assert_eq!(stmt.fill, Fill::Null);
        assert!(stmt.condition.is_none());
    }

    #[test]
    fn test_measurement_segments() {
        let stmt = parse_select("SELECT v FROM db..cpu, autogen.mem, disk");
        let names: Vec<_> = stmt
            .sources
            .iter()
            .map(|s| match s {
                Source::Measurement(m) => (m.database.as_str(), m.retention_policy.as_str(), m.name.as_str()),
                Source::SubQuery(_) => panic!("Expected measurement"),
            })
            .collect();
        assert_eq!(names, vec![("db", "", "cpu"), ("", "autogen", "mem"), ("", "", "disk")]);
    }

    #[test]
    fn test_regex_source() {
        let stmt = parse_select("SELECT v FROM db.rp./cpu.*/");
        match &stmt.sources[0] {
            Source::Measurement(m) => {
                assert_eq!(m.database, "db");
                assert_eq!(m.retention_policy, "rp");
                assert_eq!(m.regex.as_deref(), Some("cpu.*"));
            }
            Source::SubQuery(_) => panic!("Expected measurement"),
        }
    }

    #[test]
    fn test_subquery_source() {
        let stmt = parse_select("SELECT max(v) FROM (SELECT v FROM cpu WHERE host = 'a')");
        match &stmt.sources[0] {
            Source::SubQuery(inner) => assert!(inner.condition.is_some()),
            Source::Measurement(_) => panic!("Expected sub-query"),
        }
    }

    #[test]
    fn test_where_precedence() {
        let stmt = parse_select("SELECT v FROM cpu WHERE time > now() - 1h AND host = 'a' OR host = 'b'");
        let expected = Expr::binary(
            BinaryOp::Or,
            Expr::binary(
                BinaryOp::And,
                Expr::binary(
                    BinaryOp::Gt,
                    Expr::var("time"),
                    Expr::binary(
                        BinaryOp::Sub,
                        Expr::call("now", vec![]),
                        Expr::Duration(Duration::from_nanos(Duration::HOUR)),
                    ),
                ),
                Expr::binary(BinaryOp::Eq, Expr::var("host"), Expr::string("a")),
            ),
            Expr::binary(BinaryOp::Eq, Expr::var("host"), Expr::string("b")),
        );
        assert_eq!(stmt.condition, Some(expected));
    }

    #[test]
    fn test_arithmetic_precedence() {
        let stmt = parse_select("SELECT v FROM cpu WHERE v > 1 + 2 * 3");
        let expected = Expr::binary(
            BinaryOp::Gt,
            Expr::var("v"),
            Expr::binary(
                BinaryOp::Add,
                Expr::Integer(1),
                Expr::binary(BinaryOp::Mul, Expr::Integer(2), Expr::Integer(3)),
            ),
        );
        assert_eq!(stmt.condition, Some(expected));
    }

    #[test]
    fn test_negative_integer_bounds() {
        let stmt = parse_select("SELECT v FROM cpu WHERE v > -9223372036854775808");
        assert_eq!(
            stmt.condition,
            Some(Expr::binary(BinaryOp::Gt, Expr::var("v"), Expr::Integer(i64::MIN)))
        );

        assert!(parse_query("SELECT v FROM cpu WHERE v > 9223372036854775808").is_err());
        assert!(parse_query("SELECT v FROM cpu WHERE v > -9223372036854775809").is_err());
    }

    #[test]
    fn test_grouped_condition() {
        let stmt = parse_select("SELECT v FROM cpu WHERE (host = 'a')");
        assert_eq!(
            stmt.condition,
            Some(Expr::paren(Expr::binary(BinaryOp::Eq, Expr::var("host"), Expr::string("a"))))
        );
    }

    #[test]
    fn test_group_by_fill_order_and_limits() {
        let stmt = parse_select(
            "SELECT mean(v) FROM cpu GROUP BY time(5m), host fill(none) ORDER BY time DESC LIMIT 10 OFFSET 2 SLIMIT 3 SOFFSET 4",
        );
        assert_eq!(
            stmt.dimensions,
            vec![
                Dimension { expr: Expr::call("time", vec![Expr::Duration(Duration::from_nanos(5 * Duration::MINUTE))]) },
                Dimension { expr: Expr::var("host") },
            ]
        );
        assert_eq!(stmt.fill, Fill::None);
        assert_eq!(stmt.sort_fields, vec![SortField { name: "time".to_string(), ascending: false }]);
        assert_eq!((stmt.limit, stmt.offset, stmt.slimit, stmt.soffset), (10, 2, 3, 4));
    }

    #[test]
    fn test_fill_number() {
        let stmt = parse_select("SELECT mean(v) FROM cpu GROUP BY time(1m) fill(-1)");
        assert_eq!(stmt.fill, Fill::Number(-1.0));
    }

    #[test]
    fn test_into_target() {
        let stmt = parse_select("SELECT v INTO db.rp.copy FROM cpu");
        let target = stmt.target.unwrap();
        assert_eq!(target.measurement.database, "db");
        assert_eq!(target.measurement.name, "copy");
    }

    #[test]
    fn test_type_cast_and_alias() {
        let stmt = parse_select(r#"SELECT "usage"::float AS u, count(*) FROM cpu"#);
        assert_eq!(
            stmt.fields[0],
            Field {
                expr: Expr::VarRef(VarRef { name: "usage".to_string(), data_type: DataType::Float }),
                alias: Some("u".to_string()),
            }
        );
        assert_eq!(stmt.fields[1].expr, Expr::call("count", vec![Expr::Wildcard]));
    }

    #[test]
    fn test_function_names_are_lowercased() {
        let stmt = parse_select("SELECT MEAN(v) FROM cpu WHERE time > NOW()");
        assert_eq!(stmt.fields[0].expr, Expr::call("mean", vec![Expr::var("v")]));
    }

    #[test]
    fn test_wildcard_field() {
        let stmt = parse_select("SELECT * FROM cpu");
        assert_eq!(stmt.fields[0].expr, Expr::Wildcard);
    }

    #[test]
    fn test_multiple_statements_and_other_kinds() {
        let query = parse_query("SHOW DATABASES; SELECT v FROM cpu;").unwrap();
        assert_eq!(query.statements.len(), 2);
        assert_eq!(
            query.statements[0],
            Statement::Other(OtherStatement {
                kind: StatementKind::Show,
                text: "SHOW DATABASES".to_string(),
            })
        );
    }

    #[test]
    fn test_empty_input_has_no_statements() {
        assert!(parse_query("").unwrap().statements.is_empty());
        assert!(parse_query(" ; ;").unwrap().statements.is_empty());
    }

    #[test]
    fn test_syntax_errors() {
        assert!(parse_query("SELECT FROM cpu").is_err());
        assert!(parse_query("SELECT v cpu").is_err());
        assert!(parse_query("SELECT v FROM cpu WHERE").is_err());
        assert!(parse_query("SELECT v FROM cpu WHERE host = 'a").is_err());
        assert!(parse_query("SELECT v FROM cpu LIMIT x").is_err());
        assert!(parse_query("SELECT v FROM a.b.c.d").is_err());
        assert!(parse_query("HELLO").is_err());
    }

    #[test]
    fn test_error_carries_span() {
        let err = parse_query("SELECT v FROM cpu WHERE host = )").unwrap_err();
        assert_eq!(err.span, Some(Span::new(31, 32)));
    }
}
