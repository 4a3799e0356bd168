//! InfluxQL 的词法分析器

use std::borrow::Cow;

use crate::ast::Duration;
use crate::token::{Span, Token, TokenKind};

pub struct Lexer<'a> {
    input: &'a str,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
    /// 上一个 token 的类型，用来区分除号和正则字面量
    prev: Option<TokenKind<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0, prev: None }
    }

    /// 返回当前位置的字符，不推进位置
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// 返回下一个位置的字符，不推进位置
    fn peek_next(&self) -> Option<char> {
        self.input[self.position..].chars().nth(1)
    }

    /// 推进位置一个字符并返回该字符
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 跳过空白字符和注释（`-- ...` 行注释）
    fn skip_whitespace(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('-') if self.peek_next() == Some('-') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn token(&self, kind: TokenKind<'a>, start: usize) -> Token<'a> {
        Token { kind, span: Span::new(start, self.position) }
    }

    fn consume_digits(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// 读取数字字面量：整数、浮点数，或者紧跟单位的时间间隔
    fn read_number(&mut self, start: usize) -> Token<'a> {
        self.consume_digits();

        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.bump(); // 消费 '.'
            self.consume_digits();
            is_float = true;
        }

        if !is_float && self.peek().is_some_and(char::is_alphabetic) {
            return self.read_duration(start);
        }

        let text = &self.input[start..self.position];
        let kind = if is_float {
            text.parse::<f64>().map(TokenKind::Number).unwrap_or(TokenKind::Illegal)
        } else {
            text.parse::<i64>().map(TokenKind::Integer).unwrap_or(TokenKind::Illegal)
        };
        self.token(kind, start)
    }

    /// 读取时间间隔字面量，例如 `10s`、`1h30m`
    /// 注意：第一段数字已经被调用者消费
    fn read_duration(&mut self, start: usize) -> Token<'a> {
        let mut segment_start = start;
        let mut total: i64 = 0;

        loop {
            let digits = &self.input[segment_start..self.position];
            let unit_start = self.position;
            while self.peek().is_some_and(char::is_alphabetic) {
                self.bump();
            }
            let unit = &self.input[unit_start..self.position];

            let segment = unit_nanos(unit)
                .zip(digits.parse::<i64>().ok())
                .and_then(|(nanos, n)| n.checked_mul(nanos))
                .and_then(|v| total.checked_add(v));
            let Some(segment_total) = segment else {
                return self.token(TokenKind::Illegal, start);
            };
            total = segment_total;

            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                break;
            }
            segment_start = self.position;
            self.consume_digits();
            if !self.peek().is_some_and(char::is_alphabetic) {
                return self.token(TokenKind::Illegal, start);
            }
        }

        self.token(TokenKind::Duration(Duration::from_nanos(total)), start)
    }

    /// 读取被 `quote` 包围的内容，处理反斜杠转义
    /// 注意：开始的引号已经被调用者消费。没有结束引号时返回 None
    fn read_quoted(&mut self, quote: char) -> Option<Cow<'a, str>> {
        let content_start = self.position;
        let mut owned: Option<String> = None;

        loop {
            let c = self.bump()?;
            if c == quote {
                let end = self.position - quote.len_utf8();
                return Some(match owned {
                    Some(s) => Cow::Owned(s),
                    None => Cow::Borrowed(&self.input[content_start..end]),
                });
            }
            if c == '\\' {
                let escape_start = self.position - 1;
                let escaped = self.bump()?;
                let input = self.input;
                let buf = owned.get_or_insert_with(|| input[content_start..escape_start].to_string());
                match escaped {
                    // 正则只处理 `\/`，其他转义原样保留给正则引擎
                    '/' if quote == '/' => buf.push('/'),
                    c if quote == '/' => {
                        buf.push('\\');
                        buf.push(c);
                    }
                    'n' => buf.push('\n'),
                    't' => buf.push('\t'),
                    '\\' => buf.push('\\'),
                    c if c == quote => buf.push(c),
                    _ => return None,
                }
            } else if let Some(buf) = owned.as_mut() {
                buf.push(c);
            }
        }
    }

    fn read_delimited(&mut self, start: usize, quote: char) -> Token<'a> {
        let kind = match self.read_quoted(quote) {
            Some(text) => match quote {
                '"' => TokenKind::Identifier(text),
                '\'' => TokenKind::String(text),
                _ => TokenKind::Regex(text),
            },
            None => TokenKind::Illegal,
        };
        self.token(kind, start)
    }

    /// 读取标识符或关键字
    /// 标识符可以包含字母、数字和下划线
    fn read_identifier(&mut self, start: usize) -> Token<'a> {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let literal = &self.input[start..self.position];
        let kind = match_keyword(literal);
        self.token(kind, start)
    }

    /// 在这些 token 之后出现的 `/` 是正则的开始而不是除号
    fn expects_regex(&self) -> bool {
        matches!(
            self.prev,
            Some(TokenKind::EqRegex)
                | Some(TokenKind::NotEqRegex)
                | Some(TokenKind::From)
                | Some(TokenKind::Dot)
                | Some(TokenKind::Comma)
        )
    }

    /// 处理可能由两个字符组成的运算符
    fn operator(&mut self, start: usize, pairs: &[(char, TokenKind<'a>)], single: TokenKind<'a>) -> Token<'a> {
        for (next, kind) in pairs {
            if self.peek() == Some(*next) {
                self.bump();
                return self.token(kind.clone(), start);
            }
        }
        self.token(single, start)
    }
}

fn unit_nanos(unit: &str) -> Option<i64> {
    let nanos = match unit {
        "ns" => 1,
        "u" | "µ" => 1_000,
        "ms" => 1_000_000,
        "s" => 1_000_000_000,
        "m" => 60 * 1_000_000_000,
        "h" => 60 * 60 * 1_000_000_000,
        "d" => 24 * 60 * 60 * 1_000_000_000,
        "w" => 7 * 24 * 60 * 60 * 1_000_000_000,
        _ => return None,
    };
    Some(nanos)
}

fn match_keyword(s: &str) -> TokenKind<'_> {
    match s.to_ascii_lowercase().as_str() {
        "select" => TokenKind::Select,
        "from" => TokenKind::From,
        "where" => TokenKind::Where,
        "group" => TokenKind::Group,
        "by" => TokenKind::By,
        "order" => TokenKind::Order,
        "asc" => TokenKind::Asc,
        "desc" => TokenKind::Desc,
        "limit" => TokenKind::Limit,
        "offset" => TokenKind::Offset,
        "slimit" => TokenKind::SLimit,
        "soffset" => TokenKind::SOffset,
        "fill" => TokenKind::Fill,
        "into" => TokenKind::Into,
        "as" => TokenKind::As,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "show" => TokenKind::Show,
        "drop" => TokenKind::Drop,
        "create" => TokenKind::Create,
        "delete" => TokenKind::Delete,
        "alter" => TokenKind::Alter,
        "grant" => TokenKind::Grant,
        "revoke" => TokenKind::Revoke,
        "kill" => TokenKind::Kill,
        "explain" => TokenKind::Explain,
        _ => TokenKind::Identifier(Cow::Borrowed(s)),
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let start = self.position;

        let Some(c) = self.bump() else {
            return None; // 到达输入末尾
        };

        let token = match c {
            '(' => self.token(TokenKind::LParen, start),
            ')' => self.token(TokenKind::RParen, start),
            ',' => self.token(TokenKind::Comma, start),
            '.' => self.token(TokenKind::Dot, start),
            ';' => self.token(TokenKind::Semicolon, start),
            '+' => self.token(TokenKind::Plus, start),
            '-' => self.token(TokenKind::Minus, start),
            '*' => self.token(TokenKind::Star, start),
            '%' => self.token(TokenKind::Percent, start),
            ':' => {
                if self.peek() == Some(':') {
                    self.bump();
                    self.token(TokenKind::DoubleColon, start)
                } else {
                    self.token(TokenKind::Illegal, start)
                }
            }
            '=' => self.operator(
                start,
                &[('=', TokenKind::Eq), ('~', TokenKind::EqRegex)],
                TokenKind::Eq,
            ),
            '!' => self.operator(
                start,
                &[('=', TokenKind::NotEq), ('~', TokenKind::NotEqRegex)],
                TokenKind::Illegal,
            ),
            '<' => self.operator(
                start,
                &[('=', TokenKind::Lte), ('>', TokenKind::NotEq)],
                TokenKind::Lt,
            ),
            '>' => self.operator(start, &[('=', TokenKind::Gte)], TokenKind::Gt),
            '/' if self.expects_regex() => self.read_delimited(start, '/'),
            '/' => self.token(TokenKind::Slash, start),
            '"' => self.read_delimited(start, '"'),
            '\'' => self.read_delimited(start, '\''),
            c if c.is_ascii_digit() => self.read_number(start),
            c if c.is_alphabetic() || c == '_' => self.read_identifier(start),
            _ => self.token(TokenKind::Illegal, start),
        };
        self.prev = Some(token.kind.clone());
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind<'_>> {
        Lexer::new(input).map(|t| t.kind).collect()
    }

    fn ident(s: &str) -> TokenKind<'_> {
        TokenKind::Identifier(Cow::Borrowed(s))
    }

    #[test]
    fn test_simple_select() {
        let input = r#"SELECT mean("value") FROM cpu"#;
        let mut lexer = Lexer::new(input);

        assert_eq!(lexer.next().unwrap().kind, TokenKind::Select);
        assert_eq!(lexer.next().unwrap().kind, ident("mean"));
        assert_eq!(lexer.next().unwrap().kind, TokenKind::LParen);
        assert_eq!(lexer.next().unwrap().kind, ident("value"));
        assert_eq!(lexer.next().unwrap().kind, TokenKind::RParen);
        assert_eq!(lexer.next().unwrap().kind, TokenKind::From);
        assert_eq!(lexer.next().unwrap().kind, ident("cpu"));
        assert_eq!(lexer.next(), None);
    }

    #[test]
    fn test_all_operators_and_punctuation() {
        let input = "!= <> = == > < >= <= =~ ( ) , . ; :: + - * %";
        assert_eq!(
            kinds(input),
            vec![
                TokenKind::NotEq, TokenKind::NotEq, TokenKind::Eq, TokenKind::Eq,
                TokenKind::Gt, TokenKind::Lt, TokenKind::Gte, TokenKind::Lte,
                TokenKind::EqRegex, TokenKind::LParen, TokenKind::RParen,
                TokenKind::Comma, TokenKind::Dot, TokenKind::Semicolon,
                TokenKind::DoubleColon, TokenKind::Plus, TokenKind::Minus,
                TokenKind::Star, TokenKind::Percent,
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let input = "select FROM Where group BY slimit SOFFSET fill InTo show host";
        assert_eq!(
            kinds(input),
            vec![
                TokenKind::Select, TokenKind::From, TokenKind::Where, TokenKind::Group,
                TokenKind::By, TokenKind::SLimit, TokenKind::SOffset, TokenKind::Fill,
                TokenKind::Into, TokenKind::Show, ident("host"),
            ]
        );
    }

    #[test]
    fn test_numbers_durations_and_strings() {
        let input = r#"12345 1.5 5m 1h30m 250ms 'hello world'"#;
        assert_eq!(
            kinds(input),
            vec![
                TokenKind::Integer(12345),
                TokenKind::Number(1.5),
                TokenKind::Duration(Duration::from_nanos(300_000_000_000)),
                TokenKind::Duration(Duration::from_nanos(5_400_000_000_000)),
                TokenKind::Duration(Duration::from_nanos(250_000_000)),
                TokenKind::String(Cow::Borrowed("hello world")),
            ]
        );
    }

    #[test]
    fn test_unknown_duration_unit_is_illegal() {
        assert_eq!(kinds("10x"), vec![TokenKind::Illegal]);
    }

    #[test]
    fn test_escapes_in_quoted_tokens() {
        let input = r#""my \"db\"" 'it\'s'"#;
        assert_eq!(
            kinds(input),
            vec![
                TokenKind::Identifier(Cow::Owned("my \"db\"".to_string())),
                TokenKind::String(Cow::Owned("it's".to_string())),
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_illegal() {
        assert_eq!(kinds("'open"), vec![TokenKind::Illegal]);
    }

    #[test]
    fn test_regex_after_match_operator_and_from() {
        let input = r#"FROM /cpu.*/ WHERE host =~ /^web\d+$/"#;
        assert_eq!(
            kinds(input),
            vec![
                TokenKind::From,
                TokenKind::Regex(Cow::Borrowed("cpu.*")),
                TokenKind::Where,
                ident("host"),
                TokenKind::EqRegex,
                TokenKind::Regex(Cow::Owned(r"^web\d+$".to_string())),
            ]
        );
    }

    #[test]
    fn test_slash_is_division_elsewhere() {
        assert_eq!(
            kinds("a / 2"),
            vec![ident("a"), TokenKind::Slash, TokenKind::Integer(2)]
        );
    }

    #[test]
    fn test_time_range_clause() {
        let input = "time > now() - 1h";
        assert_eq!(
            kinds(input),
            vec![
                ident("time"),
                TokenKind::Gt,
                ident("now"),
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Minus,
                TokenKind::Duration(Duration::from_nanos(3_600_000_000_000)),
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens: Vec<_> = Lexer::new("SELECT  x").collect();
        assert_eq!(tokens[0].span, Span::new(0, 6));
        assert_eq!(tokens[1].span, Span::new(8, 9));
    }
}
