//! 转换器支持的 InfluxQL 子集的 token 定义

use std::borrow::Cow;

use crate::ast::Duration;

/// 语言的最小单位, 带有类型和位置
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

/// token 的类型
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind<'a> {
    // 关键字
    Select,
    From,
    Where,
    Group,
    By,
    Order,
    Asc,
    Desc,
    Limit,
    Offset,
    SLimit,
    SOffset,
    Fill,
    Into,
    As,
    And,
    Or,
    True,
    False,

    // 转换器只需识别的语句
    Show,
    Drop,
    Create,
    Delete,
    Alter,
    Grant,
    Revoke,
    Kill,
    Explain,

    // 字面量
    /// 裸标识符或双引号标识符, 已去掉引号和转义
    Identifier(Cow<'a, str>),
    /// 单引号字符串, 已去掉引号和转义
    String(Cow<'a, str>),
    Integer(i64),
    Number(f64),
    Duration(Duration),
    /// 两个斜杠之间的正则
    Regex(Cow<'a, str>),

    // 标点
    LParen,      // (
    RParen,      // )
    Comma,       // ,
    Dot,         // .
    Semicolon,   // ;
    DoubleColon, // ::

    // 运算符
    Plus,       // +
    Minus,      // -
    Star,       // *
    Slash,      // /
    Percent,    // %
    Eq,         // = 或 ==
    NotEq,      // != 或 <>
    Lt,         // <
    Lte,        // <=
    Gt,         // >
    Gte,        // >=
    EqRegex,    // =~
    NotEqRegex, // !~

    // 特殊
    Illegal, // 非法字符或未闭合的字面量
}

/// 源文本中的区间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// 起始字节偏移
    pub start: usize,
    /// 结束字节偏移
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}
