use thiserror::Error;

use crate::parser::ParseError;

/// 转换的硬错误。查询构建器无法展示的查询不是错误,
/// 而是转换为 [`crate::Conversion::Raw`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("InfluxQL parse error: {0}")]
    Parse(#[from] ParseError),
}

/// 语句回退为 raw 的原因
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Unsupported {
    #[error("expected exactly one statement, found {0}")]
    StatementCount(usize),

    #[error("only SELECT statements are supported")]
    NotSelect,

    #[error("LIMIT, OFFSET, SLIMIT and SOFFSET are not supported")]
    Limit,

    #[error("ORDER BY is not supported")]
    OrderBy,

    #[error("only fill(null) is supported")]
    Fill,

    #[error("SELECT INTO is not supported")]
    Into,

    #[error("expected exactly one source, found {0}")]
    SourceCount(usize),

    #[error("regex sources are not supported")]
    RegexSource,

    #[error("sub-queries are not supported")]
    SubQuery,

    #[error("unsupported GROUP BY dimension: {0}")]
    Dimension(String),

    #[error("only one GROUP BY time() interval is supported")]
    DuplicateTimeDimension,

    #[error("unsupported field expression: {0}")]
    Field(String),

    #[error("unsupported function: {0}")]
    Function(String),

    #[error("WHERE clause is not a time range plus tag filters: {0}")]
    Condition(String),

    #[error("WHERE clause mixes = and != tag filters")]
    MixedOperators,
}
