//! InfluxQL 语句的 AST

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

/// AST 的根节点, 代表以分号分隔的一组语句
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    pub statements: Vec<Statement>,
}

/// 单条语句。转换器只关心 SELECT，其余语句只识别类型
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStatement),
    Other(OtherStatement),
}

/// 非 SELECT 语句, 例如 `SHOW DATABASES`
#[derive(Debug, Clone, PartialEq)]
pub struct OtherStatement {
    pub kind: StatementKind,
    /// 语句在原文中的文本
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Show,
    Drop,
    Create,
    Delete,
    Alter,
    Grant,
    Revoke,
    Kill,
    Explain,
}

/// SELECT 语句
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectStatement {
    /// 选择的字段表达式
    pub fields: Vec<Field>,
    /// `INTO` 目标
    pub target: Option<Target>,
    /// `FROM` 数据源
    pub sources: Vec<Source>,
    /// `WHERE` 条件
    pub condition: Option<Expr>,
    /// `GROUP BY` 维度
    pub dimensions: Vec<Dimension>,
    pub fill: Fill,
    /// `ORDER BY` 字段
    pub sort_fields: Vec<SortField>,
    pub limit: u64,
    pub offset: u64,
    pub slimit: u64,
    pub soffset: u64,
}

/// 一个选择字段, 例如 `mean("value") AS avg`
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub expr: Expr,
    pub alias: Option<String>,
}

/// 一个 `GROUP BY` 维度
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub name: String,
    pub ascending: bool,
}

/// `SELECT ... INTO` 的目标
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub measurement: Measurement,
}

/// `FROM` 子句中的一个数据源
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Measurement(Measurement),
    SubQuery(Box<SelectStatement>),
}

/// 带可选数据库、保留策略的 measurement 引用
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Measurement {
    pub database: String,
    pub retention_policy: String,
    pub name: String,
    /// `FROM /cpu.*/` 形式的正则
    pub regex: Option<String>,
}

/// `fill(...)` 策略, 默认为 `null`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Fill {
    #[default]
    Null,
    None,
    Previous,
    Linear,
    Number(f64),
}

/// `::type` 转换给出的类型, 没有转换时为 `Unknown`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    #[default]
    Unknown,
    Float,
    Integer,
    String,
    Boolean,
    Tag,
    Field,
}

impl DataType {
    pub fn from_name(name: &str) -> Option<Self> {
        let data_type = match name.to_ascii_lowercase().as_str() {
            "float" => DataType::Float,
            "integer" => DataType::Integer,
            "string" => DataType::String,
            "boolean" => DataType::Boolean,
            "tag" => DataType::Tag,
            "field" => DataType::Field,
            _ => return None,
        };
        Some(data_type)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Unknown => "unknown",
            DataType::Float => "float",
            DataType::Integer => "integer",
            DataType::String => "string",
            DataType::Boolean => "boolean",
            DataType::Tag => "tag",
            DataType::Field => "field",
        }
    }
}

/// 变量引用, 即字段名或 tag 名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarRef {
    pub name: String,
    pub data_type: DataType,
}

/// 时间间隔，以纳秒保存
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(i64);

impl Duration {
    pub const NANOSECOND: i64 = 1;
    pub const MICROSECOND: i64 = 1_000;
    pub const MILLISECOND: i64 = 1_000_000;
    pub const SECOND: i64 = 1_000_000_000;
    pub const MINUTE: i64 = 60 * Self::SECOND;
    pub const HOUR: i64 = 60 * Self::MINUTE;
    pub const DAY: i64 = 24 * Self::HOUR;
    pub const WEEK: i64 = 7 * Self::DAY;

    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub const fn as_nanos(&self) -> i64 {
        self.0
    }
}

/// 用能整除的最大单位输出, 例如 `300s` 输出为 `5m`
impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const UNITS: [(i64, &str); 7] = [
            (Duration::WEEK, "w"),
            (Duration::DAY, "d"),
            (Duration::HOUR, "h"),
            (Duration::MINUTE, "m"),
            (Duration::SECOND, "s"),
            (Duration::MILLISECOND, "ms"),
            (Duration::MICROSECOND, "u"),
        ];

        if self.0 == 0 {
            return write!(f, "0s");
        }
        for (size, unit) in UNITS {
            if self.0 % size == 0 {
                return write!(f, "{}{}", self.0 / size, unit);
            }
        }
        write!(f, "{}ns", self.0 / Self::NANOSECOND)
    }
}

/// 二元运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,        // +
    Sub,        // -
    Mul,        // *
    Div,        // /
    Mod,        // %
    And,        // AND
    Or,         // OR
    Eq,         // =
    NotEq,      // !=
    Lt,         // <
    Lte,        // <=
    Gt,         // >
    Gte,        // >=
    EqRegex,    // =~
    NotEqRegex, // !~
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::EqRegex => "=~",
            BinaryOp::NotEqRegex => "!~",
        }
    }
}

/// 表达式树
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// 使用括号分组的表达式
    Paren(Box<Expr>),
    VarRef(VarRef),
    String(String),
    Number(f64),
    Integer(i64),
    Duration(Duration),
    /// 绝对时间, 由 reduce 从与 `time` 比较的 RFC3339 字符串得到
    Time(DateTime<Utc>),
    Boolean(bool),
    Regex(String),
    /// 函数调用, 名称统一为小写
    Call { name: String, args: Vec<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    /// `*`
    Wildcard,
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::VarRef(VarRef { name: name.into(), data_type: DataType::Unknown })
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::String(value.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call { name: name.into(), args }
    }

    pub fn paren(expr: Expr) -> Self {
        Expr::Paren(Box::new(expr))
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    /// 去掉所有外层括号
    pub fn unparen(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Paren(inner) = expr {
            expr = inner;
        }
        expr
    }
}

/// 转义标识符中的反斜杠和双引号, 不加引号
pub(crate) fn escape_ident(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", escape_ident(name))
}

pub(crate) fn quote_string(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n");
    format!("'{}'", escaped)
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Paren(inner) => write!(f, "({})", inner),
            Expr::VarRef(var) => {
                write!(f, "{}", quote_ident(&var.name))?;
                if var.data_type != DataType::Unknown {
                    write!(f, "::{}", var.data_type.as_str())?;
                }
                Ok(())
            }
            Expr::String(s) => write!(f, "{}", quote_string(s)),
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Integer(n) => write!(f, "{}", n),
            Expr::Duration(d) => write!(f, "{}", d),
            Expr::Time(t) => write!(f, "'{}'", t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Expr::Boolean(b) => write!(f, "{}", b),
            Expr::Regex(re) => write!(f, "/{}/", re.replace('/', "\\/")),
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Binary { op, lhs, rhs } => write!(f, "{} {} {}", lhs, op.as_str(), rhs),
            Expr::Wildcard => write!(f, "*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_uses_largest_whole_unit() {
        assert_eq!(Duration::from_nanos(5 * Duration::MINUTE).to_string(), "5m");
        assert_eq!(Duration::from_nanos(300 * Duration::SECOND).to_string(), "5m");
        assert_eq!(Duration::from_nanos(90 * Duration::MINUTE).to_string(), "90m");
        assert_eq!(Duration::from_nanos(14 * Duration::DAY).to_string(), "2w");
        assert_eq!(Duration::from_nanos(1500 * Duration::MICROSECOND).to_string(), "1500u");
        assert_eq!(Duration::from_nanos(7).to_string(), "7ns");
        assert_eq!(Duration::from_nanos(0).to_string(), "0s");
    }

    #[test]
    fn test_expr_display() {
        let expr = Expr::binary(
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
            Expr::paren(Expr::binary(BinaryOp::Eq, Expr::var("host"), Expr::string("it's"))),
        );
        assert_eq!(expr.to_string(), r#""time" > now() - 1h AND ("host" = 'it\'s')"#);
    }

    #[test]
    fn test_unparen_strips_every_layer() {
        let expr = Expr::paren(Expr::paren(Expr::var("host")));
        assert_eq!(expr.unparen(), &Expr::var("host"));
    }

    #[test]
    fn test_data_type_names() {
        assert_eq!(DataType::from_name("FLOAT"), Some(DataType::Float));
        assert_eq!(DataType::from_name("bogus"), None);
        assert_eq!(DataType::Tag.as_str(), "tag");
    }
}
