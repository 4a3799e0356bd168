//! 将 InfluxQL `SELECT` 语句转换为图形化查询构建器可以展示的扁平配置,
//! 超出其表达能力时保留原始文本
//!
//! ```
//! use influxql_config::{convert, Conversion};
//!
//! let conversion = convert(r#"SELECT mean("value") FROM "cpu" GROUP BY time(5m)"#).unwrap();
//! let config = conversion.as_structured().unwrap();
//! assert_eq!(config.measurement, "cpu");
//! assert_eq!(config.group_by.time, "5m");
//!
//! let raw = convert("SELECT * FROM cpu LIMIT 10").unwrap();
//! assert_eq!(raw, Conversion::Raw("SELECT * FROM cpu LIMIT 10".to_string()));
//! ```

pub mod ast;
pub mod condition;
pub mod config;
pub mod convert;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod query_config;
pub mod reduce;
pub mod render;
pub mod token;

pub use convert::{convert, convert_query};
pub use error::{ConvertError, Unsupported};
pub use parser::{parse_query, ParseError};
pub use query_config::{Conversion, QueryConfig};
