//! 将 InfluxQL 文本转换为查询构建器配置
//!
//! ```text
//! text ──parse──► Query ──one SELECT?──► validate ──► fields / group by
//!   │                         │              │                │
//!   ▼                         ▼              ▼                ▼
//! ParseError                 Raw            Raw       WHERE ─reduce─► tag_logic
//!                                                                     │     │
//!                                                                    Raw  Structured
//! ```

use indexmap::IndexMap;

use crate::ast::{self, Dimension, Expr, Measurement, Query, SelectStatement, Source, Statement};
use crate::condition::{self, FilterOp, TagFilter};
use crate::error::{ConvertError, Unsupported};
use crate::parser::parse_query;
use crate::query_config::{Conversion, Field, GroupBy, QueryConfig};
use crate::reduce::reduce;

/// 查询构建器提供的聚合和选择函数
pub static SUPPORTED_FUNCS: &[&str] = &[
    "mean", "median", "count", "min", "max", "sum", "first", "last", "spread", "stddev",
];

/// 解析并转换 `text`
///
/// 只有语法错误会作为错误返回, 查询构建器无法展示的语句
/// 返回 [`Conversion::Raw`]
pub fn convert(text: &str) -> Result<Conversion, ConvertError> {
    let query = parse_query(text)?;
    Ok(convert_query(&query, text))
}

/// 转换已解析的查询, `text` 用于 raw 回退
pub fn convert_query(query: &Query, text: &str) -> Conversion {
    match structured(query) {
        Ok(config) => Conversion::Structured(config),
        Err(reason) => {
            tracing::debug!(%reason, query = text, "falling back to raw query");
            Conversion::Raw(text.to_string())
        }
    }
}

fn structured(query: &Query) -> Result<QueryConfig, Unsupported> {
    let stmt = match query.statements.as_slice() {
        [Statement::Select(stmt)] => stmt,
        [Statement::Other(_)] => return Err(Unsupported::NotSelect),
        statements => return Err(Unsupported::StatementCount(statements.len())),
    };

    let measurement = validate(stmt)?;
    let group_by = extract_group_by(&stmt.dimensions)?;
    let fields = extract_fields(&stmt.fields)?;

    let mut config = QueryConfig {
        raw_text: None,
        database: measurement.database.clone(),
        retention_policy: measurement.retention_policy.clone(),
        measurement: measurement.name.clone(),
        fields,
        group_by,
        ..Default::default()
    };

    if let Some(condition) = &stmt.condition {
        let filters = classify(condition)?;
        fold_filters(&mut config, filters)?;
    }

    Ok(config)
}

/// 检查查询构建器不支持的子句, 返回语句唯一的 measurement
pub fn validate(stmt: &SelectStatement) -> Result<&Measurement, Unsupported> {
    if stmt.limit != 0 || stmt.offset != 0 || stmt.slimit != 0 || stmt.soffset != 0 {
        return Err(Unsupported::Limit);
    }
    if !stmt.sort_fields.is_empty() {
        return Err(Unsupported::OrderBy);
    }
    if stmt.fill != ast::Fill::Null {
        return Err(Unsupported::Fill);
    }
    if stmt.target.is_some() {
        return Err(Unsupported::Into);
    }

    let [source] = stmt.sources.as_slice() else {
        return Err(Unsupported::SourceCount(stmt.sources.len()));
    };
    match source {
        Source::SubQuery(_) => Err(Unsupported::SubQuery),
        Source::Measurement(m) if m.regex.is_some() => Err(Unsupported::RegexSource),
        Source::Measurement(m) => Ok(m),
    }
}

/// `time(<duration>)` 设置时间间隔, 其余名称为 tag
pub fn extract_group_by(dimensions: &[Dimension]) -> Result<GroupBy, Unsupported> {
    let mut group_by = GroupBy::default();

    for dimension in dimensions {
        match &dimension.expr {
            Expr::VarRef(var) => group_by.tags.push(var.name.clone()),
            Expr::Call { name, args } if name == "time" => {
                let [Expr::Duration(interval)] = args.as_slice() else {
                    return Err(Unsupported::Dimension(dimension.expr.to_string()));
                };
                if !group_by.time.is_empty() {
                    return Err(Unsupported::DuplicateTimeDimension);
                }
                group_by.time = interval.to_string();
            }
            other => return Err(Unsupported::Dimension(other.to_string())),
        }
    }

    Ok(group_by)
}

/// 按字段归组选择的函数, 保持字段首次出现的顺序
pub fn extract_fields(fields: &[ast::Field]) -> Result<Vec<Field>, Unsupported> {
    let mut funcs_by_field: IndexMap<String, Vec<String>> = IndexMap::new();

    for field in fields {
        match &field.expr {
            Expr::VarRef(var) if var.data_type == ast::DataType::Unknown => {
                funcs_by_field.entry(var.name.clone()).or_default();
            }
            Expr::Call { name, args } => {
                let [Expr::VarRef(var)] = args.as_slice() else {
                    return Err(Unsupported::Field(field.expr.to_string()));
                };
                if var.data_type != ast::DataType::Unknown {
                    return Err(Unsupported::Field(field.expr.to_string()));
                }
                if !SUPPORTED_FUNCS.contains(&name.as_str()) {
                    return Err(Unsupported::Function(name.clone()));
                }
                funcs_by_field.entry(var.name.clone()).or_default().push(name.clone());
            }
            other => return Err(Unsupported::Field(other.to_string())),
        }
    }

    Ok(funcs_by_field
        .into_iter()
        .map(|(field, funcs)| Field { field, funcs })
        .collect())
}

/// 化简条件并提取 tag 过滤条件
fn classify(condition: &Expr) -> Result<Vec<TagFilter>, Unsupported> {
    let condition = reduce(condition);
    if condition::has_time_range(&condition) {
        tracing::debug!(%condition, "time range left to the caller");
    }

    condition::tag_logic(&condition).ok_or_else(|| rejected(&condition))
}

fn rejected(condition: &Expr) -> Unsupported {
    if !condition::has_tag_filter(condition) {
        Unsupported::Condition(format!("no tag filter in {}", condition))
    } else if condition::single_tag_filter(condition).is_some() {
        Unsupported::Condition(format!("OR of more than two filters in {}", condition))
    } else {
        Unsupported::Condition(condition.to_string())
    }
}

/// 按 tag 归组过滤值, 并设置 `are_tags_accepted`
fn fold_filters(config: &mut QueryConfig, filters: Vec<TagFilter>) -> Result<(), Unsupported> {
    if !condition::uniform_op(&filters) {
        return Err(Unsupported::MixedOperators);
    }

    config.are_tags_accepted = filters.first().is_some_and(|f| f.op == FilterOp::Equal);
    for filter in filters {
        config.tags.entry(filter.tag).or_default().push(filter.value);
    }
    Ok(())
}
