//! 使用 sea-query 将查询构建器配置重新生成为 InfluxQL
//!
//! Postgres 构建器和 InfluxQL 一样用双引号包裹标识符, 但引号的转义方式不同,
//! 所以标识符由 [`Ident`] 自行转义, 字符串值则直接写成 InfluxQL 字面量。

use sea_query::{Asterisk, Cond, Expr, Func, Iden, PostgresQueryBuilder, Quote, SelectStatement, SimpleExpr};

use crate::ast::{escape_ident, quote_string};
use crate::query_config::QueryConfig;

/// 标识符包装, 引号由构建器添加
#[derive(Debug, Clone)]
struct Ident(String);

impl Ident {
    fn new(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl Iden for Ident {
    fn unquoted(&self, s: &mut dyn std::fmt::Write) {
        let _ = s.write_str(&self.0);
    }

    /// InfluxQL 用 `\"` 转义, 而不是 Postgres 的 `""`
    fn quoted(&self, _q: Quote) -> String {
        escape_ident(&self.0)
    }
}

/// 生成 InfluxQL, raw 配置原样返回其文本
pub fn render(config: &QueryConfig) -> String {
    if let Some(text) = &config.raw_text {
        return text.clone();
    }

    let mut select = SelectStatement::new();

    if config.fields.is_empty() {
        select.column(Asterisk);
    }
    for field in &config.fields {
        if field.funcs.is_empty() {
            select.column(Ident::new(&field.field));
        }
        for func in &field.funcs {
            select.expr(Func::cust(Ident::new(func)).arg(Expr::col(Ident::new(&field.field))));
        }
    }

    let measurement = Ident::new(&config.measurement);
    if !config.database.is_empty() {
        select.from((
            Ident::new(&config.database),
            Ident::new(&config.retention_policy),
            measurement,
        ));
    } else if !config.retention_policy.is_empty() {
        select.from((Ident::new(&config.retention_policy), measurement));
    } else {
        select.from(measurement);
    }

    if !config.tags.is_empty() {
        select.cond_where(tag_condition(config));
    }

    if !config.group_by.time.is_empty() {
        select.add_group_by([Expr::cust(format!("time({})", config.group_by.time))]);
    }
    for tag in &config.group_by.tags {
        select.group_by_col(Ident::new(tag));
    }

    select.to_string(PostgresQueryBuilder)
}

/// 接受的 tag 生成 `(tag = a OR tag = b) AND tag = c ...`,
/// 排除的 tag 生成 `tag <> a AND tag <> b ...`
///
/// 转换器只合并两个直接的过滤条件之间的 OR, 所以值按两个一组输出,
/// 组之间用 AND 连接, 重新转换后得到相同的配置
fn tag_condition(config: &QueryConfig) -> Cond {
    let mut all = Cond::all();
    for (tag, values) in &config.tags {
        if config.are_tags_accepted {
            for pair in values.chunks(2) {
                let any = pair
                    .iter()
                    .fold(Cond::any(), |any, value| any.add(Expr::col(Ident::new(tag)).eq(literal(value))));
                all = all.add(any);
            }
        } else {
            for value in values {
                all = all.add(Expr::col(Ident::new(tag)).ne(literal(value)));
            }
        }
    }
    all
}

fn literal(value: &str) -> SimpleExpr {
    Expr::cust(quote_string(value))
}
