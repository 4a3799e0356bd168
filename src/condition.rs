//! `WHERE` 子句的分类
//!
//! 查询构建器只能展示一个时间范围和一组使用同一运算符的 tag 过滤条件。
//! [`tag_logic`] 判断整个条件树能否归约为这种形式

use std::fmt;

use crate::ast::{BinaryOp, Expr};

/// tag 过滤条件使用的比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Equal,
    NotEqual,
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterOp::Equal => write!(f, "=="),
            FilterOp::NotEqual => write!(f, "!="),
        }
    }
}

/// 单个 `tag = 'value'` 或 `tag != 'value'` 条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    pub op: FilterOp,
    pub tag: String,
    pub value: String,
}

/// `time`, 不区分大小写
pub fn is_time(expr: &Expr) -> bool {
    matches!(expr.unparen(), Expr::VarRef(var) if var.name.eq_ignore_ascii_case("time"))
}

/// 无参数的 `now()` 调用
pub fn is_now(expr: &Expr) -> bool {
    matches!(
        expr.unparen(),
        Expr::Call { name, args } if name.eq_ignore_ascii_case("now") && args.is_empty()
    )
}

/// 可以与 `now()` 相减的字面量
pub fn is_duration(expr: &Expr) -> bool {
    match expr.unparen() {
        Expr::Duration(_) | Expr::Number(_) | Expr::Integer(_) | Expr::Time(_) => true,
        Expr::Paren(_)
        | Expr::VarRef(_)
        | Expr::String(_)
        | Expr::Boolean(_)
        | Expr::Regex(_)
        | Expr::Call { .. }
        | Expr::Binary { .. }
        | Expr::Wildcard => false,
    }
}

pub fn is_var_ref(expr: &Expr) -> bool {
    matches!(expr.unparen(), Expr::VarRef(_))
}

pub fn is_string(expr: &Expr) -> bool {
    matches!(expr.unparen(), Expr::String(_))
}

/// `now() - <duration>`, 操作数顺序不限; 单独的 `now()` 也算
pub fn is_previous_time(expr: &Expr) -> bool {
    match expr.unparen() {
        Expr::Binary { op, lhs, rhs } => {
            *op == BinaryOp::Sub
                && (is_now(lhs) || is_now(rhs))
                && (is_duration(lhs) || is_duration(rhs))
        }
        other => is_now(other),
    }
}

/// `time <cmp> now() - <duration>`, 操作数顺序不限
pub fn is_time_range(expr: &Expr) -> bool {
    let Expr::Binary { op, lhs, rhs } = expr.unparen() else {
        return false;
    };
    let comparison = matches!(op, BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte);
    comparison
        && (is_time(lhs) || is_time(rhs))
        && (is_previous_time(lhs) || is_previous_time(rhs))
}

/// 表达式本身或其直接操作数是时间范围
pub fn has_time_range(expr: &Expr) -> bool {
    let expr = expr.unparen();
    if is_time_range(expr) {
        return true;
    }
    match expr {
        Expr::Binary { lhs, rhs, .. } => is_time_range(lhs) || is_time_range(rhs),
        _ => false,
    }
}

/// 从 `tag <op> 'value'` 或 `'value' <op> tag` 中提取过滤条件
pub fn tag_filter(expr: &Expr) -> Option<TagFilter> {
    let Expr::Binary { op, lhs, rhs } = expr.unparen() else {
        return None;
    };
    let op = match op {
        BinaryOp::Eq => FilterOp::Equal,
        BinaryOp::NotEq => FilterOp::NotEqual,
        _ => return None,
    };

    match (lhs.unparen(), rhs.unparen()) {
        (Expr::VarRef(var), Expr::String(value)) | (Expr::String(value), Expr::VarRef(var)) => {
            Some(TagFilter { op, tag: var.name.clone(), value: value.clone() })
        }
        _ => None,
    }
}

/// 通过 `AND`、`OR` 或括号能找到任意 tag 过滤条件
pub fn has_tag_filter(expr: &Expr) -> bool {
    if tag_filter(expr).is_some() {
        return true;
    }
    match expr.unparen() {
        Expr::Binary { op: BinaryOp::And | BinaryOp::Or, lhs, rhs } => {
            has_tag_filter(lhs) || has_tag_filter(rhs)
        }
        _ => false,
    }
}

/// 单个过滤条件, 或同一 tag、同一运算符的 `OR` 链。
/// 返回链中最左边的过滤条件
pub fn single_tag_filter(expr: &Expr) -> Option<TagFilter> {
    if let Some(filter) = tag_filter(expr) {
        return Some(filter);
    }
    let Expr::Binary { op: BinaryOp::Or, lhs, rhs } = expr.unparen() else {
        return None;
    };
    let left = single_tag_filter(lhs)?;
    let right = single_tag_filter(rhs)?;
    (left.op == right.op && left.tag == right.tag).then_some(left)
}

/// 所有过滤条件使用同一运算符
pub fn uniform_op(filters: &[TagFilter]) -> bool {
    filters.windows(2).all(|pair| pair[0].op == pair[1].op)
}

/// 将条件归约为 tag 过滤条件列表
///
/// 只有当条件树由时间范围和 tag 过滤条件组成, 并且结果能表示为
/// 一组使用同一运算符的过滤条件时才成功:
///
/// 1. 时间范围不产生过滤条件
/// 2. tag 过滤条件产生它自身
/// 3. `a OR b` 只在两边都是直接的过滤条件, 且 tag 和运算符相同时接受
/// 4. `range AND filter` (顺序不限) 产生该过滤条件
/// 5. `a AND b` 两边都能归约且运算符一致时, 产生两边的结果
///
/// 其他情况返回 `None`
pub fn tag_logic(expr: &Expr) -> Option<Vec<TagFilter>> {
    let expr = expr.unparen();

    if is_time_range(expr) {
        return Some(Vec::new());
    }
    if let Some(filter) = tag_filter(expr) {
        return Some(vec![filter]);
    }

    let Expr::Binary { op, lhs, rhs } = expr else {
        tracing::trace!(%expr, "not a binary expression");
        return None;
    };

    let left = tag_filter(lhs);
    let right = tag_filter(rhs);

    if *op == BinaryOp::Or {
        return match (left, right) {
            (Some(l), Some(r)) if l.tag == r.tag && l.op == r.op => Some(vec![l, r]),
            _ => {
                tracing::trace!(%expr, "OR is only supported between filters on the same tag");
                None
            }
        };
    }

    if *op != BinaryOp::And {
        tracing::trace!(%expr, "unsupported operator");
        return None;
    }

    if is_time_range(lhs) || is_time_range(rhs) {
        if let Some(filter) = left.or(right) {
            return Some(vec![filter]);
        }
    }

    let mut filters = tag_logic(lhs)?;
    filters.extend(tag_logic(rhs)?);
    if !uniform_op(&filters) {
        tracing::trace!(%expr, "mixed tag filter operators");
        return None;
    }
    Some(filters)
}
