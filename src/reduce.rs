//! `WHERE` 表达式的常量折叠
//!
//! 不计算 `now()`, 以它为基准的时间范围保持原样,
//! 仍能被条件分类识别

use chrono::{DateTime, Utc};

use crate::ast::{BinaryOp, Duration, Expr};

/// 折叠字面量子表达式, 去掉不再包裹二元表达式的括号
pub fn reduce(expr: &Expr) -> Expr {
    match expr {
        Expr::Paren(inner) => match reduce(inner) {
            binary @ Expr::Binary { .. } => Expr::paren(binary),
            other => other,
        },
        Expr::Binary { op, lhs, rhs } => reduce_binary(*op, reduce(lhs), reduce(rhs)),
        Expr::Call { name, args } => Expr::call(name.clone(), args.iter().map(reduce).collect()),
        other => other.clone(),
    }
}

fn reduce_binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    if let Some(expr) = reduce_logical(op, &lhs, &rhs) {
        return expr;
    }
    if let Some(expr) = reduce_literals(op, &lhs, &rhs) {
        return expr;
    }
    if let Some(time) = time_literal(op, &lhs, &rhs) {
        return if matches!(lhs.unparen(), Expr::String(_)) {
            Expr::binary(op, Expr::Time(time), rhs)
        } else {
            Expr::binary(op, lhs, Expr::Time(time))
        };
    }
    Expr::binary(op, lhs, rhs)
}

fn reduce_logical(op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Option<Expr> {
    use BinaryOp::{And, Or};

    let expr = match (op, lhs, rhs) {
        (And, Expr::Boolean(true), other) | (And, other, Expr::Boolean(true)) => other.clone(),
        (And, Expr::Boolean(false), _) | (And, _, Expr::Boolean(false)) => Expr::Boolean(false),
        (Or, Expr::Boolean(true), _) | (Or, _, Expr::Boolean(true)) => Expr::Boolean(true),
        (Or, Expr::Boolean(false), other) | (Or, other, Expr::Boolean(false)) => other.clone(),
        _ => return None,
    };
    Some(expr)
}

fn reduce_literals(op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Option<Expr> {
    match (lhs, rhs) {
        (Expr::Integer(l), Expr::Integer(r)) => reduce_integer(op, *l, *r),
        (Expr::Number(l), Expr::Number(r)) => reduce_number(op, *l, *r),
        (Expr::Integer(l), Expr::Number(r)) => reduce_number(op, *l as f64, *r),
        (Expr::Number(l), Expr::Integer(r)) => reduce_number(op, *l, *r as f64),
        (Expr::Duration(l), Expr::Duration(r)) => reduce_duration(op, *l, *r),
        (Expr::Duration(d), Expr::Integer(n)) => scale_duration(op, *d, *n),
        (Expr::Integer(n), Expr::Duration(d)) if op == BinaryOp::Mul => scale_duration(op, *d, *n),
        (Expr::String(l), Expr::String(r)) => reduce_string(op, l, r),
        (Expr::Boolean(l), Expr::Boolean(r)) => match op {
            BinaryOp::Eq => Some(Expr::Boolean(l == r)),
            BinaryOp::NotEq => Some(Expr::Boolean(l != r)),
            _ => None,
        },
        _ => None,
    }
}

/// 比较运算, 其他运算符返回 `None`
fn compare<T: PartialOrd>(op: BinaryOp, l: T, r: T) -> Option<Expr> {
    let result = match op {
        BinaryOp::Eq => l == r,
        BinaryOp::NotEq => l != r,
        BinaryOp::Lt => l < r,
        BinaryOp::Lte => l <= r,
        BinaryOp::Gt => l > r,
        BinaryOp::Gte => l >= r,
        _ => return None,
    };
    Some(Expr::Boolean(result))
}

fn reduce_integer(op: BinaryOp, l: i64, r: i64) -> Option<Expr> {
    match op {
        BinaryOp::Add => l.checked_add(r).map(Expr::Integer),
        BinaryOp::Sub => l.checked_sub(r).map(Expr::Integer),
        BinaryOp::Mul => l.checked_mul(r).map(Expr::Integer),
        // 与 InfluxQL 一致, 整数除法得到浮点数
        BinaryOp::Div if r != 0 => Some(Expr::Number(l as f64 / r as f64)),
        BinaryOp::Mod => l.checked_rem(r).map(Expr::Integer),
        _ => compare(op, l, r),
    }
}

fn reduce_number(op: BinaryOp, l: f64, r: f64) -> Option<Expr> {
    match op {
        BinaryOp::Add => Some(Expr::Number(l + r)),
        BinaryOp::Sub => Some(Expr::Number(l - r)),
        BinaryOp::Mul => Some(Expr::Number(l * r)),
        BinaryOp::Div if r != 0.0 => Some(Expr::Number(l / r)),
        BinaryOp::Mod if r != 0.0 => Some(Expr::Number(l % r)),
        _ => compare(op, l, r),
    }
}

fn reduce_duration(op: BinaryOp, l: Duration, r: Duration) -> Option<Expr> {
    let (l, r) = (l.as_nanos(), r.as_nanos());
    let nanos = match op {
        BinaryOp::Add => l.checked_add(r)?,
        BinaryOp::Sub => l.checked_sub(r)?,
        _ => return compare(op, l, r),
    };
    Some(Expr::Duration(Duration::from_nanos(nanos)))
}

fn scale_duration(op: BinaryOp, d: Duration, n: i64) -> Option<Expr> {
    let nanos = match op {
        BinaryOp::Mul => d.as_nanos().checked_mul(n)?,
        BinaryOp::Div => d.as_nanos().checked_div(n)?,
        _ => return None,
    };
    Some(Expr::Duration(Duration::from_nanos(nanos)))
}

fn reduce_string(op: BinaryOp, l: &str, r: &str) -> Option<Expr> {
    match op {
        BinaryOp::Add => Some(Expr::String(format!("{}{}", l, r))),
        BinaryOp::Eq => Some(Expr::Boolean(l == r)),
        BinaryOp::NotEq => Some(Expr::Boolean(l != r)),
        _ => None,
    }
}

/// 与 `time` 比较的 RFC 3339 字符串
fn time_literal(op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Option<DateTime<Utc>> {
    if compare(op, 0, 0).is_none() {
        return None;
    }
    let text = match (lhs.unparen(), rhs.unparen()) {
        (Expr::VarRef(var), Expr::String(s)) | (Expr::String(s), Expr::VarRef(var))
            if var.name.eq_ignore_ascii_case("time") =>
        {
            s
        }
        _ => return None,
    };
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Statement;
    use crate::parser::parse_query;
    use pretty_assertions::assert_eq;

    fn reduced(text: &str) -> Expr {
        let query = parse_query(&format!("SELECT v FROM m WHERE {}", text)).unwrap();
        match query.statements.into_iter().next() {
            Some(Statement::Select(stmt)) => reduce(&stmt.condition.unwrap()),
            other => panic!("Expected SELECT, got {:?}", other),
        }
    }

    fn duration(nanos: i64) -> Expr {
        Expr::Duration(Duration::from_nanos(nanos))
    }

    #[test]
    fn test_parens_kept_only_around_binary() {
        assert_eq!(reduced("((host)) = ('a')"), Expr::binary(BinaryOp::Eq, Expr::var("host"), Expr::string("a")));
        assert_eq!(
            reduced("((host = 'a'))"),
            Expr::paren(Expr::binary(BinaryOp::Eq, Expr::var("host"), Expr::string("a")))
        );
    }

    #[test]
    fn test_boolean_short_circuit() {
        let filter = Expr::binary(BinaryOp::Eq, Expr::var("host"), Expr::string("a"));
        assert_eq!(reduced("true AND host = 'a'"), filter);
        assert_eq!(reduced("host = 'a' OR false"), filter);
        assert_eq!(reduced("host = 'a' AND false"), Expr::Boolean(false));
        assert_eq!(reduced("true OR host = 'a'"), Expr::Boolean(true));
        assert_eq!(reduced("1 = 1 AND host = 'a'"), filter);
    }

    #[test]
    fn test_numeric_folding() {
        assert_eq!(reduced("v > 1 + 2 * 3"), Expr::binary(BinaryOp::Gt, Expr::var("v"), Expr::Integer(7)));
        assert_eq!(reduced("v > 7 / 2"), Expr::binary(BinaryOp::Gt, Expr::var("v"), Expr::Number(3.5)));
        assert_eq!(reduced("v > 1.5 + 1"), Expr::binary(BinaryOp::Gt, Expr::var("v"), Expr::Number(2.5)));
        assert_eq!(reduced("2 < 1"), Expr::Boolean(false));
    }

    #[test]
    fn test_division_by_zero_is_left_alone() {
        assert_eq!(
            reduced("v > 1 / 0"),
            Expr::binary(
                BinaryOp::Gt,
                Expr::var("v"),
                Expr::binary(BinaryOp::Div, Expr::Integer(1), Expr::Integer(0)),
            )
        );
    }

    #[test]
    fn test_duration_folding_keeps_now() {
        assert_eq!(
            reduced("time > now() - (1h + 30m)"),
            Expr::binary(
                BinaryOp::Gt,
                Expr::var("time"),
                Expr::binary(BinaryOp::Sub, Expr::call("now", vec![]), duration(90 * Duration::MINUTE)),
            )
        );
        assert_eq!(
            reduced("time > now() - 2 * 1h"),
            Expr::binary(
                BinaryOp::Gt,
                Expr::var("time"),
                Expr::binary(BinaryOp::Sub, Expr::call("now", vec![]), duration(2 * Duration::HOUR)),
            )
        );
    }

    #[test]
    fn test_string_folding() {
        assert_eq!(
            reduced("host = 'web' + '01'"),
            Expr::binary(BinaryOp::Eq, Expr::var("host"), Expr::string("web01"))
        );
        assert_eq!(reduced("'a' != 'a'"), Expr::Boolean(false));
    }

    #[test]
    fn test_time_string_becomes_time_literal() {
        let expected = DateTime::parse_from_rfc3339("2020-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(
            reduced("time >= '2020-01-01T00:00:00Z'"),
            Expr::binary(BinaryOp::Gte, Expr::var("time"), Expr::Time(expected))
        );
        assert_eq!(
            reduced("host = '2020-01-01T00:00:00Z'"),
            Expr::binary(BinaryOp::Eq, Expr::var("host"), Expr::string("2020-01-01T00:00:00Z"))
        );
    }

    #[test]
    fn test_call_arguments_are_reduced() {
        assert_eq!(
            reduce(&Expr::call("f", vec![Expr::binary(BinaryOp::Add, Expr::Integer(1), Expr::Integer(1))])),
            Expr::call("f", vec![Expr::Integer(2)])
        );
    }
}
