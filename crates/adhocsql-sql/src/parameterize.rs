use std::ops::ControlFlow;
use std::str::FromStr;

use adhocsql_common::error::{Error, Result};
use adhocsql_common::types::Value;
use rust_decimal::Decimal;
use sqlparser::ast::{self, Expr, JoinConstraint, JoinOperator, SetExpr, Statement, UnaryOperator};

/// A statement with its value-position literals replaced by `$1..$n`.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub statement: Statement,
    pub values: Vec<Value>,
}

pub fn contains_placeholder(statement: &Statement) -> bool {
    ast::visit_expressions(statement, |expr| match expr {
        Expr::Value(v) if matches!(v.value, ast::Value::Placeholder(_)) => ControlFlow::Break(()),
        _ => ControlFlow::Continue(()),
    })
    .is_break()
}

/// Lifts literals out of predicates, `VALUES` rows and `SET` values.
///
/// Returns `None` when the statement already carries placeholders: mixing
/// user parameters with lifted ones would make their numbering ambiguous.
/// Literals elsewhere (select list, `LIMIT`, `ORDER BY`, function arguments)
/// stay in the text and therefore in the token.
pub fn extract_literals(statement: &Statement) -> Result<Option<Extraction>> {
    if contains_placeholder(statement) {
        return Ok(None);
    }

    let mut rewritten = statement.clone();
    let mut extractor = LiteralExtractor { values: Vec::new() };
    extractor.statement(&mut rewritten)?;

    Ok(Some(Extraction {
        statement: rewritten,
        values: extractor.values,
    }))
}

/// Converts a SQL number literal to the narrowest value that holds it.
pub fn number_value(text: &str) -> Result<Value> {
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Value::Integer(i));
    }
    if let Ok(d) = Decimal::from_str(text) {
        return Ok(Value::Decimal(d));
    }
    if let Ok(f) = Decimal::from_scientific(text) {
        return Ok(Value::Decimal(f));
    }
    text.parse::<f64>()
        .map(Value::float)
        .map_err(|_| Error::invalid_literal(format!("invalid number: {}", text)))
}

/// The engine value of an AST literal, or `None` for literals that are never
/// lifted (NULL, placeholders, dialect-specific forms).
pub fn literal_value(value: &ast::Value) -> Result<Option<Value>> {
    match value {
        ast::Value::Number(text, _) => number_value(text).map(Some),
        ast::Value::SingleQuotedString(s) => Ok(Some(Value::String(s.clone()))),
        ast::Value::Boolean(b) => Ok(Some(Value::Boolean(*b))),
        _ => Ok(None),
    }
}

fn negative_number(expr: &Expr) -> Result<Option<Value>> {
    if let Expr::UnaryOp {
        op: UnaryOperator::Minus,
        expr: inner,
    } = expr
        && let Expr::Value(v) = inner.as_ref()
        && let ast::Value::Number(text, _) = &v.value
    {
        return number_value(&format!("-{}", text)).map(Some);
    }
    Ok(None)
}

struct LiteralExtractor {
    values: Vec<Value>,
}

impl LiteralExtractor {
    fn placeholder(&mut self, value: Value) -> ast::Value {
        self.values.push(value);
        ast::Value::Placeholder(format!("${}", self.values.len()))
    }

    fn statement(&mut self, statement: &mut Statement) -> Result<()> {
        match statement {
            Statement::Query(query) => self.query(query),
            Statement::Insert(insert) => match insert.source.as_mut() {
                Some(source) => self.insert_source(source),
                None => Ok(()),
            },
            Statement::Update(ast::Update {
                assignments,
                selection,
                ..
            }) => {
                for assignment in assignments.iter_mut() {
                    self.expr(&mut assignment.value)?;
                }
                match selection {
                    Some(selection) => self.expr(selection),
                    None => Ok(()),
                }
            }
            Statement::Delete(delete) => match delete.selection.as_mut() {
                Some(selection) => self.expr(selection),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    fn insert_source(&mut self, source: &mut ast::Query) -> Result<()> {
        if let SetExpr::Values(values) = source.body.as_mut() {
            for row in values.rows.iter_mut() {
                for expr in row.iter_mut() {
                    self.expr(expr)?;
                }
            }
            return Ok(());
        }
        self.query(source)
    }

    fn query(&mut self, query: &mut ast::Query) -> Result<()> {
        match query.body.as_mut() {
            SetExpr::Select(select) => self.select(select),
            SetExpr::Query(inner) => self.query(inner),
            _ => Ok(()),
        }
    }

    fn select(&mut self, select: &mut ast::Select) -> Result<()> {
        for table in select.from.iter_mut() {
            for join in table.joins.iter_mut() {
                if let Some(on) = join_condition_mut(&mut join.join_operator) {
                    self.expr(on)?;
                }
            }
        }
        if let Some(selection) = select.selection.as_mut() {
            self.expr(selection)?;
        }
        if let Some(having) = select.having.as_mut() {
            self.expr(having)?;
        }
        Ok(())
    }

    fn expr(&mut self, expr: &mut Expr) -> Result<()> {
        if let Some(value) = negative_number(expr)? {
            let placeholder = self.placeholder(value);
            *expr = Expr::Value(placeholder.with_empty_span());
            return Ok(());
        }

        match expr {
            Expr::Value(v) => {
                if let Some(value) = literal_value(&v.value)? {
                    v.value = self.placeholder(value);
                }
                Ok(())
            }
            Expr::BinaryOp { left, right, .. } => {
                self.expr(left)?;
                self.expr(right)
            }
            Expr::UnaryOp { expr, .. } => self.expr(expr),
            Expr::Nested(inner) => self.expr(inner),
            Expr::InList { expr, list, .. } => {
                self.expr(expr)?;
                for item in list.iter_mut() {
                    self.expr(item)?;
                }
                Ok(())
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                self.expr(expr)?;
                self.expr(low)?;
                self.expr(high)
            }
            Expr::Like { expr, pattern, .. } => {
                self.expr(expr)?;
                self.expr(pattern)
            }
            _ => Ok(()),
        }
    }
}

pub(crate) fn join_condition(op: &JoinOperator) -> Option<&Expr> {
    match op {
        JoinOperator::Join(c)
        | JoinOperator::Inner(c)
        | JoinOperator::Left(c)
        | JoinOperator::LeftOuter(c)
        | JoinOperator::Right(c)
        | JoinOperator::RightOuter(c)
        | JoinOperator::FullOuter(c) => match c {
            JoinConstraint::On(expr) => Some(expr),
            _ => None,
        },
        _ => None,
    }
}

fn join_condition_mut(op: &mut JoinOperator) -> Option<&mut Expr> {
    match op {
        JoinOperator::Join(c)
        | JoinOperator::Inner(c)
        | JoinOperator::Left(c)
        | JoinOperator::LeftOuter(c)
        | JoinOperator::Right(c)
        | JoinOperator::RightOuter(c)
        | JoinOperator::FullOuter(c) => match c {
            JoinConstraint::On(expr) => Some(expr),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;

    use super::*;

    fn parse(sql: &str) -> Statement {
        Parser::parse_sql(&GenericDialect {}, sql)
            .unwrap()
            .into_iter()
            .next()
            .unwrap()
    }

    fn extract(sql: &str) -> Extraction {
        extract_literals(&parse(sql)).unwrap().unwrap()
    }

    #[test]
    fn test_where_literals_are_lifted_in_order() {
        let e = extract("SELECT a FROM t WHERE a = 1 AND b = 'x' AND c > 2.5");
        assert_eq!(
            e.values,
            vec![
                Value::integer(1),
                Value::string("x"),
                Value::Decimal(Decimal::from_str("2.5").unwrap()),
            ]
        );
        assert_eq!(
            e.statement.to_string(),
            "SELECT a FROM t WHERE a = $1 AND b = $2 AND c > $3"
        );
    }

    #[test]
    fn test_negative_number_is_one_literal() {
        let e = extract("DELETE FROM t WHERE a = -5");
        assert_eq!(e.values, vec![Value::integer(-5)]);
        assert_eq!(e.statement.to_string(), "DELETE FROM t WHERE a = $1");
    }

    #[test]
    fn test_null_limit_and_projection_stay_in_text() {
        let e = extract("SELECT a + 1 FROM t WHERE b IS NULL AND c = NULL LIMIT 10");
        assert!(e.values.is_empty());
        assert!(e.statement.to_string().contains("LIMIT 10"));
        assert!(e.statement.to_string().contains("a + 1"));
    }

    #[test]
    fn test_insert_values_and_update_set() {
        let e = extract("INSERT INTO t (a, b) VALUES (1, 'one'), (2, 'two')");
        assert_eq!(e.values.len(), 4);
        assert_eq!(e.statement.to_string(), "INSERT INTO t (a, b) VALUES ($1, $2), ($3, $4)");

        let e = extract("UPDATE t SET b = 'z' WHERE a = 7");
        assert_eq!(e.values, vec![Value::string("z"), Value::integer(7)]);
    }

    #[test]
    fn test_join_condition_literals() {
        let e = extract("SELECT * FROM t JOIN u ON t.a = u.a AND u.b = 3 WHERE t.c IN (4, 5)");
        assert_eq!(
            e.values,
            vec![Value::integer(3), Value::integer(4), Value::integer(5)]
        );
    }

    #[test]
    fn test_user_placeholders_disable_extraction() {
        assert!(extract_literals(&parse("SELECT * FROM t WHERE a = ?")).unwrap().is_none());
        assert!(extract_literals(&parse("SELECT * FROM t WHERE a = $1")).unwrap().is_none());
    }

    #[test]
    fn test_number_value() {
        assert_eq!(number_value("42").unwrap(), Value::integer(42));
        assert!(matches!(number_value("1.50").unwrap(), Value::Decimal(_)));
        assert!(matches!(number_value("99999999999999999999").unwrap(), Value::Decimal(_)));
        assert!(number_value("abc").is_err());
    }
}
