mod columns;
mod functions;
mod params;

pub use columns::{Scope, ScopeTable};
pub use functions::NONDETERMINISTIC_FUNCTIONS;
pub use params::{ParameterTypes, comparison_type};

use adhocsql_common::error::{Error, Result};
use adhocsql_common::types::{DataType, Value};
use sqlparser::ast;

use crate::parameterize::{literal_value, number_value};
use crate::plan::{BinaryOp, PlanExpr, UnaryOp};

/// Turns AST expressions into [`PlanExpr`]s against a fixed scope, typing
/// parameters from the columns they meet along the way.
pub struct ExprPlanner<'a> {
    scope: &'a Scope,
    params: &'a mut ParameterTypes,
    allow_aggregates: bool,
}

impl<'a> ExprPlanner<'a> {
    pub fn new(scope: &'a Scope, params: &'a mut ParameterTypes) -> Self {
        Self {
            scope,
            params,
            allow_aggregates: false,
        }
    }

    pub fn with_aggregates(mut self, allow: bool) -> Self {
        self.allow_aggregates = allow;
        self
    }

    pub fn set_allow_aggregates(&mut self, allow: bool) {
        self.allow_aggregates = allow;
    }

    pub fn param_types(&self) -> &[Option<DataType>] {
        self.params.types()
    }

    /// Types `expr` from the target column when it is a bare parameter.
    pub fn hint_exact(&mut self, expr: &PlanExpr, data_type: DataType) {
        if let PlanExpr::Parameter { index } = expr {
            self.params.hint(*index, data_type);
        }
    }

    pub fn plan(&mut self, expr: &ast::Expr) -> Result<PlanExpr> {
        match expr {
            ast::Expr::Identifier(ident) => self.scope.resolve(&[ident.value.as_str()]),
            ast::Expr::CompoundIdentifier(parts) => {
                let parts: Vec<&str> = parts.iter().map(|p| p.value.as_str()).collect();
                self.scope.resolve(&parts)
            }
            ast::Expr::Value(v) => self.plan_value(&v.value),
            ast::Expr::Nested(inner) => self.plan(inner),
            ast::Expr::BinaryOp { left, op, right } => {
                let op = binary_op(op)?;
                let left = self.plan(left)?;
                let right = self.plan(right)?;
                if !op.is_logical() {
                    self.unify(&left, &right);
                }
                Ok(PlanExpr::binary(op, left, right))
            }
            ast::Expr::UnaryOp { op, expr: inner } => self.plan_unary(op, inner),
            ast::Expr::IsNull(inner) => Ok(PlanExpr::IsNull {
                expr: Box::new(self.plan(inner)?),
                negated: false,
            }),
            ast::Expr::IsNotNull(inner) => Ok(PlanExpr::IsNull {
                expr: Box::new(self.plan(inner)?),
                negated: true,
            }),
            ast::Expr::InList {
                expr: inner,
                list,
                negated,
            } => {
                let inner = self.plan(inner)?;
                let mut items = Vec::with_capacity(list.len());
                for item in list {
                    let item = self.plan(item)?;
                    self.unify(&inner, &item);
                    items.push(item);
                }
                Ok(PlanExpr::InList {
                    expr: Box::new(inner),
                    list: items,
                    negated: *negated,
                })
            }
            ast::Expr::Between {
                expr: inner,
                negated,
                low,
                high,
            } => {
                let inner = self.plan(inner)?;
                let low = self.plan(low)?;
                let high = self.plan(high)?;
                self.unify(&inner, &low);
                self.unify(&inner, &high);
                Ok(PlanExpr::Between {
                    expr: Box::new(inner),
                    low: Box::new(low),
                    high: Box::new(high),
                    negated: *negated,
                })
            }
            ast::Expr::Like {
                negated,
                expr: inner,
                pattern,
                ..
            } => {
                let inner = self.plan(inner)?;
                let pattern = self.plan(pattern)?;
                self.hint_exact(&inner, DataType::Varchar(None));
                self.hint_exact(&pattern, DataType::Varchar(None));
                Ok(PlanExpr::Like {
                    expr: Box::new(inner),
                    pattern: Box::new(pattern),
                    negated: *negated,
                })
            }
            ast::Expr::Function(func) => self.plan_function(func),
            other => Err(Error::unsupported(format!("expression {}", other))),
        }
    }

    fn plan_value(&mut self, value: &ast::Value) -> Result<PlanExpr> {
        match value {
            ast::Value::Placeholder(text) => Ok(PlanExpr::Parameter {
                index: self.params.placeholder(text)?,
            }),
            ast::Value::Null => Ok(PlanExpr::Literal(Value::Null)),
            other => literal_value(other)?
                .map(PlanExpr::Literal)
                .ok_or_else(|| Error::unsupported(format!("literal {}", other))),
        }
    }

    fn plan_unary(&mut self, op: &ast::UnaryOperator, inner: &ast::Expr) -> Result<PlanExpr> {
        match op {
            ast::UnaryOperator::Minus => {
                if let ast::Expr::Value(v) = inner
                    && let ast::Value::Number(text, _) = &v.value
                {
                    return Ok(PlanExpr::Literal(number_value(&format!("-{}", text))?));
                }
                Ok(PlanExpr::Unary {
                    op: UnaryOp::Minus,
                    expr: Box::new(self.plan(inner)?),
                })
            }
            ast::UnaryOperator::Plus => Ok(PlanExpr::Unary {
                op: UnaryOp::Plus,
                expr: Box::new(self.plan(inner)?),
            }),
            ast::UnaryOperator::Not => Ok(PlanExpr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(self.plan(inner)?),
            }),
            other => Err(Error::unsupported(format!("unary operator {}", other))),
        }
    }

    /// A parameter on one side of a comparison takes the other side's type.
    fn unify(&mut self, left: &PlanExpr, right: &PlanExpr) {
        for (param, other) in [(left, right), (right, left)] {
            if let PlanExpr::Parameter { index } = param
                && let Some(t) = other.data_type(self.params.types())
            {
                self.params.hint(*index, comparison_type(t));
            }
        }
    }
}

fn binary_op(op: &ast::BinaryOperator) -> Result<BinaryOp> {
    Ok(match op {
        ast::BinaryOperator::Eq => BinaryOp::Eq,
        ast::BinaryOperator::NotEq => BinaryOp::NotEq,
        ast::BinaryOperator::Lt => BinaryOp::Lt,
        ast::BinaryOperator::LtEq => BinaryOp::LtEq,
        ast::BinaryOperator::Gt => BinaryOp::Gt,
        ast::BinaryOperator::GtEq => BinaryOp::GtEq,
        ast::BinaryOperator::And => BinaryOp::And,
        ast::BinaryOperator::Or => BinaryOp::Or,
        ast::BinaryOperator::Plus => BinaryOp::Add,
        ast::BinaryOperator::Minus => BinaryOp::Sub,
        ast::BinaryOperator::Multiply => BinaryOp::Mul,
        ast::BinaryOperator::Divide => BinaryOp::Div,
        ast::BinaryOperator::Modulo => BinaryOp::Mod,
        ast::BinaryOperator::StringConcat => BinaryOp::Concat,
        other => return Err(Error::unsupported(format!("operator {}", other))),
    })
}
