use std::fmt;

use adhocsql_common::types::{DataType, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Concat => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunc {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregateFunc {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "COUNT" => Some(AggregateFunc::Count),
            "SUM" => Some(AggregateFunc::Sum),
            "MIN" => Some(AggregateFunc::Min),
            "MAX" => Some(AggregateFunc::Max),
            "AVG" => Some(AggregateFunc::Avg),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
            AggregateFunc::Avg => "AVG",
        }
    }
}

/// A resolved scalar or aggregate expression.
///
/// Columns carry the qualifier they were resolved through (the alias if the
/// table has one) so that self-joins keep their sides apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlanExpr {
    Column {
        qualifier: String,
        table: String,
        name: String,
        data_type: DataType,
    },
    Literal(Value),
    /// Zero-based index into the statement's parameter list.
    Parameter {
        index: usize,
    },
    Binary {
        op: BinaryOp,
        left: Box<PlanExpr>,
        right: Box<PlanExpr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<PlanExpr>,
    },
    IsNull {
        expr: Box<PlanExpr>,
        negated: bool,
    },
    InList {
        expr: Box<PlanExpr>,
        list: Vec<PlanExpr>,
        negated: bool,
    },
    Between {
        expr: Box<PlanExpr>,
        low: Box<PlanExpr>,
        high: Box<PlanExpr>,
        negated: bool,
    },
    Like {
        expr: Box<PlanExpr>,
        pattern: Box<PlanExpr>,
        negated: bool,
    },
    Function {
        name: String,
        args: Vec<PlanExpr>,
    },
    Aggregate {
        func: AggregateFunc,
        arg: Option<Box<PlanExpr>>,
        distinct: bool,
    },
}

impl PlanExpr {
    pub fn binary(op: BinaryOp, left: PlanExpr, right: PlanExpr) -> Self {
        PlanExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Result type, looking parameter types up in `params`. `None` when the
    /// type depends on a parameter that has not been typed yet.
    pub fn data_type(&self, params: &[Option<DataType>]) -> Option<DataType> {
        match self {
            PlanExpr::Column { data_type, .. } => Some(*data_type),
            PlanExpr::Literal(value) => value.natural_type(),
            PlanExpr::Parameter { index } => params.get(*index).copied().flatten(),
            PlanExpr::Binary { op, left, right } => {
                if op.is_comparison() || op.is_logical() {
                    return Some(DataType::Boolean);
                }
                if *op == BinaryOp::Concat {
                    return Some(DataType::Varchar(None));
                }
                let l = left.data_type(params);
                let r = right.data_type(params);
                match (l, r) {
                    (Some(l), Some(r)) => Some(widen(l, r)),
                    (Some(t), None) | (None, Some(t)) => Some(t),
                    (None, None) => None,
                }
            }
            PlanExpr::Unary { op: UnaryOp::Not, .. } => Some(DataType::Boolean),
            PlanExpr::Unary { expr, .. } => expr.data_type(params),
            PlanExpr::IsNull { .. }
            | PlanExpr::InList { .. }
            | PlanExpr::Between { .. }
            | PlanExpr::Like { .. } => Some(DataType::Boolean),
            PlanExpr::Function { name, args } => match name.as_str() {
                "UPPER" | "LOWER" | "NEWID" | "UUID" => Some(DataType::Varchar(None)),
                "LENGTH" | "MOD" => Some(DataType::BigInt),
                "ABS" | "COALESCE" => args.iter().find_map(|a| a.data_type(params)),
                "RAND" | "RANDOM" => Some(DataType::Float),
                "NOW" | "CURRENT_TIMESTAMP" => Some(DataType::Timestamp),
                _ => None,
            },
            PlanExpr::Aggregate { func, arg, .. } => match func {
                AggregateFunc::Count => Some(DataType::BigInt),
                AggregateFunc::Avg => Some(DataType::Float),
                AggregateFunc::Sum => arg
                    .as_ref()
                    .and_then(|a| a.data_type(params))
                    .map(|t| if t.is_integral() { DataType::BigInt } else { t }),
                AggregateFunc::Min | AggregateFunc::Max => {
                    arg.as_ref().and_then(|a| a.data_type(params))
                }
            },
        }
    }

    pub fn contains_aggregate(&self) -> bool {
        let mut found = false;
        self.walk(&mut |e| {
            if matches!(e, PlanExpr::Aggregate { .. }) {
                found = true;
            }
        });
        found
    }

    /// Visits this expression and every sub-expression, parents first.
    pub fn walk(&self, f: &mut impl FnMut(&PlanExpr)) {
        f(self);
        match self {
            PlanExpr::Column { .. } | PlanExpr::Literal(_) | PlanExpr::Parameter { .. } => {}
            PlanExpr::Binary { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
            PlanExpr::Unary { expr, .. } | PlanExpr::IsNull { expr, .. } => expr.walk(f),
            PlanExpr::InList { expr, list, .. } => {
                expr.walk(f);
                for item in list {
                    item.walk(f);
                }
            }
            PlanExpr::Between {
                expr, low, high, ..
            } => {
                expr.walk(f);
                low.walk(f);
                high.walk(f);
            }
            PlanExpr::Like { expr, pattern, .. } => {
                expr.walk(f);
                pattern.walk(f);
            }
            PlanExpr::Function { args, .. } => {
                for arg in args {
                    arg.walk(f);
                }
            }
            PlanExpr::Aggregate { arg, .. } => {
                if let Some(arg) = arg {
                    arg.walk(f);
                }
            }
        }
    }

    /// Splits a predicate on top-level `AND`s.
    pub fn conjuncts(&self) -> Vec<&PlanExpr> {
        match self {
            PlanExpr::Binary {
                op: BinaryOp::And,
                left,
                right,
            } => {
                let mut out = left.conjuncts();
                out.extend(right.conjuncts());
                out
            }
            other => vec![other],
        }
    }
}

fn widen(l: DataType, r: DataType) -> DataType {
    match (l, r) {
        (DataType::Float, _) | (_, DataType::Float) => DataType::Float,
        (DataType::Decimal, _) | (_, DataType::Decimal) => DataType::Decimal,
        (l, r) if l.is_integral() && r.is_integral() => DataType::BigInt,
        (l, _) => l,
    }
}

impl fmt::Display for PlanExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanExpr::Column {
                qualifier, name, ..
            } => write!(f, "{}.{}", qualifier, name),
            PlanExpr::Literal(value) => write!(f, "{}", value),
            PlanExpr::Parameter { index } => write!(f, "?{}", index),
            PlanExpr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            PlanExpr::Unary { op, expr } => match op {
                UnaryOp::Not => write!(f, "NOT {}", expr),
                UnaryOp::Minus => write!(f, "-{}", expr),
                UnaryOp::Plus => write!(f, "+{}", expr),
            },
            PlanExpr::IsNull { expr, negated } => {
                if *negated {
                    write!(f, "{} IS NOT NULL", expr)
                } else {
                    write!(f, "{} IS NULL", expr)
                }
            }
            PlanExpr::InList {
                expr,
                list,
                negated,
            } => {
                let items: Vec<String> = list.iter().map(|e| e.to_string()).collect();
                let not = if *negated { "NOT " } else { "" };
                write!(f, "{} {}IN ({})", expr, not, items.join(", "))
            }
            PlanExpr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                write!(f, "{} {}BETWEEN {} AND {}", expr, not, low, high)
            }
            PlanExpr::Like {
                expr,
                pattern,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                write!(f, "{} {}LIKE {}", expr, not, pattern)
            }
            PlanExpr::Function { name, args } => {
                let args: Vec<String> = args.iter().map(|e| e.to_string()).collect();
                write!(f, "{}({})", name, args.join(", "))
            }
            PlanExpr::Aggregate {
                func,
                arg,
                distinct,
            } => {
                let distinct = if *distinct { "DISTINCT " } else { "" };
                match arg {
                    Some(arg) => write!(f, "{}({}{})", func.name(), distinct, arg),
                    None => write!(f, "{}(*)", func.name()),
                }
            }
        }
    }
}
