use adhocsql_common::error::{Error, Result};
use sqlparser::ast;

use super::ExprPlanner;
use crate::plan::{AggregateFunc, PlanExpr};
use crate::planner::object_name_to_raw_string;

const SCALAR_FUNCTIONS: &[&str] = &[
    "ABS",
    "COALESCE",
    "CURRENT_TIMESTAMP",
    "LENGTH",
    "LOWER",
    "MOD",
    "NEWID",
    "NOW",
    "RAND",
    "RANDOM",
    "UPPER",
    "UUID",
];

/// Functions whose result differs between calls with the same arguments.
pub const NONDETERMINISTIC_FUNCTIONS: &[&str] = &["NEWID", "RAND", "RANDOM", "UUID"];

enum FunctionArg<'e> {
    Expr(&'e ast::Expr),
    Wildcard,
}

impl ExprPlanner<'_> {
    pub(super) fn plan_function(&mut self, func: &ast::Function) -> Result<PlanExpr> {
        let name = object_name_to_raw_string(&func.name).to_uppercase();
        if func.over.is_some() {
            return Err(Error::unsupported(format!("window function {}", name)));
        }

        let (args, distinct) = function_args(func, &name)?;

        if let Some(agg) = AggregateFunc::from_name(&name) {
            return self.plan_aggregate(agg, &name, &args, distinct);
        }

        if !SCALAR_FUNCTIONS.contains(&name.as_str()) {
            return Err(Error::unsupported(format!("function {}", name)));
        }
        if distinct {
            return Err(Error::invalid_query(format!(
                "DISTINCT is not allowed in {}",
                name
            )));
        }

        let mut planned = Vec::with_capacity(args.len());
        for arg in &args {
            match arg {
                FunctionArg::Expr(e) => planned.push(self.plan(e)?),
                FunctionArg::Wildcard => {
                    return Err(Error::invalid_query(format!("{}(*) is not valid", name)));
                }
            }
        }
        Ok(PlanExpr::Function {
            name,
            args: planned,
        })
    }

    fn plan_aggregate(
        &mut self,
        func: AggregateFunc,
        name: &str,
        args: &[FunctionArg<'_>],
        distinct: bool,
    ) -> Result<PlanExpr> {
        if !self.allow_aggregates {
            return Err(Error::invalid_query(format!(
                "aggregate {} is not allowed here",
                name
            )));
        }

        let arg = match (func, args) {
            (AggregateFunc::Count, [FunctionArg::Wildcard]) => None,
            (_, [FunctionArg::Expr(e)]) => {
                let planned = self.plan(e)?;
                if planned.contains_aggregate() {
                    return Err(Error::invalid_query(format!(
                        "aggregate calls cannot be nested in {}",
                        name
                    )));
                }
                Some(Box::new(planned))
            }
            _ => {
                return Err(Error::invalid_query(format!(
                    "{} takes exactly one argument",
                    name
                )));
            }
        };

        Ok(PlanExpr::Aggregate {
            func,
            arg,
            distinct,
        })
    }
}

fn function_args<'e>(func: &'e ast::Function, name: &str) -> Result<(Vec<FunctionArg<'e>>, bool)> {
    match &func.args {
        ast::FunctionArguments::None => Ok((Vec::new(), false)),
        ast::FunctionArguments::Subquery(_) => {
            Err(Error::unsupported(format!("subquery argument to {}", name)))
        }
        ast::FunctionArguments::List(list) => {
            let distinct = list.duplicate_treatment == Some(ast::DuplicateTreatment::Distinct);
            let args = list
                .args
                .iter()
                .map(|arg| match arg {
                    ast::FunctionArg::Unnamed(ast::FunctionArgExpr::Expr(e)) => {
                        Ok(FunctionArg::Expr(e))
                    }
                    ast::FunctionArg::Unnamed(ast::FunctionArgExpr::Wildcard) => {
                        Ok(FunctionArg::Wildcard)
                    }
                    other => Err(Error::unsupported(format!(
                        "argument {} to {}",
                        other, name
                    ))),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok((args, distinct))
        }
    }
}
