//! Read-only execution surface for translated search statements.
//!
//! Model-generated SQL is untrusted. It is parsed into an AST and admitted only
//! if it has the shape
//!
//! ```sql
//! SELECT * FROM candidates [WHERE …] [ORDER BY …] [LIMIT …]
//! ```
//!
//! with no CTEs, set operations, joins, subqueries, grouping, `SELECT INTO`,
//! table-valued functions, or scalar functions outside `ALLOWED_FUNCTIONS`. What gets
//! executed is the AST rendered back to SQL, never the raw model text.

use std::ops::ControlFlow;

use sqlparser::ast::{
    Expr, Function, FunctionArguments, GroupByExpr, ObjectName, Query, Select, SelectItem, SetExpr,
    Statement, TableFactor, Visit, Visitor,
};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use thiserror::Error;

use crate::models::schema::CANDIDATE_TABLE;

/// Scalar functions a translated statement may call.
const ALLOWED_FUNCTIONS: &[&str] = &[
    "abs",
    "coalesce",
    "date",
    "datetime",
    "ifnull",
    "instr",
    "json_array_length",
    "json_extract",
    "json_valid",
    "length",
    "lower",
    "ltrim",
    "max",
    "min",
    "nullif",
    "replace",
    "round",
    "rtrim",
    "strftime",
    "substr",
    "substring",
    "trim",
    "upper",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("statement is empty")]
    Empty,

    #[error("statement does not parse: {0}")]
    Syntax(String),

    #[error("expected exactly one statement, found {0}")]
    MultipleStatements(usize),

    #[error("only SELECT is allowed, found {0}")]
    NotASelect(String),

    #[error("WITH clauses are not allowed")]
    CommonTableExpression,

    #[error("UNION / INTERSECT / EXCEPT are not allowed")]
    SetOperation,

    #[error("SELECT INTO is not allowed")]
    SelectInto,

    #[error("locking clauses are not allowed")]
    Locking,

    #[error("statement must select FROM {CANDIDATE_TABLE}")]
    MissingRelation,

    #[error("GROUP BY / HAVING are not allowed")]
    Grouping,

    #[error("joins are not allowed")]
    Join,

    #[error("table-valued functions are not allowed")]
    TableFunction,

    #[error("relation `{0}` is not allowed, only {CANDIDATE_TABLE}")]
    UnexpectedRelation(String),

    #[error("nested queries are not allowed")]
    NestedQuery,

    #[error("projection must be `*`")]
    Projection,

    #[error("function `{0}` is not allowed")]
    Function(String),
}

/// A statement that passed `validate`. Only this module can construct one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSelect {
    sql: String,
}

impl ValidatedSelect {
    pub fn as_sql(&self) -> &str {
        &self.sql
    }
}

/// Parses `sql` and admits it only if it is a single plain selection over `candidates`.
pub fn validate(sql: &str) -> Result<ValidatedSelect, Rejection> {
    let sql = sql.trim();
    if sql.is_empty() {
        return Err(Rejection::Empty);
    }

    let mut statements =
        Parser::parse_sql(&SQLiteDialect {}, sql).map_err(|e| Rejection::Syntax(e.to_string()))?;

    match statements.len() {
        0 => return Err(Rejection::Empty),
        1 => {}
        n => return Err(Rejection::MultipleStatements(n)),
    }
    let statement = statements.remove(0);

    let Statement::Query(query) = &statement else {
        return Err(Rejection::NotASelect(statement_keyword(&statement)));
    };
    check_query_shape(query)?;

    if let ControlFlow::Break(rejection) = statement.visit(&mut SurfaceCheck::default()) {
        return Err(rejection);
    }

    Ok(ValidatedSelect {
        sql: statement.to_string(),
    })
}

fn check_query_shape(query: &Query) -> Result<(), Rejection> {
    if query.with.is_some() {
        return Err(Rejection::CommonTableExpression);
    }
    if !query.locks.is_empty() {
        return Err(Rejection::Locking);
    }

    let select = match query.body.as_ref() {
        SetExpr::Select(select) => select,
        SetExpr::SetOperation { .. } => return Err(Rejection::SetOperation),
        SetExpr::Query(_) => return Err(Rejection::NestedQuery),
        other => return Err(Rejection::NotASelect(first_word(&other.to_string()))),
    };
    check_select_shape(select)
}

fn check_select_shape(select: &Select) -> Result<(), Rejection> {
    if select.into.is_some() {
        return Err(Rejection::SelectInto);
    }
    let ungrouped = matches!(
        &select.group_by,
        GroupByExpr::Expressions(exprs, modifiers) if exprs.is_empty() && modifiers.is_empty()
    );
    if !ungrouped || select.having.is_some() {
        return Err(Rejection::Grouping);
    }

    let table = match select.from.as_slice() {
        [] => return Err(Rejection::MissingRelation),
        [table] => table,
        _ => return Err(Rejection::Join),
    };
    if !table.joins.is_empty() {
        return Err(Rejection::Join);
    }

    match &table.relation {
        TableFactor::Table { name, args, .. } => {
            if args.is_some() {
                return Err(Rejection::TableFunction);
            }
            if !is_candidates(name) {
                return Err(Rejection::UnexpectedRelation(name.to_string()));
            }
        }
        TableFactor::Derived { .. } => return Err(Rejection::NestedQuery),
        other => return Err(Rejection::UnexpectedRelation(other.to_string())),
    }

    match select.projection.as_slice() {
        [SelectItem::Wildcard(options)] if options.to_string().trim().is_empty() => Ok(()),
        [SelectItem::QualifiedWildcard(name, options)]
            if is_candidates(name) && options.to_string().trim().is_empty() =>
        {
            Ok(())
        }
        _ => Err(Rejection::Projection),
    }
}

/// Walks every node of the statement, including ones the shape check does not look at.
#[derive(Default)]
struct SurfaceCheck {
    queries: usize,
}

impl Visitor for SurfaceCheck {
    type Break = Rejection;

    fn pre_visit_query(&mut self, _query: &Query) -> ControlFlow<Self::Break> {
        self.queries += 1;
        if self.queries > 1 {
            return ControlFlow::Break(Rejection::NestedQuery);
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_relation(&mut self, relation: &ObjectName) -> ControlFlow<Self::Break> {
        if is_candidates(relation) {
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(Rejection::UnexpectedRelation(relation.to_string()))
        }
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        match expr {
            Expr::Subquery(_) | Expr::Exists { .. } | Expr::InSubquery { .. } => {
                ControlFlow::Break(Rejection::NestedQuery)
            }
            Expr::Function(function) => check_function(function),
            _ => ControlFlow::Continue(()),
        }
    }
}

fn check_function(function: &Function) -> ControlFlow<Rejection> {
    let name = function.name.to_string().to_ascii_lowercase();
    if !ALLOWED_FUNCTIONS.contains(&name.as_str()) {
        return ControlFlow::Break(Rejection::Function(name));
    }
    if matches!(function.args, FunctionArguments::Subquery(_)) {
        return ControlFlow::Break(Rejection::NestedQuery);
    }
    ControlFlow::Continue(())
}

fn is_candidates(name: &ObjectName) -> bool {
    matches!(name.0.as_slice(), [ident] if ident.value.eq_ignore_ascii_case(CANDIDATE_TABLE))
}

fn statement_keyword(statement: &Statement) -> String {
    first_word(&statement.to_string())
}

fn first_word(text: &str) -> String {
    text.split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase()
}
