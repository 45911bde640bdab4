//! Expression algebra.
//!
//! An [`Expr`] is a cheap handle to an immutable expression node. Every node
//! gets a unique [`ExprId`] when it is built, so "is this the same
//! sub-expression" is an id comparison and never a deep comparison.
//!
//! Expressions are built with methods, free functions and the arithmetic and
//! bitwise operator traits:
//!
//! ```rust
//! use clasq_core::expr::obj;
//! use clasq_core::query::QueryData;
//!
//! let price = obj("price");
//! let cond = price.gt_eq(100) & obj("stock").gt(0);
//! let qd = QueryData::build(&cond).unwrap();
//! assert_eq!(qd.stmt(), "((`price` >= ?) AND (`stock` > ?))");
//! ```

mod func;
mod ops;
mod set;

use core::fmt;
use core::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Rem, Sub};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

pub use func::{
    Function, ABS, AVG, CEIL, COUNT, FLOOR, MAX, MIN, ROUND, STDDEV, SUM, TRUNCATE, VARIANCE,
};
pub use ops::{Operator, Shape};
pub use set::{ExprSet, KeyKind};

use crate::error::{ObjectError, QueryError, Result};
use crate::keywords::OrderType;
use crate::name::ObjectName;
use crate::query::{Arg, ArgName, QueryData, QueryLike};
use crate::schema::Column;
use crate::value::{SqlValue, ToSqlValue};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

static NONE: LazyLock<Expr> = LazyLock::new(|| Expr::new(ExprKind::None));

/// Process-unique identity of an expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u64);

/// Callable part of a call node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callee {
    /// An operator.
    Operator(Operator),
    /// A named function.
    Function(Function),
}

/// Node variants.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Identity element of every combinator.
    None,
    /// Literal value bound as a parameter.
    Value(SqlValue),
    /// Deferred query argument.
    Arg(Arg),
    /// Raw SQL token such as `NULL`.
    Keyword(&'static str),
    /// Bare named object.
    Object(ObjectName),
    /// Column of a view.
    Column(Column),
    /// Expression tagged with a sort direction.
    Ordered {
        /// Ordered expression.
        expr: Expr,
        /// Direction.
        order: OrderType,
    },
    /// Expression with an output name.
    Aliased {
        /// Wrapped expression.
        expr: Expr,
        /// Output name.
        name: ObjectName,
    },
    /// Operator or function application.
    Call {
        /// Operator or function.
        callee: Callee,
        /// Operands.
        args: Vec<Expr>,
    },
}

#[derive(Debug)]
struct Node {
    id: ExprId,
    kind: ExprKind,
}

/// Shared handle to an expression node.
#[derive(Clone)]
pub struct Expr(Arc<Node>);

impl Expr {
    fn new(kind: ExprKind) -> Self {
        let id = ExprId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
        Self(Arc::new(Node { id, kind }))
    }

    pub(crate) fn call(callee: Callee, args: Vec<Self>) -> Self {
        Self::new(ExprKind::Call { callee, args })
    }

    pub(crate) fn from_column(column: Column) -> Self {
        Self::new(ExprKind::Column(column))
    }

    /// Returns the `None` singleton.
    #[must_use]
    pub fn none() -> Self {
        NONE.clone()
    }

    /// Returns the node identity.
    #[must_use]
    pub fn id(&self) -> ExprId {
        self.0.id
    }

    /// Returns the node variant.
    #[must_use]
    pub fn kind(&self) -> &ExprKind {
        &self.0.kind
    }

    /// Returns `true` for the `None` expression.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self.kind(), ExprKind::None)
    }

    /// Returns `true` if both handles point at the same node.
    #[must_use]
    pub fn is_same(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    /// Returns `true` for named nodes: objects, columns, aliases and ordered
    /// named nodes.
    #[must_use]
    pub fn is_object(&self) -> bool {
        self.name().is_some()
    }

    /// Returns the output name of a named node.
    #[must_use]
    pub fn name(&self) -> Option<&ObjectName> {
        match self.kind() {
            ExprKind::Object(name) | ExprKind::Aliased { name, .. } => Some(name),
            ExprKind::Column(column) => Some(column.name()),
            ExprKind::Ordered { expr, .. } => expr.name(),
            _ => None,
        }
    }

    /// Returns the column behind this node, looking through ordering.
    #[must_use]
    pub fn as_column(&self) -> Option<&Column> {
        match self.unordered().kind() {
            ExprKind::Column(column) => Some(column),
            _ => None,
        }
    }

    /// Strips an ordering wrapper.
    #[must_use]
    pub fn unordered(&self) -> &Self {
        match self.kind() {
            ExprKind::Ordered { expr, .. } => expr,
            _ => self,
        }
    }

    /// Returns the wrapped expression of an alias.
    #[must_use]
    pub fn alias_target(&self) -> Option<&Self> {
        match self.kind() {
            ExprKind::Aliased { expr, .. } => Some(expr),
            _ => None,
        }
    }

    /// Returns the sort direction of an ordered node.
    #[must_use]
    pub fn order(&self) -> Option<OrderType> {
        match self.kind() {
            ExprKind::Ordered { order, .. } => Some(*order),
            _ => None,
        }
    }

    /// Compares identity after unwrapping ordering; columns also match by
    /// qualified name.
    #[must_use]
    pub fn refers_to_same(&self, other: &Self) -> bool {
        let (a, b) = (self.unordered(), other.unordered());
        if a.is_same(b) {
            return true;
        }
        match (a.kind(), b.kind()) {
            (ExprKind::Column(x), ExprKind::Column(y)) => x.same_column(y),
            _ => false,
        }
    }

    // ---- ordering and aliasing ----

    /// Tags this expression with a sort direction.
    #[must_use]
    pub fn ordered(&self, order: OrderType) -> Self {
        Self::new(ExprKind::Ordered {
            expr: self.unordered().clone(),
            order,
        })
    }

    /// Ascending order.
    #[must_use]
    pub fn asc(&self) -> Self {
        self.ordered(OrderType::Asc)
    }

    /// Descending order.
    #[must_use]
    pub fn desc(&self) -> Self {
        self.ordered(OrderType::Desc)
    }

    /// Gives this expression an output name. An existing alias is replaced.
    #[must_use]
    pub fn aliased(&self, name: impl Into<ObjectName>) -> Self {
        let expr = self.unordered();
        Self::new(ExprKind::Aliased {
            expr: expr.alias_target().unwrap_or(expr).clone(),
            name: name.into(),
        })
    }

    /// Synonym of [`Expr::aliased`].
    #[must_use]
    pub fn as_(&self, name: impl Into<ObjectName>) -> Self {
        self.aliased(name)
    }

    // ---- comparison ----

    fn bop(&self, op: Operator, rhs: impl IntoExpr) -> Self {
        op.binary(self.clone(), rhs.into_expr())
    }

    /// `(a = b)`
    #[must_use]
    pub fn eq(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::Eq, rhs)
    }

    /// `(a != b)`
    #[must_use]
    pub fn not_eq(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::Ne, rhs)
    }

    /// `(a < b)`
    #[must_use]
    pub fn lt(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::Lt, rhs)
    }

    /// `(a <= b)`
    #[must_use]
    pub fn lt_eq(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::Le, rhs)
    }

    /// `(a > b)`
    #[must_use]
    pub fn gt(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::Gt, rhs)
    }

    /// `(a >= b)`
    #[must_use]
    pub fn gt_eq(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::Ge, rhs)
    }

    /// `(a <=> b)`
    #[must_use]
    pub fn null_safe_eq(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::NullEq, rhs)
    }

    /// `(a IS b)`
    #[must_use]
    pub fn is(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::Is, rhs)
    }

    /// `(a IS NOT b)`
    #[must_use]
    pub fn is_not(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::IsNot, rhs)
    }

    /// `(a IS NULL)`
    #[must_use]
    pub fn is_null(&self) -> Self {
        self.bop(Operator::Is, keyword("NULL"))
    }

    /// `(a IS NOT NULL)`
    #[must_use]
    pub fn is_not_null(&self) -> Self {
        self.bop(Operator::IsNot, keyword("NULL"))
    }

    /// `(a IN (v1, v2, ...))`
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::ArgNum`] for an empty list.
    pub fn in_<I>(&self, values: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: IntoExpr,
    {
        let operands = std::iter::once(self.clone()).chain(values.into_iter().map(IntoExpr::into_expr));
        Operator::In.call(operands)
    }

    /// `(a BETWEEN low AND high)`
    #[must_use]
    pub fn between(&self, low: impl IntoExpr, high: impl IntoExpr) -> Self {
        Self::call(
            Callee::Operator(Operator::Between),
            vec![self.clone(), low.into_expr(), high.into_expr()],
        )
    }

    /// `(a LIKE pattern)`
    #[must_use]
    pub fn like(&self, pattern: impl IntoExpr) -> Self {
        self.bop(Operator::Like, pattern)
    }

    /// `(a NOT LIKE pattern)`
    #[must_use]
    pub fn not_like(&self, pattern: impl IntoExpr) -> Self {
        self.bop(Operator::NotLike, pattern)
    }

    /// `(a REGEXP pattern)`
    #[must_use]
    pub fn regexp(&self, pattern: impl IntoExpr) -> Self {
        self.bop(Operator::Regexp, pattern)
    }

    // ---- logic and bits ----

    /// `(a AND b)`
    #[must_use]
    pub fn and(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::And, rhs)
    }

    /// `(a OR b)`
    #[must_use]
    pub fn or(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::Or, rhs)
    }

    /// `(a XOR b)`
    #[must_use]
    pub fn xor(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::Xor, rhs)
    }

    /// `(a & b)`
    #[must_use]
    pub fn bit_and(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::BitAnd, rhs)
    }

    /// `(a | b)`
    #[must_use]
    pub fn bit_or(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::BitOr, rhs)
    }

    /// `(a ^ b)`
    #[must_use]
    pub fn bit_xor(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::BitXor, rhs)
    }

    /// `(a << b)`
    #[must_use]
    pub fn shift_left(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::LShift, rhs)
    }

    /// `(a >> b)`
    #[must_use]
    pub fn shift_right(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::RShift, rhs)
    }

    /// `~ a`
    #[must_use]
    pub fn bit_inv(&self) -> Self {
        Operator::BitInv.unary(self.clone())
    }

    /// `- a`
    #[must_use]
    pub fn minus(&self) -> Self {
        Operator::Minus.unary(self.clone())
    }

    /// `BINARY a`
    #[must_use]
    pub fn binary(&self) -> Self {
        Operator::Binary.unary(self.clone())
    }

    // ---- arithmetic ----

    /// `(a DIV b)`
    #[must_use]
    pub fn int_div(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::IntDiv, rhs)
    }

    /// `(a MOD b)`
    #[must_use]
    pub fn modulo(&self, rhs: impl IntoExpr) -> Self {
        self.bop(Operator::Mod, rhs)
    }

    // ---- functions ----

    fn ufunc(&self, func: &Function) -> Self {
        Self::call(Callee::Function(func.clone()), vec![self.clone()])
    }

    /// `ABS(a)`
    #[must_use]
    pub fn abs(&self) -> Self {
        self.ufunc(&ABS)
    }

    /// `CEIL(a)`
    #[must_use]
    pub fn ceil(&self) -> Self {
        self.ufunc(&CEIL)
    }

    /// `FLOOR(a)`
    #[must_use]
    pub fn floor(&self) -> Self {
        self.ufunc(&FLOOR)
    }

    /// `ROUND(a)`
    #[must_use]
    pub fn round(&self) -> Self {
        self.ufunc(&ROUND)
    }

    /// `ROUND(a, digits)`
    #[must_use]
    pub fn round_to(&self, digits: impl IntoExpr) -> Self {
        Self::call(
            Callee::Function(ROUND),
            vec![self.clone(), digits.into_expr()],
        )
    }

    /// `TRUNCATE(a, digits)`
    #[must_use]
    pub fn truncate(&self, digits: impl IntoExpr) -> Self {
        Self::call(
            Callee::Function(TRUNCATE),
            vec![self.clone(), digits.into_expr()],
        )
    }

    /// `TRUNCATE(a, 0)`
    #[must_use]
    pub fn trunc(&self) -> Self {
        self.truncate(keyword("0"))
    }

    /// `AVG(a)`
    #[must_use]
    pub fn avg(&self) -> Self {
        self.ufunc(&AVG)
    }

    /// `COUNT(a)`
    #[must_use]
    pub fn count(&self) -> Self {
        self.ufunc(&COUNT)
    }

    /// `MAX(a)`
    #[must_use]
    pub fn max(&self) -> Self {
        self.ufunc(&MAX)
    }

    /// `MIN(a)`
    #[must_use]
    pub fn min(&self) -> Self {
        self.ufunc(&MIN)
    }

    /// `STDDEV(a)`
    #[must_use]
    pub fn stddev(&self) -> Self {
        self.ufunc(&STDDEV)
    }

    /// `SUM(a)`
    #[must_use]
    pub fn sum(&self) -> Self {
        self.ufunc(&SUM)
    }

    /// `VARIANCE(a)`
    #[must_use]
    pub fn variance(&self) -> Self {
        self.ufunc(&VARIANCE)
    }

    // ---- rendering ----

    /// Renders in a SELECT list: aliases become `<expr> AS <name>`.
    ///
    /// # Errors
    ///
    /// Propagates rendering failures.
    pub fn append_select_column(&self, qd: &mut QueryData) -> Result<()> {
        match self.kind() {
            ExprKind::Aliased { expr, name } => {
                expr.append_to(qd)?;
                qd.append_keyword("AS")?;
                qd.append_object_name(name)?;
                Ok(())
            }
            ExprKind::Ordered { expr, .. } => expr.append_select_column(qd),
            _ => self.append_to(qd),
        }
    }

    /// Renders as an ORDER BY item: `<expr> ASC|DESC`.
    ///
    /// # Errors
    ///
    /// Propagates rendering failures.
    pub fn append_ordered(&self, qd: &mut QueryData) -> Result<()> {
        self.unordered().append_to(qd)?;
        qd.append_keyword(self.order().unwrap_or_default().as_sql())?;
        Ok(())
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            ExprKind::None => f.write_str("NoneExpr"),
            ExprKind::Value(v) => write!(f, "Value({v:?})"),
            ExprKind::Arg(a) => write!(f, "{a}"),
            ExprKind::Keyword(k) => write!(f, "Keyword({k})"),
            ExprKind::Object(n) => write!(f, "Obj({n})"),
            ExprKind::Column(c) => write!(f, "Col({})", c.qualified_name()),
            ExprKind::Ordered { expr, order } => write!(f, "{expr:?} {order}"),
            ExprKind::Aliased { expr, name } => write!(f, "{expr:?} AS {name}"),
            ExprKind::Call { callee, args } => {
                match callee {
                    Callee::Operator(op) => write!(f, "{}", op.symbol())?,
                    Callee::Function(func) => write!(f, "{}", func.name())?,
                }
                f.debug_list().entries(args).finish()
            }
        }
    }
}

impl QueryLike for Expr {
    fn append_to(&self, qd: &mut QueryData) -> Result<()> {
        match self.kind() {
            ExprKind::None => Err(QueryError::Type(String::from(
                "the None expression cannot be rendered",
            ))
            .into()),
            ExprKind::Value(v) => {
                qd.append_value(v.clone());
                Ok(())
            }
            ExprKind::Arg(a) => qd.append_arg(a).map(|_| ()),
            ExprKind::Keyword(k) => qd.append_keyword(k).map(|_| ()),
            ExprKind::Object(name) => qd.append_object_name(name).map(|_| ()),
            ExprKind::Column(column) => column.append_to(qd),
            ExprKind::Ordered { expr, .. } | ExprKind::Aliased { expr, .. } => expr.append_to(qd),
            ExprKind::Call { callee, args } => match callee {
                Callee::Operator(op) => op.render(args, qd),
                Callee::Function(func) => func.render(args, qd),
            },
        }
    }
}

/// Conversion into an expression. Literals become bound values.
pub trait IntoExpr {
    /// Converts `self` into an [`Expr`].
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for &Expr {
    fn into_expr(self) -> Expr {
        self.clone()
    }
}

impl IntoExpr for Arg {
    fn into_expr(self) -> Expr {
        Expr::new(ExprKind::Arg(self))
    }
}

impl IntoExpr for SqlValue {
    fn into_expr(self) -> Expr {
        Expr::new(ExprKind::Value(self))
    }
}

impl IntoExpr for &SqlValue {
    fn into_expr(self) -> Expr {
        self.clone().into_expr()
    }
}

impl<T: ToSqlValue> IntoExpr for Option<T> {
    fn into_expr(self) -> Expr {
        self.to_sql_value().into_expr()
    }
}

macro_rules! impl_into_expr_literal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoExpr for $ty {
                fn into_expr(self) -> Expr {
                    self.to_sql_value().into_expr()
                }
            }
        )*
    };
}

impl_into_expr_literal!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    String,
    &str,
    &String,
    Vec<u8>,
    &[u8],
    NaiveDate,
    NaiveTime,
    NaiveDateTime,
);

/// Creates a bare named object, rendered as a quoted identifier.
pub fn obj(name: impl Into<ObjectName>) -> Expr {
    Expr::new(ExprKind::Object(name.into()))
}

/// Creates a literal value.
pub fn value(v: impl ToSqlValue) -> Expr {
    v.to_sql_value().into_expr()
}

/// Creates a positional query argument.
#[must_use]
pub fn arg(index: usize) -> Expr {
    Arg::new(ArgName::Index(index)).into_expr()
}

/// Creates a keyword query argument.
pub fn arg_named(name: impl Into<String>) -> Expr {
    Arg::new(ArgName::Name(name.into())).into_expr()
}

/// Creates a query argument with a default value.
pub fn arg_with_default(name: impl Into<ArgName>, default: impl ToSqlValue) -> Expr {
    Arg::with_default(name, default).into_expr()
}

/// Creates a raw token (`NULL`, `0`, `DEFAULT`, ...).
#[must_use]
pub fn keyword(token: &'static str) -> Expr {
    Expr::new(ExprKind::Keyword(token))
}

/// `(CASE WHEN cond THEN then [ELSE otherwise] END)`
pub fn case_when(cond: impl IntoExpr, then: impl IntoExpr, otherwise: Option<Expr>) -> Expr {
    let mut args = vec![cond.into_expr(), then.into_expr()];
    args.extend(otherwise);
    Expr::call(Callee::Operator(Operator::Case), args)
}

/// ANDs every expression; `None` for an empty input.
pub fn and_all<I>(exprs: I) -> Expr
where
    I: IntoIterator,
    I::Item: IntoExpr,
{
    exprs
        .into_iter()
        .fold(Expr::none(), |acc, e| Operator::And.binary(acc, e.into_expr()))
}

/// ORs every expression; `None` for an empty input.
pub fn or_all<I>(exprs: I) -> Expr
where
    I: IntoIterator,
    I::Item: IntoExpr,
{
    exprs
        .into_iter()
        .fold(Expr::none(), |acc, e| Operator::Or.binary(acc, e.into_expr()))
}

/// Requires a named expression, for APIs that key expressions by name.
pub(crate) fn require_name(expr: &Expr) -> Result<&ObjectName> {
    expr.name().ok_or_else(|| {
        ObjectError::ArgType(format!("expression has no name: {expr:?}")).into()
    })
}

macro_rules! impl_binary_op {
    ($($trait:ident :: $method:ident => $op:expr),* $(,)?) => {
        $(
            impl<R: IntoExpr> $trait<R> for Expr {
                type Output = Expr;

                fn $method(self, rhs: R) -> Expr {
                    $op.binary(self, rhs.into_expr())
                }
            }

            impl<R: IntoExpr> $trait<R> for &Expr {
                type Output = Expr;

                fn $method(self, rhs: R) -> Expr {
                    $op.binary(self.clone(), rhs.into_expr())
                }
            }
        )*
    };
}

impl_binary_op!(
    Add::add => Operator::Add,
    Sub::sub => Operator::Sub,
    Mul::mul => Operator::Mul,
    Div::div => Operator::Div,
    Rem::rem => Operator::ModOp,
    BitAnd::bitand => Operator::And,
    BitOr::bitor => Operator::Or,
    BitXor::bitxor => Operator::Xor,
);

fn negate(expr: &Expr) -> Expr {
    if expr.is_object() {
        expr.desc()
    } else {
        expr.minus()
    }
}

impl Neg for Expr {
    type Output = Self;

    /// Named expressions become DESC order items; anything else is `- a`.
    fn neg(self) -> Self {
        negate(&self)
    }
}

impl Neg for &Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        negate(self)
    }
}

impl Not for Expr {
    type Output = Self;

    fn not(self) -> Self {
        Operator::Not.unary(self)
    }
}

impl Not for &Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Operator::Not.unary(self.clone())
    }
}
