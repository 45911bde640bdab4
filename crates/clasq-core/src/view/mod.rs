//! View composition.
//!
//! A [`View`] describes a SELECT statement: the columns it selects, the
//! relation it reads from and its WHERE, GROUP BY, ORDER BY, LIMIT and OFFSET
//! parts. Views are immutable. Every transformation returns a new view and
//! leaves its source untouched, so views can be shared and extended freely:
//!
//! ```rust,ignore
//! let keyboards = products.where_eq("category_id", 4)?;
//! let cheapest = keyboards.order_by(["price"])?.at(0)?;
//! ```
//!
//! Compilation and execution happen on first access and are memoized per
//! view (see [`View::select_query`] and [`View::result`]).

mod args;
mod compile;

pub use args::{ColumnLike, OrderSpec, Selection};

use core::fmt;
use core::ops::{Bound, RangeBounds};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{ObjectError, Result};
use crate::expr::{and_all, require_name, value, Expr, ExprSet, IntoExpr, KeyKind, Operator};
use crate::keywords::{JoinType, OrderType};
use crate::name::ObjectName;
use crate::query::{ArgValues, QueryData};
use crate::schema::column::{Column, ColumnBuilder};
use crate::schema::database::Database;
use crate::schema::sqltypes::SqlType;
use crate::schema::table::TableInfo;
use crate::table_data::TableData;

use args::SelectArg;

/// Lifecycle of a view: built, then compiled, then executed.
pub(crate) enum ViewState {
    Built,
    Compiled(QueryData),
    Executed { query: QueryData, result: TableData },
}

pub(crate) struct JoinInfo {
    dest: View,
    join_type: JoinType,
    joined: View,
    on: Expr,
}

pub(crate) enum ViewKind {
    /// A physical table.
    Table(TableInfo),
    /// Two views joined together.
    Joined(JoinInfo),
    /// The SELECT of another view used as a derived table.
    Subquery { name: ObjectName, target: View },
    /// A selection, filter or ordering over a base view.
    Custom { base: View },
    /// Another view with its query arguments bound.
    WithArgs { target: View, args: ArgValues },
}

pub(crate) struct ViewInner {
    kind: ViewKind,
    base_columns: ExprSet,
    selected: ExprSet,
    where_expr: Expr,
    groups: ExprSet,
    orders: ExprSet,
    limit: Option<Expr>,
    offset: Option<Expr>,
    state: Mutex<ViewState>,
}

impl ViewInner {
    fn new(kind: ViewKind, base_columns: ExprSet, selected: ExprSet) -> Self {
        Self {
            kind,
            base_columns,
            selected,
            where_expr: Expr::none(),
            groups: ExprSet::new(KeyKind::Qualified),
            orders: ExprSet::new(KeyKind::Qualified),
            limit: None,
            offset: None,
            state: Mutex::new(ViewState::Built),
        }
    }
}

/// Changes applied by a transformation on top of the source view.
#[derive(Default)]
struct Delta {
    columns: Option<Vec<SelectArg>>,
    where_expr: Option<Expr>,
    groups: Vec<ColumnLike>,
    orders: Vec<OrderSpec>,
    limit: Option<Expr>,
    offset: Option<Expr>,
}

/// A shared handle to an immutable view.
#[derive(Clone)]
pub struct View(Arc<ViewInner>);

impl View {
    pub(crate) const fn from_inner(inner: Arc<ViewInner>) -> Self {
        Self(inner)
    }

    pub(crate) fn is_inner(&self, inner: &Weak<ViewInner>) -> bool {
        core::ptr::eq(Arc::as_ptr(&self.0), inner.as_ptr())
    }

    pub(crate) fn new_table(info: TableInfo, columns: &[ColumnBuilder]) -> Self {
        let name = info.name.clone();
        Self(Arc::new_cyclic(|weak| {
            let mut base_columns = ExprSet::new(KeyKind::Qualified);
            let mut selected = ExprSet::new(KeyKind::Name);
            for builder in columns {
                let expr = Expr::from_column(builder.build(&name, weak.clone()));
                base_columns.push_column(expr.clone());
                selected.push_column(expr);
            }
            ViewInner::new(ViewKind::Table(info), base_columns, selected)
        }))
    }

    pub(crate) fn table_info(&self) -> Option<&TableInfo> {
        match &self.0.kind {
            ViewKind::Table(info) => Some(info),
            _ => None,
        }
    }

    // ---- structure ----

    /// Returns the own name of a table or subquery view.
    #[must_use]
    pub fn name(&self) -> Option<&ObjectName> {
        match &self.0.kind {
            ViewKind::Table(info) => Some(&info.name),
            ViewKind::Subquery { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns the name of the nearest named view this view reads from.
    ///
    /// A join is named after its destination.
    #[must_use]
    pub fn base_name(&self) -> &ObjectName {
        match &self.0.kind {
            ViewKind::Table(info) => &info.name,
            ViewKind::Subquery { name, .. } => name,
            ViewKind::Joined(join) => join.dest.base_name(),
            ViewKind::Custom { base } => base.base_name(),
            ViewKind::WithArgs { target, .. } => target.base_name(),
        }
    }

    /// Returns the view whose FROM fragment this view reads from.
    #[must_use]
    pub fn base(&self) -> Self {
        match &self.0.kind {
            ViewKind::Custom { base } => base.clone(),
            ViewKind::WithArgs { target, .. } => target.base(),
            _ => self.clone(),
        }
    }

    /// Returns `true` for a physical table.
    #[must_use]
    pub fn is_table(&self) -> bool {
        self.table_info().is_some()
    }

    /// Returns the join type of a joined view.
    #[must_use]
    pub fn join_type(&self) -> Option<JoinType> {
        match &self.0.kind {
            ViewKind::Joined(join) => Some(join.join_type),
            _ => None,
        }
    }

    /// Returns the destination and the joined view of a joined view.
    #[must_use]
    pub fn join_views(&self) -> Option<(&Self, &Self)> {
        match &self.0.kind {
            ViewKind::Joined(join) => Some((&join.dest, &join.joined)),
            _ => None,
        }
    }

    /// Returns the database this view reads from.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotSet`] when the view is not bound to a
    /// database or the database no longer exists.
    pub fn database(&self) -> Result<Database> {
        match &self.0.kind {
            ViewKind::Table(info) => info
                .database
                .upgrade()
                .map(Database::from_inner)
                .ok_or_else(|| ObjectError::NotSet(String::from("Database is not set.")).into()),
            ViewKind::Joined(join) => join.dest.database(),
            ViewKind::Subquery { target, .. } | ViewKind::WithArgs { target, .. } => {
                target.database()
            }
            ViewKind::Custom { base } => base.database(),
        }
    }

    // ---- parts ----

    /// Returns the selected expressions, keyed by output name.
    #[must_use]
    pub fn selected_columns(&self) -> &ExprSet {
        &self.0.selected
    }

    /// Returns every column of the relations this view reads from, keyed by
    /// qualified name.
    #[must_use]
    pub fn base_columns(&self) -> &ExprSet {
        &self.0.base_columns
    }

    /// Returns the WHERE condition; [`Expr::none`] when unfiltered.
    #[must_use]
    pub fn where_expr(&self) -> &Expr {
        &self.0.where_expr
    }

    /// Returns the GROUP BY columns.
    #[must_use]
    pub fn groups(&self) -> &ExprSet {
        &self.0.groups
    }

    /// Returns the ORDER BY items.
    #[must_use]
    pub fn orders(&self) -> &ExprSet {
        &self.0.orders
    }

    /// Returns the LIMIT expression.
    #[must_use]
    pub fn limit_value(&self) -> Option<&Expr> {
        self.0.limit.as_ref()
    }

    /// Returns the OFFSET expression.
    #[must_use]
    pub fn offset_value(&self) -> Option<&Expr> {
        self.0.offset.as_ref()
    }

    // ---- lookup ----

    /// Finds a column by output name, then by qualified name, then by the
    /// plain name of a base column. A derived view falls back to the
    /// columns of the view it reads from.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotFound`] for an unknown name and
    /// [`ObjectError::Ambiguous`] when several base columns share the name.
    pub fn get_column(&self, name: impl Into<ObjectName>) -> Result<Expr> {
        let name = name.into();
        lookup_name(&self.0.selected, &self.0.base_columns, &name).or_else(|err| {
            self.source_view()
                .ok_or(err)
                .and_then(|source| lookup_name(&source.0.selected, &source.0.base_columns, &name))
        })
    }

    /// Finds a selected expression by output name.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotFound`] for an unknown name.
    pub fn get_selected_column(&self, name: impl Into<ObjectName>) -> Result<Expr> {
        let name = name.into();
        self.0
            .selected
            .get(&name)
            .cloned()
            .ok_or_else(|| ObjectError::not_found("Column not found.", &name).into())
    }

    /// Looks up several columns by name.
    ///
    /// # Errors
    ///
    /// Fails on the first name [`View::get_column`] rejects.
    pub fn columns<I>(&self, names: I) -> Result<Vec<Expr>>
    where
        I: IntoIterator,
        I::Item: Into<ObjectName>,
    {
        names.into_iter().map(|name| self.get_column(name)).collect()
    }

    /// Returns `true` if [`View::to_column`] accepts `column`.
    #[must_use]
    pub fn contains(&self, column: impl Into<ColumnLike>) -> bool {
        self.to_column(column).is_ok()
    }

    /// Resolves a column reference against this view.
    ///
    /// Names go through [`View::get_column`]. A named expression must be
    /// selected, or be a base column. A computed expression must be the
    /// target of a selected alias.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotFound`] when the reference is not part of
    /// this view.
    pub fn to_column(&self, column: impl Into<ColumnLike>) -> Result<Expr> {
        let column = column.into();
        resolve_column(&self.0.selected, &self.0.base_columns, &column).or_else(|err| {
            self.source_view().ok_or(err).and_then(|source| {
                resolve_column(&source.0.selected, &source.0.base_columns, &column)
            })
        })
    }

    /// The joined or subquery view a derived view reads from, whose
    /// selection stays reachable after this view narrows its own.
    fn source_view(&self) -> Option<Self> {
        match &self.0.kind {
            ViewKind::Custom { base } => Some(base.clone()),
            ViewKind::WithArgs { target, .. } => target.source_view(),
            _ => None,
        }
    }

    // ---- transformations ----

    fn derive(&self, delta: Delta) -> Result<Self> {
        if let ViewKind::WithArgs { target, args } = &self.0.kind {
            return Ok(target.derive(delta)?.with_args(args.clone()));
        }
        let inner = &self.0;
        let base = self.base();

        let mut selected = ExprSet::new(KeyKind::Name);
        let columns = delta
            .columns
            .unwrap_or_else(|| vec![SelectArg::Keep(inner.selected.clone())]);
        for item in columns {
            match item {
                SelectArg::Keep(set) => {
                    for expr in &set {
                        selected.insert(expr.clone())?;
                    }
                }
                SelectArg::Add(selection) => selected.insert(self.resolve_selection(selection)?)?,
            }
        }
        if selected.is_empty() {
            return Err(ObjectError::ArgValue(String::from("Columns cannot be empty.")).into());
        }

        let base_columns = inner.base_columns.clone();

        let mut groups = ExprSet::new(KeyKind::Qualified);
        for group in inner.groups.iter().cloned().map(ColumnLike::Expr).chain(delta.groups) {
            groups.insert_if_absent(resolve_column(&selected, &base_columns, &group)?)?;
        }

        let mut orders = ExprSet::new(KeyKind::Qualified);
        for order in inner.orders.iter().cloned().map(OrderSpec::Expr).chain(delta.orders) {
            orders.insert_if_absent(resolve_order(&selected, &base_columns, order)?)?;
        }

        let where_expr = Operator::And.binary(
            inner.where_expr.clone(),
            delta.where_expr.unwrap_or_else(Expr::none),
        );

        Ok(Self(Arc::new(ViewInner {
            kind: ViewKind::Custom { base },
            base_columns,
            selected,
            where_expr,
            groups,
            orders,
            limit: delta.limit.or_else(|| inner.limit.clone()),
            offset: delta.offset.or_else(|| inner.offset.clone()),
            state: Mutex::new(ViewState::Built),
        })))
    }

    fn resolve_selection(&self, selection: Selection) -> Result<Expr> {
        match selection {
            Selection::Name(name) => self.get_column(name),
            Selection::Expr(expr) => {
                require_name(&expr)?;
                Ok(expr.unordered().clone())
            }
            Selection::Renamed { column, alias } => Ok(self.to_column(column)?.aliased(alias)),
        }
    }

    /// Replaces the selected columns.
    ///
    /// # Errors
    ///
    /// Fails for unknown columns, unnamed expressions, duplicate output
    /// names and an empty selection.
    pub fn select_column<I>(&self, columns: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Selection>,
    {
        self.derive(Delta {
            columns: Some(
                columns
                    .into_iter()
                    .map(|c| SelectArg::Add(c.into()))
                    .collect(),
            ),
            ..Delta::default()
        })
    }

    /// Appends columns to the selection.
    ///
    /// # Errors
    ///
    /// Same as [`View::select_column`].
    pub fn add_column<I>(&self, columns: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Selection>,
    {
        let columns = std::iter::once(SelectArg::Keep(self.0.selected.clone()))
            .chain(columns.into_iter().map(|c| SelectArg::Add(c.into())))
            .collect();
        self.derive(Delta {
            columns: Some(columns),
            ..Delta::default()
        })
    }

    /// ANDs `cond` into the WHERE condition.
    ///
    /// # Errors
    ///
    /// Fails if the source view cannot be rebuilt.
    pub fn where_clause(&self, cond: impl IntoExpr) -> Result<Self> {
        self.derive(Delta {
            where_expr: Some(cond.into_expr()),
            ..Delta::default()
        })
    }

    /// ANDs every condition into the WHERE condition.
    ///
    /// # Errors
    ///
    /// Fails if the source view cannot be rebuilt.
    pub fn where_all<I>(&self, conds: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: IntoExpr,
    {
        self.where_clause(and_all(conds))
    }

    /// Filters on `column = value`.
    ///
    /// # Errors
    ///
    /// Fails if the column is not found.
    pub fn where_eq(&self, column: impl Into<ObjectName>, value: impl IntoExpr) -> Result<Self> {
        let cond = self.get_column(column)?.eq(value);
        self.where_clause(cond)
    }

    /// Appends GROUP BY columns.
    ///
    /// # Errors
    ///
    /// Fails for columns that are not part of the view.
    pub fn group_by<I>(&self, columns: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<ColumnLike>,
    {
        self.derive(Delta {
            groups: columns.into_iter().map(Into::into).collect(),
            ..Delta::default()
        })
    }

    /// Appends ORDER BY items.
    ///
    /// # Errors
    ///
    /// Fails for unknown columns and unnamed expressions.
    pub fn order_by<I>(&self, orders: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<OrderSpec>,
    {
        self.derive(Delta {
            orders: orders.into_iter().map(Into::into).collect(),
            ..Delta::default()
        })
    }

    /// Sets LIMIT.
    ///
    /// # Errors
    ///
    /// Fails if the source view cannot be rebuilt.
    pub fn limit(&self, limit: impl IntoExpr) -> Result<Self> {
        self.derive(Delta {
            limit: Some(limit.into_expr()),
            ..Delta::default()
        })
    }

    /// Sets OFFSET.
    ///
    /// # Errors
    ///
    /// Fails if the source view cannot be rebuilt.
    pub fn offset(&self, offset: impl IntoExpr) -> Result<Self> {
        self.derive(Delta {
            offset: Some(offset.into_expr()),
            ..Delta::default()
        })
    }

    /// Restricts the view to a range of rows.
    ///
    /// A start sets OFFSET and an end sets LIMIT to the range length.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::ArgValue`] when the range ends before it starts
    /// or a bound is out of SQL range.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Result<Self> {
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => index_after(s)?,
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => Some(index_after(e)?),
            Bound::Excluded(&e) => Some(e),
            Bound::Unbounded => None,
        };
        let limit = match end {
            Some(end) if end < start => {
                return Err(ObjectError::ArgValue(format!(
                    "Invalid range: {start}..{end}"
                ))
                .into());
            }
            Some(end) => Some(value(row_count(end - start)?)),
            None => None,
        };
        let offset = if start > 0 {
            Some(value(row_count(start)?))
        } else {
            None
        };
        self.derive(Delta {
            limit,
            offset,
            ..Delta::default()
        })
    }

    /// Restricts the view to the row at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::ArgValue`] for an index out of SQL range.
    pub fn at(&self, index: usize) -> Result<Self> {
        self.slice(index..=index)
    }

    /// Joins `other` to this view.
    ///
    /// The selection is this view's columns followed by the columns of
    /// `other`. A joined column whose name is already selected is aliased as
    /// `<other base name>_<name>`. The WHERE condition of `other` moves into
    /// the ON condition.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::ArgValue`] when either view has LIMIT or OFFSET
    /// or bound arguments, and [`ObjectError::NameAlreadyExists`] when both
    /// views read the same base column.
    pub fn join(&self, join_type: JoinType, other: &Self, on: impl IntoExpr) -> Result<Self> {
        for view in [self, other] {
            if view.0.limit.is_some() || view.0.offset.is_some() {
                return Err(ObjectError::ArgValue(String::from(
                    "A view with LIMIT or OFFSET cannot be joined. Use `subquery` first.",
                ))
                .into());
            }
            if matches!(view.0.kind, ViewKind::WithArgs { .. }) {
                return Err(ObjectError::ArgValue(String::from(
                    "A view with bound arguments cannot be joined. Use `subquery` first.",
                ))
                .into());
            }
        }

        let duplicates = &self.0.base_columns & &other.0.base_columns;
        if let Some(name) = duplicates.keys().next() {
            return Err(ObjectError::name_exists("Duplicate column names.", name).into());
        }
        let base_columns = &self.0.base_columns | &other.0.base_columns;

        let alias_format = other.base_name().concat("_%s");
        let mut selected = self.0.selected.clone();
        for expr in &other.0.selected {
            if selected.contains(expr) {
                continue;
            }
            let name = require_name(expr)?;
            if selected.contains_key(name) {
                selected.insert(expr.aliased(&alias_format % name))?;
            } else {
                selected.insert(expr.clone())?;
            }
        }

        let orders = &self.0.orders | &other.0.orders;
        Ok(Self(Arc::new(ViewInner {
            kind: ViewKind::Joined(JoinInfo {
                dest: self.clone(),
                join_type,
                joined: other.clone(),
                on: on.into_expr(),
            }),
            base_columns,
            selected,
            where_expr: self.0.where_expr.clone(),
            groups: self.0.groups.clone(),
            orders,
            limit: None,
            offset: None,
            state: Mutex::new(ViewState::Built),
        })))
    }

    /// INNER JOIN.
    ///
    /// # Errors
    ///
    /// Same as [`View::join`].
    pub fn inner_join(&self, other: &Self, on: impl IntoExpr) -> Result<Self> {
        self.join(JoinType::Inner, other, on)
    }

    /// LEFT JOIN.
    ///
    /// # Errors
    ///
    /// Same as [`View::join`].
    pub fn left_join(&self, other: &Self, on: impl IntoExpr) -> Result<Self> {
        self.join(JoinType::Left, other, on)
    }

    /// RIGHT JOIN.
    ///
    /// # Errors
    ///
    /// Same as [`View::join`].
    pub fn right_join(&self, other: &Self, on: impl IntoExpr) -> Result<Self> {
        self.join(JoinType::Right, other, on)
    }

    /// FULL OUTER JOIN.
    ///
    /// # Errors
    ///
    /// Same as [`View::join`].
    pub fn outer_join(&self, other: &Self, on: impl IntoExpr) -> Result<Self> {
        self.join(JoinType::Outer, other, on)
    }

    /// CROSS JOIN, without an ON condition.
    ///
    /// # Errors
    ///
    /// Same as [`View::join`].
    pub fn cross_join(&self, other: &Self) -> Result<Self> {
        self.join(JoinType::Cross, other, Expr::none())
    }

    /// Wraps this view's SELECT as a derived table named `name`.
    ///
    /// The new view has one untyped column per selected expression, except
    /// that plain columns keep their type.
    ///
    /// # Errors
    ///
    /// Fails if this view cannot be compiled.
    pub fn subquery(&self, name: impl Into<ObjectName>) -> Result<Self> {
        let name = name.into();
        self.select_query()?;
        let target = self.clone();
        let exprs = self.0.selected.to_vec();
        Ok(Self(Arc::new_cyclic(|weak| {
            let mut base_columns = ExprSet::new(KeyKind::Qualified);
            let mut selected = ExprSet::new(KeyKind::Name);
            for expr in &exprs {
                let Some(column_name) = expr.name() else {
                    continue;
                };
                let sql_type = expr
                    .alias_target()
                    .unwrap_or(expr)
                    .as_column()
                    .map_or(SqlType::Any, Column::sql_type);
                let column = Expr::from_column(Column::new(
                    column_name.clone(),
                    name.clone(),
                    weak.clone(),
                    sql_type,
                    None,
                ));
                base_columns.push_column(column.clone());
                selected.push_column(column);
            }
            ViewInner::new(ViewKind::Subquery { name, target }, base_columns, selected)
        })))
    }

    /// Binds query arguments. The returned view compiles to this view's
    /// statement with every argument resolved.
    #[must_use]
    pub fn with_args(&self, args: impl Into<ArgValues>) -> Self {
        let inner = &self.0;
        Self(Arc::new(ViewInner {
            kind: ViewKind::WithArgs {
                target: self.clone(),
                args: args.into(),
            },
            base_columns: inner.base_columns.clone(),
            selected: inner.selected.clone(),
            where_expr: inner.where_expr.clone(),
            groups: inner.groups.clone(),
            orders: inner.orders.clone(),
            limit: inner.limit.clone(),
            offset: inner.offset.clone(),
            state: Mutex::new(ViewState::Built),
        }))
    }

    /// Binds query arguments and returns the result.
    ///
    /// # Errors
    ///
    /// Fails on argument resolution, a missing database or driver errors.
    pub fn call(&self, args: impl Into<ArgValues>) -> Result<TableData> {
        self.with_args(args).result()
    }
}

impl PartialEq for View {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for View {}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            ViewKind::Table(info) => write!(f, "T({})", info.name),
            ViewKind::Joined(join) => write!(
                f,
                "JoinV({:?} {} {:?})",
                join.dest, join.join_type, join.joined
            ),
            ViewKind::Subquery { name, target } => write!(f, "SqV({name}: {target:?})"),
            ViewKind::Custom { base } => write!(f, "V({base:?})"),
            ViewKind::WithArgs { target, args } => write!(f, "VA({target:?}, {args:?})"),
        }
    }
}

fn row_count(n: usize) -> Result<i64> {
    i64::try_from(n)
        .map_err(|_| ObjectError::ArgValue(format!("Row count out of range: {n}")).into())
}

fn index_after(index: usize) -> Result<usize> {
    index
        .checked_add(1)
        .ok_or_else(|| ObjectError::ArgValue(format!("Row index out of range: {index}")).into())
}

fn lookup_name(selected: &ExprSet, base_columns: &ExprSet, name: &ObjectName) -> Result<Expr> {
    if let Some(expr) = selected.get(name).or_else(|| base_columns.get(name)) {
        return Ok(expr.clone());
    }
    let mut matches = base_columns.iter().filter(|e| e.name() == Some(name));
    match (matches.next(), matches.next()) {
        (Some(expr), None) => Ok(expr.clone()),
        (Some(_), Some(_)) => Err(ObjectError::Ambiguous(format!(
            "Column name `{name}` matches more than one base column."
        ))
        .into()),
        (None, _) => Err(ObjectError::not_found("Column not found.", name).into()),
    }
}

fn resolve_column(selected: &ExprSet, base_columns: &ExprSet, column: &ColumnLike) -> Result<Expr> {
    let expr = match column {
        ColumnLike::Name(name) => return lookup_name(selected, base_columns, name),
        ColumnLike::Expr(expr) => expr,
    };
    if expr.is_object() {
        if selected.contains(expr) || (expr.as_column().is_some() && base_columns.contains(expr)) {
            return Ok(expr.unordered().clone());
        }
    } else if let Some(aliased) = selected
        .iter()
        .find(|s| s.alias_target().is_some_and(|target| target.is_same(expr)))
    {
        return Ok(aliased.clone());
    }
    Err(ObjectError::not_found(
        "The specified column or Expression is not included in this view.",
        format!("{expr:?}"),
    )
    .into())
}

fn resolve_order(selected: &ExprSet, base_columns: &ExprSet, order: OrderSpec) -> Result<Expr> {
    match order {
        OrderSpec::Name(name) => {
            let (name, order) = if let Some(rest) = name.strip_prefix(b'-') {
                (rest, OrderType::Desc)
            } else if let Some(rest) = name.strip_prefix(b'+') {
                (rest, OrderType::Asc)
            } else {
                (name, OrderType::Asc)
            };
            Ok(lookup_name(selected, base_columns, &name)?.ordered(order))
        }
        OrderSpec::Expr(expr) => {
            require_name(&expr)?;
            Ok(if expr.order().is_some() { expr } else { expr.asc() })
        }
        OrderSpec::Typed(column, order) => {
            Ok(resolve_column(selected, base_columns, &column)?.ordered(order))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::obj;
    use crate::schema::column::{int, varchar};
    use crate::schema::table::TableInfo;
    use crate::value::SqlValue;

    fn table(name: &str, columns: &[ColumnBuilder]) -> View {
        View::new_table(TableInfo::detached(name), columns)
    }

    fn products() -> View {
        table(
            "products",
            &[int("id").primary_key(), int("category_id"), varchar("name", 128), int("price")],
        )
    }

    fn categories() -> View {
        table("categories", &[int("id").primary_key(), varchar("name", 64)])
    }

    fn stmt(view: &View) -> String {
        view.select_query().unwrap().stmt().to_string()
    }

    #[test]
    fn test_get_column_order() {
        let products = products();
        let id = products.get_column("id").unwrap();
        assert_eq!(id.as_column().unwrap().qualified_name(), "products.id");
        assert!(products.get_column("products.price").is_ok());
        let err = products.get_column("missing").unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::NotFound { .. })));
    }

    #[test]
    fn test_ambiguous_base_name() {
        let view = products()
            .inner_join(&categories(), Expr::none())
            .unwrap()
            .select_column(["category_id"])
            .unwrap();
        let err = view.get_column("id").unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::Ambiguous(_))));
    }

    #[test]
    fn test_to_column() {
        let products = products();
        let price = products.get_column("price").unwrap();
        let total = &price * 2;
        let view = products
            .add_column([(&total, "double_price")])
            .unwrap();
        assert!(view.contains(&price));
        assert_eq!(view.to_column(&total).unwrap().name().unwrap(), "double_price");
        assert!(!view.contains(obj("price")));
        assert!(!view.contains(&price + 1));
    }

    #[test]
    fn test_transformations_are_immutable() {
        let products = products();
        let before = stmt(&products);
        let filtered = products.where_eq("category_id", 1).unwrap();
        assert_ne!(filtered, products);
        assert_eq!(stmt(&products), before);
        assert!(products.where_expr().is_none());
        assert!(!filtered.where_expr().is_none());
    }

    #[test]
    fn test_empty_selection() {
        let err = products().select_column(Vec::<&str>::new()).unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::ArgValue(_))));
    }

    #[test]
    fn test_duplicate_output_name() {
        let err = products()
            .select_column([("id", "x"), ("price", "x")])
            .unwrap_err();
        assert!(matches!(
            err.as_object(),
            Some(ObjectError::NameAlreadyExists { .. })
        ));
    }

    #[test]
    fn test_unnamed_selection_rejected() {
        let products = products();
        let price = products.get_column("price").unwrap();
        let err = products.select_column([&price + 1]).unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::ArgType(_))));
    }

    #[test]
    fn test_order_by_name_prefix() {
        let view = products().order_by(["-price", "+name", "id"]).unwrap();
        let orders: Vec<_> = view.orders().iter().map(Expr::order).collect();
        assert_eq!(
            orders,
            [Some(OrderType::Desc), Some(OrderType::Asc), Some(OrderType::Asc)]
        );
    }

    #[test]
    fn test_slice() {
        let products = products();
        let view = products.slice(2..5).unwrap();
        assert_eq!(
            stmt(&view),
            "SELECT `products`.`id`, `products`.`category_id`, `products`.`name`, \
             `products`.`price` FROM `products` LIMIT ? OFFSET ?"
        );
        assert_eq!(
            view.select_query().unwrap().params().unwrap(),
            vec![SqlValue::Int(3), SqlValue::Int(2)]
        );
        assert!(products.slice(..10).unwrap().offset_value().is_none());
        #[allow(clippy::reversed_empty_ranges)]
        let reversed = products.slice(3..1);
        assert!(reversed.is_err());
    }

    #[test]
    fn test_slice_index_out_of_range() {
        let products = products();
        for view in [
            products.at(usize::MAX),
            products.slice(..=usize::MAX),
            products.slice((Bound::Excluded(usize::MAX), Bound::Unbounded)),
        ] {
            assert!(matches!(
                view.unwrap_err().as_object(),
                Some(ObjectError::ArgValue(_))
            ));
        }
        let last = products.at(usize::MAX - 1);
        assert!(matches!(
            last.unwrap_err().as_object(),
            Some(ObjectError::ArgValue(_))
        ));
    }

    #[test]
    fn test_join_aliases_collisions() {
        let view = products().inner_join(&categories(), Expr::none()).unwrap();
        let names: Vec<String> = view.selected_columns().keys().map(ToString::to_string).collect();
        assert_eq!(
            names,
            ["id", "category_id", "name", "price", "categories_id", "categories_name"]
        );
        assert_eq!(view.join_type(), Some(JoinType::Inner));
        assert_eq!(view.base_name(), "products");
    }

    #[test]
    fn test_join_same_table_rejected() {
        let products = products();
        let err = products.inner_join(&products, Expr::none()).unwrap_err();
        assert!(matches!(
            err.as_object(),
            Some(ObjectError::NameAlreadyExists { .. })
        ));
    }

    #[test]
    fn test_join_limited_view_rejected() {
        let limited = categories().limit(3).unwrap();
        let err = products().inner_join(&limited, Expr::none()).unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::ArgValue(_))));
        let err = limited.inner_join(&products(), Expr::none()).unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::ArgValue(_))));
    }

    #[test]
    fn test_subquery_columns() {
        let products = products();
        let price = products.get_column("price").unwrap();
        let sq = products
            .select_column([Selection::from("id"), Selection::from((price.max(), "top"))])
            .unwrap()
            .subquery("sq")
            .unwrap();
        let id = sq.get_column("id").unwrap();
        assert_eq!(id.as_column().unwrap().qualified_name(), "sq.id");
        assert_eq!(id.as_column().unwrap().sql_type(), SqlType::INT);
        let top = sq.get_column("top").unwrap();
        assert_eq!(top.as_column().unwrap().sql_type(), SqlType::Any);
        assert_eq!(sq.name().unwrap(), "sq");
    }

    #[test]
    fn test_detached_view_has_no_database() {
        let err = products().result().unwrap_err();
        assert!(matches!(err.as_object(), Some(ObjectError::NotSet(_))));
    }
}
