//! SELECT assembly and the lazy compile/execute lifecycle.

use tracing::debug;

use crate::error::Result;
use crate::expr::Operator;
use crate::query::QueryData;
use crate::table_data::TableData;

use super::{View, ViewKind, ViewState};

impl View {
    /// Returns the compiled SELECT statement, compiling it on first access.
    ///
    /// Query arguments stay unresolved; see [`View::with_args`].
    ///
    /// # Errors
    ///
    /// Fails if an expression of the view cannot be rendered or two
    /// arguments conflict.
    pub fn select_query(&self) -> Result<QueryData> {
        let mut state = self.0.state.lock();
        if let ViewState::Compiled(query) | ViewState::Executed { query, .. } = &*state {
            return Ok(query.clone());
        }
        let query = self.compile_select()?;
        *state = ViewState::Compiled(query.clone());
        Ok(query)
    }

    /// Returns the rows of this view, running the query on first access.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NotSet`](crate::error::ObjectError::NotSet)
    /// without a database, an argument error for unresolved arguments and
    /// any driver error.
    pub fn result(&self) -> Result<TableData> {
        let mut state = self.0.state.lock();
        let query = match &*state {
            ViewState::Executed { result, .. } => return Ok(result.clone()),
            ViewState::Compiled(query) => query.clone(),
            ViewState::Built => {
                let query = self.compile_select()?;
                *state = ViewState::Compiled(query.clone());
                query
            }
        };
        let db = self.database()?;
        let result = db.query(&query)?;
        debug!(view = ?self, rows = result.len(), "view executed");
        *state = ViewState::Executed {
            query,
            result: result.clone(),
        };
        Ok(result)
    }

    /// Runs the query now so later [`View::result`] calls are served from
    /// memory.
    ///
    /// # Errors
    ///
    /// Same as [`View::result`].
    pub fn prepare_result(&self) -> Result<()> {
        self.result().map(drop)
    }

    /// Returns `true` once the result has been fetched.
    #[must_use]
    pub fn is_result_ready(&self) -> bool {
        matches!(&*self.0.state.lock(), ViewState::Executed { .. })
    }

    fn compile_select(&self) -> Result<QueryData> {
        let inner = &self.0;
        if let ViewKind::WithArgs { target, args } = &inner.kind {
            return target.select_query()?.call(args);
        }

        let mut qd = QueryData::new();
        qd.append_keyword("SELECT")?;
        for (i, expr) in inner.selected.iter().enumerate() {
            if i > 0 {
                qd.append_keyword(",")?;
            }
            expr.append_select_column(&mut qd)?;
        }

        qd.append_keyword("FROM")?;
        self.base().append_from(&mut qd)?;

        if !inner.where_expr.is_none() {
            qd.append_keyword("WHERE")?;
            qd.append(&inner.where_expr)?;
        }
        if !inner.groups.is_empty() {
            qd.append_keyword("GROUP BY")?;
            qd.append_joined(&inner.groups.to_vec(), ",")?;
        }
        if !inner.orders.is_empty() {
            qd.append_keyword("ORDER BY")?;
            for (i, expr) in inner.orders.iter().enumerate() {
                if i > 0 {
                    qd.append_keyword(",")?;
                }
                expr.append_ordered(&mut qd)?;
            }
        }
        if let Some(limit) = &inner.limit {
            qd.append_keyword("LIMIT")?;
            qd.append(limit)?;
        }
        if let Some(offset) = &inner.offset {
            qd.append_keyword("OFFSET")?;
            qd.append(offset)?;
        }
        Ok(qd)
    }

    fn append_from(&self, qd: &mut QueryData) -> Result<()> {
        match &self.0.kind {
            ViewKind::Table(info) => {
                qd.append_object_name(&info.name)?;
            }
            ViewKind::Subquery { name, target } => {
                qd.append_keyword("(")?;
                qd.append_query_data(&target.select_query()?)?;
                qd.append_keyword(")")?;
                qd.append_keyword("AS")?;
                qd.append_object_name(name)?;
            }
            ViewKind::Joined(join) => {
                qd.append_keyword("(")?;
                join.dest.base().append_from(qd)?;
                qd.append(join.join_type)?;
                qd.append_keyword("JOIN")?;
                join.joined.base().append_from(qd)?;
                // The joined view's own filter belongs to the ON condition.
                let on = Operator::And.binary(join.on.clone(), join.joined.0.where_expr.clone());
                if !on.is_none() {
                    qd.append_keyword("ON")?;
                    qd.append(&on)?;
                }
                qd.append_keyword(")")?;
            }
            ViewKind::Custom { base } => base.append_from(qd)?,
            ViewKind::WithArgs { target, .. } => target.append_from(qd)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::expr::{arg, Expr};
    use crate::query::ArgValues;
    use crate::schema::column::{int, varchar};
    use crate::schema::table::TableInfo;
    use crate::value::SqlValue;
    use crate::view::View;

    fn products() -> View {
        View::new_table(
            TableInfo::detached("products"),
            &[int("id").primary_key(), int("category_id"), varchar("name", 128), int("price")],
        )
    }

    fn categories() -> View {
        View::new_table(
            TableInfo::detached("categories"),
            &[int("id").primary_key(), varchar("name", 64)],
        )
    }

    #[test]
    fn test_join_from_fragment() {
        let (products, categories) = (products(), categories());
        let on = products
            .get_column("category_id")
            .unwrap()
            .eq(categories.get_column("id").unwrap());
        let view = products
            .inner_join(&categories.where_eq("id", 3).unwrap(), on)
            .unwrap()
            .select_column(["name", "categories_name"])
            .unwrap();
        let qd = view.select_query().unwrap();
        assert_eq!(
            qd.stmt(),
            "SELECT `products`.`name`, `categories`.`name` AS `categories_name` \
             FROM (`products` INNER JOIN `categories` \
             ON ((`products`.`category_id` = `categories`.`id`) AND (`categories`.`id` = ?)))"
        );
        assert_eq!(qd.params().unwrap(), vec![SqlValue::Int(3)]);
    }

    #[test]
    fn test_cross_join_has_no_on() {
        let view = products().cross_join(&categories()).unwrap();
        let stmt = view.select_query().unwrap().stmt().to_string();
        assert!(stmt.ends_with("FROM (`products` CROSS JOIN `categories`)"));
    }

    #[test]
    fn test_group_and_order() {
        let products = products();
        let price = products.get_column("price").unwrap();
        let view = products
            .select_column(["category_id"])
            .unwrap()
            .add_column([(price.sum(), "total")])
            .unwrap()
            .group_by(["category_id"])
            .unwrap()
            .order_by(["-total"])
            .unwrap();
        assert_eq!(
            view.select_query().unwrap().stmt(),
            "SELECT `products`.`category_id`, SUM(`products`.`price`) AS `total` \
             FROM `products` GROUP BY `products`.`category_id` \
             ORDER BY SUM(`products`.`price`) DESC"
        );
    }

    #[test]
    fn test_subquery_from() {
        let products = products();
        let inner = products.where_eq("category_id", 4).unwrap().subquery("kb").unwrap();
        let view = inner.where_clause(inner.get_column("price").unwrap().gt(5000)).unwrap();
        let qd = view.select_query().unwrap();
        assert_eq!(
            qd.stmt(),
            "SELECT `kb`.`id`, `kb`.`category_id`, `kb`.`name`, `kb`.`price` \
             FROM (SELECT `products`.`id`, `products`.`category_id`, `products`.`name`, \
             `products`.`price` FROM `products` WHERE (`products`.`category_id` = ?)) AS `kb` \
             WHERE (`kb`.`price` > ?)"
        );
        assert_eq!(
            qd.params().unwrap(),
            vec![SqlValue::Int(4), SqlValue::Int(5000)]
        );
    }

    #[test]
    fn test_with_args_resolves_statement() {
        let products = products();
        let view = products.where_eq("id", arg(0)).unwrap();
        let compiled = view.select_query().unwrap();
        assert!(compiled.has_args());
        assert!(compiled.params().unwrap_err().is_argument_error());

        let bound = view.with_args(ArgValues::new().arg(7));
        let qd = bound.select_query().unwrap();
        assert_eq!(qd.stmt(), compiled.stmt());
        assert_eq!(qd.params().unwrap(), vec![SqlValue::Int(7)]);

        assert!(view.with_args(ArgValues::new()).select_query().is_err());
        assert!(view
            .with_args(ArgValues::new().arg(1).arg(2))
            .select_query()
            .is_err());
    }

    #[test]
    fn test_derived_from_bound_view_keeps_args() {
        let products = products();
        let view = products
            .where_eq("id", arg(0))
            .unwrap()
            .with_args(ArgValues::new().arg(7))
            .limit(1)
            .unwrap();
        let qd = view.select_query().unwrap();
        assert!(qd.stmt().ends_with("WHERE (`products`.`id` = ?) LIMIT ?"));
        assert_eq!(qd.params().unwrap(), vec![SqlValue::Int(7), SqlValue::Int(1)]);
    }

    #[test]
    fn test_compiled_query_is_memoized() {
        let view = products().where_clause(Expr::none()).unwrap();
        let first = view.select_query().unwrap();
        let second = view.select_query().unwrap();
        assert_eq!(first, second);
        assert!(!view.is_result_ready());
    }
}
