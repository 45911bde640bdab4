//! SQL operators.
//!
//! Every operator is a variant of [`Operator`]. Its [`Shape`] decides how many
//! operands it takes and how a call renders.

use crate::error::{ObjectError, Result};
use crate::query::{QueryData, QueryLike};

use super::{Callee, Expr, ExprKind};

/// Rendering rule of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `<sym> <a>`
    Unary,
    /// `(<a> <sym> <b> [<sym> <c> ...])`
    Binary,
    /// `(<a> IN (<b>, <c>, ...))`
    In,
    /// `(<a> BETWEEN <b> AND <c>)`
    Between,
    /// `(CASE WHEN <c> THEN <t> [ELSE <e>] END)`
    Case,
}

/// SQL operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // Unary
    /// `- a`
    Minus,
    /// `~ a`
    BitInv,
    /// `! a`
    NotOp,
    /// `NOT a`
    Not,
    /// `BINARY a`
    Binary,

    // Arithmetic
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    ModOp,
    /// `MOD`
    Mod,
    /// `DIV`
    IntDiv,

    // Bitwise
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `<<`
    LShift,
    /// `>>`
    RShift,

    // Logical
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `XOR`
    Xor,
    /// `&&`
    AndOp,
    /// `||`
    OrOp,

    // Comparison
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<>`
    LtGt,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<=>`
    NullEq,
    /// `IS`
    Is,
    /// `IS NOT`
    IsNot,

    // Pattern matching and collation
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `RLIKE`
    RLike,
    /// `REGEXP`
    Regexp,
    /// `SOUNDS LIKE`
    SoundsLike,
    /// `COLLATE`
    Collate,

    // JSON
    /// `->`
    JsonExtract,
    /// `->>`
    JsonUnquote,
    /// `MEMBER OF`
    MemberOf,

    // Special forms
    /// `IN`
    In,
    /// `BETWEEN ... AND ...`
    Between,
    /// `CASE WHEN ... THEN ... ELSE ... END`
    Case,
}

impl Operator {
    /// Returns the SQL symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Minus | Self::Sub => "-",
            Self::BitInv => "~",
            Self::NotOp => "!",
            Self::Not => "NOT",
            Self::Binary => "BINARY",
            Self::Add => "+",
            Self::Mul => "*",
            Self::Div => "/",
            Self::ModOp => "%",
            Self::Mod => "MOD",
            Self::IntDiv => "DIV",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::LShift => "<<",
            Self::RShift => ">>",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::AndOp => "&&",
            Self::OrOp => "||",
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::LtGt => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::NullEq => "<=>",
            Self::Is => "IS",
            Self::IsNot => "IS NOT",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::RLike => "RLIKE",
            Self::Regexp => "REGEXP",
            Self::SoundsLike => "SOUNDS LIKE",
            Self::Collate => "COLLATE",
            Self::JsonExtract => "->",
            Self::JsonUnquote => "->>",
            Self::MemberOf => "MEMBER OF",
            Self::In => "IN",
            Self::Between => "BETWEEN",
            Self::Case => "CASE",
        }
    }

    /// Returns the rendering rule.
    #[must_use]
    pub const fn shape(self) -> Shape {
        match self {
            Self::Minus | Self::BitInv | Self::NotOp | Self::Not | Self::Binary => Shape::Unary,
            Self::In => Shape::In,
            Self::Between => Shape::Between,
            Self::Case => Shape::Case,
            _ => Shape::Binary,
        }
    }

    /// Applies the operator to `operands`.
    ///
    /// Binary operators drop [`Expr::none`] operands: with none left the
    /// result is `None`, with one left it is that operand. A left operand
    /// that is already a call of the same operator is flattened into the
    /// new call.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::ArgNum`] when the operand count does not fit
    /// the operator's shape.
    pub fn call<I>(self, operands: I) -> Result<Expr>
    where
        I: IntoIterator<Item = Expr>,
    {
        let operands: Vec<Expr> = operands.into_iter().collect();
        let n = operands.len();
        let ok = match self.shape() {
            Shape::Binary => return Ok(self.fold(operands)),
            Shape::Unary => n == 1,
            Shape::In => n >= 2,
            Shape::Between => n == 3,
            Shape::Case => n == 2 || n == 3,
        };
        if !ok {
            return Err(ObjectError::ArgNum(format!(
                "`{}` does not accept {n} operand(s)",
                self.symbol()
            ))
            .into());
        }
        Ok(Expr::call(Callee::Operator(self), operands))
    }

    /// Builds a binary call. Never fails for binary-shaped operators.
    pub(crate) fn binary(self, lhs: Expr, rhs: Expr) -> Expr {
        self.fold(vec![lhs, rhs])
    }

    /// Builds a unary call.
    pub(crate) fn unary(self, operand: Expr) -> Expr {
        Expr::call(Callee::Operator(self), vec![operand])
    }

    fn fold(self, operands: Vec<Expr>) -> Expr {
        let mut operands: Vec<Expr> = operands.into_iter().filter(|e| !e.is_none()).collect();
        match operands.len() {
            0 => return Expr::none(),
            1 => return operands.remove(0),
            _ => {}
        }
        let head = operands.remove(0);
        let mut flat = match head.kind() {
            ExprKind::Call {
                callee: Callee::Operator(op),
                args,
            } if *op == self => args.clone(),
            _ => vec![head],
        };
        flat.extend(operands);
        Expr::call(Callee::Operator(self), flat)
    }

    pub(crate) fn render(self, args: &[Expr], qd: &mut QueryData) -> Result<()> {
        match self.shape() {
            Shape::Unary => {
                qd.append_keyword(self.symbol())?;
                append_separated(args, None, qd)
            }
            Shape::Binary => {
                qd.append_keyword("(")?;
                append_separated(args, Some(self.symbol()), qd)?;
                qd.append_keyword(")")?;
                Ok(())
            }
            Shape::In => {
                let (lhs, rest) = args.split_first().ok_or_else(|| {
                    ObjectError::ArgNum(String::from("IN called without operands"))
                })?;
                qd.append_keyword("(")?;
                lhs.append_to(qd)?;
                qd.append_keyword("IN (")?;
                append_separated(rest, Some(","), qd)?;
                qd.append_keyword("))")?;
                Ok(())
            }
            Shape::Between => {
                let [expr, low, high] = args else {
                    return Err(ObjectError::ArgNum(String::from(
                        "BETWEEN needs exactly three operands",
                    ))
                    .into());
                };
                qd.append_keyword("(")?;
                expr.append_to(qd)?;
                qd.append_keyword("BETWEEN")?;
                low.append_to(qd)?;
                qd.append_keyword("AND")?;
                high.append_to(qd)?;
                qd.append_keyword(")")?;
                Ok(())
            }
            Shape::Case => render_case(args, qd),
        }
    }
}

fn render_case(args: &[Expr], qd: &mut QueryData) -> Result<()> {
    let [cond, then, rest @ ..] = args else {
        return Err(ObjectError::ArgNum(String::from("CASE needs a condition and a result")).into());
    };
    qd.append_keyword("(CASE WHEN")?;
    cond.append_to(qd)?;
    qd.append_keyword("THEN")?;
    then.append_to(qd)?;
    if let Some(otherwise) = rest.first() {
        qd.append_keyword("ELSE")?;
        otherwise.append_to(qd)?;
    }
    qd.append_keyword("END)")?;
    Ok(())
}

fn append_separated(args: &[Expr], sep: Option<&str>, qd: &mut QueryData) -> Result<()> {
    for (i, expr) in args.iter().enumerate() {
        if let (true, Some(sep)) = (i > 0, sep) {
            qd.append_keyword(sep)?;
        }
        expr.append_to(qd)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{obj, value};
    use crate::value::SqlValue;

    fn render(expr: &Expr) -> (String, Vec<SqlValue>) {
        let qd = QueryData::build(expr).unwrap();
        (qd.stmt().to_string(), qd.params().unwrap())
    }

    #[test]
    fn test_binary_render() {
        let (stmt, params) = render(&Operator::Eq.binary(obj("expr"), value(SqlValue::Null)));
        assert_eq!(stmt, "(`expr` = ?)");
        assert_eq!(params, vec![SqlValue::Null]);
    }

    #[test]
    fn test_chain_collapse() {
        let (a, b, c) = (obj("a"), obj("b"), obj("c"));
        let nested = Operator::Add.binary(Operator::Add.binary(a.clone(), b.clone()), c.clone());
        let flat = Operator::Add.call([a, b, c]).unwrap();
        assert_eq!(render(&nested).0, "(`a` + `b` + `c`)");
        assert_eq!(render(&nested), render(&flat));
    }

    #[test]
    fn test_right_operand_not_collapsed() {
        let (a, b, c) = (obj("a"), obj("b"), obj("c"));
        let expr = Operator::Sub.binary(a, Operator::Sub.binary(b, c));
        assert_eq!(render(&expr).0, "(`a` - (`b` - `c`))");
    }

    #[test]
    fn test_identity_element() {
        let x = obj("x");
        assert!(Operator::And.call([]).unwrap().is_none());
        assert!(Operator::And.call([x.clone()]).unwrap().is_same(&x));
        assert!(Operator::And.binary(x.clone(), Expr::none()).is_same(&x));
        assert!(Operator::Or.binary(Expr::none(), x.clone()).is_same(&x));
        assert!(Operator::Mul.binary(Expr::none(), Expr::none()).is_none());
    }

    #[test]
    fn test_special_forms() {
        let a = obj("a");
        let expr = Operator::In
            .call([a.clone(), value(1), value(2)])
            .unwrap();
        assert_eq!(render(&expr).0, "(`a` IN (?, ?))");

        let expr = Operator::Between
            .call([a.clone(), value(1), value(9)])
            .unwrap();
        assert_eq!(render(&expr).0, "(`a` BETWEEN ? AND ?)");

        let expr = Operator::Case
            .call([a.clone(), value("y"), value("n")])
            .unwrap();
        assert_eq!(render(&expr).0, "(CASE WHEN `a` THEN ? ELSE ? END)");

        let expr = Operator::Minus.call([a]).unwrap();
        assert_eq!(render(&expr).0, "- `a`");
    }

    #[test]
    fn test_arity_errors() {
        let a = obj("a");
        assert!(Operator::Between.call([a.clone(), value(1)]).is_err());
        assert!(Operator::In.call([a.clone()]).is_err());
        assert!(Operator::Not.call([a.clone(), a.clone()]).is_err());
        assert!(Operator::Case.call([a]).is_err());
    }
}
