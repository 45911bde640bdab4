//! Named SQL functions.

use std::borrow::Cow;

use crate::error::{ObjectError, Result};
use crate::query::{QueryData, QueryLike};

use super::{Callee, Expr};

/// A SQL function rendered as `NAME(a, b, ...)`.
///
/// `arities` lists the accepted argument counts; an empty list accepts any
/// count. A function whose only accepted count is zero renders as its bare
/// name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Function {
    name: Cow<'static, str>,
    arities: Cow<'static, [usize]>,
}

/// `ABS(x)`
pub const ABS: Function = Function::builtin("ABS", &[1]);
/// `CEIL(x)`
pub const CEIL: Function = Function::builtin("CEIL", &[1]);
/// `FLOOR(x)`
pub const FLOOR: Function = Function::builtin("FLOOR", &[1]);
/// `ROUND(x)` or `ROUND(x, d)`
pub const ROUND: Function = Function::builtin("ROUND", &[1, 2]);
/// `TRUNCATE(x, d)`
pub const TRUNCATE: Function = Function::builtin("TRUNCATE", &[2]);
/// `AVG(x)`
pub const AVG: Function = Function::builtin("AVG", &[1]);
/// `COUNT(x)`
pub const COUNT: Function = Function::builtin("COUNT", &[1]);
/// `MAX(x)`
pub const MAX: Function = Function::builtin("MAX", &[1]);
/// `MIN(x)`
pub const MIN: Function = Function::builtin("MIN", &[1]);
/// `STDDEV(x)`
pub const STDDEV: Function = Function::builtin("STDDEV", &[1]);
/// `SUM(x)`
pub const SUM: Function = Function::builtin("SUM", &[1]);
/// `VARIANCE(x)`
pub const VARIANCE: Function = Function::builtin("VARIANCE", &[1]);

impl Function {
    const fn builtin(name: &'static str, arities: &'static [usize]) -> Self {
        Self {
            name: Cow::Borrowed(name),
            arities: Cow::Borrowed(arities),
        }
    }

    /// Declares a function accepting the given argument counts.
    pub fn new(name: impl Into<String>, arities: impl Into<Vec<usize>>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            arities: Cow::Owned(arities.into()),
        }
    }

    /// Declares a function accepting any number of arguments.
    pub fn variadic(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Declares a bare SQL token such as `CURRENT_TIMESTAMP`.
    pub fn keyword(name: impl Into<String>) -> Self {
        Self::new(name, vec![0])
    }

    /// Returns the function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if `n` arguments are accepted.
    #[must_use]
    pub fn accepts(&self, n: usize) -> bool {
        self.arities.is_empty() || self.arities.contains(&n)
    }

    fn is_bare(&self) -> bool {
        self.arities.as_ref() == [0]
    }

    /// Calls the function.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::ArgNum`] if the argument count matches no
    /// declared arity.
    pub fn call<I>(&self, args: I) -> Result<Expr>
    where
        I: IntoIterator<Item = Expr>,
    {
        let args: Vec<Expr> = args.into_iter().collect();
        if !self.accepts(args.len()) {
            return Err(ObjectError::ArgNum(format!(
                "{} takes {:?} argument(s), got {}",
                self.name,
                self.arities,
                args.len()
            ))
            .into());
        }
        Ok(Expr::call(Callee::Function(self.clone()), args))
    }

    pub(crate) fn render(&self, args: &[Expr], qd: &mut QueryData) -> Result<()> {
        if self.is_bare() {
            qd.append_keyword(&self.name)?;
            return Ok(());
        }
        qd.append_keyword(&format!("{}(", self.name))?;
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                qd.append_keyword(",")?;
            }
            arg.append_to(qd)?;
        }
        qd.append_keyword(")")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{obj, value};

    #[test]
    fn test_function_render() {
        let expr = ABS.call([obj("expr")]).unwrap();
        let qd = QueryData::build(&expr).unwrap();
        assert_eq!(qd.stmt(), "ABS(`expr`)");
        assert!(qd.params().unwrap().is_empty());

        let expr = ROUND.call([obj("price"), value(2)]).unwrap();
        assert_eq!(QueryData::build(&expr).unwrap().stmt(), "ROUND(`price`, ?)");
    }

    #[test]
    fn test_arity_check() {
        assert!(ROUND.call([obj("a"), value(1), value(2)]).is_err());
        assert!(TRUNCATE.call([obj("a")]).is_err());

        let concat = Function::variadic("CONCAT");
        assert!(concat.call([obj("a"), obj("b"), obj("c")]).is_ok());
    }

    #[test]
    fn test_bare_keyword_function() {
        let now = Function::keyword("CURRENT_TIMESTAMP");
        let expr = now.call([]).unwrap();
        assert_eq!(QueryData::build(&expr).unwrap().stmt(), "CURRENT_TIMESTAMP");
        assert!(now.call([obj("a")]).is_err());
    }
}
