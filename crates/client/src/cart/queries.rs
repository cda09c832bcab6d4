//! Typed stored-procedure queries for the generic query endpoint.
//!
//! The backend executes whatever call string it receives, and a wrong
//! argument count or order comes back as an empty result rather than an
//! error. Each logical query is therefore a struct with named fields, and
//! [`render_query`] is the only place that turns one into the positional
//! string.

use cartsync_core::CartIdentity;

use super::error::CartError;

/// A positional argument to a stored procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryArg {
    /// Quoted string literal.
    Text(String),
    /// Bare integer literal.
    Int(i64),
}

impl QueryArg {
    fn render(&self, out: &mut String) {
        match self {
            Self::Text(s) => {
                out.push('\'');
                out.push_str(&s.replace('\'', "''"));
                out.push('\'');
            }
            Self::Int(n) => out.push_str(&n.to_string()),
        }
    }
}

impl From<&str> for QueryArg {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for QueryArg {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// A stored-procedure call with a fixed positional signature.
pub trait StoredProcedure {
    /// Procedure name as known to the backend.
    fn procedure(&self) -> &str;

    /// Arguments in the exact order the procedure declares them.
    fn arguments(&self) -> Vec<QueryArg>;
}

/// Render a query as `EXEC <procedure> <arg>,<arg>,...`.
///
/// # Errors
///
/// Returns `CartError::PreconditionFailed` if the procedure name is empty or
/// contains characters other than ASCII letters, digits, `_` and `.`.
pub fn render_query<Q: StoredProcedure + ?Sized>(query: &Q) -> Result<String, CartError> {
    let name = query.procedure();
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(CartError::PreconditionFailed(format!(
            "invalid stored procedure name: {name:?}"
        )));
    }

    let mut out = format!("EXEC {name}");
    for (i, arg) in query.arguments().iter().enumerate() {
        out.push_str(if i == 0 { " " } else { "," });
        arg.render(&mut out);
    }
    Ok(out)
}

/// Lists the cart lines held for one identity.
///
/// Positional signature: company, location, user id, unique id.
#[derive(Debug, Clone)]
pub struct CartQuery<'a> {
    pub procedure: &'a str,
    pub company: &'a str,
    pub location: &'a str,
    pub identity: &'a CartIdentity,
}

impl StoredProcedure for CartQuery<'_> {
    fn procedure(&self) -> &str {
        self.procedure
    }

    fn arguments(&self) -> Vec<QueryArg> {
        vec![
            self.company.into(),
            self.location.into(),
            self.identity.user_id_field().into(),
            self.identity.unique_id_field().into(),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cartsync_core::{UniqueId, UserId};

    use super::*;

    struct Raw(&'static str, Vec<QueryArg>);

    impl StoredProcedure for Raw {
        fn procedure(&self) -> &str {
            self.0
        }

        fn arguments(&self) -> Vec<QueryArg> {
            self.1.clone()
        }
    }

    #[test]
    fn test_render_cart_query_anonymous() {
        let identity = CartIdentity::from(UniqueId::parse("guest-1").unwrap());
        let query = CartQuery {
            procedure: "GetCartDetails",
            company: "1",
            location: "2",
            identity: &identity,
        };
        assert_eq!(
            render_query(&query).unwrap(),
            "EXEC GetCartDetails '1','2','','guest-1'"
        );
    }

    #[test]
    fn test_render_cart_query_user() {
        let identity = CartIdentity::from(UserId::parse("1007").unwrap());
        let query = CartQuery {
            procedure: "dbo.GetCartDetails",
            company: "1",
            location: "1",
            identity: &identity,
        };
        assert_eq!(
            render_query(&query).unwrap(),
            "EXEC dbo.GetCartDetails '1','1','1007',''"
        );
    }

    #[test]
    fn test_render_escapes_quotes() {
        let query = Raw("Search", vec!["o'brien".into(), 5.into()]);
        assert_eq!(render_query(&query).unwrap(), "EXEC Search 'o''brien',5");
    }

    #[test]
    fn test_render_no_arguments() {
        let query = Raw("ListBanners", vec![]);
        assert_eq!(render_query(&query).unwrap(), "EXEC ListBanners");
    }

    #[test]
    fn test_render_rejects_bad_procedure_names() {
        for name in ["", "Get Cart", "x;DROP TABLE", "a'b"] {
            let err = render_query(&Raw(name, vec![])).unwrap_err();
            assert!(matches!(err, CartError::PreconditionFailed(_)), "{name}");
        }
    }
}
