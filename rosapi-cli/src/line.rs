//! Turns typed words into a request.
//!
//! `COMMAND [name=value ...] [where name[=value] ...]`

use anyhow::{Result, bail};
use rosapi::Request;

/// Builds a request from whitespace-separated tokens.
///
/// Tokens after the command are attributes until `where` (any case);
/// after it they are queries, where a bare `name` is allowed.
pub fn parse_command<S: AsRef<str>>(tokens: &[S]) -> Result<Request> {
    let Some((command, rest)) = tokens.split_first() else {
        bail!("missing command");
    };
    let mut req = Request::new(command.as_ref())?;
    let mut in_where = false;
    for token in rest.iter().map(AsRef::as_ref) {
        if token.eq_ignore_ascii_case("where") {
            in_where = true;
            continue;
        }
        req = match (token.split_once('='), in_where) {
            (Some((name, value)), false) if !name.is_empty() => req.attribute(name, value),
            (Some((name, value)), true) if !name.is_empty() => {
                req.query(name, Some(value.to_owned()))
            }
            (None, true) if !token.is_empty() => req.query(token, None),
            _ => bail!("invalid argument {token:?}; expected name=value"),
        };
    }
    Ok(req)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_only() {
        let req = parse_command(&["/system/resource/print"]).unwrap();
        assert_eq!(req.words(), ["/system/resource/print"]);
    }

    #[test]
    fn attributes_then_queries() {
        let req = parse_command(&[
            "/interface/set",
            "disabled=yes",
            "comment=a=b",
            "WHERE",
            "name=ether1",
            "dynamic",
        ])
        .unwrap();
        assert_eq!(
            req.words(),
            [
                "/interface/set",
                "=comment=a=b",
                "=disabled=yes",
                "?name=ether1",
                "?dynamic",
            ]
        );
    }

    #[test]
    fn empty_value_is_allowed() {
        let req = parse_command(&["/ip/address/print", "count-only="]).unwrap();
        assert_eq!(req.words()[1], "=count-only=");
    }

    #[test]
    fn rejects_bare_attribute() {
        let err = parse_command(&["/interface/print", "detail"]).unwrap_err();
        assert!(err.to_string().contains("invalid argument"));
        assert!(parse_command(&["/interface/print", "=x"]).is_err());
    }

    #[test]
    fn rejects_missing_or_relative_command() {
        assert!(parse_command::<&str>(&[]).is_err());
        assert!(parse_command(&["interface/print"]).is_err());
    }
}
