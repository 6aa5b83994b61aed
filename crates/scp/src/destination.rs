//! `[user@]host[:path]` destination strings.

use std::fmt;

/// A parsed remote destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Login preceding the first `@`, if any.
    pub login: Option<String>,
    /// Host between the login and the first `:`.
    pub host: String,
    /// Remote path; `.` when the string carries none.
    pub path: String,
}

impl Destination {
    /// Parses a destination of the form `[user@]host[:path]`.
    ///
    /// Deliberately forgiving: only the first `@` and the first `:` are
    /// separators, so later colons stay in the path. An empty path portion
    /// defaults to `.`.
    pub fn parse(s: &str) -> Self {
        let (login, rest) = match s.split_once('@') {
            Some((login, rest)) => (Some(login.to_string()), rest),
            None => (None, s),
        };
        let (host, path) = match rest.split_once(':') {
            Some((host, path)) => (host, path),
            None => (rest, ""),
        };
        let path = if path.is_empty() { "." } else { path };
        Self {
            login,
            host: host.to_string(),
            path: path.to_string(),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(login) = &self.login {
            write!(f, "{login}@")?;
        }
        write!(f, "{}:{}", self.host, self.path)
    }
}
