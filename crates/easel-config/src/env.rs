use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;

/// `{{ env.VAR }}` with an optional `| default("fallback")` suffix
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*([a-zA-Z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#).expect("must be valid regex")
});

/// Failure while expanding placeholders in the raw config text
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExpandError {
    /// Referenced variable is unset and has no default
    #[error("environment variable not found: `{0}`")]
    MissingVariable(String),

    /// Placeholder is not of the form `env.NAME`
    #[error("only variables scoped with 'env.' are supported: `{0}`")]
    UnsupportedScope(String),
}

/// Expand `{{ env.VAR }}` placeholders in raw TOML text
///
/// Runs before deserialization so config structs hold plain
/// `String`/`SecretString` values. Comment lines are copied through
/// untouched, which lets a commented-out secret reference an unset variable.
pub fn expand_env(input: &str) -> Result<String, ExpandError> {
    let mut output = String::with_capacity(input.len());

    for line in input.split_inclusive('\n') {
        if line.trim_start().starts_with('#') {
            output.push_str(line);
        } else {
            output.push_str(&expand_line(line)?);
        }
    }

    Ok(output)
}

fn expand_line(line: &str) -> Result<Cow<'_, str>, ExpandError> {
    if !PLACEHOLDER.is_match(line) {
        return Ok(Cow::Borrowed(line));
    }

    let mut expanded = String::with_capacity(line.len());
    let mut cursor = 0;

    for captures in PLACEHOLDER.captures_iter(line) {
        let Some(whole) = captures.get(0) else {
            continue;
        };

        expanded.push_str(&line[cursor..whole.start()]);
        expanded.push_str(&lookup(&captures[1], captures.get(2).map(|m| m.as_str()))?);
        cursor = whole.end();
    }

    expanded.push_str(&line[cursor..]);

    Ok(Cow::Owned(expanded))
}

fn lookup(key: &str, default: Option<&str>) -> Result<String, ExpandError> {
    let name = key
        .strip_prefix("env.")
        .filter(|name| !name.is_empty() && !name.contains('.'))
        .ok_or_else(|| ExpandError::UnsupportedScope(key.to_owned()))?;

    std::env::var(name).or_else(|_| {
        default
            .map(str::to_owned)
            .ok_or_else(|| ExpandError::MissingVariable(name.to_owned()))
    })
}
