//! Resource template compilation
//!
//! Turns a URI template such as `/users/{owner:\w+}/tokens/{[0-9]+}` into an
//! anchored regex. Text outside braces is regex source as written. A
//! `{owner:<fragment>}` segment becomes the owner capture; any other
//! `{<fragment>}` becomes a plain capture group.

use crate::error::ConfigError;
use regex::Regex;
use std::str::Chars;

/// Prefix marking the owner segment inside braces
const OWNER_PREFIX: &str = "owner:";

/// Name of the regex group holding the owner
const OWNER_GROUP: &str = "owner";

/// Compiled resource template
#[derive(Debug, Clone)]
pub struct UriPattern {
    template: String,
    regex: Regex,
    has_owner: bool,
}

/// Successful match of a request path against a [`UriPattern`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathMatch<'p> {
    owner: Option<&'p str>,
}

impl<'p> PathMatch<'p> {
    /// Owner captured from the path, if the template declares one and it matched
    /// a non-empty segment
    pub fn owner(&self) -> Option<&'p str> {
        self.owner
    }
}

impl UriPattern {
    /// Compile a resource template
    pub fn compile(template: &str) -> Result<Self, ConfigError> {
        let (source, has_owner) = translate(template)?;

        let regex = Regex::new(&source).map_err(|e| ConfigError::InvalidPattern {
            pattern: source.clone(),
            reason: format!("in resource '{}': {}", template, e),
        })?;

        Ok(Self {
            template: template.to_string(),
            regex,
            has_owner,
        })
    }

    /// Match a request path, extracting the owner on success
    pub fn matches<'p>(&self, path: &'p str) -> Option<PathMatch<'p>> {
        let captures = self.regex.captures(path)?;
        let owner = captures
            .name(OWNER_GROUP)
            .map(|m| m.as_str())
            .filter(|owner| !owner.is_empty());

        Some(PathMatch { owner })
    }

    /// Template this pattern was compiled from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Regex source generated for the template
    pub fn as_regex_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether the template declares an `{owner:...}` segment
    pub fn has_owner_capture(&self) -> bool {
        self.has_owner
    }
}

/// Translate a template into anchored regex source
///
/// The whole template is wrapped in a non-capturing group so a top-level
/// `|` cannot escape the anchors.
fn translate(template: &str) -> Result<(String, bool), ConfigError> {
    let mut source = String::with_capacity(template.len() + 16);
    let mut has_owner = false;
    let mut chars = template.chars();

    source.push_str("^(?:");
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                source.push(c);
                if let Some(escaped) = chars.next() {
                    source.push(escaped);
                }
            }
            '{' => {
                let fragment = read_fragment(template, &mut chars)?;

                if let Some(inner) = fragment.strip_prefix(OWNER_PREFIX) {
                    if has_owner {
                        return Err(ConfigError::template(
                            template,
                            "more than one owner capture",
                        ));
                    }
                    if inner.is_empty() {
                        return Err(ConfigError::template(template, "empty owner capture"));
                    }
                    has_owner = true;
                    source.push_str("(?P<");
                    source.push_str(OWNER_GROUP);
                    source.push('>');
                    source.push_str(inner);
                    source.push(')');
                } else {
                    if fragment.is_empty() {
                        return Err(ConfigError::template(template, "empty capture '{}'"));
                    }
                    source.push('(');
                    source.push_str(&fragment);
                    source.push(')');
                }
            }
            '}' => {
                return Err(ConfigError::template(
                    template,
                    "unbalanced braces: unexpected '}'",
                ));
            }
            _ => source.push(c),
        }
    }
    source.push_str(")$");

    Ok((source, has_owner))
}

/// Read a brace segment up to its matching `}` (the opening `{` is consumed)
///
/// Nested braces (regex quantifiers like `\d{3}`) stay inside the fragment.
fn read_fragment(template: &str, chars: &mut Chars<'_>) -> Result<String, ConfigError> {
    let mut fragment = String::new();
    let mut depth = 1usize;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                fragment.push(c);
                match chars.next() {
                    Some(escaped) => fragment.push(escaped),
                    None => break,
                }
            }
            '{' => {
                depth += 1;
                fragment.push(c);
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(fragment);
                }
                fragment.push(c);
            }
            _ => fragment.push(c),
        }
    }

    Err(ConfigError::template(
        template,
        "unbalanced braces: missing '}'",
    ))
}
