//! Translation of a practical XPath subset into CSS selectors.
//!
//! Supported:
//!
//! | XPath | CSS |
//! |---|---|
//! | `//a` | `a` (descendant) |
//! | `/a/b` | `a > b` (child) |
//! | `*` | `*` |
//! | `[@id='x']` | `[id="x"]` |
//! | `[@href]` | `[href]` |
//! | `[contains(@class,'x')]` | `[class*="x"]` |
//! | `[starts-with(@a,'x')]` | `[a^="x"]` |
//! | `a[2]` / `a[last()]` | `a:nth-of-type(2)` / `a:last-of-type` |
//! | `*[2]` / `*[last()]` | `*:nth-child(2)` / `*:last-child` |
//! | `[p and q]` | both predicates |
//!
//! Expressions that do not start with `/`, `.` or `(` are taken to be CSS
//! already and are returned unchanged. Text and attribute steps (`text()`,
//! `/@href`), axes and unions are rejected.

/// Translate `expression` into a CSS selector string.
pub fn to_css(expression: &str) -> Result<String, String> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Err("empty expression".into());
    }
    if !expression.starts_with(['/', '.', '(']) {
        return Ok(expression.to_string());
    }
    if expression.starts_with('(') {
        return Err("grouped expressions are not supported".into());
    }
    if expression.contains('|') {
        return Err("unions are not supported".into());
    }

    let mut rest = expression.strip_prefix('.').unwrap_or(expression);
    let mut css = String::new();

    while !rest.is_empty() {
        let combinator = if let Some(r) = rest.strip_prefix("//") {
            rest = r;
            " "
        } else if let Some(r) = rest.strip_prefix('/') {
            rest = r;
            " > "
        } else if css.is_empty() {
            ""
        } else {
            return Err(format!("unexpected input at '{rest}'"));
        };
        if !css.is_empty() {
            css.push_str(combinator);
        }

        let (step, tail) = split_step(rest)?;
        css.push_str(&translate_step(step)?);
        rest = tail;
    }

    if css.is_empty() {
        return Err(format!("'{expression}' selects no elements"));
    }
    Ok(css)
}

/// Split off one location step: a node test plus its predicates.
fn split_step(input: &str) -> Result<(&str, &str), String> {
    let mut depth = 0usize;
    let mut quote = None;

    for (i, c) in input.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| format!("unbalanced ']' in '{input}'"))?;
            }
            (None, '/') if depth == 0 => return Ok((&input[..i], &input[i..])),
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return Err(format!("unterminated predicate in '{input}'"));
    }
    Ok((input, ""))
}

fn translate_step(step: &str) -> Result<String, String> {
    let (test, predicates) = match step.find('[') {
        Some(i) => (&step[..i], &step[i..]),
        None => (step, ""),
    };

    let test = test.trim();
    if test.starts_with('@') {
        return Err(format!("attribute step '{test}' does not select elements"));
    }
    if test == "text()" || test == "node()" {
        return Err(format!("'{test}' does not select elements"));
    }
    if test.contains("::") {
        return Err(format!("axis '{test}' is not supported"));
    }
    if test.is_empty() || !test.chars().all(|c| c.is_alphanumeric() || "-_*:".contains(c)) {
        return Err(format!("invalid node test '{test}'"));
    }

    let mut css = test.to_string();
    let any_element = test == "*";
    for predicate in predicates_of(predicates)? {
        for term in predicate.split(" and ") {
            css.push_str(&translate_predicate(term.trim(), any_element)?);
        }
    }
    Ok(css)
}

/// Bodies of consecutive `[...]` groups.
fn predicates_of(input: &str) -> Result<Vec<&str>, String> {
    let mut out = Vec::new();
    let mut rest = input;
    while let Some(body) = rest.strip_prefix('[') {
        let mut quote = None;
        let mut end = None;
        for (i, c) in body.char_indices() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '\'' | '"') => quote = Some(c),
                (None, ']') => {
                    end = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let end = end.ok_or_else(|| format!("unterminated predicate '{rest}'"))?;
        out.push(&body[..end]);
        rest = &body[end + 1..];
    }
    if !rest.is_empty() {
        return Err(format!("unexpected input after predicates: '{rest}'"));
    }
    Ok(out)
}

/// Positions count among same-named siblings, or among all element
/// siblings when the node test is `*`.
fn translate_predicate(term: &str, any_element: bool) -> Result<String, String> {
    if let Ok(position) = term.parse::<u32>() {
        return Ok(if any_element {
            format!(":nth-child({position})")
        } else {
            format!(":nth-of-type({position})")
        });
    }
    if term == "last()" {
        let pseudo = if any_element { ":last-child" } else { ":last-of-type" };
        return Ok(pseudo.into());
    }
    if let Some(args) = function_args(term, "contains") {
        let (attr, value) = attribute_and_literal(args)?;
        return Ok(format!("[{attr}*=\"{value}\"]"));
    }
    if let Some(args) = function_args(term, "starts-with") {
        let (attr, value) = attribute_and_literal(args)?;
        return Ok(format!("[{attr}^=\"{value}\"]"));
    }
    if let Some(attr) = term.strip_prefix('@') {
        return match attr.split_once('=') {
            Some((name, literal)) => Ok(format!(
                "[{}=\"{}\"]",
                attribute_name(name)?,
                string_literal(literal)?
            )),
            None => Ok(format!("[{}]", attribute_name(attr)?)),
        };
    }
    Err(format!("unsupported predicate '[{term}]'"))
}

fn function_args<'a>(term: &'a str, name: &str) -> Option<&'a str> {
    term.strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn attribute_and_literal(args: &str) -> Result<(&str, &str), String> {
    let (attr, literal) = args
        .split_once(',')
        .ok_or_else(|| format!("expected two arguments in '{args}'"))?;
    let attr = attr
        .trim()
        .strip_prefix('@')
        .ok_or_else(|| format!("only attribute arguments are supported, got '{}'", attr.trim()))?;
    Ok((attribute_name(attr)?, string_literal(literal)?))
}

fn attribute_name(name: &str) -> Result<&str, String> {
    let name = name.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || "-_:".contains(c)) {
        return Err(format!("invalid attribute name '{name}'"));
    }
    Ok(name)
}

fn string_literal(literal: &str) -> Result<&str, String> {
    let literal = literal.trim();
    let unquoted = literal
        .strip_prefix('\'')
        .and_then(|l| l.strip_suffix('\''))
        .or_else(|| literal.strip_prefix('"').and_then(|l| l.strip_suffix('"')))
        .ok_or_else(|| format!("expected a quoted string, got '{literal}'"))?;
    if unquoted.contains('"') {
        return Err(format!("double quotes inside '{literal}' are not supported"));
    }
    Ok(unquoted)
}
