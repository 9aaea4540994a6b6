use crate::ast::{
    AttrValue, Attribute, BinaryOp, ComponentDecl, Expr, FuncName, Instrument, LetDecl, RunDecl,
};
use crate::diagnostics::Span;
use thiserror::Error;

/// Parse error with optional span information
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{message}")]
    SyntaxError {
        message: String,
        span: Option<Span>,
    },
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Option<Span>) -> Self {
        Self::SyntaxError {
            message: message.into(),
            span,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::SyntaxError {
            message: message.into(),
            span: None,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            Self::SyntaxError { span, .. } => *span,
        }
    }
}

/// Helper to track byte offsets while parsing
struct ParseContext {
    line_offsets: Vec<usize>, // Byte offset of start of each line
    len: usize,
}

impl ParseContext {
    fn new(source: &str) -> Self {
        let mut line_offsets = vec![0];
        let mut offset = 0;
        for ch in source.chars() {
            offset += ch.len_utf8();
            if ch == '\n' {
                line_offsets.push(offset);
            }
        }
        Self {
            line_offsets,
            len: source.len(),
        }
    }

    /// Get byte offset for start of line (0-indexed)
    fn line_start(&self, line: usize) -> usize {
        self.line_offsets.get(line).copied().unwrap_or(self.len)
    }

    /// Create a span for the entire line
    fn full_line_span(&self, line: usize) -> Span {
        Span::new(self.line_start(line), self.line_start(line + 1))
    }
}

/// Parse an instrument description
pub fn parse_instrument(source: &str) -> Result<Instrument, ParseError> {
    let ctx = ParseContext::new(source);
    let mut instrument = Instrument::default();

    for (i, raw) in source.lines().enumerate() {
        let line = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        }
        .trim();
        if line.is_empty() {
            continue;
        }
        let span = Some(ctx.full_line_span(i));

        if line.starts_with("let ") {
            instrument.lets.push(parse_let(line, span)?);
        } else if line == "run" || line.starts_with("run ") {
            instrument.runs.push(parse_run(line, span)?);
        } else {
            instrument.components.push(parse_component(line, span)?);
        }
    }

    Ok(instrument)
}

fn parse_let(line: &str, span: Option<Span>) -> Result<LetDecl, ParseError> {
    let rest = line
        .strip_prefix("let ")
        .ok_or_else(|| ParseError::new("Expected 'let' keyword", span))?;

    let eq_pos = rest.find('=').ok_or_else(|| {
        ParseError::new(format!("Expected '=' in let declaration: {}", line), span)
    })?;

    let name = rest[..eq_pos].trim().to_string();
    if !is_valid_identifier(&name) {
        return Err(ParseError::new(
            format!("Invalid variable name '{}' in let declaration", name),
            span,
        ));
    }

    let expr = parse_expr(&rest[eq_pos + 1..], span)?;
    Ok(LetDecl { name, expr, span })
}

fn parse_run(line: &str, span: Option<Span>) -> Result<RunDecl, ParseError> {
    let rest = line.strip_prefix("run").unwrap_or_default();
    Ok(RunDecl {
        attributes: parse_attributes(rest, span)?,
        span,
    })
}

fn parse_component(line: &str, span: Option<Span>) -> Result<ComponentDecl, ParseError> {
    let (kind, rest) = split_word(line);
    if !is_valid_identifier(kind) {
        return Err(ParseError::new(
            format!("Expected a component kind at start of line: {}", line),
            span,
        ));
    }

    let (name, rest) = split_word(rest);
    if name.is_empty() {
        return Err(ParseError::new(
            format!("Expected a name after '{}'", kind),
            span,
        ));
    }
    if !is_valid_identifier(name) {
        return Err(ParseError::new(
            format!("Invalid component name '{}'", name),
            span,
        ));
    }

    Ok(ComponentDecl {
        kind: kind.to_string(),
        name: name.to_string(),
        attributes: parse_attributes(rest, span)?,
        span,
    })
}

/// First whitespace separated word and the remainder
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(pos) => (&s[..pos], &s[pos..]),
        None => (s, ""),
    }
}

/// Split `key=value key=value ...` where values may contain spaces and parentheses
fn parse_attributes(s: &str, span: Option<Span>) -> Result<Vec<Attribute>, ParseError> {
    // (start of key, key, position of '=')
    let mut keys: Vec<(usize, &str, usize)> = Vec::new();
    let mut depth = 0i32;

    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(ParseError::new(format!("Unbalanced ')' in: {}", s.trim()), span));
                }
            }
            '=' if depth == 0 => {
                let head = s[..i].trim_end();
                let key_start = head
                    .char_indices()
                    .rev()
                    .take_while(|(_, c)| c.is_alphanumeric() || *c == '_')
                    .last()
                    .map(|(pos, _)| pos)
                    .unwrap_or(head.len());
                let key = &head[key_start..];
                if !is_valid_identifier(key) {
                    return Err(ParseError::new(
                        format!("Expected parameter name before '=' in: {}", s.trim()),
                        span,
                    ));
                }
                keys.push((key_start, key, i));
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ParseError::new(format!("Unbalanced '(' in: {}", s.trim()), span));
    }

    let leading_end = keys.first().map_or(s.len(), |(start, _, _)| *start);
    let leading = s[..leading_end].trim();
    if !leading.is_empty() {
        return Err(ParseError::new(
            format!("Unexpected '{}', expected key=value", leading),
            span,
        ));
    }

    let mut attributes = Vec::with_capacity(keys.len());
    for (idx, (_, key, eq_pos)) in keys.iter().enumerate() {
        let value_end = keys.get(idx + 1).map_or(s.len(), |(start, _, _)| *start);
        let value_str = s[eq_pos + 1..value_end].trim();
        if value_str.is_empty() {
            return Err(ParseError::new(format!("Missing value for '{}'", key), span));
        }
        attributes.push(Attribute {
            key: key.to_string(),
            value: parse_value(value_str, span)?,
        });
    }
    Ok(attributes)
}

/// A value is either a 3-vector `(a, b, c)` or a scalar expression
fn parse_value(s: &str, span: Option<Span>) -> Result<AttrValue, ParseError> {
    if s.starts_with('(') && matching_paren(s, 0) == Some(s.len() - 1) {
        let parts = split_top_level(&s[1..s.len() - 1]);
        if parts.len() > 1 {
            if parts.len() != 3 {
                return Err(ParseError::new(
                    format!("Expected three components in vector: {}", s),
                    span,
                ));
            }
            return Ok(AttrValue::Vector([
                parse_expr(parts[0], span)?,
                parse_expr(parts[1], span)?,
                parse_expr(parts[2], span)?,
            ]));
        }
    }
    Ok(AttrValue::Scalar(parse_expr(s, span)?))
}

/// Byte index of the ')' closing the '(' at `open`
fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0;
    for (i, ch) in s[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas that are not nested inside parentheses
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

/// Parse an expression from a string
/// Grammar: ExprAdd (with precedence: add/sub < mul/div < unary < primary)
pub fn parse_expr(s: &str, span: Option<Span>) -> Result<Expr, ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseError::new("Empty expression", span));
    }
    parse_expr_add(s, span)
}

/// Whether the '+' or '-' at byte `i` is a binary operator rather than a sign
fn is_binary_sign(s: &str, i: usize) -> bool {
    let before = s[..i].trim_end();
    let Some(prev) = before.chars().last() else {
        return false;
    };
    if matches!(prev, '+' | '-' | '*' | '/' | '(' | ',') {
        return false;
    }
    // Exponent of a float literal such as 1e-3
    if matches!(prev, 'e' | 'E') && before.len() == s[..i].len() {
        let mantissa = &before[..before.len() - 1];
        let token_start = mantissa
            .rfind(|c: char| !(c.is_ascii_digit() || c == '.'))
            .map_or(0, |p| p + 1);
        let token = &mantissa[token_start..];
        let is_number = !token.is_empty()
            && token.chars().any(|c| c.is_ascii_digit())
            && !mantissa[..token_start].ends_with(|c: char| c.is_alphanumeric() || c == '_');
        if is_number {
            return false;
        }
    }
    true
}

/// Parse addition/subtraction (lowest precedence)
/// Splits at the rightmost binary + or - at depth 0 so chains associate left
fn parse_expr_add(s: &str, span: Option<Span>) -> Result<Expr, ParseError> {
    let s = s.trim();

    let mut paren_depth = 0;
    let mut op = None;

    for (i, ch) in s.char_indices().rev() {
        match ch {
            ')' => paren_depth += 1,
            '(' => paren_depth -= 1,
            '+' | '-' if paren_depth == 0 && is_binary_sign(s, i) => {
                op = Some((i, ch));
                break;
            }
            _ => {}
        }
    }

    match op {
        Some((pos, ch)) => {
            let op = if ch == '+' { BinaryOp::Add } else { BinaryOp::Sub };
            Ok(Expr::Binary {
                op,
                left: Box::new(parse_expr_add(&s[..pos], span)?),
                right: Box::new(parse_expr_mul(&s[pos + 1..], span)?),
            })
        }
        None => parse_expr_mul(s, span),
    }
}

/// Parse multiplication/division
fn parse_expr_mul(s: &str, span: Option<Span>) -> Result<Expr, ParseError> {
    let s = s.trim();

    let mut paren_depth = 0;
    let mut op = None;

    for (i, ch) in s.char_indices().rev() {
        match ch {
            ')' => paren_depth += 1,
            '(' => paren_depth -= 1,
            '*' | '/' if paren_depth == 0 => {
                op = Some((i, ch));
                break;
            }
            _ => {}
        }
    }

    match op {
        Some((pos, ch)) => {
            let op = if ch == '*' { BinaryOp::Mul } else { BinaryOp::Div };
            Ok(Expr::Binary {
                op,
                left: Box::new(parse_expr_mul(&s[..pos], span)?),
                right: Box::new(parse_expr_unary(&s[pos + 1..], span)?),
            })
        }
        None => parse_expr_unary(s, span),
    }
}

/// Parse unary minus and plus
fn parse_expr_unary(s: &str, span: Option<Span>) -> Result<Expr, ParseError> {
    let s = s.trim();
    if let Some(rest) = s.strip_prefix('-') {
        Ok(Expr::UnaryMinus(Box::new(parse_expr_unary(rest, span)?)))
    } else if let Some(rest) = s.strip_prefix('+') {
        parse_expr_unary(rest, span)
    } else {
        parse_expr_primary(s, span)
    }
}

/// Parse primary expressions: literals, variables, function calls, parentheses
fn parse_expr_primary(s: &str, span: Option<Span>) -> Result<Expr, ParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ParseError::new("Missing operand", span));
    }

    if let Ok(val) = s.parse::<f64>() {
        if val.is_finite() {
            return Ok(Expr::Literal(val));
        }
    }

    if s.starts_with('(') && matching_paren(s, 0) == Some(s.len() - 1) {
        return parse_expr(&s[1..s.len() - 1], span);
    }

    if let Some(paren_pos) = s.find('(') {
        let func_name = s[..paren_pos].trim();
        if is_valid_identifier(func_name) && matching_paren(s, paren_pos) == Some(s.len() - 1) {
            let func = match func_name {
                "sin" => FuncName::Sin,
                "cos" => FuncName::Cos,
                "sqrt" => FuncName::Sqrt,
                "radians" => FuncName::Radians,
                "degrees" => FuncName::Degrees,
                _ => {
                    return Err(ParseError::new(
                        format!("Unknown function '{}'", func_name),
                        span,
                    ));
                }
            };

            let args_str = &s[paren_pos + 1..s.len() - 1];
            let args = if args_str.trim().is_empty() {
                Vec::new()
            } else {
                split_top_level(args_str)
                    .into_iter()
                    .map(|arg| parse_expr(arg, span))
                    .collect::<Result<Vec<_>, _>>()?
            };

            return Ok(Expr::Call { func, args });
        }
    }

    if is_valid_identifier(s) {
        return Ok(Expr::Var(s.to_string()));
    }

    Err(ParseError::new(format!("Invalid expression: {}", s), span))
}

/// Check if a string is a valid identifier
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    // First char must be letter or underscore
    if !first.is_alphabetic() && first != '_' {
        return false;
    }

    // Rest must be alphanumeric or underscore
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
