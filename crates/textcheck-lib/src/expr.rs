//! Numeric expression sub-language: `[[#...]]` blocks and legacy `@LINE`
//! arithmetic.
//!
//! Expressions evaluate over wrapping `u64`. The grammar is a flat
//! left-associative chain of `+`/`-` over decimal literals and variable
//! uses; legacy `[[@LINE+k]]` blocks are restricted to a single operator
//! with a literal right operand.

use logos::Logos;

use crate::context::{Context, NumericVarId};
use crate::errors::{ParseError, UndefinedVars};
use crate::text::Span;

/// A scanned variable name, with its `@`/`$` sigil still attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarName<'a> {
    pub name: &'a str,
    pub is_pseudo: bool,
}

/// Scans a variable name from the start of `s`.
///
/// Names match `[$@]?[A-Za-z_][A-Za-z0-9_]*`; `@` marks a pseudo variable
/// and `$` a global one. Returns the name and the unconsumed remainder.
pub fn scan_var_name(s: &str) -> Result<(VarName<'_>, &str), String> {
    if s.is_empty() {
        return Err("empty variable name".to_string());
    }
    let bytes = s.as_bytes();
    let is_pseudo = bytes[0] == b'@';
    let mut index = usize::from(is_pseudo || bytes[0] == b'$');
    if index >= bytes.len() || !(bytes[index] == b'_' || bytes[index].is_ascii_alphabetic()) {
        return Err("invalid variable name".to_string());
    }
    while index < bytes.len() && (bytes[index] == b'_' || bytes[index].is_ascii_alphanumeric()) {
        index += 1;
    }
    Ok((
        VarName {
            name: &s[..index],
            is_pseudo,
        },
        &s[index..],
    ))
}

/// Closed AST for one numeric expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprAst {
    Literal(u64),
    Var { name: String, id: NumericVarId },
    Binop {
        op: BinOp,
        lhs: Box<ExprAst>,
        rhs: Box<ExprAst>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
}

impl ExprAst {
    /// Evaluates against the current variable values. Undefined names from
    /// both operands of a binop are accumulated.
    pub fn eval(&self, ctx: &Context) -> Result<u64, UndefinedVars> {
        match self {
            ExprAst::Literal(value) => Ok(*value),
            ExprAst::Var { name, id } => ctx
                .numeric_value(*id)
                .ok_or_else(|| UndefinedVars(vec![name.clone()])),
            ExprAst::Binop { op, lhs, rhs } => match (lhs.eval(ctx), rhs.eval(ctx)) {
                (Ok(l), Ok(r)) => Ok(match op {
                    BinOp::Add => l.wrapping_add(r),
                    BinOp::Sub => l.wrapping_sub(r),
                }),
                (lhs, rhs) => {
                    let mut names = Vec::new();
                    for side in [lhs, rhs] {
                        if let Err(UndefinedVars(more)) = side {
                            names.extend(more);
                        }
                    }
                    Err(UndefinedVars(names))
                }
            },
        }
    }
}

#[derive(Logos, Debug, PartialEq, Clone, Copy)]
#[logos(skip r"[ \t]+")]
enum ExprToken<'src> {
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[regex(r"[0-9]+")]
    Literal(&'src str),

    #[regex(r"[@$]?[A-Za-z_][A-Za-z0-9_]*")]
    Ident(&'src str),
}

/// Which operand forms are admissible at the current parse position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AllowedOperand {
    /// Only the `@LINE` pseudo variable (first operand of a legacy block).
    LineVar,
    /// Only a literal (right operand of a legacy block).
    Literal,
    Any,
}

struct ExprParser<'a> {
    /// `None` marks a character the lexer rejected.
    tokens: Vec<(Option<ExprToken<'a>>, std::ops::Range<usize>)>,
    pos: usize,
    text: &'a str,
    /// Absolute offset of `text` within the check file.
    base: usize,
}

impl<'a> ExprParser<'a> {
    fn new(text: &'a str, base: usize) -> Self {
        let mut lexer = ExprToken::lexer(text);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next() {
            tokens.push((token.ok(), lexer.span()));
        }
        Self {
            tokens,
            pos: 0,
            text,
            base,
        }
    }

    fn peek(&self) -> Option<&(Option<ExprToken<'a>>, std::ops::Range<usize>)> {
        self.tokens.get(self.pos)
    }

    fn error_at(&self, span: std::ops::Range<usize>, message: String) -> ParseError {
        ParseError::new(
            Span::new(self.base + span.start, self.base + span.end),
            message,
        )
    }

    fn error_here(&self, message: String) -> ParseError {
        let span = self
            .peek()
            .map(|(_, s)| s.clone())
            .unwrap_or(self.text.len()..self.text.len());
        self.error_at(span, message)
    }

    /// Remaining unparsed text, for error messages.
    fn rest(&self) -> &str {
        match self.peek() {
            Some((_, span)) => &self.text[span.start..],
            None => "",
        }
    }

    fn parse_operand(
        &mut self,
        allowed: AllowedOperand,
        ctx: &mut Context,
        line: Option<u32>,
    ) -> Result<ExprAst, ParseError> {
        let Some((token, span)) = self.peek().cloned() else {
            return Err(self.error_here("invalid operand format ''".to_string()));
        };
        match token {
            Some(ExprToken::Ident(text)) if allowed != AllowedOperand::Literal => {
                self.pos += 1;
                let is_pseudo = text.starts_with('@');
                self.parse_variable_use(text, is_pseudo, span, ctx, line)
            }
            Some(ExprToken::Literal(digits)) if allowed != AllowedOperand::LineVar => {
                self.pos += 1;
                let value: u64 = digits.parse().map_err(|_| {
                    self.error_at(span.clone(), format!("invalid operand format '{digits}'"))
                })?;
                Ok(ExprAst::Literal(value))
            }
            _ => Err(self.error_at(
                span,
                format!("invalid operand format '{}'", self.rest()),
            )),
        }
    }

    fn parse_variable_use(
        &self,
        name: &str,
        is_pseudo: bool,
        span: std::ops::Range<usize>,
        ctx: &mut Context,
        line: Option<u32>,
    ) -> Result<ExprAst, ParseError> {
        if is_pseudo && name != "@LINE" {
            return Err(self.error_at(
                span,
                format!("invalid pseudo numeric variable '{name}'"),
            ));
        }
        // Definitions and uses parse in check-file order, so an id already in
        // the table refers to the most recent definition. An unseen name gets
        // a placeholder variable so parsing can continue; using it without a
        // later value fails at match time instead.
        let id = match ctx.numeric_id(name) {
            Some(id) => id,
            None => {
                let id = ctx.make_numeric_var(name, None);
                ctx.register_numeric(name, id);
                id
            }
        };
        if let (Some(def_line), Some(use_line)) = (ctx.numeric_def_line(id), line)
            && def_line == use_line
        {
            return Err(self.error_at(
                span,
                format!("numeric variable '{name}' defined on the same line as used"),
            ));
        }
        Ok(ExprAst::Var {
            name: name.to_string(),
            id,
        })
    }

    fn parse_binop(
        &mut self,
        lhs: ExprAst,
        legacy_line: bool,
        ctx: &mut Context,
        line: Option<u32>,
    ) -> Result<ExprAst, ParseError> {
        let Some((token, span)) = self.peek().cloned() else {
            return Ok(lhs);
        };
        let op = match token {
            Some(ExprToken::Plus) => BinOp::Add,
            Some(ExprToken::Minus) => BinOp::Sub,
            _ => {
                let shown = self.text[span.clone()].chars().next().unwrap_or(' ');
                return Err(self.error_at(span, format!("unsupported operation '{shown}'")));
            }
        };
        self.pos += 1;
        if self.peek().is_none() {
            return Err(self.error_here("missing operand in expression".to_string()));
        }
        // The right operand of a legacy @LINE expression is always a literal.
        let allowed = if legacy_line {
            AllowedOperand::Literal
        } else {
            AllowedOperand::Any
        };
        let rhs = self.parse_operand(allowed, ctx, line)?;
        Ok(ExprAst::Binop {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }
}

/// Parses the expression of a numeric substitution block.
///
/// `base` is the absolute offset of `text` in the check file, used to locate
/// errors. `legacy_line` restricts the grammar to the historic
/// `[[@LINE+k]]` form: the left operand must be the `@LINE` pseudo variable
/// and at most one binary operator with a literal right operand is allowed.
pub fn parse_expression(
    text: &str,
    base: usize,
    ctx: &mut Context,
    line: Option<u32>,
    legacy_line: bool,
) -> Result<ExprAst, ParseError> {
    let mut parser = ExprParser::new(text, base);
    let allowed = if legacy_line {
        AllowedOperand::LineVar
    } else {
        AllowedOperand::Any
    };
    let mut ast = parser.parse_operand(allowed, ctx, line)?;
    while parser.peek().is_some() {
        ast = parser.parse_binop(ast, legacy_line, ctx, line)?;
        if legacy_line && parser.peek().is_some() {
            return Err(parser.error_here(format!(
                "unexpected characters at end of expression '{}'",
                parser.rest()
            )));
        }
    }
    Ok(ast)
}

/// Parses `text` as the name part of a numeric variable definition and
/// returns the variable, creating it if this is its first definition.
///
/// The caller registers the returned id in the live table once the whole
/// block parses. Collisions with string variables defined earlier are
/// rejected here; the reverse direction is rejected by the string-definition
/// path.
pub fn parse_numeric_def(
    text: &str,
    base: usize,
    ctx: &mut Context,
    line: Option<u32>,
) -> Result<NumericVarId, ParseError> {
    let text_trimmed = text.trim_start_matches([' ', '\t']);
    let base = base + (text.len() - text_trimmed.len());
    let (var, rest) = scan_var_name(text_trimmed)
        .map_err(|message| ParseError::new(Span::new(base, base + text_trimmed.len()), message))?;
    if var.is_pseudo {
        return Err(ParseError::new(
            Span::new(base, base + var.name.len()),
            "definition of pseudo numeric variable unsupported".to_string(),
        ));
    }
    if ctx.is_string_defined(var.name) {
        return Err(ParseError::new(
            Span::new(base, base + var.name.len()),
            format!("string variable with name '{}' already exists", var.name),
        ));
    }
    if !rest.trim_start_matches([' ', '\t']).is_empty() {
        let rest_off = base + (text_trimmed.len() - rest.len());
        return Err(ParseError::new(
            Span::new(rest_off, base + text_trimmed.len()),
            "unexpected characters after numeric variable name".to_string(),
        ));
    }
    Ok(match ctx.numeric_id(var.name) {
        Some(id) => id,
        None => ctx.make_numeric_var(var.name, line),
    })
}
