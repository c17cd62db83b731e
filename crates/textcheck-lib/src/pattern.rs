//! Compiled directive bodies and their execution against the input.
//!
//! A directive body compiles to either a fixed byte string or a regex
//! skeleton with substitution holes. Holes are filled at match time from
//! the context, so a pattern can reference values captured by earlier
//! patterns; same-pattern references become one-digit back-references
//! instead.

use indexmap::IndexMap;
use serde::Serialize;
use std::borrow::Cow;

use crate::config::Config;
use crate::context::{Context, NumericVarId, SubstId, SubstKind, Substitution};
use crate::directive::DirectiveKind;
use crate::errors::{MatchError, ParseError};
use crate::expr::{self, ExprAst};
use crate::regex::{self, CheckRegex};
use crate::text::{self, Span};

/// Where a pattern's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckLoc {
    /// Byte span in the check file.
    File(Span),
    /// Supplied through configuration (implicit NOT patterns).
    CommandLine,
}

impl CheckLoc {
    pub fn span(&self) -> Option<Span> {
        match self {
            CheckLoc::File(span) => Some(*span),
            CheckLoc::CommandLine => None,
        }
    }
}

/// A numeric variable definition inside a pattern.
#[derive(Debug, Clone)]
pub struct NumericCapture {
    /// Capture group in the skeleton holding the digits.
    pub group: usize,
    pub var: NumericVarId,
}

#[derive(Debug, Clone)]
pub enum PatternBody {
    /// Literal byte search.
    Fixed(String),
    Regex {
        /// Regex text with substitution holes, completed at match time.
        skeleton: String,
        substitutions: Vec<SubstId>,
        /// String variable definitions, name to capture group. Last
        /// definition wins within one pattern.
        string_captures: IndexMap<String, usize>,
        /// Numeric variable definitions, name to capture group and handle.
        numeric_captures: IndexMap<String, NumericCapture>,
    },
}

/// One compiled directive.
#[derive(Debug, Clone)]
pub struct Pattern {
    kind: DirectiveKind,
    loc: CheckLoc,
    /// Check-file line, or None for implicit patterns.
    line: Option<u32>,
    body: PatternBody,
}

/// Classified form of one `[[...]]` block.
enum BlockForm<'a> {
    StringDef { name: &'a str, regex: &'a str },
    StringUse { name: &'a str },
    NumericDef { name: String, var: NumericVarId },
    NumericUse { text: &'a str, ast: ExprAst },
}

impl Pattern {
    pub fn kind(&self) -> DirectiveKind {
        self.kind
    }

    pub fn loc(&self) -> CheckLoc {
        self.loc
    }

    pub fn line(&self) -> Option<u32> {
        self.line
    }

    pub fn body(&self) -> &PatternBody {
        &self.body
    }

    /// True when the pattern defines or references any variable. Forbidden
    /// for LABEL directives.
    pub fn has_variable(&self) -> bool {
        match &self.body {
            PatternBody::Fixed(_) => false,
            PatternBody::Regex {
                substitutions,
                string_captures,
                numeric_captures,
                ..
            } => {
                !substitutions.is_empty()
                    || !string_captures.is_empty()
                    || !numeric_captures.is_empty()
            }
        }
    }

    /// Zero-length pattern matching only the end of input, anchoring
    /// trailing NOT/DAG groups.
    pub fn end_of_input(line: u32, at: usize) -> Self {
        Self {
            kind: DirectiveKind::EndOfInput,
            loc: CheckLoc::File(Span::empty(at)),
            line: Some(line),
            body: PatternBody::Fixed(String::new()),
        }
    }

    /// Compiles one directive body.
    ///
    /// `body_off` is the absolute offset of `body` in the check file and
    /// anchors every error span; `line` is the 1-based check-file line, or
    /// None for implicit patterns.
    pub fn parse(
        body: &str,
        body_off: usize,
        loc: CheckLoc,
        kind: DirectiveKind,
        prefix: &str,
        line: Option<u32>,
        ctx: &mut Context,
        config: &Config,
    ) -> Result<Self, ParseError> {
        let match_full_lines_here = config.match_full_lines && kind != DirectiveKind::Not;

        let mut body = body;
        if !(config.strict_whitespace && config.match_full_lines) {
            body = body.trim_end_matches([' ', '\t']);
        }

        if body.is_empty() && kind != DirectiveKind::Empty {
            return Err(ParseError::new(
                Span::empty(body_off),
                format!("found empty check string with prefix '{prefix}:'"),
            ));
        }
        if !body.is_empty() && kind == DirectiveKind::Empty {
            return Err(ParseError::new(
                Span::new(body_off, body_off + body.len()),
                format!("found non-empty check string for empty check with prefix '{prefix}:'"),
            ));
        }
        if kind == DirectiveKind::Empty {
            return Ok(Self {
                kind,
                loc,
                line,
                body: PatternBody::Regex {
                    skeleton: "(\n$)".to_string(),
                    substitutions: Vec::new(),
                    string_captures: IndexMap::new(),
                    numeric_captures: IndexMap::new(),
                },
            });
        }

        // Fixed-string short-circuit.
        if !match_full_lines_here
            && (body.len() < 2 || (!body.contains("{{") && !body.contains("[[")))
        {
            return Ok(Self {
                kind,
                loc,
                line,
                body: PatternBody::Fixed(body.to_string()),
            });
        }

        let mut skeleton = String::new();
        let mut substitutions: Vec<SubstId> = Vec::new();
        let mut string_captures: IndexMap<String, usize> = IndexMap::new();
        let mut numeric_captures: IndexMap<String, NumericCapture> = IndexMap::new();
        // Group 0 is the whole match; new parenthesized groups count up
        // from here.
        let mut cur_paren = 1usize;

        if match_full_lines_here {
            skeleton.push('^');
            if !config.strict_whitespace {
                skeleton.push_str(" *");
            }
        }

        let mut rest = body;
        // Absolute offset of `rest` within the check file.
        let off = |rest: &str| body_off + (body.len() - rest.len());

        while !rest.is_empty() {
            // Anonymous regex group.
            if let Some(after) = rest.strip_prefix("{{") {
                let Some(end) = after.find("}}") else {
                    return Err(ParseError::new(
                        Span::empty(off(rest)),
                        "found start of regex string with no end '}}'".to_string(),
                    ));
                };
                let piece = &after[..end];
                // Wrapping parens keeps alternations local, so "abc{{x|z}}def"
                // becomes "abc(x|z)def" rather than "abcx|zdef".
                skeleton.push('(');
                cur_paren += 1;
                cur_paren += validate_piece(piece, off(after))?;
                skeleton.push_str(piece);
                skeleton.push(')');
                rest = &after[end + 2..];
                continue;
            }

            // Substitution block.
            if let Some(after) = rest.strip_prefix("[[") {
                let after_off = off(after);
                let Some(end) = find_regex_var_end(after, after_off)? else {
                    return Err(ParseError::new(
                        Span::empty(off(rest)),
                        "invalid substitution block, no ]] found".to_string(),
                    ));
                };
                let block = &after[..end];
                rest = &after[end + 2..];

                let insert_at = skeleton.len();
                match classify_block(block, after_off, ctx, line)? {
                    BlockForm::StringUse { name } if string_captures.contains_key(name) => {
                        // Defined earlier in this same pattern: back-reference.
                        let group = string_captures[name];
                        if !(1..=9).contains(&group) {
                            return Err(ParseError::new(
                                Span::new(after_off, after_off + block.len()),
                                "can't back-reference more than 9 variables".to_string(),
                            ));
                        }
                        skeleton.push('\\');
                        skeleton.push((b'0' + group as u8) as char);
                    }
                    BlockForm::StringUse { name } => {
                        let id = ctx.make_substitution(Substitution {
                            from: name.to_string(),
                            kind: SubstKind::StringVar(name.to_string()),
                            insert_at,
                        });
                        substitutions.push(id);
                    }
                    BlockForm::NumericUse { text, ast } => {
                        let id = ctx.make_substitution(Substitution {
                            from: text.to_string(),
                            kind: SubstKind::Numeric(ast),
                            insert_at,
                        });
                        substitutions.push(id);
                    }
                    BlockForm::StringDef { name, regex: var_regex } => {
                        string_captures.insert(name.to_string(), cur_paren);
                        ctx.mark_string_defined(name);
                        skeleton.push('(');
                        cur_paren += 1;
                        cur_paren += validate_piece(var_regex, after_off)?;
                        skeleton.push_str(var_regex);
                        skeleton.push(')');
                    }
                    BlockForm::NumericDef { name, var } => {
                        numeric_captures.insert(
                            name.clone(),
                            NumericCapture {
                                group: cur_paren,
                                var,
                            },
                        );
                        // Registered now so later uses on other lines bind to
                        // this definition.
                        ctx.register_numeric(&name, var);
                        skeleton.push('(');
                        cur_paren += 1;
                        skeleton.push_str("[0-9]+");
                        skeleton.push(')');
                    }
                }
                continue;
            }

            // Fixed text up to the next substitution site.
            let next = rest
                .find("{{")
                .unwrap_or(rest.len())
                .min(rest.find("[[").unwrap_or(rest.len()));
            skeleton.push_str(&regex::escape(&rest[..next]));
            rest = &rest[next..];
        }

        if match_full_lines_here {
            if !config.strict_whitespace {
                skeleton.push_str(" *");
            }
            skeleton.push('$');
        }

        Ok(Self {
            kind,
            loc,
            line,
            body: PatternBody::Regex {
                skeleton,
                substitutions,
                string_captures,
                numeric_captures,
            },
        })
    }

    /// Finds the first match in `buffer`.
    ///
    /// Returns the match position and length relative to `buffer`, records
    /// capture values into the context, and updates numeric definitions.
    /// For CHECK-EMPTY the reported position is advanced past the required
    /// leading newline so the next anchor starts on the empty line itself.
    pub fn match_at(&self, buffer: &str, ctx: &mut Context) -> Result<(usize, usize), MatchError> {
        if self.kind == DirectiveKind::EndOfInput {
            return Ok((buffer.len(), 0));
        }

        let (skeleton, substitutions, string_captures, numeric_captures) = match &self.body {
            PatternBody::Fixed(fixed) => {
                return match buffer.find(fixed.as_str()) {
                    Some(pos) => Ok((pos, fixed.len())),
                    None => Err(MatchError::NotFound),
                };
            }
            PatternBody::Regex {
                skeleton,
                substitutions,
                string_captures,
                numeric_captures,
            } => (skeleton, substitutions, string_captures, numeric_captures),
        };

        // Splice current variable values into the skeleton. `@LINE` reads
        // inside the substitutions see this pattern's line.
        let regex_text: Cow<'_, str> = if substitutions.is_empty() {
            Cow::Borrowed(skeleton.as_str())
        } else {
            if let (Some(line), Some(line_var)) = (self.line, ctx.line_var()) {
                ctx.set_numeric_value(line_var, u64::from(line));
            }
            let mut spliced = skeleton.clone();
            let mut delta = 0usize;
            let mut failure = None;
            for id in substitutions {
                match ctx.resolve_substitution(*id) {
                    Ok(value) => {
                        let at = ctx.substitution(*id).insert_at + delta;
                        spliced.insert_str(at, &value);
                        delta += value.len();
                    }
                    Err(undefined) => {
                        failure = Some(undefined);
                        break;
                    }
                }
            }
            if let Some(line_var) = ctx.line_var() {
                ctx.clear_numeric_value(line_var);
            }
            if let Some(undefined) = failure {
                return Err(MatchError::Undefined(undefined));
            }
            Cow::Owned(spliced)
        };

        let re = CheckRegex::new(regex_text.as_ref())
            .map_err(|e| MatchError::ParseFailure(e.reason))?;
        let Some(found) = re.search(buffer) else {
            return Err(MatchError::NotFound);
        };
        let (start, end) = found.range();

        for (name, group) in string_captures {
            let value = found
                .group(*group)
                .map(|(s, e)| &buffer[s..e])
                .unwrap_or("");
            ctx.set_string(name, value.to_string());
        }
        for capture in numeric_captures.values() {
            let digits = found
                .group(capture.group)
                .map(|(s, e)| &buffer[s..e])
                .unwrap_or("");
            let value: u64 = digits
                .parse()
                .map_err(|_| MatchError::NumericOverflow(digits.to_string()))?;
            ctx.set_numeric_value(capture.var, value);
        }

        let skip = usize::from(self.kind == DirectiveKind::Empty);
        Ok((start + skip, end - start - skip))
    }

    /// Best near-miss offset in `buffer` for failure diagnostics, or None
    /// when no position scores under the plausibility cutoff.
    ///
    /// Scans up to 4 KiB; each non-whitespace start is scored by edit
    /// distance of a representative string against the line at that
    /// position, penalized by lines skipped.
    pub fn fuzzy_match_offset(&self, buffer: &str) -> Option<usize> {
        let bytes = buffer.as_bytes();
        let mut lines_forward = 0u32;
        let mut best: Option<usize> = None;
        let mut best_quality = 0f64;
        for i in 0..bytes.len().min(4096) {
            if bytes[i] == b'\n' {
                lines_forward += 1;
            }
            if bytes[i] == b' ' || bytes[i] == b'\t' {
                continue;
            }
            let distance = self.match_distance(&bytes[i..]);
            let quality = distance as f64 + f64::from(lines_forward) / 100.0;
            if best.is_none() || quality < best_quality {
                best = Some(i);
                best_quality = quality;
            }
        }
        match best {
            Some(offset) if offset > 0 && best_quality < 50.0 => Some(offset),
            _ => None,
        }
    }

    // A representative string stands in for the pattern: its fixed text, or
    // the raw skeleton for regex patterns.
    fn match_distance(&self, buffer: &[u8]) -> usize {
        let example = match &self.body {
            PatternBody::Fixed(fixed) => fixed.as_bytes(),
            PatternBody::Regex { skeleton, .. } => skeleton.as_bytes(),
        };
        let mut prefix = &buffer[..buffer.len().min(example.len())];
        if let Some(newline) = prefix.iter().position(|b| *b == b'\n') {
            prefix = &prefix[..newline];
        }
        text::edit_distance(prefix, example)
    }
}

/// Validates an embedded regex piece and returns how many capture groups it
/// adds.
fn validate_piece(piece: &str, at: usize) -> Result<usize, ParseError> {
    regex::capture_group_count(piece)
        .map_err(|e| ParseError::new(Span::new(at, at + piece.len()), e.to_string()))
}

/// Finds the offset of the `]]` closing a substitution block, honoring
/// backslash escapes and `[...]` nesting. `Ok(None)` means the block never
/// closes.
fn find_regex_var_end(s: &str, s_off: usize) -> Result<Option<usize>, ParseError> {
    let bytes = s.as_bytes();
    let mut offset = 0usize;
    let mut bracket_depth = 0usize;
    while offset < bytes.len() {
        if bytes[offset..].starts_with(b"]]") && bracket_depth == 0 {
            return Ok(Some(offset));
        }
        if bytes[offset] == b'\\' {
            offset += 2;
            continue;
        }
        match bytes[offset] {
            b'[' => bracket_depth += 1,
            b']' => {
                if bracket_depth == 0 {
                    return Err(ParseError::new(
                        Span::empty(s_off + offset),
                        "missing closing \"]\" for regex variable".to_string(),
                    ));
                }
                bracket_depth -= 1;
            }
            _ => {}
        }
        offset += 1;
    }
    Ok(None)
}

/// Classifies the contents of one `[[...]]` block.
fn classify_block<'a>(
    block: &'a str,
    block_off: usize,
    ctx: &mut Context,
    line: Option<u32>,
) -> Result<BlockForm<'a>, ParseError> {
    if let Some(numeric) = block.strip_prefix('#') {
        return classify_numeric_block(numeric, block_off + 1, false, ctx, line);
    }

    let name_end = block.find(':');
    let name_part = &block[..name_end.unwrap_or(block.len())];
    if let Some(ws) = name_part.find([' ', '\t']) {
        return Err(ParseError::new(
            Span::empty(block_off + ws),
            "unexpected whitespace".to_string(),
        ));
    }

    let (var, after_name) = expr::scan_var_name(block)
        .map_err(|message| ParseError::new(Span::new(block_off, block_off + block.len()), message))?;

    if name_end.is_some() {
        // String variable definition.
        if var.is_pseudo || !after_name.starts_with(':') {
            return Err(ParseError::new(
                Span::empty(block_off),
                "invalid name in string variable definition".to_string(),
            ));
        }
        if ctx.numeric_id(var.name).is_some() {
            return Err(ParseError::new(
                Span::new(block_off, block_off + var.name.len()),
                format!("numeric variable with name '{}' already exists", var.name),
            ));
        }
        return Ok(BlockForm::StringDef {
            name: var.name,
            regex: &after_name[1..],
        });
    }

    if var.is_pseudo {
        // Legacy [[@LINE+k]] with string-substitution syntax.
        return classify_numeric_block(block, block_off, true, ctx, line);
    }

    Ok(BlockForm::StringUse { name: var.name })
}

/// Classifies the contents of a numeric block (`[[#...]]`, or the legacy
/// `[[@LINE...]]` form when `legacy` is set).
fn classify_numeric_block<'a>(
    text: &'a str,
    text_off: usize,
    legacy: bool,
    ctx: &mut Context,
    line: Option<u32>,
) -> Result<BlockForm<'a>, ParseError> {
    if !legacy && let Some(colon) = text.find(':') {
        let var = expr::parse_numeric_def(&text[..colon], text_off, ctx, line)?;
        let value_part = &text[colon + 1..];
        let trimmed = value_part.trim_start_matches([' ', '\t']);
        if !trimmed.is_empty() {
            // Definition with an expected-value expression. The expression is
            // validated here; the capture still matches any digit run.
            let value_off = text_off + colon + 1 + (value_part.len() - trimmed.len());
            expr::parse_expression(trimmed, value_off, ctx, line, false)?;
        }
        return Ok(BlockForm::NumericDef {
            name: ctx.numeric_name(var).to_string(),
            var,
        });
    }

    let trimmed = text.trim_start_matches([' ', '\t']);
    let expr_off = text_off + (text.len() - trimmed.len());
    let ast = expr::parse_expression(trimmed, expr_off, ctx, line, legacy)?;
    Ok(BlockForm::NumericUse { text, ast })
}
