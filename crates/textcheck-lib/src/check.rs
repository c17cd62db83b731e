//! Check-string assembly and the matching orchestrator.
//!
//! `read_check_file` compiles the check buffer into an ordered list of
//! anchors, each carrying the NOT/DAG patterns that precede it.
//! `check_input` drives those anchors over the input: the outer loop splits
//! the input into CHECK-LABEL segments, the inner loop enforces ordering,
//! adjacency, and exclusion constraints inside each segment.

use crate::config::Config;
use crate::context::Context;
use crate::diagnostics::{DiagnosticBuilder, Diagnostics, SourceId};
use crate::directive::{self, DirectiveKind};
use crate::errors::{MatchError, ParseError};
use crate::events::{EventLog, MatchEvent, MatchKind};
use crate::pattern::{CheckLoc, Pattern, PatternBody};
use crate::regex::CheckRegex;
use crate::text::{self, Span};

/// One anchor directive plus the NOT/DAG bag that precedes it.
#[derive(Debug, Clone)]
pub struct CheckString {
    pub pattern: Pattern,
    /// Prefix this directive was written with, for messages.
    pub prefix: String,
    /// Start of the directive body in the check file.
    pub loc: CheckLoc,
    /// NOT/DAG patterns between the previous anchor and this one, implicit
    /// NOTs included.
    pub dag_not: Vec<Pattern>,
}

/// Terminal failure of the run. Details are already in the event log and
/// diagnostics by the time this is returned.
pub(crate) struct CheckFailed;

/// Compiles the check buffer. All parse errors are accumulated; matching
/// never starts when any directive is malformed.
pub fn read_check_file(
    check: &str,
    prefix_re: &CheckRegex,
    config: &Config,
    ctx: &mut Context,
) -> Result<Vec<CheckString>, Vec<ParseError>> {
    let mut errors: Vec<ParseError> = Vec::new();

    let mut implicit_not: Vec<Pattern> = Vec::new();
    for body in &config.implicit_check_not {
        match Pattern::parse(
            body,
            0,
            CheckLoc::CommandLine,
            DirectiveKind::Not,
            "IMPLICIT-CHECK",
            None,
            ctx,
            config,
        ) {
            Ok(pattern) => implicit_not.push(pattern),
            Err(e) => errors.push(ParseError::new(
                Span::empty(0),
                format!("in --implicit-check-not pattern '{body}': {}", e.message),
            )),
        }
    }

    let mut checks: Vec<CheckString> = Vec::new();
    let mut dag_not = implicit_not.clone();
    let mut line_number = 1u32;
    let mut cursor = 0usize;

    while let Some(found) =
        directive::find_first_matching_prefix(prefix_re, check, cursor, &mut line_number)
    {
        cursor = found.payload_start;

        match found.kind {
            DirectiveKind::MalformedNot => {
                errors.push(ParseError::new(
                    Span::empty(found.payload_start),
                    format!("unsupported -NOT combo on prefix '{}'", found.prefix),
                ));
                continue;
            }
            DirectiveKind::MalformedCount => {
                errors.push(ParseError::new(
                    Span::empty(found.payload_start),
                    format!(
                        "invalid count in -COUNT specification on prefix '{}'",
                        found.prefix
                    ),
                ));
                continue;
            }
            _ => {}
        }

        // The payload runs to end of line, leading whitespace skipped.
        let mut body_start = cursor;
        if !(config.strict_whitespace && config.match_full_lines) {
            body_start += check[cursor..]
                .bytes()
                .take_while(|b| *b == b' ' || *b == b'\t')
                .count();
        }
        let body_end = body_start
            + check[body_start..]
                .find(['\n', '\r'])
                .unwrap_or(check.len() - body_start);
        let body = &check[body_start..body_end];
        cursor = body_end;

        let pattern = match Pattern::parse(
            body,
            body_start,
            CheckLoc::File(Span::new(body_start, body_end)),
            found.kind,
            found.prefix,
            Some(line_number),
            ctx,
            config,
        ) {
            Ok(pattern) => pattern,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };

        if found.kind == DirectiveKind::Label && pattern.has_variable() {
            errors.push(ParseError::new(
                Span::empty(found.prefix_start),
                format!(
                    "found '{}-LABEL:' with variable definition or use",
                    found.prefix
                ),
            ));
            continue;
        }

        if matches!(
            found.kind,
            DirectiveKind::Next | DirectiveKind::Same | DirectiveKind::Empty
        ) && checks.is_empty()
        {
            let suffix = match found.kind {
                DirectiveKind::Next => "NEXT",
                DirectiveKind::Empty => "EMPTY",
                _ => "SAME",
            };
            errors.push(ParseError::new(
                Span::empty(found.prefix_start),
                format!(
                    "found '{prefix}-{suffix}' without previous '{prefix}: line",
                    prefix = found.prefix
                ),
            ));
            continue;
        }

        if matches!(found.kind, DirectiveKind::Dag | DirectiveKind::Not) {
            dag_not.push(pattern);
            continue;
        }

        checks.push(CheckString {
            pattern,
            prefix: found.prefix.to_string(),
            loc: CheckLoc::File(Span::empty(body_start)),
            dag_not: std::mem::replace(&mut dag_not, implicit_not.clone()),
        });
    }

    // Trailing NOT/DAG directives anchor to the end of input.
    if !dag_not.is_empty() {
        let prefix = config
            .check_prefixes
            .first()
            .cloned()
            .unwrap_or_else(|| "CHECK".to_string());
        checks.push(CheckString {
            pattern: Pattern::end_of_input(line_number + 1, check.len()),
            prefix,
            loc: CheckLoc::File(Span::empty(check.len())),
            dag_not,
        });
    }

    if errors.is_empty() { Ok(checks) } else { Err(errors) }
}

/// Runs every check string against the input. Returns false as soon as the
/// run is known to have failed; events and diagnostics describe why.
pub fn check_input(
    input: &str,
    checks: &[CheckString],
    ctx: &mut Context,
    config: &Config,
    events: &mut EventLog,
    diags: &mut Diagnostics,
) -> bool {
    let mut failed = false;
    let mut i = 0usize;
    let mut j = 0usize;
    let total = checks.len();
    let mut region_start = 0usize;

    loop {
        let region_end;
        if j == total {
            region_end = input.len();
        } else {
            if checks[j].pattern.kind() != DirectiveKind::Label {
                j += 1;
                continue;
            }
            // Scan ahead for the label bound. DAG/NOT processing waits for
            // the second pass over the bounded block, which re-checks the
            // label in normal mode.
            match checks[j].check(
                input,
                region_start..input.len(),
                true,
                ctx,
                config,
                events,
                diags,
            ) {
                Err(CheckFailed) => return false,
                Ok(range) => region_end = range.end,
            }
            j += 1;
        }

        // The first region keeps command-line variables alive; later ones
        // drop local state when scoping is on.
        if i != 0 && config.enable_var_scope {
            ctx.clear_local_vars();
        }

        let mut matching_cursor = region_start;
        while i != j {
            match checks[i].check(
                input,
                matching_cursor..region_end,
                false,
                ctx,
                config,
                events,
                diags,
            ) {
                Err(CheckFailed) => {
                    failed = true;
                    i = j;
                    break;
                }
                Ok(range) => {
                    matching_cursor = range.end;
                    i += 1;
                }
            }
        }

        region_start = region_end;
        if j == total {
            break;
        }
    }
    !failed
}

impl CheckString {
    /// Matches this anchor and its preceding NOT/DAG bag inside
    /// `input[region]`. Returns the anchor's matched range (absolute).
    ///
    /// In label-scan mode only the anchor pattern runs; DAG, NOT and
    /// adjacency processing is deferred to the second pass.
    fn check(
        &self,
        input: &str,
        region: std::ops::Range<usize>,
        label_scan: bool,
        ctx: &mut Context,
        config: &Config,
        events: &mut EventLog,
        diags: &mut Diagnostics,
    ) -> Result<std::ops::Range<usize>, CheckFailed> {
        let base = region.start;
        let buf = &input[region.clone()];

        let mut group_advance = 0usize;
        let mut nots: Vec<&Pattern> = Vec::new();
        if !label_scan {
            group_advance =
                self.check_dag(input, region.clone(), &mut nots, ctx, config, events, diags)?;
        }

        // COUNT repeats the anchor; every iteration starts after the
        // previous match's end.
        let count = self.pattern.kind().count();
        let mut last_match_end = group_advance;
        let mut first_match_pos = 0usize;
        for iteration in 1..=count {
            let search = &buf[last_match_end..];
            match self.pattern.match_at(search, ctx) {
                Err(err) => {
                    report_no_match(
                        true,
                        &self.prefix,
                        self.loc,
                        &self.pattern,
                        iteration,
                        input,
                        base + last_match_end,
                        region.end,
                        err,
                        ctx,
                        config,
                        events,
                        diags,
                    );
                    return Err(CheckFailed);
                }
                Ok((pos, len)) => {
                    report_match(
                        true,
                        &self.prefix,
                        self.loc,
                        &self.pattern,
                        iteration,
                        input,
                        base + last_match_end + pos,
                        len,
                        ctx,
                        config,
                        events,
                        diags,
                    );
                    if iteration == 1 {
                        first_match_pos = last_match_end + pos;
                    }
                    last_match_end += pos + len;
                }
            }
        }
        let total_len = last_match_end - first_match_pos;

        if !label_scan {
            let skipped = &buf[group_advance..first_match_pos];
            let wrong_line = self.check_next(
                skipped,
                base + group_advance,
                base + first_match_pos,
                diags,
            ) || self.check_same(skipped, base + group_advance, base + first_match_pos, diags);
            if wrong_line {
                record_event(
                    events,
                    MatchEvent {
                        directive: self.pattern.kind(),
                        check_loc: self.loc,
                        input_range: Span::new(
                            base + first_match_pos,
                            base + first_match_pos + total_len,
                        ),
                        kind: MatchKind::FoundButWrongLine,
                    },
                    config.verbose,
                );
                return Err(CheckFailed);
            }

            if self.check_not(
                input,
                base + group_advance..base + first_match_pos,
                &nots,
                ctx,
                config,
                events,
                diags,
            ) {
                return Err(CheckFailed);
            }
        }

        Ok(base + first_match_pos..base + last_match_end)
    }

    /// NEXT/EMPTY adjacency: exactly one newline may separate the previous
    /// match from this one. Returns true on violation.
    fn check_next(
        &self,
        skipped: &str,
        skipped_start: usize,
        match_start: usize,
        diags: &mut Diagnostics,
    ) -> bool {
        let kind = self.pattern.kind();
        if kind != DirectiveKind::Next && kind != DirectiveKind::Empty {
            return false;
        }
        let name = format!(
            "{}-{}",
            self.prefix,
            if kind == DirectiveKind::Empty {
                "EMPTY"
            } else {
                "NEXT"
            }
        );
        let (newlines, first_line_start) = text::count_newlines(skipped);
        let (source, span) = loc_parts(self.loc);
        if newlines == 0 {
            diags
                .error(
                    format!("{name}: is on the same line as previous match"),
                    source,
                    span,
                )
                .note(
                    SourceId::Input,
                    Some(Span::empty(match_start)),
                    "'next' match was here",
                )
                .note(
                    SourceId::Input,
                    Some(Span::empty(skipped_start)),
                    "previous match ended here",
                )
                .emit();
            return true;
        }
        if newlines != 1 {
            let mut builder = diags
                .error(
                    format!("{name}: is not on the line after the previous match"),
                    source,
                    span,
                )
                .note(
                    SourceId::Input,
                    Some(Span::empty(match_start)),
                    "'next' match was here",
                )
                .note(
                    SourceId::Input,
                    Some(Span::empty(skipped_start)),
                    "previous match ended here",
                );
            if let Some(line_start) = first_line_start {
                builder = builder.note(
                    SourceId::Input,
                    Some(Span::empty(skipped_start + line_start)),
                    "non-matching line after previous match is here",
                );
            }
            builder.emit();
            return true;
        }
        false
    }

    /// SAME adjacency: no newline may separate the previous match from this
    /// one. Returns true on violation.
    fn check_same(
        &self,
        skipped: &str,
        skipped_start: usize,
        match_start: usize,
        diags: &mut Diagnostics,
    ) -> bool {
        if self.pattern.kind() != DirectiveKind::Same {
            return false;
        }
        let (newlines, _) = text::count_newlines(skipped);
        if newlines != 0 {
            let (source, span) = loc_parts(self.loc);
            diags
                .error(
                    format!(
                        "{}-SAME: is not on the same line as the previous match",
                        self.prefix
                    ),
                    source,
                    span,
                )
                .note(
                    SourceId::Input,
                    Some(Span::empty(match_start)),
                    "'next' match was here",
                )
                .note(
                    SourceId::Input,
                    Some(Span::empty(skipped_start)),
                    "previous match ended here",
                )
                .emit();
            return true;
        }
        false
    }

    /// Verifies that no NOT pattern matches inside `input[region]`.
    /// Returns true when one does.
    fn check_not(
        &self,
        input: &str,
        region: std::ops::Range<usize>,
        nots: &[&Pattern],
        ctx: &mut Context,
        config: &Config,
        events: &mut EventLog,
        diags: &mut Diagnostics,
    ) -> bool {
        for pattern in nots {
            match pattern.match_at(&input[region.clone()], ctx) {
                Err(err) => {
                    report_no_match(
                        false,
                        &self.prefix,
                        pattern.loc(),
                        pattern,
                        1,
                        input,
                        region.start,
                        region.end,
                        err,
                        ctx,
                        config,
                        events,
                        diags,
                    );
                }
                Ok((pos, len)) => {
                    report_match(
                        false,
                        &self.prefix,
                        pattern.loc(),
                        pattern,
                        1,
                        input,
                        region.start + pos,
                        len,
                        ctx,
                        config,
                        events,
                        diags,
                    );
                    return true;
                }
            }
        }
        false
    }

    /// Matches this anchor's DAG patterns, with their interleaved NOT
    /// patterns, inside `input[region]`.
    ///
    /// DAG matches may land in any input order but must not overlap; an
    /// overlapping candidate is retried past the range it collided with.
    /// A NOT between two DAGs bounds a sub-group: the NOT patterns are
    /// checked against the region before the sub-group's first accepted
    /// range, then the search floor advances past the sub-group's last
    /// range. Trailing NOTs are left in `nots` for the caller.
    ///
    /// Returns the cursor advance (relative to the region start) from which
    /// the anchor itself should match.
    fn check_dag<'p>(
        &'p self,
        input: &str,
        region: std::ops::Range<usize>,
        nots: &mut Vec<&'p Pattern>,
        ctx: &mut Context,
        config: &Config,
        events: &mut EventLog,
        diags: &mut Diagnostics,
    ) -> Result<usize, CheckFailed> {
        if self.dag_not.is_empty() {
            return Ok(0);
        }
        let base = region.start;
        let buf = &input[region.clone()];

        // Search floor for the current sub-group.
        let mut group_start = 0usize;
        // Accepted, pairwise non-overlapping ranges, sorted by position.
        let mut ranges: Vec<(usize, usize)> = Vec::new();

        for (index, pattern) in self.dag_not.iter().enumerate() {
            if pattern.kind() == DirectiveKind::Not {
                nots.push(pattern);
                continue;
            }

            let mut match_pos = group_start;
            let mut match_len;
            let mut range_index = 0usize;
            loop {
                let (pos, len) = match pattern.match_at(&buf[match_pos..], ctx) {
                    Err(err) => {
                        report_no_match(
                            true,
                            &self.prefix,
                            pattern.loc(),
                            pattern,
                            1,
                            input,
                            base + match_pos,
                            region.end,
                            err,
                            ctx,
                            config,
                            events,
                            diags,
                        );
                        return Err(CheckFailed);
                    }
                    Ok(found) => found,
                };
                match_pos += pos;
                match_len = len;
                if config.very_verbose {
                    report_match(
                        true,
                        &self.prefix,
                        pattern.loc(),
                        pattern,
                        1,
                        input,
                        base + match_pos,
                        match_len,
                        ctx,
                        config,
                        events,
                        diags,
                    );
                }

                let candidate = (match_pos, match_pos + match_len);
                if config.allow_deprecated_dag_overlap {
                    // One encompassing range stands in for the whole group.
                    match ranges.first_mut() {
                        None => ranges.push(candidate),
                        Some(merged) => {
                            merged.0 = merged.0.min(candidate.0);
                            merged.1 = merged.1.max(candidate.1);
                        }
                    }
                    break;
                }

                let mut overlap = false;
                while range_index < ranges.len() {
                    if candidate.0 < ranges[range_index].1 {
                        overlap = ranges[range_index].0 < candidate.1;
                        break;
                    }
                    range_index += 1;
                }
                if !overlap {
                    ranges.insert(range_index, candidate);
                    break;
                }

                if config.very_verbose {
                    if let Some(last) = events.last_mut() {
                        last.kind = MatchKind::FoundButDiscarded;
                    }
                    let collided = ranges[range_index];
                    diags
                        .remark(
                            "match discarded, overlaps earlier DAG match here",
                            SourceId::Input,
                            Some(Span::new(base + collided.0, base + collided.1)),
                        )
                        .emit();
                }
                match_pos = ranges[range_index].1;
                range_index += 1;
            }

            if !config.very_verbose {
                report_match(
                    true,
                    &self.prefix,
                    pattern.loc(),
                    pattern,
                    1,
                    input,
                    base + match_pos,
                    match_len,
                    ctx,
                    config,
                    events,
                    diags,
                );
            }

            // End of a DAG sub-group: the next directive is a NOT, or the
            // bag is exhausted.
            let at_boundary = index + 1 == self.dag_not.len()
                || self.dag_not[index + 1].kind() == DirectiveKind::Not;
            if at_boundary {
                if !nots.is_empty() {
                    let bound = ranges.first().map(|r| r.0).unwrap_or(group_start);
                    if self.check_not(
                        input,
                        base + group_start..base + bound,
                        nots,
                        ctx,
                        config,
                        events,
                        diags,
                    ) {
                        return Err(CheckFailed);
                    }
                    nots.clear();
                }
                // Later sub-groups match after everything accepted so far;
                // overlaps before that are impossible.
                group_start = ranges.last().map(|r| r.1).unwrap_or(group_start);
                ranges.clear();
            }
        }

        Ok(group_start)
    }
}

fn loc_parts(loc: CheckLoc) -> (SourceId, Option<Span>) {
    match loc {
        CheckLoc::File(span) => (SourceId::CheckFile, Some(span)),
        CheckLoc::CommandLine => (SourceId::CommandLine, None),
    }
}

/// Appends an event, or retargets the kind of the one just recorded (used
/// when a verbose success event turns out to be a wrong-line failure).
fn record_event(events: &mut EventLog, event: MatchEvent, adjust_prev: bool) {
    if adjust_prev && let Some(last) = events.last_mut() {
        last.kind = event.kind;
        return;
    }
    events.push(event);
}

fn add_substitution_notes<'a>(
    mut builder: DiagnosticBuilder<'a>,
    pattern: &Pattern,
    ctx: &Context,
) -> DiagnosticBuilder<'a> {
    let PatternBody::Regex { substitutions, .. } = pattern.body() else {
        return builder;
    };
    for id in substitutions {
        let from = &ctx.substitution(*id).from;
        builder = match ctx.resolve_substitution(*id) {
            Ok(value) => builder.note(
                SourceId::CommandLine,
                None,
                format!("with \"{from}\" equal to \"{value}\""),
            ),
            Err(undefined) => builder.note(
                SourceId::CommandLine,
                None,
                format!("uses undefined variable(s): {undefined}"),
            ),
        };
    }
    builder
}

/// Records a successful match of `pattern`, subject to verbosity gating:
/// expected matches only produce remarks under `verbose`, excluded matches
/// are failures and always reported.
#[allow(clippy::too_many_arguments)]
fn report_match(
    expected: bool,
    prefix: &str,
    loc: CheckLoc,
    pattern: &Pattern,
    matched_count: u32,
    _input: &str,
    abs_pos: usize,
    len: usize,
    ctx: &Context,
    config: &Config,
    events: &mut EventLog,
    diags: &mut Diagnostics,
) {
    if expected {
        if !config.verbose {
            return;
        }
        if !config.very_verbose && pattern.kind() == DirectiveKind::EndOfInput {
            return;
        }
    }

    let range = Span::new(abs_pos, abs_pos + len);
    record_event(
        events,
        MatchEvent {
            directive: pattern.kind(),
            check_loc: loc,
            input_range: range,
            kind: if expected {
                MatchKind::FoundAndExpected
            } else {
                MatchKind::FoundButExcluded
            },
        },
        false,
    );

    let mut message = format!(
        "{}: {} string found in input",
        pattern.kind().description(prefix),
        if expected { "expected" } else { "excluded" },
    );
    if pattern.kind().count() > 1 {
        message.push_str(&format!(
            " ({matched_count} out of {})",
            pattern.kind().count()
        ));
    }
    let (source, span) = loc_parts(loc);
    let builder = if expected {
        diags.remark(message, source, span)
    } else {
        diags.error(message, source, span)
    };
    let builder = builder.note(SourceId::Input, Some(range), "found here");
    add_substitution_notes(builder, pattern, ctx).emit();
}

/// Records a failed match of `pattern`. For expected patterns this is a
/// run failure with a "scanning from here" note and a fuzzy suggestion;
/// for excluded patterns it is only a remark under `very_verbose`.
#[allow(clippy::too_many_arguments)]
fn report_no_match(
    expected: bool,
    prefix: &str,
    loc: CheckLoc,
    pattern: &Pattern,
    matched_count: u32,
    input: &str,
    search_start: usize,
    search_end: usize,
    err: MatchError,
    ctx: &Context,
    config: &Config,
    events: &mut EventLog,
    diags: &mut Diagnostics,
) {
    if !expected && !config.very_verbose {
        return;
    }

    // Report the search from the first content byte.
    let bytes = input.as_bytes();
    let mut start = search_start;
    while start < search_end && matches!(bytes[start], b' ' | b'\t' | b'\n' | b'\r') {
        start += 1;
    }
    let range = Span::new(start, search_end);
    record_event(
        events,
        MatchEvent {
            directive: pattern.kind(),
            check_loc: loc,
            input_range: range,
            kind: if expected {
                MatchKind::NoneButExpected
            } else {
                MatchKind::NoneAndExcluded
            },
        },
        false,
    );

    let (source, span) = loc_parts(loc);
    if !err.is_not_found() {
        // Overflow and compile failures carry their own message.
        diags.error(err.to_string(), source, span).emit();
        return;
    }

    let mut message = format!(
        "{}: {} string not found in input",
        pattern.kind().description(prefix),
        if expected { "expected" } else { "excluded" },
    );
    if pattern.kind().count() > 1 {
        message.push_str(&format!(
            " ({matched_count} out of {})",
            pattern.kind().count()
        ));
    }
    let builder = if expected {
        diags.error(message, source, span)
    } else {
        diags.remark(message, source, span)
    };
    let builder = builder.note(
        SourceId::Input,
        Some(Span::empty(start)),
        "scanning from here",
    );
    add_substitution_notes(builder, pattern, ctx).emit();

    if expected && let Some(offset) = pattern.fuzzy_match_offset(&input[start..search_end]) {
        let at = start + offset;
        record_event(
            events,
            MatchEvent {
                directive: pattern.kind(),
                check_loc: loc,
                input_range: Span::empty(at),
                kind: MatchKind::Fuzzy,
            },
            false,
        );
        diags
            .remark(
                "possible intended match here",
                SourceId::Input,
                Some(Span::empty(at)),
            )
            .emit();
    }
}
