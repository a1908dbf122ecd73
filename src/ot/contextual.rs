use ttf_parser::{GlyphId, LazyArray16};

use super::matching::{match_backtrack, match_input, match_lookahead, MatchFunc, MatchedInput};
use super::{Apply, ApplyContext, MAX_CONTEXT_LENGTH};
use crate::tables::gsubgpos::*;
use crate::Error;

fn value_at(values: LazyArray16<u16>, index: usize) -> Option<u16> {
    values.get(u16::try_from(index).ok()?)
}

pub(super) fn match_glyph<'b>(values: LazyArray16<'b, u16>) -> impl Fn(GlyphId, usize) -> bool + 'b {
    move |glyph, index| value_at(values, index) == Some(glyph.0)
}

fn match_class<'b>(
    classes: &'b ClassDef<'b>,
    values: LazyArray16<'b, u16>,
) -> impl Fn(GlyphId, usize) -> bool + 'b {
    move |glyph, index| value_at(values, index) == Some(classes.get(glyph))
}

pub(super) fn match_coverage<'b>(coverages: &'b [Coverage<'b>]) -> impl Fn(GlyphId, usize) -> bool + 'b {
    move |glyph, index| coverages.get(index).is_some_and(|coverage| coverage.contains(glyph))
}

impl Apply for ContextLookup<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        let glyph = ctx.cur().glyph_id;
        match self {
            Self::Format1 { coverage, sets } => {
                let Some(Some(set)) = coverage.get(glyph).and_then(|i| sets.get(usize::from(i)))
                else {
                    return Ok(false);
                };

                for rule in set {
                    let input = usize::from(rule.input.len());
                    if apply_context(ctx, input, &match_glyph(rule.input), rule.lookups)? {
                        return Ok(true);
                    }
                }

                Ok(false)
            }
            Self::Format2 { coverage, classes, sets } => {
                if !coverage.contains(glyph) {
                    return Ok(false);
                }

                let class = classes.get(glyph);
                let Some(Some(set)) = sets.get(usize::from(class)) else {
                    return Ok(false);
                };

                for rule in set {
                    let input = usize::from(rule.input.len());
                    if apply_context(ctx, input, &match_class(classes, rule.input), rule.lookups)? {
                        return Ok(true);
                    }
                }

                Ok(false)
            }
            Self::Format3 { coverage, coverages, lookups } => {
                if !coverage.contains(glyph) {
                    return Ok(false);
                }

                let input = coverages.len();
                apply_context(ctx, input, &match_coverage(coverages), *lookups)
            }
        }
    }
}

impl Apply for ChainContextLookup<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        let glyph = ctx.cur().glyph_id;
        match self {
            Self::Format1 { coverage, sets } => {
                let Some(Some(set)) = coverage.get(glyph).and_then(|i| sets.get(usize::from(i)))
                else {
                    return Ok(false);
                };

                for rule in set {
                    let matched = apply_chain_context(
                        ctx,
                        rule,
                        [
                            &match_glyph(rule.backtrack),
                            &match_glyph(rule.input),
                            &match_glyph(rule.lookahead),
                        ],
                    )?;

                    if matched {
                        return Ok(true);
                    }
                }

                Ok(false)
            }
            Self::Format2 {
                coverage,
                backtrack_classes,
                input_classes,
                lookahead_classes,
                sets,
            } => {
                if !coverage.contains(glyph) {
                    return Ok(false);
                }

                let class = input_classes.get(glyph);
                let Some(Some(set)) = sets.get(usize::from(class)) else {
                    return Ok(false);
                };

                for rule in set {
                    let matched = apply_chain_context(
                        ctx,
                        rule,
                        [
                            &match_class(backtrack_classes, rule.backtrack),
                            &match_class(input_classes, rule.input),
                            &match_class(lookahead_classes, rule.lookahead),
                        ],
                    )?;

                    if matched {
                        return Ok(true);
                    }
                }

                Ok(false)
            }
            Self::Format3 {
                coverage,
                backtrack_coverages,
                input_coverages,
                lookahead_coverages,
                lookups,
            } => {
                if !coverage.contains(glyph) {
                    return Ok(false);
                }

                let Some(matched) =
                    match_input(ctx, input_coverages.len(), &match_coverage(input_coverages))
                else {
                    return Ok(false);
                };

                let backtrack = match_backtrack(
                    ctx,
                    backtrack_coverages.len(),
                    &match_coverage(backtrack_coverages),
                );
                let lookahead = match_lookahead(
                    ctx,
                    lookahead_coverages.len(),
                    &match_coverage(lookahead_coverages),
                    matched.end,
                );

                if backtrack.is_none() || lookahead.is_none() {
                    return Ok(false);
                }

                apply_lookup(ctx, matched, *lookups)?;
                Ok(true)
            }
        }
    }
}

fn apply_context(
    ctx: &mut ApplyContext,
    input_len: usize,
    match_func: &MatchFunc,
    lookups: LazyArray16<LookupRecord>,
) -> Result<bool, Error> {
    match match_input(ctx, input_len, match_func) {
        Some(matched) => {
            apply_lookup(ctx, matched, lookups)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn apply_chain_context(
    ctx: &mut ApplyContext,
    rule: &ChainRule,
    match_funcs: [&MatchFunc; 3],
) -> Result<bool, Error> {
    let Some(matched) = match_input(ctx, usize::from(rule.input.len()), match_funcs[1]) else {
        return Ok(false);
    };

    if match_backtrack(ctx, usize::from(rule.backtrack.len()), match_funcs[0]).is_none() {
        return Ok(false);
    }

    let lookahead_len = usize::from(rule.lookahead.len());
    if match_lookahead(ctx, lookahead_len, match_funcs[2], matched.end).is_none() {
        return Ok(false);
    }

    apply_lookup(ctx, matched, rule.lookups)?;
    Ok(true)
}

/// Applies the nested lookups of a matched rule.
///
/// A nested lookup runs at its matched position and cannot look or match
/// past the end of the match. Nested lookups may change the collection
/// length. Matched positions after the one a nested lookup ran at are
/// shifted by the length delta, so later records still address the
/// intended glyphs. The index ends up right after the (adjusted) match.
fn apply_lookup(
    ctx: &mut ApplyContext,
    mut matched: MatchedInput,
    lookups: LazyArray16<LookupRecord>,
) -> Result<(), Error> {
    let mut count = matched.count;
    let mut end = matched.end;

    for record in lookups {
        let idx = usize::from(record.sequence_index);
        if idx >= count {
            continue;
        }

        // Don't recurse to ourself at the same position.
        // Longer loops are caught by the nesting and operation limits.
        if idx == 0 && record.lookup_index == ctx.lookup_index {
            continue;
        }

        let pos = matched.positions[idx];
        if pos >= ctx.end || ctx.budget.is_exhausted() {
            break;
        }

        // The nested lookup only sees the rest of the matched span.
        let orig_len = ctx.glyphs.len();
        let segment_end = ctx.end;
        ctx.index = pos;
        ctx.end = end;
        let applied = ctx.recurse(record.lookup_index);
        let mut delta = ctx.glyphs.len() as isize - orig_len as isize;
        ctx.end = segment_end.saturating_add_signed(delta);

        if !applied? || delta == 0 {
            continue;
        }

        // A grown collection is assumed to have new glyphs right after the
        // current position. A shrunk one is assumed to have lost the match
        // positions right after it.

        let new_end = end as isize + delta;
        if new_end <= pos as isize {
            // Never rewind past the current position.
            end = pos;
            break;
        }
        end = new_end as usize;

        let mut next = idx + 1;
        if delta > 0 {
            if delta as usize + count > MAX_CONTEXT_LENGTH {
                break;
            }
        } else {
            delta = delta.max(next as isize - count as isize);
            next = (next as isize - delta) as usize;
        }

        matched.positions.copy_within(next..count, (next as isize + delta) as usize);
        next = (next as isize + delta) as usize;
        count = (count as isize + delta) as usize;

        for j in idx + 1..next {
            matched.positions[j] = matched.positions[j - 1] + 1;
        }

        while next < count {
            matched.positions[next] = (matched.positions[next] as isize + delta) as usize;
            next += 1;
        }
    }

    ctx.index = end.min(ctx.end);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::GlyphSubstitutionCollection;
    use crate::ot::{Budget, TableIndex};
    use crate::tables::writer::coverage;
    use crate::{Direction, Face, FontMetrics, LayoutTables};

    struct Metrics;

    impl FontMetrics for Metrics {
        fn glyph_index(&self, _: char) -> Option<GlyphId> {
            None
        }

        fn advance(&self, _: GlyphId, _: Direction) -> i32 {
            0
        }

        fn units_per_em(&self) -> u16 {
            1000
        }
    }

    fn chain_rule_matches(input: &[u16], run: &[u16]) -> bool {
        let first = coverage(&input[..1]);
        let rest: Vec<Vec<u16>> = input[1..].iter().map(|g| vec![*g]).collect();
        let rest_data: Vec<Vec<u8>> = rest.iter().map(|g| coverage(g)).collect();

        let lookup = ChainContextLookup::Format3 {
            coverage: Coverage::parse(&first).unwrap(),
            backtrack_coverages: Vec::new(),
            input_coverages: rest_data.iter().map(|d| Coverage::parse(d).unwrap()).collect(),
            lookahead_coverages: Vec::new(),
            lookups: LazyArray16::new(&[]),
        };

        let face = Face::from_tables(LayoutTables::default(), Metrics).unwrap();
        let mut glyphs = GlyphSubstitutionCollection::new();
        for (i, id) in run.iter().enumerate() {
            glyphs.add_glyph(GlyphId(*id), 'a', i as u32, Direction::LeftToRight);
        }

        let mut budget = Budget::new(run.len());
        let len = glyphs.len();
        let mut ctx = ApplyContext::new(TableIndex::GSUB, &face, &mut glyphs, &mut budget, 0, len);
        let applied = lookup.apply(&mut ctx).unwrap();
        if applied {
            assert_eq!(ctx.index, input.len());
        }
        applied
    }

    #[test]
    fn chained_input_sequence() {
        assert!(chain_rule_matches(&[1, 2], &[1, 2, 3]));
        assert!(!chain_rule_matches(&[1, 3], &[1, 2, 3]));
        assert!(!chain_rule_matches(&[2], &[1, 2, 3]));
        assert!(chain_rule_matches(&[1], &[1, 2, 3]));
    }

    #[test]
    fn glyph_values_match_by_position() {
        let data = [0, 5, 0, 7];
        let matches = match_glyph(LazyArray16::new(&data));
        assert!(matches(GlyphId(5), 0));
        assert!(matches(GlyphId(7), 1));
        assert!(!matches(GlyphId(7), 0));
        assert!(!matches(GlyphId(5), 2));
    }
}
