//! Glyph positioning.

use log::{trace, warn};

use super::{apply_string, next_segment, trace_segment, Apply, ApplyContext, Budget, TableIndex};
use super::SkipPolicy;
use crate::buffer::{GlyphFlags, GlyphPositioningCollection, GlyphShapingData};
use crate::complex::{MarkZeroingMode, Shaper, ShaperKind};
use crate::tables::gpos::*;
use crate::tables::gsubgpos::LookupFlags;
use crate::{Direction, Error, Face};

/// Applies the `GPOS` table to a glyph run.
///
/// Returns `false` when the face has no `GPOS` table or no lookup changed
/// anything. Mark advances are zeroed as the segment's shaper requires, and
/// the attachment offsets are resolved at the end.
pub fn try_update_positions(
    face: &Face,
    collection: &mut GlyphPositioningCollection,
) -> Result<bool, Error> {
    let Some(gpos) = face.gpos.as_ref() else {
        return Ok(false);
    };

    let glyphs = collection.as_mut_inner();
    let mut budget = Budget::new(glyphs.len());
    let mut updated = false;

    let mut start = 0;
    while start < glyphs.len() {
        let segment = next_segment(glyphs, start);
        let script = gpos.select_script(segment.script);

        let kind = ShaperKind::select(segment.script, script.map(|s| s.tag));
        let shaper = Shaper::new(kind, glyphs[start].direction, &glyphs.user_features);
        trace_segment(TableIndex::GPOS, &segment, script, &shaper);
        shaper.assign_features(glyphs, segment.start, segment.end - segment.start);

        let zeroing = shaper.mark_zeroing_mode();
        if zeroing == MarkZeroingMode::PreGpos {
            zero_mark_advances(face, &mut glyphs.glyphs_mut()[segment.start..segment.end]);
        }

        if let Some(script) = script.filter(|_| !budget.is_exhausted()) {
            'stages: for stage in shaper.stages() {
                let lookups = gpos.feature_lookups(stage.feature, script, glyphs.language);
                if !lookups.is_empty() {
                    trace!("GPOS stage {}: {} lookups", stage.feature, lookups.len());
                }

                for feature_lookup in lookups {
                    let lookup = feature_lookup.lookup;
                    let mut ctx = ApplyContext::new(
                        TableIndex::GPOS,
                        face,
                        glyphs,
                        &mut budget,
                        segment.start,
                        segment.end,
                    );
                    ctx.set_lookup(feature_lookup.feature, feature_lookup.index, lookup);
                    updated |= apply_string(&mut ctx, lookup, false)?;

                    if budget.is_exhausted() {
                        warn!("positioning stopped: shaping limits reached");
                        break 'stages;
                    }
                }
            }
        }

        if zeroing == MarkZeroingMode::PostGpos {
            zero_mark_advances(face, &mut glyphs.glyphs_mut()[segment.start..segment.end]);
        }

        start = segment.end;
    }

    fix_mark_attachment(glyphs.glyphs_mut());
    Ok(updated)
}

fn zero_mark_advances(face: &Face, glyphs: &mut [GlyphShapingData]) {
    for glyph in glyphs {
        if face.is_mark(glyph) {
            glyph.position.x_advance = 0;
            glyph.position.y_advance = 0;
        }
    }
}

/// Resolves attachment offsets.
///
/// An attached mark stores its anchor delta relative to the base origin. It
/// becomes an offset from the mark's own pen position: the base offsets are
/// added, and the advances between the base and the mark are taken out
/// (left-to-right) or put back (right-to-left). A cursive child inherits its
/// parent's cross-stream offset.
///
/// Must run exactly once per run.
pub(crate) fn fix_mark_attachment(glyphs: &mut [GlyphShapingData]) {
    let mut resolved = vec![false; glyphs.len()];
    let mut chain = Vec::new();

    for i in 0..glyphs.len() {
        // Climb to the first resolved glyph, then resolve back down.
        let mut current = i;
        while !resolved[current] {
            resolved[current] = true;
            chain.push(current);
            match attachment(glyphs, current) {
                Some(Attachment::Mark(j) | Attachment::Cursive(j)) => current = j,
                None => break,
            }
        }

        while let Some(child) = chain.pop() {
            propagate_attachment_offsets(glyphs, child);
        }
    }
}

#[derive(Clone, Copy)]
enum Attachment {
    Mark(usize),
    Cursive(usize),
}

fn attachment(glyphs: &[GlyphShapingData], i: usize) -> Option<Attachment> {
    let valid = |j: &usize| *j < glyphs.len() && *j != i;
    match glyphs[i].mark_attachment.filter(valid) {
        Some(j) => Some(Attachment::Mark(j)),
        None => glyphs[i].cursive_attachment.filter(valid).map(Attachment::Cursive),
    }
}

/// Adds the offsets of an already resolved parent to glyph `i`.
fn propagate_attachment_offsets(glyphs: &mut [GlyphShapingData], i: usize) {
    match attachment(glyphs, i) {
        Some(Attachment::Mark(j)) => {
            let base = glyphs[j].position;
            let mut x = base.x_offset;
            let mut y = base.y_offset;
            if glyphs[i].direction.is_forward() {
                for glyph in &glyphs[j.min(i)..i] {
                    x -= glyph.position.x_advance;
                    y -= glyph.position.y_advance;
                }
            } else {
                for glyph in glyphs.get(j + 1..=i).unwrap_or_default() {
                    x += glyph.position.x_advance;
                    y += glyph.position.y_advance;
                }
            }

            glyphs[i].position.x_offset += x;
            glyphs[i].position.y_offset += y;
        }
        Some(Attachment::Cursive(j)) => {
            let parent = glyphs[j].position;
            if glyphs[i].direction.is_horizontal() {
                glyphs[i].position.y_offset += parent.y_offset;
            } else {
                glyphs[i].position.x_offset += parent.x_offset;
            }
        }
        None => {}
    }
}

impl Apply for PosLookup<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        for subtable in &self.subtables {
            if subtable.apply(ctx)? {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

impl Apply for PosLookupSubtable<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        match self {
            Self::Single(t) => t.apply(ctx),
            Self::Pair(t) => t.apply(ctx),
            Self::Cursive(t) => t.apply(ctx),
            Self::MarkBase(t) => t.apply(ctx),
            Self::MarkLig(t) => t.apply(ctx),
            Self::MarkMark(t) => t.apply(ctx),
            Self::Context(t) => t.apply(ctx),
            Self::ChainContext(t) => t.apply(ctx),
        }
    }
}

/// Adds a value record to a glyph. Returns `true` when anything changed.
fn apply_value(glyph: &mut GlyphShapingData, value: ValueRecord) -> bool {
    let horizontal = glyph.direction.is_horizontal();
    let pos = &mut glyph.position;

    pos.x_offset += i32::from(value.x_placement);
    pos.y_offset += i32::from(value.y_placement);
    if horizontal {
        pos.x_advance += i32::from(value.x_advance);
    } else {
        // Vertical advances grow downwards.
        pos.y_advance -= i32::from(value.y_advance);
    }

    let worked = value != ValueRecord::default();
    if worked {
        glyph.flags |= GlyphFlags::POSITIONED;
    }

    worked
}

impl Apply for SinglePos<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        let glyph = ctx.cur().glyph_id;
        let Some(value) = self.coverage().get(glyph).and_then(|index| self.value(index)) else {
            return Ok(false);
        };

        apply_value(&mut ctx.glyphs[ctx.index], value);
        ctx.index += 1;
        Ok(true)
    }
}

impl Apply for PairPos<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        let first = ctx.cur().glyph_id;
        let Some(index) = self.coverage().get(first) else {
            return Ok(false);
        };

        let Some(pos) = ctx.skippy(ctx.index).next() else {
            return Ok(false);
        };

        let second = ctx.glyphs[pos].glyph_id;
        let Some([value1, value2]) = self.get(index, first, second) else {
            return Ok(false);
        };

        apply_value(&mut ctx.glyphs[ctx.index], value1);
        apply_value(&mut ctx.glyphs[pos], value2);

        // The second glyph may start the next pair unless it got a value.
        let flags = self.flags();
        ctx.index = pos + usize::from(!flags[1].is_empty());
        Ok(true)
    }
}

impl Apply for CursivePos<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        let this = ctx.cur().glyph_id;
        let Some(entry) = self.coverage.get(this).and_then(|index| self.entry(index)) else {
            return Ok(false);
        };

        let Some(i) = ctx.skippy(ctx.index).prev() else {
            return Ok(false);
        };

        let prev = ctx.glyphs[i].glyph_id;
        let Some(exit) = self.coverage.get(prev).and_then(|index| self.exit(index)) else {
            return Ok(false);
        };

        let j = ctx.index;
        let (exit_x, exit_y) = (i32::from(exit.x), i32::from(exit.y));
        let (entry_x, entry_y) = (i32::from(entry.x), i32::from(entry.y));
        let direction = ctx.glyphs[j].direction;
        let right_to_left = ctx.policy.flags().contains(LookupFlags::RIGHT_TO_LEFT);
        let glyphs = ctx.glyphs.glyphs_mut();

        match direction {
            Direction::LeftToRight => {
                glyphs[i].position.x_advance = exit_x + glyphs[i].position.x_offset;
                let d = entry_x + glyphs[j].position.x_offset;
                glyphs[j].position.x_advance -= d;
                glyphs[j].position.x_offset -= d;
            }
            Direction::RightToLeft => {
                let d = exit_x + glyphs[i].position.x_offset;
                glyphs[i].position.x_advance -= d;
                glyphs[i].position.x_offset -= d;
                glyphs[j].position.x_advance = entry_x + glyphs[j].position.x_offset;
            }
            Direction::TopToBottom => {
                glyphs[i].position.y_advance = exit_y + glyphs[i].position.y_offset;
                let d = entry_y + glyphs[j].position.y_offset;
                glyphs[j].position.y_advance -= d;
                glyphs[j].position.y_offset -= d;
            }
            Direction::BottomToTop => {
                let d = exit_y + glyphs[i].position.y_offset;
                glyphs[i].position.y_advance -= d;
                glyphs[i].position.y_offset -= d;
                glyphs[j].position.y_advance = entry_y;
            }
        }

        // Cross-stream: the current glyph hangs off the previous one, unless
        // the lookup says the chain runs the other way.
        let mut child = i;
        let mut parent = j;
        let mut x_offset = entry_x - exit_x;
        let mut y_offset = entry_y - exit_y;
        if !right_to_left {
            core::mem::swap(&mut child, &mut parent);
            x_offset = -x_offset;
            y_offset = -y_offset;
        }

        // An existing chain through the child is reversed first, so that
        // attachments never form a cycle.
        reverse_cursive_minor_offset(glyphs, child, direction, parent);

        glyphs[child].cursive_attachment = Some(parent);
        glyphs[child].mark_attachment = None;
        if direction.is_horizontal() {
            glyphs[child].position.y_offset = y_offset;
        } else {
            glyphs[child].position.x_offset = x_offset;
        }

        if glyphs[parent].cursive_attachment == Some(child) {
            glyphs[parent].cursive_attachment = None;
        }

        glyphs[i].flags |= GlyphFlags::POSITIONED;
        glyphs[j].flags |= GlyphFlags::POSITIONED;

        ctx.index += 1;
        Ok(true)
    }
}

fn reverse_cursive_minor_offset(
    glyphs: &mut [GlyphShapingData],
    i: usize,
    direction: Direction,
    new_parent: usize,
) {
    let Some(j) = glyphs[i].cursive_attachment.take() else {
        return;
    };

    if j == new_parent || j >= glyphs.len() {
        return;
    }

    reverse_cursive_minor_offset(glyphs, j, direction, new_parent);

    if direction.is_horizontal() {
        glyphs[j].position.y_offset = -glyphs[i].position.y_offset;
    } else {
        glyphs[j].position.x_offset = -glyphs[i].position.x_offset;
    }

    glyphs[j].cursive_attachment = Some(i);
}

impl Apply for MarkBasePos<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        let mark_glyph = ctx.cur().glyph_id;
        let Some(mark_index) = self.mark_coverage.get(mark_glyph) else {
            return Ok(false);
        };

        // Search backwards for a non-mark glyph. Components of a multiplied
        // glyph are skipped, so the mark lands on the first one.
        let base = {
            let mut iter = ctx.skippy(ctx.index);
            iter.reset(ctx.index, SkipPolicy::ignore_marks());
            loop {
                let Some(idx) = iter.prev() else {
                    return Ok(false);
                };

                let glyph = &ctx.glyphs[idx];
                let keep_searching = glyph.flags.contains(GlyphFlags::MULTIPLIED)
                    && glyph.lig_comp != 0
                    && idx > 0
                    && !ctx.face.is_mark(&ctx.glyphs[idx - 1])
                    && glyph.lig_id == ctx.glyphs[idx - 1].lig_id
                    && glyph.lig_comp == ctx.glyphs[idx - 1].lig_comp.wrapping_add(1);

                if !keep_searching {
                    break idx;
                }
            }
        };

        let Some(base_index) = self.base_coverage.get(ctx.glyphs[base].glyph_id) else {
            return Ok(false);
        };

        Ok(apply_mark_anchor(ctx, &self.marks, &self.base_matrix, mark_index, base_index, base))
    }
}

impl Apply for MarkLigPos<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        let mark_glyph = ctx.cur().glyph_id;
        let Some(mark_index) = self.mark_coverage.get(mark_glyph) else {
            return Ok(false);
        };

        let lig = {
            let mut iter = ctx.skippy(ctx.index);
            iter.reset(ctx.index, SkipPolicy::ignore_marks());
            match iter.prev() {
                Some(idx) => idx,
                None => return Ok(false),
            }
        };

        let Some(lig_index) = self.lig_coverage.get(ctx.glyphs[lig].glyph_id) else {
            return Ok(false);
        };

        let Some(lig_attach) = self.lig_array.get(usize::from(lig_index)) else {
            return Ok(false);
        };

        let comp_count = lig_attach.rows;
        if comp_count == 0 {
            return Ok(false);
        }

        // Marks that were part of the ligature sequence remember the
        // component they followed. Other marks go on the last component.
        let lig_id = ctx.glyphs[lig].lig_id;
        let mark = ctx.cur();
        let mark_comp = u16::from(mark.lig_comp);
        let comp_index = if lig_id != 0 && lig_id == mark.lig_id && mark_comp > 0 {
            mark_comp.min(comp_count)
        } else {
            comp_count
        } - 1;

        Ok(apply_mark_anchor(ctx, &self.marks, lig_attach, mark_index, comp_index, lig))
    }
}

impl Apply for MarkMarkPos<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        let mark1_glyph = ctx.cur().glyph_id;
        let Some(mark1_index) = self.mark1_coverage.get(mark1_glyph) else {
            return Ok(false);
        };

        let prev = {
            let mut iter = ctx.skippy(ctx.index);
            iter.reset(ctx.index, ctx.policy.without_ignore_flags());
            match iter.prev() {
                Some(idx) => idx,
                None => return Ok(false),
            }
        };

        if !ctx.face.is_mark(&ctx.glyphs[prev]) {
            return Ok(false);
        }

        let mark1 = ctx.cur();
        let mark2 = &ctx.glyphs[prev];
        let (id1, id2) = (mark1.lig_id, mark2.lig_id);
        let (comp1, comp2) = (mark1.lig_comp, mark2.lig_comp);

        let matches = if id1 == id2 {
            // Marks on the same base, or on the same ligature component.
            id1 == 0 || comp1 == comp2
        } else {
            // One of the marks was ligated itself and the other belongs to
            // the ligature.
            (id1 > 0 && comp1 == 0) || (id2 > 0 && comp2 == 0)
        };

        if !matches {
            return Ok(false);
        }

        let Some(mark2_index) = self.mark2_coverage.get(mark2.glyph_id) else {
            return Ok(false);
        };

        Ok(apply_mark_anchor(
            ctx,
            &self.marks,
            &self.mark2_matrix,
            mark1_index,
            mark2_index,
            prev,
        ))
    }
}

/// Attaches the current mark to the glyph at `base`.
///
/// A missing anchor on either side leaves everything untouched.
fn apply_mark_anchor(
    ctx: &mut ApplyContext,
    marks: &MarkArray,
    matrix: &AnchorMatrix,
    mark_index: u16,
    row: u16,
    base: usize,
) -> bool {
    let Some((class, mark_anchor)) = marks.get(mark_index) else {
        return false;
    };

    let Some(base_anchor) = matrix.get(row, class) else {
        return false;
    };

    apply_anchor(&mut ctx.glyphs[ctx.index], base, base_anchor, mark_anchor);
    ctx.index += 1;
    true
}

/// Places a mark by the difference of two anchors.
///
/// The offset is relative to the base origin until
/// [`fix_mark_attachment`] runs.
fn apply_anchor(mark: &mut GlyphShapingData, base: usize, base_anchor: Anchor, mark_anchor: Anchor) {
    mark.position.x_offset = i32::from(base_anchor.x) - i32::from(mark_anchor.x);
    mark.position.y_offset = i32::from(base_anchor.y) - i32::from(mark_anchor.y);
    mark.mark_attachment = Some(base);
    mark.cursive_attachment = None;
    mark.flags |= GlyphFlags::POSITIONED;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ttf_parser::GlyphId;

    fn glyph(c: char, advance: i32, direction: Direction) -> GlyphShapingData {
        let mut glyph = GlyphShapingData::new(GlyphId(1), c, 0, direction);
        glyph.position.x_advance = advance;
        glyph
    }

    fn pen_x(glyphs: &[GlyphShapingData], index: usize) -> i32 {
        glyphs[..index].iter().map(|g| g.position.x_advance).sum()
    }

    #[test]
    fn mark_lands_on_base_anchor() {
        let mut glyphs = vec![
            glyph('a', 400, Direction::LeftToRight),
            glyph('b', 300, Direction::LeftToRight),
            glyph('c', 500, Direction::LeftToRight),
            glyph('\u{0301}', 0, Direction::LeftToRight),
        ];
        glyphs[3].position.x_offset = 10;
        glyphs[3].position.y_offset = 5;
        glyphs[3].mark_attachment = Some(2);

        fix_mark_attachment(&mut glyphs);

        assert_eq!(glyphs[3].position.x_offset, -490);
        assert_eq!(glyphs[3].position.y_offset, 5);
        let drawn = pen_x(&glyphs, 3) + glyphs[3].position.x_offset;
        assert_eq!(drawn - pen_x(&glyphs, 2), 10);
    }

    #[test]
    fn intervening_glyphs_are_subtracted() {
        let mut glyphs = vec![
            glyph('a', 500, Direction::LeftToRight),
            glyph('\u{0300}', 0, Direction::LeftToRight),
            glyph('\u{0301}', 0, Direction::LeftToRight),
        ];
        glyphs[0].position.x_offset = 7;
        glyphs[1].position.x_advance = 100;
        glyphs[2].position.x_offset = 10;
        glyphs[2].mark_attachment = Some(0);

        fix_mark_attachment(&mut glyphs);

        let drawn = pen_x(&glyphs, 2) + glyphs[2].position.x_offset;
        assert_eq!(drawn, 17);
    }

    #[test]
    fn right_to_left_adds_advances() {
        let mut glyphs = vec![
            glyph('\u{0628}', 500, Direction::RightToLeft),
            glyph('\u{064E}', 20, Direction::RightToLeft),
        ];
        glyphs[1].position.x_offset = 10;
        glyphs[1].mark_attachment = Some(0);

        fix_mark_attachment(&mut glyphs);
        assert_eq!(glyphs[1].position.x_offset, 30);
    }

    #[test]
    fn mark_chains_resolve_in_order() {
        let mut glyphs = vec![
            glyph('a', 500, Direction::LeftToRight),
            glyph('\u{0301}', 0, Direction::LeftToRight),
            glyph('\u{0301}', 0, Direction::LeftToRight),
        ];
        glyphs[1].position.x_offset = 10;
        glyphs[1].mark_attachment = Some(0);
        glyphs[2].position.x_offset = 1;
        glyphs[2].mark_attachment = Some(1);

        fix_mark_attachment(&mut glyphs);
        assert_eq!(glyphs[1].position.x_offset, -490);
        assert_eq!(glyphs[2].position.x_offset, -489);
    }

    #[test]
    fn cursive_child_takes_parent_offset() {
        let mut glyphs = vec![
            glyph('\u{0628}', 500, Direction::RightToLeft),
            glyph('\u{0628}', 500, Direction::RightToLeft),
            glyph('\u{0628}', 500, Direction::RightToLeft),
        ];
        glyphs[0].position.y_offset = 40;
        glyphs[1].position.y_offset = 5;
        glyphs[1].cursive_attachment = Some(0);
        glyphs[2].position.y_offset = 1;
        glyphs[2].cursive_attachment = Some(1);

        fix_mark_attachment(&mut glyphs);
        assert_eq!(glyphs[1].position.y_offset, 45);
        assert_eq!(glyphs[2].position.y_offset, 46);
    }

    #[test]
    fn long_cursive_chain() {
        // Every glyph hangs off the next one, so the first glyph is resolved
        // last through the whole chain.
        const LEN: usize = 200_000;
        let mut glyphs = vec![glyph('\u{0628}', 500, Direction::RightToLeft); LEN];
        for (i, glyph) in glyphs.iter_mut().enumerate() {
            glyph.position.y_offset = 1;
            glyph.cursive_attachment = Some(i + 1).filter(|&j| j < LEN);
        }

        fix_mark_attachment(&mut glyphs);
        assert_eq!(glyphs[0].position.y_offset, LEN as i32);
        assert_eq!(glyphs[LEN / 2].position.y_offset, (LEN / 2) as i32);
        assert_eq!(glyphs[LEN - 1].position.y_offset, 1);
    }

    #[test]
    fn attachment_cycle_terminates() {
        let mut glyphs = vec![
            glyph('a', 500, Direction::LeftToRight),
            glyph('b', 500, Direction::LeftToRight),
        ];
        glyphs[0].position.y_offset = 1;
        glyphs[0].cursive_attachment = Some(1);
        glyphs[1].position.y_offset = 2;
        glyphs[1].cursive_attachment = Some(0);

        fix_mark_attachment(&mut glyphs);
        assert_eq!(glyphs[1].position.y_offset, 3);
        assert_eq!(glyphs[0].position.y_offset, 4);
    }

    #[test]
    fn value_axes() {
        let value = ValueRecord { x_placement: 1, y_placement: 2, x_advance: 3, y_advance: 4 };

        let mut horizontal = glyph('a', 100, Direction::LeftToRight);
        assert!(apply_value(&mut horizontal, value));
        assert_eq!(horizontal.position.x_advance, 103);
        assert_eq!(horizontal.position.y_advance, 0);
        assert_eq!((horizontal.position.x_offset, horizontal.position.y_offset), (1, 2));
        assert!(horizontal.flags.contains(GlyphFlags::POSITIONED));

        let mut vertical = glyph('a', 0, Direction::TopToBottom);
        vertical.position.y_advance = -1000;
        assert!(apply_value(&mut vertical, value));
        assert_eq!(vertical.position.x_advance, 0);
        assert_eq!(vertical.position.y_advance, -1004);

        let mut untouched = glyph('a', 100, Direction::LeftToRight);
        assert!(!apply_value(&mut untouched, ValueRecord::default()));
        assert!(!untouched.flags.contains(GlyphFlags::POSITIONED));
    }

    #[test]
    fn anchor_difference() {
        let mut mark = glyph('\u{0301}', 0, Direction::LeftToRight);
        apply_anchor(&mut mark, 4, Anchor { x: 250, y: 600 }, Anchor { x: 40, y: 10 });
        assert_eq!((mark.position.x_offset, mark.position.y_offset), (210, 590));
        assert_eq!(mark.mark_attachment, Some(4));
    }
}
