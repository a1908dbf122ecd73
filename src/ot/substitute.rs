//! Glyph substitution.

use log::{trace, warn};
use smallvec::SmallVec;
use ttf_parser::GlyphId;

use super::contextual::{match_coverage, match_glyph};
use super::matching::{match_backtrack, match_input, match_lookahead, MatchedInput};
use super::{apply_string, next_segment, trace_segment, Apply, ApplyContext, Budget, TableIndex};
use crate::buffer::{GlyphFlags, GlyphShapingCollection, GlyphSubstitutionCollection};
use crate::complex::{Shaper, ShaperKind};
use crate::tables::gdef::GlyphClass;
use crate::tables::gsub::*;
use crate::{Error, Face};

const REVERSE_CHAIN_SINGLE: u16 = 8;

/// Applies the `GSUB` table to a glyph run.
///
/// The run is split into script segments; each segment is planned by its
/// shaper and then walked stage by stage. Lookups of a stage run in lookup
/// index order. Substitution stops early, without error, once the run grows
/// too long or too many operations were attempted.
pub fn apply_substitution(
    face: &Face,
    collection: &mut GlyphSubstitutionCollection,
) -> Result<(), Error> {
    let glyphs: &mut GlyphShapingCollection = collection;
    let mut budget = Budget::new(glyphs.len());

    let mut start = 0;
    while start < glyphs.len() {
        let mut segment = next_segment(glyphs, start);
        let script = face.gsub.as_ref().and_then(|t| t.select_script(segment.script));

        let kind = ShaperKind::select(segment.script, script.map(|s| s.tag));
        let shaper = Shaper::new(kind, glyphs[start].direction, &glyphs.user_features);
        trace_segment(TableIndex::GSUB, &segment, script, &shaper);

        let delta = shaper.plan(face, glyphs, segment.start, segment.end - segment.start);
        segment.end = segment.end.saturating_add_signed(delta);
        shaper.assign_features(glyphs, segment.start, segment.end - segment.start);

        for stage in shaper.stages() {
            if let Some(hook) = stage.pre_process {
                let delta = hook(face, glyphs, segment.start, segment.end - segment.start);
                segment.end = segment.end.saturating_add_signed(delta);
            }

            if let (Some(gsub), Some(script)) = (face.gsub.as_ref(), script) {
                let lookups = gsub.feature_lookups(stage.feature, script, glyphs.language);
                if !lookups.is_empty() {
                    trace!("GSUB stage {}: {} lookups", stage.feature, lookups.len());
                }

                for feature_lookup in lookups {
                    let lookup = feature_lookup.lookup;
                    let mut ctx = ApplyContext::new(
                        TableIndex::GSUB,
                        face,
                        glyphs,
                        &mut budget,
                        segment.start,
                        segment.end,
                    );
                    ctx.set_lookup(feature_lookup.feature, feature_lookup.index, lookup);
                    apply_string(&mut ctx, lookup, lookup.kind == REVERSE_CHAIN_SINGLE)?;
                    segment.end = ctx.end;

                    if budget.is_exhausted() {
                        warn!(
                            "substitution stopped at {} glyphs: shaping limits reached",
                            glyphs.len()
                        );
                        return Ok(());
                    }
                }
            }

            if let Some(hook) = stage.post_process {
                let delta = hook(face, glyphs, segment.start, segment.end - segment.start);
                segment.end = segment.end.saturating_add_signed(delta);
            }
        }

        start = segment.end;
    }

    Ok(())
}

impl Apply for SubstLookup<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        for subtable in &self.subtables {
            if subtable.apply(ctx)? {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

impl Apply for SubstLookupSubtable<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        match self {
            Self::Single(t) => t.apply(ctx),
            Self::Multiple(t) => t.apply(ctx),
            Self::Alternate(t) => t.apply(ctx),
            Self::Ligature(t) => t.apply(ctx),
            Self::Context(t) => t.apply(ctx),
            Self::ChainContext(t) => t.apply(ctx),
            Self::ReverseChainSingle(t) => {
                // Reverse lookups walk the whole segment on their own and
                // cannot run at a single position.
                if ctx.is_nested() {
                    warn!("GSUB lookup {} is a nested reverse chaining lookup", ctx.lookup_index);
                    return Err(Error::NotSupported {
                        table: "GSUB",
                        lookup_type: REVERSE_CHAIN_SINGLE,
                    });
                }

                t.apply(ctx)
            }
        }
    }
}

impl Apply for SingleSubst<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        let glyph = ctx.cur().glyph_id;
        let Some(index) = self.coverage().get(glyph) else {
            return Ok(false);
        };

        let subst = match *self {
            // Addition is modulo 65536.
            Self::Format1 { delta, .. } => GlyphId(glyph.0.wrapping_add(delta as u16)),
            Self::Format2 { substitutes, .. } => match substitutes.get(index) {
                Some(subst) => subst,
                None => return Ok(false),
            },
        };

        ctx.replace_glyph(subst);
        ctx.index += 1;
        Ok(true)
    }
}

impl Apply for MultipleSubst<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        let glyph = ctx.cur().glyph_id;
        let Some(sequence) = self
            .coverage
            .get(glyph)
            .and_then(|index| self.sequences.get(usize::from(index)).copied())
        else {
            return Ok(false);
        };

        match sequence.len() {
            // Not allowed by the format, but fonts rely on it.
            0 => {
                ctx.delete_glyph();
                Ok(true)
            }
            1 => {
                let Some(subst) = sequence.get(0) else {
                    return Ok(false);
                };
                ctx.replace_glyph(subst);
                ctx.index += 1;
                Ok(true)
            }
            _ => {
                let substitutes: SmallVec<[GlyphId; 8]> = sequence.into_iter().collect();
                Ok(ctx.multiply_glyph(&substitutes))
            }
        }
    }
}

impl Apply for AlternateSubst<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        let glyph = ctx.cur().glyph_id;
        let Some(subst) = self
            .coverage
            .get(glyph)
            .and_then(|index| self.alternate_sets.get(usize::from(index)))
            .and_then(|set| set.get(0))
        else {
            return Ok(false);
        };

        ctx.replace_glyph(subst);
        ctx.index += 1;
        Ok(true)
    }
}

impl Apply for LigatureSubst<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        let glyph = ctx.cur().glyph_id;
        let Some(set) = self
            .coverage
            .get(glyph)
            .and_then(|index| self.ligature_sets.get(usize::from(index)))
        else {
            return Ok(false);
        };

        for ligature in set {
            // A single component ligature is a plain substitution.
            if ligature.components.len() == 0 {
                ctx.replace_glyph(ligature.lig_glyph);
                ctx.index += 1;
                return Ok(true);
            }

            let components = usize::from(ligature.components.len());
            let Some(matched) = match_input(ctx, components, &match_glyph(ligature.components))
            else {
                continue;
            };

            ligate(ctx, &matched, ligature.lig_glyph);
            return Ok(true);
        }

        Ok(false)
    }
}

/// Replaces the matched glyphs with a ligature.
///
/// Marks between the components stay in place and are reassigned to the
/// ligature component they follow, so mark-to-ligature positioning can find
/// it later. Marks that follow the last component and belonged to an older
/// ligature are renumbered as well.
fn ligate(ctx: &mut ApplyContext, matched: &MatchedInput, lig_glyph: GlyphId) {
    let count = matched.count;
    let positions = &matched.positions[..count];
    let face = ctx.face;

    // A base with marks stays a base, so that following marks can still
    // attach to it. A ligature of marks keeps its old ligature id, so that it
    // can attach to a base ligature.
    let first_class = face.glyph_class(&ctx.glyphs[positions[0]]);
    let mut is_base_ligature = first_class == Some(GlyphClass::Base);
    let mut is_mark_ligature = first_class == Some(GlyphClass::Mark);
    for &pos in &positions[1..] {
        if !face.is_mark(&ctx.glyphs[pos]) {
            is_base_ligature = false;
            is_mark_ligature = false;
        }
    }

    let is_ligature = !is_base_ligature && !is_mark_ligature;
    let lig_id = if is_ligature { ctx.glyphs.allocate_lig_id() } else { 0 };

    let first = &ctx.glyphs[positions[0]];
    let mut last_lig_id = first.lig_id;
    let mut last_num_comps = first.lig_num_comps;
    let mut comps_so_far = last_num_comps;

    for i in 1..count {
        if is_ligature {
            for j in positions[i - 1] + 1..positions[i] {
                let mark = &mut ctx.glyphs[j];
                let this_comp = if mark.lig_comp == 0 { last_num_comps } else { mark.lig_comp };
                let new_lig_comp = comps_so_far - last_num_comps + this_comp.min(last_num_comps);
                mark.set_lig_props_for_mark(lig_id, new_lig_comp);
            }
        }

        let component = &ctx.glyphs[positions[i]];
        last_lig_id = component.lig_id;
        last_num_comps = component.lig_num_comps;
        comps_so_far = comps_so_far.saturating_add(last_num_comps);
    }

    let last = positions[count - 1];
    if !is_mark_ligature && last_lig_id != 0 {
        for j in last + 1..ctx.glyphs.len() {
            let mark = &mut ctx.glyphs[j];
            if mark.lig_id != last_lig_id || mark.lig_comp == 0 {
                break;
            }

            let new_lig_comp = comps_so_far - last_num_comps + mark.lig_comp.min(last_num_comps);
            mark.set_lig_props_for_mark(lig_id, new_lig_comp);
        }
    }

    // Merge the components into the first glyph and drop them.
    let first_len = ctx.glyphs[positions[0]].codepoint_count();
    for i in (1..count).rev() {
        let component = ctx.glyphs.remove(positions[i]);
        let first = &mut ctx.glyphs[positions[0]];
        first.cluster = first.cluster.min(component.cluster);
        first.codepoints.insert_many(first_len, component.codepoints);
    }

    let first = &mut ctx.glyphs[positions[0]];
    first.glyph_id = lig_glyph;
    first.flags |= GlyphFlags::SUBSTITUTED | GlyphFlags::LIGATED;
    if is_ligature {
        first.set_lig_props_for_ligature(lig_id, matched.total_component_count);
    }

    ctx.end -= count - 1;
    ctx.index = last + 1 - (count - 1);
}

impl Apply for ReverseChainSingleSubst<'_> {
    fn apply(&self, ctx: &mut ApplyContext) -> Result<bool, Error> {
        let glyph = ctx.cur().glyph_id;
        let Some(index) = self.coverage.get(glyph) else {
            return Ok(false);
        };

        let backtrack = match_backtrack(
            ctx,
            self.backtrack_coverages.len(),
            &match_coverage(&self.backtrack_coverages),
        );
        let lookahead = match_lookahead(
            ctx,
            self.lookahead_coverages.len(),
            &match_coverage(&self.lookahead_coverages),
            ctx.index + 1,
        );

        let Some(subst) = self.substitutes.get(index) else {
            return Ok(false);
        };

        if backtrack.is_none() || lookahead.is_none() {
            return Ok(false);
        }

        // The index is not moved: the walk goes backwards.
        ctx.replace_glyph(subst);
        Ok(true)
    }
}
