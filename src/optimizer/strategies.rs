//! Rewrite strategies
//!
//! Each strategy is a bounded iterative loop: propose a local replacement of
//! a vertex span, validate it against collisions, constraints and cost, then
//! splice it in and restart the scan. Every splice is all-or-nothing; a
//! candidate that fails any gate is silently discarded.

use anyhow::Result;

use super::breakouts::compute_breakouts;
use super::cost::CostEstimator;
use super::Optimizer;
use crate::dp::DiffPair;
use crate::geometry::{
    segment_distance, trace_45, AngleClass, Direction45, LineChain, Seg,
};
use crate::line::RouteLine;
use crate::world::Item;

impl Optimizer<'_> {
    /// 2-opt shortcut search: for progressively tighter vertex spans, try
    /// replacing the intervening sub-path with a two-segment connector
    pub(super) fn merge_full(&mut self, line: &mut RouteLine) -> Result<bool> {
        let mut path = line.chain().clone();
        if path.simplify() && !self.keeps_preserved_vertex(&path) {
            path = line.chain().clone();
        }

        let mut step = path.segment_count().saturating_sub(1);

        loop {
            let max_step = path.segment_count().saturating_sub(1);
            if step > max_step {
                step = max_step;
            }
            if step < 1 {
                break;
            }

            if !self.merge_step(line, &mut path, step)? {
                if step == 1 {
                    break;
                }
                step -= 1;
            }
        }

        let changed = path.points() != line.chain().points();
        if changed {
            line.set_chain(path);
        }

        Ok(changed)
    }

    /// One scan of the 2-opt search at a fixed span width. On the first
    /// accepted rewrite the scan restarts from the affected region.
    fn merge_step(&mut self, line: &RouteLine, path: &mut LineChain, step: usize) -> Result<bool> {
        let segs = path.segment_count();
        if segs < step + 1 || segs < 2 {
            return Ok(false);
        }

        let orig_start = Direction45::from_seg(&path.segment(0));
        let orig_end = Direction45::from_seg(&path.segment(segs - 1));
        let cost_orig = CostEstimator::of_chain(path);

        for n in 0..segs - step {
            let s1 = path.segment(n);
            let s2 = path.segment(n + step);

            let mut picked: Option<(LineChain, CostEstimator)> = None;

            for diagonal_first in [false, true] {
                let bypass = trace_45(s1.a, s2.b, diagonal_first);
                if bypass.segment_count() == 0 {
                    continue;
                }

                if self.keep_postures {
                    if n == 0 && Direction45::from_seg(&bypass.segment(0)) != orig_start {
                        continue;
                    }
                    let last = bypass.segment_count() - 1;
                    if n + step == segs - 1
                        && Direction45::from_seg(&bypass.segment(last)) != orig_end
                    {
                        continue;
                    }
                }

                if self.check_colliding_chain(line, &bypass)? {
                    continue;
                }
                if !self.check_constraints(n, n + step + 1, line, path, &bypass)? {
                    continue;
                }

                let mut candidate = path.clone();
                candidate.replace_span(n, n + step + 1, &bypass);
                candidate.simplify();
                if !self.keeps_preserved_vertex(&candidate) {
                    continue;
                }

                let cost = CostEstimator::of_chain(&candidate);
                if !cost.is_better(&cost_orig, self.length_tolerance, self.corner_tolerance) {
                    continue;
                }

                let beats_picked = picked.as_ref().map_or(true, |(_, best)| {
                    (cost.corner_cost(), cost.length_cost())
                        < (best.corner_cost(), best.length_cost())
                });
                if beats_picked {
                    picked = Some((candidate, cost));
                }
            }

            if let Some((candidate, _)) = picked {
                *path = candidate;
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Fuse spans whose end segments meet at an obtuse angle into two
    /// segments through the line intersection point
    pub(super) fn merge_obtuse(&mut self, line: &mut RouteLine) -> Result<bool> {
        let mut path = line.chain().clone();
        if path.simplify() && !self.keeps_preserved_vertex(&path) {
            path = line.chain().clone();
        }

        if path.point_count() < 5 {
            return Ok(false);
        }

        let mut step = path.segment_count() - 2;

        loop {
            let segs = path.segment_count();
            if step > segs.saturating_sub(2) {
                step = segs.saturating_sub(2);
            }
            if step < 2 {
                break;
            }

            let mut found = false;

            for n in 0..segs - step {
                let s1 = path.segment(n);
                let s2 = path.segment(n + step);

                if !Direction45::from_seg(&s1).is_obtuse_to(Direction45::from_seg(&s2)) {
                    continue;
                }

                let ip = match s1.line_intersection(&s2) {
                    Some(p) => p,
                    None => continue,
                };

                // The fused corner must stay obtuse, otherwise the
                // intersection lies behind one of the segments
                let s1_opt = Seg::new(s1.a, ip);
                let s2_opt = Seg::new(ip, s2.b);
                if !Direction45::from_seg(&s1_opt)
                    .is_obtuse_to(Direction45::from_seg(&s2_opt))
                {
                    continue;
                }

                let sub = LineChain::new(vec![s1.a, ip, s2.b]);
                if self.check_colliding_chain(line, &sub)? {
                    continue;
                }
                if !self.check_constraints(n, n + step + 1, line, &path, &sub)? {
                    continue;
                }

                let mut candidate = path.clone();
                candidate.replace_span(n, n + step + 1, &sub);
                candidate.simplify();
                if !self.keeps_preserved_vertex(&candidate) {
                    continue;
                }

                let cost = CostEstimator::of_chain(&candidate);
                let cost_now = CostEstimator::of_chain(&path);
                if !cost.is_better(&cost_now, self.length_tolerance, self.corner_tolerance) {
                    continue;
                }

                path = candidate;
                found = true;
                break;
            }

            if !found {
                if step == 2 {
                    break;
                }
                step -= 1;
            }
        }

        let changed = path.points() != line.chain().points();
        if changed {
            line.set_chain(path);
        }

        Ok(changed)
    }

    /// Replace acute and zig-zag corner triples with a clean connector
    pub(super) fn remove_ugly_corners(&mut self, line: &mut RouteLine) -> Result<bool> {
        let mut path = line.chain().clone();
        if path.simplify() && !self.keeps_preserved_vertex(&path) {
            path = line.chain().clone();
        }
        let mut changed_any = false;

        'rescan: loop {
            let segs = path.segment_count();
            if segs < 2 {
                break;
            }

            for n in 0..segs - 1 {
                let s1 = path.segment(n);
                let s2 = path.segment(n + 1);
                let angle = Direction45::from_seg(&s1).angle_to(Direction45::from_seg(&s2));

                if !matches!(
                    angle,
                    AngleClass::Acute | AngleClass::HalfFull | AngleClass::Undefined
                ) {
                    continue;
                }

                let cost_now = CostEstimator::of_chain(&path);

                for diagonal_first in [true, false] {
                    let bypass = trace_45(s1.a, s2.b, diagonal_first);
                    if bypass.segment_count() == 0 {
                        continue;
                    }
                    if self.check_colliding_chain(line, &bypass)? {
                        continue;
                    }
                    if !self.check_constraints(n, n + 2, line, &path, &bypass)? {
                        continue;
                    }

                    let mut candidate = path.clone();
                    candidate.replace_span(n, n + 2, &bypass);
                    candidate.simplify();
                    if !self.keeps_preserved_vertex(&candidate) {
                        continue;
                    }

                    let cost = CostEstimator::of_chain(&candidate);
                    if !cost.is_better(&cost_now, self.length_tolerance, self.corner_tolerance)
                    {
                        continue;
                    }

                    path = candidate;
                    changed_any = true;
                    continue 'rescan;
                }
            }

            break;
        }

        if changed_any {
            line.set_chain(path);
        }

        Ok(changed_any)
    }

    /// Replace a short stub connecting two pads/vias with a direct
    /// two-segment connector
    pub(super) fn fanout_cleanup(&mut self, line: &mut RouteLine) -> Result<bool> {
        let chain = line.chain().clone();
        if chain.point_count() < 3 {
            return Ok(false);
        }

        let p_start = chain.point(0);
        let p_end = chain.point(chain.point_count() - 1);

        let start_pad = self.find_pad_or_via(line.layer(), line.net(), p_start)?;
        let end_pad = self.find_pad_or_via(line.layer(), line.net(), p_end)?;

        if start_pad.is_none() || end_pad.is_none() {
            return Ok(false);
        }

        // Only short fanout stubs qualify
        if chain.length() >= line.width() * 10.0 {
            return Ok(false);
        }

        let cost_orig = CostEstimator::of_chain(&chain);
        let last = chain.point_count() - 1;

        for diagonal_first in [true, false] {
            let bypass = trace_45(p_start, p_end, diagonal_first);
            if bypass.segment_count() == 0 {
                continue;
            }
            if self.check_colliding_chain(line, &bypass)? {
                continue;
            }
            if !self.check_constraints(0, last, line, &chain, &bypass)? {
                continue;
            }
            if !self.keeps_preserved_vertex(&bypass) {
                continue;
            }

            let cost = CostEstimator::of_chain(&bypass);
            if !cost.is_better(&cost_orig, self.length_tolerance, self.corner_tolerance) {
                continue;
            }

            line.set_chain(bypass);
            return Ok(true);
        }

        Ok(false)
    }

    /// Reroute the entry and exit of a line through pad/via breakouts
    pub(super) fn run_smart_pads(&mut self, line: &mut RouteLine) -> Result<bool> {
        if line.chain().point_count() < 3 {
            return Ok(false);
        }

        let p_start = line.chain().point(0);
        let p_end = line.chain().point(line.chain().point_count() - 1);

        let start_pad = self.find_pad_or_via(line.layer(), line.net(), p_start)?;
        let end_pad = self.find_pad_or_via(line.layer(), line.net(), p_end)?;

        let mut changed = false;

        if let Some(pad) = start_pad {
            changed |= self.smart_pads_single(line, &pad, false)?;
        }
        if let Some(pad) = end_pad {
            changed |= self.smart_pads_single(line, &pad, true)?;
        }

        if changed {
            let mut chain = line.chain().clone();
            if chain.simplify() && self.keeps_preserved_vertex(&chain) {
                line.set_chain(chain);
            }
        }

        Ok(changed)
    }

    /// Rebuild one end of the line from the cheapest valid breakout variant
    fn smart_pads_single(
        &mut self,
        line: &mut RouteLine,
        pad: &Item,
        at_end: bool,
    ) -> Result<bool> {
        let oriented = if at_end {
            line.chain().reversed()
        } else {
            line.chain().clone()
        };

        let pc = oriented.point_count();
        if pc < 3 {
            return Ok(false);
        }

        // Reconnect a few vertices downstream of the pad
        let end_vertex = 3.min(pc - 1);
        let target = oriented.point(end_vertex);
        let cost_orig = CostEstimator::of_chain(&oriented);

        let breakouts = compute_breakouts(line.width(), pad, true);
        let mut best: Option<(CostEstimator, LineChain)> = None;

        for breakout in &breakouts {
            if breakout.segment_count() == 0 {
                continue;
            }

            let tip = breakout.point(breakout.point_count() - 1);
            let exit_dir =
                Direction45::from_seg(&breakout.segment(breakout.segment_count() - 1));

            for diagonal_first in [true, false] {
                let connect = trace_45(tip, target, diagonal_first);

                // A connector folding back against the breakout is never
                // a clean exit
                if connect.segment_count() > 0 {
                    let angle =
                        exit_dir.angle_to(Direction45::from_seg(&connect.segment(0)));
                    if matches!(angle, AngleClass::Acute | AngleClass::HalfFull) {
                        continue;
                    }
                }

                let mut head = breakout.clone();
                head.extend_chain(&connect);

                let mut candidate = head.clone();
                for i in end_vertex..pc {
                    candidate.append(oriented.point(i));
                }
                candidate.simplify();

                if self.check_colliding_chain(line, &candidate)? {
                    continue;
                }
                if !self.keeps_preserved_vertex(&candidate) {
                    continue;
                }

                let (v1, v2, replacement) = if at_end {
                    (pc - 1 - end_vertex, pc - 1, head.reversed())
                } else {
                    (0, end_vertex, head)
                };
                if !self.check_constraints(v1, v2, line, line.chain(), &replacement)? {
                    continue;
                }

                let cost = CostEstimator::of_chain(&candidate);
                if !cost.is_better(&cost_orig, self.length_tolerance, self.corner_tolerance) {
                    continue;
                }

                let beats_best = best.as_ref().map_or(true, |(bc, _)| {
                    (cost.corner_cost(), cost.length_cost())
                        < (bc.corner_cost(), bc.length_cost())
                });
                if beats_best {
                    best = Some((cost, candidate));
                }
            }
        }

        if let Some((_, candidate)) = best {
            let chain = if at_end { candidate.reversed() } else { candidate };
            line.set_chain(chain);
            return Ok(true);
        }

        Ok(false)
    }

    /// Joint 2-opt over both rails of a differential pair, P before N
    pub(super) fn merge_dp_segments(&mut self, pair: &mut DiffPair) -> Result<bool> {
        let mut step_p = pair.p().chain().segment_count().saturating_sub(2);
        let mut step_n = pair.n().chain().segment_count().saturating_sub(2);
        let mut changed_any = false;

        loop {
            step_p = step_p.min(pair.p().chain().segment_count().saturating_sub(2));
            step_n = step_n.min(pair.n().chain().segment_count().saturating_sub(2));

            let mut found = false;
            if step_p > 1 {
                found |= self.merge_dp_step(pair, true, step_p)?;
            }
            if step_n > 1 {
                found |= self.merge_dp_step(pair, false, step_n)?;
            }

            if found {
                changed_any = true;
            } else {
                if step_p <= 1 && step_n <= 1 {
                    break;
                }
                step_p = step_p.saturating_sub(1);
                step_n = step_n.saturating_sub(1);
            }
        }

        Ok(changed_any)
    }

    /// One rewrite attempt on one rail. Accepted only if collision-free and
    /// the pair's coupled length survives within budget.
    fn merge_dp_step(&mut self, pair: &mut DiffPair, try_p: bool, step: usize) -> Result<bool> {
        let rail = pair.rail(try_p).clone();
        let current = rail.chain().clone();
        let coupled = pair.rail(!try_p).chain().clone();

        let segs = current.segment_count();
        if segs < step + 2 {
            return Ok(false);
        }

        let clen_pre = pair.coupled_length(&current, &coupled);
        let budget = clen_pre / 10.0;
        let min_gap = pair.gap() - pair.gap_tolerance();

        // The first segment is the pad exit; leave it alone
        for n in 1..segs - step {
            let s1 = current.segment(n);
            let s2 = current.segment(n + step);
            let d1 = Direction45::from_seg(&s1);
            let d2 = Direction45::from_seg(&s2);

            if !d1.is_obtuse_to(d2) {
                continue;
            }

            let bypass = trace_45(s1.a, s2.b, d1.is_diagonal());
            if bypass.segment_count() == 0 {
                continue;
            }

            // The rewrite must keep its distance from the coupled rail
            if self.dp_gap_violated(&bypass, &coupled, min_gap) {
                continue;
            }

            if self.check_colliding_chain(&rail, &bypass)? {
                continue;
            }
            if !self.check_constraints(n, n + step + 1, &rail, &current, &bypass)? {
                continue;
            }

            let mut new_ref = current.clone();
            new_ref.replace_span(n, n + step + 1, &bypass);
            new_ref.simplify();
            if !self.keeps_preserved_vertex(&new_ref) {
                continue;
            }

            let clen_post = pair.coupled_length(&new_ref, &coupled);
            if clen_post < clen_pre - budget {
                continue;
            }

            pair.rail_mut(try_p).set_chain(new_ref);
            return Ok(true);
        }

        Ok(false)
    }

    fn dp_gap_violated(&self, bypass: &LineChain, coupled: &LineChain, min_gap: f32) -> bool {
        for i in 0..bypass.segment_count() {
            let b = bypass.segment(i);

            for j in 0..coupled.segment_count() {
                if segment_distance(&b, &coupled.segment(j)) < min_gap {
                    return true;
                }
            }
        }

        false
    }
}
