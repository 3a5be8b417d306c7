use log::{debug, trace};
use me_core::ImageView;

use crate::config::{MeConfig, SubpixRefine};
use crate::convolve::{Response, evaluate};
use crate::error::ConfigError;
use crate::masks::MaskBank;
use crate::observer::{NullObserver, TrackObserver};
use crate::report::SiteReport;
use crate::sampler::{Candidate, CandidateSampler, SearchBounds};
use crate::sign::get_sign;
use crate::site::{EdgeSite, LocalSuppress};

/// What a single `track` call decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackOutcome {
    pub classification: LocalSuppress,
    /// Candidates that survived border clipping.
    pub candidates: usize,
    pub winner_step: Option<i32>,
    /// The site moved to the winner.
    pub accepted: bool,
    /// Sub-pixel correction along the normal, in pixels.
    pub refinement: f32,
}

/// Per-frame tally of local classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameSummary {
    pub trusted: usize,
    pub contrast: usize,
    pub threshold: usize,
}

impl FrameSummary {
    fn add(&mut self, classification: LocalSuppress) {
        match classification {
            LocalSuppress::None => self.trusted += 1,
            LocalSuppress::Contrast => self.contrast += 1,
            LocalSuppress::Threshold => self.threshold += 1,
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.trusted += other.trusted;
        self.contrast += other.contrast;
        self.threshold += other.threshold;
        self
    }

    pub fn total(&self) -> usize {
        self.trusted + self.contrast + self.threshold
    }
}

/// Moves edge sites onto the best oriented edge along their normals.
///
/// Holds the validated configuration, the mask bank and scratch buffers that
/// are reused across sites and frames.
#[derive(Debug, Clone)]
pub struct SiteTracker {
    cfg: MeConfig,
    bank: MaskBank,
    sampler: CandidateSampler,
    responses: Vec<Response>,
}

impl SiteTracker {
    pub fn new(cfg: MeConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let bank = MaskBank::new(cfg.mask_bins, cfg.mask_size)?;
        Ok(Self::from_parts(cfg, bank))
    }

    /// Uses a caller-built bank; its size and bin count replace
    /// `mask_size` / `mask_bins` from `cfg`.
    pub fn with_mask_bank(mut cfg: MeConfig, bank: MaskBank) -> Result<Self, ConfigError> {
        cfg.mask_size = bank.size();
        cfg.mask_bins = bank.bins();
        cfg.validate()?;
        Ok(Self::from_parts(cfg, bank))
    }

    fn from_parts(cfg: MeConfig, bank: MaskBank) -> Self {
        let bank = bank.with_convention(cfg.sign_convention);
        let cap = 2 * cfg.range as usize + 1;
        Self {
            cfg,
            bank,
            sampler: CandidateSampler::new(),
            responses: Vec::with_capacity(cap),
        }
    }

    pub fn config(&self) -> &MeConfig {
        &self.cfg
    }

    pub fn mask_bank(&self) -> &MaskBank {
        &self.bank
    }

    pub fn search_bounds(&self, img: &ImageView<'_, u8>) -> SearchBounds {
        SearchBounds::for_mask(img.width(), img.height(), &self.bank, self.cfg.strip)
    }

    /// (Re)initializes a freshly placed site: detects its polarity, captures
    /// the reference response and resets weight and classifications.
    pub fn initialize(&self, img: &ImageView<'_, u8>, site: &mut EdgeSite) {
        let polarity = get_sign(img, site, self.cfg.range, self.cfg.sign_convention);
        let mut oriented = *site;
        oriented.set_polarity(polarity);
        let r = evaluate(img, &oriented, &self.bank);

        site.init(site.row(), site.col(), site.alpha, r.response, polarity);
        site.record_response(r.response, r.normalized);
    }

    /// Tracks one site into `img`. Never fails; distrust is reported through
    /// the site's local classification.
    pub fn track(
        &mut self,
        img: &ImageView<'_, u8>,
        site: &mut EdgeSite,
        test_contrast: bool,
    ) -> TrackOutcome {
        self.track_observed(img, site, test_contrast, &mut NullObserver)
    }

    pub fn track_observed<O: TrackObserver + ?Sized>(
        &mut self,
        img: &ImageView<'_, u8>,
        site: &mut EdgeSite,
        test_contrast: bool,
        observer: &mut O,
    ) -> TrackOutcome {
        let bounds = self.search_bounds(img);
        let candidates = self.sampler.sample(site, self.cfg.range, &bounds);
        score_candidates(img, &self.bank, candidates, &mut self.responses);
        observer.on_candidates(site, candidates, &self.responses);

        let outcome = apply_best(
            &self.cfg,
            &bounds,
            candidates,
            &self.responses,
            site,
            test_contrast,
        );
        observer.on_tracked(site, &outcome);
        outcome
    }

    /// Tracks every site of a frame, in order.
    pub fn track_all(
        &mut self,
        img: &ImageView<'_, u8>,
        sites: &mut [EdgeSite],
        test_contrast: bool,
    ) -> FrameSummary {
        let mut summary = FrameSummary::default();
        for site in sites.iter_mut() {
            summary.add(self.track(img, site, test_contrast).classification);
        }
        debug!(
            "tracked {} sites: {} trusted, {} contrast, {} threshold",
            summary.total(),
            summary.trusted,
            summary.contrast,
            summary.threshold
        );
        summary
    }

    /// Same as [`SiteTracker::track_all`] with sites spread over the rayon
    /// pool. Results are identical since sites never interact.
    #[cfg(feature = "parallel")]
    pub fn track_all_parallel(
        &self,
        img: &ImageView<'_, u8>,
        sites: &mut [EdgeSite],
        test_contrast: bool,
    ) -> FrameSummary {
        use rayon::prelude::*;

        let summary = sites
            .par_iter_mut()
            .map_init(
                || (CandidateSampler::new(), Vec::new()),
                |(sampler, responses), site| {
                    let bounds = self.search_bounds(img);
                    let candidates = sampler.sample(site, self.cfg.range, &bounds);
                    score_candidates(img, &self.bank, candidates, responses);
                    let outcome =
                        apply_best(&self.cfg, &bounds, candidates, responses, site, test_contrast);
                    let mut s = FrameSummary::default();
                    s.add(outcome.classification);
                    s
                },
            )
            .reduce(FrameSummary::default, FrameSummary::merge);
        debug!(
            "tracked {} sites in parallel: {} trusted, {} contrast, {} threshold",
            summary.total(),
            summary.trusted,
            summary.contrast,
            summary.threshold
        );
        summary
    }
}

fn score_candidates(
    img: &ImageView<'_, u8>,
    bank: &MaskBank,
    candidates: &[Candidate],
    out: &mut Vec<Response>,
) {
    out.clear();
    out.extend(candidates.iter().map(|c| evaluate(img, &c.site, bank)));
}

fn score(r: &Response, test_contrast: bool) -> f32 {
    if test_contrast {
        r.response
    } else {
        r.response.abs()
    }
}

/// Whether a candidate response may compete for the winner.
fn admissible(cfg: &MeConfig, r: &Response, reference: f32, test_contrast: bool) -> bool {
    if test_contrast && r.response <= 0.0 {
        return false;
    }
    if let Some(max_ratio) = cfg.max_contrast_ratio
        && reference > 0.0
        && r.response.abs() > max_ratio * reference
    {
        return false;
    }
    true
}

fn select_winner(
    cfg: &MeConfig,
    candidates: &[Candidate],
    responses: &[Response],
    reference: f32,
    test_contrast: bool,
) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, (cand, r)) in candidates.iter().zip(responses).enumerate() {
        if !admissible(cfg, r, reference, test_contrast) {
            continue;
        }

        let s = score(r, test_contrast);
        let better = match best {
            None => true,
            Some((b, bs)) => s > bs || (s == bs && cand.step.abs() < candidates[b].step.abs()),
        };
        if better {
            best = Some((idx, s));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Vertex offset of the parabola through the winner and its two neighbors.
///
/// Zero unless both neighbors are contiguous steps that were themselves
/// admissible, and the winner is a strict maximum.
fn parabolic_offset(
    cfg: &MeConfig,
    candidates: &[Candidate],
    responses: &[Response],
    idx: usize,
    reference: f32,
    test_contrast: bool,
) -> f32 {
    if idx == 0 || idx + 1 >= candidates.len() {
        return 0.0;
    }
    let step = candidates[idx].step;
    if candidates[idx - 1].step != step - 1 || candidates[idx + 1].step != step + 1 {
        return 0.0;
    }
    let (prev, next) = (&responses[idx - 1], &responses[idx + 1]);
    if !admissible(cfg, prev, reference, test_contrast)
        || !admissible(cfg, next, reference, test_contrast)
    {
        return 0.0;
    }

    let ym1 = score(prev, test_contrast);
    let y0 = score(&responses[idx], test_contrast);
    let yp1 = score(next, test_contrast);
    let denom = ym1 - 2.0 * y0 + yp1;
    if denom > -1e-12 {
        return 0.0;
    }
    let delta = 0.5 * (ym1 - yp1) / denom;
    if delta.is_finite() {
        delta.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

fn apply_best(
    cfg: &MeConfig,
    bounds: &SearchBounds,
    candidates: &[Candidate],
    responses: &[Response],
    site: &mut EdgeSite,
    test_contrast: bool,
) -> TrackOutcome {
    let reference = site.reference().abs();
    let winner = select_winner(cfg, candidates, responses, reference, test_contrast);
    let mut outcome = TrackOutcome {
        classification: LocalSuppress::None,
        candidates: candidates.len(),
        winner_step: winner.map(|i| candidates[i].step),
        accepted: false,
        refinement: 0.0,
    };

    let Some(idx) = winner else {
        outcome.classification = if reference > 0.0 {
            LocalSuppress::Contrast
        } else {
            LocalSuppress::Threshold
        };
        site.record_response(0.0, 0.0);
        site.classify(outcome.classification);
        trace!("no match for {}", SiteReport(site));
        return outcome;
    };

    let best = responses[idx];
    site.record_response(best.response, best.normalized);
    if best.response.abs() < cfg.min_contrast_ratio * reference {
        outcome.classification = LocalSuppress::Contrast;
        site.classify(outcome.classification);
        trace!("contrast drop for {}", SiteReport(site));
        return outcome;
    }

    let delta = match cfg.subpixel {
        SubpixRefine::None => 0.0,
        SubpixRefine::Parabolic3 => {
            parabolic_offset(cfg, candidates, responses, idx, reference, test_contrast)
        }
    };
    let chosen = &candidates[idx].site;
    let position = bounds.clamp_to_image(chosen.position + delta * site.normal());
    site.move_to(position, position.round());
    outcome.accepted = true;
    outcome.refinement = delta;

    outcome.classification = if best.normalized.abs() < cfg.min_gradient {
        LocalSuppress::Threshold
    } else {
        LocalSuppress::None
    };
    site.classify(outcome.classification);
    outcome
}
