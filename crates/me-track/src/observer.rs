//! Event hooks for rendering and diagnostics.
//!
//! The tracker reports what it looked at and what it decided; observers map
//! that onto whatever output they own (overlay markers, logs, test recorders).

use core::fmt;

use log::{debug, trace};
use me_core::Point2f;

use crate::convolve::Response;
use crate::report::SiteReport;
use crate::sampler::Candidate;
use crate::site::{EdgeSite, Suppress};
use crate::tracker::TrackOutcome;

pub trait TrackObserver {
    /// Called once the candidates of `site` have been scored, before the site
    /// is updated.
    fn on_candidates(
        &mut self,
        _site: &EdgeSite,
        _candidates: &[Candidate],
        _responses: &[Response],
    ) {
    }

    /// Called after `site` has been updated.
    fn on_tracked(&mut self, _site: &EdgeSite, _outcome: &TrackOutcome) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl TrackObserver for NullObserver {}

/// Forwards events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl TrackObserver for LogObserver {
    fn on_candidates(
        &mut self,
        site: &EdgeSite,
        candidates: &[Candidate],
        responses: &[Response],
    ) {
        trace!(
            "{}: {} candidates, best response {}",
            SiteReport(site),
            candidates.len(),
            BestResponse(responses)
        );
    }

    fn on_tracked(&mut self, site: &EdgeSite, outcome: &TrackOutcome) {
        debug!(
            "{} (step {:?}, refinement {:.3})",
            SiteReport(site),
            outcome.winner_step,
            outcome.refinement
        );
    }
}

/// Strongest response of a candidate set, or `none` when it is empty.
struct BestResponse<'a>(&'a [Response]);

impl fmt::Display for BestResponse<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.iter().map(|r| r.response).reduce(f32::max) {
            Some(best) => write!(f, "{best:.1}"),
            None => f.write_str("none"),
        }
    }
}

/// Drawable record emitted by [`EventRecorder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackEvent {
    /// Extent of the search segment.
    Range { from: Point2f, to: Point2f },
    /// Final position and how much it can be trusted.
    Result { position: Point2f, suppress: Suppress },
}

/// Collects events for sites whose [`crate::DisplayHint`] asks for them.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    events: Vec<TrackEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[TrackEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl TrackObserver for EventRecorder {
    fn on_candidates(
        &mut self,
        site: &EdgeSite,
        candidates: &[Candidate],
        _responses: &[Response],
    ) {
        if !site.display.shows_range() {
            return;
        }
        if let (Some(first), Some(last)) = (candidates.first(), candidates.last()) {
            self.events.push(TrackEvent::Range {
                from: first.site.position,
                to: last.site.position,
            });
        }
    }

    fn on_tracked(&mut self, site: &EdgeSite, _outcome: &TrackOutcome) {
        if site.display.shows_result() {
            self.events.push(TrackEvent::Result {
                position: site.position,
                suppress: site.suppress(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BestResponse, EventRecorder, TrackObserver};
    use crate::convolve::Response;
    use crate::site::{DisplayHint, EdgeSite};

    fn response(v: f32) -> Response {
        Response {
            response: v,
            normalized: v / 4080.0,
        }
    }

    #[test]
    fn best_response_text() {
        assert_eq!(BestResponse(&[]).to_string(), "none");
        let rs = [response(-20.0), response(812.3), response(400.0)];
        assert_eq!(BestResponse(&rs).to_string(), "812.3");
        assert_eq!(BestResponse(&rs[..1]).to_string(), "-20.0");
    }

    #[test]
    fn recorder_skips_empty_ranges() {
        let mut rec = EventRecorder::new();
        let mut site = EdgeSite::new(2.0, 2.0);
        site.display = DisplayHint::Range;
        rec.on_candidates(&site, &[], &[]);
        assert!(rec.events().is_empty());
    }
}
