use core::fmt;

use crate::site::{EdgeSite, Polarity, Suppress};

impl fmt::Display for Suppress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Contrast => "contrast",
            Self::Threshold => "threshold",
            Self::MEstimator => "m-estimator",
        };
        f.write_str(s)
    }
}

/// One-line textual rendering of a site for logs and reports.
#[derive(Debug, Clone, Copy)]
pub struct SiteReport<'a>(pub &'a EdgeSite);

impl fmt::Display for SiteReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        let sign = match s.polarity() {
            Polarity::Positive => '+',
            Polarity::Negative => '-',
        };
        write!(
            f,
            "site ({:.2}, {:.2}) alpha={:.3} sign={sign} conv={:.1} grad={:.3} weight={:.2} suppress={}",
            s.row(),
            s.col(),
            s.alpha,
            s.response(),
            s.normalized_gradient(),
            s.weight(),
            s.suppress()
        )
    }
}
