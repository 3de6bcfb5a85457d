use serde::Deserialize;

/// Headroom above the larger of current and target under the fixed-target policy.
const FIXED_TARGET_HEADROOM: f64 = 1.1;
/// Scale factors applied to the observed extremes under the full-range policy.
const FULL_RANGE_FLOOR: f64 = 0.9;
const FULL_RANGE_HEADROOM: f64 = 1.2;
/// Span a degenerate domain is widened to.
const MINIMAL_SPAN: f64 = 1.0;

/// How the numeric domain is derived from the fetched data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DomainPolicy {
    /// `[0, max(current, target) * 1.1]`, for a single current/target pair.
    #[default]
    FixedTarget,
    /// Spans every observed value plus the target.
    FullRange,
}

/// The `[min, max]` range mapped onto the gauge sweep. Always `max > min`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    min: f64,
    max: f64,
}

impl Domain {
    /// Builds a domain, widening it when the bounds are inverted, equal or
    /// not finite.
    pub fn new(min: f64, max: f64) -> Self {
        if !min.is_finite() || !max.is_finite() {
            tracing::debug!(min, max, "non-finite domain, falling back to [0, 1]");
            return Self {
                min: 0.0,
                max: MINIMAL_SPAN,
            };
        }
        if max <= min {
            let widened = min + MINIMAL_SPAN;
            if widened > min {
                tracing::debug!(min, max, "degenerate domain, widening to a minimal span");
                return Self { min, max: widened };
            }
            // Past 2^53 adding the span is lost to rounding.
            tracing::debug!(min, max, "degenerate domain too large to widen, falling back to [0, 1]");
            return Self {
                min: 0.0,
                max: MINIMAL_SPAN,
            };
        }
        Self { min, max }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Position of `value` inside the domain in `[0, 1]`; NaN maps to 0.
    pub fn normalize(&self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        ((value - self.min) / self.span()).clamp(0.0, 1.0)
    }
}

/// Computes the gauge domain.
///
/// `values` holds every parseable row value of the value column and is only
/// read by [`DomainPolicy::FullRange`]. `fallback_target` stands in for a
/// missing target under [`DomainPolicy::FixedTarget`].
pub fn compute_domain(
    policy: DomainPolicy,
    current: f64,
    target: Option<f64>,
    values: &[f64],
    fallback_target: f64,
) -> Domain {
    let domain = match policy {
        DomainPolicy::FixedTarget => {
            let reference = target.unwrap_or(fallback_target);
            Domain::new(0.0, current.max(reference) * FIXED_TARGET_HEADROOM)
        }
        DomainPolicy::FullRange => {
            let all = values.iter().copied().chain(target);
            let (lowest, highest) = all.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
            if highest.is_finite() {
                Domain::new(
                    lowest.min(0.0) * FULL_RANGE_FLOOR,
                    highest * FULL_RANGE_HEADROOM,
                )
            } else {
                Domain::new(0.0, 0.0)
            }
        }
    };
    tracing::debug!(?policy, min = domain.min, max = domain.max, "computed domain");
    domain
}
