//! Parameter automation curves.
//!
//! A curve starts at a fixed value at t = 0 (voice start) and is followed by
//! ramps that each end at an absolute voice-relative time, the same model as
//! WebAudio's `setValueAtTime` / `*RampToValueAtTime`.

/// Ramp shape of one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Curve {
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    end: f64,
    target: f64,
    curve: Curve,
}

/// A piecewise parameter curve evaluated in voice-relative seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Automation {
    start: f64,
    segments: Vec<Segment>,
}

impl Automation {
    /// A flat curve.
    pub fn constant(value: f64) -> Self {
        Automation {
            start: value,
            segments: Vec::new(),
        }
    }

    /// Ramp linearly from the previous point to `target`, arriving at `at`.
    pub fn linear_to(self, target: f64, at: f64) -> Self {
        self.push(target, at, Curve::Linear)
    }

    /// Ramp exponentially from the previous point to `target`, arriving at `at`.
    ///
    /// Falls back to a linear ramp when the endpoints are zero or differ in sign.
    pub fn exp_to(self, target: f64, at: f64) -> Self {
        self.push(target, at, Curve::Exponential)
    }

    fn push(mut self, target: f64, at: f64, curve: Curve) -> Self {
        let prev_end = self.end_time();
        self.segments.push(Segment {
            end: at.max(prev_end),
            target,
            curve,
        });
        self
    }

    /// Time at which the last ramp settles.
    pub fn end_time(&self) -> f64 {
        self.segments.last().map(|s| s.end).unwrap_or(0.0)
    }

    /// Value at voice-relative time `t`; held at the final value afterwards.
    pub fn value_at(&self, t: f64) -> f64 {
        let mut from_time = 0.0;
        let mut from_value = self.start;
        for seg in &self.segments {
            if t < seg.end {
                let span = seg.end - from_time;
                if span <= 0.0 {
                    return seg.target;
                }
                let frac = ((t - from_time) / span).clamp(0.0, 1.0);
                return match seg.curve {
                    Curve::Exponential if from_value * seg.target > 0.0 => {
                        from_value * (seg.target / from_value).powf(frac)
                    }
                    _ => from_value + (seg.target - from_value) * frac,
                };
            }
            from_time = seg.end;
            from_value = seg.target;
        }
        from_value
    }
}
