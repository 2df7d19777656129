//! Numeric value ranges induced by comparison operators.

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bound {
    pub value: f64,
    pub inclusive: bool,
}

/// Possibly unbounded interval on the real line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Interval {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

impl Interval {
    /// Interval of values satisfying `x <operator> value`; `None` for operators without one.
    pub fn from_operator(operator: &str, value: f64) -> Option<Self> {
        let bound = |inclusive| Some(Bound { value, inclusive });
        let interval = match operator {
            "==" => Interval {
                lower: bound(true),
                upper: bound(true),
            },
            ">" => Interval {
                lower: bound(false),
                upper: None,
            },
            ">=" => Interval {
                lower: bound(true),
                upper: None,
            },
            "<" => Interval {
                lower: None,
                upper: bound(false),
            },
            "<=" => Interval {
                lower: None,
                upper: bound(true),
            },
            _ => return None,
        };
        Some(interval)
    }

    pub fn is_empty(&self) -> bool {
        match (self.lower, self.upper) {
            (Some(lower), Some(upper)) => {
                lower.value > upper.value
                    || (lower.value == upper.value && !(lower.inclusive && upper.inclusive))
            }
            _ => false,
        }
    }

    pub fn intersect(&self, other: &Interval) -> Interval {
        Interval {
            lower: tighter(self.lower, other.lower, |a, b| a > b),
            upper: tighter(self.upper, other.upper, |a, b| a < b),
        }
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        !self.intersect(other).is_empty()
    }
}

fn tighter(a: Option<Bound>, b: Option<Bound>, stricter: impl Fn(f64, f64) -> bool) -> Option<Bound> {
    match (a, b) {
        (Some(a), Some(b)) if a.value == b.value => Some(Bound {
            value: a.value,
            inclusive: a.inclusive && b.inclusive,
        }),
        (Some(a), Some(b)) => Some(if stricter(a.value, b.value) { a } else { b }),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}
