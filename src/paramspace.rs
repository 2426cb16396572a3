//! Typed parameter space: sampling, projection, and the canonical hashable
//! form the optimizer caches fitness against (spec.md 4.G).
//!
//! A [`Candidate`] is a particle's raw position — one `f64` per parameter,
//! in the parameter's native units, which may transiently lie outside its
//! declared range (PSO velocity steps are unclamped; projection absorbs
//! the overshoot). A [`ProjectedCandidate`] is what actually gets
//! simulated: every value clamped, rounded, or snapped into its kind's
//! legal domain, in a form that implements `Eq`/`Hash` so structurally
//! equal candidates share one fitness-cache entry.

use std::collections::HashMap;

use rand::Rng;

/// One parameter's declared domain and sampling/projection rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    /// Log-biased continuous range, `a >= 1.01`, `b <= 1e6`.
    Payout { min: f64, max: f64 },
    /// Integer range snapped to the nearest 100 units.
    Balance { min: i64, max: i64 },
    /// Continuous or (if `integer`) integer-rounded range.
    Number { min: f64, max: f64, integer: bool },
    /// Bernoulli(0.5)-sampled boolean.
    Checkbox,
    /// Uniform choice over a finite labeled set.
    Radio { options: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub kind: ParameterKind,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        ParameterDescriptor {
            name: name.into(),
            kind,
        }
    }
}

/// A particle's/individual's raw position: one real-valued coordinate per
/// declared parameter, in native units, possibly out of range.
pub type Candidate = HashMap<String, f64>;

/// Canonical, hashable post-projection value for one parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProjectedValue {
    /// Payout or continuous `number` values, rounded to 2 decimals and
    /// represented as hundredths so the type can derive `Eq`/`Hash`.
    Hundredths(i64),
    Integer(i64),
    Bool(bool),
    Radio(usize),
}

/// The fully-projected, cache-key form of a [`Candidate`]: every value
/// legal for its kind, entries sorted by parameter name for structural
/// equality independent of insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectedCandidate {
    values: Vec<(String, ProjectedValue)>,
}

impl ProjectedCandidate {
    pub fn get(&self, name: &str) -> Option<&ProjectedValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ProjectedValue)> {
        self.values.iter()
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// An ordered collection of [`ParameterDescriptor`]s a candidate is
/// sampled and projected against.
#[derive(Debug, Clone)]
pub struct ParameterSpace {
    descriptors: Vec<ParameterDescriptor>,
}

impl ParameterSpace {
    pub fn new(descriptors: Vec<ParameterDescriptor>) -> Self {
        ParameterSpace { descriptors }
    }

    pub fn descriptors(&self) -> &[ParameterDescriptor] {
        &self.descriptors
    }

    /// Draw one independent value per declared parameter, per the kind
    /// table in spec.md 4.G.
    pub fn sample(&self, rng: &mut impl Rng) -> Candidate {
        let mut candidate = Candidate::new();
        for descriptor in &self.descriptors {
            let value = match &descriptor.kind {
                ParameterKind::Payout { min, max } => {
                    let u: f64 = rng.gen_range(0.0..1.0);
                    let normalization = 0.99 * max.ln() - 0.99 * min.ln();
                    round2((u * normalization + 0.99 * min.ln()).exp())
                }
                ParameterKind::Balance { min, max } => {
                    let raw = rng.gen_range(*min as f64..=*max as f64);
                    (raw / 100.0).round() * 100.0
                }
                ParameterKind::Number { min, max, integer } => {
                    let v = rng.gen_range(*min..=*max);
                    if *integer {
                        v.round()
                    } else {
                        v
                    }
                }
                ParameterKind::Checkbox => {
                    if rng.gen_bool(0.5) {
                        1.0
                    } else {
                        0.0
                    }
                }
                ParameterKind::Radio { options } => {
                    rng.gen_range(0..options.len()) as f64
                }
            };
            candidate.insert(descriptor.name.clone(), value);
        }
        candidate
    }

    /// Clamp/round/snap `candidate` into each parameter's legal domain and
    /// return the canonical, hashable, cache-ready form. Idempotent:
    /// `project(project(c).into()) == project(c)`.
    pub fn project(&self, candidate: &Candidate) -> ProjectedCandidate {
        let mut values: Vec<(String, ProjectedValue)> = self
            .descriptors
            .iter()
            .map(|descriptor| {
                let raw = candidate.get(&descriptor.name).copied().unwrap_or(0.0);
                let projected = match &descriptor.kind {
                    ParameterKind::Payout { min, max } => {
                        ProjectedValue::Hundredths((round2(raw.clamp(*min, *max)) * 100.0).round() as i64)
                    }
                    ParameterKind::Balance { min, max } => {
                        let clamped = raw.clamp(*min as f64, *max as f64).max(0.0);
                        let snapped = (clamped / 100.0).round() * 100.0;
                        ProjectedValue::Integer(snapped as i64)
                    }
                    ParameterKind::Number { min, max, integer } => {
                        let clamped = raw.clamp(*min, *max);
                        if *integer {
                            ProjectedValue::Integer(clamped.round() as i64)
                        } else {
                            ProjectedValue::Hundredths((round2(clamped) * 100.0).round() as i64)
                        }
                    }
                    ParameterKind::Checkbox => ProjectedValue::Bool(raw != 0.0),
                    ParameterKind::Radio { options } => {
                        let last = (options.len().saturating_sub(1)) as f64;
                        let idx = raw.round().clamp(0.0, last) as usize;
                        ProjectedValue::Radio(idx)
                    }
                };
                (descriptor.name.clone(), projected)
            })
            .collect();
        values.sort_by(|a, b| a.0.cmp(&b.0));
        ProjectedCandidate { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn space() -> ParameterSpace {
        ParameterSpace::new(vec![
            ParameterDescriptor::new("target", ParameterKind::Payout { min: 1.01, max: 10.0 }),
            ParameterDescriptor::new("wager", ParameterKind::Balance { min: 100, max: 10_000 }),
            ParameterDescriptor::new(
                "martingale_factor",
                ParameterKind::Number {
                    min: 1.0,
                    max: 5.0,
                    integer: false,
                },
            ),
            ParameterDescriptor::new("auto_cashout", ParameterKind::Checkbox),
            ParameterDescriptor::new(
                "mode",
                ParameterKind::Radio {
                    options: vec!["martingale".into(), "flat".into(), "fibonacci".into()],
                },
            ),
        ])
    }

    #[test]
    fn payout_samples_stay_in_domain() {
        let space = space();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..200 {
            let candidate = space.sample(&mut rng);
            let target = candidate["target"];
            assert!((1.01..=10.0).contains(&target), "target {target} out of range");
        }
    }

    #[test]
    fn balance_sampling_snaps_to_the_nearest_hundred() {
        let space = space();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for _ in 0..200 {
            let candidate = space.sample(&mut rng);
            let wager = candidate["wager"];
            assert_eq!(wager % 100.0, 0.0, "sampled wager {wager} is not a multiple of 100");
        }
    }

    #[test]
    fn balance_projection_snaps_to_nearest_hundred_and_clamps() {
        let space = space();
        let mut candidate = Candidate::new();
        candidate.insert("target".to_string(), 2.0);
        candidate.insert("wager".to_string(), 149.0);
        candidate.insert("martingale_factor".to_string(), 2.0);
        candidate.insert("auto_cashout".to_string(), 1.0);
        candidate.insert("mode".to_string(), 0.0);
        let projected = space.project(&candidate);
        assert_eq!(projected.get("wager"), Some(&ProjectedValue::Integer(100)));
    }

    #[test]
    fn projection_is_idempotent() {
        let space = space();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let candidate = space.sample(&mut rng);
        let once = space.project(&candidate);

        let mut reprojected_input = Candidate::new();
        for (name, value) in once.iter() {
            let raw = match value {
                ProjectedValue::Hundredths(h) => *h as f64 / 100.0,
                ProjectedValue::Integer(i) => *i as f64,
                ProjectedValue::Bool(b) => {
                    if *b {
                        1.0
                    } else {
                        0.0
                    }
                }
                ProjectedValue::Radio(idx) => *idx as f64,
            };
            reprojected_input.insert(name.clone(), raw);
        }
        let twice = space.project(&reprojected_input);
        assert_eq!(once, twice);
    }

    #[test]
    fn radio_projects_to_a_valid_index() {
        let space = space();
        let mut candidate = Candidate::new();
        candidate.insert("target".to_string(), 2.0);
        candidate.insert("wager".to_string(), 100.0);
        candidate.insert("martingale_factor".to_string(), 2.0);
        candidate.insert("auto_cashout".to_string(), 0.0);
        candidate.insert("mode".to_string(), 99.0); // out of range, should clamp
        let projected = space.project(&candidate);
        assert_eq!(projected.get("mode"), Some(&ProjectedValue::Radio(2)));
    }

    #[test]
    fn equal_projected_candidates_are_structurally_equal() {
        let space = space();
        let mut a = Candidate::new();
        a.insert("target".to_string(), 2.001);
        a.insert("wager".to_string(), 101.0);
        a.insert("martingale_factor".to_string(), 2.0);
        a.insert("auto_cashout".to_string(), 1.0);
        a.insert("mode".to_string(), 0.0);

        let mut b = a.clone();
        b.insert("target".to_string(), 2.004);

        assert_eq!(space.project(&a), space.project(&b));
    }

    #[test]
    fn checkbox_projects_nonzero_as_true() {
        let space = space();
        let mut candidate = Candidate::new();
        candidate.insert("target".to_string(), 2.0);
        candidate.insert("wager".to_string(), 100.0);
        candidate.insert("martingale_factor".to_string(), 2.0);
        candidate.insert("auto_cashout".to_string(), 0.3);
        candidate.insert("mode".to_string(), 0.0);
        let projected = space.project(&candidate);
        assert_eq!(projected.get("auto_cashout"), Some(&ProjectedValue::Bool(true)));
    }
}
