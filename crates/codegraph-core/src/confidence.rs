/// The cap every confidence value in the model obeys (spec invariant 3).
pub const MAX_CONFIDENCE: f32 = 0.95;

/// Centralizes the additive confidence bumps the spec describes ad hoc
/// throughout §4.6 ("Each independent signal ... adds 0.10-0.15", "Cap at
/// 0.95"): `combine(base, signals) = min(0.95, base + sum(signals))`
/// (spec §9 Design Notes). Named weights live alongside their callers so
/// tests can pin them; this function only owns the combination rule and
/// the clamp.
pub fn combine(base: f32, signals: &[f32]) -> f32 {
    let sum: f32 = base + signals.iter().sum::<f32>();
    sum.clamp(0.0, MAX_CONFIDENCE)
}
