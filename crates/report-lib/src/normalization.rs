//! Instance-size normalization factors
//!
//! Maps AWS instance-size suffixes to a dimensionless relative compute
//! capacity (nano = 0.25 up to 32xlarge = 256) so heterogeneous instance
//! usage can be summed into comparable "computational power" units.

/// Size tokens and their normalization factors, smallest first
const SIZE_FACTORS: &[(&str, f64)] = &[
    ("nano", 0.25),
    ("micro", 0.5),
    ("small", 1.0),
    ("medium", 2.0),
    ("large", 4.0),
    ("xlarge", 8.0),
    ("2xlarge", 16.0),
    ("4xlarge", 32.0),
    ("8xlarge", 64.0),
    ("9xlarge", 72.0),
    ("10xlarge", 80.0),
    ("12xlarge", 96.0),
    ("16xlarge", 128.0),
    ("18xlarge", 144.0),
    ("24xlarge", 192.0),
    ("32xlarge", 256.0),
];

/// Sentinel family and size token for unparseable instance types
pub const UNKNOWN: &str = "unknown";

/// Tolerance for matching a factor back to its size token
const FACTOR_EPSILON: f64 = 1e-3;

/// Split an instance type into its family and normalization factor
///
/// Parses `<family>.<size>` against the known size tokens. Malformed or
/// unrecognized input yields `("unknown", 0.0)` rather than an error so
/// callers can aggregate mixed-quality billing data without branching.
pub fn family_and_factor(instance_type: &str) -> (String, f64) {
    if let Some((family, size)) = instance_type.rsplit_once('.') {
        if !family.is_empty() {
            if let Some(factor) = size_factor(size) {
                return (family.to_string(), factor);
            }
        }
    }
    (UNKNOWN.to_string(), 0.0)
}

/// Look up the normalization factor for a bare size token
pub fn size_factor(size: &str) -> Option<f64> {
    SIZE_FACTORS
        .iter()
        .find(|(token, _)| *token == size)
        .map(|(_, factor)| *factor)
}

/// Map a normalization factor back to its size token
///
/// Matching is tolerant within [`FACTOR_EPSILON`] since factors round-trip
/// through floating-point aggregation. Unmatched factors yield `"unknown"`.
pub fn inverse_factor(factor: f64) -> &'static str {
    SIZE_FACTORS
        .iter()
        .find(|(_, candidate)| (candidate - factor).abs() < FACTOR_EPSILON)
        .map(|(token, _)| *token)
        .unwrap_or(UNKNOWN)
}
