//! Attendance code generation.

use std::collections::HashSet;

use rand::{rngs::OsRng, Rng};
use rollcall_common::{AppError, AppResult, AttendanceConfig};

/// Bound on random draws per issuance. Below the fill limit a collision-free
/// draw is overwhelmingly likely well before this many attempts.
const MAX_DRAWS: u32 = 64;

/// Generator for short, human-enterable attendance codes.
///
/// Codes are fixed-length decimal strings drawn from the OS random source,
/// so they carry no ordering an attacker could extrapolate from. Collision
/// checking happens only against codes currently in use (active polls plus
/// the reissue cool-down window), never against all history.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    length: usize,
    fill_limit: f64,
}

impl CodeGenerator {
    /// Create a generator for codes of `length` decimal digits, refusing to
    /// draw once the in-use set covers `fill_limit` of the keyspace.
    #[must_use]
    pub const fn new(length: usize, fill_limit: f64) -> Self {
        Self { length, fill_limit }
    }

    /// Create a generator from the attendance configuration.
    #[must_use]
    pub const fn from_config(config: &AttendanceConfig) -> Self {
        Self::new(config.code_length, config.keyspace_fill_limit)
    }

    /// Number of digits in a generated code.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Size of the code keyspace.
    #[must_use]
    pub fn keyspace(&self) -> u64 {
        10u64.pow(self.length as u32)
    }

    /// Whether `code` has the shape of a generated code: exactly the
    /// configured number of ASCII decimal digits.
    #[must_use]
    pub fn is_well_formed(&self, code: &str) -> bool {
        code.len() == self.length && code.bytes().all(|b| b.is_ascii_digit())
    }

    /// Draw a fresh code not present in `codes_in_use`.
    ///
    /// Fails with [`AppError::ExhaustedKeyspace`] when the in-use set covers
    /// the configured fraction of the keyspace, or when the draw bound is hit
    /// without finding a free value. Persisting the issued code is the
    /// caller's responsibility.
    pub fn generate(&self, codes_in_use: &HashSet<String>) -> AppResult<String> {
        let keyspace = self.keyspace();

        if codes_in_use.len() as f64 >= keyspace as f64 * self.fill_limit {
            tracing::warn!(
                in_use = codes_in_use.len(),
                keyspace,
                "Active code set at fill limit, refusing issuance"
            );
            return Err(AppError::ExhaustedKeyspace);
        }

        let mut rng = OsRng;
        for _ in 0..MAX_DRAWS {
            let value = rng.gen_range(0..keyspace);
            let code = format!("{value:0width$}", width = self.length);
            if !codes_in_use.contains(&code) {
                return Ok(code);
            }
        }

        Err(AppError::ExhaustedKeyspace)
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::from_config(&AttendanceConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_shape() {
        let generator = CodeGenerator::new(8, 0.5);
        let code = generator.generate(&HashSet::new()).unwrap();

        assert_eq!(code.len(), 8);
        assert!(code.bytes().all(|b| b.is_ascii_digit()));
        assert!(generator.is_well_formed(&code));
    }

    #[test]
    fn test_avoids_codes_in_use() {
        // Keyspace of 10 with 5 values taken: every draw must land on a
        // free value.
        let generator = CodeGenerator::new(1, 0.6);
        let in_use: HashSet<String> = ["0", "1", "2", "3", "4"]
            .iter()
            .map(ToString::to_string)
            .collect();

        for _ in 0..50 {
            let code = generator.generate(&in_use).unwrap();
            assert!(!in_use.contains(&code));
        }
    }

    #[test]
    fn test_exhausted_at_fill_limit() {
        let generator = CodeGenerator::new(2, 0.5);
        let in_use: HashSet<String> = (0..50).map(|n| format!("{n:02}")).collect();

        let result = generator.generate(&in_use);
        assert!(matches!(result, Err(AppError::ExhaustedKeyspace)));
    }

    #[test]
    fn test_exhausted_when_every_value_taken() {
        // Fill gate disabled; failure must come from the bounded draw loop
        // finding no free value.
        let generator = CodeGenerator::new(1, 1.1);
        let in_use: HashSet<String> = (0..10).map(|n| n.to_string()).collect();

        let result = generator.generate(&in_use);
        assert!(matches!(result, Err(AppError::ExhaustedKeyspace)));
    }

    #[test]
    fn test_under_fill_limit_succeeds() {
        let generator = CodeGenerator::new(2, 0.5);
        let in_use: HashSet<String> = (0..49).map(|n| format!("{n:02}")).collect();

        let code = generator.generate(&in_use).unwrap();
        assert!(!in_use.contains(&code));
    }

    #[test]
    fn test_is_well_formed() {
        let generator = CodeGenerator::new(8, 0.5);

        assert!(generator.is_well_formed("48213097"));
        assert!(!generator.is_well_formed("4821309")); // too short
        assert!(!generator.is_well_formed("482130977")); // too long
        assert!(!generator.is_well_formed("4821309a"));
        assert!(!generator.is_well_formed("4821 097"));
        assert!(!generator.is_well_formed(""));
    }

    #[test]
    fn test_keyspace() {
        assert_eq!(CodeGenerator::new(8, 0.5).keyspace(), 100_000_000);
        assert_eq!(CodeGenerator::new(2, 0.5).keyspace(), 100);
    }
}
