use rand::RngExt;

/// Number of random bytes behind a generated code (6 hex characters)
pub const RANDOM_CODE_BYTES: u32 = 3;

/// Produces candidate short codes. Implementations do not consult the
/// registry; availability is checked by the caller.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Random lowercase hex codes drawn from the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomHexGenerator;

impl CodeGenerator for RandomHexGenerator {
    fn generate(&self) -> String {
        let max = (1u32 << (RANDOM_CODE_BYTES * 8)) - 1;
        let value: u32 = rand::rng().random_range(0..=max);
        format!("{:0width$x}", value, width = (RANDOM_CODE_BYTES * 2) as usize)
    }
}

/// Where a candidate code came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Custom(String),
    Random(String),
}

impl Candidate {
    pub fn as_str(&self) -> &str {
        match self {
            Candidate::Custom(code) | Candidate::Random(code) => code,
        }
    }

    pub fn into_code(self) -> String {
        match self {
            Candidate::Custom(code) | Candidate::Random(code) => code,
        }
    }
}

/// Use the caller's code as-is when one is given, otherwise draw a random one.
/// An empty custom code counts as absent.
pub fn generate(generator: &dyn CodeGenerator, custom_code: Option<&str>) -> Candidate {
    match custom_code {
        Some(code) if !code.is_empty() => Candidate::Custom(code.to_string()),
        _ => Candidate::Random(generator.generate()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_code_shape() {
        for _ in 0..1000 {
            let code = RandomHexGenerator.generate();
            assert_eq!(code.len(), 6);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        }
    }

    #[test]
    fn test_random_codes_rarely_repeat() {
        let codes: HashSet<String> = (0..500).map(|_| RandomHexGenerator.generate()).collect();
        // 500 draws from 16M codes; a handful of repeats would signal a broken RNG
        assert!(codes.len() >= 495);
    }

    #[test]
    fn test_custom_code_used_verbatim() {
        let candidate = generate(&RandomHexGenerator, Some("My-Code"));
        assert_eq!(candidate, Candidate::Custom("My-Code".to_string()));
    }

    #[test]
    fn test_empty_custom_code_falls_back_to_random() {
        let candidate = generate(&RandomHexGenerator, Some(""));
        assert!(matches!(candidate, Candidate::Random(_)));
        assert_eq!(candidate.as_str().len(), 6);
    }
}
