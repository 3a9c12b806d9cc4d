use crc32fast::Hasher;

/// Cheap content key for memoizing work over source text.
///
/// Equal fingerprints are only a hint; callers that need certainty compare the
/// text as well (see `Fingerprint::matches`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    crc: u32,
    len: usize,
}

impl Fingerprint {
    pub fn of(text: &str) -> Self {
        Self {
            crc: fingerprint(text),
            len: text.len(),
        }
    }

    /// Compare against text without re-hashing when the lengths differ
    pub fn matches(&self, text: &str) -> bool {
        self.len == text.len() && self.crc == fingerprint(text)
    }
}

/// CRC32 of the text
pub fn fingerprint(text: &str) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(text.as_bytes());
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        assert_eq!(fingerprint("export default A;"), fingerprint("export default A;"));
        assert_ne!(fingerprint("a"), fingerprint("b"));
    }

    #[test]
    fn test_matches() {
        let fp = Fingerprint::of("const a = 1;");
        assert!(fp.matches("const a = 1;"));
        assert!(!fp.matches("const a = 2;"));
        assert!(!fp.matches("const a = 1; "));
    }
}
