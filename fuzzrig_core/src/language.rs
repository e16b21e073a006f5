use serde::{Deserialize, Serialize};

/// The four source languages a target can declare.
///
/// The kind decides every language-dependent piece of a resolution: driver and
/// test filenames, whether a compile step exists, which scaffolding tokens a
/// driver must contain, and which external tool checks its syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageKind {
    C,
    Cpp,
    JavaScript,
    Python,
}

/// Static per-language table consulted during resolution and validation.
///
/// `scaffold_tokens` are exact, case-sensitive substrings a driver must
/// contain to count as wired to its fuzzing harness. `syntax_check` is the
/// argv prefix of the external checker, with the driver path appended as the
/// final argument; native kinds have none because the compile step is their
/// check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguagePolicy {
    pub driver_filename: &'static str,
    pub test_filename: &'static str,
    pub requires_compilation: bool,
    pub scaffold_tokens: &'static [&'static str],
    pub syntax_check: &'static [&'static str],
}

const C_POLICY: LanguagePolicy = LanguagePolicy {
    driver_filename: "dummyfuzzer.c",
    test_filename: "dummytester.c",
    requires_compilation: true,
    scaffold_tokens: &[],
    syntax_check: &[],
};

const CPP_POLICY: LanguagePolicy = LanguagePolicy {
    driver_filename: "dummyfuzzer.cc",
    test_filename: "dummytester.cc",
    requires_compilation: true,
    scaffold_tokens: &[],
    syntax_check: &[],
};

const JAVASCRIPT_POLICY: LanguagePolicy = LanguagePolicy {
    driver_filename: "fuzz.js",
    test_filename: "test.js",
    requires_compilation: false,
    scaffold_tokens: &["@jazzer.js/core", "module.exports.fuzz"],
    syntax_check: &["node", "--check"],
};

const PYTHON_POLICY: LanguagePolicy = LanguagePolicy {
    driver_filename: "fuzz.py",
    test_filename: "test.py",
    requires_compilation: false,
    scaffold_tokens: &["import atheris", "TestOneInput"],
    syntax_check: &["python3", "-m", "py_compile"],
};

impl LanguageKind {
    pub const ALL: [LanguageKind; 4] = [
        LanguageKind::C,
        LanguageKind::Cpp,
        LanguageKind::JavaScript,
        LanguageKind::Python,
    ];

    /// Parses a raw language string, case-insensitively.
    ///
    /// Returns `None` for anything outside the four supported kinds; the
    /// resolver turns that into a configuration error.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "c" => Some(LanguageKind::C),
            "cpp" => Some(LanguageKind::Cpp),
            "javascript" => Some(LanguageKind::JavaScript),
            "python" => Some(LanguageKind::Python),
            _ => None,
        }
    }

    /// Canonical lowercase name, used as the language path segment.
    pub fn as_str(self) -> &'static str {
        match self {
            LanguageKind::C => "c",
            LanguageKind::Cpp => "cpp",
            LanguageKind::JavaScript => "javascript",
            LanguageKind::Python => "python",
        }
    }

    pub fn policy(self) -> &'static LanguagePolicy {
        match self {
            LanguageKind::C => &C_POLICY,
            LanguageKind::Cpp => &CPP_POLICY,
            LanguageKind::JavaScript => &JAVASCRIPT_POLICY,
            LanguageKind::Python => &PYTHON_POLICY,
        }
    }

    pub fn is_interpreted(self) -> bool {
        !self.policy().requires_compilation
    }
}
