//! Pre-execution token scan.
//!
//! A fixed list of substrings associated with process, file, environment,
//! and dynamic-evaluation access. The scan is case-insensitive substring
//! matching and nothing more: it can be defeated by trivial obfuscation and
//! exists for parity with the denylist of the system this runtime replaces.
//! The interpreter behind it is what actually withholds those capabilities.

/// Tokens that reject a code payload outright.
const DENYLIST: &[&str] = &[
    "import os",
    "import sys",
    "import subprocess",
    "import shutil",
    "import socket",
    "from os",
    "subprocess.",
    "os.system",
    "os.popen",
    "os.environ",
    "shutil.",
    "open(",
    "exec(",
    "eval(",
    "compile(",
    "__import__",
    "getattr(",
    "globals(",
    "locals(",
    "system(",
    "popen(",
];

/// Returns the first denylisted token found in `code`, if any.
pub(crate) fn blocked_token(code: &str) -> Option<&'static str> {
    let lowered = code.to_ascii_lowercase();
    DENYLIST.iter().copied().find(|token| lowered.contains(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harmless_code_passes() {
        assert_eq!(blocked_token("let x = 1 + 1;\nresult = x;"), None);
    }

    #[test]
    fn process_and_eval_primitives_are_caught() {
        assert_eq!(blocked_token("import os\nos.system('ls')"), Some("import os"));
        assert_eq!(blocked_token("eval(payload)"), Some("eval("));
        assert_eq!(blocked_token("x = __import__('sys')"), Some("__import__"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(blocked_token("Import OS"), Some("import os"));
        assert_eq!(blocked_token("EXEC(code)"), Some("exec("));
    }

    #[test]
    fn the_filter_is_known_to_be_bypassable() {
        // Trivially split tokens slip through; the interpreter is the layer
        // that actually lacks these capabilities.
        assert_eq!(blocked_token("let e = \"ex\" + \"ec\";"), None);
    }
}
