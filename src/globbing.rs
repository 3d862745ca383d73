//! Bounded glob matching for path filters and trigger globs.
//!
//! DP wildcard matcher over `*` and `?` (treating `**` as an ordinary run
//! of `*` segments, which matches the same strings) — no regex
//! compilation per pattern, so pack-authored globs can never trigger
//! catastrophic backtracking.

pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p = pattern.as_bytes();
    let t = text.as_bytes();
    let mut dp = vec![vec![false; t.len() + 1]; p.len() + 1];
    dp[0][0] = true;

    for i in 1..=p.len() {
        if p[i - 1] == b'*' {
            dp[i][0] = dp[i - 1][0];
        }
    }

    for i in 1..=p.len() {
        for j in 1..=t.len() {
            dp[i][j] = match p[i - 1] {
                b'*' => dp[i - 1][j] || dp[i][j - 1],
                b'?' => dp[i - 1][j - 1],
                c => dp[i - 1][j - 1] && c == t[j - 1],
            };
        }
    }

    dp[p.len()][t.len()]
}

pub fn any_glob_matches(globs: &[String], text: &str) -> bool {
    globs.iter().any(|g| glob_match(g, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_any_suffix() {
        assert!(glob_match("docs/*.md", "docs/readme.md"));
        assert!(!glob_match("docs/*.md", "src/readme.md"));
    }

    #[test]
    fn double_star_matches_nested_path() {
        assert!(glob_match("src/**/*.rs", "src/a/b/c.rs"));
    }

    #[test]
    fn question_mark_matches_single_char() {
        assert!(glob_match("file?.txt", "file1.txt"));
        assert!(!glob_match("file?.txt", "file10.txt"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A pattern with no `*`/`?` only ever matches its own text,
        /// regardless of what that text happens to be.
        #[test]
        fn literal_pattern_matches_only_itself(a in "[a-z/]{0,12}", b in "[a-z/]{0,12}") {
            if !a.contains(['*', '?']) {
                prop_assert_eq!(glob_match(&a, &b), a == b);
            }
        }
    }
}
