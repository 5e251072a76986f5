use crate::analysis::filters::stemmer::StemmerFilter;

/// Outcome of matching one dictionary candidate against a wildcard query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    Valid,
    Invalid,
    /// Step budget exhausted before a verdict; treated as invalid by callers
    /// and surfaced as a recoverable matcher timeout.
    Incomplete,
}

/// Machine states. `InvalidTmp` is a tentative failure that may still be
/// recovered through a saved wildcard checkpoint; `Tmp` is the stemmer
/// bridge test for query literals left over once the candidate is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Normal,
    Wildcard,
    Save,
    Tmp,
    Recovery,
    InvalidTmp,
}

pub const DEFAULT_STEP_BUDGET: u32 = 4096;

/// Decides whether an un-stemmed wildcard query (e.g. `sp*e`) is compatible
/// with a stemmed dictionary token (e.g. `space`): does some expansion of
/// the query stem to the candidate?
///
/// Two cursors walk query and candidate; each `*` saves an (i, j) checkpoint
/// so a later mismatch can recover by letting the wildcard swallow one more
/// character. The assumption throughout is a suffix-stripping stemmer:
/// leftover query literals are accepted only when appending them to the
/// candidate and re-stemming yields the candidate again.
pub struct WildcardMatcher<'a> {
    stemmer: &'a StemmerFilter,
    step_budget: u32,
}

impl<'a> WildcardMatcher<'a> {
    pub fn new(stemmer: &'a StemmerFilter) -> Self {
        Self::with_budget(stemmer, DEFAULT_STEP_BUDGET)
    }

    pub fn with_budget(stemmer: &'a StemmerFilter, step_budget: u32) -> Self {
        WildcardMatcher {
            stemmer,
            step_budget: step_budget.max(1),
        }
    }

    pub fn matches(&self, query: &str, candidate: &str) -> MatchOutcome {
        let q = query.as_bytes();
        let t = candidate.as_bytes();

        let mut i = 0usize; // cursor over q
        let mut j = 0usize; // cursor over t
        // checkpoints (i, j): resume the wildcard ending before q[i] with the
        // wildcard consuming t up to j
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut state = State::Start;
        let mut steps = 0u32;

        loop {
            steps += 1;
            if steps > self.step_budget {
                return MatchOutcome::Incomplete;
            }

            state = match state {
                State::Start => State::Normal,

                State::Normal => {
                    if i == q.len() && j == t.len() {
                        return MatchOutcome::Valid;
                    } else if i < q.len() && q[i] == b'*' {
                        i += 1;
                        State::Wildcard
                    } else if i == q.len() {
                        // candidate has unmatched tail
                        State::InvalidTmp
                    } else if j == t.len() {
                        // query literals left over: stemmer bridge
                        State::Tmp
                    } else if q[i] == t[j] {
                        i += 1;
                        j += 1;
                        State::Normal
                    } else {
                        State::InvalidTmp
                    }
                }

                State::Wildcard => {
                    if i == q.len() {
                        // trailing star swallows the rest of the candidate
                        j = t.len();
                        State::Normal
                    } else if j == t.len() {
                        State::Tmp
                    } else if q[i] == t[j] {
                        // zero-or-more consumption satisfied; checkpoint and
                        // resume literal matching
                        State::Save
                    } else {
                        j += 1;
                        State::Wildcard
                    }
                }

                State::Save => {
                    stack.push((i, j + 1));
                    i += 1;
                    j += 1;
                    State::Normal
                }

                State::Tmp => {
                    let residual: Vec<u8> =
                        q[i..].iter().copied().filter(|&b| b != b'*').collect();
                    if self.stem_bridge(t, &residual) {
                        return MatchOutcome::Valid;
                    }
                    State::InvalidTmp
                }

                State::Recovery => match stack.pop() {
                    Some((saved_i, saved_j)) if saved_j <= t.len() => {
                        i = saved_i;
                        j = saved_j;
                        State::Wildcard
                    }
                    Some(_) => State::InvalidTmp,
                    None => return MatchOutcome::Invalid,
                },

                State::InvalidTmp => {
                    if stack.is_empty() {
                        return MatchOutcome::Invalid;
                    }
                    State::Recovery
                }
            };
        }
    }

    /// Leftover query literals are compatible iff the stemmer strips them
    /// back off: stem(candidate + residual) == candidate.
    fn stem_bridge(&self, candidate: &[u8], residual: &[u8]) -> bool {
        if residual.is_empty() {
            // a trailing wildcard consumed the whole candidate tail
            return true;
        }
        let mut extended = Vec::with_capacity(candidate.len() + residual.len());
        extended.extend_from_slice(candidate);
        extended.extend_from_slice(residual);
        match std::str::from_utf8(&extended) {
            Ok(extended) => {
                self.stemmer.stem(extended).as_bytes() == candidate
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StemmerKind;
    use crate::core::types::Language;

    fn porter() -> StemmerFilter {
        StemmerFilter::new(StemmerKind::Porter, Language::English)
    }

    fn outcome(query: &str, candidate: &str) -> MatchOutcome {
        let stemmer = porter();
        WildcardMatcher::new(&stemmer).matches(query, candidate)
    }

    #[test]
    fn single_star_expansion() {
        assert_eq!(outcome("sp*e", "space"), MatchOutcome::Valid);
        assert_eq!(outcome("sp*e", "spade"), MatchOutcome::Valid);
        assert_eq!(outcome("sp*e", "spice"), MatchOutcome::Valid);
        assert_eq!(outcome("sp*ce", "space"), MatchOutcome::Valid);
        assert_eq!(outcome("sp*ce", "spice"), MatchOutcome::Valid);
        assert_eq!(outcome("sp*ce", "spade"), MatchOutcome::Invalid);
    }

    #[test]
    fn star_may_consume_nothing() {
        assert_eq!(outcome("spac*e", "space"), MatchOutcome::Valid);
        assert_eq!(outcome("*jam", "jam"), MatchOutcome::Valid);
        assert_eq!(outcome("jam*", "jam"), MatchOutcome::Valid);
    }

    #[test]
    fn leading_and_multi_star() {
        assert_eq!(outcome("*am", "jam"), MatchOutcome::Valid);
        assert_eq!(outcome("s*a*e", "space"), MatchOutcome::Valid);
        assert_eq!(outcome("s*a*e", "spice"), MatchOutcome::Invalid);
        assert_eq!(outcome("*", "anything"), MatchOutcome::Valid);
    }

    #[test]
    fn backtracking_over_repeated_segments() {
        // the first `b` reached by the wildcard is a dead end; recovery must
        // push the wildcard past it
        assert_eq!(outcome("a*bc", "abxbc"), MatchOutcome::Valid);
        assert_eq!(outcome("a*bc", "abxbd"), MatchOutcome::Invalid);
    }

    #[test]
    fn stemmer_bridge_accepts_stripped_suffixes() {
        // `hous*es` can expand to `houses`, which stems back to `hous`
        assert_eq!(outcome("hous*es", "hous"), MatchOutcome::Valid);
        // `mov*es` expands to `movies` which stems to `movi`
        assert_eq!(outcome("mov*es", "movi"), MatchOutcome::Valid);
        // but `sp*ce` has no expansion stemming to `spade`
        assert_eq!(outcome("sp*ce", "spade"), MatchOutcome::Invalid);
    }

    #[test]
    fn no_star_means_literal_equality() {
        assert_eq!(outcome("space", "space"), MatchOutcome::Valid);
        assert_eq!(outcome("space", "spade"), MatchOutcome::Invalid);
    }

    #[test]
    fn budget_exhaustion_is_incomplete() {
        let stemmer = porter();
        let matcher = WildcardMatcher::with_budget(&stemmer, 4);
        assert_eq!(
            matcher.matches("a*b*c*d", "abcabcabcabc"),
            MatchOutcome::Incomplete
        );
    }
}
