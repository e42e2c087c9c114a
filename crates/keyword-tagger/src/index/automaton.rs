//! Byte-level Aho-Corasick automaton.
//!
//! Patterns are matched on their UTF-8 bytes. UTF-8 is self-synchronising, so
//! a byte-level substring match of a valid UTF-8 pattern inside valid UTF-8
//! text is always a match on character boundaries.

use std::collections::VecDeque;

type StateId = u32;

const ROOT: StateId = 0;

#[derive(Debug, Clone, Default)]
struct State {
    /// Outgoing edges, sorted by byte.
    transitions: Vec<(u8, StateId)>,
    /// Longest proper suffix of this state's path that is also a trie path.
    fail: StateId,
    /// Nearest state on the fail chain (excluding self) with outputs.
    output_link: Option<StateId>,
    /// Patterns ending exactly at this state.
    outputs: Vec<usize>,
}

impl State {
    fn next(&self, byte: u8) -> Option<StateId> {
        self.transitions
            .binary_search_by_key(&byte, |&(b, _)| b)
            .ok()
            .map(|i| self.transitions[i].1)
    }
}

/// A pattern occurrence: pattern id and byte span in the haystack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawMatch {
    pub pattern: usize,
    pub start: usize,
    pub end: usize,
}

/// Multi-pattern automaton over byte strings.
#[derive(Debug, Clone)]
pub(crate) struct Automaton {
    states: Vec<State>,
    /// Dense root row so the hot "no match yet" path avoids a search.
    root_row: Box<[StateId; 256]>,
    pattern_lens: Vec<usize>,
}

impl Automaton {
    /// Build from patterns; pattern ids are their positions in the iterator.
    ///
    /// Construction is linear in the total pattern length (times the constant
    /// alphabet bound for sorted edge insertion).
    pub fn build<'a, I>(patterns: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut states = vec![State::default()];
        let mut pattern_lens = Vec::new();

        for (pattern_id, pattern) in patterns.into_iter().enumerate() {
            pattern_lens.push(pattern.len());
            if pattern.is_empty() {
                continue;
            }
            let mut current = ROOT;
            for &byte in pattern {
                current = match states[current as usize].next(byte) {
                    Some(next) => next,
                    None => {
                        let next = states.len() as StateId;
                        states.push(State::default());
                        let edges = &mut states[current as usize].transitions;
                        let pos = edges.partition_point(|&(b, _)| b < byte);
                        edges.insert(pos, (byte, next));
                        next
                    }
                };
            }
            states[current as usize].outputs.push(pattern_id);
        }

        let mut root_row = Box::new([ROOT; 256]);
        for &(byte, next) in &states[ROOT as usize].transitions {
            root_row[byte as usize] = next;
        }

        let mut automaton = Self {
            states,
            root_row,
            pattern_lens,
        };
        automaton.link_failures();
        automaton
    }

    /// Breadth-first computation of failure and output links.
    fn link_failures(&mut self) {
        // Depth-one states keep the default `fail = ROOT`.
        let mut queue: VecDeque<StateId> = self.states[ROOT as usize]
            .transitions
            .iter()
            .map(|&(_, child)| child)
            .collect();

        while let Some(state) = queue.pop_front() {
            let edges = self.states[state as usize].transitions.clone();
            for (byte, child) in edges {
                let mut fallback = self.states[state as usize].fail;
                let fail = loop {
                    if let Some(next) = self.step_from(fallback, byte) {
                        break next;
                    }
                    if fallback == ROOT {
                        break ROOT;
                    }
                    fallback = self.states[fallback as usize].fail;
                };

                let fail_state = &self.states[fail as usize];
                let output_link = if fail_state.outputs.is_empty() {
                    fail_state.output_link
                } else {
                    Some(fail)
                };

                let child_state = &mut self.states[child as usize];
                child_state.fail = fail;
                child_state.output_link = output_link;
                queue.push_back(child);
            }
        }
    }

    fn step_from(&self, state: StateId, byte: u8) -> Option<StateId> {
        if state == ROOT {
            let next = self.root_row[byte as usize];
            (next != ROOT).then_some(next)
        } else {
            self.states[state as usize].next(byte)
        }
    }

    /// Follow goto/fail edges for one input byte.
    fn advance(&self, mut state: StateId, byte: u8) -> StateId {
        loop {
            if let Some(next) = self.step_from(state, byte) {
                return next;
            }
            if state == ROOT {
                return ROOT;
            }
            state = self.states[state as usize].fail;
        }
    }

    /// Visit every pattern occurrence in `haystack`, left to right by end
    /// position. Returning `false` from the visitor stops the scan.
    pub fn scan<F>(&self, haystack: &[u8], mut visit: F)
    where
        F: FnMut(RawMatch) -> bool,
    {
        let mut state = ROOT;
        for (pos, &byte) in haystack.iter().enumerate() {
            state = self.advance(state, byte);

            let mut cursor = if self.states[state as usize].outputs.is_empty() {
                self.states[state as usize].output_link
            } else {
                Some(state)
            };

            while let Some(matched) = cursor {
                let matched_state = &self.states[matched as usize];
                for &pattern in &matched_state.outputs {
                    let end = pos + 1;
                    let raw = RawMatch {
                        pattern,
                        start: end - self.pattern_lens[pattern],
                        end,
                    };
                    if !visit(raw) {
                        return;
                    }
                }
                cursor = matched_state.output_link;
            }
        }
    }

    /// Number of trie states, root included.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(patterns: &[&str], haystack: &str) -> Vec<(usize, usize, usize)> {
        let automaton = Automaton::build(patterns.iter().map(|p| p.as_bytes()));
        let mut found = Vec::new();
        automaton.scan(haystack.as_bytes(), |m| {
            found.push((m.pattern, m.start, m.end));
            true
        });
        found
    }

    #[test]
    fn test_overlapping_patterns() {
        // Classic he/she/his/hers example.
        let found = matches(&["he", "she", "his", "hers"], "ushers");
        assert!(found.contains(&(1, 1, 4)));
        assert!(found.contains(&(0, 2, 4)));
        assert!(found.contains(&(3, 2, 6)));
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn test_pattern_inside_longer_pattern() {
        let found = matches(&["송금", "해외송금"], "해외송금 완료");
        let ids: Vec<usize> = found.iter().map(|m| m.0).collect();
        assert!(ids.contains(&0));
        assert!(ids.contains(&1));
    }

    #[test]
    fn test_failure_after_partial_match() {
        // "ban" is a dead end for "bank" but "an" must still be found.
        let found = matches(&["bank", "and"], "banana and");
        assert_eq!(found, vec![(1, 7, 10)]);
    }

    #[test]
    fn test_no_patterns() {
        let automaton = Automaton::build(std::iter::empty());
        assert_eq!(automaton.state_count(), 1);
        let mut called = false;
        automaton.scan(b"anything", |_| {
            called = true;
            true
        });
        assert!(!called);
    }

    #[test]
    fn test_duplicate_patterns_both_reported() {
        let found = matches(&["bank", "bank"], "bank");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_early_stop() {
        let automaton = Automaton::build(["a"].iter().map(|p| p.as_bytes()));
        let mut count = 0;
        automaton.scan(b"aaaa", |_| {
            count += 1;
            false
        });
        assert_eq!(count, 1);
    }

    #[test]
    fn test_depth_one_states_fail_to_root() {
        let automaton = Automaton::build(["ab", "b", "가"].iter().map(|p| p.as_bytes()));
        for &(_, child) in &automaton.states[ROOT as usize].transitions {
            assert_eq!(automaton.states[child as usize].fail, ROOT);
        }
        // "ab" fails over to "b", which carries an output.
        let a = automaton.states[ROOT as usize].next(b'a').unwrap();
        let ab = automaton.states[a as usize].next(b'b').unwrap();
        let b = automaton.states[ROOT as usize].next(b'b').unwrap();
        assert_eq!(automaton.states[ab as usize].fail, b);
        assert_eq!(automaton.states[ab as usize].output_link, Some(b));
    }

    #[test]
    fn test_shared_prefixes_share_states() {
        let automaton = Automaton::build(["abc", "abd", "ab"].iter().map(|p| p.as_bytes()));
        assert_eq!(automaton.state_count(), 5);
    }
}
