// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bounded-backtracking generator that produces a string matching a small
//! regex subset, for schemas that declare `pattern`.
//!
//! Supports literals, `.`, character classes (`\d \w \s` and their negations,
//! `[...]` with ranges), the quantifiers `* + ? {m,n}`, grouping `(...)`, and
//! alternation `|`. Anchors `^`/`$` are accepted and ignored (the generator
//! always produces a full match). Anything outside this subset causes
//! inversion to give up so the caller can fall back to a length-bounded
//! filler string.

use crate::rng::CaseRng;

const MAX_STEPS: usize = 4_000;

/// Attempt to generate a string matching `pattern`, within `min_len..=max_len`
/// where possible. Returns `None` if the pattern uses unsupported syntax or
/// the step budget is exhausted.
pub fn generate(pattern: &str, min_len: usize, max_len: usize, rng: &mut CaseRng) -> Option<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut parser = Parser { chars: &chars, pos: 0 };
    let ast = parser.parse_alt()?;
    if parser.pos != parser.chars.len() {
        return None;
    }
    let mut budget = MAX_STEPS;
    let mut out = String::new();
    gen_node(&ast, rng, &mut out, &mut budget)?;
    if out.chars().count() < min_len {
        let filler = out.chars().next().unwrap_or('a');
        while out.chars().count() < min_len {
            out.push(filler);
        }
    }
    if out.chars().count() > max_len {
        out = out.chars().take(max_len.max(1)).collect();
    }
    Some(out)
}

#[derive(Debug, Clone)]
enum Node {
    Literal(char),
    AnyChar,
    Class(Vec<(char, char)>, bool),
    Concat(Vec<Node>),
    Alt(Vec<Node>),
    Repeat(Box<Node>, usize, Option<usize>),
}

struct Parser<'a> {
    chars: &'a [char],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn parse_alt(&mut self) -> Option<Node> {
        let mut branches = vec![self.parse_concat()?];
        while self.peek() == Some('|') {
            self.bump();
            branches.push(self.parse_concat()?);
        }
        Some(if branches.len() == 1 {
            branches.pop().unwrap()
        } else {
            Node::Alt(branches)
        })
    }

    fn parse_concat(&mut self) -> Option<Node> {
        let mut items = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            items.push(self.parse_repeat()?);
        }
        Some(Node::Concat(items))
    }

    fn parse_repeat(&mut self) -> Option<Node> {
        let atom = self.parse_atom()?;
        match self.peek() {
            Some('*') => {
                self.bump();
                Some(Node::Repeat(Box::new(atom), 0, Some(12)))
            }
            Some('+') => {
                self.bump();
                Some(Node::Repeat(Box::new(atom), 1, Some(12)))
            }
            Some('?') => {
                self.bump();
                Some(Node::Repeat(Box::new(atom), 0, Some(1)))
            }
            Some('{') => {
                let save = self.pos;
                self.bump();
                let (lo, hi) = self.parse_bounds()?;
                if self.peek() == Some('}') {
                    self.bump();
                    Some(Node::Repeat(Box::new(atom), lo, hi))
                } else {
                    self.pos = save;
                    Some(atom)
                }
            }
            _ => Some(atom),
        }
    }

    fn parse_bounds(&mut self) -> Option<(usize, Option<usize>)> {
        let lo = self.parse_number()?;
        if self.peek() == Some(',') {
            self.bump();
            if self.peek() == Some('}') {
                Some((lo, Some(lo.max(12))))
            } else {
                let hi = self.parse_number()?;
                Some((lo, Some(hi)))
            }
        } else {
            Some((lo, Some(lo)))
        }
    }

    fn parse_number(&mut self) -> Option<usize> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.pos == start {
            return None;
        }
        self.chars[start..self.pos].iter().collect::<String>().parse().ok()
    }

    fn parse_atom(&mut self) -> Option<Node> {
        match self.bump()? {
            '^' | '$' => Some(Node::Concat(Vec::new())),
            '.' => Some(Node::AnyChar),
            '(' => {
                if self.peek() == Some('?') {
                    return None;
                }
                let inner = self.parse_alt()?;
                if self.bump()? != ')' {
                    return None;
                }
                Some(inner)
            }
            '[' => self.parse_class(),
            '\\' => self.parse_escape(),
            c => Some(Node::Literal(c)),
        }
    }

    fn parse_class(&mut self) -> Option<Node> {
        let negate = self.peek() == Some('^');
        if negate {
            self.bump();
        }
        let mut ranges = Vec::new();
        while let Some(c) = self.peek() {
            if c == ']' {
                break;
            }
            self.bump();
            let lo = if c == '\\' { self.bump()? } else { c };
            if self.peek() == Some('-') {
                let save = self.pos;
                self.bump();
                if let Some(hi) = self.peek() {
                    if hi != ']' {
                        self.bump();
                        ranges.push((lo, hi));
                        continue;
                    }
                }
                self.pos = save;
            }
            ranges.push((lo, lo));
        }
        if self.bump()? != ']' {
            return None;
        }
        Some(Node::Class(ranges, negate))
    }

    fn parse_escape(&mut self) -> Option<Node> {
        match self.bump()? {
            'd' => Some(Node::Class(vec![('0', '9')], false)),
            'D' => Some(Node::Class(vec![('0', '9')], true)),
            'w' => Some(Node::Class(
                vec![('a', 'z'), ('A', 'Z'), ('0', '9'), ('_', '_')],
                false,
            )),
            'W' => Some(Node::Class(
                vec![('a', 'z'), ('A', 'Z'), ('0', '9'), ('_', '_')],
                true,
            )),
            's' => Some(Node::Class(vec![(' ', ' '), ('\t', '\t'), ('\n', '\n')], false)),
            'S' => Some(Node::Class(vec![(' ', ' '), ('\t', '\t'), ('\n', '\n')], true)),
            c => Some(Node::Literal(c)),
        }
    }
}

fn gen_node(node: &Node, rng: &mut CaseRng, out: &mut String, budget: &mut usize) -> Option<()> {
    if *budget == 0 {
        return None;
    }
    *budget -= 1;
    match node {
        Node::Literal(c) => {
            out.push(*c);
            Some(())
        }
        Node::AnyChar => {
            out.push(char::from(b'a' + (rng.byte() % 26)));
            Some(())
        }
        Node::Class(ranges, negate) => {
            let c = pick_from_class(ranges, *negate, rng)?;
            out.push(c);
            Some(())
        }
        Node::Concat(items) => {
            for item in items {
                gen_node(item, rng, out, budget)?;
            }
            Some(())
        }
        Node::Alt(branches) => {
            let idx = rng.index(branches.len());
            gen_node(&branches[idx], rng, out, budget)
        }
        Node::Repeat(inner, lo, hi) => {
            let hi = hi.unwrap_or(*lo + 8).max(*lo);
            let n = if hi == *lo { *lo } else { *lo + (rng.index(hi - lo + 1)) };
            for _ in 0..n {
                gen_node(inner, rng, out, budget)?;
            }
            Some(())
        }
    }
}

fn pick_from_class(ranges: &[(char, char)], negate: bool, rng: &mut CaseRng) -> Option<char> {
    if !negate {
        if ranges.is_empty() {
            return None;
        }
        let idx = rng.index(ranges.len());
        let (lo, hi) = ranges[idx];
        let span = (hi as u32).saturating_sub(lo as u32) + 1;
        let offset = rng.index(span as usize) as u32;
        char::from_u32(lo as u32 + offset)
    } else {
        for _ in 0..64 {
            let c = char::from(b'!' + (rng.byte() % (b'~' - b'!')));
            if !ranges.iter().any(|(lo, hi)| c >= *lo && c <= *hi) {
                return Some(c);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_pattern_round_trips() {
        let mut rng = CaseRng::from_seed(1);
        let s = generate("^abc$", 0, 10, &mut rng).expect("generate");
        assert_eq!(s, "abc");
    }

    #[test]
    fn digit_class_produces_digits() {
        let mut rng = CaseRng::from_seed(2);
        let s = generate(r"\d{4}", 0, 10, &mut rng).expect("generate");
        assert_eq!(s.len(), 4);
        assert!(s.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn alternation_picks_a_branch() {
        let mut rng = CaseRng::from_seed(3);
        for _ in 0..20 {
            let s = generate("cat|dog", 0, 10, &mut rng).expect("generate");
            assert!(s == "cat" || s == "dog");
        }
    }

    #[test]
    fn unsupported_syntax_returns_none() {
        let mut rng = CaseRng::from_seed(4);
        assert!(generate("(?=lookahead)", 0, 10, &mut rng).is_none());
    }

    #[test]
    fn respects_length_bounds_after_generation() {
        let mut rng = CaseRng::from_seed(5);
        let s = generate("a*", 5, 5, &mut rng).expect("generate");
        assert_eq!(s.chars().count(), 5);
    }
}
