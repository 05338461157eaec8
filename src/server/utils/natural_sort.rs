// src/server/utils/natural_sort.rs
//
// Ordering for folder and script names where embedded numbers compare by
// value: "VPS2" < "VPS10", "VPS07" == "VPS7", "abc" == "ABC".

use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Segment {
    Text(String),
    /// Digits without leading zeros, compared by length first so any run length works.
    Number { len: usize, digits: String },
}

/// Sort key for a name. Always starts with a text segment (possibly empty) and
/// alternates text/number, so segments at the same position have the same kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey(Vec<Segment>);

impl NaturalKey {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub fn natural_key(name: &str) -> NaturalKey {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut digits = String::new();

    for c in name.chars() {
        if c.is_ascii_digit() {
            if digits.is_empty() {
                segments.push(Segment::Text(std::mem::take(&mut text).to_lowercase()));
            }
            digits.push(c);
        } else {
            if !digits.is_empty() {
                segments.push(number_segment(&std::mem::take(&mut digits)));
            }
            text.push(c);
        }
    }

    if !digits.is_empty() {
        segments.push(number_segment(&digits));
        segments.push(Segment::Text(String::new()));
    } else {
        segments.push(Segment::Text(text.to_lowercase()));
    }

    NaturalKey(segments)
}

fn number_segment(run: &str) -> Segment {
    let trimmed = run.trim_start_matches('0');
    let digits = if trimmed.is_empty() { "0" } else { trimmed };
    Segment::Number {
        len: digits.len(),
        digits: digits.to_string(),
    }
}

pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

/// Stable: names with equal keys keep their input order.
pub fn sort_naturally<T: AsRef<str>>(items: &mut [T]) {
    items.sort_by_cached_key(|item| natural_key(item.as_ref()));
}
