// Output matchers used by the polling helper

use regex::Regex;
use std::fmt::Debug;

/// Predicate over a decoded polling result
pub trait Matcher<T: ?Sized>: Send + Sync {
    fn matches(&self, testee: &T) -> bool;

    /// Human-readable form used in timeout logs and errors
    fn describe(&self) -> String;
}

/// Equality against an expected value
#[derive(Debug, Clone)]
pub struct Equals<T>(pub T);

impl<T> Matcher<T> for Equals<T>
where
    T: PartialEq + Debug + Send + Sync,
{
    fn matches(&self, testee: &T) -> bool {
        *testee == self.0
    }

    fn describe(&self) -> String {
        format!("equals({:?})", self.0)
    }
}

/// Matches when the pattern occurs at least once
#[derive(Debug, Clone)]
pub struct RegexMatch(pub Regex);

impl Matcher<String> for RegexMatch {
    fn matches(&self, testee: &String) -> bool {
        self.0.is_match(testee)
    }

    fn describe(&self) -> String {
        format!("regex({})", self.0.as_str())
    }
}

/// Matches when the pattern occurs exactly `count` times (non-overlapping)
#[derive(Debug, Clone)]
pub struct RegexCount {
    pub regex: Regex,
    pub count: usize,
}

impl Matcher<String> for RegexCount {
    fn matches(&self, testee: &String) -> bool {
        self.regex.find_iter(testee).count() == self.count
    }

    fn describe(&self) -> String {
        format!("regex_count({}, {})", self.regex.as_str(), self.count)
    }
}

/// Arbitrary closure with a description
pub struct Predicate<F> {
    description: String,
    f: F,
}

impl<T, F> Matcher<T> for Predicate<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn matches(&self, testee: &T) -> bool {
        (self.f)(testee)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

pub fn simple_matcher<T>(expected: T) -> Equals<T> {
    Equals(expected)
}

pub fn regex_matcher(regex: Regex) -> RegexMatch {
    RegexMatch(regex)
}

pub fn regex_count_matcher(regex: Regex, count: usize) -> RegexCount {
    RegexCount { regex, count }
}

pub fn predicate<F>(description: impl Into<String>, f: F) -> Predicate<F> {
    Predicate {
        description: description.into(),
        f,
    }
}
