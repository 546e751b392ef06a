//! Grouped search criteria and SQL `LIKE` pattern matching.
//!
//! Search criteria sharing a group id are ORed together; distinct groups
//! are ANDed. A record satisfies a search when every group has at least
//! one matching member.

use std::collections::BTreeMap;
use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::error::Result;
use crate::record::Record;

/// A compiled SQL `LIKE` pattern.
///
/// `%` matches any run of characters, `_` matches exactly one character,
/// everything else is literal. Matching is case-insensitive and covers the
/// whole input.
#[derive(Debug, Clone)]
pub struct LikePattern {
    source: String,
    regex: Regex,
}

impl LikePattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let mut translated = String::with_capacity(pattern.len() + 8);
        translated.push('^');
        let mut buf = [0u8; 4];
        for c in pattern.chars() {
            match c {
                '%' => translated.push_str(".*"),
                '_' => translated.push('.'),
                other => translated.push_str(&regex::escape(other.encode_utf8(&mut buf))),
            }
        }
        translated.push('$');

        let regex = RegexBuilder::new(&translated)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }
}

impl fmt::Display for LikePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.source)
    }
}

/// One search entry: a string field, a `LIKE` pattern and a group id.
#[derive(Debug, Clone)]
pub struct SearchCriteria {
    field: String,
    pattern: LikePattern,
    group: i32,
}

impl SearchCriteria {
    pub fn new(field: impl Into<String>, pattern: &str, group: i32) -> Result<Self> {
        Ok(Self {
            field: field.into(),
            pattern: LikePattern::new(pattern)?,
            group,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn pattern(&self) -> &LikePattern {
        &self.pattern
    }

    pub fn group(&self) -> i32 {
        self.group
    }

    /// Whether the record's field is a string matching the pattern.
    pub fn matches<T: Record + ?Sized>(&self, item: &T) -> bool {
        item.field_value(&self.field)
            .as_str()
            .is_some_and(|s| self.pattern.is_match(s))
    }
}

impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} like {}", self.field, self.pattern)
    }
}

/// All criteria sharing one group id.
#[derive(Debug, Clone)]
pub struct SearchGroup {
    group: i32,
    criteria: Vec<SearchCriteria>,
}

impl SearchGroup {
    pub fn group(&self) -> i32 {
        self.group
    }

    pub fn criteria(&self) -> &[SearchCriteria] {
        &self.criteria
    }

    /// Whether at least one member matches.
    pub fn matches<T: Record + ?Sized>(&self, item: &T) -> bool {
        self.criteria.iter().any(|c| c.matches(item))
    }

    /// Partitions criteria into groups ordered by group id, members kept in
    /// declaration order.
    pub fn partition(criteria: &[SearchCriteria]) -> Vec<SearchGroup> {
        let mut groups: BTreeMap<i32, Vec<SearchCriteria>> = BTreeMap::new();
        for c in criteria {
            groups.entry(c.group).or_default().push(c.clone());
        }
        groups
            .into_iter()
            .map(|(group, criteria)| SearchGroup { group, criteria })
            .collect()
    }
}

impl fmt::Display for SearchGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group {}: ", self.group)?;
        for (i, c) in self.criteria.iter().enumerate() {
            if i > 0 {
                f.write_str(" or ")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Group-OR, cross-group-AND evaluation without allocating groups.
///
/// An empty criteria list is trivially satisfied.
pub fn matches_all_groups<T: Record + ?Sized>(item: &T, criteria: &[SearchCriteria]) -> bool {
    let mut hits: BTreeMap<i32, bool> = BTreeMap::new();
    for c in criteria {
        let hit = hits.entry(c.group).or_insert(false);
        if !*hit {
            *hit = c.matches(item);
        }
    }
    hits.values().all(|hit| *hit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    struct Doc {
        title: &'static str,
        body: &'static str,
    }

    impl Record for Doc {
        fn field_value(&self, field: &str) -> Value<'_> {
            match field {
                "title" => Value::String(self.title),
                "body" => Value::String(self.body),
                _ => Value::None,
            }
        }
    }

    #[test]
    fn like_wildcards() {
        let p = LikePattern::new("%ship%").unwrap();
        assert!(p.is_match("Relationship manager"));
        assert!(p.is_match("SHIP"));
        assert!(!p.is_match("shp"));

        let p = LikePattern::new("a_c").unwrap();
        assert!(p.is_match("abc"));
        assert!(!p.is_match("abbc"));
    }

    #[test]
    fn like_escapes_regex_metacharacters() {
        let p = LikePattern::new("1.0 (beta)%").unwrap();
        assert!(p.is_match("1.0 (beta) build"));
        assert!(!p.is_match("1x0 (beta)"));
    }

    #[test]
    fn like_is_anchored() {
        let p = LikePattern::new("ab").unwrap();
        assert!(!p.is_match("cab"));
        assert!(!p.is_match("abc"));
    }

    #[test]
    fn groups_or_within_and_across() {
        let doc = Doc {
            title: "Rust guide",
            body: "ownership and borrowing",
        };
        let criteria = vec![
            SearchCriteria::new("title", "%python%", 1).unwrap(),
            SearchCriteria::new("title", "%rust%", 1).unwrap(),
            SearchCriteria::new("body", "%borrow%", 2).unwrap(),
        ];
        assert!(matches_all_groups(&doc, &criteria));

        let failing = vec![
            SearchCriteria::new("title", "%rust%", 1).unwrap(),
            SearchCriteria::new("body", "%async%", 2).unwrap(),
        ];
        assert!(!matches_all_groups(&doc, &failing));
    }

    #[test]
    fn missing_field_never_matches() {
        let doc = Doc {
            title: "x",
            body: "y",
        };
        let c = SearchCriteria::new("author", "%", 1).unwrap();
        assert!(!c.matches(&doc));
    }

    #[test]
    fn empty_criteria_are_satisfied() {
        let doc = Doc {
            title: "x",
            body: "y",
        };
        assert!(matches_all_groups(&doc, &[]));
    }

    #[test]
    fn partition_orders_by_group() {
        let criteria = vec![
            SearchCriteria::new("body", "%a%", 5).unwrap(),
            SearchCriteria::new("title", "%b%", 2).unwrap(),
            SearchCriteria::new("body", "%c%", 5).unwrap(),
        ];
        let groups = SearchGroup::partition(&criteria);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group(), 2);
        assert_eq!(groups[1].criteria().len(), 2);
        assert_eq!(
            groups[1].to_string(),
            "group 5: body like \"%a%\" or body like \"%c%\""
        );
    }
}
