//! Lookup keys for compiled templates.

const SEPARATOR: char = ':';

/// Build a deterministic template key from a domain prefix and classification
/// fields. Absent fields become empty segments, so `[Some(a), None]` and
/// `[Some(a)]` produce different keys.
///
/// Fields are expected to come from closed vocabularies that never contain
/// the separator; no escaping is performed.
pub fn build_key(prefix: &str, fields: &[Option<&str>]) -> String {
    let capacity = prefix.len() + fields.iter().map(|f| f.map_or(0, str::len) + 1).sum::<usize>();
    let mut key = String::with_capacity(capacity);
    key.push_str(prefix);
    for field in fields {
        key.push(SEPARATOR);
        if let Some(value) = field {
            key.push_str(value);
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::template::types::{ClientType, TemplateType};

    #[test]
    fn test_build_key_layout() {
        let key = build_key("card", &[Some("handlebars"), Some("PR_Opened"), Some("slack")]);
        assert_eq!(key, "card:handlebars:PR_Opened:slack");
    }

    #[test]
    fn test_absent_field_is_empty_segment() {
        assert_eq!(build_key("event", &[Some("liquid"), Some("Push"), None]), "event:liquid:Push:");
        assert_ne!(
            build_key("event", &[Some("liquid"), None]),
            build_key("event", &[Some("liquid")])
        );
    }

    #[test]
    fn test_deterministic() {
        let fields = [Some("liquid"), Some("Issue_Opened"), None];
        assert_eq!(build_key("event", &fields), build_key("event", &fields));
    }

    #[test]
    fn test_distinct_classifications_never_collide() {
        let sources = ["PullRequest_Opened", "PullRequest_Closed", "Issue_Opened", "Push"];
        let mut seen = HashSet::new();
        let mut total = 0;

        for t in TemplateType::all() {
            for s in sources {
                let clients = ClientType::all()
                    .iter()
                    .map(|c| Some(c.as_str()))
                    .chain(std::iter::once(None));
                for c in clients {
                    seen.insert(build_key("card", &[Some(t.as_str()), Some(s), c]));
                    total += 1;
                }
            }
        }

        assert_eq!(seen.len(), total);
    }
}
