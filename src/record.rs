//! Validation and normalization of a single raw conversation record.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

/// A record exactly as decoded from an archive entry. Unknown keys are allowed.
pub type RawRecord = Map<String, Value>;

/// Message payloads keyed by turn index.
pub type Messages = BTreeMap<u64, Value>;

/// Text that follows the assistant persona inside `role_1`.
pub const ASSISTANT_ROLE_MARKER: &str = "_RoleType.ASSISTANT";
/// Text that follows the user persona inside `role_2`.
pub const USER_ROLE_MARKER: &str = "_RoleType.USER";

pub const ASSISTANT_ROLE_FIELD: &str = "role_1";
pub const USER_ROLE_FIELD: &str = "role_2";
pub const ORIGINAL_TASK_FIELD: &str = "original_task";
pub const SPECIFIED_TASK_FIELD: &str = "specified_task";

const MESSAGE_KEY_PATTERN: &str = r"message_(?P<number>[0-9]+)";

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub assistant_role: String,
    pub user_role: String,
    pub original_task: String,
    pub specified_task: String,
    pub messages: Messages,
}

/// Returns the text before the first occurrence of `marker`, provided the
/// marker is present and that text is not empty.
pub fn extract_role<'a>(label: &'a str, marker: &str) -> Option<&'a str> {
    let (prefix, _) = label.split_once(marker)?;
    if prefix.is_empty() {
        None
    } else {
        Some(prefix)
    }
}

/// Validates `raw` and pulls out the structured fields.
///
/// Checks run in order and stop at the first failure:
/// `role_1` carries an assistant persona, `role_2` carries a user persona,
/// then `original_task` and `specified_task` are non-empty strings.
/// `None` means the record is rejected; no partial record is ever built.
pub fn parse(raw: &RawRecord) -> Option<NormalizedRecord> {
    let assistant_role = extract_role(raw.get(ASSISTANT_ROLE_FIELD)?.as_str()?, ASSISTANT_ROLE_MARKER)?;
    let user_role = extract_role(raw.get(USER_ROLE_FIELD)?.as_str()?, USER_ROLE_MARKER)?;
    let original_task = non_empty_str(raw, ORIGINAL_TASK_FIELD)?;
    let specified_task = non_empty_str(raw, SPECIFIED_TASK_FIELD)?;

    Some(NormalizedRecord {
        assistant_role: assistant_role.to_string(),
        user_role: user_role.to_string(),
        original_task: original_task.to_string(),
        specified_task: specified_task.to_string(),
        messages: collect_messages(raw),
    })
}

/// Same as [`parse`] for an arbitrary JSON value; anything other than an
/// object is rejected.
pub fn parse_value(value: &Value) -> Option<NormalizedRecord> {
    value.as_object().and_then(parse)
}

fn non_empty_str<'a>(raw: &'a RawRecord, field: &str) -> Option<&'a str> {
    raw.get(field)?.as_str().filter(|s| !s.is_empty())
}

fn message_key() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MESSAGE_KEY_PATTERN).ok()).as_ref()
}

/// Turn index encoded in a field name, e.g. `message_3` -> 3. The pattern
/// may appear anywhere in the name; numbers that overflow `u64` yield `None`.
pub fn message_index(key: &str) -> Option<u64> {
    message_key()?
        .captures(key)?
        .name("number")?
        .as_str()
        .parse()
        .ok()
}

fn collect_messages(raw: &RawRecord) -> Messages {
    raw.iter()
        .filter_map(|(key, value)| message_index(key).map(|index| (index, value.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn valid() -> RawRecord {
        record(json!({
            "role_1": "Programmer_RoleType.ASSISTANT",
            "role_2": "Trader_RoleType.USER",
            "original_task": "Build a bot",
            "specified_task": "Build a trading bot in Python",
            "message_0": {"role": "user", "content": "hi"},
            "message_1": "hello",
        }))
    }

    #[test]
    fn parses_a_valid_record() {
        let parsed = parse(&valid()).unwrap();
        assert_eq!(parsed.assistant_role, "Programmer");
        assert_eq!(parsed.user_role, "Trader");
        assert_eq!(parsed.original_task, "Build a bot");
        assert_eq!(parsed.specified_task, "Build a trading bot in Python");
        assert_eq!(parsed.messages.len(), 2);
        assert_eq!(parsed.messages[&1], json!("hello"));
    }

    #[test]
    fn rejects_missing_or_malformed_required_fields() {
        let cases: Vec<(&str, Option<Value>)> = vec![
            ("role_1", None),
            ("role_2", None),
            ("original_task", None),
            ("specified_task", None),
            ("role_1", Some(json!("Programmer"))),
            ("role_1", Some(json!("_RoleType.ASSISTANT"))),
            ("role_1", Some(json!("Programmer_RoleType.USER"))),
            ("role_1", Some(json!(["Programmer_RoleType.ASSISTANT"]))),
            ("role_2", Some(json!("Trader"))),
            ("role_2", Some(json!("_RoleType.USER"))),
            ("original_task", Some(json!(""))),
            ("specified_task", Some(json!(""))),
            ("specified_task", Some(json!(42))),
            ("original_task", Some(json!({"title": "Build a bot"}))),
            ("original_task", Some(json!(null))),
            ("role_2", Some(json!(7))),
            ("role_2", Some(json!({"name": "Trader_RoleType.USER"}))),
        ];

        for (field, replacement) in cases {
            let mut raw = valid();
            match &replacement {
                Some(value) => {
                    raw.insert(field.to_string(), value.clone());
                }
                None => {
                    raw.remove(field);
                }
            }
            assert!(
                parse(&raw).is_none(),
                "expected rejection for {field} = {replacement:?}"
            );
        }
    }

    #[test]
    fn role_is_text_before_first_marker() {
        assert_eq!(
            extract_role("A_RoleType.ASSISTANT_RoleType.ASSISTANT", ASSISTANT_ROLE_MARKER),
            Some("A")
        );
        assert_eq!(extract_role("Chef_RoleType.USER suffix", USER_ROLE_MARKER), Some("Chef"));
        assert_eq!(extract_role("Chef", USER_ROLE_MARKER), None);
    }

    #[test]
    fn collects_numbered_messages_with_gaps() {
        let mut raw = valid();
        raw.remove("message_0");
        raw.remove("message_1");
        raw.insert("message_7".into(), json!("seven"));
        raw.insert("message_0".into(), json!("zero"));
        raw.insert("message_1".into(), json!("one"));
        raw.insert("termination_reasons".into(), json!(["done"]));
        raw.insert("num_messages".into(), json!(3));

        let parsed = parse(&raw).unwrap();
        let keys: Vec<u64> = parsed.messages.keys().copied().collect();
        assert_eq!(keys, vec![0, 1, 7]);
        assert_eq!(parsed.messages[&0], json!("zero"));
        assert_eq!(parsed.messages[&7], json!("seven"));
    }

    #[test]
    fn message_key_pattern_compiles() {
        assert!(message_key().is_some());
    }

    #[test]
    fn message_index_uses_search_semantics() {
        assert_eq!(message_index("message_12"), Some(12));
        assert_eq!(message_index("assistant_message_3_raw"), Some(3));
        assert_eq!(message_index("message_"), None);
        assert_eq!(message_index("num_messages"), None);
        assert_eq!(message_index("message_99999999999999999999999"), None);
    }

    #[test]
    fn parsing_is_repeatable() {
        let raw = valid();
        assert_eq!(parse(&raw), parse(&raw));
    }

    #[test]
    fn non_object_values_are_rejected() {
        assert!(parse_value(&json!([1, 2, 3])).is_none());
        assert!(parse_value(&json!("role_1")).is_none());
        assert!(parse_value(&Value::Object(valid())).is_some());
    }
}
