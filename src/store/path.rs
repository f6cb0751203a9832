//! `/` 分隔的树路径与 JSON 子树读写工具。
//!
//! 存储语义:
//! - 写入 `null` 表示删除该子树
//! - 空对象不会被保存 (删除最后一个子节点时父节点一并消失)

use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

const FORBIDDEN_CHARS: [char; 5] = ['.', '#', '$', '[', ']'];

/// 解析后的路径: 顶层节点 key + 其余路径段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreePath {
    pub root: String,
    pub rest: Vec<String>,
}

impl TreePath {
    pub fn parse(path: &str) -> AppResult<Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if let Some(bad) = segments
            .iter()
            .find(|s| s.contains(&FORBIDDEN_CHARS[..]))
        {
            return Err(AppError::StoreError(format!(
                "Invalid path segment '{bad}' in '{path}'"
            )));
        }

        let (root, rest) = segments
            .split_first()
            .ok_or_else(|| AppError::StoreError("Empty store path".to_string()))?;
        Ok(TreePath {
            root: root.to_string(),
            rest: rest.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn full(&self) -> String {
        std::iter::once(self.root.as_str())
            .chain(self.rest.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// 读取 `root` 下 `rest` 指向的子树
pub fn value_at<'a>(root: &'a Value, rest: &[String]) -> Option<&'a Value> {
    rest.iter()
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

/// 返回把 `rest` 处替换为 `new` 之后的整棵树 (None 表示整棵树为空)
pub fn replace_at(node: Option<Value>, rest: &[String], new: Value) -> Option<Value> {
    match rest.split_first() {
        None => normalize(new),
        Some((head, tail)) => {
            let mut map = match node {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            };
            let child = map.remove(head);
            if let Some(updated) = replace_at(child, tail, new) {
                map.insert(head.clone(), updated);
            }
            if map.is_empty() {
                None
            } else {
                Some(Value::Object(map))
            }
        }
    }
}

/// 去掉 null 和空对象
fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let pruned: Map<String, Value> = map
                .into_iter()
                .filter_map(|(k, v)| normalize(v).map(|v| (k, v)))
                .collect();
            if pruned.is_empty() {
                None
            } else {
                Some(Value::Object(pruned))
            }
        }
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn segs(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_path() {
        let p = TreePath::parse("participants/abc").unwrap();
        assert_eq!(p.root, "participants");
        assert_eq!(p.rest, segs(&["abc"]));
        assert_eq!(p.full(), "participants/abc");

        let p = TreePath::parse("/prizes/remaining/").unwrap();
        assert_eq!(p.root, "prizes");
        assert_eq!(p.rest, segs(&["remaining"]));

        assert!(TreePath::parse("").is_err());
        assert!(TreePath::parse("///").is_err());
        assert!(TreePath::parse("participants/a.b").is_err());
        assert!(TreePath::parse("bad$root").is_err());
    }

    #[test]
    fn test_value_at() {
        let tree = json!({"a": {"b": {"c": 1}}});
        assert_eq!(value_at(&tree, &segs(&["a", "b", "c"])), Some(&json!(1)));
        assert_eq!(value_at(&tree, &[]), Some(&tree));
        assert_eq!(value_at(&tree, &segs(&["a", "x"])), None);
        assert_eq!(value_at(&tree, &segs(&["a", "b", "c", "d"])), None);
    }

    #[test]
    fn test_replace_keeps_siblings() {
        let tree = json!({"u1": {"wonPrize": true}, "u2": {"wonPrize": false}});
        let updated = replace_at(Some(tree), &segs(&["u1", "redeemed"]), json!(true)).unwrap();
        assert_eq!(
            updated,
            json!({"u1": {"wonPrize": true, "redeemed": true}, "u2": {"wonPrize": false}})
        );
    }

    #[test]
    fn test_null_deletes_and_prunes_empty_parents() {
        let tree = json!({"u1": {"redeemCode": "ABCD"}});
        assert_eq!(
            replace_at(Some(tree.clone()), &segs(&["u1", "redeemCode"]), Value::Null),
            None
        );
        assert_eq!(replace_at(Some(tree), &[], Value::Null), None);
        assert_eq!(replace_at(None, &[], json!({"x": null})), None);
    }

    #[test]
    fn test_replace_through_scalar_creates_object() {
        let updated = replace_at(Some(json!(5)), &segs(&["remaining"]), json!(3)).unwrap();
        assert_eq!(updated, json!({"remaining": 3}));
    }
}
