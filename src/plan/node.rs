//! Plan tree representation.
//!
//! A [`PlanNode`] mirrors one operator of the engine's `EXPLAIN (FORMAT JSON)`
//! output. The descriptive fields are kept for display only; the engine keys
//! this crate does not model are carried in `extra` so a plan survives a
//! serialization round trip untouched.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::{PlanError, PlanResult};

/// One operator in a plan tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanNode {
    #[serde(rename = "Node Type")]
    pub node_type: String,

    #[serde(rename = "Relation Name", default, skip_serializing_if = "Option::is_none")]
    pub relation_name: Option<String>,

    #[serde(rename = "Alias", default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(rename = "Filter", default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    #[serde(rename = "Index Cond", default, skip_serializing_if = "Option::is_none")]
    pub index_cond: Option<String>,

    #[serde(
        rename = "Sort Key",
        default,
        deserialize_with = "key_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub sort_key: Option<String>,

    #[serde(
        rename = "Group Key",
        default,
        deserialize_with = "key_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_key: Option<String>,

    /// Estimated cost of the subtree. `None` when the engine gave no usable value.
    #[serde(
        rename = "Total Cost",
        default,
        deserialize_with = "cost",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_cost: Option<f64>,

    #[serde(rename = "Node ID", default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<u64>,

    #[serde(rename = "Parent ID", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,

    /// Child plans in evaluation order.
    #[serde(rename = "Plans", default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PlanNode>,

    /// Engine keys not modelled above (startup cost, row estimates, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlanNode {
    /// Create a bare node of the given operator type.
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            relation_name: None,
            alias: None,
            filter: None,
            index_cond: None,
            sort_key: None,
            group_key: None,
            total_cost: None,
            node_id: None,
            parent_id: None,
            children: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Set the relation name.
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation_name = Some(relation.into());
        self
    }

    /// Set the filter expression.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set the estimated total cost.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.total_cost = Some(cost);
        self
    }

    /// Add a child node.
    pub fn with_child(mut self, child: PlanNode) -> Self {
        self.children.push(child);
        self
    }

    /// Replace the children.
    pub fn with_children(mut self, children: Vec<PlanNode>) -> Self {
        self.children = children;
        self
    }

    /// Parse the engine's `EXPLAIN (FORMAT JSON)` output.
    ///
    /// Accepts the engine's `[{"Plan": {...}}]` envelope, a bare
    /// `{"Plan": {...}}` object, or a plan object on its own.
    pub fn from_explain(output: &Value) -> PlanResult<Self> {
        let entry = match output {
            Value::Array(items) => items
                .first()
                .ok_or_else(|| PlanError::Malformed("empty explain output".into()))?,
            other => other,
        };

        let plan = match entry {
            Value::Object(map) if map.contains_key("Plan") => &map["Plan"],
            Value::Object(map) if map.contains_key("Node Type") => entry,
            Value::Object(_) => {
                return Err(PlanError::Malformed("missing \"Plan\" entry".into()));
            }
            other => {
                return Err(PlanError::Malformed(format!(
                    "expected a plan object, found {}",
                    json_kind(other)
                )));
            }
        };

        Ok(Self::deserialize(plan)?)
    }

    /// Parse explain output from a JSON string.
    pub fn from_explain_str(text: &str) -> PlanResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_explain(&value)
    }

    /// Load explain output saved to a file.
    pub fn from_explain_file(path: impl AsRef<Path>) -> PlanResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_explain_str(&text)
    }

    /// Iterate the tree in pre-order.
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    /// Find the node carrying the given id.
    pub fn find(&self, node_id: u64) -> Option<&PlanNode> {
        self.iter().find(|n| n.node_id == Some(node_id))
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Whether two trees have the same shape, ignoring every field.
    pub fn same_shape(&self, other: &PlanNode) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if a.children.len() != b.children.len() {
                return false;
            }
            stack.extend(a.children.iter().zip(b.children.iter()));
        }
        true
    }
}

/// Pre-order iterator over a plan tree.
pub struct PreOrder<'a> {
    stack: Vec<&'a PlanNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a PlanNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self, 0usize)];
        while let Some((node, indent)) = stack.pop() {
            let pad = "  ".repeat(indent);
            write!(f, "{}", pad)?;
            if let Some(id) = node.node_id {
                write!(f, "[{}] ", id)?;
            }
            write!(f, "{}", node.node_type)?;
            if let Some(ref relation) = node.relation_name {
                write!(f, " on {}", relation)?;
                if let Some(ref alias) = node.alias {
                    if alias != relation {
                        write!(f, " {}", alias)?;
                    }
                }
            }
            match node.total_cost {
                Some(cost) => writeln!(f, " (cost: {:.2})", cost)?,
                None => writeln!(f, " (cost: ?)")?,
            }

            let details = [
                ("Filter", &node.filter),
                ("Index Cond", &node.index_cond),
                ("Sort Key", &node.sort_key),
                ("Group Key", &node.group_key),
            ];
            for (label, value) in details {
                if let Some(value) = value {
                    writeln!(f, "{}    {}: {}", pad, label, value)?;
                }
            }

            stack.extend(node.children.iter().rev().map(|c| (c, indent + 1)));
        }
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Sort and group keys arrive as arrays of expressions.
fn key_list<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        ),
        other => Some(other.to_string()),
    })
}

/// Unusable costs become `None` instead of failing the whole plan.
fn cost<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let cost = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(cost.filter(|c| c.is_finite() && *c >= 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn explain_output() -> Value {
        json!([{
            "Plan": {
                "Node Type": "Hash Join",
                "Startup Cost": 12.5,
                "Total Cost": 431.75,
                "Plan Rows": 1200,
                "Hash Cond": "(o.o_custkey = c.c_custkey)",
                "Plans": [
                    {
                        "Node Type": "Seq Scan",
                        "Relation Name": "orders",
                        "Alias": "o",
                        "Total Cost": 300.0,
                        "Filter": "(o_totalprice > 100)"
                    },
                    {
                        "Node Type": "Hash",
                        "Total Cost": 100.25,
                        "Plans": [{
                            "Node Type": "Index Scan",
                            "Relation Name": "customer",
                            "Alias": "c",
                            "Index Cond": "(c_custkey < 50)",
                            "Total Cost": 100.0
                        }]
                    }
                ]
            },
            "Planning Time": 0.2
        }])
    }

    #[test]
    fn test_parse_explain_envelope() {
        let plan = PlanNode::from_explain(&explain_output()).unwrap();

        assert_eq!(plan.node_type, "Hash Join");
        assert_eq!(plan.total_cost, Some(431.75));
        assert_eq!(plan.children.len(), 2);
        assert_eq!(plan.children[0].relation_name.as_deref(), Some("orders"));
        assert_eq!(plan.children[0].filter.as_deref(), Some("(o_totalprice > 100)"));
        assert_eq!(plan.children[1].children[0].node_type, "Index Scan");
        assert!(plan.node_id.is_none());
    }

    #[test]
    fn test_unmodelled_keys_round_trip() {
        let plan = PlanNode::from_explain(&explain_output()).unwrap();
        assert_eq!(plan.extra["Startup Cost"], json!(12.5));

        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["Hash Cond"], json!("(o.o_custkey = c.c_custkey)"));
        assert_eq!(value["Plans"][1]["Plans"][0]["Alias"], json!("c"));
        assert!(value.get("Node ID").is_none());
    }

    #[test]
    fn test_key_lists_are_joined() {
        let plan = PlanNode::from_explain(&json!({
            "Node Type": "Sort",
            "Sort Key": ["l_returnflag", "l_linestatus DESC"],
            "Group Key": "l_returnflag",
            "Total Cost": 5
        }))
        .unwrap();

        assert_eq!(plan.sort_key.as_deref(), Some("l_returnflag, l_linestatus DESC"));
        assert_eq!(plan.group_key.as_deref(), Some("l_returnflag"));
        assert_eq!(plan.total_cost, Some(5.0));
    }

    #[test]
    fn test_unusable_cost_is_absent() {
        let text = r#"{"Plan": {"Node Type": "Result", "Total Cost": "n/a"}}"#;
        assert_eq!(PlanNode::from_explain_str(text).unwrap().total_cost, None);

        let text = r#"{"Plan": {"Node Type": "Result", "Total Cost": -1}}"#;
        assert_eq!(PlanNode::from_explain_str(text).unwrap().total_cost, None);

        let text = r#"{"Plan": {"Node Type": "Result", "Total Cost": "17.25"}}"#;
        assert_eq!(PlanNode::from_explain_str(text).unwrap().total_cost, Some(17.25));
    }

    #[test]
    fn test_malformed_output() {
        assert!(matches!(
            PlanNode::from_explain(&json!([])),
            Err(PlanError::Malformed(_))
        ));
        assert!(matches!(
            PlanNode::from_explain(&json!({"Planning Time": 1.0})),
            Err(PlanError::Malformed(_))
        ));
        assert!(matches!(
            PlanNode::from_explain(&json!(["QUERY PLAN"])),
            Err(PlanError::Malformed(_))
        ));
        assert!(matches!(
            PlanNode::from_explain(&json!({"Plan": {"Total Cost": 1.0}})),
            Err(PlanError::Json(_))
        ));
        assert!(PlanNode::from_explain_str("not json").is_err());
    }

    #[test]
    fn test_from_explain_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("plan.json");
        fs::write(&path, explain_output().to_string()).unwrap();

        let plan = PlanNode::from_explain_file(&path).unwrap();
        assert_eq!(plan.node_count(), 4);

        let missing = PlanNode::from_explain_file(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(PlanError::Io(_))));
    }

    #[test]
    fn test_pre_order_iteration() {
        let plan = PlanNode::from_explain(&explain_output()).unwrap();
        let types: Vec<_> = plan.iter().map(|n| n.node_type.as_str()).collect();
        assert_eq!(types, vec!["Hash Join", "Seq Scan", "Hash", "Index Scan"]);
    }

    #[test]
    fn test_same_shape() {
        let a = PlanNode::new("Nested Loop")
            .with_child(PlanNode::new("Seq Scan"))
            .with_child(PlanNode::new("Seq Scan"));
        let b = PlanNode::new("Hash Join")
            .with_child(PlanNode::new("Index Scan"))
            .with_child(PlanNode::new("Seq Scan"));
        let c = PlanNode::new("Hash Join").with_child(PlanNode::new("Seq Scan"));

        assert!(a.same_shape(&b));
        assert!(!a.same_shape(&c));
    }

    #[test]
    fn test_display_tree() {
        let plan = PlanNode::new("Nested Loop")
            .with_cost(42.0)
            .with_child(
                PlanNode::new("Seq Scan")
                    .with_relation("nation")
                    .with_filter("(n_regionkey = 1)")
                    .with_cost(1.5),
            );

        let text = plan.to_string();
        assert!(text.starts_with("Nested Loop (cost: 42.00)"));
        assert!(text.contains("  Seq Scan on nation (cost: 1.50)"));
        assert!(text.contains("Filter: (n_regionkey = 1)"));
    }
}
