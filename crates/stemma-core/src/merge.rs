//! Injected merge strategy.

use serde_json::Value;
use stemma_types::Record;

/// Merges one record into another: the base absorbs the incoming copy and
/// the result is committed identically to both stores.
///
/// The strategy is injected per run so the engine stays agnostic of record
/// internals; implementations may dispatch per [`Record::kind`]. The applier
/// hands in the incoming copy with its store-local identifier already
/// cleared, and forces the merged result onto the base's handle and
/// identifier afterwards.
pub trait Merger {
    fn merge(&self, base: &Record, incoming: &Record) -> Record;
}

/// Field-level union of two JSON object payloads: base fields win, incoming
/// fields fill the gaps. The merged timestamp is the newer of the two.
///
/// This is a generic fallback; deployments with richer record schemas plug
/// in their own [`Merger`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMerger;

impl Merger for JsonMerger {
    fn merge(&self, base: &Record, incoming: &Record) -> Record {
        let mut merged = base.clone();
        merged.change = base.change.max(incoming.change);
        if let (Value::Object(out), Value::Object(inc)) = (&mut merged.data, &incoming.data) {
            for (field, value) in inc {
                out.entry(field.clone()).or_insert_with(|| value.clone());
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stemma_types::RecordType;

    #[test]
    fn base_fields_win_and_gaps_fill() {
        let base = Record::new(
            "remote-h",
            RecordType::Person,
            100,
            json!({"name": "Ada", "birth": "1815"}),
        )
        .with_gramps_id("I0002");
        let incoming =
            Record::new("local-h", RecordType::Person, 200, json!({"name": "Ada L.", "death": "1852"}));

        let merged = JsonMerger.merge(&base, &incoming);
        assert_eq!(merged.handle, "remote-h");
        assert_eq!(merged.gramps_id.as_deref(), Some("I0002"));
        assert_eq!(merged.change, 200);
        assert_eq!(merged.data, json!({"name": "Ada", "birth": "1815", "death": "1852"}));
    }
}
