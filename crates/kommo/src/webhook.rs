//! Kommo webhook payload parsing.
//!
//! Kommo posts webhooks as bracketed form fields
//! (`leads[status][0][id]=123`). JSON variants are flattened to the same
//! key shape so one extraction path serves both encodings.

use std::collections::HashMap;

use serde_json::Value;

/// A flattened webhook payload: bracketed keys to string values.
pub type WebhookFields = HashMap<String, String>;

/// The webhook event kinds the relay recognizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// A lead moved between pipeline stages.
    StatusChanged(StatusChange),
    /// A lead was created.
    LeadAdded { lead_id: String },
    /// A contact was created.
    ContactAdded { contact_id: String },
    /// Nothing we recognize.
    Unknown,
}

/// Field values of a status-change webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusChange {
    /// The lead that moved.
    pub lead_id: String,
    /// Stage it moved to.
    pub new_status_id: Option<String>,
    /// Stage it came from.
    pub old_status_id: Option<String>,
    /// Pipeline it moved to.
    pub new_pipeline_id: Option<String>,
    /// Pipeline it came from.
    pub old_pipeline_id: Option<String>,
}

/// Account fields common to all webhook kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookAccount {
    /// CRM account ID.
    pub account_id: Option<String>,
    /// Account subdomain.
    pub subdomain: Option<String>,
}

/// Flatten a JSON body into bracketed form keys.
///
/// `{"account": {"id": 123}}` becomes `account[id] = "123"`; array
/// elements are keyed by index, scalars are stringified, nulls dropped.
pub fn flatten_json(value: &Value) -> WebhookFields {
    let mut fields = HashMap::new();
    if let Value::Object(map) = value {
        for (key, val) in map {
            flatten_into(&mut fields, key.clone(), val);
        }
    }
    fields
}

fn flatten_into(fields: &mut WebhookFields, prefix: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                flatten_into(fields, format!("{prefix}[{key}]"), val);
            }
        }
        Value::Array(items) => {
            for (index, val) in items.iter().enumerate() {
                flatten_into(fields, format!("{prefix}[{index}]"), val);
            }
        }
        Value::Null => {}
        Value::String(s) => {
            fields.insert(prefix, s.clone());
        }
        other => {
            fields.insert(prefix, other.to_string());
        }
    }
}

/// Extract the account fields from a payload.
pub fn parse_account(fields: &WebhookFields) -> WebhookAccount {
    WebhookAccount {
        account_id: fields.get("account[id]").cloned(),
        subdomain: fields.get("account[subdomain]").cloned(),
    }
}

/// Classify a payload by which entity keys it carries.
pub fn classify(fields: &WebhookFields) -> WebhookEvent {
    if fields.contains_key("leads[status][0][id]") {
        return WebhookEvent::StatusChanged(parse_status_change(fields));
    }
    if let Some(id) = fields.get("leads[add][0][id]") {
        return WebhookEvent::LeadAdded {
            lead_id: id.clone(),
        };
    }
    if let Some(id) = fields.get("contacts[add][0][id]") {
        return WebhookEvent::ContactAdded {
            contact_id: id.clone(),
        };
    }
    WebhookEvent::Unknown
}

/// Pull the status-change fields out of a payload.
///
/// Keys are matched exactly: `status_id` is the new stage, and the old
/// one arrives either as `status_id][old]` or `old_status_id` depending
/// on the webhook rendition.
fn parse_status_change(fields: &WebhookFields) -> StatusChange {
    StatusChange {
        lead_id: fields
            .get("leads[status][0][id]")
            .cloned()
            .unwrap_or_default(),
        new_status_id: fields.get("leads[status][0][status_id]").cloned(),
        old_status_id: fields
            .get("leads[status][0][status_id][old]")
            .or_else(|| fields.get("leads[status][0][old_status_id]"))
            .cloned(),
        new_pipeline_id: fields.get("leads[status][0][pipeline_id]").cloned(),
        old_pipeline_id: fields
            .get("leads[status][0][pipeline_id][old]")
            .or_else(|| fields.get("leads[status][0][old_pipeline_id]"))
            .cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form_fields(pairs: &[(&str, &str)]) -> WebhookFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn flattens_nested_objects_and_arrays() {
        let fields = flatten_json(&json!({
            "account": { "id": 34116155, "subdomain": "acme" },
            "leads": {
                "status": [
                    { "id": 9001, "status_id": 200, "old_status_id": 100 }
                ]
            }
        }));

        assert_eq!(fields.get("account[id]").map(String::as_str), Some("34116155"));
        assert_eq!(fields.get("account[subdomain]").map(String::as_str), Some("acme"));
        assert_eq!(
            fields.get("leads[status][0][id]").map(String::as_str),
            Some("9001")
        );
        assert_eq!(
            fields.get("leads[status][0][old_status_id]").map(String::as_str),
            Some("100")
        );
    }

    #[test]
    fn classifies_status_change_with_old_and_new() {
        let fields = form_fields(&[
            ("account[id]", "34116155"),
            ("account[subdomain]", "acme"),
            ("leads[status][0][id]", "9001"),
            ("leads[status][0][status_id]", "200"),
            ("leads[status][0][old_status_id]", "100"),
            ("leads[status][0][pipeline_id]", "10"),
            ("leads[status][0][old_pipeline_id]", "10"),
        ]);

        let account = parse_account(&fields);
        assert_eq!(account.account_id.as_deref(), Some("34116155"));
        assert_eq!(account.subdomain.as_deref(), Some("acme"));

        match classify(&fields) {
            WebhookEvent::StatusChanged(change) => {
                assert_eq!(change.lead_id, "9001");
                assert_eq!(change.new_status_id.as_deref(), Some("200"));
                assert_eq!(change.old_status_id.as_deref(), Some("100"));
                assert_eq!(change.new_pipeline_id.as_deref(), Some("10"));
                assert_eq!(change.old_pipeline_id.as_deref(), Some("10"));
            }
            other => panic!("expected status change, got {other:?}"),
        }
    }

    #[test]
    fn old_status_via_bracket_suffix() {
        let fields = form_fields(&[
            ("leads[status][0][id]", "9001"),
            ("leads[status][0][status_id]", "200"),
            ("leads[status][0][status_id][old]", "100"),
        ]);

        match classify(&fields) {
            WebhookEvent::StatusChanged(change) => {
                assert_eq!(change.new_status_id.as_deref(), Some("200"));
                assert_eq!(change.old_status_id.as_deref(), Some("100"));
            }
            other => panic!("expected status change, got {other:?}"),
        }
    }

    #[test]
    fn json_and_form_payloads_classify_identically() {
        let json_fields = flatten_json(&json!({
            "account": { "id": "34116155" },
            "leads": {
                "status": [
                    { "id": "9001", "status_id": "200", "old_status_id": "100" }
                ]
            }
        }));
        let form = form_fields(&[
            ("account[id]", "34116155"),
            ("leads[status][0][id]", "9001"),
            ("leads[status][0][status_id]", "200"),
            ("leads[status][0][old_status_id]", "100"),
        ]);

        assert_eq!(classify(&json_fields), classify(&form));
        assert_eq!(parse_account(&json_fields), parse_account(&form));
    }

    #[test]
    fn classifies_lead_and_contact_added() {
        let lead = form_fields(&[("leads[add][0][id]", "9001")]);
        assert_eq!(
            classify(&lead),
            WebhookEvent::LeadAdded {
                lead_id: "9001".to_string()
            }
        );

        let contact = form_fields(&[("contacts[add][0][id]", "77")]);
        assert_eq!(
            classify(&contact),
            WebhookEvent::ContactAdded {
                contact_id: "77".to_string()
            }
        );

        let nothing = form_fields(&[("unrelated", "x")]);
        assert_eq!(classify(&nothing), WebhookEvent::Unknown);
    }

    #[test]
    fn status_change_wins_over_add_keys() {
        let fields = form_fields(&[
            ("leads[status][0][id]", "9001"),
            ("leads[add][0][id]", "9002"),
        ]);

        assert!(matches!(classify(&fields), WebhookEvent::StatusChanged(_)));
    }
}
