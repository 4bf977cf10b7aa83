//! Wire types for the Kommo API v4.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Custom field codes that hold a contact's phone number.
pub const PHONE_FIELD_CODES: [&str; 4] = ["PHONE", "TELEFONE", "CELULAR", "MOBILE"];

/// Custom field names that hold the "lead situation" classifier.
pub const SITUATION_FIELD_NAMES: [&str; 4] = [
    "Situação do lead",
    "Situacao do lead",
    "Situação",
    "Situacao",
];

/// Response from the OAuth token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for API calls, a JWT.
    pub access_token: String,
    /// Token used for the next renewal.
    pub refresh_token: String,
    /// Token lifetime in seconds. The API occasionally omits it.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Account domain, when the API reports it.
    #[serde(default)]
    pub base_domain: Option<String>,
}

impl TokenResponse {
    /// Token lifetime in seconds, defaulting to 24 hours when omitted.
    pub fn expires_in_or_default(&self) -> i64 {
        self.expires_in.unwrap_or(86_400)
    }
}

/// A lead, as returned by lead fetch and search endpoints.
///
/// Only the fields the relay reads are modeled; everything else is
/// carried in `extra` so search results can be passed through whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    /// Lead ID.
    pub id: i64,

    /// Lead name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Current stage ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<i64>,

    /// Current pipeline ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<i64>,

    /// Custom field values; `null` in the API when the lead has none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_fields_values: Option<Vec<CustomFieldValue>>,

    /// Linked entities.
    #[serde(default, rename = "_embedded", skip_serializing_if = "Option::is_none")]
    pub embedded: Option<LeadEmbedded>,

    /// Fields we do not model, preserved for passthrough.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Lead {
    /// ID of the first linked contact, if any.
    pub fn first_contact_id(&self) -> Option<i64> {
        self.embedded
            .as_ref()?
            .contacts
            .first()
            .map(|contact| contact.id)
    }

    /// Value of the "lead situation" custom field, if present.
    pub fn situation(&self) -> Option<String> {
        first_field_value(self.custom_fields_values.as_deref()?, |field| {
            matches!(field.field_name.as_deref(), Some(name) if SITUATION_FIELD_NAMES.contains(&name))
        })
    }
}

/// Entities linked to a lead.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LeadEmbedded {
    /// Linked contacts.
    #[serde(default)]
    pub contacts: Vec<ContactRef>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Reference to a contact linked to a lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRef {
    /// Contact ID.
    pub id: i64,

    /// Whether this is the lead's main contact.
    #[serde(default)]
    pub is_main: bool,
}

/// A contact, as returned by the contact fetch endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Contact {
    /// Contact ID.
    pub id: i64,

    /// Contact name.
    #[serde(default)]
    pub name: Option<String>,

    /// Custom field values.
    #[serde(default)]
    pub custom_fields_values: Option<Vec<CustomFieldValue>>,
}

impl Contact {
    /// First phone number found in the contact's custom fields.
    pub fn phone(&self) -> Option<String> {
        first_field_value(self.custom_fields_values.as_deref()?, |field| {
            matches!(field.field_code.as_deref(), Some(code) if PHONE_FIELD_CODES.contains(&code))
        })
    }
}

/// A custom field with its values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomFieldValue {
    /// Field ID.
    #[serde(default)]
    pub field_id: Option<i64>,

    /// Field display name.
    #[serde(default)]
    pub field_name: Option<String>,

    /// Stable field code (e.g., "PHONE").
    #[serde(default)]
    pub field_code: Option<String>,

    /// Values; most fields carry exactly one.
    #[serde(default)]
    pub values: Vec<FieldValue>,
}

/// A single custom field value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldValue {
    /// The raw value; strings for text fields, numbers for numeric ones.
    #[serde(default)]
    pub value: serde_json::Value,
}

impl FieldValue {
    /// The value as text. Numbers are stringified.
    pub fn as_text(&self) -> Option<String> {
        match &self.value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn first_field_value(
    fields: &[CustomFieldValue],
    matches: impl Fn(&CustomFieldValue) -> bool,
) -> Option<String> {
    fields
        .iter()
        .find(|field| matches(field))
        .and_then(|field| field.values.first())
        .and_then(FieldValue::as_text)
}

/// Search/list response for leads.
#[derive(Debug, Clone, Deserialize)]
pub struct LeadsResponse {
    #[serde(default, rename = "_embedded")]
    pub embedded: Option<LeadsEmbedded>,
}

impl LeadsResponse {
    /// The leads, or an empty list when the envelope is missing.
    pub fn into_leads(self) -> Vec<Lead> {
        self.embedded.map(|e| e.leads).unwrap_or_default()
    }
}

/// Embedded list of leads.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LeadsEmbedded {
    #[serde(default)]
    pub leads: Vec<Lead>,
}

/// Outcome of a phone search across query permutations.
#[derive(Debug, Clone)]
pub struct LeadSearch {
    /// Leads from the first permutation that produced a hit.
    pub leads: Vec<Lead>,
    /// The permutation that matched, when one did.
    pub matched_query: Option<String>,
    /// Every permutation tried, in order.
    pub queries: Vec<String>,
}

/// Pipelines list response.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelinesResponse {
    #[serde(default, rename = "_embedded")]
    pub embedded: Option<PipelinesEmbedded>,
}

/// Embedded list of pipelines.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PipelinesEmbedded {
    #[serde(default)]
    pub pipelines: Vec<Pipeline>,
}

/// A pipeline with its stages.
#[derive(Debug, Clone, Deserialize)]
pub struct Pipeline {
    /// Pipeline ID.
    pub id: i64,

    /// Pipeline name.
    #[serde(default)]
    pub name: String,

    /// Embedded stages.
    #[serde(default, rename = "_embedded")]
    pub embedded: Option<PipelineStatuses>,
}

/// Embedded list of pipeline stages.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PipelineStatuses {
    #[serde(default)]
    pub statuses: Vec<PipelineStatus>,
}

/// A pipeline stage.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineStatus {
    /// Stage ID.
    pub id: i64,

    /// Stage name.
    #[serde(default)]
    pub name: String,

    /// Stage color.
    #[serde(default)]
    pub color: Option<String>,
}

/// Pipeline and stage names keyed by their **string** ids.
///
/// Webhooks deliver ids as strings, so lookups go through strings even
/// though the API reports them as numbers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PipelineMap(pub HashMap<String, PipelineEntry>);

/// One pipeline in a [`PipelineMap`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineEntry {
    /// Pipeline name.
    pub name: String,
    /// Stage names and colors keyed by stage ID.
    pub stages: HashMap<String, StageEntry>,
}

/// One stage in a [`PipelineMap`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StageEntry {
    /// Stage name.
    pub name: String,
    /// Stage color.
    pub color: Option<String>,
}

impl PipelineMap {
    /// Name of a pipeline, or a `Pipeline {id}` placeholder.
    pub fn pipeline_name(&self, pipeline_id: &str) -> String {
        self.0
            .get(pipeline_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("Pipeline {pipeline_id}"))
    }

    /// Name of a stage within a pipeline, or a `Status {id}` placeholder.
    pub fn status_name(&self, pipeline_id: &str, status_id: &str) -> String {
        self.0
            .get(pipeline_id)
            .and_then(|p| p.stages.get(status_id))
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("Status {status_id}"))
    }
}

impl From<PipelinesResponse> for PipelineMap {
    fn from(response: PipelinesResponse) -> Self {
        let mut map = HashMap::new();
        let pipelines = response.embedded.map(|e| e.pipelines).unwrap_or_default();

        for pipeline in pipelines {
            let stages = pipeline
                .embedded
                .map(|e| e.statuses)
                .unwrap_or_default()
                .into_iter()
                .map(|status| {
                    (
                        status.id.to_string(),
                        StageEntry {
                            name: status.name,
                            color: status.color,
                        },
                    )
                })
                .collect();

            map.insert(
                pipeline.id.to_string(),
                PipelineEntry {
                    name: pipeline.name,
                    stages,
                },
            );
        }

        PipelineMap(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lead_passthrough_preserves_unmodeled_fields() {
        let lead: Lead = serde_json::from_value(json!({
            "id": 9001,
            "name": "Maria",
            "price": 1500,
            "status_id": 200,
            "pipeline_id": 10,
            "_embedded": { "contacts": [{ "id": 77, "is_main": true }] }
        }))
        .unwrap();

        assert_eq!(lead.first_contact_id(), Some(77));

        let echoed = serde_json::to_value(&lead).unwrap();
        assert_eq!(echoed["price"], 1500);
        assert_eq!(echoed["id"], 9001);
    }

    #[test]
    fn contact_phone_matches_known_field_codes() {
        let contact: Contact = serde_json::from_value(json!({
            "id": 77,
            "name": "Maria",
            "custom_fields_values": [
                { "field_id": 1, "field_code": "EMAIL", "values": [{ "value": "m@example.com" }] },
                { "field_id": 2, "field_code": "TELEFONE", "values": [{ "value": "+55 11 99999-8888" }] }
            ]
        }))
        .unwrap();

        assert_eq!(contact.phone().as_deref(), Some("+55 11 99999-8888"));
    }

    #[test]
    fn contact_without_phone_field_yields_none() {
        let contact: Contact = serde_json::from_value(json!({
            "id": 77,
            "custom_fields_values": null
        }))
        .unwrap();

        assert_eq!(contact.phone(), None);
    }

    #[test]
    fn lead_situation_matches_accented_and_plain_names() {
        let lead: Lead = serde_json::from_value(json!({
            "id": 9001,
            "custom_fields_values": [
                { "field_id": 3, "field_name": "Situação do lead", "values": [{ "value": "Quente" }] }
            ]
        }))
        .unwrap();

        assert_eq!(lead.situation().as_deref(), Some("Quente"));
    }

    #[test]
    fn pipeline_map_uses_string_keys_and_placeholders() {
        let response: PipelinesResponse = serde_json::from_value(json!({
            "_embedded": {
                "pipelines": [{
                    "id": 3104455,
                    "name": "Vendas",
                    "_embedded": {
                        "statuses": [
                            { "id": 100, "name": "Novo", "color": "#fffeb2" },
                            { "id": 200, "name": "Em atendimento" }
                        ]
                    }
                }]
            }
        }))
        .unwrap();

        let map = PipelineMap::from(response);
        assert_eq!(map.pipeline_name("3104455"), "Vendas");
        assert_eq!(map.status_name("3104455", "200"), "Em atendimento");
        assert_eq!(map.pipeline_name("999"), "Pipeline 999");
        assert_eq!(map.status_name("3104455", "999"), "Status 999");
        assert_eq!(map.status_name("999", "100"), "Status 100");
    }
}
