//! Inbound message processing pipeline.
//!
//! One Evolution event flows extract, enrich, forward, persist, then
//! CRM attribution. The provider already got its ack by the time these
//! stages run their course, so every failure past extraction logs and
//! lets the remaining stages carry on with what they have.

use database::{NewLeadTrackingEvent, NewMessage};
use evolution::{extract_message, ExtractedMessage, WebhookEvent};
use graph_ads::AdDetails;
use kommo::PipelineMap;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::clock;
use crate::state::AppState;
use crate::tokens::TokenError;

/// Process one Evolution webhook event end to end.
pub async fn process_event(state: &AppState, event: &WebhookEvent) {
    let extracted = extract_message(event);

    if !extracted.is_ad_lead() {
        debug!(
            "Ignoring {:?} event from {}: not an inbound ad lead",
            event.event, extracted.phone
        );
        return;
    }

    info!(
        "Ad lead message from {} (source {})",
        extracted.phone,
        extracted.source_id.as_deref().unwrap_or("-")
    );

    let ad = enrich(state, &extracted).await;
    let date_time = extracted
        .date_time
        .as_deref()
        .map(|raw| clock::normalize_provider_timestamp(raw, state.tz_offset_hours));

    let mut record = NewMessage {
        phone: extracted.phone.clone(),
        name: extracted.name.clone(),
        device: extracted.device.clone(),
        message: extracted.text.clone(),
        source_id: extracted.source_id.clone(),
        title: extracted.title.clone(),
        url: extracted.url.clone(),
        forwarded: false,
        date_time,
        ad_name: ad.ad_name,
        adset_name: ad.adset_name,
        adset_id: ad.adset_id,
        campaign_name: ad.campaign_name,
        campaign_id: ad.campaign_id,
    };

    if let Some(forwarder) = &state.forwarder {
        record.forwarded = forwarder.forward(&forward_payload(&record)).await;
    }

    let message_id = match database::message::insert_message(state.db.pool(), &record).await {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to store message from {}: {}", record.phone, e);
            return;
        }
    };

    track_lead(state, message_id, &extracted).await;
}

/// Ad attribution details, when enrichment is configured and the Graph
/// API call succeeds. Anything else degrades to empty enrichment.
async fn enrich(state: &AppState, extracted: &ExtractedMessage) -> AdDetails {
    let (Some(ads), Some(source_id)) = (&state.ads, extracted.source_id.as_deref()) else {
        return AdDetails::default();
    };

    match ads.ad_details(source_id).await {
        Ok(details) => details,
        Err(e) => {
            warn!("Ad lookup for {} failed: {}", source_id, e);
            AdDetails::default()
        }
    }
}

/// Wire payload for Make: the record exactly as it will be stored.
fn forward_payload(record: &NewMessage) -> serde_json::Value {
    json!({
        "phone": record.phone,
        "name": record.name,
        "device": record.device,
        "message": record.message,
        "source_id": record.source_id,
        "title": record.title,
        "url": record.url,
        "date_time": record.date_time,
        "ad_name": record.ad_name,
        "adset_name": record.adset_name,
        "adset_id": record.adset_id,
        "campaign_name": record.campaign_name,
        "campaign_id": record.campaign_id,
    })
}

/// Attribute the message to a CRM lead and record a tracking event.
///
/// Needs a connected account and an existing lead for the phone; when
/// either is missing the message stays stored without attribution.
async fn track_lead(state: &AppState, message_id: i64, extracted: &ExtractedMessage) {
    let token = match state.tokens.first_active_token().await {
        Ok(token) => token,
        Err(TokenError::NoAccount) => {
            debug!("No Kommo account connected, skipping lead attribution");
            return;
        }
        Err(e) => {
            warn!("No usable Kommo token for lead attribution: {}", e);
            return;
        }
    };

    let search = match state
        .kommo
        .search_lead_by_phone(&token.domain, &token.access_token, &extracted.phone)
        .await
    {
        Ok(search) => search,
        Err(e) => {
            warn!("Lead search for {} failed: {}", extracted.phone, e);
            return;
        }
    };

    let Some(lead) = search.leads.first() else {
        info!("No CRM lead yet for {}", extracted.phone);
        return;
    };

    let pipelines = match state
        .kommo
        .get_pipelines(&token.domain, &token.access_token)
        .await
    {
        Ok(map) => map,
        Err(e) => {
            warn!("Pipeline fetch failed, using placeholder names: {}", e);
            PipelineMap::default()
        }
    };

    let pipeline_id = lead.pipeline_id.map(|id| id.to_string());
    let status_id = lead.status_id.map(|id| id.to_string());

    let event = NewLeadTrackingEvent {
        message_id: Some(message_id),
        lead_id: lead.id.to_string(),
        phone: Some(extracted.phone.clone()),
        event_type: "message_received".to_string(),
        source_id: extracted.source_id.clone(),
        current_pipeline_name: pipeline_id.as_deref().map(|id| pipelines.pipeline_name(id)),
        current_status_name: status_id
            .as_deref()
            .map(|id| pipelines.status_name(pipeline_id.as_deref().unwrap_or(""), id)),
        current_pipeline_id: pipeline_id,
        current_status_id: status_id,
        lead_situation: lead.situation(),
        event_time: clock::local_event_time(state.tz_offset_hours),
        ..Default::default()
    };

    match database::lead_tracking::insert_event(state.db.pool(), &event).await {
        Ok(_) => info!("Recorded message_received for lead {}", lead.id),
        Err(e) => error!("Failed to store tracking event for lead {}: {}", lead.id, e),
    }
}
