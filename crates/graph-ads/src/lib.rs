//! Facebook Graph API client for ad attribution.
//!
//! Given the `sourceId` of a click-to-WhatsApp ad, this crate looks up
//! the ad's name plus its adset and campaign so stored messages can be
//! attributed to the campaign that produced them.
//!
//! # Example
//!
//! ```no_run
//! use graph_ads::AdsClient;
//!
//! # async fn example() -> graph_ads::Result<()> {
//! let client = AdsClient::new("EAAG...")?;
//! let details = client.ad_details("120210000000000001").await?;
//! println!("campaign: {:?}", details.campaign_name);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;

pub use client::{AdDetails, AdsClient};
pub use error::{AdsError, Result};
