use crate::app::event::LiveEvent;
use anyhow::{Context, Result};
use patternscan::PatternRecord;
use serde::{Deserialize, Serialize};

/// JSON frames pushed by the scan service, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveFrame {
    PatternDetected {
        pattern: PatternRecord,
    },
    PriceUpdate {
        symbol: String,
        price: f64,
        change_percent: f64,
    },
    Heartbeat,
    #[serde(other)]
    Unknown,
}

impl LiveFrame {
    pub fn into_event(self) -> Option<LiveEvent> {
        match self {
            LiveFrame::PatternDetected { pattern } => Some(LiveEvent::PatternDetected(pattern)),
            LiveFrame::PriceUpdate {
                symbol,
                price,
                change_percent,
            } => Some(LiveEvent::PriceUpdate {
                symbol,
                price,
                change_percent,
            }),
            LiveFrame::Heartbeat | LiveFrame::Unknown => None,
        }
    }
}

/// Decodes one text frame. Heartbeats and unknown types give `Ok(None)`.
pub fn parse_frame(txt: &str) -> Result<Option<LiveEvent>> {
    let frame: LiveFrame = serde_json::from_str(txt).context("invalid live frame")?;
    Ok(frame.into_event())
}
