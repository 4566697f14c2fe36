//! JSON wire format for a complete network dataset.
//!
//! Field names are camelCase. A copy of the reference dataset is compiled
//! into the crate and available through [`Dataset::bundled`].

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::loops::FeedbackLoop;
use crate::model::{Edge, Module, Node};
use crate::treatment::Treatment;

pub const CURRENT_VERSION: &str = "1.0";

const BUNDLED_JSON: &str = include_str!("../data/network.json");

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default = "current_version")]
    pub version: String,
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub feedback_loops: Vec<FeedbackLoop>,
    #[serde(default)]
    pub treatments: Vec<Treatment>,
}

fn current_version() -> String {
    CURRENT_VERSION.to_string()
}

impl Dataset {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The reference dataset shipped with the crate.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_JSON)
    }
}
