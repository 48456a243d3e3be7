use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Emergency contacts the server attached to a reply, label -> value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrisisSignal {
    contacts: BTreeMap<String, String>,
}

impl CrisisSignal {
    pub fn new(contacts: BTreeMap<String, String>) -> Self {
        Self { contacts }
    }

    /// Signal carried by a reply, present only when the crisis flag is set
    /// and emergency info accompanies it. Non-string values are rendered as JSON.
    pub fn from_reply(
        crisis_detected: bool,
        emergency_info: Option<&BTreeMap<String, serde_json::Value>>,
    ) -> Option<Self> {
        if !crisis_detected {
            return None;
        }
        let Some(info) = emergency_info else {
            warn!("Crisis flagged without emergency info");
            return None;
        };

        let contacts = info
            .iter()
            .map(|(label, value)| {
                let value = match value {
                    serde_json::Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                (label.clone(), value)
            })
            .collect();

        Some(Self { contacts })
    }

    pub fn contacts(&self) -> &BTreeMap<String, String> {
        &self.contacts
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.contacts.get(label).map(String::as_str)
    }
}

/// At most one active signal; replaced by newer ones, cleared on dismissal
/// or when the next message is sent.
#[derive(Debug, Clone, Default)]
pub struct CrisisAlert {
    active: Option<CrisisSignal>,
}

impl CrisisAlert {
    pub fn raise(&mut self, signal: CrisisSignal) {
        warn!("Crisis signal raised ({} contacts)", signal.contacts.len());
        self.active = Some(signal);
    }

    pub fn dismiss(&mut self) -> Option<CrisisSignal> {
        self.active.take()
    }

    pub fn active(&self) -> Option<&CrisisSignal> {
        self.active.as_ref()
    }
}
