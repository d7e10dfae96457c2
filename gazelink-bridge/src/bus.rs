//! Topic-based publish/subscribe transport

use crate::messages::BusMessage;
use gazelink_core::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Transport the bridge node publishes through
pub trait MessageBus: Send + Sync {
    /// Announce a topic with the given queue depth. A topic advertised more
    /// than once is shared: it keeps its first queue and stays up until
    /// every advertiser has withdrawn it.
    fn advertise(&self, topic: &str, depth: usize) -> Result<()>;

    /// Withdraw one advertisement of a topic. Returns whether the topic was
    /// advertised.
    fn unadvertise(&self, topic: &str) -> bool;

    /// Publish on an advertised topic, returning the number of subscribers
    /// that received the message.
    fn publish(&self, topic: &str, message: BusMessage) -> Result<usize>;
}

struct Topic {
    sender: broadcast::Sender<BusMessage>,
    advertisers: usize,
}

/// In-process bus backed by one broadcast channel per topic
#[derive(Default)]
pub struct BroadcastBus {
    topics: RwLock<HashMap<String, Topic>>,
}

impl BroadcastBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, topic: &str) -> Result<broadcast::Receiver<BusMessage>> {
        self.topics
            .read()
            .get(topic)
            .map(|entry| entry.sender.subscribe())
            .ok_or_else(|| Error::Bus(format!("topic '{}' is not advertised", topic)))
    }

    /// Advertised topics, sorted
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.topics.read().keys().cloned().collect();
        topics.sort();
        topics
    }

    pub fn is_advertised(&self, topic: &str) -> bool {
        self.topics.read().contains_key(topic)
    }
}

impl MessageBus for BroadcastBus {
    fn advertise(&self, topic: &str, depth: usize) -> Result<()> {
        if depth == 0 {
            return Err(Error::Bus(format!("topic '{}' needs a queue depth above zero", topic)));
        }

        let mut topics = self.topics.write();
        match topics.get_mut(topic) {
            Some(entry) => {
                entry.advertisers += 1;
                debug!("Topic {} now has {} advertisers", topic, entry.advertisers);
            }
            None => {
                let (sender, _) = broadcast::channel(depth);
                topics.insert(topic.to_string(), Topic { sender, advertisers: 1 });
                info!("Advertised topic {} (depth {})", topic, depth);
            }
        }
        Ok(())
    }

    fn unadvertise(&self, topic: &str) -> bool {
        let mut topics = self.topics.write();
        let remaining = match topics.get_mut(topic) {
            Some(entry) => {
                entry.advertisers -= 1;
                entry.advertisers
            }
            None => return false,
        };

        if remaining == 0 {
            topics.remove(topic);
            info!("Unadvertised topic {}", topic);
        }
        true
    }

    fn publish(&self, topic: &str, message: BusMessage) -> Result<usize> {
        let topics = self.topics.read();
        let entry = topics
            .get(topic)
            .ok_or_else(|| Error::Bus(format!("topic '{}' is not advertised", topic)))?;

        let type_name = message.type_name();
        match entry.sender.send(message) {
            Ok(receivers) => Ok(receivers),
            Err(_) => {
                debug!("No subscribers on {} for {}", topic, type_name);
                Ok(0)
            }
        }
    }
}
