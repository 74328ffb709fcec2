//! Two simulated devices battle through an in-process relay.
//!
//! ```text
//! cargo run -p loopback -- digimon-penx-battle 10
//! RUST_LOG=debug cargo run -p loopback -- legendz 60
//! ```

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use rand::Rng;
use rtb::prelude::*;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Simulated toy
// ---------------------------------------------------------------------------

/// Answers digiroms the way a real toy would, shape-wise, with random
/// data. Misses a fraction of interactions like a badly placed toy.
struct FakeToy {
    name: &'static str,
    miss_rate: f64,
}

impl FakeToy {
    fn respond(&self, digirom: &Digirom) -> Vec<ResultSegment> {
        let mut rng = rand::rng();
        if rng.random_bool(self.miss_rate) {
            return Vec::new();
        }
        let word = |rng: &mut rand::rngs::ThreadRng| rng.random::<u16>().to_be_bytes().to_vec();

        match (digirom.signal_type(), digirom.turn()) {
            // Legendz scan: one creature payload.
            ("LT", 2) => {
                let payload: Vec<u8> = (0..20).map(|_| rng.random()).collect();
                vec![ResultSegment::received(payload)]
            }
            // Legendz replay: our payload goes out, the toy acks each packet after.
            ("LT", _) => digirom
                .packets()
                .iter()
                .enumerate()
                .map(|(i, p)| match (i, p.data()) {
                    (0, Some(data)) => ResultSegment::sent(data.to_vec()),
                    _ => ResultSegment::received(word(&mut rng)),
                })
                .collect(),
            // PenX: the toy speaks first and every packet gets an answer.
            ("X", _) => {
                let segments = match (digirom.turn(), digirom.packets().last()) {
                    (2, Some(p)) if p.data().is_none() => 9,
                    (2, _) => 7,
                    _ => 8,
                };
                (0..segments)
                    .map(|i| {
                        if i % 2 == 0 {
                            ResultSegment::received(word(&mut rng))
                        } else {
                            ResultSegment::sent(word(&mut rng))
                        }
                    })
                    .collect()
            }
            _ => Vec::new(),
        }
    }
}

impl Controller for FakeToy {
    fn execute(&mut self, digirom: &mut Digirom, show_feedback: bool) {
        digirom.result = self.respond(digirom);
        tracing::debug!(
            toy = self.name,
            %digirom,
            segments = digirom.result.len(),
            show_feedback,
            "toy executed"
        );
    }
}

// ---------------------------------------------------------------------------
// In-process relay
// ---------------------------------------------------------------------------

/// Routes battle envelopes to every device subscribed to the topic,
/// sender included, like the real broker does.
struct Broker {
    devices: Vec<mpsc::Sender<Inbound>>,
    topics: HashMap<String, HashSet<usize>>,
    codec: JsonCodec,
}

impl Broker {
    async fn run(mut self, mut outbound: mpsc::UnboundedReceiver<(usize, Outbound)>) {
        while let Some((from, item)) = outbound.recv().await {
            match item {
                Outbound::Subscribe(topic) => {
                    self.topics.entry(topic).or_default().insert(from);
                }
                Outbound::Unsubscribe(topic) => {
                    if let Some(devices) = self.topics.get_mut(&topic) {
                        devices.remove(&from);
                    }
                }
                Outbound::Battle { topic, message } => {
                    let payload = match self.codec.encode(&message) {
                        Ok(payload) => payload,
                        Err(err) => {
                            tracing::warn!(error = %err, "cannot encode battle message");
                            continue;
                        }
                    };
                    let targets = self.topics.get(&topic).cloned().unwrap_or_default();
                    for device in targets {
                        let _ = self.devices[device]
                            .send(Inbound::BattleFeed(payload.clone()))
                            .await;
                    }
                }
                Outbound::Output(output) => {
                    tracing::info!(device = from, output = %output.output, "device output");
                }
                Outbound::Ack(ack) => {
                    tracing::info!(device = from, ack_id = ack.ack_id, "ack");
                }
            }
        }
    }
}

/// Tags one device's outbound traffic with its index.
struct Tagged {
    device: usize,
    tx: mpsc::UnboundedSender<(usize, Outbound)>,
}

impl Publisher for Tagged {
    fn publish(&self, outbound: Outbound) {
        let _ = self.tx.send((self.device, outbound));
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn status_logger(name: &'static str) -> impl FnMut(Status, bool) + Send + 'static {
    move |status, changed| {
        if changed {
            tracing::info!(device = name, %status, "status");
        }
    }
}

fn subscribe(battle_type: &str, role: Role) -> AppFeedMessage {
    AppFeedMessage {
        topic_action: Some(TopicAction::Subscribe),
        topic: Some("loopback".into()),
        host: Some("demo".into()),
        user_type: Some(role.as_str().into()),
        battle_type: Some(battle_type.into()),
        ack_id: Some(1),
        ..AppFeedMessage::default()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let battle_type = args.next().unwrap_or_else(|| "digimon-penx-battle".into());
    let seconds: u64 = match args.next() {
        Some(s) => s.parse()?,
        None => 10,
    };
    tracing::info!(%battle_type, seconds, "starting loopback battle");

    let (relay_tx, relay_rx) = mpsc::unbounded_channel();
    let mut inboxes = Vec::new();
    let mut tasks = Vec::new();

    for (device, (name, role)) in [("host-device", Role::Host), ("guest-device", Role::Guest)]
        .into_iter()
        .enumerate()
    {
        let driver = Driver::new(
            DriverConfig::for_device(name),
            FakeToy {
                name,
                miss_rate: 0.2,
            },
            status_logger(name),
            Tagged {
                device,
                tx: relay_tx.clone(),
            },
        );
        let (tx, rx) = mpsc::channel(32);
        tx.send(Inbound::AppFeed(JsonCodec.encode(&subscribe(&battle_type, role))?))
            .await?;
        inboxes.push(tx);
        tasks.push(tokio::spawn(Runner::new(driver).run(rx)));
    }
    drop(relay_tx);

    let broker = Broker {
        devices: inboxes.clone(),
        topics: HashMap::new(),
        codec: JsonCodec,
    };
    let broker_task = tokio::spawn(broker.run(relay_rx));

    tokio::time::sleep(Duration::from_secs(seconds)).await;
    for inbox in &inboxes {
        inbox.send(Inbound::Exit).await?;
    }
    drop(inboxes);
    // The broker holds the last inbox senders; runners stop once it is gone.
    broker_task.abort();

    for task in tasks {
        let driver = task.await?;
        tracing::info!(active = driver.is_battle_active(), "device stopped");
    }
    Ok(())
}
