//! MQTT ingress standing in for RMR.
//!
//! Every publish on `{topic_prefix}/{message_type}` becomes one
//! [`RmrMessage`] whose payload is the raw publish body. Each message is
//! consumed on its own task.

use crate::config::MqttConf;
use crate::rmr::RmrMessage;
use crate::xapp::{TrafficSteeringXApp, XAPP_NAME};
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Message type carried by `topic`, if it sits directly under `prefix`.
fn message_type_from_topic(prefix: &str, topic: &str) -> Option<u32> {
    topic.strip_prefix(prefix)?.strip_prefix('/')?.parse().ok()
}

pub fn spawn_rmr_bridge(
    xapp: Arc<TrafficSteeringXApp>,
    conf: MqttConf,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    task::spawn(async move {
        let health = xapp.health().clone();
        health.mark_bridge_connecting();

        let mut opts = MqttOptions::new(&conf.client_id, &conf.host, conf.port);
        opts.set_keep_alive(Duration::from_secs(15));
        let (client, mut eventloop) = AsyncClient::new(opts, 10);
        let filter = format!("{}/+", conf.topic_prefix);
        info!(host = %conf.host, port = conf.port, filter = %filter, "starting RMR bridge");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    if let Err(e) = client.try_disconnect() {
                        debug!(error = ?e, "disconnect request not queued");
                    }
                    break;
                }
                event = eventloop.poll() => {
                    match event {
                        Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                            // clean session: subscribe again after every (re)connect
                            if let Err(e) = client.try_subscribe(filter.as_str(), QoS::AtLeastOnce) {
                                error!(error = ?e, "subscribe failed");
                            }
                            health.mark_bridge_connected();
                        }
                        Ok(Event::Incoming(Incoming::Publish(p))) => {
                            let Some(message_type) = message_type_from_topic(&conf.topic_prefix, &p.topic) else {
                                warn!(topic = %p.topic, "ignoring publish on unexpected topic");
                                continue;
                            };
                            let msg = RmrMessage::new(message_type, p.payload.to_vec(), p.topic.clone(), XAPP_NAME);
                            let xapp = xapp.clone();
                            let cancel = shutdown.child_token();
                            task::spawn(async move {
                                // failures are logged and counted by consume()
                                let _ = xapp.consume(&msg, &cancel).await;
                            });
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!(error = ?e, "MQTT connection error");
                            health.increment_reconnects();
                            tokio::select! {
                                _ = shutdown.cancelled() => break,
                                _ = tokio::time::sleep(Duration::from_secs(2)) => {}
                            }
                        }
                    }
                }
            }
        }

        health.mark_bridge_stopped();
        info!("RMR bridge stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::XAppConfig;
    use crate::health::HealthTracker;

    #[test]
    fn test_message_type_from_topic() {
        assert_eq!(message_type_from_topic("ric/rmr", "ric/rmr/12010"), Some(12010));
        assert_eq!(message_type_from_topic("ric/rmr", "ric/rmr/20010"), Some(20010));
        assert_eq!(message_type_from_topic("ric/rmr", "ric/rmr/abc"), None);
        assert_eq!(message_type_from_topic("ric/rmr", "ric/rmrx/12010"), None);
        assert_eq!(message_type_from_topic("ric/rmr", "other/12010"), None);
        assert_eq!(message_type_from_topic("ric/rmr", "ric/rmr/12010/extra"), None);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_reconnect_wait() {
        let xapp = Arc::new(TrafficSteeringXApp::new(&XAppConfig::default(), HealthTracker::new()));
        let conf = MqttConf {
            host: "127.0.0.1".into(),
            port: 1,
            topic_prefix: "ric/rmr".into(),
            client_id: "bridge-test".into(),
        };
        let shutdown = CancellationToken::new();
        let handle = spawn_rmr_bridge(xapp.clone(), conf, shutdown.clone());

        // nothing listens on port 1, so the bridge lands in its reconnect wait
        tokio::time::timeout(Duration::from_secs(5), async {
            while xapp.health().snapshot().bridge_reconnects == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        shutdown.cancel();
        tokio::time::timeout(Duration::from_millis(500), handle).await.unwrap().unwrap();
        assert_eq!(xapp.health().snapshot().bridge_status, "stopped");
    }
}
