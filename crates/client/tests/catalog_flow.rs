//! Loading the daemon's saved networks into caller-visible records.

use std::sync::Arc;
use std::time::Duration;

use supplicant::fake::{FakeSupplicantBuilder, FakeSupplicantController};
use supplicant::protocol::{
    EXTRAS_KEY_CONFIG_KEY, IpAssignment, NetworkConfigRecord, ProxySettings, StatusCode, param,
};
use supplicant::StaIfaceClient;

async fn ready_client() -> (Arc<StaIfaceClient>, FakeSupplicantController) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let (registry, daemon) = FakeSupplicantBuilder::new().build();
    let client = Arc::new(StaIfaceClient::new(registry));
    tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.run().await }
    });
    client.initialize().await.unwrap();
    daemon.announce_service();
    for _ in 0..200 {
        if client.is_initialization_complete().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(client.is_initialization_complete().await);
    daemon.take_calls();
    (client, daemon)
}

fn record(network_id: i32, ssid: &str) -> NetworkConfigRecord {
    NetworkConfigRecord::new(network_id, ssid, "WPA_PSK")
}

#[tokio::test]
async fn load_networks_returns_every_distinct_entry() {
    let (client, daemon) = ready_client().await;
    let mut cafe = record(1, "Cafe");
    cafe.extras.insert("creatorUid".to_string(), "1000".to_string());
    daemon.seed_network(&cafe);
    let lab_id = daemon.seed_network(&record(2, "Lab"));

    let (records, extras_by_id) = client.load_networks().await.unwrap();

    assert_eq!(records.len(), 2);
    let loaded = &records[&cafe.config_key()];
    assert_eq!(loaded.ssid, "Cafe");
    assert_eq!(loaded.security, "WPA_PSK");
    assert_eq!(loaded.network_id, -1);
    assert_eq!(loaded.ip_assignment, IpAssignment::Dhcp);
    assert_eq!(loaded.proxy_settings, ProxySettings::None);
    assert_eq!(loaded.extras.get("creatorUid"), Some(&"1000".to_string()));
    assert_eq!(
        loaded.extras.get(EXTRAS_KEY_CONFIG_KEY),
        Some(&cafe.config_key())
    );
    assert_eq!(
        extras_by_id[&lab_id].get(EXTRAS_KEY_CONFIG_KEY),
        Some(&record(2, "Lab").config_key())
    );
}

#[tokio::test]
async fn duplicate_config_keys_collapse_and_evict_the_stale_entry() {
    let (client, daemon) = ready_client().await;
    let stale_id = daemon.seed_network(&record(1, "Cafe"));
    let winner_id = daemon.seed_network(&record(1, "Cafe"));
    let other_id = daemon.seed_network(&record(2, "Lab"));
    daemon.take_calls();

    let (records, extras_by_id) = client.load_networks().await.unwrap();

    assert_eq!(records.len(), 2);
    assert!(records.contains_key(&record(1, "Cafe").config_key()));
    assert!(!extras_by_id.contains_key(&stale_id));
    assert!(extras_by_id.contains_key(&winner_id));
    assert!(extras_by_id.contains_key(&other_id));

    let removes: Vec<String> = daemon
        .take_calls()
        .into_iter()
        .filter(|c| c.starts_with("removeNetwork"))
        .collect();
    assert_eq!(removes, vec![format!("removeNetwork({stale_id})")]);
    assert_eq!(daemon.network_ids(), vec![winner_id, other_id]);
}

#[tokio::test]
async fn rejected_stale_eviction_is_tolerated() {
    let (client, daemon) = ready_client().await;
    daemon.seed_network(&record(1, "Cafe"));
    daemon.seed_network(&record(1, "Cafe"));

    daemon.reject_next("removeNetwork", StatusCode::FailureNetworkUnknown);
    let (records, _) = client.load_networks().await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn load_failure_returns_no_partial_catalog() {
    let (client, daemon) = ready_client().await;
    daemon.seed_network(&record(1, "Cafe"));
    daemon.seed_network(&record(2, "Lab"));

    daemon.reject_next("getParameter", StatusCode::FailureUnknown);
    assert!(client.load_networks().await.is_err());
    assert!(client.is_initialization_complete().await);
}

#[tokio::test]
async fn load_fault_tears_down_the_session() {
    let (client, daemon) = ready_client().await;
    daemon.seed_network(&record(1, "Cafe"));

    daemon.fault_next("getMetadata");
    let err = client.load_networks().await.unwrap_err();

    assert!(err.involves_transport_fault());
    assert!(!client.is_initialization_complete().await);
}

#[tokio::test]
async fn entries_without_metadata_fall_back_to_a_derived_key() {
    let (client, daemon) = ready_client().await;
    let mut bare = record(1, "Cafe");
    bare.fields.insert(param::PSK.to_string(), "hunter22".to_string());
    let id = daemon.seed_network(&bare);
    daemon.clear_network_metadata(id);

    let (records, extras_by_id) = client.load_networks().await.unwrap();

    let loaded = &records[&bare.config_key()];
    assert_eq!(
        loaded.fields.get(param::PSK),
        Some(&"hunter22".to_string())
    );
    assert!(extras_by_id[&id].is_empty());
}

#[tokio::test]
async fn remove_all_networks_empties_the_daemon() {
    let (client, daemon) = ready_client().await;
    daemon.seed_network(&record(1, "Cafe"));
    daemon.seed_network(&record(2, "Lab"));
    daemon.take_calls();

    client.remove_all_networks().await.unwrap();

    assert!(daemon.network_ids().is_empty());
    assert_eq!(
        daemon.take_calls(),
        vec!["listNetworks", "removeNetwork(0)", "removeNetwork(1)"]
    );
}
