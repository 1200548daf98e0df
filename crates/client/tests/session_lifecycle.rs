//! Registry watching, session setup/teardown, and the pass-through
//! operation surface.

use std::sync::Arc;
use std::time::Duration;

use supplicant::fake::{FakeSupplicantBuilder, FakeSupplicantController};
use supplicant::protocol::{BtCoexMode, InterfaceInfo, InterfaceType, RxFilterType, StatusCode};
use supplicant::{Error, StaIfaceClient};

async fn wait_ready(client: &StaIfaceClient) {
    for _ in 0..200 {
        if client.is_initialization_complete().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("client did not become ready");
}

async fn wait_not_ready(client: &StaIfaceClient) {
    for _ in 0..200 {
        if !client.is_initialization_complete().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("client session was never torn down");
}

fn spawn_client(registry: Arc<supplicant::fake::FakeSupplicant>) -> Arc<StaIfaceClient> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let client = Arc::new(StaIfaceClient::new(registry));
    tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.run().await }
    });
    client
}

async fn ready_client() -> (Arc<StaIfaceClient>, FakeSupplicantController) {
    let (registry, daemon) = FakeSupplicantBuilder::new().build();
    let client = spawn_client(registry);
    client.initialize().await.unwrap();
    daemon.announce_service();
    wait_ready(&client).await;
    daemon.take_calls();
    (client, daemon)
}

#[tokio::test]
async fn initialize_registers_notifications_once() {
    let (registry, daemon) = FakeSupplicantBuilder::new().build();
    let client = spawn_client(registry);

    client.initialize().await.unwrap();
    client.initialize().await.unwrap();

    let registrations: Vec<String> = daemon
        .take_calls()
        .into_iter()
        .filter(|c| c.starts_with("register"))
        .collect();
    assert_eq!(
        registrations,
        vec![
            "registerDeathNotification",
            "registerAvailabilityNotification(supplicant)",
        ]
    );
}

#[tokio::test]
async fn unreachable_registry_fails_initialize() {
    let (registry, _daemon) = FakeSupplicantBuilder::new().unreachable_registry().build();
    let client = spawn_client(registry);

    let err = client.initialize().await.unwrap_err();
    assert!(matches!(err, Error::RegistryUnavailable));
    assert!(!client.is_initialization_complete().await);
}

#[tokio::test]
async fn daemon_without_station_interface_never_becomes_ready() {
    let (registry, daemon) = FakeSupplicantBuilder::new()
        .without_interfaces()
        .with_interface(InterfaceInfo {
            iface_type: InterfaceType::P2p,
            name: "p2p0".to_string(),
        })
        .build();
    let client = spawn_client(registry);
    client.initialize().await.unwrap();

    daemon.announce_service();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!client.is_initialization_complete().await);
    let calls = daemon.take_calls();
    assert!(calls.iter().any(|c| c == "listInterfaces"), "calls: {calls:?}");
    assert!(
        !calls.iter().any(|c| c.starts_with("getInterface")),
        "calls: {calls:?}"
    );
}

#[tokio::test]
async fn first_station_interface_wins() {
    let (registry, daemon) = FakeSupplicantBuilder::new()
        .with_interface(InterfaceInfo {
            iface_type: InterfaceType::Station,
            name: "wlan1".to_string(),
        })
        .build();
    let client = spawn_client(registry);
    client.initialize().await.unwrap();

    daemon.announce_service();
    wait_ready(&client).await;

    let calls = daemon.take_calls();
    assert!(calls.iter().any(|c| c == "getInterface(wlan0)"), "calls: {calls:?}");
    assert!(!calls.iter().any(|c| c == "getInterface(wlan1)"), "calls: {calls:?}");
}

#[tokio::test]
async fn registry_death_disarms_and_initialize_rearms() {
    let (registry, daemon) = FakeSupplicantBuilder::new().build();
    let client = spawn_client(registry);
    client.initialize().await.unwrap();
    daemon.announce_service();
    wait_ready(&client).await;

    daemon.kill_registry();
    wait_not_ready(&client).await;
    daemon.take_calls();

    // Registrations were voided by the death, so initialize must register
    // again rather than short-circuit.
    client.initialize().await.unwrap();
    assert!(
        daemon
            .take_calls()
            .iter()
            .any(|c| c == "registerDeathNotification")
    );

    daemon.announce_service();
    wait_ready(&client).await;
}

#[tokio::test]
async fn operations_without_a_station_touch_nothing() {
    let (registry, daemon) = FakeSupplicantBuilder::new().build();
    let client = spawn_client(registry);
    client.initialize().await.unwrap();
    daemon.take_calls();

    let err = client.set_country_code("US").await.unwrap_err();
    assert!(matches!(err, Error::InterfaceUnavailable(_)));
    assert!(daemon.take_calls().is_empty());
}

#[tokio::test]
async fn pass_through_operations_reach_the_daemon() {
    let (client, daemon) = ready_client().await;

    client.set_power_save(true).await.unwrap();
    client.set_suspend_mode(false).await.unwrap();
    client.reconnect().await.unwrap();
    client.add_rx_filter(RxFilterType::V4Multicast).await.unwrap();
    client.remove_rx_filter(RxFilterType::V4Multicast).await.unwrap();
    client.start_rx_filter().await.unwrap();
    client.stop_rx_filter().await.unwrap();
    client.set_bt_coexistence_mode(BtCoexMode::Sense).await.unwrap();
    client.set_bt_coexistence_scan_mode(true).await.unwrap();
    client.initiate_tdls_setup("aa:bb:cc:dd:ee:ff").await.unwrap();
    client.initiate_tdls_teardown("aa:bb:cc:dd:ee:ff").await.unwrap();
    client
        .initiate_anqp_query("aa:bb:cc:dd:ee:ff", &[257, 268], &[3])
        .await
        .unwrap();
    client
        .initiate_hs20_icon_query("aa:bb:cc:dd:ee:ff", "icon.png")
        .await
        .unwrap();
    let mac = client.get_mac_address().await.unwrap();

    assert_eq!(mac, "02:00:00:44:55:66");
    assert_eq!(
        daemon.take_calls(),
        vec![
            "setPowerSave(true)",
            "setSuspendMode(false)",
            "reconnect",
            "addRxFilter(V4Multicast)",
            "removeRxFilter(V4Multicast)",
            "startRxFilter",
            "stopRxFilter",
            "setBtCoexistenceMode(Sense)",
            "setBtCoexistenceScanMode(true)",
            "initiateTdlsSetup(aa:bb:cc:dd:ee:ff)",
            "initiateTdlsTeardown(aa:bb:cc:dd:ee:ff)",
            "initiateAnqpQuery(aa:bb:cc:dd:ee:ff, 2 elements, 1 subtypes)",
            "initiateHs20IconQuery(aa:bb:cc:dd:ee:ff, icon.png)",
            "getMacAddress",
        ]
    );
}

#[tokio::test]
async fn pass_through_rejection_surfaces_the_status() {
    let (client, daemon) = ready_client().await;

    daemon.reject_next("setPowerSave", StatusCode::FailureIfaceDisabled);
    let err = client.set_power_save(true).await.unwrap_err();

    match err {
        Error::RemoteRejected { method, status, .. } => {
            assert_eq!(method, "setPowerSave");
            assert_eq!(status, StatusCode::FailureIfaceDisabled);
        }
        other => panic!("unexpected error: {other}"),
    }
    // A rejection is a live daemon saying no; the session survives.
    assert!(client.is_initialization_complete().await);
}

#[tokio::test]
async fn pass_through_fault_tears_down_the_session() {
    let (client, daemon) = ready_client().await;

    daemon.fault_next("setSuspendMode");
    let err = client.set_suspend_mode(true).await.unwrap_err();

    assert!(matches!(err, Error::TransportFault(_)));
    assert!(!client.is_initialization_complete().await);

    daemon.announce_service();
    wait_ready(&client).await;
    client.set_suspend_mode(true).await.unwrap();
}
