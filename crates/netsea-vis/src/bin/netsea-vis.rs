//! Network Sea sandbox server
//!
//! Usage: netsea-vis [port] [static_dir]

use netsea_cli::{BackendEvent, Console};
use netsea_topology::{Link, NetStore, Node, NodeKind};
use netsea_vis::{ServerConfig, VisServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// PC1 and PC2 behind SW1, with R1 as the uplink.
fn demo_lab() -> netsea_topology::Result<NetStore> {
    let mut store = NetStore::new();
    let devices = [
        ("pc1", NodeKind::Pc, "PC1", [-4.0, 0.0, 2.0]),
        ("pc2", NodeKind::Pc, "PC2", [4.0, 0.0, 2.0]),
        ("sw1", NodeKind::Switch, "SW1", [0.0, 0.0, 0.0]),
        ("r1", NodeKind::Router, "R1", [0.0, 0.0, -4.0]),
    ];
    for (id, kind, name, position) in devices {
        store.add_node(Node::new(id, kind, name).with_position(position));
    }
    store.add_link(Link::new("l1", "pc1", "sw1"))?;
    store.add_link(Link::new("l2", "pc2", "sw1"))?;
    store.add_link(Link::new("l3", "sw1", "r1"))?;
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "netsea=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = ServerConfig::from_env_and_args(&args);

    let mut console = Console::new(demo_lab()?);
    console.apply_backend_event(BackendEvent::MissionUpdate {
        goal: Some("Ping R1 from PC1".to_string()),
        flag: None,
    });
    let _ = console.store_mut().drain_events();

    tracing::info!(port = config.port, "Starting Network Sea sandbox");
    VisServer::new(console, config).serve().await?;
    Ok(())
}
