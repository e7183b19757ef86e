use std::rc::Rc;

use glam::Vec3;
use rand::Rng;
use region_stream::network::{MutationClient, QueuedConnection, RegionServer, SyncClient};
use region_stream::streaming::{HeadlessBackend, SharedObserver};
use region_stream::{ServerConfig, StreamConfig};

const TICKS: u32 = 240;
const STEP: f32 = 0.75;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Region Stream - Client/Server Loopback Demo");
    println!("===========================================");

    let stream_config = match std::env::args().nth(1) {
        Some(path) => StreamConfig::load(path)?,
        None => StreamConfig::default(),
    };
    let server_config = ServerConfig::default();
    let max_packet_size = stream_config.max_packet_size;

    let upstream = Rc::new(QueuedConnection::new(max_packet_size));
    let downstream = QueuedConnection::new(server_config.max_packet_size);
    let observer = SharedObserver::new();

    let mut server = RegionServer::new(server_config)?;
    let mut client = SyncClient::new(
        stream_config,
        HeadlessBackend::new(),
        Rc::clone(&upstream),
        observer.clone(),
    )?;
    let mut mutations = MutationClient::new(Rc::clone(&upstream));

    let mut rng = rand::thread_rng();
    let mut position = Vec3::ZERO;

    for tick in 0..TICKS {
        // The observer shows up a few frames after start
        if tick == 5 {
            observer.set(position);
        }
        if tick > 5 {
            position.x += STEP;
            position.z += rng.gen_range(-STEP..=STEP);
            observer.set(position);
        }

        client.tick();

        if tick > 5 && tick % 20 == 0 {
            let x = position.x + rng.gen_range(-3.0f32..3.0);
            let z = position.z + rng.gen_range(-3.0f32..3.0);
            let placement = mutations.place_block(client.cache(), x, z);
            log::info!("Placed brick at ({:.1}, {:.1}): {:?}", x, z, placement);
        }

        for packet in upstream.drain_outgoing() {
            server.handle_packet(&packet, &downstream);
        }
        for packet in downstream.drain_outgoing() {
            client.handle_packet(&packet);
        }

        if tick % 60 == 0 {
            println!(
                "tick {:>3}: observer ({:>6.1}, {:>6.1}), {} cached regions",
                tick,
                position.x,
                position.z,
                client.cache().len()
            );
        }
    }

    let cache = client.cache();
    println!("\nFinal state");
    println!("-----------");
    println!("Cached regions:   {}", cache.len());
    println!("Server regions:   {}", server.region_count());
    println!("Sync stats:       {:?}", client.stats());
    println!("Cache stats:      {:?}", cache.stats());
    println!("Mutation stats:   {:?}", mutations.stats());
    println!("Server stats:     {:?}", server.stats());
    println!(
        "Visuals:          {} materialized, {} populated, {} destroyed, {} live",
        cache.backend().materialized(),
        cache.backend().populated(),
        cache.backend().destroyed().len(),
        cache.backend().live_handles()
    );

    Ok(())
}
