//! Trains XOR on a small network, then saves and reloads it.
//!
//! Run with `cargo run --example xor`. Set `RUST_LOG=basic_neural=debug` to
//! see construction, pool and persistence events.

use basic_neural::modelio::{load_network, save_network};
use basic_neural::NetworkBuilder;
use tracing_subscriber::EnvFilter;

const XOR: [([f64; 2], [f64; 1]); 4] = [
    ([0.0, 0.0], [0.0]),
    ([0.0, 1.0], [1.0]),
    ([1.0, 0.0], [1.0]),
    ([1.0, 1.0], [0.0]),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut network = NetworkBuilder::new(2, 1)
        .hidden_layers(1, 4)
        .default_parallel_training()
        .build()?;

    for epoch in 0..10_000 {
        let mut adjustment = 0.0;
        for (input, target) in &XOR {
            adjustment += network.train(input, target)?;
        }
        if epoch % 2_000 == 0 {
            println!("epoch {epoch:>5}: adjustment {adjustment:.6}");
        }
    }

    for (input, target) in &XOR {
        let output = network.guess(input)?;
        println!("{input:?} -> {:.3} (expected {})", output[0], target[0]);
    }

    let path = std::env::temp_dir().join("xor-network.json");
    save_network(&network, &path)?;
    let restored = load_network(&path)?;
    println!("restored network equal to trained one: {}", restored == network);

    network.close();
    Ok(())
}
