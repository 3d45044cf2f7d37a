use record_builder::RecordBuilder;
use std::collections::{BTreeMap, HashMap};

#[derive(RecordBuilder, Debug)]
struct ServerConfig {
    host: String,
    port: u16,
    features: Vec<String>,
    middlewares: Option<Vec<String>>,
    routes: BTreeMap<String, Vec<Option<String>>>,
    limits: HashMap<String, u32>,
    checksums: Box<[u8]>,
}

fn main() {
    println!("=== Collections Example ===\n");

    let builder = ServerConfig::builder()
        .set_host("0.0.0.0".to_string())
        .set_port(8080)
        .add_features("logging".to_string())
        .add_all_features(vec!["compression".to_string(), "caching".to_string()])
        .put_routes("/".to_string(), vec![Some("index".to_string()), None])
        .put_all_limits([("workers".to_string(), 4), ("connections".to_string(), 256)])
        .add_all_checksums([0xde, 0xad]);

    if let Ok(features) = builder.get_features() {
        println!("Features so far: {:?}", features);
    }
    println!("Middlewares set: {}", builder.has_middlewares());

    let server = builder.build().expect("Failed to build server config");
    println!("\nServer config: {:?}", server);

    // Untouched collections build as empty
    let bare = ServerConfig::builder()
        .set_host("localhost".to_string())
        .build()
        .expect("Failed to build bare config");

    println!("\nBare config: {:?}", bare);
}
