// src/main.rs
use script_shelf::core::config::Config;
use script_shelf::core::credential::hash_credential;
use script_shelf::Result;

#[actix_web::main]
async fn main() -> Result<()> {
    // `script-shelf --hash-credential <value>` prints a value for the [auth] section
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [flag, value] = args.as_slice() {
        if flag == "--hash-credential" {
            println!("{}", hash_credential(value));
            return Ok(());
        }
    }

    let config = Config::load().await?;
    init_logger(&config.logging.log_level);

    if let Some(info) = &config.debug_info {
        log::info!("{}", info);
    }
    for warning in &config.warnings {
        log::warn!("{}", warning);
    }

    if let Err(e) = script_shelf::server::run(config).await {
        log::error!("Server failed: {}", e);
        return Err(e);
    }
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn init_logger(level: &str) {
    let mut builder = env_logger::Builder::new();
    match std::env::var("RUST_LOG") {
        Ok(filter) => builder.parse_filters(&filter),
        Err(_) => builder.parse_filters(level),
    };
    builder.format_timestamp_secs().init();
}
