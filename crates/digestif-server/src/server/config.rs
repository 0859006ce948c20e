use anyhow::bail;
use clap::Parser;
use std::time::Duration;

/// Runtime configuration for the `digestif-server` binary.
///
/// All values are parsed from CLI arguments or environment variables, with
/// defaults matching the original deployment: a 5 second hold window and a
/// 100-slot work queue.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "digestif-server",
    version,
    about = "An HTTP service for deferred SHA-512 hashing"
)]
pub struct CliArgs {
    /// Address to listen on.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,

    /// Milliseconds each admitted request is held before hashing.
    ///
    /// Lower values are useful for local testing; 0 disables the hold window
    /// entirely.
    ///
    /// Environment variable: `HASH_DELAY_MS`
    #[arg(long, env = "HASH_DELAY_MS", default_value_t = 5_000)]
    pub hash_delay_ms: u64,

    /// Capacity of the bounded work queue between the delay timers and the
    /// hash worker.
    ///
    /// When full, timer tasks block until the worker catches up; nothing is
    /// dropped. Must be greater than 0.
    ///
    /// Environment variable: `QUEUE_CAPACITY`
    #[arg(long, env = "QUEUE_CAPACITY", default_value_t = 100)]
    pub queue_capacity: usize,
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub hash_delay: Duration,
    pub queue_capacity: usize,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.queue_capacity == 0 {
            bail!("QUEUE_CAPACITY must be greater than 0");
        }

        Ok(Self {
            server_addr: args.server_addr,
            hash_delay: Duration::from_millis(args.hash_delay_ms),
            queue_capacity: args.queue_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_deployment() {
        let args = CliArgs::parse_from(["digestif-server"]);
        let config = ServerConfig::try_from(args).unwrap();
        assert_eq!(config.server_addr, "0.0.0.0:8080");
        assert_eq!(config.hash_delay, Duration::from_secs(5));
        assert_eq!(config.queue_capacity, 100);
    }

    #[test]
    fn zero_queue_capacity_is_rejected() {
        let args = CliArgs::parse_from(["digestif-server", "--queue-capacity", "0"]);
        assert!(ServerConfig::try_from(args).is_err());
    }
}
