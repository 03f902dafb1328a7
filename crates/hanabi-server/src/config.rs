use std::time::Duration;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "hanabi-server")]
#[command(about = "Host one cooperative Hanabi game over TCP", long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "HANABI_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// TCP port to listen on
    #[arg(short, long, env = "HANABI_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Number of seats; the game starts once all are filled
    #[arg(
        short = 'n',
        long,
        env = "HANABI_PLAYERS",
        default_value_t = 3,
        value_parser = clap::value_parser!(u8).range(2..=5)
    )]
    pub players: u8,

    /// Seconds a player has to finish a whole turn before it passes (no limit by default)
    #[arg(long, env = "HANABI_TURN_TIMEOUT_SECS")]
    pub turn_timeout_secs: Option<u64>,
}

impl Config {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn turn_timeout(&self) -> Option<Duration> {
        self.turn_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["hanabi-server"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:8000");
        assert_eq!(config.players, 3);
        assert_eq!(config.turn_timeout(), None);
    }

    #[test]
    fn explicit_values() {
        let config = Config::try_parse_from([
            "hanabi-server",
            "--host",
            "0.0.0.0",
            "-p",
            "9000",
            "--players",
            "5",
            "--turn-timeout-secs",
            "30",
        ])
        .unwrap();
        assert_eq!(config.address(), "0.0.0.0:9000");
        assert_eq!(config.players, 5);
        assert_eq!(config.turn_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn player_count_is_bounded() {
        assert!(Config::try_parse_from(["hanabi-server", "-n", "1"]).is_err());
        assert!(Config::try_parse_from(["hanabi-server", "-n", "6"]).is_err());
        assert!(Config::try_parse_from(["hanabi-server", "-n", "2"]).is_ok());
    }
}
