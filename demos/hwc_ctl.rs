//! HWC control - command-line client for the display service.
//!
//! ```text
//! cargo run --example hwc_ctl -- describe
//! cargo run --example hwc_ctl -- --socket /tmp/hwc.sock wfd-mode 1
//! cargo run --example hwc_ctl -- present-timeout 0 5000000 2:8333333 1:16666667
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hwc_service::protocol::OpcodeTable;
use hwc_service::transport::{default_socket_path, SocketTransport};
use hwc_service::HwcServiceProxy;
use tracing_subscriber::EnvFilter;

/// Drive a running display service over its socket.
#[derive(Parser, Debug)]
#[command(name = "hwc_ctl")]
struct Cli {
    /// Service socket path (defaults to the temp-dir socket)
    #[arg(short, long)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the opcode table as JSON
    Describe,

    /// Get the WFD mode, or set it when MODE is given
    WfdMode { mode: Option<u32> },

    /// Select an external display configuration
    ExtConfig { index: u32 },

    /// Set display brightness in [0, 1]
    Brightness { display: i32, value: f32 },

    /// Pin the TE2 rate
    Te2 { display: u32, rate_hz: i32 },

    /// Set present timeout parameters
    PresentTimeout {
        display: i32,
        timeout_ns: i32,
        /// FPS:INTERVAL_NS pairs
        #[arg(value_parser = parse_pair)]
        settings: Vec<(u32, u32)>,
    },

    /// Get the debug flags, or set them when FLAGS is given
    Debug { flags: Option<i32> },
}

fn parse_pair(raw: &str) -> Result<(u32, u32), String> {
    let (fps, ns) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected FPS:NS, got {raw}"))?;
    let fps = fps.parse().map_err(|e| format!("{fps}: {e}"))?;
    let ns = ns.parse().map_err(|e| format!("{ns}: {e}"))?;
    Ok((fps, ns))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Command::Describe = cli.command {
        let table = OpcodeTable::new();
        println!("{}", serde_json::to_string_pretty(&table.describe())?);
        return Ok(());
    }

    let socket = cli.socket.unwrap_or_else(default_socket_path);
    let proxy = HwcServiceProxy::new(SocketTransport::connect(&socket)?);

    match cli.command {
        Command::Describe => {}
        Command::WfdMode { mode: Some(mode) } => println!("{}", proxy.set_wfd_mode(mode)?),
        Command::WfdMode { mode: None } => println!("{}", proxy.get_wfd_mode()?),
        Command::ExtConfig { index } => {
            println!("{}", proxy.set_external_display_config(index)?)
        }
        Command::Brightness { display, value } => {
            println!("{}", proxy.set_display_brightness(display, value))
        }
        Command::Te2 { display, rate_hz } => {
            println!("{}", proxy.set_fixed_te2_rate(display, rate_hz))
        }
        Command::PresentTimeout {
            display,
            timeout_ns,
            settings,
        } => {
            let status = proxy.set_present_timeout_parameters(display, timeout_ns, &settings);
            println!("{status}");
        }
        Command::Debug { flags: Some(flags) } => proxy.set_hwc_debug(flags),
        Command::Debug { flags: None } => println!("{:#x}", proxy.get_hwc_debug()?),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_present_timeout() {
        let cli = Cli::try_parse_from([
            "hwc_ctl",
            "present-timeout",
            "0",
            "5000000",
            "2:8333333",
            "1:16666667",
        ])
        .unwrap();

        match cli.command {
            Command::PresentTimeout {
                display,
                timeout_ns,
                settings,
            } => {
                assert_eq!((display, timeout_ns), (0, 5_000_000));
                assert_eq!(settings, vec![(2, 8_333_333), (1, 16_666_667)]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_bad_pair_rejected() {
        assert!(Cli::try_parse_from(["hwc_ctl", "present-timeout", "0", "1", "2-3"]).is_err());
        assert!(parse_pair("x:1").is_err());
    }
}
