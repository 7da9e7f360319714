//! kfd-cli
//!
//! Diagnostic command-line interface for KFD-family keyloaders.

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

use kfdlink::key::{Kid, Sln};
use kfdlink::transport::SerialStream;
use kfdlink::{Config, Device, DeviceFamily, KeyItem, KfdError};

/// kfd-cli
#[derive(Parser, Debug)]
#[command(name = "kfd-cli")]
#[command(about = "Talk to a KFD-family keyloader over a serial port")]
#[command(version)]
struct Args {
    /// Serial device path (defaults to /dev/ttyUSB0 or COM3)
    #[arg(short, long)]
    port: Option<String>,

    /// Adapter family: avr or tool
    #[arg(short, long, default_value = "avr")]
    family: DeviceFamily,

    /// Baud rate
    #[arg(short, long, default_value_t = kfdlink::config::DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Reply timeout in milliseconds
    #[arg(short, long, default_value_t = kfdlink::config::DEFAULT_READ_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Identify the adapter, run the self-test and list installed keys
    Info,

    /// Run the line self-test
    SelfTest,

    /// List keys stored on the adapter
    ListKeys,

    /// Store a key in a slot
    InstallKey {
        /// Slot index
        #[arg(long)]
        slot: u8,

        /// Security logical number (decimal or 0x hex)
        #[arg(long)]
        sln: Sln,

        /// Key ID (decimal or 0x hex)
        #[arg(long)]
        kid: Kid,

        /// Key material as hex
        #[arg(long)]
        key: String,

        /// Mark as key-encryption key
        #[arg(long)]
        kek: bool,

        /// Mark as erase request
        #[arg(long)]
        erase: bool,
    },

    /// Erase every installed key
    Zeroize,

    /// Reboot the adapter
    Reset,

    /// Enter the firmware-update bootloader
    EnterBootloader,

    /// Program model number and hardware revision
    WriteModel {
        model: u8,
        hw_rev_major: u8,
        hw_rev_minor: u8,
    },

    /// Program the serial number (up to 6 ASCII characters)
    WriteSerial { serial: String },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kfdlink=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("kfd-cli v{}", kfdlink::VERSION);

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> kfdlink::Result<()> {
    let mut builder = Config::for_family(args.family)
        .baud_rate(args.baud)
        .read_timeout_ms(args.timeout_ms);
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    let config = builder.build();

    let mut device = Device::connect(&config)?;

    match args.command.unwrap_or(Commands::Info) {
        Commands::Info => print_info(&mut device, args.json),
        Commands::SelfTest => {
            let result = device.self_test()?;
            if args.json {
                println!("{:#}", json!({ "self_test": result }));
            } else {
                println!("SelfTest: {}", result);
            }
            Ok(())
        }
        Commands::ListKeys => {
            let keys = device.list_installed_keys()?;
            if args.json {
                println!("{:#}", json!({ "installed_keys": keys }));
            } else {
                print_keys(&keys);
            }
            Ok(())
        }
        Commands::InstallKey {
            slot,
            sln,
            kid,
            key,
            kek,
            erase,
        } => {
            let material = hex::decode(key.trim()).map_err(|e| {
                KfdError::Validation(format!("Key material is not valid hex: {}", e))
            })?;
            let item = KeyItem::new(sln, kid, material)
                .with_kek(kek)
                .with_erase(erase);
            device.install_key(slot, &item)?;
            println!("Installed SLN {} KID {} in slot {}", sln, kid, slot);
            Ok(())
        }
        Commands::Zeroize => {
            device.zeroize_all()?;
            println!("All keys zeroized");
            Ok(())
        }
        Commands::Reset => {
            device.reset()?;
            println!("Reset sent");
            Ok(())
        }
        Commands::EnterBootloader => {
            device.enter_bootloader()?;
            println!("Bootloader entry sent");
            Ok(())
        }
        Commands::WriteModel {
            model,
            hw_rev_major,
            hw_rev_minor,
        } => {
            device.write_model(model, hw_rev_major, hw_rev_minor)?;
            println!("Model {} rev {}.{} written", model, hw_rev_major, hw_rev_minor);
            Ok(())
        }
        Commands::WriteSerial { serial } => {
            device.write_serial_number(&serial)?;
            println!("Serial number {} written", serial.to_ascii_uppercase());
            Ok(())
        }
    }
}

/// Full diagnostic dump
fn print_info(device: &mut Device<SerialStream>, as_json: bool) -> kfdlink::Result<()> {
    let info = device.device_info().clone();
    let self_test = device.self_test()?;

    // Families without key storage just skip the listing
    let keys = match device.list_installed_keys() {
        Ok(keys) => Some(keys),
        Err(KfdError::Unsupported(reason)) => {
            tracing::debug!("{}", reason);
            None
        }
        Err(e) => return Err(e),
    };

    if as_json {
        println!(
            "{:#}",
            json!({
                "family": device.family(),
                "info": info,
                "self_test": self_test,
                "installed_keys": keys,
            })
        );
        return Ok(());
    }

    println!("Family\t: {}", device.family());
    println!("AdpVer\t: {}", info.adapter_version);
    println!("FwVer\t: {}", info.firmware_version);
    println!("UID\t: {}", info.uid);
    println!("MdlNo\t: {}", info.model);
    println!("HwRev\t: {}", info.hardware_revision);
    println!("SerNo\t: {}", info.serial_number);
    println!("SelfTest: {}", self_test);
    if let Some(keys) = keys {
        print_keys(&keys);
    }
    Ok(())
}

fn print_keys(keys: &[kfdlink::InstalledKey]) {
    if keys.is_empty() {
        println!("Installed keys: none");
        return;
    }
    println!("Installed keys:");
    for key in keys {
        println!("  slot {:>2}  CKR 0x{:04X}  KID 0x{:04X}", key.slot, key.ckr, key.kid);
    }
}
