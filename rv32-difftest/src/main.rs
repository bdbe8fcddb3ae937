use clap::Parser;
use rv32_difftest::loader::load_image;
use rv32_difftest::{DifftestSession, ForeignCore, SessionConfig};
use std::fs;
use std::path::PathBuf;

/// Seed a reference session from a program image and inspect it.
///
/// No reference core is linked into this tool, so it never steps; it shows
/// what the reference side would start from.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to an ELF or raw binary image
    #[arg(short, long)]
    image: PathBuf,

    /// Reference RAM base address
    #[arg(long, default_value = "0x80000000", value_parser = parse_u32)]
    base: u32,

    /// Reference RAM size in MiB
    #[arg(long, default_value_t = 128)]
    mem_mib: usize,

    /// Print the word at this address (repeatable, hex with 0x prefix accepted)
    #[arg(long, value_parser = parse_u32)]
    dump: Vec<u32>,

    /// Inject an interrupt with this cause after loading and show the trap state
    #[arg(long, value_parser = parse_u64)]
    irq: Option<u64>,

    /// Write a bincode snapshot of the seeded session to this path
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

fn parse_u64(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse::<u64>(),
    };
    parsed.map_err(|e| format!("invalid number '{}': {}", s, e))
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let v = parse_u64(s)?;
    u32::try_from(v).map_err(|_| format!("'{}' does not fit in 32 bits", s))
}

/// Arena size in bytes for a `--mem-mib` request.
fn arena_size(mem_mib: usize) -> Result<usize, String> {
    mem_mib
        .checked_mul(1024 * 1024)
        .ok_or_else(|| format!("Requested memory size is too large: {} MiB", mem_mib))
}

fn print_section(title: &str) {
    println!("\n\x1b[1;36m━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\x1b[0m");
    println!("\x1b[1;33m  ▸ {}\x1b[0m", title);
    println!("\x1b[1;36m━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\x1b[0m");
}

fn print_status(component: &str, status: &str, ok: bool) {
    let status_color = if ok { "\x1b[1;32m" } else { "\x1b[1;31m" };
    let check = if ok { "✓" } else { "✗" };
    println!("    \x1b[0;37m{:<40}\x1b[0m {}[{}] {}\x1b[0m", component, status_color, check, status);
}

fn print_info(key: &str, value: &str) {
    println!("    \x1b[0;90m├─\x1b[0m \x1b[0;37m{:<20}\x1b[0m \x1b[1;97m{}\x1b[0m", key, value);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    print_section("REFERENCE SESSION");
    let config = SessionConfig {
        base: args.base,
        size: arena_size(args.mem_mib)?,
    };
    let mut session = DifftestSession::with_config(config, ForeignCore::detached())?;
    print_info("RAM base", &format!("{:#010x}", config.base));
    print_info("RAM size", &format!("{} MiB", args.mem_mib));
    print_status("Arena", "ALLOCATED", true);

    print_section("IMAGE");
    let image = fs::read(&args.image)?;
    print_info("Path", &args.image.display().to_string());
    print_info("Size", &format!("{} bytes", image.len()));
    let entry = match load_image(&mut session, &image) {
        Ok(entry) => {
            print_status("Load", "OK", true);
            entry
        }
        Err(e) => {
            print_status("Load", &e.to_string(), false);
            return Err(e.into());
        }
    };
    session.state_mut().pc = entry;
    print_info("Entry", &format!("{:#010x}", entry));

    if !args.dump.is_empty() {
        print_section("MEMORY");
        for &addr in &args.dump {
            match session.dump_memory(addr) {
                Ok(word) => println!("    {}", word),
                Err(e) => print_status(&format!("{:#010x}", addr), &e.to_string(), false),
            }
        }
    }

    if let Some(cause) = args.irq {
        print_section("TRAP ENTRY");
        session.raise_interrupt(cause);
        let state = session.state();
        print_info("mcause", &format!("{:#010x}", state.mcause));
        print_info("mepc", &format!("{:#010x}", state.mepc));
        print_info("mstatus", &format!("{:#010x}", state.mstatus));
        print_info("pc", &format!("{:#010x}", state.pc));
        print_info("privilege", &format!("{:?}", state.privilege()));
    }

    if let Some(path) = args.snapshot {
        print_section("SNAPSHOT");
        let bytes = session.snapshot().to_bytes()?;
        fs::write(&path, &bytes)?;
        print_info("Path", &path.display().to_string());
        print_status("Snapshot", &format!("{} bytes written", bytes.len()), true);
    }

    Ok(())
}
