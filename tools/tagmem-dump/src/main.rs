use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tagmem::{layout, regs, MemTransport, TagDevice, BLOCK_SIZE};

#[derive(Parser, Debug)]
#[command(
    name = "tagmem-dump",
    about = "Inspect a raw tag memory image: device properties, blocks, configuration registers."
)]
struct Args {
    /// Raw memory image, one 16-byte block per block address (up to 4 KiB)
    image: PathBuf,

    /// First block to dump
    #[arg(long, default_value_t = 0)]
    start: u8,

    /// Number of blocks to dump
    #[arg(long, default_value_t = 4)]
    count: usize,

    /// Also print the configuration registers by name
    #[arg(long, action = clap::ArgAction::SetTrue)]
    config: bool,
}

fn main() -> anyhow::Result<()> {
    run(Args::parse())
}

fn run(args: Args) -> anyhow::Result<()> {
    let raw = fs::read(&args.image)
        .with_context(|| format!("read image {}", args.image.display()))?;
    if raw.is_empty() {
        bail!("image is empty");
    }
    if raw.len() % BLOCK_SIZE != 0 {
        bail!(
            "image length {} is not a multiple of the {}-byte block size",
            raw.len(),
            BLOCK_SIZE
        );
    }
    if raw.len() > MemTransport::BLOCKS * BLOCK_SIZE {
        bail!(
            "image is larger than the {}-block address space",
            MemTransport::BLOCKS
        );
    }
    let image_blocks = raw.len() / BLOCK_SIZE;

    let mut dev = TagDevice::new(MemTransport::from_image(&raw));
    print_properties(&mut dev).context("read device properties")?;

    if args.count == 0 {
        bail!("--count must be non-zero");
    }
    let end = usize::from(args.start) + args.count;
    if end > image_blocks {
        bail!(
            "block range {}..{} is outside the {}-block image",
            args.start,
            end,
            image_blocks
        );
    }
    print_blocks(&mut dev, args.start, args.count).context("dump blocks")?;

    if args.config {
        print_config_regs(&mut dev).context("read configuration registers")?;
    }

    Ok(())
}

fn print_properties(dev: &mut TagDevice<MemTransport>) -> anyhow::Result<()> {
    let mut block0 = [0u8; BLOCK_SIZE];
    dev.read_bytes(0, 0, &mut block0)?;

    println!("device address: 0x{:02X}", block0[0]);
    println!(
        "serial:         {}",
        block0[1..7]
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(":")
    );
    println!("static locks:   {:02X}:{:02X}", block0[10], block0[11]);

    let caps = dev.read_descriptor()?;
    println!(
        "descriptor:     {:02X}:{:02X}:{:02X}:{:02X} ({} bytes user memory)",
        caps.magic,
        caps.version,
        caps.mlen,
        caps.access,
        caps.user_memory_len()
    );
    Ok(())
}

fn print_blocks(dev: &mut TagDevice<MemTransport>, start: u8, count: usize) -> anyhow::Result<()> {
    let mut data = vec![0u8; count * BLOCK_SIZE];
    dev.read_bytes(u16::from(start), 0, &mut data)?;

    println!();
    for (i, block) in data.chunks_exact(BLOCK_SIZE).enumerate() {
        let hex = block
            .chunks(4)
            .map(|quad| {
                quad.iter()
                    .map(|b| format!("{b:02X}"))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("  ");
        let ascii: String = block
            .iter()
            .map(|&b| if (0x21..=0x7E).contains(&b) { b as char } else { '.' })
            .collect();
        println!("0x{:02X}  {hex}  |{ascii}|", start as usize + i);
    }
    Ok(())
}

fn print_config_regs(dev: &mut TagDevice<MemTransport>) -> anyhow::Result<()> {
    const NAMES: [(&str, u8); 7] = [
        ("NC_REG", regs::config::NC_REG),
        ("LAST_NDEF_BLOCK", regs::config::LAST_NDEF_BLOCK),
        ("SRAM_MIRROR_BLOCK", regs::config::SRAM_MIRROR_BLOCK),
        ("WDT_LS", regs::config::WDT_LS),
        ("WDT_MS", regs::config::WDT_MS),
        ("I2C_CLOCK_STR", regs::config::I2C_CLOCK_STR),
        ("REG_LOCK", regs::config::REG_LOCK),
    ];

    println!();
    println!("configuration registers (block 0x{:02X}):", layout::CONFIG_BLOCK);
    for (name, index) in NAMES {
        let value = dev.read_config_reg(index)?;
        println!("  {name:<17} 0x{value:02X}");
    }
    Ok(())
}
