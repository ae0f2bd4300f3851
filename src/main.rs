//! Main entry point for memnetstat
use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use memnetstat::cli::args::{Cli, FilterArgs, OutputFormatArg, PluginCommand};
use memnetstat::core::profile::Profile;
use memnetstat::formats::{OutputDestination, OutputFormat, OutputWriter};
use memnetstat::memory::MemoryMap;
use memnetstat::plugins::{AnalysisContext, FilesPlugin, ForensicPlugin, NetStatPlugin, PsListPlugin, TaskFilter};
use memnetstat::translation::{KernelSpace, MemoryTranslator};

fn init_logging(cli: &Cli) {
    let level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    log::info!("Opening memory capture file: {}", cli.memory_dump.display());
    let memory_map = MemoryMap::new(&cli.memory_dump)
        .with_context(|| format!("cannot open memory dump {}", cli.memory_dump.display()))?;
    if memory_map.is_empty() {
        anyhow::bail!("memory dump {} is empty", cli.memory_dump.display());
    }

    log::debug!("Mapped {} bytes", memory_map.len());

    let regions = memory_map.regions();
    if memory_map.is_lime() {
        log::info!("LiME header detected with {} region(s)", regions.len());
        for (i, region) in regions.iter().enumerate() {
            log::debug!(
                "Region {}: Start: 0x{:x}, End: 0x{:x}, FileOffset: 0x{:x}",
                i,
                region.start,
                region.end,
                region.file_offset
            );
        }
    } else {
        log::info!("No LiME header found; assuming raw memory capture");
    }
    match memory_map.find_banner() {
        Some(banner) => log::info!("Kernel banner: {}", banner),
        None => log::info!("No kernel banner found in the image"),
    }

    let mut translator = MemoryTranslator::new(regions);
    if let Some(phys_base) = cli.phys_base {
        translator.set_phys_base(phys_base);
    }
    let space = KernelSpace::new(&memory_map.mapped, &translator);

    let mut profile = Profile::load(&cli.profile)
        .with_context(|| format!("cannot load profile {}", cli.profile.display()))?;
    if let Some(map) = &cli.system_map {
        profile
            .load_system_map(map)
            .with_context(|| format!("cannot load System.map {}", map.display()))?;
    }
    if let Some(shift) = cli.kaslr_shift {
        profile.shift_symbols(shift);
    }

    let (plugin, filter): (Box<dyn ForensicPlugin>, FilterArgs) = match cli.plugin {
        None => (Box::new(NetStatPlugin), FilterArgs::default()),
        Some(PluginCommand::Netstat(ref args)) => (Box::new(NetStatPlugin), args.clone()),
        Some(PluginCommand::Pslist(ref args)) => (Box::new(PsListPlugin), args.clone()),
        Some(PluginCommand::Files(ref args)) => (Box::new(FilesPlugin), args.clone()),
    };
    let filter = TaskFilter::new(filter.pid, filter.name.as_deref()).context("invalid --name pattern")?;

    let format = match cli.format {
        OutputFormatArg::Text => OutputFormat::Text,
        OutputFormatArg::Table => OutputFormat::Table,
        OutputFormatArg::Csv => OutputFormat::Csv,
        OutputFormatArg::Json => OutputFormat::Json,
        OutputFormatArg::Jsonl => OutputFormat::Jsonl,
    };
    let destination = match &cli.output {
        Some(path) => OutputDestination::File(path.clone()),
        None => OutputDestination::Stdout,
    };
    let writer = OutputWriter::new(format, destination);

    let context = AnalysisContext::new(&profile, &space, filter);
    let count = plugin
        .run(&context, &writer)
        .with_context(|| format!("{} failed", plugin.name()))?;
    log::info!("{}: {} record(s)", plugin.name(), count);
    Ok(())
}
