//! Show which formula set each vertex of one landscape tile selects
//!
//! Run with: cargo run --bin landscape-dump -- --world world.json --form-id 0001A2B3

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use landscape_recolor::codec::GRID_SIZE;
use landscape_recolor::{
    Error, FormId, FormulaKind, LandscapeGrid, Plugin, Settings, SnowClassifier, TextureLayer, TextureResolver,
    VertexColor, VertexColors,
};

#[derive(Parser)]
#[command(name = "landscape-dump")]
#[command(about = "Print the snow/standard map of one landscape tile")]
struct Cli {
    #[arg(long)]
    world: PathBuf,
    /// Landscape form id (hex)
    #[arg(long, value_parser = parse_form_id)]
    form_id: FormId,
    /// Settings file whose formulas are listed
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn parse_form_id(s: &str) -> Result<FormId, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(digits, 16)
        .map(FormId)
        .map_err(|e| format!("invalid form id '{}': {}", s, e))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match dump(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn texture_name(plugin: &Plugin, id: FormId) -> String {
    match plugin.textures.get(&id) {
        Some(t) => {
            let flags = match plugin.resolve_texture(id).and_then(|r| r.flags) {
                Some(flags) => format!("flags {:#04x}", flags.bits()),
                None => "no flags".to_string(),
            };
            format!("{} {} ({})", id, t.editor_id.as_deref().unwrap_or("-"), flags)
        }
        None => format!("{} (unresolved)", id),
    }
}

fn dump(cli: &Cli) -> landscape_recolor::Result<()> {
    let settings = Settings::resolve(cli.settings.as_deref())?;
    let plugin = Plugin::load(&cli.world)?;
    let record = plugin
        .landscape(cli.form_id)
        .ok_or(Error::LandscapeNotFound(cli.form_id))?;

    let layers = record.read_layers().map_err(|e| e.in_landscape(record.form_id))?;
    let colors = record
        .read_vertex_colors()
        .map_err(|e| e.in_landscape(record.form_id))?
        .unwrap_or_else(|| VertexColors::filled(VertexColor::WHITE));

    println!("Landscape {}", record.describe());
    match record.flags() {
        Ok(flags) => println!("Flags: {:?}", flags),
        Err(e) => println!("Flags: {}", e),
    }
    println!("Layers:");
    for layer in &layers {
        let header = layer.header();
        match layer {
            TextureLayer::Base(_) => println!(
                "  base  {:?} {}",
                header.quadrant,
                texture_name(&plugin, header.texture)
            ),
            TextureLayer::Alpha { entries, .. } => println!(
                "  alpha {:?} layer {} {} ({} entries)",
                header.quadrant,
                header.layer,
                texture_name(&plugin, header.texture),
                entries.len()
            ),
        }
    }

    let grid = LandscapeGrid::build(&layers, colors);
    let classifier = SnowClassifier::new(&plugin);
    let mut snow = 0;

    // North at the top
    println!("Formula map (S = snow, . = standard):");
    for y in (0..GRID_SIZE).rev() {
        let row: String = (0..GRID_SIZE)
            .map(|x| match grid.vertex(x, y).formula_kind(&classifier) {
                FormulaKind::Snow => {
                    snow += 1;
                    'S'
                }
                FormulaKind::Standard => '.',
            })
            .collect();
        println!("  {:2} {}", y, row);
    }
    println!("{} of {} vertices use the snow formulas", snow, GRID_SIZE * GRID_SIZE);
    for (name, sources) in [("Snow", &settings.advanced.snow), ("Standard", &settings.advanced.standard)] {
        println!("{}: R = {}, G = {}, B = {}", name, sources.red, sources.green, sources.blue);
    }
    if grid.discarded_alpha_entries() > 0 {
        println!("{} alpha entries discarded", grid.discarded_alpha_entries());
    }

    Ok(())
}
