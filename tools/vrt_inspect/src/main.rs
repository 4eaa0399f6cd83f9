//! Command-line dump of VRT mesh files and MTL material libraries.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, Command};

use vrt_assets::materials::{MaterialKind, MtlLoader, MtlValue, TextureCache};
use vrt_assets::{CreatorOptions, FsFetcher, MtlParser, VrtLoader};

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("vrt_inspect")
        .about("Dumps the contents of VRT mesh files and MTL material libraries")
        .arg(
            Arg::new("input")
                .value_name("FILE")
                .help("Input file (.vrt or .mtl)")
                .required(true),
        )
        .arg(
            Arg::new("options")
                .short('c')
                .long("options")
                .value_name("FILE")
                .help("TOML file with material creator options"),
        )
        .arg(
            Arg::new("create")
                .long("create")
                .action(ArgAction::SetTrue)
                .help("Build materials from an .mtl input, loading textures from disk"),
        )
        .get_matches();

    let input = PathBuf::from(
        matches
            .get_one::<String>("input")
            .context("input argument missing")?,
    );
    let options = match matches.get_one::<String>("options") {
        Some(path) => load_options(Path::new(path))?,
        None => CreatorOptions::default(),
    };

    match input.extension().and_then(|e| e.to_str()) {
        Some("vrt") => inspect_vrt(&input),
        Some("mtl") => inspect_mtl(&input, options, matches.get_flag("create")),
        other => bail!("unsupported input extension {:?}", other),
    }
}

fn load_options(path: &Path) -> Result<CreatorOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading options file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing options file {}", path.display()))
}

fn inspect_vrt(path: &Path) -> Result<()> {
    let model = VrtLoader::load_vrt(path)
        .with_context(|| format!("parsing VRT file {}", path.display()))?;

    println!("magic:   {:?}", String::from_utf8_lossy(&model.magic));
    println!("version: {}", model.version);
    println!("mtllib:  {}", model.mtllib);
    println!("objects: {}", model.objects.len());

    for object in &model.objects {
        println!();
        println!(
            "object {:?} ({:?}, {} bytes compressed)",
            object.name,
            object.declaration,
            object
                .geometry
                .compressed
                .as_ref()
                .map_or(0, std::vec::Vec::len)
        );
        for assignment in &object.materials {
            println!(
                "  material {:?} from {:?}: groups {}..{:?} ({}), smooth={}, inherited={}",
                assignment.name,
                assignment.mtllib,
                assignment.group_start,
                assignment.group_end,
                assignment.group_count,
                assignment.smooth,
                assignment.inherited,
            );
        }
    }
    Ok(())
}

fn inspect_mtl(path: &Path, options: CreatorOptions, create: bool) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading MTL file {}", path.display()))?;
    let library = MtlParser::parse(&text);

    println!("materials: {}", library.len());
    for (name, raw) in library.iter() {
        println!();
        println!("newmtl {}", name);
        for (key, value) in raw.iter() {
            match value {
                MtlValue::Color(c) => println!("  {} = ({}, {}, {})", key, c.x, c.y, c.z),
                MtlValue::Text(t) => println!("  {} = {:?}", key, t),
            }
        }
    }

    if create {
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        let loader = MtlLoader::new(
            options,
            Rc::new(TextureCache::new()),
            Rc::new(FsFetcher::new(root)),
        );
        let creator = loader.parse(&text, "");
        creator.on_complete(|had_error| {
            if had_error {
                log::warn!("one or more texture loads failed");
            }
        });

        println!();
        for material in creator.preload() {
            let workflow = match &material.kind {
                MaterialKind::Specular(_) => "specular",
                MaterialKind::Metalness(_) => "metalness",
            };
            println!(
                "built {:?}: {} workflow, opacity {}, transparent={}, {} texture(s)",
                material.name,
                workflow,
                material.opacity,
                material.transparent,
                material.textures.count(),
            );
            for texture in material.textures.iter() {
                println!(
                    "  {:?} texture {} ({:?})",
                    texture.slot(),
                    texture.url(),
                    texture.status(),
                );
            }
        }
        println!(
            "textures: {}/{} processed, errors={}",
            creator.tracker().processed(),
            creator.tracker().requested(),
            creator.tracker().had_error(),
        );
    }
    Ok(())
}
