use clap::{Parser, Subcommand};
use galerie::{config, embed, metadata, output, process};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "galerie")]
#[command(about = "Thumbnail and manifest builder for a static photo gallery")]
#[command(long_about = "\
Thumbnail and manifest builder for a static photo gallery

Every original image gets two fixed-width thumbnails and one entry in a
JSON manifest. Per-image metadata lives in a JSON sidecar next to the image;
missing sidecars are created as placeholders to be filled in by hand.

Project layout (paths configurable in config.toml):

  config.toml                              # optional
  public/img/originals/
  ├── 2024-05-01_Anna-Muster_lauf.jpg      # original
  └── 2024-05-01_Anna-Muster_lauf.json     # sidecar (created if missing)
  public/img/thumbs/
  ├── 2024-05-01_Anna-Muster_lauf-320.webp # generated
  └── 2024-05-01_Anna-Muster_lauf-640.webp
  src/data/images.json                     # manifest (replaced every build)

Filename convention: <date>_<Person-Name>_<topic-words>. Capitalised
segments become people, dashed lowercase segments become tags.

Run 'galerie gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Project root containing config.toml
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Originals directory (overrides paths.originals)
    #[arg(long, global = true)]
    originals: Option<String>,

    /// Thumbnail directory (overrides paths.thumbs)
    #[arg(long, global = true)]
    thumbs: Option<String>,

    /// Manifest file (overrides paths.manifest)
    #[arg(long, global = true)]
    manifest: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate thumbnails, placeholder sidecars and the manifest
    Build,
    /// List images and their sidecar state without writing anything
    Check,
    /// Write the iframe listener, height reporter and embed snippet
    Embed {
        /// Output directory (overrides embed.output_dir)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Inline the listener script in the snippet instead of linking it
        #[arg(long)]
        inline: bool,
    },
    /// Print the placeholder sidecar that would be created for a filename
    Placeholder {
        /// Image filename, e.g. 2024-05-01_Anna-Muster_spendenlauf.jpg
        filename: String,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Command::Build => {
            let gallery = load_gallery_config(&cli)?;
            let build_config = process::BuildConfig::from_config(&cli.root, &gallery);
            println!("==> Building {}", build_config.originals_dir.display());
            let result = process::run(&build_config)?;
            output::print_build_output(&result, &cli.root);
        }
        Command::Check => {
            let gallery = load_gallery_config(&cli)?;
            let build_config = process::BuildConfig::from_config(&cli.root, &gallery);
            println!("==> Checking {}", build_config.originals_dir.display());
            let entries = process::check(&build_config)?;
            output::print_check_output(&entries);
        }
        Command::Embed { out, inline } => {
            let gallery = load_gallery_config(&cli)?;
            let dir = out
                .clone()
                .unwrap_or_else(|| cli.root.join(&gallery.embed.output_dir));
            let written = embed::write_assets(&dir, &gallery.embed, *inline)?;
            output::print_embed_output(&dir, &written, &cli.root);
        }
        Command::Placeholder { filename } => {
            let gallery = load_gallery_config(&cli)?;
            let identifier = identifier_of(filename);
            let sidecar = metadata::synthesize_placeholder(&identifier, &gallery.editorial);
            println!("{}", sidecar.to_json()?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load `config.toml` from the root and apply path overrides from the CLI.
fn load_gallery_config(cli: &Cli) -> Result<config::GalleryConfig, config::ConfigError> {
    let mut gallery = config::load_config(&cli.root)?;
    if let Some(originals) = &cli.originals {
        gallery.paths.originals = originals.clone();
    }
    if let Some(thumbs) = &cli.thumbs {
        gallery.paths.thumbs = thumbs.clone();
    }
    if let Some(manifest) = &cli.manifest {
        gallery.paths.manifest = manifest.clone();
    }
    Ok(gallery)
}

/// Identifier for a filename argument: the stem of its last path component.
fn identifier_of(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string())
}
