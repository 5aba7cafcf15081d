//! Interactive terminal wizard for building GUIADOR service sheets.

mod prompt;
mod session;

use anyhow::{bail, Result};
use clap::Parser;
use guiador_core::{AssetPaths, Catalog};
use guiador_pdf::PdfExporter;
use guiador_xlsx::TableLoader;
use prompt::Prompter;
use session::Session;
use std::io;
use std::path::PathBuf;

/// Build a worship-service program sheet and export it as PDF.
#[derive(Parser, Debug)]
#[command(name = "guiador")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding HIMNOS.xlsx, COROS.xlsx, logo.png and DejaVuSans.ttf
    #[arg(short, long, env = "GUIADOR_ASSETS_DIR", default_value = ".")]
    assets_dir: PathBuf,

    /// Hymn table (default: <assets-dir>/HIMNOS.xlsx)
    #[arg(long, env = "GUIADOR_HYMNS")]
    hymns: Option<PathBuf>,

    /// Chorus table (default: <assets-dir>/COROS.xlsx)
    #[arg(long, env = "GUIADOR_CHORUSES")]
    choruses: Option<PathBuf>,

    /// Logo image (default: <assets-dir>/logo.png)
    #[arg(long, env = "GUIADOR_LOGO")]
    logo: Option<PathBuf>,

    /// TrueType font used in the PDF (default: <assets-dir>/DejaVuSans.ttf)
    #[arg(long, env = "GUIADOR_FONT")]
    font: Option<PathBuf>,

    /// Directory the PDF is written to (default: <assets-dir>)
    #[arg(short, long, env = "GUIADOR_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Resolve asset locations: explicit paths override the assets directory.
    fn asset_paths(&self) -> AssetPaths {
        let mut paths = AssetPaths::in_dir(&self.assets_dir);
        let overrides = [
            (&self.hymns, &mut paths.hymns),
            (&self.choruses, &mut paths.choruses),
            (&self.logo, &mut paths.logo),
            (&self.font, &mut paths.font),
            (&self.output_dir, &mut paths.output_dir),
        ];
        for (value, target) in overrides {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
        paths
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let paths = args.asset_paths();
    log::debug!("assets: {:?}", paths);

    let catalog = load_catalog(&paths)?;
    println!("{}", catalog_summary(&catalog));
    let exporter = PdfExporter::from_assets(&paths);

    let stdin = io::stdin();
    let prompter = Prompter::new(stdin.lock(), io::stdout());
    let mut session = Session::new(&catalog, &exporter, &paths.output_dir, prompter);
    session.run(|| chrono::Local::now().naive_local())
}

/// Load both reference tables. Every load error is reported before giving up,
/// since the wizard cannot run on partial data.
fn load_catalog(paths: &AssetPaths) -> Result<Catalog> {
    let loader = TableLoader::new();
    let hymns = loader.load_index(&paths.hymns);
    let choruses = loader.load_index(&paths.choruses);

    match (hymns, choruses) {
        (Ok(hymns), Ok(choruses)) => Ok(Catalog::new(hymns, choruses)),
        (hymns, choruses) => {
            eprintln!("GUIADOR - Error al cargar datos");
            for err in [hymns.err(), choruses.err()].into_iter().flatten() {
                eprintln!("  {}", err);
            }
            bail!("could not load the reference tables")
        }
    }
}

/// One-line startup summary of the loaded tables.
fn catalog_summary(catalog: &Catalog) -> String {
    format!(
        "Himnos: {} ({}), Coros: {} ({})",
        catalog.hymns().table().len(),
        catalog.hymns().table().source().display(),
        catalog.choruses().table().len(),
        catalog.choruses().table().source().display()
    )
}
