use color_eyre::eyre::{Context, Result};
use log::{LevelFilter, info, warn};
use wikichm::{build_project, cli::Cli, compiler, config::Config};

fn main() -> Result<()> {
  color_eyre::install()?;

  let cli = Cli::parse_args();

  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Info
    })
    .write_style(env_logger::WriteStyle::Always)
    .init();

  let config = Config::load(&cli).wrap_err("Failed to load configuration")?;

  build_project(&config)?;

  if !config.compile {
    info!(
      "Skipping compilation, project left in {}",
      config.temp_dir.display()
    );
    return Ok(());
  }

  if compiler::compile(&config).wrap_err("Failed to compile the help file")? {
    info!("Help file written to {}", config.out_file.display());
  } else {
    warn!(
      "The compiler reported errors, {} may be incomplete",
      config.out_file.display()
    );
  }

  Ok(())
}
