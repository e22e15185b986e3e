use crate::cli::*;
use anyhow::{Context, bail};
use pastebox_core::types::{AppConfig, Config, DEFAULT_SYNTAX, ItemId, Syntax, sanitize_expiration};
use pastebox_core::{Reaper, Store, TracingSink};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// Loaded configuration plus what it takes to open the store.
struct Setup {
    app: AppConfig,
    config: Config,
    config_path: PathBuf,
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let ctx = load_context(&cli.config)?;
    match cli.command {
        Command::PutText(args) => cmd_put_text(&ctx, args),
        Command::PutImages(args) => cmd_put_images(&ctx, args),
        Command::Get(args) => cmd_get(&ctx, args),
        Command::Sweep => cmd_sweep(&ctx),
        Command::Reap(args) => cmd_reap(&ctx, args),
        Command::InitConfig => cmd_init_config(&ctx),
    }
}

fn load_context(config_path: &Path) -> anyhow::Result<Setup> {
    let loaded = AppConfig::load(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    for problem in loaded.validate() {
        warn!(%problem, "invalid config value; using default");
    }
    let app = loaded.with_defaults_for_invalid();

    let base_dir = config_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let config = app.to_config(base_dir);
    Ok(Setup {
        app,
        config,
        config_path: config_path.to_path_buf(),
    })
}

fn open_store(ctx: &Setup) -> anyhow::Result<Arc<Store>> {
    let store = Store::open(&ctx.config, Arc::new(TracingSink))
        .with_context(|| format!("opening {}", ctx.config.data_dir.display()))?;
    Ok(Arc::new(store))
}

fn read_upload(ctx: &Setup, source: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    let limit = ctx.app.storage.max_content_upload_bytes;
    let mut bytes = Vec::new();
    match source {
        Some(path) => std::fs::File::open(path)
            .with_context(|| format!("opening {}", path.display()))?
            .take(limit + 1)
            .read_to_end(&mut bytes)?,
        None => std::io::stdin().lock().take(limit + 1).read_to_end(&mut bytes)?,
    };
    if bytes.len() as u64 > limit {
        bail!("upload exceeds {limit} bytes");
    }
    Ok(bytes)
}

/// Every upload expires. A missing request gets the shortest lifetime.
fn expiration(requested: Option<i64>) -> u64 {
    sanitize_expiration(requested.unwrap_or(0))
}

fn cmd_put_text(ctx: &Setup, args: PutTextArgs) -> anyhow::Result<()> {
    let store = open_store(ctx)?;
    let content = read_upload(ctx, args.file.as_deref())?;
    let syntax = Syntax::new(args.syntax.unwrap_or_else(|| DEFAULT_SYNTAX.to_string()));

    let id = store.write_plain(
        args.source.as_deref(),
        &content,
        expiration(args.expire),
        Some(syntax),
    )?;
    println!("{id}");
    Ok(())
}

fn cmd_put_images(ctx: &Setup, args: PutImagesArgs) -> anyhow::Result<()> {
    let store = open_store(ctx)?;
    let expiration_secs = expiration(args.expire);
    let images = args
        .files
        .iter()
        .map(|path| read_upload(ctx, Some(path)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    if images.len() == 1 && !args.album {
        let record = store.write_image(args.source.as_deref(), &images[0], expiration_secs)?;
        println!("{}", record.id);
        return Ok(());
    }

    let id = store.write_album(args.source.as_deref(), &images, expiration_secs)?;
    println!("{id}");
    Ok(())
}

fn cmd_get(ctx: &Setup, args: GetArgs) -> anyhow::Result<()> {
    let store = open_store(ctx)?;
    let id: ItemId = args
        .id
        .parse()
        .with_context(|| format!("{:?} is not an identifier", args.id))?;

    if let Some(paste) = store.read_plain_by_identifier(&id)? {
        print!("{}", paste.content_lossy());
        return Ok(());
    }

    if let Some(album) = store.read_album_by_identifier(&id)? {
        for image in album {
            println!("{}\t{}", image.id, image.mime_type);
        }
        return Ok(());
    }

    if let Some(image) = store.read_image_by_identifier(&id)? {
        match args.output {
            Some(path) => std::fs::write(&path, &image.bytes)
                .with_context(|| format!("writing {}", path.display()))?,
            None => std::io::stdout().lock().write_all(&image.bytes)?,
        }
        return Ok(());
    }

    bail!("no item with identifier {id}")
}

fn cmd_sweep(ctx: &Setup) -> anyhow::Result<()> {
    let store = open_store(ctx)?;
    let reaper = Reaper::new(store, &ctx.config, Arc::new(TracingSink));
    let outcome = reaper.sweep_at(SystemTime::now())?;

    println!(
        "cleared: {}, pastes: {}, images: {}, albums: {}, failures: {}",
        outcome.cleared,
        outcome.pastes_removed,
        outcome.images_removed,
        outcome.albums_removed,
        outcome.failures,
    );
    Ok(())
}

fn cmd_reap(ctx: &Setup, args: ReapArgs) -> anyhow::Result<()> {
    let store = open_store(ctx)?;
    let interval = args
        .interval_secs
        .map(Duration::from_secs)
        .unwrap_or(ctx.config.sweep_interval);

    let reaper = Arc::new(Reaper::new(store, &ctx.config, Arc::new(TracingSink)));
    info!(
        data_dir = %ctx.config.data_dir.display(),
        interval_secs = interval.as_secs(),
        "reaper started"
    );
    reaper.spawn(interval)?.join();
    Ok(())
}

fn cmd_init_config(ctx: &Setup) -> anyhow::Result<()> {
    if ctx.config_path.exists() {
        bail!("{} already exists", ctx.config_path.display());
    }
    ctx.app
        .save(&ctx.config_path)
        .with_context(|| format!("writing {}", ctx.config_path.display()))?;
    println!("{}", ctx.config_path.display());
    Ok(())
}
