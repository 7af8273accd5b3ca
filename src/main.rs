use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use watermark_studio::config::StudioConfig;
use watermark_studio::error::StudioError;
use watermark_studio::studio::{LoadOutcome, Studio};
use watermark_studio::transform::{encode_png, CropSelection};
use watermark_studio::watermark::PresetLibrary;

/// Watermark Studio - stamp text watermarks onto images
#[derive(Parser, Debug)]
#[command(name = "watermark-studio")]
#[command(version, about, long_about = None)]
struct Args {
    /// Image to watermark (PNG, JPEG, WebP or GIF)
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the watermarked PNG
    #[arg(short, long)]
    output: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Add a layer with this text, using the configured defaults
    #[arg(short, long)]
    text: Vec<String>,

    /// JSON file with saved presets
    #[arg(long)]
    presets: Option<PathBuf>,

    /// Add a layer from the named preset (repeatable)
    #[arg(long, requires = "presets")]
    preset: Vec<String>,

    /// Crop selection as x0,y0,x1,y1 (two drag points)
    #[arg(long, value_parser = parse_crop)]
    crop: Option<[f64; 4]>,

    /// Size the crop selection was made at, as WIDTHxHEIGHT
    #[arg(long, value_parser = parse_size, requires = "crop")]
    display_size: Option<(f64, f64)>,

    /// Resize the (cropped) image to WIDTHxHEIGHT
    #[arg(long, value_parser = parse_size)]
    resize: Option<(f64, f64)>,

    /// Also write an image-library entry (original + watermarked data URIs) as JSON
    #[arg(long)]
    library_entry: Option<PathBuf>,
}

fn parse_size(raw: &str) -> Result<(f64, f64), String> {
    let (w, h) = raw
        .split_once(|c| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", raw))?;
    let w = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
    let h = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
    Ok((w, h))
}

fn parse_crop(raw: &str) -> Result<[f64; 4], String> {
    let values: Vec<f64> = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("expected four numbers x0,y0,x1,y1, got '{}'", raw))?;
    values
        .try_into()
        .map_err(|_| format!("expected four numbers x0,y0,x1,y1, got '{}'", raw))
}

fn load_config(path: Option<&PathBuf>) -> Result<StudioConfig, StudioError> {
    let config = match path {
        Some(path) => StudioConfig::from_file(path).map_err(StudioError::Config)?,
        None => StudioConfig::default(),
    };
    config.validate().map_err(StudioError::Config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_ref()).context("Failed to load configuration")?;

    if let Err(e) = watermark_studio::logging::init_subscriber(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    tracing::info!(
        config_file = ?args.config,
        configured_layers = config.layers.len(),
        max_pixels = config.transform.max_pixels,
        "Configuration loaded successfully"
    );

    let mut studio = Studio::from_config(&config)?;

    let bytes = std::fs::read(&args.input)
        .map_err(StudioError::from)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let pending = studio.begin_load(bytes)?;
    match studio
        .finish_load(pending)
        .await
        .with_context(|| format!("Failed to load {}", args.input.display()))?
    {
        LoadOutcome::Applied { width, height } => {
            tracing::info!(width = width, height = height, input = %args.input.display(), "Loaded input image")
        }
        LoadOutcome::Superseded => bail!("Image load was superseded"),
    }

    if let Some([x0, y0, x1, y1]) = args.crop {
        let mut selection = CropSelection::new((x0, y0), (x1, y1));
        if let Some((w, h)) = args.display_size {
            selection = selection.displayed_at(w, h);
        }
        studio.crop(&selection).context("Failed to crop image")?;
    }

    if let Some((w, h)) = args.resize {
        studio.resize(w, h).context("Failed to resize image")?;
    }

    for preset in &config.layers {
        let id = studio.add_layer()?;
        studio.apply_preset_to_layer(preset, &id)?;
    }

    for text in &args.text {
        let id = studio.add_layer()?;
        studio.layer_mut(&id)?.text = text.clone();
    }

    if let Some(path) = &args.presets {
        let json = std::fs::read_to_string(path)
            .map_err(StudioError::from)
            .with_context(|| format!("Failed to read presets from {}", path.display()))?;
        let library = PresetLibrary::from_json(&json)?;
        for name in &args.preset {
            let preset = library
                .get(name)
                .ok_or_else(|| StudioError::UnknownPreset(name.clone()))?;
            let id = studio.add_layer()?;
            studio.apply_preset_to_layer(preset, &id)?;
        }
    }

    let watermarked = studio.watermarked_image().context("Failed to render watermarks")?;
    let png = encode_png(&watermarked)?;
    std::fs::write(&args.output, png)
        .map_err(StudioError::from)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    tracing::info!(
        output = %args.output.display(),
        width = watermarked.width(),
        height = watermarked.height(),
        layers = studio.layers().len(),
        "Wrote watermarked image"
    );

    if let Some(path) = &args.library_entry {
        let entry = studio.export_current()?;
        let json = serde_json::to_string_pretty(&entry)?;
        std::fs::write(path, json)
            .map_err(StudioError::from)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(())
}
