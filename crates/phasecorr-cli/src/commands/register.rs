use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use phasecorr_core::fuse::overlay_fuse;
use phasecorr_core::parallel::build_pool;
use phasecorr_core::{
    register_pcm, MinOverlap, PeakFilter, RegistrationParams, ShiftRangeFilter,
};

use crate::commands::config;
use crate::imageio::{load_gray, save_gray16};
use crate::pcm::build_pcm;
use crate::summary::print_registration_summary;

#[derive(Args)]
pub struct RegisterArgs {
    /// Reference image
    pub img1: PathBuf,

    /// Image whose shift relative to the reference is estimated
    pub img2: PathBuf,

    /// TOML parameter file (see `phasecorr config`)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of PCM maxima to examine
    #[arg(long)]
    pub peaks: Option<usize>,

    /// Skip subpixel refinement of the PCM maxima
    #[arg(long)]
    pub no_subpixel: bool,

    /// Score subpixel shifts on an interpolated second image
    #[arg(long)]
    pub interpolate: bool,

    /// Minimum number of overlapping pixels for a shift to be scored
    #[arg(long)]
    pub min_overlap: Option<u64>,

    /// Largest accepted absolute shift per axis, rows first (e.g. 40,60)
    #[arg(long, value_delimiter = ',')]
    pub max_shift: Option<Vec<f64>>,

    /// Worker threads (default: all cores)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Write the second image pasted over the first at the selected shift
    #[arg(long)]
    pub fused: Option<PathBuf>,

    /// Number of ranked hypotheses to print
    #[arg(long, default_value = "8")]
    pub show: usize,
}

fn resolve_params(args: &RegisterArgs) -> Result<RegistrationParams> {
    let mut params = match args.config {
        Some(ref path) => config::load(path)?,
        None => RegistrationParams::default(),
    };
    if let Some(peaks) = args.peaks {
        params.max_peaks = peaks;
    }
    if args.no_subpixel {
        params.subpixel = false;
    }
    if args.interpolate {
        params.interpolate_subpixel = true;
    }
    if let Some(min) = args.min_overlap {
        params.min_overlap = MinOverlap::Total(min);
    }
    if args.threads.is_some() {
        params.threads = args.threads;
    }
    Ok(params)
}

pub fn run(args: &RegisterArgs) -> Result<()> {
    let params = resolve_params(args)?;
    let img1 = load_gray(&args.img1)?.into_dyn();
    let img2 = load_gray(&args.img2)?.into_dyn();
    let pool = build_pool(params.threads).context("Failed to start worker threads")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));

    spinner.set_message("Computing phase correlation matrix...");
    let pcm = build_pcm(
        &img1.view(),
        &img2.view(),
        params.extension_factor,
        params.normalization_threshold,
        &pool,
    )?;

    spinner.set_message("Scoring shift hypotheses...");
    let filter = args.max_shift.as_deref().map(ShiftRangeFilter::symmetric);
    let registration = register_pcm(
        pcm.view(),
        img1.view(),
        img2.view(),
        &params,
        filter.as_ref().map(|f| f as &dyn PeakFilter),
        &pool,
    )?;
    spinner.finish_and_clear();

    print_registration_summary(
        &args.img1,
        &args.img2,
        pcm.shape(),
        &params,
        &registration,
        args.show,
    );

    if let Some(ref path) = args.fused {
        let shift = registration
            .best()
            .and_then(|best| best.shift.clone())
            .context("No shift was found, nothing to fuse")?;
        let (fused, origin) = overlay_fuse(&img1.view(), &img2.view(), &shift, &pool)?;
        save_gray16(&fused, path)?;
        println!(
            "Fused preview saved to {} (origin {:?})",
            path.display(),
            origin
        );
    }

    Ok(())
}
