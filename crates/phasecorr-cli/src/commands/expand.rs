use anyhow::{Context, Result};
use clap::Args;
use phasecorr_core::ShiftGeometry;

use crate::summary::print_hypotheses;

#[derive(Args)]
pub struct ExpandArgs {
    /// PCM extent, comma separated (e.g. 100,100)
    #[arg(long)]
    pub pcm: String,

    /// Extent of the first image
    #[arg(long)]
    pub img1: String,

    /// Extent of the second image
    #[arg(long)]
    pub img2: String,

    /// Integer PCM position of the peak
    #[arg(long, allow_hyphen_values = true)]
    pub peak: String,
}

fn parse_list<T: std::str::FromStr>(text: &str, what: &str) -> Result<Vec<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    text.split(',')
        .map(|part| {
            part.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid {what} component '{part}'"))
        })
        .collect()
}

pub fn run(args: &ExpandArgs) -> Result<()> {
    let pcm: Vec<usize> = parse_list(&args.pcm, "PCM extent")?;
    let img1: Vec<usize> = parse_list(&args.img1, "image extent")?;
    let img2: Vec<usize> = parse_list(&args.img2, "image extent")?;
    let peak: Vec<i64> = parse_list(&args.peak, "peak position")?;

    let geometry = ShiftGeometry::new(&pcm, &img1, &img2)?;
    anyhow::ensure!(
        peak.len() == geometry.ndim(),
        "Peak has {} components, PCM has {} axes",
        peak.len(),
        geometry.ndim()
    );

    print_hypotheses(geometry.offset(), &geometry.possible_shifts(&peak));
    Ok(())
}
