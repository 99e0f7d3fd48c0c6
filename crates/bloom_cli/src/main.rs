use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use bloom_core::{version_string, Bloom, BloomConfig};

mod visualize;

#[derive(Parser)]
#[command(name = "bloom", version, about = "Bloom filter tool: create, query, merge, inspect")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Create an empty filter file
    Create {
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        entries: Option<u32>,
        #[arg(long)]
        error: Option<f64>,
        /// JSON config ({"entries": N, "error": E}); flags override it
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Add elements and save the filter back
    Add {
        #[arg(long)]
        filter: PathBuf,
        #[arg(required = true)]
        elems: Vec<String>,
    },

    /// Check elements for (probable) membership
    Check {
        #[arg(long)]
        filter: PathBuf,
        #[arg(required = true)]
        elems: Vec<String>,
    },

    /// Erase all elements, keeping the configuration
    Reset {
        #[arg(long)]
        filter: PathBuf,
    },

    /// OR `src` into `dest`; written to `--out` or back to `dest`
    Merge {
        #[arg(long)]
        dest: PathBuf,
        #[arg(long)]
        src: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    Info {
        #[arg(long)]
        filter: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Insert random elements and report the collision rate
    Collide {
        #[arg(long)]
        entries: u32,
        #[arg(long)]
        error: f64,
        #[arg(long)]
        count: u32,
        #[arg(long, default_value_t = 32)]
        elem_size: usize,
        #[arg(long)]
        seed: Option<u64>,
        /// fail when the observed rate exceeds the target error
        #[arg(long, default_value_t = false)]
        check_error: bool,
    },

    /// Timed insertion loop
    Perf {
        #[arg(long)]
        entries: u32,
        #[arg(long)]
        count: u32,
    },

    /// Render the bitmap as a PNG
    Visualize {
        /// existing filter file; otherwise a random one is built from the flags below
        #[arg(long)]
        filter: Option<PathBuf>,
        #[arg(long)]
        entries: Option<u32>,
        #[arg(long)]
        error: Option<f64>,
        #[arg(long, default_value_t = 0)]
        elements: u32,
        #[arg(long)]
        out: PathBuf,
    },
}

fn load(path: &Path) -> Result<Bloom> {
    Bloom::load(path).with_context(|| format!("loading {}", path.display()))
}

fn save(bloom: &Bloom, path: &Path) -> Result<()> {
    bloom
        .save(path)
        .with_context(|| format!("saving {}", path.display()))
}

fn resolve_config(config: Option<&Path>, entries: Option<u32>, error: Option<f64>) -> Result<BloomConfig> {
    let mut cfg = match config {
        Some(p) => BloomConfig::load(p).with_context(|| format!("reading config {}", p.display()))?,
        None => BloomConfig::default(),
    };
    if let Some(e) = entries {
        cfg.entries = e;
    }
    if let Some(e) = error {
        cfg.error = e;
    }
    Ok(cfg)
}

fn random_block(rng: &mut StdRng, size: usize) -> Vec<u8> {
    let mut block = vec![0u8; size];
    rng.fill_bytes(&mut block);
    block
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

fn collide(entries: u32, error: f64, count: u32, elem_size: usize, seed: Option<u64>, check_error: bool) -> Result<()> {
    if elem_size == 0 {
        bail!("--elem-size must be at least 1");
    }
    let mut bloom = Bloom::with_params(entries, error)?;
    println!("{}", bloom.info());

    let mut rng = rng_from(seed);
    let mut saved = Vec::with_capacity(count as usize);
    let mut collisions = 0u64;
    for _ in 0..count {
        let block = random_block(&mut rng, elem_size);
        if bloom.add(&block)? {
            collisions += 1;
        }
        saved.push(block);
    }
    let observed = if count == 0 { 0.0 } else { collisions as f64 / f64::from(count) };
    println!(
        "entries: {entries}, error: {error:.6}, count: {count}, coll: {collisions}, observed: {observed:.6}, \
         estimate: {:.6}, bytes: {}",
        bloom.params().estimated_fpp(u64::from(count)),
        bloom.bytes()
    );

    // survive a serialization round-trip with nothing lost
    let reloaded = Bloom::from_bytes(&bloom.to_bytes()?)?;
    for block in &saved {
        if !reloaded.check(block)? {
            bail!("element saved in filter is not there after reload");
        }
    }
    debug!(elements = saved.len(), "reload validated");

    if check_error && observed > error {
        bail!("expected error {error} but observed {observed}");
    }
    Ok(())
}

fn perf(entries: u32, count: u32) -> Result<()> {
    let mut bloom = Bloom::with_params(entries, 0.001)?;
    println!("{}", bloom.info());
    let mut collisions = 0u64;
    let before = Instant::now();
    for i in 0..count {
        if bloom.add(&i.to_le_bytes())? {
            collisions += 1;
        }
    }
    let ms = before.elapsed().as_millis();
    println!(
        "Added {count} elements of size {}, took {ms} ms (collisions={collisions})",
        std::mem::size_of::<u32>()
    );
    println!("{entries},{},{ms}", bloom.bytes());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Create { out, entries, error, config } => {
            let cfg = resolve_config(config.as_deref(), entries, error)?;
            let bloom = Bloom::from_config(&cfg)?;
            save(&bloom, &out)?;
            println!(
                "created: {} (entries={} error={} bytes={} hashes={})",
                out.display(),
                bloom.entries(),
                bloom.error(),
                bloom.bytes(),
                bloom.hashes()
            );
        }
        Cmd::Add { filter, elems } => {
            let mut bloom = load(&filter)?;
            for e in &elems {
                let present = bloom.add(e.as_bytes())?;
                println!("{e}: {}", if present { "present" } else { "added" });
            }
            save(&bloom, &filter)?;
        }
        Cmd::Check { filter, elems } => {
            let bloom = load(&filter)?;
            for e in &elems {
                let present = bloom.check(e.as_bytes())?;
                println!("{e}: {}", if present { "present" } else { "absent" });
            }
        }
        Cmd::Reset { filter } => {
            let mut bloom = load(&filter)?;
            bloom.reset()?;
            save(&bloom, &filter)?;
            println!("reset: {}", filter.display());
        }
        Cmd::Merge { dest, src, out } => {
            let mut d = load(&dest)?;
            let s = load(&src)?;
            d.merge(&s)
                .with_context(|| format!("merging {} into {}", src.display(), dest.display()))?;
            let target = out.unwrap_or(dest);
            save(&d, &target)?;
            println!("merged: {}", target.display());
        }
        Cmd::Info { filter, json } => {
            let info = load(&filter)?.info();
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("{info}");
            }
        }
        Cmd::Collide { entries, error, count, elem_size, seed, check_error } => {
            collide(entries, error, count, elem_size, seed, check_error)?;
        }
        Cmd::Perf { entries, count } => perf(entries, count)?,
        Cmd::Visualize { filter, entries, error, elements, out } => {
            let bloom = match filter {
                Some(p) => load(&p)?,
                None => {
                    let cfg = resolve_config(None, entries, error)?;
                    let mut bloom = Bloom::from_config(&cfg)?;
                    let mut rng = StdRng::from_os_rng();
                    let mut n = rng.next_u64();
                    for _ in 0..elements {
                        bloom.add(&n.to_le_bytes())?;
                        n = n.wrapping_add(1);
                    }
                    bloom
                }
            };
            let r = visualize::bloom_to_png(&bloom, &out)?;
            info!(side = r.side, width = r.image.width(), "bitmap rendered");
            println!(
                "In bitfield, {} out of {} bytes are nonzero; image written to {}",
                r.nonzero,
                bloom.bytes(),
                out.display()
            );
        }
    }
    debug!(version = version_string(), "done");
    Ok(())
}
