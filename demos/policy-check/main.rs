//
// Copyright 2026 The Sigstore Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use signature_policy::config::Policy;
use signature_policy::image::{DirImageSource, ImageSource, OciReference};
use signature_policy::policy::PolicyEvaluator;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Check whether an image stored inside of a directory can be used
/// according to a signature policy.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Path to the JSON policy
    #[clap(short, long, default_value = "/etc/containers/policy.json")]
    policy: PathBuf,

    /// Reference the image is evaluated under
    #[clap(short, long, required(false))]
    reference: Option<OciReference>,

    /// Print the requirements used for the image
    #[clap(long)]
    show_requirements: bool,

    /// Enable verbose mode
    #[clap(short, long)]
    verbose: bool,

    /// Directory holding `manifest.json` and the `signature-N` files
    image_dir: PathBuf,
}

fn run_app(cli: &Cli) -> Result<bool> {
    let policy = Policy::from_file(&cli.policy)
        .with_context(|| format!("cannot load policy {}", cli.policy.display()))?;
    let evaluator = PolicyEvaluator::new(policy);
    let image = DirImageSource::new(&cli.image_dir, cli.reference.clone());

    if cli.show_requirements {
        println!("Requirements for transport {}:", image.transport_name());
        for requirement in evaluator.requirements_for(&image) {
            println!("  - {requirement}");
        }
    }

    match evaluator.is_running_image_allowed(&image, &CancellationToken::new()) {
        Ok(()) => Ok(true),
        Err(e) if e.is_rejection() => {
            warn!(error = %e, "image rejected");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn main() {
    let cli = Cli::parse();

    let level_filter = if cli.verbose { "debug" } else { "info" };
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_filter));
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    match run_app(&cli) {
        Ok(true) => {
            info!(image = %cli.image_dir.display(), "image can be used");
            println!("Image allowed");
        }
        Ok(false) => {
            println!("Image rejected");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e:?}");
            std::process::exit(2);
        }
    }
}
