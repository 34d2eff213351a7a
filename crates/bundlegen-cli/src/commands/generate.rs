//! Generate command - compose an OLM bundle from the manifest tree

use bundlegen_core::{
    BundleComposer, BundleConfig, BundleReport, BundleVersion, DEFAULT_MANIFEST_DIR,
    DEFAULT_VERSION_BASE, image_reference,
};
use chrono::Utc;
use clap::Args;
use console::style;
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Operator name
    #[arg(short = 'n', long, env = "BUNDLEGEN_NAME")]
    pub name: String,

    /// Directory the `<version>` bundle directory is created in
    #[arg(short = 'o', long, env = "BUNDLEGEN_OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Operator image repository
    #[arg(short = 'i', long, env = "BUNDLEGEN_IMAGE")]
    pub image: String,

    /// Operator image tag
    #[arg(short = 't', long, env = "BUNDLEGEN_IMAGE_TAG")]
    pub image_tag: String,

    /// Version of the bundle (major.minor.commitcount-hash)
    #[arg(
        short = 'c',
        long,
        env = "BUNDLEGEN_CURRENT_VERSION",
        conflicts_with_all = ["commit_number", "commit_hash"],
        required_unless_present_all = ["commit_number", "commit_hash"]
    )]
    pub current_version: Option<String>,

    /// Commit count used to compose the version
    #[arg(long, env = "BUNDLEGEN_COMMIT_NUMBER", requires = "commit_hash")]
    pub commit_number: Option<String>,

    /// Short commit hash used to compose the version
    #[arg(long, env = "BUNDLEGEN_COMMIT_HASH", requires = "commit_number")]
    pub commit_hash: Option<String>,

    /// major.minor prefix of a composed version
    #[arg(long, env = "BUNDLEGEN_VERSION_BASE", default_value = DEFAULT_VERSION_BASE)]
    pub version_base: String,

    /// Version this bundle replaces
    #[arg(short = 'r', long, env = "BUNDLEGEN_REPLACES")]
    pub replaces: Option<String>,

    /// Version that may upgrade straight to this one (repeatable)
    #[arg(short = 's', long = "skip", env = "BUNDLEGEN_SKIPS", value_delimiter = ',')]
    pub skips: Vec<String>,

    /// Root of the operator manifest tree
    #[arg(short = 'm', long, env = "BUNDLEGEN_MANIFEST_DIR", default_value = DEFAULT_MANIFEST_DIR)]
    pub manifest_dir: PathBuf,

    /// CSV template file (default: the ClusterServiceVersion in the manifest tree)
    #[arg(long, env = "BUNDLEGEN_CSV_TEMPLATE")]
    pub csv_template: Option<PathBuf>,

    /// Compose and report without writing files
    #[arg(long, env = "BUNDLEGEN_DRY_RUN")]
    pub dry_run: bool,
}

impl GenerateArgs {
    /// The explicit version, or one composed from commit number and hash
    fn version(&self) -> Result<BundleVersion> {
        match (&self.current_version, &self.commit_number, &self.commit_hash) {
            (Some(version), _, _) => Ok(BundleVersion::parse(version)?),
            (None, Some(number), Some(hash)) => Ok(BundleVersion::from_commit(
                &self.version_base,
                number,
                hash,
            )?),
            _ => Err(CliError::usage(
                "either --current-version or both --commit-number and --commit-hash are required",
            )),
        }
    }

    fn config(&self) -> Result<BundleConfig> {
        let mut config = BundleConfig::new(
            &self.name,
            image_reference(&self.image, &self.image_tag),
            self.version()?,
            &self.output_dir,
        )
        .with_manifest_dir(&self.manifest_dir)
        .with_skips(&self.skips)?
        .with_dry_run(self.dry_run);

        if let Some(replaces) = &self.replaces {
            config = config.with_replaces(BundleVersion::parse(replaces)?);
        }
        if let Some(template) = &self.csv_template {
            config = config.with_csv_template(template);
        }

        Ok(config)
    }
}

pub fn run(args: &GenerateArgs) -> Result<()> {
    let config = args.config()?;
    tracing::debug!(
        operator = %config.operator_name,
        version = %config.version,
        "composing bundle"
    );

    print_header(&config);

    let report = BundleComposer::new(config).compose(Utc::now())?;

    print_files(&report);
    print_summary(&report);

    Ok(())
}

fn print_header(config: &BundleConfig) {
    println!();
    println!(
        "  {} {} {}",
        style("Bundlegen").bold().cyan(),
        style("─").dim(),
        style(config.csv_name()).dim()
    );
    println!();
    println!(
        "  {} {}",
        style("Manifests:").dim(),
        style(config.manifest_dir().display()).cyan()
    );
    if let Some(template) = &config.csv_template {
        println!(
            "  {} {}",
            style("Template:").dim(),
            style(template.display()).cyan()
        );
    }
    println!("  {} {}", style("Image:").dim(), style(&config.image).cyan());
    println!(
        "  {} {}",
        style("Target:").dim(),
        style(config.bundle_dir().display()).green()
    );
    println!();
}

fn print_files(report: &BundleReport) {
    println!("  {}", style("Bundle Files").bold());
    println!("  {}", style("────────────").dim());

    println!(
        "  {} {} {}",
        style("✓").green().bold(),
        relative(&report.csv_path, &report.bundle_dir).display(),
        style("(ClusterServiceVersion)").dim()
    );
    for path in &report.resource_paths {
        println!(
            "  {} {}",
            style("→").blue(),
            relative(path, &report.bundle_dir).display()
        );
    }

    println!();
}

fn print_summary(report: &BundleReport) {
    println!("  {}", style("Summary").bold());
    println!("  {}", style("───────").dim());

    println!(
        "  {} cluster permission{}",
        style(format!("{:>3}", report.cluster_permissions)).green().bold(),
        plural(report.cluster_permissions)
    );
    println!(
        "  {} namespaced permission{}",
        style(format!("{:>3}", report.permissions)).green().bold(),
        plural(report.permissions)
    );
    println!(
        "  {} owned CRD version{}",
        style(format!("{:>3}", report.owned_crds)).green().bold(),
        plural(report.owned_crds)
    );
    println!(
        "  {} additional resource{}",
        style(format!("{:>3}", report.resource_paths.len())).blue().bold(),
        plural(report.resource_paths.len())
    );
    println!();

    if report.dry_run {
        println!(
            "  {} {}",
            style("ℹ").cyan(),
            style("Dry run mode - no files were written").dim()
        );
    } else {
        println!(
            "{} Bundle written to {}",
            style("✓").green().bold(),
            report.bundle_dir.display()
        );
    }
    println!();
}

fn relative<'a>(path: &'a Path, base: &Path) -> &'a Path {
    path.strip_prefix(base).unwrap_or(path)
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}
