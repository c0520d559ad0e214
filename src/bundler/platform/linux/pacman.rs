//! Arch Linux package (.pkg.tar.zst) assembler.
//!
//! `makepkg` runs against a generated `PKGBUILD` whose `package()` copies the
//! already staged tree into `$pkgdir`; nothing is downloaded or compiled.

use super::{create_stage_root, run_packaging_tool, stage_filesystem, staging_tempdir};
use crate::{
    bail,
    bundler::{
        error::{ErrorExt, Result},
        settings::{Arch, Settings},
    },
};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Release number of every package we build.
pub const PKGREL: u32 = 1;

/// Package extension requested from makepkg.
pub const PKGEXT: &str = ".pkg.tar.zst";

/// Directory next to the PKGBUILD holding the staged tree.
const STAGED_TREE_DIR: &str = "pkgroot";

/// `<name>-<version>-<rel>-<arch>.pkg.tar.zst`
pub fn package_file_name(name: &str, version: &str, arch: Arch) -> String {
    format!("{name}-{version}-{PKGREL}-{}{PKGEXT}", arch.pacman_name())
}

/// Quotes a value for a bash single-quoted string.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Renders the `PKGBUILD`.
pub fn pkgbuild(settings: &Settings) -> String {
    let summary = settings.description().lines().next().unwrap_or_default().trim();

    let mut out = String::new();
    out.push_str(&format!("# Maintainer: {}\n", settings.maintainer()));
    out.push_str(&format!("pkgname={}\n", settings.product_name()));
    out.push_str(&format!("pkgver={}\n", settings.version_string()));
    out.push_str(&format!("pkgrel={PKGREL}\n"));
    out.push_str(&format!("pkgdesc={}\n", quote(summary)));
    out.push_str(&format!("arch=({})\n", quote(settings.binary_arch().pacman_name())));
    if let Some(homepage) = settings.homepage() {
        out.push_str(&format!("url={}\n", quote(homepage)));
    }
    out.push_str(&format!("license=({})\n", quote(settings.license())));
    out.push_str("options=('!strip' '!debug')\n");
    out.push('\n');
    out.push_str("package() {\n");
    out.push_str(&format!("    cp -a \"$startdir/{STAGED_TREE_DIR}/.\" \"$pkgdir/\"\n"));
    out.push_str("}\n");
    out
}

/// Bundle project as an Arch Linux package.
///
/// # Process
///
/// 1. Stages the tree under `pkgroot/` in a temporary directory
/// 2. Writes `PKGBUILD` next to it
/// 3. Runs `makepkg --force --nodeps --skipinteg` there with `PKGDEST` set
///    to the output directory
pub async fn bundle_project(settings: &Settings, makepkg: &Path) -> Result<PathBuf> {
    let file_name = package_file_name(
        settings.product_name(),
        settings.version_string(),
        settings.binary_arch(),
    );
    log::info!("Building Arch package {file_name}");

    let temp = staging_tempdir(settings, "pyship-arch-")?;
    let build_dir = create_stage_root(temp.path(), settings.product_name()).await?;
    let root = create_stage_root(&build_dir, STAGED_TREE_DIR).await?;

    stage_filesystem(settings, &root).await?;

    let pkgbuild_path = build_dir.join("PKGBUILD");
    tokio::fs::write(&pkgbuild_path, pkgbuild(settings))
        .await
        .fs_context("writing PKGBUILD", &pkgbuild_path)?;

    let out_dir = std::path::absolute(settings.project_out_directory())
        .fs_context("resolving output directory", settings.project_out_directory())?;
    tokio::fs::create_dir_all(&out_dir)
        .await
        .fs_context("creating output directory", &out_dir)?;
    let package_path = out_dir.join(&file_name);

    let mut cmd = Command::new(makepkg);
    cmd.args(["--force", "--nodeps", "--skipinteg"])
        .current_dir(&build_dir)
        .env("PKGDEST", &out_dir)
        .env("PKGEXT", PKGEXT);
    run_packaging_tool(cmd, "makepkg").await?;

    if !package_path.is_file() {
        bail!(
            "makepkg succeeded but {} was not created",
            package_path.display()
        );
    }

    log::info!("✓ Created Arch package: {}", package_path.display());
    Ok(package_path)
}
