//! Debian package (.deb) assembler.

use super::{create_stage_root, run_packaging_tool, stage_filesystem, staging_tempdir};
use crate::{
    bail,
    bundler::{
        error::{ErrorExt, Result},
        settings::{Arch, Settings},
        utils::fs,
    },
};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// `<name>_<version>_<debarch>.deb`
pub fn package_file_name(name: &str, version: &str, arch: Arch) -> String {
    format!("{name}_{version}_{}.deb", arch.deb_name())
}

/// Renders `DEBIAN/control`.
///
/// `installed_size` is in bytes; the manifest wants KiB, rounded up.
pub fn control_file(settings: &Settings, installed_size: u64) -> String {
    let mut control = String::new();
    control.push_str(&format!("Package: {}\n", settings.product_name()));
    control.push_str(&format!("Version: {}\n", settings.version_string()));
    control.push_str(&format!("Architecture: {}\n", settings.binary_arch().deb_name()));
    control.push_str(&format!("Maintainer: {}\n", settings.maintainer()));
    control.push_str(&format!("Installed-Size: {}\n", installed_size.div_ceil(1024)));
    control.push_str(&format!("Section: {}\n", settings.section()));
    control.push_str("Priority: optional\n");
    if !settings.depends().is_empty() {
        control.push_str(&format!("Depends: {}\n", settings.depends().join(", ")));
    }
    if let Some(homepage) = settings.homepage() {
        control.push_str(&format!("Homepage: {homepage}\n"));
    }
    // Continuation lines would need a leading space; keep the summary only.
    let summary = settings.description().lines().next().unwrap_or_default().trim();
    control.push_str(&format!("Description: {summary}\n"));
    control
}

/// Bundle project as a Debian package.
///
/// # Process
///
/// 1. Stages `usr/bin` and `usr/share` in a temporary directory
/// 2. Writes `DEBIAN/control`
/// 3. Runs `dpkg-deb --build --root-owner-group`
///
/// The staging directory is removed on every exit path.
pub async fn bundle_project(settings: &Settings, dpkg_deb: &Path) -> Result<PathBuf> {
    let file_name = package_file_name(
        settings.product_name(),
        settings.version_string(),
        settings.binary_arch(),
    );
    log::info!("Building Debian package {file_name}");

    let temp = staging_tempdir(settings, "pyship-deb-")?;
    let root = create_stage_root(temp.path(), settings.product_name()).await?;

    stage_filesystem(settings, &root).await?;
    let installed_size = fs::tree_size(&root).await?;

    let debian_dir = root.join("DEBIAN");
    tokio::fs::create_dir_all(&debian_dir)
        .await
        .fs_context("creating control directory", &debian_dir)?;
    fs::set_mode(&debian_dir, 0o755).await?;
    let control_path = debian_dir.join("control");
    tokio::fs::write(&control_path, control_file(settings, installed_size))
        .await
        .fs_context("writing control file", &control_path)?;

    let out_dir = settings.project_out_directory();
    tokio::fs::create_dir_all(out_dir)
        .await
        .fs_context("creating output directory", out_dir)?;
    let package_path = out_dir.join(&file_name);

    let mut cmd = Command::new(dpkg_deb);
    cmd.args(["--build", "--root-owner-group"])
        .arg(&root)
        .arg(&package_path);
    run_packaging_tool(cmd, "dpkg-deb").await?;

    if !package_path.is_file() {
        bail!(
            "dpkg-deb succeeded but {} was not created",
            package_path.display()
        );
    }

    log::info!("✓ Created Debian package: {}", package_path.display());
    Ok(package_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{PackageSettings, SettingsBuilder};

    fn settings(out: &Path, binary: &Path) -> Settings {
        builder(out, binary).build().unwrap()
    }

    fn builder(out: &Path, binary: &Path) -> SettingsBuilder {
        SettingsBuilder::new()
            .project_out_directory(out)
            .binary(binary)
            .package_settings(PackageSettings {
                product_name: "voicebox".into(),
                version: "2.3.1".into(),
                description: "Offline speech toolkit\nwith a second line".into(),
                maintainer: "Jane Doe <jane@example.com>".into(),
                license: "MIT".into(),
                depends: vec!["libc6 (>= 2.31)".into(), "libgomp1".into()],
                ..Default::default()
            })
            .arch(Arch::X86_64)
    }

    #[test]
    fn file_name_uses_debian_arch() {
        assert_eq!(
            package_file_name("voicebox", "2.3.1", Arch::X86_64),
            "voicebox_2.3.1_amd64.deb"
        );
        assert!(package_file_name("voicebox", "2.3.1", Arch::AArch64).ends_with("_2.3.1_arm64.deb"));
    }

    #[test]
    fn control_file_has_required_fields() {
        let s = settings(Path::new("/out"), Path::new("/bin/app"));
        let control = control_file(&s, 2049);
        assert!(control.contains("Package: voicebox\n"));
        assert!(control.contains("Version: 2.3.1\n"));
        assert!(control.contains("Architecture: amd64\n"));
        assert!(control.contains("Maintainer: Jane Doe <jane@example.com>\n"));
        assert!(control.contains("Installed-Size: 3\n"));
        assert!(control.contains("Section: misc\n"));
        assert!(control.contains("Depends: libc6 (>= 2.31), libgomp1\n"));
        assert!(control.ends_with("Description: Offline speech toolkit\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn builds_with_stub_dpkg_deb() {
        use std::os::unix::fs::PermissionsExt;

        let work = tempfile::tempdir().unwrap();
        let binary = work.path().join("EXECUTABLE");
        std::fs::write(&binary, b"bin").unwrap();

        // $3 is the staged root, $4 the output file.
        let tool = work.path().join("dpkg-deb");
        std::fs::write(
            &tool,
            "#!/bin/sh\n\
             test -f \"$3/DEBIAN/control\" || exit 3\n\
             test -x \"$3/usr/bin/voicebox\" || exit 4\n\
             cp \"$3/DEBIAN/control\" \"$4\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let out = work.path().join("dist");
        let s = settings(&out, &binary);
        let path = bundle_project(&s, &tool).await.unwrap();

        assert_eq!(path, out.join("voicebox_2.3.1_amd64.deb"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Package: voicebox"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_dpkg_deb_leaves_no_staging_tree() {
        use std::os::unix::fs::PermissionsExt;

        let work = tempfile::tempdir().unwrap();
        let staging = tempfile::tempdir().unwrap();
        let binary = work.path().join("EXECUTABLE");
        std::fs::write(&binary, b"bin").unwrap();

        let tool = work.path().join("dpkg-deb");
        std::fs::write(
            &tool,
            "#!/bin/sh\n\
             echo 'dpkg-deb: error: broken control' >&2\n\
             exit 2\n",
        )
        .unwrap();
        std::fs::set_permissions(&tool, std::fs::Permissions::from_mode(0o755)).unwrap();

        let s = builder(&work.path().join("dist"), &binary)
            .staging_directory(staging.path())
            .build()
            .unwrap();

        let err = bundle_project(&s, &tool).await.unwrap_err();
        assert!(err.to_string().contains("broken control"), "{err}");
        assert!(std::fs::read_dir(staging.path()).unwrap().next().is_none());
    }
}
