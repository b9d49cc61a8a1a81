use super::{install_mode, resolve_backend};
use clap::Args;
use console::style;
use miette::Context;
use nodestrap_installer::{InstallBatch, PackageSpec};
use nodestrap_scaffold::{
    customize_env_file, customize_package_manifest, customize_readme, display_project_config,
    merge_app_config, DepsManifest, DownloadTemplate, ExtractTemplate, GatherProjectConfig,
    InitOverrides, PlaceholderError, ProjectConfig, APP_CONFIG_FILE, LOCAL_TEMPLATE_PATH,
    TEMPLATE_BASE_URL,
};
use std::path::Path;

const LOGO: &str = r"
███╗   ██╗ ██████╗ ██████╗ ███████╗███████╗████████╗██████╗  █████╗ ██████╗
████╗  ██║██╔═══██╗██╔══██╗██╔════╝██╔════╝╚══██╔══╝██╔══██╗██╔══██╗██╔══██╗
██╔██╗ ██║██║   ██║██║  ██║█████╗  ███████╗   ██║   ██████╔╝███████║██████╔╝
██║╚██╗██║██║   ██║██║  ██║██╔══╝  ╚════██║   ██║   ██╔══██╗██╔══██║██╔═══╝
██║ ╚████║╚██████╔╝██████╔╝███████╗███████║   ██║   ██║  ██║██║  ██║██║
╚═╝  ╚═══╝ ╚═════╝ ╚═════╝ ╚══════╝╚══════╝   ╚═╝   ╚═╝  ╚═╝╚═╝  ╚═╝╚═╝
";

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Project name. Prompted for when omitted.
    #[clap(long)]
    pub name: Option<String>,

    /// Project description.
    #[clap(long)]
    pub description: Option<String>,

    /// Source language, `ts` or `js`.
    #[clap(long)]
    pub lang: Option<String>,

    /// Development server port.
    #[clap(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Initial version of the generated package.
    #[clap(long = "app-version")]
    pub app_version: Option<String>,

    /// Short alias recorded in the app configuration.
    #[clap(long)]
    pub alias: Option<String>,

    /// Author recorded in the app configuration.
    #[clap(long)]
    pub author: Option<String>,

    /// Package manager preference: `b` forces bun, `n` forces npm.
    #[clap(short, long)]
    pub mode: Option<String>,

    /// Abort with a non-zero status on the first failed dependency.
    #[clap(long)]
    pub strict: bool,

    /// Fetch the template archive from a different host.
    #[clap(long, default_value = TEMPLATE_BASE_URL)]
    pub template_url: String,
}

impl InitArgs {
    /// Execute the subcommand.
    pub async fn run(self, workdir: &Path) -> miette::Result<()> {
        let InitArgs {
            name,
            description,
            lang,
            port,
            app_version,
            alias,
            author,
            mode,
            strict,
            template_url,
        } = self;

        println!("{}", style(LOGO).cyan());
        println!("{}", style("🚀 Creating a new Nodestrap project...").green());

        let config = GatherProjectConfig {
            workdir,
            overrides: InitOverrides {
                name,
                description,
                language: lang,
                port,
                version: app_version,
                alias,
                author,
            },
        }
        .run()
        .wrap_err("collect the project configuration")?;

        display_project_config(&config);

        let project_dir = config.project_dir(workdir);

        println!(
            "  {}",
            style(format!("→ Platform: {}/{}", std::env::consts::OS, std::env::consts::ARCH))
                .dim(),
        );

        let http_client = reqwest::Client::new();
        let archive = DownloadTemplate {
            http_client: &http_client,
            base_url: &template_url,
            local_fallback: &workdir.join(LOCAL_TEMPLATE_PATH),
        }
        .run()
        .await
        .wrap_err("download the project template")?;

        ExtractTemplate {
            archive_path: archive.path(),
            project_dir: &project_dir,
            language: config.language,
        }
        .run()
        .wrap_err("extract the project template")?;
        println!("  {} Template extracted", style("✓").green());

        customize_template(&project_dir, &config);

        // A template without a dependency manifest scaffolds fine, there is
        // just nothing to install.
        match DepsManifest::load_and_remove(&project_dir) {
            Ok(manifest) => {
                install_dependencies(&project_dir, manifest, mode.as_deref(), strict).await?;
            }
            Err(error) => {
                tracing::warn!(target: "nodestrap::scaffold", %error, "No dependency manifest");
                println!(
                    "  {} No dependency manifest found, skipping installation",
                    style("⚠").yellow(),
                );
            }
        }

        print_epilogue(&config);
        Ok(())
    }
}

/// Rewrite the template files for the new project. Each step is best-effort,
/// a failure leaves the template's placeholder content in place.
fn customize_template(project_dir: &Path, config: &ProjectConfig) {
    type Step = fn(&Path, &ProjectConfig) -> Result<(), PlaceholderError>;
    let steps: [(&str, Step); 4] = [
        ("package.json", customize_package_manifest),
        (".env", customize_env_file),
        (APP_CONFIG_FILE, merge_app_config),
        ("README.md", customize_readme),
    ];

    for (file, step) in steps {
        match step(project_dir, config) {
            Ok(()) => println!("  {} {file} customized", style("✓").green()),
            Err(error) => {
                tracing::warn!(target: "nodestrap::scaffold", %error, "Customization step failed");
                println!("  {} Could not customize {file}", style("⚠").yellow());
            }
        }
    }
}

async fn install_dependencies(
    project_dir: &Path,
    manifest: DepsManifest,
    mode: Option<&str>,
    strict: bool,
) -> miette::Result<()> {
    println!();
    println!("{} Installing dependencies...", style("📦").magenta());

    if manifest.is_empty() {
        println!("  {} Nothing to install", style("✓").green());
        return Ok(());
    }

    let backend = resolve_backend(install_mode(mode), true)?;

    let DepsManifest { dependencies, dev_dependencies } = manifest;
    println!("   {}", style(format!("├─ Dependencies ({})", dependencies.len())).dim());
    if !dev_dependencies.is_empty() {
        println!("   {}", style(format!("└─ Dev Dependencies ({})", dev_dependencies.len())).dim());
    }

    let packages: Vec<PackageSpec> = dependencies
        .into_iter()
        .map(PackageSpec::new)
        .chain(dev_dependencies.into_iter().map(PackageSpec::new_dev))
        .collect();

    let report =
        InstallBatch { backend: &backend, workdir: project_dir, packages, strict }.run().await;
    report.print_summary();
    Ok(())
}

fn print_epilogue(config: &ProjectConfig) {
    println!();
    println!("{}", style("📋 Next steps:").bold());
    println!("  {} {}", style("1.").cyan(), style(format!("cd {}", config.name)).dim());
    println!("  {} {}", style("2.").cyan(), style("npm run dev").dim());
    println!();
    println!("{}", style("🎉 Happy coding with Nodestrap!").magenta());
}
