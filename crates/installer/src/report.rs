use crate::PackageSpec;
use console::style;

/// Final outcome of one installation batch, built in completion order.
///
/// The outcome is binary: either every package succeeded or the report
/// carries a non-empty failure list. A batch where everything failed is
/// still a "partial failure" with all entries in `failed`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstallReport {
    pub total: usize,
    /// Failed packages with their dev tags, in the order results arrived.
    pub failed: Vec<PackageSpec>,
}

impl InstallReport {
    pub fn empty() -> Self {
        InstallReport::default()
    }

    pub fn succeeded(&self) -> usize {
        self.total - self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Print the tree-style closing summary.
    pub fn print_summary(&self) {
        println!();
        if self.all_succeeded() {
            println!("{}", style("✨ All packages installed successfully!").green());
            println!(
                "{}",
                style(format!("└─ {}/{} packages", self.succeeded(), self.total)).dim(),
            );
        } else {
            println!("{}", style("⚠ Installation completed with warnings").yellow());
            println!(
                "{}",
                style(format!("├─ Failed: {}/{} packages", self.failed.len(), self.total)).dim(),
            );
            for (index, package) in self.failed.iter().enumerate() {
                let branch = if index + 1 == self.failed.len() { "└─" } else { "├─" };
                println!("{}", style(format!("{branch} ✗ {}", package.label())).dim());
            }
        }
    }
}
