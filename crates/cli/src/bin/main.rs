use nodestrap_diagnostics::Result;

#[tokio::main(flavor = "multi_thread")]
pub async fn main() -> Result<()> {
    nodestrap_cli::run_cli().await
}
