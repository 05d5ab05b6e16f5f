use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    usage_report::run().await
}
