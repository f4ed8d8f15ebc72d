use anyhow::Result;

fn main() -> Result<()> {
    triplestore_client_cli::run()
}
