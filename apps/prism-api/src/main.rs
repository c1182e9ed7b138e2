use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	prism_api::run(prism_api::Args::parse()).await
}
