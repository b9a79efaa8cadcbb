use feedgate::settings::*;

fn main() -> anyhow::Result<()> {
    // Load settings from the default location
    let project_settings = parse_settings(None)?;
    println!("Loaded settings: {:?}", project_settings);

    // Attempt to load from an invalid path (expected to fail)
    let is_err = parse_settings(Some("")).is_err();
    println!("Error on invalid path: {:?}", is_err);

    // Secrets can come from the environment instead of the file
    // $ FEEDGATE__SESSION__SECRET=s3cret cargo run --bin settings_demo -- --settings=settings/dev.toml
    let cli = Cli::parse();
    let project_settings = parse_settings(cli.settings.as_deref())?;
    println!("Loaded settings: {:?}", project_settings);
    println!(
        "Route TTLs: profile={:?} media={:?} details={:?}",
        project_settings.cache.profile_ttl(),
        project_settings.cache.media_ttl(),
        project_settings.cache.media_details_ttl()
    );

    Ok(())
}
