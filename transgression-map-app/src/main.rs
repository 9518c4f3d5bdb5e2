use anyhow::Context;
use transgression_map::prelude::*;

const CONTAINER_ID: &str = "map-container";

/// Loads the dataset once, renders it onto a headless map and prints what
/// ended up on it.
///
/// An optional `LAT,LNG` argument stands in for the device location.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = MapConfig::from_env();
    config.validate().context("invalid configuration")?;

    let location = std::env::args()
        .nth(1)
        .map(|arg| parse_location(&arg))
        .transpose()?;

    let loader = DataLoader::with_reqwest(config.endpoint.clone());
    let engine = HeadlessEngine::new();
    let mut controller = MapViewController::new(engine.clone(), config.view_options());
    controller.mount(Some(&CONTAINER_ID.to_string()))?;

    let handle = controller.handle();
    if let Some(coords) = location {
        let updates = futures::stream::iter(vec![GeolocationState::located(coords)]);
        forward_locations(updates, handle.clone()).await;
    }

    let collection = refresh(&loader, &handle, LoadOptions::default())
        .await
        .context("failed to load transgressions")?;
    let applied = controller.process_events()?;
    log::debug!("applied {} view events", applied);

    let viewport = controller.viewport();
    println!(
        "{} of {} transgressions on the map, centered at {} z{:.2}",
        controller.marker_count(),
        collection.len(),
        viewport.center,
        viewport.zoom
    );
    for marker in engine.markers() {
        println!("  {}  {}", marker.position, marker.popup_html);
    }

    controller.teardown();
    Ok(())
}

fn parse_location(arg: &str) -> anyhow::Result<LatLng> {
    let (lat, lng) = arg
        .split_once(',')
        .with_context(|| format!("expected LAT,LNG but got '{}'", arg))?;
    let coords = LatLng::new(lat.trim().parse()?, lng.trim().parse()?);
    anyhow::ensure!(coords.is_valid(), "coordinates out of range: {}", coords);
    Ok(coords)
}
