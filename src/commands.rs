use std::sync::Arc;
use std::time::Duration;

use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::{anyhow, bail, Context, Result};
use tracing::info;

use crate::config::Config;
use crate::coordinates::validate_lat_lon;
use crate::controller::{get_markers, get_pin, get_pins, get_viewport};
use crate::db;
use crate::form::PinForm;
use crate::geocoding::{Geocoder, NominatimClient, Place};
use crate::model::{Pin, Viewport};
use crate::repository::SqliteStore;
use crate::store::PinStore;
use crate::suggest::{SuggestionSearch, MIN_QUERY_CHARS};
use crate::PinArgs;

fn open_store(config: &Config) -> Result<PinStore<SqliteStore>> {
    Ok(PinStore::open(db::open(&config.db_path()?)?))
}

fn apply(fields: &PinArgs, form: &mut PinForm) {
    let PinArgs { pin_type, name, description, color, link, coords, lat, lon } = fields;

    if let Some(coords) = coords {
        form.paste_latitude(coords);
    }

    for (value, field) in [
        (pin_type, &mut form.pin_type),
        (name, &mut form.name),
        (description, &mut form.description),
        (color, &mut form.color),
        (link, &mut form.link),
        (lat, &mut form.latitude),
        (lon, &mut form.longitude),
    ] {
        if let Some(value) = value {
            *field = value.clone();
        }
    }
}

fn print_pin(pin: &Pin) {
    println!("{}  {:<8}  {}  ({})  {}", pin.id, pin.pin_type, pin.name, pin.position, pin.color);

    if !pin.description.is_empty() {
        println!("    {}", pin.description);
    }

    if let Some(link) = &pin.link {
        println!("    {link}");
    }
}

fn print_place(index: usize, place: &Place) {
    println!("{:>2}. {}  ({})", index + 1, place.display_name, place.position);

    if let Some(address) = &place.address {
        let locality = ["city", "town", "village", "country"]
            .iter()
            .filter_map(|key| address.get(*key).map(String::as_str))
            .collect::<Vec<&str>>()
            .join(", ");

        if !locality.is_empty() {
            println!("    {locality}");
        }
    }
}

pub fn add_pin(config: &Config, fields: &PinArgs) -> Result<()> {
    let mut form = PinForm::default();
    apply(fields, &mut form);
    let draft = form.validate()?;

    let mut store = open_store(config)?;
    let pin = store.add(draft);
    info!(id = %pin.id, "Pin added");
    print_pin(pin);
    Ok(())
}

pub fn list_pins(config: &Config) -> Result<()> {
    let store = open_store(config)?;

    if store.list().is_empty() {
        println!("No pins yet");
    }

    for pin in store.list() {
        print_pin(pin);
    }

    Ok(())
}

pub fn show_pin(config: &Config, id: &str) -> Result<()> {
    let store = open_store(config)?;
    let pin = store.get(id).ok_or_else(|| anyhow!("No pin with id {id}"))?;
    print_pin(pin);
    Ok(())
}

pub fn edit_pin(config: &Config, id: &str, fields: &PinArgs) -> Result<()> {
    let mut store = open_store(config)?;
    let pin = store.get(id).ok_or_else(|| anyhow!("No pin with id {id}"))?;

    let mut form = PinForm::from_draft(&pin.draft());
    apply(fields, &mut form);
    let draft = form.validate()?;

    if let Some(pin) = store.edit(id, draft) {
        info!(id = %pin.id, "Pin updated");
        print_pin(pin);
    }

    Ok(())
}

pub fn remove_pin(config: &Config, id: &str) -> Result<()> {
    let mut store = open_store(config)?;

    match store.remove(id) {
        Some(pin) => println!("Removed {}", pin.name),
        None => println!("No pin with id {id}"),
    }

    Ok(())
}

pub async fn search(config: &Config, query: &str) -> Result<()> {
    let geocoder = NominatimClient::new(config)?;
    search_with(config, &geocoder, query).await?;
    Ok(())
}

/// Looks the query up and recenters the saved view on the top result.
async fn search_with<G: Geocoder>(config: &Config, geocoder: &G, query: &str) -> Result<Place> {
    let place = geocoder.lookup(query).await?;
    println!("{}  ({})", place.display_name, place.position);

    let mut persistence = db::open(&config.db_path()?)?;
    persistence.save_center(place.position);
    println!("Map centered on {}", place.position);
    Ok(place)
}

pub async fn suggest(
    config: &Config,
    query: &str,
    add: Option<usize>,
    fields: &PinArgs,
) -> Result<()> {
    let geocoder = Arc::new(NominatimClient::new(config)?);
    suggest_with(config, geocoder, query, add, fields).await?;
    Ok(())
}

async fn suggest_with<G: Geocoder + 'static>(
    config: &Config,
    geocoder: Arc<G>,
    query: &str,
    add: Option<usize>,
    fields: &PinArgs,
) -> Result<Vec<Place>> {
    if query.chars().count() <= MIN_QUERY_CHARS {
        bail!("Type at least {} characters", MIN_QUERY_CHARS + 1);
    }

    let mut search = SuggestionSearch::new(geocoder, config.debounce(), config.suggestion_limit);
    let mut updates = search.subscribe();
    search.update_query(query);

    let deadline = config.debounce() + Duration::from_secs(config.request_timeout_secs + 1);
    tokio::time::timeout(deadline, updates.changed())
        .await
        .context("Search error: no response")?
        .context("Search error: suggestions closed")?;

    if let Some(error) = search.last_error() {
        bail!(error);
    }

    let places = search.suggestions();

    if places.is_empty() {
        println!("Location not found");
        return Ok(places);
    }

    println!("Suggestions for \"{}\"", updates.borrow().query);

    for (index, place) in places.iter().enumerate() {
        print_place(index, place);
    }

    if let Some(number) = add {
        let mut form = PinForm::default();
        let selected = number
            .checked_sub(1)
            .is_some_and(|index| search.select(index, &mut form));

        if !selected {
            bail!("No suggestion number {number}");
        }

        apply(fields, &mut form);
        let draft = form.validate()?;

        let mut store = open_store(config)?;
        let pin = store.add(draft);
        info!(id = %pin.id, "Pin added from suggestion");
        print_pin(pin);
    }

    Ok(places)
}

pub fn show_view(config: &Config) -> Result<()> {
    let persistence = db::open(&config.db_path()?)?;
    let viewport = persistence.load_viewport(config.default_viewport());
    println!("center {}  zoom {}", viewport.center, viewport.zoom);
    Ok(())
}

pub fn set_view(config: &Config, lat: &str, lon: &str, zoom: Option<u8>) -> Result<()> {
    let center = validate_lat_lon(lat, lon)?;
    let mut persistence = db::open(&config.db_path()?)?;
    let current = persistence.load_viewport(config.default_viewport());

    let viewport = Viewport::new(center, zoom.unwrap_or(current.zoom));
    persistence.save_viewport(&viewport);
    println!("center {}  zoom {}", viewport.center, viewport.zoom);
    Ok(())
}

pub fn reset_view(config: &Config) -> Result<()> {
    let mut persistence = db::open(&config.db_path()?)?;
    persistence.reset_viewport();
    Ok(())
}

pub async fn serve(config: Config, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(config.port);
    let config = Data::new(config);
    info!(port, "Serving map data");

    HttpServer::new(move || {
        App::new()
            .app_data(config.clone())
            .service(get_pins)
            .service(get_pin)
            .service(get_markers)
            .service(get_viewport)
    })
    .bind(("127.0.0.1", port))?
    .run()
    .await?;

    Ok(())
}
