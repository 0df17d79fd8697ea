use actix_web::error::ErrorInternalServerError;
use actix_web::web::{Data, Json, Path};
use actix_web::{get, Result};

use crate::config::Config;
use crate::db;
use crate::model::{Marker, Pin, Viewport};
use crate::repository::SqliteStore;
use crate::store::PinStore;

fn open_store(config: &Config) -> Result<PinStore<SqliteStore>> {
    let db_path = config.db_path().map_err(ErrorInternalServerError)?;
    let persistence = db::open(&db_path).map_err(ErrorInternalServerError)?;
    Ok(PinStore::open(persistence))
}

#[get("/pins")]
pub async fn get_pins(config: Data<Config>) -> Result<Json<Vec<Pin>>> {
    let store = open_store(&config)?;
    Ok(Json(store.list().to_vec()))
}

#[get("/pins/{id}")]
pub async fn get_pin(config: Data<Config>, path: Path<String>) -> Result<Json<Option<Pin>>> {
    let id = path.into_inner();
    let store = open_store(&config)?;
    Ok(Json(store.get(&id).cloned()))
}

#[get("/markers")]
pub async fn get_markers(config: Data<Config>) -> Result<Json<Vec<Marker>>> {
    let store = open_store(&config)?;
    Ok(Json(store.list().iter().map(Marker::from).collect()))
}

#[get("/viewport")]
pub async fn get_viewport(config: Data<Config>) -> Result<Json<Viewport>> {
    let store = open_store(&config)?;
    Ok(Json(store.persistence().load_viewport(config.default_viewport())))
}
