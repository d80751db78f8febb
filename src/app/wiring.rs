use crate::{context, service::CarsService, storage, types::Car};
use anyhow::{Context, Result};

pub fn init_data_dir(ctx: &context::Context) -> Result<()> {
    std::fs::create_dir_all(&ctx.data_dir)?;
    Ok(())
}

pub fn init_storage(ctx: &context::Context) -> Result<storage::SqliteStorage> {
    let sqlite = storage::SqliteStorage::new(ctx.db_path());
    if ctx.reset {
        sqlite.reset_all().context("resetting storage")?;
    }
    sqlite.init().context("initializing storage")?;
    Ok(sqlite)
}

pub fn demo_cars() -> Vec<Car> {
    vec![
        Car::new("1111AAA", "model1", 2001),
        Car::new("2222BBB", "model2", 2002),
        Car::new("3333CCC", "model3", 2003),
        Car::new("4444DDD", "model4", 2004),
        Car::new("5555EEE", "model5", 2005),
    ]
}

pub fn build_service(
    ctx: &context::Context,
    storage: storage::SqliteStorage,
) -> Result<CarsService<storage::SqliteStorage>> {
    let service = CarsService::new(storage);
    if ctx.seed {
        let cars = demo_cars();
        service.seed(&cars).context("seeding demo cars")?;
        log::info!("🌱 Seeded {} demo cars", cars.len());
    }
    Ok(service)
}
