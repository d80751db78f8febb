mod filter;

pub use filter::CarFilter;

use crate::{
    storage::{CarRead, CarStore, CarTx, CarWrite},
    types::{Car, CarError},
};

/// Business rules around the car store.
///
/// Create and update run their existence check and their write in one
/// storage transaction, so concurrent callers with the same id serialize
/// on the store's write lock instead of racing between check and write.
#[derive(Clone)]
pub struct CarsService<S: CarStore> {
    store: S,
}

impl<S: CarStore> CarsService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn find(&self, filter: &CarFilter) -> Result<Vec<Car>, CarError> {
        let cars = match filter {
            CarFilter::All => self.store.find_all()?,
            CarFilter::Model(model) => self.store.find_by_model(model)?,
            CarFilter::Year(year) => self.store.find_by_year(*year)?,
            CarFilter::ModelAndYear(model, year) => {
                self.store.find_by_model_and_year(model, *year)?
            }
        };
        Ok(cars)
    }

    pub fn find_all(&self) -> Result<Vec<Car>, CarError> {
        self.find(&CarFilter::All)
    }

    pub fn find_by_model(&self, model: &str) -> Result<Vec<Car>, CarError> {
        self.find(&CarFilter::Model(model.to_string()))
    }

    pub fn find_by_year(&self, year: i32) -> Result<Vec<Car>, CarError> {
        self.find(&CarFilter::Year(year))
    }

    pub fn find_by_model_and_year(&self, model: &str, year: i32) -> Result<Vec<Car>, CarError> {
        self.find(&CarFilter::ModelAndYear(model.to_string(), year))
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<Car>, CarError> {
        Ok(self.store.find_by_id(id)?)
    }

    /// Persists `car` as given, failing if its id is already taken.
    pub fn create(&self, car: Car) -> Result<Car, CarError> {
        if !car.has_id() {
            return Err(CarError::MissingId);
        }

        let tx = self.store.begin_tx()?;
        if tx.find_by_id(&car.id)?.is_some() {
            return Err(CarError::AlreadyExists(car.id));
        }
        tx.save(&car)?;
        tx.commit()?;

        log::debug!("Created car {}", car.id);
        Ok(car)
    }

    /// Replaces the stored model of an existing car; id and year are kept.
    pub fn update(&self, car: Car) -> Result<Car, CarError> {
        if !car.has_id() {
            return Err(CarError::MissingId);
        }

        let tx = self.store.begin_tx()?;
        let current = match tx.find_by_id(&car.id)? {
            Some(current) => current,
            None => return Err(CarError::NotFound(car.id)),
        };
        let merged = current.merged_with(&car);
        tx.save(&merged)?;
        tx.commit()?;

        log::debug!("Updated car {}", merged.id);
        Ok(merged)
    }

    /// Removes the car with `car.id`. Unknown ids are a no-op.
    pub fn delete(&self, car: &Car) -> Result<(), CarError> {
        if !car.has_id() {
            return Err(CarError::MissingId);
        }

        let removed = self.store.delete_by_id(&car.id)?;
        log::debug!("Deleted car {} ({} row(s))", car.id, removed);
        Ok(())
    }

    /// Upserts each car without existence checks.
    pub fn seed(&self, cars: &[Car]) -> Result<(), CarError> {
        let tx = self.store.begin_tx()?;
        for car in cars {
            tx.save(car)?;
        }
        tx.commit()?;
        Ok(())
    }
}
