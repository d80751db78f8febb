use anyhow::Result;

use crate::types::Car;

pub trait CarRead {
    fn find_all(&self) -> Result<Vec<Car>>;
    fn find_by_id(&self, id: &str) -> Result<Option<Car>>;
    fn find_by_model(&self, model: &str) -> Result<Vec<Car>>;
    fn find_by_year(&self, year: i32) -> Result<Vec<Car>>;
    fn find_by_model_and_year(&self, model: &str, year: i32) -> Result<Vec<Car>>;
}

pub trait CarWrite {
    /// Inserts the car or replaces the row with the same id.
    fn save(&self, car: &Car) -> Result<()>;
    /// Returns the number of rows removed (0 or 1).
    fn delete_by_id(&self, id: &str) -> Result<usize>;
}

/// A unit of work; dropping it without `commit` rolls back.
pub trait CarTx: CarRead + CarWrite {
    fn commit(self) -> Result<()>;
}

pub trait CarStore: CarRead + CarWrite {
    type Tx: CarTx;

    fn begin_tx(&self) -> Result<Self::Tx>;
}
