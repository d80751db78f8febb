mod car;
mod car_error;

pub use car::Car;
pub use car_error::CarError;
