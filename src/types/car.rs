use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub id: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
}

impl Car {
    pub fn new(id: impl Into<String>, model: impl Into<String>, year: i32) -> Self {
        Self {
            id: id.into(),
            model: Some(model.into()),
            year: Some(year),
        }
    }

    /// Keeps `id` and `year` from `self`, takes `model` from `incoming`.
    pub fn merged_with(self, incoming: &Car) -> Car {
        Car {
            model: incoming.model.clone(),
            ..self
        }
    }

    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }
}
