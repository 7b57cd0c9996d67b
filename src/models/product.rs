use uuid::Uuid;

use super::{Entity, Record, Table};

/// A catalog product sold by a center.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub center_id: String,
    pub name: String,
    pub price: f64,
    pub unit: String,
    pub stock_quantity: i64,
}

impl Product {
    pub fn new(center_id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            center_id: center_id.into(),
            name: name.into(),
            price,
            unit: "unit".to_string(),
            stock_quantity: 0,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_stock(mut self, quantity: i64) -> Self {
        self.stock_quantity = quantity;
        self
    }
}

impl Entity for Product {
    const TABLE: Table = Table::Products;

    fn into_record(self) -> Record {
        Record::new(self.center_id)
            .with_id(self.id)
            .with_field("name", self.name)
            .with_field("price", self.price)
            .with_field("unit", self.unit)
            .with_field("stockQuantity", self.stock_quantity)
    }
}
